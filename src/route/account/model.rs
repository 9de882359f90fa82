use std::borrow::Cow;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

pub use crate::model::Profile;

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
	let mut error = ValidationError::new(code);
	error.message = Some(Cow::Borrowed(message));
	error
}

fn validate_firstname(name: &str) -> Result<(), ValidationError> {
	if name.trim().chars().count() < 2 {
		return Err(invalid(
			"length",
			"First name must be at least 2 characters",
		));
	}

	Ok(())
}

fn validate_lastname(name: &str) -> Result<(), ValidationError> {
	if name.trim().chars().count() < 2 {
		return Err(invalid("length", "Last name must be at least 2 characters"));
	}

	Ok(())
}

fn validate_otp(otp: &str) -> Result<(), ValidationError> {
	if otp.len() != 5 || !otp.bytes().all(|b| b.is_ascii_digit()) {
		return Err(invalid("otp", "OTP must be 5 digits"));
	}

	Ok(())
}

#[derive(Deserialize, Serialize, Validate, JsonSchema)]
pub struct SignupInput {
	#[validate(custom(function = "validate_firstname"))]
	pub firstname: String,
	#[validate(custom(function = "validate_lastname"))]
	pub lastname: String,
	/// Used for logging in and password resets. Compared case-insensitively.
	#[validate(email(message = "Please enter a valid email"))]
	pub email: String,
	#[validate(length(min = 6, message = "Password must be at least 6 characters"))]
	pub password: String,
}

#[derive(Deserialize, Serialize, Validate, JsonSchema)]
pub struct LoginInput {
	#[validate(email(message = "Please enter a valid email"))]
	pub email: String,
	#[validate(length(min = 1, message = "Password is required"))]
	pub password: String,
}

#[derive(Deserialize, Serialize, Validate, JsonSchema)]
pub struct ForgotPasswordInput {
	#[validate(email(message = "Please enter a valid email"))]
	pub email: String,
}

#[derive(Deserialize, Serialize, Validate, JsonSchema)]
pub struct ResetPasswordInput {
	#[validate(email(message = "Please enter a valid email"))]
	pub email: String,
	/// The 5-digit code sent by email.
	#[validate(custom(function = "validate_otp"))]
	pub otp: String,
	#[serde(rename = "newPassword")]
	#[validate(length(min = 6, message = "Password must be at least 6 characters"))]
	pub new_password: String,
}

/// Returned on signup and login.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct AuthResponse {
	pub message: String,
	/// A bearer token, also set as the session cookie.
	pub token: String,
	pub user: Profile,
}

/// Emails are compared and stored trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
	email.trim().to_lowercase()
}
