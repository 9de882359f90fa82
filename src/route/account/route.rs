use aide::axum::IntoApiResponse;
use argon2::Argon2;
use axum::{
	extract::State,
	http::{header, StatusCode},
};
use macros::route;
use rand::Rng;
use uuid::Uuid;

use crate::{
	extract::{Json, Session},
	mail,
	openapi::tag,
	route::model::MessageResponse,
	session,
	store::{NewUser, StoreError},
	AppState,
};

use super::{model, Error, RouteError};

pub const KEY_LENGTH: usize = 32;

/// Hashes a password with Argon2, using the user's id as a salt.
/// Since this is only used for logging in and setting a new password,
/// the scope of this function can remain in here with no issues.
fn hash_password(
	hasher: &Argon2,
	password: &str,
	id: &Uuid,
) -> Result<[u8; KEY_LENGTH], argon2::Error> {
	let mut hash = [0; KEY_LENGTH];

	hasher.hash_password_into(password.as_bytes(), id.as_bytes(), &mut hash)?;
	Ok(hash)
}

/// A random 5-digit reset code.
fn reset_code() -> String {
	rand::thread_rng().gen_range(10_000..=99_999).to_string()
}

/// Sign up
/// Creates an account, returning a token that is also set as the session cookie.
#[route(tag = tag::ACCOUNT, response(status = 201, description = "Account created.", shape = "Json<model::AuthResponse>"))]
pub async fn signup(
	State(state): State<AppState>,
	Json(input): Json<model::SignupInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let id = Uuid::new_v4();
	let password = hash_password(&state.hasher, &input.password, &id)?;

	let user = state
		.store
		.users
		.insert(NewUser {
			id,
			firstname: input.firstname.trim().to_owned(),
			lastname: input.lastname.trim().to_owned(),
			email: model::normalize_email(&input.email),
			password: password.to_vec(),
		})
		.await
		.map_err(|e| match e {
			StoreError::EmailTaken => Error::EmailTaken.into(),
			e => RouteError::from(e),
		})?;

	let issued = state.tokens.issue(user.id)?;
	let cookie = session::create_cookie(&issued, state.config.secure_cookies());

	tracing::info!(user_id = %user.id, "user signed up");

	Ok((
		StatusCode::CREATED,
		[(header::SET_COOKIE, cookie.to_string())],
		Json(model::AuthResponse {
			message: "User created successfully".into(),
			token: issued.token,
			user: user.into(),
		}),
	))
}

/// Log in
/// Logs in to an account, returning a token that is also set as the session cookie.
#[route(tag = tag::ACCOUNT, response(status = 200, description = "Logged in.", shape = "Json<model::AuthResponse>"))]
pub async fn login(
	State(state): State<AppState>,
	Json(input): Json<model::LoginInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let Some(user) = state
		.store
		.users
		.find_by_email(&model::normalize_email(&input.email))
		.await?
	else {
		return Err(Error::InvalidCredentials.into());
	};

	let hashed = hash_password(&state.hasher, &input.password, &user.id)?;

	if user.password != hashed {
		return Err(Error::InvalidCredentials.into());
	}

	let issued = state.tokens.issue(user.id)?;
	let cookie = session::create_cookie(&issued, state.config.secure_cookies());

	Ok((
		[(header::SET_COOKIE, cookie.to_string())],
		Json(model::AuthResponse {
			message: "Login successful".into(),
			token: issued.token,
			user: user.into(),
		}),
	))
}

/// Log out
/// Clears the session cookie. Tokens are not revoked and stay valid until they expire.
#[route(tag = tag::ACCOUNT)]
pub async fn logout(
	State(state): State<AppState>,
	_session: Session,
) -> impl IntoApiResponse {
	let cookie = session::clear_cookie(state.config.secure_cookies());

	(
		[(header::SET_COOKIE, cookie.to_string())],
		Json(MessageResponse::new("Logged out successfully")),
	)
}

/// Get profile
/// Returns the authenticated user.
#[route(tag = tag::ACCOUNT)]
pub async fn get_me(
	State(state): State<AppState>,
	session: Session,
) -> Result<Json<model::Profile>, RouteError> {
	let user = state
		.store
		.users
		.find_by_id(session.user_id)
		.await?
		.ok_or(Error::UserNotFound)?;

	Ok(Json(user.into()))
}

/// Request password reset
/// Emails a one-time code that can be used to set a new password. Requesting
/// another code replaces the previous one.
#[route(tag = tag::ACCOUNT)]
pub async fn forgot_password(
	State(state): State<AppState>,
	Json(input): Json<model::ForgotPasswordInput>,
) -> Result<Json<MessageResponse>, RouteError> {
	let user = state
		.store
		.users
		.find_by_email(&model::normalize_email(&input.email))
		.await?
		.ok_or(Error::UserNotFound)?;

	let code = reset_code();

	state.store.users.set_reset_code(user.id, &code).await?;
	state
		.mailer
		.send(mail::reset_code_email(
			&user.email,
			&code,
			state.config.reset_code_ttl,
		))
		.await?;

	tracing::info!(user_id = %user.id, "password reset requested");

	Ok(Json(MessageResponse::new("OTP sent to your email")))
}

/// Reset password
/// Sets a new password using the emailed code. The code can only be used once.
#[route(tag = tag::ACCOUNT)]
pub async fn reset_password(
	State(state): State<AppState>,
	Json(input): Json<model::ResetPasswordInput>,
) -> Result<Json<MessageResponse>, RouteError> {
	let user = state
		.store
		.users
		.find_by_email(&model::normalize_email(&input.email))
		.await?
		.ok_or(Error::InvalidResetCode)?;

	if user.reset_code.as_deref() != Some(input.otp.as_str()) {
		return Err(Error::InvalidResetCode.into());
	}

	if let (Some(ttl), Some(issued_at)) = (state.config.reset_code_ttl, user.reset_code_issued_at) {
		if issued_at + ttl < chrono::Utc::now() {
			return Err(Error::InvalidResetCode.into());
		}
	}

	let password = hash_password(&state.hasher, &input.new_password, &user.id)?;

	if !state
		.store
		.users
		.reset_password(user.id, &input.otp, &password)
		.await?
	{
		return Err(Error::InvalidResetCode.into());
	}

	tracing::info!(user_id = %user.id, "password reset");

	Ok(Json(MessageResponse::new("Password reset successful")))
}
