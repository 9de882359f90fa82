use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod model;
pub mod route;

/// An error that can occur while managing an account.
///
/// Note that the messages are presented to the client, so they should not contain
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("User already exists with this email")]
	EmailTaken,
	#[error("Invalid credentials")]
	InvalidCredentials,
	#[error("User not found")]
	UserNotFound,
	#[error("Invalid OTP or email")]
	InvalidResetCode,
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/signup", post_with(signup, signup_docs))
		.api_route("/login", post_with(login, login_docs))
		.api_route("/logout", post_with(logout, logout_docs))
		.api_route("/me", get_with(get_me, get_me_docs))
		.api_route(
			"/forgot-password",
			post_with(forgot_password, forgot_password_docs),
		)
		.api_route(
			"/reset-password",
			post_with(reset_password, reset_password_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::EmailTaken | Self::InvalidCredentials | Self::InvalidResetCode => {
				StatusCode::BAD_REQUEST
			}
			Self::UserNotFound => StatusCode::NOT_FOUND,
		}
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_signup_flow() {
		let app = app();

		let response = app
			.server
			.post("/api/user/signup")
			.json(&json!({
				"firstname": "Ada",
				"lastname": "Lovelace",
				"email": "Ada@Example.com",
				"password": "hunter2",
			}))
			.await;

		assert_eq!(response.status_code(), 201);

		assert!(response
			.header("set-cookie")
			.to_str()
			.unwrap()
			.starts_with("usertoken="));

		let body = response.json::<Value>();

		assert_eq!(body["message"], "User created successfully");
		assert_eq!(body["user"]["email"], "ada@example.com");
		assert!(body["user"].get("password").is_none());

		let token = body["token"].as_str().unwrap();

		let response = app
			.server
			.get("/api/user/me")
			.add_header(AUTHORIZATION, bearer(token))
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["firstname"], "Ada");
	}

	#[tokio::test]
	async fn test_signup_validation() {
		let app = app();

		let response = app
			.server
			.post("/api/user/signup")
			.json(&json!({
				"firstname": " A ",
				"lastname": "Lovelace",
				"email": "not-an-email",
				"password": "12345",
			}))
			.await;

		assert_eq!(response.status_code(), 400);

		let body = response.json::<Value>();

		assert_eq!(body["message"], "Validation failed");
		assert_eq!(
			body["errors"],
			json!([
				{ "field": "email", "message": "Please enter a valid email" },
				{ "field": "firstname", "message": "First name must be at least 2 characters" },
				{ "field": "password", "message": "Password must be at least 6 characters" },
			])
		);
	}

	#[tokio::test]
	async fn test_duplicate_email() {
		let app = app();

		signup(&app, "ada@example.com").await;

		let response = app
			.server
			.post("/api/user/signup")
			.json(&json!({
				"firstname": "Ada",
				"lastname": "Byron",
				"email": "ADA@example.com",
				"password": "hunter2",
			}))
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(
			response.json::<Value>()["message"],
			"User already exists with this email"
		);
	}

	#[tokio::test]
	async fn test_login_failures_are_uniform() {
		let app = app();

		signup(&app, "ada@example.com").await;

		let wrong_password = app
			.server
			.post("/api/user/login")
			.json(&json!({ "email": "ada@example.com", "password": "wrong-password" }))
			.await;

		let unknown_email = app
			.server
			.post("/api/user/login")
			.json(&json!({ "email": "bob@example.com", "password": "hunter2" }))
			.await;

		assert_eq!(wrong_password.status_code(), 400);
		assert_eq!(unknown_email.status_code(), 400);
		assert_eq!(
			wrong_password.json::<Value>(),
			unknown_email.json::<Value>()
		);
		assert_eq!(
			wrong_password.json::<Value>()["message"],
			"Invalid credentials"
		);

		let response = app
			.server
			.post("/api/user/login")
			.json(&json!({ "email": "ada@example.com", "password": "hunter2" }))
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["message"], "Login successful");
	}

	#[tokio::test]
	async fn test_cookie_authenticates_and_logout_clears_it() {
		let app = app();

		let response = app
			.server
			.post("/api/user/signup")
			.json(&json!({
				"firstname": "Ada",
				"lastname": "Lovelace",
				"email": "ada@example.com",
				"password": "hunter2",
			}))
			.await;

		let token = response.json::<Value>()["token"]
			.as_str()
			.unwrap()
			.to_owned();

		let response = app
			.server
			.get("/api/user/me")
			.add_header(COOKIE, cookie(&token))
			.await;

		assert_eq!(response.status_code(), 200);

		let response = app
			.server
			.post("/api/user/logout")
			.add_header(COOKIE, cookie(&token))
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(
			response.json::<Value>()["message"],
			"Logged out successfully"
		);
		assert!(response
			.header("set-cookie")
			.to_str()
			.unwrap()
			.contains("Max-Age=0"));
	}

	#[tokio::test]
	async fn test_missing_and_invalid_token() {
		let app = app();

		let response = app.server.get("/api/user/me").await;

		assert_eq!(response.status_code(), 401);
		assert_eq!(
			response.json::<Value>()["message"],
			"User not authorized. No token found."
		);

		let response = app
			.server
			.get("/api/user/me")
			.add_header(AUTHORIZATION, bearer("garbage"))
			.await;

		assert_eq!(response.status_code(), 401);
		assert_eq!(
			response.json::<Value>()["message"],
			"User not authorized. Invalid token."
		);
	}

	#[tokio::test]
	async fn test_password_reset() {
		let app = app();

		signup(&app, "ada@example.com").await;

		let response = app
			.server
			.post("/api/user/forgot-password")
			.json(&json!({ "email": "nobody@example.com" }))
			.await;

		assert_eq!(response.status_code(), 404);
		assert_eq!(response.json::<Value>()["message"], "User not found");

		let response = app
			.server
			.post("/api/user/forgot-password")
			.json(&json!({ "email": "ada@example.com" }))
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["message"], "OTP sent to your email");

		let code = last_reset_code(&app).await;
		let wrong_code = if code == "10000" { "10001" } else { "10000" };

		let response = app
			.server
			.post("/api/user/reset-password")
			.json(&json!({ "email": "ada@example.com", "otp": wrong_code, "newPassword": "new-secret" }))
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(response.json::<Value>()["message"], "Invalid OTP or email");

		let response = app
			.server
			.post("/api/user/reset-password")
			.json(&json!({ "email": "ada@example.com", "otp": code, "newPassword": "new-secret" }))
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(
			response.json::<Value>()["message"],
			"Password reset successful"
		);

		let response = app
			.server
			.post("/api/user/reset-password")
			.json(&json!({ "email": "ada@example.com", "otp": code, "newPassword": "other-secret" }))
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(response.json::<Value>()["message"], "Invalid OTP or email");

		let response = app
			.server
			.post("/api/user/login")
			.json(&json!({ "email": "ada@example.com", "password": "new-secret" }))
			.await;

		assert_eq!(response.status_code(), 200);
	}

	#[tokio::test]
	async fn test_expired_reset_code() {
		let app = app_with(|config| config.reset_code_ttl = Some(chrono::Duration::minutes(-1)));

		signup(&app, "ada@example.com").await;

		app.server
			.post("/api/user/forgot-password")
			.json(&json!({ "email": "ada@example.com" }))
			.await
			.assert_status_ok();

		let code = last_reset_code(&app).await;

		let response = app
			.server
			.post("/api/user/reset-password")
			.json(&json!({ "email": "ada@example.com", "otp": code, "newPassword": "new-secret" }))
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(response.json::<Value>()["message"], "Invalid OTP or email");
	}

	#[tokio::test]
	async fn test_reset_code_format() {
		let app = app();

		let response = app
			.server
			.post("/api/user/reset-password")
			.json(&json!({ "email": "ada@example.com", "otp": "12a45", "newPassword": "new-secret" }))
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(
			response.json::<Value>()["errors"][0]["message"],
			"OTP must be 5 digits"
		);
	}
}
