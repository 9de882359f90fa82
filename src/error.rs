use aide::OperationOutput;
use axum::{
	extract::{
		multipart::{MultipartError, MultipartRejection},
		rejection::{JsonRejection, QueryRejection},
	},
	http::{header, StatusCode},
	response::{IntoResponse, Response},
	Json,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
	extract::AuthError, mail::MailError, media::MediaError, store::StoreError, token::TokenError,
};

/// The body of every failed response.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ErrorBody {
	/// A human-readable description of what went wrong.
	pub message: String,
	/// Per-field validation failures, if any.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub errors: Vec<FieldMessage>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct FieldMessage {
	pub field: String,
	pub message: String,
}

impl ErrorBody {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			errors: Vec::new(),
		}
	}
}

/// How a route-specific error is presented to the client.
///
/// The [`std::fmt::Display`] output is sent as the `message`, so it must not
/// contain sensitive information.
pub trait ErrorShape: std::error::Error {
	fn status(&self) -> StatusCode;

	fn errors(&self) -> Vec<FieldMessage> {
		Vec::new()
	}
}

/// Error type shared by every route.
///
/// The Display output is only logged, never sent to the client for 500s.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("json error: {0}")]
	Json(#[from] JsonRejection),
	#[error("query error: {0}")]
	Query(#[from] QueryRejection),
	#[error("multipart error: {0}")]
	MultipartRejection(#[from] MultipartRejection),
	#[error("multipart error: {0}")]
	Multipart(#[from] MultipartError),
	#[error("invalid form field: {0}")]
	Form(#[source] serde_json::Error),
	#[error(transparent)]
	Auth(#[from] AuthError),
	#[error("store error: {0}")]
	Store(#[from] StoreError),
	#[error("password hashing error: {0}")]
	Hash(#[from] argon2::Error),
	#[error("token error: {0}")]
	Token(#[from] TokenError),
	#[error("mail error: {0}")]
	Mail(#[from] MailError),
	#[error("media error: {0}")]
	Media(#[from] MediaError),
	#[error("rate limited for {retry_after}s")]
	RateLimited { retry_after: u64 },
}

impl AppError {
	fn status_and_body(&self) -> (StatusCode, ErrorBody) {
		match self {
			Self::Validation(errors) => {
				let mut fields = errors
					.field_errors()
					.into_iter()
					.flat_map(|(field, errors)| {
						errors.iter().map(move |error| FieldMessage {
							field: field.to_string(),
							message: error
								.message
								.as_ref()
								.map_or_else(|| error.code.to_string(), ToString::to_string),
						})
					})
					.collect::<Vec<_>>();

				fields.sort_by(|a, b| a.field.cmp(&b.field));

				(
					StatusCode::BAD_REQUEST,
					ErrorBody {
						message: "Validation failed".into(),
						errors: fields,
					},
				)
			}
			Self::Json(rejection) => (
				StatusCode::BAD_REQUEST,
				ErrorBody::new(rejection.body_text()),
			),
			Self::Query(rejection) => (
				StatusCode::BAD_REQUEST,
				ErrorBody::new(rejection.body_text()),
			),
			Self::MultipartRejection(rejection) => (
				StatusCode::BAD_REQUEST,
				ErrorBody::new(rejection.body_text()),
			),
			Self::Multipart(error) => (StatusCode::BAD_REQUEST, ErrorBody::new(error.body_text())),
			Self::Form(error) => (StatusCode::BAD_REQUEST, ErrorBody::new(error.to_string())),
			Self::Auth(error) => (StatusCode::UNAUTHORIZED, ErrorBody::new(error.to_string())),
			Self::Media(error) if error.is_client_error() => {
				(StatusCode::BAD_REQUEST, ErrorBody::new(error.to_string()))
			}
			Self::RateLimited { retry_after } => (
				StatusCode::TOO_MANY_REQUESTS,
				ErrorBody::new(format!(
					"Too many requests, try again in {retry_after} seconds"
				)),
			),
			Self::Store(..) | Self::Hash(..) | Self::Token(..) | Self::Mail(..) | Self::Media(..) => {
				tracing::error!(error = %self, "request failed");

				(
					StatusCode::INTERNAL_SERVER_ERROR,
					ErrorBody::new("Server error"),
				)
			}
		}
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response {
		let (status, body) = self.status_and_body();

		if let Self::RateLimited { retry_after } = self {
			return (
				status,
				[(header::RETRY_AFTER, retry_after.to_string())],
				Json(body),
			)
				.into_response();
		}

		(status, Json(body)).into_response()
	}
}

impl OperationOutput for AppError {
	type Inner = Self;
}

/// An error returned from a route, either specific to it or shared.
#[derive(Debug)]
pub enum RouteError<T> {
	Route(T),
	App(AppError),
}

impl<T: ErrorShape> From<T> for RouteError<T> {
	fn from(error: T) -> Self {
		Self::Route(error)
	}
}

impl<T> From<AppError> for RouteError<T> {
	fn from(error: AppError) -> Self {
		Self::App(error)
	}
}

macro_rules! from_app_error {
	($($source:ty),* $(,)?) => {
		$(
			impl<T> From<$source> for RouteError<T> {
				fn from(error: $source) -> Self {
					Self::App(AppError::from(error))
				}
			}
		)*
	};
}

from_app_error!(StoreError, argon2::Error, TokenError, MailError, MediaError);

impl<T: ErrorShape> IntoResponse for RouteError<T> {
	fn into_response(self) -> Response {
		match self {
			Self::Route(error) => {
				let body = ErrorBody {
					message: error.to_string(),
					errors: error.errors(),
				};

				(error.status(), Json(body)).into_response()
			}
			Self::App(error) => error.into_response(),
		}
	}
}

impl<T> OperationOutput for RouteError<T> {
	type Inner = Self;
}

#[cfg(test)]
mod test {
	use validator::Validate;

	use super::*;

	#[derive(Validate)]
	struct Input {
		#[validate(length(min = 2, message = "too short"))]
		name: String,
		#[validate(email)]
		email: String,
	}

	#[test]
	fn test_validation_errors_are_listed_per_field() {
		let errors = Input {
			name: "a".into(),
			email: "nope".into(),
		}
		.validate()
		.unwrap_err();

		let (status, body) = AppError::Validation(errors).status_and_body();

		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body.message, "Validation failed");
		assert_eq!(body.errors.len(), 2);
		assert_eq!(body.errors[0].field, "email");
		assert_eq!(body.errors[0].message, "email");
		assert_eq!(body.errors[1].field, "name");
		assert_eq!(body.errors[1].message, "too short");
	}

	#[test]
	fn test_internal_errors_hide_details() {
		let (status, body) = AppError::Store(StoreError::Database(sqlx::Error::PoolTimedOut))
			.status_and_body();

		assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(body.message, "Server error");
		assert!(body.errors.is_empty());
	}
}
