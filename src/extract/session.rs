use aide::OperationInput;
use axum::{
	extract::{FromRef, FromRequestParts},
	http::{header, request, HeaderMap},
};
use uuid::Uuid;

use crate::{
	error::AppError,
	openapi::{SECURITY_SCHEME_BEARER, SECURITY_SCHEME_COOKIE},
	session,
	token::{TokenError, Tokens},
};

pub const AUTHORIZATION_PREFIX: &str = "Bearer ";

/// Why a request could not be authenticated.
///
/// The messages are presented to the client.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
	#[error("User not authorized. No token found.")]
	NoToken,
	#[error("User not authorized. Invalid token.")]
	InvalidToken(#[source] TokenError),
}

/// The authenticated caller.
///
/// The token is taken from an `Authorization: Bearer` header, or from the
/// session cookie when the header is absent or not a bearer value. Nothing is
/// looked up in the store: a token stays valid until it expires.
///
/// ```rust,ignore
/// async fn route(session: Session) {
///   println!("{}", session.user_id);
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Session {
	pub user_id: Uuid,
}

impl Session {
	pub fn owns(&self, owner_id: Uuid) -> bool {
		self.user_id == owner_id
	}
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
	Tokens: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = AppError;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let token = bearer_token(&parts.headers)
			.or_else(|| cookie_token(&parts.headers))
			.ok_or(AuthError::NoToken)?;

		let user_id = Tokens::from_ref(state)
			.verify(&token)
			.map_err(AuthError::InvalidToken)?;

		Ok(Self { user_id })
	}
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
	headers
		.get(header::AUTHORIZATION)
		.and_then(|value| value.to_str().ok())
		.and_then(|value| value.strip_prefix(AUTHORIZATION_PREFIX))
		.map(str::trim)
		.filter(|token| !token.is_empty())
		.map(str::to_owned)
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
	headers
		.get_all(header::COOKIE)
		.into_iter()
		.filter_map(|value| value.to_str().ok())
		.flat_map(cookie::Cookie::split_parse)
		.filter_map(Result::ok)
		.find(|cookie| cookie.name() == session::COOKIE_NAME)
		.map(|cookie| cookie.value().to_owned())
		.filter(|token| !token.is_empty())
}

impl OperationInput for Session {
	/// Adds the bearer and cookie requirements to the `OpenAPI` operation.
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		operation.security.extend([
			[(SECURITY_SCHEME_BEARER.to_string(), Vec::new())]
				.into_iter()
				.collect(),
			[(SECURITY_SCHEME_COOKIE.to_string(), Vec::new())]
				.into_iter()
				.collect(),
		]);
	}
}

#[cfg(test)]
mod test {
	use axum::http::HeaderValue;

	use super::*;

	#[test]
	fn test_bearer_header_takes_precedence() {
		let mut headers = HeaderMap::new();
		headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
		headers.insert(header::COOKIE, HeaderValue::from_static("usertoken=def"));

		assert_eq!(
			bearer_token(&headers).or_else(|| cookie_token(&headers)),
			Some("abc".into())
		);
	}

	#[test]
	fn test_non_bearer_header_falls_back_to_cookie() {
		let mut headers = HeaderMap::new();
		headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
		headers.insert(
			header::COOKIE,
			HeaderValue::from_static("theme=dark; usertoken=def"),
		);

		assert_eq!(bearer_token(&headers), None);
		assert_eq!(cookie_token(&headers), Some("def".into()));
	}

	#[test]
	fn test_missing_token() {
		let headers = HeaderMap::new();

		assert_eq!(bearer_token(&headers).or_else(|| cookie_token(&headers)), None);
	}
}
