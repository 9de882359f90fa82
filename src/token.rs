use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonwebtoken::{errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
	#[error("token expired")]
	Expired,
	#[error("invalid token: {0}")]
	Invalid(#[source] jsonwebtoken::errors::Error),
	#[error("failed to sign token: {0}")]
	Sign(#[source] jsonwebtoken::errors::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
	sub: Uuid,
	iat: i64,
	exp: i64,
}

/// A freshly signed token.
#[derive(Debug, Clone)]
pub struct Issued {
	pub token: String,
	pub expires_at: DateTime<Utc>,
}

struct Keys {
	encoding: EncodingKey,
	decoding: DecodingKey,
}

/// Signs and verifies HS256 session tokens.
///
/// Tokens are stateless: there is no revocation, so a token stays valid
/// until it expires even after logging out.
#[derive(Clone)]
pub struct Tokens {
	keys: Arc<Keys>,
	ttl: chrono::Duration,
}

impl Tokens {
	pub fn new(secret: &[u8], ttl: chrono::Duration) -> Self {
		Self {
			keys: Arc::new(Keys {
				encoding: EncodingKey::from_secret(secret),
				decoding: DecodingKey::from_secret(secret),
			}),
			ttl,
		}
	}

	pub fn ttl(&self) -> chrono::Duration {
		self.ttl
	}

	pub fn issue(&self, user_id: Uuid) -> Result<Issued, TokenError> {
		let now = Utc::now();
		let expires_at = now + self.ttl;

		let claims = Claims {
			sub: user_id,
			iat: now.timestamp(),
			exp: expires_at.timestamp(),
		};

		let token = jsonwebtoken::encode(&Header::default(), &claims, &self.keys.encoding)
			.map_err(TokenError::Sign)?;

		Ok(Issued { token, expires_at })
	}

	/// Returns the user id the token was issued for.
	pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
		jsonwebtoken::decode::<Claims>(token, &self.keys.decoding, &Validation::default())
			.map(|data| data.claims.sub)
			.map_err(|error| match error.kind() {
				ErrorKind::ExpiredSignature => TokenError::Expired,
				_ => TokenError::Invalid(error),
			})
	}
}
