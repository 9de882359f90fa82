use crate::token::Issued;

pub const COOKIE_NAME: &str = "usertoken";

/// Creates a session cookie carrying the token, expiring with it.
pub fn create_cookie(issued: &Issued, secure: bool) -> cookie::Cookie<'static> {
	let max_age = (issued.expires_at - chrono::Utc::now()).num_seconds().max(0);

	cookie::Cookie::build((COOKIE_NAME, issued.token.clone()))
		.secure(secure)
		.http_only(true)
		.path("/")
		.max_age(cookie::time::Duration::seconds(max_age))
		.into()
}

/// Creates an empty session cookie used to invalidate a previous one
pub fn clear_cookie(secure: bool) -> cookie::Cookie<'static> {
	cookie::Cookie::build(COOKIE_NAME)
		.secure(secure)
		.http_only(true)
		.path("/")
		.max_age(cookie::time::Duration::ZERO)
		.into()
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_cookie_carries_token_and_lifetime() {
		let issued = Issued {
			token: "abc".into(),
			expires_at: chrono::Utc::now() + chrono::Duration::days(7),
		};

		let cookie = create_cookie(&issued, false).to_string();

		assert!(cookie.starts_with("usertoken=abc"));
		assert!(cookie.contains("HttpOnly"));
		assert!(cookie.contains("Max-Age=604"));
		assert!(!cookie.contains("Secure"));
	}

	#[test]
	fn test_clear_cookie_expires_immediately() {
		let cookie = clear_cookie(true).to_string();

		assert!(cookie.starts_with("usertoken="));
		assert!(cookie.contains("Max-Age=0"));
		assert!(cookie.contains("Secure"));
	}
}
