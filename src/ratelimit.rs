use std::{sync::Arc, time::Duration};

use axum::{
	body::Body,
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use governor::{
	clock::QuantaInstant,
	middleware::{RateLimitingMiddleware, StateInformationMiddleware},
};
use tower_governor::{
	governor::{GovernorConfig, GovernorConfigBuilder},
	key_extractor::{KeyExtractor, PeerIpKeyExtractor},
	GovernorError,
};

use crate::error::{AppError, ErrorBody};

pub type Limits = Arc<GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>>;

/// Allows bursts of 50 requests per client IP, refilled at 10 per second.
pub fn default() -> Limits {
	Arc::new(
		GovernorConfigBuilder::default()
			.per_second(10)
			.burst_size(50)
			.use_headers()
			.error_handler(error_handler)
			.finish()
			.expect("rate limit quota is non-zero"),
	)
}

fn error_handler(error: GovernorError) -> Response<Body> {
	match error {
		GovernorError::TooManyRequests { wait_time, headers } => {
			let mut response = AppError::RateLimited {
				retry_after: wait_time,
			}
			.into_response();

			for (name, value) in headers.into_iter().flatten() {
				if let Some(name) = name {
					response.headers_mut().insert(name, value);
				}
			}

			response
		}
		GovernorError::UnableToExtractKey => {
			tracing::error!("unable to extract rate limiting key");

			(
				StatusCode::INTERNAL_SERVER_ERROR,
				Json(ErrorBody::new("Server error")),
			)
				.into_response()
		}
		GovernorError::Other { code, msg, .. } => (
			code,
			Json(ErrorBody::new(msg.unwrap_or_else(|| "Server error".into()))),
		)
			.into_response(),
	}
}

/// Periodically evicts stale entries from the limiters' storage.
pub fn cleanup_old_limits<T, M>(configs: &[&Arc<GovernorConfig<T, M>>])
where
	T: KeyExtractor,
	<T as KeyExtractor>::Key: Send + Sync + 'static,
	M: RateLimitingMiddleware<QuantaInstant> + Send + Sync + 'static,
{
	let limiters = configs
		.iter()
		.map(|config| config.limiter().clone())
		.collect::<Vec<_>>();
	let interval = Duration::from_secs(60);

	std::thread::spawn(move || loop {
		std::thread::sleep(interval);

		for limiter in &limiters {
			tracing::debug!("rate limiting storage size: {}", limiter.len());

			limiter.retain_recent();
		}
	});
}

#[cfg(test)]
mod test {
	use axum::http::header;

	use super::*;

	#[test]
	fn test_too_many_requests() {
		let response = error_handler(GovernorError::TooManyRequests {
			wait_time: 3,
			headers: None,
		});

		assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
		assert_eq!(response.headers()[header::RETRY_AFTER], "3");
	}
}
