#![warn(clippy::pedantic)]

use std::process::ExitCode;

use quill::config::Config;

#[tokio::main]
async fn main() -> ExitCode {
	dotenvy::dotenv().ok();

	let config = match Config::from_env() {
		Ok(config) => config,
		Err(error) => {
			eprintln!("invalid configuration: {error}");
			return ExitCode::FAILURE;
		}
	};

	let _guard = match quill::trace::init(&config) {
		Ok(guard) => guard,
		Err(error) => {
			eprintln!("failed to initialize telemetry: {error}");
			return ExitCode::FAILURE;
		}
	};

	if config.uses_default_secret() {
		tracing::warn!("JWT_SECRET is not set, tokens are signed with a publicly known key");
	}

	match quill::run(config).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(error) => {
			tracing::error!(%error, "server stopped");
			ExitCode::FAILURE
		}
	}
}
