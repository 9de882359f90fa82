use std::{net::IpAddr, num::ParseIntError};

/// The secret used to sign tokens when `JWT_SECRET` is not set.
///
/// Only acceptable outside of production.
pub const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

pub const DEFAULT_CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com/v1_1";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("{name} must be a number: {source}")]
	Number {
		name: &'static str,
		#[source]
		source: ParseIntError,
	},
	#[error("{name} must be a positive duration, got {value}")]
	Duration { name: &'static str, value: i64 },
	#[error("HOST must be an IP address, got {0:?}")]
	Host(String),
	#[error("JWT_SECRET must be set in production")]
	DefaultSecret,
	#[error("{missing} must be set when {present} is set")]
	Incomplete {
		missing: &'static str,
		present: &'static str,
	},
}

/// Runtime configuration, read from the environment.
///
/// Holds secrets, so it does not implement [`std::fmt::Debug`].
#[derive(Clone)]
pub struct Config {
	pub host: IpAddr,
	pub port: u16,
	pub production: bool,
	pub database_url: Option<String>,
	pub jwt_secret: String,
	pub token_ttl: chrono::Duration,
	pub cors_origin: String,
	pub reset_code_ttl: Option<chrono::Duration>,
	pub smtp: Option<SmtpConfig>,
	pub cloudinary: Option<CloudinaryConfig>,
	pub otlp_endpoint: Option<String>,
}

#[derive(Clone)]
pub struct SmtpConfig {
	pub host: String,
	pub port: u16,
	pub username: String,
	pub password: String,
	pub from: String,
}

#[derive(Clone)]
pub struct CloudinaryConfig {
	pub cloud_name: String,
	pub api_key: String,
	pub api_secret: String,
	pub folder: Option<String>,
	pub api_base: String,
}

impl Config {
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Builds the configuration from an arbitrary variable source.
	///
	/// Empty values are treated as unset.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
		let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

		let host = match var("HOST") {
			Some(host) => host.parse().map_err(|_| ConfigError::Host(host))?,
			None => IpAddr::from([127, 0, 0, 1]),
		};

		let production = var("APP_ENV").is_some_and(|env| env.eq_ignore_ascii_case("production"));
		let jwt_secret = var("JWT_SECRET").unwrap_or_else(|| DEFAULT_JWT_SECRET.into());

		if production && jwt_secret == DEFAULT_JWT_SECRET {
			return Err(ConfigError::DefaultSecret);
		}

		let token_ttl = duration(&var, "TOKEN_TTL_DAYS", chrono::Duration::try_days)?
			.unwrap_or_else(|| chrono::Duration::days(7));
		let reset_code_ttl = duration(
			&var,
			"RESET_CODE_TTL_MINUTES",
			chrono::Duration::try_minutes,
		)?;

		Ok(Self {
			host,
			port: number(&var, "PORT")?.unwrap_or(5000),
			production,
			database_url: var("DATABASE_URL"),
			jwt_secret,
			token_ttl,
			cors_origin: var("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".into()),
			reset_code_ttl,
			smtp: smtp(&var)?,
			cloudinary: cloudinary(&var)?,
			otlp_endpoint: var("OTEL_EXPORTER_OTLP_ENDPOINT"),
		})
	}

	pub fn uses_default_secret(&self) -> bool {
		self.jwt_secret == DEFAULT_JWT_SECRET
	}

	/// Whether session cookies should carry the `Secure` attribute.
	pub fn secure_cookies(&self) -> bool {
		self.production
	}
}

fn number<T>(
	var: &impl Fn(&str) -> Option<String>,
	name: &'static str,
) -> Result<Option<T>, ConfigError>
where
	T: std::str::FromStr<Err = ParseIntError>,
{
	var(name)
		.map(|value| value.trim().parse())
		.transpose()
		.map_err(|source| ConfigError::Number { name, source })
}

/// Reads a whole number of units, which must be positive and representable.
fn duration(
	var: &impl Fn(&str) -> Option<String>,
	name: &'static str,
	unit: fn(i64) -> Option<chrono::Duration>,
) -> Result<Option<chrono::Duration>, ConfigError> {
	let Some(value) = number::<i64>(var, name)? else {
		return Ok(None);
	};

	unit(value)
		.filter(|_| value > 0)
		.map(Some)
		.ok_or(ConfigError::Duration { name, value })
}

fn smtp(var: &impl Fn(&str) -> Option<String>) -> Result<Option<SmtpConfig>, ConfigError> {
	let Some(host) = var("SMTP_HOST") else {
		return Ok(None);
	};

	let required = |name: &'static str| {
		var(name).ok_or(ConfigError::Incomplete {
			missing: name,
			present: "SMTP_HOST",
		})
	};

	Ok(Some(SmtpConfig {
		host,
		port: number(var, "SMTP_PORT")?.unwrap_or(587),
		username: required("SMTP_USERNAME")?,
		password: required("SMTP_PASSWORD")?,
		from: required("MAIL_FROM")?,
	}))
}

fn cloudinary(
	var: &impl Fn(&str) -> Option<String>,
) -> Result<Option<CloudinaryConfig>, ConfigError> {
	let Some(cloud_name) = var("CLOUDINARY_CLOUD_NAME") else {
		return Ok(None);
	};

	let required = |name: &'static str| {
		var(name).ok_or(ConfigError::Incomplete {
			missing: name,
			present: "CLOUDINARY_CLOUD_NAME",
		})
	};

	Ok(Some(CloudinaryConfig {
		cloud_name,
		api_key: required("CLOUDINARY_API_KEY")?,
		api_secret: required("CLOUDINARY_API_SECRET")?,
		folder: var("CLOUDINARY_FOLDER"),
		api_base: DEFAULT_CLOUDINARY_API_BASE.into(),
	}))
}
