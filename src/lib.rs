#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod hashtag;
pub mod mail;
pub mod media;
pub mod model;
pub mod openapi;
pub mod ratelimit;
pub mod route;
pub mod session;
pub mod store;
pub mod token;
pub mod trace;

use std::{net::SocketAddr, sync::Arc};

use aide::{axum::ApiRouter, openapi::OpenApi};
use argon2::Argon2;
use axum::{
	body::Body,
	http::{header, HeaderValue, Method, Request},
	Extension, Router,
};
use tower::ServiceBuilder;
use tower_governor::GovernorLayer;
use tower_http::{
	compression::CompressionLayer,
	cors::CorsLayer,
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	trace::TraceLayer,
};

use crate::{
	config::Config,
	mail::{LogMailer, MailError, Mailer, SmtpMailer},
	media::{Cloudinary, MediaHost},
	store::{Store, StoreError},
	token::Tokens,
};

pub type AppState = State;

/// The shared application state.
///
/// This should contain all shared dependencies that handlers need to access,
/// such as the store, a hash configuration (if it's expensive to create),
/// or outbound clients.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub store: Store,
	pub hasher: Argon2<'static>,
	pub tokens: Tokens,
	pub mailer: Arc<dyn Mailer>,
	pub media: Arc<dyn MediaHost>,
	pub config: Arc<Config>,
}

impl State {
	pub fn new(
		config: Config,
		store: Store,
		mailer: Arc<dyn Mailer>,
		media: Arc<dyn MediaHost>,
	) -> Self {
		Self {
			store,
			hasher: Argon2::default(),
			tokens: Tokens::new(config.jwt_secret.as_bytes(), config.token_ttl),
			mailer,
			media,
			config: Arc::new(config),
		}
	}

	/// Replaces the default password hashing parameters.
	#[must_use]
	pub fn with_hasher(mut self, hasher: Argon2<'static>) -> Self {
		self.hasher = hasher;
		self
	}
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
	#[error("failed to open store: {0}")]
	Store(#[from] StoreError),
	#[error("failed to set up mail transport: {0}")]
	Mail(#[from] MailError),
	#[error("failed to bind to {addr}: {source}")]
	Bind {
		addr: SocketAddr,
		#[source]
		source: std::io::Error,
	},
	#[error("server error: {0}")]
	Serve(#[source] std::io::Error),
}

fn cors(config: &Config) -> CorsLayer {
	let origins = config
		.cors_origin
		.split(',')
		.filter_map(|origin| match origin.trim().parse::<HeaderValue>() {
			Ok(origin) => Some(origin),
			Err(_) => {
				tracing::warn!(origin, "ignoring invalid CORS origin");
				None
			}
		})
		.collect::<Vec<_>>();

	CorsLayer::new()
		.allow_origin(origins)
		.allow_credentials(true)
		.allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
		.allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Builds the application router, including the API documentation.
///
/// Rate limiting is left to [`run`], since it needs the peer address.
pub fn app(state: AppState) -> Router {
	aide::gen::extract_schemas(true);

	let mut api = OpenApi::default();
	let cors = cors(&state.config);

	ApiRouter::new()
		.merge(route::routes())
		.nest_api_service("/docs", route::docs::routes())
		.finish_api_with(&mut api, openapi::docs)
		.layer(Extension(Arc::new(api)))
		.layer(
			ServiceBuilder::new()
				.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
				.layer(
					TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
						let request_id = request
							.headers()
							.get("x-request-id")
							.and_then(|value| value.to_str().ok())
							.unwrap_or_default();

						tracing::info_span!(
							"request",
							method = %request.method(),
							uri = %request.uri(),
							request_id
						)
					}),
				)
				.layer(PropagateRequestIdLayer::x_request_id())
				.layer(CompressionLayer::new())
				.layer(cors),
		)
		.with_state(state)
}

/// Opens the configured store and outbound integrations, then serves the
/// application until ctrl-c is received.
pub async fn run(config: Config) -> Result<(), StartupError> {
	let store = if let Some(url) = &config.database_url {
		Store::connect(url).await?
	} else {
		tracing::warn!("DATABASE_URL is not set, data is kept in memory and lost on restart");
		Store::memory()
	};

	let mailer: Arc<dyn Mailer> = if let Some(smtp) = &config.smtp {
		Arc::new(SmtpMailer::new(smtp)?)
	} else {
		tracing::warn!("SMTP is not configured, emails are written to the log");
		Arc::new(LogMailer)
	};

	let media: Arc<dyn MediaHost> = if let Some(cloudinary) = config.cloudinary.clone() {
		Arc::new(Cloudinary::new(cloudinary))
	} else {
		tracing::info!("media host is not configured, image uploads are disabled");
		Arc::new(media::Disabled)
	};

	let addr = SocketAddr::new(config.host, config.port);
	let state = State::new(config, store, mailer, media);

	let limits = ratelimit::default();
	ratelimit::cleanup_old_limits(&[&limits]);

	let app = app(state).layer(GovernorLayer {
		config: limits.clone(),
	});

	let listener = tokio::net::TcpListener::bind(addr)
		.await
		.map_err(|source| StartupError::Bind { addr, source })?;

	tracing::info!("listening on {}", addr);

	axum::serve(
		listener,
		app.into_make_service_with_connect_info::<SocketAddr>(),
	)
	.with_graceful_shutdown(shutdown_signal())
	.await
	.map_err(StartupError::Serve)
}

async fn shutdown_signal() {
	if let Err(error) = tokio::signal::ctrl_c().await {
		tracing::error!(%error, "failed to listen for shutdown signal");
		std::future::pending::<()>().await;
	}

	tracing::info!("shutting down");
}
