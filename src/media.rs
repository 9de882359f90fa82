//! Image hosting for post covers.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::CloudinaryConfig;

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
	#[error("Image uploads are not configured")]
	Unconfigured,
	#[error("Only image files can be uploaded")]
	NotAnImage,
	#[error("Image must be at most 5 MB")]
	TooLarge,
	#[error("media host request failed: {0}")]
	Request(#[from] reqwest::Error),
	#[error("media host rejected the upload ({status}): {message}")]
	Rejected {
		status: reqwest::StatusCode,
		message: String,
	},
}

impl MediaError {
	/// Whether the error was caused by the uploaded file rather than the host.
	pub fn is_client_error(&self) -> bool {
		matches!(self, Self::Unconfigured | Self::NotAnImage | Self::TooLarge)
	}
}

/// A file received from the client.
#[derive(Debug, Clone)]
pub struct Upload {
	pub file_name: Option<String>,
	pub content_type: Option<String>,
	pub bytes: Bytes,
}

impl Upload {
	/// Ensures the file is an image small enough to be hosted.
	pub fn check(&self) -> Result<(), MediaError> {
		if self.bytes.len() > MAX_IMAGE_BYTES {
			return Err(MediaError::TooLarge);
		}

		if !self.mime().starts_with("image/") {
			return Err(MediaError::NotAnImage);
		}

		Ok(())
	}

	/// The declared content type, or one guessed from the file extension if
	/// the client sent none or a generic one.
	pub fn mime(&self) -> String {
		match self.content_type.as_deref() {
			Some(content_type) if content_type != "application/octet-stream" => {
				content_type.to_owned()
			}
			_ => self
				.file_name
				.as_deref()
				.map_or(mime_guess::mime::APPLICATION_OCTET_STREAM, |name| {
					mime_guess::from_path(name).first_or_octet_stream()
				})
				.to_string(),
		}
	}

	fn name(&self) -> String {
		self.file_name.clone().unwrap_or_else(|| "image".into())
	}
}

#[async_trait]
pub trait MediaHost: Send + Sync {
	/// Stores the file and returns its public URL.
	async fn upload(&self, upload: Upload) -> Result<String, MediaError>;
}

/// Rejects every upload.
pub struct Disabled;

#[async_trait]
impl MediaHost for Disabled {
	async fn upload(&self, _upload: Upload) -> Result<String, MediaError> {
		Err(MediaError::Unconfigured)
	}
}

#[derive(Deserialize)]
struct UploadResponse {
	secure_url: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
	error: ErrorMessage,
}

#[derive(Deserialize)]
struct ErrorMessage {
	message: String,
}

/// Uploads images to Cloudinary with signed requests.
pub struct Cloudinary {
	client: reqwest::Client,
	config: CloudinaryConfig,
}

impl Cloudinary {
	pub fn new(config: CloudinaryConfig) -> Self {
		Self {
			client: reqwest::Client::new(),
			config,
		}
	}

	fn endpoint(&self) -> String {
		format!(
			"{}/{}/image/upload",
			self.config.api_base.trim_end_matches('/'),
			self.config.cloud_name
		)
	}
}

/// Signs upload parameters: the `key=value` pairs sorted by key and joined
/// with `&`, followed by the secret, hashed with SHA-256.
fn sign(params: &[(&str, &str)], secret: &str) -> String {
	let mut params = params.to_vec();
	params.sort_unstable_by_key(|(key, _)| *key);

	let joined = params
		.iter()
		.map(|(key, value)| format!("{key}={value}"))
		.collect::<Vec<_>>()
		.join("&");

	hex::encode(Sha256::digest(format!("{joined}{secret}")))
}

#[async_trait]
impl MediaHost for Cloudinary {
	async fn upload(&self, upload: Upload) -> Result<String, MediaError> {
		upload.check()?;

		let timestamp = chrono::Utc::now().timestamp().to_string();
		let mut params = vec![("timestamp", timestamp.as_str())];

		if let Some(folder) = &self.config.folder {
			params.push(("folder", folder.as_str()));
		}

		let signature = sign(&params, &self.config.api_secret);

		let file = Part::bytes(upload.bytes.to_vec())
			.file_name(upload.name())
			.mime_str(&upload.mime())?;

		let mut form = Form::new()
			.text("api_key", self.config.api_key.clone())
			.text("signature", signature)
			.text("signature_algorithm", "sha256")
			.part("file", file);

		for (key, value) in params {
			form = form.text(key.to_owned(), value.to_owned());
		}

		let response = self
			.client
			.post(self.endpoint())
			.multipart(form)
			.send()
			.await?;

		let status = response.status();

		if !status.is_success() {
			let message = response
				.json::<ErrorResponse>()
				.await
				.map_or_else(|_| "unknown error".into(), |body| body.error.message);

			return Err(MediaError::Rejected { status, message });
		}

		let body = response.json::<UploadResponse>().await?;

		tracing::debug!(url = %body.secure_url, "uploaded image");

		Ok(body.secure_url)
	}
}

/// Keeps uploads in memory and hands out fake URLs.
#[derive(Clone, Default)]
pub struct MemoryMediaHost {
	uploads: Arc<Mutex<Vec<Upload>>>,
}

impl MemoryMediaHost {
	pub const BASE_URL: &'static str = "https://media.invalid/";

	pub async fn uploads(&self) -> Vec<Upload> {
		self.uploads.lock().await.clone()
	}
}

#[async_trait]
impl MediaHost for MemoryMediaHost {
	async fn upload(&self, upload: Upload) -> Result<String, MediaError> {
		upload.check()?;

		let url = format!("{}{}/{}", Self::BASE_URL, Uuid::new_v4(), upload.name());
		self.uploads.lock().await.push(upload);

		Ok(url)
	}
}
