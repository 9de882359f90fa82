//! A typed client for the HTTP API, with caching state containers.

use std::sync::{
	atomic::{AtomicU64, Ordering},
	Arc,
};

use reqwest::{
	header,
	multipart::{Form, Part},
	Method, RequestBuilder, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::{
	error::{ErrorBody, FieldMessage},
	extract::IMAGE_FIELD,
};

pub mod account;
pub mod blogs;
pub mod cache;
pub mod comments;

pub use account::Account;
pub use blogs::{BlogView, Blogs};
pub use cache::{Resource, ResourceCache};
pub use comments::{CommentView, Comments};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
	#[error("request failed: {0}")]
	Http(#[from] reqwest::Error),
	#[error("{message} ({status})")]
	Api {
		status: StatusCode,
		message: String,
		errors: Vec<FieldMessage>,
	},
}

impl ClientError {
	pub fn status(&self) -> Option<StatusCode> {
		match self {
			Self::Http(error) => error.status(),
			Self::Api { status, .. } => Some(*status),
		}
	}

	pub fn is_unauthorized(&self) -> bool {
		self.status() == Some(StatusCode::UNAUTHORIZED)
	}

	pub fn is_not_found(&self) -> bool {
		self.status() == Some(StatusCode::NOT_FOUND)
	}
}

/// An image file to attach to a post.
#[derive(Debug, Clone)]
pub struct Image {
	pub file_name: String,
	pub bytes: Vec<u8>,
}

impl Image {
	fn into_part(self) -> Result<Part, ClientError> {
		let mime = mime_guess::from_path(&self.file_name).first_or_octet_stream();

		Ok(Part::bytes(self.bytes)
			.file_name(self.file_name)
			.mime_str(mime.as_ref())?)
	}
}

/// Sends requests to the API, attaching the bearer token when one is held.
///
/// Clones share the token. Any 401 response forgets it.
#[derive(Clone)]
pub struct ApiClient {
	http: reqwest::Client,
	base_url: Arc<str>,
	token: Arc<RwLock<Option<String>>>,
	session: Arc<AtomicU64>,
}

impl ApiClient {
	/// `base_url` is the server origin, such as `http://localhost:5000`.
	pub fn new(base_url: &str) -> Self {
		Self::with_client(reqwest::Client::new(), base_url)
	}

	pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
		Self {
			http,
			base_url: base_url.trim_end_matches('/').into(),
			token: Arc::default(),
			session: Arc::default(),
		}
	}

	pub async fn token(&self) -> Option<String> {
		self.token.read().await.clone()
	}

	pub async fn set_token(&self, token: Option<String>) {
		let mut current = self.token.write().await;

		if *current != token {
			*current = token;
			self.session.fetch_add(1, Ordering::Relaxed);
		}
	}

	/// Changes whenever the token does, so per-user data can be dropped.
	pub fn session(&self) -> u64 {
		self.session.load(Ordering::Relaxed)
	}

	async fn request(&self, method: Method, path: &str) -> RequestBuilder {
		let builder = self.http.request(method, format!("{}{path}", self.base_url));

		match self.token.read().await.as_deref() {
			Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {token}")),
			None => builder,
		}
	}

	async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
		let response = builder.send().await?;
		let status = response.status();

		if status.is_success() {
			return Ok(response.json().await?);
		}

		if status == StatusCode::UNAUTHORIZED {
			self.set_token(None).await;
		}

		let body = response
			.json::<ErrorBody>()
			.await
			.unwrap_or_else(|_| ErrorBody::new(status.canonical_reason().unwrap_or("Request failed")));

		tracing::debug!(%status, message = %body.message, "api request failed");

		Err(ClientError::Api {
			status,
			message: body.message,
			errors: body.errors,
		})
	}

	pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
		self.send(self.request(Method::GET, path).await).await
	}

	pub(crate) async fn get_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
		&self,
		path: &str,
		query: &Q,
	) -> Result<T, ClientError> {
		self.send(self.request(Method::GET, path).await.query(query))
			.await
	}

	pub(crate) async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
		self.send(self.request(Method::DELETE, path).await).await
	}

	pub(crate) async fn json<T: DeserializeOwned, B: Serialize + ?Sized>(
		&self,
		method: Method,
		path: &str,
		body: &B,
	) -> Result<T, ClientError> {
		self.send(self.request(method, path).await.json(body)).await
	}

	/// Sends `fields` as JSON, or as multipart alongside the image if any.
	pub(crate) async fn form<T: DeserializeOwned, B: Serialize + ?Sized>(
		&self,
		method: Method,
		path: &str,
		fields: &B,
		image: Option<Image>,
	) -> Result<T, ClientError> {
		let Some(image) = image else {
			return self.json(method, path, fields).await;
		};

		let form = multipart_fields(fields)?.part(IMAGE_FIELD, image.into_part()?);

		self.send(self.request(method, path).await.multipart(form))
			.await
	}
}

/// Top-level fields become text parts. Arrays are joined with commas and
/// nulls are left out.
fn multipart_fields<B: Serialize + ?Sized>(fields: &B) -> Result<Form, ClientError> {
	let Ok(Value::Object(fields)) = serde_json::to_value(fields) else {
		return Ok(Form::new());
	};

	Ok(fields
		.into_iter()
		.fold(Form::new(), |form, (name, value)| match text_value(value) {
			Some(text) => form.text(name, text),
			None => form,
		}))
}

fn text_value(value: Value) -> Option<String> {
	match value {
		Value::Null => None,
		Value::String(text) => Some(text),
		Value::Array(items) => Some(
			items
				.into_iter()
				.filter_map(text_value)
				.collect::<Vec<_>>()
				.join(", "),
		),
		other => Some(other.to_string()),
	}
}
