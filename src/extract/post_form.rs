use aide::OperationInput;
use axum::{
	extract::{FromRequest, Multipart, Request},
	http::header,
};
use schemars::JsonSchema;
use serde::de;
use serde_json::{Map, Value};

use super::Json;
use crate::{error::AppError, media::Upload};

/// The multipart part carrying an image file.
pub const IMAGE_FIELD: &str = "image";

/// Post input accepted either as JSON or as `multipart/form-data`.
///
/// Multipart text fields are read as if they were JSON string members, so the
/// same validation applies to both encodings. A file sent in the `image` part
/// is returned separately as an [`Upload`] for the media host.
pub struct PostForm<T> {
	pub fields: T,
	pub upload: Option<Upload>,
}

#[axum::async_trait]
impl<T, S> FromRequest<S> for PostForm<T>
where
	T: de::DeserializeOwned + validator::Validate,
	S: Send + Sync,
{
	type Rejection = AppError;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		if !is_multipart(&req) {
			let Json(fields) = Json::<T>::from_request(req, state).await?;

			return Ok(Self {
				fields,
				upload: None,
			});
		}

		let mut multipart = Multipart::from_request(req, state).await?;
		let mut object = Map::new();
		let mut upload = None;

		while let Some(field) = multipart.next_field().await? {
			let Some(name) = field.name().map(str::to_owned) else {
				continue;
			};

			if name == IMAGE_FIELD && field.file_name().is_some() {
				let file_name = field.file_name().map(str::to_owned);
				let content_type = field.content_type().map(str::to_owned);
				let bytes = field.bytes().await?;

				// Browsers send an empty part when no file was picked
				if !bytes.is_empty() {
					upload = Some(Upload {
						file_name,
						content_type,
						bytes,
					});
				}

				continue;
			}

			let text = field.text().await?;

			if !text.is_empty() {
				object.insert(name, Value::String(text));
			}
		}

		let fields = serde_json::from_value::<T>(Value::Object(object)).map_err(AppError::Form)?;
		fields.validate()?;

		Ok(Self { fields, upload })
	}
}

fn is_multipart(req: &Request) -> bool {
	req.headers()
		.get(header::CONTENT_TYPE)
		.and_then(|value| value.to_str().ok())
		.is_some_and(|value| value.starts_with("multipart/form-data"))
}

impl<T: JsonSchema> OperationInput for PostForm<T> {
	fn operation_input(ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		axum_jsonschema::Json::<T>::operation_input(ctx, operation);
	}
}
