pub use crate::model::Post;

use macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::hashtag::Hashtags;

/// A new post.
///
/// Accepted as JSON or as `multipart/form-data` with the same field names. In a
/// multipart body, `image` may instead be an image file.
#[model(update = "UpdatePost")]
#[derive(Debug, Default, Deserialize, Serialize, Validate, JsonSchema)]
pub struct CreatePost {
	#[validate(length(
		min = 1,
		max = 200,
		message = "Title must be between 1 and 200 characters"
	))]
	pub title: String,
	/// The content of the post.
	#[validate(length(min = 1, message = "Body is required"))]
	pub body: String,
	/// A public URL of the cover image.
	#[validate(url(message = "Image must be a valid URL"))]
	pub image: Option<String>,
	/// Either a comma-separated string or an array of strings.
	#[serde(default)]
	pub hashtags: Hashtags,
}

#[derive(Debug, Deserialize, Serialize, Validate, JsonSchema)]
pub struct SearchInput {
	/// Comma-separated hashtags. Posts having any of them match.
	pub hashtags: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct PostResponse {
	pub message: String,
	pub blog: Post,
}
