pub use crate::model::Comment;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Serialize, Validate, JsonSchema)]
pub struct CreateComment {
	#[validate(length(min = 1, message = "Content is required"))]
	pub content: String,
	/// The post being commented on.
	#[serde(rename = "postId")]
	pub post_id: String,
}

impl CreateComment {
	pub fn post_id(&self) -> Option<Uuid> {
		self.post_id.parse().ok()
	}
}

#[derive(Debug, Deserialize, Serialize, Validate, JsonSchema)]
pub struct UpdateComment {
	#[validate(length(min = 1, message = "Content is required"))]
	pub content: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CommentResponse {
	pub message: String,
	pub comment: Comment,
}
