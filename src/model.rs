use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A model representing a single user.
///
/// Never sent to the client directly; see [`Profile`] and [`Author`].
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
	pub id: Uuid,
	pub firstname: String,
	pub lastname: String,
	pub email: String,
	/// argon2 and salted with `id`
	pub password: Vec<u8>,
	pub reset_code: Option<String>,
	pub reset_code_issued_at: Option<DateTime<Utc>>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

/// The authenticated user's own account.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
	pub id: Uuid,
	pub firstname: String,
	pub lastname: String,
	pub email: String,
	pub created_at: DateTime<Utc>,
}

impl From<User> for Profile {
	fn from(user: User) -> Self {
		Self {
			id: user.id,
			firstname: user.firstname,
			lastname: user.lastname,
			email: user.email,
			created_at: user.created_at,
		}
	}
}

/// The public name of whoever wrote a post or comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Author {
	pub id: Uuid,
	pub firstname: String,
	pub lastname: String,
}

impl From<&User> for Author {
	fn from(user: &User) -> Self {
		Self {
			id: user.id,
			firstname: user.firstname.clone(),
			lastname: user.lastname.clone(),
		}
	}
}

/// A single blog post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Post {
	pub id: Uuid,
	pub title: String,
	pub body: String,
	/// A public URL of the cover image.
	pub image: Option<String>,
	pub hashtags: Vec<String>,
	pub author: Author,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

/// A comment on a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
	pub id: Uuid,
	pub content: String,
	pub post_id: Uuid,
	/// The title of the commented post. Only present when listing your own
	/// comments, and only while the post exists.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub post_title: Option<String>,
	pub author: Author,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}
