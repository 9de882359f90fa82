//! Persistence for users, posts and comments.
//!
//! Every operation touches a single record, so no transactions are exposed.
//! Lists are always ordered newest first.

mod memory;
mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::model::{Comment, Post, User};

pub type Database = sqlx::Pool<sqlx::Postgres>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	#[error("email already taken")]
	EmailTaken,
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("migration error: {0}")]
	Migrate(#[from] sqlx::migrate::MigrateError),
}

#[derive(Debug, Clone)]
pub struct NewUser {
	pub id: Uuid,
	pub firstname: String,
	pub lastname: String,
	pub email: String,
	pub password: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
	pub author_id: Uuid,
	pub title: String,
	pub body: String,
	pub image: Option<String>,
	pub hashtags: Vec<String>,
}

/// Fields left as `None` keep their current value.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
	pub title: Option<String>,
	pub body: Option<String>,
	pub image: Option<String>,
	pub hashtags: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
	pub author_id: Uuid,
	pub post_id: Uuid,
	pub content: String,
}

#[async_trait]
pub trait UserStore: Send + Sync {
	/// Fails with [`StoreError::EmailTaken`] if the email is in use.
	async fn insert(&self, user: NewUser) -> Result<User, StoreError>;

	async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

	async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

	/// Replaces any pending reset code of the user.
	async fn set_reset_code(&self, id: Uuid, code: &str) -> Result<(), StoreError>;

	/// Sets a new password and clears the reset code, but only if `code` is
	/// still the pending one. Returns whether the password was changed.
	async fn reset_password(
		&self,
		id: Uuid,
		code: &str,
		password: &[u8],
	) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait PostStore: Send + Sync {
	async fn insert(&self, post: NewPost) -> Result<Post, StoreError>;

	async fn find(&self, id: Uuid) -> Result<Option<Post>, StoreError>;

	async fn list(&self) -> Result<Vec<Post>, StoreError>;

	async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<Post>, StoreError>;

	/// Posts having at least one of `hashtags`, compared exactly.
	async fn search(&self, hashtags: &[String]) -> Result<Vec<Post>, StoreError>;

	/// The `limit` posts with the most hashtags, newest first among ties.
	async fn trending(&self, limit: usize) -> Result<Vec<Post>, StoreError>;

	/// Returns `None` if the post does not exist.
	async fn update(&self, id: Uuid, changes: PostChanges) -> Result<Option<Post>, StoreError>;

	/// Returns whether a post was deleted.
	async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait CommentStore: Send + Sync {
	async fn insert(&self, comment: NewComment) -> Result<Comment, StoreError>;

	async fn find(&self, id: Uuid) -> Result<Option<Comment>, StoreError>;

	async fn list_by_post(&self, post_id: Uuid) -> Result<Vec<Comment>, StoreError>;

	/// Includes the title of each commented post that still exists.
	async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<Comment>, StoreError>;

	async fn update(&self, id: Uuid, content: &str) -> Result<Option<Comment>, StoreError>;

	async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// Handles to every store, shared by the request handlers.
#[derive(Clone)]
pub struct Store {
	pub users: Arc<dyn UserStore>,
	pub posts: Arc<dyn PostStore>,
	pub comments: Arc<dyn CommentStore>,
}

impl Store {
	/// Connects to Postgres and applies pending migrations.
	pub async fn connect(url: &str) -> Result<Self, StoreError> {
		let pool = Database::connect(url).await?;

		sqlx::migrate!().run(&pool).await?;

		Ok(Self::postgres(pool))
	}

	pub fn postgres(pool: Database) -> Self {
		let store = Arc::new(PgStore::new(pool));

		Self {
			users: store.clone(),
			posts: store.clone(),
			comments: store,
		}
	}

	/// A store that lives only as long as the process.
	pub fn memory() -> Self {
		let store = Arc::new(MemoryStore::default());

		Self {
			users: store.clone(),
			posts: store.clone(),
			comments: store,
		}
	}
}
