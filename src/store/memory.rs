use std::{cmp::Reverse, collections::HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
	CommentStore, NewComment, NewPost, NewUser, PostChanges, PostStore, StoreError, UserStore,
};
use crate::{
	hashtag,
	model::{Author, Comment, Post, User},
};

struct PostRecord {
	id: Uuid,
	author_id: Uuid,
	title: String,
	body: String,
	image: Option<String>,
	hashtags: Vec<String>,
	created_at: DateTime<Utc>,
	updated_at: DateTime<Utc>,
}

struct CommentRecord {
	id: Uuid,
	author_id: Uuid,
	post_id: Uuid,
	content: String,
	created_at: DateTime<Utc>,
	updated_at: DateTime<Utc>,
}

#[derive(Default)]
struct State {
	users: HashMap<Uuid, User>,
	/// In insertion order.
	posts: Vec<PostRecord>,
	/// In insertion order.
	comments: Vec<CommentRecord>,
}

impl State {
	fn post(&self, record: &PostRecord) -> Option<Post> {
		let author = self.users.get(&record.author_id)?;

		Some(Post {
			id: record.id,
			title: record.title.clone(),
			body: record.body.clone(),
			image: record.image.clone(),
			hashtags: record.hashtags.clone(),
			author: author.into(),
			created_at: record.created_at,
			updated_at: record.updated_at,
		})
	}

	fn comment(&self, record: &CommentRecord, with_title: bool) -> Option<Comment> {
		let author = self.users.get(&record.author_id)?;
		let post_title = with_title
			.then(|| self.posts.iter().find(|post| post.id == record.post_id))
			.flatten()
			.map(|post| post.title.clone());

		Some(Comment {
			id: record.id,
			content: record.content.clone(),
			post_id: record.post_id,
			post_title,
			author: Author::from(author),
			created_at: record.created_at,
			updated_at: record.updated_at,
		})
	}

	/// Matching posts, newest first.
	fn posts_where(&self, predicate: impl Fn(&PostRecord) -> bool) -> Vec<Post> {
		let mut posts = self
			.posts
			.iter()
			.rev()
			.filter(|record| predicate(record))
			.filter_map(|record| self.post(record))
			.collect::<Vec<_>>();

		posts.sort_by_key(|post| Reverse(post.created_at));
		posts
	}

	/// Matching comments, newest first.
	fn comments_where(
		&self,
		with_title: bool,
		predicate: impl Fn(&CommentRecord) -> bool,
	) -> Vec<Comment> {
		let mut comments = self
			.comments
			.iter()
			.rev()
			.filter(|record| predicate(record))
			.filter_map(|record| self.comment(record, with_title))
			.collect::<Vec<_>>();

		comments.sort_by_key(|comment| Reverse(comment.created_at));
		comments
	}
}

/// A store kept in process memory, used when no database is configured
/// and in tests. Everything is lost on restart.
#[derive(Default)]
pub struct MemoryStore {
	state: RwLock<State>,
}

#[async_trait]
impl UserStore for MemoryStore {
	async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
		let mut state = self.state.write().await;

		if state.users.values().any(|u| u.email == user.email) {
			return Err(StoreError::EmailTaken);
		}

		let now = Utc::now();
		let user = User {
			id: user.id,
			firstname: user.firstname,
			lastname: user.lastname,
			email: user.email,
			password: user.password,
			reset_code: None,
			reset_code_issued_at: None,
			created_at: now,
			updated_at: now,
		};

		state.users.insert(user.id, user.clone());

		Ok(user)
	}

	async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
		Ok(self.state.read().await.users.get(&id).cloned())
	}

	async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
		Ok(self
			.state
			.read()
			.await
			.users
			.values()
			.find(|user| user.email == email)
			.cloned())
	}

	async fn set_reset_code(&self, id: Uuid, code: &str) -> Result<(), StoreError> {
		if let Some(user) = self.state.write().await.users.get_mut(&id) {
			let now = Utc::now();

			user.reset_code = Some(code.to_owned());
			user.reset_code_issued_at = Some(now);
			user.updated_at = now;
		}

		Ok(())
	}

	async fn reset_password(
		&self,
		id: Uuid,
		code: &str,
		password: &[u8],
	) -> Result<bool, StoreError> {
		let mut state = self.state.write().await;

		let Some(user) = state
			.users
			.get_mut(&id)
			.filter(|user| user.reset_code.as_deref() == Some(code))
		else {
			return Ok(false);
		};

		user.password = password.to_vec();
		user.reset_code = None;
		user.reset_code_issued_at = None;
		user.updated_at = Utc::now();

		Ok(true)
	}
}

#[async_trait]
impl PostStore for MemoryStore {
	async fn insert(&self, post: NewPost) -> Result<Post, StoreError> {
		let mut state = self.state.write().await;
		let now = Utc::now();

		let record = PostRecord {
			id: Uuid::new_v4(),
			author_id: post.author_id,
			title: post.title,
			body: post.body,
			image: post.image,
			hashtags: post.hashtags,
			created_at: now,
			updated_at: now,
		};

		let post = state.post(&record);
		state.posts.push(record);

		post.ok_or(StoreError::Database(sqlx::Error::RowNotFound))
	}

	async fn find(&self, id: Uuid) -> Result<Option<Post>, StoreError> {
		let state = self.state.read().await;

		Ok(state
			.posts
			.iter()
			.find(|record| record.id == id)
			.and_then(|record| state.post(record)))
	}

	async fn list(&self) -> Result<Vec<Post>, StoreError> {
		Ok(self.state.read().await.posts_where(|_| true))
	}

	async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<Post>, StoreError> {
		Ok(self
			.state
			.read()
			.await
			.posts_where(|record| record.author_id == author_id))
	}

	async fn search(&self, hashtags: &[String]) -> Result<Vec<Post>, StoreError> {
		Ok(self.state.read().await.posts_where(|record| {
			record.hashtags.iter().any(|tag| hashtags.contains(tag))
		}))
	}

	async fn trending(&self, limit: usize) -> Result<Vec<Post>, StoreError> {
		let posts = self.state.read().await.posts_where(|_| true);

		Ok(hashtag::rank_trending(posts, limit))
	}

	async fn update(&self, id: Uuid, changes: PostChanges) -> Result<Option<Post>, StoreError> {
		let mut state = self.state.write().await;

		let Some(record) = state.posts.iter_mut().find(|record| record.id == id) else {
			return Ok(None);
		};

		if let Some(title) = changes.title {
			record.title = title;
		}

		if let Some(body) = changes.body {
			record.body = body;
		}

		if let Some(image) = changes.image {
			record.image = Some(image);
		}

		if let Some(hashtags) = changes.hashtags {
			record.hashtags = hashtags;
		}

		record.updated_at = Utc::now();

		let state = &*state;

		Ok(state
			.posts
			.iter()
			.find(|record| record.id == id)
			.and_then(|record| state.post(record)))
	}

	async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
		let mut state = self.state.write().await;
		let before = state.posts.len();

		state.posts.retain(|record| record.id != id);

		Ok(state.posts.len() != before)
	}
}

#[async_trait]
impl CommentStore for MemoryStore {
	async fn insert(&self, comment: NewComment) -> Result<Comment, StoreError> {
		let mut state = self.state.write().await;
		let now = Utc::now();

		let record = CommentRecord {
			id: Uuid::new_v4(),
			author_id: comment.author_id,
			post_id: comment.post_id,
			content: comment.content,
			created_at: now,
			updated_at: now,
		};

		let comment = state.comment(&record, false);
		state.comments.push(record);

		comment.ok_or(StoreError::Database(sqlx::Error::RowNotFound))
	}

	async fn find(&self, id: Uuid) -> Result<Option<Comment>, StoreError> {
		let state = self.state.read().await;

		Ok(state
			.comments
			.iter()
			.find(|record| record.id == id)
			.and_then(|record| state.comment(record, false)))
	}

	async fn list_by_post(&self, post_id: Uuid) -> Result<Vec<Comment>, StoreError> {
		Ok(self
			.state
			.read()
			.await
			.comments_where(false, |record| record.post_id == post_id))
	}

	async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<Comment>, StoreError> {
		Ok(self
			.state
			.read()
			.await
			.comments_where(true, |record| record.author_id == author_id))
	}

	async fn update(&self, id: Uuid, content: &str) -> Result<Option<Comment>, StoreError> {
		let mut state = self.state.write().await;

		let Some(record) = state.comments.iter_mut().find(|record| record.id == id) else {
			return Ok(None);
		};

		content.clone_into(&mut record.content);
		record.updated_at = Utc::now();

		let state = &*state;

		Ok(state
			.comments
			.iter()
			.find(|record| record.id == id)
			.and_then(|record| state.comment(record, false)))
	}

	async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
		let mut state = self.state.write().await;
		let before = state.comments.len();

		state.comments.retain(|record| record.id != id);

		Ok(state.comments.len() != before)
	}
}

#[cfg(test)]
mod test {
	use super::*;

	async fn user(store: &MemoryStore, email: &str) -> User {
		UserStore::insert(
			store,
			NewUser {
				id: Uuid::new_v4(),
				firstname: "Ada".into(),
				lastname: "Lovelace".into(),
				email: email.into(),
				password: vec![0; 32],
			},
		)
		.await
		.unwrap()
	}

	async fn post(store: &MemoryStore, author_id: Uuid, hashtags: &[&str]) -> Post {
		PostStore::insert(
			store,
			NewPost {
				author_id,
				title: format!("{} tags", hashtags.len()),
				body: "Body".into(),
				image: None,
				hashtags: hashtags.iter().map(ToString::to_string).collect(),
			},
		)
		.await
		.unwrap()
	}

	#[tokio::test]
	async fn test_duplicate_email() {
		let store = MemoryStore::default();

		user(&store, "ada@example.com").await;

		let result = UserStore::insert(
			&store,
			NewUser {
				id: Uuid::new_v4(),
				firstname: "Other".into(),
				lastname: "Person".into(),
				email: "ada@example.com".into(),
				password: Vec::new(),
			},
		)
		.await;

		assert!(matches!(result, Err(StoreError::EmailTaken)));
	}

	#[tokio::test]
	async fn test_reset_code_is_single_use() {
		let store = MemoryStore::default();
		let user = user(&store, "ada@example.com").await;

		store.set_reset_code(user.id, "12345").await.unwrap();

		assert!(!store.reset_password(user.id, "11111", &[1]).await.unwrap());
		assert!(store.reset_password(user.id, "12345", &[1]).await.unwrap());
		assert!(!store.reset_password(user.id, "12345", &[2]).await.unwrap());

		let user = store.find_by_id(user.id).await.unwrap().unwrap();

		assert_eq!(user.password, [1]);
		assert!(user.reset_code.is_none());
	}

	#[tokio::test]
	async fn test_lists_are_newest_first() {
		let store = MemoryStore::default();
		let ada = user(&store, "ada@example.com").await;
		let bob = user(&store, "bob@example.com").await;

		let first = post(&store, ada.id, &["a"]).await;
		let second = post(&store, bob.id, &["b"]).await;
		let third = post(&store, ada.id, &["a", "b"]).await;

		let all = store.list().await.unwrap();

		assert_eq!(
			all.iter().map(|p| p.id).collect::<Vec<_>>(),
			[third.id, second.id, first.id]
		);

		let mine = PostStore::list_by_author(&store, ada.id).await.unwrap();

		assert_eq!(
			mine.iter().map(|p| p.id).collect::<Vec<_>>(),
			[third.id, first.id]
		);

		let found = store.search(&["b".into()]).await.unwrap();

		assert_eq!(
			found.iter().map(|p| p.id).collect::<Vec<_>>(),
			[third.id, second.id]
		);
	}

	#[tokio::test]
	async fn test_trending_ties_newest_first() {
		let store = MemoryStore::default();
		let ada = user(&store, "ada@example.com").await;

		post(&store, ada.id, &["a"]).await;
		let older = post(&store, ada.id, &["a", "b", "c"]).await;
		post(&store, ada.id, &["a", "b", "c", "d", "e"]).await;
		let newer = post(&store, ada.id, &["x", "y", "z"]).await;

		let trending = store.trending(10).await.unwrap();
		let counts = trending.iter().map(|p| p.hashtags.len()).collect::<Vec<_>>();

		assert_eq!(counts, [5, 3, 3, 1]);
		assert_eq!(trending[1].id, newer.id);
		assert_eq!(trending[2].id, older.id);
		assert_eq!(store.trending(2).await.unwrap().len(), 2);
	}

	#[tokio::test]
	async fn test_update_keeps_absent_fields() {
		let store = MemoryStore::default();
		let ada = user(&store, "ada@example.com").await;
		let created = post(&store, ada.id, &["a"]).await;

		let updated = PostStore::update(
			&store,
			created.id,
			PostChanges {
				body: Some("New body".into()),
				..Default::default()
			},
		)
		.await
		.unwrap()
		.unwrap();

		assert_eq!(updated.title, created.title);
		assert_eq!(updated.body, "New body");
		assert_eq!(updated.hashtags, ["a"]);

		assert!(PostStore::update(&store, Uuid::new_v4(), PostChanges::default())
			.await
			.unwrap()
			.is_none());
	}

	#[tokio::test]
	async fn test_comments_outlive_their_post() {
		let store = MemoryStore::default();
		let ada = user(&store, "ada@example.com").await;
		let created = post(&store, ada.id, &[]).await;

		CommentStore::insert(
			&store,
			NewComment {
				author_id: ada.id,
				post_id: created.id,
				content: "Nice".into(),
			},
		)
		.await
		.unwrap();

		let mine = CommentStore::list_by_author(&store, ada.id).await.unwrap();

		assert_eq!(mine[0].post_title.as_deref(), Some("0 tags"));

		assert!(PostStore::delete(&store, created.id).await.unwrap());

		let mine = CommentStore::list_by_author(&store, ada.id).await.unwrap();

		assert_eq!(mine.len(), 1);
		assert!(mine[0].post_title.is_none());
		assert_eq!(store.list_by_post(created.id).await.unwrap().len(), 1);
	}
}
