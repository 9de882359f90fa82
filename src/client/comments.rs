use reqwest::Method;
use uuid::Uuid;

use crate::{
	model::Comment,
	route::{
		comment::model::{CommentResponse, CreateComment, UpdateComment},
		model::MessageResponse,
	},
};

use super::{ApiClient, ClientError, ResourceCache};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentView {
	/// The comments on a post.
	Post(Uuid),
	/// The comments of the signed-in user.
	Mine,
}

/// Comments fetched from the server, cached until a mutation invalidates them.
///
/// [`CommentView::Mine`] is dropped whenever the client's token changes.
pub struct Comments {
	client: ApiClient,
	cache: ResourceCache<Comment, CommentView>,
	session: u64,
}

impl Comments {
	pub fn new(client: ApiClient) -> Self {
		Self {
			session: client.session(),
			client,
			cache: ResourceCache::new(),
		}
	}

	fn sync_session(&mut self) {
		let session = self.client.session();

		if session != self.session {
			self.session = session;
			self.cache.retain_views(|view| *view != CommentView::Mine);
		}
	}

	pub async fn list(&mut self, view: CommentView) -> Result<Vec<Comment>, ClientError> {
		self.sync_session();

		if let Some(comments) = self.cache.view(&view) {
			return Ok(comments);
		}

		let comments: Vec<Comment> = match view {
			CommentView::Post(post_id) => self.client.get(&format!("/api/comment/{post_id}")).await?,
			CommentView::Mine => self.client.get("/api/comment/user/my-comments").await?,
		};

		Ok(self.cache.store_view(view, comments))
	}

	pub async fn create(&mut self, post_id: Uuid, content: &str) -> Result<Comment, ClientError> {
		let input = CreateComment {
			content: content.to_owned(),
			post_id: post_id.to_string(),
		};

		let response: CommentResponse = self
			.client
			.json(Method::POST, "/api/comment", &input)
			.await?;

		// Only the lists the comment can appear in need refetching.
		self.cache
			.retain_views(|view| !matches!(view, CommentView::Mine) && *view != CommentView::Post(post_id));

		Ok(self.cache.updated(response.comment))
	}

	pub async fn update(&mut self, id: Uuid, content: &str) -> Result<Comment, ClientError> {
		let input = UpdateComment {
			content: content.to_owned(),
		};

		let response: CommentResponse = self
			.client
			.json(Method::PUT, &format!("/api/comment/{id}"), &input)
			.await?;

		Ok(self.cache.updated(response.comment))
	}

	pub async fn delete(&mut self, id: Uuid) -> Result<(), ClientError> {
		self.client
			.delete::<MessageResponse>(&format!("/api/comment/{id}"))
			.await?;

		self.cache.removed(&id);
		Ok(())
	}

	/// Forgets everything, so the next reads refetch.
	pub fn invalidate(&mut self) {
		self.cache.clear();
	}
}
