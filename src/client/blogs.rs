use reqwest::Method;
use uuid::Uuid;

use crate::{
	model::Post,
	route::{
		model::MessageResponse,
		post::model::{CreatePost, PostResponse, SearchInput, UpdatePost},
	},
};

use super::{ApiClient, ClientError, Image, ResourceCache};

/// A list of posts as the server orders it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BlogView {
	All,
	Mine,
	Trending,
	/// Comma-separated hashtags.
	Search(String),
}

impl BlogView {
	/// Whether the posts in the view depend on their content.
	fn depends_on_content(&self) -> bool {
		matches!(self, Self::Trending | Self::Search(_))
	}
}

/// Posts fetched from the server, cached until a mutation invalidates them.
///
/// [`BlogView::Mine`] is dropped whenever the client's token changes.
pub struct Blogs {
	client: ApiClient,
	cache: ResourceCache<Post, BlogView>,
	session: u64,
}

impl Blogs {
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
			self.cache.retain_views(|view| *view != BlogView::Mine);
		}
	}

	pub async fn list(&mut self, view: BlogView) -> Result<Vec<Post>, ClientError> {
		self.sync_session();

		if let Some(posts) = self.cache.view(&view) {
			return Ok(posts);
		}

		let posts: Vec<Post> = match &view {
			BlogView::All => self.client.get("/api/blog").await?,
			BlogView::Mine => self.client.get("/api/blog/my-blogs").await?,
			BlogView::Trending => self.client.get("/api/blog/trending").await?,
			BlogView::Search(hashtags) => {
				let query = SearchInput {
					hashtags: Some(hashtags.clone()),
				};

				self.client
					.get_with_query("/api/blog/search/hashtags", &query)
					.await?
			}
		};

		Ok(self.cache.store_view(view, posts))
	}

	pub async fn get(&mut self, id: Uuid) -> Result<Post, ClientError> {
		if let Some(post) = self.cache.get(&id) {
			return Ok(post.clone());
		}

		let post = self.client.get(&format!("/api/blog/{id}")).await?;

		Ok(self.cache.insert(post).clone())
	}

	pub async fn create(
		&mut self,
		post: &CreatePost,
		image: Option<Image>,
	) -> Result<Post, ClientError> {
		let response: PostResponse = self
			.client
			.form(Method::POST, "/api/blog", post, image)
			.await?;

		Ok(self.cache.created(response.blog))
	}

	pub async fn update(
		&mut self,
		id: Uuid,
		changes: &UpdatePost,
		image: Option<Image>,
	) -> Result<Post, ClientError> {
		let response: PostResponse = self
			.client
			.form(Method::PUT, &format!("/api/blog/{id}"), changes, image)
			.await?;

		self.cache.retain_views(|view| !view.depends_on_content());
		Ok(self.cache.updated(response.blog))
	}

	pub async fn delete(&mut self, id: Uuid) -> Result<(), ClientError> {
		self.client
			.delete::<MessageResponse>(&format!("/api/blog/{id}"))
			.await?;

		self.cache.removed(&id);
		Ok(())
	}

	/// Forgets everything, so the next reads refetch.
	pub fn invalidate(&mut self) {
		self.cache.clear();
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_content_dependent_views() {
		assert!(BlogView::Trending.depends_on_content());
		assert!(BlogView::Search("rust".into()).depends_on_content());
		assert!(!BlogView::All.depends_on_content());
		assert!(!BlogView::Mine.depends_on_content());
	}
}
