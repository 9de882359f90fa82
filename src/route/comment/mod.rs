use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Comment not found")]
	NotFound,
	#[error("Blog not found")]
	PostNotFound,
	#[error("Not authorized to update this comment")]
	NotAuthorizedToUpdate,
	#[error("Not authorized to delete this comment")]
	NotAuthorizedToDelete,
}

pub type RouteError = error::RouteError<Error>;

/// `GET /:id` takes a post id, `PUT` and `DELETE` a comment id.
pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route("/", post_with(create_comment, create_comment_docs))
		.api_route(
			"/user/my-comments",
			get_with(get_my_comments, get_my_comments_docs),
		)
		.api_route(
			"/:id",
			get_with(get_post_comments, get_post_comments_docs)
				.put_with(update_comment, update_comment_docs)
				.delete_with(delete_comment, delete_comment_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::NotFound | Self::PostNotFound => StatusCode::NOT_FOUND,
			Self::NotAuthorizedToUpdate | Self::NotAuthorizedToDelete => StatusCode::UNAUTHORIZED,
		}
	}
}
