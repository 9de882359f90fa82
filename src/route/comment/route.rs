use axum::{
	extract::{Path, State},
	http::StatusCode,
};
use macros::route;

use crate::{
	extract::{Json, Session},
	openapi::tag,
	route::model::{IdInput, MessageResponse},
	store::NewComment,
	AppState,
};

use super::{model, Error, RouteError};

/// Comment on a post
/// Adds a comment to an existing post.
#[route(tag = tag::COMMENT, response(status = 201, description = "Comment created.", shape = "Json<model::CommentResponse>"))]
pub async fn create_comment(
	State(state): State<AppState>,
	session: Session,
	Json(input): Json<model::CreateComment>,
) -> Result<(StatusCode, Json<model::CommentResponse>), RouteError> {
	let post_id = input.post_id().ok_or(Error::PostNotFound)?;

	state
		.store
		.posts
		.find(post_id)
		.await?
		.ok_or(Error::PostNotFound)?;

	let comment = state
		.store
		.comments
		.insert(NewComment {
			author_id: session.user_id,
			post_id,
			content: input.content,
		})
		.await?;

	Ok((
		StatusCode::CREATED,
		Json(model::CommentResponse {
			message: "Comment created successfully".into(),
			comment,
		}),
	))
}

/// List comments of a post
/// Returns the comments of a post, newest first. Unknown posts have no comments.
#[route(tag = tag::COMMENT)]
pub async fn get_post_comments(
	State(state): State<AppState>,
	Path(path): Path<IdInput>,
) -> Result<Json<Vec<model::Comment>>, RouteError> {
	let Some(post_id) = path.parse() else {
		return Ok(Json(Vec::new()));
	};

	Ok(Json(state.store.comments.list_by_post(post_id).await?))
}

/// List own comments
/// Returns the comments of the authenticated user, newest first, with the
/// title of each commented post that still exists.
#[route(tag = tag::COMMENT)]
pub async fn get_my_comments(
	State(state): State<AppState>,
	session: Session,
) -> Result<Json<Vec<model::Comment>>, RouteError> {
	Ok(Json(
		state.store.comments.list_by_author(session.user_id).await?,
	))
}

/// Update comment
/// Replaces the content of a comment of the authenticated user.
#[route(tag = tag::COMMENT)]
pub async fn update_comment(
	State(state): State<AppState>,
	session: Session,
	Path(path): Path<IdInput>,
	Json(input): Json<model::UpdateComment>,
) -> Result<Json<model::CommentResponse>, RouteError> {
	let id = path.parse().ok_or(Error::NotFound)?;
	let comment = state.store.comments.find(id).await?.ok_or(Error::NotFound)?;

	if !session.owns(comment.author.id) {
		return Err(Error::NotAuthorizedToUpdate.into());
	}

	let comment = state
		.store
		.comments
		.update(id, &input.content)
		.await?
		.ok_or(Error::NotFound)?;

	Ok(Json(model::CommentResponse {
		message: "Comment updated successfully".into(),
		comment,
	}))
}

/// Delete comment
/// Deletes a comment of the authenticated user.
#[route(tag = tag::COMMENT)]
pub async fn delete_comment(
	State(state): State<AppState>,
	session: Session,
	Path(path): Path<IdInput>,
) -> Result<Json<MessageResponse>, RouteError> {
	let id = path.parse().ok_or(Error::NotFound)?;
	let comment = state.store.comments.find(id).await?.ok_or(Error::NotFound)?;

	if !session.owns(comment.author.id) {
		return Err(Error::NotAuthorizedToDelete.into());
	}

	if !state.store.comments.delete(id).await? {
		return Err(Error::NotFound.into());
	}

	Ok(Json(MessageResponse::new("Comment deleted successfully")))
}
