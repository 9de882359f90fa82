use axum::{
	extract::{Path, State},
	http::StatusCode,
};
use macros::route;

use crate::{
	extract::{Json, PostForm, Query, Session},
	hashtag::{Hashtags, TRENDING_LIMIT},
	media::Upload,
	openapi::tag,
	route::model::{IdInput, MessageResponse},
	store::{NewPost, PostChanges},
	AppState,
};

use super::{model, Error, RouteError};

/// Uploads the file, if any, returning its URL in place of `image`.
async fn resolve_image(
	state: &AppState,
	image: Option<String>,
	upload: Option<Upload>,
) -> Result<Option<String>, RouteError> {
	match upload {
		Some(upload) => Ok(Some(state.media.upload(upload).await?)),
		None => Ok(image),
	}
}

/// List posts
/// Returns every post, newest first.
#[route(tag = tag::POST)]
pub async fn get_posts(State(state): State<AppState>) -> Result<Json<Vec<model::Post>>, RouteError> {
	Ok(Json(state.store.posts.list().await?))
}

/// List own posts
/// Returns the posts of the authenticated user, newest first.
#[route(tag = tag::POST)]
pub async fn get_my_posts(
	State(state): State<AppState>,
	session: Session,
) -> Result<Json<Vec<model::Post>>, RouteError> {
	Ok(Json(
		state.store.posts.list_by_author(session.user_id).await?,
	))
}

/// Get single post
/// Returns a single post by its unique id.
#[route(tag = tag::POST)]
pub async fn get_post(
	State(state): State<AppState>,
	Path(path): Path<IdInput>,
) -> Result<Json<model::Post>, RouteError> {
	let id = path.parse().ok_or(Error::NotFound)?;
	let post = state.store.posts.find(id).await?;

	Ok(Json(post.ok_or(Error::NotFound)?))
}

/// Trending posts
/// Returns the 10 posts with the most hashtags, newest first among equals.
#[route(tag = tag::POST)]
pub async fn get_trending(
	State(state): State<AppState>,
) -> Result<Json<Vec<model::Post>>, RouteError> {
	Ok(Json(state.store.posts.trending(TRENDING_LIMIT).await?))
}

/// Search by hashtags
/// Returns posts having any of the given hashtags, newest first. Hashtags are
/// compared exactly, including case.
#[route(tag = tag::POST)]
pub async fn search_by_hashtags(
	State(state): State<AppState>,
	Query(input): Query<model::SearchInput>,
) -> Result<Json<Vec<model::Post>>, RouteError> {
	let hashtags = input
		.hashtags
		.as_deref()
		.map(Hashtags::parse)
		.filter(|hashtags| !hashtags.is_empty())
		.ok_or(Error::HashtagsRequired)?;

	Ok(Json(state.store.posts.search(hashtags.as_slice()).await?))
}

/// Create post
/// Creates a new post. With a multipart body, an image file in the `image`
/// field is uploaded and its URL stored.
#[route(tag = tag::POST, response(status = 201, description = "Post created.", shape = "Json<model::PostResponse>"))]
pub async fn create_post(
	State(state): State<AppState>,
	session: Session,
	PostForm { fields, upload }: PostForm<model::CreatePost>,
) -> Result<(StatusCode, Json<model::PostResponse>), RouteError> {
	let image = resolve_image(&state, fields.image, upload).await?;

	let post = state
		.store
		.posts
		.insert(NewPost {
			author_id: session.user_id,
			title: fields.title,
			body: fields.body,
			image,
			hashtags: fields.hashtags.into_inner(),
		})
		.await?;

	tracing::info!(post_id = %post.id, author_id = %session.user_id, "post created");

	Ok((
		StatusCode::CREATED,
		Json(model::PostResponse {
			message: "Blog created successfully".into(),
			blog: post,
		}),
	))
}

/// Update post
/// Updates a post of the authenticated user. Absent fields keep their value.
#[route(tag = tag::POST)]
pub async fn update_post(
	State(state): State<AppState>,
	session: Session,
	Path(path): Path<IdInput>,
	PostForm { fields, upload }: PostForm<model::UpdatePost>,
) -> Result<Json<model::PostResponse>, RouteError> {
	let id = path.parse().ok_or(Error::NotFound)?;
	let post = state.store.posts.find(id).await?.ok_or(Error::NotFound)?;

	if !session.owns(post.author.id) {
		return Err(Error::NotAuthorizedToUpdate.into());
	}

	let image = resolve_image(&state, fields.image, upload).await?;

	let post = state
		.store
		.posts
		.update(
			id,
			PostChanges {
				title: fields.title,
				body: fields.body,
				image,
				hashtags: fields.hashtags.map(Hashtags::into_inner),
			},
		)
		.await?
		.ok_or(Error::NotFound)?;

	Ok(Json(model::PostResponse {
		message: "Blog updated successfully".into(),
		blog: post,
	}))
}

/// Delete post
/// Deletes a post of the authenticated user. Its comments are kept.
#[route(tag = tag::POST)]
pub async fn delete_post(
	State(state): State<AppState>,
	session: Session,
	Path(path): Path<IdInput>,
) -> Result<Json<MessageResponse>, RouteError> {
	let id = path.parse().ok_or(Error::NotFound)?;
	let post = state.store.posts.find(id).await?.ok_or(Error::NotFound)?;

	if !session.owns(post.author.id) {
		return Err(Error::NotAuthorizedToDelete.into());
	}

	if !state.store.posts.delete(id).await? {
		return Err(Error::NotFound.into());
	}

	tracing::info!(post_id = %id, "post deleted");

	Ok(Json(MessageResponse::new("Blog deleted successfully")))
}
