use aide::axum::{routing::get_with, ApiRouter};
use axum::{extract::DefaultBodyLimit, http::StatusCode};

use crate::{error, media::MAX_IMAGE_BYTES, AppState};

pub mod model;
pub mod route;

/// Room for the text fields of a multipart body next to the largest image.
const MAX_BODY_BYTES: usize = MAX_IMAGE_BYTES + 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Blog not found")]
	NotFound,
	#[error("Not authorized to update this blog")]
	NotAuthorizedToUpdate,
	#[error("Not authorized to delete this blog")]
	NotAuthorizedToDelete,
	#[error("Hashtags parameter is required")]
	HashtagsRequired,
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/",
			get_with(get_posts, get_posts_docs).post_with(create_post, create_post_docs),
		)
		.api_route("/my-blogs", get_with(get_my_posts, get_my_posts_docs))
		.api_route("/trending", get_with(get_trending, get_trending_docs))
		.api_route(
			"/search/hashtags",
			get_with(search_by_hashtags, search_by_hashtags_docs),
		)
		.api_route(
			"/:id",
			get_with(get_post, get_post_docs)
				.put_with(update_post, update_post_docs)
				.delete_with(delete_post, delete_post_docs),
		)
		.layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::NotFound => StatusCode::NOT_FOUND,
			Self::NotAuthorizedToUpdate | Self::NotAuthorizedToDelete => StatusCode::UNAUTHORIZED,
			Self::HashtagsRequired => StatusCode::BAD_REQUEST,
		}
	}
}

#[cfg(test)]
mod test {
	use crate::{media::MemoryMediaHost, test::*};

	async fn create(app: &TestApp, token: &str, body: Value) -> Value {
		let response = app
			.server
			.post("/api/blog")
			.add_header(AUTHORIZATION, bearer(token))
			.json(&body)
			.await;

		assert_eq!(response.status_code(), 201);

		response.json::<Value>()["blog"].clone()
	}

	#[tokio::test]
	async fn test_create_and_read() {
		let app = app();
		let token = signup(&app, "ada@example.com").await;

		let response = app
			.server
			.post("/api/blog")
			.add_header(AUTHORIZATION, bearer(&token))
			.json(&json!({ "title": "Engines", "body": "On analytical engines", "hashtags": "a, b" }))
			.await;

		assert_eq!(response.status_code(), 201);

		let body = response.json::<Value>();

		assert_eq!(body["message"], "Blog created successfully");
		assert_eq!(body["blog"]["hashtags"], json!(["a", "b"]));
		assert_eq!(body["blog"]["author"]["firstname"], "Ada");
		assert!(body["blog"]["image"].is_null());

		let id = body["blog"]["id"].as_str().unwrap();

		let first = app.server.get(&format!("/api/blog/{id}")).await;
		let second = app.server.get(&format!("/api/blog/{id}")).await;

		assert_eq!(first.status_code(), 200);
		assert_eq!(first.json::<Value>(), second.json::<Value>());
		assert_eq!(first.json::<Value>(), body["blog"]);
	}

	#[tokio::test]
	async fn test_create_requires_auth_and_valid_input() {
		let app = app();

		let response = app
			.server
			.post("/api/blog")
			.json(&json!({ "title": "Engines", "body": "Body" }))
			.await;

		assert_eq!(response.status_code(), 401);

		let token = signup(&app, "ada@example.com").await;

		let response = app
			.server
			.post("/api/blog")
			.add_header(AUTHORIZATION, bearer(&token))
			.json(&json!({ "title": "", "body": "Body", "image": "not a url" }))
			.await;

		assert_eq!(response.status_code(), 400);

		let body = response.json::<Value>();

		assert_eq!(body["errors"][0]["field"], "image");
		assert_eq!(body["errors"][1]["field"], "title");
	}

	#[tokio::test]
	async fn test_unknown_and_malformed_ids_are_not_found() {
		let app = app();
		let token = signup(&app, "ada@example.com").await;
		let unknown = uuid::Uuid::new_v4();

		for path in [format!("/api/blog/{unknown}"), "/api/blog/64b7f0c2".to_owned()] {
			let response = app.server.get(&path).await;

			assert_eq!(response.status_code(), 404);
			assert_eq!(response.json::<Value>()["message"], "Blog not found");

			let response = app
				.server
				.put(&path)
				.add_header(AUTHORIZATION, bearer(&token))
				.json(&json!({ "title": "New" }))
				.await;

			assert_eq!(response.status_code(), 404);

			let response = app
				.server
				.delete(&path)
				.add_header(AUTHORIZATION, bearer(&token))
				.await;

			assert_eq!(response.status_code(), 404);
		}
	}

	#[tokio::test]
	async fn test_only_the_author_can_mutate() {
		let app = app();
		let ada = signup(&app, "ada@example.com").await;
		let bob = signup(&app, "bob@example.com").await;

		let post = create(&app, &ada, json!({ "title": "Engines", "body": "Body" })).await;
		let path = format!("/api/blog/{}", post["id"].as_str().unwrap());

		let response = app
			.server
			.put(&path)
			.add_header(AUTHORIZATION, bearer(&bob))
			.json(&json!({ "title": "Mine now" }))
			.await;

		assert_eq!(response.status_code(), 401);
		assert_eq!(
			response.json::<Value>()["message"],
			"Not authorized to update this blog"
		);

		let response = app
			.server
			.delete(&path)
			.add_header(AUTHORIZATION, bearer(&bob))
			.await;

		assert_eq!(response.status_code(), 401);
		assert_eq!(
			response.json::<Value>()["message"],
			"Not authorized to delete this blog"
		);

		let response = app
			.server
			.put(&path)
			.add_header(AUTHORIZATION, bearer(&ada))
			.json(&json!({ "title": "Difference engines", "hashtags": ["history"] }))
			.await;

		assert_eq!(response.status_code(), 200);

		let body = response.json::<Value>();

		assert_eq!(body["message"], "Blog updated successfully");
		assert_eq!(body["blog"]["title"], "Difference engines");
		assert_eq!(body["blog"]["body"], "Body");
		assert_eq!(body["blog"]["hashtags"], json!(["history"]));

		let response = app
			.server
			.delete(&path)
			.add_header(AUTHORIZATION, bearer(&ada))
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(
			response.json::<Value>()["message"],
			"Blog deleted successfully"
		);

		assert_eq!(app.server.get(&path).await.status_code(), 404);
	}

	#[tokio::test]
	async fn test_my_blogs() {
		let app = app();
		let ada = signup(&app, "ada@example.com").await;
		let bob = signup(&app, "bob@example.com").await;

		create(&app, &ada, json!({ "title": "First", "body": "Body" })).await;
		create(&app, &bob, json!({ "title": "Other", "body": "Body" })).await;
		create(&app, &ada, json!({ "title": "Second", "body": "Body" })).await;

		let response = app
			.server
			.get("/api/blog/my-blogs")
			.add_header(AUTHORIZATION, bearer(&ada))
			.await;

		let titles = response
			.json::<Vec<Value>>()
			.iter()
			.map(|post| post["title"].as_str().unwrap().to_owned())
			.collect::<Vec<_>>();

		assert_eq!(titles, ["Second", "First"]);

		let all = app.server.get("/api/blog").await.json::<Vec<Value>>();

		assert_eq!(all.len(), 3);
		assert_eq!(all[0]["title"], "Second");
	}

	#[tokio::test]
	async fn test_search_by_hashtags() {
		let app = app();
		let token = signup(&app, "ada@example.com").await;

		create(&app, &token, json!({ "title": "Rust", "body": "B", "hashtags": ["rust", "web"] })).await;
		create(&app, &token, json!({ "title": "Go", "body": "B", "hashtags": "go" })).await;
		create(&app, &token, json!({ "title": "Upper", "body": "B", "hashtags": "Rust" })).await;

		let response = app
			.server
			.get("/api/blog/search/hashtags")
			.add_query_param("hashtags", " go , rust ")
			.await;

		assert_eq!(response.status_code(), 200);

		let titles = response
			.json::<Vec<Value>>()
			.iter()
			.map(|post| post["title"].as_str().unwrap().to_owned())
			.collect::<Vec<_>>();

		assert_eq!(titles, ["Go", "Rust"]);

		for hashtags in [None, Some(" ,"), Some("")] {
			let mut request = app.server.get("/api/blog/search/hashtags");

			if let Some(hashtags) = hashtags {
				request = request.add_query_param("hashtags", hashtags);
			}

			let response = request.await;

			assert_eq!(response.status_code(), 400);
			assert_eq!(
				response.json::<Value>()["message"],
				"Hashtags parameter is required"
			);
		}
	}

	#[tokio::test]
	async fn test_trending() {
		let app = app();
		let token = signup(&app, "ada@example.com").await;

		for (title, count) in [("one", 1), ("older three", 3), ("five", 5), ("newer three", 3)] {
			let hashtags = (0..count).map(|i| format!("tag{i}")).collect::<Vec<_>>();

			create(
				&app,
				&token,
				json!({ "title": title, "body": "B", "hashtags": hashtags }),
			)
			.await;
		}

		let trending = app.server.get("/api/blog/trending").await.json::<Vec<Value>>();

		let ranked = trending
			.iter()
			.map(|post| {
				(
					post["title"].as_str().unwrap().to_owned(),
					post["hashtags"].as_array().unwrap().len(),
				)
			})
			.collect::<Vec<_>>();

		assert_eq!(
			ranked,
			[
				("five".to_owned(), 5),
				("newer three".to_owned(), 3),
				("older three".to_owned(), 3),
				("one".to_owned(), 1),
			]
		);
	}

	#[tokio::test]
	async fn test_multipart_image_upload() {
		let app = app();
		let token = signup(&app, "ada@example.com").await;

		let boundary = "quill-boundary";
		let body = format!(
			"--{boundary}\r\n\
			Content-Disposition: form-data; name=\"title\"\r\n\r\n\
			Engines\r\n\
			--{boundary}\r\n\
			Content-Disposition: form-data; name=\"body\"\r\n\r\n\
			Body\r\n\
			--{boundary}\r\n\
			Content-Disposition: form-data; name=\"hashtags\"\r\n\r\n\
			a, b\r\n\
			--{boundary}\r\n\
			Content-Disposition: form-data; name=\"image\"; filename=\"cover.png\"\r\n\
			Content-Type: image/png\r\n\r\n\
			not really a png\r\n\
			--{boundary}--\r\n"
		);

		let response = app
			.server
			.post("/api/blog")
			.add_header(AUTHORIZATION, bearer(&token))
			.content_type(&format!("multipart/form-data; boundary={boundary}"))
			.bytes(body.into())
			.await;

		assert_eq!(response.status_code(), 201);

		let post = response.json::<Value>()["blog"].clone();

		assert_eq!(post["title"], "Engines");
		assert_eq!(post["hashtags"], json!(["a", "b"]));
		assert!(post["image"]
			.as_str()
			.unwrap()
			.starts_with(MemoryMediaHost::BASE_URL));

		let uploads = app.media.uploads().await;

		assert_eq!(uploads.len(), 1);
		assert_eq!(uploads[0].bytes.as_ref(), b"not really a png");
	}

	#[tokio::test]
	async fn test_multipart_rejects_non_images() {
		let app = app();
		let token = signup(&app, "ada@example.com").await;

		let boundary = "quill-boundary";
		let body = format!(
			"--{boundary}\r\n\
			Content-Disposition: form-data; name=\"title\"\r\n\r\n\
			Engines\r\n\
			--{boundary}\r\n\
			Content-Disposition: form-data; name=\"body\"\r\n\r\n\
			Body\r\n\
			--{boundary}\r\n\
			Content-Disposition: form-data; name=\"image\"; filename=\"notes.txt\"\r\n\
			Content-Type: text/plain\r\n\r\n\
			hello\r\n\
			--{boundary}--\r\n"
		);

		let response = app
			.server
			.post("/api/blog")
			.add_header(AUTHORIZATION, bearer(&token))
			.content_type(&format!("multipart/form-data; boundary={boundary}"))
			.bytes(body.into())
			.await;

		assert_eq!(response.status_code(), 400);
		assert!(app.server.get("/api/blog").await.json::<Vec<Value>>().is_empty());
	}
}
