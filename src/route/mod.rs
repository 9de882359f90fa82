use aide::axum::ApiRouter;

use crate::AppState;

pub mod account;
pub mod comment;
pub mod docs;
pub mod model;
pub mod post;

pub fn routes() -> ApiRouter<AppState> {
	ApiRouter::new()
		.nest("/api/user", account::routes())
		.nest("/api/blog", post::routes())
		.nest("/api/comment", comment::routes())
}
