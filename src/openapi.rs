use aide::{
	openapi::{ApiKeyLocation, SecurityScheme, Tag},
	transform::TransformOpenApi,
};

use crate::{
	error::{ErrorBody, FieldMessage},
	extract::Json,
	session,
};

pub const SECURITY_SCHEME_BEARER: &str = "Bearer";
pub const SECURITY_SCHEME_COOKIE: &str = "Cookie";

pub mod tag {
	pub const ACCOUNT: &str = "Account";
	pub const POST: &str = "Post";
	pub const COMMENT: &str = "Comment";
}

pub fn docs(api: TransformOpenApi) -> TransformOpenApi {
	api.title("Quill API")
		.summary("A multi-user blogging service")
		.description(include_str!("../README.md"))
		.tag(Tag {
			name: tag::ACCOUNT.into(),
			description: Some("Signup, login and password resets".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::POST.into(),
			description: Some("Blog posts, hashtag search and trending posts".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::COMMENT.into(),
			description: Some("Comments on posts".into()),
			..Default::default()
		})
		.security_scheme(
			SECURITY_SCHEME_BEARER,
			SecurityScheme::Http {
				scheme: "bearer".into(),
				bearer_format: Some("JWT".into()),
				description: Some("The token returned by signup or login".into()),
				extensions: Default::default(),
			},
		)
		.security_scheme(
			SECURITY_SCHEME_COOKIE,
			SecurityScheme::ApiKey {
				location: ApiKeyLocation::Cookie,
				name: session::COOKIE_NAME.into(),
				description: Some("The session cookie set by signup or login".into()),
				extensions: Default::default(),
			},
		)
		.default_response_with::<Json<ErrorBody>, _>(|res| {
			res.example(ErrorBody {
				message: "Validation failed".into(),
				errors: vec![FieldMessage {
					field: "email".into(),
					message: "Please enter a valid email".into(),
				}],
			})
		})
}
