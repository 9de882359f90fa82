use std::cmp::Reverse;

use schemars::{gen::SchemaGenerator, schema::Schema, JsonSchema};
use serde::{Deserialize, Serialize};

use crate::model::Post;

/// How many posts the trending list holds at most.
pub const TRENDING_LIMIT: usize = 10;

/// An ordered list of trimmed, non-empty hashtags.
///
/// Accepts either a comma-separated string (`"rust, web"`) or an array of
/// strings, and always serializes as an array. Order and duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "HashtagInput")]
pub struct Hashtags(Vec<String>);

#[derive(Deserialize, JsonSchema)]
#[serde(untagged)]
enum HashtagInput {
	/// Comma-separated hashtags.
	Text(String),
	List(Vec<String>),
}

impl From<HashtagInput> for Hashtags {
	fn from(input: HashtagInput) -> Self {
		match input {
			HashtagInput::Text(text) => Self::parse(&text),
			HashtagInput::List(tags) => Self::from_tags(tags),
		}
	}
}

impl JsonSchema for Hashtags {
	fn schema_name() -> String {
		"Hashtags".into()
	}

	fn json_schema(gen: &mut SchemaGenerator) -> Schema {
		HashtagInput::json_schema(gen)
	}
}

impl Hashtags {
	pub fn parse(text: &str) -> Self {
		Self::from_tags(text.split(','))
	}

	pub fn from_tags<I, S>(tags: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		Self(
			tags.into_iter()
				.map(|tag| tag.as_ref().trim().to_owned())
				.filter(|tag| !tag.is_empty())
				.collect(),
		)
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn as_slice(&self) -> &[String] {
		&self.0
	}

	pub fn into_inner(self) -> Vec<String> {
		self.0
	}

	/// Whether any of `tags` is exactly one of these hashtags.
	pub fn matches_any(&self, tags: &[String]) -> bool {
		self.0.iter().any(|tag| tags.contains(tag))
	}
}

/// Orders posts by hashtag count, newest first among equal counts, and keeps
/// the first `limit`.
pub fn rank_trending(mut posts: Vec<Post>, limit: usize) -> Vec<Post> {
	posts.sort_by_key(|post| (Reverse(post.hashtags.len()), Reverse(post.created_at)));
	posts.truncate(limit);
	posts
}

#[cfg(test)]
mod test {
	use chrono::{Duration, Utc};
	use uuid::Uuid;

	use super::*;
	use crate::model::Author;

	#[test]
	fn test_parse_trims_and_drops_empty() {
		assert_eq!(Hashtags::parse("a, b").as_slice(), ["a", "b"]);
		assert_eq!(Hashtags::parse(" rust ,, web ,").as_slice(), ["rust", "web"]);
		assert!(Hashtags::parse(" , ").is_empty());
	}

	#[test]
	fn test_parse_keeps_order_and_duplicates() {
		assert_eq!(Hashtags::parse("b,a,b").as_slice(), ["b", "a", "b"]);
	}

	#[test]
	fn test_deserialize_either_shape() {
		let text: Hashtags = serde_json::from_str(r#""a, b""#).unwrap();
		let list: Hashtags = serde_json::from_str(r#"[" a", "b ", ""]"#).unwrap();

		assert_eq!(text, list);
		assert_eq!(serde_json::to_string(&text).unwrap(), r#"["a","b"]"#);
	}

	#[test]
	fn test_matches_any_is_exact() {
		let tags = Hashtags::parse("Rust,web");

		assert!(tags.matches_any(&["web".into()]));
		assert!(!tags.matches_any(&["rust".into()]));
		assert!(!tags.matches_any(&[]));
	}

	fn post(tag_count: usize, age_minutes: i64) -> Post {
		let created_at = Utc::now() - Duration::minutes(age_minutes);

		Post {
			id: Uuid::new_v4(),
			title: format!("{tag_count} tags"),
			body: String::new(),
			image: None,
			hashtags: (0..tag_count).map(|i| format!("tag{i}")).collect(),
			author: Author {
				id: Uuid::new_v4(),
				firstname: "Ada".into(),
				lastname: "Lovelace".into(),
			},
			created_at,
			updated_at: created_at,
		}
	}

	#[test]
	fn test_rank_trending_by_count_then_newest() {
		let older_three = post(3, 30);
		let newer_three = post(3, 10);

		let ranked = rank_trending(
			vec![post(1, 0), older_three.clone(), post(5, 40), newer_three.clone()],
			TRENDING_LIMIT,
		);

		let counts = ranked.iter().map(|p| p.hashtags.len()).collect::<Vec<_>>();

		assert_eq!(counts, [5, 3, 3, 1]);
		assert_eq!(ranked[1].id, newer_three.id);
		assert_eq!(ranked[2].id, older_three.id);
	}

	#[test]
	fn test_rank_trending_limit() {
		let posts = (0..12).map(|i| post(i % 4, i as i64)).collect();

		assert_eq!(rank_trending(posts, TRENDING_LIMIT).len(), TRENDING_LIMIT);
		assert_eq!(rank_trending(vec![post(1, 0)], TRENDING_LIMIT).len(), 1);
	}
}
