use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A resource id taken from the path.
///
/// Kept as text so that a malformed id is reported like an unknown one.
#[derive(Deserialize, JsonSchema)]
pub struct IdInput {
	/// The unique identifier of the resource.
	pub id: String,
}

impl IdInput {
	pub fn parse(&self) -> Option<Uuid> {
		self.id.parse().ok()
	}
}

/// A response carrying only a confirmation message.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct MessageResponse {
	pub message: String,
}

impl MessageResponse {
	pub fn new(message: &str) -> Self {
		Self {
			message: message.into(),
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_parse_id() {
		let id = Uuid::new_v4();

		assert_eq!(IdInput { id: id.to_string() }.parse(), Some(id));
		assert_eq!(IdInput { id: "64b7f".into() }.parse(), None);
	}
}
