use std::{collections::HashMap, hash::Hash};

use uuid::Uuid;

use crate::model::{Comment, Post};

/// A record the client caches by id.
pub trait Resource: Clone {
	type Id: Clone + Eq + Hash;

	fn id(&self) -> Self::Id;

	/// Called when `self` replaces `previous` in the cache.
	fn merge(&mut self, _previous: &Self) {}
}

impl Resource for Post {
	type Id = Uuid;

	fn id(&self) -> Uuid {
		self.id
	}
}

impl Resource for Comment {
	type Id = Uuid;

	fn id(&self) -> Uuid {
		self.id
	}

	// Per-post listings omit the title that "my comments" carries.
	fn merge(&mut self, previous: &Self) {
		if self.post_title.is_none() && self.post_id == previous.post_id {
			self.post_title.clone_from(&previous.post_title);
		}
	}
}

/// Records keyed by id, plus named lists ("views") of ids into them.
///
/// Every record is stored once, so replacing it changes what every view
/// returns.
pub struct ResourceCache<T: Resource, V> {
	entries: HashMap<T::Id, T>,
	views: HashMap<V, Vec<T::Id>>,
}

impl<T: Resource, V> Default for ResourceCache<T, V> {
	fn default() -> Self {
		Self {
			entries: HashMap::new(),
			views: HashMap::new(),
		}
	}
}

impl<T: Resource, V: Eq + Hash> ResourceCache<T, V> {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, id: &T::Id) -> Option<&T> {
		self.entries.get(id)
	}

	/// The records of a view, in order, or `None` if it must be fetched.
	pub fn view(&self, view: &V) -> Option<Vec<T>> {
		let ids = self.views.get(view)?;

		Some(
			ids.iter()
				.filter_map(|id| self.entries.get(id))
				.cloned()
				.collect(),
		)
	}

	/// Remembers a freshly fetched view, returning its records.
	pub fn store_view(&mut self, view: V, items: Vec<T>) -> Vec<T> {
		let ids = items.iter().map(Resource::id).collect();

		let items = items
			.into_iter()
			.map(|item| self.insert(item).clone())
			.collect();

		self.views.insert(view, ids);
		items
	}

	pub fn insert(&mut self, mut item: T) -> &T {
		let id = item.id();

		if let Some(previous) = self.entries.get(&id) {
			item.merge(previous);
		}

		self.entries.insert(id.clone(), item);
		&self.entries[&id]
	}

	/// A new record may belong to any view, so all of them are dropped.
	pub fn created(&mut self, item: T) -> T {
		self.views.clear();
		self.insert(item).clone()
	}

	pub fn updated(&mut self, item: T) -> T {
		self.insert(item).clone()
	}

	pub fn removed(&mut self, id: &T::Id) {
		self.entries.remove(id);

		for ids in self.views.values_mut() {
			ids.retain(|other| other != id);
		}
	}

	pub fn retain_views(&mut self, mut keep: impl FnMut(&V) -> bool) {
		self.views.retain(|view, _| keep(view));
	}

	pub fn clear(&mut self) {
		self.entries.clear();
		self.views.clear();
	}
}

#[cfg(test)]
mod test {
	use chrono::Utc;

	use super::*;
	use crate::model::Author;

	fn post(title: &str) -> Post {
		Post {
			id: Uuid::new_v4(),
			title: title.to_owned(),
			body: "Body".to_owned(),
			image: None,
			hashtags: Vec::new(),
			author: Author {
				id: Uuid::nil(),
				firstname: "Ada".to_owned(),
				lastname: "Lovelace".to_owned(),
			},
			created_at: Utc::now(),
			updated_at: Utc::now(),
		}
	}

	fn titles(posts: &[Post]) -> Vec<&str> {
		posts.iter().map(|post| post.title.as_str()).collect()
	}

	#[test]
	fn test_unknown_view_must_be_fetched() {
		let cache = ResourceCache::<Post, &str>::new();

		assert!(cache.view(&"all").is_none());
	}

	#[test]
	fn test_update_is_seen_by_every_view() {
		let mut cache = ResourceCache::new();
		let first = post("First");
		let second = post("Second");

		cache.store_view("all", vec![first.clone(), second.clone()]);
		cache.store_view("mine", vec![second.clone()]);

		let mut renamed = second.clone();
		renamed.title = "Renamed".to_owned();
		cache.updated(renamed);

		assert_eq!(titles(&cache.view(&"all").unwrap()), ["First", "Renamed"]);
		assert_eq!(titles(&cache.view(&"mine").unwrap()), ["Renamed"]);
		assert_eq!(cache.get(&second.id).unwrap().title, "Renamed");
	}

	#[test]
	fn test_removal_drops_id_from_every_view() {
		let mut cache = ResourceCache::new();
		let first = post("First");
		let second = post("Second");

		cache.store_view("all", vec![first.clone(), second.clone()]);
		cache.store_view("mine", vec![second.clone()]);
		cache.removed(&second.id);

		assert_eq!(titles(&cache.view(&"all").unwrap()), ["First"]);
		assert!(cache.view(&"mine").unwrap().is_empty());
		assert!(cache.get(&second.id).is_none());
	}

	#[test]
	fn test_creation_invalidates_views() {
		let mut cache = ResourceCache::new();
		let first = post("First");

		cache.store_view("all", vec![first]);

		let created = cache.created(post("Second"));

		assert!(cache.view(&"all").is_none());
		assert_eq!(cache.get(&created.id).unwrap().title, "Second");
	}

	#[test]
	fn test_retain_views() {
		let mut cache = ResourceCache::new();

		cache.store_view("all", vec![post("First")]);
		cache.store_view("trending", Vec::new());
		cache.retain_views(|view| *view == "all");

		assert!(cache.view(&"all").is_some());
		assert!(cache.view(&"trending").is_none());
	}

	#[test]
	fn test_comment_keeps_post_title() {
		let mut cache = ResourceCache::new();
		let comment = Comment {
			id: Uuid::new_v4(),
			content: "Hello".to_owned(),
			post_id: Uuid::new_v4(),
			post_title: Some("Engines".to_owned()),
			author: post("").author,
			created_at: Utc::now(),
			updated_at: Utc::now(),
		};

		cache.store_view("mine", vec![comment.clone()]);
		cache.store_view(
			"post",
			vec![Comment {
				post_title: None,
				..comment.clone()
			}],
		);

		assert_eq!(
			cache.view(&"mine").unwrap()[0].post_title.as_deref(),
			Some("Engines")
		);
	}
}
