//! Type-erased extension map for AppState
//!
//! Feature crates register their own state here (the admission policy, the
//! composed membership actions, the template renderer) so AppState does not
//! depend on feature types.

use std::any::{Any, TypeId};
use std::collections::HashMap;

pub struct Extensions {
	map: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Extensions {
	pub fn new() -> Self {
		Self { map: HashMap::new() }
	}

	/// Registers a value, replacing any earlier value of the same type
	pub fn insert<T: Send + Sync + 'static>(&mut self, val: T) {
		if self.map.insert(TypeId::of::<T>(), Box::new(val)).is_some() {
			tracing::warn!("Extension {} registered twice", std::any::type_name::<T>());
		}
	}

	pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
		self.map.get(&TypeId::of::<T>())?.downcast_ref::<T>()
	}

	pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
		self.map.contains_key(&TypeId::of::<T>())
	}

	pub fn len(&self) -> usize {
		self.map.len()
	}

	pub fn is_empty(&self) -> bool {
		self.map.is_empty()
	}
}

impl Default for Extensions {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	struct Marker(u32);

	#[test]
	fn test_insert_and_get_by_type() {
		let mut ext = Extensions::new();
		assert!(ext.is_empty());
		ext.insert(Marker(5));
		ext.insert(String::from("hello"));

		assert_eq!(ext.len(), 2);
		assert!(ext.contains::<Marker>());
		assert_eq!(ext.get::<Marker>().map(|m| m.0), Some(5));
		assert_eq!(ext.get::<String>().map(String::as_str), Some("hello"));
		assert!(ext.get::<u64>().is_none());
	}

	#[test]
	fn test_insert_replaces_same_type() {
		let mut ext = Extensions::new();
		ext.insert(Marker(1));
		ext.insert(Marker(2));
		assert_eq!(ext.len(), 1);
		assert_eq!(ext.get::<Marker>().map(|m| m.0), Some(2));
	}
}

// vim: ts=4
