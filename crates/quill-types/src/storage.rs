//! Storage namespaces.

/// Collections kept in the key-value backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
	/// Order documents keyed by order id.
	Orders,
}

impl StorageKey {
	pub fn as_str(&self) -> &'static str {
		match self {
			StorageKey::Orders => "orders",
		}
	}

	/// Prefix shared by every key in this namespace.
	pub fn prefix(&self) -> String {
		format!("{}:", self.as_str())
	}

	/// Full backend key for an item in this namespace.
	pub fn key(&self, id: &str) -> String {
		format!("{}:{}", self.as_str(), id)
	}
}
