//! Strongly typed identifiers.
//!
//! Orders, users and reference data entries are all keyed by opaque strings.
//! Wrapping them in distinct types keeps a writer id from ever being passed
//! where an order id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
	($(#[$meta:meta])* $name:ident) => {
		$(#[$meta])*
		#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(pub String);

		impl $name {
			/// Returns the identifier as a string slice.
			pub fn as_str(&self) -> &str {
				&self.0
			}

			/// Returns true if the identifier is empty or whitespace only.
			pub fn is_blank(&self) -> bool {
				self.0.trim().is_empty()
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(&self.0)
			}
		}

		impl From<&str> for $name {
			fn from(value: &str) -> Self {
				Self(value.to_string())
			}
		}

		impl From<String> for $name {
			fn from(value: String) -> Self {
				Self(value)
			}
		}
	};
}

string_id!(
	/// Globally unique identifier of an order.
	OrderId
);

string_id!(
	/// Identifier of a marketplace user (customer, writer or staff).
	UserId
);

string_id!(
	/// Identifier of an entry in one of the reference data tables.
	ReferenceId
);

impl OrderId {
	/// Generates a fresh random order id.
	pub fn generate() -> Self {
		Self(uuid::Uuid::new_v4().to_string())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_generated_order_ids_are_unique() {
		let a = OrderId::generate();
		let b = OrderId::generate();
		assert_ne!(a, b);
		assert!(uuid::Uuid::parse_str(a.as_str()).is_ok());
	}

	#[test]
	fn test_ids_serialize_as_plain_strings() {
		let id = UserId::from("writer-1");
		assert_eq!(serde_json::to_string(&id).unwrap(), "\"writer-1\"");
		assert!(UserId::from("  ").is_blank());
	}
}
