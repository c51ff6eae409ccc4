//! Reference data kinds and the enriched order projection.
//!
//! Orders carry only foreign ids for their level, page count, urgency,
//! citation style and language. Read paths resolve those ids into display
//! names and return an [`EnrichedOrder`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Order, ReferenceId};

/// A reference data table whose names are resolved for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
	Level,
	Pages,
	Urgency,
	Style,
	Language,
}

impl ReferenceKind {
	pub const ALL: [ReferenceKind; 5] = [
		ReferenceKind::Level,
		ReferenceKind::Pages,
		ReferenceKind::Urgency,
		ReferenceKind::Style,
		ReferenceKind::Language,
	];

	/// Name of the table as used in configuration.
	pub fn as_str(&self) -> &'static str {
		match self {
			ReferenceKind::Level => "levels",
			ReferenceKind::Pages => "pages",
			ReferenceKind::Urgency => "urgency",
			ReferenceKind::Style => "styles",
			ReferenceKind::Language => "languages",
		}
	}

	/// The id the order holds for this table.
	pub fn id_of<'a>(&self, order: &'a Order) -> &'a ReferenceId {
		let c = &order.classification;
		match self {
			ReferenceKind::Level => &c.level_id,
			ReferenceKind::Pages => &c.pages_id,
			ReferenceKind::Urgency => &c.urgency_id,
			ReferenceKind::Style => &c.style_id,
			ReferenceKind::Language => &c.language_id,
		}
	}
}

impl fmt::Display for ReferenceKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// An order decorated with the display names of its references.
///
/// Unresolvable references leave the matching name empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedOrder {
	#[serde(flatten)]
	pub order: Order,
	pub level_name: String,
	pub order_pages_name: String,
	pub order_urgency_name: String,
	pub order_style_name: String,
	pub order_language_name: String,
}

impl EnrichedOrder {
	/// Wraps an order with every name still empty.
	pub fn bare(order: Order) -> Self {
		Self {
			order,
			level_name: String::new(),
			order_pages_name: String::new(),
			order_urgency_name: String::new(),
			order_style_name: String::new(),
			order_language_name: String::new(),
		}
	}

	pub fn set_name(&mut self, kind: ReferenceKind, name: String) {
		let slot = match kind {
			ReferenceKind::Level => &mut self.level_name,
			ReferenceKind::Pages => &mut self.order_pages_name,
			ReferenceKind::Urgency => &mut self.order_urgency_name,
			ReferenceKind::Style => &mut self.order_style_name,
			ReferenceKind::Language => &mut self.order_language_name,
		};
		*slot = name;
	}

	pub fn name(&self, kind: ReferenceKind) -> &str {
		match kind {
			ReferenceKind::Level => &self.level_name,
			ReferenceKind::Pages => &self.order_pages_name,
			ReferenceKind::Urgency => &self.order_urgency_name,
			ReferenceKind::Style => &self.order_style_name,
			ReferenceKind::Language => &self.order_language_name,
		}
	}
}
