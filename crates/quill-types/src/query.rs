//! Filtered, paginated order queries.

use serde::{Deserialize, Serialize};

use crate::{Order, OrderStatus, Role, UserId};

/// Default number of orders per page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Field filter over order documents. Every populated field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFilter {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub customer_id: Option<UserId>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub writer_id: Option<UserId>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status: Option<OrderStatus>,
}

impl OrderFilter {
	pub fn by_customer(customer_id: UserId) -> Self {
		Self {
			customer_id: Some(customer_id),
			..Self::default()
		}
	}

	pub fn by_writer(writer_id: UserId) -> Self {
		Self {
			writer_id: Some(writer_id),
			..Self::default()
		}
	}

	pub fn by_status(status: OrderStatus) -> Self {
		Self {
			status: Some(status),
			..Self::default()
		}
	}

	pub fn with_status(mut self, status: Option<OrderStatus>) -> Self {
		self.status = status;
		self
	}

	/// Whether `order` satisfies every populated field.
	pub fn matches(&self, order: &Order) -> bool {
		self.customer_id
			.as_ref()
			.is_none_or(|id| *id == order.customer_id)
			&& self
				.writer_id
				.as_ref()
				.is_none_or(|id| order.writer_id.as_ref() == Some(id))
			&& self.status.is_none_or(|status| status == order.status)
	}
}

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
	pub page: u32,
	pub page_size: u32,
}

impl PageRequest {
	/// Clamps raw caller input into a usable page request.
	///
	/// Pages below 1 become 1. Page sizes below 1 or above `max` fall back
	/// to `default_size` rather than being clamped to the bound.
	pub fn normalized(page: Option<u32>, page_size: Option<u32>, default_size: u32, max: u32) -> Self {
		let page = page.filter(|p| *p >= 1).unwrap_or(1);
		let page_size = page_size
			.filter(|s| *s >= 1 && *s <= max)
			.unwrap_or(default_size);
		Self { page, page_size }
	}

	/// Number of items preceding this page.
	pub fn offset(&self) -> usize {
		(self.page.saturating_sub(1) as usize).saturating_mul(self.page_size as usize)
	}

	/// Keeps the items of this page out of an already sorted sequence.
	pub fn window<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
		items
			.into_iter()
			.skip(self.offset())
			.take(self.page_size as usize)
			.collect()
	}
}

impl Default for PageRequest {
	fn default() -> Self {
		Self {
			page: 1,
			page_size: DEFAULT_PAGE_SIZE,
		}
	}
}

/// One page of results plus the total match count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
	pub orders: Vec<T>,
	pub total: u64,
	pub page: u32,
	pub page_size: u32,
}

/// One page of users holding a role, sorted by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPage {
	pub role: Role,
	pub users: Vec<UserId>,
	pub total: u64,
	pub page: u32,
	pub page_size: u32,
}
