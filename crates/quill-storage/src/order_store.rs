//! Typed order persistence on top of [`StorageService`].

use chrono::Utc;
use quill_types::{Order, OrderFilter, OrderId, OrderStatus, Page, PageRequest, StorageKey, UserId};

use crate::{StorageError, StorageService};

/// Expected pre-state of an order for a conditional update.
///
/// Every populated field must match the stored document at the moment of the
/// write for the update to apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateFilter {
	/// Allowed current statuses. Empty matches any status.
	pub statuses: Vec<OrderStatus>,
	pub customer_id: Option<UserId>,
	pub writer_id: Option<UserId>,
	/// Requires `feedback_request_count` to be strictly below this value.
	pub feedback_requests_below: Option<u32>,
	pub payment_claim: Option<ClaimFilter>,
}

/// Expected state of an order's payment claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimFilter {
	/// No confirmation is charging the order.
	Unclaimed,
	/// The order is claimed with exactly this token.
	ClaimedBy(String),
}

impl UpdateFilter {
	pub fn status_in(statuses: &[OrderStatus]) -> Self {
		Self {
			statuses: statuses.to_vec(),
			..Self::default()
		}
	}

	pub fn customer(mut self, customer_id: &UserId) -> Self {
		self.customer_id = Some(customer_id.clone());
		self
	}

	pub fn writer(mut self, writer_id: &UserId) -> Self {
		self.writer_id = Some(writer_id.clone());
		self
	}

	pub fn feedback_requests_below(mut self, limit: u32) -> Self {
		self.feedback_requests_below = Some(limit);
		self
	}

	pub fn unclaimed(mut self) -> Self {
		self.payment_claim = Some(ClaimFilter::Unclaimed);
		self
	}

	pub fn claimed_by(mut self, token: &str) -> Self {
		self.payment_claim = Some(ClaimFilter::ClaimedBy(token.to_string()));
		self
	}

	pub fn matches(&self, order: &Order) -> bool {
		(self.statuses.is_empty() || self.statuses.contains(&order.status))
			&& self
				.customer_id
				.as_ref()
				.is_none_or(|id| *id == order.customer_id)
			&& self
				.writer_id
				.as_ref()
				.is_none_or(|id| order.writer_id.as_ref() == Some(id))
			&& self
				.feedback_requests_below
				.is_none_or(|limit| order.feedback_request_count < limit)
			&& self.payment_claim.as_ref().is_none_or(|claim| match claim {
				ClaimFilter::Unclaimed => order.payment_claim.is_none(),
				ClaimFilter::ClaimedBy(token) => order.payment_claim.as_deref() == Some(token),
			})
	}
}

/// Outcome of [`OrderStore::conditional_update`].
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateResult {
	/// Number of documents the filter matched: 0 or 1.
	pub matched_count: u64,
	/// The document as written, when the update applied.
	pub order: Option<Order>,
}

/// Order documents keyed by order id.
pub struct OrderStore {
	storage: StorageService,
}

impl OrderStore {
	const NAMESPACE: StorageKey = StorageKey::Orders;

	pub fn new(storage: StorageService) -> Self {
		Self { storage }
	}

	/// Persists a new order. Fails if the id is already taken.
	pub async fn insert(&self, order: &Order) -> Result<(), StorageError> {
		self.storage
			.insert(Self::NAMESPACE, order.id.as_str(), order)
			.await
	}

	pub async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, StorageError> {
		match self.storage.retrieve(Self::NAMESPACE, id.as_str()).await {
			Ok(order) => Ok(Some(order)),
			Err(StorageError::NotFound) => Ok(None),
			Err(e) => Err(e),
		}
	}

	/// Applies `mutation` in one atomic step if the stored order matches
	/// `filter`, stamping `updated_at`.
	///
	/// A missing order and a filter mismatch both report `matched_count = 0`.
	pub async fn conditional_update<F>(
		&self,
		id: &OrderId,
		filter: &UpdateFilter,
		mutation: F,
	) -> Result<UpdateResult, StorageError>
	where
		F: Fn(&mut Order),
	{
		let updated = self
			.storage
			.update_if(
				Self::NAMESPACE,
				id.as_str(),
				|order: &Order| filter.matches(order),
				|order| {
					mutation(order);
					order.updated_at = Utc::now();
				},
			)
			.await?;

		Ok(UpdateResult {
			matched_count: u64::from(updated.is_some()),
			order: updated,
		})
	}

	/// Returns one page of orders matching `filter`, newest first.
	pub async fn find_filtered(
		&self,
		filter: &OrderFilter,
		page: PageRequest,
	) -> Result<Page<Order>, StorageError> {
		let mut matching = self.matching(filter).await?;
		// Id breaks ties so paging is stable.
		matching.sort_by(|a, b| {
			b.created_at
				.cmp(&a.created_at)
				.then_with(|| a.id.cmp(&b.id))
		});

		let total = matching.len() as u64;
		Ok(Page {
			orders: page.window(matching),
			total,
			page: page.page,
			page_size: page.page_size,
		})
	}

	pub async fn count(&self, filter: &OrderFilter) -> Result<u64, StorageError> {
		Ok(self.matching(filter).await?.len() as u64)
	}

	async fn matching(&self, filter: &OrderFilter) -> Result<Vec<Order>, StorageError> {
		let orders: Vec<Order> = self.storage.retrieve_all(Self::NAMESPACE).await?;
		Ok(orders
			.into_iter()
			.filter(|order| filter.matches(order))
			.collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::implementations::memory::MemoryStorage;
	use chrono::{Duration, TimeZone};
	use quill_types::{AddOns, Classification, NewOrder};
	use rust_decimal::Decimal;

	fn store() -> OrderStore {
		OrderStore::new(StorageService::new(Box::new(MemoryStorage::new())))
	}

	fn order(id: &str, customer: &str, minutes: i64) -> Order {
		let created = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap() + Duration::minutes(minutes);
		Order::place(
			OrderId::from(id),
			UserId::from(customer),
			NewOrder {
				title: format!("Order {}", id),
				description: String::new(),
				price: Decimal::new(2500, 2),
				classification: Classification {
					order_type_id: "essay".into(),
					level_id: "lvl".into(),
					pages_id: "pg".into(),
					urgency_id: "urg".into(),
					style_id: "apa".into(),
					language_id: "en".into(),
				},
				add_ons: AddOns::default(),
			},
			created,
		)
	}

	#[tokio::test]
	async fn test_insert_and_find() {
		let store = store();
		let o = order("o-1", "c-1", 0);
		store.insert(&o).await.unwrap();

		assert_eq!(store.find_by_id(&o.id).await.unwrap(), Some(o.clone()));
		assert_eq!(store.find_by_id(&OrderId::from("none")).await.unwrap(), None);
		assert!(matches!(
			store.insert(&o).await,
			Err(StorageError::AlreadyExists(_))
		));
	}

	#[tokio::test]
	async fn test_conditional_update_matches_status_and_owner() {
		let store = store();
		let o = order("o-1", "c-1", 0);
		store.insert(&o).await.unwrap();

		let wrong_owner = UpdateFilter::status_in(&[OrderStatus::PendingPayment])
			.customer(&UserId::from("c-2"));
		let result = store
			.conditional_update(&o.id, &wrong_owner, |o| o.status = OrderStatus::Paid)
			.await
			.unwrap();
		assert_eq!(result.matched_count, 0);
		assert!(result.order.is_none());

		let right = UpdateFilter::status_in(&[OrderStatus::PendingPayment]).customer(&o.customer_id);
		let result = store
			.conditional_update(&o.id, &right, |o| o.status = OrderStatus::Paid)
			.await
			.unwrap();
		assert_eq!(result.matched_count, 1);
		let written = result.order.unwrap();
		assert_eq!(written.status, OrderStatus::Paid);
		assert!(written.updated_at > o.updated_at);

		let missing = store
			.conditional_update(&OrderId::from("nope"), &right, |o| o.status = OrderStatus::Paid)
			.await
			.unwrap();
		assert_eq!(missing.matched_count, 0);
	}

	#[test]
	fn test_update_filter_feedback_bound() {
		let mut o = order("o-1", "c-1", 0);
		let filter = UpdateFilter::default().feedback_requests_below(4);
		o.feedback_request_count = 3;
		assert!(filter.matches(&o));
		o.feedback_request_count = 4;
		assert!(!filter.matches(&o));
	}

	#[test]
	fn test_update_filter_payment_claim() {
		let mut o = order("o-1", "c-1", 0);
		let unclaimed = UpdateFilter::default().unclaimed();
		let mine = UpdateFilter::default().claimed_by("tok-1");
		assert!(unclaimed.matches(&o));
		assert!(!mine.matches(&o));

		o.payment_claim = Some("tok-1".into());
		assert!(!unclaimed.matches(&o));
		assert!(mine.matches(&o));
		assert!(!UpdateFilter::default().claimed_by("tok-2").matches(&o));
	}

	#[tokio::test]
	async fn test_find_filtered_sorts_newest_first_and_pages() {
		let store = store();
		for i in 0..5 {
			store
				.insert(&order(&format!("o-{}", i), "c-1", i))
				.await
				.unwrap();
		}
		store.insert(&order("x-1", "c-2", 10)).await.unwrap();

		let filter = OrderFilter::by_customer(UserId::from("c-1"));
		let first = store
			.find_filtered(&filter, PageRequest { page: 1, page_size: 2 })
			.await
			.unwrap();
		assert_eq!(first.total, 5);
		let ids: Vec<_> = first.orders.iter().map(|o| o.id.as_str()).collect();
		assert_eq!(ids, vec!["o-4", "o-3"]);

		let last = store
			.find_filtered(&filter, PageRequest { page: 3, page_size: 2 })
			.await
			.unwrap();
		assert_eq!(last.orders.len(), 1);
		assert_eq!(last.orders[0].id.as_str(), "o-0");

		let beyond = store
			.find_filtered(&filter, PageRequest { page: 9, page_size: 2 })
			.await
			.unwrap();
		assert!(beyond.orders.is_empty());
		assert_eq!(beyond.total, 5);

		assert_eq!(store.count(&OrderFilter::default()).await.unwrap(), 6);
		assert_eq!(
			store
				.count(&OrderFilter::by_status(OrderStatus::Paid))
				.await
				.unwrap(),
			0
		);
	}
}
