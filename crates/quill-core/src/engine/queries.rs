//! Read paths: filtered listings and single-order fetch, all enriched with
//! reference names.

use super::{require_staff, OrderLifecycle};
use crate::LifecycleError;
use quill_types::{
	truncate_id, Actor, EnrichedOrder, Order, OrderFilter, OrderId, OrderStatus, Page, PageRequest,
	Role, UserId, UserPage,
};
use tracing::instrument;

impl OrderLifecycle {
	fn page_request(&self, page: Option<u32>, page_size: Option<u32>) -> PageRequest {
		PageRequest::normalized(
			page,
			page_size,
			self.settings.default_page_size,
			self.settings.max_page_size,
		)
	}

	async fn enriched_page(
		&self,
		filter: OrderFilter,
		page: Option<u32>,
		page_size: Option<u32>,
	) -> Result<Page<EnrichedOrder>, LifecycleError> {
		let request = self.page_request(page, page_size);
		let found = self
			.bounded("order query", self.orders.find_filtered(&filter, request))
			.await?;
		tracing::debug!(total = found.total, returned = found.orders.len(), "Listed orders");

		let Page {
			orders,
			total,
			page,
			page_size,
		} = found;
		Ok(Page {
			orders: self.reference.enrich(orders).await,
			total,
			page,
			page_size,
		})
	}

	/// Lists orders by any combination of customer, writer and status.
	/// Staff only.
	#[instrument(skip_all, fields(actor = %actor.id))]
	pub async fn list_orders(
		&self,
		actor: &Actor,
		filter: OrderFilter,
		page: Option<u32>,
		page_size: Option<u32>,
	) -> Result<Page<EnrichedOrder>, LifecycleError> {
		require_staff(actor)?;
		self.enriched_page(filter, page, page_size).await
	}

	/// Lists every order in `status`. Staff only.
	#[instrument(skip_all, fields(actor = %actor.id, status = %status))]
	pub async fn list_by_status(
		&self,
		actor: &Actor,
		status: OrderStatus,
		page: Option<u32>,
		page_size: Option<u32>,
	) -> Result<Page<EnrichedOrder>, LifecycleError> {
		require_staff(actor)?;
		self.enriched_page(OrderFilter::by_status(status), page, page_size)
			.await
	}

	/// Lists the orders assigned to `writer_id`.
	///
	/// Writers may list their own orders; staff may list anyone's.
	#[instrument(skip_all, fields(actor = %actor.id, writer = %writer_id))]
	pub async fn list_for_writer(
		&self,
		actor: &Actor,
		writer_id: &UserId,
		status: Option<OrderStatus>,
		page: Option<u32>,
		page_size: Option<u32>,
	) -> Result<Page<EnrichedOrder>, LifecycleError> {
		let own = actor.is_writer() && actor.id == *writer_id;
		if !own && !actor.is_staff() {
			return Err(LifecycleError::NotAuthorized(
				"cannot list another writer's orders".into(),
			));
		}

		let filter = OrderFilter::by_writer(writer_id.clone()).with_status(status);
		self.enriched_page(filter, page, page_size).await
	}

	/// Lists the calling customer's own orders.
	#[instrument(skip_all, fields(actor = %actor.id))]
	pub async fn list_for_customer(
		&self,
		actor: &Actor,
		status: Option<OrderStatus>,
		page: Option<u32>,
		page_size: Option<u32>,
	) -> Result<Page<EnrichedOrder>, LifecycleError> {
		let filter = OrderFilter::by_customer(actor.id.clone()).with_status(status);
		self.enriched_page(filter, page, page_size).await
	}

	/// Lists the users holding `role`, sorted by id. Staff only.
	///
	/// This is how staff find assignment candidates; the writer role is
	/// still re-checked when an order is actually assigned.
	#[instrument(skip_all, fields(actor = %actor.id, role = %role))]
	pub async fn list_users_with_role(
		&self,
		actor: &Actor,
		role: Role,
		page: Option<u32>,
		page_size: Option<u32>,
	) -> Result<UserPage, LifecycleError> {
		require_staff(actor)?;
		let request = self.page_request(page, page_size);
		let users = self
			.bounded("role listing", self.roles.users_with(role))
			.await?;

		Ok(UserPage {
			role,
			total: users.len() as u64,
			users: request.window(users),
			page: request.page,
			page_size: request.page_size,
		})
	}

	/// Fetches one order.
	///
	/// Visible to its customer, its current writer and staff. Anyone else
	/// gets the same answer as for a missing order.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id.as_str()), actor = %actor.id))]
	pub async fn get_order(&self, actor: &Actor, order_id: &OrderId) -> Result<EnrichedOrder, LifecycleError> {
		let order = self
			.bounded("order lookup", self.orders.find_by_id(order_id))
			.await?
			.filter(|order| visible_to(order, actor))
			.ok_or(LifecycleError::NotFoundOrInvalidState)?;

		let mut enriched = self.reference.enrich(vec![order]).await;
		enriched
			.pop()
			.ok_or(LifecycleError::NotFoundOrInvalidState)
	}
}

fn visible_to(order: &Order, actor: &Actor) -> bool {
	actor.is_staff()
		|| order.customer_id == actor.id
		|| order.writer_id.as_ref() == Some(&actor.id)
}
