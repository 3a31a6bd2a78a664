//! Order status tracker.
//!
//! Fetches one order at a fixed interval on a background task and publishes
//! every change through a `watch` channel. Fetches run one after another, so
//! a tick that comes due while a request is still in flight is skipped
//! rather than stacked. Dropping the tracker cancels the task.

use packnow_api::OrderInterface;
use packnow_types::{Order, OrderId, OrderStatus, Session};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, instrument, warn};

pub struct StatusTracker {
	order_id: OrderId,
	receiver: watch::Receiver<Option<Order>>,
	handle: JoinHandle<()>,
}

impl StatusTracker {
	/// Starts polling immediately. Must be called inside a Tokio runtime.
	///
	/// `known` is an already fetched copy of the order. It seeds the tracker
	/// so only later changes are reported.
	pub fn start(
		orders: Arc<dyn OrderInterface>,
		session: Session,
		order_id: OrderId,
		poll_interval: Duration,
		known: Option<Order>,
	) -> Self {
		let last_status = known.as_ref().map(|order| order.status);
		// The initial value counts as seen, so `changed` waits for a fetch
		// that differs from it.
		let (sender, receiver) = watch::channel(known);
		let handle = tokio::spawn(poll(
			orders,
			session,
			order_id,
			poll_interval,
			last_status,
			sender,
		));
		debug!(%order_id, interval_secs = poll_interval.as_secs(), "Status tracker started");
		Self {
			order_id,
			receiver,
			handle,
		}
	}

	pub fn order_id(&self) -> OrderId {
		self.order_id
	}

	/// A receiver that sees the same updates as this tracker.
	pub fn subscribe(&self) -> watch::Receiver<Option<Order>> {
		self.receiver.clone()
	}

	/// Most recently fetched order, if any fetch has succeeded yet.
	pub fn latest(&self) -> Option<Order> {
		self.receiver.borrow().clone()
	}

	/// Waits for the next change. Returns `None` once polling has stopped.
	pub async fn changed(&mut self) -> Option<Order> {
		self.receiver.changed().await.ok()?;
		self.receiver.borrow_and_update().clone()
	}

	pub fn stop(self) {}
}

impl Drop for StatusTracker {
	fn drop(&mut self) {
		self.handle.abort();
		debug!(order_id = %self.order_id, "Status tracker stopped");
	}
}

#[instrument(skip_all, fields(order_id = %order_id))]
async fn poll(
	orders: Arc<dyn OrderInterface>,
	session: Session,
	order_id: OrderId,
	period: Duration,
	mut last_status: Option<OrderStatus>,
	sender: watch::Sender<Option<Order>>,
) {
	let mut ticker = tokio::time::interval(period);
	ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

	loop {
		ticker.tick().await;

		let order = match orders.get_order(&session, order_id).await {
			Ok(order) => order,
			Err(e) => {
				// The next tick retries.
				warn!(error = %e, "Failed to fetch order status");
				continue;
			}
		};

		if let Some(previous) = last_status {
			if !previous.can_reach(&order.status) {
				warn!(from = %previous, to = %order.status, "Unexpected status change");
			}
		}
		last_status = Some(order.status);

		sender.send_if_modified(|current| {
			if current.as_ref() == Some(&order) {
				return false;
			}
			debug!(status = %order.status, "Order updated");
			*current = Some(order);
			true
		});
	}
}
