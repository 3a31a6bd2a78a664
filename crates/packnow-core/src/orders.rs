//! Order history and single-order operations.

use packnow_api::{ApiError, OrderInterface};
use packnow_types::{Order, OrderId, OrderStatus, Session};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum OrderError {
	#[error("{message}")]
	RequestFailure {
		message: String,
		#[source]
		source: ApiError,
	},
	#[error("Order #{} is already {} and cannot be cancelled", .id, .status.label())]
	NotCancellable { id: OrderId, status: OrderStatus },
}

impl OrderError {
	fn request(source: ApiError, fallback: &str) -> Self {
		OrderError::RequestFailure {
			message: source.user_message(fallback),
			source,
		}
	}

	pub fn is_unauthorized(&self) -> bool {
		matches!(self, OrderError::RequestFailure { source, .. } if source.is_unauthorized())
	}
}

/// Read access to the user's orders plus cancellation.
pub struct OrderBook {
	orders: Arc<dyn OrderInterface>,
}

impl OrderBook {
	pub fn new(orders: Arc<dyn OrderInterface>) -> Self {
		Self { orders }
	}

	/// All orders of the user, newest first.
	pub async fn list(&self, session: &Session) -> Result<Vec<Order>, OrderError> {
		let mut orders = self
			.orders
			.list_orders(session)
			.await
			.map_err(|e| OrderError::request(e, "Failed to load orders"))?;
		orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
		Ok(orders)
	}

	pub async fn get(&self, session: &Session, id: OrderId) -> Result<Order, OrderError> {
		self.orders
			.get_order(session, id)
			.await
			.map_err(|e| OrderError::request(e, "Failed to load order details"))
	}

	/// Cancels an order. `known_status` lets callers that already fetched the
	/// order skip a request that cannot succeed.
	pub async fn cancel(
		&self,
		session: &Session,
		id: OrderId,
		known_status: Option<OrderStatus>,
	) -> Result<(), OrderError> {
		if let Some(status) = known_status.filter(OrderStatus::is_terminal) {
			return Err(OrderError::NotCancellable { id, status });
		}
		self.orders
			.cancel_order(session, id)
			.await
			.map_err(|e| OrderError::request(e, "Failed to cancel order"))?;
		info!(order_id = %id, "Order cancelled");
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use mockall::mock;
	use packnow_types::{CreateOrderRequest, CreatedOrder, TokenPair};

	mock! {
		Orders {}

		#[async_trait]
		impl OrderInterface for Orders {
			async fn create_order(
				&self,
				session: &Session,
				request: &CreateOrderRequest,
			) -> Result<CreatedOrder, ApiError>;
			async fn get_order(&self, session: &Session, id: OrderId) -> Result<Order, ApiError>;
			async fn list_orders(&self, session: &Session) -> Result<Vec<Order>, ApiError>;
			async fn cancel_order(&self, session: &Session, id: OrderId) -> Result<(), ApiError>;
		}
	}

	fn session() -> Session {
		let tokens: TokenPair =
			serde_json::from_value(serde_json::json!({"access_token": "token"})).unwrap();
		Session::new("+919876543210", tokens)
	}

	fn order(id: u64, created_at: &str) -> Order {
		serde_json::from_value(serde_json::json!({
			"id": id,
			"category": "documents",
			"status": "CREATED",
			"price": 120.0,
			"created_at": created_at
		}))
		.unwrap()
	}

	#[tokio::test]
	async fn test_list_newest_first() {
		let mut orders = MockOrders::new();
		orders.expect_list_orders().returning(|_| {
			Ok(vec![
				order(1, "2026-10-01T10:00:00Z"),
				order(3, "2026-10-18T08:30:00Z"),
				order(2, "2026-10-05T12:00:00Z"),
			])
		});

		let listed = OrderBook::new(Arc::new(orders))
			.list(&session())
			.await
			.unwrap();
		let ids: Vec<u64> = listed.iter().map(|o| o.id.0).collect();
		assert_eq!(ids, vec![3, 2, 1]);
	}

	#[tokio::test]
	async fn test_get_failure_message() {
		let mut orders = MockOrders::new();
		orders.expect_get_order().returning(|_, _| {
			Err(ApiError::Status {
				status: 404,
				detail: Some("Order not found".into()),
			})
		});

		let err = OrderBook::new(Arc::new(orders))
			.get(&session(), OrderId(9))
			.await
			.unwrap_err();
		assert_eq!(err.to_string(), "Order not found");
	}

	#[tokio::test]
	async fn test_cancel_terminal_is_refused_locally() {
		let mut orders = MockOrders::new();
		orders.expect_cancel_order().never();

		let err = OrderBook::new(Arc::new(orders))
			.cancel(&session(), OrderId(5), Some(OrderStatus::Completed))
			.await
			.unwrap_err();
		assert!(matches!(err, OrderError::NotCancellable { .. }));
		assert_eq!(
			err.to_string(),
			"Order #5 is already Completed and cannot be cancelled"
		);
	}

	#[tokio::test]
	async fn test_cancel_open_order() {
		let mut orders = MockOrders::new();
		orders
			.expect_cancel_order()
			.withf(|_, id| *id == OrderId(5))
			.times(1)
			.returning(|_, _| Ok(()));

		OrderBook::new(Arc::new(orders))
			.cancel(&session(), OrderId(5), Some(OrderStatus::PackerAssigned))
			.await
			.unwrap();
	}
}
