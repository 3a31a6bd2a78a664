use super::{authorized, CliError};
use crate::render;
use packnow_core::PackNowClient;
use packnow_types::OrderId;
use tracing::info;

pub async fn list_orders(client: &PackNowClient) -> Result<(), CliError> {
	let mut session = client.sessions().require().await?;
	let book = client.orders();
	let orders = authorized!(client, session, book.list(&session).await)?;
	print!("{}", render::order_list(&orders));
	Ok(())
}

pub async fn show_order(client: &PackNowClient, id: OrderId) -> Result<(), CliError> {
	let mut session = client.sessions().require().await?;
	let book = client.orders();
	let order = authorized!(client, session, book.get(&session, id).await)?;
	print!("{}", render::order_detail(&order));
	Ok(())
}

/// Prints every status change until the order reaches a terminal status or
/// the user presses Ctrl-C.
pub async fn track_order(client: &PackNowClient, id: OrderId) -> Result<(), CliError> {
	let mut session = client.sessions().require().await?;
	// Fail fast on unknown orders and expired sessions before polling.
	let book = client.orders();
	let order = authorized!(client, session, book.get(&session, id).await)?;
	print!("{}", render::order_detail(&order));
	if order.status.is_terminal() {
		return Ok(());
	}

	println!("\nTracking order #{} (Ctrl-C to stop)", id);
	let mut tracker = client.track(session, id, Some(order));
	loop {
		tokio::select! {
			update = tracker.changed() => {
				let Some(order) = update else { break };
				println!("{}", render::status_update(&order));
				if order.status.is_terminal() {
					break;
				}
			}
			_ = tokio::signal::ctrl_c() => {
				info!("Tracking interrupted");
				break;
			}
		}
	}
	tracker.stop();
	Ok(())
}

pub async fn cancel_order(client: &PackNowClient, id: OrderId) -> Result<(), CliError> {
	let mut session = client.sessions().require().await?;
	let book = client.orders();
	let order = authorized!(client, session, book.get(&session, id).await)?;
	authorized!(
		client,
		session,
		book.cancel(&session, id, Some(order.status)).await
	)?;
	println!("Order #{} cancelled.", id);
	Ok(())
}
