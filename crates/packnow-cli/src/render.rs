//! Plain-text rendering of estimates and orders for the terminal.

use chrono::Local;
use packnow_types::{
	format_currency, format_date, format_distance, format_material_name, format_quantity, Estimate,
	Order, OrderStatus, StrengthReport,
};
use std::fmt::Write;

/// Material list and price breakdown shown before confirming an order.
pub fn estimate(estimate: &Estimate) -> String {
	let mut out = String::new();
	let _ = writeln!(out, "Materials");
	if estimate.materials.is_empty() {
		let _ = writeln!(out, "  (none)");
	}
	for (name, quantity) in &estimate.materials {
		let _ = writeln!(
			out,
			"  {:<24} {:>8}",
			format_material_name(name),
			format_quantity(*quantity)
		);
	}
	if let Some(size) = &estimate.box_size {
		let _ = writeln!(out, "  Suggested box size: {}", size);
	}

	let pricing = &estimate.pricing;
	let _ = writeln!(out, "\nPrice");
	let _ = writeln!(out, "  {:<24} {:>8}", "Material Cost", format_currency(pricing.material_cost));
	let _ = writeln!(out, "  {:<24} {:>8}", "Base Price", format_currency(pricing.base_price));
	let _ = writeln!(
		out,
		"  {:<24} {:>8}",
		"Distance Charge",
		format_currency(pricing.distance_charge)
	);
	let _ = writeln!(
		out,
		"  {:<24} {:>8}",
		"Urgency Multiplier",
		format!("x{}", format_quantity(pricing.urgency_multiplier))
	);
	if let Some(multiplier) = pricing.category_multiplier {
		let _ = writeln!(
			out,
			"  {:<24} {:>8}",
			"Category Multiplier",
			format!("x{}", format_quantity(multiplier))
		);
	}
	let _ = writeln!(out, "  {:<24} {:>8}", "Total", format_currency(estimate.final_price()));
	out
}

/// One line per order, as given.
pub fn order_list(orders: &[Order]) -> String {
	if orders.is_empty() {
		return "No orders yet. Create one with `packnow order create`.\n".to_string();
	}
	let mut out = String::new();
	for order in orders {
		let _ = writeln!(
			out,
			"#{:<6} {:<18} {:<16} {:>10}  {}",
			order.id,
			order.status.label(),
			order.category.label(),
			format_currency(order.price),
			format_date(&order.created_at.with_timezone(&Local))
		);
	}
	out
}

/// Progress markers for the regular status progression.
///
/// `[x]` reached, `[>]` current, `[ ]` pending. A cancelled order shows no
/// progress and a separate line instead.
pub fn timeline(status: OrderStatus) -> String {
	let mut out = String::new();
	let current = status.step_index();
	for (index, step) in OrderStatus::PROGRESSION.iter().enumerate() {
		let marker = match current {
			Some(at) if index < at => "[x]",
			Some(at) if index == at && status.is_terminal() => "[x]",
			Some(at) if index == at => "[>]",
			_ => "[ ]",
		};
		let _ = writeln!(out, "  {} {}", marker, step.label());
	}
	if status == OrderStatus::Cancelled {
		let _ = writeln!(out, "  This order was cancelled.");
	}
	out
}

/// Detail view of a single order.
pub fn order_detail(order: &Order) -> String {
	let mut out = String::new();
	let _ = writeln!(out, "Order #{} ({})", order.id, order.category.label());
	let _ = writeln!(
		out,
		"Placed {}",
		format_date(&order.created_at.with_timezone(&Local))
	);
	let _ = writeln!(out, "\nStatus");
	out.push_str(&timeline(order.status));

	if !order.materials_required.is_empty() {
		let _ = writeln!(out, "\nMaterials");
		for (name, quantity) in &order.materials_required {
			let _ = writeln!(
				out,
				"  {:<24} {:>8}",
				format_material_name(name),
				format_quantity(*quantity)
			);
		}
	}

	let distance = order
		.distance_km
		.map(format_distance)
		.unwrap_or_else(|| "Calculating...".to_string());
	let _ = writeln!(out, "\nDistance  {}", distance);
	let _ = writeln!(out, "Price     {}", format_currency(order.price));
	out
}

/// Strength label and requirement checklist for a rejected password.
pub fn password_report(report: &StrengthReport) -> String {
	let mut out = String::new();
	let _ = writeln!(
		out,
		"Password strength: {} ({}/5)",
		report.strength.label(),
		report.score
	);
	for (requirement, met) in report.checks.requirements() {
		let _ = writeln!(out, "  {} {}", if met { "[x]" } else { "[ ]" }, requirement);
	}
	let _ = writeln!(out, "Please use a stronger password meeting all requirements.");
	out
}

/// Single line printed by the tracker on every change.
pub fn status_update(order: &Order) -> String {
	format!(
		"[{}] Order #{}: {}",
		Local::now().format("%H:%M:%S"),
		order.id,
		order.status.label()
	)
}
