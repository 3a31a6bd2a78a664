//! String formatting utilities.
//!
//! Renders prices, distances, timestamps and material names the way they are
//! shown to customers in India.

use chrono::{DateTime, TimeZone};
use std::fmt::Display;

/// Formats an amount as Indian rupees without decimals, using Indian digit
/// grouping: the last three digits, then groups of two.
///
/// `123456.4` renders as `₹1,23,456`.
pub fn format_currency(amount: f64) -> String {
	let rounded = amount.round();
	let sign = if rounded < 0.0 { "-" } else { "" };
	let digits = format!("{:.0}", rounded.abs());
	format!("{}₹{}", sign, group_indian(&digits))
}

fn group_indian(digits: &str) -> String {
	if digits.len() <= 3 {
		return digits.to_string();
	}
	let (head, tail) = digits.split_at(digits.len() - 3);
	let mut groups = Vec::new();
	let mut end = head.len();
	while end > 0 {
		let start = end.saturating_sub(2);
		groups.push(&head[start..end]);
		end = start;
	}
	groups.reverse();
	format!("{},{}", groups.join(","), tail)
}

/// Formats a distance: metres below one kilometre, otherwise kilometres with
/// one decimal.
pub fn format_distance(km: f64) -> String {
	if km < 1.0 {
		format!("{} m", (km * 1000.0).round())
	} else {
		format!("{:.1} km", km)
	}
}

/// Formats a timestamp like `19 October 2026, 02:30 PM`.
pub fn format_date<Tz>(date: &DateTime<Tz>) -> String
where
	Tz: TimeZone,
	Tz::Offset: Display,
{
	date.format("%-d %B %Y, %I:%M %p").to_string()
}

/// Turns a material key such as `bubble_wrap` into `Bubble Wrap`.
pub fn format_material_name(name: &str) -> String {
	name.split('_')
		.filter(|word| !word.is_empty())
		.map(|word| {
			let mut chars = word.chars();
			match chars.next() {
				Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
				None => String::new(),
			}
		})
		.collect::<Vec<_>>()
		.join(" ")
}

/// Formats a material quantity, dropping the fraction when it is whole.
pub fn format_quantity(quantity: f64) -> String {
	if quantity.fract() == 0.0 {
		format!("{:.0}", quantity)
	} else {
		let text = format!("{:.2}", quantity);
		text.trim_end_matches('0').trim_end_matches('.').to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Utc;

	#[test]
	fn test_format_currency() {
		assert_eq!(format_currency(0.0), "₹0");
		assert_eq!(format_currency(999.0), "₹999");
		assert_eq!(format_currency(1000.0), "₹1,000");
		assert_eq!(format_currency(123456.4), "₹1,23,456");
		assert_eq!(format_currency(12345678.0), "₹1,23,45,678");
		assert_eq!(format_currency(247.5), "₹248");
		assert_eq!(format_currency(-1500.0), "-₹1,500");
	}

	#[test]
	fn test_format_distance() {
		assert_eq!(format_distance(0.45), "450 m");
		assert_eq!(format_distance(1.0), "1.0 km");
		assert_eq!(format_distance(2.46), "2.5 km");
	}

	#[test]
	fn test_format_date() {
		let date = Utc.with_ymd_and_hms(2026, 10, 19, 14, 30, 0).unwrap();
		assert_eq!(format_date(&date), "19 October 2026, 02:30 PM");

		let morning = Utc.with_ymd_and_hms(2026, 3, 5, 9, 5, 0).unwrap();
		assert_eq!(format_date(&morning), "5 March 2026, 09:05 AM");
	}

	#[test]
	fn test_format_material_name() {
		assert_eq!(format_material_name("bubble_wrap"), "Bubble Wrap");
		assert_eq!(format_material_name("tape"), "Tape");
		assert_eq!(format_material_name("large__box"), "Large Box");
	}

	#[test]
	fn test_format_quantity() {
		assert_eq!(format_quantity(2.0), "2");
		assert_eq!(format_quantity(2.5), "2.5");
		assert_eq!(format_quantity(0.333), "0.33");
		assert_eq!(format_quantity(3.001), "3");
	}
}
