//! Order types for the PackNow client.
//!
//! This module defines the packaging parameters a customer chooses, the wire
//! payloads sent to the estimate and order endpoints, and the server-side order
//! record together with its fulfillment status progression.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Packaging service category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
	Gift,
	Electronics,
	Food,
	Documents,
	BusinessOrders,
	FragileItems,
	HouseShifting,
}

impl Category {
	/// Returns the wire representation of the category.
	pub fn as_str(&self) -> &'static str {
		match self {
			Category::Gift => "gift",
			Category::Electronics => "electronics",
			Category::Food => "food",
			Category::Documents => "documents",
			Category::BusinessOrders => "business_orders",
			Category::FragileItems => "fragile_items",
			Category::HouseShifting => "house_shifting",
		}
	}

	/// Returns the human-readable label shown when picking a category.
	pub fn label(&self) -> &'static str {
		match self {
			Category::Gift => "Gift Wrapping",
			Category::Electronics => "Electronics",
			Category::Food => "Food Packaging",
			Category::Documents => "Documents",
			Category::BusinessOrders => "Business Orders",
			Category::FragileItems => "Fragile Items",
			Category::HouseShifting => "House Shifting",
		}
	}

	/// Returns an iterator over all categories in display order.
	pub fn all() -> impl Iterator<Item = Self> {
		[
			Self::Gift,
			Self::Electronics,
			Self::Food,
			Self::Documents,
			Self::BusinessOrders,
			Self::FragileItems,
			Self::HouseShifting,
		]
		.into_iter()
	}
}

impl fmt::Display for Category {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Category {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::all()
			.find(|c| c.as_str() == s.trim())
			.ok_or_else(|| {
				let known: Vec<&str> = Self::all().map(|c| c.as_str()).collect();
				format!("unknown category '{}', expected one of: {}", s, known.join(", "))
			})
	}
}

/// How fragile the packed item is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragilityLevel {
	#[default]
	Low,
	Medium,
	High,
}

impl FragilityLevel {
	pub fn as_str(&self) -> &'static str {
		match self {
			FragilityLevel::Low => "low",
			FragilityLevel::Medium => "medium",
			FragilityLevel::High => "high",
		}
	}
}

impl fmt::Display for FragilityLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for FragilityLevel {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim() {
			"low" => Ok(Self::Low),
			"medium" => Ok(Self::Medium),
			"high" => Ok(Self::High),
			other => Err(format!(
				"unknown fragility level '{}', expected low, medium or high",
				other
			)),
		}
	}
}

/// How quickly the packer is needed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
	#[default]
	Normal,
	Urgent,
}

impl Urgency {
	pub fn as_str(&self) -> &'static str {
		match self {
			Urgency::Normal => "normal",
			Urgency::Urgent => "urgent",
		}
	}
}

impl fmt::Display for Urgency {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Urgency {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim() {
			"normal" => Ok(Self::Normal),
			"urgent" => Ok(Self::Urgent),
			other => Err(format!(
				"unknown urgency '{}', expected normal or urgent",
				other
			)),
		}
	}
}

/// Item dimensions in centimetres and weight in kilograms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
	pub length: f64,
	pub width: f64,
	pub height: f64,
	pub weight: f64,
}

/// Pickup location of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
	pub lat: f64,
	pub lng: f64,
	pub address: String,
}

/// Body of both estimate requests (materials and price).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateRequest {
	pub category: Category,
	pub item_dimensions: Dimensions,
	pub fragility_level: FragilityLevel,
	pub urgency: Urgency,
	pub distance_km: f64,
}

/// Body of the create-order request.
///
/// Carries the confirmed draft parameters and the pickup location but never
/// the estimate: the server prices the order itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
	pub category: Category,
	pub item_dimensions: Dimensions,
	pub fragility_level: FragilityLevel,
	pub urgency: Urgency,
	pub pickup_location: Location,
}

/// Server-assigned order identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl FromStr for OrderId {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		s.trim()
			.trim_start_matches('#')
			.parse::<u64>()
			.map(OrderId)
			.map_err(|_| format!("invalid order id '{}'", s))
	}
}

/// Minimal view of the create-order response; only the identifier is used.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedOrder {
	pub id: OrderId,
}

/// Fulfillment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
	Created,
	PackerAssigned,
	OnTheWay,
	Packed,
	Completed,
	Cancelled,
}

/// Direct successors of each status. Terminal statuses map to nothing.
static TRANSITIONS: Lazy<HashMap<OrderStatus, HashSet<OrderStatus>>> = Lazy::new(|| {
	let mut m = HashMap::new();
	m.insert(
		OrderStatus::Created,
		HashSet::from([OrderStatus::PackerAssigned, OrderStatus::Cancelled]),
	);
	m.insert(
		OrderStatus::PackerAssigned,
		HashSet::from([OrderStatus::OnTheWay, OrderStatus::Cancelled]),
	);
	m.insert(
		OrderStatus::OnTheWay,
		HashSet::from([OrderStatus::Packed, OrderStatus::Cancelled]),
	);
	m.insert(
		OrderStatus::Packed,
		HashSet::from([OrderStatus::Completed, OrderStatus::Cancelled]),
	);
	m.insert(OrderStatus::Completed, HashSet::new()); // terminal
	m.insert(OrderStatus::Cancelled, HashSet::new()); // terminal
	m
});

impl OrderStatus {
	/// The regular progression shown as a timeline. `Cancelled` is not part of it.
	pub const PROGRESSION: [OrderStatus; 5] = [
		OrderStatus::Created,
		OrderStatus::PackerAssigned,
		OrderStatus::OnTheWay,
		OrderStatus::Packed,
		OrderStatus::Completed,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			OrderStatus::Created => "CREATED",
			OrderStatus::PackerAssigned => "PACKER_ASSIGNED",
			OrderStatus::OnTheWay => "ON_THE_WAY",
			OrderStatus::Packed => "PACKED",
			OrderStatus::Completed => "COMPLETED",
			OrderStatus::Cancelled => "CANCELLED",
		}
	}

	/// Timeline label for the status.
	pub fn label(&self) -> &'static str {
		match self {
			OrderStatus::Created => "Order Created",
			OrderStatus::PackerAssigned => "Packer Assigned",
			OrderStatus::OnTheWay => "Packer On The Way",
			OrderStatus::Packed => "Items Packed",
			OrderStatus::Completed => "Completed",
			OrderStatus::Cancelled => "Cancelled",
		}
	}

	/// Returns true for statuses after which the order never changes again.
	pub fn is_terminal(&self) -> bool {
		TRANSITIONS.get(self).is_none_or(|next| next.is_empty())
	}

	/// Position of the status on the timeline, `None` for `Cancelled`.
	pub fn step_index(&self) -> Option<usize> {
		Self::PROGRESSION.iter().position(|s| s == self)
	}

	/// Checks whether `to` can be observed after `self`, possibly skipping
	/// intermediate statuses between two polls.
	pub fn can_reach(&self, to: &OrderStatus) -> bool {
		if self == to {
			return true;
		}
		let mut frontier = vec![*self];
		let mut seen = HashSet::new();
		while let Some(current) = frontier.pop() {
			for next in TRANSITIONS.get(&current).into_iter().flatten() {
				if next == to {
					return true;
				}
				if seen.insert(*next) {
					frontier.push(*next);
				}
			}
		}
		false
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Order record as returned by the fetch and list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
	pub id: OrderId,
	pub category: Category,
	pub status: OrderStatus,
	pub price: f64,
	#[serde(default)]
	pub distance_km: Option<f64>,
	#[serde(with = "timestamp_serde")]
	pub created_at: DateTime<Utc>,
	#[serde(default)]
	pub materials_required: BTreeMap<String, f64>,
	#[serde(default)]
	pub fragility_level: Option<FragilityLevel>,
	#[serde(default)]
	pub urgency: Option<Urgency>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub packer_id: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub item_dimensions: Option<Dimensions>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub pickup_location: Option<Location>,
}

/// Timestamps arrive either as RFC 3339 with an offset or as naive ISO 8601
/// values, which are taken to be UTC.
pub mod timestamp_serde {
	use chrono::{DateTime, NaiveDateTime, Utc};
	use serde::{Deserialize, Deserializer, Serializer};

	pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&value.to_rfc3339())
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = String::deserialize(deserializer)?;
		parse(&raw).map_err(serde::de::Error::custom)
	}

	pub fn parse(raw: &str) -> Result<DateTime<Utc>, String> {
		if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
			return Ok(dt.with_timezone(&Utc));
		}
		NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
			.or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
			.map(|naive| naive.and_utc())
			.map_err(|e| format!("invalid timestamp '{}': {}", raw, e))
	}
}
