//! Estimate types for the PackNow client.
//!
//! An estimate is the quoted material list and price breakdown for an order
//! that has not been created yet. It is assembled from two independent
//! responses and is only ever adopted as a whole.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Response of the materials estimate endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialEstimate {
	/// Material name mapped to the required quantity.
	pub materials: BTreeMap<String, f64>,
	/// Cost of the listed materials, when the service reports it.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub material_cost: Option<f64>,
	/// Suggested box size (e.g. "medium"), when the service reports it.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub estimated_box_size: Option<String>,
}

/// Response of the price estimate endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBreakdown {
	pub material_cost: f64,
	pub base_price: f64,
	pub distance_charge: f64,
	pub urgency_multiplier: f64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub category_multiplier: Option<f64>,
	/// Authoritative total of the quote.
	pub final_price: f64,
}

/// Combined, read-only estimate snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
	pub materials: BTreeMap<String, f64>,
	pub pricing: PriceBreakdown,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub box_size: Option<String>,
}

impl Estimate {
	/// Combines the two sub-responses into one snapshot.
	pub fn new(materials: MaterialEstimate, pricing: PriceBreakdown) -> Self {
		Self {
			materials: materials.materials,
			pricing,
			box_size: materials.estimated_box_size,
		}
	}

	/// The authoritative total.
	pub fn final_price(&self) -> f64 {
		self.pricing.final_price
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_minimal_material_response() {
		let materials: MaterialEstimate =
			serde_json::from_str(r#"{"materials": {"box": 1, "tape": 1}}"#).unwrap();
		assert_eq!(materials.materials.len(), 2);
		assert_eq!(materials.material_cost, None);
		assert_eq!(materials.estimated_box_size, None);
	}

	#[test]
	fn test_combine() {
		let materials: MaterialEstimate = serde_json::from_str(
			r#"{"materials": {"bubble_wrap": 2.5}, "material_cost": 37.5, "estimated_box_size": "small"}"#,
		)
		.unwrap();
		let pricing: PriceBreakdown = serde_json::from_str(
			r#"{"material_cost": 37.5, "base_price": 87.5, "distance_charge": 50,
			    "urgency_multiplier": 1.5, "category_multiplier": 1.2, "final_price": 247.5}"#,
		)
		.unwrap();

		let estimate = Estimate::new(materials, pricing);
		assert_eq!(estimate.final_price(), 247.5);
		assert_eq!(estimate.box_size.as_deref(), Some("small"));
		assert_eq!(estimate.materials["bubble_wrap"], 2.5);
		assert_eq!(estimate.pricing.category_multiplier, Some(1.2));
	}
}
