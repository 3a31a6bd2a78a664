//! Order draft as entered by the user.
//!
//! Dimensions are kept exactly as typed so a half-finished draft can be held
//! and edited; they are only parsed when the draft is validated.

use packnow_types::{
	Category, CreateOrderRequest, Dimensions, EstimateRequest, FragilityLevel, Location, Urgency,
	ValidationError,
};

/// Editable order parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
	pub category: Option<Category>,
	pub length: String,
	pub width: String,
	pub height: String,
	pub weight: String,
	pub fragility_level: FragilityLevel,
	pub urgency: Urgency,
	pub lat: f64,
	pub lng: f64,
	pub address: String,
}

impl OrderDraft {
	/// Empty draft with the pickup coordinates preset.
	pub fn new(lat: f64, lng: f64) -> Self {
		Self {
			category: None,
			length: String::new(),
			width: String::new(),
			height: String::new(),
			weight: String::new(),
			fragility_level: FragilityLevel::default(),
			urgency: Urgency::default(),
			lat,
			lng,
			address: String::new(),
		}
	}

	pub fn with_category(mut self, category: Category) -> Self {
		self.category = Some(category);
		self
	}

	pub fn with_dimensions(
		mut self,
		length: impl Into<String>,
		width: impl Into<String>,
		height: impl Into<String>,
		weight: impl Into<String>,
	) -> Self {
		self.length = length.into();
		self.width = width.into();
		self.height = height.into();
		self.weight = weight.into();
		self
	}

	pub fn with_address(mut self, address: impl Into<String>) -> Self {
		self.address = address.into();
		self
	}

	/// Checks the draft and returns its parsed form.
	///
	/// Only the shape of the input is checked here. Whether a dimension is
	/// positive or plausible is decided by the server.
	pub fn validate(&self) -> Result<ValidatedDraft, ValidationError> {
		let category = self
			.category
			.ok_or(ValidationError::Missing { field: "category" })?;

		let item_dimensions = Dimensions {
			length: parse_number("length", &self.length)?,
			width: parse_number("width", &self.width)?,
			height: parse_number("height", &self.height)?,
			weight: parse_number("weight", &self.weight)?,
		};

		let address = self.address.trim();
		if address.is_empty() {
			return Err(ValidationError::Missing { field: "address" });
		}

		Ok(ValidatedDraft {
			category,
			item_dimensions,
			fragility_level: self.fragility_level,
			urgency: self.urgency,
			pickup_location: Location {
				lat: self.lat,
				lng: self.lng,
				address: address.to_string(),
			},
		})
	}
}

fn parse_number(field: &'static str, raw: &str) -> Result<f64, ValidationError> {
	let raw = raw.trim();
	if raw.is_empty() {
		return Err(ValidationError::Missing { field });
	}
	match raw.parse::<f64>() {
		Ok(value) if value.is_finite() => Ok(value),
		_ => Err(ValidationError::NotANumber {
			field,
			value: raw.to_string(),
		}),
	}
}

/// A draft that passed validation, frozen while its estimate is reviewed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedDraft {
	pub category: Category,
	pub item_dimensions: Dimensions,
	pub fragility_level: FragilityLevel,
	pub urgency: Urgency,
	pub pickup_location: Location,
}

impl ValidatedDraft {
	pub fn estimate_request(&self, distance_km: f64) -> EstimateRequest {
		EstimateRequest {
			category: self.category,
			item_dimensions: self.item_dimensions,
			fragility_level: self.fragility_level,
			urgency: self.urgency,
			distance_km,
		}
	}

	/// Create-order body. The estimate is not part of it.
	pub fn create_request(&self) -> CreateOrderRequest {
		CreateOrderRequest {
			category: self.category,
			item_dimensions: self.item_dimensions,
			fragility_level: self.fragility_level,
			urgency: self.urgency,
			pickup_location: self.pickup_location.clone(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn draft() -> OrderDraft {
		OrderDraft::new(19.0760, 72.8777)
			.with_category(Category::Gift)
			.with_dimensions("10", "10", "10", "1")
			.with_address("14 Hill Road, Bandra West")
	}

	#[test]
	fn test_valid_draft() {
		let validated = draft().validate().unwrap();
		assert_eq!(validated.item_dimensions.length, 10.0);
		assert_eq!(validated.fragility_level, FragilityLevel::Low);
		assert_eq!(validated.urgency, Urgency::Normal);
		assert_eq!(validated.pickup_location.lat, 19.0760);

		let request = validated.estimate_request(5.0);
		assert_eq!(request.distance_km, 5.0);
		assert_eq!(
			validated.create_request().pickup_location.address,
			"14 Hill Road, Bandra West"
		);
	}

	#[test]
	fn test_missing_category() {
		let mut d = draft();
		d.category = None;
		assert_eq!(d.validate().unwrap_err().field(), "category");
	}

	#[test]
	fn test_dimension_errors_name_the_field() {
		let d = draft().with_dimensions("10", "", "10", "1");
		assert_eq!(
			d.validate().unwrap_err(),
			ValidationError::Missing { field: "width" }
		);

		let d = draft().with_dimensions("10", "10", "ten", "1");
		assert_eq!(
			d.validate().unwrap_err(),
			ValidationError::NotANumber {
				field: "height",
				value: "ten".into()
			}
		);

		let d = draft().with_dimensions("10", "10", "10", "inf");
		assert_eq!(d.validate().unwrap_err().field(), "weight");
	}

	#[test]
	fn test_sign_left_to_server() {
		let d = draft().with_dimensions("-5", "0", "10", "1");
		let validated = d.validate().unwrap();
		assert_eq!(validated.item_dimensions.length, -5.0);
	}

	#[test]
	fn test_blank_address() {
		let d = draft().with_address("   ");
		assert_eq!(
			d.validate().unwrap_err(),
			ValidationError::Missing { field: "address" }
		);
	}
}
