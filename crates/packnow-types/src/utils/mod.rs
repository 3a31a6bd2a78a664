//! Display helpers shared by the client crates.

pub mod formatting;

pub use formatting::{
	format_currency, format_date, format_distance, format_material_name, format_quantity,
};
