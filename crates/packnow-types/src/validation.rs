//! Client-side validation of user input.
//!
//! These checks run before any request is issued. A failure names the
//! offending field so it can be reported next to that field, and blocks the
//! request entirely.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// A client-detected problem with a single input field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
	/// Required field left empty.
	#[error("{field} is required")]
	Missing { field: &'static str },
	/// Field that must hold a number does not parse as one.
	#[error("{field} must be a number, got '{value}'")]
	NotANumber { field: &'static str, value: String },
	/// Field present but rejected by a format rule.
	#[error("{message}")]
	Invalid {
		field: &'static str,
		message: String,
	},
}

impl ValidationError {
	/// Name of the offending field.
	pub fn field(&self) -> &'static str {
		match self {
			ValidationError::Missing { field }
			| ValidationError::NotANumber { field, .. }
			| ValidationError::Invalid { field, .. } => field,
		}
	}

	fn invalid(field: &'static str, message: &str) -> Self {
		ValidationError::Invalid {
			field,
			message: message.to_string(),
		}
	}
}

static PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+\d{10,15}$").expect("valid regex"));
static EMAIL: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));
static NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z\s]+$").expect("valid regex"));

const SPECIAL_CHARACTERS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Validates a phone number in international format.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
	if !PHONE.is_match(phone) {
		return Err(ValidationError::invalid(
			"phone",
			"Please enter a valid phone number in international format (e.g., +919876543210)",
		));
	}
	Ok(())
}

/// Validates an optional email address. Empty input is accepted.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
	if email.is_empty() {
		return Ok(());
	}
	if !EMAIL.is_match(email) {
		return Err(ValidationError::invalid(
			"email",
			"Please enter a valid email address",
		));
	}
	Ok(())
}

/// Validates a password, reporting the first unmet requirement.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
	let checks = PasswordChecks::evaluate(password);
	let message = if !checks.length {
		"Password must be at least 8 characters long"
	} else if !checks.uppercase {
		"Password must contain at least one uppercase letter"
	} else if !checks.lowercase {
		"Password must contain at least one lowercase letter"
	} else if !checks.digit {
		"Password must contain at least one number"
	} else if !checks.special {
		"Password must contain at least one special character"
	} else {
		return Ok(());
	};
	Err(ValidationError::invalid("password", message))
}

/// Validates a display name.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
	if name.chars().count() < 2 {
		return Err(ValidationError::invalid(
			"name",
			"Name must be at least 2 characters long",
		));
	}
	if !NAME.is_match(name) {
		return Err(ValidationError::invalid(
			"name",
			"Name can only contain letters and spaces",
		));
	}
	Ok(())
}

/// Individual password requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordChecks {
	pub length: bool,
	pub uppercase: bool,
	pub lowercase: bool,
	pub digit: bool,
	pub special: bool,
}

impl PasswordChecks {
	pub fn evaluate(password: &str) -> Self {
		Self {
			length: password.chars().count() >= 8,
			uppercase: password.chars().any(|c| c.is_ascii_uppercase()),
			lowercase: password.chars().any(|c| c.is_ascii_lowercase()),
			digit: password.chars().any(|c| c.is_ascii_digit()),
			special: password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)),
		}
	}

	/// Number of satisfied requirements, 0 to 5.
	pub fn passed(&self) -> u8 {
		[
			self.length,
			self.uppercase,
			self.lowercase,
			self.digit,
			self.special,
		]
		.iter()
		.filter(|&&ok| ok)
		.count() as u8
	}

	/// Each requirement as shown on a checklist, with whether it is met.
	pub fn requirements(&self) -> [(&'static str, bool); 5] {
		[
			("At least 8 characters", self.length),
			("One uppercase letter", self.uppercase),
			("One lowercase letter", self.lowercase),
			("One number", self.digit),
			("One special character (!@#$%^&*...)", self.special),
		]
	}
}

/// Coarse password strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordStrength {
	Weak,
	Medium,
	Strong,
}

impl PasswordStrength {
	pub fn label(&self) -> &'static str {
		match self {
			PasswordStrength::Weak => "Weak",
			PasswordStrength::Medium => "Medium",
			PasswordStrength::Strong => "Strong",
		}
	}
}

/// Strength report for a candidate password.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrengthReport {
	pub checks: PasswordChecks,
	pub score: u8,
	pub strength: PasswordStrength,
}

impl StrengthReport {
	/// A password is acceptable only when every requirement is met.
	pub fn is_valid(&self) -> bool {
		self.score == 5
	}
}

/// Scores a password against all five requirements.
pub fn password_strength(password: &str) -> StrengthReport {
	let checks = PasswordChecks::evaluate(password);
	let score = checks.passed();
	let strength = match score {
		5 => PasswordStrength::Strong,
		3 | 4 => PasswordStrength::Medium,
		_ => PasswordStrength::Weak,
	};
	StrengthReport {
		checks,
		score,
		strength,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_phone() {
		assert!(validate_phone("+919876543210").is_ok());
		assert!(validate_phone("9876543210").is_err());
		assert!(validate_phone("+91 98765 43210").is_err());
		assert!(validate_phone("+123").is_err());
		assert_eq!(validate_phone("abc").unwrap_err().field(), "phone");
	}

	#[test]
	fn test_email() {
		assert!(validate_email("").is_ok());
		assert!(validate_email("asha@example.in").is_ok());
		assert!(validate_email("asha@example").is_err());
		assert!(validate_email("asha example@x.in").is_err());
	}

	#[test]
	fn test_password_messages() {
		let message = |p: &str| validate_password(p).unwrap_err().to_string();
		assert_eq!(message("Ab1!"), "Password must be at least 8 characters long");
		assert_eq!(
			message("abcdefg1!"),
			"Password must contain at least one uppercase letter"
		);
		assert_eq!(
			message("ABCDEFG1!"),
			"Password must contain at least one lowercase letter"
		);
		assert_eq!(message("Abcdefgh!"), "Password must contain at least one number");
		assert_eq!(
			message("Abcdefgh1"),
			"Password must contain at least one special character"
		);
		assert!(validate_password("Abcdefg1!").is_ok());
	}

	#[test]
	fn test_name() {
		assert!(validate_name("Asha Rao").is_ok());
		assert!(validate_name("A").is_err());
		assert_eq!(
			validate_name("R2D2").unwrap_err().to_string(),
			"Name can only contain letters and spaces"
		);
	}

	#[test]
	fn test_password_strength() {
		let weak = password_strength("abc");
		assert_eq!(weak.strength, PasswordStrength::Weak);
		assert_eq!(weak.score, 1);

		let medium = password_strength("abcdefgh1");
		assert_eq!(medium.score, 3);
		assert_eq!(medium.strength, PasswordStrength::Medium);
		assert!(!medium.is_valid());

		let unmet: Vec<&str> = medium
			.checks
			.requirements()
			.iter()
			.filter(|(_, met)| !met)
			.map(|(label, _)| *label)
			.collect();
		assert_eq!(unmet, vec!["One uppercase letter", "One special character (!@#$%^&*...)"]);

		let strong = password_strength("Abcdefg1!");
		assert_eq!(strong.strength.label(), "Strong");
		assert!(strong.is_valid());
	}
}
