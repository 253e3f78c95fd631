//! Delivery & Customer Details

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::checkout::errors::{ValidationError, ValidationErrors};

/// Fewest digits a phone number may have (area code + number).
pub const MIN_PHONE_DIGITS: usize = 10;

/// How the customer receives the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Customer collects at the business.
    Pickup,

    /// Business delivers to the customer's address.
    Delivery,
}

/// Contact and address details typed by the customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    /// Customer name
    pub name: String,

    /// Phone as typed; may contain formatting
    pub phone: String,

    /// Street address, required for delivery
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// Apartment, block, reference point
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_complement: Option<String>,

    /// Order notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl CustomerInfo {
    /// Creates customer details with a name and phone only.
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            ..Self::default()
        }
    }

    /// Sets the address.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Phone digits only.
    pub fn phone_digits(&self) -> String {
        normalize_phone(&self.phone)
    }
}

/// Delivery step state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverySelection {
    /// Chosen mode
    pub mode: Option<DeliveryMode>,

    /// Saved customer details
    pub customer: Option<CustomerInfo>,
}

impl DeliverySelection {
    /// Checks the selection as the delivery step's continue action would.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors: SmallVec<[ValidationError; 4]> = SmallVec::new();

        if self.mode.is_none() {
            errors.push(ValidationError::MissingDeliveryMode);
        }

        match &self.customer {
            Some(customer) => {
                if let Err(customer_errors) = validate_customer(customer, self.mode) {
                    errors.extend(customer_errors);
                }
            }
            None => {
                errors.push(ValidationError::MissingName);
                errors.push(ValidationError::InvalidPhone { digits: 0 });
            }
        }

        ValidationErrors::from_vec(errors)
    }

    /// Whether the payment step may be entered.
    pub fn is_complete(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Strips every non-digit character.
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}

/// Formats a phone for display: `(11) 98888-7777` for eleven digits, the bare digits
/// for shorter input, and the input untouched when it is too long to be a phone.
pub fn format_phone(phone: &str) -> String {
    let digits = normalize_phone(phone);

    if digits.len() > 11 {
        return phone.to_string();
    }

    match (digits.get(0..2), digits.get(2..7), digits.get(7..11)) {
        (Some(area), Some(prefix), Some(line)) if digits.len() == 11 => {
            format!("({area}) {prefix}-{line}")
        }
        _ => digits,
    }
}

/// Checks customer details for the given delivery mode.
///
/// # Errors
///
/// Returns every failing field: blank name, fewer than [`MIN_PHONE_DIGITS`] digits,
/// and a blank address when delivering.
pub fn validate_customer(
    customer: &CustomerInfo,
    mode: Option<DeliveryMode>,
) -> Result<(), ValidationErrors> {
    let mut errors: SmallVec<[ValidationError; 4]> = SmallVec::new();

    if customer.name.trim().is_empty() {
        errors.push(ValidationError::MissingName);
    }

    let digits = normalize_phone(&customer.phone).len();

    if digits < MIN_PHONE_DIGITS {
        errors.push(ValidationError::InvalidPhone { digits });
    }

    let has_address = customer
        .address
        .as_deref()
        .is_some_and(|address| !address.trim().is_empty());

    if mode == Some(DeliveryMode::Delivery) && !has_address {
        errors.push(ValidationError::MissingAddress);
    }

    ValidationErrors::from_vec(errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_phone_strips_formatting() {
        let digits = normalize_phone("(11) 98888-7777");

        assert_eq!(digits, "11988887777");
        assert_eq!(digits.len(), 11);
    }

    #[test]
    fn format_phone_formats_mobile_numbers() {
        assert_eq!(format_phone("11988887777"), "(11) 98888-7777");
        assert_eq!(format_phone("(11) 98888-7777"), "(11) 98888-7777");
    }

    #[test]
    fn format_phone_keeps_partial_input_as_digits() {
        assert_eq!(format_phone("11 98"), "1198");
    }

    #[test]
    fn format_phone_leaves_overlong_input() {
        assert_eq!(format_phone("+55 11 98888-7777"), "+55 11 98888-7777");
    }

    #[test]
    fn valid_customer_for_pickup() {
        let customer = CustomerInfo::new("Maria", "(11) 98888-7777");

        assert!(validate_customer(&customer, Some(DeliveryMode::Pickup)).is_ok());
    }

    #[test]
    fn short_phone_is_invalid() {
        let customer = CustomerInfo::new("Maria", "123");

        let errors = validate_customer(&customer, Some(DeliveryMode::Pickup))
            .err()
            .unwrap_or_default();

        assert_eq!(errors.as_slice(), &[ValidationError::InvalidPhone { digits: 3 }]);
    }

    #[test]
    fn delivery_requires_address() {
        let customer = CustomerInfo::new("Maria", "11988887777").with_address("   ");

        let errors = validate_customer(&customer, Some(DeliveryMode::Delivery))
            .err()
            .unwrap_or_default();

        assert_eq!(errors.as_slice(), &[ValidationError::MissingAddress]);
    }

    #[test]
    fn every_failing_field_is_reported() {
        let customer = CustomerInfo::new(" ", "");

        let errors = validate_customer(&customer, Some(DeliveryMode::Delivery))
            .err()
            .unwrap_or_default();

        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::MissingName));
        assert!(errors.contains(&ValidationError::MissingAddress));
    }

    #[test]
    fn selection_without_mode_is_incomplete() {
        let selection = DeliverySelection {
            mode: None,
            customer: Some(CustomerInfo::new("Maria", "11988887777")),
        };

        assert!(!selection.is_complete());
    }

    #[test]
    fn selection_without_customer_is_incomplete() {
        let selection = DeliverySelection {
            mode: Some(DeliveryMode::Pickup),
            customer: None,
        };

        assert!(!selection.is_complete());
    }
}
