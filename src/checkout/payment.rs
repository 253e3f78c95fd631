//! Payment

use rusty_money::iso::Currency;
use serde::{Deserialize, Serialize};

use crate::{
    checkout::errors::ValidationError,
    ids::TypedId,
    prices::{Price, parse_amount, serde_money},
};

/// Payment method identifier
pub type PaymentMethodId = TypedId<PaymentMethod>;

/// How a payment method settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    /// Cash on delivery/pickup; may need change.
    Cash,

    /// Instant bank transfer.
    Pix,

    /// Credit card machine.
    CreditCard,

    /// Debit card machine.
    DebitCard,

    /// Anything else the business accepts.
    Other,
}

/// A payment method offered by a business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    /// Identifier
    pub id: PaymentMethodId,

    /// Display name
    pub name: String,

    /// Settlement kind
    #[serde(rename = "type")]
    pub kind: PaymentKind,

    /// Extra instructions shown under the name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    /// Inactive methods are hidden
    #[serde(default = "active")]
    pub is_active: bool,
}

fn active() -> bool {
    true
}

impl PaymentMethod {
    /// Creates an active method without instructions.
    pub fn new(id: impl Into<PaymentMethodId>, name: impl Into<String>, kind: PaymentKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            instructions: None,
            is_active: true,
        }
    }

    /// Whether the customer may ask for change.
    pub fn is_cash(&self) -> bool {
        self.kind == PaymentKind::Cash
    }
}

/// Methods offered when a business has none configured.
pub fn default_payment_methods() -> Vec<PaymentMethod> {
    vec![
        PaymentMethod::new("cash", "Dinheiro", PaymentKind::Cash),
        PaymentMethod::new("pix", "PIX", PaymentKind::Pix),
        PaymentMethod::new("credit", "Cartão de Crédito", PaymentKind::CreditCard),
        PaymentMethod::new("debit", "Cartão de Débito", PaymentKind::DebitCard),
    ]
}

/// Payment step state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentSelection {
    /// Chosen method snapshot
    pub method: Option<PaymentMethod>,

    /// Cash amount the customer pays with; only kept for cash
    #[serde(default, with = "serde_money::option")]
    pub change_for: Option<Price>,
}

impl PaymentSelection {
    /// Whether the summary step may be entered.
    pub fn is_complete(&self) -> bool {
        self.method.is_some()
    }

    /// Checks the selection as the payment step's continue action would.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingPaymentMethod`] when nothing is chosen.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_complete() {
            Ok(())
        } else {
            Err(ValidationError::MissingPaymentMethod)
        }
    }
}

/// Reads the "change for how much?" input. Blank means no change is needed.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidChangeFor`] for text that is not a positive amount.
pub fn parse_change_for(
    text: &str,
    currency: &'static Currency,
) -> Result<Option<Price>, ValidationError> {
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return Ok(None);
    }

    let amount = parse_amount(trimmed, currency)
        .map_err(|_err| ValidationError::InvalidChangeFor(trimmed.to_string()))?;

    if amount.is_positive() {
        Ok(Some(amount))
    } else {
        Err(ValidationError::InvalidChangeFor(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::BRL};
    use testresult::TestResult;

    use super::*;

    #[test]
    fn defaults_cover_the_four_usual_methods() {
        let methods = default_payment_methods();

        let names: Vec<&str> = methods.iter().map(|method| method.name.as_str()).collect();

        assert_eq!(
            names,
            ["Dinheiro", "PIX", "Cartão de Crédito", "Cartão de Débito"]
        );
        assert!(methods.iter().all(|method| method.is_active));
        assert_eq!(methods.iter().filter(|method| method.is_cash()).count(), 1);
    }

    #[test]
    fn kind_serializes_as_type() -> TestResult {
        let json = serde_json::to_value(PaymentMethod::new(
            "credit",
            "Cartão de Crédito",
            PaymentKind::CreditCard,
        ))?;

        assert_eq!(json["type"], "credit_card");

        Ok(())
    }

    #[test]
    fn blank_change_for_means_none() -> TestResult {
        assert_eq!(parse_change_for("  ", BRL)?, None);

        Ok(())
    }

    #[test]
    fn change_for_accepts_comma_decimals() -> TestResult {
        assert_eq!(
            parse_change_for("100,50", BRL)?,
            Some(Money::from_minor(10050, BRL))
        );

        Ok(())
    }

    #[test]
    fn change_for_rejects_garbage_and_zero() {
        assert_eq!(
            parse_change_for("cem", BRL),
            Err(ValidationError::InvalidChangeFor("cem".to_string()))
        );
        assert!(parse_change_for("0", BRL).is_err());
    }

    #[test]
    fn selection_without_method_is_incomplete() {
        let selection = PaymentSelection::default();

        assert_eq!(
            selection.validate(),
            Err(ValidationError::MissingPaymentMethod)
        );
    }
}
