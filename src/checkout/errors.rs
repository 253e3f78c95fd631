//! Checkout Errors

use std::fmt::{Display, Formatter, Result as FmtResult};

use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    basket::CartError,
    catalog::CatalogError,
    checkout::{CheckoutStep, DeliveryMode},
    options::{SelectionError, validation::OptionValidationError},
    orders::{PayloadError, SubmissionError},
    pricing::PricingError,
};

/// One field-level problem shown inline next to its input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The cart has no lines.
    #[error("the cart is empty")]
    EmptyCart,

    /// Blank customer name.
    #[error("name is required")]
    MissingName,

    /// Phone with too few digits.
    #[error("phone must have at least 10 digits, got {digits}")]
    InvalidPhone {
        /// Digits found in the input
        digits: usize,
    },

    /// Delivering without an address.
    #[error("address is required for delivery")]
    MissingAddress,

    /// No delivery mode chosen.
    #[error("choose pickup or delivery")]
    MissingDeliveryMode,

    /// The business does not offer this mode.
    #[error("{0:?} is not offered by this business")]
    DeliveryModeUnavailable(DeliveryMode),

    /// No payment method chosen.
    #[error("choose a payment method")]
    MissingPaymentMethod,

    /// Change-for text is not a positive amount.
    #[error("invalid change amount: {0}")]
    InvalidChangeFor(String),

    /// Summary confirmed without agreeing to the terms.
    #[error("the terms must be accepted")]
    TermsNotAccepted,

    /// Product customization does not satisfy a group.
    #[error(transparent)]
    Options(#[from] OptionValidationError),
}

impl ValidationError {
    /// Name of the input the message belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::EmptyCart => "items",
            ValidationError::MissingName => "name",
            ValidationError::InvalidPhone { .. } => "phone",
            ValidationError::MissingAddress => "address",
            ValidationError::MissingDeliveryMode | ValidationError::DeliveryModeUnavailable(_) => {
                "delivery_type"
            }
            ValidationError::MissingPaymentMethod => "payment_method",
            ValidationError::InvalidChangeFor(_) => "change_for",
            ValidationError::TermsNotAccepted => "terms",
            ValidationError::Options(_) => "options",
        }
    }
}

/// Every failing field of one form, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(SmallVec<[ValidationError; 4]>);

impl ValidationErrors {
    /// `Ok` when nothing failed.
    ///
    /// # Errors
    ///
    /// Returns the collected errors when there is at least one.
    pub fn from_vec(errors: SmallVec<[ValidationError; 4]>) -> Result<(), Self> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Self(errors))
        }
    }

    /// The errors as a slice.
    pub fn as_slice(&self) -> &[ValidationError] {
        &self.0
    }

    /// Number of errors.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no errors.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `error` is among the errors.
    pub fn contains(&self, error: &ValidationError) -> bool {
        self.0.contains(error)
    }

    /// Errors belonging to one input.
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a ValidationError> {
        self.0.iter().filter(move |error| error.field() == field)
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        let mut errors = SmallVec::new();

        errors.push(error);

        Self(errors)
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = smallvec::IntoIter<[ValidationError; 4]>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for (index, error) in self.0.iter().enumerate() {
            if index > 0 {
                write!(f, "; ")?;
            }

            write!(f, "{error}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Errors returned by checkout flow transitions.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Catalog lookup failed; see [`FlowError::is_not_found`].
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The action does not belong to the current step.
    #[error("{action} is not available on the {step:?} step")]
    WrongStep {
        /// Attempted action
        action: &'static str,
        /// Step the flow is on
        step: CheckoutStep,
    },

    /// The current step's form is incomplete.
    #[error("{0}")]
    Validation(ValidationErrors),

    /// A submission is already in flight.
    #[error("an order submission is already in progress")]
    SubmissionInProgress,

    /// Submission was attempted without a started submission.
    #[error("no order submission is in progress")]
    NoSubmission,

    /// The order service refused or could not be reached.
    #[error(transparent)]
    Submission(#[from] SubmissionError),

    /// Cart totals could not be computed.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// The customized product cannot become a cart line.
    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// The cart refused the line.
    #[error(transparent)]
    Cart(#[from] CartError),
}

impl FlowError {
    /// Whether the tenant or product does not resolve and a not-found page applies.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FlowError::Catalog(error) if error.is_not_found())
    }
}

impl From<PayloadError> for FlowError {
    fn from(error: PayloadError) -> Self {
        match error {
            PayloadError::Incomplete(errors) => FlowError::Validation(errors),
            PayloadError::Pricing(error) => FlowError::Pricing(error),
        }
    }
}

impl From<ValidationErrors> for FlowError {
    fn from(errors: ValidationErrors) -> Self {
        FlowError::Validation(errors)
    }
}

impl From<ValidationError> for FlowError {
    fn from(error: ValidationError) -> Self {
        FlowError::Validation(error.into())
    }
}
