//! Orders

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    basket::{CartLineItem, CartSession},
    catalog::Business,
    checkout::{
        CustomerInfo, DeliveryMode, PaymentMethodId, ValidationError, ValidationErrors,
        normalize_phone,
    },
    options::SelectedOption,
    prices::{Price, serde_money, zero},
    pricing::{PricingError, delivery_fee, order_total},
    products::ProductId,
};

/// Reasons a session cannot be turned into an order.
#[derive(Debug, Error, PartialEq)]
pub enum PayloadError {
    /// Checkout choices are missing.
    #[error("{0}")]
    Incomplete(ValidationErrors),

    /// Totals could not be computed.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Errors reported by the order backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmissionError {
    /// The backend answered with an error message.
    #[error("order rejected: {0}")]
    Rejected(String),

    /// The backend could not be reached.
    #[error("order service unavailable: {0}")]
    Transport(String),
}

/// One line of a submitted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    /// Catalog item
    pub menu_item_id: ProductId,

    /// Product name at the time of ordering
    pub name: String,

    /// Quantity
    pub quantity: u32,

    /// Base price, without option modifiers
    #[serde(with = "serde_money")]
    pub unit_price: Price,

    /// Chosen options
    pub options: Vec<SelectedOption>,

    /// Notes for the kitchen
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Line total including options
    #[serde(with = "serde_money")]
    pub total_price: Price,
}

impl From<&CartLineItem> for OrderLine {
    fn from(line: &CartLineItem) -> Self {
        Self {
            menu_item_id: line.catalog_item().id.clone(),
            name: line.catalog_item().name.clone(),
            quantity: line.quantity(),
            unit_price: line.catalog_item().price,
            options: line.selected_options().to_vec(),
            notes: line.notes().map(str::to_string),
            total_price: *line.total_price(),
        }
    }
}

/// The request sent to the order backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPayload {
    /// Tenant receiving the order
    pub business_slug: String,

    /// Who ordered
    pub customer: CustomerInfo,

    /// Pickup or delivery
    pub delivery_type: DeliveryMode,

    /// Ordered lines
    pub items: Vec<OrderLine>,

    /// Sum of line totals
    #[serde(with = "serde_money")]
    pub subtotal: Price,

    /// Delivery fee, zero for pickup
    #[serde(with = "serde_money")]
    pub delivery_fee: Price,

    /// Always zero; discounts are not supported
    #[serde(with = "serde_money")]
    pub discount: Price,

    /// `subtotal + delivery_fee`
    #[serde(with = "serde_money")]
    pub total: Price,

    /// Chosen payment method
    pub payment_method_id: PaymentMethodId,

    /// Chosen payment method name
    pub payment_method_name: String,

    /// Cash amount the customer pays with
    #[serde(
        default,
        with = "serde_money::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub payment_change_for: Option<Price>,
}

impl OrderPayload {
    /// Builds the order for a session. The same session always yields the same payload.
    ///
    /// # Errors
    ///
    /// - [`PayloadError::Incomplete`]: the cart is empty or a checkout choice is missing.
    /// - [`PayloadError::Pricing`]: totals overflow or mix currencies.
    pub fn build(session: &CartSession, business: &Business) -> Result<Self, PayloadError> {
        let mut missing: SmallVec<[ValidationError; 4]> = SmallVec::new();

        if session.is_empty() {
            missing.push(ValidationError::EmptyCart);
        }

        if session.delivery().mode.is_none() {
            missing.push(ValidationError::MissingDeliveryMode);
        }

        if session.delivery().customer.is_none() {
            missing.push(ValidationError::MissingName);
        }

        if session.payment().method.is_none() {
            missing.push(ValidationError::MissingPaymentMethod);
        }

        ValidationErrors::from_vec(missing).map_err(PayloadError::Incomplete)?;

        let (Some(delivery_type), Some(customer), Some(method)) = (
            session.delivery().mode,
            session.delivery().customer.clone(),
            session.payment().method.as_ref(),
        ) else {
            return Err(PayloadError::Incomplete(ValidationErrors::default()));
        };

        let subtotal = session.subtotal()?;
        let fee = delivery_fee(business, Some(delivery_type));
        let total = order_total(subtotal, fee)?;

        Ok(Self {
            business_slug: business.slug.clone(),
            customer,
            delivery_type,
            items: session.items().iter().map(OrderLine::from).collect(),
            subtotal,
            delivery_fee: fee,
            discount: zero(session.currency()),
            total,
            payment_method_id: method.id.clone(),
            payment_method_name: method.name.clone(),
            payment_change_for: session.payment().change_for.filter(|_| method.is_cash()),
        })
    }
}

/// What the backend returns for an accepted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedOrder {
    /// Human-facing order number
    pub order_number: String,
}

/// Order backend.
pub trait OrderSubmissionService {
    /// Sends an order.
    ///
    /// # Errors
    ///
    /// Returns a [`SubmissionError`] if the backend rejects the order or is unreachable.
    async fn submit(&self, order: &OrderPayload) -> Result<SubmittedOrder, SubmissionError>;
}

/// Shown on the success step.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderConfirmation {
    /// Order number from the backend
    pub order_number: String,

    /// Total charged
    pub total: Price,

    /// Business phone for follow-up
    pub business_phone: String,
}

impl OrderConfirmation {
    /// Message the customer sends to follow up on the order.
    pub fn follow_up_message(&self) -> String {
        format!(
            "Olá! Acabei de fazer o pedido #{}. Gostaria de mais informações.",
            self.order_number
        )
    }

    /// Messaging deep link to the business, or `None` without a business phone.
    pub fn follow_up_link(&self) -> Option<String> {
        let phone = normalize_phone(&self.business_phone);

        if phone.is_empty() {
            return None;
        }

        Some(format!(
            "https://wa.me/55{phone}?text={}",
            encode_uri_component(&self.follow_up_message())
        ))
    }
}

/// Percent-encodes everything but the URI component unreserved marks.
fn encode_uri_component(s: &str) -> String {
    let mut result = String::with_capacity(s.len() * 3);

    for c in s.chars() {
        match c {
            'a'..='z'
            | 'A'..='Z'
            | '0'..='9'
            | '-'
            | '_'
            | '.'
            | '!'
            | '~'
            | '*'
            | '\''
            | '('
            | ')' => result.push(c),
            _ => {
                let mut buf = [0; 4];

                for byte in c.encode_utf8(&mut buf).as_bytes() {
                    result.push_str(&format!("%{byte:02X}"));
                }
            }
        }
    }

    result
}
