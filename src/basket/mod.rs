//! Cart Session

use rusty_money::iso::Currency;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{
    checkout::{CustomerInfo, DeliveryMode, DeliverySelection, PaymentMethod, PaymentSelection},
    prices::{DEFAULT_CURRENCY, Price, serde_currency},
    pricing::{PricingError, cart_subtotal},
};

pub mod line_item;

pub use line_item::{CartLineItem, LineItemId};

/// Errors related to cart mutations.
#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    /// A line's currency differs from the cart currency (line id, line currency, cart currency).
    #[error("Line {0} has currency {1}, but cart has currency {2}")]
    CurrencyMismatch(String, &'static str, &'static str),

    /// A line's quantity or cached total does not match its own snapshot.
    #[error("Line {0} has an inconsistent quantity or total")]
    InconsistentLine(String),

    /// Wrapped pricing error.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// The customer's in-progress order: cart lines plus checkout choices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartSession {
    #[serde(with = "serde_currency")]
    currency: &'static Currency,
    items: Vec<CartLineItem>,
    #[serde(default)]
    delivery: DeliverySelection,
    #[serde(default)]
    payment: PaymentSelection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    business_slug: Option<String>,
}

impl Default for CartSession {
    fn default() -> Self {
        Self::new(DEFAULT_CURRENCY)
    }
}

impl CartSession {
    /// Create an empty session in the given currency.
    #[must_use]
    pub fn new(currency: &'static Currency) -> Self {
        CartSession {
            currency,
            items: Vec::new(),
            delivery: DeliverySelection::default(),
            payment: PaymentSelection::default(),
            business_slug: None,
        }
    }

    /// Cart currency
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Lines in insertion order
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Look up a line.
    pub fn item(&self, id: &LineItemId) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Delivery choices
    pub fn delivery(&self) -> &DeliverySelection {
        &self.delivery
    }

    /// Payment choices
    pub fn payment(&self) -> &PaymentSelection {
        &self.payment
    }

    /// Tenant the cart was built for
    pub fn business_slug(&self) -> Option<&str> {
        self.business_slug.as_deref()
    }

    /// Adds a line, merging it into an existing line with the same product and an
    /// identical options snapshot.
    ///
    /// Returns the id of the line that now holds the quantity.
    ///
    /// # Errors
    ///
    /// - [`CartError::CurrencyMismatch`]: the line is priced in another currency.
    /// - [`CartError::Pricing`]: the merged quantity overflows.
    pub fn add_item(&mut self, mut line: CartLineItem) -> Result<LineItemId, CartError> {
        let line_currency = line.total_price().currency();

        if line_currency != self.currency {
            return Err(CartError::CurrencyMismatch(
                line.id().to_string(),
                line_currency.iso_alpha_code,
                self.currency.iso_alpha_code,
            ));
        }

        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|existing| existing.same_customization(&line))
        {
            let quantity = existing
                .quantity()
                .checked_add(line.quantity())
                .ok_or(PricingError::Overflow)?;

            existing.set_quantity(quantity)?;

            debug!(line = %existing.id(), quantity, "merged cart line");

            return Ok(existing.id().clone());
        }

        let id = self.unused_id(line.id());

        line.set_id(id.clone());

        debug!(line = %id, product = %line.catalog_item().id, "added cart line");

        self.items.push(line);

        Ok(id)
    }

    /// `base`, or `base-2`, `base-3`, ... if taken.
    fn unused_id(&self, base: &LineItemId) -> LineItemId {
        let taken = |candidate: &LineItemId| self.items.iter().any(|item| item.id() == candidate);

        if !taken(base) {
            return base.clone();
        }

        (2_u32..)
            .map(|suffix| LineItemId::new(format!("{base}-{suffix}")))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| base.clone())
    }

    /// Removes a line. Returns whether anything was removed.
    pub fn remove_item(&mut self, id: &LineItemId) -> bool {
        let before = self.items.len();

        self.items.retain(|item| item.id() != id);

        before != self.items.len()
    }

    /// Sets a line's quantity; zero or below removes the line. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Pricing`] if the quantity is too large.
    pub fn update_quantity(&mut self, id: &LineItemId, quantity: i64) -> Result<(), CartError> {
        if quantity <= 0 {
            self.remove_item(id);

            return Ok(());
        }

        let quantity = u32::try_from(quantity).map_err(|_err| PricingError::Overflow)?;

        if let Some(line) = self.items.iter_mut().find(|item| item.id() == id) {
            line.set_quantity(quantity)?;
        }

        Ok(())
    }

    /// Empties the cart and forgets delivery and payment choices. The tenant is kept.
    pub fn clear_cart(&mut self) {
        self.items.clear();
        self.delivery = DeliverySelection::default();
        self.payment = PaymentSelection::default();
    }

    /// Chooses pickup or delivery.
    pub fn set_delivery_type(&mut self, mode: DeliveryMode) {
        self.delivery.mode = Some(mode);
    }

    /// Saves the customer's details.
    pub fn set_customer_info(&mut self, customer: CustomerInfo) {
        self.delivery.customer = Some(customer);
    }

    /// Chooses a payment method.
    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.payment.method = Some(method);
    }

    /// Sets the cash change amount.
    pub fn set_payment_change_for(&mut self, change_for: Option<Price>) {
        self.payment.change_for = change_for;
    }

    /// Records which tenant the cart belongs to.
    pub fn set_business_slug(&mut self, slug: impl Into<String>) {
        self.business_slug = Some(slug.into());
    }

    /// Checks every line against the session currency and its own price snapshot.
    ///
    /// # Errors
    ///
    /// - [`CartError::CurrencyMismatch`]: a line is priced in another currency.
    /// - [`CartError::InconsistentLine`]: a quantity is zero or a cached total is stale.
    pub fn check(&self) -> Result<(), CartError> {
        for line in &self.items {
            let line_currency = line.total_price().currency();

            if line_currency != self.currency {
                return Err(CartError::CurrencyMismatch(
                    line.id().to_string(),
                    line_currency.iso_alpha_code,
                    self.currency.iso_alpha_code,
                ));
            }

            if !line.is_consistent() {
                return Err(CartError::InconsistentLine(line.id().to_string()));
            }
        }

        Ok(())
    }

    /// Sum of every line total.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if there was a money arithmetic error.
    pub fn subtotal(&self) -> Result<Price, PricingError> {
        cart_subtotal(&self.items, self.currency)
    }

    /// Sum of line quantities.
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity())).sum()
    }

    /// Whether the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
