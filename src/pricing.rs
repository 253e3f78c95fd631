//! Pricing

use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

use crate::{
    basket::CartLineItem,
    catalog::Business,
    checkout::DeliveryMode,
    options::SelectedOption,
    prices::{Price, zero},
    products::CatalogItem,
};

/// Errors that can occur while pricing items or carts.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// Quantities start at one.
    #[error("quantity must be at least 1, got {0}")]
    InvalidQuantity(i64),

    /// The amount does not fit in minor units.
    #[error("price overflow")]
    Overflow,

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Sum of every chosen value's price modifier across all groups.
///
/// # Errors
///
/// Returns [`PricingError::Money`] if a modifier is in another currency.
pub fn options_total(
    selected: &[SelectedOption],
    currency: &'static Currency,
) -> Result<Price, PricingError> {
    selected
        .iter()
        .flat_map(|option| option.values.iter())
        .try_fold(zero(currency), |acc, value| {
            acc.add(value.price_modifier).map_err(PricingError::from)
        })
}

/// Base price plus the modifiers of every selected value.
///
/// # Errors
///
/// Returns [`PricingError::Money`] if a modifier is in another currency.
pub fn unit_price(item: &CatalogItem, selected: &[SelectedOption]) -> Result<Price, PricingError> {
    let modifiers = options_total(selected, item.price.currency())?;

    Ok(item.price.add(modifiers)?)
}

/// `quantity * unit_price`.
///
/// # Errors
///
/// - [`PricingError::InvalidQuantity`]: quantity is below one.
/// - [`PricingError::Overflow`]: the product does not fit in minor units.
pub fn line_total(quantity: i64, unit_price: Price) -> Result<Price, PricingError> {
    if quantity < 1 {
        return Err(PricingError::InvalidQuantity(quantity));
    }

    let minor_units = unit_price
        .to_minor_units()
        .checked_mul(quantity)
        .ok_or(PricingError::Overflow)?;

    Ok(Money::from_minor(minor_units, unit_price.currency()))
}

/// Sum of the cached totals of every line; zero for an empty cart.
///
/// # Errors
///
/// Returns [`PricingError::Money`] if a line is in another currency.
pub fn cart_subtotal(
    items: &[CartLineItem],
    currency: &'static Currency,
) -> Result<Price, PricingError> {
    items.iter().try_fold(zero(currency), |acc, item| {
        acc.add(*item.total_price()).map_err(PricingError::from)
    })
}

/// The business delivery fee when delivering, nothing for pickup.
pub fn delivery_fee(business: &Business, mode: Option<DeliveryMode>) -> Price {
    match mode {
        Some(DeliveryMode::Delivery) => business.delivery_fee,
        Some(DeliveryMode::Pickup) | None => zero(business.delivery_fee.currency()),
    }
}

/// `subtotal + delivery_fee`.
///
/// # Errors
///
/// Returns [`PricingError::Money`] on currency mismatch.
pub fn order_total(subtotal: Price, delivery_fee: Price) -> Result<Price, PricingError> {
    Ok(subtotal.add(delivery_fee)?)
}
