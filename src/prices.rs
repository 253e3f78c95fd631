//! Prices

use rust_decimal::{Decimal, prelude::ToPrimitive};
use rusty_money::{
    Money,
    iso::{BRL, Currency, EUR, GBP, USD},
};
use thiserror::Error;

/// Money amount in one of the supported ISO currencies.
pub type Price = Money<'static, Currency>;

/// Currency used when nothing else is configured.
pub static DEFAULT_CURRENCY: &Currency = BRL;

/// Errors parsing textual prices.
#[derive(Debug, Error, PartialEq)]
pub enum PriceError {
    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),
}

/// Looks up a supported currency by its ISO alpha code.
///
/// # Errors
///
/// Returns [`PriceError::UnknownCurrency`] for codes outside the supported set.
pub fn currency_from_code(code: &str) -> Result<&'static Currency, PriceError> {
    match code {
        "BRL" => Ok(BRL),
        "GBP" => Ok(GBP),
        "USD" => Ok(USD),
        "EUR" => Ok(EUR),
        other => Err(PriceError::UnknownCurrency(other.to_string())),
    }
}

/// Parse price string (e.g., "20.00 BRL") into a [`Price`].
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY", if the
/// amount is not a decimal number, or if the currency code is not recognized.
pub fn parse_price(s: &str) -> Result<Price, PriceError> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    let [amount, code] = parts.as_slice() else {
        return Err(PriceError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let currency = currency_from_code(code)?;

    parse_amount(amount, currency)
}

/// Parse a bare amount typed by a customer (e.g. "50", "50.5" or "50,50").
///
/// # Errors
///
/// Returns [`PriceError::InvalidPrice`] if the text is not a decimal number.
pub fn parse_amount(s: &str, currency: &'static Currency) -> Result<Price, PriceError> {
    let normalized = s.trim().replace(',', ".");

    let amount = normalized
        .parse::<Decimal>()
        .map_err(|_err| PriceError::InvalidPrice(s.to_string()))?;

    let minor_units = amount
        .checked_mul(Decimal::new(100, 0))
        .and_then(|value| value.round_dp(0).to_i64())
        .ok_or_else(|| PriceError::InvalidPrice(s.to_string()))?;

    Ok(Money::from_minor(minor_units, currency))
}

/// Format a price as "AMOUNT CURRENCY" (e.g., "46.00 BRL").
pub fn format_price(price: &Price) -> String {
    format!(
        "{} {}",
        Decimal::new(price.to_minor_units(), 2),
        price.currency().iso_alpha_code
    )
}

/// Zero in the given currency.
pub fn zero(currency: &'static Currency) -> Price {
    Money::from_minor(0, currency)
}

/// Serde helpers storing a [`Price`] as its "AMOUNT CURRENCY" string.
pub mod serde_money {
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    use super::{Price, format_price, parse_price};

    /// Serialize a price.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(price: &Price, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_price(price))
    }

    /// Deserialize a price.
    ///
    /// # Errors
    ///
    /// Fails when the stored text is not a valid price.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Price, D::Error> {
        let text = String::deserialize(deserializer)?;

        parse_price(&text).map_err(D::Error::custom)
    }

    /// Same as the parent module for `Option<Price>` fields.
    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

        use crate::prices::{Price, format_price, parse_price};

        /// Serialize an optional price.
        ///
        /// # Errors
        ///
        /// Propagates serializer errors.
        pub fn serialize<S: Serializer>(
            price: &Option<Price>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match price {
                Some(price) => serializer.serialize_some(&format_price(price)),
                None => serializer.serialize_none(),
            }
        }

        /// Deserialize an optional price.
        ///
        /// # Errors
        ///
        /// Fails when the stored text is not a valid price.
        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Price>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|text| parse_price(&text).map_err(D::Error::custom))
                .transpose()
        }
    }
}

/// Serde helpers storing a currency as its ISO alpha code.
pub mod serde_currency {
    use rusty_money::iso::Currency;
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    use super::currency_from_code;

    /// Serialize a currency.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(
        currency: &&'static Currency,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(currency.iso_alpha_code)
    }

    /// Deserialize a currency.
    ///
    /// # Errors
    ///
    /// Fails for unsupported codes.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<&'static Currency, D::Error> {
        let code = String::deserialize(deserializer)?;

        currency_from_code(&code).map_err(D::Error::custom)
    }
}
