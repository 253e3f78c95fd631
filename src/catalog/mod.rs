//! Catalog

use jiff::civil::{DateTime, Time, Weekday};
use rusty_money::iso::Currency;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    checkout::{DeliveryMode, PaymentMethod},
    prices::{Price, serde_money, zero},
    products::{CatalogItem, ProductId},
};

pub mod fixtures;

pub use fixtures::{FixtureCatalog, FixtureError};

/// Errors returned by catalog lookups.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No business with this slug.
    #[error("Business not found: {0}")]
    BusinessNotFound(String),

    /// No such product, or it is not currently sold.
    #[error("Product {product} not found for business {business}")]
    ProductNotFound {
        /// Business slug
        business: String,
        /// Requested product
        product: ProductId,
    },

    /// The backing store failed.
    #[error(transparent)]
    Fixture(#[from] FixtureError),
}

impl CatalogError {
    /// Whether the lookup failed because the tenant or product does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CatalogError::BusinessNotFound(_) | CatalogError::ProductNotFound { .. }
        )
    }
}

/// Opening hours for one weekday.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayHours {
    /// Opening time
    #[serde(default)]
    pub open: Option<Time>,

    /// Closing time; before `open` means the business closes after midnight
    #[serde(default)]
    pub close: Option<Time>,

    /// Whether the business opens at all on this day
    #[serde(default)]
    pub enabled: bool,
}

impl DayHours {
    /// Whether `time` falls inside the opening window.
    pub fn contains(&self, time: Time) -> bool {
        let (true, Some(open), Some(close)) = (self.enabled, self.open, self.close) else {
            return false;
        };

        if open <= close {
            open <= time && time < close
        } else {
            time >= open || time < close
        }
    }
}

/// Weekly opening hours.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessHours {
    /// Monday
    pub monday: DayHours,
    /// Tuesday
    pub tuesday: DayHours,
    /// Wednesday
    pub wednesday: DayHours,
    /// Thursday
    pub thursday: DayHours,
    /// Friday
    pub friday: DayHours,
    /// Saturday
    pub saturday: DayHours,
    /// Sunday
    pub sunday: DayHours,
}

impl BusinessHours {
    /// Hours for one weekday.
    pub fn day(&self, weekday: Weekday) -> &DayHours {
        match weekday {
            Weekday::Monday => &self.monday,
            Weekday::Tuesday => &self.tuesday,
            Weekday::Wednesday => &self.wednesday,
            Weekday::Thursday => &self.thursday,
            Weekday::Friday => &self.friday,
            Weekday::Saturday => &self.saturday,
            Weekday::Sunday => &self.sunday,
        }
    }

    /// Whether the business is open at a local date and time.
    pub fn is_open_at(&self, at: DateTime) -> bool {
        self.day(at.weekday()).contains(at.time())
    }
}

/// Tenant metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Business {
    /// URL slug identifying the tenant
    pub slug: String,

    /// Display name
    pub name: String,

    /// Contact phone, used for the follow-up message link
    #[serde(default)]
    pub phone: String,

    /// Street address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// Short description shown on the menu header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Whether the business delivers
    #[serde(default)]
    pub delivery_enabled: bool,

    /// Fee added to delivery orders
    #[serde(with = "serde_money")]
    pub delivery_fee: Price,

    /// Minimum subtotal advertised for delivery
    #[serde(default, with = "serde_money::option", skip_serializing_if = "Option::is_none")]
    pub delivery_min_order: Option<Price>,

    /// e.g. "40-60 min"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_time_estimate: Option<String>,

    /// Whether customers may collect
    #[serde(default)]
    pub pickup_enabled: bool,

    /// e.g. "20-30 min"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_time_estimate: Option<String>,

    /// Where to collect, when different from the business address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_address: Option<String>,

    /// Weekly opening hours
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<BusinessHours>,
}

impl Business {
    /// A business offering both pickup and free delivery.
    pub fn new(
        slug: impl Into<String>,
        name: impl Into<String>,
        currency: &'static Currency,
    ) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
            phone: String::new(),
            address: None,
            description: None,
            delivery_enabled: true,
            delivery_fee: zero(currency),
            delivery_min_order: None,
            delivery_time_estimate: None,
            pickup_enabled: true,
            pickup_time_estimate: None,
            pickup_address: None,
            hours: None,
        }
    }

    /// Sets the delivery fee.
    #[must_use]
    pub fn with_delivery_fee(mut self, fee: Price) -> Self {
        self.delivery_fee = fee;
        self
    }

    /// Sets the contact phone.
    #[must_use]
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = phone.into();
        self
    }

    /// Currency of the business prices.
    pub fn currency(&self) -> &'static Currency {
        self.delivery_fee.currency()
    }

    /// Whether the business offers `mode`.
    pub fn offers(&self, mode: DeliveryMode) -> bool {
        match mode {
            DeliveryMode::Delivery => self.delivery_enabled,
            DeliveryMode::Pickup => self.pickup_enabled,
        }
    }

    /// Mode pre-selected on the delivery step: delivery when offered, else pickup.
    pub fn default_delivery_mode(&self) -> Option<DeliveryMode> {
        if self.delivery_enabled {
            Some(DeliveryMode::Delivery)
        } else if self.pickup_enabled {
            Some(DeliveryMode::Pickup)
        } else {
            None
        }
    }

    /// Time estimate for a mode.
    pub fn time_estimate(&self, mode: DeliveryMode) -> Option<&str> {
        match mode {
            DeliveryMode::Delivery => self.delivery_time_estimate.as_deref(),
            DeliveryMode::Pickup => self.pickup_time_estimate.as_deref(),
        }
    }
}

/// Source of tenant, menu and payment data.
pub trait CatalogService {
    /// Tenant metadata.
    ///
    /// # Errors
    ///
    /// [`CatalogError::BusinessNotFound`] for an unknown slug.
    async fn business(&self, slug: &str) -> Result<Business, CatalogError>;

    /// Available items ordered by category, sort order and name.
    ///
    /// # Errors
    ///
    /// [`CatalogError::BusinessNotFound`] for an unknown slug.
    async fn menu(&self, slug: &str) -> Result<Menu, CatalogError>;

    /// One available product.
    ///
    /// # Errors
    ///
    /// [`CatalogError::ProductNotFound`] when missing or unavailable.
    async fn product(&self, slug: &str, id: &ProductId) -> Result<CatalogItem, CatalogError>;

    /// Active payment methods, or the defaults when none are configured.
    ///
    /// # Errors
    ///
    /// [`CatalogError::BusinessNotFound`] for an unknown slug.
    async fn payment_methods(&self, slug: &str) -> Result<Vec<PaymentMethod>, CatalogError>;
}

/// Display label for the usual menu categories; unknown categories are shown as-is.
pub fn category_label(category: &str) -> &str {
    match category {
        "bolos" => "🎂 Bolos",
        "doces" => "🍬 Doces",
        "tortas" => "🥧 Tortas",
        "sobremesas" => "🍮 Sobremesas",
        "salgados" => "🥐 Salgados",
        "bebidas" => "🥤 Bebidas",
        "outros" => "📦 Outros",
        other => other,
    }
}

/// Browsable menu of available items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Menu {
    items: Vec<CatalogItem>,
}

impl Menu {
    /// Keeps available items and orders them by category, sort order and name.
    pub fn from_items(items: impl IntoIterator<Item = CatalogItem>) -> Self {
        let mut items: Vec<CatalogItem> = items.into_iter().filter(|item| item.available).collect();

        items.sort_by(|a, b| {
            a.category
                .cmp(&b.category)
                .then(a.sort_order.cmp(&b.sort_order))
                .then_with(|| a.name.cmp(&b.name))
        });

        Self { items }
    }

    /// Items in menu order
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    /// Look up an item.
    pub fn item(&self, id: &ProductId) -> Option<&CatalogItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = Vec::new();

        for item in &self.items {
            if !categories.contains(&item.category.as_str()) {
                categories.push(&item.category);
            }
        }

        categories
    }

    /// Items in `category` (all when `None`) whose name or description contains
    /// `query`, ignoring case.
    pub fn filter<'a>(
        &'a self,
        category: Option<&'a str>,
        query: &str,
    ) -> impl Iterator<Item = &'a CatalogItem> + use<'a> {
        let query = query.trim().to_lowercase();

        self.items.iter().filter(move |item| {
            let in_category = category.is_none_or(|category| item.category == category);

            let matches = query.is_empty()
                || item.name.to_lowercase().contains(&query)
                || item
                    .description
                    .as_deref()
                    .is_some_and(|description| description.to_lowercase().contains(&query));

            in_category && matches
        })
    }

    /// Whether the menu has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
