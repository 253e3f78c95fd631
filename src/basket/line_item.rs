//! Cart Line Items

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{
    ids::TypedId,
    options::SelectedOption,
    prices::{Price, serde_money},
    pricing::{PricingError, line_total, unit_price},
    products::{CatalogItem, ProductId},
};

/// Line item identifier
pub type LineItemId = TypedId<CartLineItem>;

impl LineItemId {
    /// Derives an id from the catalog item and the time it was added.
    pub fn generate(product: &ProductId, at: Timestamp) -> Self {
        Self::new(format!("{product}-{}", at.as_millisecond()))
    }
}

/// One cart entry: a catalog item snapshot with a quantity and customization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLineItem {
    id: LineItemId,
    catalog_item: CatalogItem,
    quantity: u32,
    selected_options: Vec<SelectedOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
    #[serde(with = "serde_money")]
    total_price: Price,
}

impl CartLineItem {
    /// Creates a line and computes its total.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::InvalidQuantity`] for a zero quantity, or a money error
    /// if an option modifier is in another currency.
    pub fn new(
        id: LineItemId,
        catalog_item: CatalogItem,
        quantity: u32,
        selected_options: Vec<SelectedOption>,
    ) -> Result<Self, PricingError> {
        let total_price = line_total(
            i64::from(quantity),
            unit_price(&catalog_item, &selected_options)?,
        )?;

        Ok(Self {
            id,
            catalog_item,
            quantity,
            selected_options,
            notes: None,
            total_price,
        })
    }

    /// Line identifier
    pub fn id(&self) -> &LineItemId {
        &self.id
    }

    pub(crate) fn set_id(&mut self, id: LineItemId) {
        self.id = id;
    }

    /// Catalog item as it was when added
    pub fn catalog_item(&self) -> &CatalogItem {
        &self.catalog_item
    }

    /// Quantity, at least one
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Chosen options snapshot
    pub fn selected_options(&self) -> &[SelectedOption] {
        &self.selected_options
    }

    /// Notes for the kitchen
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Replaces the notes; blank text clears them.
    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = notes
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
    }

    /// `quantity * unit_price`, kept in sync with every quantity change
    pub fn total_price(&self) -> &Price {
        &self.total_price
    }

    /// Base price plus option modifiers, from the line's own snapshot.
    ///
    /// # Errors
    ///
    /// Returns a money error on currency mismatch.
    pub fn unit_price(&self) -> Result<Price, PricingError> {
        unit_price(&self.catalog_item, &self.selected_options)
    }

    /// Sets the quantity and recomputes the total.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::InvalidQuantity`] for zero; the line is left unchanged.
    pub fn set_quantity(&mut self, quantity: u32) -> Result<(), PricingError> {
        self.total_price = line_total(i64::from(quantity), self.unit_price()?)?;
        self.quantity = quantity;

        Ok(())
    }

    /// Whether the quantity is positive and the cached total equals
    /// `quantity * unit_price` recomputed from the snapshot.
    pub fn is_consistent(&self) -> bool {
        self.quantity >= 1
            && self
                .unit_price()
                .and_then(|unit| line_total(i64::from(self.quantity), unit))
                .is_ok_and(|total| total == self.total_price)
    }

    /// Same catalog item with a structurally equal options snapshot.
    ///
    /// Order matters: the same values picked in a different order are a different
    /// customization.
    pub fn same_customization(&self, other: &CartLineItem) -> bool {
        self.catalog_item.id == other.catalog_item.id
            && self.selected_options == other.selected_options
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::BRL};
    use testresult::TestResult;

    use crate::options::SelectedValue;

    use super::*;

    fn pudim() -> CatalogItem {
        CatalogItem::new("pudim", "Pudim", Money::from_minor(1200, BRL), "sobremesas")
    }

    fn calda(name: &str, minor: i64) -> SelectedOption {
        SelectedOption {
            option_id: "calda".into(),
            option_name: "Calda".to_string(),
            values: vec![SelectedValue {
                value_id: name.into(),
                value_name: name.to_string(),
                price_modifier: Money::from_minor(minor, BRL),
            }],
        }
    }

    #[test]
    fn generated_id_combines_product_and_millis() -> TestResult {
        let at = Timestamp::from_millisecond(1_700_000_000_123)?;

        let id = LineItemId::generate(&"pudim".into(), at);

        assert_eq!(id.as_str(), "pudim-1700000000123");

        Ok(())
    }

    #[test]
    fn new_computes_total_from_snapshot() -> TestResult {
        let line = CartLineItem::new("l1".into(), pudim(), 3, vec![calda("caramelo", 150)])?;

        assert_eq!(line.total_price(), &Money::from_minor(4050, BRL));
        assert_eq!(line.unit_price()?, Money::from_minor(1350, BRL));

        Ok(())
    }

    #[test]
    fn new_rejects_zero_quantity() {
        let result = CartLineItem::new("l1".into(), pudim(), 0, Vec::new());

        assert_eq!(result, Err(PricingError::InvalidQuantity(0)));
    }

    #[test]
    fn lines_stay_consistent_across_quantity_changes() -> TestResult {
        let mut line = CartLineItem::new("l1".into(), pudim(), 1, vec![calda("caramelo", 150)])?;

        line.set_quantity(4)?;

        assert!(line.is_consistent());

        line.quantity = 0;

        assert!(!line.is_consistent());

        Ok(())
    }

    #[test]
    fn set_quantity_recomputes_total() -> TestResult {
        let mut line = CartLineItem::new("l1".into(), pudim(), 1, vec![calda("caramelo", 150)])?;

        line.set_quantity(4)?;

        assert_eq!(line.quantity(), 4);
        assert_eq!(line.total_price(), &Money::from_minor(5400, BRL));

        Ok(())
    }

    #[test]
    fn set_quantity_zero_leaves_line_unchanged() -> TestResult {
        let mut line = CartLineItem::new("l1".into(), pudim(), 2, Vec::new())?;

        assert!(line.set_quantity(0).is_err());
        assert_eq!(line.quantity(), 2);
        assert_eq!(line.total_price(), &Money::from_minor(2400, BRL));

        Ok(())
    }

    #[test]
    fn same_customization_compares_snapshot() -> TestResult {
        let a = CartLineItem::new("a".into(), pudim(), 1, vec![calda("caramelo", 150)])?;
        let b = CartLineItem::new("b".into(), pudim(), 5, vec![calda("caramelo", 150)])?;
        let c = CartLineItem::new("c".into(), pudim(), 1, vec![calda("chocolate", 150)])?;

        assert!(a.same_customization(&b));
        assert!(!a.same_customization(&c));

        Ok(())
    }
}
