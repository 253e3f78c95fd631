//! Product Options
//!
//! Selection state for a product being customized, and the snapshot of that selection
//! which cart lines carry around.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    basket::{CartLineItem, LineItemId},
    prices::{Price, serde_money},
    pricing::{PricingError, line_total, unit_price},
    products::{CatalogItem, OptionGroupId, OptionValue, OptionValueId, SelectionMode},
};

pub mod validation;

pub use validation::{OptionValidationError, validate_group, validate_product};

/// A chosen value, copied from the catalog at selection time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedValue {
    /// Chosen value
    pub value_id: OptionValueId,

    /// Value name at selection time
    pub value_name: String,

    /// Price modifier at selection time
    #[serde(with = "serde_money")]
    pub price_modifier: Price,
}

impl From<&OptionValue> for SelectedValue {
    fn from(value: &OptionValue) -> Self {
        Self {
            value_id: value.id.clone(),
            value_name: value.name.clone(),
            price_modifier: value.price_modifier,
        }
    }
}

/// The values chosen for one option group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedOption {
    /// Option group
    pub option_id: OptionGroupId,

    /// Group name at selection time
    pub option_name: String,

    /// Chosen values in the order they were picked
    pub values: Vec<SelectedValue>,
}

/// Reasons a customized product cannot become a cart line.
#[derive(Debug, Error, PartialEq)]
pub enum SelectionError {
    /// The product is not currently sold.
    #[error("product {0} is not available")]
    Unavailable(String),

    /// A group constraint is not met.
    #[error(transparent)]
    Options(#[from] OptionValidationError),

    /// The line could not be priced.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// In-progress customization of one catalog item.
#[derive(Debug, Clone)]
pub struct OptionSelection<'p> {
    product: &'p CatalogItem,
    selected: Vec<SelectedOption>,
    quantity: u32,
    notes: Option<String>,
}

impl<'p> OptionSelection<'p> {
    /// Starts a selection with every active default value pre-selected.
    pub fn new(product: &'p CatalogItem) -> Self {
        let selected = product
            .options
            .iter()
            .map(|group| {
                let defaults = group
                    .values
                    .iter()
                    .filter(|value| value.is_active && value.is_default)
                    .map(SelectedValue::from);

                let values = match group.max_allowed() {
                    Some(max) => defaults.take(max).collect(),
                    None => defaults.collect(),
                };

                SelectedOption {
                    option_id: group.id.clone(),
                    option_name: group.name.clone(),
                    values,
                }
            })
            .collect();

        Self {
            product,
            selected,
            quantity: 1,
            notes: None,
        }
    }

    /// The product being customized.
    pub fn product(&self) -> &'p CatalogItem {
        self.product
    }

    /// Selects or deselects a value.
    ///
    /// In a single-mode group the value replaces whatever was selected, and picking the
    /// selected value again changes nothing. In a multiple-mode group an
    /// already-selected value is removed, and a new value is appended only while the
    /// group is under its maximum. Unknown or inactive values are ignored. Returns
    /// whether the selection changed.
    pub fn toggle(&mut self, group_id: &OptionGroupId, value_id: &OptionValueId) -> bool {
        let Some(group) = self.product.option_group(group_id) else {
            return false;
        };

        let Some(value) = group.value(value_id).filter(|value| value.is_active) else {
            return false;
        };

        let index = match self
            .selected
            .iter()
            .position(|option| &option.option_id == group_id)
        {
            Some(index) => index,
            None => {
                self.selected.push(SelectedOption {
                    option_id: group.id.clone(),
                    option_name: group.name.clone(),
                    values: Vec::new(),
                });
                self.selected.len() - 1
            }
        };

        let Some(option) = self.selected.get_mut(index) else {
            return false;
        };

        match group.mode {
            SelectionMode::Single => {
                if matches!(option.values.as_slice(), [only] if &only.value_id == value_id) {
                    return false;
                }

                option.values = vec![SelectedValue::from(value)];
                true
            }
            SelectionMode::Multiple => {
                if let Some(position) = option.values.iter().position(|v| &v.value_id == value_id)
                {
                    option.values.remove(position);
                    return true;
                }

                if group
                    .max_allowed()
                    .is_some_and(|max| option.values.len() >= max)
                {
                    return false;
                }

                option.values.push(SelectedValue::from(value));
                true
            }
        }
    }

    /// Whether a value is currently selected.
    pub fn is_selected(&self, group_id: &OptionGroupId, value_id: &OptionValueId) -> bool {
        self.selected_for(group_id)
            .iter()
            .any(|value| &value.value_id == value_id)
    }

    /// Selected values of one group.
    pub fn selected_for(&self, group_id: &OptionGroupId) -> &[SelectedValue] {
        self.selected
            .iter()
            .find(|option| &option.option_id == group_id)
            .map(|option| option.values.as_slice())
            .unwrap_or_default()
    }

    /// Quantity to add.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Sets the quantity; the product page never goes below one.
    pub fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity.max(1);
    }

    /// Free-text notes for the kitchen.
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Sets the notes; blank text clears them.
    pub fn set_notes(&mut self, notes: &str) {
        let trimmed = notes.trim();

        self.notes = (!trimmed.is_empty()).then(|| trimmed.to_string());
    }

    /// Snapshot of the non-empty groups, in catalog order.
    pub fn snapshot(&self) -> Vec<SelectedOption> {
        self.selected
            .iter()
            .filter(|option| !option.values.is_empty())
            .cloned()
            .collect()
    }

    /// Checks every group of the product.
    ///
    /// # Errors
    ///
    /// Returns the first invalid group.
    pub fn validate(&self) -> Result<(), OptionValidationError> {
        validate_product(self.product, &self.selected)
    }

    /// Whether every group passes validation.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Whether "add to cart" should be enabled.
    pub fn can_add_to_cart(&self) -> bool {
        self.product.available && self.is_valid()
    }

    /// Unit price including the current modifiers.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] on currency mismatch.
    pub fn unit_price(&self) -> Result<Price, PricingError> {
        unit_price(self.product, &self.selected)
    }

    /// Unit price times quantity.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] on currency mismatch or overflow.
    pub fn total(&self) -> Result<Price, PricingError> {
        line_total(i64::from(self.quantity), self.unit_price()?)
    }

    /// Builds the cart line for this selection.
    ///
    /// # Errors
    ///
    /// Fails if the product is unavailable, a group is invalid, or pricing fails.
    pub fn to_line_item(&self, id: LineItemId) -> Result<CartLineItem, SelectionError> {
        if !self.product.available {
            return Err(SelectionError::Unavailable(self.product.id.to_string()));
        }

        self.validate()?;

        let mut line = CartLineItem::new(
            id,
            self.product.clone(),
            self.quantity,
            self.snapshot(),
        )?;

        line.set_notes(self.notes.clone());

        Ok(line)
    }

    /// Builds the cart line with an id derived from the product and the current time.
    ///
    /// # Errors
    ///
    /// See [`OptionSelection::to_line_item`].
    pub fn to_line_item_now(&self) -> Result<CartLineItem, SelectionError> {
        self.to_line_item(LineItemId::generate(&self.product.id, Timestamp::now()))
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::BRL};
    use testresult::TestResult;

    use crate::products::OptionGroup;

    use super::*;

    fn bolo() -> CatalogItem {
        CatalogItem::new("bolo", "Bolo de Pote", Money::from_minor(2000, BRL), "bolos").with_options([
            OptionGroup::new("size", "Tamanho", SelectionMode::Single)
                .required()
                .with_values([
                    OptionValue::new("p", "Pequeno", Money::from_minor(0, BRL)).default_selected(),
                    OptionValue::new("g", "Grande", Money::from_minor(300, BRL)),
                    OptionValue::new("xg", "Família", Money::from_minor(900, BRL)).inactive(),
                ]),
            OptionGroup::new("top", "Coberturas", SelectionMode::Multiple)
                .with_bounds(0, Some(2))
                .with_values([
                    OptionValue::new("choc", "Chocolate", Money::from_minor(200, BRL)),
                    OptionValue::new("mor", "Morango", Money::from_minor(250, BRL)),
                    OptionValue::new("coco", "Coco", Money::from_minor(150, BRL)),
                ]),
        ])
    }

    #[test]
    fn defaults_are_preselected() {
        let product = bolo();
        let selection = OptionSelection::new(&product);

        assert!(selection.is_selected(&"size".into(), &"p".into()));
        assert!(selection.selected_for(&"top".into()).is_empty());
        assert_eq!(selection.quantity(), 1);
    }

    #[test]
    fn single_mode_replaces_previous_value() {
        let product = bolo();
        let mut selection = OptionSelection::new(&product);

        assert!(selection.toggle(&"size".into(), &"g".into()));
        assert!(!selection.toggle(&"size".into(), &"g".into()));

        let size = selection.selected_for(&"size".into());
        assert_eq!(size.len(), 1);
        assert_eq!(size.first().map(|v| v.value_id.as_str()), Some("g"));
    }

    #[test]
    fn multiple_mode_toggles_and_caps_at_max() {
        let product = bolo();
        let mut selection = OptionSelection::new(&product);
        let top = OptionGroupId::from("top");

        assert!(selection.toggle(&top, &"choc".into()));
        assert!(selection.toggle(&top, &"mor".into()));
        assert!(!selection.toggle(&top, &"coco".into()));
        assert_eq!(selection.selected_for(&top).len(), 2);

        assert!(selection.toggle(&top, &"choc".into()));
        assert_eq!(selection.selected_for(&top).len(), 1);
    }

    #[test]
    fn inactive_and_unknown_values_are_ignored() {
        let product = bolo();
        let mut selection = OptionSelection::new(&product);

        assert!(!selection.toggle(&"size".into(), &"xg".into()));
        assert!(!selection.toggle(&"size".into(), &"nope".into()));
        assert!(!selection.toggle(&"nope".into(), &"p".into()));
        assert!(selection.is_selected(&"size".into(), &"p".into()));
    }

    #[test]
    fn total_tracks_options_and_quantity() -> TestResult {
        let product = bolo();
        let mut selection = OptionSelection::new(&product);

        selection.toggle(&"size".into(), &"g".into());
        selection.toggle(&"top".into(), &"choc".into());
        selection.set_quantity(3);

        assert_eq!(selection.unit_price()?, Money::from_minor(2500, BRL));
        assert_eq!(selection.total()?, Money::from_minor(7500, BRL));

        Ok(())
    }

    #[test]
    fn quantity_never_drops_below_one() {
        let product = bolo();
        let mut selection = OptionSelection::new(&product);

        selection.set_quantity(0);

        assert_eq!(selection.quantity(), 1);
    }

    #[test]
    fn blank_notes_are_dropped() {
        let product = bolo();
        let mut selection = OptionSelection::new(&product);

        selection.set_notes("  sem açúcar  ");
        assert_eq!(selection.notes(), Some("sem açúcar"));

        selection.set_notes("   ");
        assert_eq!(selection.notes(), None);
    }

    #[test]
    fn snapshot_drops_empty_groups() {
        let product = bolo();
        let selection = OptionSelection::new(&product);

        let snapshot = selection.snapshot();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.first().map(|o| o.option_id.as_str()), Some("size"));
    }

    #[test]
    fn required_group_without_default_disables_add_to_cart() {
        let product = CatalogItem::new("torta", "Torta", Money::from_minor(3000, BRL), "tortas")
            .with_options([OptionGroup::new("sabor", "Sabor", SelectionMode::Single)
                .required()
                .with_values([OptionValue::new("limao", "Limão", Money::from_minor(0, BRL))])]);
        let mut selection = OptionSelection::new(&product);

        assert!(!selection.can_add_to_cart());
        assert!(matches!(
            selection.to_line_item("torta-1".into()),
            Err(SelectionError::Options(_))
        ));

        selection.toggle(&"sabor".into(), &"limao".into());

        assert!(selection.can_add_to_cart());
    }

    #[test]
    fn unavailable_product_cannot_be_added() {
        let mut product = bolo();
        product.available = false;
        let selection = OptionSelection::new(&product);

        assert!(!selection.can_add_to_cart());
        assert!(matches!(
            selection.to_line_item("bolo-1".into()),
            Err(SelectionError::Unavailable(_))
        ));
    }

    #[test]
    fn line_item_carries_snapshot_notes_and_total() -> TestResult {
        let product = bolo();
        let mut selection = OptionSelection::new(&product);

        selection.toggle(&"size".into(), &"g".into());
        selection.set_quantity(2);
        selection.set_notes("para presente");

        let line = selection.to_line_item("bolo-1".into())?;

        assert_eq!(line.quantity(), 2);
        assert_eq!(line.notes(), Some("para presente"));
        assert_eq!(line.selected_options(), selection.snapshot().as_slice());
        assert_eq!(line.total_price(), &Money::from_minor(4600, BRL));

        Ok(())
    }
}
