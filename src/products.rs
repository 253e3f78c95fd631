//! Products

use serde::{Deserialize, Serialize};

use crate::{
    ids::TypedId,
    prices::{Price, serde_money},
};

/// Catalog item identifier
pub type ProductId = TypedId<CatalogItem>;

/// Option group identifier
pub type OptionGroupId = TypedId<OptionGroup>;

/// Option value identifier
pub type OptionValueId = TypedId<OptionValue>;

fn enabled() -> bool {
    true
}

/// A product as listed by the catalog.
///
/// Cart lines keep their own copy, so later catalog edits never change what is
/// already in a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Catalog identifier
    pub id: ProductId,

    /// Product name
    pub name: String,

    /// Product description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Base unit price
    #[serde(with = "serde_money")]
    pub price: Price,

    /// Menu category
    pub category: String,

    /// Explicit position within the category
    #[serde(default)]
    pub sort_order: i32,

    /// Whether the product can currently be ordered
    #[serde(default = "enabled")]
    pub available: bool,

    /// Preparation time in minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preparation_time: Option<u32>,

    /// Customization groups, in display order
    #[serde(default)]
    pub options: Vec<OptionGroup>,
}

impl CatalogItem {
    /// Creates an available product with no options.
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Price,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            price,
            category: category.into(),
            sort_order: 0,
            available: true,
            preparation_time: None,
            options: Vec::new(),
        }
    }

    /// Replaces the option groups.
    #[must_use]
    pub fn with_options(mut self, options: impl Into<Vec<OptionGroup>>) -> Self {
        self.options = options.into();
        self
    }

    /// Looks up an option group by id.
    pub fn option_group(&self, id: &OptionGroupId) -> Option<&OptionGroup> {
        self.options.iter().find(|group| &group.id == id)
    }
}

/// How many values of a group may be chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Exactly one value; choosing another replaces it.
    Single,

    /// Any number of values up to the group maximum.
    Multiple,
}

/// A named axis of customization (e.g. "Tamanho").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionGroup {
    /// Group identifier
    pub id: OptionGroupId,

    /// Display name
    pub name: String,

    /// Selection mode
    pub mode: SelectionMode,

    /// Whether at least one value must be chosen
    #[serde(default)]
    pub required: bool,

    /// Minimum number of chosen values
    #[serde(default)]
    pub min_selections: usize,

    /// Maximum number of chosen values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_selections: Option<usize>,

    /// Choices, in display order
    #[serde(default)]
    pub values: Vec<OptionValue>,
}

impl OptionGroup {
    /// Creates a group with no constraints and no values.
    pub fn new(id: impl Into<OptionGroupId>, name: impl Into<String>, mode: SelectionMode) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            mode,
            required: false,
            min_selections: 0,
            max_selections: None,
            values: Vec::new(),
        }
    }

    /// Marks the group as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the selection bounds.
    #[must_use]
    pub fn with_bounds(mut self, min: usize, max: Option<usize>) -> Self {
        self.min_selections = min;
        self.max_selections = max;
        self
    }

    /// Replaces the values.
    #[must_use]
    pub fn with_values(mut self, values: impl Into<Vec<OptionValue>>) -> Self {
        self.values = values.into();
        self
    }

    /// Effective maximum: single-mode groups never hold more than one value.
    pub fn max_allowed(&self) -> Option<usize> {
        match self.mode {
            SelectionMode::Single => Some(1),
            SelectionMode::Multiple => self.max_selections,
        }
    }

    /// Looks up a value by id.
    pub fn value(&self, id: &OptionValueId) -> Option<&OptionValue> {
        self.values.iter().find(|value| &value.id == id)
    }
}

/// One choice within an option group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionValue {
    /// Value identifier
    pub id: OptionValueId,

    /// Display name
    pub name: String,

    /// Signed amount added to the unit price
    #[serde(with = "serde_money")]
    pub price_modifier: Price,

    /// Pre-selected when the product is opened
    #[serde(default)]
    pub is_default: bool,

    /// Inactive values are hidden and cannot be chosen
    #[serde(default = "enabled")]
    pub is_active: bool,
}

impl OptionValue {
    /// Creates an active, non-default value.
    pub fn new(id: impl Into<OptionValueId>, name: impl Into<String>, price_modifier: Price) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price_modifier,
            is_default: false,
            is_active: true,
        }
    }

    /// Marks the value as pre-selected.
    #[must_use]
    pub fn default_selected(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Marks the value as inactive.
    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::BRL};
    use testresult::TestResult;

    use super::*;

    #[test]
    fn single_mode_caps_at_one() {
        let group = OptionGroup::new("size", "Tamanho", SelectionMode::Single).with_bounds(0, Some(3));

        assert_eq!(group.max_allowed(), Some(1));
    }

    #[test]
    fn multiple_mode_uses_configured_max() {
        let capped = OptionGroup::new("top", "Coberturas", SelectionMode::Multiple).with_bounds(0, Some(2));
        let open = OptionGroup::new("extra", "Extras", SelectionMode::Multiple);

        assert_eq!(capped.max_allowed(), Some(2));
        assert_eq!(open.max_allowed(), None);
    }

    #[test]
    fn catalog_item_deserializes_with_defaults() -> TestResult {
        let yaml = r#"
id: brigadeiro
name: Brigadeiro
price: "3.50 BRL"
category: doces
options:
  - id: flavour
    name: Sabor
    mode: single
    required: true
    values:
      - id: classic
        name: Tradicional
        price_modifier: "0.00 BRL"
        is_default: true
"#;

        let item: CatalogItem = serde_norway::from_str(yaml)?;

        assert!(item.available);
        assert_eq!(item.price, Money::from_minor(350, BRL));

        let group = item.option_group(&"flavour".into()).ok_or("missing group")?;
        let value = group.value(&"classic".into()).ok_or("missing value")?;

        assert!(group.required);
        assert!(value.is_default);
        assert!(value.is_active);

        Ok(())
    }
}
