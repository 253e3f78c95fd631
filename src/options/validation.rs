//! Option Validation

use thiserror::Error;

use crate::{
    options::SelectedOption,
    products::{CatalogItem, OptionGroup, OptionGroupId},
};

/// A group's selection does not satisfy its constraints.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OptionValidationError {
    /// Required group with nothing selected.
    #[error("option group {group} requires a selection")]
    MissingRequiredSelection {
        /// Offending group
        group: OptionGroupId,
    },

    /// Fewer values than the group minimum.
    #[error("option group {group} needs at least {min} selections, got {selected}")]
    BelowMinimumSelection {
        /// Offending group
        group: OptionGroupId,
        /// Group minimum
        min: usize,
        /// Number of selected values
        selected: usize,
    },

    /// More values than the group maximum.
    #[error("option group {group} allows at most {max} selections, got {selected}")]
    AboveMaximumSelection {
        /// Offending group
        group: OptionGroupId,
        /// Effective group maximum
        max: usize,
        /// Number of selected values
        selected: usize,
    },
}

/// Checks one group given how many of its values are selected.
///
/// # Errors
///
/// Returns the first constraint the count violates, checked in the order required,
/// minimum, maximum.
pub fn validate_group(group: &OptionGroup, selected: usize) -> Result<(), OptionValidationError> {
    if group.required && selected == 0 {
        return Err(OptionValidationError::MissingRequiredSelection {
            group: group.id.clone(),
        });
    }

    if selected < group.min_selections {
        return Err(OptionValidationError::BelowMinimumSelection {
            group: group.id.clone(),
            min: group.min_selections,
            selected,
        });
    }

    if let Some(max) = group.max_allowed()
        && selected > max
    {
        return Err(OptionValidationError::AboveMaximumSelection {
            group: group.id.clone(),
            max,
            selected,
        });
    }

    Ok(())
}

/// Checks every group of a product against a selection snapshot.
///
/// Groups missing from the snapshot count as having nothing selected.
///
/// # Errors
///
/// Returns the error for the first invalid group in catalog order.
pub fn validate_product(
    item: &CatalogItem,
    selected: &[SelectedOption],
) -> Result<(), OptionValidationError> {
    item.options.iter().try_for_each(|group| {
        let count = selected
            .iter()
            .find(|option| option.option_id == group.id)
            .map_or(0, |option| option.values.len());

        validate_group(group, count)
    })
}
