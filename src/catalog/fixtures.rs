//! Fixture Catalog

use std::{fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::{
    catalog::{Business, CatalogError, CatalogService, Menu},
    checkout::{PaymentMethod, default_payment_methods},
    products::{CatalogItem, ProductId},
};

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// An item or option is priced in another currency than the business
    #[error("Item {0} has currency {1}, but business has currency {2}")]
    CurrencyMismatch(String, &'static str, &'static str),
}

/// One business worth of catalog data, as stored in `<slug>.yml`.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogFixture {
    /// Tenant metadata
    pub business: Business,

    /// Every item, available or not
    #[serde(default)]
    pub items: Vec<CatalogItem>,

    /// Configured payment methods, possibly empty
    #[serde(default)]
    pub payment_methods: Vec<PaymentMethod>,
}

impl CatalogFixture {
    /// Checks that every price is in the business currency.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::CurrencyMismatch`] for the first offending item.
    pub fn validate(&self) -> Result<(), FixtureError> {
        let currency = self.business.currency();

        self.items.iter().try_for_each(|item| {
            let prices = std::iter::once(&item.price).chain(
                item.options
                    .iter()
                    .flat_map(|group| group.values.iter())
                    .map(|value| &value.price_modifier),
            );

            for price in prices {
                if price.currency() != currency {
                    return Err(FixtureError::CurrencyMismatch(
                        item.id.to_string(),
                        price.currency().iso_alpha_code,
                        currency.iso_alpha_code,
                    ));
                }
            }

            Ok(())
        })
    }
}

/// [`CatalogService`] reading `<base>/<slug>.yml` files.
#[derive(Debug, Clone)]
pub struct FixtureCatalog {
    base_path: PathBuf,
}

impl Default for FixtureCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureCatalog {
    /// Create a catalog with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a catalog with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Directory holding the fixture files
    pub fn base_path(&self) -> &std::path::Path {
        &self.base_path
    }

    /// Load and validate one business fixture.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::BusinessNotFound`]: no file for this slug.
    /// - [`CatalogError::Fixture`]: the file cannot be read, parsed or validated.
    #[instrument(skip(self))]
    pub fn load(&self, slug: &str) -> Result<CatalogFixture, CatalogError> {
        let valid_slug = !slug.is_empty()
            && slug
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        if !valid_slug {
            return Err(CatalogError::BusinessNotFound(slug.to_string()));
        }

        let file_path = self.base_path.join(format!("{slug}.yml"));

        let contents = match fs::read_to_string(&file_path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(CatalogError::BusinessNotFound(slug.to_string()));
            }
            Err(err) => return Err(FixtureError::from(err).into()),
        };

        let fixture: CatalogFixture =
            serde_norway::from_str(&contents).map_err(FixtureError::from)?;

        fixture.validate()?;

        debug!(
            path = %file_path.display(),
            items = fixture.items.len(),
            "loaded catalog fixture"
        );

        Ok(fixture)
    }
}

impl CatalogService for FixtureCatalog {
    async fn business(&self, slug: &str) -> Result<Business, CatalogError> {
        Ok(self.load(slug)?.business)
    }

    async fn menu(&self, slug: &str) -> Result<Menu, CatalogError> {
        Ok(Menu::from_items(self.load(slug)?.items))
    }

    async fn product(&self, slug: &str, id: &ProductId) -> Result<CatalogItem, CatalogError> {
        self.load(slug)?
            .items
            .into_iter()
            .find(|item| &item.id == id && item.available)
            .ok_or_else(|| CatalogError::ProductNotFound {
                business: slug.to_string(),
                product: id.clone(),
            })
    }

    async fn payment_methods(&self, slug: &str) -> Result<Vec<PaymentMethod>, CatalogError> {
        let active: Vec<PaymentMethod> = self
            .load(slug)?
            .payment_methods
            .into_iter()
            .filter(|method| method.is_active)
            .collect();

        if active.is_empty() {
            Ok(default_payment_methods())
        } else {
            Ok(active)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rusty_money::{Money, iso::BRL};
    use tempfile::TempDir;
    use testresult::TestResult;

    use super::*;

    const FIXTURE: &str = r#"
business:
  slug: pao-quente
  name: Padaria Pão Quente
  phone: "(11) 3333-4444"
  delivery_enabled: false
  delivery_fee: "0.00 BRL"
  pickup_enabled: true
items:
  - id: pao-de-queijo
    name: Pão de Queijo
    price: "1.50 BRL"
    category: salgados
  - id: sonho
    name: Sonho
    price: "6.00 BRL"
    category: doces
    available: false
payment_methods:
  - id: pix
    name: PIX
    type: pix
  - id: vale
    name: Vale Refeição
    type: other
    is_active: false
"#;

    fn catalog() -> TestResult<(TempDir, FixtureCatalog)> {
        let dir = tempfile::tempdir()?;

        fs::write(dir.path().join("pao-quente.yml"), FIXTURE)?;

        let catalog = FixtureCatalog::with_base_path(dir.path());

        Ok((dir, catalog))
    }

    #[tokio::test]
    async fn business_is_loaded_from_slug_file() -> TestResult {
        let (_dir, catalog) = catalog()?;

        let business = catalog.business("pao-quente").await?;

        assert_eq!(business.name, "Padaria Pão Quente");
        assert!(!business.delivery_enabled);
        assert_eq!(business.delivery_fee, Money::from_minor(0, BRL));

        Ok(())
    }

    #[tokio::test]
    async fn unknown_slug_is_not_found() -> TestResult {
        let (_dir, catalog) = catalog()?;

        let error = catalog.business("nope").await.err();

        assert!(error.is_some_and(|error| error.is_not_found()));

        let traversal = catalog.business("../pao-quente").await.err();

        assert!(traversal.is_some_and(|error| error.is_not_found()));

        Ok(())
    }

    #[tokio::test]
    async fn unavailable_product_is_not_found() -> TestResult {
        let (_dir, catalog) = catalog()?;

        let product = catalog.product("pao-quente", &"pao-de-queijo".into()).await?;

        assert_eq!(product.price, Money::from_minor(150, BRL));

        let hidden = catalog.product("pao-quente", &"sonho".into()).await.err();

        assert!(hidden.is_some_and(|error| error.is_not_found()));

        Ok(())
    }

    #[tokio::test]
    async fn menu_skips_unavailable_items() -> TestResult {
        let (_dir, catalog) = catalog()?;

        let menu = catalog.menu("pao-quente").await?;

        assert_eq!(menu.items().len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn only_active_payment_methods_are_offered() -> TestResult {
        let (_dir, catalog) = catalog()?;

        let methods = catalog.payment_methods("pao-quente").await?;

        assert_eq!(methods.len(), 1);
        assert_eq!(methods.first().map(|method| method.name.as_str()), Some("PIX"));

        Ok(())
    }

    #[tokio::test]
    async fn payment_methods_fall_back_to_defaults() -> TestResult {
        let dir = tempfile::tempdir()?;
        let fixture = FIXTURE.split("payment_methods:").next().unwrap_or_default();

        fs::write(dir.path().join("pao-quente.yml"), fixture)?;

        let methods = FixtureCatalog::with_base_path(dir.path())
            .payment_methods("pao-quente")
            .await?;

        assert_eq!(methods, default_payment_methods());

        Ok(())
    }

    #[test]
    fn foreign_currency_item_is_rejected() -> TestResult {
        let dir = tempfile::tempdir()?;

        fs::write(
            dir.path().join("loja.yml"),
            FIXTURE.replace("\"6.00 BRL\"", "\"6.00 USD\""),
        )?;

        let result = FixtureCatalog::with_base_path(dir.path()).load("loja");

        assert!(matches!(
            result,
            Err(CatalogError::Fixture(FixtureError::CurrencyMismatch(..)))
        ));

        Ok(())
    }
}
