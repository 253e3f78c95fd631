//! Cart Store

use rusty_money::iso::Currency;
use tracing::{Span, debug, info, warn};

use crate::{
    basket::{CartError, CartLineItem, CartSession, LineItemId},
    checkout::{CustomerInfo, DeliveryMode, PaymentMethod},
    prices::{DEFAULT_CURRENCY, Price},
    pricing::PricingError,
    storage::{
        MemoryStorage, PersistenceError, STORAGE_KEY, SessionStorage, decode_session,
        encode_session,
    },
};

/// Owns the cart session and writes it to storage after every mutation.
///
/// Storage failures never surface to callers: a failed read starts an empty session
/// and a failed write switches the store to in-memory only for the rest of its life.
#[derive(Debug)]
pub struct CartStore<S: SessionStorage = MemoryStorage> {
    session: CartSession,
    storage: S,
    persistent: bool,
}

impl CartStore<MemoryStorage> {
    /// Store backed by process memory only.
    pub fn in_memory() -> Self {
        Self::open(MemoryStorage::new())
    }
}

impl<S: SessionStorage> CartStore<S> {
    /// Rehydrate the session from storage, starting empty in the default currency when
    /// nothing usable is stored.
    pub fn open(storage: S) -> Self {
        Self::open_in(storage, DEFAULT_CURRENCY)
    }

    /// Rehydrate the session from storage, starting empty in `currency` when nothing
    /// usable is stored.
    #[tracing::instrument(
        name = "cart.store.open",
        skip(storage),
        fields(currency = currency.iso_alpha_code, restored = tracing::field::Empty)
    )]
    pub fn open_in(storage: S, currency: &'static Currency) -> Self {
        let session = match Self::restore(&storage) {
            Ok(Some(session)) => {
                Span::current().record("restored", true);

                debug!(items = session.items().len(), "restored cart session");

                session
            }
            Ok(None) => CartSession::new(currency),
            Err(error) => {
                warn!(%error, "discarding stored cart session");

                CartSession::new(currency)
            }
        };

        Self {
            session,
            storage,
            persistent: true,
        }
    }

    fn restore(storage: &S) -> Result<Option<CartSession>, PersistenceError> {
        storage
            .read(STORAGE_KEY)?
            .map(|text| decode_session(&text))
            .transpose()
    }

    fn persist(&mut self) {
        if !self.persistent {
            return;
        }

        let written = encode_session(&self.session)
            .and_then(|text| self.storage.write(STORAGE_KEY, &text));

        if let Err(error) = written {
            warn!(%error, "cart persistence failed, keeping the session in memory only");

            self.persistent = false;
        }
    }

    /// Current session
    pub fn session(&self) -> &CartSession {
        &self.session
    }

    /// Backing storage
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Whether mutations are still being written to storage.
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// Adds a line, merging identical customizations.
    ///
    /// # Errors
    ///
    /// See [`CartSession::add_item`]. The session is unchanged on error.
    #[tracing::instrument(
        name = "cart.store.add_item",
        skip(self, line),
        fields(product = %line.catalog_item().id, quantity = line.quantity()),
        err
    )]
    pub fn add_item(&mut self, line: CartLineItem) -> Result<LineItemId, CartError> {
        let id = self.session.add_item(line)?;

        self.persist();

        info!(line = %id, items = self.session.item_count(), "cart updated");

        Ok(id)
    }

    /// Removes a line; unknown ids are ignored.
    pub fn remove_item(&mut self, id: &LineItemId) {
        if self.session.remove_item(id) {
            debug!(line = %id, "removed cart line");
        }

        self.persist();
    }

    /// Sets a line's quantity; zero or below removes it.
    ///
    /// # Errors
    ///
    /// See [`CartSession::update_quantity`]. The session is unchanged on error.
    pub fn update_quantity(&mut self, id: &LineItemId, quantity: i64) -> Result<(), CartError> {
        self.session.update_quantity(id, quantity)?;

        self.persist();

        Ok(())
    }

    /// Empties the cart and checkout choices, keeping the tenant.
    pub fn clear_cart(&mut self) {
        self.session.clear_cart();

        self.persist();

        debug!("cleared cart");
    }

    /// Chooses pickup or delivery.
    pub fn set_delivery_type(&mut self, mode: DeliveryMode) {
        self.session.set_delivery_type(mode);

        self.persist();
    }

    /// Saves the customer's details.
    pub fn set_customer_info(&mut self, customer: CustomerInfo) {
        self.session.set_customer_info(customer);

        self.persist();
    }

    /// Chooses a payment method.
    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.session.set_payment_method(method);

        self.persist();
    }

    /// Sets the cash change amount.
    pub fn set_payment_change_for(&mut self, change_for: Option<Price>) {
        self.session.set_payment_change_for(change_for);

        self.persist();
    }

    /// Records the tenant the cart belongs to.
    pub fn set_business_slug(&mut self, slug: impl Into<String>) {
        self.session.set_business_slug(slug);

        self.persist();
    }

    /// Sum of line totals.
    ///
    /// # Errors
    ///
    /// See [`CartSession::subtotal`].
    pub fn subtotal(&self) -> Result<Price, PricingError> {
        self.session.subtotal()
    }

    /// Sum of line quantities.
    pub fn item_count(&self) -> u64 {
        self.session.item_count()
    }

    /// Whether the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.session.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::BRL};
    use testresult::TestResult;

    use crate::products::CatalogItem;

    use super::*;

    /// Storage whose writes always fail.
    #[derive(Debug, Default)]
    struct BrokenStorage {
        attempts: usize,
    }

    impl SessionStorage for BrokenStorage {
        fn read(&self, _key: &str) -> Result<Option<String>, PersistenceError> {
            Ok(None)
        }

        fn write(&mut self, _key: &str, _value: &str) -> Result<(), PersistenceError> {
            self.attempts += 1;

            Err(std::io::Error::other("disk full").into())
        }

        fn remove(&mut self, _key: &str) -> Result<(), PersistenceError> {
            Ok(())
        }
    }

    fn line(id: &str) -> TestResult<CartLineItem> {
        let item = CatalogItem::new("cocada", "Cocada", Money::from_minor(500, BRL), "doces");

        Ok(CartLineItem::new(id.into(), item, 1, Vec::new())?)
    }

    #[test]
    fn every_mutation_is_written() -> TestResult {
        let mut store = CartStore::in_memory();

        store.add_item(line("c1")?)?;

        let stored = store.storage().read(STORAGE_KEY)?.unwrap_or_default();

        assert_eq!(decode_session(&stored)?, *store.session());

        store.set_delivery_type(DeliveryMode::Pickup);

        let stored = store.storage().read(STORAGE_KEY)?.unwrap_or_default();

        assert_eq!(
            decode_session(&stored)?.delivery().mode,
            Some(DeliveryMode::Pickup)
        );

        Ok(())
    }

    #[test]
    fn reopening_restores_the_session() -> TestResult {
        let mut store = CartStore::in_memory();

        store.set_business_slug("doce-mel");
        store.add_item(line("c1")?)?;

        let expected = store.session().clone();
        let reopened = CartStore::open(store.storage().clone());

        assert_eq!(reopened.session(), &expected);

        Ok(())
    }

    #[test]
    fn corrupted_storage_starts_empty() -> TestResult {
        let mut storage = MemoryStorage::new();

        storage.write(STORAGE_KEY, "{\"version\":1,\"session\":42}")?;

        let store = CartStore::open(storage);

        assert!(store.is_empty());
        assert!(store.is_persistent());

        Ok(())
    }

    #[test]
    fn failed_write_degrades_to_memory() -> TestResult {
        let mut store = CartStore::open(BrokenStorage::default());

        store.add_item(line("c1")?)?;
        store.add_item(line("c2")?)?;

        assert!(!store.is_persistent());
        assert_eq!(store.storage().attempts, 1);
        assert_eq!(store.item_count(), 2);

        Ok(())
    }

    #[test]
    fn failed_mutation_is_not_written() -> TestResult {
        let mut store = CartStore::open_in(BrokenStorage::default(), rusty_money::iso::USD);

        assert!(store.add_item(line("c1")?).is_err());
        assert_eq!(store.storage().attempts, 0);
        assert!(store.is_persistent());

        Ok(())
    }
}
