//! Cart sessions written to disk and read back by a fresh store.

use std::{fs, path::Path};

use rusty_money::{Money, iso::BRL};
use serde_json::{Value, json};
use tempfile::tempdir;
use testresult::TestResult;

use cardapio::{
    checkout::PaymentSelection,
    prelude::*,
    products::{OptionGroupId, OptionValueId},
    storage::STORAGE_KEY,
};

fn catalog() -> FixtureCatalog {
    FixtureCatalog::with_base_path(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures"))
}

async fn populate<S: SessionStorage>(store: &mut CartStore<S>) -> TestResult {
    let catalog = catalog();
    let bolo = catalog
        .product("confeitaria-doce-mel", &"bolo-de-pote".into())
        .await?;

    let mut selection = OptionSelection::new(&bolo);

    selection.toggle(&OptionGroupId::from("adicionais"), &OptionValueId::from("nutella"));
    selection.set_notes("sem granulado");

    store.set_business_slug("confeitaria-doce-mel");
    store.add_item(selection.to_line_item_now()?)?;
    store.set_delivery_type(DeliveryMode::Delivery);
    store.set_customer_info(
        CustomerInfo::new("Ana Souza", "11988887777").with_address("Rua Vergueiro, 1000"),
    );
    store.set_payment_method(PaymentMethod::new("dinheiro", "Dinheiro", PaymentKind::Cash));
    store.set_payment_change_for(Some(Money::from_minor(5000, BRL)));

    Ok(())
}

#[tokio::test]
async fn reopened_store_restores_an_equal_session() -> TestResult {
    let dir = tempdir()?;

    let mut store = CartStore::open(FileStorage::new(dir.path()));

    populate(&mut store).await?;

    let saved = store.session().clone();

    drop(store);

    let reopened = CartStore::open(FileStorage::new(dir.path()));

    assert_eq!(reopened.session(), &saved);
    assert_eq!(reopened.subtotal()?, Money::from_minor(2400, BRL));
    assert_eq!(
        reopened.session().payment(),
        &PaymentSelection {
            method: Some(PaymentMethod::new("dinheiro", "Dinheiro", PaymentKind::Cash)),
            change_for: Some(Money::from_minor(5000, BRL)),
        }
    );

    Ok(())
}

#[tokio::test]
async fn cleared_cart_is_persisted_too() -> TestResult {
    let dir = tempdir()?;

    let mut store = CartStore::open(FileStorage::new(dir.path()));

    populate(&mut store).await?;
    store.clear_cart();

    let reopened = CartStore::open(FileStorage::new(dir.path()));

    assert!(reopened.is_empty());
    assert_eq!(
        reopened.session().business_slug(),
        Some("confeitaria-doce-mel")
    );

    Ok(())
}

/// Rewrites fields of the stored envelope in place, keeping its version.
fn tamper(dir: &Path, edits: &[(&str, Value)]) -> TestResult {
    let path = dir.join(format!("{STORAGE_KEY}.json"));
    let mut envelope: Value = serde_json::from_str(&fs::read_to_string(&path)?)?;

    for (pointer, value) in edits {
        let field = envelope
            .pointer_mut(pointer)
            .ok_or_else(|| format!("no field at {pointer}"))?;

        *field = value.clone();
    }

    fs::write(&path, serde_json::to_string(&envelope)?)?;

    Ok(())
}

#[tokio::test]
async fn stored_line_with_zero_quantity_is_discarded() -> TestResult {
    let dir = tempdir()?;

    let mut store = CartStore::open(FileStorage::new(dir.path()));

    populate(&mut store).await?;
    drop(store);

    tamper(
        dir.path(),
        &[
            ("/session/items/0/quantity", json!(0)),
            ("/session/items/0/total_price", json!("999.00 BRL")),
        ],
    )?;

    let reopened = CartStore::open(FileStorage::new(dir.path()));

    assert!(reopened.is_empty());
    assert_eq!(reopened.item_count(), 0);
    assert_eq!(reopened.subtotal()?, Money::from_minor(0, BRL));

    Ok(())
}

#[tokio::test]
async fn stored_line_with_stale_total_is_discarded() -> TestResult {
    let dir = tempdir()?;

    let mut store = CartStore::open(FileStorage::new(dir.path()));

    populate(&mut store).await?;
    drop(store);

    tamper(
        dir.path(),
        &[("/session/items/0/total_price", json!("1.00 BRL"))],
    )?;

    assert_eq!(
        CartStore::open(FileStorage::new(dir.path())).session(),
        &CartSession::default()
    );

    Ok(())
}

#[tokio::test]
async fn stored_line_in_another_currency_is_discarded() -> TestResult {
    let dir = tempdir()?;

    let mut store = CartStore::open(FileStorage::new(dir.path()));

    populate(&mut store).await?;
    drop(store);

    tamper(
        dir.path(),
        &[
            ("/session/items/0/catalog_item/price", json!("4.00 USD")),
            ("/session/items/0/total_price", json!("4.00 USD")),
        ],
    )?;

    let reopened = CartStore::open(FileStorage::new(dir.path()));

    assert!(reopened.is_empty());
    assert!(reopened.subtotal().is_ok());

    Ok(())
}

#[test]
fn stored_session_from_another_version_is_discarded() -> TestResult {
    let dir = tempdir()?;

    fs::write(
        dir.path().join(format!("{STORAGE_KEY}.json")),
        r#"{"version":0,"session":{"items":[]}}"#,
    )?;

    let store = CartStore::open(FileStorage::new(dir.path()));

    assert!(store.is_empty());
    assert_eq!(store.session().business_slug(), None);
    assert!(store.is_persistent());

    Ok(())
}

#[test]
fn corrupted_storage_starts_empty() -> TestResult {
    let dir = tempdir()?;

    fs::write(dir.path().join(format!("{STORAGE_KEY}.json")), "{\"version\":1,")?;

    let store = CartStore::open(FileStorage::new(dir.path()));

    assert_eq!(store.session(), &CartSession::default());

    Ok(())
}

#[test]
fn missing_directory_starts_empty_and_creates_it_on_write() -> TestResult {
    let dir = tempdir()?;
    let nested = dir.path().join("cardapio").join("sessions");

    let mut store = CartStore::open(FileStorage::new(&nested));

    assert!(store.is_empty());

    store.set_business_slug("confeitaria-doce-mel");

    assert!(nested.join(format!("{STORAGE_KEY}.json")).exists());

    Ok(())
}
