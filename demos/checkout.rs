//! Walks one order through the menu, cart and checkout using the fixture catalog.
//!
//! ```sh
//! cargo run --example checkout -- --business confeitaria-doce-mel
//! ```

use std::{cell::Cell, io};

use anyhow::Context;
use cardapio::{
    config::StorefrontConfig,
    observability::init_logging,
    prelude::*,
    products::{OptionGroupId, OptionValueId},
};
use tracing::info;

/// Order backend that accepts everything and numbers orders sequentially.
#[derive(Debug)]
struct CountingOrderService {
    next: Cell<u32>,
}

impl OrderSubmissionService for CountingOrderService {
    async fn submit(&self, order: &OrderPayload) -> Result<SubmittedOrder, SubmissionError> {
        let number = self.next.get();

        self.next.set(number.saturating_add(1));

        info!(
            business = %order.business_slug,
            total = %order.total,
            "order received"
        );

        Ok(SubmittedOrder {
            order_number: number.to_string(),
        })
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = StorefrontConfig::load()?;

    init_logging(&config.logging)?;

    let catalog = config.fixture_catalog();
    let mut store = config.open_store();

    let mut flow = CheckoutFlow::start(&catalog, &config.catalog.business, &mut store)
        .await
        .context("opening the business")?;

    let menu = catalog.menu(&flow.business().slug).await?;

    info!(
        business = %flow.business().name,
        items = menu.items().len(),
        categories = ?menu.categories(),
        "menu loaded"
    );

    // Two large cakes with strawberries
    let bolo = flow.open_product(&catalog, &"bolo-de-pote".into()).await?.clone();
    let mut selection = OptionSelection::new(&bolo);

    selection.toggle(&OptionGroupId::from("tamanho"), &OptionValueId::from("grande"));
    selection.toggle(&OptionGroupId::from("adicionais"), &OptionValueId::from("morango"));
    selection.set_quantity(2);
    selection.set_notes("pouco açúcar");

    flow.add_to_cart(&selection, &mut store)?;

    // One box of brigadeiros with the default flavour
    let brigadeiro = flow
        .open_product(&catalog, &"brigadeiro-gourmet".into())
        .await?
        .clone();

    flow.add_to_cart(&OptionSelection::new(&brigadeiro), &mut store)?;

    info!(items = store.item_count(), subtotal = %store.subtotal()?, "cart ready");

    flow.enter(CheckoutStep::Cart, &mut store);
    flow.continue_from_cart(&mut store)?;

    flow.submit_delivery(
        CustomerInfo::new("Maria Silva", "11988887777").with_address("Rua Vergueiro, 1000 - ap 12"),
        &mut store,
    )?;

    let methods = catalog.payment_methods(&flow.business().slug).await?;
    let cash = methods
        .into_iter()
        .find(PaymentMethod::is_cash)
        .unwrap_or_else(|| PaymentMethod::new("cash", "Dinheiro", PaymentKind::Cash));

    flow.choose_payment_method(cash, &mut store)?;
    flow.submit_payment("100", &mut store)?;

    let payload = OrderPayload::build(store.session(), flow.business())?;

    OrderSummary::new(&payload).write_to(io::stdout().lock())?;

    flow.set_terms_accepted(true);

    let service = CountingOrderService { next: Cell::new(1042) };
    let confirmation = flow.confirm_order(&service, &mut store).await?;

    info!(
        order_number = %confirmation.order_number,
        total = %confirmation.total,
        follow_up = confirmation.follow_up_link().as_deref().unwrap_or("-"),
        "order placed"
    );

    flow.start_over(&mut store);

    Ok(())
}
