//! Checkout Flow

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    basket::{CartSession, LineItemId},
    catalog::{Business, CatalogError, CatalogService},
    options::OptionSelection,
    orders::{OrderConfirmation, OrderPayload, OrderSubmissionService, SubmissionError, SubmittedOrder},
    prices::Price,
    products::{CatalogItem, ProductId},
    storage::SessionStorage,
    store::CartStore,
};

pub mod delivery;
pub mod errors;
pub mod payment;

pub use delivery::{
    CustomerInfo, DeliveryMode, DeliverySelection, MIN_PHONE_DIGITS, format_phone,
    normalize_phone, validate_customer,
};
pub use errors::{FlowError, ValidationError, ValidationErrors};
pub use payment::{
    PaymentKind, PaymentMethod, PaymentMethodId, PaymentSelection, default_payment_methods,
    parse_change_for,
};

/// Screens of the ordering journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    /// Browse the menu.
    Menu,

    /// Customize one product.
    Product,

    /// Review cart lines.
    Cart,

    /// Pickup or delivery, customer details.
    Delivery,

    /// Payment method and change.
    Payment,

    /// Review and confirm.
    Summary,

    /// Order placed.
    Success,
}

/// Gated steps in journey order. Product hangs off Menu and is gated separately.
const PATH: [CheckoutStep; 6] = [
    CheckoutStep::Menu,
    CheckoutStep::Cart,
    CheckoutStep::Delivery,
    CheckoutStep::Payment,
    CheckoutStep::Summary,
    CheckoutStep::Success,
];

impl CheckoutStep {
    /// Step a back action leads to.
    pub fn previous(self) -> Self {
        match self {
            CheckoutStep::Menu | CheckoutStep::Product | CheckoutStep::Cart => CheckoutStep::Menu,
            CheckoutStep::Delivery => CheckoutStep::Cart,
            CheckoutStep::Payment => CheckoutStep::Delivery,
            CheckoutStep::Summary => CheckoutStep::Payment,
            CheckoutStep::Success => CheckoutStep::Summary,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Submission {
    Idle,
    InFlight { total: Price },
}

/// Drives one customer through menu, cart and checkout for a single business.
///
/// The flow owns navigation state only; cart contents live in the [`CartStore`]
/// passed to each call.
#[derive(Debug, Clone)]
pub struct CheckoutFlow {
    business: Business,
    step: CheckoutStep,
    product: Option<CatalogItem>,
    terms_accepted: bool,
    submission: Submission,
    confirmation: Option<OrderConfirmation>,
}

impl CheckoutFlow {
    /// Flow for an already resolved business, starting on the menu.
    pub fn new(business: Business) -> Self {
        Self {
            business,
            step: CheckoutStep::Menu,
            product: None,
            terms_accepted: false,
            submission: Submission::Idle,
            confirmation: None,
        }
    }

    /// Resolves the tenant and binds the cart to it.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::Catalog`] when the slug does not resolve; check
    /// [`FlowError::is_not_found`] to show the not-found page.
    #[tracing::instrument(name = "checkout.start", skip(catalog, store), err)]
    pub async fn start<C, S>(
        catalog: &C,
        slug: &str,
        store: &mut CartStore<S>,
    ) -> Result<Self, FlowError>
    where
        C: CatalogService,
        S: SessionStorage,
    {
        let business = catalog.business(slug).await?;

        if store.session().business_slug() != Some(business.slug.as_str()) {
            store.set_business_slug(business.slug.clone());
        }

        info!(business = %business.slug, "checkout started");

        Ok(Self::new(business))
    }

    /// Resolved tenant
    pub fn business(&self) -> &Business {
        &self.business
    }

    /// Step currently shown
    pub fn step(&self) -> CheckoutStep {
        self.step
    }

    /// Product open on the product step
    pub fn product(&self) -> Option<&CatalogItem> {
        self.product.as_ref()
    }

    /// Whether the summary terms checkbox is ticked
    pub fn terms_accepted(&self) -> bool {
        self.terms_accepted
    }

    /// Confirmation of the placed order, on the success step
    pub fn confirmation(&self) -> Option<&OrderConfirmation> {
        self.confirmation.as_ref()
    }

    /// Whether the confirm button should be enabled.
    pub fn confirm_enabled(&self) -> bool {
        self.step == CheckoutStep::Summary
            && self.terms_accepted
            && self.submission == Submission::Idle
    }

    /// Whether a submission is waiting for the order service.
    pub fn is_submitting(&self) -> bool {
        matches!(self.submission, Submission::InFlight { .. })
    }

    fn gate_passes(&self, step: CheckoutStep, session: &CartSession) -> bool {
        match step {
            CheckoutStep::Menu => true,
            CheckoutStep::Product => self.product.is_some(),
            CheckoutStep::Cart | CheckoutStep::Delivery => !session.is_empty(),
            CheckoutStep::Payment => session.delivery().is_complete(),
            CheckoutStep::Summary => session.payment().is_complete(),
            CheckoutStep::Success => self.confirmation.is_some(),
        }
    }

    /// Step that is actually shown when `requested` is asked for.
    fn resolve(&self, requested: CheckoutStep, session: &CartSession) -> CheckoutStep {
        match requested {
            CheckoutStep::Product if self.gate_passes(CheckoutStep::Product, session) => {
                CheckoutStep::Product
            }
            CheckoutStep::Product => CheckoutStep::Menu,
            CheckoutStep::Success if self.gate_passes(CheckoutStep::Success, session) => {
                CheckoutStep::Success
            }
            CheckoutStep::Success => self.resolve(CheckoutStep::Summary, session),
            _ => PATH
                .iter()
                .take_while(|step| **step != requested)
                .chain(std::iter::once(&requested))
                .find(|step| !self.gate_passes(**step, session))
                .map_or(requested, |failing| failing.previous()),
        }
    }

    /// Navigates to `requested`, or to the step before the first failing entry gate.
    /// Returns the step now shown.
    pub fn enter<S: SessionStorage>(
        &mut self,
        requested: CheckoutStep,
        store: &mut CartStore<S>,
    ) -> CheckoutStep {
        let step = self.resolve(requested, store.session());

        if step != requested {
            debug!(?requested, redirected = ?step, "entry gate failed");
        }

        if step == CheckoutStep::Delivery
            && store.session().delivery().mode.is_none()
            && let Some(mode) = self.business.default_delivery_mode()
        {
            store.set_delivery_type(mode);
        }

        self.step = step;

        step
    }

    /// Goes one step back without touching the cart.
    pub fn go_back(&mut self) -> CheckoutStep {
        self.step = self.step.previous();

        self.step
    }

    /// Opens a product for customization.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::Catalog`] when the product is missing or unavailable.
    #[tracing::instrument(name = "checkout.open_product", skip(self, catalog), fields(business = %self.business.slug), err)]
    pub async fn open_product<C: CatalogService>(
        &mut self,
        catalog: &C,
        id: &ProductId,
    ) -> Result<&CatalogItem, FlowError> {
        let product = catalog.product(&self.business.slug, id).await?;

        if !product.available {
            return Err(CatalogError::ProductNotFound {
                business: self.business.slug.clone(),
                product: id.clone(),
            }
            .into());
        }

        self.step = CheckoutStep::Product;

        Ok(self.product.insert(product))
    }

    /// Adds the customized product to the cart and returns to the menu.
    ///
    /// # Errors
    ///
    /// - [`FlowError::WrongStep`]: not on the product step.
    /// - [`FlowError::Validation`]: an option group is not satisfied.
    /// - [`FlowError::Selection`] / [`FlowError::Cart`]: the line cannot be added.
    pub fn add_to_cart<S: SessionStorage>(
        &mut self,
        selection: &OptionSelection<'_>,
        store: &mut CartStore<S>,
    ) -> Result<LineItemId, FlowError> {
        self.expect_step(CheckoutStep::Product, "add_to_cart")?;

        selection.validate().map_err(ValidationError::from)?;

        let id = store.add_item(selection.to_line_item_now()?)?;

        self.product = None;
        self.step = CheckoutStep::Menu;

        Ok(id)
    }

    /// Leaves the cart for the delivery step.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyCart`] when there is nothing to order.
    pub fn continue_from_cart<S: SessionStorage>(
        &mut self,
        store: &mut CartStore<S>,
    ) -> Result<CheckoutStep, FlowError> {
        self.expect_step(CheckoutStep::Cart, "continue_from_cart")?;

        if store.is_empty() {
            return Err(ValidationError::EmptyCart.into());
        }

        Ok(self.enter(CheckoutStep::Delivery, store))
    }

    /// Chooses pickup or delivery.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DeliveryModeUnavailable`] for a mode the business
    /// does not offer.
    pub fn choose_delivery_mode<S: SessionStorage>(
        &self,
        mode: DeliveryMode,
        store: &mut CartStore<S>,
    ) -> Result<(), FlowError> {
        if !self.business.offers(mode) {
            return Err(ValidationError::DeliveryModeUnavailable(mode).into());
        }

        store.set_delivery_type(mode);

        Ok(())
    }

    /// Saves the customer's details and moves on to payment.
    ///
    /// # Errors
    ///
    /// Returns every failing field; nothing is saved in that case.
    pub fn submit_delivery<S: SessionStorage>(
        &mut self,
        customer: CustomerInfo,
        store: &mut CartStore<S>,
    ) -> Result<CheckoutStep, FlowError> {
        self.expect_step(CheckoutStep::Delivery, "submit_delivery")?;

        let mode = store.session().delivery().mode;

        let mut errors = validate_customer(&customer, mode)
            .err()
            .unwrap_or_default()
            .into_iter()
            .collect::<smallvec::SmallVec<[ValidationError; 4]>>();

        if mode.is_none() {
            errors.insert(0, ValidationError::MissingDeliveryMode);
        }

        ValidationErrors::from_vec(errors)?;

        store.set_customer_info(customer);

        Ok(self.enter(CheckoutStep::Payment, store))
    }

    /// Chooses a payment method. A non-cash method forgets any change amount.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::WrongStep`] when not on the payment step.
    pub fn choose_payment_method<S: SessionStorage>(
        &self,
        method: PaymentMethod,
        store: &mut CartStore<S>,
    ) -> Result<(), FlowError> {
        self.expect_step(CheckoutStep::Payment, "choose_payment_method")?;

        if !method.is_cash() && store.session().payment().change_for.is_some() {
            store.set_payment_change_for(None);
        }

        store.set_payment_method(method);

        Ok(())
    }

    /// Records the change amount for cash, clears it otherwise, and moves on to the
    /// summary.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::MissingPaymentMethod`]: nothing chosen.
    /// - [`ValidationError::InvalidChangeFor`]: change text is not a positive amount.
    pub fn submit_payment<S: SessionStorage>(
        &mut self,
        change_for: &str,
        store: &mut CartStore<S>,
    ) -> Result<CheckoutStep, FlowError> {
        self.expect_step(CheckoutStep::Payment, "submit_payment")?;

        let payment = store.session().payment();

        payment.validate()?;

        let amount = if payment.method.as_ref().is_some_and(PaymentMethod::is_cash) {
            parse_change_for(change_for, store.session().currency())?
        } else {
            None
        };

        store.set_payment_change_for(amount);

        Ok(self.enter(CheckoutStep::Summary, store))
    }

    /// Ticks or unticks the terms checkbox.
    pub fn set_terms_accepted(&mut self, accepted: bool) {
        self.terms_accepted = accepted;
    }

    /// Builds the order and marks a submission as in flight.
    ///
    /// # Errors
    ///
    /// - [`FlowError::WrongStep`]: not on the summary step.
    /// - [`FlowError::SubmissionInProgress`]: a submission is already in flight.
    /// - [`ValidationError::TermsNotAccepted`]: the terms are not accepted.
    /// - [`FlowError::Validation`] / [`FlowError::Pricing`]: the order cannot be built.
    pub fn begin_submission<S: SessionStorage>(
        &mut self,
        store: &CartStore<S>,
    ) -> Result<OrderPayload, FlowError> {
        self.expect_step(CheckoutStep::Summary, "begin_submission")?;

        if self.is_submitting() {
            return Err(FlowError::SubmissionInProgress);
        }

        if !self.terms_accepted {
            return Err(ValidationError::TermsNotAccepted.into());
        }

        let payload = OrderPayload::build(store.session(), &self.business)?;

        self.submission = Submission::InFlight {
            total: payload.total,
        };

        debug!(total = %payload.total, items = payload.items.len(), "submitting order");

        Ok(payload)
    }

    /// Applies the order service's answer to an in-flight submission.
    ///
    /// On success the cart is cleared and the flow moves to the success step. On
    /// failure the cart is left intact and confirm is enabled again.
    ///
    /// # Errors
    ///
    /// - [`FlowError::NoSubmission`]: nothing is in flight.
    /// - [`FlowError::Submission`]: the service failed.
    pub fn finish_submission<S: SessionStorage>(
        &mut self,
        outcome: Result<SubmittedOrder, SubmissionError>,
        store: &mut CartStore<S>,
    ) -> Result<&OrderConfirmation, FlowError> {
        let Submission::InFlight { total } = self.submission else {
            return Err(FlowError::NoSubmission);
        };

        self.submission = Submission::Idle;

        let order = outcome.inspect_err(|error| {
            warn!(%error, "order submission failed");
        })?;

        info!(order_number = %order.order_number, %total, "order placed");

        store.clear_cart();

        self.terms_accepted = false;
        self.step = CheckoutStep::Success;

        Ok(self.confirmation.insert(OrderConfirmation {
            order_number: order.order_number,
            total,
            business_phone: self.business.phone.clone(),
        }))
    }

    /// Submits the order through `service`.
    ///
    /// # Errors
    ///
    /// See [`CheckoutFlow::begin_submission`] and [`CheckoutFlow::finish_submission`].
    #[tracing::instrument(name = "checkout.confirm_order", skip_all, fields(business = %self.business.slug), err)]
    pub async fn confirm_order<O, S>(
        &mut self,
        service: &O,
        store: &mut CartStore<S>,
    ) -> Result<&OrderConfirmation, FlowError>
    where
        O: OrderSubmissionService,
        S: SessionStorage,
    {
        let payload = self.begin_submission(store)?;

        let outcome = service.submit(&payload).await;

        self.finish_submission(outcome, store)
    }

    /// "New order": clears the cart and returns to the menu.
    pub fn start_over<S: SessionStorage>(&mut self, store: &mut CartStore<S>) -> CheckoutStep {
        store.clear_cart();

        self.product = None;
        self.terms_accepted = false;
        self.submission = Submission::Idle;
        self.confirmation = None;
        self.step = CheckoutStep::Menu;

        self.step
    }

    fn expect_step(&self, step: CheckoutStep, action: &'static str) -> Result<(), FlowError> {
        if self.step == step {
            Ok(())
        } else {
            Err(FlowError::WrongStep {
                action,
                step: self.step,
            })
        }
    }
}
