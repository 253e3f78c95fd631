//! Cardápio prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    basket::{CartError, CartLineItem, CartSession, LineItemId},
    catalog::{Business, CatalogError, CatalogService, FixtureCatalog, Menu},
    checkout::{
        CheckoutFlow, CheckoutStep, CustomerInfo, DeliveryMode, FlowError, PaymentKind,
        PaymentMethod, ValidationError, ValidationErrors,
    },
    options::{OptionSelection, SelectedOption, SelectedValue},
    orders::{
        OrderConfirmation, OrderPayload, OrderSubmissionService, SubmissionError, SubmittedOrder,
    },
    prices::{Price, format_price, parse_price},
    products::{CatalogItem, OptionGroup, OptionValue, ProductId, SelectionMode},
    receipt::OrderSummary,
    storage::{FileStorage, MemoryStorage, SessionStorage},
    store::CartStore,
};
