//! Cardápio
//!
//! Cardápio is the cart, checkout and pricing core of a digital menu for small food businesses:
//! customers browse a menu, customize products, build a cart, choose delivery and payment, and
//! submit an order that is relayed to the business.

pub mod basket;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod ids;
pub mod observability;
pub mod options;
pub mod orders;
pub mod prelude;
pub mod prices;
pub mod pricing;
pub mod products;
pub mod receipt;
pub mod storage;
pub mod store;
