//! ZapMarket storefront page behaviour.
//!
//! Drives three pages of a Lightning-paid shop through a [`page::Page`]:
//!
//! - [`cart::CartStore`] - persisted cart, count badge, slide-out drawer
//! - [`checkout::CheckoutController`] - invoice request and payment polling
//! - [`product::ProductDetail`] - quantity stepper, gallery, tabs, add to cart
//!
//! [`state::Storefront`] builds all three from a [`config::StorefrontConfig`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod page;
pub mod product;
pub mod state;
pub mod storage;
pub mod telemetry;
pub mod timer;
