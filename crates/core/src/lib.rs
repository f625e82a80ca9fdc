//! ZapMarket Core - Shared types library.
//!
//! This crate provides the domain types used by the ZapMarket storefront:
//! cart line items, prices in sats, and the payment session tracked by checkout.
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids and prices, cart and payment types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
