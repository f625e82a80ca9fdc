//! Core types for ZapMarket.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod id;
pub mod payment;
pub mod price;
pub mod status;

pub use cart::{LineItem, NewLineItem};
pub use id::*;
pub use payment::PaymentSession;
pub use price::{ParseSatsError, Sats};
pub use status::*;
