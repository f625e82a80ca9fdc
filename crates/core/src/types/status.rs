//! Status enums for the checkout flow.

use serde::{Deserialize, Serialize};

/// Checkout attempt state.
///
/// `Idle → InvoiceRequested → AwaitingPayment → Settled`, with a failed
/// invoice request returning to `Idle` and an unload while a request or
/// payment is outstanding ending in `Abandoned`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutState {
    #[default]
    Idle,
    InvoiceRequested,
    AwaitingPayment,
    Settled,
    Abandoned,
}

impl CheckoutState {
    /// Whether no further transition can happen.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Settled | Self::Abandoned)
    }

    /// Whether moving to `next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::InvoiceRequested)
                | (
                    Self::InvoiceRequested,
                    Self::Idle | Self::AwaitingPayment | Self::Abandoned
                )
                | (Self::AwaitingPayment, Self::Settled | Self::Abandoned)
        )
    }
}

/// Result of a payment status check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Settled,
}

impl PaymentStatus {
    /// Map the backend's `paid` flag.
    #[must_use]
    pub const fn from_paid(paid: bool) -> Self {
        if paid { Self::Settled } else { Self::Pending }
    }
}
