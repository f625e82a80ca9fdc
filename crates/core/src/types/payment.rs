//! Payment session produced by invoice creation.

use serde::{Deserialize, Serialize};

use super::{PaymentHash, Sats};

/// The identifier/request pair tracked by checkout until settlement.
///
/// `amount_sats` and `expires_at` are filled in when the backend reports them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSession {
    pub payment_hash: PaymentHash,
    /// Opaque payment string shown to the user (a BOLT11 invoice).
    pub payment_request: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_sats: Option<Sats>,
    /// Invoice expiry in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
}
