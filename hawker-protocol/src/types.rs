//! Domain message types shared across the RPC surface.

use minicbor::{Decode, Encode};

/// An amount of money in a single currency.
///
/// All pricing arithmetic stays in integer cents; conversion to decimal
/// dollars happens only at the JSON boundary in the edge bridge.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
#[cbor(map)]
pub struct Money {
    /// ISO 4217 code, e.g. `USD`.
    #[n(0)]
    pub currency_code: String,
    /// Signed amount in cents.
    #[n(1)]
    pub amount_cents: i64,
}

impl Money {
    pub fn new(currency_code: impl Into<String>, amount_cents: i64) -> Self {
        Self {
            currency_code: currency_code.into(),
            amount_cents,
        }
    }

    /// Decimal dollars for display. Never used for arithmetic.
    pub fn dollars(&self) -> f64 {
        self.amount_cents as f64 / 100.0
    }
}

/// A request for a price on one product.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
#[cbor(map)]
pub struct QuoteRequest {
    #[n(0)]
    pub product_id: String,
    #[n(1)]
    pub quantity: u32,
    #[n(2)]
    pub currency_code: String,
}

/// One vendor's priced offer for a product at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
#[cbor(map)]
pub struct PriceQuote {
    /// Slug of the vendor display name (lowercased, non-alphanumerics stripped).
    #[n(0)]
    pub vendor_id: String,
    #[n(1)]
    pub vendor_name: String,
    #[n(2)]
    pub product_id: String,
    #[n(3)]
    pub price: Money,
    /// Delivery estimate in days, in `[1, 7]`.
    #[n(4)]
    pub estimated_days: u32,
    /// Wall-clock milliseconds at emit.
    #[n(5)]
    pub timestamp_ms: i64,
}

/// One line of a checkout request.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
#[cbor(map)]
pub struct CheckoutItem {
    #[n(0)]
    pub product_id: String,
    #[n(1)]
    pub quantity: u32,
    #[n(2)]
    pub unit_price: Money,
    #[n(3)]
    pub vendor_id: String,
}

/// A full checkout order.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
#[cbor(map)]
pub struct CheckoutRequest {
    #[n(0)]
    pub customer_id: String,
    #[n(1)]
    pub items: Vec<CheckoutItem>,
    #[n(2)]
    pub shipping_address: String,
    #[n(3)]
    pub payment_method_id: String,
}

/// Reply to `Checkout.Start`.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
#[cbor(map)]
pub struct CheckoutResponse {
    #[n(0)]
    pub checkout_id: String,
    #[n(1)]
    pub status: CheckoutState,
    #[n(2)]
    pub message: String,
    #[n(3)]
    pub total_amount: Option<Money>,
}

/// Request for a checkout status stream.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
#[cbor(map)]
pub struct StatusRequest {
    #[n(0)]
    pub checkout_id: String,
}

/// Workflow node identifiers. The first five are forward nodes in fixed
/// order; `release` and `void` are compensations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Encode, Decode)]
#[cbor(index_only)]
pub enum NodeId {
    #[n(0)]
    Reserve,
    #[n(1)]
    Price,
    #[n(2)]
    Tax,
    #[n(3)]
    Pay,
    #[n(4)]
    Confirm,
    #[n(5)]
    Release,
    #[n(6)]
    Void,
}

impl NodeId {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeId::Reserve => "reserve",
            NodeId::Price => "price",
            NodeId::Tax => "tax",
            NodeId::Pay => "pay",
            NodeId::Confirm => "confirm",
            NodeId::Release => "release",
            NodeId::Void => "void",
        }
    }
}

/// Lifecycle state of one workflow node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
#[cbor(index_only)]
pub enum NodeState {
    #[n(0)]
    Pending,
    #[n(1)]
    Running,
    #[n(2)]
    Completed,
    #[n(3)]
    Failed,
    #[n(4)]
    Skipped,
}

impl NodeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeState::Pending => "PENDING",
            NodeState::Running => "RUNNING",
            NodeState::Completed => "COMPLETED",
            NodeState::Failed => "FAILED",
            NodeState::Skipped => "SKIPPED",
        }
    }
}

/// Overall state of a checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
#[cbor(index_only)]
pub enum CheckoutState {
    #[n(0)]
    Pending,
    #[n(1)]
    Completed,
    #[n(2)]
    Failed,
}

impl CheckoutState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutState::Pending => "PENDING",
            CheckoutState::Completed => "COMPLETED",
            CheckoutState::Failed => "FAILED",
        }
    }
}

/// One observation of a workflow node. Immutable once emitted; a node emits
/// several of these over its lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
#[cbor(map)]
pub struct NodeStatus {
    #[n(0)]
    pub node_id: NodeId,
    #[n(1)]
    pub state: NodeState,
    #[n(2)]
    pub message: String,
    #[n(3)]
    pub timestamp_ms: i64,
    #[n(4)]
    pub error_code: Option<String>,
    #[n(5)]
    pub error_message: Option<String>,
}

/// Stable 64-bit hash used wherever both sides must derive the same value
/// from a string (query-to-sku mapping, unknown-product pricing).
pub fn stable_hash(input: &str) -> u64 {
    xxhash_rust::xxh3::xxh3_64(input.as_bytes())
}

/// Derive a vendor id slug from a display name: lowercased with everything
/// outside `[a-z0-9]` stripped.
pub fn vendor_slug(display_name: &str) -> String {
    display_name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vendor_slug_strips_non_alphanumerics() {
        assert_eq!(vendor_slug("Fast Vendor"), "fastvendor");
        assert_eq!(vendor_slug("Acme-2 (EU)!"), "acme2eu");
        assert_eq!(vendor_slug("already"), "already");
    }

    #[test]
    fn stable_hash_is_deterministic() {
        assert_eq!(stable_hash("headphones"), stable_hash("headphones"));
        assert_ne!(stable_hash("headphones"), stable_hash("headphone"));
    }

    #[test]
    fn money_dollars_rendering() {
        assert_eq!(Money::new("USD", 89900).dollars(), 899.0);
        assert_eq!(Money::new("USD", 1999).dollars(), 19.99);
    }

    #[test]
    fn node_state_names_are_stable() {
        assert_eq!(NodeState::Completed.as_str(), "COMPLETED");
        assert_eq!(NodeId::Reserve.as_str(), "reserve");
        assert_eq!(CheckoutState::Pending.as_str(), "PENDING");
    }
}
