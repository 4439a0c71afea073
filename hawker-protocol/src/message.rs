//! Request and reply envelopes.

use crate::error::RpcError;
use crate::types::{
    CheckoutRequest, CheckoutResponse, NodeStatus, PriceQuote, QuoteRequest, StatusRequest,
};
use minicbor::{Decode, Encode};

/// The first (and only) frame a client writes on a connection.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
#[cbor(map)]
pub struct RequestEnvelope {
    /// Protocol version; see [`crate::PROTOCOL_VERSION`].
    #[n(0)]
    pub version: u32,
    /// Request id propagated from the edge, if any.
    #[n(1)]
    pub request_id: Option<String>,
    /// Relative call deadline in milliseconds; servers enforce it when set.
    #[n(2)]
    pub timeout_ms: Option<u64>,
    #[n(3)]
    pub call: CallRequest,
}

/// The method being invoked, with its argument.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub enum CallRequest {
    /// `VendorBackend.GetQuote` — unary.
    #[n(0)]
    GetQuote(#[n(0)] QuoteRequest),
    /// `VendorPricing.StreamQuotes` — server stream.
    #[n(1)]
    StreamQuotes(#[n(0)] QuoteRequest),
    /// `Checkout.Start` — unary.
    #[n(2)]
    StartCheckout(#[n(0)] StartCheckout),
    /// `Checkout.GetStatus` — server stream.
    #[n(3)]
    WatchStatus(#[n(0)] StatusRequest),
}

impl CallRequest {
    pub fn method_name(&self) -> &'static str {
        match self {
            CallRequest::GetQuote(_) => "GetQuote",
            CallRequest::StreamQuotes(_) => "StreamQuotes",
            CallRequest::StartCheckout(_) => "StartCheckout",
            CallRequest::WatchStatus(_) => "WatchStatus",
        }
    }
}

/// Argument of `Checkout.Start`: the order plus the opaque idempotency key
/// the edge received, forwarded verbatim.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
#[cbor(map)]
pub struct StartCheckout {
    #[n(0)]
    pub request: CheckoutRequest,
    #[n(1)]
    pub idempotency_key: Option<String>,
}

/// One streamed result item.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub enum Reply {
    #[n(0)]
    Quote(#[n(0)] PriceQuote),
    #[n(1)]
    Checkout(#[n(0)] CheckoutResponse),
    #[n(2)]
    Status(#[n(0)] NodeStatus),
}

/// Frames a server writes back. A call ends with exactly one `Complete` or
/// `Error` frame.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub enum ReplyFrame {
    #[n(0)]
    Item(#[n(0)] Reply),
    #[n(1)]
    Complete,
    #[n(2)]
    Error(#[n(0)] RpcError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StatusCode;
    use crate::types::{CheckoutItem, Money, NodeId, NodeState};
    use crate::PROTOCOL_VERSION;

    fn roundtrip<T>(value: &T) -> T
    where
        T: minicbor::Encode<()> + for<'b> minicbor::Decode<'b, ()>,
    {
        let bytes = minicbor::to_vec(value).unwrap();
        minicbor::decode(&bytes).unwrap()
    }

    #[test]
    fn request_envelope_roundtrip() {
        let env = RequestEnvelope {
            version: PROTOCOL_VERSION,
            request_id: Some("req-1".into()),
            timeout_ms: Some(1500),
            call: CallRequest::StreamQuotes(QuoteRequest {
                product_id: "sku-7".into(),
                quantity: 2,
                currency_code: "USD".into(),
            }),
        };
        assert_eq!(roundtrip(&env), env);
    }

    #[test]
    fn start_checkout_roundtrip() {
        let env = RequestEnvelope {
            version: PROTOCOL_VERSION,
            request_id: None,
            timeout_ms: Some(2000),
            call: CallRequest::StartCheckout(StartCheckout {
                request: CheckoutRequest {
                    customer_id: "c1".into(),
                    items: vec![CheckoutItem {
                        product_id: "sku-laptop".into(),
                        quantity: 1,
                        unit_price: Money::new("USD", 89_900),
                        vendor_id: "amz".into(),
                    }],
                    shipping_address: "1 Main St".into(),
                    payment_method_id: "pm-card-123".into(),
                },
                idempotency_key: Some("idem-9".into()),
            }),
        };
        assert_eq!(roundtrip(&env), env);
    }

    #[test]
    fn reply_frames_roundtrip() {
        let frames = vec![
            ReplyFrame::Item(Reply::Status(NodeStatus {
                node_id: NodeId::Pay,
                state: NodeState::Failed,
                message: "Payment failed after retries".into(),
                timestamp_ms: 1,
                error_code: Some("PAYMENT_FAILED".into()),
                error_message: Some("gateway error".into()),
            })),
            ReplyFrame::Complete,
            ReplyFrame::Error(RpcError::new(StatusCode::NotFound, "no such checkout")),
        ];
        for frame in frames {
            assert_eq!(roundtrip(&frame), frame);
        }
    }

    #[test]
    fn optional_envelope_fields_are_omitted_when_none() {
        let sparse = RequestEnvelope {
            version: PROTOCOL_VERSION,
            request_id: None,
            timeout_ms: None,
            call: CallRequest::WatchStatus(StatusRequest {
                checkout_id: "checkout-1-1".into(),
            }),
        };
        let full = RequestEnvelope {
            request_id: Some("r".into()),
            timeout_ms: Some(1),
            ..sparse.clone()
        };
        let sparse_len = minicbor::to_vec(&sparse).unwrap().len();
        let full_len = minicbor::to_vec(&full).unwrap().len();
        assert!(sparse_len < full_len);
        assert_eq!(roundtrip(&sparse), sparse);
    }
}
