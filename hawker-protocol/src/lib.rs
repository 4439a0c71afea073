//! Wire contract for the hawker services.
//!
//! This crate defines the RPC surface shared by every hawker process:
//!
//! - `VendorBackend.GetQuote(QuoteRequest) -> PriceQuote`
//! - `VendorPricing.StreamQuotes(QuoteRequest) -> stream PriceQuote`
//! - `Checkout.Start(CheckoutRequest) -> CheckoutResponse`
//! - `Checkout.GetStatus(StatusRequest) -> stream NodeStatus`
//!
//! # Wire format
//!
//! Every message travels as a length-prefixed frame: a big-endian `u32` byte
//! count followed by a CBOR body. Structs encode as integer-keyed maps and
//! enums carry explicit variant indices, so fields can be added without
//! breaking older readers. The integer tags are the compatibility contract —
//! they MUST NOT be reassigned across versions.
//!
//! A connection carries exactly one call: the client writes a
//! [`RequestEnvelope`], then reads [`ReplyFrame`]s until `Complete` or
//! `Error`. Unary calls are streams with a single `Item`. Cancellation is
//! connection teardown — the server notices EOF and abandons the call.

mod client;
mod error;
mod frame;
mod message;
mod server;
mod types;

pub use client::{CheckoutClient, PricingClient, QuoteStream, StatusStream, VendorClient};
pub use error::{ProtocolError, RpcError, StatusCode};
pub use frame::{read_frame, write_frame, MAX_FRAME_BYTES};
pub use message::{CallRequest, Reply, ReplyFrame, RequestEnvelope, StartCheckout};
pub use server::{CallContext, ReplySink, RpcServer, RpcService};
pub use types::{
    stable_hash, vendor_slug, CheckoutItem, CheckoutRequest, CheckoutResponse, CheckoutState,
    Money, NodeId, NodeState, NodeStatus, PriceQuote, QuoteRequest, StatusRequest,
};

/// Protocol version carried in every request envelope.
pub const PROTOCOL_VERSION: u32 = 1;

/// Metadata key the edge propagates request ids under (HTTP header form).
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";
