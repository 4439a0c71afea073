//! Loopback tests for the framed RPC transport: a real TCP listener, a toy
//! service, and the typed clients.

use async_trait::async_trait;
use hawker_protocol::{
    read_frame, write_frame, CallContext, CallRequest, CheckoutClient, Money, PriceQuote,
    PricingClient, QuoteRequest, Reply, ReplyFrame, ReplySink, RequestEnvelope, RpcError,
    RpcServer, RpcService, StatusCode, VendorClient,
};
use std::time::Duration;
use tokio::net::TcpStream;

struct ToyService;

fn quote(vendor: &str, cents: i64) -> PriceQuote {
    PriceQuote {
        vendor_id: vendor.to_string(),
        vendor_name: vendor.to_string(),
        product_id: "sku-1".to_string(),
        price: Money::new("USD", cents),
        estimated_days: 2,
        timestamp_ms: 0,
    }
}

#[async_trait]
impl RpcService for ToyService {
    async fn call(
        &self,
        _ctx: CallContext,
        call: CallRequest,
        sink: ReplySink,
    ) -> Result<(), RpcError> {
        match call {
            CallRequest::GetQuote(req) => {
                if req.product_id == "sku-slow" {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
                let _ = sink.item(Reply::Quote(quote("toy", 100))).await;
                Ok(())
            }
            CallRequest::StreamQuotes(_) => {
                for (vendor, cents) in [("a", 100), ("b", 200), ("c", 300)] {
                    let _ = sink.item(Reply::Quote(quote(vendor, cents))).await;
                }
                Ok(())
            }
            CallRequest::WatchStatus(req) => {
                Err(RpcError::not_found(format!("unknown id {}", req.checkout_id)))
            }
            CallRequest::StartCheckout(_) => Err(RpcError::unimplemented("StartCheckout")),
        }
    }
}

async fn spawn_toy_server() -> String {
    let server = RpcServer::bind("127.0.0.1:0", ToyService).await.unwrap();
    let addr = server.local_addr().unwrap().to_string();
    tokio::spawn(server.run());
    addr
}

fn request(product_id: &str) -> QuoteRequest {
    QuoteRequest {
        product_id: product_id.to_string(),
        quantity: 1,
        currency_code: "USD".to_string(),
    }
}

#[tokio::test]
async fn unary_call_roundtrips() {
    let addr = spawn_toy_server().await;
    let client = VendorClient::new(addr);
    let got = client
        .get_quote(&request("sku-1"), Duration::from_secs(1), Some("req-x".into()))
        .await
        .unwrap();
    assert_eq!(got.vendor_id, "toy");
    assert_eq!(got.price.amount_cents, 100);
}

#[tokio::test]
async fn streaming_call_delivers_all_items_then_ends() {
    let addr = spawn_toy_server().await;
    let client = PricingClient::new(addr);
    let stream = client
        .stream_quotes(request("sku-1"), Duration::from_secs(1), None)
        .await
        .unwrap();
    let quotes = stream.collect().await.unwrap();
    assert_eq!(quotes.len(), 3);
    let vendors: Vec<_> = quotes.iter().map(|q| q.vendor_id.as_str()).collect();
    assert_eq!(vendors, ["a", "b", "c"]);
}

#[tokio::test]
async fn slow_server_hits_client_deadline() {
    let addr = spawn_toy_server().await;
    let client = VendorClient::new(addr);
    let err = client
        .get_quote(&request("sku-slow"), Duration::from_millis(200), None)
        .await
        .unwrap_err();
    assert!(err.is_deadline(), "expected deadline error, got {err}");
}

#[tokio::test]
async fn rpc_error_frames_surface_as_errors() {
    let addr = spawn_toy_server().await;
    let client = CheckoutClient::new(addr);
    let stream = client
        .watch_status("checkout-nope", Duration::from_secs(1), None)
        .await
        .unwrap();
    let err = stream.collect().await.unwrap_err();
    match err {
        hawker_protocol::ProtocolError::Rpc(e) => assert_eq!(e.code, StatusCode::NotFound),
        other => panic!("expected rpc error, got {other}"),
    }
}

#[tokio::test]
async fn version_mismatch_is_rejected() {
    let addr = spawn_toy_server().await;
    let mut stream = TcpStream::connect(&addr).await.unwrap();
    let env = RequestEnvelope {
        version: 999,
        request_id: None,
        timeout_ms: None,
        call: CallRequest::GetQuote(request("sku-1")),
    };
    write_frame(&mut stream, &env).await.unwrap();
    let frame: ReplyFrame = read_frame(&mut stream).await.unwrap().unwrap();
    match frame {
        ReplyFrame::Error(e) => assert_eq!(e.code, StatusCode::InvalidArgument),
        other => panic!("expected error frame, got {other:?}"),
    }
}
