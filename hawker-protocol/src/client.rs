//! Typed RPC clients.
//!
//! Each call opens its own connection, writes the request envelope, and
//! reads reply frames until completion. Dropping a stream mid-call closes
//! the connection, which the server observes as cancellation.

use crate::error::ProtocolError;
use crate::frame::{read_frame, write_frame};
use crate::message::{CallRequest, Reply, ReplyFrame, RequestEnvelope, StartCheckout};
use crate::types::{CheckoutRequest, CheckoutResponse, NodeStatus, PriceQuote, QuoteRequest, StatusRequest};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{timeout_at, Instant};

fn envelope(call: CallRequest, deadline: Duration, request_id: Option<String>) -> RequestEnvelope {
    RequestEnvelope {
        version: crate::PROTOCOL_VERSION,
        request_id,
        timeout_ms: Some(deadline.as_millis() as u64),
        call,
    }
}

async fn open_call(addr: &str, env: &RequestEnvelope) -> Result<TcpStream, ProtocolError> {
    let mut stream = TcpStream::connect(addr).await?;
    stream.set_nodelay(true).ok();
    write_frame(&mut stream, env).await?;
    Ok(stream)
}

/// A live server-stream with an absolute deadline covering every read.
struct ReplyStream {
    stream: TcpStream,
    deadline: Instant,
}

impl ReplyStream {
    async fn next_frame(&mut self) -> Result<Option<Reply>, ProtocolError> {
        match timeout_at(self.deadline, read_frame::<_, ReplyFrame>(&mut self.stream)).await {
            Err(_) => Err(ProtocolError::DeadlineExceeded),
            Ok(Ok(Some(ReplyFrame::Item(reply)))) => Ok(Some(reply)),
            Ok(Ok(Some(ReplyFrame::Complete))) => Ok(None),
            Ok(Ok(Some(ReplyFrame::Error(e)))) => Err(e.into()),
            // EOF without a terminal frame: the server went away. Treat as a
            // clean end — partial results already delivered remain valid.
            Ok(Ok(None)) => Ok(None),
            Ok(Err(e)) => Err(e),
        }
    }
}

/// Client for `VendorBackend.GetQuote`.
#[derive(Debug, Clone)]
pub struct VendorClient {
    addr: String,
}

impl VendorClient {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    pub async fn get_quote(
        &self,
        request: &QuoteRequest,
        deadline: Duration,
        request_id: Option<String>,
    ) -> Result<PriceQuote, ProtocolError> {
        let at = Instant::now() + deadline;
        let env = envelope(CallRequest::GetQuote(request.clone()), deadline, request_id);
        timeout_at(at, async {
            let stream = open_call(&self.addr, &env).await?;
            let mut replies = ReplyStream {
                stream,
                deadline: at,
            };
            match replies.next_frame().await? {
                Some(Reply::Quote(quote)) => Ok(quote),
                Some(_) => Err(ProtocolError::UnexpectedReply("GetQuote")),
                None => Err(ProtocolError::Closed),
            }
        })
        .await
        .map_err(|_| ProtocolError::DeadlineExceeded)?
    }
}

/// Client for `VendorPricing.StreamQuotes`.
#[derive(Debug, Clone)]
pub struct PricingClient {
    addr: String,
}

impl PricingClient {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    pub async fn stream_quotes(
        &self,
        request: QuoteRequest,
        deadline: Duration,
        request_id: Option<String>,
    ) -> Result<QuoteStream, ProtocolError> {
        let at = Instant::now() + deadline;
        let env = envelope(CallRequest::StreamQuotes(request), deadline, request_id);
        let stream = timeout_at(at, open_call(&self.addr, &env))
            .await
            .map_err(|_| ProtocolError::DeadlineExceeded)??;
        Ok(QuoteStream {
            inner: ReplyStream {
                stream,
                deadline: at,
            },
        })
    }
}

/// Server-streamed price quotes, emitted in completion order.
pub struct QuoteStream {
    inner: ReplyStream,
}

impl QuoteStream {
    /// Next quote; `Ok(None)` when the upstream closed the stream.
    pub async fn next(&mut self) -> Result<Option<PriceQuote>, ProtocolError> {
        match self.inner.next_frame().await? {
            Some(Reply::Quote(quote)) => Ok(Some(quote)),
            Some(_) => Err(ProtocolError::UnexpectedReply("StreamQuotes")),
            None => Ok(None),
        }
    }

    /// Drain the stream into a vector.
    pub async fn collect(mut self) -> Result<Vec<PriceQuote>, ProtocolError> {
        let mut quotes = Vec::new();
        while let Some(quote) = self.next().await? {
            quotes.push(quote);
        }
        Ok(quotes)
    }
}

/// Client for the `Checkout` service.
#[derive(Debug, Clone)]
pub struct CheckoutClient {
    addr: String,
}

impl CheckoutClient {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    pub async fn start(
        &self,
        request: CheckoutRequest,
        idempotency_key: Option<String>,
        deadline: Duration,
        request_id: Option<String>,
    ) -> Result<CheckoutResponse, ProtocolError> {
        let at = Instant::now() + deadline;
        let env = envelope(
            CallRequest::StartCheckout(StartCheckout {
                request,
                idempotency_key,
            }),
            deadline,
            request_id,
        );
        timeout_at(at, async {
            let stream = open_call(&self.addr, &env).await?;
            let mut replies = ReplyStream {
                stream,
                deadline: at,
            };
            match replies.next_frame().await? {
                Some(Reply::Checkout(response)) => Ok(response),
                Some(_) => Err(ProtocolError::UnexpectedReply("StartCheckout")),
                None => Err(ProtocolError::Closed),
            }
        })
        .await
        .map_err(|_| ProtocolError::DeadlineExceeded)?
    }

    pub async fn watch_status(
        &self,
        checkout_id: &str,
        deadline: Duration,
        request_id: Option<String>,
    ) -> Result<StatusStream, ProtocolError> {
        let at = Instant::now() + deadline;
        let env = envelope(
            CallRequest::WatchStatus(StatusRequest {
                checkout_id: checkout_id.to_string(),
            }),
            deadline,
            request_id,
        );
        let stream = timeout_at(at, open_call(&self.addr, &env))
            .await
            .map_err(|_| ProtocolError::DeadlineExceeded)??;
        Ok(StatusStream {
            inner: ReplyStream {
                stream,
                deadline: at,
            },
        })
    }
}

/// Server-streamed workflow node statuses: full history replay followed by
/// the live tail.
pub struct StatusStream {
    inner: ReplyStream,
}

impl StatusStream {
    pub async fn next(&mut self) -> Result<Option<NodeStatus>, ProtocolError> {
        match self.inner.next_frame().await? {
            Some(Reply::Status(status)) => Ok(Some(status)),
            Some(_) => Err(ProtocolError::UnexpectedReply("WatchStatus")),
            None => Ok(None),
        }
    }

    pub async fn collect(mut self) -> Result<Vec<NodeStatus>, ProtocolError> {
        let mut events = Vec::new();
        while let Some(status) = self.next().await? {
            events.push(status);
        }
        Ok(events)
    }
}
