//! RPC server plumbing: accept loop, per-connection dispatch, single-writer
//! reply funnel.

use crate::error::{ProtocolError, RpcError, StatusCode};
use crate::frame::{read_frame, write_frame};
use crate::message::{CallRequest, Reply, ReplyFrame, RequestEnvelope};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// Per-call metadata handed to the service.
#[derive(Debug, Clone)]
pub struct CallContext {
    pub peer: SocketAddr,
    pub request_id: Option<String>,
    pub timeout: Option<Duration>,
}

/// Handle for emitting stream items. All frames funnel through one writer
/// task, so concurrent senders never interleave bytes on the wire.
#[derive(Clone)]
pub struct ReplySink {
    tx: mpsc::Sender<ReplyFrame>,
}

impl ReplySink {
    pub async fn item(&self, reply: Reply) -> Result<(), ProtocolError> {
        self.tx
            .send(ReplyFrame::Item(reply))
            .await
            .map_err(|_| ProtocolError::Closed)
    }

    /// True once the call is torn down (client gone or call finished).
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Resolves when the call is torn down. Useful for racing long
    /// operations against client cancellation.
    pub async fn closed(&self) {
        self.tx.closed().await
    }
}

/// A service able to answer calls from the shared RPC surface. Methods a
/// process does not serve should return [`RpcError::unimplemented`].
#[async_trait]
pub trait RpcService: Send + Sync + 'static {
    async fn call(
        &self,
        ctx: CallContext,
        call: CallRequest,
        sink: ReplySink,
    ) -> Result<(), RpcError>;
}

/// TCP server for one [`RpcService`].
pub struct RpcServer<S> {
    listener: TcpListener,
    service: Arc<S>,
}

impl<S: RpcService> RpcServer<S> {
    pub async fn bind(addr: &str, service: S) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            service: Arc::new(service),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn service(&self) -> &Arc<S> {
        &self.service
    }

    /// Accept connections until the surrounding task is dropped.
    pub async fn run(self) -> std::io::Result<()> {
        loop {
            let (stream, peer) = self.listener.accept().await?;
            let service = self.service.clone();
            tokio::spawn(async move {
                if let Err(e) = handle_connection(service, stream, peer).await {
                    tracing::debug!(%peer, error = %e, "connection ended with error");
                }
            });
        }
    }
}

async fn handle_connection<S: RpcService>(
    service: Arc<S>,
    stream: TcpStream,
    peer: SocketAddr,
) -> Result<(), ProtocolError> {
    stream.set_nodelay(true).ok();
    let (mut read_half, mut write_half) = stream.into_split();

    let envelope: RequestEnvelope = match read_frame(&mut read_half).await? {
        Some(envelope) => envelope,
        // Connected and went away without a request.
        None => return Ok(()),
    };

    let (tx, mut rx) = mpsc::channel::<ReplyFrame>(64);

    // Single writer: every reply frame for this call goes through here.
    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if let Err(e) = write_frame(&mut write_half, &frame).await {
                tracing::debug!(error = %e, "reply write failed, dropping remaining frames");
                break;
            }
        }
    });

    if envelope.version != crate::PROTOCOL_VERSION {
        let _ = tx
            .send(ReplyFrame::Error(RpcError::invalid_argument(format!(
                "unsupported protocol version {}",
                envelope.version
            ))))
            .await;
        drop(tx);
        let _ = writer.await;
        return Ok(());
    }

    let method = envelope.call.method_name();
    let timeout = envelope.timeout_ms.map(Duration::from_millis);
    let ctx = CallContext {
        peer,
        request_id: envelope.request_id.clone(),
        timeout,
    };
    let sink = ReplySink { tx: tx.clone() };

    let service_fut = async {
        match timeout {
            Some(t) => match tokio::time::timeout(t, service.call(ctx, envelope.call, sink)).await {
                Ok(result) => result,
                Err(_) => Err(RpcError::new(
                    StatusCode::DeadlineExceeded,
                    format!("{method} deadline exceeded"),
                )),
            },
            None => service.call(ctx, envelope.call, sink).await,
        }
    };

    let cancelled = tokio::select! {
        result = service_fut => {
            let last = match result {
                Ok(()) => ReplyFrame::Complete,
                Err(e) => {
                    tracing::debug!(method, code = e.code.as_str(), error = %e.message, "call failed");
                    ReplyFrame::Error(e)
                }
            };
            let _ = tx.send(last).await;
            false
        }
        _ = client_gone(&mut read_half) => {
            tracing::debug!(method, %peer, "client disconnected, call cancelled");
            true
        }
    };

    drop(tx);
    if cancelled {
        // Tear down the writer so every surviving sink clone observes
        // closure and abandons its in-flight work.
        writer.abort();
    } else {
        let _ = writer.await;
    }
    Ok(())
}

/// Resolves when the peer hangs up. Clients write nothing after the request
/// envelope, so any read completion of zero bytes means the call is dead.
async fn client_gone(read_half: &mut OwnedReadHalf) {
    let mut scratch = [0u8; 16];
    loop {
        match read_half.read(&mut scratch).await {
            Ok(0) | Err(_) => return,
            // Stray bytes after the envelope are not part of the protocol;
            // keep draining until the peer closes.
            Ok(_) => continue,
        }
    }
}
