//! Edge bridge.
//!
//! Terminates HTTP for browsers and translates to the RPC surface: a search
//! becomes a quote stream relayed as SSE events, a checkout POST becomes
//! `Checkout.Start`, and the checkout status page follows a live
//! `GetStatus` stream. Two cross-cutting layers apply to every request, in
//! order: request-id adoption/minting, then the token-bucket rate limit.

pub mod config;
pub mod dto;
pub mod error;
pub mod limit;
pub mod request_id;
pub mod routes;
pub mod state;

pub use config::EdgeConfig;
pub use error::GatewayError;
pub use state::AppState;

use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// The edge HTTP server.
pub struct GatewayServer {
    state: Arc<AppState>,
    router: Router,
}

impl GatewayServer {
    pub fn new(config: EdgeConfig) -> Self {
        let state = Arc::new(AppState::new(config));
        let router = routes::build_router(state.clone());
        Self { state, router }
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// The router, for in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub async fn run(self) -> std::io::Result<()> {
        let addr = format!("0.0.0.0:{}", self.state.config.port);
        let listener = TcpListener::bind(&addr).await?;
        info!(addr = %addr, "edge bridge listening");
        axum::serve(listener, self.router).await
    }
}
