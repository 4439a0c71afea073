//! Shared gateway state.

use crate::config::EdgeConfig;
use crate::limit::TokenBucket;
use hawker_protocol::{CheckoutClient, PricingClient};

/// State shared across request handlers via axum's `State` extractor.
pub struct AppState {
    pub config: EdgeConfig,
    pub limiter: TokenBucket,
    pub pricing: PricingClient,
    pub checkout: CheckoutClient,
}

impl AppState {
    pub fn new(config: EdgeConfig) -> Self {
        let limiter = TokenBucket::new(config.rate_limit_enabled, config.rate_limit_qps);
        let pricing = PricingClient::new(config.pricing_addr.clone());
        let checkout = CheckoutClient::new(config.checkout_addr.clone());
        Self {
            config,
            limiter,
            pricing,
            checkout,
        }
    }
}
