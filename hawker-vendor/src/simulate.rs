//! Latency and quote generation.

use crate::catalog::base_price_cents;
use hawker_protocol::{Money, PriceQuote, QuoteRequest};
use rand::Rng;
use std::time::{SystemTime, UNIX_EPOCH};

/// Hard cap on a simulated vendor response. The cap biases the tail of the
/// distribution; that bias is intentional and documented here rather than
/// removed.
pub const LATENCY_CAP_MS: u64 = 500;

/// Base processing time added to every draw.
pub const LATENCY_BASE_MS: u64 = 20;

/// Mean of the exponential component. Yields p50 around 75 ms and p95
/// around 260 ms before the cap.
const LATENCY_MEAN_MS: f64 = 80.0;

/// Draw one response latency: `clamp(round(base + Exp(mean)), base, cap)`.
pub fn draw_latency_ms<R: Rng>(rng: &mut R) -> u64 {
    let u: f64 = rng.gen();
    let exponential = -LATENCY_MEAN_MS * (1.0 - u).ln();
    let drawn = LATENCY_BASE_MS + exponential.round() as u64;
    drawn.clamp(LATENCY_BASE_MS, LATENCY_CAP_MS)
}

/// Build a quote for `request` from vendor `vendor_name`/`vendor_id`.
///
/// Base price comes from the catalog (or product-id hash), a per-call
/// multiplier in `[0.85, 1.15]` simulates cross-vendor variance, and the
/// result is scaled by quantity and rounded to integer cents.
pub fn build_quote<R: Rng>(
    vendor_id: &str,
    vendor_name: &str,
    request: &QuoteRequest,
    rng: &mut R,
) -> PriceQuote {
    let currency = if request.currency_code.is_empty() {
        "USD".to_string()
    } else {
        request.currency_code.clone()
    };

    let base = base_price_cents(&request.product_id);
    let multiplier: f64 = rng.gen_range(0.85..=1.15);
    let amount_cents = (base as f64 * multiplier * request.quantity as f64).round() as i64;

    let timestamp_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0);

    PriceQuote {
        vendor_id: vendor_id.to_string(),
        vendor_name: vendor_name.to_string(),
        product_id: request.product_id.clone(),
        price: Money::new(currency, amount_cents),
        estimated_days: rng.gen_range(1..=7),
        timestamp_ms,
    }
}
