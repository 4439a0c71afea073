//! JSON shapes at the HTTP boundary.
//!
//! Wire money is integer cents; these DTOs are the only place amounts are
//! rendered as decimal dollars.

use hawker_protocol::{CheckoutItem, CheckoutRequest, CheckoutResponse, Money, NodeStatus, PriceQuote};
use serde::{Deserialize, Serialize};

/// One `quote` SSE event / one element of `/api/quote` responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteDto {
    pub vendor: String,
    pub vendor_id: String,
    pub price: f64,
    pub currency: String,
    pub estimated_days: u32,
    pub timestamp: i64,
}

impl From<PriceQuote> for QuoteDto {
    fn from(quote: PriceQuote) -> Self {
        Self {
            vendor: quote.vendor_name,
            vendor_id: quote.vendor_id,
            price: quote.price.dollars(),
            currency: quote.price.currency_code,
            estimated_days: quote.estimated_days,
            timestamp: quote.timestamp_ms,
        }
    }
}

/// One `status` SSE event. Error fields appear only when an error code is
/// present.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDto {
    pub node_id: String,
    pub state: String,
    pub message: String,
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl From<NodeStatus> for StatusDto {
    fn from(status: NodeStatus) -> Self {
        let (error_code, error_message) = match status.error_code {
            Some(code) => (Some(code), status.error_message),
            None => (None, None),
        };
        Self {
            node_id: status.node_id.as_str().to_string(),
            state: status.state.as_str().to_string(),
            message: status.message,
            timestamp: status.timestamp_ms,
            error_code,
            error_message,
        }
    }
}

/// POST /api/checkout body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutBody {
    pub customer_id: String,
    pub items: Vec<CheckoutItemBody>,
    pub shipping_address: String,
    pub payment_method_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItemBody {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: MoneyBody,
    pub vendor_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyBody {
    pub currency_code: String,
    pub amount_cents: i64,
}

impl CheckoutBody {
    pub fn into_request(self) -> CheckoutRequest {
        CheckoutRequest {
            customer_id: self.customer_id,
            items: self
                .items
                .into_iter()
                .map(|item| CheckoutItem {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    unit_price: Money::new(item.unit_price.currency_code, item.unit_price.amount_cents),
                    vendor_id: item.vendor_id,
                })
                .collect(),
            shipping_address: self.shipping_address,
            payment_method_id: self.payment_method_id,
        }
    }
}

/// POST /api/checkout response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutStartedDto {
    pub checkout_id: String,
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl From<CheckoutResponse> for CheckoutStartedDto {
    fn from(response: CheckoutResponse) -> Self {
        let (total_amount, currency) = match response.total_amount {
            Some(total) => (Some(total.dollars()), Some(total.currency_code)),
            None => (None, None),
        };
        Self {
            checkout_id: response.checkout_id,
            status: response.status.as_str().to_string(),
            message: response.message,
            total_amount,
            currency,
        }
    }
}
