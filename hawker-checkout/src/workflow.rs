//! The checkout workflow: reserve → {price ∥ tax} → pay → confirm, with
//! `void`/`release` compensations on any failure after reserve commits.

use crate::inventory::Inventory;
use crate::order::Order;
use hawker_protocol::{CheckoutState, Money, NodeId, NodeState, NodeStatus};
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::Instant;
use uuid::Uuid;

/// Payment attempts: initial try plus two retries.
const PAY_ATTEMPTS: u32 = 3;

/// Join deadline for the concurrent price/tax pair.
const PRICE_TAX_JOIN_DEADLINE: Duration = Duration::from_secs(3);

/// Sales tax in percent, applied as integer math: `subtotal * 8 / 100`.
const TAX_RATE_PERCENT: i64 = 8;

/// Simulated durations and synthetic failure rates. Defaults are the
/// production values; tests override them to force specific paths.
#[derive(Debug, Clone)]
pub struct WorkflowTuning {
    /// Synthetic per-attempt payment failure probability. Applies only to
    /// non-final attempts; the last attempt can only fail on its deadline.
    pub pay_failure_rate: f64,
    /// Synthetic confirmation failure probability.
    pub confirm_failure_rate: f64,
    /// Soft deadline for one payment attempt.
    pub pay_attempt_deadline: Duration,
    /// Backoff between payment attempts.
    pub pay_backoff: Duration,
    /// Simulated work ranges in milliseconds (inclusive).
    pub price_delay_ms: (u64, u64),
    pub tax_delay_ms: (u64, u64),
    pub pay_delay_ms: (u64, u64),
    pub confirm_delay_ms: (u64, u64),
    pub void_delay_ms: u64,
}

impl Default for WorkflowTuning {
    fn default() -> Self {
        Self {
            pay_failure_rate: 0.2,
            confirm_failure_rate: 0.05,
            pay_attempt_deadline: Duration::from_millis(1500),
            pay_backoff: Duration::from_millis(200),
            price_delay_ms: (50, 150),
            tax_delay_ms: (30, 100),
            pay_delay_ms: (100, 300),
            confirm_delay_ms: (50, 150),
            void_delay_ms: 50,
        }
    }
}

/// Runs the workflow for one order.
pub struct Workflow {
    inventory: Arc<Inventory>,
    tuning: WorkflowTuning,
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

fn sim_delay(range_ms: (u64, u64)) -> Duration {
    let (lo, hi) = range_ms;
    let ms = if hi > lo {
        rand::thread_rng().gen_range(lo..=hi)
    } else {
        lo
    };
    Duration::from_millis(ms)
}

fn roll(probability: f64) -> bool {
    probability > 0.0 && rand::thread_rng().gen::<f64>() < probability
}

impl Workflow {
    pub fn new(inventory: Arc<Inventory>, tuning: WorkflowTuning) -> Self {
        Self { inventory, tuning }
    }

    /// Drive the order to a terminal state, emitting node lifecycle events
    /// along the way. Nodes that never run emit nothing.
    pub async fn run(&self, order: Arc<Order>) {
        tracing::info!(checkout_id = %order.checkout_id, "executing checkout workflow");

        if !self.reserve(&order) {
            self.fail(&order, "Reservation failed");
            return;
        }

        let joined = tokio::time::timeout(PRICE_TAX_JOIN_DEADLINE, async {
            tokio::join!(self.price(&order), self.tax(&order))
        })
        .await;
        let (price_cents, tax_cents) = match joined {
            Ok(pair) => pair,
            Err(_) => {
                tracing::error!(checkout_id = %order.checkout_id, "price/tax join deadline exceeded");
                self.release(&order).await;
                self.fail(&order, "Pricing/Tax failed");
                return;
            }
        };

        let currency = order
            .request
            .items
            .first()
            .map(|item| item.unit_price.currency_code.clone())
            .unwrap_or_else(|| "USD".to_string());
        let total = Money::new(currency, price_cents + tax_cents);

        if !self.pay(&order, &total).await {
            self.void_payment(&order).await;
            self.release(&order).await;
            self.fail(&order, "Payment failed");
            return;
        }

        if !self.confirm(&order).await {
            self.void_payment(&order).await;
            self.release(&order).await;
            self.fail(&order, "Confirmation failed");
            return;
        }

        tracing::info!(
            checkout_id = %order.checkout_id,
            total = total.dollars(),
            "checkout completed"
        );
        order.finish(CheckoutState::Completed, Some(total));
    }

    fn fail(&self, order: &Order, reason: &str) {
        tracing::error!(checkout_id = %order.checkout_id, reason, "checkout failed");
        order.finish(CheckoutState::Failed, None);
    }

    fn emit(
        &self,
        order: &Order,
        node_id: NodeId,
        state: NodeState,
        message: impl Into<String>,
        error: Option<(&str, String)>,
    ) {
        let (error_code, error_message) = match error {
            Some((code, message)) => (Some(code.to_string()), Some(message)),
            None => (None, None),
        };
        order.append(NodeStatus {
            node_id,
            state,
            message: message.into(),
            timestamp_ms: now_ms(),
            error_code,
            error_message,
        });
    }

    fn reserve_items<'a>(order: &'a Order) -> Vec<(&'a str, i64)> {
        order
            .request
            .items
            .iter()
            .map(|item| (item.product_id.as_str(), item.quantity as i64))
            .collect()
    }

    fn reserve(&self, order: &Order) -> bool {
        self.emit(order, NodeId::Reserve, NodeState::Running, "Reserving inventory", None);
        match self.inventory.reserve_all(&Self::reserve_items(order)) {
            Ok(()) => {
                self.emit(
                    order,
                    NodeId::Reserve,
                    NodeState::Completed,
                    "Inventory reserved successfully",
                    None,
                );
                true
            }
            Err(e) => {
                self.emit(
                    order,
                    NodeId::Reserve,
                    NodeState::Failed,
                    "Insufficient inventory",
                    Some(("INSUFFICIENT_INVENTORY", e.to_string())),
                );
                false
            }
        }
    }

    fn subtotal_cents(order: &Order) -> i64 {
        order
            .request
            .items
            .iter()
            .map(|item| item.unit_price.amount_cents * item.quantity as i64)
            .sum()
    }

    async fn price(&self, order: &Order) -> i64 {
        self.emit(order, NodeId::Price, NodeState::Running, "Calculating price", None);
        tokio::time::sleep(sim_delay(self.tuning.price_delay_ms)).await;
        let subtotal = Self::subtotal_cents(order);
        self.emit(
            order,
            NodeId::Price,
            NodeState::Completed,
            format!("Price calculated: ${:.2}", subtotal as f64 / 100.0),
            None,
        );
        subtotal
    }

    async fn tax(&self, order: &Order) -> i64 {
        self.emit(order, NodeId::Tax, NodeState::Running, "Calculating tax", None);
        tokio::time::sleep(sim_delay(self.tuning.tax_delay_ms)).await;
        let tax = Self::subtotal_cents(order) * TAX_RATE_PERCENT / 100;
        self.emit(
            order,
            NodeId::Tax,
            NodeState::Completed,
            format!("Tax calculated: ${:.2}", tax as f64 / 100.0),
            None,
        );
        tax
    }

    async fn pay(&self, order: &Order, amount: &Money) -> bool {
        for attempt in 1..=PAY_ATTEMPTS {
            self.emit(
                order,
                NodeId::Pay,
                NodeState::Running,
                format!("Processing payment (attempt {attempt})"),
                None,
            );

            let started = Instant::now();
            tokio::time::sleep(sim_delay(self.tuning.pay_delay_ms)).await;

            let failure = if started.elapsed() > self.tuning.pay_attempt_deadline {
                Some("payment attempt timed out".to_string())
            } else if attempt < PAY_ATTEMPTS && roll(self.tuning.pay_failure_rate) {
                Some("payment gateway error".to_string())
            } else {
                None
            };

            match failure {
                None => {
                    order.set_payment_transaction(format!("txn-{}", Uuid::new_v4()));
                    self.emit(
                        order,
                        NodeId::Pay,
                        NodeState::Completed,
                        format!("Payment successful: ${:.2}", amount.dollars()),
                        None,
                    );
                    return true;
                }
                Some(reason) if attempt < PAY_ATTEMPTS => {
                    tracing::warn!(
                        checkout_id = %order.checkout_id,
                        attempt,
                        reason,
                        "payment attempt failed, retrying"
                    );
                    tokio::time::sleep(self.tuning.pay_backoff).await;
                }
                Some(reason) => {
                    self.emit(
                        order,
                        NodeId::Pay,
                        NodeState::Failed,
                        "Payment failed after retries",
                        Some(("PAYMENT_FAILED", reason)),
                    );
                    return false;
                }
            }
        }
        false
    }

    async fn confirm(&self, order: &Order) -> bool {
        self.emit(order, NodeId::Confirm, NodeState::Running, "Confirming order", None);
        tokio::time::sleep(sim_delay(self.tuning.confirm_delay_ms)).await;

        if roll(self.tuning.confirm_failure_rate) {
            self.emit(
                order,
                NodeId::Confirm,
                NodeState::Failed,
                "Confirmation failed",
                Some(("CONFIRMATION_FAILED", "vendor confirmation failed".to_string())),
            );
            false
        } else {
            self.emit(order, NodeId::Confirm, NodeState::Completed, "Order confirmed", None);
            true
        }
    }

    /// Compensation: return reserved units to the ledger.
    async fn release(&self, order: &Order) {
        tracing::info!(checkout_id = %order.checkout_id, "compensating: releasing inventory");
        self.emit(order, NodeId::Release, NodeState::Running, "Releasing inventory", None);
        self.inventory.release_all(&Self::reserve_items(order));
        self.emit(order, NodeId::Release, NodeState::Completed, "Inventory released", None);
    }

    /// Compensation: void the captured payment. Runs only when a payment
    /// transaction was actually set; otherwise emits nothing.
    async fn void_payment(&self, order: &Order) {
        let Some(transaction_id) = order.payment_transaction() else {
            return;
        };
        tracing::info!(
            checkout_id = %order.checkout_id,
            transaction_id = %transaction_id,
            "compensating: voiding payment"
        );
        self.emit(order, NodeId::Void, NodeState::Running, "Voiding payment", None);
        tokio::time::sleep(Duration::from_millis(self.tuning.void_delay_ms)).await;
        self.emit(order, NodeId::Void, NodeState::Completed, "Payment voided", None);
    }
}
