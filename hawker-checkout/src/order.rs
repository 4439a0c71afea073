//! Per-checkout status tracking and fan-out.

use dashmap::DashMap;
use hawker_protocol::{CheckoutRequest, CheckoutState, Money, NodeStatus};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;

struct OrderInner {
    history: Vec<NodeStatus>,
    subscribers: Vec<mpsc::UnboundedSender<NodeStatus>>,
    overall: CheckoutState,
    total_amount: Option<Money>,
    payment_transaction_id: Option<String>,
    terminated: bool,
}

/// One checkout's live record: append-only status history plus the
/// subscribers following it.
///
/// Append and broadcast happen under one lock, and subscription snapshots
/// the history under the same lock, so replay + tail is always the exact
/// canonical sequence — no gaps, no duplicates.
pub struct Order {
    pub checkout_id: String,
    pub request: CheckoutRequest,
    pub idempotency_key: Option<String>,
    inner: Mutex<OrderInner>,
}

impl Order {
    fn new(checkout_id: String, request: CheckoutRequest, idempotency_key: Option<String>) -> Self {
        Self {
            checkout_id,
            request,
            idempotency_key,
            inner: Mutex::new(OrderInner {
                history: Vec::new(),
                subscribers: Vec::new(),
                overall: CheckoutState::Pending,
                total_amount: None,
                payment_transaction_id: None,
                terminated: false,
            }),
        }
    }

    /// Append one status and notify every live subscriber. Subscribers whose
    /// stream has gone away are dropped here.
    pub fn append(&self, status: NodeStatus) {
        let mut inner = self.inner.lock();
        inner.history.push(status.clone());
        inner
            .subscribers
            .retain(|subscriber| subscriber.send(status.clone()).is_ok());
    }

    /// Snapshot the history and register for the live tail in one atomic
    /// step. Terminated orders return no tail: the stream ends after replay.
    pub fn subscribe(
        &self,
    ) -> (Vec<NodeStatus>, Option<mpsc::UnboundedReceiver<NodeStatus>>) {
        let mut inner = self.inner.lock();
        let history = inner.history.clone();
        if inner.terminated {
            (history, None)
        } else {
            let (tx, rx) = mpsc::unbounded_channel();
            inner.subscribers.push(tx);
            (history, Some(rx))
        }
    }

    pub fn set_payment_transaction(&self, transaction_id: String) {
        self.inner.lock().payment_transaction_id = Some(transaction_id);
    }

    pub fn payment_transaction(&self) -> Option<String> {
        self.inner.lock().payment_transaction_id.clone()
    }

    /// Terminal transition: fix the overall state, record the total on
    /// success, and close every subscriber stream.
    pub fn finish(&self, state: CheckoutState, total_amount: Option<Money>) {
        let mut inner = self.inner.lock();
        inner.overall = state;
        inner.total_amount = total_amount;
        inner.terminated = true;
        // Dropping the senders closes every tail.
        inner.subscribers.clear();
    }

    pub fn overall(&self) -> CheckoutState {
        self.inner.lock().overall
    }

    pub fn total_amount(&self) -> Option<Money> {
        self.inner.lock().total_amount.clone()
    }

    pub fn is_terminated(&self) -> bool {
        self.inner.lock().terminated
    }

    pub fn history(&self) -> Vec<NodeStatus> {
        self.inner.lock().history.clone()
    }
}

/// All checkouts of this process, keyed by checkout id. Terminated orders
/// are retained read-only for the process lifetime.
pub struct OrderBoard {
    orders: DashMap<String, Arc<Order>>,
    seq: AtomicU64,
}

impl OrderBoard {
    pub fn new() -> Self {
        Self {
            orders: DashMap::new(),
            seq: AtomicU64::new(0),
        }
    }

    pub fn create(
        &self,
        request: CheckoutRequest,
        idempotency_key: Option<String>,
    ) -> Arc<Order> {
        let wall_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let checkout_id = format!("checkout-{wall_ms}-{seq}");
        let order = Arc::new(Order::new(checkout_id.clone(), request, idempotency_key));
        self.orders.insert(checkout_id, order.clone());
        order
    }

    pub fn get(&self, checkout_id: &str) -> Option<Arc<Order>> {
        self.orders.get(checkout_id).map(|entry| entry.clone())
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

impl Default for OrderBoard {
    fn default() -> Self {
        Self::new()
    }
}
