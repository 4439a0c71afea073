//! `Checkout` RPC service: `Start` and `GetStatus`.

use crate::inventory::Inventory;
use crate::order::OrderBoard;
use crate::workflow::{Workflow, WorkflowTuning};
use async_trait::async_trait;
use hawker_protocol::{
    CallContext, CallRequest, CheckoutResponse, CheckoutState, Reply, ReplySink, RpcError,
    RpcService, StartCheckout, StatusRequest,
};
use std::sync::Arc;

pub struct CheckoutService {
    board: Arc<OrderBoard>,
    inventory: Arc<Inventory>,
    tuning: WorkflowTuning,
}

impl CheckoutService {
    pub fn new(tuning: WorkflowTuning) -> Self {
        Self::with_inventory(Arc::new(Inventory::seeded()), tuning)
    }

    pub fn with_inventory(inventory: Arc<Inventory>, tuning: WorkflowTuning) -> Self {
        Self {
            board: Arc::new(OrderBoard::new()),
            inventory,
            tuning,
        }
    }

    pub fn board(&self) -> Arc<OrderBoard> {
        self.board.clone()
    }

    pub fn inventory(&self) -> Arc<Inventory> {
        self.inventory.clone()
    }

    async fn start(
        &self,
        ctx: &CallContext,
        start: StartCheckout,
        sink: &ReplySink,
    ) -> Result<(), RpcError> {
        let request = start.request;
        if request.items.is_empty() {
            return Err(RpcError::invalid_argument("checkout needs at least one item"));
        }
        if request.items.iter().any(|item| item.quantity == 0) {
            return Err(RpcError::invalid_argument("item quantity must be at least 1"));
        }
        if request.customer_id.trim().is_empty() {
            return Err(RpcError::invalid_argument("customer_id is required"));
        }

        let order = self.board.create(request, start.idempotency_key);
        tracing::info!(
            checkout_id = %order.checkout_id,
            customer_id = %order.request.customer_id,
            items = order.request.items.len(),
            idempotency_key = ?order.idempotency_key,
            request_id = ?ctx.request_id,
            "starting checkout"
        );

        // The workflow runs on its own task; Start returns immediately.
        let workflow = Workflow::new(self.inventory.clone(), self.tuning.clone());
        let running = order.clone();
        tokio::spawn(async move { workflow.run(running).await });

        let response = CheckoutResponse {
            checkout_id: order.checkout_id.clone(),
            status: CheckoutState::Pending,
            message: "Checkout initiated successfully".to_string(),
            total_amount: None,
        };
        sink.item(Reply::Checkout(response))
            .await
            .map_err(|_| RpcError::internal("caller went away"))?;
        Ok(())
    }

    async fn watch_status(
        &self,
        ctx: &CallContext,
        request: StatusRequest,
        sink: &ReplySink,
    ) -> Result<(), RpcError> {
        let order = self
            .board
            .get(&request.checkout_id)
            .ok_or_else(|| RpcError::not_found(format!("checkout not found: {}", request.checkout_id)))?;

        tracing::info!(
            checkout_id = %order.checkout_id,
            request_id = ?ctx.request_id,
            "status stream opened"
        );

        // The snapshot and the registration happen atomically inside
        // subscribe(), so nothing can slip between replay and tail.
        let (history, tail) = order.subscribe();
        for status in history {
            if sink.item(Reply::Status(status)).await.is_err() {
                return Ok(());
            }
        }
        if let Some(mut tail) = tail {
            while let Some(status) = tail.recv().await {
                if sink.item(Reply::Status(status)).await.is_err() {
                    return Ok(());
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RpcService for CheckoutService {
    async fn call(
        &self,
        ctx: CallContext,
        call: CallRequest,
        sink: ReplySink,
    ) -> Result<(), RpcError> {
        match call {
            CallRequest::StartCheckout(start) => self.start(&ctx, start, &sink).await,
            CallRequest::WatchStatus(request) => self.watch_status(&ctx, request, &sink).await,
            other => Err(RpcError::unimplemented(other.method_name())),
        }
    }
}
