//! Workflow scenarios: the happy path, the three failure paths with their
//! compensations, and replay semantics over the RPC surface.
//!
//! Synthetic failure rates and delays are pinned through `WorkflowTuning`
//! so every path is deterministic.

use hawker_checkout::{
    CheckoutService, Inventory, OrderBoard, Workflow, WorkflowTuning,
};
use hawker_protocol::{
    CheckoutClient, CheckoutItem, CheckoutRequest, CheckoutState, Money, NodeId, NodeState,
    NodeStatus, ProtocolError, RpcServer, StatusCode,
};
use std::sync::Arc;
use std::time::Duration;

fn fast_tuning(pay_failure_rate: f64, confirm_failure_rate: f64) -> WorkflowTuning {
    WorkflowTuning {
        pay_failure_rate,
        confirm_failure_rate,
        pay_backoff: Duration::from_millis(5),
        price_delay_ms: (1, 2),
        tax_delay_ms: (1, 2),
        pay_delay_ms: (1, 2),
        confirm_delay_ms: (1, 2),
        void_delay_ms: 1,
        ..WorkflowTuning::default()
    }
}

fn order_request(items: Vec<(&str, u32, i64)>) -> CheckoutRequest {
    CheckoutRequest {
        customer_id: "c1".to_string(),
        items: items
            .into_iter()
            .map(|(product_id, quantity, cents)| CheckoutItem {
                product_id: product_id.to_string(),
                quantity,
                unit_price: Money::new("USD", cents),
                vendor_id: "amz".to_string(),
            })
            .collect(),
        shipping_address: "1 Main St".to_string(),
        payment_method_id: "pm-card-123".to_string(),
    }
}

fn shape(events: &[NodeStatus]) -> Vec<(NodeId, NodeState)> {
    events.iter().map(|e| (e.node_id, e.state)).collect()
}

fn index_of(events: &[NodeStatus], node_id: NodeId, state: NodeState) -> Option<usize> {
    events
        .iter()
        .position(|e| e.node_id == node_id && e.state == state)
}

fn touched(events: &[NodeStatus], node_id: NodeId) -> bool {
    events.iter().any(|e| e.node_id == node_id)
}

#[tokio::test]
async fn happy_path_completes_all_forward_nodes() {
    let inventory = Arc::new(Inventory::with_seed([("sku-laptop", 10), ("sku-book", 50)]));
    let board = OrderBoard::new();
    let order = board.create(order_request(vec![
        ("sku-laptop", 1, 89_900),
        ("sku-book", 2, 1_999),
    ]), None);

    Workflow::new(inventory.clone(), fast_tuning(0.0, 0.0))
        .run(order.clone())
        .await;

    assert_eq!(order.overall(), CheckoutState::Completed);

    // total = subtotal + floor(subtotal * 8%), all in integer cents
    let subtotal = 89_900 + 2 * 1_999;
    let expected_total = subtotal + subtotal * 8 / 100;
    let total = order.total_amount().expect("completed order carries a total");
    assert_eq!(total.amount_cents, expected_total);
    assert_eq!(total.currency_code, "USD");

    let events = order.history();
    for node in [NodeId::Reserve, NodeId::Price, NodeId::Tax, NodeId::Pay, NodeId::Confirm] {
        assert!(index_of(&events, node, NodeState::Running).is_some(), "{node:?} ran");
        assert!(
            index_of(&events, node, NodeState::Completed).is_some(),
            "{node:?} completed"
        );
    }
    assert!(!touched(&events, NodeId::Void), "no void on success");
    assert!(!touched(&events, NodeId::Release), "no release on success");

    // reserve completes before any pay event, pay completes before confirm
    let reserve_done = index_of(&events, NodeId::Reserve, NodeState::Completed).unwrap();
    let first_pay = index_of(&events, NodeId::Pay, NodeState::Running).unwrap();
    let pay_done = index_of(&events, NodeId::Pay, NodeState::Completed).unwrap();
    let first_confirm = index_of(&events, NodeId::Confirm, NodeState::Running).unwrap();
    assert!(reserve_done < first_pay);
    assert!(pay_done < first_confirm);

    // reserved units stay reserved on success
    assert_eq!(inventory.on_hand("sku-laptop"), 9);
    assert_eq!(inventory.on_hand("sku-book"), 48);
}

#[tokio::test]
async fn inventory_shortage_fails_fast_with_no_downstream_nodes() {
    let inventory = Arc::new(Inventory::with_seed([("sku-x", 0)]));
    let board = OrderBoard::new();
    let order = board.create(order_request(vec![("sku-x", 1, 500)]), None);

    Workflow::new(inventory, fast_tuning(0.0, 0.0))
        .run(order.clone())
        .await;

    assert_eq!(order.overall(), CheckoutState::Failed);
    let events = order.history();
    assert_eq!(
        shape(&events),
        vec![
            (NodeId::Reserve, NodeState::Running),
            (NodeId::Reserve, NodeState::Failed),
        ]
    );
    let failed = &events[1];
    assert_eq!(failed.error_code.as_deref(), Some("INSUFFICIENT_INVENTORY"));
}

#[tokio::test]
async fn exhausted_payment_releases_inventory_without_void() {
    let inventory = Arc::new(Inventory::with_seed([("sku-laptop", 10)]));
    let board = OrderBoard::new();
    let order = board.create(order_request(vec![("sku-laptop", 2, 89_900)]), None);

    // Every attempt overruns a zero soft deadline, so all three fail.
    let tuning = WorkflowTuning {
        pay_attempt_deadline: Duration::ZERO,
        ..fast_tuning(0.0, 0.0)
    };
    Workflow::new(inventory.clone(), tuning)
        .run(order.clone())
        .await;

    assert_eq!(order.overall(), CheckoutState::Failed);
    let events = order.history();

    let attempts = events
        .iter()
        .filter(|e| e.node_id == NodeId::Pay && e.state == NodeState::Running)
        .count();
    assert_eq!(attempts, 3, "initial attempt plus two retries");

    let pay_failed = events
        .iter()
        .find(|e| e.node_id == NodeId::Pay && e.state == NodeState::Failed)
        .expect("pay must fail");
    assert_eq!(pay_failed.error_code.as_deref(), Some("PAYMENT_FAILED"));

    assert!(index_of(&events, NodeId::Release, NodeState::Completed).is_some());
    assert!(!touched(&events, NodeId::Void), "no transaction, so no void");

    // ledger back to its pre-reserve state
    assert_eq!(inventory.on_hand("sku-laptop"), 10);
}

#[tokio::test]
async fn failed_confirmation_voids_payment_then_releases() {
    let inventory = Arc::new(Inventory::with_seed([("sku-tent", 4)]));
    let board = OrderBoard::new();
    let order = board.create(order_request(vec![("sku-tent", 1, 12_900)]), None);

    Workflow::new(inventory.clone(), fast_tuning(0.0, 1.0))
        .run(order.clone())
        .await;

    assert_eq!(order.overall(), CheckoutState::Failed);
    let events = order.history();

    assert!(index_of(&events, NodeId::Pay, NodeState::Completed).is_some());
    let confirm_failed = events
        .iter()
        .find(|e| e.node_id == NodeId::Confirm && e.state == NodeState::Failed)
        .expect("confirm must fail");
    assert_eq!(confirm_failed.error_code.as_deref(), Some("CONFIRMATION_FAILED"));

    let void_done = index_of(&events, NodeId::Void, NodeState::Completed).unwrap();
    let release_done = index_of(&events, NodeId::Release, NodeState::Completed).unwrap();
    assert!(void_done < release_done, "void runs before release");

    assert_eq!(inventory.on_hand("sku-tent"), 4);
}

#[tokio::test]
async fn synthetic_failures_on_nonfinal_attempts_still_succeed() {
    // 100% synthetic failure only applies to attempts 1 and 2; the final
    // attempt has no synthetic roll and lands within its deadline.
    let inventory = Arc::new(Inventory::with_seed([("sku-book", 100)]));
    let board = OrderBoard::new();
    let order = board.create(order_request(vec![("sku-book", 1, 1_999)]), None);

    Workflow::new(inventory, fast_tuning(1.0, 0.0))
        .run(order.clone())
        .await;

    assert_eq!(order.overall(), CheckoutState::Completed);
    let attempts = order
        .history()
        .iter()
        .filter(|e| e.node_id == NodeId::Pay && e.state == NodeState::Running)
        .count();
    assert_eq!(attempts, 3);
}

// ---------------------------------------------------------------------------
// RPC surface
// ---------------------------------------------------------------------------

async fn spawn_checkout(tuning: WorkflowTuning, inventory: Inventory) -> String {
    let service = CheckoutService::with_inventory(Arc::new(inventory), tuning);
    let server = RpcServer::bind("127.0.0.1:0", service).await.unwrap();
    let addr = server.local_addr().unwrap().to_string();
    tokio::spawn(server.run());
    addr
}

#[tokio::test]
async fn start_returns_pending_and_stream_sees_whole_lifecycle() {
    let addr = spawn_checkout(
        fast_tuning(0.0, 0.0),
        Inventory::with_seed([("sku-laptop", 10)]),
    )
    .await;
    let client = CheckoutClient::new(addr);

    let response = client
        .start(
            order_request(vec![("sku-laptop", 1, 89_900)]),
            Some("idem-1".to_string()),
            Duration::from_secs(2),
            Some("req-1".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(response.status, CheckoutState::Pending);
    assert!(response.checkout_id.starts_with("checkout-"));

    // A subscriber joining mid-run replays history and then follows the tail.
    let live = client
        .watch_status(&response.checkout_id, Duration::from_secs(10), None)
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    // A subscriber joining after termination replays the same sequence.
    let replayed = client
        .watch_status(&response.checkout_id, Duration::from_secs(10), None)
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert_eq!(shape(&live), shape(&replayed), "replay equals live sequence");
    assert!(index_of(&live, NodeId::Confirm, NodeState::Completed).is_some());

    // No duplicates: each (node, state) pair of the happy path appears once.
    for node in [NodeId::Reserve, NodeId::Price, NodeId::Tax, NodeId::Confirm] {
        let count = live
            .iter()
            .filter(|e| e.node_id == node && e.state == NodeState::Completed)
            .count();
        assert_eq!(count, 1, "{node:?} completed exactly once");
    }
}

#[tokio::test]
async fn unknown_checkout_id_is_not_found() {
    let addr = spawn_checkout(fast_tuning(0.0, 0.0), Inventory::new()).await;
    let client = CheckoutClient::new(addr);

    let stream = client
        .watch_status("checkout-0-0", Duration::from_secs(2), None)
        .await
        .unwrap();
    let err = stream.collect().await.unwrap_err();
    match err {
        ProtocolError::Rpc(e) => assert_eq!(e.code, StatusCode::NotFound),
        other => panic!("expected NotFound, got {other}"),
    }
}

#[tokio::test]
async fn invalid_checkout_requests_are_rejected() {
    let addr = spawn_checkout(fast_tuning(0.0, 0.0), Inventory::new()).await;
    let client = CheckoutClient::new(addr);

    let empty = CheckoutRequest {
        items: Vec::new(),
        ..order_request(vec![])
    };
    let err = client
        .start(empty, None, Duration::from_secs(2), None)
        .await
        .unwrap_err();
    match err {
        ProtocolError::Rpc(e) => assert_eq!(e.code, StatusCode::InvalidArgument),
        other => panic!("expected InvalidArgument, got {other}"),
    }

    let zero_quantity = order_request(vec![("sku-1", 0, 100)]);
    let err = client
        .start(zero_quantity, None, Duration::from_secs(2), None)
        .await
        .unwrap_err();
    match err {
        ProtocolError::Rpc(e) => assert_eq!(e.code, StatusCode::InvalidArgument),
        other => panic!("expected InvalidArgument, got {other}"),
    }
}
