//! Order lifecycle integration tests
//!
//! Runs the real services over an in-memory SQLite database.

mod common;

use order_server::AppError;
use order_server::db::models::OrderStatus;
use order_server::db::repository::order as order_repo;
use order_server::db::models::OrderItem;
use order_server::message::MessageHandler;
use order_server::orders::CreateOrderInput;

use common::{order_fixture, test_state};

fn create_input() -> CreateOrderInput {
    CreateOrderInput {
        customer_name: "John Doe".to_string(),
        customer_email: "john@example.com".to_string(),
        items: vec![
            OrderItem {
                name: "Product XYZ".to_string(),
                quantity: 2,
                price: 29.99,
            },
            OrderItem {
                name: "Product ABC".to_string(),
                quantity: 1,
                price: 10.02,
            },
        ],
        notes: Some("Deliver in the afternoon".to_string()),
    }
}

#[tokio::test]
async fn create_computes_total_and_persists_pending() {
    let state = test_state().await;

    let order = state.orders.create(create_input()).await.unwrap();

    assert_eq!(order.total_amount, 70.0);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.version, 0);
    assert!(!order.id.is_empty());

    let fetched = state.orders.find_one(&order.id).await.unwrap();
    assert_eq!(fetched.id, order.id);
    assert_eq!(fetched.total_amount, 70.0);
    assert_eq!(fetched.items.len(), 2);
    assert_eq!(fetched.notes.as_deref(), Some("Deliver in the afternoon"));
}

#[tokio::test]
async fn create_rejects_invalid_input() {
    let state = test_state().await;

    let mut input = create_input();
    input.items.clear();
    assert!(matches!(
        state.orders.create(input).await,
        Err(AppError::Validation(_))
    ));

    let mut input = create_input();
    input.customer_email = "not-an-email".to_string();
    assert!(matches!(
        state.orders.create(input).await,
        Err(AppError::Validation(_))
    ));

    let mut input = create_input();
    input.items[0].quantity = 0;
    assert!(matches!(
        state.orders.create(input).await,
        Err(AppError::Validation(_))
    ));
}

#[tokio::test]
async fn find_one_unknown_id_is_not_found() {
    let state = test_state().await;

    let result = state.orders.find_one("does-not-exist").await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn find_all_paginates_newest_first() {
    let state = test_state().await;

    // Distinct created_at values so the DESC ordering is deterministic
    for i in 0..5 {
        let order = order_fixture(OrderStatus::Pending, 10.0 + i as f64, 1_000 + i);
        order_repo::insert(&state.db, &order).await.unwrap();
    }

    let page = state.orders.find_all(1, 2).await.unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.meta.total_items, 5);
    assert_eq!(page.meta.item_count, 2);
    assert_eq!(page.meta.items_per_page, 2);
    assert_eq!(page.meta.total_pages, 3);
    assert_eq!(page.meta.current_page, 1);

    // Newest (largest created_at) first
    assert_eq!(page.items[0].created_at, 1_004);
    assert_eq!(page.items[1].created_at, 1_003);

    let last_page = state.orders.find_all(3, 2).await.unwrap();
    assert_eq!(last_page.items.len(), 1);
    assert_eq!(last_page.items[0].created_at, 1_000);

    // Out-of-range values are clamped, not rejected
    let clamped = state.orders.find_all(0, 0).await.unwrap();
    assert_eq!(clamped.meta.current_page, 1);
    assert_eq!(clamped.meta.items_per_page, 1);
}

#[tokio::test]
async fn process_order_walks_pending_processing_completed() {
    let state = test_state().await;

    let order = state.orders.create(create_input()).await.unwrap();
    state.processing.process_order(&order.id).await.unwrap();

    let processed = state.orders.find_one(&order.id).await.unwrap();
    assert_eq!(processed.status, OrderStatus::Completed);
    // Two CAS writes: pending → processing → completed
    assert_eq!(processed.version, 2);
    assert!(processed.updated_at >= processed.created_at);
}

#[tokio::test]
async fn process_order_unknown_id_fails() {
    let state = test_state().await;

    let result = state.processing.process_order("missing").await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn concurrent_status_write_loses_cas() {
    let state = test_state().await;

    let order = state.orders.create(create_input()).await.unwrap();

    // First writer wins
    let won = order_repo::update_status(
        &state.db,
        &order.id,
        order.version,
        OrderStatus::Processing,
        42,
    )
    .await
    .unwrap();
    assert!(won);

    // Second writer with the same expected version loses
    let lost = order_repo::update_status(
        &state.db,
        &order.id,
        order.version,
        OrderStatus::Completed,
        43,
    )
    .await
    .unwrap();
    assert!(!lost);
}

#[tokio::test]
async fn cancel_is_only_valid_from_pending() {
    let state = test_state().await;

    let order = state.orders.create(create_input()).await.unwrap();
    let cancelled = state.orders.cancel(&order.id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    // Completed orders cannot be cancelled
    let order = state.orders.create(create_input()).await.unwrap();
    state.processing.process_order(&order.id).await.unwrap();
    assert!(matches!(
        state.orders.cancel(&order.id).await,
        Err(AppError::BusinessRule(_))
    ));
}

#[tokio::test]
async fn cleanup_reprocesses_only_stale_pending_orders() {
    let state = test_state().await;
    let now = order_server::utils::now_millis();

    let stale = order_fixture(OrderStatus::Pending, 20.0, now - 2 * 60 * 60 * 1000);
    let fresh = order_fixture(OrderStatus::Pending, 30.0, now);
    let old_completed = order_fixture(OrderStatus::Completed, 40.0, now - 3 * 60 * 60 * 1000);
    order_repo::insert(&state.db, &stale).await.unwrap();
    order_repo::insert(&state.db, &fresh).await.unwrap();
    order_repo::insert(&state.db, &old_completed).await.unwrap();

    state.processing.cleanup_old_pending_orders().await.unwrap();

    let stale_after = state.orders.find_one(&stale.id).await.unwrap();
    assert_eq!(stale_after.status, OrderStatus::Completed);

    // Newer than the threshold: untouched
    let fresh_after = state.orders.find_one(&fresh.id).await.unwrap();
    assert_eq!(fresh_after.status, OrderStatus::Pending);
    assert_eq!(fresh_after.version, 0);

    // Non-pending rows are never selected
    let completed_after = state.orders.find_one(&old_completed.id).await.unwrap();
    assert_eq!(completed_after.version, 0);
}

#[tokio::test]
async fn consumer_path_processes_created_order() {
    let state = test_state().await;

    // Subscribe the handler before publishing, as the server does at startup
    let token = tokio_util::sync::CancellationToken::new();
    let handler = MessageHandler::with_default_processors(
        state.message_bus.subscribe(),
        token.clone(),
        &state,
    );
    let handler_task = tokio::spawn(handler.run());

    let order = state.orders.create(create_input()).await.unwrap();
    assert_eq!(order.status, OrderStatus::Pending);

    // The consumer runs asynchronously; poll until it completes the order
    let mut status = OrderStatus::Pending;
    for _ in 0..100 {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        status = state.orders.find_one(&order.id).await.unwrap().status;
        if status == OrderStatus::Completed {
            break;
        }
    }
    assert_eq!(status, OrderStatus::Completed);

    token.cancel();
    let _ = handler_task.await;
}
