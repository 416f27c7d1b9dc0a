//! Store administration against the fake backend.

#![allow(clippy::unwrap_used)]

use axum::http::Method;
use rust_decimal::Decimal;

use autoparts_admin::{AdminClient, ProductInput, ProductPatch};
use autoparts_core::{OrderId, OrderStatus, ProductId, UserId};
use autoparts_integration_tests::{
    ADMIN_EMAIL, ADMIN_ID, BRAKE_PADS, CUSTOMER_EMAIL, FakeBackend, OIL_FILTER, OTHER_ID,
    SHOCK_ABSORBER, SPARK_PLUG,
};
use autoparts_storefront::ApiError;
use autoparts_storefront::types::ProductFilter;

async fn admin(backend: &FakeBackend) -> AdminClient {
    let (api, _store) = backend.signed_in(ADMIN_EMAIL).await;
    AdminClient::new(api)
}

#[tokio::test]
async fn test_non_admin_sends_no_request() {
    let backend = FakeBackend::start().await;
    let (api, _store) = backend.signed_in(CUSTOMER_EMAIL).await;
    let client = AdminClient::new(api);

    assert!(matches!(client.list_users().await, Err(ApiError::Forbidden)));
    assert!(matches!(
        client.update_order_status(&OrderId::new("o-3"), OrderStatus::Shipped).await,
        Err(ApiError::Forbidden)
    ));
    assert!(matches!(
        client.delete_product(&ProductId::new(OIL_FILTER)).await,
        Err(ApiError::Forbidden)
    ));
    assert!(matches!(client.dashboard().await, Err(ApiError::Forbidden)));

    assert!(!backend.was_called());
}

#[tokio::test]
async fn test_signed_out_sends_no_request() {
    let backend = FakeBackend::start().await;
    let (api, _store) = backend.client();
    let client = AdminClient::new(api);

    assert!(matches!(client.list_orders().await, Err(ApiError::Forbidden)));
    assert!(!backend.was_called());
}

#[tokio::test]
async fn test_users() {
    let backend = FakeBackend::start().await;
    let client = admin(&backend).await;

    let users = client.list_users().await.unwrap();
    assert_eq!(users.len(), 3);
    assert_eq!(users.iter().filter(|u| u.is_admin()).count(), 1);

    let user = client.get_user(&UserId::new(OTHER_ID)).await.unwrap();
    assert_eq!(user.name, "Martín Ruiz");
    assert!(!user.is_banned);
}

#[tokio::test]
async fn test_toggle_ban() {
    let backend = FakeBackend::start().await;
    let client = admin(&backend).await;
    let other = UserId::new(OTHER_ID);

    let user = client.toggle_ban(&other).await.unwrap();
    assert!(user.is_banned);
    assert!(backend.is_banned(OTHER_ID));

    let user = client.toggle_ban(&other).await.unwrap();
    assert!(!user.is_banned);
    assert_eq!(
        backend.count(&Method::PATCH, "/users/u-otro/toggle-ban"),
        2
    );
}

#[tokio::test]
async fn test_cannot_ban_self() {
    let backend = FakeBackend::start().await;
    let client = admin(&backend).await;

    let err = client.toggle_ban(&UserId::new(ADMIN_ID)).await.unwrap_err();

    assert_eq!(err.user_message(), "No puedes bloquear tu propia cuenta");
    assert!(!backend.was_called());
}

#[tokio::test]
async fn test_update_order_status() {
    let backend = FakeBackend::start().await;
    let client = admin(&backend).await;

    let orders = client.list_orders().await.unwrap();
    assert_eq!(orders.len(), 3);

    let order = client
        .update_order_status(&OrderId::new("o-3"), OrderStatus::Shipped)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Shipped);
    assert_eq!(backend.order_status("o-3").as_deref(), Some("shipped"));

    let patch = backend
        .requests()
        .into_iter()
        .find(|r| r.method == Method::PATCH)
        .unwrap();
    assert_eq!(patch.path, "/orders/o-3/status");
    assert_eq!(patch.body.unwrap()["status"], "shipped");
}

#[tokio::test]
async fn test_final_order_status_is_kept() {
    let backend = FakeBackend::start().await;
    let client = admin(&backend).await;

    let err = client
        .update_order_status(&OrderId::new("o-2"), OrderStatus::Pending)
        .await
        .unwrap_err();
    assert_eq!(
        err.user_message(),
        "No se puede cambiar el estado de un pedido entregado a pendiente"
    );

    // Same status is a no-op
    let order = client
        .update_order_status(&OrderId::new("o-1"), OrderStatus::Paid)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Paid);

    assert!(
        !backend
            .requests()
            .iter()
            .any(|r| r.method == Method::PATCH)
    );
}

#[tokio::test]
async fn test_product_changes_invalidate_cache() {
    let backend = FakeBackend::start().await;
    let client = admin(&backend).await;
    let api = client.api();

    assert_eq!(api.list_products(&ProductFilter::default()).await.unwrap().total, 4);

    let input = ProductInput {
        name: "Kit de embrague".to_string(),
        price: Decimal::new(120_000, 0),
        stock: 2,
        category: Some("Transmisión".to_string()),
        brand: Some("Sachs".to_string()),
        ..ProductInput::default()
    };
    let created = client.create_product(&input).await.unwrap();
    assert_eq!(created.name, "Kit de embrague");
    assert_eq!(created.price, Decimal::new(120_000, 0));

    assert_eq!(api.list_products(&ProductFilter::default()).await.unwrap().total, 5);
    assert_eq!(backend.count(&Method::GET, "/products"), 2);

    let id = ProductId::new(BRAKE_PADS);
    api.get_product(&id).await.unwrap();
    let patch = ProductPatch {
        stock: Some(12),
        ..ProductPatch::default()
    };
    let updated = client.update_product(&id, &patch).await.unwrap();
    assert_eq!(updated.stock, Some(12));
    assert_eq!(api.get_product(&id).await.unwrap().stock, Some(12));

    client.delete_product(&created.id).await.unwrap();
    assert_eq!(api.list_products(&ProductFilter::default()).await.unwrap().total, 4);
}

#[tokio::test]
async fn test_invalid_product_sends_no_request() {
    let backend = FakeBackend::start().await;
    let client = admin(&backend).await;

    let input = ProductInput {
        name: "Sin precio".to_string(),
        ..ProductInput::default()
    };
    assert!(matches!(
        client.create_product(&input).await,
        Err(ApiError::Validation(_))
    ));
    assert!(matches!(
        client
            .update_product(&ProductId::new(OIL_FILTER), &ProductPatch::default())
            .await,
        Err(ApiError::Validation(_))
    ));
    assert!(!backend.was_called());
}

#[tokio::test]
async fn test_dashboard() {
    let backend = FakeBackend::start().await;
    let client = admin(&backend).await;

    let stats = client.dashboard().await.unwrap();

    assert_eq!(stats.order_count, 3);
    assert_eq!(stats.count_for(OrderStatus::Pending), 1);
    assert_eq!(stats.count_for(OrderStatus::Delivered), 1);
    assert_eq!(stats.revenue, Decimal::new(41_000, 0));
    assert_eq!(stats.average_order_value, Decimal::new(20_500, 0));
    assert_eq!(stats.user_count, 3);
    assert_eq!(stats.banned_users, 0);

    let low: Vec<_> = stats.low_stock.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(low, vec![SPARK_PLUG, BRAKE_PADS, SHOCK_ABSORBER]);
}
