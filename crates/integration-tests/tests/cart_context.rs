//! Cart state synchronization against the fake backend.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use rust_decimal::Decimal;

use autoparts_core::{CartItemId, ProductId};
use autoparts_integration_tests::{
    BRAKE_PADS, CUSTOMER_EMAIL, CUSTOMER_ID, FakeBackend, OIL_FILTER, SPARK_PLUG,
};
use autoparts_storefront::ApiError;
use autoparts_storefront::error::MSG_SERVER;
use autoparts_storefront::state::{
    CartContext, MSG_ADDED, MSG_CLEARED, MSG_EMPTY_CART, MSG_INSUFFICIENT_STOCK, MSG_REMOVED,
    RecordingNotifier,
};
use autoparts_storefront::types::GuestCartItem;

async fn customer_cart(backend: &FakeBackend) -> (CartContext, Arc<RecordingNotifier>) {
    let (api, _store) = backend.signed_in(CUSTOMER_EMAIL).await;
    let notifier = Arc::new(RecordingNotifier::new());
    (CartContext::new(api, notifier.clone()), notifier)
}

fn backend_item_count(backend: &FakeBackend) -> u32 {
    backend
        .cart_lines(CUSTOMER_ID)
        .iter()
        .map(|(_, quantity)| quantity)
        .sum()
}

#[tokio::test]
async fn test_missing_cart_is_empty() {
    let backend = FakeBackend::start().await;
    let (cart, notifier) = customer_cart(&backend).await;

    cart.refresh().await.unwrap();

    assert!(cart.cart().await.is_none());
    assert!(cart.is_empty().await);
    assert_eq!(cart.item_count().await, 0);
    assert!(notifier.toasts().is_empty());
}

#[tokio::test]
async fn test_add_item_count_matches_backend() {
    let backend = FakeBackend::start().await;
    let (cart, notifier) = customer_cart(&backend).await;
    cart.refresh().await.unwrap();

    cart.add_item(&ProductId::new(OIL_FILTER), 2).await.unwrap();
    cart.add_item(&ProductId::new(BRAKE_PADS), 1).await.unwrap();

    assert_eq!(cart.item_count().await, 3);
    assert_eq!(cart.item_count().await, backend_item_count(&backend));
    assert!(!cart.is_empty().await);
    assert_eq!(cart.total().await, Decimal::new(41_000, 0));
    assert_eq!(notifier.successes(), vec![MSG_ADDED, MSG_ADDED]);

    let snapshot = cart.cart().await.unwrap();
    let line = snapshot.item_for_product(&ProductId::new(OIL_FILTER)).unwrap();
    assert_eq!(line.name(), "Filtro de aceite");
    assert_eq!(line.unit_price, Decimal::new(8_500, 0));
    assert_eq!(line.subtotal, Decimal::new(17_000, 0));
    assert_eq!(snapshot.summary.item_count, 3);

    // Each mutation is followed by a re-fetch
    assert_eq!(backend.count(&Method::POST, "/cart"), 2);
    assert_eq!(backend.count(&Method::GET, "/cart"), 3);
    let body = backend.requests()[1].body.clone().unwrap();
    assert_eq!(body["productId"], OIL_FILTER);
    assert_eq!(body["quantity"], 2);
}

#[tokio::test]
async fn test_signed_out_mutation_sends_no_request() {
    let backend = FakeBackend::start().await;
    let (api, _store) = backend.client();
    let notifier = Arc::new(RecordingNotifier::new());
    let cart = CartContext::new(api, notifier.clone());

    let err = cart.add_item(&ProductId::new(OIL_FILTER), 1).await.unwrap_err();
    assert!(matches!(err, ApiError::NotAuthenticated(_)));

    let err = cart.clear_cart().await.unwrap_err();
    assert!(matches!(err, ApiError::NotAuthenticated(_)));

    assert!(!backend.was_called());
    assert_eq!(
        notifier.errors(),
        vec![
            "Debes iniciar sesión para agregar productos al carrito",
            "Debes iniciar sesión para vaciar el carrito",
        ]
    );
}

#[tokio::test]
async fn test_unauthorized_clears_cart_silently() {
    let backend = FakeBackend::start().await;
    backend.seed_cart(CUSTOMER_ID, &[(OIL_FILTER, 2)]);
    let (cart, notifier) = customer_cart(&backend).await;
    cart.refresh().await.unwrap();
    assert_eq!(cart.item_count().await, 2);

    backend.fail_next(StatusCode::UNAUTHORIZED);
    let err = cart.add_item(&ProductId::new(BRAKE_PADS), 1).await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized));
    assert!(cart.cart().await.is_none());
    assert!(cart.error().await.is_none());
    assert!(notifier.errors().is_empty());
}

#[tokio::test]
async fn test_forbidden_clears_cart_silently() {
    let backend = FakeBackend::start().await;
    let ids = backend.seed_cart(CUSTOMER_ID, &[(OIL_FILTER, 2)]);
    let (cart, notifier) = customer_cart(&backend).await;
    cart.refresh().await.unwrap();

    backend.fail_next(StatusCode::FORBIDDEN);
    let err = cart
        .update_quantity(&CartItemId::new(ids[0].as_str()), 3)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Forbidden));
    assert!(cart.is_empty().await);
    assert!(cart.error().await.is_none());
    assert!(notifier.toasts().is_empty());
}

#[tokio::test]
async fn test_server_error_keeps_cart() {
    let backend = FakeBackend::start().await;
    backend.seed_cart(CUSTOMER_ID, &[(OIL_FILTER, 2)]);
    let (cart, notifier) = customer_cart(&backend).await;
    cart.refresh().await.unwrap();

    backend.fail_next(StatusCode::INTERNAL_SERVER_ERROR);
    let err = cart.add_item(&ProductId::new(BRAKE_PADS), 1).await.unwrap_err();

    assert!(matches!(err, ApiError::Server(_)));
    assert_eq!(cart.item_count().await, 2);
    assert_eq!(cart.error().await.as_deref(), Some(MSG_SERVER));
    assert_eq!(notifier.errors(), vec![MSG_SERVER]);
}

#[tokio::test]
async fn test_backend_rejection_message_is_shown() {
    let backend = FakeBackend::start().await;
    let (cart, notifier) = customer_cart(&backend).await;
    cart.refresh().await.unwrap();

    // Out of stock; nothing in the local cart to check against
    let err = cart.add_item(&ProductId::new(SPARK_PLUG), 1).await.unwrap_err();

    assert_eq!(err.user_message(), "Stock insuficiente");
    assert_eq!(notifier.errors(), vec!["Stock insuficiente"]);
    assert!(backend.cart_lines(CUSTOMER_ID).is_empty());
}

#[tokio::test]
async fn test_update_quantity_to_zero_deletes_line() {
    let backend = FakeBackend::start().await;
    let ids = backend.seed_cart(CUSTOMER_ID, &[(OIL_FILTER, 2)]);
    let (cart, notifier) = customer_cart(&backend).await;
    cart.refresh().await.unwrap();

    let item_id = CartItemId::new(ids[0].as_str());
    cart.update_quantity(&item_id, 0).await.unwrap();

    let path = format!("/cart/items/{}", ids[0]);
    assert_eq!(backend.count(&Method::DELETE, &path), 1);
    assert_eq!(backend.count(&Method::PATCH, &path), 0);
    assert!(cart.is_empty().await);
    assert_eq!(notifier.successes(), vec![MSG_REMOVED]);
}

#[tokio::test]
async fn test_update_quantity() {
    let backend = FakeBackend::start().await;
    let ids = backend.seed_cart(CUSTOMER_ID, &[(OIL_FILTER, 2), (BRAKE_PADS, 1)]);
    let (cart, _notifier) = customer_cart(&backend).await;
    cart.refresh().await.unwrap();

    cart.update_quantity(&CartItemId::new(ids[0].as_str()), 5)
        .await
        .unwrap();

    assert_eq!(cart.item_count().await, 6);
    assert_eq!(cart.item_count().await, backend_item_count(&backend));
    let patch = backend
        .requests()
        .into_iter()
        .find(|r| r.method == Method::PATCH)
        .unwrap();
    assert_eq!(patch.body.unwrap()["quantity"], 5);
}

#[tokio::test]
async fn test_stock_checked_locally() {
    let backend = FakeBackend::start().await;
    let ids = backend.seed_cart(CUSTOMER_ID, &[(BRAKE_PADS, 2)]);
    let (cart, notifier) = customer_cart(&backend).await;
    cart.refresh().await.unwrap();
    backend.clear_requests();

    let err = cart.add_item(&ProductId::new(BRAKE_PADS), 2).await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));

    let err = cart
        .update_quantity(&CartItemId::new(ids[0].as_str()), 4)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));

    assert!(!backend.was_called());
    assert_eq!(
        notifier.errors(),
        vec![MSG_INSUFFICIENT_STOCK, MSG_INSUFFICIENT_STOCK]
    );
    assert_eq!(cart.item_count().await, 2);
}

#[tokio::test]
async fn test_concurrent_adds_reach_backend() {
    let backend = FakeBackend::start().await;
    let (cart, _notifier) = customer_cart(&backend).await;
    cart.refresh().await.unwrap();

    let oil = ProductId::new(OIL_FILTER);
    let pads = ProductId::new(BRAKE_PADS);
    let (a, b) = tokio::join!(cart.add_item(&oil, 1), cart.add_item(&pads, 1));
    a.unwrap();
    b.unwrap();

    assert_eq!(backend.cart_lines(CUSTOMER_ID).len(), 2);
    cart.refresh().await.unwrap();
    assert_eq!(cart.item_count().await, 2);
}

#[tokio::test]
async fn test_clear_cart() {
    let backend = FakeBackend::start().await;
    backend.seed_cart(CUSTOMER_ID, &[(OIL_FILTER, 1), (BRAKE_PADS, 1)]);
    let (cart, notifier) = customer_cart(&backend).await;
    cart.refresh().await.unwrap();

    cart.clear_cart().await.unwrap();

    assert!(cart.is_empty().await);
    assert_eq!(backend.count(&Method::DELETE, "/cart"), 1);
    assert_eq!(notifier.successes(), vec![MSG_CLEARED]);
}

#[tokio::test]
async fn test_merge_guest_cart() {
    let backend = FakeBackend::start().await;
    backend.seed_cart(CUSTOMER_ID, &[(OIL_FILTER, 1)]);
    let (cart, _notifier) = customer_cart(&backend).await;
    cart.refresh().await.unwrap();

    cart.merge_carts(&[]).await.unwrap();
    assert_eq!(backend.count(&Method::POST, "/cart/merge"), 0);

    let guest = vec![
        GuestCartItem {
            product_id: ProductId::new(OIL_FILTER),
            quantity: 2,
        },
        GuestCartItem {
            product_id: ProductId::new(BRAKE_PADS),
            quantity: 1,
        },
    ];
    cart.merge_carts(&guest).await.unwrap();

    assert_eq!(backend.count(&Method::POST, "/cart/merge"), 1);
    assert_eq!(cart.item_count().await, 4);
    assert_eq!(cart.item_count().await, backend_item_count(&backend));
}

#[tokio::test]
async fn test_validate_for_checkout_reports_errors() {
    let backend = FakeBackend::start().await;
    backend.seed_cart(CUSTOMER_ID, &[(BRAKE_PADS, 2)]);
    let (cart, notifier) = customer_cart(&backend).await;
    cart.refresh().await.unwrap();

    backend.set_stock(BRAKE_PADS, 1);
    let validation = cart.validate_for_checkout().await.unwrap();

    assert!(!validation.valid);
    assert_eq!(validation.errors, vec!["Stock insuficiente para Pastillas de freno"]);
    assert_eq!(
        notifier.errors(),
        vec!["Stock insuficiente para Pastillas de freno"]
    );
    assert!(cart.error().await.is_some());

    let err = cart.checkout().await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
    assert!(
        !backend
            .requests()
            .iter()
            .any(|r| r.path.starts_with("/payments"))
    );
}

#[tokio::test]
async fn test_checkout_returns_payment_url() {
    let backend = FakeBackend::start().await;
    backend.seed_cart(CUSTOMER_ID, &[(OIL_FILTER, 1)]);
    let (cart, _notifier) = customer_cart(&backend).await;
    cart.refresh().await.unwrap();

    let url = cart.checkout().await.unwrap();

    assert!(url.starts_with("https://www.mercadopago.com.ar/"));
    assert!(url.ends_with("pref_id=pref-u-cliente"));
    assert_eq!(backend.count(&Method::POST, "/cart/checkout"), 1);
    assert_eq!(
        backend.count(&Method::POST, "/payments/checkout/cart-u-cliente"),
        1
    );
}

#[tokio::test]
async fn test_checkout_prefers_sandbox_url() {
    let backend = FakeBackend::start().await;
    backend.seed_cart(CUSTOMER_ID, &[(OIL_FILTER, 1)]);
    let mut config = backend.config();
    config.use_sandbox = true;
    let (api, _store) = backend.client_with(&config);
    api.sign_in(CUSTOMER_EMAIL, autoparts_integration_tests::PASSWORD)
        .await
        .unwrap();
    let cart = CartContext::new(api, Arc::new(RecordingNotifier::new()));
    cart.refresh().await.unwrap();

    let url = cart.checkout().await.unwrap();
    assert!(url.starts_with("https://sandbox.mercadopago.com.ar/"));
}

#[tokio::test]
async fn test_checkout_with_empty_cart_is_rejected() {
    let backend = FakeBackend::start().await;
    let (cart, notifier) = customer_cart(&backend).await;
    cart.refresh().await.unwrap();

    let err = cart.checkout().await.unwrap_err();

    assert!(matches!(err, ApiError::Validation(_)));
    assert_eq!(notifier.errors(), vec![MSG_EMPTY_CART]);
    assert_eq!(backend.count(&Method::POST, "/cart/checkout"), 0);
}
