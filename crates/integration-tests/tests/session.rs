//! Sign-in, registration and token lifecycle against the fake backend.

#![allow(clippy::unwrap_used)]

use axum::http::Method;

use autoparts_core::{ProductId, UserId, UserRole};
use autoparts_integration_tests::{
    ADMIN_EMAIL, CUSTOMER_EMAIL, CUSTOMER_ID, FakeBackend, OIL_FILTER, PASSWORD,
};
use autoparts_storefront::ApiError;
use autoparts_storefront::TokenStore;
use autoparts_storefront::session::StoredSession;

#[tokio::test]
async fn test_sign_in_persists_session() {
    let backend = FakeBackend::start().await;
    let (api, store) = backend.client();

    let session = api.sign_in(CUSTOMER_EMAIL, PASSWORD).await.unwrap();

    assert_eq!(session.user.id, UserId::new(CUSTOMER_ID));
    assert_eq!(session.user.name, "Lucía Gómez");
    assert!(!session.is_admin());
    assert!(session.claims.expires_at().is_some());
    assert!(store.load().unwrap().is_some());

    let user = api.current_user().unwrap().unwrap();
    assert_eq!(user.email, CUSTOMER_EMAIL);

    let request = &backend.requests()[0];
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.path, "/auth/signin");
    assert_eq!(request.body.as_ref().unwrap()["email"], CUSTOMER_EMAIL);
}

#[tokio::test]
async fn test_admin_role_from_sign_in() {
    let backend = FakeBackend::start().await;
    let (api, _store) = backend.client();

    let session = api.sign_in(ADMIN_EMAIL, PASSWORD).await.unwrap();

    assert!(session.is_admin());
    assert_eq!(session.user.role, UserRole::Admin);
}

#[tokio::test]
async fn test_wrong_password() {
    let backend = FakeBackend::start().await;
    let (api, store) = backend.client();

    let err = api.sign_in(CUSTOMER_EMAIL, "incorrecta").await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized));
    assert!(store.load().unwrap().is_none());
    assert!(api.current_user().unwrap().is_none());
}

#[tokio::test]
async fn test_sign_in_validation_sends_no_request() {
    let backend = FakeBackend::start().await;
    let (api, _store) = backend.client();

    assert!(matches!(
        api.sign_in("no-es-un-email", PASSWORD).await,
        Err(ApiError::Validation(_))
    ));
    assert!(matches!(
        api.sign_in(CUSTOMER_EMAIL, "").await,
        Err(ApiError::Validation(_))
    ));
    assert!(!backend.was_called());
}

#[tokio::test]
async fn test_register_unwraps_data_envelope() {
    let backend = FakeBackend::start().await;
    let (api, store) = backend.client();

    let session = api
        .register("Nuevo Cliente", "nuevo@example.com", "clave-segura")
        .await
        .unwrap();

    assert_eq!(session.user.email, "nuevo@example.com");
    assert_eq!(session.user.name, "Nuevo Cliente");
    assert!(store.load().unwrap().is_some());
    assert_eq!(backend.count(&Method::POST, "/auth/register"), 1);
    assert_eq!(backend.count(&Method::POST, "/auth/signin"), 0);
}

#[tokio::test]
async fn test_register_taken_email() {
    let backend = FakeBackend::start().await;
    let (api, store) = backend.client();

    let err = api
        .register("Otra Persona", CUSTOMER_EMAIL, "clave-segura")
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Conflict(Some(_))));
    assert_eq!(
        err.user_message(),
        "Conflicto: El email ya está registrado"
    );
    assert!(store.load().unwrap().is_none());
}

#[tokio::test]
async fn test_register_short_password_sends_no_request() {
    let backend = FakeBackend::start().await;
    let (api, _store) = backend.client();

    let err = api
        .register("Nuevo", "nuevo@example.com", "123")
        .await
        .unwrap_err();

    assert_eq!(
        err.user_message(),
        "La contraseña debe tener al menos 6 caracteres"
    );
    assert!(!backend.was_called());
}

#[tokio::test]
async fn test_expired_token_is_cleared() {
    let backend = FakeBackend::start().await;
    let (api, store) = backend.client();
    store
        .save(&StoredSession::new(backend.token_for(CUSTOMER_ID, -60), None))
        .unwrap();

    assert!(api.current_user().unwrap().is_none());
    assert!(store.load().unwrap().is_none());
}

#[tokio::test]
async fn test_user_built_from_token_claims() {
    let backend = FakeBackend::start().await;
    let (api, store) = backend.client();
    store
        .save(&StoredSession::new(backend.token_for(CUSTOMER_ID, 600), None))
        .unwrap();

    let user = api.current_user().unwrap().unwrap();
    assert_eq!(user.id, UserId::new(CUSTOMER_ID));
    assert_eq!(user.email, CUSTOMER_EMAIL);
    assert_eq!(user.role, UserRole::User);
}

#[tokio::test]
async fn test_garbage_token_is_cleared() {
    let backend = FakeBackend::start().await;
    let (api, store) = backend.client();
    store
        .save(&StoredSession::new("not-a-jwt", None))
        .unwrap();

    assert!(
        api.require_session("ver tus pedidos")
            .unwrap_err()
            .user_message()
            .contains("ver tus pedidos")
    );
    assert!(store.load().unwrap().is_none());
}

#[tokio::test]
async fn test_bearer_token_sent_and_sign_out() {
    let backend = FakeBackend::start().await;
    let (api, store) = backend.signed_in(CUSTOMER_EMAIL).await;

    // Only the customer's own orders come back
    let orders = api.list_orders().await.unwrap();
    assert_eq!(orders.len(), 2);

    api.sign_out().unwrap();
    assert!(store.load().unwrap().is_none());

    let product = api.get_product(&ProductId::new(OIL_FILTER)).await;
    assert!(product.is_ok(), "catalog is public");
    assert!(matches!(
        api.list_orders().await,
        Err(ApiError::Unauthorized)
    ));
}
