//! Favorites state against the fake backend.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::http::{Method, StatusCode};

use autoparts_core::ProductId;
use autoparts_integration_tests::{
    BRAKE_PADS, CUSTOMER_EMAIL, CUSTOMER_ID, FakeBackend, OIL_FILTER,
};
use autoparts_storefront::ApiError;
use autoparts_storefront::state::{
    FavoritesContext, MSG_FAVORITE_ADDED, MSG_FAVORITE_REMOVED, RecordingNotifier,
};

async fn customer_favorites(backend: &FakeBackend) -> (FavoritesContext, Arc<RecordingNotifier>) {
    let (api, _store) = backend.signed_in(CUSTOMER_EMAIL).await;
    let notifier = Arc::new(RecordingNotifier::new());
    let favorites = FavoritesContext::new(api, notifier.clone());
    favorites.refresh().await.unwrap();
    (favorites, notifier)
}

#[tokio::test]
async fn test_add_and_remove() {
    let backend = FakeBackend::start().await;
    let (favorites, notifier) = customer_favorites(&backend).await;
    assert_eq!(favorites.count().await, 0);

    let oil = ProductId::new(OIL_FILTER);
    favorites.add(&oil).await.unwrap();

    assert!(favorites.is_favorite(&oil).await);
    assert_eq!(backend.favorites_of(CUSTOMER_ID), vec![OIL_FILTER]);
    let items = favorites.items().await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name(), "Filtro de aceite");
    assert_eq!(
        items[0].product.as_ref().unwrap().brand.as_deref(),
        Some("Bosch")
    );

    favorites.remove(&oil).await.unwrap();
    assert!(!favorites.is_favorite(&oil).await);
    assert_eq!(
        notifier.successes(),
        vec![MSG_FAVORITE_ADDED, MSG_FAVORITE_REMOVED]
    );
    assert_eq!(
        backend.count(&Method::DELETE, &format!("/favorites/{OIL_FILTER}")),
        1
    );
}

#[tokio::test]
async fn test_toggle() {
    let backend = FakeBackend::start().await;
    let (favorites, _notifier) = customer_favorites(&backend).await;
    let pads = ProductId::new(BRAKE_PADS);

    assert!(favorites.toggle(&pads).await.unwrap());
    assert!(!favorites.toggle(&pads).await.unwrap());
    assert!(backend.favorites_of(CUSTOMER_ID).is_empty());
    assert_eq!(
        backend.count(&Method::POST, &format!("/favorites/{BRAKE_PADS}")),
        1
    );
}

#[tokio::test]
async fn test_duplicate_add_reports_conflict() {
    let backend = FakeBackend::start().await;
    let (favorites, notifier) = customer_favorites(&backend).await;
    let oil = ProductId::new(OIL_FILTER);
    favorites.add(&oil).await.unwrap();

    let err = favorites.add(&oil).await.unwrap_err();

    assert!(matches!(err, ApiError::Conflict(_)));
    assert_eq!(
        notifier.errors(),
        vec!["Conflicto: El producto ya está en favoritos"]
    );
    assert_eq!(favorites.count().await, 1);
}

#[tokio::test]
async fn test_signed_out_add_sends_no_request() {
    let backend = FakeBackend::start().await;
    let (api, _store) = backend.client();
    let notifier = Arc::new(RecordingNotifier::new());
    let favorites = FavoritesContext::new(api, notifier.clone());

    favorites.refresh().await.unwrap();
    let err = favorites.add(&ProductId::new(OIL_FILTER)).await.unwrap_err();

    assert!(matches!(err, ApiError::NotAuthenticated(_)));
    assert!(!backend.was_called());
    assert_eq!(
        notifier.errors(),
        vec!["Debes iniciar sesión para gestionar tus favoritos"]
    );
}

#[tokio::test]
async fn test_unauthorized_clears_favorites_silently() {
    let backend = FakeBackend::start().await;
    let (favorites, notifier) = customer_favorites(&backend).await;
    favorites.add(&ProductId::new(OIL_FILTER)).await.unwrap();
    notifier.clear();

    backend.fail_next(StatusCode::UNAUTHORIZED);
    let err = favorites.refresh().await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized));
    assert_eq!(favorites.count().await, 0);
    assert!(favorites.error().await.is_none());
    assert!(notifier.toasts().is_empty());
}
