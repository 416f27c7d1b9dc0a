//! HTTP client for the auto parts REST backend.
//!
//! Every service call goes through [`ApiClient`]: it resolves the base URL,
//! attaches `Authorization: Bearer <token>` from the session store, maps
//! non-success statuses to [`ApiError`], and unwraps `{data: ...}` envelopes.
//! Product lookups are cached using `moka`.

pub(crate) mod cache;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::Method;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::config::ClientConfig;
use crate::error::{ApiError, Result, extract_error_message};
use crate::session::TokenStore;
use crate::types::normalize_ids;

use cache::{CacheKey, CacheValue};

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the REST backend.
///
/// Cheap to clone; clones share the HTTP connection pool, the session store
/// and the product cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
    store: Arc<dyn TokenStore>,
    cache: Cache<CacheKey, CacheValue>,
    use_sandbox: bool,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .field("use_sandbox", &self.inner.use_sandbox)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client from configuration and a session store.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, store: Arc<dyn TokenStore>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.http_timeout {
            builder = builder.timeout(timeout);
        }

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.product_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client: builder.build()?,
                base_url: config.get_api_url().to_string(),
                store,
                cache,
                use_sandbox: config.use_sandbox,
            }),
        })
    }

    /// Base URL requests are sent to, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Session store backing this client.
    #[must_use]
    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.inner.store
    }

    /// Whether payment redirects prefer the sandbox URL.
    #[must_use]
    pub fn use_sandbox(&self) -> bool {
        self.inner.use_sandbox
    }

    // =========================================================================
    // Request primitives
    // =========================================================================

    /// `GET` a resource and decode the unwrapped envelope.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status or a body
    /// that does not decode as `T`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let value = self.send(Method::GET, path, &[], None).await?;
        unwrap_envelope(value)
    }

    /// `GET` with query parameters, returning the raw (ID-normalized) body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or non-success status.
    pub async fn get_raw(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        self.send(Method::GET, path, query, None).await
    }

    /// `POST` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let body = serde_json::to_value(body)?;
        let value = self.send(Method::POST, path, &[], Some(body)).await?;
        unwrap_envelope(value)
    }

    /// `POST` a JSON body, returning the raw (ID-normalized) body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or non-success status.
    pub async fn post_raw<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        let body = serde_json::to_value(body)?;
        self.send(Method::POST, path, &[], Some(body)).await
    }

    /// `POST` without a body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let value = self.send(Method::POST, path, &[], None).await?;
        unwrap_envelope(value)
    }

    /// `PATCH` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let body = serde_json::to_value(body)?;
        let value = self.send(Method::PATCH, path, &[], Some(body)).await?;
        unwrap_envelope(value)
    }

    /// `PATCH` without a body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn patch_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let value = self.send(Method::PATCH, path, &[], None).await?;
        unwrap_envelope(value)
    }

    /// `DELETE` a resource.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let value = self.send(Method::DELETE, path, &[], None).await?;
        unwrap_envelope(value)
    }

    /// Bearer token from the session store, if any.
    fn bearer(&self) -> Result<Option<String>> {
        Ok(self
            .inner
            .store
            .load()?
            .map(|session| session.token.expose_secret().to_string()))
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<Value> {
        let mut url = format!("{}{path}", self.inner.base_url);
        if !query.is_empty() {
            let encoded = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())))
                .finish();
            url.push('?');
            url.push_str(&encoded);
        }

        let mut request = self
            .inner
            .client
            .request(method.clone(), &url)
            .header("Accept", "application/json");
        if let Some(token) = self.bearer()? {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            warn!(method = %method, path, error = %e, "request to backend failed");
            ApiError::Http(e)
        })?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!(
                method = %method,
                path,
                status = %status,
                body = %text.chars().take(200).collect::<String>(),
                "backend returned non-success status"
            );
            return Err(ApiError::from_status(status, extract_error_message(&text)));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        let mut value: Value = serde_json::from_str(&text).map_err(|e| {
            error!(
                method = %method,
                path,
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "failed to parse backend response"
            );
            ApiError::Decode(e)
        })?;
        normalize_ids(&mut value);
        debug!(method = %method, path, status = %status, "backend request succeeded");
        Ok(value)
    }

    // =========================================================================
    // Cache
    // =========================================================================

    pub(crate) async fn cache_get(&self, key: &CacheKey) -> Option<CacheValue> {
        self.inner.cache.get(key).await
    }

    pub(crate) async fn cache_insert(&self, key: CacheKey, value: CacheValue) {
        self.inner.cache.insert(key, value).await;
    }

    /// Drop every cached product lookup.
    pub fn invalidate_product_cache(&self) {
        debug!("Invalidating product cache");
        self.inner.cache.invalidate_all();
    }

    /// Product cache time-to-live.
    #[must_use]
    pub fn product_cache_ttl(&self) -> Option<Duration> {
        self.inner.cache.policy().time_to_live()
    }
}

/// Decode a response body that may or may not be wrapped in `{data: ...}`.
///
/// A non-null `data` member is tried first; if it does not decode as `T`,
/// the whole body is.
///
/// # Errors
///
/// Returns the decode error of the whole body when neither shape fits.
pub fn unwrap_envelope<T: DeserializeOwned>(mut value: Value) -> Result<T> {
    if let Some(data) = value.get("data").filter(|d| !d.is_null())
        && let Ok(decoded) = T::deserialize(data)
    {
        return Ok(decoded);
    }
    if let Some(object) = value.as_object_mut() {
        object.remove("data");
    }
    Ok(T::deserialize(value)?)
}

/// Decode a list response: a raw array, `{data: [...]}`, `{<key>: [...]}` or
/// `{data: {<key>: [...]}}`.
///
/// # Errors
///
/// Returns a decode error if no list is found or an element is invalid.
pub fn unwrap_list<T: DeserializeOwned>(value: Value, key: &str) -> Result<Vec<T>> {
    let list = match value {
        list @ Value::Array(_) => list,
        Value::Null => return Ok(Vec::new()),
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Object(mut inner)) => inner.remove(key).unwrap_or(Value::Null),
            Some(data @ Value::Array(_)) => data,
            _ => map.remove(key).unwrap_or(Value::Null),
        },
        other => other,
    };
    if list.is_null() {
        return Err(ApiError::Decode(<serde_json::Error as serde::de::Error>::custom(
            format!("response contains no {key} list"),
        )));
    }
    Ok(Vec::<T>::deserialize(list)?)
}

/// Percent-encode a value for use as a single path segment.
#[must_use]
pub fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::types::Cart;

    #[test]
    fn test_unwrap_envelope_prefers_data() {
        let cart: Cart = unwrap_envelope(json!({
            "success": true,
            "data": { "id": "c1", "items": [] }
        }))
        .unwrap();
        assert_eq!(cart.id.unwrap().as_str(), "c1");
    }

    #[test]
    fn test_unwrap_envelope_raw_body() {
        let cart: Cart = unwrap_envelope(json!({ "id": "c2", "items": [] })).unwrap();
        assert_eq!(cart.id.unwrap().as_str(), "c2");
    }

    #[test]
    fn test_unwrap_envelope_null_data_falls_back() {
        let value: Option<Cart> = unwrap_envelope(Value::Null).unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn test_unwrap_envelope_error() {
        let result: Result<u32> = unwrap_envelope(json!({ "data": "x" }));
        assert!(matches!(result, Err(ApiError::Decode(_))));
    }

    #[test]
    fn test_unwrap_list_shapes() {
        let raw: Vec<u32> = unwrap_list(json!([1, 2]), "orders").unwrap();
        assert_eq!(raw, vec![1, 2]);
        let data: Vec<u32> = unwrap_list(json!({ "data": [3] }), "orders").unwrap();
        assert_eq!(data, vec![3]);
        let keyed: Vec<u32> = unwrap_list(json!({ "orders": [4], "total": 1 }), "orders").unwrap();
        assert_eq!(keyed, vec![4]);
        let nested: Vec<u32> =
            unwrap_list(json!({ "data": { "orders": [5] } }), "orders").unwrap();
        assert_eq!(nested, vec![5]);
        let empty: Vec<u32> = unwrap_list(Value::Null, "orders").unwrap();
        assert!(empty.is_empty());
        assert!(unwrap_list::<u32>(json!({ "message": "ok" }), "orders").is_err());
    }

    #[test]
    fn test_segment_encoding() {
        assert_eq!(segment("a/b c"), "a%2Fb%20c");
        assert_eq!(segment("64b7f0"), "64b7f0");
    }
}
