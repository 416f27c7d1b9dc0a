//! Integration test support for the Autoparts client.
//!
//! [`FakeBackend`] runs an in-process REST backend on `127.0.0.1:0` that
//! speaks the same JSON dialect as the real one, including its quirks
//! (`_id` keys, `{data: ...}` envelopes, redundant summary fields). Every
//! request is recorded so tests can assert on what the client sent.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p autoparts-integration-tests
//! ```
//!
//! # Seed data
//!
//! - [`CUSTOMER_EMAIL`] / [`ADMIN_EMAIL`] / [`OTHER_EMAIL`], all with [`PASSWORD`]
//! - Four products, one of them out of stock
//! - Three orders: two for the customer, one for the other user

#![allow(clippy::missing_panics_doc, clippy::must_use_candidate)]

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use serde_json::{Value, json};

use autoparts_storefront::{ApiClient, ClientConfig, MemoryTokenStore, TokenStore};

pub const PASSWORD: &str = "secreto123";
pub const CUSTOMER_ID: &str = "u-cliente";
pub const CUSTOMER_EMAIL: &str = "cliente@example.com";
pub const ADMIN_ID: &str = "u-admin";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const OTHER_ID: &str = "u-otro";
pub const OTHER_EMAIL: &str = "otro@example.com";

pub const OIL_FILTER: &str = "p-filtro";
pub const BRAKE_PADS: &str = "p-pastillas";
pub const SPARK_PLUG: &str = "p-bujia";
pub const SHOCK_ABSORBER: &str = "p-amortiguador";

// =============================================================================
// Backend state
// =============================================================================

/// A request as the backend received it. `path` excludes the `/api` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct FakeUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: &'static str,
    pub banned: bool,
}

#[derive(Debug, Clone)]
pub struct FakeProduct {
    pub id: String,
    pub name: String,
    /// Whole pesos.
    pub price: i64,
    pub stock: u32,
    pub category: String,
    pub brand: String,
}

#[derive(Debug, Clone)]
pub struct FakeLine {
    pub id: String,
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone)]
pub struct FakeOrder {
    pub id: String,
    pub user_id: String,
    /// `(product_id, quantity, unit price)`.
    pub items: Vec<(String, u32, i64)>,
    pub status: String,
}

#[derive(Debug, Default)]
pub struct BackendState {
    pub users: Vec<FakeUser>,
    pub products: Vec<FakeProduct>,
    /// Cart lines per user; a missing entry means the user has no cart yet.
    pub carts: HashMap<String, Vec<FakeLine>>,
    pub favorites: HashMap<String, Vec<String>>,
    pub orders: Vec<FakeOrder>,
    pub requests: Vec<RecordedRequest>,
    /// Statuses returned, in order, for the next requests instead of handling them.
    pub failures: VecDeque<StatusCode>,
    next_id: u32,
}

impl BackendState {
    fn seeded() -> Self {
        let user = |id: &str, name: &str, email: &str, role| FakeUser {
            id: id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            password: PASSWORD.to_string(),
            role,
            banned: false,
        };
        let product = |id: &str, name: &str, price, stock, category: &str, brand: &str| {
            FakeProduct {
                id: id.to_string(),
                name: name.to_string(),
                price,
                stock,
                category: category.to_string(),
                brand: brand.to_string(),
            }
        };
        let order = |id: &str, user_id: &str, items: &[(&str, u32, i64)], status: &str| FakeOrder {
            id: id.to_string(),
            user_id: user_id.to_string(),
            items: items
                .iter()
                .map(|(p, q, price)| ((*p).to_string(), *q, *price))
                .collect(),
            status: status.to_string(),
        };

        Self {
            users: vec![
                user(CUSTOMER_ID, "Lucía Gómez", CUSTOMER_EMAIL, "user"),
                user(ADMIN_ID, "Admin", ADMIN_EMAIL, "admin"),
                user(OTHER_ID, "Martín Ruiz", OTHER_EMAIL, "user"),
            ],
            products: vec![
                product(OIL_FILTER, "Filtro de aceite", 8_500, 10, "Filtros", "Bosch"),
                product(BRAKE_PADS, "Pastillas de freno", 24_000, 3, "Frenos", "Ferodo"),
                product(SPARK_PLUG, "Bujía iridium", 12_000, 0, "Encendido", "NGK"),
                product(
                    SHOCK_ABSORBER,
                    "Amortiguador delantero",
                    65_000,
                    4,
                    "Suspensión",
                    "Monroe",
                ),
            ],
            orders: vec![
                order("o-1", CUSTOMER_ID, &[(OIL_FILTER, 2, 8_500)], "paid"),
                order("o-2", CUSTOMER_ID, &[(BRAKE_PADS, 1, 24_000)], "delivered"),
                order("o-3", OTHER_ID, &[(SHOCK_ABSORBER, 2, 65_000)], "pending"),
            ],
            next_id: 100,
            ..Self::default()
        }
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn user(&self, id: &str) -> Option<&FakeUser> {
        self.users.iter().find(|u| u.id == id)
    }

    fn product(&self, id: &str) -> Option<&FakeProduct> {
        self.products.iter().find(|p| p.id == id)
    }
}

type Shared = Arc<Mutex<BackendState>>;

fn lock(state: &Shared) -> MutexGuard<'_, BackendState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Handle
// =============================================================================

/// A running fake backend. The server stops when the test's runtime shuts down.
#[derive(Clone)]
pub struct FakeBackend {
    addr: SocketAddr,
    state: Shared,
}

impl FakeBackend {
    /// Start a seeded backend on an ephemeral port.
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(BackendState::seeded()));
        let app = router(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });

        Self { addr, state }
    }

    pub fn api_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::for_api_url(&self.api_url()).expect("valid api url")
    }

    /// A client with an empty in-memory session.
    pub fn client(&self) -> (ApiClient, Arc<MemoryTokenStore>) {
        self.client_with(&self.config())
    }

    pub fn client_with(&self, config: &ClientConfig) -> (ApiClient, Arc<MemoryTokenStore>) {
        let store = Arc::new(MemoryTokenStore::new());
        let api = ApiClient::new(config, Arc::clone(&store) as Arc<dyn TokenStore>)
            .expect("build api client");
        (api, store)
    }

    /// A client signed in through `POST /auth/signin`. The sign-in request
    /// is dropped from the log.
    pub async fn signed_in(&self, email: &str) -> (ApiClient, Arc<MemoryTokenStore>) {
        let (api, store) = self.client();
        api.sign_in(email, PASSWORD).await.expect("sign in");
        self.clear_requests();
        (api, store)
    }

    /// Issue a token for a seeded user expiring `expires_in` seconds from now
    /// (negative for an already expired token).
    pub fn token_for(&self, user_id: &str, expires_in: i64) -> String {
        let state = lock(&self.state);
        let user = state.user(user_id).expect("seeded user");
        issue_token(user, chrono::Utc::now().timestamp() + expires_in)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state).requests.clone()
    }

    pub fn clear_requests(&self) {
        lock(&self.state).requests.clear();
    }

    /// Number of recorded requests with this method and path.
    pub fn count(&self, method: &Method, path: &str) -> usize {
        lock(&self.state)
            .requests
            .iter()
            .filter(|r| r.method == *method && r.path == path)
            .count()
    }

    /// Whether any request was recorded.
    pub fn was_called(&self) -> bool {
        !lock(&self.state).requests.is_empty()
    }

    /// Answer the next request with `status` instead of handling it.
    pub fn fail_next(&self, status: StatusCode) {
        lock(&self.state).failures.push_back(status);
    }

    pub fn set_stock(&self, product_id: &str, stock: u32) {
        let mut state = lock(&self.state);
        if let Some(product) = state.products.iter_mut().find(|p| p.id == product_id) {
            product.stock = stock;
        }
    }

    /// `(product_id, quantity)` for each line of a user's cart.
    pub fn cart_lines(&self, user_id: &str) -> Vec<(String, u32)> {
        lock(&self.state)
            .carts
            .get(user_id)
            .map(|lines| {
                lines
                    .iter()
                    .map(|l| (l.product_id.clone(), l.quantity))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Put lines straight into a user's cart; returns the new line IDs.
    pub fn seed_cart(&self, user_id: &str, lines: &[(&str, u32)]) -> Vec<String> {
        let mut state = lock(&self.state);
        let mut ids = Vec::new();
        let mut new_lines = Vec::new();
        for (product_id, quantity) in lines {
            let id = state.next_id("ci");
            ids.push(id.clone());
            new_lines.push(FakeLine {
                id,
                product_id: (*product_id).to_string(),
                quantity: *quantity,
            });
        }
        state
            .carts
            .entry(user_id.to_string())
            .or_default()
            .extend(new_lines);
        ids
    }

    pub fn favorites_of(&self, user_id: &str) -> Vec<String> {
        lock(&self.state)
            .favorites
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn is_banned(&self, user_id: &str) -> bool {
        lock(&self.state).user(user_id).is_some_and(|u| u.banned)
    }

    pub fn order_status(&self, order_id: &str) -> Option<String> {
        lock(&self.state)
            .orders
            .iter()
            .find(|o| o.id == order_id)
            .map(|o| o.status.clone())
    }
}

// =============================================================================
// Router
// =============================================================================

fn router(state: Shared) -> Router {
    let api = Router::new()
        .route("/auth/signin", post(sign_in))
        .route("/auth/register", post(register))
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product).patch(update_product).delete(delete_product),
        )
        .route("/cart", get(get_cart).post(add_to_cart).delete(clear_cart))
        .route(
            "/cart/items/{id}",
            patch(update_cart_item).delete(remove_cart_item),
        )
        .route("/cart/merge", post(merge_cart))
        .route("/cart/checkout", post(validate_cart))
        .route("/favorites", get(list_favorites))
        .route(
            "/favorites/{product_id}",
            post(add_favorite).delete(remove_favorite),
        )
        .route("/orders", get(list_orders))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/status", patch(update_order_status))
        .route("/payments/checkout/{cart_id}", post(create_preference))
        .route("/users", get(list_users))
        .route("/users/{id}", get(get_user))
        .route("/users/{id}/toggle-ban", patch(toggle_ban));

    Router::new()
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(Arc::clone(&state), record))
        .with_state(state)
}

/// Record the request, then either answer with a queued failure or pass it on.
async fn record(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();
    let json_body = serde_json::from_slice::<Value>(&bytes).ok();

    let failure = {
        let mut state = lock(&state);
        state.requests.push(RecordedRequest {
            method: parts.method.clone(),
            path: parts
                .uri
                .path()
                .strip_prefix("/api")
                .unwrap_or(parts.uri.path())
                .to_string(),
            query: parts.uri.query().map(str::to_string),
            body: json_body,
        });
        state.failures.pop_front()
    };

    if let Some(status) = failure {
        let message = match status {
            StatusCode::UNAUTHORIZED => "Token inválido o expirado",
            StatusCode::FORBIDDEN => "Acceso denegado",
            _ => "Error interno",
        };
        return error(status, message);
    }

    next.run(Request::from_parts(parts, bytes.into())).await
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "message": message }))).into_response()
}

fn ok(body: Value) -> Response {
    Json(body).into_response()
}

// =============================================================================
// Auth
// =============================================================================

fn issue_token(user: &FakeUser, exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        json!({
            "sub": user.id,
            "email": user.email,
            "name": user.name,
            "role": user.role,
            "exp": exp,
        })
        .to_string(),
    );
    format!("{header}.{payload}.fake-signature")
}

fn user_json(user: &FakeUser) -> Value {
    json!({
        "_id": user.id,
        "name": user.name,
        "email": user.email,
        "role": user.role,
        "isBanned": user.banned,
        "createdAt": "2024-03-01T12:00:00Z",
    })
}

/// The user the bearer token belongs to, or the 401/403 response.
fn authenticate(state: &BackendState, headers: &HeaderMap) -> Result<FakeUser, Response> {
    let unauthorized = || error(StatusCode::UNAUTHORIZED, "Token no proporcionado");

    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(unauthorized)?;

    let claims: Value = token
        .split('.')
        .nth(1)
        .and_then(|p| URL_SAFE_NO_PAD.decode(p).ok())
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .ok_or_else(unauthorized)?;

    if claims["exp"]
        .as_i64()
        .is_some_and(|exp| exp <= chrono::Utc::now().timestamp())
    {
        return Err(error(StatusCode::UNAUTHORIZED, "Token expirado"));
    }

    let user = claims["sub"]
        .as_str()
        .and_then(|id| state.user(id))
        .cloned()
        .ok_or_else(unauthorized)?;
    if user.banned {
        return Err(error(StatusCode::FORBIDDEN, "Usuario bloqueado"));
    }
    Ok(user)
}

fn authenticate_admin(state: &BackendState, headers: &HeaderMap) -> Result<FakeUser, Response> {
    let user = authenticate(state, headers)?;
    if user.role != "admin" {
        return Err(error(StatusCode::FORBIDDEN, "Se requiere rol de administrador"));
    }
    Ok(user)
}

#[derive(Deserialize)]
struct Credentials {
    #[serde(default)]
    name: String,
    email: String,
    password: String,
}

async fn sign_in(State(state): State<Shared>, Json(body): Json<Credentials>) -> Response {
    let state = lock(&state);
    let Some(user) = state
        .users
        .iter()
        .find(|u| u.email == body.email && u.password == body.password)
    else {
        return error(StatusCode::UNAUTHORIZED, "Credenciales inválidas");
    };
    if user.banned {
        return error(StatusCode::FORBIDDEN, "Usuario bloqueado");
    }
    let token = issue_token(user, chrono::Utc::now().timestamp() + 3_600);
    ok(json!({ "token": token, "user": user_json(user) }))
}

async fn register(State(state): State<Shared>, Json(body): Json<Credentials>) -> Response {
    let mut state = lock(&state);
    if state.users.iter().any(|u| u.email == body.email) {
        return error(StatusCode::CONFLICT, "El email ya está registrado");
    }
    let id = state.next_id("u");
    let user = FakeUser {
        id,
        name: body.name,
        email: body.email,
        password: body.password,
        role: "user",
        banned: false,
    };
    let token = issue_token(&user, chrono::Utc::now().timestamp() + 3_600);
    let response = json!({
        "success": true,
        "data": { "accessToken": token, "user": user_json(&user) }
    });
    state.users.push(user);
    (StatusCode::CREATED, Json(response)).into_response()
}

// =============================================================================
// Products
// =============================================================================

fn product_json(product: &FakeProduct) -> Value {
    json!({
        "_id": product.id,
        "name": product.name,
        "description": format!("{} marca {}", product.name, product.brand),
        "price": product.price,
        "stock": product.stock,
        "category": product.category,
        "brand": { "_id": format!("b-{}", product.brand.to_lowercase()), "name": product.brand },
        "images": [format!("https://cdn.example.com/{}.jpg", product.id)],
        "compatibleVehicles": [{ "make": "Ford", "model": "Fiesta", "year": 2012 }],
    })
}

async fn list_products(
    State(state): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let state = lock(&state);
    let param = |key: &str| query.get(key).map(String::as_str);

    let mut products: Vec<&FakeProduct> = state
        .products
        .iter()
        .filter(|p| param("category").is_none_or(|c| p.category.eq_ignore_ascii_case(c)))
        .filter(|p| param("brand").is_none_or(|b| p.brand.eq_ignore_ascii_case(b)))
        .filter(|p| {
            param("search").is_none_or(|s| p.name.to_lowercase().contains(&s.to_lowercase()))
        })
        .filter(|p| param("inStock") != Some("true") || p.stock > 0)
        .filter(|p| {
            param("minPrice")
                .and_then(|v| v.parse::<i64>().ok())
                .is_none_or(|min| p.price >= min)
        })
        .filter(|p| {
            param("maxPrice")
                .and_then(|v| v.parse::<i64>().ok())
                .is_none_or(|max| p.price <= max)
        })
        .collect();

    match param("sort") {
        Some("price_asc") => products.sort_by_key(|p| p.price),
        Some("price_desc") => products.sort_by_key(|p| std::cmp::Reverse(p.price)),
        Some("name") => products.sort_by(|a, b| a.name.cmp(&b.name)),
        _ => {}
    }

    let total = products.len();
    let page: usize = param("page").and_then(|v| v.parse().ok()).unwrap_or(1);
    let limit: usize = param("limit").and_then(|v| v.parse().ok()).unwrap_or(20);
    let data: Vec<Value> = products
        .into_iter()
        .skip(page.saturating_sub(1) * limit)
        .take(limit)
        .map(product_json)
        .collect();

    ok(json!({ "data": data, "total": total, "page": page, "limit": limit }))
}

async fn get_product(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let state = lock(&state);
    match state.product(&id) {
        Some(product) => ok(json!({ "success": true, "data": product_json(product) })),
        None => error(StatusCode::NOT_FOUND, "Producto no encontrado"),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductBody {
    name: Option<String>,
    price: Option<Value>,
    stock: Option<u32>,
    category: Option<String>,
    brand: Option<String>,
}

/// Prices arrive as decimal strings or numbers; the catalog keeps whole pesos.
fn whole_pesos(raw: &Value) -> Option<i64> {
    let decimal: Decimal = match raw {
        Value::String(s) => s.parse().ok()?,
        Value::Number(n) => n.to_string().parse().ok()?,
        _ => return None,
    };
    decimal.trunc().to_i64()
}

async fn create_product(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<ProductBody>,
) -> Response {
    let mut state = lock(&state);
    if let Err(response) = authenticate_admin(&state, &headers) {
        return response;
    }
    let (Some(name), Some(price)) = (body.name, body.price.as_ref().and_then(whole_pesos))
    else {
        return error(StatusCode::BAD_REQUEST, "Nombre y precio son obligatorios");
    };
    let product = FakeProduct {
        id: state.next_id("p"),
        name,
        price,
        stock: body.stock.unwrap_or_default(),
        category: body.category.unwrap_or_default(),
        brand: body.brand.unwrap_or_default(),
    };
    let response = product_json(&product);
    state.products.push(product);
    (StatusCode::CREATED, Json(json!({ "data": response }))).into_response()
}

async fn update_product(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<ProductBody>,
) -> Response {
    let mut state = lock(&state);
    if let Err(response) = authenticate_admin(&state, &headers) {
        return response;
    }
    let Some(product) = state.products.iter_mut().find(|p| p.id == id) else {
        return error(StatusCode::NOT_FOUND, "Producto no encontrado");
    };
    if let Some(name) = body.name {
        product.name = name;
    }
    if let Some(price) = body.price.as_ref().and_then(whole_pesos) {
        product.price = price;
    }
    if let Some(stock) = body.stock {
        product.stock = stock;
    }
    if let Some(category) = body.category {
        product.category = category;
    }
    if let Some(brand) = body.brand {
        product.brand = brand;
    }
    ok(json!({ "data": product_json(product) }))
}

async fn delete_product(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let mut state = lock(&state);
    if let Err(response) = authenticate_admin(&state, &headers) {
        return response;
    }
    let before = state.products.len();
    state.products.retain(|p| p.id != id);
    if state.products.len() == before {
        return error(StatusCode::NOT_FOUND, "Producto no encontrado");
    }
    StatusCode::NO_CONTENT.into_response()
}

// =============================================================================
// Cart
// =============================================================================

/// The cart in the backend's shape, with the summary spelled several ways.
fn cart_json(state: &BackendState, user_id: &str, lines: &[FakeLine]) -> Value {
    let mut subtotal = 0_i64;
    let mut count = 0_u32;
    let items: Vec<Value> = lines
        .iter()
        .map(|line| {
            let product = state.product(&line.product_id);
            let price = product.map_or(0, |p| p.price);
            let line_total = price * i64::from(line.quantity);
            subtotal += line_total;
            count += line.quantity;
            json!({
                "_id": line.id,
                "product": product.map(|p| json!({
                    "_id": p.id,
                    "name": p.name,
                    "price": p.price,
                    "stock": p.stock,
                })),
                "quantity": line.quantity,
                "price": price,
                "subtotal": line_total,
            })
        })
        .collect();

    json!({
        "success": true,
        "data": {
            "_id": format!("cart-{user_id}"),
            "user": user_id,
            "items": items,
            "subTotal": subtotal,
            "totalAmount": subtotal,
            "summary": { "subtotal": subtotal, "total": subtotal, "itemCount": count },
        }
    })
}

async fn get_cart(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = lock(&state);
    let user = match authenticate(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    match state.carts.get(&user.id) {
        Some(lines) => ok(cart_json(&state, &user.id, lines)),
        None => error(StatusCode::NOT_FOUND, "Carrito no encontrado"),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddBody {
    product_id: String,
    quantity: u32,
}

fn add_line(state: &mut BackendState, user_id: &str, product_id: &str, quantity: u32) -> Result<(), Response> {
    let Some(stock) = state.product(product_id).map(|p| p.stock) else {
        return Err(error(StatusCode::NOT_FOUND, "Producto no encontrado"));
    };
    let in_cart = state
        .carts
        .get(user_id)
        .and_then(|lines| lines.iter().find(|l| l.product_id == product_id))
        .map_or(0, |l| l.quantity);
    if in_cart + quantity > stock {
        return Err(error(StatusCode::BAD_REQUEST, "Stock insuficiente"));
    }

    let id = state.next_id("ci");
    let lines = state.carts.entry(user_id.to_string()).or_default();
    match lines.iter_mut().find(|l| l.product_id == product_id) {
        Some(line) => line.quantity += quantity,
        None => lines.push(FakeLine {
            id,
            product_id: product_id.to_string(),
            quantity,
        }),
    }
    Ok(())
}

async fn add_to_cart(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<AddBody>,
) -> Response {
    let mut state = lock(&state);
    let user = match authenticate(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    match add_line(&mut state, &user.id, &body.product_id, body.quantity) {
        Ok(()) => ok(json!({ "success": true, "message": "Producto agregado" })),
        Err(response) => response,
    }
}

async fn clear_cart(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = lock(&state);
    let user = match authenticate(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    state.carts.insert(user.id, Vec::new());
    ok(json!({ "success": true }))
}

#[derive(Deserialize)]
struct QuantityBody {
    quantity: u32,
}

async fn update_cart_item(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<QuantityBody>,
) -> Response {
    let mut state = lock(&state);
    let user = match authenticate(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let Some(product_id) = state
        .carts
        .get(&user.id)
        .and_then(|lines| lines.iter().find(|l| l.id == id))
        .map(|l| l.product_id.clone())
    else {
        return error(StatusCode::NOT_FOUND, "Item no encontrado");
    };
    if state.product(&product_id).is_some_and(|p| body.quantity > p.stock) {
        return error(StatusCode::BAD_REQUEST, "Stock insuficiente");
    }
    if let Some(line) = state
        .carts
        .get_mut(&user.id)
        .and_then(|lines| lines.iter_mut().find(|l| l.id == id))
    {
        line.quantity = body.quantity;
    }
    ok(json!({ "success": true }))
}

async fn remove_cart_item(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let mut state = lock(&state);
    let user = match authenticate(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let Some(lines) = state.carts.get_mut(&user.id) else {
        return error(StatusCode::NOT_FOUND, "Item no encontrado");
    };
    let before = lines.len();
    lines.retain(|l| l.id != id);
    if lines.len() == before {
        return error(StatusCode::NOT_FOUND, "Item no encontrado");
    }
    ok(json!({ "success": true }))
}

#[derive(Deserialize)]
struct MergeBody {
    items: Vec<AddBody>,
}

async fn merge_cart(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<MergeBody>,
) -> Response {
    let mut state = lock(&state);
    let user = match authenticate(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    // Lines that do not fit the stock are skipped, as the real backend does.
    for item in body.items {
        let _ = add_line(&mut state, &user.id, &item.product_id, item.quantity);
    }
    ok(json!({ "success": true }))
}

async fn validate_cart(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = lock(&state);
    let user = match authenticate(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let lines = state.carts.get(&user.id).cloned().unwrap_or_default();
    let errors: Vec<Value> = lines
        .iter()
        .filter_map(|line| {
            let product = state.product(&line.product_id)?;
            (line.quantity > product.stock).then(|| {
                json!({ "message": format!("Stock insuficiente para {}", product.name) })
            })
        })
        .collect();
    let mut cart = cart_json(&state, &user.id, &lines);
    ok(json!({
        "isValid": errors.is_empty(),
        "errors": errors,
        "cart": cart["data"].take(),
    }))
}

// =============================================================================
// Favorites
// =============================================================================

async fn list_favorites(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = lock(&state);
    let user = match authenticate(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let favorites: Vec<Value> = state
        .favorites
        .get(&user.id)
        .into_iter()
        .flatten()
        .filter_map(|product_id| state.product(product_id))
        .map(|product| {
            json!({
                "_id": format!("fav-{}", product.id),
                "product": product_json(product),
                "createdAt": "2024-05-10T09:30:00Z",
            })
        })
        .collect();
    ok(Value::Array(favorites))
}

async fn add_favorite(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(product_id): Path<String>,
) -> Response {
    let mut state = lock(&state);
    let user = match authenticate(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    if state.product(&product_id).is_none() {
        return error(StatusCode::NOT_FOUND, "Producto no encontrado");
    }
    let favorites = state.favorites.entry(user.id).or_default();
    if favorites.contains(&product_id) {
        return error(StatusCode::CONFLICT, "El producto ya está en favoritos");
    }
    favorites.push(product_id);
    (StatusCode::CREATED, Json(json!({ "success": true }))).into_response()
}

async fn remove_favorite(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(product_id): Path<String>,
) -> Response {
    let mut state = lock(&state);
    let user = match authenticate(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    if let Some(favorites) = state.favorites.get_mut(&user.id) {
        favorites.retain(|p| *p != product_id);
    }
    StatusCode::NO_CONTENT.into_response()
}

// =============================================================================
// Orders and payments
// =============================================================================

fn order_json(state: &BackendState, order: &FakeOrder) -> Value {
    let total: i64 = order
        .items
        .iter()
        .map(|(_, quantity, price)| price * i64::from(*quantity))
        .sum();
    let items: Vec<Value> = order
        .items
        .iter()
        .map(|(product_id, quantity, price)| {
            json!({
                "product": product_id,
                "name": state.product(product_id).map(|p| p.name.clone()),
                "quantity": quantity,
                "price": price,
            })
        })
        .collect();
    json!({
        "_id": order.id,
        "user": state.user(&order.user_id).map_or(Value::Null, user_json),
        "items": items,
        "totalAmount": total,
        "status": order.status,
        "paymentId": (order.status != "pending").then_some(1_234_567_890_i64),
        "createdAt": "2024-06-01T15:00:00Z",
    })
}

async fn list_orders(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = lock(&state);
    let user = match authenticate(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let orders: Vec<Value> = state
        .orders
        .iter()
        .filter(|o| user.role == "admin" || o.user_id == user.id)
        .map(|o| order_json(&state, o))
        .collect();
    ok(json!({ "orders": orders }))
}

async fn get_order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let state = lock(&state);
    let user = match authenticate(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    match state
        .orders
        .iter()
        .find(|o| o.id == id && (user.role == "admin" || o.user_id == user.id))
    {
        Some(order) => ok(json!({ "data": order_json(&state, order) })),
        None => error(StatusCode::NOT_FOUND, "Pedido no encontrado"),
    }
}

#[derive(Deserialize)]
struct StatusBody {
    status: String,
}

async fn update_order_status(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<StatusBody>,
) -> Response {
    let mut state = lock(&state);
    if let Err(response) = authenticate_admin(&state, &headers) {
        return response;
    }
    let Some(order) = state.orders.iter_mut().find(|o| o.id == id) else {
        return error(StatusCode::NOT_FOUND, "Pedido no encontrado");
    };
    order.status = body.status;
    ok(json!({ "success": true, "message": "Estado actualizado" }))
}

async fn create_preference(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(cart_id): Path<String>,
) -> Response {
    let state = lock(&state);
    let user = match authenticate(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    if cart_id != format!("cart-{}", user.id) {
        return error(StatusCode::NOT_FOUND, "Carrito no encontrado");
    }
    let preference = format!("pref-{}", user.id);
    ok(json!({
        "id": preference,
        "init_point": format!("https://www.mercadopago.com.ar/checkout/v1/redirect?pref_id={preference}"),
        "sandbox_init_point": format!("https://sandbox.mercadopago.com.ar/checkout/v1/redirect?pref_id={preference}"),
    }))
}

// =============================================================================
// Users
// =============================================================================

async fn list_users(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = lock(&state);
    if let Err(response) = authenticate_admin(&state, &headers) {
        return response;
    }
    let users: Vec<Value> = state.users.iter().map(user_json).collect();
    ok(json!({ "success": true, "data": { "users": users, "total": users.len() } }))
}

async fn get_user(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let state = lock(&state);
    if let Err(response) = authenticate_admin(&state, &headers) {
        return response;
    }
    match state.user(&id) {
        Some(user) => ok(json!({ "data": user_json(user) })),
        None => error(StatusCode::NOT_FOUND, "Usuario no encontrado"),
    }
}

async fn toggle_ban(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let mut state = lock(&state);
    if let Err(response) = authenticate_admin(&state, &headers) {
        return response;
    }
    let Some(user) = state.users.iter_mut().find(|u| u.id == id) else {
        return error(StatusCode::NOT_FOUND, "Usuario no encontrado");
    };
    user.banned = !user.banned;
    ok(json!({ "success": true, "isBanned": user.banned }))
}
