//! Integration tests for the SheShape client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p sheshape-integration-tests
//! ```
//!
//! Every test spins up its own [`MockBackend`]: an in-process axum server on
//! an ephemeral port that speaks the subset of the REST API the client uses.
//! It records every request and can be told to fail a route, delay requests
//! or report the cart as invalid.
//!
//! Seeded data:
//!
//! - token `token-42` belongs to user 42 (`jane`)
//! - products 7 (Yoga Mat, $29.99), 8 (Resistance Bands, $14.50) and
//!   9 (Water Bottle, $9.99)

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Path, Query, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Value, json};
use sheshape_client::api::{ApiClient, MemoryTokenStore};
use sheshape_client::{ChannelNotifier, ClientConfig, Notice, Notifier, Storefront};
use sheshape_core::OrderStatus;
use tokio::sync::mpsc::UnboundedReceiver;
use url::Url;

pub use axum::http::Method;

/// Token accepted for user 42.
pub const TOKEN: &str = "token-42";
/// Id of the seeded user.
pub const USER_ID: i64 = 42;

/// A request the backend received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
}

#[derive(Debug, Clone)]
struct Failure {
    method: Method,
    path: String,
    status: u16,
    message: Option<String>,
}

#[derive(Debug, Clone)]
struct MockProduct {
    id: i64,
    name: String,
    price: Decimal,
    stock: u32,
    category: String,
}

#[derive(Debug, Clone)]
struct MockOrder {
    id: i64,
    user_id: i64,
    lines: Vec<(MockProduct, u32)>,
    status: String,
    payment_method: String,
    shipping_address: String,
    customer_notes: Option<String>,
}

impl MockOrder {
    fn number(&self) -> String {
        format!("SS-{:06}", self.id)
    }

    fn total(&self) -> Decimal {
        self.lines
            .iter()
            .map(|(product, quantity)| product.price * Decimal::from(*quantity))
            .sum()
    }
}

#[derive(Debug, Default)]
struct BackendState {
    users: HashMap<String, (i64, String)>,
    products: BTreeMap<i64, MockProduct>,
    carts: HashMap<i64, Vec<(i64, u32)>>,
    unavailable: HashSet<i64>,
    cart_invalid: bool,
    orders: Vec<MockOrder>,
    failures: Vec<Failure>,
    requests: Vec<RecordedRequest>,
    checkout_bodies: Vec<Value>,
    delay: Duration,
    cart_in_flight: usize,
    cart_max_in_flight: usize,
}

/// In-process stand-in for the SheShape backend.
#[derive(Clone)]
pub struct MockBackend {
    state: Arc<Mutex<BackendState>>,
    base_url: Url,
}

impl MockBackend {
    /// Bind to an ephemeral port and serve in the background.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn spawn() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("Mock backend has no address");

        let backend = Self {
            state: Arc::new(Mutex::new(seed())),
            base_url: Url::parse(&format!("http://{addr}")).expect("Invalid mock backend URL"),
        };

        let app = router(backend.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        backend
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Client stack pointed at this backend, signed in with `token` when
    /// given. Notices arrive on the returned receiver.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn storefront(&self, token: Option<&str>) -> (Storefront, UnboundedReceiver<Notice>) {
        let config = ClientConfig::new(self.base_url.clone());
        let store = token.map_or_else(MemoryTokenStore::new, |token| {
            MemoryTokenStore::with_token(SecretString::from(token))
        });
        let api = ApiClient::new(&config, Arc::new(store)).expect("Failed to build API client");
        let (notifier, notices) = ChannelNotifier::channel();
        let notifier: Arc<dyn Notifier> = Arc::new(notifier);
        (Storefront::with_api(config, api, notifier), notices)
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Test controls
    // =========================================================================

    /// Accept `token` for user `id`.
    pub fn add_user(&self, token: &str, id: i64, username: &str) {
        self.lock()
            .users
            .insert(token.to_string(), (id, username.to_string()));
    }

    /// Answer `method path` with `status` until [`MockBackend::clear_failures`].
    /// Without a message the error body is empty.
    pub fn fail(&self, method: Method, path: &str, status: u16, message: Option<&str>) {
        self.lock().failures.push(Failure {
            method,
            path: path.to_string(),
            status,
            message: message.map(str::to_string),
        });
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    /// Hold every request this long before handling it.
    pub fn set_delay(&self, delay: Duration) {
        self.lock().delay = delay;
    }

    /// Flag a product as no longer purchasable; carts holding it fail
    /// validation.
    pub fn mark_unavailable(&self, product_id: i64) {
        self.lock().unavailable.insert(product_id);
    }

    /// Make `GET /api/cart/validate` answer `valid: false`.
    pub fn set_cart_invalid(&self, invalid: bool) {
        self.lock().cart_invalid = invalid;
    }

    /// Put lines into a user's cart without going through the API.
    pub fn seed_cart(&self, user_id: i64, lines: &[(i64, u32)]) {
        self.lock().carts.insert(user_id, lines.to_vec());
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// Requests matching `method path`.
    #[must_use]
    pub fn count(&self, method: &Method, path: &str) -> usize {
        self.lock()
            .requests
            .iter()
            .filter(|r| r.method == *method && r.path == path)
            .count()
    }

    pub fn reset_requests(&self) {
        self.lock().requests.clear();
    }

    /// Bodies of every `POST /api/orders/checkout`.
    #[must_use]
    pub fn checkout_bodies(&self) -> Vec<Value> {
        self.lock().checkout_bodies.clone()
    }

    /// Most `/api/cart` requests ever handled at once.
    #[must_use]
    pub fn cart_max_in_flight(&self) -> usize {
        self.lock().cart_max_in_flight
    }

    /// Server-side quantity of a product in a user's cart.
    #[must_use]
    pub fn cart_quantity(&self, user_id: i64, product_id: i64) -> Option<u32> {
        self.lock()
            .carts
            .get(&user_id)?
            .iter()
            .find(|(id, _)| *id == product_id)
            .map(|(_, quantity)| *quantity)
    }

    #[must_use]
    /// Move an order along its lifecycle, e.g. to `SHIPPED`.
    pub fn set_order_status(&self, order_id: i64, status: &str) {
        if let Some(order) = self
            .lock()
            .orders
            .iter_mut()
            .find(|order| order.id == order_id)
        {
            order.status = status.to_string();
        }
    }

    pub fn order_status(&self, order_id: i64) -> Option<String> {
        self.lock()
            .orders
            .iter()
            .find(|order| order.id == order_id)
            .map(|order| order.status.clone())
    }
}

fn seed() -> BackendState {
    let mut state = BackendState::default();
    state
        .users
        .insert(TOKEN.to_string(), (USER_ID, "jane".to_string()));
    for (id, name, cents, stock, category) in [
        (7, "Yoga Mat", 2999, 10, "yoga"),
        (8, "Resistance Bands", 1450, 5, "strength"),
        (9, "Water Bottle", 999, 20, "accessories"),
    ] {
        state.products.insert(
            id,
            MockProduct {
                id,
                name: name.to_string(),
                price: Decimal::new(cents, 2),
                stock,
                category: category.to_string(),
            },
        );
    }
    state
}

// =============================================================================
// Routing
// =============================================================================

fn router(backend: MockBackend) -> Router {
    Router::new()
        .route("/api/auth/me", get(me))
        .route("/api/cart", get(get_cart).delete(clear_cart))
        .route("/api/cart/items", post(add_item))
        .route(
            "/api/cart/items/{product_id}",
            put(update_item).delete(remove_item),
        )
        .route("/api/cart/validate", get(validate_cart))
        .route("/api/cart/count", get(cart_count))
        .route("/api/orders/checkout", post(checkout))
        .route("/api/orders/my-orders", get(my_orders))
        .route("/api/orders/my-orders/recent", get(recent_orders))
        .route("/api/orders/number/{order_number}", get(order_by_number))
        .route("/api/orders/{id}", get(get_order))
        .route("/api/orders/{id}/cancel", put(cancel_order))
        .route("/api/products", get(list_products))
        .route("/api/products/{id}", get(get_product))
        .layer(middleware::from_fn_with_state(backend.clone(), record))
        .with_state(backend)
}

/// Record the request, apply forced failures and delays, and track how many
/// cart requests overlap.
async fn record(State(backend): State<MockBackend>, request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let is_cart = path.starts_with("/api/cart");

    let (failure, delay) = {
        let mut state = backend.lock();
        state.requests.push(RecordedRequest {
            method: method.clone(),
            path: path.clone(),
            query: request.uri().query().map(str::to_string),
            authorization: request
                .headers()
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        });
        let failure = state
            .failures
            .iter()
            .find(|f| f.method == method && f.path == path)
            .cloned();
        if is_cart {
            state.cart_in_flight += 1;
            state.cart_max_in_flight = state.cart_max_in_flight.max(state.cart_in_flight);
        }
        (failure, state.delay)
    };

    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let response = match failure {
        Some(failure) => {
            let status =
                StatusCode::from_u16(failure.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            match failure.message {
                Some(message) => (status, Json(json!({ "message": message }))).into_response(),
                None => status.into_response(),
            }
        }
        None => next.run(request).await,
    };

    if is_cart {
        backend.lock().cart_in_flight -= 1;
    }
    response
}

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "message": message.into() }))).into_response()
}

fn user_id(backend: &MockBackend, headers: &HeaderMap) -> Result<i64, Response> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    token
        .and_then(|token| backend.lock().users.get(token).map(|(id, _)| *id))
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Full authentication is required"))
}

// =============================================================================
// JSON shapes
// =============================================================================

fn product_json(product: &MockProduct) -> Value {
    json!({
        "id": product.id,
        "name": product.name,
        "description": format!("{} for everyday training", product.name),
        "price": product.price,
        "inventoryCount": product.stock,
        "categories": [product.category],
        "images": [{
            "id": product.id * 10,
            "imageUrl": format!("https://cdn.sheshape.test/{}.jpg", product.id),
            "main": true,
            "position": 0
        }],
        "isActive": true,
        "createdAt": "2026-01-05T09:00:00"
    })
}

fn cart_json(state: &BackendState, user_id: i64) -> Value {
    let lines = state.carts.get(&user_id).cloned().unwrap_or_default();
    let mut total = Decimal::ZERO;
    let mut units = 0;
    let items: Vec<Value> = lines
        .iter()
        .filter_map(|(product_id, quantity)| {
            let product = state.products.get(product_id)?;
            let line_total = product.price * Decimal::from(*quantity);
            total += line_total;
            units += quantity;
            Some(json!({
                "id": product_id * 100,
                "productId": product_id,
                "product": product_json(product),
                "quantity": quantity,
                "unitPrice": product.price,
                "totalPrice": line_total,
                "available": !state.unavailable.contains(product_id)
            }))
        })
        .collect();
    json!({
        "id": user_id,
        "userId": user_id,
        "items": items,
        "totalItems": units,
        "totalPrice": total
    })
}

fn order_json(order: &MockOrder) -> Value {
    let items: Vec<Value> = order
        .lines
        .iter()
        .enumerate()
        .map(|(index, (product, quantity))| {
            json!({
                "id": order.id * 100 + i64::try_from(index).unwrap_or_default(),
                "productId": product.id,
                "productName": product.name,
                "quantity": quantity,
                "price": product.price,
                "totalPrice": product.price * Decimal::from(*quantity)
            })
        })
        .collect();
    json!({
        "id": order.id,
        "orderNumber": order.number(),
        "userId": order.user_id,
        "items": items,
        "status": order.status,
        "paymentStatus": "PENDING",
        "paymentMethod": order.payment_method,
        "subtotal": order.total(),
        "shippingAmount": Decimal::ZERO,
        "taxAmount": Decimal::ZERO,
        "totalAmount": order.total(),
        "shippingAddress": order.shipping_address,
        "customerNotes": order.customer_notes,
        "createdAt": "2026-10-19T10:00:00"
    })
}

fn page_json(content: Vec<Value>, page: usize, size: usize, total: usize) -> Value {
    let size = size.max(1);
    let total_pages = total.div_ceil(size);
    json!({
        "content": content,
        "totalPages": total_pages,
        "totalElements": total,
        "size": size,
        "number": page,
        "first": page == 0,
        "last": page + 1 >= total_pages
    })
}

fn query_usize(params: &HashMap<String, String>, key: &str, default: usize) -> usize {
    params
        .get(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// =============================================================================
// Handlers
// =============================================================================

async fn me(State(backend): State<MockBackend>, headers: HeaderMap) -> Response {
    let id = match user_id(&backend, &headers) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let state = backend.lock();
    let username = state
        .users
        .values()
        .find(|(user, _)| *user == id)
        .map(|(_, name)| name.clone())
        .unwrap_or_default();
    Json(json!({
        "id": id,
        "username": username,
        "email": (!username.is_empty()).then(|| format!("{username}@sheshape.test")),
        "role": "USER",
        "isActive": true
    }))
    .into_response()
}

async fn get_cart(State(backend): State<MockBackend>, headers: HeaderMap) -> Response {
    let id = match user_id(&backend, &headers) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let state = backend.lock();
    if !state.carts.contains_key(&id) {
        return error(StatusCode::NOT_FOUND, "Cart not found");
    }
    Json(cart_json(&state, id)).into_response()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddItemBody {
    product_id: i64,
    quantity: i64,
}

async fn add_item(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Json(body): Json<AddItemBody>,
) -> Response {
    let id = match user_id(&backend, &headers) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let mut state = backend.lock();
    let Some(product) = state.products.get(&body.product_id).cloned() else {
        return error(
            StatusCode::NOT_FOUND,
            format!("Product not found with id: {}", body.product_id),
        );
    };
    let Ok(quantity) = u32::try_from(body.quantity) else {
        return error(StatusCode::BAD_REQUEST, "Quantity must be at least 1");
    };
    if quantity == 0 {
        return error(StatusCode::BAD_REQUEST, "Quantity must be at least 1");
    }

    let cart = state.carts.entry(id).or_default();
    let current = cart
        .iter()
        .find(|(pid, _)| *pid == product.id)
        .map_or(0, |(_, q)| *q);
    if current + quantity > product.stock {
        return error(
            StatusCode::BAD_REQUEST,
            format!("Not enough stock for {}", product.name),
        );
    }
    match cart.iter_mut().find(|(pid, _)| *pid == product.id) {
        Some(line) => line.1 += quantity,
        None => cart.push((product.id, quantity)),
    }
    Json(cart_json(&state, id)).into_response()
}

#[derive(Deserialize)]
struct UpdateItemBody {
    quantity: i64,
}

async fn update_item(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Path(product_id): Path<i64>,
    Json(body): Json<UpdateItemBody>,
) -> Response {
    let id = match user_id(&backend, &headers) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let mut state = backend.lock();
    let stock = state.products.get(&product_id).map_or(0, |p| p.stock);
    let Some(cart) = state.carts.get_mut(&id) else {
        return error(StatusCode::NOT_FOUND, "Cart not found");
    };
    let Some(index) = cart.iter().position(|(pid, _)| *pid == product_id) else {
        return error(StatusCode::NOT_FOUND, "Item not found in cart");
    };

    // Zero or less removes the line
    match u32::try_from(body.quantity) {
        Ok(0) | Err(_) => {
            cart.remove(index);
        }
        Ok(quantity) if quantity > stock => {
            return error(StatusCode::BAD_REQUEST, "Not enough stock");
        }
        Ok(quantity) => {
            if let Some(line) = cart.get_mut(index) {
                line.1 = quantity;
            }
        }
    }
    Json(cart_json(&state, id)).into_response()
}

async fn remove_item(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Path(product_id): Path<i64>,
) -> Response {
    let id = match user_id(&backend, &headers) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let mut state = backend.lock();
    let Some(cart) = state.carts.get_mut(&id) else {
        return error(StatusCode::NOT_FOUND, "Cart not found");
    };
    cart.retain(|(pid, _)| *pid != product_id);
    Json(cart_json(&state, id)).into_response()
}

async fn clear_cart(State(backend): State<MockBackend>, headers: HeaderMap) -> Response {
    let id = match user_id(&backend, &headers) {
        Ok(id) => id,
        Err(response) => return response,
    };
    if let Some(cart) = backend.lock().carts.get_mut(&id) {
        cart.clear();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn validate_cart(State(backend): State<MockBackend>, headers: HeaderMap) -> Response {
    let id = match user_id(&backend, &headers) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let state = backend.lock();
    let has_unavailable = state
        .carts
        .get(&id)
        .is_some_and(|cart| cart.iter().any(|(pid, _)| state.unavailable.contains(pid)));
    Json(json!({ "valid": !state.cart_invalid && !has_unavailable })).into_response()
}

async fn cart_count(State(backend): State<MockBackend>, headers: HeaderMap) -> Response {
    let id = match user_id(&backend, &headers) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let count: u32 = backend
        .lock()
        .carts
        .get(&id)
        .map_or(0, |cart| cart.iter().map(|(_, q)| q).sum());
    Json(json!({ "count": count })).into_response()
}

async fn checkout(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let id = match user_id(&backend, &headers) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let mut state = backend.lock();
    state.checkout_bodies.push(body.clone());

    let lines: Vec<(MockProduct, u32)> = state
        .carts
        .get(&id)
        .map(|cart| {
            cart.iter()
                .filter_map(|(pid, q)| state.products.get(pid).cloned().map(|p| (p, *q)))
                .collect()
        })
        .unwrap_or_default();
    if lines.is_empty() {
        return error(StatusCode::BAD_REQUEST, "Cart is empty");
    }

    let address = &body["shippingAddress"];
    let field = |key: &str| address[key].as_str().unwrap_or_default().to_string();
    let shipping_address = format!(
        "{} {}\n{}\n{}, {} {}\n{}",
        field("firstName"),
        field("lastName"),
        field("street"),
        field("city"),
        field("state"),
        field("zipCode"),
        field("country")
    );

    let order = MockOrder {
        id: i64::try_from(state.orders.len()).unwrap_or_default() + 1,
        user_id: id,
        lines,
        status: "PENDING".to_string(),
        payment_method: body["paymentMethod"].as_str().unwrap_or_default().to_string(),
        shipping_address,
        customer_notes: body["customerNotes"].as_str().map(str::to_string),
    };
    let response = order_json(&order);
    state.orders.push(order);
    if let Some(cart) = state.carts.get_mut(&id) {
        cart.clear();
    }
    (StatusCode::CREATED, Json(response)).into_response()
}

async fn my_orders(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let id = match user_id(&backend, &headers) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let page = query_usize(&params, "page", 0);
    let size = query_usize(&params, "size", 10).max(1);

    let state = backend.lock();
    let mine: Vec<&MockOrder> = state.orders.iter().rev().filter(|o| o.user_id == id).collect();
    let content = mine
        .iter()
        .skip(page * size)
        .take(size)
        .map(|order| order_json(order))
        .collect();
    Json(page_json(content, page, size, mine.len())).into_response()
}

async fn recent_orders(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let id = match user_id(&backend, &headers) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let limit = query_usize(&params, "limit", 5);
    let state = backend.lock();
    let orders: Vec<Value> = state
        .orders
        .iter()
        .rev()
        .filter(|o| o.user_id == id)
        .take(limit)
        .map(order_json)
        .collect();
    Json(orders).into_response()
}

async fn get_order(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Path(order_id): Path<i64>,
) -> Response {
    let id = match user_id(&backend, &headers) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let state = backend.lock();
    state
        .orders
        .iter()
        .find(|o| o.id == order_id && o.user_id == id)
        .map_or_else(
            || error(StatusCode::NOT_FOUND, format!("Order not found with id: {order_id}")),
            |order| Json(order_json(order)).into_response(),
        )
}

async fn order_by_number(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Path(order_number): Path<String>,
) -> Response {
    let id = match user_id(&backend, &headers) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let state = backend.lock();
    state
        .orders
        .iter()
        .find(|o| o.number() == order_number && o.user_id == id)
        .map_or_else(
            || {
                error(
                    StatusCode::NOT_FOUND,
                    format!("Order not found with number: {order_number}"),
                )
            },
            |order| Json(order_json(order)).into_response(),
        )
}

async fn cancel_order(
    State(backend): State<MockBackend>,
    headers: HeaderMap,
    Path(order_id): Path<i64>,
) -> Response {
    let id = match user_id(&backend, &headers) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let mut state = backend.lock();
    let Some(order) = state
        .orders
        .iter_mut()
        .find(|o| o.id == order_id && o.user_id == id)
    else {
        return error(StatusCode::NOT_FOUND, format!("Order not found with id: {order_id}"));
    };
    let cancellable = order
        .status
        .parse::<OrderStatus>()
        .is_ok_and(OrderStatus::is_cancellable);
    if !cancellable {
        return error(
            StatusCode::BAD_REQUEST,
            format!("Order cannot be cancelled in status {}", order.status),
        );
    }
    order.status = "CANCELLED".to_string();
    Json(order_json(order)).into_response()
}

async fn list_products(
    State(backend): State<MockBackend>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let page = query_usize(&params, "page", 0);
    let size = query_usize(&params, "size", 10).max(1);
    let category = params.get("category");

    let state = backend.lock();
    let matching: Vec<&MockProduct> = state
        .products
        .values()
        .filter(|p| category.is_none_or(|c| p.category == *c))
        .collect();
    let content = matching
        .iter()
        .skip(page * size)
        .take(size)
        .map(|product| product_json(product))
        .collect();
    Json(page_json(content, page, size, matching.len())).into_response()
}

async fn get_product(State(backend): State<MockBackend>, Path(product_id): Path<i64>) -> Response {
    backend.lock().products.get(&product_id).map_or_else(
        || {
            error(
                StatusCode::NOT_FOUND,
                format!("Product not found with id: {product_id}"),
            )
        },
        |product| Json(product_json(product)).into_response(),
    )
}
