//! Validate-then-commit checkout.
//!
//! [`Checkout::submit`] never returns an error: failures become the checkout
//! error message and a notice, and the caller gets `None`.

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::{Mutex, watch};
use tracing::{info, instrument, warn};

use crate::cart::CartStore;
use crate::error::ClientError;
use crate::notify::{Notice, Notifier};
use crate::services::OrderService;
use crate::session::AuthSession;
use crate::types::{CheckoutRequest, Order};
use crate::validation::validate_checkout;

const LOGIN_TO_ORDER: &str = "Please log in to place an order";
const ORDER_FAILED: &str = "Failed to place order";

/// Observable checkout progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutState {
    pub is_loading: bool,
    /// Message of the last failed attempt, cleared when a new one starts.
    pub error: Option<String>,
}

/// Checkout orchestration over the cart store and the order service.
#[derive(Clone)]
pub struct Checkout {
    inner: Arc<CheckoutInner>,
}

struct CheckoutInner {
    orders: OrderService,
    cart: CartStore,
    session: AuthSession,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<CheckoutState>,
    submitting: Mutex<()>,
}

impl std::fmt::Debug for Checkout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Checkout")
            .field("state", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

impl Checkout {
    #[must_use]
    pub fn new(
        orders: OrderService,
        cart: CartStore,
        session: AuthSession,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (state, _rx) = watch::channel(CheckoutState::default());
        Self {
            inner: Arc::new(CheckoutInner {
                orders,
                cart,
                session,
                notifier,
                state,
                submitting: Mutex::new(()),
            }),
        }
    }

    #[must_use]
    pub fn state(&self) -> CheckoutState {
        self.inner.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CheckoutState> {
        self.inner.state.subscribe()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().is_loading
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.inner.state.borrow().error.clone()
    }

    pub fn clear_error(&self) {
        self.inner
            .state
            .send_if_modified(|state| state.error.take().is_some());
    }

    /// Place an order, checking card expiry against today's local date.
    pub async fn submit(&self, request: &CheckoutRequest) -> Option<Order> {
        self.submit_at(request, chrono::Local::now().date_naive())
            .await
    }

    /// Place an order as of `today`.
    ///
    /// 1. Signed-in check and client-side validation; nothing is sent when
    ///    either fails.
    /// 2. Server cart validation; an invalid cart aborts with
    ///    "Cart contains invalid items. Please review your cart."
    /// 3. `POST /api/orders/checkout`.
    /// 4. On success, "Order placed successfully! Order #<number>" and a cart
    ///    refresh.
    ///
    /// Any failure stores the most specific message available as the
    /// checkout error, posts it as a notice and returns `None`.
    #[instrument(skip_all, fields(payment_method = %request.payment_method))]
    pub async fn submit_at(&self, request: &CheckoutRequest, today: NaiveDate) -> Option<Order> {
        let _turn = self.inner.submitting.lock().await;
        self.inner.state.send_modify(|state| {
            state.is_loading = true;
            state.error = None;
        });

        let result = self.place_order(request, today).await;

        match result {
            Ok(order) => {
                self.inner
                    .state
                    .send_modify(|state| state.is_loading = false);
                Some(order)
            }
            Err(e) => {
                let message = failure_message(&e);
                warn!(error = %message, "Checkout failed");
                self.inner.state.send_modify(|state| {
                    state.is_loading = false;
                    state.error = Some(message.clone());
                });
                self.inner.notifier.notify(Notice::error(message));
                None
            }
        }
    }

    async fn place_order(
        &self,
        request: &CheckoutRequest,
        today: NaiveDate,
    ) -> Result<Order, ClientError> {
        if !self.inner.session.is_authenticated() {
            return Err(ClientError::Unauthenticated);
        }

        let report = validate_checkout(request, today);
        if !report.is_valid() {
            return Err(ClientError::Validation(report));
        }

        if !self.inner.cart.service().validate_cart().await? {
            return Err(ClientError::InvalidCart);
        }

        let order = self.inner.orders.checkout(request).await?;
        info!(order_number = %order.order_number, total = %order.total_amount, "Checkout complete");
        self.inner.notifier.notify(Notice::success(format!(
            "Order placed successfully! Order #{}",
            order.order_number
        )));

        // The backend empties the cart as part of checkout
        self.inner.cart.refresh_cart().await;
        Ok(order)
    }
}

/// Server message, then transport message, then the generic fallback.
fn failure_message(err: &ClientError) -> String {
    match err {
        ClientError::Unauthenticated => LOGIN_TO_ORDER.to_string(),
        ClientError::Api(e) if !e.message.trim().is_empty() => e.message.clone(),
        ClientError::Api(_) => ORDER_FAILED.to_string(),
        other => {
            let message = other.to_string();
            if message.trim().is_empty() {
                ORDER_FAILED.to_string()
            } else {
                message
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use sheshape_core::PaymentMethod;
    use url::Url;

    use super::*;
    use crate::api::{ApiClient, ApiError, MemoryTokenStore};
    use crate::config::ClientConfig;
    use crate::notify::ChannelNotifier;
    use crate::services::CartService;
    use crate::types::Address;
    use crate::validation::ValidationReport;

    fn checkout() -> (Checkout, tokio::sync::mpsc::UnboundedReceiver<Notice>) {
        let config = ClientConfig::new(Url::parse("http://127.0.0.1:9").unwrap());
        let api = ApiClient::new(&config, Arc::new(MemoryTokenStore::new())).unwrap();
        let session = AuthSession::new();
        let (notifier, rx) = ChannelNotifier::channel();
        let notifier: Arc<dyn Notifier> = Arc::new(notifier);
        let cart = CartStore::new(
            CartService::new(api.clone()),
            session.clone(),
            Arc::clone(&notifier),
        );
        (
            Checkout::new(OrderService::new(api), cart, session, notifier),
            rx,
        )
    }

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            payment_method: PaymentMethod::CashOnDelivery,
            shipping_address: Address::default(),
            billing_address: None,
            customer_notes: None,
            payment_details: None,
        }
    }

    #[tokio::test]
    async fn test_signed_out_submit_returns_none() {
        let (checkout, mut notices) = checkout();

        assert!(checkout.submit(&request()).await.is_none());
        assert_eq!(checkout.error().unwrap(), "Please log in to place an order");
        assert!(!checkout.is_loading());
        assert_eq!(
            notices.try_recv().unwrap().message,
            "Please log in to place an order"
        );

        checkout.clear_error();
        assert!(checkout.error().is_none());
    }

    #[test]
    fn test_failure_message_precedence() {
        let server = ApiError::from_response(
            reqwest::StatusCode::CONFLICT,
            r#"{"message":"Insufficient stock for Yoga Mat"}"#,
        );
        assert_eq!(
            failure_message(&ClientError::Api(server)),
            "Insufficient stock for Yoga Mat"
        );

        let transport = ApiError::from_response(reqwest::StatusCode::BAD_GATEWAY, "");
        assert_eq!(
            failure_message(&ClientError::Api(transport)),
            "Request failed with status code 502"
        );

        let blank = ApiError::invalid_request("");
        assert_eq!(failure_message(&ClientError::Api(blank)), ORDER_FAILED);

        assert_eq!(
            failure_message(&ClientError::InvalidCart),
            "Cart contains invalid items. Please review your cart."
        );
        assert_eq!(
            failure_message(&ClientError::Validation(ValidationReport::default())),
            ORDER_FAILED
        );
    }
}
