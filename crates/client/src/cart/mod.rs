//! Cached mirror of the signed-in user's server cart.
//!
//! [`CartStore`] is the only writer of the local cart. Every mutation either
//! stores the cart the server returned or, on failure, refetches the cart so
//! the mirror never drifts from the server. Operations that touch the server
//! run one at a time in call order: a FIFO mutex queues later calls behind the
//! one in flight.
//!
//! Readers take a [`CartSnapshot`] or subscribe to a `watch` channel of them.

mod guard;

use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, Weak};

use sheshape_core::{Price, ProductId};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use crate::api::ErrorKind;
use crate::error::ClientError;
use crate::notify::{Notice, Notifier};
use crate::services::CartService;
use crate::session::{AuthSession, AuthState};
use crate::types::Cart;

use guard::LoadingGuard;

const LOGIN_TO_ADD: &str = "Please log in to add items to cart";
const LOGIN_TO_MODIFY: &str = "Please log in to manage your cart";
const LOGIN_TO_VIEW: &str = "Please log in to view your cart";
const CART_UNAVAILABLE_ITEMS: &str =
    "Some items in your cart are no longer available. Please review your cart.";

/// What readers see of the cart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartSnapshot {
    /// Last cart received from the server, empty when signed out.
    pub cart: Cart,
    /// At least one cart operation is queued or in flight.
    pub is_loading: bool,
    /// Whether the cart drawer is shown.
    pub is_open: bool,
}

impl CartSnapshot {
    /// Units across all lines.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.cart.items.iter().map(|item| item.quantity).sum()
    }

    /// Cart total as computed by the server.
    #[must_use]
    pub const fn total_price(&self) -> Price {
        self.cart.total_price
    }
}

/// Process-wide cart cache with controlled mutation operations.
///
/// Cheap to clone; all clones share one cache and one queue.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    service: CartService,
    session: AuthSession,
    notifier: Arc<dyn Notifier>,
    state: Arc<watch::Sender<CartSnapshot>>,
    in_flight: Arc<AtomicUsize>,
    queue: Mutex<()>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("snapshot", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

impl CartStore {
    #[must_use]
    pub fn new(service: CartService, session: AuthSession, notifier: Arc<dyn Notifier>) -> Self {
        let (tx, _rx) = watch::channel(CartSnapshot::default());
        Self {
            inner: Arc::new(CartStoreInner {
                service,
                session,
                notifier,
                state: Arc::new(tx),
                in_flight: Arc::new(AtomicUsize::new(0)),
                queue: Mutex::new(()),
            }),
        }
    }

    // =========================================================================
    // Readers
    // =========================================================================

    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Receive every subsequent snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.inner.state.subscribe()
    }

    #[must_use]
    pub fn cart(&self) -> Cart {
        self.inner.state.borrow().cart.clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().is_loading
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.inner.state.borrow().is_open
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Reload the cart from the server.
    ///
    /// Only fetches for a resolved, complete identity; otherwise the local
    /// cart is emptied without a request. A missing cart, a rejected token or
    /// a server error empty the cart silently. Other failures empty it and
    /// post "Failed to load cart".
    #[instrument(skip(self))]
    pub async fn refresh_cart(&self) {
        let _loading = self.loading();
        let _turn = self.inner.queue.lock().await;
        self.refresh_locked().await;
    }

    /// Add `quantity` units of a product.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Unauthenticated`] when nobody is signed in (no request
    ///   is sent)
    /// - [`ClientError::InvalidQuantity`] for a zero quantity
    /// - [`ClientError::Api`] when the server rejects the change; the cart is
    ///   resynced before returning
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_item(&self, product_id: ProductId, quantity: u32) -> Result<Cart, ClientError> {
        self.require_auth(LOGIN_TO_ADD)?;
        if quantity == 0 {
            return Err(ClientError::InvalidQuantity);
        }

        let _loading = self.loading();
        let _turn = self.inner.queue.lock().await;

        match self.inner.service.add_item(product_id, quantity).await {
            Ok(cart) => {
                let cart = self.store(cart);
                self.notify(Notice::success("Item added to cart"));
                Ok(cart)
            }
            Err(e) => Err(self
                .fail_and_resync(e, "Failed to add item to cart")
                .await),
        }
    }

    /// Set the quantity of a line. Zero or less removes the line, exactly as
    /// [`CartStore::remove_item`] does.
    ///
    /// # Errors
    ///
    /// See [`CartStore::add_item`].
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn update_quantity(
        &self,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<Cart, ClientError> {
        if quantity <= 0 {
            return self.remove_item(product_id).await;
        }
        self.require_auth(LOGIN_TO_MODIFY)?;

        let _loading = self.loading();
        let _turn = self.inner.queue.lock().await;

        match self
            .inner
            .service
            .update_quantity(product_id, quantity)
            .await
        {
            Ok(cart) => Ok(self.store(cart)),
            Err(e) => Err(self.fail_and_resync(e, "Failed to update quantity").await),
        }
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// See [`CartStore::add_item`].
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_item(&self, product_id: ProductId) -> Result<Cart, ClientError> {
        self.require_auth(LOGIN_TO_MODIFY)?;

        let _loading = self.loading();
        let _turn = self.inner.queue.lock().await;

        match self.inner.service.remove_item(product_id).await {
            Ok(cart) => {
                let cart = self.store(cart);
                self.notify(Notice::success("Item removed from cart"));
                Ok(cart)
            }
            Err(e) => Err(self.fail_and_resync(e, "Failed to remove item").await),
        }
    }

    /// Empty the cart on the server and locally.
    ///
    /// # Errors
    ///
    /// See [`CartStore::add_item`].
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<(), ClientError> {
        self.require_auth(LOGIN_TO_MODIFY)?;

        let _loading = self.loading();
        let _turn = self.inner.queue.lock().await;

        match self.inner.service.clear_cart().await {
            Ok(()) => {
                self.store(Cart::default());
                self.notify(Notice::success("Cart cleared"));
                Ok(())
            }
            Err(e) => Err(self.fail_and_resync(e, "Failed to clear cart").await),
        }
    }

    /// Ask the server whether every line can still be bought.
    ///
    /// An invalid cart posts a warning and is resynced so the unavailable
    /// lines show up. Signed-out users and failed requests get `false`.
    #[instrument(skip(self))]
    pub async fn validate_cart(&self) -> bool {
        if !self.inner.session.is_authenticated() {
            return false;
        }

        let _loading = self.loading();
        let _turn = self.inner.queue.lock().await;

        match self.inner.service.validate_cart().await {
            Ok(true) => true,
            Ok(false) => {
                self.notify(Notice::warning(CART_UNAVAILABLE_ITEMS));
                self.refresh_locked().await;
                false
            }
            Err(e) => {
                warn!(error = %e, kind = ?e.kind, "Cart validation failed");
                false
            }
        }
    }

    pub(crate) fn service(&self) -> &CartService {
        &self.inner.service
    }

    /// Open or close the cart drawer. Opening needs a signed-in user.
    /// Returns whether the drawer is open afterwards.
    pub fn toggle_cart(&self) -> bool {
        if self.is_open() {
            self.close_cart();
            return false;
        }
        if !self.inner.session.is_authenticated() {
            self.notify(Notice::error(LOGIN_TO_VIEW));
            return false;
        }
        self.inner.state.send_modify(|snapshot| snapshot.is_open = true);
        true
    }

    pub fn close_cart(&self) {
        self.inner
            .state
            .send_if_modified(|snapshot| std::mem::replace(&mut snapshot.is_open, false));
    }

    /// Follow the session: reload the cart whenever an identity is resolved
    /// and drop it when the session turns anonymous.
    ///
    /// The task ends once the store is dropped.
    pub fn spawn_auth_sync(&self) -> JoinHandle<()> {
        let mut rx = self.inner.session.subscribe();
        let weak = Arc::downgrade(&self.inner);

        tokio::spawn(async move {
            let initial = rx.borrow_and_update().clone();
            if !Self::apply_auth_state(&weak, &initial).await {
                return;
            }
            while rx.changed().await.is_ok() {
                let state = rx.borrow_and_update().clone();
                if !Self::apply_auth_state(&weak, &state).await {
                    break;
                }
            }
            debug!("Cart auth sync stopped");
        })
    }

    /// Returns `false` once the store is gone.
    async fn apply_auth_state(weak: &Weak<CartStoreInner>, state: &AuthState) -> bool {
        let Some(inner) = weak.upgrade() else {
            return false;
        };
        let store = Self { inner };
        match state {
            AuthState::Resolved(_) => store.refresh_cart().await,
            AuthState::Anonymous => store.reset(),
            AuthState::Unknown | AuthState::Resolving => {}
        }
        true
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn loading(&self) -> LoadingGuard {
        LoadingGuard::acquire(&self.inner.in_flight, &self.inner.state)
    }

    fn require_auth(&self, message: &str) -> Result<(), ClientError> {
        if self.inner.session.is_authenticated() {
            return Ok(());
        }
        self.notify(Notice::error(message));
        Err(ClientError::Unauthenticated)
    }

    fn notify(&self, notice: Notice) {
        self.inner.notifier.notify(notice);
    }

    /// Replace the cached cart and return what was stored.
    fn store(&self, cart: Cart) -> Cart {
        let cart = cart.normalized();
        self.inner
            .state
            .send_modify(|snapshot| snapshot.cart = cart.clone());
        cart
    }

    /// Signed out: nothing to show.
    fn reset(&self) {
        self.inner.state.send_if_modified(|snapshot| {
            let changed = snapshot.is_open || snapshot.cart != Cart::default();
            snapshot.cart = Cart::default();
            snapshot.is_open = false;
            changed
        });
    }

    /// Caller holds the queue.
    async fn refresh_locked(&self) {
        if !self.inner.session.is_authenticated() {
            debug!("Not authenticated, clearing local cart");
            self.store(Cart::default());
            return;
        }

        match self.inner.service.get_cart().await {
            Ok(Some(cart)) => {
                self.store(cart);
            }
            Ok(None) => {
                self.store(Cart::default());
            }
            Err(e) if e.kind == ErrorKind::Unauthorized || e.is_server() => {
                // Token not yet accepted, or the backend is still settling
                debug!(status = ?e.status, "Cart unavailable, showing empty cart");
                self.store(Cart::default());
            }
            Err(e) => {
                error!(error = %e, kind = ?e.kind, "Failed to load cart");
                self.notify(Notice::error("Failed to load cart"));
                self.store(Cart::default());
            }
        }
    }

    /// Report a failed mutation, resync, and hand back the error.
    async fn fail_and_resync(&self, err: crate::api::ApiError, fallback: &str) -> ClientError {
        warn!(error = %err, kind = ?err.kind, "Cart mutation failed, resyncing");
        let message = err.server_message().unwrap_or(fallback).to_string();
        self.notify(Notice::error(message));
        self.refresh_locked().await;
        ClientError::Api(err)
    }
}
