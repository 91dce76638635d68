//! Everything a front-end needs, wired together once.

use std::sync::Arc;

use tracing::instrument;

use crate::api::ApiClient;
use crate::cart::CartStore;
use crate::checkout::Checkout;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::notify::Notifier;
use crate::services::{AccountService, CartService, OrderService, ProductService};
use crate::session::{AuthSession, AuthState};

/// Shared client state.
///
/// This struct is cheaply cloneable via `Arc`. The cart store and checkout
/// share one session and one notifier.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: ClientConfig,
    api: ApiClient,
    session: AuthSession,
    account: AccountService,
    products: ProductService,
    orders: OrderService,
    cart: CartStore,
    checkout: Checkout,
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("api_url", &self.inner.config.api_url.as_str())
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}

impl Storefront {
    /// Build the client stack from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ClientConfig, notifier: Arc<dyn Notifier>) -> Result<Self, ClientError> {
        let api = ApiClient::from_config(&config)?;
        Ok(Self::with_api(config, api, notifier))
    }

    /// Build the client stack around an existing API client.
    #[must_use]
    pub fn with_api(config: ClientConfig, api: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
        let session = AuthSession::new();
        let account = AccountService::new(api.clone());
        let products = ProductService::new(api.clone(), config.product_cache_ttl);
        let orders = OrderService::new(api.clone());
        let cart = CartStore::new(
            CartService::new(api.clone()),
            session.clone(),
            Arc::clone(&notifier),
        );
        let checkout = Checkout::new(orders.clone(), cart.clone(), session.clone(), notifier);

        Self {
            inner: Arc::new(StorefrontInner {
                config,
                api,
                session,
                account,
                products,
                orders,
                cart,
                checkout,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    #[must_use]
    pub fn session(&self) -> &AuthSession {
        &self.inner.session
    }

    #[must_use]
    pub fn account(&self) -> &AccountService {
        &self.inner.account
    }

    #[must_use]
    pub fn products(&self) -> &ProductService {
        &self.inner.products
    }

    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }

    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    #[must_use]
    pub fn checkout(&self) -> &Checkout {
        &self.inner.checkout
    }

    /// Resolve who is signed in, then load their cart (or empty it).
    ///
    /// For one-shot front-ends. Long-lived ones can call
    /// [`CartStore::spawn_auth_sync`] instead and resolve the session on
    /// their own schedule.
    #[instrument(skip_all)]
    pub async fn resolve_session(&self) -> AuthState {
        let state = self.inner.session.resolve(&self.inner.account).await;
        self.inner.cart.refresh_cart().await;
        state
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use url::Url;

    use super::*;
    use crate::notify::TracingNotifier;

    #[tokio::test]
    async fn test_resolve_without_token_is_anonymous() {
        let config = ClientConfig::new(Url::parse("http://127.0.0.1:9").unwrap());
        let storefront = Storefront::new(config, Arc::new(TracingNotifier)).unwrap();

        assert_eq!(storefront.resolve_session().await, AuthState::Anonymous);
        assert!(storefront.cart().cart().is_empty());
        assert!(!storefront.cart().is_loading());
    }
}
