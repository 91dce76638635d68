//! HTTP client for the SheShape REST API.
//!
//! Wraps `reqwest` with the backend's conventions: a fixed base URL, a bearer
//! token on every request when one is stored, a per-request timeout and one
//! normalized error type ([`ApiError`]).

mod error;
pub mod token;

use std::sync::{Arc, PoisonError, RwLock};

use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};
use url::Url;

use crate::config::ClientConfig;

pub use error::{ApiError, ErrorKind, extract_message};
pub use token::{FileTokenStore, MemoryTokenStore, TokenStore};

/// Client for the SheShape REST API.
///
/// Cheap to clone; all clones share the connection pool and the token.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
    token: RwLock<Option<SecretString>>,
    store: Arc<dyn TokenStore>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("has_token", &self.has_token())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client using `store` for token persistence.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ClientConfig, store: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("sheshape-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let token = store.load();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.api_url.clone(),
                token: RwLock::new(token),
                store,
            }),
        })
    }

    /// Create a client whose token store follows the configuration: an
    /// explicit `SHESHAPE_API_TOKEN` wins, then the token file, then memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let store: Arc<dyn TokenStore> = match (&config.api_token, &config.token_file) {
            (Some(token), _) => Arc::new(MemoryTokenStore::with_token(token.clone())),
            (None, Some(path)) => Arc::new(FileTokenStore::new(path)),
            (None, None) => Arc::new(MemoryTokenStore::new()),
        };
        Self::new(config, store)
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Whether a bearer token is currently attached to requests.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Store a new bearer token and use it for subsequent requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the token store cannot persist it.
    pub fn set_token(&self, token: SecretString) -> std::io::Result<()> {
        self.inner.store.save(&token)?;
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(token);
        Ok(())
    }

    /// Drop the bearer token from memory and from the token store.
    ///
    /// # Errors
    ///
    /// Returns an error if the token store cannot be cleared. The in-memory
    /// token is dropped regardless.
    pub fn clear_token(&self) -> std::io::Result<()> {
        *self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        self.inner.store.clear()
    }

    // =========================================================================
    // Request helpers
    // =========================================================================

    /// `GET path` and decode the JSON body.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure, non-success status or an
    /// undecodable body.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path)?;
        self.execute_json(self.request(Method::GET, url)).await
    }

    /// `GET path?query` and decode the JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn get_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.url_with_query(path, query)?;
        self.execute_json(self.request(Method::GET, url)).await
    }

    /// `POST path` with a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path)?;
        self.execute_json(self.request(Method::POST, url).json(body))
            .await
    }

    /// `PUT path` with a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path)?;
        self.execute_json(self.request(Method::PUT, url).json(body))
            .await
    }

    /// `PUT path?query` without a body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn put_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.url_with_query(path, query)?;
        self.execute_json(self.request(Method::PUT, url)).await
    }

    /// `DELETE path` and decode the JSON response.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path)?;
        self.execute_json(self.request(Method::DELETE, url)).await
    }

    /// `DELETE path`, ignoring any response body.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or non-success status.
    pub async fn delete_unit(&self, path: &str) -> Result<(), ApiError> {
        let url = self.url(path)?;
        self.execute(self.request(Method::DELETE, url))
            .await
            .map(|_| ())
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        let base = self.inner.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Url::parse(&format!("{base}/{path}"))
            .map_err(|e| ApiError::invalid_request(format!("Invalid request URL for {path}: {e}")))
    }

    fn url_with_query(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ApiError> {
        let mut url = self.url(path)?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self
            .inner
            .http
            .request(method, url)
            .header("Accept", "application/json")
            .header("X-Request-Id", uuid::Uuid::new_v4().to_string());

        let token = self
            .inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, ApiError> {
        let (status, body) = self.execute(builder).await?;
        serde_json::from_str(&body).map_err(|e| {
            error!(
                status = %status,
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse SheShape API response"
            );
            ApiError::decode(status, &e, &body)
        })
    }

    /// Send the request and return the status and body text of a successful
    /// response.
    async fn execute(&self, builder: RequestBuilder) -> Result<(StatusCode, String), ApiError> {
        let request = builder.build()?;
        let method = request.method().clone();
        let path = request.url().path().to_string();

        let response = match self.inner.http.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                error!(method = %method, path = %path, error = %e, "SheShape API request failed");
                return Err(e.into());
            }
        };

        let status = response.status();

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if status.is_success() {
            debug!(method = %method, path = %path, status = %status, "SheShape API request succeeded");
            return Ok((status, body));
        }

        let err = ApiError::from_response(status, &body);
        match err.kind {
            ErrorKind::Unauthorized | ErrorKind::Forbidden => {
                warn!(method = %method, path = %path, status = %status, "SheShape API rejected credentials");
            }
            ErrorKind::NotFound => {
                debug!(method = %method, path = %path, "SheShape API resource not found");
            }
            ErrorKind::Server => {
                error!(
                    method = %method,
                    path = %path,
                    status = %status,
                    body = %body.chars().take(500).collect::<String>(),
                    "SheShape API returned server error"
                );
            }
            _ => {
                warn!(method = %method, path = %path, status = %status, message = %err.message, "SheShape API returned non-success status");
            }
        }
        Err(err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        let config = ClientConfig::new(Url::parse(base).unwrap());
        ApiClient::new(&config, Arc::new(MemoryTokenStore::new())).unwrap()
    }

    #[test]
    fn test_url_joins_base_and_path() {
        let api = client("http://localhost:8080");
        assert_eq!(
            api.url("/api/cart").unwrap().as_str(),
            "http://localhost:8080/api/cart"
        );

        let prefixed = client("https://example.com/backend/");
        assert_eq!(
            prefixed.url("/api/orders/7").unwrap().as_str(),
            "https://example.com/backend/api/orders/7"
        );
    }

    #[test]
    fn test_token_lifecycle() {
        let api = client("http://localhost:8080");
        assert!(!api.has_token());

        api.set_token(SecretString::from("jwt")).unwrap();
        assert!(api.has_token());

        let request = api
            .request(Method::GET, api.url("/api/cart").unwrap())
            .build()
            .unwrap();
        assert_eq!(
            request.headers().get("Authorization").unwrap(),
            "Bearer jwt"
        );
        assert!(request.headers().contains_key("X-Request-Id"));

        api.clear_token().unwrap();
        assert!(!api.has_token());
        let request = api
            .request(Method::GET, api.url("/api/cart").unwrap())
            .build()
            .unwrap();
        assert!(!request.headers().contains_key("Authorization"));
    }

    #[test]
    fn test_from_config_prefers_env_token() {
        let mut config = ClientConfig::new(Url::parse("http://localhost:8080").unwrap());
        config.api_token = Some(SecretString::from("from-env"));
        let api = ApiClient::from_config(&config).unwrap();
        assert!(api.has_token());
        assert!(!format!("{api:?}").contains("from-env"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        // Port 9 (discard) is essentially never listening on loopback.
        let api = client("http://127.0.0.1:9");
        let err = api.get::<serde_json::Value>("/api/cart").await.unwrap_err();
        assert!(err.kind.is_transport());
        assert_eq!(err.status, None);
    }
}
