//! Account endpoints.

use tracing::instrument;

use crate::api::{ApiClient, ApiError};
use crate::types::Identity;

/// Typed access to `/api/auth`. Login and registration are handled elsewhere;
/// this only resolves who the stored token belongs to.
#[derive(Debug, Clone)]
pub struct AccountService {
    api: ApiClient,
}

impl AccountService {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// The user the current bearer token belongs to.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`]; an invalid or expired token is
    /// [`ErrorKind::Unauthorized`](crate::api::ErrorKind::Unauthorized).
    #[instrument(skip(self))]
    pub async fn me(&self) -> Result<Identity, ApiError> {
        self.api.get("/api/auth/me").await
    }

    /// Whether a token is stored at all. No request is made.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.api.has_token()
    }

    /// The client this service talks through.
    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }
}
