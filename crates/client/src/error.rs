//! Crate-level error type.

use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::validation::ValidationReport;

/// Errors returned by the cart store and the storefront bundle.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The operation needs a signed-in user and none is resolved. No request
    /// was sent.
    #[error("Please log in to continue")]
    Unauthenticated,

    /// A cart line quantity of zero was requested where at least one unit is
    /// required.
    #[error("Quantity must be at least 1")]
    InvalidQuantity,

    /// The backend or the transport failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Address or payment input failed client-side checks.
    #[error("{0}")]
    Validation(ValidationReport),

    /// The server reported lines that can no longer be purchased.
    #[error("Cart contains invalid items. Please review your cart.")]
    InvalidCart,

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// The underlying API error, if any.
    #[must_use]
    pub const fn api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValidationReport> for ClientError {
    fn from(report: ValidationReport) -> Self {
        Self::Validation(report)
    }
}
