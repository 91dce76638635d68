//! Subcommand implementations.
//!
//! Commands print their results to stdout. Notices raised by the client
//! (success messages, failures) are printed by [`print_notice`] once the
//! command finishes.

pub mod account;
pub mod cart;
pub mod checkout;
pub mod orders;
pub mod products;

use sheshape_client::{ApiError, AuthState, ClientError, Notice, NoticeLevel, Storefront};
use sheshape_core::Price;
use thiserror::Error;

/// Errors specific to the command-line front-end.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The checkout file could not be read.
    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The checkout file is not a valid checkout form.
    #[error("Invalid checkout file: {0}")]
    InvalidCheckoutFile(#[from] serde_yaml::Error),

    /// Checkout did not produce an order.
    #[error("{0}")]
    CheckoutFailed(String),

    /// The order has shipped or been refunded.
    #[error("Order #{order_number} cannot be cancelled ({status})")]
    NotCancellable {
        order_number: String,
        status: String,
    },

    #[error(transparent)]
    Api(#[from] ApiError),

    /// The token store could not be updated.
    #[error("Token store error: {0}")]
    TokenStore(#[from] std::io::Error),
}

/// Resolve the stored token and load the cart.
///
/// # Errors
///
/// Returns [`ClientError::Unauthenticated`] when nobody is signed in.
pub async fn require_session(storefront: &Storefront) -> Result<(), ClientError> {
    match storefront.resolve_session().await {
        AuthState::Resolved(identity) => {
            tracing::debug!(user_id = %identity.id, "Signed in");
            Ok(())
        }
        _ => Err(ClientError::Unauthenticated),
    }
}

#[allow(clippy::print_stdout)]
pub fn print_notice(notice: &Notice) {
    let marker = match notice.level {
        NoticeLevel::Success => "✓",
        NoticeLevel::Info => "i",
        NoticeLevel::Warning => "!",
        NoticeLevel::Error => "✗",
    };
    println!("{marker} {}", notice.message);
}

/// Right-aligned money column.
fn money(price: Price) -> String {
    format!("{:>12}", price.display())
}
