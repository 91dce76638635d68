//! Token and identity commands.
//!
//! # Usage
//!
//! ```bash
//! sheshape token set <TOKEN>
//! sheshape whoami
//! sheshape token clear
//! ```

use secrecy::SecretString;
use sheshape_client::{AuthState, Storefront};

use super::CommandError;

/// Persist a bearer token for later runs.
///
/// # Errors
///
/// Returns an error if the token store cannot be written.
#[allow(clippy::print_stdout)]
pub fn set_token(storefront: &Storefront, token: String) -> Result<(), CommandError> {
    storefront.api().set_token(SecretString::from(token.trim().to_string()))?;
    println!("Token saved");
    Ok(())
}

/// Forget the stored token.
///
/// # Errors
///
/// Returns an error if the token store cannot be cleared.
#[allow(clippy::print_stdout)]
pub fn clear_token(storefront: &Storefront) -> Result<(), CommandError> {
    storefront.session().sign_out(storefront.account())?;
    println!("Signed out");
    Ok(())
}

/// Show who the stored token belongs to.
#[allow(clippy::print_stdout)]
pub async fn whoami(storefront: &Storefront) {
    match storefront.session().resolve(storefront.account()).await {
        AuthState::Resolved(identity) => {
            println!("{} (id {})", identity.username, identity.id);
            if let Some(email) = &identity.email {
                println!("  email: {email}");
            }
            if let Some(role) = &identity.role {
                println!("  role:  {role}");
            }
        }
        _ => println!("Not signed in"),
    }
}
