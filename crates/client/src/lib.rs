//! SheShape Client - REST client, cart store and checkout flow.
//!
//! # Architecture
//!
//! - [`api`] - Bearer-authenticated JSON transport and error normalisation
//! - [`services`] - One typed service per backend resource
//! - [`session`] - Who is signed in, published over a `watch` channel
//! - [`cart`] - Serialized, self-healing mirror of the server cart
//! - [`checkout`] - Client-side validation, server cart check, order placement
//! - [`state`] - [`Storefront`] bundle wiring the above together
//!
//! User-facing messages go through a [`Notifier`]; operations never print.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod notify;
pub mod services;
pub mod session;
pub mod state;
pub mod types;
pub mod validation;

pub use api::{ApiClient, ApiError, ErrorKind};
pub use cart::{CartSnapshot, CartStore};
pub use checkout::{Checkout, CheckoutState};
pub use config::{ClientConfig, ConfigError};
pub use error::ClientError;
pub use notify::{ChannelNotifier, Notice, NoticeLevel, Notifier, TracingNotifier};
pub use session::{AuthSession, AuthState};
pub use state::Storefront;
