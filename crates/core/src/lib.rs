//! SheShape Core - Shared types library.
//!
//! This crate provides common types used across all SheShape components:
//! - `client` - API client, cart store and checkout orchestration
//! - `cli` - Command-line front-end for the storefront
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
