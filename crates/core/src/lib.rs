//! Autoparts Core - Shared types library.
//!
//! This crate provides common types used across all Autoparts components:
//! - `storefront` - REST API client, session handling and cart/favorites state
//! - `admin` - Order, user and catalog administration on top of the storefront client
//! - `cli` - Command-line front end (`ap-cli`)
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, order statuses and roles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
