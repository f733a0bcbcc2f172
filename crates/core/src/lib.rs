//! Bazaar Core - Shared domain types.
//!
//! This crate provides the value types used across the Bazaar components:
//! - `storefront` - Catalog, cart, checkout and admin back-office
//! - `cli` - Migrations and operator tooling
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP. The optional `postgres` feature adds `sqlx` encode/decode
//! support so the storefront can bind these types directly.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, emails, prices, quantities, roles
//!   and payment card input

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
