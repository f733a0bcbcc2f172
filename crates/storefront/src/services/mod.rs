//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Registration and password login
//! - `account` - Profile view/edit and account deletion
//! - `cart` - Per-user cart lines
//! - `checkout` - Validation and the order transaction
//! - `catalog` - Browsing plus category/product management
//! - `media` - Uploaded product images
//!
//! Services borrow the pool and are built per request. The acting user is
//! always an explicit argument.

pub mod account;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod media;
