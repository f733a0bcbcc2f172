//! Core types for Bazaar.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod card;
pub mod email;
pub mod id;
pub mod price;
pub mod role;

pub use card::{CardError, PaymentCard};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError, Quantity, QuantityError};
pub use role::UserRole;
