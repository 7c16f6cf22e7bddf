//! Core types for the brewery storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod age;
pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use age::{age_on, is_of_legal_age};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use status::*;
