//! Brewery Core - Shared types library.
//!
//! This crate provides common types used across the brewery workspace:
//! - `storefront` - Public-facing shop, taproom reservations and staff dashboard
//! - `cli` - Operator tools for migrations and backend checks
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. The remote backend owns persistence; these types describe the
//! records it hands us.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, prices, emails, statuses and the legal-age check

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
