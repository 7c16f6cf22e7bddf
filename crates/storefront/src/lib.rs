//! Hopwright Brewing storefront library.
//!
//! The binary in `main.rs` wires this up with Postgres sessions and Sentry;
//! integration tests build the same router against a mock backend.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod filters;
pub mod images;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod taproom;
