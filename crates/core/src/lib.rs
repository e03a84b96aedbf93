//! Lumen Core - Shared domain types for the Lumen Beauty storefront.
//!
//! This crate provides the types used by the storefront service, the CLI and
//! the integration tests:
//! - `storefront` - Backend-for-frontend serving the shop's JSON API
//! - `cli` - Command-line tools for session store migrations
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. Cart math, list caps and currency
//! conversion live here so they can be tested without a backend.
//!
//! # Modules
//!
//! - [`types`] - Ids, money, products, cart lines and totals, bounded lists,
//!   checkout and account records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
