//! Lumen Beauty storefront library.
//!
//! A JSON backend-for-frontend over the Lumen commerce REST API. Visitor
//! state (cart, wishlist, comparison, recently viewed, currency, sign-in)
//! lives in a server-side session; everything persistent lives upstream.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
