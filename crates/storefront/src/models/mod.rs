//! Visitor state kept in the session.
//!
//! The session stands in for browser storage: each slice is stored under its
//! own key so one feature never rewrites another's data.

pub mod session;

pub use session::{AuthSession, session_keys};
