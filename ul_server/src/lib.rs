//! HTTP surface for the user_login authentication service.
//!
//! Thin request-handling layer over [`user_login::AuthManager`]: JSON
//! envelope responses, bearer-token extraction, configuration loading,
//! and structured logging. All authentication decisions live in the
//! library; this crate only translates HTTP to manager calls and errors
//! to status codes.

pub mod api;
pub mod config;
pub mod logging;
