//! ProDigital Storefront library.
//!
//! Read-only JSON views of the catalog and site configuration, served from
//! the same data directory the admin panel writes.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
