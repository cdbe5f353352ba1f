//! ProDigital Admin library.
//!
//! This crate provides the Personal Sector panel as a library, allowing it to
//! be tested and reused by the CLI.
//!
//! # Security
//!
//! This crate holds the operator's generative-AI credentials and can rewrite
//! the public catalog. The HTTP surface binds to loopback by default and sits
//! behind a placeholder PIN gate, which is not real authentication.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod credentials;
pub mod error;
pub mod gemini;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
