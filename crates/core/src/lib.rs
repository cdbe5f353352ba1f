//! ProDigital Core - Shared types and site-state storage.
//!
//! This crate provides the domain model used across all ProDigital components:
//! - `storefront` - Public-facing, read-only review catalog
//! - `admin` - Personal Sector panel that mutates the catalog through an AI agent
//! - `cli` - Command-line tools for operators
//!
//! # Architecture
//!
//! The core crate contains types, the instruction contract returned by the AI
//! agent, and the key-value persistence seam. It has no HTTP clients and no
//! async runtime, so it can be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Catalog entries, site configuration, audit log entries and
//!   agent instructions
//! - [`store`] - Key-value store trait, memory and file backends, and the
//!   typed [`SiteState`](store::SiteState) snapshot

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod store;
pub mod types;

pub use store::{
    FileStore, KeyValueStore, MemoryStore, SiteContent, SiteState, StoreError, StoreKey,
};
pub use types::*;
