//! Core types for ProDigital Reviews.
//!
//! This module provides type-safe wrappers for the catalog, the site-wide
//! configuration and the admin agent's instruction contract.

pub mod contact;
pub mod id;
pub mod instruction;
pub mod log;
pub mod product;
pub mod site;

pub use contact::{ContactEmail, ContactEmailError};
pub use id::ProductId;
pub use instruction::{AgentInstruction, InstructionError, KNOWN_ACTIONS, strip_code_fences};
pub use log::{LogEntry, LogLevel};
pub use product::{PricingTier, Product, Rating, RatingError, seed_products};
pub use site::SiteConfig;
