//! HTTP middleware for admin.
//!
//! - `session` - In-memory tower-sessions layer
//! - `auth` - PIN gate and the unlocked-session extractor

pub mod auth;
pub mod session;

pub use auth::{RequireUnlocked, lock, pin_accepted, unlock};
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
