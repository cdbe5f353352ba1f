//! Gemini `generateContent` client.
//!
//! Only the non-streaming text endpoint is used. The caller supplies the
//! credential for every request so the executor can rotate through the pool.

mod client;
mod error;
mod types;

pub use client::GeminiClient;
pub use error::{ApiErrorResponse, GeminiError};
pub use types::{
    Candidate, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
};
