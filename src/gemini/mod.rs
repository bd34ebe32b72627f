//! Gemini `generateContent` client: system-prompted text and JSON generation.

pub mod client;
pub mod structured;
pub mod types;

pub use client::{GeminiClient, GeminiError, LanguageModel};
pub use types::ResponseMode;
