//! Google Gemini provider implementation.

pub mod client;
pub mod content;
pub mod types;

pub use client::GeminiClient;
pub use content::GeminiContentProvider;
