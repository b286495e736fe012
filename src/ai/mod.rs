//! LLM narrative boundary.
//!
//! The report's optional narrative section comes from an external
//! text-completion collaborator behind the [`NarrativeProvider`] trait.
//! The trait is always available for custom implementations; the concrete
//! OpenAI-compatible provider requires the `ai` feature:
//!
//! ```toml
//! # Enable the narrative provider (default)
//! tabreport = { version = "0.1", features = ["ai"] }
//!
//! # Core-only build
//! tabreport = { version = "0.1", default-features = false }
//! ```
//!
//! Provider failures degrade the report to its template form; they are
//! never run-fatal and the API key is read at the binary edge, not inside
//! the core.

mod provider;

pub use provider::{NarrativeProvider, analysis_digest};

#[cfg(feature = "ai")]
mod openai;

#[cfg(feature = "ai")]
pub use openai::{OpenAiConfig, OpenAiProvider};
