//! # lexigen-backends
//!
//! Concrete [`lexigen_core::Generator`] implementations speaking the
//! OpenAI-compatible `/chat/completions` wire protocol.
//!
//! Two backends are provided: [`openai::OpenAiGenerator`] for the
//! OpenAI API and [`nebius::NebiusGenerator`] for Nebius AI Studio
//! (wire-compatible, different host and default model). Both own their
//! HTTP client and credentials; configuration defaults merge as
//! built-in default < backend config < per-call override.

#![deny(missing_docs)]

/// Shared chat-completions client and parameter merging.
pub mod chat;

/// Nebius AI Studio backend.
pub mod nebius;

/// OpenAI backend.
pub mod openai;

pub use nebius::NebiusGenerator;
pub use openai::OpenAiGenerator;
