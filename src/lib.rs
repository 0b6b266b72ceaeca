//! Environment-backed configuration for local LLM clients.
//!
//! This crate reads settings from an explicit environment snapshot,
//! optionally seeded from a local `.env` file, and builds a chat client
//! for a locally hosted Ollama server (via RIG). Configuration is
//! optional by design: every lookup falls back to a default, and a
//! missing `.env` file is the expected common case.

pub mod config;
pub mod llm;

pub use config::EnvStore;
pub use llm::{Capability, ClientError, LlmClient, LlmOptions, client_capability, get_llm};
