//! LLM client module for interacting with language models.
//!
//! Uses RIG with Ollama provider for local LLM inference. The provider is
//! compiled in through the `ollama` cargo feature; without it the factory
//! reports the capability as unavailable.

mod client;

pub use client::{
    Capability, ClientError, DEFAULT_MODEL, DEFAULT_URL, LlmClient, LlmOptions, MODEL_ENV_KEY,
    URL_ENV_KEY, client_capability, get_llm,
};
