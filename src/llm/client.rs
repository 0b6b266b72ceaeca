//! Ollama chat client construction using RIG.

#[cfg(feature = "ollama")]
use anyhow::{Context, Result};
#[cfg(feature = "ollama")]
use rig::agent::Agent;
#[cfg(feature = "ollama")]
use rig::client::{CompletionClient, Nothing};
#[cfg(feature = "ollama")]
use rig::message::Message;
#[cfg(feature = "ollama")]
use rig::providers::ollama;
use serde::{Deserialize, Serialize};
use thiserror::Error;
#[cfg(feature = "ollama")]
use tracing::{debug, info};

use crate::config::EnvStore;

/// Environment variable consulted for the model name.
pub const MODEL_ENV_KEY: &str = "OLLAMA_MODEL";

/// Model used when the environment does not name one.
pub const DEFAULT_MODEL: &str = "deepseek-r1:7b";

/// Environment variable consulted for the Ollama server URL.
pub const URL_ENV_KEY: &str = "OLLAMA_URL";

/// Server URL used when the environment does not name one.
pub const DEFAULT_URL: &str = "http://localhost:11434";

/// Whether the Ollama client backend was compiled into this build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// The RIG Ollama provider is linked in and usable.
    Available,
    /// The crate was built without the `ollama` feature.
    Unavailable,
}

/// Errors surfaced by [`get_llm`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The build carries no Ollama backend.
    #[error("Ollama client support was not compiled in; rebuild with the `ollama` feature enabled")]
    DependencyMissing,

    /// The underlying RIG client rejected the configuration.
    #[error("failed to create Ollama client")]
    Connect(#[source] anyhow::Error),
}

/// Resolve the client capability for this build.
///
/// Fixed at compile time by the `ollama` cargo feature; checked by
/// [`get_llm`] before any configuration work happens.
pub fn client_capability() -> Capability {
    if cfg!(feature = "ollama") { Capability::Available } else { Capability::Unavailable }
}

/// Options controlling how [`get_llm`] resolves and builds the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmOptions {
    /// Environment variable consulted for the model name.
    pub model_env_key: String,

    /// Model used when `model_env_key` is unset.
    pub default_model: String,

    /// Environment variable consulted for the Ollama server URL.
    pub url_env_key: String,

    /// Server URL used when `url_env_key` is unset.
    pub default_url: String,

    /// Optional system prompt installed as the agent preamble.
    pub system_prompt: Option<String>,

    /// Sampling temperature (0.0-2.0).
    pub temperature: f64,

    /// Extra model parameters passed through to Ollama, e.g. `num_ctx`.
    pub additional_params: Option<serde_json::Value>,

    /// Maximum number of exchanges kept in the conversation history.
    pub max_history: usize,
}

impl Default for LlmOptions {
    fn default() -> Self {
        Self {
            model_env_key: MODEL_ENV_KEY.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            url_env_key: URL_ENV_KEY.to_string(),
            default_url: DEFAULT_URL.to_string(),
            system_prompt: None,
            temperature: 0.7,
            additional_params: None,
            max_history: 10,
        }
    }
}

/// Chat client bound to an Ollama server.
///
/// Returned by [`get_llm`]; holds the resolved model name and a RIG agent
/// with bounded conversation history.
pub struct LlmClient {
    model: String, // Resolved model name
    #[cfg(feature = "ollama")]
    agent: Agent<ollama::CompletionModel>, // RIG agent with Ollama backend
    #[cfg(feature = "ollama")]
    history: Vec<Message>, // Conversation history
    #[cfg(feature = "ollama")]
    max_history: usize, // Maximum retained exchanges
}

impl LlmClient {
    /// The model name this client was configured with.
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(feature = "ollama")]
impl LlmClient {
    /// Build the RIG client and agent for the resolved configuration.
    ///
    /// # Errors
    /// Returns [`ClientError::Connect`] if the client cannot be constructed
    /// (e.g. an unparseable base URL). Reachability of the server is not
    /// checked here; that surfaces on first use.
    fn connect(model: String, url: String, opts: &LlmOptions) -> Result<Self, ClientError> {
        info!("Connecting to Ollama at {}", url);
        info!("Using model: {}", model);

        let client = ollama::Client::builder()
            .api_key(Nothing)
            .base_url(&url)
            .build()
            .context("Failed to create Ollama client")
            .map_err(ClientError::Connect)?;

        let mut builder = client.agent(&model).temperature(opts.temperature);
        if let Some(prompt) = &opts.system_prompt {
            builder = builder.preamble(prompt);
        }
        if let Some(params) = &opts.additional_params {
            builder = builder.additional_params(params.clone());
        }

        Ok(Self { model, agent: builder.build(), history: Vec::new(), max_history: opts.max_history })
    }

    /// Send a message and get the complete response.
    ///
    /// The exchange is appended to the retained history, which is trimmed
    /// to the configured maximum number of exchanges.
    ///
    /// # Errors
    /// Returns an error if the LLM request fails.
    pub async fn chat(&mut self, message: &str) -> Result<String> {
        use rig::completion::Chat;

        debug!("User: {}", message);

        let response = self.agent.chat(message, self.history.clone()).await.context("LLM request failed")?;

        debug!("Assistant: {}", response);

        self.history.push(Message::user(message));
        self.history.push(Message::assistant(&response));

        // Each exchange is two messages; drop the oldest ones past the cap
        let excess = self.history.len().saturating_sub(self.max_history * 2);
        if excess > 0 {
            self.history.drain(..excess);
        }

        Ok(response)
    }

    /// Forget the retained conversation history.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

/// Build a chat client for a locally hosted Ollama model.
///
/// Checks the client capability, loads the local `.env` file into `store`
/// (merge-only), resolves the model name and server URL from the store
/// with the defaults from `opts`, and constructs the client.
///
/// # Arguments
/// * `store` - Environment snapshot to resolve configuration from
/// * `opts` - Lookup keys, defaults, and agent settings
///
/// # Returns
/// A configured [`LlmClient`]. No request is made to the server yet.
///
/// # Errors
/// Returns [`ClientError::DependencyMissing`] when built without the
/// `ollama` feature (the store is left untouched in that case), or
/// [`ClientError::Connect`] if client construction fails.
#[cfg_attr(not(feature = "ollama"), allow(unused_variables))]
pub fn get_llm(store: &mut EnvStore, opts: &LlmOptions) -> Result<LlmClient, ClientError> {
    if client_capability() == Capability::Unavailable {
        return Err(ClientError::DependencyMissing);
    }

    #[cfg(feature = "ollama")]
    {
        store.load_env();

        let model = store.get_or(&opts.model_env_key, &opts.default_model).to_string();
        let url = store.get_or(&opts.url_env_key, &opts.default_url).to_string();

        return LlmClient::connect(model, url, opts);
    }

    #[cfg(not(feature = "ollama"))]
    unreachable!("capability check above rejects builds without the ollama feature")
}
