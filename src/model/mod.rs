//! Model-invocation backends for the suggestion flows.
//!
//! A backend takes a fully rendered prompt and returns the model's raw text
//! reply. Each call is a single request/response exchange: no retry, no
//! streaming. Shape validation of the reply happens in [`crate::flow`].

mod anthropic;
mod command;
mod fake;

pub use anthropic::AnthropicModel;
pub use command::{resolve_model_cmd, CommandModel};
pub use fake::FakeModel;

use std::fmt;
use std::time::Duration;

use crate::config::{ModelBackend, VaultConfig};
use crate::error::VaultError;

/// A service that completes prompts.
pub trait ModelClient: fmt::Debug {
    /// Send `prompt` and return the model's text reply.
    fn complete(&self, prompt: &str) -> Result<String, VaultError>;

    /// Backend name used in logs (e.g. "command", "anthropic", "fake").
    fn provider_name(&self) -> &'static str;

    fn model_name(&self) -> &str;
}

/// Build the backend selected by `config`.
pub fn create_model(config: &VaultConfig) -> Result<Box<dyn ModelClient>, VaultError> {
    create_model_with_env(config, |name| std::env::var(name).ok())
}

fn create_model_with_env(
    config: &VaultConfig,
    env_fn: impl Fn(&str) -> Option<String>,
) -> Result<Box<dyn ModelClient>, VaultError> {
    match config.model_backend {
        ModelBackend::Fake => Ok(Box::new(FakeModel::with_recipe_responses())),
        ModelBackend::Command => {
            let program = resolve_model_cmd(&config.model_cmd)?;
            Ok(Box::new(CommandModel::new(
                program,
                config.model_args.clone(),
                config.effective_model().map(str::to_owned),
                config.model_timeout_sec.map(Duration::from_secs),
            )))
        }
        ModelBackend::Anthropic => {
            let api_key = env_fn(&config.api_key_env)
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| VaultError::ModelNotConfigured {
                    detail: format!("{} not set", config.api_key_env),
                })?;
            let model = config
                .effective_model()
                .unwrap_or_default()
                .to_owned();
            Ok(Box::new(AnthropicModel::new(
                api_key,
                model,
                config.api_url.clone(),
                config.max_tokens,
            )))
        }
    }
}
