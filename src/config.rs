use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::cli::GlobalArgs;
use crate::error::VaultError;
use crate::store::DEFAULT_STORAGE_KEY;

// Precedence: CLI > env > file > defaults.

const DEFAULT_VAULT_DIR: &str = ".recipe-vault";
const DEFAULT_MODEL_CMD: &str = "llm";
const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-sonnet-20241022";
const DEFAULT_MAX_TOKENS: u32 = 1024;

const ENV_PREFIX: &str = "RECIPE_VAULT_";

/// Which service answers suggestion prompts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModelBackend {
    /// An LLM command-line tool, prompt passed as the final argument.
    #[default]
    Command,
    /// The Anthropic messages HTTP API.
    Anthropic,
    /// Canned offline replies.
    Fake,
}

impl FromStr for ModelBackend {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "command" => Ok(ModelBackend::Command),
            "anthropic" => Ok(ModelBackend::Anthropic),
            "fake" => Ok(ModelBackend::Fake),
            other => Err(VaultError::InvalidModelBackend {
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for ModelBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ModelBackend::Command => "command",
            ModelBackend::Anthropic => "anthropic",
            ModelBackend::Fake => "fake",
        })
    }
}

/// Resolved configuration for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultConfig {
    pub vault_dir: PathBuf,
    pub storage_key: String,
    pub model_backend: ModelBackend,
    pub model_cmd: String,
    /// Leading arguments for the model command, before `--model` and the prompt.
    pub model_args: Vec<String>,
    pub model: Option<String>,
    pub api_url: String,
    /// Name of the env var holding the API key; the key itself is never configured in files.
    pub api_key_env: String,
    pub max_tokens: u32,
    pub model_timeout_sec: Option<u64>,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
}

/// TOML-deserializable config file representation. All fields optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    vault_dir: Option<PathBuf>,
    storage_key: Option<String>,
    model_backend: Option<String>,
    model_cmd: Option<String>,
    model_args: Option<Vec<String>>,
    model: Option<String>,
    api_url: Option<String>,
    api_key_env: Option<String>,
    max_tokens: Option<u32>,
    model_timeout_sec: Option<u64>,
    log_level: Option<String>,
    log_file: Option<PathBuf>,
}

/// One source of settings; every field optional so layers can be merged.
#[derive(Debug, Default)]
struct ConfigLayer {
    vault_dir: Option<PathBuf>,
    storage_key: Option<String>,
    model_backend: Option<String>,
    model_cmd: Option<String>,
    model_args: Option<Vec<String>>,
    model: Option<String>,
    api_url: Option<String>,
    api_key_env: Option<String>,
    max_tokens: Option<u32>,
    model_timeout_sec: Option<u64>,
    log_level: Option<String>,
    log_file: Option<PathBuf>,
}

impl VaultConfig {
    /// Load configuration with precedence: CLI > env > file > defaults.
    pub fn load(config_path: Option<&Path>, cli_args: &GlobalArgs) -> anyhow::Result<Self> {
        Self::load_with_env(config_path, cli_args, real_env_var)
    }

    /// Reject settings that cannot work regardless of the command being run.
    pub fn validate(&self) -> Result<(), VaultError> {
        let key = self.storage_key.trim();
        if key.is_empty() || key.contains('/') || key.contains('\\') || key == "." || key == ".." {
            return Err(VaultError::InvalidStorageKey {
                value: self.storage_key.clone(),
            });
        }
        Ok(())
    }

    /// Model name to send to the backend, with the backend's default applied.
    pub fn effective_model(&self) -> Option<&str> {
        match (self.model.as_deref(), self.model_backend) {
            (Some(m), _) => Some(m),
            (None, ModelBackend::Anthropic) => Some(DEFAULT_ANTHROPIC_MODEL),
            (None, _) => None,
        }
    }

    /// Internal constructor that accepts an env-var lookup function,
    /// enabling deterministic testing without process-global mutation.
    pub(crate) fn load_with_env(
        config_path: Option<&Path>,
        cli_args: &GlobalArgs,
        env_fn: fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let file_layer = match config_path {
            Some(path) => load_file_layer(path)?,
            None => ConfigLayer::default(),
        };
        let env_layer = load_env_layer(env_fn)?;
        let cli_layer = cli_layer_from(cli_args);

        let merged = merge_layers(file_layer, env_layer, cli_layer);

        let model_backend = match merged.model_backend.as_deref() {
            Some(s) => s.parse::<ModelBackend>()?,
            None => ModelBackend::default(),
        };

        Ok(VaultConfig {
            vault_dir: merged
                .vault_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_VAULT_DIR)),
            storage_key: merged
                .storage_key
                .unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_owned()),
            model_backend,
            model_cmd: merged
                .model_cmd
                .unwrap_or_else(|| DEFAULT_MODEL_CMD.to_owned()),
            model_args: merged.model_args.unwrap_or_default(),
            model: merged.model,
            api_url: merged
                .api_url
                .unwrap_or_else(|| DEFAULT_API_URL.to_owned()),
            api_key_env: merged
                .api_key_env
                .unwrap_or_else(|| DEFAULT_API_KEY_ENV.to_owned()),
            max_tokens: merged.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            model_timeout_sec: merged.model_timeout_sec,
            log_level: merged.log_level,
            log_file: merged.log_file,
        })
    }
}

fn load_file_layer(path: &Path) -> anyhow::Result<ConfigLayer> {
    let contents = fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;
    let fc: FileConfig = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("failed to parse config file {}: {e}", path.display()))?;
    Ok(ConfigLayer {
        vault_dir: fc.vault_dir,
        storage_key: fc.storage_key,
        model_backend: fc.model_backend,
        model_cmd: fc.model_cmd,
        model_args: fc.model_args,
        model: fc.model,
        api_url: fc.api_url,
        api_key_env: fc.api_key_env,
        max_tokens: fc.max_tokens,
        model_timeout_sec: fc.model_timeout_sec,
        log_level: fc.log_level,
        log_file: fc.log_file,
    })
}

fn real_env_var(suffix: &str) -> Option<String> {
    let key = format!("{ENV_PREFIX}{suffix}");
    env::var(&key).ok().filter(|v| !v.is_empty())
}

fn load_env_layer(env_fn: fn(&str) -> Option<String>) -> Result<ConfigLayer, VaultError> {
    Ok(ConfigLayer {
        vault_dir: env_fn("VAULT_DIR").map(PathBuf::from),
        storage_key: env_fn("STORAGE_KEY"),
        model_backend: env_fn("MODEL_BACKEND"),
        model_cmd: env_fn("MODEL_CMD"),
        model_args: env_fn("MODEL_ARGS").as_deref().map(parse_args_str),
        model: env_fn("MODEL"),
        api_url: env_fn("API_URL"),
        api_key_env: env_fn("API_KEY_ENV"),
        max_tokens: parse_env_num(env_fn, "MAX_TOKENS")?,
        model_timeout_sec: parse_env_num(env_fn, "MODEL_TIMEOUT_SEC")?,
        log_level: env_fn("LOG_LEVEL"),
        log_file: env_fn("LOG_FILE").map(PathBuf::from),
    })
}

/// Split a flat argument string on commas and whitespace.
fn parse_args_str(s: &str) -> Vec<String> {
    s.split(',')
        .flat_map(|part| part.split_whitespace().map(str::to_owned))
        .collect()
}

fn parse_env_num<T>(env_fn: fn(&str) -> Option<String>, suffix: &str) -> Result<Option<T>, VaultError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env_fn(suffix) {
        Some(s) => s
            .parse::<T>()
            .map(Some)
            .map_err(|e| VaultError::ConfigEnvParseError {
                var: format!("{ENV_PREFIX}{suffix}"),
                detail: e.to_string(),
            }),
        None => Ok(None),
    }
}

fn cli_layer_from(args: &GlobalArgs) -> ConfigLayer {
    ConfigLayer {
        vault_dir: args.vault_dir.clone(),
        storage_key: args.storage_key.clone(),
        model_backend: args.model_backend.clone(),
        model_cmd: args.model_cmd.clone(),
        model_args: None,
        model: args.model.clone(),
        api_url: None,
        api_key_env: None,
        max_tokens: None,
        model_timeout_sec: args.model_timeout_sec,
        log_level: args.log_level.clone(),
        log_file: args.log_file.clone(),
    }
}

/// Merge three layers. For each field, pick CLI first, then env, then file.
fn merge_layers(file: ConfigLayer, env: ConfigLayer, cli: ConfigLayer) -> ConfigLayer {
    ConfigLayer {
        vault_dir: cli.vault_dir.or(env.vault_dir).or(file.vault_dir),
        storage_key: cli.storage_key.or(env.storage_key).or(file.storage_key),
        model_backend: cli
            .model_backend
            .or(env.model_backend)
            .or(file.model_backend),
        model_cmd: cli.model_cmd.or(env.model_cmd).or(file.model_cmd),
        model_args: cli.model_args.or(env.model_args).or(file.model_args),
        model: cli.model.or(env.model).or(file.model),
        api_url: cli.api_url.or(env.api_url).or(file.api_url),
        api_key_env: cli.api_key_env.or(env.api_key_env).or(file.api_key_env),
        max_tokens: cli.max_tokens.or(env.max_tokens).or(file.max_tokens),
        model_timeout_sec: cli
            .model_timeout_sec
            .or(env.model_timeout_sec)
            .or(file.model_timeout_sec),
        log_level: cli.log_level.or(env.log_level).or(file.log_level),
        log_file: cli.log_file.or(env.log_file).or(file.log_file),
    }
}
