use std::fmt;
use std::path::PathBuf;

const MODEL_CMD_HELP: &str = "set model_cmd (or RECIPE_VAULT_MODEL_CMD) to an installed LLM CLI";

/// Which side of a flow call failed shape validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaStage {
    Input,
    Output,
}

impl fmt::Display for SchemaStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaStage::Input => f.write_str("input"),
            SchemaStage::Output => f.write_str("output"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// A required recipe field was empty. Surfaced to the user as a notice.
    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("Image file does not exist: {path}")]
    ImageFileNotFound { path: PathBuf },

    #[error("Recipe {id} not found")]
    RecipeNotFound { id: String },

    #[error("Failed to read storage slot {path}: {detail}")]
    StorageRead { path: PathBuf, detail: String },

    #[error("Failed to write storage slot {path}: {detail}")]
    StorageWrite { path: PathBuf, detail: String },

    #[error("Failed to parse environment variable '{var}': {detail}")]
    ConfigEnvParseError { var: String, detail: String },

    #[error("Invalid model_backend value '{value}' (expected \"command\", \"anthropic\", or \"fake\")")]
    InvalidModelBackend { value: String },

    #[error("Invalid storage_key '{value}' (must be non-empty and contain no path separators)")]
    InvalidStorageKey { value: String },

    #[error("Model command '{cmd}' not found on PATH; {MODEL_CMD_HELP}")]
    ModelCmdNotFound { cmd: String },

    #[error("Model backend not configured: {detail}")]
    ModelNotConfigured { detail: String },

    #[error("Model command failed to start: {detail}")]
    ModelSpawnFailed { detail: String },

    #[error("Model command timed out after {timeout_sec}s")]
    ModelTimedOut { timeout_sec: u64 },

    #[error("Model command exited with code {exit_code:?}")]
    ModelNonZeroExit {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Model request failed: {detail}")]
    ModelRequestFailed { detail: String },

    #[error("Model API returned error: {status} - {message}")]
    ModelApiError { status: u16, message: String },

    #[error("Flow {flow} {stage} does not match its schema: {detail}")]
    SchemaViolation {
        flow: &'static str,
        stage: SchemaStage,
        detail: String,
    },

    #[error("Unknown flow '{name}' (available: {available:?})")]
    UnknownFlow {
        name: String,
        available: Vec<&'static str>,
    },
}
