//! Tracing subscriber setup for the binary.
//!
//! One filter governs every sink: compact lines on stderr and, when a log
//! file is configured, JSON lines appended to that file.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::{Mutex, Once};

use anyhow::Context;
use tracing::Subscriber;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_DIRECTIVE: &str = "info";
const LOG_ENV_VAR: &str = "RECIPE_VAULT_LOG";

static INIT: Once = Once::new();

/// Install the global subscriber. Calls after the first are no-ops.
///
/// The filter comes from `RECIPE_VAULT_LOG` if set, else `log_level`,
/// else `info`. An unparsable filter is an error rather than silently
/// falling back.
pub fn init(log_level: Option<&str>, log_file: Option<&Path>) -> anyhow::Result<()> {
    let mut result = Ok(());
    INIT.call_once(|| {
        result = install(std::env::var(LOG_ENV_VAR).ok().as_deref(), log_level, log_file);
    });
    result
}

fn install(env_value: Option<&str>, log_level: Option<&str>, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = build_filter(env_value, log_level)?;
    let file = log_file.map(open_log_file).transpose()?;
    subscriber(filter, file)
        .try_init()
        .context("failed to initialize logging")
}

fn subscriber(filter: EnvFilter, file: Option<File>) -> impl Subscriber + Send + Sync + 'static {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let file_layer = file.map(|file| {
        tracing_subscriber::fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .json()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
}

/// First non-blank of the env value and the configured level.
fn directive<'a>(env_value: Option<&'a str>, log_level: Option<&'a str>) -> &'a str {
    [env_value, log_level]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|d| !d.is_empty())
        .unwrap_or(DEFAULT_DIRECTIVE)
}

fn build_filter(env_value: Option<&str>, log_level: Option<&str>) -> anyhow::Result<EnvFilter> {
    let directive = directive(env_value, log_level);
    EnvFilter::try_new(directive).with_context(|| format!("invalid log filter {directive:?}"))
}

fn open_log_file(path: &Path) -> anyhow::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))
}
