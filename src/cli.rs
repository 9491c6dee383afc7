use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Recipe Vault: keep your recipes and ask an LLM for substitutions and variations.
#[derive(Debug, Parser)]
#[command(name = "recipe-vault", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand.
///
/// Each can also be set via config file or `RECIPE_VAULT_*` env vars.
/// Precedence: CLI > env > file.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct GlobalArgs {
    /// Path to a TOML configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the persisted recipe collection (default: ".recipe-vault").
    #[arg(long, global = true)]
    pub vault_dir: Option<PathBuf>,

    /// Storage slot name for the collection (default: "recipes").
    #[arg(long, global = true)]
    pub storage_key: Option<String>,

    /// Model backend: "command", "anthropic", or "fake" (default: "command").
    #[arg(long, global = true)]
    pub model_backend: Option<String>,

    /// LLM CLI binary name or path for the command backend (default: "llm").
    #[arg(long, global = true)]
    pub model_cmd: Option<String>,

    /// Model override passed to the backend.
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Kill the model command after this many seconds (default: no limit).
    #[arg(long, global = true)]
    pub model_timeout_sec: Option<u64>,

    /// Log level or filter directive (e.g. "debug", "recipe_vault=trace").
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Also write JSON logs to this file (appending).
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show all recipes as cards.
    List,

    /// Show one recipe in full.
    Show(IdArgs),

    /// Add a recipe. Every field is required.
    Add(AddArgs),

    /// Replace a recipe's name, ingredients, and instructions.
    Edit(EditArgs),

    /// Delete a recipe.
    Remove(IdArgs),

    /// Suggest ingredient substitutions for a stored recipe.
    Substitute(SubstituteArgs),

    /// Suggest three variations of a stored recipe.
    Vary(VaryArgs),

    /// Run a suggestion flow on raw JSON input.
    Flow(FlowArgs),
}

#[derive(Debug, Clone, clap::Args)]
pub struct IdArgs {
    /// Recipe identifier.
    pub id: String,
}

/// Missing text flags are treated as empty fields so the store reports them.
#[derive(Debug, Clone, clap::Args)]
pub struct AddArgs {
    #[arg(long, default_value = "")]
    pub name: String,

    /// Image URL, or path to a local image file.
    #[arg(long, default_value = "")]
    pub image: String,

    #[arg(long, default_value = "")]
    pub ingredients: String,

    #[arg(long, default_value = "")]
    pub instructions: String,
}

#[derive(Debug, Clone, clap::Args)]
pub struct EditArgs {
    /// Recipe identifier.
    pub id: String,

    #[arg(long, default_value = "")]
    pub name: String,

    #[arg(long, default_value = "")]
    pub ingredients: String,

    #[arg(long, default_value = "")]
    pub instructions: String,

    /// Replace the image as well (URL or local file).
    #[arg(long)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, clap::Args)]
pub struct SubstituteArgs {
    /// Recipe identifier.
    pub id: String,

    /// Dietary restrictions or preferences (e.g. "vegan", "gluten-free").
    #[arg(long)]
    pub dietary_restrictions: String,
}

#[derive(Debug, Clone, clap::Args)]
pub struct VaryArgs {
    /// Recipe identifier.
    pub id: String,

    #[arg(long)]
    pub dietary_restrictions: Option<String>,

    /// Ingredients on hand that variations may use.
    #[arg(long)]
    pub available_ingredients: Option<String>,
}

#[derive(Debug, Clone, clap::Args)]
pub struct FlowArgs {
    /// Flow name, e.g. "suggestRecipeVariationsFlow".
    pub name: String,

    /// JSON input file; "-" or omitted reads stdin.
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Print the rendered prompt instead of calling the model.
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}
