use std::io::{self, Read, Write};
use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, error, info};

use recipe_vault::cli::{AddArgs, Cli, Commands, EditArgs, FlowArgs, SubstituteArgs, VaryArgs};
use recipe_vault::config::VaultConfig;
use recipe_vault::error::VaultError;
use recipe_vault::flow;
use recipe_vault::image::ImageSource;
use recipe_vault::model::create_model;
use recipe_vault::recipe::{Recipe, RecipeDraft, RecipeEdit};
use recipe_vault::storage::FileSlots;
use recipe_vault::store::RecipeStore;
use recipe_vault::substitution::{suggest_ingredient_substitutions, SubstitutionInput};
use recipe_vault::variation::{suggest_recipe_variations, VariationInput};
use recipe_vault::view::{self, Notice};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let mut stdout = io::stdout().lock();

    match run(cli, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<VaultError>().and_then(Notice::for_error) {
                Some(notice) => eprintln!("{}", notice.render()),
                None => error!("{e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, out: &mut dyn Write) -> anyhow::Result<()> {
    let config = VaultConfig::load(cli.global.config.as_deref(), &cli.global)?;

    recipe_vault::logging::init(config.log_level.as_deref(), config.log_file.as_deref())?;

    config.validate()?;

    info!(
        vault_dir = %config.vault_dir.display(),
        storage_key = %config.storage_key,
        backend = %config.model_backend,
        "config loaded"
    );

    let mut store = RecipeStore::open(FileSlots::new(&config.vault_dir), &config.storage_key)?;
    store.subscribe(|recipes| debug!(count = recipes.len(), "collection changed"));

    match cli.command {
        Commands::List => {
            write!(out, "{}", view::render_grid(store.list(), store.images()))?;
        }
        Commands::Show(args) => {
            let recipe = find(&store, &args.id)?;
            write!(out, "{}", view::render_recipe(recipe, store.images()))?;
        }
        Commands::Add(args) => {
            let recipe = store.add(draft_from(args))?;
            writeln!(out, "{}", Notice::success(format!("Added \"{}\" ({}).", recipe.name, recipe.id)).render())?;
            write!(out, "{}", view::render_grid(store.list(), store.images()))?;
        }
        Commands::Edit(args) => {
            let id = args.id.clone();
            if !store.update(&id, edit_from(args))? {
                return Err(VaultError::RecipeNotFound { id }.into());
            }
            writeln!(out, "{}", Notice::success(format!("Updated {id}.")).render())?;
            write!(out, "{}", view::render_grid(store.list(), store.images()))?;
        }
        Commands::Remove(args) => {
            if !store.remove(&args.id)? {
                return Err(VaultError::RecipeNotFound { id: args.id }.into());
            }
            writeln!(out, "{}", Notice::success(format!("Removed {}.", args.id)).render())?;
            write!(out, "{}", view::render_grid(store.list(), store.images()))?;
        }
        Commands::Substitute(args) => substitute(&config, find(&store, &args.id)?, &args, out)?,
        Commands::Vary(args) => vary(&config, find(&store, &args.id)?, &args, out)?,
        Commands::Flow(args) => run_flow(&config, &args, out)?,
    }

    Ok(())
}

fn find<'a>(store: &'a RecipeStore<FileSlots>, id: &str) -> Result<&'a Recipe, VaultError> {
    store
        .get(id)
        .ok_or_else(|| VaultError::RecipeNotFound { id: id.to_owned() })
}

fn draft_from(args: AddArgs) -> RecipeDraft {
    RecipeDraft {
        name: args.name,
        image: ImageSource::parse(&args.image),
        ingredients: args.ingredients,
        instructions: args.instructions,
    }
}

fn edit_from(args: EditArgs) -> RecipeEdit {
    RecipeEdit {
        name: args.name,
        ingredients: args.ingredients,
        instructions: args.instructions,
        image: args.image.as_deref().and_then(ImageSource::parse),
    }
}

fn substitute(
    config: &VaultConfig,
    recipe: &Recipe,
    args: &SubstituteArgs,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let model = create_model(config)?;
    let input = SubstitutionInput::for_recipe(recipe, &args.dietary_restrictions);
    let output = suggest_ingredient_substitutions(model.as_ref(), &input)?;
    write!(out, "{}", view::render_substitutions(&output))?;
    Ok(())
}

fn vary(config: &VaultConfig, recipe: &Recipe, args: &VaryArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let model = create_model(config)?;
    let input = VariationInput::for_recipe(recipe)
        .with_dietary_restrictions(args.dietary_restrictions.clone())
        .with_available_ingredients(args.available_ingredients.clone());
    let output = suggest_recipe_variations(model.as_ref(), &input)?;
    write!(out, "{}", view::render_variations(&output))?;
    Ok(())
}

fn run_flow(config: &VaultConfig, args: &FlowArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let raw = match args.input.as_deref().filter(|p| *p != Path::new("-")) {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read flow input {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read flow input from stdin")?;
            buf
        }
    };
    let input: serde_json::Value = serde_json::from_str(&raw).context("flow input is not valid JSON")?;

    if args.dry_run {
        write!(out, "{}", flow::render_json(&args.name, input)?)?;
        return Ok(());
    }

    let model = create_model(config)?;
    let output = flow::run_json(&args.name, model.as_ref(), input)?;
    writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
    Ok(())
}
