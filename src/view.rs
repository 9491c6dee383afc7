//! Text rendering for the command-line front end: recipe cards, notices,
//! and suggestion results.

use std::fmt::Write;

use crate::error::VaultError;
use crate::image::ImageRegistry;
use crate::recipe::Recipe;
use crate::substitution::SubstitutionOutput;
use crate::variation::VariationOutput;

const CARD_PREVIEW_CHARS: usize = 60;

/// A short user-facing message, the terminal's stand-in for a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: &'static str,
    pub description: String,
}

impl Notice {
    /// Notice for an error the user can fix, or `None` for other failures.
    pub fn for_error(err: &VaultError) -> Option<Self> {
        match err {
            VaultError::MissingField { .. } => Some(Notice {
                title: "Error",
                description: "Please fill in all fields.".to_owned(),
            }),
            VaultError::ImageFileNotFound { path } => Some(Notice {
                title: "Error",
                description: format!("Image file {} could not be read.", path.display()),
            }),
            _ => None,
        }
    }

    pub fn success(description: impl Into<String>) -> Self {
        Notice {
            title: "Success",
            description: description.into(),
        }
    }

    pub fn render(&self) -> String {
        format!("{}: {}", self.title, self.description)
    }
}

/// All recipes as cards, or a hint when there are none.
pub fn render_grid(recipes: &[Recipe], images: &ImageRegistry) -> String {
    if recipes.is_empty() {
        return "No recipes yet. Add one with `recipe-vault add`.\n".to_owned();
    }
    let mut out = String::new();
    for recipe in recipes {
        out.push_str(&render_card(recipe, images));
        out.push('\n');
    }
    out
}

/// One compact card: name, id, image status and an ingredient preview.
pub fn render_card(recipe: &Recipe, images: &ImageRegistry) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[{}] {}", recipe.id, recipe.name);
    let _ = writeln!(out, "  image: {}", image_label(&recipe.image, images));
    let _ = writeln!(out, "  ingredients: {}", preview(&recipe.ingredients));
    out
}

/// Every field in full.
pub fn render_recipe(recipe: &Recipe, images: &ImageRegistry) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", recipe.name);
    let _ = writeln!(out, "id: {}", recipe.id);
    let _ = writeln!(out, "image: {}", image_label(&recipe.image, images));
    let _ = writeln!(out, "\nIngredients:\n{}", recipe.ingredients.trim_end());
    let _ = writeln!(out, "\nInstructions:\n{}", recipe.instructions.trim_end());
    out
}

pub fn render_substitutions(output: &SubstitutionOutput) -> String {
    format!(
        "Original ingredients:\n{}\n\nSuggested substitutions:\n{}\n\nReasoning:\n{}\n",
        output.original_ingredients.trim_end(),
        output.suggested_substitutions.trim_end(),
        output.reasoning.trim_end()
    )
}

pub fn render_variations(output: &VariationOutput) -> String {
    let mut out = String::new();
    for (i, variation) in output.variations.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, variation.trim());
    }
    out
}

fn image_label(reference: &str, images: &ImageRegistry) -> String {
    match images.resolve(reference) {
        Some(path) => path.display().to_string(),
        None if images.is_available(reference) => reference.to_owned(),
        None => "image unavailable".to_owned(),
    }
}

/// First line of `text`, shortened to the card width.
fn preview(text: &str) -> String {
    let line = text.lines().next().unwrap_or("").trim();
    if line.chars().count() > CARD_PREVIEW_CHARS {
        let cut: String = line.chars().take(CARD_PREVIEW_CHARS).collect();
        format!("{cut}…")
    } else {
        line.to_owned()
    }
}
