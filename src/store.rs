//! The recipe collection and its persistence.
//!
//! The store owns the in-memory list, mirrors the whole list into a single
//! storage slot after every successful mutation, and notifies subscribed
//! listeners so a view can redraw.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::error::VaultError;
use crate::image::ImageRegistry;
use crate::recipe::{new_recipe_id, Recipe, RecipeDraft, RecipeEdit};
use crate::storage::SlotStore;

/// Default storage slot holding the serialized collection.
pub const DEFAULT_STORAGE_KEY: &str = "recipes";

type Listener = Box<dyn FnMut(&[Recipe])>;

pub struct RecipeStore<S: SlotStore> {
    slots: S,
    key: String,
    recipes: Vec<Recipe>,
    images: ImageRegistry,
    listeners: Vec<Listener>,
}

impl<S: SlotStore> std::fmt::Debug for RecipeStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecipeStore")
            .field("key", &self.key)
            .field("recipes", &self.recipes.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<S: SlotStore> RecipeStore<S> {
    /// Load the collection from `key`, starting empty if the slot is absent
    /// or does not hold a valid recipe array.
    ///
    /// Unexpected read failures (e.g. permission denied) are returned.
    pub fn open(slots: S, key: &str) -> Result<Self, VaultError> {
        let recipes = match slots.read_slot(key)? {
            None => Vec::new(),
            Some(contents) => match serde_json::from_str::<Vec<Recipe>>(&contents) {
                Ok(loaded) => dedupe_ids(loaded),
                Err(e) => {
                    warn!(key, err = %e, "ignoring malformed recipe slot");
                    Vec::new()
                }
            },
        };
        debug!(key, count = recipes.len(), "recipe store opened");

        Ok(Self {
            slots,
            key: key.to_owned(),
            recipes,
            images: ImageRegistry::new(),
            listeners: Vec::new(),
        })
    }

    /// Current collection in insertion order.
    pub fn list(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn get(&self, id: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.id == id)
    }

    pub fn images(&self) -> &ImageRegistry {
        &self.images
    }

    /// Register a callback invoked with the full collection after each mutation.
    pub fn subscribe(&mut self, listener: impl FnMut(&[Recipe]) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Append a new recipe with a fresh identifier.
    ///
    /// Nothing changes when any field is missing.
    pub fn add(&mut self, draft: RecipeDraft) -> Result<Recipe, VaultError> {
        draft.validate()?;
        let image = match &draft.image {
            Some(source) => self.images.reference_for(source)?,
            None => return Err(VaultError::MissingField { field: "image" }),
        };

        let recipe = Recipe {
            id: new_recipe_id(),
            name: draft.name,
            image,
            ingredients: draft.ingredients,
            instructions: draft.instructions,
        };
        info!(recipe_id = %recipe.id, name = %recipe.name, "recipe added");
        self.recipes.push(recipe.clone());
        self.commit()?;
        Ok(recipe)
    }

    /// Replace the mutable fields of the recipe with `id`.
    ///
    /// Returns `Ok(false)` without writing when no recipe has that id.
    pub fn update(&mut self, id: &str, edit: RecipeEdit) -> Result<bool, VaultError> {
        edit.validate()?;
        let Some(pos) = self.recipes.iter().position(|r| r.id == id) else {
            debug!(recipe_id = id, "update ignored, no such recipe");
            return Ok(false);
        };

        let image = match &edit.image {
            Some(source) => Some(self.images.reference_for(source)?),
            None => None,
        };

        let recipe = &mut self.recipes[pos];
        recipe.name = edit.name;
        recipe.ingredients = edit.ingredients;
        recipe.instructions = edit.instructions;
        if let Some(image) = image {
            let old = std::mem::replace(&mut recipe.image, image);
            self.images.release(&old);
        }
        info!(recipe_id = id, "recipe updated");
        self.commit()?;
        Ok(true)
    }

    /// Remove the recipe with `id`. Returns `Ok(false)` when absent.
    pub fn remove(&mut self, id: &str) -> Result<bool, VaultError> {
        let Some(pos) = self.recipes.iter().position(|r| r.id == id) else {
            debug!(recipe_id = id, "remove ignored, no such recipe");
            return Ok(false);
        };
        let removed = self.recipes.remove(pos);
        self.images.release(&removed.image);
        info!(recipe_id = id, "recipe removed");
        self.commit()?;
        Ok(true)
    }

    /// Persist the whole collection, then notify listeners.
    ///
    /// The in-memory change stands even if the write fails.
    fn commit(&mut self) -> Result<(), VaultError> {
        let written = serde_json::to_string_pretty(&self.recipes)
            .map_err(|e| VaultError::StorageWrite {
                path: self.key.clone().into(),
                detail: format!("serialization failed: {e}"),
            })
            .and_then(|json| self.slots.write_slot(&self.key, &json));

        if let Err(e) = &written {
            warn!(key = %self.key, err = %e, "failed to persist recipes");
        }

        for listener in &mut self.listeners {
            listener(&self.recipes);
        }
        written
    }
}

/// Keep the first recipe for each identifier.
fn dedupe_ids(recipes: Vec<Recipe>) -> Vec<Recipe> {
    let mut seen = HashSet::new();
    let before = recipes.len();
    let kept: Vec<Recipe> = recipes
        .into_iter()
        .filter(|r| seen.insert(r.id.clone()))
        .collect();
    if kept.len() != before {
        warn!(
            dropped = before - kept.len(),
            "dropped recipes with duplicate ids"
        );
    }
    kept
}
