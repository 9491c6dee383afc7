use serde::{Deserialize, Serialize};

use crate::error::VaultError;
use crate::image::ImageSource;

/// A stored recipe. Serialized as one element of the persisted JSON array.
///
/// `id` is assigned once by the store and never rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    /// Remote URL or a `blob:` reference produced by the image registry.
    pub image: String,
    pub ingredients: String,
    pub instructions: String,
}

/// User-supplied fields for a new recipe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeDraft {
    pub name: String,
    pub image: Option<ImageSource>,
    pub ingredients: String,
    pub instructions: String,
}

impl RecipeDraft {
    /// Checks that every field is filled in; reports the first one that is not.
    pub fn validate(&self) -> Result<(), VaultError> {
        require("name", &self.name)?;
        if self.image.as_ref().is_none_or(ImageSource::is_empty) {
            return Err(VaultError::MissingField { field: "image" });
        }
        require("ingredients", &self.ingredients)?;
        require("instructions", &self.instructions)
    }
}

/// Replacement values for an existing recipe's mutable fields.
///
/// `image: None` keeps the current image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeEdit {
    pub name: String,
    pub ingredients: String,
    pub instructions: String,
    pub image: Option<ImageSource>,
}

impl RecipeEdit {
    pub fn validate(&self) -> Result<(), VaultError> {
        require("name", &self.name)?;
        require("ingredients", &self.ingredients)?;
        require("instructions", &self.instructions)?;
        if self.image.as_ref().is_some_and(ImageSource::is_empty) {
            return Err(VaultError::MissingField { field: "image" });
        }
        Ok(())
    }
}

/// Whitespace-only text counts as missing.
fn require(field: &'static str, value: &str) -> Result<(), VaultError> {
    if value.trim().is_empty() {
        Err(VaultError::MissingField { field })
    } else {
        Ok(())
    }
}

/// Generate a fresh recipe identifier.
pub fn new_recipe_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_draft() -> RecipeDraft {
        RecipeDraft {
            name: "Pasta".into(),
            image: Some(ImageSource::Remote("https://example.com/p.jpg".into())),
            ingredients: "pasta, water".into(),
            instructions: "boil, drain".into(),
        }
    }

    fn missing(err: VaultError) -> &'static str {
        match err {
            VaultError::MissingField { field } => field,
            other => panic!("expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn full_draft_is_valid() {
        full_draft().validate().expect("all fields present");
    }

    #[test]
    fn draft_reports_first_missing_field() {
        let mut d = full_draft();
        d.name = String::new();
        d.instructions = String::new();
        assert_eq!(missing(d.validate().unwrap_err()), "name");
    }

    #[test]
    fn draft_without_image_is_invalid() {
        let mut d = full_draft();
        d.image = None;
        assert_eq!(missing(d.validate().unwrap_err()), "image");

        d.image = Some(ImageSource::Remote("  ".into()));
        assert_eq!(missing(d.validate().unwrap_err()), "image");
    }

    #[test]
    fn whitespace_only_counts_as_missing() {
        let mut d = full_draft();
        d.ingredients = " \n\t".into();
        assert_eq!(missing(d.validate().unwrap_err()), "ingredients");
    }

    #[test]
    fn edit_without_image_is_valid() {
        let edit = RecipeEdit {
            name: "Soup".into(),
            ingredients: "water".into(),
            instructions: "heat".into(),
            image: None,
        };
        edit.validate().expect("image is optional on edit");
    }

    #[test]
    fn edit_requires_instructions() {
        let edit = RecipeEdit {
            name: "Soup".into(),
            ingredients: "water".into(),
            instructions: String::new(),
            image: None,
        };
        assert_eq!(missing(edit.validate().unwrap_err()), "instructions");
    }

    #[test]
    fn ids_are_unique() {
        let a = new_recipe_id();
        let b = new_recipe_id();
        assert_ne!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn json_field_names() {
        let r = Recipe {
            id: "1".into(),
            name: "Cake".into(),
            image: "https://x/cake.png".into(),
            ingredients: "flour".into(),
            instructions: "bake".into(),
        };
        let json = serde_json::to_value(&r).expect("to_value");
        assert_eq!(json["id"], "1");
        assert_eq!(json["image"], "https://x/cake.png");
        assert_eq!(json["instructions"], "bake");
    }
}
