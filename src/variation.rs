//! Recipe variation suggestions.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::VaultError;
use crate::flow::{self, require_text, Flow, Validate};
use crate::model::ModelClient;
use crate::recipe::Recipe;

/// Number of variations the prompt asks for.
pub const TARGET_VARIATIONS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariationInput {
    pub recipe_name: String,
    pub ingredients: String,
    pub instructions: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dietary_restrictions: Option<String>,
    /// Ingredients the user has on hand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_ingredients: Option<String>,
}

impl VariationInput {
    pub fn for_recipe(recipe: &Recipe) -> Self {
        Self {
            recipe_name: recipe.name.clone(),
            ingredients: recipe.ingredients.clone(),
            instructions: recipe.instructions.clone(),
            dietary_restrictions: None,
            available_ingredients: None,
        }
    }

    pub fn with_dietary_restrictions(mut self, restrictions: Option<String>) -> Self {
        self.dietary_restrictions = restrictions;
        self
    }

    pub fn with_available_ingredients(mut self, available: Option<String>) -> Self {
        self.available_ingredients = available;
        self
    }
}

/// Blank optional fields are allowed; the prompt treats them as absent.
impl Validate for VariationInput {
    fn validate(&self) -> Result<(), String> {
        require_text("recipeName", &self.recipe_name)?;
        require_text("ingredients", &self.ingredients)?;
        require_text("instructions", &self.instructions)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariationOutput {
    /// Short descriptions, in the order the model gave them.
    pub variations: Vec<String>,
}

impl Validate for VariationOutput {
    fn validate(&self) -> Result<(), String> {
        if self.variations.is_empty() {
            return Err("variations must contain at least one suggestion".to_owned());
        }
        if let Some(pos) = self.variations.iter().position(|v| v.trim().is_empty()) {
            return Err(format!("variations[{pos}] is empty"));
        }
        if self.variations.len() != TARGET_VARIATIONS {
            warn!(
                count = self.variations.len(),
                expected = TARGET_VARIATIONS,
                "model returned an unexpected number of variations"
            );
        }
        Ok(())
    }
}

pub struct VariationFlow;

impl Flow for VariationFlow {
    type Input = VariationInput;
    type Output = VariationOutput;

    const NAME: &'static str = "suggestRecipeVariationsFlow";

    const TEMPLATE: &'static str = "\
You are a creative recipe assistant. Given a recipe, suggest some interesting variations.

Recipe Name: {{{recipeName}}}
Ingredients: {{{ingredients}}}
Instructions: {{{instructions}}}

{{#if dietaryRestrictions}}
Dietary Restrictions: {{{dietaryRestrictions}}}
{{/if}}
{{#if availableIngredients}}
Available Ingredients: {{{availableIngredients}}}
Consider these ingredients when creating variations.
{{/if}}
Suggest 3 distinct recipe variations. Each variation should be a short description.
";

    const OUTPUT_FORMAT: &'static str = r#"{
  "variations": ["<variation 1>", "<variation 2>", "<variation 3>"]
}"#;
}

/// Ask `model` for variations of a recipe.
pub fn suggest_recipe_variations(
    model: &dyn ModelClient,
    input: &VariationInput,
) -> Result<VariationOutput, VaultError> {
    flow::run::<VariationFlow>(model, input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaStage;
    use crate::model::FakeModel;

    fn soup() -> VariationInput {
        VariationInput {
            recipe_name: "Tomato Soup".into(),
            ingredients: "tomatoes, onion, stock".into(),
            instructions: "simmer, blend".into(),
            dietary_restrictions: None,
            available_ingredients: None,
        }
    }

    #[test]
    fn prompt_without_optional_fields_skips_their_sections() {
        let prompt = flow::render::<VariationFlow>(&soup()).unwrap();
        assert!(prompt.contains("Recipe Name: Tomato Soup\n"));
        assert!(prompt.contains("Instructions: simmer, blend\n"));
        assert!(!prompt.contains("Dietary Restrictions"));
        assert!(!prompt.contains("Available Ingredients"));
        assert!(prompt.contains("Suggest 3 distinct recipe variations."));
    }

    #[test]
    fn prompt_with_optional_fields_includes_sections() {
        let input = soup()
            .with_dietary_restrictions(Some("vegan".into()))
            .with_available_ingredients(Some("basil, cream".into()));
        let prompt = flow::render::<VariationFlow>(&input).unwrap();
        assert!(prompt.contains("Dietary Restrictions: vegan\n"));
        assert!(prompt.contains("Available Ingredients: basil, cream\n"));
        assert!(prompt.contains("Consider these ingredients"));
    }

    #[test]
    fn blank_optional_field_treated_as_absent() {
        let input = soup().with_dietary_restrictions(Some("   ".into()));
        let prompt = flow::render::<VariationFlow>(&input).unwrap();
        assert!(!prompt.contains("Dietary Restrictions"));
    }

    #[test]
    fn no_optional_fields_returns_three_variations() {
        let model = FakeModel::with_recipe_responses();
        let out = suggest_recipe_variations(&model, &soup()).unwrap();
        assert_eq!(out.variations.len(), TARGET_VARIATIONS);
        assert!(out.variations.iter().all(|v| !v.trim().is_empty()));
    }

    #[test]
    fn other_counts_are_accepted() {
        let model = FakeModel::new().with_default_response(r#"{"variations": ["only one"]}"#);
        let out = suggest_recipe_variations(&model, &soup()).unwrap();
        assert_eq!(out.variations, vec!["only one"]);
    }

    #[test]
    fn empty_list_is_output_violation() {
        let model = FakeModel::new().with_default_response(r#"{"variations": []}"#);
        let err = suggest_recipe_variations(&model, &soup()).unwrap_err();
        assert!(
            matches!(err, VaultError::SchemaViolation { stage: SchemaStage::Output, .. }),
            "got {err:?}"
        );
    }

    #[test]
    fn blank_entry_is_output_violation() {
        let model = FakeModel::new().with_default_response(r#"{"variations": ["a", " ", "c"]}"#);
        match suggest_recipe_variations(&model, &soup()).unwrap_err() {
            VaultError::SchemaViolation { detail, .. } => assert!(detail.contains("variations[1]")),
            other => panic!("expected SchemaViolation, got {other:?}"),
        }
    }

    #[test]
    fn reply_with_braces_in_surrounding_prose_is_parsed() {
        let model = FakeModel::new().with_default_response(
            "Using the {recipe} you gave:\n```json\n{\"variations\": [\"a\", \"b\", \"c\"]}\n```\n\
             Let me know if you want more {or fewer} ideas.",
        );
        let out = suggest_recipe_variations(&model, &soup()).unwrap();
        assert_eq!(out.variations, vec!["a", "b", "c"]);
    }

    #[test]
    fn non_json_reply_is_output_violation() {
        let model = FakeModel::new().with_default_response("1. Add cheese\n2. Add bacon");
        let err = suggest_recipe_variations(&model, &soup()).unwrap_err();
        assert!(
            matches!(err, VaultError::SchemaViolation { stage: SchemaStage::Output, .. }),
            "got {err:?}"
        );
    }

    #[test]
    fn missing_instructions_rejected() {
        let model = FakeModel::with_recipe_responses();
        let mut input = soup();
        input.instructions.clear();
        let err = suggest_recipe_variations(&model, &input).unwrap_err();
        assert!(
            matches!(err, VaultError::SchemaViolation { stage: SchemaStage::Input, .. }),
            "got {err:?}"
        );
        assert!(model.prompts().is_empty());
    }

    #[test]
    fn optional_fields_omitted_from_wire_when_absent() {
        let json = serde_json::to_value(soup()).unwrap();
        assert!(json.get("dietaryRestrictions").is_none());
        assert_eq!(json["recipeName"], "Tomato Soup");

        let parsed: VariationInput = serde_json::from_value(serde_json::json!({
            "recipeName": "x", "ingredients": "y", "instructions": "z"
        }))
        .unwrap();
        assert_eq!(parsed.available_ingredients, None);
    }
}
