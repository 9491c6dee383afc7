//! Ingredient substitution suggestions for a recipe under dietary restrictions.

use serde::{Deserialize, Serialize};

use crate::error::VaultError;
use crate::flow::{self, require_text, Flow, Validate};
use crate::model::ModelClient;
use crate::recipe::Recipe;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubstitutionInput {
    pub recipe_name: String,
    /// Ingredient list as free text.
    pub ingredients: String,
    /// e.g. "vegetarian", "gluten-free", "low-sugar".
    pub dietary_restrictions: String,
}

impl SubstitutionInput {
    pub fn for_recipe(recipe: &Recipe, dietary_restrictions: &str) -> Self {
        Self {
            recipe_name: recipe.name.clone(),
            ingredients: recipe.ingredients.clone(),
            dietary_restrictions: dietary_restrictions.to_owned(),
        }
    }
}

impl Validate for SubstitutionInput {
    fn validate(&self) -> Result<(), String> {
        require_text("recipeName", &self.recipe_name)?;
        require_text("ingredients", &self.ingredients)?;
        require_text("dietaryRestrictions", &self.dietary_restrictions)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubstitutionOutput {
    pub original_ingredients: String,
    pub suggested_substitutions: String,
    pub reasoning: String,
}

/// Presence and string type are enforced by deserialization; the two
/// suggestion fields must also be non-blank.
impl Validate for SubstitutionOutput {
    fn validate(&self) -> Result<(), String> {
        require_text("suggestedSubstitutions", &self.suggested_substitutions)?;
        require_text("reasoning", &self.reasoning)
    }
}

pub struct SubstitutionFlow;

impl Flow for SubstitutionFlow {
    type Input = SubstitutionInput;
    type Output = SubstitutionOutput;

    const NAME: &'static str = "suggestIngredientSubstitutionsFlow";

    const TEMPLATE: &'static str = "\
You are a recipe assistant that suggests ingredient substitutions
for recipes based on dietary restrictions or personal preferences.

Recipe Name: {{{recipeName}}}
Original Ingredients: {{{ingredients}}}
Dietary Restrictions: {{{dietaryRestrictions}}}

Please provide a list of suggested ingredient substitutions that adhere to the specified dietary restrictions.
Explain the reason for each substitution.
Original Ingredients: {{{ingredients}}}
Substitutions:
";

    const OUTPUT_FORMAT: &'static str = r#"{
  "originalIngredients": "<the original ingredients, unchanged>",
  "suggestedSubstitutions": "<suggested ingredient substitutions based on dietary needs>",
  "reasoning": "<explanation for the suggested substitutions>"
}"#;
}

/// Ask `model` for substitutions.
pub fn suggest_ingredient_substitutions(
    model: &dyn ModelClient,
    input: &SubstitutionInput,
) -> Result<SubstitutionOutput, VaultError> {
    flow::run::<SubstitutionFlow>(model, input)
}
