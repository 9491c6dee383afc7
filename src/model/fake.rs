//! Fake model backend.
//!
//! Returns canned replies chosen by prompt substring so flows can run
//! without network access or an installed LLM CLI.

use std::cell::RefCell;

use super::ModelClient;
use crate::error::VaultError;

const CANNED_VARIATIONS: &str = r#"{"variations": [
  "Smoky version: add smoked paprika and finish under the broiler.",
  "Herb-forward version: fold in a handful of chopped fresh herbs just before serving.",
  "Spicy version: add chili flakes and a squeeze of lime."
]}"#;

const CANNED_SUBSTITUTIONS: &str = r#"{
  "originalIngredients": "as listed in the recipe",
  "suggestedSubstitutions": "Replace butter with olive oil; replace milk with oat milk.",
  "reasoning": "Both swaps keep the texture while meeting the stated restrictions."
}"#;

/// Replies are matched by case-insensitive substring, in registration order.
#[derive(Debug, Default)]
pub struct FakeModel {
    responses: Vec<(String, String)>,
    default_response: Option<String>,
    prompts: RefCell<Vec<String>>,
}

impl FakeModel {
    /// No registered replies; every call fails until one is added.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(prompt_contains: &str, response: &str) -> Self {
        let mut model = Self::new();
        model.add_response(prompt_contains, response);
        model
    }

    pub fn add_response(&mut self, prompt_contains: &str, response: &str) {
        self.responses
            .push((prompt_contains.to_lowercase(), response.to_owned()));
    }

    /// Reply used when no registered substring matches.
    pub fn with_default_response(mut self, response: &str) -> Self {
        self.default_response = Some(response.to_owned());
        self
    }

    /// Replies for both suggestion flows.
    pub fn with_recipe_responses() -> Self {
        let mut model = Self::new();
        model.add_response("recipe variations", CANNED_VARIATIONS);
        model.add_response("ingredient substitutions", CANNED_SUBSTITUTIONS);
        model
    }

    /// Every prompt received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }
}

impl ModelClient for FakeModel {
    fn complete(&self, prompt: &str) -> Result<String, VaultError> {
        self.prompts.borrow_mut().push(prompt.to_owned());

        let lower = prompt.to_lowercase();
        self.responses
            .iter()
            .find(|(pattern, _)| lower.contains(pattern.as_str()))
            .map(|(_, response)| response.clone())
            .or_else(|| self.default_response.clone())
            .ok_or_else(|| VaultError::ModelRequestFailed {
                detail: format!(
                    "fake model has no reply for prompt starting {:?}",
                    prompt.chars().take(60).collect::<String>()
                ),
            })
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }

    fn model_name(&self) -> &str {
        "fake-model"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_case_insensitively() {
        let m = FakeModel::with_response("HELLO", "world");
        assert_eq!(m.complete("say hello there").unwrap(), "world");
    }

    #[test]
    fn first_registered_match_wins() {
        let mut m = FakeModel::with_response("cake", "first");
        m.add_response("cake", "second");
        assert_eq!(m.complete("cake").unwrap(), "first");
    }

    #[test]
    fn no_match_without_default_is_error() {
        let m = FakeModel::new();
        assert!(m.complete("anything").is_err());
    }

    #[test]
    fn default_response_used_when_nothing_matches() {
        let m = FakeModel::new().with_default_response("{}");
        assert_eq!(m.complete("anything").unwrap(), "{}");
    }

    #[test]
    fn records_prompts() {
        let m = FakeModel::new().with_default_response("ok");
        m.complete("one").unwrap();
        m.complete("two").unwrap();
        assert_eq!(m.prompts(), vec!["one", "two"]);
    }

    #[test]
    fn canned_replies_are_valid_json() {
        for body in [CANNED_VARIATIONS, CANNED_SUBSTITUTIONS] {
            serde_json::from_str::<serde_json::Value>(body).expect("valid JSON");
        }
    }
}
