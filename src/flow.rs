//! Suggestion flows: a named pairing of an input shape, an output shape and
//! a prompt template, run as one model call.
//!
//! Both ends are checked: input is validated before the prompt is built, so
//! the model never sees malformed data, and the reply is parsed and
//! validated before it is returned. Either failure is a
//! [`VaultError::SchemaViolation`].

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{SchemaStage, VaultError};
use crate::model::ModelClient;
use crate::substitution::SubstitutionFlow;
use crate::template;
use crate::variation::VariationFlow;

/// Shape check beyond what deserialization already enforces.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

pub trait Flow {
    type Input: Serialize + DeserializeOwned + Validate;
    type Output: Serialize + DeserializeOwned + Validate;

    /// Flow name used on the command line and in logs.
    const NAME: &'static str;

    /// Prompt template; see [`crate::template`] for the syntax.
    const TEMPLATE: &'static str;

    /// JSON sketch of the expected reply, appended to every prompt.
    const OUTPUT_FORMAT: &'static str;
}

/// Names accepted by [`run_json`] and [`render_json`].
pub const FLOW_NAMES: [&str; 2] = [SubstitutionFlow::NAME, VariationFlow::NAME];

/// Validate `input` and build the full prompt text.
pub fn render<F: Flow>(input: &F::Input) -> Result<String, VaultError> {
    input.validate().map_err(|detail| VaultError::SchemaViolation {
        flow: F::NAME,
        stage: SchemaStage::Input,
        detail,
    })?;

    let body = template::render(F::TEMPLATE, &template::vars_from(input));
    Ok(format!(
        "{body}\n\
         Respond with a single JSON object and nothing else, matching this shape:\n\
         {}\n",
        F::OUTPUT_FORMAT
    ))
}

/// Run the flow once against `model`.
///
/// Transport failures from the model propagate unchanged; there is no retry.
pub fn run<F: Flow>(model: &dyn ModelClient, input: &F::Input) -> Result<F::Output, VaultError> {
    let prompt = render::<F>(input)?;
    info!(
        flow = F::NAME,
        provider = model.provider_name(),
        model = model.model_name(),
        prompt_len = prompt.len(),
        "running flow"
    );

    let reply = model.complete(&prompt)?;
    debug!(flow = F::NAME, reply_len = reply.len(), "model replied");
    parse_output::<F>(&reply)
}

/// Parse and validate a raw model reply.
pub fn parse_output<F: Flow>(reply: &str) -> Result<F::Output, VaultError> {
    let violation = |detail: String| VaultError::SchemaViolation {
        flow: F::NAME,
        stage: SchemaStage::Output,
        detail,
    };

    let json = extract_json(reply).ok_or_else(|| violation("reply contains no JSON object".to_owned()))?;
    let output: F::Output =
        serde_json::from_str(json).map_err(|e| violation(e.to_string()))?;
    output.validate().map_err(violation)?;
    Ok(output)
}

/// Locate the first complete JSON object in a model reply.
///
/// Models often wrap JSON in a markdown fence or add prose around it, and
/// that prose may itself contain braces. Each `{` is tried in turn as the
/// start of an object; the first one that parses wins.
pub fn extract_json(reply: &str) -> Option<&str> {
    reply.match_indices('{').find_map(|(start, _)| {
        let rest = &reply[start..];
        let mut values = serde_json::Deserializer::from_str(rest).into_iter::<serde_json::Value>();
        match values.next() {
            Some(Ok(serde_json::Value::Object(_))) => Some(&rest[..values.byte_offset()]),
            _ => None,
        }
    })
}

/// Run the flow named `name` on untyped JSON input.
pub fn run_json(
    name: &str,
    model: &dyn ModelClient,
    input: serde_json::Value,
) -> Result<serde_json::Value, VaultError> {
    if name == SubstitutionFlow::NAME {
        run_value::<SubstitutionFlow>(model, input)
    } else if name == VariationFlow::NAME {
        run_value::<VariationFlow>(model, input)
    } else {
        Err(unknown_flow(name))
    }
}

/// Build the prompt the flow named `name` would send, without calling a model.
pub fn render_json(name: &str, input: serde_json::Value) -> Result<String, VaultError> {
    if name == SubstitutionFlow::NAME {
        render::<SubstitutionFlow>(&input_from_value::<SubstitutionFlow>(input)?)
    } else if name == VariationFlow::NAME {
        render::<VariationFlow>(&input_from_value::<VariationFlow>(input)?)
    } else {
        Err(unknown_flow(name))
    }
}

fn run_value<F: Flow>(
    model: &dyn ModelClient,
    input: serde_json::Value,
) -> Result<serde_json::Value, VaultError> {
    let typed = input_from_value::<F>(input)?;
    let output = run::<F>(model, &typed)?;
    serde_json::to_value(output).map_err(|e| VaultError::SchemaViolation {
        flow: F::NAME,
        stage: SchemaStage::Output,
        detail: e.to_string(),
    })
}

fn input_from_value<F: Flow>(input: serde_json::Value) -> Result<F::Input, VaultError> {
    serde_json::from_value(input).map_err(|e| VaultError::SchemaViolation {
        flow: F::NAME,
        stage: SchemaStage::Input,
        detail: e.to_string(),
    })
}

fn unknown_flow(name: &str) -> VaultError {
    VaultError::UnknownFlow {
        name: name.to_owned(),
        available: FLOW_NAMES.to_vec(),
    }
}

/// Shared check for required text fields.
pub(crate) fn require_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{field} must be a non-empty string"))
    } else {
        Ok(())
    }
}
