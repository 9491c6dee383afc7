//! Prompt template rendering.
//!
//! Supports the two constructs the requester prompts use:
//!
//! - `{{{field}}}` (or `{{field}}`) is replaced with the field's text,
//!   unescaped; unknown fields render as empty text.
//! - `{{#if field}} … {{/if}}` keeps its body only when the field is present
//!   and non-blank. Sections do not nest.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};

static SECTION_RE: OnceLock<Regex> = OnceLock::new();
static FIELD_RE: OnceLock<Regex> = OnceLock::new();

fn section_re() -> &'static Regex {
    SECTION_RE.get_or_init(|| {
        Regex::new(r"(?s)\{\{#if\s+([A-Za-z_][A-Za-z0-9_]*)\s*\}\}\n?(.*?)\{\{/if\}\}\n?")
            .expect("valid literal regex")
    })
}

fn field_re() -> &'static Regex {
    FIELD_RE.get_or_init(|| {
        Regex::new(r"\{\{\{?\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}?\}\}").expect("valid literal regex")
    })
}

/// Field values available to a template. Absent keys are falsy.
pub type Vars = BTreeMap<String, String>;

/// Build template variables from a serializable record of strings.
///
/// Top-level string fields become variables; `null` and non-string values
/// are skipped.
pub fn vars_from<T: serde::Serialize>(record: &T) -> Vars {
    let mut vars = Vars::new();
    if let Ok(serde_json::Value::Object(map)) = serde_json::to_value(record) {
        for (key, value) in map {
            if let serde_json::Value::String(s) = value {
                vars.insert(key, s);
            }
        }
    }
    vars
}

/// Render `template` against `vars`.
pub fn render(template: &str, vars: &Vars) -> String {
    let with_sections = section_re().replace_all(template, |caps: &Captures| {
        let present = vars
            .get(&caps[1])
            .is_some_and(|value| !value.trim().is_empty());
        if present {
            caps[2].to_owned()
        } else {
            String::new()
        }
    });

    field_re()
        .replace_all(&with_sections, |caps: &Captures| {
            vars.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned()
}
