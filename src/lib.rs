//! Recipe Vault: a local recipe collection with model-backed suggestions
//! for ingredient substitutions and recipe variations.

pub mod cli;
pub mod config;
pub mod error;
pub mod flow;
pub mod image;
pub mod logging;
pub mod model;
pub mod recipe;
pub mod storage;
pub mod store;
pub mod subprocess;
pub mod substitution;
pub mod template;
pub mod variation;
pub mod view;
