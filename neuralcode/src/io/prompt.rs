//! System prompt rendering for the host's model call.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use minijinja::{Environment, context};
use serde::Serialize;
use serde_json::Value;

use crate::io::store::{Message, Preferences};

const SYSTEM_TEMPLATE: &str = include_str!("prompts/system.md");

static PROMPT_ENV: LazyLock<Environment<'static>> = LazyLock::new(|| {
    let mut env = Environment::new();
    env.add_template("system", SYSTEM_TEMPLATE)
        .expect("system template should be valid");
    env
});

#[derive(Debug, Serialize)]
struct PreferenceEntry<'a> {
    key: &'a str,
    value: String,
}

#[derive(Debug, Serialize)]
struct TurnEntry<'a> {
    role: &'static str,
    content: &'a str,
}

/// Render the fixed system prompt with preferences and recent turns inlined.
///
/// The API key never reaches the rendered text.
pub fn render_system_prompt(preferences: &Preferences, recent: &[Message]) -> Result<String> {
    let preferences: Vec<PreferenceEntry<'_>> = preferences
        .public_entries()
        .map(|(key, value)| PreferenceEntry {
            key,
            value: display_value(value),
        })
        .collect();
    let history: Vec<TurnEntry<'_>> = recent
        .iter()
        .map(|message| TurnEntry {
            role: message.role.as_str(),
            content: message.content.trim(),
        })
        .collect();

    let template = PROMPT_ENV
        .get_template("system")
        .context("load system prompt template")?;
    template
        .render(context! { preferences => preferences, history => history })
        .context("render system prompt")
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
