//! Persisted session state under `.neuralcode/`.
//!
//! Every document is read and written wholesale. There is no locking: two
//! processes sharing a project directory race with last-writer-wins.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::core::types::TodoList;

/// All canonical paths within `.neuralcode/` for a project root.
#[derive(Debug, Clone)]
pub struct StatePaths {
    pub root: PathBuf,
    pub state_dir: PathBuf,
    pub context_path: PathBuf,
    pub preferences_path: PathBuf,
    pub todos_path: PathBuf,
    pub config_path: PathBuf,
}

impl StatePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let state_dir = root.join(".neuralcode");
        Self {
            root: root.clone(),
            state_dir: state_dir.clone(),
            context_path: state_dir.join("context.json"),
            preferences_path: state_dir.join("preferences.json"),
            todos_path: state_dir.join("todos.json"),
            config_path: state_dir.join("config.toml"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One conversation turn. `timestamp` is milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: i64,
}

/// Bounded log of the most recent conversation turns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextLog {
    messages: Vec<Message>,
    limit: usize,
}

impl ContextLog {
    pub fn new(limit: usize) -> Self {
        Self {
            messages: Vec::new(),
            limit,
        }
    }

    pub fn from_messages(messages: Vec<Message>, limit: usize) -> Self {
        let mut log = Self { messages, limit };
        log.trim();
        log
    }

    /// Append a turn, dropping the oldest ones beyond the limit.
    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(Message {
            role,
            content: content.into(),
            timestamp: Utc::now().timestamp_millis(),
        });
        self.trim();
    }

    /// The last `limit` turns, oldest first.
    pub fn recent(&self, limit: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(limit);
        &self.messages[start..]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn trim(&mut self) {
        if self.messages.len() > self.limit {
            let excess = self.messages.len() - self.limit;
            self.messages.drain(..excess);
        }
    }
}

/// Flat, string-keyed preference values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Preferences(Map<String, Value>);

impl Preferences {
    pub const MODEL_KEY: &'static str = "model";
    pub const API_KEY: &'static str = "apiKey";

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn model(&self) -> Option<&str> {
        self.get(Self::MODEL_KEY).and_then(Value::as_str)
    }

    pub fn api_key(&self) -> Option<&str> {
        self.get(Self::API_KEY).and_then(Value::as_str)
    }

    /// Entries safe to show: everything except the API credential.
    pub fn public_entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0
            .iter()
            .filter(|(key, _)| key.as_str() != Self::API_KEY)
            .map(|(key, value)| (key.as_str(), value))
    }
}

pub fn load_context(path: &Path, limit: usize) -> Result<ContextLog> {
    let messages: Vec<Message> = read_json_or_default(path)?;
    Ok(ContextLog::from_messages(messages, limit))
}

pub fn save_context(path: &Path, context: &ContextLog) -> Result<()> {
    write_json(path, context.messages())
}

pub fn load_preferences(path: &Path) -> Result<Preferences> {
    read_json_or_default(path)
}

pub fn save_preferences(path: &Path, preferences: &Preferences) -> Result<()> {
    write_json(path, preferences)
}

/// Load, set one key, and save.
pub fn update_preference(path: &Path, key: &str, value: impl Into<Value>) -> Result<Preferences> {
    let mut preferences = load_preferences(path)?;
    preferences.set(key, value);
    save_preferences(path, &preferences)?;
    Ok(preferences)
}

pub fn load_todo_lists(path: &Path) -> Result<Vec<TodoList>> {
    read_json_or_default(path)
}

pub fn save_todo_lists(path: &Path, lists: &[TodoList]) -> Result<()> {
    write_json(path, lists)
}

/// Missing files load as `T::default()`; unreadable or corrupt files fail.
fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        debug!(path = %path.display(), "state file missing, using default");
        return Ok(T::default());
    }
    debug!(path = %path.display(), "loading state file");
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse {}", path.display()))
}

/// Serialize `value` to pretty-printed JSON with trailing newline.
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    debug!(path = %path.display(), "writing state file");
    let mut buf = serde_json::to_string_pretty(value).context("serialize json")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

/// Write via a sibling temp file and rename.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("state path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = parent.join(tmp_name);
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp file {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}
