//! Test-only helpers: temporary sandboxes, scripted confirmation, todo fixtures.

use std::collections::VecDeque;
use std::path::PathBuf;

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use tempfile::TempDir;

use crate::core::types::{Priority, TodoList, TodoStatus};
use crate::io::config::EngineConfig;
use crate::io::confirm::Confirm;
use crate::io::store::StatePaths;
use crate::turn::TurnContext;

/// A temporary project directory with a turn context rooted in it.
///
/// No home directory is configured, so `~` paths stay literal and resolve
/// inside the sandbox.
pub struct Sandbox {
    temp: TempDir,
    ctx: TurnContext,
}

impl Sandbox {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let temp = tempfile::tempdir().expect("tempdir");
        let ctx = TurnContext::with_config(StatePaths::new(temp.path()), config, None);
        Self { temp, ctx }
    }

    pub fn ctx(&self) -> &TurnContext {
        &self.ctx
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.temp.path().join(relative)
    }

    pub fn write(&self, relative: &str, contents: &str) {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, contents).expect("write fixture");
    }

    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.path(relative)).expect("read fixture")
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}

/// Replays canned answers and records every question asked.
///
/// Running out of answers is an error, so an unexpected question fails the
/// test instead of silently declining.
#[derive(Debug, Default)]
pub struct ScriptedConfirm {
    answers: VecDeque<bool>,
    prompts: Vec<String>,
}

impl ScriptedConfirm {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            prompts: Vec::new(),
        }
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }
}

impl Confirm for ScriptedConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        self.prompts.push(prompt.to_string());
        match self.answers.pop_front() {
            Some(answer) => Ok(answer),
            None => bail!("unexpected confirmation: {prompt}"),
        }
    }
}

/// A list with one item per status, contents `item 1`, `item 2`, ...
pub fn todo_list(title: &str, statuses: &[TodoStatus]) -> TodoList {
    let mut list = TodoList::new(title, None);
    for (index, status) in statuses.iter().enumerate() {
        list.add_item(format!("item {}", index + 1), Priority::Medium);
        list.items[index].status = *status;
    }
    list
}

/// Same as [`todo_list`] with a fixed creation time.
pub fn todo_list_at(title: &str, statuses: &[TodoStatus], created_at: DateTime<Utc>) -> TodoList {
    let mut list = todo_list(title, statuses);
    list.created_at = created_at;
    list
}
