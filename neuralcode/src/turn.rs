//! One assistant reply, end to end.
//!
//! Parse actions, confirm, execute, save the context log, then detect a todo
//! list, confirm and store it.
//! Nothing runs and nothing new is stored without an affirmative answer.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, instrument, warn};

use crate::core::parser::parse_actions;
use crate::core::todo::detect_todo_list;
use crate::core::types::{Action, TodoList};
use crate::io::config::{EngineConfig, load_config};
use crate::io::confirm::Confirm;
use crate::io::executor::{ActionExecutor, render_outcomes};
use crate::io::store::{self, ContextLog, Role, StatePaths};

/// Everything a turn needs: where state lives, its config and the sandbox.
#[derive(Debug, Clone)]
pub struct TurnContext {
    pub paths: StatePaths,
    pub config: EngineConfig,
    pub executor: ActionExecutor,
}

impl TurnContext {
    /// Load `.neuralcode/config.toml` under `root` and sandbox to `root`.
    pub fn open(root: impl Into<PathBuf>, home: Option<PathBuf>) -> Result<Self> {
        let paths = StatePaths::new(root);
        let config = load_config(&paths.config_path)?;
        Ok(Self::with_config(paths, config, home))
    }

    pub fn with_config(paths: StatePaths, config: EngineConfig, home: Option<PathBuf>) -> Self {
        let executor = ActionExecutor::for_root(&paths.root, home, &config);
        Self {
            paths,
            config,
            executor,
        }
    }

    pub fn load_context(&self) -> Result<ContextLog> {
        store::load_context(&self.paths.context_path, self.config.context_limit)
    }

    pub fn load_todo_lists(&self) -> Result<Vec<TodoList>> {
        store::load_todo_lists(&self.paths.todos_path)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Actions parsed from the reply, in execution order.
    pub actions: Vec<Action>,
    /// Whether the operator approved the action batch.
    pub executed: bool,
    /// One line per action when executed, else empty.
    pub results: Vec<String>,
    /// The list stored this turn, if one was detected and approved.
    pub created_todo: Option<TodoList>,
    /// Number of executed actions that failed.
    pub failures: usize,
    /// Failures hit after the action step (store I/O, todo confirmation),
    /// rendered with their context chain.
    pub store_errors: Vec<String>,
}

pub fn actions_prompt(count: usize) -> String {
    format!("Detected {count} code action(s). Execute them?")
}

pub fn todo_prompt(list_title: &str, count: usize) -> String {
    format!("Create todo list '{list_title}' with {count} item(s)?")
}

/// Process one assistant reply.
///
/// Errors before anything executes abort the turn. Once the action step is
/// over, the context log is saved first and store failures are collected in
/// [`TurnOutcome::store_errors`] so the result lines are never lost.
#[instrument(skip_all, fields(reply_bytes = reply.len()))]
pub fn run_turn(ctx: &TurnContext, reply: &str, confirm: &mut dyn Confirm) -> Result<TurnOutcome> {
    let mut context = ctx.load_context()?;
    context.push(Role::Assistant, reply);

    let mut outcome = TurnOutcome {
        actions: parse_actions(reply),
        ..TurnOutcome::default()
    };

    if !outcome.actions.is_empty() {
        let approved = confirm
            .confirm(&actions_prompt(outcome.actions.len()))
            .context("confirm action batch")?;
        if approved {
            let outcomes = ctx.executor.execute_all(&outcome.actions);
            outcome.failures = outcomes.iter().filter(|o| !o.is_success()).count();
            outcome.results = render_outcomes(&outcomes);
            outcome.executed = true;
            info!(
                actions = outcome.actions.len(),
                failures = outcome.failures,
                "executed action batch"
            );
        } else {
            info!(actions = outcome.actions.len(), "action batch skipped");
        }
    }

    if let Err(err) = store::save_context(&ctx.paths.context_path, &context) {
        record_store_error(&mut outcome, &err);
    }

    match store_detected_todo(ctx, reply, confirm) {
        Ok(created) => outcome.created_todo = created,
        Err(err) => record_store_error(&mut outcome, &err),
    }

    Ok(outcome)
}

fn store_detected_todo(
    ctx: &TurnContext,
    reply: &str,
    confirm: &mut dyn Confirm,
) -> Result<Option<TodoList>> {
    let Some(detected) = detect_todo_list(reply) else {
        return Ok(None);
    };
    let approved = confirm
        .confirm(&todo_prompt(&detected.title, detected.items.len()))
        .context("confirm todo list")?;
    if !approved {
        return Ok(None);
    }
    let mut lists = ctx.load_todo_lists()?;
    let list = TodoList::from_detected(&detected);
    lists.push(list.clone());
    store::save_todo_lists(&ctx.paths.todos_path, &lists)?;
    info!(list_id = %list.id, items = list.items.len(), "stored todo list");
    Ok(Some(list))
}

fn record_store_error(outcome: &mut TurnOutcome, err: &anyhow::Error) {
    warn!(err = %format!("{err:#}"), "turn state not fully persisted");
    outcome.store_errors.push(format!("{err:#}"));
}
