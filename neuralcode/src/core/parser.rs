//! Extraction of typed actions from free-text model replies.
//!
//! Four independent scanners run over the whole reply, in a fixed order:
//! create-file blocks, `EDIT` directives, `RUN` directives, `READ`
//! directives. Matches within one scanner keep document order. Partial or
//! empty matches are dropped; the parser never fails.
//!
//! Detection is heuristic: any fenced block whose info string looks like a
//! file name is treated as a file to create, including language tags such as
//! ` ```python `.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::core::types::Action;

/// ```` ```<path>\n<content>``` ````
static CREATE_FILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```([A-Za-z0-9_./-]+)\r?\n((?s:.*?))```").unwrap());

/// `` EDIT <path>: `<old>` -> `<new>` `` on a single line. Back-ticks and
/// newlines cannot appear inside the literals.
static EDIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^EDIT[ \t]+([A-Za-z0-9_./-]+):[ \t]*`([^`\n]*)`[ \t]*->[ \t]*`([^`\n]*)`")
        .unwrap()
});

static RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^RUN[ \t]+(.+)$").unwrap());

static READ_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^READ[ \t]+([A-Za-z0-9_./-]+)").unwrap());

/// Parse every recognizable action in `reply`.
pub fn parse_actions(reply: &str) -> Vec<Action> {
    let mut actions = Vec::new();
    scan_create_files(reply, &mut actions);
    scan_edits(reply, &mut actions);
    scan_runs(reply, &mut actions);
    scan_reads(reply, &mut actions);
    debug!(count = actions.len(), "parsed actions");
    actions
}

fn scan_create_files(reply: &str, actions: &mut Vec<Action>) {
    for caps in CREATE_FILE_RE.captures_iter(reply) {
        let (Some(path), Some(content)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let content = content.as_str().trim();
        if content.is_empty() {
            continue;
        }
        actions.push(Action::CreateFile {
            path: path.as_str().to_string(),
            content: content.to_string(),
        });
    }
}

fn scan_edits(reply: &str, actions: &mut Vec<Action>) {
    for caps in EDIT_RE.captures_iter(reply) {
        let (Some(path), Some(old), Some(new)) = (caps.get(1), caps.get(2), caps.get(3)) else {
            continue;
        };
        if old.is_empty() || new.is_empty() {
            continue;
        }
        actions.push(Action::EditFile {
            path: path.as_str().to_string(),
            old_string: old.as_str().to_string(),
            new_string: new.as_str().to_string(),
        });
    }
}

fn scan_runs(reply: &str, actions: &mut Vec<Action>) {
    for caps in RUN_RE.captures_iter(reply) {
        let Some(command) = caps.get(1) else {
            continue;
        };
        let command = command.as_str().trim();
        if command.is_empty() {
            continue;
        }
        actions.push(Action::RunCommand {
            command: command.to_string(),
        });
    }
}

fn scan_reads(reply: &str, actions: &mut Vec<Action>) {
    for caps in READ_RE.captures_iter(reply) {
        if let Some(path) = caps.get(1) {
            actions.push(Action::ReadFile {
                path: path.as_str().to_string(),
            });
        }
    }
}
