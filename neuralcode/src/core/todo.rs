//! Todo list state machine and detection of lists announced in replies.
//!
//! Invariant: at most one item per list is `in_progress`. Every mutation in
//! this module preserves it; storage does not check it.

use std::fmt::Write as _;
use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use ulid::Ulid;

use crate::core::types::{DetectedTodoList, Priority, TodoItem, TodoList, TodoStatus};

const DEFAULT_TITLE: &str = "Todo List";

static ANNOUNCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)TODO(?:[ \t]*LIST)?:?[ \t]*(.*)$").unwrap());

static ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:-|\d+\.)[ \t]*(.+)$").unwrap());

fn new_id() -> String {
    Ulid::new().to_string().to_lowercase()
}

impl TodoList {
    pub fn new(title: impl Into<String>, description: Option<String>) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            description,
            items: Vec::new(),
            created_at: Utc::now(),
            current_item_id: None,
        }
    }

    /// Build a list with one pending item per detected line.
    pub fn from_detected(detected: &DetectedTodoList) -> Self {
        let mut list = Self::new(detected.title.clone(), None);
        for content in &detected.items {
            list.add_item(content.clone(), Priority::default());
        }
        list
    }

    pub fn add_item(&mut self, content: impl Into<String>, priority: Priority) -> &TodoItem {
        self.items.push(TodoItem {
            id: new_id(),
            content: content.into(),
            status: TodoStatus::Pending,
            priority,
            created_at: Utc::now(),
            completed_at: None,
        });
        &self.items[self.items.len() - 1]
    }

    pub fn item(&self, item_id: &str) -> Option<&TodoItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    /// True if any item is still `pending` or `in_progress`.
    pub fn has_open_items(&self) -> bool {
        self.items.iter().any(|item| item.status.is_open())
    }

    /// `(completed, total)`.
    pub fn progress(&self) -> (usize, usize) {
        let completed = self
            .items
            .iter()
            .filter(|item| item.status == TodoStatus::Completed)
            .count();
        (completed, self.items.len())
    }
}

/// The item in progress, else the first pending item.
pub fn current_item(list: &TodoList) -> Option<&TodoItem> {
    list.items
        .iter()
        .find(|item| item.status == TodoStatus::InProgress)
        .or_else(|| {
            list.items
                .iter()
                .find(|item| item.status == TodoStatus::Pending)
        })
}

/// Make `item_id` the item in progress.
///
/// Any item already in progress is demoted to `pending` first, even when the
/// promotion then fails. Returns `false` if the target is not `pending`.
pub fn set_current_item(list: &mut TodoList, item_id: &str) -> bool {
    demote_in_progress(list, None);

    let Some(item) = list.items.iter_mut().find(|item| item.id == item_id) else {
        return false;
    };
    if item.status != TodoStatus::Pending {
        return false;
    }
    item.status = TodoStatus::InProgress;
    list.current_item_id = Some(item_id.to_string());
    true
}

/// Set an item's status unconditionally. Returns `false` for unknown ids.
///
/// Moving an item to `in_progress` demotes any other in-progress item.
/// `completed_at` is stamped on the first transition into `completed` only.
pub fn update_status(list: &mut TodoList, item_id: &str, status: TodoStatus) -> bool {
    let Some(index) = list.items.iter().position(|item| item.id == item_id) else {
        return false;
    };

    if status == TodoStatus::InProgress {
        demote_in_progress(list, Some(index));
        list.current_item_id = Some(item_id.to_string());
    }

    let item = &mut list.items[index];
    item.status = status;
    if status == TodoStatus::Completed && item.completed_at.is_none() {
        item.completed_at = Some(Utc::now());
    }
    true
}

fn demote_in_progress(list: &mut TodoList, keep: Option<usize>) {
    for (index, item) in list.items.iter_mut().enumerate() {
        if Some(index) != keep && item.status == TodoStatus::InProgress {
            item.status = TodoStatus::Pending;
        }
    }
}

/// Index of the newest list that still has open items.
///
/// Open items filter first; creation time only breaks ties between
/// candidates. Equal timestamps resolve to the earlier list.
pub fn active_list_index(lists: &[TodoList]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (index, list) in lists.iter().enumerate() {
        if !list.has_open_items() {
            continue;
        }
        match best {
            Some(current) if lists[current].created_at >= list.created_at => {}
            _ => best = Some(index),
        }
    }
    best
}

pub fn active_list(lists: &[TodoList]) -> Option<&TodoList> {
    active_list_index(lists).map(|index| &lists[index])
}

pub fn active_list_mut(lists: &mut [TodoList]) -> Option<&mut TodoList> {
    active_list_index(lists).map(move |index| &mut lists[index])
}

/// Find an item id by exact id or by 1-based position.
pub fn resolve_item_id(list: &TodoList, selector: &str) -> Option<String> {
    if let Some(item) = list.item(selector) {
        return Some(item.id.clone());
    }
    let position: usize = selector.parse().ok()?;
    list.items
        .get(position.checked_sub(1)?)
        .map(|item| item.id.clone())
}

/// Find a `TODO`/`TODOLIST` announcement followed by dash- or
/// number-prefixed item lines.
///
/// The announcement must be directly followed by an item line. Collection
/// stops at the first blank line once at least one item was found; other
/// non-item lines are skipped.
pub fn detect_todo_list(reply: &str) -> Option<DetectedTodoList> {
    let lines: Vec<&str> = reply.lines().collect();

    let (start, title) = lines.iter().enumerate().find_map(|(index, line)| {
        let caps = ANNOUNCE_RE.captures(line)?;
        let next = lines.get(index + 1)?;
        if !ITEM_RE.is_match(next) {
            return None;
        }
        let title = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        let title = if title.is_empty() { DEFAULT_TITLE } else { title };
        Some((index, title.to_string()))
    })?;

    let mut items = Vec::new();
    for line in &lines[start + 1..] {
        if let Some(caps) = ITEM_RE.captures(line) {
            let content = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
            if !content.is_empty() {
                items.push(content.to_string());
            }
        } else if line.trim().is_empty() && !items.is_empty() {
            break;
        }
    }

    if items.is_empty() {
        return None;
    }
    Some(DetectedTodoList { title, items })
}

fn status_marker(status: TodoStatus) -> &'static str {
    match status {
        TodoStatus::Completed => "✅",
        TodoStatus::InProgress => "🔄",
        TodoStatus::Cancelled => "❌",
        TodoStatus::Pending => "⏳",
    }
}

/// Plain-text rendering for terminals.
pub fn format_todo_list(list: &TodoList) -> String {
    let mut out = format!("📋 {}\n", list.title);
    if let Some(description) = &list.description {
        let _ = writeln!(out, "{description}");
    }
    out.push('\n');
    for (index, item) in list.items.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>2}. {} {} [{}]",
            index + 1,
            status_marker(item.status),
            item.content,
            item.priority.as_str()
        );
    }
    let (completed, total) = list.progress();
    let _ = write!(out, "\nProgress: {completed}/{total} completed");
    out
}
