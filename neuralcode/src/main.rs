//! Command-line host for the neuralcode engine.
//!
//! Feeds an assistant reply through one turn (parse, confirm, execute, todo
//! detection) and exposes the session state kept in `.neuralcode/`.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;

use neuralcode::core::parser::parse_actions;
use neuralcode::core::todo::{
    active_list_index, active_list_mut, format_todo_list, resolve_item_id, set_current_item, update_status,
};
use neuralcode::core::types::{TodoList, TodoStatus};
use neuralcode::exit_codes;
use neuralcode::io::config::{EngineConfig, write_config};
use neuralcode::io::confirm::{AssumeYes, Confirm, LineConfirm};
use neuralcode::io::prompt::render_system_prompt;
use neuralcode::io::store::{self, Preferences, Role, StatePaths};
use neuralcode::logging;
use neuralcode::turn::{TurnContext, run_turn};

#[derive(Parser)]
#[command(
    name = "neuralcode",
    version,
    about = "Execute code actions from assistant replies inside a project sandbox"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write `.neuralcode/config.toml` with the default configuration.
    Init {
        /// Overwrite an existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Run one reply: parse actions, confirm, execute, detect a todo list.
    Apply {
        /// Reply file; `-` or omitted reads stdin.
        file: Option<PathBuf>,
        /// Approve every confirmation without asking.
        #[arg(short, long)]
        yes: bool,
    },
    /// Print the actions parsed from a reply as JSON.
    Parse {
        /// Reply file; `-` or omitted reads stdin.
        file: Option<PathBuf>,
    },
    /// Print the system prompt with preferences and recent context.
    Prompt,
    /// Append a turn to the context log.
    Record { role: RoleArg, text: String },
    /// Print recent context turns, oldest first.
    History {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Set a preference.
    Set { key: String, value: String },
    /// Print a preference.
    Get { key: String },
    /// Inspect or update todo lists.
    Todo {
        #[command(subcommand)]
        command: TodoCommand,
    },
}

#[derive(Subcommand)]
enum TodoCommand {
    /// Summarize every stored list.
    List,
    /// Show one list; defaults to the active list.
    Show {
        /// List id or 1-based position.
        list: Option<String>,
    },
    /// Mark an item of the active list as in progress.
    Start { item: String },
    /// Mark an item of the active list as completed.
    Done { item: String },
    /// Mark an item of the active list as cancelled.
    Cancel { item: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RoleArg {
    User,
    Assistant,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::User => Role::User,
            RoleArg::Assistant => Role::Assistant,
        }
    }
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    // Usage errors share the invalid exit code instead of clap's default.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            err.print().context("print usage")?;
            return Ok(if err.use_stderr() {
                exit_codes::INVALID
            } else {
                exit_codes::OK
            });
        }
    };
    match cli.command {
        Command::Init { force } => cmd_init(force).map(|()| exit_codes::OK),
        Command::Apply { file, yes } => cmd_apply(file.as_deref(), yes),
        Command::Parse { file } => cmd_parse(file.as_deref()).map(|()| exit_codes::OK),
        Command::Prompt => cmd_prompt().map(|()| exit_codes::OK),
        Command::Record { role, text } => cmd_record(role.into(), &text).map(|()| exit_codes::OK),
        Command::History { limit } => cmd_history(limit).map(|()| exit_codes::OK),
        Command::Set { key, value } => cmd_set(&key, value).map(|()| exit_codes::OK),
        Command::Get { key } => cmd_get(&key).map(|()| exit_codes::OK),
        Command::Todo { command } => cmd_todo(command).map(|()| exit_codes::OK),
    }
}

fn open_context() -> Result<TurnContext> {
    let root = std::env::current_dir().context("read current directory")?;
    TurnContext::open(root, dirs::home_dir())
}

fn cmd_init(force: bool) -> Result<()> {
    let root = std::env::current_dir().context("read current directory")?;
    let paths = StatePaths::new(root);
    if !force && paths.config_path.exists() {
        println!("Kept {}", paths.config_path.display());
        return Ok(());
    }
    write_config(&paths.config_path, &EngineConfig::default())?;
    println!("Wrote {}", paths.config_path.display());
    Ok(())
}

fn cmd_apply(file: Option<&Path>, yes: bool) -> Result<i32> {
    if reads_stdin(file) && !yes {
        bail!("reading the reply from stdin requires --yes");
    }
    let reply = read_reply(file)?;
    let ctx = open_context()?;

    let mut confirm: Box<dyn Confirm> = if yes {
        Box::new(AssumeYes)
    } else {
        Box::new(LineConfirm::stdio())
    };
    let outcome = run_turn(&ctx, &reply, confirm.as_mut())?;

    if !outcome.actions.is_empty() && !outcome.executed {
        println!("Skipped {} action(s).", outcome.actions.len());
    }
    for line in &outcome.results {
        println!("{line}");
    }
    if let Some(list) = &outcome.created_todo {
        println!("{}", format_todo_list(list));
    }

    for err in &outcome.store_errors {
        eprintln!("{err}");
    }

    Ok(if !outcome.store_errors.is_empty() {
        exit_codes::INVALID
    } else if outcome.failures > 0 {
        exit_codes::ACTION_FAILED
    } else {
        exit_codes::OK
    })
}

fn cmd_parse(file: Option<&Path>) -> Result<()> {
    let reply = read_reply(file)?;
    let actions = parse_actions(&reply);
    let json = serde_json::to_string_pretty(&actions).context("serialize actions")?;
    println!("{json}");
    Ok(())
}

fn cmd_prompt() -> Result<()> {
    let ctx = open_context()?;
    let preferences = store::load_preferences(&ctx.paths.preferences_path)?;
    let context = ctx.load_context()?;
    let prompt = render_system_prompt(
        &preferences,
        context.recent(ctx.config.prompt_context_messages),
    )?;
    print!("{prompt}");
    Ok(())
}

fn cmd_record(role: Role, text: &str) -> Result<()> {
    let ctx = open_context()?;
    let mut context = ctx.load_context()?;
    context.push(role, text);
    store::save_context(&ctx.paths.context_path, &context)
}

fn cmd_history(limit: usize) -> Result<()> {
    let ctx = open_context()?;
    let context = ctx.load_context()?;
    for message in context.recent(limit) {
        println!("{}: {}", message.role.as_str(), message.content);
    }
    Ok(())
}

fn cmd_set(key: &str, value: String) -> Result<()> {
    let ctx = open_context()?;
    store::update_preference(&ctx.paths.preferences_path, key, value)?;
    println!("Set {key}");
    Ok(())
}

fn cmd_get(key: &str) -> Result<()> {
    let ctx = open_context()?;
    let preferences = store::load_preferences(&ctx.paths.preferences_path)?;
    let Some(value) = preferences.get(key) else {
        bail!("preference '{key}' is not set");
    };
    if key == Preferences::API_KEY {
        println!("{key} is set");
        return Ok(());
    }
    match value {
        Value::String(text) => println!("{text}"),
        other => println!("{other}"),
    }
    Ok(())
}

fn cmd_todo(command: TodoCommand) -> Result<()> {
    let ctx = open_context()?;
    let mut lists = ctx.load_todo_lists()?;

    let (item, status) = match command {
        TodoCommand::List => {
            print_list_summary(&lists);
            return Ok(());
        }
        TodoCommand::Show { list } => {
            let index = match list {
                Some(selector) => resolve_list_index(&lists, &selector)
                    .with_context(|| format!("no todo list '{selector}'"))?,
                None => active_list_index(&lists).context("no active todo list")?,
            };
            println!("{}", format_todo_list(&lists[index]));
            return Ok(());
        }
        TodoCommand::Start { item } => (item, TodoStatus::InProgress),
        TodoCommand::Done { item } => (item, TodoStatus::Completed),
        TodoCommand::Cancel { item } => (item, TodoStatus::Cancelled),
    };

    let list = active_list_mut(&mut lists).context("no active todo list")?;
    let item_id = resolve_item_id(list, &item)
        .with_context(|| format!("no item '{item}' in todo list '{}'", list.title))?;
    let changed = match status {
        TodoStatus::InProgress => set_current_item(list, &item_id),
        other => update_status(list, &item_id, other),
    };
    if !changed {
        bail!("item '{item}' cannot be marked {}", status.as_str());
    }
    println!("{}", format_todo_list(list));
    store::save_todo_lists(&ctx.paths.todos_path, &lists)
}

fn print_list_summary(lists: &[TodoList]) {
    if lists.is_empty() {
        println!("No todo lists.");
        return;
    }
    let active = active_list_index(lists);
    for (index, list) in lists.iter().enumerate() {
        let (completed, total) = list.progress();
        let marker = if active == Some(index) { "*" } else { " " };
        println!(
            "{marker} {:>2}. {} ({completed}/{total}) {}",
            index + 1,
            list.title,
            list.id
        );
    }
}

fn resolve_list_index(lists: &[TodoList], selector: &str) -> Option<usize> {
    if let Some(index) = lists.iter().position(|list| list.id == selector) {
        return Some(index);
    }
    let position: usize = selector.parse().ok()?;
    let index = position.checked_sub(1)?;
    (index < lists.len()).then_some(index)
}

fn reads_stdin(file: Option<&Path>) -> bool {
    file.is_none_or(|path| path == Path::new("-"))
}

fn read_reply(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) if !reads_stdin(Some(path)) => {
            fs::read_to_string(path).with_context(|| format!("read reply {}", path.display()))
        }
        _ => {
            let mut reply = String::new();
            io::stdin()
                .read_to_string(&mut reply)
                .context("read reply from stdin")?;
            Ok(reply)
        }
    }
}
