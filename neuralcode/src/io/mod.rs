//! Side-effecting operations: filesystem, child processes, persisted state.

pub mod command;
pub mod config;
pub mod confirm;
pub mod executor;
pub mod files;
pub mod guard;
pub mod process;
pub mod prompt;
pub mod store;
