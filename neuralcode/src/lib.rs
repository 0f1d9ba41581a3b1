//! Action extraction and sandboxed execution for assistant replies.
//!
//! A reply from a language model is free text. This crate turns it into typed
//! actions (create, edit, run, read), executes them inside a path and command
//! sandbox, and tracks todo lists announced in the same text. The layout
//! keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (parsing, command policy, todo
//!   state machine). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (path sandbox, files, child
//!   processes, persisted state, confirmation).
//!
//! [`turn`] coordinates both for a single reply; the `neuralcode` binary is a
//! thin host around it.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod turn;
