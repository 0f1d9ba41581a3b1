//! Deterministic, pure logic shared by the engine.
//!
//! Core modules must be free of filesystem and process side effects. They
//! operate on in-memory data and return values suitable for tests.

pub mod error;
pub mod parser;
pub mod policy;
pub mod todo;
pub mod types;
