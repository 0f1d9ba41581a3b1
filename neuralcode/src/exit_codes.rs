//! Stable exit codes for `neuralcode` commands.

/// Command succeeded; every executed action succeeded.
pub const OK: i32 = 0;
/// Invalid usage, configuration, or unreadable state under `.neuralcode/`.
pub const INVALID: i32 = 1;
/// `neuralcode apply` executed at least one action that failed.
pub const ACTION_FAILED: i32 = 2;
