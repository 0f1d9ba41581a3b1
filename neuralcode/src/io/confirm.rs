//! Operator confirmation before anything is executed or persisted.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

/// Asks the operator a yes/no question.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// Prompts on a writer and reads one answer line per question.
///
/// Only `y` or `yes` (any case) confirm. End of input declines.
pub struct LineConfirm<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LineConfirm<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl LineConfirm<io::StdinLock<'static>, io::Stderr> {
    /// Questions go to stderr so stdout carries only result lines.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> Confirm for LineConfirm<R, W> {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        write!(self.output, "{prompt} [y/N] ").context("write confirmation prompt")?;
        self.output.flush().context("flush confirmation prompt")?;

        let mut answer = String::new();
        let read = self
            .input
            .read_line(&mut answer)
            .context("read confirmation answer")?;
        if read == 0 {
            return Ok(false);
        }
        let answer = answer.trim().to_ascii_lowercase();
        Ok(matches!(answer.as_str(), "y" | "yes"))
    }
}

/// Confirms everything; used for `--yes`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}
