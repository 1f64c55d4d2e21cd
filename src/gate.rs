//! Interactive confirmation before spending a provider call.

use anyhow::Result;
use async_trait::async_trait;
use colored::Colorize;
use std::io::{BufRead, Write};

use crate::detector::ErrorContext;

/// Decision point between detection and dispatch.
///
/// Implementations block the monitor loop only; the child process and its
/// output relay keep running while an answer is pending.
#[async_trait]
pub trait ConfirmationGate: Send {
    /// Present the context and return whether to request a fix
    async fn confirm(&mut self, context: &ErrorContext) -> Result<bool>;
}

/// y/N prompt on the controlling terminal
pub struct TerminalGate;

#[async_trait]
impl ConfirmationGate for TerminalGate {
    async fn confirm(&mut self, context: &ErrorContext) -> Result<bool> {
        eprintln!();
        eprintln!(
            "{} {} {}",
            "!".yellow().bold(),
            context.label.yellow().bold(),
            format!("({})", context.language).dimmed()
        );
        eprintln!("  {}", context.line.red());
        eprint!("{}", "  Ask the AI for a fix? [y/N] ".cyan());
        std::io::stderr().flush().ok();

        // Stdin reads are blocking; keep them off the async runtime. EOF or a
        // read failure counts as a decline.
        let answer = tokio::task::spawn_blocking(|| {
            let mut buf = String::new();
            match std::io::stdin().lock().read_line(&mut buf) {
                Ok(0) | Err(_) => false,
                Ok(_) => matches!(buf.trim(), "y" | "Y" | "yes" | "Yes"),
            }
        })
        .await?;

        Ok(answer)
    }
}

/// Always-yes gate for `--auto`
pub struct AutoGate;

#[async_trait]
impl ConfirmationGate for AutoGate {
    async fn confirm(&mut self, _context: &ErrorContext) -> Result<bool> {
        Ok(true)
    }
}
