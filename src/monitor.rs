//! The monitoring event loop.
//!
//! One task drives the whole pipeline: lines arrive from the runner's relay
//! channel, pass through the detector, and a detected error suspends the loop
//! on the confirmation gate and then the dispatcher. The child is unaffected
//! by those suspensions; its output keeps printing from the relay tasks and
//! queues in the channel until the loop resumes.

use anyhow::{Context, Result};

use crate::detector::Detector;
use crate::dispatch::Dispatcher;
use crate::gate::ConfirmationGate;
use crate::output;
use crate::runner::{OutputLine, ProcessRunner};

/// Output behavior for dispatch results
#[derive(Debug, Clone, Copy, Default)]
pub struct MonitorOptions {
    /// Print dispatch results as JSON instead of colored panels
    pub json: bool,
}

/// Drives detection, confirmation, and dispatch over a running child
pub struct Monitor<G: ConfirmationGate> {
    detector: Detector,
    gate: G,
    dispatcher: Dispatcher,
    options: MonitorOptions,
}

impl<G: ConfirmationGate> Monitor<G> {
    pub fn new(
        detector: Detector,
        gate: G,
        dispatcher: Dispatcher,
        options: MonitorOptions,
    ) -> Self {
        Self {
            detector,
            gate,
            dispatcher,
            options,
        }
    }

    /// Run until the child's output closes, then return its exit code.
    ///
    /// Ctrl-C terminates the child, flushes the cache, and returns 130.
    pub async fn run(mut self, mut runner: ProcessRunner) -> Result<i32> {
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                line = runner.next_line() => {
                    match line {
                        Some(line) => self.handle_line(&line).await,
                        None => break,
                    }
                }
                _ = &mut ctrl_c => {
                    runner.kill().await.ok();
                    self.dispatcher.flush()?;
                    return Ok(130);
                }
            }
        }

        let code = runner.wait().await.context("failed to reap child")?;
        self.dispatcher.flush()?;
        Ok(code)
    }

    async fn handle_line(&mut self, line: &OutputLine) {
        let Some(context) = self.detector.observe(line) else {
            return;
        };

        // Gate errors (closed stdin, interrupted read) count as a decline
        let confirmed = self.gate.confirm(&context).await.unwrap_or(false);
        if confirmed {
            let result = self.dispatcher.dispatch(&context).await;
            if self.options.json {
                output::print_json(&context, &result);
            } else if let Some(reason) = &result.failure {
                output::print_failure(&context, reason);
            } else {
                output::print_fix(&context, &result);
            }
        }

        self.detector.resolve();
    }
}
