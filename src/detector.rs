//! Line classification and rolling error context.
//!
//! The detector consumes every relayed line, keeps a bounded window of recent
//! output, and freezes that window into an [`ErrorContext`] when a signature
//! fires. While a context is awaiting resolution no further context is
//! raised; lines still flow into the window so nothing is lost.

use std::collections::VecDeque;
use std::time::SystemTime;

use crate::patterns::{Language, SignatureCatalog};
use crate::runner::OutputLine;

/// Default number of preceding lines captured with an error
pub const DEFAULT_CONTEXT_LINES: usize = 10;

/// The captured window of output surrounding a detected error
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Language the matching signature is attributed to
    pub language: Language,
    /// Human label of the matching signature
    pub label: &'static str,
    /// The line that fired the match
    pub line: String,
    /// Up to K lines preceding the match, oldest first
    pub preceding: Vec<String>,
    /// When the match fired
    pub detected_at: SystemTime,
}

/// Stateful error detector over the relayed line stream
pub struct Detector {
    catalog: SignatureCatalog,
    window: VecDeque<String>,
    capacity: usize,
    /// Single-live-context rule: no new context until the current one resolves
    pending: bool,
}

impl Detector {
    pub fn new(catalog: SignatureCatalog, capacity: usize) -> Self {
        Self {
            catalog,
            window: VecDeque::with_capacity(capacity),
            capacity,
            pending: false,
        }
    }

    /// Feed one line; returns a frozen context when a signature fires and no
    /// context is already pending.
    pub fn observe(&mut self, line: &OutputLine) -> Option<ErrorContext> {
        let matched = if self.pending {
            None
        } else {
            self.catalog.classify(&line.text)
        };

        let context = matched.map(|sig| ErrorContext {
            language: sig.language,
            label: sig.label,
            line: line.text.clone(),
            preceding: self.window.iter().cloned().collect(),
            detected_at: SystemTime::now(),
        });

        // The window absorbs every line, matched or not
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(line.text.clone());

        if context.is_some() {
            self.pending = true;
        }
        context
    }

    /// Resolve the pending context (dispatched, failed, or declined) and
    /// re-enable matching.
    pub fn resolve(&mut self) {
        self.pending = false;
    }

    /// Whether a context is currently awaiting resolution
    pub fn has_pending(&self) -> bool {
        self.pending
    }
}
