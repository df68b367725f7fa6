//! Diagnostics accumulation.
//!
//! The `bpkg` original composes diagnostics as a `diag_record`: a sequence
//! of `info:`/`warning:` continuation lines under one top-level message,
//! flushed atomically when the record goes out of scope. `DiagRecord` is
//! the Rust expression of that pattern: build it up, then `.emit(logger)`
//! or let `Drop` flush it if it still holds lines when dropped.

use slog::Logger;
use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A single diagnostic, `<stream>: <severity>: <summary>` plus zero or
/// more `  info: ...` continuation lines.
pub struct DiagRecord {
    stream: String,
    severity: Severity,
    summary: String,
    continuations: Vec<(Severity, String)>,
    flushed: bool,
}

impl DiagRecord {
    pub fn new(stream: impl Into<String>, severity: Severity, summary: impl Into<String>) -> Self {
        DiagRecord {
            stream: stream.into(),
            severity,
            summary: summary.into(),
            continuations: Vec::new(),
            flushed: false,
        }
    }

    pub fn info(mut self, line: impl Into<String>) -> Self {
        self.continuations.push((Severity::Info, line.into()));
        self
    }

    pub fn warning(mut self, line: impl Into<String>) -> Self {
        self.continuations.push((Severity::Warning, line.into()));
        self
    }

    /// Render the full record as the user-visible multi-line shape.
    pub fn render(&self) -> String {
        let mut out = format!("{}: {}: {}", self.stream, self.severity, self.summary);
        for (sev, line) in &self.continuations {
            out.push_str(&format!("\n  {}: {}", sev, line));
        }
        out
    }

    /// Flush the record to the logger at a level matching its severity and
    /// mark it flushed so `Drop` doesn't double-emit.
    pub fn emit(mut self, log: &Logger) {
        self.flushed = true;
        match self.severity {
            Severity::Error => slog::error!(log, "{}", self.render()),
            Severity::Warning => slog::warn!(log, "{}", self.render()),
            Severity::Info => slog::info!(log, "{}", self.render()),
        }
    }
}

impl Drop for DiagRecord {
    fn drop(&mut self) {
        if !self.flushed {
            eprintln!("{}", self.render());
        }
    }
}
