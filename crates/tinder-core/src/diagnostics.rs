//! The diagnostic log.
//!
//! Every pass reports problems into a [`Log`] instead of returning errors.
//! Each diagnostic renders as a single line:
//!
//! ```text
//! <file>:<line>:<column>: <severity>: <text>
//! ```
//!
//! or, when the location is unknown, `<unprintable location>: <severity>: <text>`.
//!
//! Errors suppress every later pass; warnings do not. The log can be
//! temporarily suspended, which discards reports; the type pass uses this
//! to peek at a callee's type before deciding how to type the arguments.

use std::fmt;

use crate::loc::Loc;

/// How serious a diagnostic is.
///
/// An `Error` stops the pipeline after the current pass; a `Warning` is
/// advisory and does not suppress output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A single compiler message.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// The source file the message refers to.
    pub file: String,
    /// Where in the file, if known.
    pub loc: Option<Loc>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.loc {
            Some(loc) => write!(f, "{}:{}: {}: {}", self.file, loc, self.severity, self.message),
            None => write!(f, "<unprintable location>: {}: {}", self.severity, self.message),
        }
    }
}

/// Collects diagnostics for one compilation.
#[derive(Debug, Default)]
pub struct Log {
    file: String,
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    suspended: u32,
}

impl Log {
    /// Create an empty log for the named source file.
    pub fn new(file: impl Into<String>) -> Self {
        Self { file: file.into(), ..Self::default() }
    }

    /// The source file this log reports on.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Record an error at `loc`.
    pub fn error(&mut self, loc: Loc, message: impl fmt::Display) {
        self.push(Severity::Error, Some(loc), message);
    }

    /// Record an error with no usable location.
    pub fn error_unlocated(&mut self, message: impl fmt::Display) {
        self.push(Severity::Error, None, message);
    }

    /// Record a warning at `loc`.
    pub fn warning(&mut self, loc: Loc, message: impl fmt::Display) {
        self.push(Severity::Warning, Some(loc), message);
    }

    fn push(&mut self, severity: Severity, loc: Option<Loc>, message: impl fmt::Display) {
        if self.suspended > 0 {
            return;
        }
        if severity == Severity::Error {
            self.error_count += 1;
        }
        self.diagnostics.push(Diagnostic {
            severity,
            message: message.to_string(),
            file: self.file.clone(),
            loc,
        });
    }

    /// Stop recording until the matching [`resume`](Self::resume).
    ///
    /// Nested suspensions stack.
    pub fn suspend(&mut self) {
        self.suspended += 1;
    }

    /// Undo one [`suspend`](Self::suspend).
    pub fn resume(&mut self) {
        debug_assert!(self.suspended > 0);
        self.suspended = self.suspended.saturating_sub(1);
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.len() - self.error_count
    }

    /// All diagnostics in the order they were reported.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.iter().filter(|d| d.severity == Severity::Warning)
    }

    /// Render every diagnostic, one per line.
    pub fn emit<W: std::io::Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for diagnostic in &self.diagnostics {
            writeln!(writer, "{diagnostic}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for diagnostic in &self.diagnostics {
            writeln!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}
