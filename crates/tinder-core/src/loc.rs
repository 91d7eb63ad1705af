//! Source positions.

use std::fmt;

/// A position in the source being compiled: 1-indexed line and byte column.
///
/// The file name is not part of the position; a compilation works on a
/// single source and the [`Log`](crate::Log) carries its name once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Loc {
    pub line: u32,
    pub column: u32,
}

impl Loc {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
