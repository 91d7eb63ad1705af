//! Lexer diagnostics.

use thiserror::Error;

/// Problems the raw scan can report.
///
/// The `Display` text is the user-facing message recorded into the log.
/// Unterminated literals and comments are fatal for the scan; the rest
/// allow it to continue.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("unterminated block comment")]
    UnterminatedComment,

    #[error("character literal must contain exactly one character")]
    BadCharLiteral,

    #[error("unknown escape sequence \"\\{0}\"")]
    UnknownEscape(char),

    #[error("unexpected character \"{0}\"")]
    UnexpectedChar(char),
}
