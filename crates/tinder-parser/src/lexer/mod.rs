//! Lexical analysis for Tinder.

mod cursor;
mod error;
mod raw;
mod remap;
mod token;

pub use error::LexError;
pub use token::{lookup_keyword, Token, TokenKind};

pub(crate) use raw::unescape;

use tinder_core::Log;

/// Tokenize `source`, running both lexer phases.
///
/// Problems (unterminated literals, bad character literals, unknown
/// escapes) are reported into `log`; an unterminated string or block
/// comment stops the scan. The returned stream always ends with a
/// [`TokenKind::Newline`] followed by [`TokenKind::EndOfFile`].
pub fn tokenize<'src>(source: &'src str, log: &mut Log) -> Vec<Token<'src>> {
    remap::remap(raw::scan(source, log))
}
