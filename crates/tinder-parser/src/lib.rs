//! Front end for the Tinder language: tokenizer and parser.
//!
//! Tokenization happens in two phases. The raw phase scans text into
//! tokens; the disambiguation phase turns identifiers into keywords,
//! matches brackets, and decides which `<` `>` pairs are type-parameter
//! brackets (reclassified to [`TokenKind::LParam`] / [`TokenKind::RParam`]).
//!
//! Parsing uses a Pratt parser for expressions and a small recursive
//! descent driver for statements. The result is an untyped [`ast::Module`]
//! that later passes decorate in place.

pub mod ast;
pub mod lexer;

pub use ast::parser::Parser;
pub use lexer::{tokenize, Token, TokenKind};
