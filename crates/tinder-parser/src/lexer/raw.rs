//! Raw scanning phase: source text to tokens.
//!
//! This phase is a greedy left-to-right scan. It does not know about
//! keywords or type-parameter brackets; those are the disambiguation
//! phase's job. Whitespace runs that contain a newline become a single
//! [`TokenKind::Newline`] token, because newlines can end statements.

use tinder_core::{Loc, Log};

use super::cursor::{is_ident_continue, is_ident_start, Cursor};
use super::error::LexError;
use super::token::{Token, TokenKind};

/// Scan `source` into raw tokens, reporting problems into `log`.
///
/// An unterminated string or block comment ends the scan early. The
/// stream is terminated by [`TokenKind::EndOfFile`]; the trailing
/// newline is guaranteed by the disambiguation phase, not here.
pub(crate) fn scan<'src>(source: &'src str, log: &mut Log) -> Vec<Token<'src>> {
    let mut scanner = Scanner { cursor: Cursor::new(source), log, tokens: Vec::new() };
    scanner.run();
    scanner.tokens
}

struct Scanner<'src, 'a> {
    cursor: Cursor<'src>,
    log: &'a mut Log,
    tokens: Vec<Token<'src>>,
}

impl<'src> Scanner<'src, '_> {
    fn run(&mut self) {
        // A byte-order mark is tolerated at the very start.
        if self.cursor.check_str("\u{FEFF}") {
            self.cursor.advance();
        }

        loop {
            if !self.skip_blank() {
                return; // unterminated block comment
            }
            if self.cursor.is_eof() {
                break;
            }
            if !self.scan_token() {
                return; // fatal
            }
        }

        let loc = self.cursor.loc();
        self.tokens.push(Token::new(TokenKind::EndOfFile, "", loc));
    }

    /// Skip whitespace and comments. Emits one `Newline` token if the
    /// skipped run contained a newline (inside a comment counts).
    /// Returns false on an unterminated block comment.
    fn skip_blank(&mut self) -> bool {
        let mut newline_loc: Option<Loc> = None;

        loop {
            match self.cursor.peek() {
                Some(c) if c.is_whitespace() => {
                    if c == '\n' && newline_loc.is_none() {
                        newline_loc = Some(self.cursor.loc());
                    }
                    self.cursor.advance();
                }
                Some('/') if self.cursor.peek_nth(1) == Some('/') => {
                    self.cursor.eat_while(|c| c != '\n');
                }
                Some('/') if self.cursor.peek_nth(1) == Some('+') => {
                    let start = self.cursor.loc();
                    if !self.skip_block_comment(&mut newline_loc) {
                        self.log.error(start, LexError::UnterminatedComment);
                        return false;
                    }
                }
                _ => break,
            }
        }

        if let Some(loc) = newline_loc {
            self.tokens.push(Token::new(TokenKind::Newline, "\n", loc));
        }
        true
    }

    /// Skip a `/+ ... +/` comment. These nest.
    fn skip_block_comment(&mut self, newline_loc: &mut Option<Loc>) -> bool {
        self.cursor.advance();
        self.cursor.advance();
        let mut depth = 1usize;

        while depth > 0 {
            if self.cursor.check_str("/+") {
                depth += 1;
                self.cursor.advance();
                self.cursor.advance();
            } else if self.cursor.check_str("+/") {
                depth -= 1;
                self.cursor.advance();
                self.cursor.advance();
            } else {
                match self.cursor.advance() {
                    Some('\n') => {
                        if newline_loc.is_none() {
                            // Column of a consumed newline is irrelevant;
                            // the token's location is where the line broke.
                            *newline_loc = Some(self.cursor.loc());
                        }
                    }
                    Some(_) => {}
                    None => return false,
                }
            }
        }
        true
    }

    /// Scan one token. Returns false on a fatal condition.
    fn scan_token(&mut self) -> bool {
        let loc = self.cursor.loc();
        let start = self.cursor.offset();

        match self.cursor.peek().expect("scan_token at eof") {
            '"' => self.scan_string('"', loc, start),
            '\'' => self.scan_string('\'', loc, start),
            c if c.is_ascii_digit() => {
                self.scan_number(loc, start);
                true
            }
            c if is_ident_start(c) => {
                self.cursor.eat_while(is_ident_continue);
                self.push(TokenKind::Identifier, loc, start);
                true
            }
            _ => {
                self.scan_operator(loc, start);
                true
            }
        }
    }

    fn push(&mut self, kind: TokenKind, loc: Loc, start: usize) {
        let text = self.cursor.slice_from(start);
        self.tokens.push(Token::new(kind, text, loc));
    }

    /// Scan an integer or float literal.
    ///
    /// An integer is a digit followed by any run of digits and letters, so
    /// that base prefixes like `0x` reach the parser as one token. A `.`
    /// followed by a digit reclassifies the literal as a float.
    fn scan_number(&mut self, loc: Loc, start: usize) {
        self.cursor.eat_while(|c| c.is_ascii_alphanumeric());

        let mut kind = TokenKind::IntLiteral;
        if self.cursor.peek() == Some('.') && self.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) {
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_alphanumeric());
            kind = TokenKind::FloatLiteral;
        }

        self.push(kind, loc, start);
    }

    /// Scan a string or character literal.
    ///
    /// Recognized escapes are `\t \r \n \\` and the matching quote; any
    /// other escape warns and both characters are kept literally. A
    /// character literal must contain exactly one character after escape
    /// processing. Returns false only when the literal is unterminated.
    fn scan_string(&mut self, quote: char, loc: Loc, start: usize) -> bool {
        self.cursor.advance();

        loop {
            match self.cursor.peek() {
                None => {
                    self.log.error(loc, LexError::UnterminatedString);
                    return false;
                }
                Some('\\') => {
                    self.cursor.advance();
                    let escape_loc = self.cursor.loc();
                    match self.cursor.advance() {
                        Some(c) if is_known_escape(c, quote) => {}
                        Some(c) => self.log.warning(escape_loc, LexError::UnknownEscape(c)),
                        None => {
                            self.log.error(loc, LexError::UnterminatedString);
                            return false;
                        }
                    }
                }
                Some(c) if c == quote => {
                    self.cursor.advance();
                    break;
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }

        if quote == '\'' {
            let text = self.cursor.slice_from(start);
            let value = unescape(&text[1..text.len() - 1], '\'');
            if value.chars().count() != 1 {
                self.log.error(loc, LexError::BadCharLiteral);
                self.push(TokenKind::Error, loc, start);
                return true;
            }
            self.push(TokenKind::CharLiteral, loc, start);
        } else {
            self.push(TokenKind::StringLiteral, loc, start);
        }
        true
    }

    fn scan_operator(&mut self, loc: Loc, start: usize) {
        let c = self.cursor.advance().expect("scan_operator at eof");
        let next = self.cursor.peek();

        use TokenKind::*;
        let kind = match (c, next) {
            ('(', _) => LeftParen,
            (')', _) => RightParen,
            ('[', _) => LeftBracket,
            (']', _) => RightBracket,
            ('{', _) => LeftBrace,
            ('}', _) => RightBrace,
            (',', _) => Comma,
            (';', _) => Semicolon,
            ('\\', _) => Backslash,
            ('.', _) => Dot,
            ('+', _) => Plus,
            ('-', _) => Minus,
            ('*', _) => Star,
            ('/', _) => Slash,
            ('&', _) => Amp,
            ('|', _) => Pipe,
            ('^', _) => Caret,

            ('=', Some('=')) => {
                self.cursor.advance();
                EqualEqual
            }
            ('=', _) => Assign,

            ('!', Some('=')) => {
                self.cursor.advance();
                NotEqual
            }

            ('<', Some('=')) => {
                self.cursor.advance();
                LessEqual
            }
            ('<', Some('<')) => {
                self.cursor.advance();
                ShiftLeft
            }
            ('<', _) => Less,

            ('>', Some('=')) => {
                self.cursor.advance();
                GreaterEqual
            }
            ('>', Some('>')) => {
                self.cursor.advance();
                ShiftRight
            }
            ('>', _) => Greater,

            ('?', Some('.')) => {
                self.cursor.advance();
                QuestionDot
            }
            ('?', Some('?')) => {
                self.cursor.advance();
                QuestionQuestion
            }
            ('?', _) => Question,

            _ => {
                self.log.error(loc, LexError::UnexpectedChar(c));
                Error
            }
        };

        self.push(kind, loc, start);
    }
}

fn is_known_escape(c: char, quote: char) -> bool {
    matches!(c, 't' | 'r' | 'n' | '\\') || c == quote
}

/// Process escape sequences in a string or character literal body.
///
/// Unknown escapes stay literal, matching the warning behavior of the
/// scan. The body excludes the surrounding quotes.
pub(crate) fn unescape(body: &str, quote: char) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some(c) if c == quote => out.push(c),
            Some(c) => {
                out.push('\\');
                out.push(c);
            }
            None => out.push('\\'),
        }
    }
    out
}
