//! Expression parsing with a Pratt parser.
//!
//! The prefix parser for the current token runs first; infix and postfix
//! parsers then run for as long as their binding power exceeds the
//! caller-supplied minimum. The one right-associative operator (`=`)
//! parses its right side at `binding_power - 1`.

use tinder_core::Type;

use crate::ast::expr::{Expr, ExprKind};
use crate::ast::ops::{BinaryOp, UnaryOp, AS_BP, POSTFIX_BP, UNARY_BP};
use crate::ast::parser::Parser;
use crate::lexer::{unescape, Token, TokenKind};

impl<'src> Parser<'src, '_> {
    /// Parse an expression; only operators binding tighter than `min_bp`
    /// are consumed.
    pub(crate) fn parse_expr(&mut self, min_bp: u8) -> Option<Expr> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let token = *self.peek();
            match token.kind {
                // Member access, safe or plain.
                TokenKind::Dot | TokenKind::QuestionDot if POSTFIX_BP > min_bp => {
                    self.advance();
                    let name = self.expect(TokenKind::Identifier)?;
                    lhs = self.expr(
                        ExprKind::Member {
                            obj: Box::new(lhs),
                            name: name.text.to_string(),
                            safe: token.kind == TokenKind::QuestionDot,
                            symbol: None,
                        },
                        token.loc,
                    );
                }

                // Call.
                TokenKind::LeftParen if POSTFIX_BP > min_bp => {
                    self.advance();
                    let mut args = Vec::new();
                    if !self.check(TokenKind::RightParen) {
                        loop {
                            args.push(self.parse_expr(0)?);
                            if self.eat(TokenKind::Comma).is_none() {
                                break;
                            }
                        }
                    }
                    self.expect(TokenKind::RightParen)?;
                    lhs = self.expr(
                        ExprKind::Call { callee: Box::new(lhs), args, is_ctor: false },
                        token.loc,
                    );
                }

                // Generic instantiation with confirmed parameter brackets.
                TokenKind::LParam if POSTFIX_BP > min_bp => {
                    self.advance();
                    let mut params = Vec::new();
                    loop {
                        params.push(self.parse_expr(0)?);
                        if self.eat(TokenKind::Comma).is_none() {
                            break;
                        }
                    }
                    self.expect(TokenKind::RParam)?;
                    lhs = self.expr(
                        ExprKind::Param { base: Box::new(lhs), params },
                        token.loc,
                    );
                }

                // Indexing.
                TokenKind::LeftBracket if POSTFIX_BP > min_bp => {
                    self.advance();
                    let index = self.parse_expr(0)?;
                    self.expect(TokenKind::RightBracket)?;
                    lhs = self.expr(
                        ExprKind::Index { obj: Box::new(lhs), index: Box::new(index) },
                        token.loc,
                    );
                }

                // The nullable type suffix.
                TokenKind::Question if POSTFIX_BP > min_bp => {
                    self.advance();
                    lhs = self.expr(ExprKind::Nullable { value: Box::new(lhs) }, token.loc);
                }

                // Cast.
                TokenKind::As if AS_BP > min_bp => {
                    self.advance();
                    let target = self.parse_expr(AS_BP)?;
                    lhs = self.expr(
                        ExprKind::Cast { value: Box::new(lhs), target: Box::new(target) },
                        token.loc,
                    );
                }

                _ => {
                    let Some(op) = BinaryOp::from_token(token.kind) else { break };
                    let bp = op.binding_power();
                    if bp <= min_bp {
                        break;
                    }
                    self.advance();
                    let rhs_bp = if op.is_right_associative() { bp - 1 } else { bp };
                    let rhs = self.parse_expr(rhs_bp)?;
                    lhs = self.expr(
                        ExprKind::Binary { op, left: Box::new(lhs), right: Box::new(rhs) },
                        token.loc,
                    );
                }
            }
        }

        Some(lhs)
    }

    fn parse_prefix(&mut self) -> Option<Expr> {
        let token = *self.peek();
        let kind = match token.kind {
            TokenKind::IntLiteral => {
                self.advance();
                ExprKind::Int(self.parse_int_literal(&token)?)
            }
            TokenKind::FloatLiteral => {
                self.advance();
                match token.text.parse::<f64>() {
                    Ok(value) => ExprKind::Float(value),
                    Err(_) => {
                        self.log().error(
                            token.loc,
                            format_args!("invalid float literal \"{}\"", token.text),
                        );
                        self.reported = true;
                        return None;
                    }
                }
            }
            TokenKind::StringLiteral => {
                self.advance();
                let body = &token.text[1..token.text.len() - 1];
                ExprKind::Str(unescape(body, '"'))
            }
            TokenKind::CharLiteral => {
                self.advance();
                // A character literal is an int expression carrying the
                // character's code point. The lexer validated the length.
                let body = &token.text[1..token.text.len() - 1];
                let value = unescape(body, '\'').chars().next().map_or(0, |c| c as i64);
                ExprKind::Int(value)
            }
            TokenKind::Identifier => {
                self.advance();
                ExprKind::Ident { name: token.text.to_string(), symbol: None }
            }
            TokenKind::True => {
                self.advance();
                ExprKind::Bool(true)
            }
            TokenKind::False => {
                self.advance();
                ExprKind::Bool(false)
            }
            TokenKind::Null => {
                self.advance();
                ExprKind::Null
            }
            TokenKind::This => {
                self.advance();
                ExprKind::This
            }
            TokenKind::Var => {
                self.advance();
                ExprKind::VarKw
            }
            TokenKind::Void => {
                self.advance();
                ExprKind::TypeRef(Type::Void)
            }
            TokenKind::Bool => {
                self.advance();
                ExprKind::TypeRef(Type::BOOL)
            }
            TokenKind::Int => {
                self.advance();
                ExprKind::TypeRef(Type::INT)
            }
            TokenKind::Float => {
                self.advance();
                ExprKind::TypeRef(Type::FLOAT)
            }
            TokenKind::String => {
                self.advance();
                ExprKind::TypeRef(Type::STRING)
            }
            TokenKind::List => {
                self.advance();
                ExprKind::TypeRef(Type::List(None))
            }
            TokenKind::Function => {
                self.advance();
                ExprKind::TypeRef(Type::Func { ret: None, args: Vec::new() })
            }
            TokenKind::Minus => {
                self.advance();
                let value = self.parse_expr(UNARY_BP)?;
                ExprKind::Unary { op: UnaryOp::Negate, value: Box::new(value) }
            }
            TokenKind::Not => {
                self.advance();
                let value = self.parse_expr(UNARY_BP)?;
                ExprKind::Unary { op: UnaryOp::Not, value: Box::new(value) }
            }
            TokenKind::LeftParen => {
                // Grouping; no node of its own.
                self.advance();
                let inner = self.parse_expr(0)?;
                self.expect(TokenKind::RightParen)?;
                return Some(inner);
            }
            TokenKind::LeftBracket => {
                self.advance();
                let mut items = Vec::new();
                if !self.check(TokenKind::RightBracket) {
                    loop {
                        items.push(self.parse_expr(0)?);
                        if self.eat(TokenKind::Comma).is_none() {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RightBracket)?;
                ExprKind::List(items)
            }
            _ => return None,
        };

        Some(self.expr(kind, token.loc))
    }

    /// Decode an integer literal, including `0x` / `0o` / `0b` prefixes.
    ///
    /// The raw scan captured any run of digits and letters, so invalid
    /// digits surface here as a diagnostic rather than a split token.
    fn parse_int_literal(&mut self, token: &Token<'src>) -> Option<i64> {
        let text = token.text;
        let (digits, radix) = match text.get(..2) {
            Some("0x") | Some("0X") => (&text[2..], 16),
            Some("0o") | Some("0O") => (&text[2..], 8),
            Some("0b") | Some("0B") => (&text[2..], 2),
            _ => (text, 10),
        };

        match i64::from_str_radix(digits, radix) {
            Ok(value) => Some(value),
            Err(error) => {
                use std::num::IntErrorKind;
                let message = match error.kind() {
                    IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
                        format!("integer literal \"{text}\" is out of range")
                    }
                    _ => format!("invalid integer literal \"{text}\""),
                };
                self.log().error(token.loc, message);
                self.reported = true;
                None
            }
        }
    }
}
