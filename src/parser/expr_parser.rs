//! 式の解析
//!
//! 演算子の優先順位は区別しない。型付けに必要なのは二項演算の種類だけで、
//! 結合の仕方は結果の型に影響しないため。

use crate::ast::*;
use crate::lexer::Token;

use super::{ParseResult, Parser};

impl Parser {
    /// 式を解析
    pub(super) fn parse_expression_internal(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_unary()?;
        while let Some(op) = self.current_token().and_then(binary_operator_text) {
            self.advance();
            let right = self.parse_unary()?;
            let span = left.span.to(right.span);
            left = Expr::new(
                ExprKind::Binary(op.to_string(), Box::new(left), Box::new(right)),
                span,
            );
        }
        Ok(left)
    }

    /// カンマ区切りの式リスト
    pub(super) fn parse_expression_list(&mut self) -> ParseResult<Vec<Expr>> {
        let mut exprs = vec![self.parse_expression_internal()?];
        while self.match_token(&Token::Comma) {
            exprs.push(self.parse_expression_internal()?);
        }
        Ok(exprs)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let start = self.current_span().start;
        let op = match self.current_token() {
            Some(Token::Ampersand) => Some(UnaryOp::Ref),
            Some(Token::Star) => Some(UnaryOp::Deref),
            Some(Token::Minus) => Some(UnaryOp::Neg),
            Some(Token::Plus) => Some(UnaryOp::Plus),
            Some(Token::Not) => Some(UnaryOp::Not),
            Some(Token::Caret) => Some(UnaryOp::Complement),
            // `<-chan T` は型
            Some(Token::Arrow) if !matches!(self.peek(1), Some(Token::Chan)) => Some(UnaryOp::Recv),
            _ => None,
        };

        match op {
            Some(op) => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(Expr::new(
                    ExprKind::Unary(op, Box::new(operand)),
                    self.span_from(start),
                ))
            }
            None => {
                let primary = self.parse_operand()?;
                self.parse_postfix(primary)
            }
        }
    }

    /// オペランド（識別子、リテラル、型、関数リテラル、括弧式）
    fn parse_operand(&mut self) -> ParseResult<Expr> {
        let start = self.current_span().start;
        let kind = match self.current_token() {
            Some(Token::Identifier(name)) => {
                let name = name.clone();
                self.advance();
                ExprKind::Ident(name)
            }
            Some(Token::Integer(v)) => {
                let v = *v;
                self.advance();
                ExprKind::IntLit(v)
            }
            Some(Token::Float(s)) => {
                let s = s.clone();
                self.advance();
                ExprKind::FloatLit(s)
            }
            Some(Token::Imaginary(s)) => {
                let s = s.clone();
                self.advance();
                ExprKind::ImaginaryLit(s)
            }
            Some(Token::Rune(s)) => {
                let s = s.clone();
                self.advance();
                ExprKind::RuneLit(s)
            }
            Some(Token::String(s)) | Some(Token::RawString(s)) => {
                let s = s.clone();
                self.advance();
                ExprKind::StringLit(s)
            }
            Some(Token::LeftParen) => {
                self.advance();
                let inner = self.allowing_composite(|p| p.parse_expression_internal())?;
                self.expect(Token::RightParen)?;
                ExprKind::Paren(Box::new(inner))
            }
            Some(Token::Func) => {
                self.advance();
                let signature = self.parse_signature()?;
                if self.check(&Token::LeftBrace) {
                    let body = self.allowing_composite(|p| p.parse_block())?;
                    ExprKind::FuncLit(signature, body)
                } else {
                    ExprKind::Type(TypeExpr {
                        kind: TypeExprKind::Func(signature),
                        span: self.span_from(start),
                    })
                }
            }
            Some(
                Token::LeftBracket
                | Token::Map
                | Token::Chan
                | Token::Struct
                | Token::Interface
                | Token::Arrow,
            ) => ExprKind::Type(self.parse_type()?),
            _ => return Err(self.unexpected("式")),
        };
        Ok(Expr::new(kind, self.span_from(start)))
    }

    /// 後置演算子（セレクタ、インデックス、呼び出し、複合リテラル）
    fn parse_postfix(&mut self, mut expr: Expr) -> ParseResult<Expr> {
        let start = expr.span.start;
        loop {
            match self.current_token() {
                Some(Token::Dot) => {
                    self.advance();
                    if self.match_token(&Token::LeftParen) {
                        let asserted = if self.match_token(&Token::Type) {
                            None
                        } else {
                            Some(self.parse_type()?)
                        };
                        self.expect(Token::RightParen)?;
                        expr = Expr::new(
                            ExprKind::TypeAssert(Box::new(expr), asserted),
                            self.span_from(start),
                        );
                    } else {
                        let name = self.expect_identifier()?;
                        expr = Expr::new(
                            ExprKind::Selector(Box::new(expr), name),
                            self.span_from(start),
                        );
                    }
                }
                Some(Token::LeftBracket) => {
                    self.advance();
                    expr = self.allowing_composite(|p| p.parse_index_or_slice(expr, start))?;
                }
                Some(Token::LeftParen) => {
                    self.advance();
                    let (args, spread) = self.allowing_composite(|p| p.parse_call_args())?;
                    let span = self.span_from(start);
                    expr = Expr::new(
                        ExprKind::Call(CallExpr {
                            callee: Box::new(expr),
                            args,
                            spread,
                            span,
                        }),
                        span,
                    );
                }
                Some(Token::LeftBrace) if !self.no_composite => {
                    let Some(ty) = composite_type(&expr) else {
                        return Ok(expr);
                    };
                    let elems = self.allowing_composite(|p| p.parse_composite_elements())?;
                    expr = Expr::new(ExprKind::Composite(ty, elems), self.span_from(start));
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_index_or_slice(&mut self, operand: Expr, start: usize) -> ParseResult<Expr> {
        let mut index = None;
        if !self.check(&Token::Colon) {
            index = Some(self.parse_expression_internal()?);
        }

        if self.check(&Token::Colon) {
            while !self.check(&Token::RightBracket) && !self.is_at_end() {
                if self.match_token(&Token::Colon) {
                    continue;
                }
                self.parse_expression_internal()?;
            }
            self.expect(Token::RightBracket)?;
            return Ok(Expr::new(
                ExprKind::SliceExpr(Box::new(operand)),
                self.span_from(start),
            ));
        }

        self.expect(Token::RightBracket)?;
        let index = index.ok_or_else(|| self.unexpected("インデックス"))?;
        Ok(Expr::new(
            ExprKind::Index(Box::new(operand), Box::new(index)),
            self.span_from(start),
        ))
    }

    /// 呼び出しの引数（`(` の直後から）
    fn parse_call_args(&mut self) -> ParseResult<(Vec<Expr>, bool)> {
        let mut args = Vec::new();
        let mut spread = false;
        self.skip_semicolons();
        while !self.check(&Token::RightParen) && !self.is_at_end() {
            args.push(self.parse_expression_internal()?);
            if self.match_token(&Token::Ellipsis) {
                spread = true;
            }
            if !self.match_token(&Token::Comma) {
                break;
            }
            self.skip_semicolons();
        }
        self.skip_semicolons();
        self.expect(Token::RightParen)?;
        Ok((args, spread))
    }

    /// `{ elem, key: elem, ... }`
    fn parse_composite_elements(&mut self) -> ParseResult<Vec<Expr>> {
        self.expect(Token::LeftBrace)?;
        let mut elems = Vec::new();
        self.skip_semicolons();
        while !self.check(&Token::RightBrace) && !self.is_at_end() {
            let start = self.current_span().start;
            let first = self.parse_element()?;
            let elem = if self.match_token(&Token::Colon) {
                let value = self.parse_element()?;
                Expr::new(
                    ExprKind::KeyValue(Box::new(first), Box::new(value)),
                    self.span_from(start),
                )
            } else {
                first
            };
            elems.push(elem);
            if !self.match_token(&Token::Comma) {
                break;
            }
            self.skip_semicolons();
        }
        self.skip_semicolons();
        self.expect(Token::RightBrace)?;
        Ok(elems)
    }

    fn parse_element(&mut self) -> ParseResult<Expr> {
        if self.check(&Token::LeftBrace) {
            let start = self.current_span().start;
            let elems = self.parse_composite_elements()?;
            Ok(Expr::new(ExprKind::ElidedComposite(elems), self.span_from(start)))
        } else {
            self.parse_expression_internal()
        }
    }
}

/// 二項演算子の表記
fn binary_operator_text(token: &Token) -> Option<&'static str> {
    let text = match token {
        Token::Plus => "+",
        Token::Minus => "-",
        Token::Star => "*",
        Token::Slash => "/",
        Token::Percent => "%",
        Token::Ampersand => "&",
        Token::Pipe => "|",
        Token::Caret => "^",
        Token::ShiftLeft => "<<",
        Token::ShiftRight => ">>",
        Token::AndNot => "&^",
        Token::AndAnd => "&&",
        Token::OrOr => "||",
        Token::EqEq => "==",
        Token::NotEq => "!=",
        Token::Lt => "<",
        Token::LtEq => "<=",
        Token::Gt => ">",
        Token::GtEq => ">=",
        _ => return None,
    };
    debug_assert!(token.is_binary_op());
    Some(text)
}

/// 複合リテラルの型として読める式なら型に変換する
fn composite_type(expr: &Expr) -> Option<TypeExpr> {
    let kind = match &expr.kind {
        ExprKind::Ident(name) => TypeExprKind::Name(name.clone()),
        ExprKind::Selector(base, member) => match &base.kind {
            ExprKind::Ident(pkg) => TypeExprKind::Qualified(pkg.clone(), member.clone()),
            _ => return None,
        },
        ExprKind::Type(ty) => return Some(ty.clone()),
        _ => return None,
    };
    Some(TypeExpr {
        kind,
        span: expr.span,
    })
}
