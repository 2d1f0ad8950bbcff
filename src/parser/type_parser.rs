//! 型の解析

use crate::ast::*;
use crate::lexer::Token;

use super::{ParseResult, Parser};

impl Parser {
    /// 現在のトークンが型の開始になり得るか
    pub(super) fn starts_type(&self) -> bool {
        matches!(
            self.current_token(),
            Some(
                Token::Identifier(_)
                    | Token::Star
                    | Token::LeftBracket
                    | Token::Map
                    | Token::Chan
                    | Token::Func
                    | Token::Struct
                    | Token::Interface
                    | Token::Arrow
                    | Token::LeftParen
            )
        )
    }

    /// 型を解析
    pub(super) fn parse_type(&mut self) -> ParseResult<TypeExpr> {
        let start = self.current_span().start;
        let kind = match self.current_token() {
            Some(Token::Identifier(name)) => {
                let name = name.clone();
                self.advance();
                if self.check(&Token::Dot) && matches!(self.peek(1), Some(Token::Identifier(_))) {
                    self.advance();
                    let member = self.expect_identifier()?;
                    TypeExprKind::Qualified(name, member)
                } else {
                    TypeExprKind::Name(name)
                }
            }

            // ポインタ型
            Some(Token::Star) => {
                self.advance();
                TypeExprKind::Pointer(Box::new(self.parse_type()?))
            }

            // スライス型・配列型
            Some(Token::LeftBracket) => {
                self.advance();
                if self.match_token(&Token::RightBracket) {
                    TypeExprKind::Slice(Box::new(self.parse_type()?))
                } else {
                    let len = self.parse_array_len()?;
                    self.expect(Token::RightBracket)?;
                    TypeExprKind::Array(len, Box::new(self.parse_type()?))
                }
            }

            // マップ型
            Some(Token::Map) => {
                self.advance();
                self.expect(Token::LeftBracket)?;
                let key = self.parse_type()?;
                self.expect(Token::RightBracket)?;
                let value = self.parse_type()?;
                TypeExprKind::Map(Box::new(key), Box::new(value))
            }

            // チャネル型
            Some(Token::Chan) => {
                self.advance();
                let dir = if self.match_token(&Token::Arrow) {
                    ChanDir::Send
                } else {
                    ChanDir::Both
                };
                TypeExprKind::Chan(dir, Box::new(self.parse_type()?))
            }
            Some(Token::Arrow) => {
                self.advance();
                self.expect(Token::Chan)?;
                TypeExprKind::Chan(ChanDir::Recv, Box::new(self.parse_type()?))
            }

            // 関数型
            Some(Token::Func) => {
                self.advance();
                TypeExprKind::Func(self.parse_signature()?)
            }

            Some(Token::Struct) => {
                self.advance();
                TypeExprKind::Struct(self.parse_struct_fields()?)
            }

            // インターフェース型は中身を区別しない
            Some(Token::Interface) => {
                self.advance();
                if !self.check(&Token::LeftBrace) {
                    return Err(self.unexpected("`{`"));
                }
                self.skip_balanced()?;
                TypeExprKind::Interface
            }

            Some(Token::LeftParen) => {
                self.advance();
                let inner = self.parse_type()?;
                self.expect(Token::RightParen)?;
                return Ok(inner);
            }

            _ => return Err(self.unexpected("型")),
        };

        Ok(TypeExpr {
            kind,
            span: self.span_from(start),
        })
    }

    fn parse_array_len(&mut self) -> ParseResult<ArrayLen> {
        match self.current_token() {
            Some(Token::Integer(n)) => {
                let n = *n;
                self.advance();
                Ok(ArrayLen::Literal(n))
            }
            Some(Token::Identifier(name)) => {
                let name = name.clone();
                self.advance();
                Ok(ArrayLen::Const(name))
            }
            Some(Token::Ellipsis) => {
                Err(self.error("`[...]T` は型として使えません".to_string()))
            }
            _ => Err(self.unexpected("配列の長さ")),
        }
    }

    /// 構造体のフィールド宣言を解析
    fn parse_struct_fields(&mut self) -> ParseResult<Vec<FieldDecl>> {
        self.expect(Token::LeftBrace)?;
        let mut fields = Vec::new();
        self.skip_semicolons();

        while !self.check(&Token::RightBrace) && !self.is_at_end() {
            let mut field = self.parse_field_decl()?;
            // タグは型の同一性に含まれる
            if matches!(self.current_token(), Some(Token::String(_) | Token::RawString(_))) {
                field.tag = Some(self.expect_string()?);
                field.span = self.span_from(field.span.start);
            }
            fields.push(field);
            self.expect_terminator()?;
            self.skip_semicolons();
        }

        self.expect(Token::RightBrace)?;
        Ok(fields)
    }

    fn parse_field_decl(&mut self) -> ParseResult<FieldDecl> {
        let start = self.current_span().start;

        // 埋め込みフィールド: `*T`, `T`, `pkg.T`
        let embedded = match self.current_token() {
            Some(Token::Star) => true,
            Some(Token::Identifier(_)) => matches!(
                self.peek(1),
                Some(
                    Token::Semicolon
                        | Token::RightBrace
                        | Token::Dot
                        | Token::String(_)
                        | Token::RawString(_)
                )
            ),
            _ => false,
        };

        if embedded {
            let ty = self.parse_type()?;
            let name = embedded_field_name(&ty)
                .ok_or_else(|| self.error("埋め込みフィールドには型名が必要です".to_string()))?;
            return Ok(FieldDecl {
                names: vec![name],
                ty,
                embedded: true,
                tag: None,
                span: self.span_from(start),
            });
        }

        let mut names = vec![self.expect_identifier()?];
        while self.match_token(&Token::Comma) {
            names.push(self.expect_identifier()?);
        }
        let ty = self.parse_type()?;
        Ok(FieldDecl {
            names,
            ty,
            embedded: false,
            tag: None,
            span: self.span_from(start),
        })
    }
}

/// 埋め込みフィールドの暗黙の名前（型名）
fn embedded_field_name(ty: &TypeExpr) -> Option<String> {
    match &ty.kind {
        TypeExprKind::Name(name) => Some(name.clone()),
        TypeExprKind::Qualified(_, name) => Some(name.clone()),
        TypeExprKind::Pointer(inner) => match &inner.kind {
            TypeExprKind::Name(name) | TypeExprKind::Qualified(_, name) => Some(name.clone()),
            _ => None,
        },
        _ => None,
    }
}
