//! メインパーサー構造とユーティリティ

use crate::ast::*;
use crate::error::ParserError;
use crate::lexer::{Token, TokenWithPosition};

use super::{ParseError, ParseResult};

/// Goサブセットのパーサー
pub struct Parser {
    pub(super) tokens: Vec<TokenWithPosition>,
    pub(super) current: usize,
    /// スパンに付与するファイル番号
    pub(super) file: usize,
    /// if/for/switchのヘッダ内では複合リテラルを認めない
    pub(super) no_composite: bool,
}

impl Parser {
    pub fn new(tokens: Vec<TokenWithPosition>) -> Self {
        Self::with_file(tokens, 0)
    }

    /// ファイル番号付きでパーサーを作成
    pub fn with_file(tokens: Vec<TokenWithPosition>, file: usize) -> Self {
        Self {
            tokens,
            current: 0,
            file,
            no_composite: false,
        }
    }

    /// ソースファイル全体を解析
    pub fn parse(&mut self) -> ParseResult<SourceFile> {
        let start = self.current_span().start;
        self.skip_semicolons();

        let package = self.parse_package_decl()?;

        let mut imports = Vec::new();
        self.skip_semicolons();
        while self.check(&Token::Import) {
            imports.extend(self.parse_import_decl()?);
            self.skip_semicolons();
        }

        let mut decls = Vec::new();
        while !self.is_at_end() {
            decls.extend(self.parse_top_level_decl()?);
            self.skip_semicolons();
        }

        Ok(SourceFile {
            package,
            imports,
            decls,
            span: self.span_from(start),
        })
    }

    /// 単一の式を解析
    pub fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.parse_expression_internal()
    }

    /// 単一の型を解析
    pub fn parse_type_expr(&mut self) -> ParseResult<TypeExpr> {
        self.parse_type()
    }

    // ==================== ユーティリティメソッド ====================

    /// 現在のトークンを取得
    pub(super) fn current_token(&self) -> Option<&Token> {
        self.tokens.get(self.current).map(|t| &t.token)
    }

    /// 特定のオフセット先のトークンを取得
    pub(super) fn peek(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.current + offset).map(|t| &t.token)
    }

    /// 現在のスパンを取得
    pub(super) fn current_span(&self) -> Span {
        match self.tokens.get(self.current) {
            Some(t) => Span::in_file(self.file, t.span.start, t.span.end),
            None => {
                let end = self.tokens.last().map(|t| t.span.end).unwrap_or(0);
                Span::in_file(self.file, end, end)
            }
        }
    }

    /// 開始位置から現在位置までのスパンを作成
    pub(super) fn span_from(&self, start: usize) -> Span {
        let end = if self.current > 0 {
            self.tokens
                .get(self.current - 1)
                .map(|t| t.span.end)
                .unwrap_or(start)
        } else {
            start
        };
        Span::in_file(self.file, start, end.max(start))
    }

    /// 次のトークンに進む
    pub(super) fn advance(&mut self) {
        if !self.is_at_end() {
            self.current += 1;
        }
    }

    /// 終端に到達したかチェック
    pub(super) fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len()
    }

    /// 特定のトークンをチェック（進まない）
    pub(super) fn check(&self, token_type: &Token) -> bool {
        if let Some(token) = self.current_token() {
            std::mem::discriminant(token) == std::mem::discriminant(token_type)
        } else {
            false
        }
    }

    /// 特定のトークンにマッチしたら進む
    pub(super) fn match_token(&mut self, token_type: &Token) -> bool {
        if self.check(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// 連続するセミコロンを読み飛ばす
    pub(super) fn skip_semicolons(&mut self) {
        while self.match_token(&Token::Semicolon) {}
    }

    /// 特定のトークンを期待
    pub(super) fn expect(&mut self, token_type: Token) -> ParseResult<()> {
        if self.check(&token_type) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&format!("{}", token_type)))
        }
    }

    /// 識別子を期待
    pub(super) fn expect_identifier(&mut self) -> ParseResult<String> {
        match self.current_token() {
            Some(Token::Identifier(name)) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("識別子")),
        }
    }

    /// 文字列リテラルを期待
    pub(super) fn expect_string(&mut self) -> ParseResult<String> {
        match self.current_token() {
            Some(Token::String(value)) | Some(Token::RawString(value)) => {
                let value = value.clone();
                self.advance();
                Ok(value)
            }
            _ => Err(self.unexpected("文字列リテラル")),
        }
    }

    /// 宣言の終端（`;`、または閉じ括弧の直前）を期待
    pub(super) fn expect_terminator(&mut self) -> ParseResult<()> {
        if self.match_token(&Token::Semicolon)
            || self.is_at_end()
            || self.check(&Token::RightParen)
            || self.check(&Token::RightBrace)
        {
            Ok(())
        } else {
            Err(self.unexpected("`;`"))
        }
    }

    /// 予期しないトークンエラーを作成
    pub(super) fn unexpected(&self, expected: &str) -> ParseError {
        match self.current_token() {
            Some(token) => ParserError::UnexpectedToken {
                expected: expected.to_string(),
                found: format!("{}", token),
                span: self.current_span(),
            },
            None => ParserError::UnexpectedEof {
                expected: expected.to_string(),
                span: self.current_span(),
            },
        }
    }

    /// エラーを作成
    pub(super) fn error(&self, message: String) -> ParseError {
        ParserError::SyntaxError {
            message,
            span: self.current_span(),
        }
    }

    /// 複合リテラルを許可した状態で解析する（括弧の内側など）
    pub(super) fn allowing_composite<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<T> {
        let saved = self.no_composite;
        self.no_composite = false;
        let result = f(self);
        self.no_composite = saved;
        result
    }

    /// 対応する閉じ括弧まで読み飛ばす（現在位置は開き括弧）
    pub(super) fn skip_balanced(&mut self) -> ParseResult<()> {
        let mut depth = 0usize;
        loop {
            match self.current_token() {
                None => return Err(self.unexpected("閉じ括弧")),
                Some(Token::LeftParen | Token::LeftBracket | Token::LeftBrace) => depth += 1,
                Some(Token::RightParen | Token::RightBracket | Token::RightBrace) => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.advance();
                        return Ok(());
                    }
                }
                _ => {}
            }
            self.advance();
        }
    }
}
