//! 関数本体の解析
//!
//! 文は寛容に解析する。解析できない文は警告を出して終端まで読み飛ばし、
//! それまでに集めた項目を巻き戻す。

use crate::ast::*;
use crate::lexer::Token;

use super::{ParseResult, Parser};

impl Parser {
    /// `{ ... }` を解析して本体の項目列を返す
    pub(super) fn parse_block(&mut self) -> ParseResult<Vec<BodyItem>> {
        self.expect(Token::LeftBrace)?;
        let mut items = Vec::new();
        self.parse_statement_list(&mut items);
        self.expect(Token::RightBrace)?;
        Ok(items)
    }

    /// `}`、`case`、`default`、終端のいずれかまで文を読む
    fn parse_statement_list(&mut self, items: &mut Vec<BodyItem>) {
        loop {
            self.skip_semicolons();
            if self.is_at_end()
                || self.check(&Token::RightBrace)
                || self.check(&Token::Case)
                || self.check(&Token::Default)
            {
                return;
            }

            let saved_pos = self.current;
            let saved_len = items.len();
            let result = self
                .parse_statement(items)
                .and_then(|()| self.expect_terminator());
            if let Err(err) = result {
                log::warn!("解析できない文を読み飛ばします: {}", err);
                items.truncate(saved_len);
                self.current = saved_pos;
                self.skip_statement();
            }
        }
    }

    /// 深さ0の `;` または `}` まで読み飛ばす（`}` は消費しない）
    fn skip_statement(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.current_token() {
            match token {
                Token::LeftParen | Token::LeftBracket | Token::LeftBrace => depth += 1,
                Token::RightParen | Token::RightBracket | Token::RightBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                }
                Token::Semicolon if depth == 0 => {
                    self.advance();
                    return;
                }
                _ => {}
            }
            self.advance();
        }
    }

    fn parse_statement(&mut self, items: &mut Vec<BodyItem>) -> ParseResult<()> {
        match self.current_token() {
            Some(Token::Var) | Some(Token::Const) => {
                self.advance();
                let specs = self.parse_grouped_locals()?;
                for spec in specs {
                    push_value_spec(items, spec);
                }
                Ok(())
            }
            // ローカルな型宣言は扱わない
            Some(Token::Type) => {
                self.skip_statement_body();
                Ok(())
            }
            Some(Token::LeftBrace) => {
                items.push(BodyItem::Enter(Vec::new()));
                items.extend(self.parse_block()?);
                items.push(BodyItem::Leave);
                Ok(())
            }
            Some(Token::If) => self.parse_if(items),
            Some(Token::For) => self.parse_for(items),
            Some(Token::Switch) => self.parse_switch(items),
            Some(Token::Select) => {
                self.advance();
                items.push(BodyItem::Enter(Vec::new()));
                self.parse_case_clauses(items)?;
                items.push(BodyItem::Leave);
                Ok(())
            }
            Some(Token::Return) | Some(Token::Go) | Some(Token::Defer) => {
                self.advance();
                if !self.at_statement_end() {
                    let exprs = self.parse_expression_list()?;
                    items.extend(exprs.into_iter().map(BodyItem::Expr));
                }
                Ok(())
            }
            Some(Token::Break) | Some(Token::Continue) | Some(Token::Goto) => {
                self.advance();
                if matches!(self.current_token(), Some(Token::Identifier(_))) {
                    self.advance();
                }
                Ok(())
            }
            Some(Token::Fallthrough) => {
                self.advance();
                Ok(())
            }
            // ラベル
            Some(Token::Identifier(_)) if matches!(self.peek(1), Some(Token::Colon)) => {
                self.advance();
                self.advance();
                self.skip_semicolons();
                if self.check(&Token::RightBrace) {
                    return Ok(());
                }
                self.parse_statement(items)
            }
            _ => self.parse_simple_statement(items),
        }
    }

    fn at_statement_end(&self) -> bool {
        self.is_at_end()
            || self.check(&Token::Semicolon)
            || self.check(&Token::RightBrace)
    }

    /// `var (...)` の各行を解析
    fn parse_grouped_locals(&mut self) -> ParseResult<Vec<ValueDecl>> {
        if self.match_token(&Token::LeftParen) {
            let mut specs = Vec::new();
            self.skip_semicolons();
            while !self.check(&Token::RightParen) && !self.is_at_end() {
                specs.push(self.parse_value_spec()?);
                self.expect_terminator()?;
                self.skip_semicolons();
            }
            self.expect(Token::RightParen)?;
            Ok(specs)
        } else {
            Ok(vec![self.parse_value_spec()?])
        }
    }

    /// 文の終端直前まで読み飛ばす
    fn skip_statement_body(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.current_token() {
            match token {
                Token::LeftParen | Token::LeftBracket | Token::LeftBrace => depth += 1,
                Token::RightParen | Token::RightBracket | Token::RightBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                }
                Token::Semicolon if depth == 0 => return,
                _ => {}
            }
            self.advance();
        }
    }

    /// ヘッダ部分（複合リテラル禁止）を解析する
    fn in_header<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        let saved = self.no_composite;
        self.no_composite = true;
        let result = f(self);
        self.no_composite = saved;
        result
    }

    fn parse_if(&mut self, items: &mut Vec<BodyItem>) -> ParseResult<()> {
        self.expect(Token::If)?;
        items.push(BodyItem::Enter(Vec::new()));

        self.in_header(|p| {
            p.parse_simple_statement(items)?;
            if p.match_token(&Token::Semicolon) {
                p.parse_simple_statement(items)?;
            }
            Ok(())
        })?;
        self.push_nested_block(items)?;

        if self.match_token(&Token::Else) {
            if self.check(&Token::If) {
                self.parse_if(items)?;
            } else {
                self.push_nested_block(items)?;
            }
        }

        items.push(BodyItem::Leave);
        Ok(())
    }

    fn parse_for(&mut self, items: &mut Vec<BodyItem>) -> ParseResult<()> {
        self.expect(Token::For)?;
        items.push(BodyItem::Enter(Vec::new()));

        if !self.check(&Token::LeftBrace) {
            self.in_header(|p| {
                if !p.check(&Token::Semicolon) {
                    p.parse_simple_statement(items)?;
                }
                if p.match_token(&Token::Semicolon) {
                    // 条件
                    if !p.check(&Token::Semicolon) {
                        p.parse_simple_statement(items)?;
                    }
                    p.expect(Token::Semicolon)?;
                    // 後処理
                    if !p.check(&Token::LeftBrace) {
                        p.parse_simple_statement(items)?;
                    }
                }
                Ok(())
            })?;
        }
        self.push_nested_block(items)?;

        items.push(BodyItem::Leave);
        Ok(())
    }

    fn parse_switch(&mut self, items: &mut Vec<BodyItem>) -> ParseResult<()> {
        self.expect(Token::Switch)?;
        items.push(BodyItem::Enter(Vec::new()));

        if !self.check(&Token::LeftBrace) {
            self.in_header(|p| {
                if !p.check(&Token::Semicolon) {
                    p.parse_simple_statement(items)?;
                }
                if p.match_token(&Token::Semicolon) && !p.check(&Token::LeftBrace) {
                    p.parse_simple_statement(items)?;
                }
                Ok(())
            })?;
        }
        self.parse_case_clauses(items)?;

        items.push(BodyItem::Leave);
        Ok(())
    }

    /// `{ case ...: ... default: ... }`
    fn parse_case_clauses(&mut self, items: &mut Vec<BodyItem>) -> ParseResult<()> {
        self.expect(Token::LeftBrace)?;
        loop {
            self.skip_semicolons();
            match self.current_token() {
                Some(Token::Case) => {
                    self.advance();
                    items.push(BodyItem::Enter(Vec::new()));
                    self.parse_simple_statement(items)?;
                    self.expect(Token::Colon)?;
                }
                Some(Token::Default) => {
                    self.advance();
                    self.expect(Token::Colon)?;
                    items.push(BodyItem::Enter(Vec::new()));
                }
                _ => break,
            }
            self.parse_statement_list(items);
            items.push(BodyItem::Leave);
        }
        self.expect(Token::RightBrace)?;
        Ok(())
    }

    fn push_nested_block(&mut self, items: &mut Vec<BodyItem>) -> ParseResult<()> {
        items.push(BodyItem::Enter(Vec::new()));
        items.extend(self.parse_block()?);
        items.push(BodyItem::Leave);
        Ok(())
    }

    /// 式文、代入、短い変数宣言、`range`
    fn parse_simple_statement(&mut self, items: &mut Vec<BodyItem>) -> ParseResult<()> {
        if self.match_token(&Token::Range) {
            let target = self.parse_expression_internal()?;
            items.push(BodyItem::Expr(target));
            return Ok(());
        }

        let start = self.current_span().start;
        let lhs = self.parse_expression_list()?;

        match self.current_token() {
            Some(Token::Define) => {
                self.advance();
                let names = lhs
                    .iter()
                    .map(|e| match &e.kind {
                        ExprKind::Ident(name) => Ok(name.clone()),
                        _ => Err(self.error("`:=` の左辺は識別子でなければなりません".to_string())),
                    })
                    .collect::<ParseResult<Vec<_>>>()?;

                if self.match_token(&Token::Range) {
                    let target = self.parse_expression_internal()?;
                    let span = self.span_from(start);
                    items.push(BodyItem::Expr(target.clone()));
                    for (position, name) in names.into_iter().enumerate() {
                        let value = Expr::new(
                            ExprKind::Range(Box::new(target.clone()), position),
                            target.span,
                        );
                        push_local(items, name, None, Some(value), span);
                    }
                    return Ok(());
                }

                let rhs = self.parse_expression_list()?;
                let span = self.span_from(start);
                if rhs.len() == names.len() {
                    for (name, value) in names.into_iter().zip(rhs) {
                        push_local(items, name, None, Some(value), span);
                    }
                } else {
                    // `a, b := f()` の型は追跡しない
                    items.extend(rhs.into_iter().map(BodyItem::Expr));
                    for name in names {
                        push_local(items, name, None, None, span);
                    }
                }
            }
            Some(Token::Assign) => {
                self.advance();
                items.extend(lhs.into_iter().map(BodyItem::Expr));
                if self.match_token(&Token::Range) {
                    let target = self.parse_expression_internal()?;
                    items.push(BodyItem::Expr(target));
                } else {
                    let rhs = self.parse_expression_list()?;
                    items.extend(rhs.into_iter().map(BodyItem::Expr));
                }
            }
            Some(token) if token.is_assign_op() => {
                self.advance();
                items.extend(lhs.into_iter().map(BodyItem::Expr));
                let rhs = self.parse_expression_internal()?;
                items.push(BodyItem::Expr(rhs));
            }
            Some(Token::Increment) | Some(Token::Decrement) => {
                self.advance();
                items.extend(lhs.into_iter().map(BodyItem::Expr));
            }
            Some(Token::Arrow) => {
                self.advance();
                items.extend(lhs.into_iter().map(BodyItem::Expr));
                let value = self.parse_expression_internal()?;
                items.push(BodyItem::Expr(value));
            }
            _ => items.extend(lhs.into_iter().map(BodyItem::Expr)),
        }
        Ok(())
    }
}

fn push_local(
    items: &mut Vec<BodyItem>,
    name: String,
    ty: Option<TypeExpr>,
    value: Option<Expr>,
    span: Span,
) {
    if name == "_" {
        // `range` の対象は既に式文として積まれている
        if let Some(value) = value.filter(|v| !matches!(v.kind, ExprKind::Range(..))) {
            items.push(BodyItem::Expr(value));
        }
        return;
    }
    items.push(BodyItem::Local(LocalDecl {
        name,
        ty,
        value,
        span,
    }));
}

/// `var a, b T = x, y` をローカル宣言に展開する
fn push_value_spec(items: &mut Vec<BodyItem>, spec: ValueDecl) {
    let ValueDecl {
        names,
        ty,
        values,
        span,
    } = spec;

    if values.len() == names.len() {
        for (name, value) in names.into_iter().zip(values) {
            push_local(items, name, ty.clone(), Some(value), span);
        }
    } else {
        items.extend(values.into_iter().map(BodyItem::Expr));
        for name in names {
            push_local(items, name, ty.clone(), None, span);
        }
    }
}
