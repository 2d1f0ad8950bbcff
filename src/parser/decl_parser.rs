//! 宣言の解析

use crate::ast::*;
use crate::lexer::Token;

use super::{ParseResult, Parser};

impl Parser {
    /// パッケージ宣言を解析
    pub(super) fn parse_package_decl(&mut self) -> ParseResult<PackageDecl> {
        let start = self.current_span().start;
        self.expect(Token::Package)?;
        let name = self.expect_identifier()?;
        let span = self.span_from(start);
        self.expect_terminator()?;
        Ok(PackageDecl { name, span })
    }

    /// import宣言を解析（単独・グループ両対応）
    pub(super) fn parse_import_decl(&mut self) -> ParseResult<Vec<Import>> {
        self.expect(Token::Import)?;
        let mut imports = Vec::new();
        if self.match_token(&Token::LeftParen) {
            self.skip_semicolons();
            while !self.check(&Token::RightParen) && !self.is_at_end() {
                imports.push(self.parse_import_spec()?);
                self.expect_terminator()?;
                self.skip_semicolons();
            }
            self.expect(Token::RightParen)?;
        } else {
            imports.push(self.parse_import_spec()?);
        }
        self.expect_terminator()?;
        Ok(imports)
    }

    fn parse_import_spec(&mut self) -> ParseResult<Import> {
        let start = self.current_span().start;
        let alias = match self.current_token() {
            Some(Token::Identifier(name)) => {
                let name = name.clone();
                self.advance();
                Some(name)
            }
            Some(Token::Dot) => {
                self.advance();
                Some(".".to_string())
            }
            _ => None,
        };
        let path = self.expect_string()?;
        Ok(Import {
            path,
            alias,
            span: self.span_from(start),
        })
    }

    /// トップレベル宣言を解析
    pub(super) fn parse_top_level_decl(&mut self) -> ParseResult<Vec<Decl>> {
        match self.current_token() {
            Some(Token::Type) => {
                self.advance();
                let decls = self.parse_grouped(|p| p.parse_type_spec())?;
                Ok(decls.into_iter().map(Decl::Type).collect())
            }
            Some(Token::Var) => {
                self.advance();
                let decls = self.parse_grouped(|p| p.parse_value_spec())?;
                Ok(decls.into_iter().map(Decl::Var).collect())
            }
            Some(Token::Const) => {
                self.advance();
                let decls = self.parse_grouped(|p| p.parse_value_spec())?;
                Ok(decls.into_iter().map(Decl::Const).collect())
            }
            Some(Token::Func) => {
                let func = self.parse_func_decl()?;
                self.expect_terminator()?;
                Ok(vec![Decl::Func(func)])
            }
            Some(Token::Import) => Err(self.error(
                "import宣言は他の宣言より前に置く必要があります".to_string(),
            )),
            _ => Err(self.unexpected("宣言")),
        }
    }

    /// `kw spec` または `kw ( spec; spec; ... )` の形を解析
    pub(super) fn parse_grouped<T>(
        &mut self,
        mut spec: impl FnMut(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<Vec<T>> {
        let mut specs = Vec::new();
        if self.match_token(&Token::LeftParen) {
            self.skip_semicolons();
            while !self.check(&Token::RightParen) && !self.is_at_end() {
                specs.push(spec(self)?);
                self.expect_terminator()?;
                self.skip_semicolons();
            }
            self.expect(Token::RightParen)?;
        } else {
            specs.push(spec(self)?);
        }
        self.expect_terminator()?;
        Ok(specs)
    }

    /// `Name T` / `Name = T`
    fn parse_type_spec(&mut self) -> ParseResult<TypeDecl> {
        let start = self.current_span().start;
        let name = self.expect_identifier()?;
        if self.check(&Token::LeftBracket) && matches!(self.peek(1), Some(Token::Identifier(_))) {
            // `type List[T any] ...` と `type Arr [N]int` を区別する
            if !matches!(self.peek(2), Some(Token::RightBracket)) {
                return Err(self.error(format!("ジェネリック型 {} には対応していません", name)));
            }
        }
        let is_alias = self.match_token(&Token::Assign);
        let ty = self.parse_type()?;
        Ok(TypeDecl {
            name,
            is_alias,
            ty,
            span: self.span_from(start),
        })
    }

    /// `a, b T = x, y`
    pub(super) fn parse_value_spec(&mut self) -> ParseResult<ValueDecl> {
        let start = self.current_span().start;
        let mut names = vec![self.expect_identifier()?];
        while self.match_token(&Token::Comma) {
            names.push(self.expect_identifier()?);
        }

        let ty = if self.check(&Token::Assign)
            || self.check(&Token::Semicolon)
            || self.check(&Token::RightParen)
            || self.is_at_end()
        {
            None
        } else {
            Some(self.parse_type()?)
        };

        let mut values = Vec::new();
        if self.match_token(&Token::Assign) {
            values = self.allowing_composite(|p| p.parse_expression_list())?;
        }

        Ok(ValueDecl {
            names,
            ty,
            values,
            span: self.span_from(start),
        })
    }

    /// 関数宣言を解析
    fn parse_func_decl(&mut self) -> ParseResult<FuncDecl> {
        let start = self.current_span().start;
        self.expect(Token::Func)?;

        let receiver = if self.check(&Token::LeftParen) {
            Some(self.parse_receiver()?)
        } else {
            None
        };

        let name = self.expect_identifier()?;
        if self.check(&Token::LeftBracket) {
            return Err(self.error(format!("ジェネリック関数 {} には対応していません", name)));
        }
        let signature = self.parse_signature()?;

        let body = if self.check(&Token::LeftBrace) {
            Some(self.allowing_composite(|p| p.parse_block())?)
        } else {
            None
        };

        Ok(FuncDecl {
            receiver,
            name,
            signature,
            body,
            span: self.span_from(start),
        })
    }

    /// `(this *T)` / `(T)` 形式のレシーバ
    fn parse_receiver(&mut self) -> ParseResult<Receiver> {
        let start = self.current_span().start;
        self.expect(Token::LeftParen)?;

        let name = match (self.current_token(), self.peek(1)) {
            (Some(Token::Identifier(n)), Some(Token::Star | Token::Identifier(_))) => {
                let n = n.clone();
                self.advance();
                Some(n)
            }
            _ => None,
        };
        let is_pointer = self.match_token(&Token::Star);
        let type_name = self.expect_identifier()?;
        self.expect(Token::RightParen)?;

        Ok(Receiver {
            name,
            type_name,
            is_pointer,
            span: self.span_from(start),
        })
    }

    /// 関数シグネチャ（引数と戻り値）
    pub(super) fn parse_signature(&mut self) -> ParseResult<Signature> {
        let params = self.parse_parameters()?;
        let results = if self.check(&Token::LeftParen) {
            self.parse_parameters()?
        } else if self.starts_type() {
            let ty = self.parse_type()?;
            vec![Param {
                name: None,
                ty,
                variadic: false,
            }]
        } else {
            Vec::new()
        };
        Ok(Signature { params, results })
    }

    /// `(a, b int, c ...string)` または `(int, string)`
    fn parse_parameters(&mut self) -> ParseResult<Vec<Param>> {
        self.expect(Token::LeftParen)?;

        // (名前, 型, 可変長) の組を集め、後で名前付きかどうかを判定する
        let mut entries: Vec<(Option<String>, Option<TypeExpr>, bool)> = Vec::new();
        while !self.check(&Token::RightParen) && !self.is_at_end() {
            let named = matches!(self.current_token(), Some(Token::Identifier(_)))
                && !matches!(
                    self.peek(1),
                    Some(Token::Comma | Token::RightParen | Token::Dot)
                );
            if named {
                let name = self.expect_identifier()?;
                let variadic = self.match_token(&Token::Ellipsis);
                let ty = self.parse_type()?;
                entries.push((Some(name), Some(ty), variadic));
            } else {
                let variadic = self.match_token(&Token::Ellipsis);
                let ty = self.parse_type()?;
                entries.push((None, Some(ty), variadic));
            }
            if !self.match_token(&Token::Comma) {
                break;
            }
            self.skip_semicolons();
        }
        self.expect(Token::RightParen)?;

        let any_named = entries.iter().any(|(name, _, _)| name.is_some());
        if !any_named {
            return Ok(entries
                .into_iter()
                .filter_map(|(_, ty, variadic)| ty.map(|ty| Param { name: None, ty, variadic }))
                .collect());
        }

        // `a, b int` の `a` は型ではなく名前: 後続の名前付き引数の型を共有する
        let mut params = Vec::with_capacity(entries.len());
        let mut pending: Vec<String> = Vec::new();
        for (name, ty, variadic) in entries {
            match (name, ty) {
                (Some(name), Some(ty)) => {
                    for shared in pending.drain(..) {
                        params.push(Param {
                            name: Some(shared),
                            ty: ty.clone(),
                            variadic,
                        });
                    }
                    params.push(Param {
                        name: Some(name),
                        ty,
                        variadic,
                    });
                }
                (None, Some(TypeExpr { kind: TypeExprKind::Name(n), .. })) => pending.push(n),
                _ => return Err(self.error("名前付き引数と名前なし引数が混在しています".to_string())),
            }
        }
        if !pending.is_empty() {
            return Err(self.error("引数の型がありません".to_string()));
        }
        Ok(params)
    }
}
