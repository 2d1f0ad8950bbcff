//! パーサーテストの共通モジュール
//!
//! パーサーテストで使用する共通のヘルパー関数を定義する。

use shapederive::ast::*;
use shapederive::lexer::Lexer;
use shapederive::parser::{ParseError, Parser};

/// ソースコードを解析してASTを取得するヘルパー関数
pub fn parse_source(source: &str) -> Result<SourceFile, ParseError> {
    let lexer = Lexer::new(source);
    let tokens: Vec<_> = lexer.collect_tokens();
    let mut parser = Parser::new(tokens);
    parser.parse()
}

/// 解析に成功することを確認するヘルパー関数
pub fn assert_parse_success(source: &str) -> SourceFile {
    parse_source(source).expect("Parsing should succeed")
}

/// 解析に失敗することを確認するヘルパー関数
pub fn assert_parse_error(source: &str) {
    assert!(parse_source(source).is_err(), "Parsing should fail");
}

/// 名前で関数宣言を探す
pub fn find_func<'a>(file: &'a SourceFile, name: &str) -> &'a FuncDecl {
    file.decls
        .iter()
        .find_map(|decl| match decl {
            Decl::Func(func) if func.name == name => Some(func),
            _ => None,
        })
        .expect("function should exist")
}

/// 関数本体のローカル宣言の名前を順に集める
pub fn local_names(func: &FuncDecl) -> Vec<String> {
    func.body
        .iter()
        .flatten()
        .filter_map(|item| match item {
            BodyItem::Local(local) => Some(local.name.clone()),
            _ => None,
        })
        .collect()
}

/// 関数本体（入れ子の関数リテラルを含む）の呼び出し先の名前を前順に集める
pub fn callee_names(func: &FuncDecl) -> Vec<String> {
    let mut names = Vec::new();
    for item in func.body.iter().flatten() {
        collect_item(item, &mut names);
    }
    names
}

fn collect_item(item: &BodyItem, names: &mut Vec<String>) {
    match item {
        BodyItem::Local(LocalDecl {
            value: Some(value), ..
        }) => {
            if !matches!(value.kind, ExprKind::Range(..)) {
                collect_expr(value, names)
            }
        }
        BodyItem::Expr(expr) => collect_expr(expr, names),
        _ => {}
    }
}

fn collect_expr(expr: &Expr, names: &mut Vec<String>) {
    match &expr.kind {
        ExprKind::Call(call) => {
            if let Some(name) = call.callee_name() {
                names.push(name.to_string());
            }
            collect_expr(&call.callee, names);
            for arg in &call.args {
                collect_expr(arg, names);
            }
        }
        ExprKind::FuncLit(_, body) => {
            for item in body {
                collect_item(item, names);
            }
        }
        ExprKind::Unary(_, inner)
        | ExprKind::Paren(inner)
        | ExprKind::Selector(inner, _)
        | ExprKind::SliceExpr(inner)
        | ExprKind::TypeAssert(inner, _) => collect_expr(inner, names),
        ExprKind::Binary(_, left, right)
        | ExprKind::Index(left, right)
        | ExprKind::KeyValue(left, right) => {
            collect_expr(left, names);
            collect_expr(right, names);
        }
        ExprKind::Composite(_, elems) | ExprKind::ElidedComposite(elems) => {
            for elem in elems {
                collect_expr(elem, names);
            }
        }
        _ => {}
    }
}

// サブモジュールの宣言
#[cfg(test)]
mod body_test;
#[cfg(test)]
mod declaration_test;
#[cfg(test)]
mod error_test;
#[cfg(test)]
mod type_test;
