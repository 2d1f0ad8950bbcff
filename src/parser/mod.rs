//! パーサーモジュール
//!
//! このモジュールはトークンを抽象構文木（AST）に解析する責任を持ちます。
//! 再帰下降構文解析を使用します。
//!
//! ## 解析の方針
//!
//! 宣言（`type`、`var`、`const`、`func`のシグネチャ）は厳密に解析し、
//! 構文エラーはそのまま報告します。関数本体は寛容に解析し、
//! 理解できない文は終端まで読み飛ばします：
//!
//! ```go
//! func main() {
//!     var a, b Point
//!     if c := deriveComparePoint(a, b); c != 0 {
//!         select { /* 読み飛ばされても呼び出し以外は失われない */ }
//!     }
//! }
//! ```
//!
//! 本体からはスコープの開閉、ローカル宣言、式文だけを順序どおりに取り出します。

mod decl_parser;
mod expr_parser;
mod parser_impl;
mod stmt_parser;
mod type_parser;

// 公開API
pub use parser_impl::Parser;

use crate::error::ParserError;
pub type ParseError = ParserError;
pub type ParseResult<T> = Result<T, ParseError>;
