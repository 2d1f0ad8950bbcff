//! 統一的なエラーハンドリングモジュール
//!
//! このモジュールは、shapederive全体で使用される統一的なエラー型と
//! エラー報告システムを提供します。生成処理のエラーはすべて実行全体を
//! 中断し、部分的な出力は行いません。

use crate::ast::Span;
use codespan_reporting::diagnostic::{Diagnostic, Label};
use thiserror::Error;

/// shapederiveの統一エラー型
#[derive(Error, Debug, Clone)]
pub enum DeriveError {
    /// レキサーエラー
    #[error("字句解析エラー: {0}")]
    Lexer(#[from] LexerError),

    /// パーサーエラー
    #[error("構文解析エラー: {0}")]
    Parser(#[from] ParserError),

    /// 呼び出し箇所の入力検証エラー
    #[error("入力エラー: {0}")]
    Input(#[from] InputError),

    /// 型解決エラー
    #[error("型解決エラー: {0}")]
    Resolution(#[from] ResolutionError),

    /// 生成できない型の形
    #[error("未対応の型: {0}")]
    Unsupported(#[from] UnsupportedError),

    /// 操作間の依存関係が束縛されていない
    #[error("依存関係エラー: {0}")]
    Binding(#[from] BindingError),

    /// 設定の不備
    #[error("設定エラー: {message}")]
    Config { message: String },

    /// 内部不変条件の違反
    #[error("内部エラー: {message}")]
    Internal { message: String },

    /// ファイルI/Oエラー
    #[error("ファイル操作エラー: {0}")]
    Io(String),

    /// その他のエラー
    #[error("{0}")]
    Other(String),
}

/// レキサーエラーの詳細
#[derive(Error, Debug, Clone)]
pub enum LexerError {
    #[error("認識できないトークン: '{token}'")]
    UnrecognizedToken { token: String, span: Span },
}

/// パーサーエラーの詳細
#[derive(Error, Debug, Clone)]
pub enum ParserError {
    #[error("予期しないトークン: {expected}を期待しましたが、{found}が見つかりました")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("予期しない入力の終了: {expected}を期待していました")]
    UnexpectedEof { expected: String, span: Span },

    #[error("構文エラー: {message}")]
    SyntaxError { message: String, span: Span },
}

/// 呼び出し箇所の検証エラー
#[derive(Error, Debug, Clone)]
pub enum InputError {
    #[error("{callee} は{expected}個の引数を取りますが、{found}個の引数が渡されました")]
    ArityMismatch {
        callee: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("{callee} の2つの引数の型が異なります: {left} != {right}")]
    ArgumentTypeMismatch {
        callee: String,
        left: String,
        right: String,
        span: Span,
    },

    #[error("{callee} の引数はマップ型である必要がありますが、{found} が渡されました")]
    ExpectedMap {
        callee: String,
        found: String,
        span: Span,
    },

    #[error("型 {ty} には既に関数名 {existing} が割り当てられているため、{callee} は使えません")]
    ConflictingName {
        callee: String,
        existing: String,
        ty: String,
        span: Span,
    },

    #[error("関数名 {callee} は型 {existing} と型 {ty} の両方に使われています")]
    NameReused {
        callee: String,
        existing: String,
        ty: String,
        span: Span,
    },
}

/// 型解決エラー
#[derive(Error, Debug, Clone)]
pub enum ResolutionError {
    #[error("未定義の名前: {name}")]
    UndefinedName { name: String, span: Span },

    #[error("型 {name} を解決できません")]
    UnresolvableType { name: String },

    #[error("不正な再帰型: {name}")]
    InvalidRecursiveType { name: String },

    #[error("式 {expr} の型を決定できません")]
    UntypedExpression { expr: String, span: Span },

    #[error("型 {ty} にフィールド {field} がありません")]
    UnknownField {
        ty: String,
        field: String,
        span: Span,
    },

    #[error("配列の長さ {name} を定数として評価できません")]
    InvalidArrayLength { name: String, span: Span },
}

/// 生成できない型の形
#[derive(Error, Debug, Clone)]
pub enum UnsupportedError {
    #[error("{operation} は型 {ty} に対応していません")]
    Type { operation: String, ty: String },

    #[error("{operation} はフィールド {field} の型 {ty} に対応していません")]
    Field {
        operation: String,
        field: String,
        ty: String,
    },
}

/// 操作間依存関係のエラー
#[derive(Error, Debug, Clone)]
pub enum BindingError {
    #[error("{operation} が必要とする役割 {role} が束縛されていません")]
    Unbound { operation: String, role: String },

    #[error("役割 {role} は既に {existing} に束縛されています")]
    AlreadyBound { role: String, existing: String },
}

impl DeriveError {
    /// エラーに結び付いたソース位置
    pub fn span(&self) -> Option<Span> {
        match self {
            DeriveError::Lexer(LexerError::UnrecognizedToken { span, .. }) => Some(*span),
            DeriveError::Parser(
                ParserError::UnexpectedToken { span, .. }
                | ParserError::UnexpectedEof { span, .. }
                | ParserError::SyntaxError { span, .. },
            ) => Some(*span),
            DeriveError::Input(
                InputError::ArityMismatch { span, .. }
                | InputError::ArgumentTypeMismatch { span, .. }
                | InputError::ExpectedMap { span, .. }
                | InputError::ConflictingName { span, .. }
                | InputError::NameReused { span, .. },
            ) => Some(*span),
            DeriveError::Resolution(
                ResolutionError::UndefinedName { span, .. }
                | ResolutionError::UntypedExpression { span, .. }
                | ResolutionError::UnknownField { span, .. }
                | ResolutionError::InvalidArrayLength { span, .. },
            ) => Some(*span),
            _ => None,
        }
    }
}

/// エラー情報とソースコードの位置情報を含むエラー
#[derive(Debug, Clone)]
pub struct DiagnosticError {
    pub error: DeriveError,
}

impl DiagnosticError {
    pub fn new(error: DeriveError) -> Self {
        Self { error }
    }

    /// codespan-reportingのDiagnosticに変換
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        let message = match &self.error {
            DeriveError::Lexer(e) => e.to_string(),
            DeriveError::Parser(e) => e.to_string(),
            DeriveError::Input(e) => e.to_string(),
            DeriveError::Resolution(e) => e.to_string(),
            DeriveError::Unsupported(e) => e.to_string(),
            DeriveError::Binding(e) => e.to_string(),
            other => other.to_string(),
        };

        let label_message = match &self.error {
            DeriveError::Lexer(_) => "ここに不正なトークンがあります",
            DeriveError::Input(InputError::ArgumentTypeMismatch { .. }) => {
                "引数の型は同一である必要があります"
            }
            DeriveError::Input(_) => "この呼び出しは生成対象として不正です",
            DeriveError::Resolution(ResolutionError::UndefinedName { .. }) => {
                "この名前は定義されていません"
            }
            _ => "",
        };

        let labels = match self.error.span() {
            Some(span) => {
                let label = Label::primary(span.file, span.start..span.end);
                if label_message.is_empty() {
                    vec![label]
                } else {
                    vec![label.with_message(label_message)]
                }
            }
            None => vec![],
        };

        Diagnostic::error().with_message(message).with_labels(labels)
    }
}

/// 複数のエラーを蓄積するためのコレクター
#[derive(Debug, Default)]
pub struct ErrorCollector {
    errors: Vec<DiagnosticError>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// エラーを追加
    pub fn add_error(&mut self, error: DeriveError) {
        self.errors.push(DiagnosticError::new(error));
    }

    /// エラーがあるかどうか
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// エラーの数
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// すべてのエラーを取得
    pub fn errors(&self) -> &[DiagnosticError] {
        &self.errors
    }

    /// 最初のエラーを取り出す
    pub fn into_first_error(self) -> Option<DeriveError> {
        self.errors.into_iter().next().map(|e| e.error)
    }
}

/// Result型のエイリアス
pub type DeriveResult<T> = Result<T, DeriveError>;

impl From<std::io::Error> for DeriveError {
    fn from(e: std::io::Error) -> Self {
        DeriveError::Io(e.to_string())
    }
}

impl From<tempfile::PersistError> for DeriveError {
    fn from(e: tempfile::PersistError) -> Self {
        DeriveError::Io(e.to_string())
    }
}
