//! トークン定義

use logos::{Lexer as LogosLexer, Logos};
use std::fmt;

/// Goサブセットのトークン型
#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(skip r"[ \t\f\r]+")] // 空白文字をスキップ（改行以外）
pub enum Token {
    // キーワード
    #[token("package")]
    Package,
    #[token("import")]
    Import,
    #[token("type")]
    Type,
    #[token("struct")]
    Struct,
    #[token("interface")]
    Interface,
    #[token("map")]
    Map,
    #[token("chan")]
    Chan,
    #[token("func")]
    Func,
    #[token("var")]
    Var,
    #[token("const")]
    Const,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("for")]
    For,
    #[token("range")]
    Range,
    #[token("switch")]
    Switch,
    #[token("select")]
    Select,
    #[token("case")]
    Case,
    #[token("default")]
    Default,
    #[token("return")]
    Return,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("fallthrough")]
    Fallthrough,
    #[token("goto")]
    Goto,
    #[token("go")]
    Go,
    #[token("defer")]
    Defer,

    // 識別子（キーワードより後に定義）
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_owned(), priority = 1)]
    Identifier(String),

    // 数値リテラル
    #[regex(r"[0-9][0-9_]*", parse_decimal)]
    #[regex(r"0[xX][0-9a-fA-F_]+", parse_hex)]
    #[regex(r"0[oO][0-7_]+", parse_octal)]
    #[regex(r"0[bB][01_]+", parse_binary)]
    Integer(u64),

    #[regex(r"[0-9][0-9_]*\.[0-9_]*([eE][+-]?[0-9]+)?", |lex| lex.slice().to_owned())]
    #[regex(r"\.[0-9][0-9_]*([eE][+-]?[0-9]+)?", |lex| lex.slice().to_owned())]
    #[regex(r"[0-9][0-9_]*[eE][+-]?[0-9]+", |lex| lex.slice().to_owned())]
    Float(String),

    #[regex(r"([0-9][0-9_]*(\.[0-9_]*)?([eE][+-]?[0-9]+)?)i", |lex| lex.slice().to_owned())]
    Imaginary(String),

    // 文字・文字列リテラル
    #[regex(r"'(\\.|[^'\\\n])+'", |lex| lex.slice().to_owned())]
    Rune(String),

    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| {
        let s = lex.slice();
        unescape_string(&s[1..s.len() - 1])
    })]
    String(String),

    #[regex(r"`[^`]*`", |lex| {
        let s = lex.slice();
        s[1..s.len() - 1].to_owned()
    })]
    RawString(String),

    // 演算子
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("&")]
    Ampersand,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("<<")]
    ShiftLeft,
    #[token(">>")]
    ShiftRight,
    #[token("&^")]
    AndNot,
    #[token("+=")]
    PlusAssign,
    #[token("-=")]
    MinusAssign,
    #[token("*=")]
    StarAssign,
    #[token("/=")]
    SlashAssign,
    #[token("%=")]
    PercentAssign,
    #[token("&=")]
    AmpersandAssign,
    #[token("|=")]
    PipeAssign,
    #[token("^=")]
    CaretAssign,
    #[token("<<=")]
    ShiftLeftAssign,
    #[token(">>=")]
    ShiftRightAssign,
    #[token("&^=")]
    AndNotAssign,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("<-")]
    Arrow,
    #[token("++")]
    Increment,
    #[token("--")]
    Decrement,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("=")]
    Assign,
    #[token(":=")]
    Define,
    #[token("!")]
    Not,
    #[token("~")]
    Tilde,
    #[token("...")]
    Ellipsis,

    // 区切り文字
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,
    #[token("[")]
    LeftBracket,
    #[token("]")]
    RightBracket,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,

    // 改行（セミコロン自動挿入に使う）
    #[regex(r"\n")]
    Newline,

    // コメント（スキップ）
    #[regex(r"//[^\n]*", logos::skip)]
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/", logos::skip)]
    // 認識できない入力
    Error,
}

impl Token {
    /// 行末に来たときにセミコロンを自動挿入するトークンか
    pub fn ends_statement(&self) -> bool {
        matches!(
            self,
            Token::Identifier(_)
                | Token::Integer(_)
                | Token::Float(_)
                | Token::Imaginary(_)
                | Token::Rune(_)
                | Token::String(_)
                | Token::RawString(_)
                | Token::Return
                | Token::Break
                | Token::Continue
                | Token::Fallthrough
                | Token::Increment
                | Token::Decrement
                | Token::RightParen
                | Token::RightBracket
                | Token::RightBrace
        )
    }

    /// 代入演算子か
    pub fn is_assign_op(&self) -> bool {
        matches!(
            self,
            Token::Assign
                | Token::PlusAssign
                | Token::MinusAssign
                | Token::StarAssign
                | Token::SlashAssign
                | Token::PercentAssign
                | Token::AmpersandAssign
                | Token::PipeAssign
                | Token::CaretAssign
                | Token::ShiftLeftAssign
                | Token::ShiftRightAssign
                | Token::AndNotAssign
        )
    }

    /// 二項演算子か
    pub fn is_binary_op(&self) -> bool {
        matches!(
            self,
            Token::Plus
                | Token::Minus
                | Token::Star
                | Token::Slash
                | Token::Percent
                | Token::Ampersand
                | Token::Pipe
                | Token::Caret
                | Token::ShiftLeft
                | Token::ShiftRight
                | Token::AndNot
                | Token::AndAnd
                | Token::OrOr
                | Token::EqEq
                | Token::NotEq
                | Token::Lt
                | Token::LtEq
                | Token::Gt
                | Token::GtEq
        )
    }
}

fn strip_underscores(s: &str) -> String {
    s.chars().filter(|c| *c != '_').collect()
}

fn parse_decimal(lex: &mut LogosLexer<Token>) -> Option<u64> {
    let digits = strip_underscores(lex.slice());
    // 先頭0のみの旧式8進表記
    if digits.len() > 1 && digits.starts_with('0') {
        return u64::from_str_radix(&digits[1..], 8).ok();
    }
    digits.parse().ok()
}

fn parse_hex(lex: &mut LogosLexer<Token>) -> Option<u64> {
    u64::from_str_radix(&strip_underscores(&lex.slice()[2..]), 16).ok()
}

fn parse_octal(lex: &mut LogosLexer<Token>) -> Option<u64> {
    u64::from_str_radix(&strip_underscores(&lex.slice()[2..]), 8).ok()
}

fn parse_binary(lex: &mut LogosLexer<Token>) -> Option<u64> {
    u64::from_str_radix(&strip_underscores(&lex.slice()[2..]), 2).ok()
}

/// 文字列リテラルのエスケープを解除
fn unescape_string(s: &str) -> String {
    let mut result = String::new();
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some('\\') => result.push('\\'),
                Some('"') => result.push('"'),
                Some('0') => result.push('\0'),
                Some(c) => {
                    result.push('\\');
                    result.push(c);
                }
                None => result.push('\\'),
            }
        } else {
            result.push(ch);
        }
    }

    result
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier(s) => write!(f, "識別子 `{}`", s),
            Token::Integer(v) => write!(f, "整数 {}", v),
            Token::Float(s) | Token::Imaginary(s) | Token::Rune(s) => write!(f, "`{}`", s),
            Token::String(s) => write!(f, "\"{}\"", s),
            Token::RawString(s) => write!(f, "`{}`", s),
            Token::Semicolon => write!(f, "`;`"),
            Token::Newline => write!(f, "改行"),
            _ => write!(f, "{:?}", self),
        }
    }
}
