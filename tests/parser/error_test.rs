//! 構文エラーのパーサーテスト

use super::*;
use shapederive::error::ParserError;

#[test]
fn test_missing_package_clause() {
    assert_parse_error(
        r#"
        func main() {}
        "#,
    );
}

#[test]
fn test_import_after_declaration() {
    assert_parse_error(
        r#"
        package main

        var x int
        import "fmt"
        "#,
    );
}

#[test]
fn test_broken_struct_declaration() {
    let result = parse_source(
        r#"
        package main

        type Point struct {
            X int,
        }
        "#,
    );
    assert!(matches!(result, Err(ParserError::UnexpectedToken { .. })));
}

#[test]
fn test_missing_closing_brace() {
    assert_parse_error(
        r#"
        package main

        func main() {
            x := 1
        "#,
    );
}

#[test]
fn test_unparseable_statement_is_skipped() {
    // 本体の解析できない文は読み飛ばし、後続の呼び出しは失われない
    let source = r#"
    package main

    func main() {
        a b c
        deriveCompareInt(1, 2)
    }
    "#;

    let file = assert_parse_success(source);
    assert_eq!(
        callee_names(find_func(&file, "main")),
        vec!["deriveCompareInt"]
    );
}

#[test]
fn test_error_spans_point_into_source() {
    let source = "package main\n\ntype T struct { X int, }\n";
    let Err(ParserError::UnexpectedToken { span, .. }) = parse_source(source) else {
        panic!("Expected unexpected token error");
    };
    assert_eq!(&source[span.start..span.end], ",");
}
