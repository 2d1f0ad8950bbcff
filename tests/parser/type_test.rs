//! 型構文のパーサーテスト

use super::*;
use pretty_assertions::assert_eq;
use shapederive::lexer::Lexer;
use shapederive::parser::Parser;
use test_case::test_case;

fn parse_type(source: &str) -> TypeExpr {
    let tokens = Lexer::new(source).collect_tokens();
    Parser::new(tokens)
        .parse_type_expr()
        .expect("type should parse")
}

#[test]
fn test_map_of_slices() {
    let ty = parse_type("map[string][]int");
    let TypeExprKind::Map(key, value) = ty.kind else {
        panic!("Expected map type");
    };
    assert_eq!(key.kind, TypeExprKind::Name("string".to_string()));
    assert!(matches!(value.kind, TypeExprKind::Slice(_)));
}

#[test]
fn test_array_with_constant_length() {
    let ty = parse_type("[N]*Node");
    let TypeExprKind::Array(len, elem) = ty.kind else {
        panic!("Expected array type");
    };
    assert_eq!(len, ArrayLen::Const("N".to_string()));
    assert!(matches!(elem.kind, TypeExprKind::Pointer(_)));
}

#[test]
fn test_qualified_type() {
    let ty = parse_type("time.Duration");
    assert_eq!(
        ty.kind,
        TypeExprKind::Qualified("time".to_string(), "Duration".to_string())
    );
}

#[test_case("chan int", ChanDir::Both ; "bidirectional")]
#[test_case("chan<- int", ChanDir::Send ; "send only")]
#[test_case("<-chan int", ChanDir::Recv ; "receive only")]
fn test_channel_directions(source: &str, expected: ChanDir) {
    let ty = parse_type(source);
    assert!(matches!(ty.kind, TypeExprKind::Chan(dir, _) if dir == expected));
}

#[test]
fn test_interface_contents_are_skipped() {
    let ty = parse_type("interface { Compare(other int) int; String() string }");
    assert_eq!(ty.kind, TypeExprKind::Interface);
}

#[test]
fn test_func_type() {
    let ty = parse_type("func(int, ...string) (bool, error)");
    let TypeExprKind::Func(signature) = ty.kind else {
        panic!("Expected func type");
    };
    assert_eq!(signature.params.len(), 2);
    assert!(signature.params[1].variadic);
    assert_eq!(signature.results.len(), 2);
}

#[test]
fn test_generic_types_are_rejected() {
    assert_parse_error(
        r#"
        package main

        type List[T any] struct { items []T }
        "#,
    );
}
