//! 宣言のパーサーテスト

use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_minimal_file() {
    let source = r#"
    package main

    func main() {
    }
    "#;

    let file = assert_parse_success(source);

    assert_eq!(file.package.name, "main");
    assert_eq!(file.imports.len(), 0);
    assert_eq!(file.decls.len(), 1);

    let func = find_func(&file, "main");
    assert!(func.receiver.is_none());
    assert!(func.signature.params.is_empty());
    assert_eq!(func.body.as_ref().map(Vec::len), Some(0));
}

#[test]
fn test_imports() {
    let source = r#"
    package main

    import "fmt"
    import (
        str "strings"
        _ "embed"
        "encoding/json"
    )
    "#;

    let file = assert_parse_success(source);

    assert_eq!(file.imports.len(), 4);
    assert_eq!(file.imports[0].path, "fmt");
    assert!(file.imports[0].alias.is_none());
    assert_eq!(file.imports[1].alias.as_deref(), Some("str"));
    assert_eq!(file.imports[1].local_name(), "str");
    assert_eq!(file.imports[2].local_name(), "_");
    assert_eq!(file.imports[3].local_name(), "json");
}

#[test]
fn test_struct_type_declaration() {
    let source = r#"
    package shapes

    type Point struct {
        X, Y  int
        Label string `json:"label"`
        *Inner
    }
    "#;

    let file = assert_parse_success(source);

    let Decl::Type(decl) = &file.decls[0] else {
        panic!("Expected type declaration");
    };
    assert_eq!(decl.name, "Point");
    assert!(!decl.is_alias);

    let TypeExprKind::Struct(fields) = &decl.ty.kind else {
        panic!("Expected struct type");
    };
    assert_eq!(fields.len(), 3);
    assert_eq!(fields[0].names, vec!["X".to_string(), "Y".to_string()]);
    assert_eq!(fields[1].names, vec!["Label".to_string()]);
    assert_eq!(fields[0].tag, None);
    assert_eq!(fields[1].tag.as_deref(), Some(r#"json:"label""#));
    assert!(fields[2].embedded);
    assert_eq!(fields[2].names, vec!["Inner".to_string()]);
}

#[test]
fn test_grouped_type_declarations() {
    let source = r#"
    package shapes

    type (
        Celsius float64
        Alias = Point
        Grid [Size][Size]bool
    )
    "#;

    let file = assert_parse_success(source);

    let names: Vec<_> = file
        .decls
        .iter()
        .filter_map(|decl| match decl {
            Decl::Type(t) => Some((t.name.as_str(), t.is_alias)),
            _ => None,
        })
        .collect();
    assert_eq!(
        names,
        vec![("Celsius", false), ("Alias", true), ("Grid", false)]
    );
}

#[test]
fn test_value_declarations() {
    let source = r#"
    package main

    const Size = 4
    const (
        A = iota
        B
    )
    var grid [Size]int
    var x, y = 1, "two"
    "#;

    let file = assert_parse_success(source);

    assert_eq!(file.decls.len(), 5);
    let Decl::Const(b) = &file.decls[2] else {
        panic!("Expected const declaration");
    };
    assert_eq!(b.names, vec!["B".to_string()]);
    assert!(b.ty.is_none());
    assert!(b.values.is_empty());

    let Decl::Var(xy) = &file.decls[4] else {
        panic!("Expected var declaration");
    };
    assert_eq!(xy.names.len(), 2);
    assert_eq!(xy.values.len(), 2);
}

#[test]
fn test_method_receivers() {
    let source = r#"
    package main

    func (p *Point) Compare(other *Point) int { return 0 }
    func (p Point) String() string { return "" }
    func (Point) Zero() {}
    "#;

    let file = assert_parse_success(source);

    let compare = find_func(&file, "Compare");
    let receiver = compare.receiver.as_ref().expect("receiver");
    assert_eq!(receiver.name.as_deref(), Some("p"));
    assert_eq!(receiver.type_name, "Point");
    assert!(receiver.is_pointer);

    let string = find_func(&file, "String");
    assert!(!string.receiver.as_ref().expect("receiver").is_pointer);

    let zero = find_func(&file, "Zero");
    assert!(zero.receiver.as_ref().expect("receiver").name.is_none());
}

#[test]
fn test_parameter_grouping() {
    let source = r#"
    package main

    func f(a, b int, rest ...string) (n int, err error) { return }
    func g(int, string) {}
    "#;

    let file = assert_parse_success(source);

    let f = find_func(&file, "f");
    let names: Vec<_> = f
        .signature
        .params
        .iter()
        .map(|p| p.name.clone().unwrap_or_default())
        .collect();
    assert_eq!(names, vec!["a", "b", "rest"]);
    assert_eq!(f.signature.params[1].ty.kind, TypeExprKind::Name("int".to_string()));
    assert!(f.signature.params[2].variadic);
    assert_eq!(f.signature.results.len(), 2);

    let g = find_func(&file, "g");
    assert!(g.signature.params.iter().all(|p| p.name.is_none()));
}

#[test]
fn test_function_without_body() {
    let source = r#"
    package main

    func external(x int) int
    "#;

    let file = assert_parse_success(source);
    assert!(find_func(&file, "external").body.is_none());
}
