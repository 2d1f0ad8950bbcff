//! 関数本体のパーサーテスト

use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_short_variable_declarations() {
    let source = r#"
    package main

    func main() {
        a := Point{X: 1}
        var b, c Point
        _ = deriveComparePoint(a, b)
    }
    "#;

    let file = assert_parse_success(source);
    let func = find_func(&file, "main");

    assert_eq!(local_names(func), vec!["a", "b", "c"]);
    assert_eq!(callee_names(func), vec!["deriveComparePoint"]);
}

#[test]
fn test_if_header_introduces_scope() {
    let source = r#"
    package main

    func main() {
        if c := deriveCompareInt(1, 2); c != 0 {
            println(c)
        } else {
            panic(c)
        }
    }
    "#;

    let file = assert_parse_success(source);
    let func = find_func(&file, "main");
    let body = func.body.as_ref().expect("body");

    assert!(matches!(body.first(), Some(BodyItem::Enter(_))));
    assert!(matches!(body.last(), Some(BodyItem::Leave)));
    let enters = body.iter().filter(|i| matches!(i, BodyItem::Enter(_))).count();
    let leaves = body.iter().filter(|i| matches!(i, BodyItem::Leave)).count();
    assert_eq!(enters, leaves);
    assert_eq!(callee_names(func), vec!["deriveCompareInt", "println", "panic"]);
}

#[test]
fn test_range_clause_binds_key_and_value() {
    let source = r#"
    package main

    func main() {
        for i, v := range xs {
            use(i, v)
        }
    }
    "#;

    let file = assert_parse_success(source);
    let func = find_func(&file, "main");
    let body = func.body.as_ref().expect("body");

    let ranges: Vec<_> = body
        .iter()
        .filter_map(|item| match item {
            BodyItem::Local(LocalDecl {
                name,
                value: Some(Expr { kind: ExprKind::Range(_, position), .. }),
                ..
            }) => Some((name.as_str(), *position)),
            _ => None,
        })
        .collect();
    assert_eq!(ranges, vec![("i", 0), ("v", 1)]);
}

#[test]
fn test_composite_literal_not_allowed_in_header() {
    // ヘッダ中の `{` は本体の開始
    let source = r#"
    package main

    func main() {
        for x := range items {
            deriveCompareItem(x, x)
        }
        if v == (Point{}) {
        }
    }
    "#;

    let file = assert_parse_success(source);
    assert_eq!(
        callee_names(find_func(&file, "main")),
        vec!["deriveCompareItem"]
    );
}

#[test]
fn test_function_literal_bodies_are_kept() {
    let source = r#"
    package main

    func main() {
        sort.Slice(xs, func(i, j int) bool {
            return deriveCompareT(xs[i], xs[j]) < 0
        })
    }
    "#;

    let file = assert_parse_success(source);
    assert_eq!(
        callee_names(find_func(&file, "main")),
        vec!["deriveCompareT"]
    );
}

#[test]
fn test_switch_and_select_clauses() {
    let source = r#"
    package main

    func main() {
        switch x := v.(type) {
        case int:
            a(x)
        default:
            b(x)
        }
        select {
        case m := <-ch:
            c(m)
        }
    }
    "#;

    let file = assert_parse_success(source);
    let func = find_func(&file, "main");
    assert_eq!(callee_names(func), vec!["a", "b", "c"]);
    assert_eq!(local_names(func), vec!["x", "m"]);
}

#[test]
fn test_labels_and_branches() {
    let source = r#"
    package main

    func main() {
    outer:
        for {
            break outer
        }
        goto outer
    }
    "#;

    assert_parse_success(source);
}
