//! 生成エラーのテスト
//!
//! どのエラーでも出力は作られない（`generate` が `Err` を返す）。

use super::*;
use pretty_assertions::assert_eq;
use test_case::test_case;
use shapederive::error::{InputError, ResolutionError, UnsupportedError};

#[test]
fn test_arity_mismatch() {
    let source = r#"
package main

func main() {
	deriveCompareInt(1)
}
"#;
    let err = assert_generate_error(source);
    match err {
        DeriveError::Input(InputError::ArityMismatch {
            callee,
            expected,
            found,
            ..
        }) => {
            assert_eq!(callee, "deriveCompareInt");
            assert_eq!(expected, 2);
            assert_eq!(found, 1);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_argument_type_mismatch() {
    let source = r#"
package main

func main() {
	deriveCompareX(1, "a")
}
"#;
    let err = assert_generate_error(source);
    match err {
        DeriveError::Input(InputError::ArgumentTypeMismatch { left, right, .. }) => {
            assert_eq!(left, "int");
            assert_eq!(right, "string");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_struct_tags_take_part_in_identity() {
    let source = r#"
package main

func main() {
	var t struct {
		A int `json:"a"`
	}
	var u struct{ A int }
	deriveCompareX(t, u)
}
"#;
    let err = assert_generate_error(source);
    match err {
        DeriveError::Input(InputError::ArgumentTypeMismatch { left, right, .. }) => {
            assert_eq!(left, r#"struct{A int "json:\"a\""}"#);
            assert_eq!(right, "struct{A int}");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_two_names_for_one_type() {
    let source = r#"
package main

func main() {
	deriveCompareA(1, 2)
	deriveCompareB(3, 4)
}
"#;
    let err = assert_generate_error(source);
    match err {
        DeriveError::Input(InputError::ConflictingName {
            callee, existing, ty, ..
        }) => {
            assert_eq!(callee, "deriveCompareB");
            assert_eq!(existing, "deriveCompareA");
            assert_eq!(ty, "int");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_one_name_for_two_types() {
    let source = r#"
package main

func main() {
	deriveCompareX(1, 2)
	deriveCompareX("a", "b")
}
"#;
    let err = assert_generate_error(source);
    match err {
        DeriveError::Input(InputError::NameReused { existing, ty, .. }) => {
            assert_eq!(existing, "int");
            assert_eq!(ty, "string");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_unsupported_field_is_named() {
    let source = r#"
package main

type Pipe struct {
	Name string
	C    chan int
}

func main() {
	var a, b Pipe
	deriveComparePipe(a, b)
}
"#;
    let err = assert_generate_error(source);
    match err {
        DeriveError::Unsupported(UnsupportedError::Field { field, ty, .. }) => {
            assert_eq!(field, "C");
            assert_eq!(ty, "chan int");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_unsupported_top_level_type() {
    let source = r#"
package main

func main() {
	var f, g func()
	deriveCompareFunc(f, g)
}
"#;
    let err = assert_generate_error(source);
    assert!(matches!(
        err,
        DeriveError::Unsupported(UnsupportedError::Type { .. })
    ));
}

#[test]
fn test_untyped_nil_is_rejected() {
    let source = r#"
package main

func main() {
	deriveCompareNil(nil, nil)
}
"#;
    let err = assert_generate_error(source);
    assert!(matches!(err, DeriveError::Unsupported(_)));
}

#[test]
fn test_type_from_other_package() {
    let source = r#"
package main

import "time"

func main() {
	var a, b time.Duration
	deriveCompareDuration(a, b)
}
"#;
    let err = assert_generate_error(source);
    match err {
        DeriveError::Resolution(ResolutionError::UnresolvableType { name }) => {
            assert_eq!(name, "time.Duration");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_undefined_argument() {
    let source = r#"
package main

func main() {
	deriveCompareX(missing, missing)
}
"#;
    let err = assert_generate_error(source);
    match err {
        DeriveError::Resolution(ResolutionError::UndefinedName { name, .. }) => {
            assert_eq!(name, "missing");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_error_spans_point_at_call() {
    let source = "package main\n\nfunc main() {\n\tderiveCompareInt(1)\n}\n";
    let err = assert_generate_error(source);
    let span = err.span().expect("input errors carry a span");
    let start = source.find("deriveCompareInt").unwrap_or_default();
    assert_eq!(span.start, start);
}

#[test]
fn test_import_alias_avoids_package_names() {
    // パッケージに strings という名前があっても生成コードは壊れない
    let source = r#"
package main

var strings = []string{"a"}

func main() {
	deriveCompareS("a", "b")
}
"#;
    let output = assert_generate_success(source);
    assert!(output.contains("\tstrings1 \"strings\"\n"));
    assert!(function(&output, "deriveCompareS")
        .contains("\treturn strings1.Compare(this, that)\n"));
}

#[test_case("cmp", "cmp" ; "same prefix")]
#[test_case("derive", "deriveSortedKeys" ; "compare prefix covers sorted keys")]
#[test_case("deriveCompare", "deriveCompareKeys" ; "sorted keys prefix extends compare")]
#[test_case("", "deriveSortedKeys" ; "empty prefix")]
fn test_overlapping_prefixes_are_rejected(compare: &str, sorted_keys: &str) {
    let source = r#"
package main

func main() {
	deriveSortedKeys(map[string]int{})
}
"#;
    let config = DeriveConfig {
        compare_prefix: compare.to_string(),
        sorted_keys_prefix: sorted_keys.to_string(),
        ..DeriveConfig::default()
    };
    let err = generate_with(source, config).unwrap_err();
    assert!(matches!(err, DeriveError::Config { .. }), "unexpected error: {:?}", err);
}
