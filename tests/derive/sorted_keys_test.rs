//! キー整列関数の生成テスト

use super::*;
use pretty_assertions::assert_eq;
use shapederive::error::InputError;

#[test]
fn test_ordered_keys_use_less_than() {
    let source = r#"
package main

func main() {
	m := map[string]int{}
	for _, k := range deriveSortedKeys(m) {
		println(k)
	}
}
"#;
    let output = assert_generate_success(source);
    let expected = lines(&[
        "func deriveSortedKeys(m map[string]int) []string {",
        "\tkeys := make([]string, 0, len(m))",
        "\tfor key := range m {",
        "\t\tkeys = append(keys, key)",
        "\t}",
        "\tsort.Slice(keys, func(i, j int) bool {",
        "\t\treturn keys[i] < keys[j]",
        "\t})",
        "\treturn keys",
        "}",
    ]);
    assert_eq!(function(&output, "deriveSortedKeys"), expected);
    assert!(output.contains("\t\"sort\"\n"));
    // 比較は要求されていない
    assert!(!output.contains("deriveCompare"));
}

#[test]
fn test_struct_keys_use_comparator() {
    let source = r#"
package main

type Key struct {
	Name string
	ID   int
}

func main() {
	var m map[Key]bool
	deriveSortedKeysByKey(m)
}
"#;
    let output = assert_generate_success(source);
    assert!(function(&output, "deriveSortedKeysByKey")
        .contains("\t\treturn deriveCompareKey(keys[i], keys[j]) < 0\n"));
    assert_eq!(count_functions(&output, "deriveCompareKey"), 1);
    assert_eq!(count_functions(&output, "deriveCompareInt"), 1);
}

#[test]
fn test_named_map_type() {
    let source = r#"
package main

type Index map[int]string

func main() {
	var idx Index
	deriveSortedKeysIndex(idx)
}
"#;
    let output = assert_generate_success(source);
    assert!(output.contains("func deriveSortedKeysIndex(m Index) []int {\n"));
}

#[test]
fn test_shared_name_between_call_and_dependency() {
    // 比較が要求するキー整列関数は、利用者が付けた名前を再利用する
    let source = r#"
package main

func main() {
	var a, b map[string]int
	deriveSortedKeysCounts(a)
	deriveCompareCounts(a, b)
}
"#;
    let output = assert_generate_success(source);
    assert_eq!(count_functions(&output, "deriveSortedKeysCounts"), 1);
    assert!(function(&output, "deriveCompareCounts")
        .contains("\tthiskeys := deriveSortedKeysCounts(this)\n"));
    assert!(!output.contains("deriveSortedKeysMapOfStringToInt"));
}

#[test]
fn test_non_map_argument() {
    let source = r#"
package main

func main() {
	var xs []int
	deriveSortedKeys(xs)
}
"#;
    let err = assert_generate_error(source);
    match err {
        DeriveError::Input(InputError::ExpectedMap { callee, found, .. }) => {
            assert_eq!(callee, "deriveSortedKeys");
            assert_eq!(found, "[]int");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_sorted_keys_arity() {
    let source = r#"
package main

func main() {
	var a, b map[int]int
	deriveSortedKeys(a, b)
}
"#;
    let err = assert_generate_error(source);
    assert!(matches!(
        err,
        DeriveError::Input(InputError::ArityMismatch {
            expected: 1,
            found: 2,
            ..
        })
    ));
}
