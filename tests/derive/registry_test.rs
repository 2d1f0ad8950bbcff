//! 関数名の割り当てと生成回数のテスト

use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_repeated_requests_generate_once() {
    let source = r#"
package main

type Pair struct {
	A int
	B int
}

func main() {
	var p, q Pair
	deriveComparePair(p, q)
	deriveComparePair(q, p)
	deriveCompareInt(1, 2)
}
"#;
    let output = assert_generate_success(source);
    assert_eq!(count_functions(&output, "deriveComparePair"), 1);
    assert_eq!(count_functions(&output, "deriveCompareInt"), 1);
}

#[test]
fn test_user_name_wins_over_mangled_name() {
    let source = r#"
package main

type Pair struct {
	A []string
}

func main() {
	var p, q Pair
	deriveComparePair(p, q)
	var xs, ys []string
	deriveCompareStrings(xs, ys)
}
"#;
    let output = assert_generate_success(source);
    assert!(function(&output, "deriveComparePair")
        .contains("\tif c := deriveCompareStrings(this.A, that.A); c != 0 {\n"));
    assert!(!output.contains("deriveCompareSliceOfString"));
}

#[test]
fn test_generated_name_avoids_taken_name() {
    // 利用者が別の型に mangle 後と同じ名前を付けた場合は番号を付ける
    let source = r#"
package main

type Holder struct {
	Values []int
}

func main() {
	var a, b []string
	deriveCompareSliceOfInt(a, b)
	var h, g Holder
	deriveCompareHolder(h, g)
}
"#;
    let output = assert_generate_success(source);
    assert!(output.contains("func deriveCompareSliceOfInt(this, that []string) int {\n"));
    assert!(output.contains("func deriveCompareSliceOfInt1(this, that []int) int {\n"));
    assert!(function(&output, "deriveCompareHolder")
        .contains("deriveCompareSliceOfInt1(this.Values, that.Values)"));
}

#[test]
fn test_generated_name_avoids_package_function() {
    let source = r#"
package main

type T struct{ A int }

func deriveCompareInt(a, b int) int {
	return a - b
}

func main() {
	var x, y T
	deriveCompareT(x, y)
}
"#;
    let output = assert_generate_success(source);
    assert!(!output.contains("func deriveCompareInt("));
    assert!(output.contains("func deriveCompareInt1(this, that int) int {\n"));
    assert!(function(&output, "deriveCompareT").contains("deriveCompareInt1(this.A, that.A)"));
}

#[test]
fn test_functions_follow_request_order() {
    let source = r#"
package main

type A struct {
	B B
}

type B struct {
	N int
}

func main() {
	var x, y A
	deriveCompareA(x, y)
}
"#;
    let output = assert_generate_success(source);
    let a = output.find("func deriveCompareA(").expect("A");
    let b = output.find("func deriveCompareB(").expect("B");
    let int = output.find("func deriveCompareInt(").expect("int");
    assert!(a < b && b < int);
}

#[test]
fn test_no_calls_yields_empty_file() {
    let source = r#"
package main

func main() {
	println("nothing to derive")
}
"#;
    let output = assert_generate_success(source);
    assert_eq!(
        output,
        "// Code generated by shapederive. DO NOT EDIT.\n\npackage main\n"
    );
}
