//! 比較関数の生成テスト

use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_struct_output() {
    let source = r#"
package main

type Point struct {
	X int
	Y string
}

func main() {
	var a, b Point
	println(deriveComparePoint(a, b))
}
"#;
    let output = assert_generate_success(source);

    let expected = lines(&[
        "// Code generated by shapederive. DO NOT EDIT.",
        "",
        "package main",
        "",
        "import (",
        "\t\"strings\"",
        ")",
        "",
        "func deriveComparePoint(this, that Point) int {",
        "\tif c := deriveCompareInt(this.X, that.X); c != 0 {",
        "\t\treturn c",
        "\t}",
        "\tif c := strings.Compare(this.Y, that.Y); c != 0 {",
        "\t\treturn c",
        "\t}",
        "\treturn 0",
        "}",
        "",
        "func deriveCompareInt(this, that int) int {",
        "\tif this != that {",
        "\t\tif this < that {",
        "\t\t\treturn -1",
        "\t\t}",
        "\t\treturn 1",
        "\t}",
        "\treturn 0",
        "}",
    ]);
    assert_eq!(output, expected);
}

#[test]
fn test_slice_compares_nil_then_length_then_elements() {
    let source = r#"
package main

func main() {
	var a, b []int
	deriveCompareInts(a, b)
}
"#;
    let output = assert_generate_success(source);
    let expected = lines(&[
        "func deriveCompareInts(this, that []int) int {",
        "\tif this == nil {",
        "\t\tif that == nil {",
        "\t\t\treturn 0",
        "\t\t}",
        "\t\treturn -1",
        "\t}",
        "\tif that == nil {",
        "\t\treturn 1",
        "\t}",
        "\tif len(this) != len(that) {",
        "\t\tif len(this) < len(that) {",
        "\t\t\treturn -1",
        "\t\t}",
        "\t\treturn 1",
        "\t}",
        "\tfor i := 0; i < len(this); i++ {",
        "\t\tif c := deriveCompareInt(this[i], that[i]); c != 0 {",
        "\t\t\treturn c",
        "\t\t}",
        "\t}",
        "\treturn 0",
        "}",
    ]);
    assert_eq!(function(&output, "deriveCompareInts"), expected);
    assert_eq!(count_functions(&output, "deriveCompareInt"), 1);
}

#[test]
fn test_array_has_no_nil_checks() {
    let source = r#"
package main

const Size = 3

type Grid [Size]float64

func main() {
	var a, b Grid
	deriveCompareGrid(a, b)
}
"#;
    let output = assert_generate_success(source);
    let body = function(&output, "deriveCompareGrid");
    assert!(body.starts_with("func deriveCompareGrid(this, that Grid) int {\n"));
    assert!(!body.contains("nil"));
    assert!(body.contains("\tif len(this) != len(that) {\n"));
    assert!(body.contains("\t\tif c := deriveCompareFloat64(this[i], that[i]); c != 0 {\n"));
}

#[test]
fn test_byte_slices_use_bytes_compare() {
    let source = r#"
package main

type Blob struct {
	Data []byte
}

func main() {
	deriveCompareBlob(Blob{}, Blob{})
}
"#;
    let output = assert_generate_success(source);
    assert!(output.contains("\t\"bytes\"\n"));
    assert!(!output.contains("\"strings\""));
    assert!(function(&output, "deriveCompareBlob")
        .contains("\tif c := bytes.Compare(this.Data, that.Data); c != 0 {\n"));
}

#[test]
fn test_pointer_nil_first_then_pointee() {
    let source = r#"
package main

type Box struct {
	Value int
}

func main() {
	var a, b *Box
	deriveCompareBoxPtr(a, b)
}
"#;
    let output = assert_generate_success(source);
    let expected = lines(&[
        "func deriveCompareBoxPtr(this, that *Box) int {",
        "\tif this == nil {",
        "\t\tif that == nil {",
        "\t\t\treturn 0",
        "\t\t}",
        "\t\treturn -1",
        "\t}",
        "\tif that == nil {",
        "\t\treturn 1",
        "\t}",
        "\treturn deriveCompareBox(*this, *that)",
        "}",
    ]);
    assert_eq!(function(&output, "deriveCompareBoxPtr"), expected);
    assert_eq!(count_functions(&output, "deriveCompareBox"), 1);
}

#[test]
fn test_bool_false_first() {
    let source = r#"
package main

func main() {
	deriveCompareBool(true, false)
}
"#;
    let output = assert_generate_success(source);
    let expected = lines(&[
        "func deriveCompareBool(this, that bool) int {",
        "\tif this == that {",
        "\t\treturn 0",
        "\t}",
        "\tif that {",
        "\t\treturn -1",
        "\t}",
        "\treturn 1",
        "}",
    ]);
    assert_eq!(function(&output, "deriveCompareBool"), expected);
}

#[test]
fn test_complex_real_then_imaginary() {
    let source = r#"
package main

func main() {
	var a, b complex128
	deriveCompareComplex(a, b)
}
"#;
    let output = assert_generate_success(source);
    let body = function(&output, "deriveCompareComplex");
    let real = body.find("if real(this) < real(that) {").expect("real part");
    let imag = body.find("if imag(this) < imag(that) {").expect("imaginary part");
    assert!(real < imag);
    // 両方NaNの実部は等しいとみなして虚部に進む
    assert!(body.contains("\tif real(this) != real(this) {\n\t\tif real(that) == real(that) {\n"));
}

#[test]
fn test_float_orders_nan_first() {
    let source = r#"
package main

func main() {
	var a, b float64
	deriveCompareFloat(a, b)
}
"#;
    let output = assert_generate_success(source);
    let expected = lines(&[
        "func deriveCompareFloat(this, that float64) int {",
        "\tif this < that {",
        "\t\treturn -1",
        "\t}",
        "\tif this > that {",
        "\t\treturn 1",
        "\t}",
        "\tif this != this {",
        "\t\tif that == that {",
        "\t\t\treturn -1",
        "\t\t}",
        "\t} else if that != that {",
        "\t\treturn 1",
        "\t}",
        "\treturn 0",
        "}",
    ]);
    assert_eq!(function(&output, "deriveCompareFloat"), expected);
}

#[test]
fn test_named_string_converts_before_compare() {
    let source = r#"
package main

type Name string

func main() {
	var a, b Name
	deriveCompareName(a, b)
}
"#;
    let output = assert_generate_success(source);
    assert!(function(&output, "deriveCompareName")
        .contains("\treturn strings.Compare(string(this), string(that))\n"));
}

#[test]
fn test_compare_method_is_delegated() {
    let source = r#"
package main

type Version struct {
	Major int
}

func (v *Version) Compare(other *Version) int {
	return v.Major - other.Major
}

type Release struct {
	V    Version
	Prev *Version
}

func main() {
	var a, b Version
	deriveCompareVersion(a, b)
	var r, s Release
	deriveCompareRelease(r, s)
}
"#;
    let output = assert_generate_success(source);
    assert_eq!(
        function(&output, "deriveCompareVersion"),
        "func deriveCompareVersion(this, that Version) int {\n\treturn this.Compare(&that)\n}\n"
    );

    let release = function(&output, "deriveCompareRelease");
    assert!(release.contains("\tif c := this.V.Compare(&that.V); c != 0 {\n"));
    assert!(release.contains("\tif c := this.Prev.Compare(that.Prev); c != 0 {\n"));
    // 自前の比較を持つ型の中身は生成しない
    assert_eq!(count_functions(&output, "deriveCompareInt"), 0);
}

#[test]
fn test_self_referential_type_terminates() {
    let source = r#"
package main

type Node struct {
	Value int
	Next  *Node
}

func main() {
	var a, b Node
	deriveCompareNode(a, b)
}
"#;
    let output = assert_generate_success(source);

    assert!(function(&output, "deriveCompareNode")
        .contains("\tif c := deriveComparePtrToNode(this.Next, that.Next); c != 0 {\n"));
    assert!(function(&output, "deriveComparePtrToNode")
        .contains("\treturn deriveCompareNode(*this, *that)\n"));

    assert_eq!(count_functions(&output, "deriveCompareNode"), 1);
    assert_eq!(count_functions(&output, "deriveComparePtrToNode"), 1);
    assert_eq!(count_functions(&output, "deriveCompareInt"), 1);
}

#[test]
fn test_map_uses_sorted_keys() {
    let source = r#"
package main

func main() {
	var a, b map[string]int
	deriveCompareCounts(a, b)
}
"#;
    let output = assert_generate_success(source);
    assert!(output.contains("\t\"sort\"\n"));
    assert!(output.contains("\t\"strings\"\n"));

    let expected = lines(&[
        "func deriveCompareCounts(this, that map[string]int) int {",
        "\tif this == nil {",
        "\t\tif that == nil {",
        "\t\t\treturn 0",
        "\t\t}",
        "\t\treturn -1",
        "\t}",
        "\tif that == nil {",
        "\t\treturn 1",
        "\t}",
        "\tif len(this) != len(that) {",
        "\t\tif len(this) < len(that) {",
        "\t\t\treturn -1",
        "\t\t}",
        "\t\treturn 1",
        "\t}",
        "\tthiskeys := deriveSortedKeysMapOfStringToInt(this)",
        "\tthatkeys := deriveSortedKeysMapOfStringToInt(that)",
        "\tfor i, thiskey := range thiskeys {",
        "\t\tthatkey := thatkeys[i]",
        "\t\tif thiskey == thatkey {",
        "\t\t\tif c := deriveCompareInt(this[thiskey], that[thatkey]); c != 0 {",
        "\t\t\t\treturn c",
        "\t\t\t}",
        "\t\t} else {",
        "\t\t\tif c := strings.Compare(thiskey, thatkey); c != 0 {",
        "\t\t\t\treturn c",
        "\t\t\t}",
        "\t\t}",
        "\t}",
        "\treturn 0",
        "}",
    ]);
    assert_eq!(function(&output, "deriveCompareCounts"), expected);
    assert_eq!(count_functions(&output, "deriveSortedKeysMapOfStringToInt"), 1);
}

#[test]
fn test_anonymous_struct_gets_mangled_name() {
    let source = r#"
package main

type Pair struct {
	Inner struct {
		A int
		B string
	}
}

func main() {
	var a, b Pair
	deriveComparePair(a, b)
}
"#;
    let output = assert_generate_success(source);
    assert!(output.contains(
        "func deriveCompareStructOfAIntBString(this, that struct{A int; B string}) int {\n"
    ));
    assert!(function(&output, "deriveComparePair").contains(
        "\tif c := deriveCompareStructOfAIntBString(this.Inner, that.Inner); c != 0 {\n"
    ));
}

#[test]
fn test_signature_keeps_struct_tags() {
    let source = r#"
package main

func main() {
	var a, b struct {
		ID int `json:"id"`
	}
	deriveCompareRow(a, b)
}
"#;
    let output = assert_generate_success(source);
    assert!(output.contains(
        r#"func deriveCompareRow(this, that struct{ID int "json:\"id\""}) int {"#
    ));
}

#[test]
fn test_custom_prefix() {
    let source = r#"
package main

func main() {
	cmpInt(1, 2)
}
"#;
    let config = DeriveConfig {
        compare_prefix: "cmp".to_string(),
        ..DeriveConfig::default()
    };
    let output = generate_with(source, config).expect("generation should succeed");
    assert_eq!(count_functions(&output, "cmpInt"), 1);
}
