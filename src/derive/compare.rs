//! 三方比較の導出
//!
//! 生成する関数は `func NAME(this, that T) int` の形で、
//! 負・ゼロ・正のいずれかを返す。型の形ごとの規則：
//!
//! | 形             | 規則                                                         |
//! |----------------|--------------------------------------------------------------|
//! | `Compare` 持ち | `this.Compare(&that)` に委譲                                  |
//! | ポインタ       | nil が先。どちらも非nilなら参照先を比較                         |
//! | 基本型         | 文字列は辞書順、boolは false が先、浮動小数点はNaNが先、複素数は実部→虚部、他は `<` |
//! | 構造体         | 宣言順にフィールドを比較し、最初の非ゼロを返す                    |
//! | スライス       | nil が先、短い方が先、要素を先頭から                             |
//! | 配列           | 長さ、要素を先頭から                                           |
//! | マップ         | nil が先、小さい方が先、整列したキー列を並べて比較                 |

use crate::error::{DeriveError, DeriveResult, InputError, ResolutionError, UnsupportedError};
use crate::printer::{ImportRef, Printer};
use crate::resolver::{CallSite, TypeResolver};
use crate::types::{type_string, BasicKind, TypeArena, TypeId, TypeKind};

use super::{DeriveContext, Deriver, Role, TypeRegistry};

const OPERATION: &str = "compare";

/// 比較を自前で定義している型が持つメソッド名
const METHOD: &str = "Compare";

const REQUIRES: [Role; 1] = [Role::KeyOrdering];

/// 三方比較の導出器
pub struct CompareDeriver {
    strings: ImportRef,
    bytes: ImportRef,
}

impl CompareDeriver {
    /// 呼び出し箇所を検証し、要求された関数名をレジストリに登録する
    ///
    /// 引数がちょうど2つで、両者の型が同一でなければならない。
    pub fn new(
        sites: &[CallSite],
        resolver: &dyn TypeResolver,
        registry: &mut TypeRegistry,
        printer: &mut Printer,
    ) -> DeriveResult<Self> {
        for site in sites {
            if site.args.len() != 2 {
                return Err(InputError::ArityMismatch {
                    callee: site.callee.clone(),
                    expected: 2,
                    found: site.args.len(),
                    span: site.span,
                }
                .into());
            }

            let left = resolver.static_type_of(&site.args[0])?;
            let right = resolver.static_type_of(&site.args[1])?;
            if !resolver.identical(left, right) {
                return Err(InputError::ArgumentTypeMismatch {
                    callee: site.callee.clone(),
                    left: type_string(resolver.types(), left),
                    right: type_string(resolver.types(), right),
                    span: site.span,
                }
                .into());
            }

            registry.set_func_name(left, &site.callee, site.span, resolver)?;
        }

        Ok(Self {
            strings: printer.new_import("strings"),
            bytes: printer.new_import("bytes"),
        })
    }

    fn emit_body(&self, ty: TypeId, cx: &mut DeriveContext<'_>) -> DeriveResult<()> {
        let arena = cx.types();

        if arena.has_method(ty, METHOD) {
            cx.printer().line("return this.Compare(&that)");
            return Ok(());
        }

        match arena.underlying_kind(ty) {
            TypeKind::Pointer(elem) => {
                emit_nil_checks(cx.printer());
                if arena.has_method(*elem, METHOD) {
                    cx.printer().line("return this.Compare(that)");
                } else {
                    check_supported(arena, *elem)?;
                    let func = cx.func_name(*elem)?;
                    cx.printer().line(format!("return {}(*this, *that)", func));
                }
            }

            TypeKind::Basic(kind) => self.emit_basic(ty, *kind, cx)?,

            TypeKind::Struct(fields) => {
                for field in fields.iter().filter(|f| f.name != "_") {
                    let this = format!("this.{}", field.name);
                    let that = format!("that.{}", field.name);
                    let expr = self
                        .compare_expr(&this, &that, field.ty, true, cx)
                        .map_err(|err| match err {
                            DeriveError::Unsupported(UnsupportedError::Type { operation, ty }) => {
                                UnsupportedError::Field {
                                    operation,
                                    field: field.name.clone(),
                                    ty,
                                }
                                .into()
                            }
                            other => other,
                        })?;
                    emit_return_if_nonzero(cx.printer(), &expr);
                }
                cx.printer().line("return 0");
            }

            TypeKind::Slice(elem) => {
                emit_nil_checks(cx.printer());
                emit_length_checks(cx.printer());
                self.emit_elements(*elem, cx)?;
            }

            TypeKind::Array(_, elem) => {
                emit_length_checks(cx.printer());
                self.emit_elements(*elem, cx)?;
            }

            TypeKind::Map(key, value) => {
                emit_nil_checks(cx.printer());
                emit_length_checks(cx.printer());

                let keys = cx.dependency(Role::KeyOrdering, ty)?;
                let p = cx.printer();
                p.line(format!("thiskeys := {}(this)", keys));
                p.line(format!("thatkeys := {}(that)", keys));
                p.open("for i, thiskey := range thiskeys {");
                p.line("thatkey := thatkeys[i]");
                p.open("if thiskey == thatkey {");
                // マップの値はアドレスを取れない
                let value_expr = self.compare_expr("this[thiskey]", "that[thatkey]", *value, false, cx)?;
                emit_return_if_nonzero(cx.printer(), &value_expr);
                cx.printer().close("} else {");
                cx.printer().indent();
                let key_expr = self.compare_expr("thiskey", "thatkey", *key, true, cx)?;
                emit_return_if_nonzero(cx.printer(), &key_expr);
                let p = cx.printer();
                p.close("}");
                p.close("}");
                p.line("return 0");
            }

            TypeKind::Named(named) => {
                return Err(ResolutionError::InvalidRecursiveType {
                    name: named.name.clone(),
                }
                .into())
            }
            TypeKind::Unresolved(name) => {
                return Err(ResolutionError::UnresolvableType { name: name.clone() }.into())
            }
            TypeKind::Unsupported(_) => {
                return Err(UnsupportedError::Type {
                    operation: OPERATION.to_string(),
                    ty: type_string(arena, ty),
                }
                .into())
            }
        }
        Ok(())
    }

    fn emit_basic(&self, ty: TypeId, kind: BasicKind, cx: &mut DeriveContext<'_>) -> DeriveResult<()> {
        let arena = cx.types();
        match kind {
            BasicKind::String => {
                let strings = cx.printer().import_name(self.strings);
                let line = if matches!(arena.kind(ty), TypeKind::Basic(_)) {
                    format!("return {}.Compare(this, that)", strings)
                } else {
                    format!("return {}.Compare(string(this), string(that))", strings)
                };
                cx.printer().line(line);
            }
            BasicKind::Bool => {
                let p = cx.printer();
                p.open("if this == that {");
                p.line("return 0");
                p.close("}");
                p.open("if that {");
                p.line("return -1");
                p.close("}");
                p.line("return 1");
            }
            BasicKind::Complex64 | BasicKind::Complex128 => {
                // 実部、虚部の順に比較する全順序
                let p = cx.printer();
                emit_float_check(p, "real(this)", "real(that)");
                emit_float_check(p, "imag(this)", "imag(that)");
                p.line("return 0");
            }
            kind if kind.is_float() => {
                let p = cx.printer();
                emit_float_check(p, "this", "that");
                p.line("return 0");
            }
            BasicKind::UntypedNil => {
                return Err(UnsupportedError::Type {
                    operation: OPERATION.to_string(),
                    ty: type_string(arena, ty),
                }
                .into())
            }
            _ => {
                let p = cx.printer();
                emit_ordered_check(p, "this", "that");
                p.line("return 0");
            }
        }
        Ok(())
    }

    /// スライス・配列の要素を先頭から比較するループ
    fn emit_elements(&self, elem: TypeId, cx: &mut DeriveContext<'_>) -> DeriveResult<()> {
        cx.printer().open("for i := 0; i < len(this); i++ {");
        let expr = self.compare_expr("this[i]", "that[i]", elem, true, cx)?;
        emit_return_if_nonzero(cx.printer(), &expr);
        let p = cx.printer();
        p.close("}");
        p.line("return 0");
        Ok(())
    }

    /// 2つの値を比較する式
    ///
    /// `string` と `[]byte` は標準ライブラリの比較をそのまま使い、
    /// それ以外は型ごとの関数を呼ぶ。`addressable` でなければ
    /// ポインタレシーバの `Compare` は直接呼べない。
    fn compare_expr(
        &self,
        this: &str,
        that: &str,
        ty: TypeId,
        addressable: bool,
        cx: &mut DeriveContext<'_>,
    ) -> DeriveResult<String> {
        let arena = cx.types();
        match arena.kind(ty) {
            TypeKind::Basic(BasicKind::String) => {
                let strings = cx.printer().import_name(self.strings);
                return Ok(format!("{}.Compare({}, {})", strings, this, that));
            }
            TypeKind::Slice(elem) if matches!(arena.kind(*elem), TypeKind::Basic(BasicKind::Uint8)) => {
                let bytes = cx.printer().import_name(self.bytes);
                return Ok(format!("{}.Compare({}, {})", bytes, this, that));
            }
            TypeKind::Pointer(elem) if arena.has_method(*elem, METHOD) => {
                return Ok(format!("{}.Compare({})", this, that));
            }
            _ => {}
        }

        if addressable && arena.has_method(ty, METHOD) {
            return Ok(format!("{}.Compare(&{})", this, that));
        }

        check_supported(arena, ty)?;
        let func = cx.func_name(ty)?;
        Ok(format!("{}({}, {})", func, this, that))
    }
}

impl Deriver for CompareDeriver {
    fn name(&self) -> &str {
        OPERATION
    }

    fn provides(&self) -> Role {
        Role::Comparator
    }

    fn requires(&self) -> &[Role] {
        &REQUIRES
    }

    fn synthesize(&mut self, ty: TypeId, cx: &mut DeriveContext<'_>) -> DeriveResult<()> {
        let name = cx.func_name(ty)?;
        let type_name = cx.canonical_name(ty)?;

        let p = cx.printer();
        p.blank();
        p.open(format!("func {}(this, that {}) int {{", name, type_name));
        self.emit_body(ty, cx)?;
        cx.printer().close("}");
        Ok(())
    }
}

/// 関数を生成できない形なら、その型を名指しして失敗する
fn check_supported(arena: &TypeArena, ty: TypeId) -> DeriveResult<()> {
    match arena.underlying_kind(ty) {
        TypeKind::Unsupported(_) | TypeKind::Basic(BasicKind::UntypedNil) => {
            Err(UnsupportedError::Type {
                operation: OPERATION.to_string(),
                ty: type_string(arena, ty),
            }
            .into())
        }
        _ => Ok(()),
    }
}

fn emit_nil_checks(p: &mut Printer) {
    p.open("if this == nil {");
    p.open("if that == nil {");
    p.line("return 0");
    p.close("}");
    p.line("return -1");
    p.close("}");
    p.open("if that == nil {");
    p.line("return 1");
    p.close("}");
}

fn emit_length_checks(p: &mut Printer) {
    p.open("if len(this) != len(that) {");
    p.open("if len(this) < len(that) {");
    p.line("return -1");
    p.close("}");
    p.line("return 1");
    p.close("}");
}

fn emit_ordered_check(p: &mut Printer, this: &str, that: &str) {
    p.open(format!("if {} != {} {{", this, that));
    p.open(format!("if {} < {} {{", this, that));
    p.line("return -1");
    p.close("}");
    p.line("return 1");
    p.close("}");
}

/// NaNをどの数よりも前に置く比較。NaNどうしは等しい
///
/// 等しければ後続の比較に進む。
fn emit_float_check(p: &mut Printer, this: &str, that: &str) {
    p.open(format!("if {} < {} {{", this, that));
    p.line("return -1");
    p.close("}");
    p.open(format!("if {} > {} {{", this, that));
    p.line("return 1");
    p.close("}");
    p.open(format!("if {} != {} {{", this, this));
    p.open(format!("if {} == {} {{", that, that));
    p.line("return -1");
    p.close("}");
    p.close(format!("}} else if {} != {} {{", that, that));
    p.indent();
    p.line("return 1");
    p.close("}");
}

fn emit_return_if_nonzero(p: &mut Printer, expr: &str) {
    p.open(format!("if c := {}; c != 0 {{", expr));
    p.line("return c");
    p.close("}");
}
