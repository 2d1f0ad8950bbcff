//! マップのキーを整列して返す関数の導出
//!
//! マップの比較はキーの列挙順に依存してはならないため、比較の導出はこの操作を
//! [`Role::KeyOrdering`] として使う。逆に、`<` で順序付けられないキーの整列には
//! 比較の導出（[`Role::Comparator`]）を使う。

use crate::error::{DeriveResult, InputError, UnsupportedError};
use crate::printer::{ImportRef, Printer};
use crate::resolver::{CallSite, TypeResolver};
use crate::types::{type_string, TypeId, TypeKind};

use super::{DeriveContext, Deriver, Role, TypeRegistry};

const OPERATION: &str = "sortedKeys";

const REQUIRES: [Role; 1] = [Role::Comparator];

/// キー整列の導出器
pub struct SortedKeysDeriver {
    sort: ImportRef,
}

impl SortedKeysDeriver {
    /// 呼び出し箇所を検証する。引数はマップ型の値1つ
    pub fn new(
        sites: &[CallSite],
        resolver: &dyn TypeResolver,
        registry: &mut TypeRegistry,
        printer: &mut Printer,
    ) -> DeriveResult<Self> {
        for site in sites {
            if site.args.len() != 1 {
                return Err(InputError::ArityMismatch {
                    callee: site.callee.clone(),
                    expected: 1,
                    found: site.args.len(),
                    span: site.span,
                }
                .into());
            }

            let ty = resolver.static_type_of(&site.args[0])?;
            if !matches!(resolver.types().underlying_kind(ty), TypeKind::Map(_, _)) {
                return Err(InputError::ExpectedMap {
                    callee: site.callee.clone(),
                    found: type_string(resolver.types(), ty),
                    span: site.span,
                }
                .into());
            }

            registry.set_func_name(ty, &site.callee, site.span, resolver)?;
        }

        Ok(Self {
            sort: printer.new_import("sort"),
        })
    }
}

impl Deriver for SortedKeysDeriver {
    fn name(&self) -> &str {
        OPERATION
    }

    fn provides(&self) -> Role {
        Role::KeyOrdering
    }

    fn requires(&self) -> &[Role] {
        &REQUIRES
    }

    fn synthesize(&mut self, ty: TypeId, cx: &mut DeriveContext<'_>) -> DeriveResult<()> {
        let arena = cx.types();
        let TypeKind::Map(key, _) = arena.underlying_kind(ty) else {
            return Err(UnsupportedError::Type {
                operation: OPERATION.to_string(),
                ty: type_string(arena, ty),
            }
            .into());
        };
        let key = *key;

        let name = cx.func_name(ty)?;
        let map_name = cx.canonical_name(ty)?;
        let key_name = cx.canonical_name(key)?;

        let less = match arena.underlying_kind(key) {
            TypeKind::Basic(kind) if kind.is_ordered() => "keys[i] < keys[j]".to_string(),
            _ => {
                let compare = cx.dependency(Role::Comparator, key)?;
                format!("{}(keys[i], keys[j]) < 0", compare)
            }
        };

        let sort = cx.printer().import_name(self.sort);
        let p = cx.printer();
        p.blank();
        p.open(format!("func {}(m {}) []{} {{", name, map_name, key_name));
        p.line(format!("keys := make([]{}, 0, len(m))", key_name));
        p.open("for key := range m {");
        p.line("keys = append(keys, key)");
        p.close("}");
        p.open(format!("{}.Slice(keys, func(i, j int) bool {{", sort));
        p.line(format!("return {}", less));
        p.close("})");
        p.line("return keys");
        p.close("}");
        Ok(())
    }
}
