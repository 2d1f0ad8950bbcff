//! 生成関数名のマングリング
//!
//! 型の形をそのまま識別子に埋め込む。`[]*Node` は `SliceOfPtrToNode`、
//! `map[string]int` は `MapOfStringToInt` になる。

use crate::types::{TypeArena, TypeId, TypeKind, UnsupportedKind};

/// 型を識別子の一部として使える文字列に変換
pub fn mangle_type(arena: &TypeArena, ty: TypeId) -> String {
    match arena.kind(ty) {
        TypeKind::Basic(kind) => capitalize(&kind.name().replace(' ', "_")),
        TypeKind::Named(named) => capitalize(&named.name),
        TypeKind::Unresolved(name) => name.split('.').map(capitalize).collect(),
        TypeKind::Pointer(elem) => format!("PtrTo{}", mangle_type(arena, *elem)),
        TypeKind::Slice(elem) => format!("SliceOf{}", mangle_type(arena, *elem)),
        TypeKind::Array(len, elem) => format!("ArrayOf{}{}", len, mangle_type(arena, *elem)),
        TypeKind::Map(key, value) => format!(
            "MapOf{}To{}",
            mangle_type(arena, *key),
            mangle_type(arena, *value)
        ),
        TypeKind::Struct(fields) => {
            let mut out = String::from("StructOf");
            for field in fields {
                if !field.embedded {
                    out.push_str(&capitalize(&field.name));
                }
                out.push_str(&mangle_type(arena, field.ty));
            }
            out
        }
        TypeKind::Unsupported(kind) => match kind {
            UnsupportedKind::Chan(_, elem) => format!("ChanOf{}", mangle_type(arena, *elem)),
            UnsupportedKind::Func { .. } => "Func".to_string(),
            UnsupportedKind::Interface => "Interface".to_string(),
            UnsupportedKind::Tuple(_) => "Tuple".to_string(),
        },
    }
}

/// 操作の接頭辞と型から関数名を作る
pub fn mangle_function_name(prefix: &str, arena: &TypeArena, ty: TypeId) -> String {
    format!("{}{}", prefix, mangle_type(arena, ty))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
