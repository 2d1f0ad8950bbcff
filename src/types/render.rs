//! 型の正規名
//!
//! 生成するソースと同じパッケージから見た表記を返す。
//! ローカルの名前付き型は修飾しない。

use crate::ast::ChanDir;

use super::{TypeArena, TypeId, TypeKind, UnsupportedKind};

/// 型をGoの型表記に変換する
pub fn type_string(arena: &TypeArena, id: TypeId) -> String {
    let mut out = String::new();
    write_type(arena, id, &mut out);
    out
}

/// Goの解釈付き文字列リテラルとして書く
fn write_quoted(value: &str, out: &mut String) {
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => {
                let mut buf = [0u8; 4];
                for byte in c.encode_utf8(&mut buf).bytes() {
                    out.push_str(&format!("\\x{:02x}", byte));
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn write_type(arena: &TypeArena, id: TypeId, out: &mut String) {
    match arena.kind(id) {
        TypeKind::Basic(kind) => out.push_str(kind.name()),
        TypeKind::Named(named) => out.push_str(&named.name),
        TypeKind::Unresolved(name) => out.push_str(name),
        TypeKind::Pointer(elem) => {
            out.push('*');
            write_type(arena, *elem, out);
        }
        TypeKind::Slice(elem) => {
            out.push_str("[]");
            write_type(arena, *elem, out);
        }
        TypeKind::Array(len, elem) => {
            out.push_str(&format!("[{}]", len));
            write_type(arena, *elem, out);
        }
        TypeKind::Map(key, value) => {
            out.push_str("map[");
            write_type(arena, *key, out);
            out.push(']');
            write_type(arena, *value, out);
        }
        TypeKind::Struct(fields) => {
            out.push_str("struct{");
            for (i, field) in fields.iter().enumerate() {
                if i > 0 {
                    out.push_str("; ");
                }
                if !field.embedded {
                    out.push_str(&field.name);
                    out.push(' ');
                }
                write_type(arena, field.ty, out);
                if let Some(tag) = &field.tag {
                    out.push(' ');
                    write_quoted(tag, out);
                }
            }
            out.push('}');
        }
        TypeKind::Unsupported(kind) => write_unsupported(arena, kind, out),
    }
}

fn write_unsupported(arena: &TypeArena, kind: &UnsupportedKind, out: &mut String) {
    match kind {
        UnsupportedKind::Chan(dir, elem) => {
            out.push_str(match dir {
                ChanDir::Both => "chan ",
                ChanDir::Send => "chan<- ",
                ChanDir::Recv => "<-chan ",
            });
            write_type(arena, *elem, out);
        }
        UnsupportedKind::Func {
            params,
            results,
            variadic,
        } => {
            out.push_str("func");
            write_list(arena, params, *variadic, out);
            match results.len() {
                0 => {}
                1 => {
                    out.push(' ');
                    write_type(arena, results[0], out);
                }
                _ => {
                    out.push(' ');
                    write_list(arena, results, false, out);
                }
            }
        }
        UnsupportedKind::Interface => out.push_str("interface{}"),
        UnsupportedKind::Tuple(items) => write_list(arena, items, false, out),
    }
}

fn write_list(arena: &TypeArena, items: &[TypeId], variadic: bool, out: &mut String) {
    out.push('(');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        if variadic && i + 1 == items.len() {
            // 可変長引数はスライスとして保持している
            out.push_str("...");
            match arena.kind(*item) {
                TypeKind::Slice(elem) => write_type(arena, *elem, out),
                _ => write_type(arena, *item, out),
            }
        } else {
            write_type(arena, *item, out);
        }
    }
    out.push(')');
}
