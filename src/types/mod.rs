//! 型アリーナ
//!
//! 型は `TypeId` で参照する。名前のない型は構造ごとに一意化されるため、
//! 2つの型が同一かどうかは `TypeId` の比較だけで判定できる。
//! 名前付き型は宣言ごとに別の `TypeId` を持つ。
//!
//! ```text
//! type Node struct { Next *Node }
//!
//!   #7 Named "Node" ──rhs──> #8 Struct { Next: #9 }
//!   #9 Pointer(#7)
//! ```
//!
//! 参照は常に添字なので、自己参照する型でも所有権の循環は起きない。

mod render;

pub use render::type_string;

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::ast::ChanDir;

/// アリーナ内の型への参照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 基本型の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BasicKind {
    Bool,
    String,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    /// `nil` の型
    UntypedNil,
}

impl BasicKind {
    /// 事前宣言された型名から種類を得る（`byte` と `rune` は別名）
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "bool" => BasicKind::Bool,
            "string" => BasicKind::String,
            "int" => BasicKind::Int,
            "int8" => BasicKind::Int8,
            "int16" => BasicKind::Int16,
            "int32" | "rune" => BasicKind::Int32,
            "int64" => BasicKind::Int64,
            "uint" => BasicKind::Uint,
            "uint8" | "byte" => BasicKind::Uint8,
            "uint16" => BasicKind::Uint16,
            "uint32" => BasicKind::Uint32,
            "uint64" => BasicKind::Uint64,
            "uintptr" => BasicKind::Uintptr,
            "float32" => BasicKind::Float32,
            "float64" => BasicKind::Float64,
            "complex64" => BasicKind::Complex64,
            "complex128" => BasicKind::Complex128,
            _ => return None,
        };
        Some(kind)
    }

    pub fn name(self) -> &'static str {
        match self {
            BasicKind::Bool => "bool",
            BasicKind::String => "string",
            BasicKind::Int => "int",
            BasicKind::Int8 => "int8",
            BasicKind::Int16 => "int16",
            BasicKind::Int32 => "int32",
            BasicKind::Int64 => "int64",
            BasicKind::Uint => "uint",
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Uintptr => "uintptr",
            BasicKind::Float32 => "float32",
            BasicKind::Float64 => "float64",
            BasicKind::Complex64 => "complex64",
            BasicKind::Complex128 => "complex128",
            BasicKind::UntypedNil => "untyped nil",
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            BasicKind::Int
                | BasicKind::Int8
                | BasicKind::Int16
                | BasicKind::Int32
                | BasicKind::Int64
                | BasicKind::Uint
                | BasicKind::Uint8
                | BasicKind::Uint16
                | BasicKind::Uint32
                | BasicKind::Uint64
                | BasicKind::Uintptr
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, BasicKind::Float32 | BasicKind::Float64)
    }

    pub fn is_complex(self) -> bool {
        matches!(self, BasicKind::Complex64 | BasicKind::Complex128)
    }

    /// `<` で順序付けられるか
    pub fn is_ordered(self) -> bool {
        self.is_integer() || self.is_float() || self == BasicKind::String
    }
}

/// 構造体のフィールド
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Field {
    pub name: String,
    pub ty: TypeId,
    pub embedded: bool,
    /// タグ（デコード済み）。タグだけが異なる構造体は別の型
    pub tag: Option<String>,
}

/// 名前付き型
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NamedType {
    pub name: String,
    /// 宣言の右辺。解決前は `None`
    pub rhs: Option<TypeId>,
    pub methods: Vec<String>,
}

/// 比較などの導出に対応しない型
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum UnsupportedKind {
    Chan(ChanDir, TypeId),
    Func {
        params: Vec<TypeId>,
        results: Vec<TypeId>,
        variadic: bool,
    },
    /// メソッド集合は区別しない
    Interface,
    /// 複数の戻り値
    Tuple(Vec<TypeId>),
}

/// 型の構造
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum TypeKind {
    Basic(BasicKind),
    Pointer(TypeId),
    Struct(Vec<Field>),
    Slice(TypeId),
    Array(u64, TypeId),
    Map(TypeId, TypeId),
    Named(NamedType),
    Unsupported(UnsupportedKind),
    /// 他パッケージの型など、中身を知り得ない型（`pkg.Name`）
    Unresolved(String),
}

/// 型を保持するアリーナ
#[derive(Debug, Default)]
pub struct TypeArena {
    types: Vec<TypeKind>,
    interned: HashMap<TypeKind, TypeId>,
}

impl TypeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn push(&mut self, kind: TypeKind) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(kind);
        id
    }

    /// 名前のない型を一意化して登録する
    pub fn intern(&mut self, kind: TypeKind) -> TypeId {
        debug_assert!(!matches!(kind, TypeKind::Named(_)));
        if let Some(&id) = self.interned.get(&kind) {
            return id;
        }
        let id = self.push(kind.clone());
        self.interned.insert(kind, id);
        id
    }

    pub fn basic(&mut self, kind: BasicKind) -> TypeId {
        self.intern(TypeKind::Basic(kind))
    }

    pub fn pointer(&mut self, elem: TypeId) -> TypeId {
        self.intern(TypeKind::Pointer(elem))
    }

    pub fn slice(&mut self, elem: TypeId) -> TypeId {
        self.intern(TypeKind::Slice(elem))
    }

    pub fn array(&mut self, len: u64, elem: TypeId) -> TypeId {
        self.intern(TypeKind::Array(len, elem))
    }

    pub fn map(&mut self, key: TypeId, value: TypeId) -> TypeId {
        self.intern(TypeKind::Map(key, value))
    }

    /// 名前付き型を宣言する（右辺は後で `define_named` で設定）
    pub fn declare_named(&mut self, name: &str) -> TypeId {
        self.push(TypeKind::Named(NamedType {
            name: name.to_string(),
            rhs: None,
            methods: Vec::new(),
        }))
    }

    pub fn define_named(&mut self, id: TypeId, rhs: TypeId) {
        if let TypeKind::Named(named) = &mut self.types[id.index()] {
            named.rhs = Some(rhs);
        }
    }

    pub fn add_method(&mut self, id: TypeId, method: &str) {
        if let TypeKind::Named(named) = &mut self.types[id.index()] {
            if !named.methods.iter().any(|m| m == method) {
                named.methods.push(method.to_string());
            }
        }
    }

    pub fn kind(&self, id: TypeId) -> &TypeKind {
        &self.types[id.index()]
    }

    pub fn named(&self, id: TypeId) -> Option<&NamedType> {
        match self.kind(id) {
            TypeKind::Named(named) => Some(named),
            _ => None,
        }
    }

    /// 名前付き型が指定のメソッドを宣言しているか
    pub fn has_method(&self, id: TypeId, method: &str) -> bool {
        self.named(id)
            .is_some_and(|named| named.methods.iter().any(|m| m == method))
    }

    /// 名前付き型の連鎖をたどった先の型
    ///
    /// 右辺が未設定、または名前付き型だけで循環している場合は
    /// 最後に到達した名前付き型を返す。
    pub fn underlying(&self, id: TypeId) -> TypeId {
        let mut current = id;
        for _ in 0..=self.types.len() {
            match self.kind(current) {
                TypeKind::Named(NamedType { rhs: Some(rhs), .. }) => current = *rhs,
                _ => return current,
            }
        }
        current
    }

    pub fn underlying_kind(&self, id: TypeId) -> &TypeKind {
        self.kind(self.underlying(id))
    }

    /// 名前付き型の連鎖が名前付き型だけで閉じているか
    pub fn is_named_cycle(&self, id: TypeId) -> bool {
        matches!(self.underlying_kind(id), TypeKind::Named(_))
    }
}
