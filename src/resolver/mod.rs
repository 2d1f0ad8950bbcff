//! 型解決と呼び出し箇所の抽出
//!
//! 導出エンジンはこのモジュールを2つのトレイト越しにしか見ない：
//!
//! - [`TypeResolver`]: 引数の静的な型、型の正規名、型の同一性
//! - [`CallSiteExtractor`]: 指定した接頭辞で始まる関数呼び出しの列挙
//!
//! [`Package`] は解析済みのファイル群からこの両方を提供する具体実装で、
//! パッケージの外にある型は `Unresolved` として扱う。

mod calls;
mod scope;
mod typing;

pub use scope::{Binding, Scopes};

use std::collections::{HashMap, HashSet};

use crate::ast::{Decl, SourceFile, Span, TypeExpr, Expr, ExprKind};
use crate::error::{DeriveError, DeriveResult, ResolutionError};
use crate::types::{type_string, TypeArena, TypeId, TypeKind, UnsupportedKind};

/// 呼び出しの引数
#[derive(Debug, Clone)]
pub struct Argument {
    /// ソース上の表記
    pub text: String,
    pub span: Span,
    /// 呼び出し位置のスコープで求めた静的な型
    pub ty: Result<TypeId, ResolutionError>,
}

/// 導出を要求する呼び出し箇所
#[derive(Debug, Clone)]
pub struct CallSite {
    pub callee: String,
    pub args: Vec<Argument>,
    pub span: Span,
}

/// 型解決サービス
pub trait TypeResolver {
    /// 型アリーナへの読み取りアクセス
    fn types(&self) -> &TypeArena;

    /// 引数の静的な型
    fn static_type_of(&self, arg: &Argument) -> DeriveResult<TypeId> {
        arg.ty.clone().map_err(DeriveError::from)
    }

    /// 生成先パッケージから見た型の正規名
    fn canonical_name(&self, ty: TypeId) -> DeriveResult<String>;

    /// 2つの型が同一か
    fn identical(&self, a: TypeId, b: TypeId) -> bool {
        a == b
    }
}

/// 呼び出し箇所の抽出
pub trait CallSiteExtractor {
    /// 関数名が `prefix` で始まる呼び出しをソース順に返す
    fn call_sites(&self, prefix: &str) -> Vec<CallSite>;
}

/// パッケージレベルの値（変数、定数、関数）
#[derive(Debug, Clone)]
struct PendingValue {
    name: String,
    ty: Option<TypeExpr>,
    value: Option<Expr>,
    span: Span,
}

/// 解析済みファイルから構築した1つのパッケージ
#[derive(Debug)]
pub struct Package {
    name: String,
    arena: TypeArena,
    /// パッケージで宣言された名前付き型と解決済みの別名
    type_names: HashMap<String, TypeId>,
    /// 未解決の型別名
    alias_decls: HashMap<String, TypeExpr>,
    /// 解決中の別名（循環検出用）
    resolving_aliases: Vec<String>,
    /// パッケージレベルの値の型
    values: HashMap<String, Binding>,
    /// 整数定数の値（配列長の評価用）
    const_values: HashMap<String, u64>,
    /// (レシーバ型, メソッド名) から関数型
    methods: HashMap<(TypeId, String), TypeId>,
    /// importされたパッケージの名前
    imports: HashSet<String>,
    error_type: Option<TypeId>,
    calls: Vec<CallSite>,
}

impl Package {
    /// 解析済みファイル群からパッケージを構築する
    pub fn build(files: &[SourceFile]) -> DeriveResult<Self> {
        let name = match files.first() {
            Some(file) => file.package.name.clone(),
            None => return Err(DeriveError::Other("入力ファイルがありません".to_string())),
        };
        for file in files {
            if file.package.name != name {
                return Err(DeriveError::Other(format!(
                    "複数のパッケージが混在しています: {} と {}",
                    name, file.package.name
                )));
            }
        }

        let mut package = Package {
            name,
            arena: TypeArena::new(),
            type_names: HashMap::new(),
            alias_decls: HashMap::new(),
            resolving_aliases: Vec::new(),
            values: HashMap::new(),
            const_values: HashMap::new(),
            methods: HashMap::new(),
            imports: HashSet::new(),
            error_type: None,
            calls: Vec::new(),
        };

        package.collect_imports(files);
        package.declare_types(files)?;
        package.define_types(files)?;
        package.declare_funcs(files)?;
        package.type_package_values(files);
        package.calls = package.extract_calls(files);

        log::debug!(
            "パッケージ {} を構築しました: 型 {} 個、呼び出し {} 箇所",
            package.name,
            package.arena.len(),
            package.calls.len()
        );
        Ok(package)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// パッケージレベルで宣言された識別子（生成コードの別名と衝突させない）
    pub fn declared_names(&self) -> HashSet<String> {
        let mut names: HashSet<String> = self.type_names.keys().cloned().collect();
        names.extend(self.alias_decls.keys().cloned());
        names.extend(self.values.keys().cloned());
        names
    }

    fn collect_imports(&mut self, files: &[SourceFile]) {
        for file in files {
            for import in &file.imports {
                let local = import.local_name();
                if local != "_" && local != "." {
                    self.imports.insert(local.to_string());
                }
            }
        }
    }

    /// 名前付き型を先にすべて宣言し、相互参照を可能にする
    fn declare_types(&mut self, files: &[SourceFile]) -> DeriveResult<()> {
        for file in files {
            for decl in &file.decls {
                let Decl::Type(type_decl) = decl else {
                    continue;
                };
                if self.type_names.contains_key(&type_decl.name)
                    || self.alias_decls.contains_key(&type_decl.name)
                {
                    return Err(DeriveError::Other(format!(
                        "型 {} が重複して宣言されています",
                        type_decl.name
                    )));
                }
                if type_decl.is_alias {
                    self.alias_decls
                        .insert(type_decl.name.clone(), type_decl.ty.clone());
                } else {
                    let id = self.arena.declare_named(&type_decl.name);
                    self.type_names.insert(type_decl.name.clone(), id);
                }
            }
        }
        Ok(())
    }

    fn define_types(&mut self, files: &[SourceFile]) -> DeriveResult<()> {
        // 配列長に使われる整数定数を先に集める
        for file in files {
            let mut previous: Option<&Expr> = None;
            for decl in &file.decls {
                let Decl::Const(spec) = decl else {
                    previous = None;
                    continue;
                };
                for (i, name) in spec.names.iter().enumerate() {
                    let value = spec.values.get(i).or(previous.filter(|_| spec.values.is_empty()));
                    if let Some(n) = value.and_then(integer_value) {
                        self.const_values.insert(name.clone(), n);
                    }
                }
                if let Some(first) = spec.values.first() {
                    previous = Some(first);
                }
            }
        }

        for file in files {
            for decl in &file.decls {
                let Decl::Type(type_decl) = decl else {
                    continue;
                };
                if type_decl.is_alias {
                    self.resolve_type_name(&type_decl.name, type_decl.span)?;
                    continue;
                }
                let rhs = self.resolve_type_expr(&type_decl.ty)?;
                if let Some(&id) = self.type_names.get(&type_decl.name) {
                    self.arena.define_named(id, rhs);
                }
            }
        }

        for (name, &id) in &self.type_names {
            if self.arena.is_named_cycle(id) {
                return Err(ResolutionError::InvalidRecursiveType { name: name.clone() }.into());
            }
        }
        Ok(())
    }

    /// 関数とメソッドのシグネチャを登録する
    fn declare_funcs(&mut self, files: &[SourceFile]) -> DeriveResult<()> {
        for file in files {
            for decl in &file.decls {
                let Decl::Func(func) = decl else {
                    continue;
                };
                let func_type = self.resolve_signature(&func.signature)?;
                match &func.receiver {
                    Some(receiver) => {
                        let recv = self.resolve_type_name(&receiver.type_name, receiver.span)?;
                        self.arena.add_method(recv, &func.name);
                        self.methods.insert((recv, func.name.clone()), func_type);
                    }
                    None => {
                        // init は何度でも宣言でき、値として参照できない
                        if func.name != "init" {
                            self.values.insert(func.name.clone(), Ok(func_type));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// パッケージレベルの変数と定数に型を付ける
    ///
    /// 初期化式が後方の宣言を参照していてもよいように、進展がなくなるまで繰り返す。
    fn type_package_values(&mut self, files: &[SourceFile]) {
        let mut pending = Vec::new();
        for file in files {
            let mut previous_const: Option<(Option<TypeExpr>, Vec<Expr>)> = None;
            for decl in &file.decls {
                match decl {
                    Decl::Var(spec) => {
                        previous_const = None;
                        push_pending(&mut pending, &spec.names, &spec.ty, &spec.values, spec.span);
                    }
                    Decl::Const(spec) => {
                        // 型も値もない定数は直前の宣言を繰り返す
                        let (ty, values) = if spec.ty.is_none() && spec.values.is_empty() {
                            previous_const.clone().unwrap_or((None, Vec::new()))
                        } else {
                            (spec.ty.clone(), spec.values.clone())
                        };
                        push_pending(&mut pending, &spec.names, &ty, &values, spec.span);
                        previous_const = Some((ty, values));
                    }
                    _ => previous_const = None,
                }
            }
        }

        let scopes = Scopes::new();
        loop {
            let mut progressed = false;
            let mut remaining = Vec::new();
            for value in pending {
                match self.type_pending(&value, &scopes) {
                    Ok(ty) => {
                        self.values.insert(value.name.clone(), Ok(ty));
                        progressed = true;
                    }
                    Err(err) => remaining.push((value, err)),
                }
            }
            if remaining.is_empty() {
                break;
            }
            if !progressed {
                for (value, err) in remaining {
                    self.values.insert(value.name, Err(err));
                }
                break;
            }
            pending = remaining.into_iter().map(|(value, _)| value).collect();
        }
    }

    fn type_pending(
        &mut self,
        value: &PendingValue,
        scopes: &Scopes,
    ) -> Result<TypeId, ResolutionError> {
        if let Some(ty) = &value.ty {
            return self.resolve_type_expr(ty);
        }
        match &value.value {
            Some(expr) => self.type_of(expr, scopes),
            None => Err(ResolutionError::UntypedExpression {
                expr: value.name.clone(),
                span: value.span,
            }),
        }
    }

    /// 型に名前を付けられない要素（他パッケージの型）が含まれていれば、その名前
    fn unresolved_part(&self, ty: TypeId) -> Option<String> {
        let mut stack = vec![ty];
        let mut seen = HashSet::new();
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            match self.arena.kind(id) {
                TypeKind::Unresolved(name) => return Some(name.clone()),
                TypeKind::Basic(_) | TypeKind::Named(_) => {}
                TypeKind::Pointer(elem) | TypeKind::Slice(elem) | TypeKind::Array(_, elem) => {
                    stack.push(*elem)
                }
                TypeKind::Map(key, value) => {
                    stack.push(*key);
                    stack.push(*value);
                }
                TypeKind::Struct(fields) => stack.extend(fields.iter().map(|f| f.ty)),
                TypeKind::Unsupported(kind) => match kind {
                    UnsupportedKind::Chan(_, elem) => stack.push(*elem),
                    UnsupportedKind::Func { params, results, .. } => {
                        stack.extend(params.iter().copied());
                        stack.extend(results.iter().copied());
                    }
                    UnsupportedKind::Tuple(items) => stack.extend(items.iter().copied()),
                    UnsupportedKind::Interface => {}
                },
            }
        }
        None
    }
}

fn push_pending(
    pending: &mut Vec<PendingValue>,
    names: &[String],
    ty: &Option<TypeExpr>,
    values: &[Expr],
    span: Span,
) {
    for (i, name) in names.iter().enumerate() {
        if name == "_" {
            continue;
        }
        let value = if values.len() == names.len() {
            values.get(i).cloned()
        } else {
            None
        };
        pending.push(PendingValue {
            name: name.clone(),
            ty: ty.clone(),
            value,
            span,
        });
    }
}

/// 整数リテラル（括弧付きを含む）の値
fn integer_value(expr: &Expr) -> Option<u64> {
    match &expr.kind {
        ExprKind::IntLit(n) => Some(*n),
        ExprKind::Paren(inner) => integer_value(inner),
        _ => None,
    }
}

impl TypeResolver for Package {
    fn types(&self) -> &TypeArena {
        &self.arena
    }

    fn canonical_name(&self, ty: TypeId) -> DeriveResult<String> {
        if let Some(name) = self.unresolved_part(ty) {
            return Err(ResolutionError::UnresolvableType { name }.into());
        }
        Ok(type_string(&self.arena, ty))
    }
}

impl CallSiteExtractor for Package {
    fn call_sites(&self, prefix: &str) -> Vec<CallSite> {
        self.calls
            .iter()
            .filter(|call| call.callee.starts_with(prefix))
            .cloned()
            .collect()
    }
}
