//! 型レジストリ
//!
//! 操作ごとに「型 → 生成関数名」と生成状態を記録する。
//! 状態は `Requested → Generating → Done` の順にちょうど一度だけ遷移する。
//! 生成中の型が再び要求されても既存の名前を返すだけなので、
//! 自己参照する型でも生成は停止する。

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::ast::Span;
use crate::error::{DeriveError, DeriveResult, InputError};
use crate::resolver::TypeResolver;
use crate::types::{type_string, TypeId};

use super::naming::mangle_function_name;

/// 生成状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    Requested,
    Generating,
    Done,
}

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    state: GenerationState,
}

/// 1つの操作の型レジストリ
#[derive(Debug)]
pub struct TypeRegistry {
    operation: String,
    prefix: String,
    /// 登録順を保つ（生成順を決定的にするため）
    entries: IndexMap<TypeId, Entry>,
    names: HashMap<String, TypeId>,
    /// パッケージで宣言済みの識別子。生成する名前には使わない
    reserved: HashSet<String>,
    /// これより前のエントリはすべて `Requested` ではない
    cursor: usize,
}

impl TypeRegistry {
    pub fn new(operation: &str, prefix: &str) -> Self {
        Self::with_reserved(operation, prefix, HashSet::new())
    }

    /// `reserved` の名前を避けて関数名を割り当てるレジストリ
    pub fn with_reserved(operation: &str, prefix: &str, reserved: HashSet<String>) -> Self {
        Self {
            operation: operation.to_string(),
            prefix: prefix.to_string(),
            entries: IndexMap::new(),
            names: HashMap::new(),
            reserved,
            cursor: 0,
        }
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// 型の関数名を返す。初めての型なら名前を割り当てて `Requested` にする
    pub fn request_name(&mut self, ty: TypeId, resolver: &dyn TypeResolver) -> DeriveResult<String> {
        if let Some(entry) = self.entries.get(&ty) {
            return Ok(entry.name.clone());
        }

        // 名前を付けられない型はここで失敗させる
        resolver.canonical_name(ty)?;

        let base = mangle_function_name(&self.prefix, resolver.types(), ty);
        let mut name = base.clone();
        let mut suffix = 1;
        while self.names.contains_key(&name) || self.reserved.contains(&name) {
            name = format!("{}{}", base, suffix);
            suffix += 1;
        }

        self.insert(ty, name.clone());
        Ok(name)
    }

    /// 呼び出し箇所で指定された名前を型に割り当てる
    pub fn set_func_name(
        &mut self,
        ty: TypeId,
        name: &str,
        span: Span,
        resolver: &dyn TypeResolver,
    ) -> DeriveResult<()> {
        if let Some(entry) = self.entries.get(&ty) {
            if entry.name == name {
                return Ok(());
            }
            return Err(InputError::ConflictingName {
                callee: name.to_string(),
                existing: entry.name.clone(),
                ty: type_string(resolver.types(), ty),
                span,
            }
            .into());
        }

        if let Some(&other) = self.names.get(name) {
            return Err(InputError::NameReused {
                callee: name.to_string(),
                existing: type_string(resolver.types(), other),
                ty: type_string(resolver.types(), ty),
                span,
            }
            .into());
        }

        resolver.canonical_name(ty)?;
        self.insert(ty, name.to_string());
        Ok(())
    }

    fn insert(&mut self, ty: TypeId, name: String) {
        self.names.insert(name.clone(), ty);
        self.entries.insert(
            ty,
            Entry {
                name,
                state: GenerationState::Requested,
            },
        );
    }

    /// 割り当て済みの関数名
    pub fn func_name(&self, ty: TypeId) -> Option<&str> {
        self.entries.get(&ty).map(|entry| entry.name.as_str())
    }

    pub fn state(&self, ty: TypeId) -> Option<GenerationState> {
        self.entries.get(&ty).map(|entry| entry.state)
    }

    /// 登録順で最初の `Requested` の型を `Generating` にして返す
    pub fn next_pending(&mut self) -> Option<TypeId> {
        while self.cursor < self.entries.len() {
            let index = self.cursor;
            self.cursor += 1;
            if let Some((&ty, entry)) = self.entries.get_index_mut(index) {
                if entry.state == GenerationState::Requested {
                    entry.state = GenerationState::Generating;
                    return Some(ty);
                }
            }
        }
        None
    }

    pub fn has_pending(&self) -> bool {
        self.entries
            .values()
            .skip(self.cursor)
            .any(|entry| entry.state == GenerationState::Requested)
    }

    /// `Generating → Done`
    pub fn mark_done(&mut self, ty: TypeId) -> DeriveResult<()> {
        match self.entries.get_mut(&ty) {
            Some(entry) if entry.state == GenerationState::Generating => {
                entry.state = GenerationState::Done;
                Ok(())
            }
            Some(entry) => Err(DeriveError::Internal {
                message: format!(
                    "{}: {} は生成中ではありません（状態: {:?}）",
                    self.operation, entry.name, entry.state
                ),
            }),
            None => Err(DeriveError::Internal {
                message: format!("{}: 未登録の型 {} を完了にしようとしました", self.operation, ty),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 登録順の (型, 関数名, 状態)
    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &str, GenerationState)> + '_ {
        self.entries
            .iter()
            .map(|(ty, entry)| (*ty, entry.name.as_str(), entry.state))
    }
}
