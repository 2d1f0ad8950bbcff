//! 導出エンジン
//!
//! 呼び出し箇所から要求された型ごとに、操作を特殊化した関数を生成する。
//!
//! ## 処理の流れ
//!
//! 1. 各操作（[`Deriver`]）のコンストラクタが呼び出し箇所を検証し、
//!    要求された関数名を操作の [`TypeRegistry`] に登録する
//! 2. [`Generator::run`] がすべての役割の束縛を確認する
//! 3. レジストリから保留中の型を1つずつ取り出して関数を合成する。
//!    合成中に参照された型は新たに登録され、後で処理される
//! 4. どのレジストリにも保留中の型がなくなったら出力を組み立てる
//!
//! 操作どうしの依存（比較 → マップのキー整列）は [`Role`] で宣言し、
//! 実行前に [`Generator::bind`] で具体的な操作に束縛する。

mod compare;
mod naming;
mod registry;
mod sorted_keys;

pub use compare::CompareDeriver;
pub use naming::{mangle_function_name, mangle_type};
pub use registry::{GenerationState, TypeRegistry};
pub use sorted_keys::SortedKeysDeriver;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BindingError, DeriveError, DeriveResult};
use crate::printer::Printer;
use crate::resolver::{CallSiteExtractor, TypeResolver};
use crate::types::{TypeArena, TypeId};

/// 操作が他の操作に求める役割
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// 三方比較を提供する
    Comparator,
    /// マップのキーを決定的な順序で並べる
    KeyOrdering,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Comparator => write!(f, "comparator"),
            Role::KeyOrdering => write!(f, "key-ordering"),
        }
    }
}

/// `Generator` に登録された操作の番号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperationId(usize);

/// 型ごとに関数を合成する操作
pub trait Deriver {
    /// 操作名（エラーメッセージとログ用）
    fn name(&self) -> &str;

    /// この操作が提供する役割
    fn provides(&self) -> Role;

    /// この操作が依存する役割
    fn requires(&self) -> &[Role];

    /// 型 `ty` の関数を1つ出力する
    fn synthesize(&mut self, ty: TypeId, cx: &mut DeriveContext<'_>) -> DeriveResult<()>;
}

/// 合成中の操作から見える環境
pub struct DeriveContext<'a> {
    registries: &'a mut [TypeRegistry],
    bindings: &'a HashMap<Role, OperationId>,
    resolver: &'a dyn TypeResolver,
    printer: &'a mut Printer,
    current: OperationId,
}

impl<'a> DeriveContext<'a> {
    pub fn types(&self) -> &'a TypeArena {
        self.resolver.types()
    }

    pub fn resolver(&self) -> &'a dyn TypeResolver {
        self.resolver
    }

    pub fn printer(&mut self) -> &mut Printer {
        &mut *self.printer
    }

    pub fn canonical_name(&self, ty: TypeId) -> DeriveResult<String> {
        self.resolver.canonical_name(ty)
    }

    /// 現在の操作における型の関数名（未登録なら登録する）
    pub fn func_name(&mut self, ty: TypeId) -> DeriveResult<String> {
        let resolver = self.resolver;
        self.registries[self.current.0].request_name(ty, resolver)
    }

    /// 依存先の操作における型の関数名
    ///
    /// 役割が束縛されていないのはドライバの使い方の誤りなので即座に失敗する。
    pub fn dependency(&mut self, role: Role, ty: TypeId) -> DeriveResult<String> {
        let Some(&target) = self.bindings.get(&role) else {
            return Err(BindingError::Unbound {
                operation: self.registries[self.current.0].operation().to_string(),
                role: role.to_string(),
            }
            .into());
        };
        let resolver = self.resolver;
        self.registries[target.0].request_name(ty, resolver)
    }
}

/// 導出の設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeriveConfig {
    pub compare_prefix: String,
    pub sorted_keys_prefix: String,
    pub output_file_name: String,
}

impl Default for DeriveConfig {
    fn default() -> Self {
        Self {
            compare_prefix: "deriveCompare".to_string(),
            sorted_keys_prefix: "deriveSortedKeys".to_string(),
            output_file_name: "derived.gen.go".to_string(),
        }
    }
}

impl DeriveConfig {
    /// 接頭辞を検証する
    ///
    /// 呼び出し箇所は接頭辞で振り分けるので、一方が他方の接頭辞になっていると
    /// 同じ呼び出しが両方の操作に渡ってしまう。
    pub fn validate(&self) -> DeriveResult<()> {
        let compare = &self.compare_prefix;
        let sorted_keys = &self.sorted_keys_prefix;
        if compare.is_empty() || sorted_keys.is_empty() {
            return Err(DeriveError::Config {
                message: "関数名の接頭辞は空にできません".to_string(),
            });
        }
        if compare.starts_with(sorted_keys.as_str()) || sorted_keys.starts_with(compare.as_str()) {
            return Err(DeriveError::Config {
                message: format!(
                    "接頭辞 {} と {} が重なっているため呼び出しを振り分けられません",
                    compare, sorted_keys
                ),
            });
        }
        if self.output_file_name.is_empty() {
            return Err(DeriveError::Config {
                message: "出力ファイル名が空です".to_string(),
            });
        }
        Ok(())
    }
}

/// 実行結果の集計
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    /// 操作名ごとの生成関数数
    pub functions: Vec<(String, usize)>,
}

impl GenerationSummary {
    pub fn total(&self) -> usize {
        self.functions.iter().map(|(_, n)| n).sum()
    }
}

/// 導出のドライバ
///
/// 操作ごとのレジストリと役割の束縛を所有し、作業リストが空になるまで合成を繰り返す。
pub struct Generator<'r> {
    resolver: &'r dyn TypeResolver,
    printer: Printer,
    derivers: Vec<Box<dyn Deriver + 'r>>,
    registries: Vec<TypeRegistry>,
    bindings: HashMap<Role, OperationId>,
}

impl<'r> Generator<'r> {
    pub fn new(resolver: &'r dyn TypeResolver, printer: Printer) -> Self {
        Self {
            resolver,
            printer,
            derivers: Vec::new(),
            registries: Vec::new(),
            bindings: HashMap::new(),
        }
    }

    /// 比較とキー整列を登録し、互いの役割を束縛したドライバを作る
    pub fn standard<P>(package: &'r P, config: &DeriveConfig, mut printer: Printer) -> DeriveResult<Self>
    where
        P: TypeResolver + CallSiteExtractor,
    {
        config.validate()?;

        let compare_sites = package.call_sites(&config.compare_prefix);
        let sorted_keys_sites = package.call_sites(&config.sorted_keys_prefix);

        // パッケージで宣言済みの関数と同じ名前は生成しない
        let reserved = printer.reserved().clone();
        let mut compare_registry =
            TypeRegistry::with_reserved("compare", &config.compare_prefix, reserved.clone());
        let compare =
            CompareDeriver::new(&compare_sites, package, &mut compare_registry, &mut printer)?;

        let mut keys_registry =
            TypeRegistry::with_reserved("sortedKeys", &config.sorted_keys_prefix, reserved);
        let sorted_keys =
            SortedKeysDeriver::new(&sorted_keys_sites, package, &mut keys_registry, &mut printer)?;

        let mut generator = Generator::new(package, printer);
        let compare_id = generator.add_operation(Box::new(compare), compare_registry);
        let keys_id = generator.add_operation(Box::new(sorted_keys), keys_registry);
        generator.bind(Role::Comparator, compare_id)?;
        generator.bind(Role::KeyOrdering, keys_id)?;
        Ok(generator)
    }

    pub fn printer_mut(&mut self) -> &mut Printer {
        &mut self.printer
    }

    /// 操作とそのレジストリを登録する
    pub fn add_operation(
        &mut self,
        deriver: Box<dyn Deriver + 'r>,
        registry: TypeRegistry,
    ) -> OperationId {
        let id = OperationId(self.derivers.len());
        self.derivers.push(deriver);
        self.registries.push(registry);
        id
    }

    /// 役割を操作に束縛する
    pub fn bind(&mut self, role: Role, id: OperationId) -> DeriveResult<()> {
        if let Some(existing) = self.bindings.get(&role) {
            return Err(BindingError::AlreadyBound {
                role: role.to_string(),
                existing: self.derivers[existing.0].name().to_string(),
            }
            .into());
        }
        let Some(deriver) = self.derivers.get(id.0) else {
            return Err(DeriveError::Internal {
                message: format!("未登録の操作 {:?} に {} を束縛しようとしました", id, role),
            });
        };
        if deriver.provides() != role {
            return Err(DeriveError::Internal {
                message: format!(
                    "{} が提供するのは {} なので {} には束縛できません",
                    deriver.name(),
                    deriver.provides(),
                    role
                ),
            });
        }
        self.bindings.insert(role, id);
        Ok(())
    }

    pub fn registry(&self, id: OperationId) -> Option<&TypeRegistry> {
        self.registries.get(id.0)
    }

    /// すべての操作が必要とする役割が束縛されているか確認する
    fn check_bindings(&self) -> DeriveResult<()> {
        for deriver in &self.derivers {
            for role in deriver.requires() {
                if !self.bindings.contains_key(role) {
                    return Err(BindingError::Unbound {
                        operation: deriver.name().to_string(),
                        role: role.to_string(),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    /// 作業リストが空になるまで関数を合成する
    pub fn generate(&mut self) -> DeriveResult<GenerationSummary> {
        self.check_bindings()?;

        let mut counts = vec![0usize; self.derivers.len()];
        loop {
            let mut progressed = false;
            for index in 0..self.derivers.len() {
                while let Some(ty) = self.registries[index].next_pending() {
                    progressed = true;
                    log::debug!(
                        "{}: {} を合成します",
                        self.derivers[index].name(),
                        self.registries[index].func_name(ty).unwrap_or("?")
                    );

                    let mut cx = DeriveContext {
                        registries: &mut self.registries,
                        bindings: &self.bindings,
                        resolver: self.resolver,
                        printer: &mut self.printer,
                        current: OperationId(index),
                    };
                    self.derivers[index].synthesize(ty, &mut cx)?;
                    self.registries[index].mark_done(ty)?;
                    counts[index] += 1;
                }
            }
            if !progressed {
                break;
            }
        }

        let summary = GenerationSummary {
            functions: self
                .derivers
                .iter()
                .zip(counts)
                .map(|(deriver, n)| (deriver.name().to_string(), n))
                .collect(),
        };
        Ok(summary)
    }

    /// 生成を実行し、パッケージ `package` のソースとして組み立てる
    pub fn run(mut self, package: &str) -> DeriveResult<String> {
        let summary = self.generate()?;
        for (operation, count) in &summary.functions {
            log::info!("{}: {} 個の関数を生成しました", operation, count);
        }
        Ok(self.printer.render(package))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{type_string, BasicKind};

    struct ArenaResolver(TypeArena);

    impl TypeResolver for ArenaResolver {
        fn types(&self) -> &TypeArena {
            &self.0
        }

        fn canonical_name(&self, ty: TypeId) -> DeriveResult<String> {
            Ok(type_string(&self.0, ty))
        }
    }

    /// 依存先を1つだけ持つ操作
    struct Echo {
        requires: Vec<Role>,
    }

    impl Deriver for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn provides(&self) -> Role {
            Role::Comparator
        }

        fn requires(&self) -> &[Role] {
            &self.requires
        }

        fn synthesize(&mut self, ty: TypeId, cx: &mut DeriveContext<'_>) -> DeriveResult<()> {
            let name = cx.func_name(ty)?;
            cx.printer().line(format!("// {}", name));
            Ok(())
        }
    }

    #[test]
    fn test_unbound_role_fails_before_generation() {
        let mut arena = TypeArena::new();
        let int = arena.basic(BasicKind::Int);
        let resolver = ArenaResolver(arena);

        let mut registry = TypeRegistry::new("echo", "echo");
        registry.request_name(int, &resolver).unwrap();

        let mut generator = Generator::new(&resolver, Printer::new());
        generator.add_operation(
            Box::new(Echo {
                requires: vec![Role::KeyOrdering],
            }),
            registry,
        );
        let err = generator.run("main").unwrap_err();
        assert!(matches!(err, DeriveError::Binding(BindingError::Unbound { .. })));
    }

    #[test]
    fn test_role_cannot_be_bound_twice() {
        let resolver = ArenaResolver(TypeArena::new());
        let mut generator = Generator::new(&resolver, Printer::new());
        let id = generator.add_operation(
            Box::new(Echo { requires: vec![] }),
            TypeRegistry::new("echo", "echo"),
        );
        generator.bind(Role::Comparator, id).unwrap();
        let err = generator.bind(Role::Comparator, id).unwrap_err();
        assert!(matches!(
            err,
            DeriveError::Binding(BindingError::AlreadyBound { .. })
        ));
    }

    #[test]
    fn test_generate_drains_registry() {
        let mut arena = TypeArena::new();
        let int = arena.basic(BasicKind::Int);
        let string = arena.basic(BasicKind::String);
        let resolver = ArenaResolver(arena);

        let mut registry = TypeRegistry::new("echo", "echo");
        registry.request_name(int, &resolver).unwrap();
        registry.request_name(string, &resolver).unwrap();

        let mut generator = Generator::new(&resolver, Printer::new());
        let id = generator.add_operation(Box::new(Echo { requires: vec![] }), registry);
        let summary = generator.generate().unwrap();
        assert_eq!(summary.total(), 2);

        let registry = generator.registry(id).unwrap();
        assert!(registry
            .iter()
            .all(|(_, _, state)| state == GenerationState::Done));
    }

    #[test]
    fn test_default_config() {
        let config = DeriveConfig::default();
        assert_eq!(config.compare_prefix, "deriveCompare");
        assert_eq!(config.sorted_keys_prefix, "deriveSortedKeys");
        assert_eq!(config.output_file_name, "derived.gen.go");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_overlapping_prefixes() {
        let config = DeriveConfig {
            compare_prefix: "derive".to_string(),
            ..DeriveConfig::default()
        };
        assert!(matches!(config.validate(), Err(DeriveError::Config { .. })));
    }
}
