//! ローカルスコープ

use std::collections::HashMap;

use crate::error::ResolutionError;
use crate::types::TypeId;

/// ローカル変数の型（決定できない場合はその理由）
pub type Binding = Result<TypeId, ResolutionError>;

/// 入れ子になったローカルスコープのスタック
#[derive(Debug, Clone, Default)]
pub struct Scopes {
    frames: Vec<HashMap<String, Binding>>,
}

impl Scopes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// 最も内側のスコープに宣言する
    pub fn declare(&mut self, name: &str, binding: Binding) {
        if name == "_" {
            return;
        }
        if self.frames.is_empty() {
            self.push();
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.to_string(), binding);
        }
    }

    /// 内側から順に名前を探す
    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    pub fn is_local(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }
}
