//! 生成コードの出力先
//!
//! 行の蓄積とインデントの管理だけを行い、意味的な役割は持たない。
//! importは要求された時点では予約だけされ、実際に名前が参照されたものだけが
//! 出力される（Goは未使用のimportを許さないため）。

use std::collections::HashSet;

/// 生成ファイルの先頭行
pub const GENERATED_HEADER: &str = "// Code generated by shapederive. DO NOT EDIT.";

/// 予約済みimportへの参照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImportRef(usize);

#[derive(Debug)]
struct ImportEntry {
    path: String,
    alias: String,
    used: bool,
}

/// インデント付きでGoのソースを組み立てる
#[derive(Debug, Default)]
pub struct Printer {
    lines: Vec<String>,
    depth: usize,
    imports: Vec<ImportEntry>,
    /// 別名に使えない識別子（パッケージレベルの宣言）
    reserved: HashSet<String>,
}

impl Printer {
    pub fn new() -> Self {
        Self::default()
    }

    /// パッケージで宣言済みの識別子を避けて別名を付けるプリンタ
    pub fn with_reserved(reserved: HashSet<String>) -> Self {
        Self {
            reserved,
            ..Self::default()
        }
    }

    /// 別名に使えない識別子
    pub fn reserved(&self) -> &HashSet<String> {
        &self.reserved
    }

    /// 現在のインデントで1行出力する
    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if text.is_empty() {
            self.lines.push(String::new());
        } else {
            self.lines.push(format!("{}{}", "\t".repeat(self.depth), text));
        }
    }

    pub fn blank(&mut self) {
        self.lines.push(String::new());
    }

    pub fn indent(&mut self) {
        self.depth += 1;
    }

    pub fn unindent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// 行を出力してからインデントを深くする（`if x {` など）
    pub fn open(&mut self, text: impl AsRef<str>) {
        self.line(text);
        self.indent();
    }

    /// インデントを戻してから行を出力する（`}` など）
    pub fn close(&mut self, text: impl AsRef<str>) {
        self.unindent();
        self.line(text);
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// importを予約する。同じパスは同じ参照を返す
    pub fn new_import(&mut self, path: &str) -> ImportRef {
        if let Some(index) = self.imports.iter().position(|i| i.path == path) {
            return ImportRef(index);
        }

        let base = path.rsplit('/').next().unwrap_or(path).to_string();
        let mut alias = base.clone();
        let mut suffix = 1;
        while self.reserved.contains(&alias) || self.imports.iter().any(|i| i.alias == alias) {
            alias = format!("{}{}", base, suffix);
            suffix += 1;
        }

        self.imports.push(ImportEntry {
            path: path.to_string(),
            alias,
            used: false,
        });
        ImportRef(self.imports.len() - 1)
    }

    /// 生成コード中で使う名前（参照した時点で出力対象になる）
    pub fn import_name(&mut self, import: ImportRef) -> String {
        match self.imports.get_mut(import.0) {
            Some(entry) => {
                entry.used = true;
                entry.alias.clone()
            }
            None => String::new(),
        }
    }

    /// 本体の行（ヘッダなし）
    pub fn body(&self) -> String {
        let mut out = self.lines.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }

    /// ファイル全体を組み立てる
    pub fn render(&self, package: &str) -> String {
        let mut out = String::new();
        out.push_str(GENERATED_HEADER);
        out.push_str("\n\n");
        out.push_str(&format!("package {}\n", package));

        let mut used: Vec<&ImportEntry> = self.imports.iter().filter(|i| i.used).collect();
        used.sort_by(|a, b| a.path.cmp(&b.path));
        if !used.is_empty() {
            out.push_str("\nimport (\n");
            for entry in used {
                let base = entry.path.rsplit('/').next().unwrap_or(&entry.path);
                if entry.alias == base {
                    out.push_str(&format!("\t{:?}\n", entry.path));
                } else {
                    out.push_str(&format!("\t{} {:?}\n", entry.alias, entry.path));
                }
            }
            out.push_str(")\n");
        }

        if !self.lines.is_empty() {
            if self.lines.first().is_some_and(|l| !l.is_empty()) {
                out.push('\n');
            }
            out.push_str(&self.body());
        }
        out
    }
}
