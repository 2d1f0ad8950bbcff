//! 生成パイプライン
//!
//! ファイル群を字句解析・構文解析し、パッケージを構築してから導出を実行する。
//! 字句・構文エラーはファイルをまたいで蓄積し、すべて報告してから中断する。
//! 出力はすべての生成が成功した場合にのみ書き出される。

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use crate::ast::{SourceFile, Span};
use crate::derive::{DeriveConfig, Generator};
use crate::error::{DeriveError, DeriveResult, ErrorCollector, LexerError};
use crate::lexer::{Lexer, Token, TokenWithPosition};
use crate::parser::Parser;
use crate::printer::{Printer, GENERATED_HEADER};
use crate::resolver::Package;

/// 入力ソースとエラーを管理する構造体
pub struct PipelineState {
    pub files: SimpleFiles<String, String>,
    /// (ファイル番号, ファイル名)
    sources: Vec<(usize, String)>,
    pub error_collector: ErrorCollector,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineState {
    pub fn new() -> Self {
        Self {
            files: SimpleFiles::new(),
            sources: Vec::new(),
            error_collector: ErrorCollector::new(),
        }
    }

    /// ファイルを読み込んで状態を作成
    pub fn from_paths<P: AsRef<Path>>(paths: &[P]) -> DeriveResult<Self> {
        let mut state = Self::new();
        for path in paths {
            let path = path.as_ref();
            let source = fs::read_to_string(path).map_err(|e| {
                DeriveError::Io(format!("{} を読み込めません: {}", path.display(), e))
            })?;
            state.add_source(&path.display().to_string(), source);
        }
        Ok(state)
    }

    /// ソースを追加してファイル番号を返す
    pub fn add_source(&mut self, name: &str, source: String) -> usize {
        let file_id = self.files.add(name.to_string(), source);
        self.sources.push((file_id, name.to_string()));
        file_id
    }

    pub fn file_ids(&self) -> Vec<usize> {
        self.sources.iter().map(|(id, _)| *id).collect()
    }

    pub fn source(&self, file_id: usize) -> Option<&str> {
        self.files.get(file_id).ok().map(|file| file.source().as_str())
    }

    pub fn file_name(&self, file_id: usize) -> Option<&str> {
        self.sources
            .iter()
            .find(|(id, _)| *id == file_id)
            .map(|(_, name)| name.as_str())
    }

    pub fn add_error(&mut self, error: DeriveError) {
        self.error_collector.add_error(error);
    }

    /// 診断情報を標準エラーに報告
    pub fn report_diagnostics(&self) -> DeriveResult<()> {
        let writer = StandardStream::stderr(ColorChoice::Auto);
        let config = codespan_reporting::term::Config::default();

        for error in self.error_collector.errors() {
            let diagnostic = error.to_diagnostic();
            codespan_reporting::term::emit(&mut writer.lock(), &config, &self.files, &diagnostic)
                .map_err(|e| DeriveError::Io(format!("診断を出力できません: {}", e)))?;
        }
        Ok(())
    }

    pub fn has_errors(&self) -> bool {
        self.error_collector.has_errors()
    }

    pub fn error_count(&self) -> usize {
        self.error_collector.error_count()
    }
}

/// 生成結果
#[derive(Debug, Clone)]
pub struct GeneratedSource {
    pub package: String,
    pub source: String,
}

/// 生成パイプライン
pub struct GenerationPipeline {
    state: PipelineState,
    config: DeriveConfig,
}

impl GenerationPipeline {
    pub fn new(state: PipelineState, config: DeriveConfig) -> Self {
        Self { state, config }
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn config(&self) -> &DeriveConfig {
        &self.config
    }

    /// 字句解析を実行
    pub fn tokenize(&mut self, file_id: usize) -> Vec<TokenWithPosition> {
        log::debug!("ステップ: 字句解析 ({})", self.state.file_name(file_id).unwrap_or("?"));

        let source = self.state.source(file_id).unwrap_or_default().to_string();
        let tokens = Lexer::new(&source).collect_tokens();

        for token in &tokens {
            if matches!(token.token, Token::Error) {
                let text = source
                    .get(token.span.clone())
                    .unwrap_or("不明")
                    .to_string();
                self.state.add_error(
                    LexerError::UnrecognizedToken {
                        token: text,
                        span: Span::in_file(file_id, token.span.start, token.span.end),
                    }
                    .into(),
                );
            }
        }

        tokens
    }

    /// 構文解析を実行
    pub fn parse(&mut self, file_id: usize, tokens: Vec<TokenWithPosition>) -> Option<SourceFile> {
        log::debug!("ステップ: 構文解析 ({})", self.state.file_name(file_id).unwrap_or("?"));

        let mut parser = Parser::with_file(tokens, file_id);
        match parser.parse() {
            Ok(file) => Some(file),
            Err(e) => {
                self.state.add_error(e.into());
                None
            }
        }
    }

    /// すべての入力ファイルを解析する。エラーがあれば `None`
    pub fn parse_all(&mut self) -> Option<Vec<SourceFile>> {
        let mut files = Vec::new();
        for file_id in self.state.file_ids() {
            if self
                .state
                .source(file_id)
                .is_some_and(|source| source.starts_with(GENERATED_HEADER))
            {
                log::info!(
                    "生成済みファイル {} を入力から除外します",
                    self.state.file_name(file_id).unwrap_or("?")
                );
                continue;
            }

            let tokens = self.tokenize(file_id);
            let lexer_failed = tokens.iter().any(|t| matches!(t.token, Token::Error));
            if lexer_failed {
                continue;
            }
            if let Some(file) = self.parse(file_id, tokens) {
                files.push(file);
            }
        }

        if self.state.has_errors() {
            None
        } else {
            Some(files)
        }
    }

    /// パッケージを構築（型解決と呼び出し箇所の抽出）
    pub fn resolve(&self, files: &[SourceFile]) -> DeriveResult<Package> {
        log::debug!("ステップ: 型解決");
        Package::build(files)
    }

    /// 導出を実行してソースを返す
    pub fn derive(&self, package: &Package) -> DeriveResult<String> {
        log::debug!("ステップ: 導出");
        let printer = Printer::with_reserved(package.declared_names());
        let generator = Generator::standard(package, &self.config, printer)?;
        generator.run(package.name())
    }

    /// パイプライン全体を実行する
    ///
    /// 字句・構文エラーは状態に蓄積され、最初のエラーが返される。
    pub fn run(&mut self) -> DeriveResult<GeneratedSource> {
        let files = match self.parse_all() {
            Some(files) => files,
            None => {
                let first = self
                    .state
                    .error_collector
                    .errors()
                    .first()
                    .map(|e| e.error.clone());
                return Err(first
                    .unwrap_or_else(|| DeriveError::Other("解析に失敗しました".to_string())));
            }
        };

        let package = self.resolve(&files)?;
        let source = self.derive(&package)?;
        log::info!("パッケージ {} の生成が完了しました", package.name());
        Ok(GeneratedSource {
            package: package.name().to_string(),
            source,
        })
    }

    /// 既定の出力先（最初の入力ファイルと同じディレクトリ）
    pub fn default_output_path(&self) -> PathBuf {
        let dir = self
            .state
            .file_ids()
            .first()
            .and_then(|id| self.state.file_name(*id))
            .and_then(|name| Path::new(name).parent().map(Path::to_path_buf))
            .unwrap_or_default();
        dir.join(&self.config.output_file_name)
    }

    /// エラーレポートを生成
    pub fn report_errors(&self) -> DeriveResult<()> {
        self.state.report_diagnostics()?;
        if self.state.has_errors() {
            eprintln!(
                "\n生成エラー: {} 個のエラーが見つかりました",
                self.state.error_count()
            );
        }
        Ok(())
    }

    /// パイプラインの外で起きたエラーも診断として報告できるように追加する
    pub fn add_error(&mut self, error: DeriveError) {
        self.state.add_error(error);
    }
}

/// 一時ファイルに書いてから置き換えることで、出力を原子的に書き込む
pub fn write_atomically(path: &Path, contents: &str) -> DeriveResult<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(&dir)?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    file.persist(path)?;
    Ok(())
}
