//! 導出テストの共通モジュール

use shapederive::derive::DeriveConfig;
use shapederive::error::{DeriveError, DeriveResult};
use shapederive::pipeline::{GenerationPipeline, PipelineState};

/// 1ファイルのパッケージから生成したソースを返すヘルパー関数
pub fn generate(source: &str) -> DeriveResult<String> {
    generate_with(source, DeriveConfig::default())
}

pub fn generate_with(source: &str, config: DeriveConfig) -> DeriveResult<String> {
    let mut state = PipelineState::new();
    state.add_source("main.go", source.to_string());
    let mut pipeline = GenerationPipeline::new(state, config);
    pipeline.run().map(|generated| generated.source)
}

/// 生成に成功することを確認するヘルパー関数
pub fn assert_generate_success(source: &str) -> String {
    match generate(source) {
        Ok(output) => output,
        Err(e) => panic!("Generation should succeed: {}", e),
    }
}

/// 生成に失敗することを確認するヘルパー関数
pub fn assert_generate_error(source: &str) -> DeriveError {
    match generate(source) {
        Ok(output) => panic!("Generation should fail, got:\n{}", output),
        Err(e) => e,
    }
}

/// 生成されたソースから関数1つ分を取り出す
pub fn function<'a>(output: &'a str, name: &str) -> &'a str {
    let header = format!("func {}(", name);
    let start = output
        .find(&header)
        .unwrap_or_else(|| panic!("function {} not found in:\n{}", name, output));
    let end = output[start..]
        .find("\n}\n")
        .map(|offset| start + offset + 3)
        .unwrap_or(output.len());
    &output[start..end]
}

/// 関数定義の数
pub fn count_functions(output: &str, name: &str) -> usize {
    output.matches(&format!("func {}(", name)).count()
}

/// 行のリストから期待するソースを組み立てる
pub fn lines(lines: &[&str]) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

// サブモジュールの宣言
#[cfg(test)]
mod compare_test;
#[cfg(test)]
mod error_test;
#[cfg(test)]
mod registry_test;
#[cfg(test)]
mod sorted_keys_test;
