//! shapederive library
//!
//! Reads the Go source files of one package, finds calls to functions whose
//! names start with a configured prefix, and synthesizes those functions from
//! the static types of the call arguments.

pub mod ast;
pub mod derive;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod pipeline;
pub mod printer;
pub mod resolver;
pub mod types;

// Re-export commonly used types
pub use derive::{DeriveConfig, Generator};
pub use error::{DeriveError, DeriveResult, ErrorCollector};
pub use lexer::{Lexer, Token, TokenWithPosition};
pub use parser::{ParseError, ParseResult, Parser};
pub use pipeline::{GenerationPipeline, PipelineState};
pub use resolver::Package;
