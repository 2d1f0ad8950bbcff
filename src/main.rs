use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

use shapederive::derive::DeriveConfig;
use shapederive::pipeline::{write_atomically, GenerationPipeline, PipelineState};

#[derive(Parser)]
#[command(name = "shapederive")]
#[command(author, version, about = "Generates comparison functions for Go types", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(clap::Args)]
struct PrefixArgs {
    /// JSON file with generator settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Function name prefix for comparison calls
    #[arg(long)]
    compare_prefix: Option<String>,

    /// Function name prefix for sorted-keys calls
    #[arg(long)]
    sorted_keys_prefix: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate derived functions for one package
    Generate {
        /// The Go source files of the package
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file (defaults to derived.gen.go next to the first input)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Print the generated source instead of writing it
        #[arg(long)]
        stdout: bool,

        /// Dump the parsed files to stdout
        #[arg(long)]
        dump_ast: bool,

        #[command(flatten)]
        prefixes: PrefixArgs,
    },

    /// Validate every call site without writing output
    Check {
        /// The Go source files of the package
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        prefixes: PrefixArgs,
    },
}

fn main() -> Result<()> {
    // Initialize logger before parsing CLI args
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbose flag
    if cli.verbose {
        log::set_max_level(log::LevelFilter::Debug);
    }

    let result = match cli.command {
        Commands::Generate {
            inputs,
            output,
            stdout,
            dump_ast,
            prefixes,
        } => generate(inputs, output, stdout, dump_ast, prefixes),
        Commands::Check { inputs, prefixes } => check(inputs, prefixes),
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}

fn load_config(prefixes: PrefixArgs) -> Result<DeriveConfig> {
    let mut config = match &prefixes.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Invalid config file: {:?}", path))?
        }
        None => DeriveConfig::default(),
    };
    if let Some(prefix) = prefixes.compare_prefix {
        config.compare_prefix = prefix;
    }
    if let Some(prefix) = prefixes.sorted_keys_prefix {
        config.sorted_keys_prefix = prefix;
    }
    log::debug!("config: {:?}", config);
    Ok(config)
}

fn generate(
    inputs: Vec<PathBuf>,
    output: Option<PathBuf>,
    stdout: bool,
    dump_ast: bool,
    prefixes: PrefixArgs,
) -> Result<()> {
    let config = load_config(prefixes)?;
    let state = PipelineState::from_paths(&inputs)?;
    let mut pipeline = GenerationPipeline::new(state, config);

    if dump_ast {
        let Some(files) = pipeline.parse_all() else {
            pipeline.report_errors()?;
            anyhow::bail!("Parsing failed");
        };
        println!("{}", "=== AST ===".blue().bold());
        println!("{}", serde_json::to_string_pretty(&files)?);
        println!();
    }

    let generated = match pipeline.run() {
        Ok(generated) => generated,
        Err(e) => {
            if !pipeline.state().has_errors() {
                pipeline.add_error(e.clone());
            }
            pipeline.report_errors()?;
            anyhow::bail!("Generation failed: {}", e);
        }
    };

    if stdout {
        print!("{}", generated.source);
        return Ok(());
    }

    let output_path = output.unwrap_or_else(|| pipeline.default_output_path());
    write_atomically(&output_path, &generated.source)
        .with_context(|| format!("Failed to write output file: {:?}", output_path))?;
    println!(
        "{}: Wrote {:?} for package {}",
        "success".green().bold(),
        output_path,
        generated.package
    );
    Ok(())
}

fn check(inputs: Vec<PathBuf>, prefixes: PrefixArgs) -> Result<()> {
    let config = load_config(prefixes)?;
    let state = PipelineState::from_paths(&inputs)?;
    let mut pipeline = GenerationPipeline::new(state, config);

    match pipeline.run() {
        Ok(generated) => {
            println!(
                "{}: No errors found in package {}",
                "success".green().bold(),
                generated.package
            );
            Ok(())
        }
        Err(e) => {
            if !pipeline.state().has_errors() {
                pipeline.add_error(e.clone());
            }
            pipeline.report_errors()?;
            anyhow::bail!("Check failed");
        }
    }
}
