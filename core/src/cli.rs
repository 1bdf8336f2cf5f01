use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::diag::Diagnostics;
use crate::interpreter::{eval_expr, Scope};
use crate::parser::{parse_expression, parse_file};
use crate::typecheck::check_expressions;

#[derive(Parser)]
#[command(name = "tessera")]
#[command(about = "Tessera - parse, check and evaluate configuration files", long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default search)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter (overrides config file and env vars)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the syntax tree of a file as JSON
    Parse {
        /// File to parse
        file: PathBuf,

        /// Print on a single line
        #[arg(long)]
        compact: bool,
    },

    /// Parse a file and evaluate its constant expressions
    Check {
        /// File to check
        file: PathBuf,
    },

    /// Evaluate a constant expression and print the result as JSON
    Eval {
        /// Expression source, e.g. "1 + 2 * 3"
        expression: String,
    },

    /// Print the effective configuration
    Config,
}

/// Run the CLI by parsing process arguments
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    run_cli_with_args(cli)
}

/// Run the CLI with explicit arguments
pub fn run_cli_from_args(args: Vec<String>) -> Result<()> {
    let cli = Cli::parse_from(args);
    run_cli_with_args(cli)
}

fn run_cli_with_args(cli: Cli) -> Result<()> {
    let config = Config::builder()
        .config_path(cli.config)
        .log_level(cli.log_level)
        .build()
        .context("Failed to load configuration")?;

    init_logging(&config);
    debug!(log_level = %config.log_level, "logging initialized");

    match cli.command {
        Commands::Parse { file, compact } => {
            let source = read_source(&file)?;
            let ast = parse_file(&source)
                .with_context(|| format!("Failed to parse {}", file.display()))?;

            let json = if compact {
                serde_json::to_string(&ast)?
            } else {
                serde_json::to_string_pretty(&ast)?
            };
            println!("{}", json);
        }

        Commands::Check { file } => {
            let source = read_source(&file)?;
            let ast = parse_file(&source)
                .with_context(|| format!("Failed to parse {}", file.display()))?;

            let diags = check_expressions(&ast);
            info!(file = %file.display(), diagnostics = diags.len(), "checked file");
            print_diagnostics(&file, &diags, &config);

            if diags.has_errors() {
                anyhow::bail!("{} has {} problem(s)", file.display(), diags.len());
            }
            println!("✓ {} is valid", file.display());
        }

        Commands::Eval { expression } => {
            let expr = parse_expression(&expression).context("Failed to parse expression")?;
            let value = eval_expr(&expr, &Scope::new()).context("Failed to evaluate expression")?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }

        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

/// Install the stderr `tracing` subscriber. A second call is a no-op.
pub fn init_logging(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn print_diagnostics(file: &Path, diags: &Diagnostics, config: &Config) {
    let shown = config.diagnostic_limit(diags.len());
    for diag in diags.iter().take(shown) {
        if diag.start.is_known() {
            eprintln!("{}: {}:{}", diag.severity, file.display(), diag);
        } else {
            eprintln!("{}: {}: {}", diag.severity, file.display(), diag);
        }
    }
    if shown < diags.len() {
        eprintln!("... and {} more", diags.len() - shown);
    }
}
