//! CLI entry point for glscrape.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

/// glscrape: generate C# bindings from C headers and XML API registries.
#[derive(Parser, Debug)]
#[command(name = "glscrape", version, about)]
struct Cli {
    /// Path to the glscrape.toml configuration file.
    #[arg(default_value = "glscrape.toml")]
    config: PathBuf,

    /// Output file path (overrides config).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Fail if any native type cannot be mapped (overrides config).
    #[arg(long)]
    strict: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("glscrape=info")),
        )
        .init();

    let cli = Cli::parse();

    let mut cfg = glscrape::config::load_config(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    if cli.strict {
        cfg.conversion.strict = true;
    }
    let base_dir = cli.config.parent().unwrap_or_else(|| Path::new("."));

    glscrape::write_output(&cfg, base_dir, cli.output.as_deref())?;
    Ok(())
}
