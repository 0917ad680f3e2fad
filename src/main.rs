use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use doc_extract::response::{self, ExtractOutcome};
use doc_extract::{Capabilities, EpubStrategy, ExtractConfig, ExtractionDispatcher};

#[derive(Debug, Parser)]
#[command(author, version, about = "Extract plain text from EPUB, PDF and text files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract text from a single file and print it to stdout
    Extract(ExtractArgs),
    /// Print the formats supported by this build
    Capabilities,
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// File to extract (.epub, .pdf or .txt)
    file: PathBuf,

    /// Path to configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the EPUB strategy from the configuration
    #[arg(long, value_enum)]
    epub_strategy: Option<StrategyArg>,

    /// Print a JSON result object instead of raw text
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum StrategyArg {
    Package,
    Library,
}

impl From<StrategyArg> for EpubStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Package => EpubStrategy::Package,
            StrategyArg::Library => EpubStrategy::Library,
        }
    }
}

fn main() -> Result<()> {
    // Logs go to stderr; stdout is reserved for extracted text
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract(args) => extract_command(args),
        Commands::Capabilities => {
            let capabilities = Capabilities::detect();
            println!("{}", serde_json::to_string_pretty(&response::health(&capabilities))?);
            Ok(())
        }
    }
}

fn extract_command(args: ExtractArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {:?}", path);
            ExtractConfig::load(path)?
        }
        None => ExtractConfig::default(),
    };

    if let Some(strategy) = args.epub_strategy {
        config.epub_strategy = strategy.into();
        config.validate()?;
    }

    let content = fs::read(&args.file)
        .with_context(|| format!("Failed to read input file: {:?}", args.file))?;

    let filename = args
        .file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let dispatcher = ExtractionDispatcher::new(&config);
    let result = dispatcher.dispatch(&filename, &content);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&ExtractOutcome::from(&result))?);
    }

    let extracted = result.with_context(|| format!("Failed to extract text from {:?}", args.file))?;

    info!(
        "Extracted {} characters from {} {}",
        extracted.char_count(),
        extracted.units,
        if extracted.units == 1 { "unit" } else { "units" }
    );

    if !args.json {
        println!("{}", extracted.text);
    }

    Ok(())
}
