use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use doc_extract::{Capabilities, DocumentFormat, ExtractConfig, ExtractionDispatcher};

#[derive(Debug, Parser)]
#[command(author, version, about = "Extract text from every supported document in a directory")]
struct Args {
    /// Input directory containing EPUB/PDF/TXT files
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory for extracted text files
    #[arg(short, long)]
    output: PathBuf,

    /// Path to configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct DocumentMetadata {
    filename: String,
    format: DocumentFormat,
    character_count: usize,
    unit_count: usize,
    output_file: String,
}

#[derive(Debug, Serialize)]
struct FailedDocument {
    filename: String,
    error_kind: String,
    message: String,
}

#[derive(Debug, Serialize)]
struct BatchMetadata {
    total_documents: usize,
    total_characters: usize,
    documents: Vec<DocumentMetadata>,
    failures: Vec<FailedDocument>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ExtractConfig::load(path)?,
        None => ExtractConfig::default(),
    };

    info!("Input directory: {:?}", args.input);
    info!("Output directory: {:?}", args.output);

    fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create output directory: {:?}", args.output))?;

    let dispatcher = ExtractionDispatcher::new(&config);
    let files = find_documents(&args.input, &dispatcher.capabilities());

    info!("Found {} documents", files.len());

    if files.is_empty() {
        anyhow::bail!("No supported documents found in {:?}", args.input);
    }

    let mut used_names = reserved_names(&files, &args.output);
    let mut documents = Vec::new();
    let mut failures = Vec::new();

    for (idx, path) in files.iter().enumerate() {
        info!("Processing {}/{}: {:?}", idx + 1, files.len(), path);

        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let content = match fs::read(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read {:?}: {}", path, e);
                failures.push(FailedDocument {
                    filename,
                    error_kind: "IoError".to_string(),
                    message: e.to_string(),
                });
                continue;
            }
        };

        match dispatcher.dispatch(&filename, &content) {
            Ok(extracted) => {
                let output_file = output_name(path, &mut used_names);
                let output_path = args.output.join(&output_file);

                fs::write(&output_path, &extracted.text)
                    .with_context(|| format!("Failed to write document: {:?}", output_path))?;

                documents.push(DocumentMetadata {
                    filename,
                    format: extracted.format,
                    character_count: extracted.char_count(),
                    unit_count: extracted.units,
                    output_file,
                });
            }
            Err(e) => {
                warn!("Failed to process {:?}: {}", path, e);
                failures.push(FailedDocument {
                    filename,
                    error_kind: e.kind().to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    let metadata = BatchMetadata {
        total_documents: documents.len(),
        total_characters: documents.iter().map(|doc| doc.character_count).sum(),
        documents,
        failures,
    };

    let metadata_path = args.output.join("metadata.json");
    let metadata_json = serde_json::to_string_pretty(&metadata)?;
    fs::write(&metadata_path, metadata_json)
        .with_context(|| format!("Failed to write metadata: {:?}", metadata_path))?;
    info!("Metadata saved to: {:?}", metadata_path);

    info!("Batch extraction complete!");
    info!("  - Documents: {}", metadata.total_documents);
    info!("  - Characters: {}", metadata.total_characters);
    info!("  - Failures: {}", metadata.failures.len());

    Ok(())
}

/// Files under `dir` whose extension this build can extract
fn find_documents(dir: &Path, capabilities: &Capabilities) -> Vec<PathBuf> {
    let supported = capabilities.supported_extensions();

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
                .is_some_and(|ext| supported.iter().any(|known| *known == ext))
        })
        .map(|e| e.into_path())
        .collect();

    files.sort();
    files
}

/// Names in the output directory that must not be written over: inputs
/// that live there (when `--output` points into the input tree)
fn reserved_names(files: &[PathBuf], output: &Path) -> HashSet<String> {
    let output = match output.canonicalize() {
        Ok(output) => output,
        Err(_) => return HashSet::new(),
    };

    files
        .iter()
        .filter(|path| {
            path.parent()
                .and_then(|parent| parent.canonicalize().ok())
                .is_some_and(|parent| parent == output)
        })
        .filter_map(|path| path.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .collect()
}

/// Pick a `.txt` name for `path` not yet in `used`, and claim it.
///
/// Tries `<stem>.txt`, then `<stem>.<ext>.txt`, then `<stem>-2.txt`,
/// `<stem>-3.txt` and so on.
fn output_name(path: &Path, used: &mut HashSet<String>) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string());

    let mut candidates = vec![format!("{}.txt", stem)];
    if let Some(ext) = path.extension() {
        candidates.push(format!("{}.{}.txt", stem, ext.to_string_lossy()));
    }

    let name = candidates
        .into_iter()
        .find(|name| !used.contains(name))
        .unwrap_or_else(|| {
            (2..)
                .map(|n| format!("{}-{}.txt", stem, n))
                .find(|name| !used.contains(name))
                .unwrap_or_default()
        });

    used.insert(name.clone());
    name
}
