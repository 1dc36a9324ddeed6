//! Batch processing command for multiple OCR text files.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use futures_util::stream::{self, StreamExt};
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use gstx_core::{
    DedupSink, ExtractionResult, FlatRecord, GstInvoiceParser, InvoiceParser, RecordSink,
};

use super::process::{format_result, read_input, OutputFormat};
use super::{ensure_text_input, load_config};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern for input text files
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also append rows to a deduplicated summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    result: Option<ExtractionResult>,
    error: Option<String>,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let parser = Arc::new(GstInvoiceParser::from_config(&config)?);

    // Expand glob pattern; scans still waiting for OCR are skipped, not failed
    let (mut files, skipped): (Vec<PathBuf>, Vec<PathBuf>) = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            matches!(ext.to_lowercase().as_str(), "txt" | "pdf" | "png" | "jpg" | "jpeg")
        })
        .partition(|p| ensure_text_input(p).is_ok());
    files.sort();

    for path in &skipped {
        warn!("Skipping {}: run OCR first and pass the recovered text", path.display());
    }
    if !skipped.is_empty() {
        println!(
            "{} Skipped {} scanned files without OCR text",
            style("ℹ").blue(),
            skipped.len()
        );
    }

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut tasks = stream::iter(files)
        .map(|path| {
            let parser = Arc::clone(&parser);
            async move {
                let worker_path = path.clone();
                let outcome = tokio::task::spawn_blocking(move || {
                    process_single_file(&worker_path, &parser)
                })
                .await
                .unwrap_or_else(|e| Err(anyhow::anyhow!("worker failed: {}", e)));
                (path, outcome)
            }
        })
        .buffer_unordered(args.jobs.max(1));

    let mut results = Vec::new();
    while let Some((path, outcome)) = tasks.next().await {
        pb.inc(1);

        match outcome {
            Ok(result) => results.push(ProcessResult {
                path,
                result: Some(result),
                error: None,
            }),
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(ProcessResult {
                        path,
                        result: None,
                        error: Some(error_msg),
                    });
                } else {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    pb.abandon();
                    anyhow::bail!("Processing failed for {}: {}", path.display(), error_msg);
                }
            }
        }
    }

    pb.finish_and_clear();
    results.sort_by(|a, b| a.path.cmp(&b.path));

    let (successful, failed): (Vec<_>, Vec<_>) =
        results.iter().partition(|r| r.result.is_some());

    if let Some(output_dir) = &args.output_dir {
        for entry in &successful {
            let Some(result) = &entry.result else {
                continue;
            };
            let output_name = entry
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("invoice");
            let output_path = output_dir.join(format!("{}.{}", output_name, args.format.extension()));

            fs::write(&output_path, format_result(result, args.format)?)?;
            debug!("Wrote output to {}", output_path.display());
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        let rows: Vec<FlatRecord> = successful
            .iter()
            .filter_map(|r| r.result.as_ref())
            .map(|r| FlatRecord::from(&r.record))
            .collect();
        let (written, skipped) = write_summary(&summary_path, &rows)?;

        println!(
            "{} Summary written to {} ({} new rows, {} duplicates skipped)",
            style("✓").green(),
            summary_path.display(),
            written,
            skipped
        );
    }

    let flagged = successful
        .iter()
        .filter(|r| {
            r.result
                .as_ref()
                .is_some_and(|res| res.report.is_blocking(config.validation.warnings_as_errors))
        })
        .count();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed, {} with validation issues",
        style(successful.len()).green(),
        style(failed.len()).red(),
        style(flagged).yellow()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for entry in &failed {
            println!(
                "  - {}: {}",
                entry.path.display(),
                entry.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn process_single_file(path: &Path, parser: &GstInvoiceParser) -> anyhow::Result<ExtractionResult> {
    let text = read_input(path)?;
    Ok(parser.parse(&text)?)
}

/// CSV file sink; appends to an existing file without repeating the header.
struct CsvSink {
    writer: csv::Writer<File>,
}

impl CsvSink {
    fn open(path: &Path, write_header: bool) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let writer = csv::WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(file);
        Ok(Self { writer })
    }
}

impl RecordSink for CsvSink {
    fn append(&mut self, row: &FlatRecord) -> gstx_core::Result<bool> {
        self.writer.serialize(row).map_err(io::Error::from)?;
        Ok(true)
    }
}

/// Append rows not yet present in the summary file. Returns (written, skipped).
fn write_summary(path: &Path, rows: &[FlatRecord]) -> anyhow::Result<(usize, usize)> {
    let existing: Vec<FlatRecord> = if path.exists() {
        csv::Reader::from_path(path)?
            .deserialize()
            .collect::<Result<_, _>>()?
    } else {
        Vec::new()
    };
    let is_new = !path.exists() || fs::metadata(path)?.len() == 0;

    let mut sink = DedupSink::new(CsvSink::open(path, is_new)?).with_existing(&existing);
    let mut written = 0;
    for row in rows {
        if sink.append(row)? {
            written += 1;
        }
    }

    let skipped = sink.skipped();
    sink.into_inner().writer.flush()?;
    Ok((written, skipped))
}
