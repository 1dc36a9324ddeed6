//! Process command - extract fields from a single OCR text file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use gstx_core::invoice::rules::format_amount;
use gstx_core::{ExtractionResult, FlatRecord, GstInvoiceParser, InvoiceParser, RuleProfile};

use super::{ensure_text_input, load_config};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input text file, or `-` for stdin
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Fail when the validation report is blocking
    #[arg(long)]
    validate: bool,

    /// Rule profile (overrides the config file)
    #[arg(long)]
    profile: Option<RuleProfile>,

    /// Show processing time and tax liability
    #[arg(long)]
    show_summary: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(profile) = args.profile {
        config.extraction.profile = profile;
    }

    let text = read_input(&args.input)?;
    info!("Processing {} ({} bytes)", args.input.display(), text.len());

    let parser = GstInvoiceParser::from_config(&config)?;
    let result = parser.parse(&text)?;

    let output = format_result(&result, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_summary {
        eprintln!(
            "{} Tax liability: {} (net payable {})",
            style("ℹ").blue(),
            format_amount(result.liability.total_tax_liability),
            format_amount(result.liability.net_tax_payable)
        );
        eprintln!(
            "{} Processing time: {}ms",
            style("ℹ").blue(),
            result.processing_time_ms
        );
    }

    if args.validate {
        let report = &result.report;
        if !report.is_clean() {
            eprintln!("{}", style("Validation issues:").yellow());
            for error in &report.errors {
                eprintln!("  {} {}", style("error:").red(), error);
            }
            for warning in &report.warnings {
                eprintln!("  {} {}", style("warning:").yellow(), warning);
            }
        }
        if report.is_blocking(config.validation.warnings_as_errors) {
            anyhow::bail!("Validation failed for {}", args.input.display());
        }
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Read OCR text from a file, or from stdin for `-`.
pub fn read_input(input: &Path) -> anyhow::Result<String> {
    if input.as_os_str() == "-" {
        return Ok(io::read_to_string(io::stdin())?);
    }

    ensure_text_input(input)?;
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }
    Ok(fs::read_to_string(input)?)
}

pub fn format_result(result: &ExtractionResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(result)?),
        OutputFormat::Csv => format_csv(result),
        OutputFormat::Text => Ok(format_text(result)),
    }
}

fn format_csv(result: &ExtractionResult) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.serialize(FlatRecord::from(&result.record))?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(result: &ExtractionResult) -> String {
    let record = &result.record;
    let flat = FlatRecord::from(record);
    let mut output = String::new();

    output.push_str(&format!("Invoice: {}\n", record.invoice_no.as_deref().unwrap_or("-")));
    output.push_str(&format!(
        "Date: {}\n",
        if flat.date.is_empty() { "-" } else { flat.date.as_str() }
    ));
    if let Some(gstin) = &record.customer_gstin {
        output.push_str(&format!("Customer GSTIN: {}\n", gstin));
    }
    output.push('\n');

    output.push_str("Summary:\n");
    output.push_str(&format!("  Taxable: {}\n", flat.taxable_value));
    output.push_str(&format!("  CGST:    {} @ {}%\n", flat.cgst_amount, flat.cgst_rate));
    output.push_str(&format!("  SGST:    {} @ {}%\n", flat.sgst_amount, flat.sgst_rate));
    output.push_str(&format!("  IGST:    {} @ {}%\n", flat.igst_amount, flat.igst_rate));
    output.push_str(&format!("  Total:   {}\n", flat.total_amount));

    if !result.apportioned_lines.is_empty() {
        output.push_str("\nTax lines:\n");
        for line in &result.apportioned_lines {
            output.push_str(&format!(
                "  {} {}%: {} on {}\n",
                line.tax_type,
                line.rate.normalize(),
                format_amount(line.amount),
                format_amount(line.taxable_share)
            ));
        }
    }

    let report = &result.report;
    if !report.is_clean() {
        output.push_str("\nValidation:\n");
        for error in &report.errors {
            output.push_str(&format!("  error: {}\n", error));
        }
        for warning in &report.warnings {
            output.push_str(&format!("  warning: {}\n", warning));
        }
    }

    output
}
