//! CLI tool for extracting text, tables and statistics from office documents.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use office_core::{extract, Adapter, ExtractRequest, ExtractionResult};
use office_doc::DocAdapter;
use office_docx::DocxAdapter;
use office_pdf::PdfAdapter;
use office_pptx::PptxAdapter;
use std::io::Write;
use std::path::PathBuf;

/// Extract content from .doc, .docx, .pdf and .pptx files as JSON.
#[derive(Parser, Debug)]
#[command(name = "office-extract")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Legacy Word document (.doc)
    Doc(WordArgs),
    /// Word document (.docx)
    Docx(WordArgs),
    /// PDF document (.pdf)
    Pdf(PdfArgs),
    /// PowerPoint presentation (.pptx)
    Pptx(PptxArgs),
}

/// Options shared by every format.
#[derive(Args, Debug)]
struct CommonArgs {
    /// Input file
    file_path: PathBuf,

    /// Whether to return the content text (true/false, 1/0, yes/no, y/n)
    #[arg(long, value_name = "BOOL")]
    include_content: Option<String>,
}

#[derive(Args, Debug)]
struct TableRangeArgs {
    /// First table to include (1-based)
    #[arg(long)]
    table_start: Option<i64>,

    /// Last table to include (inclusive)
    #[arg(long)]
    table_end: Option<i64>,
}

#[derive(Args, Debug)]
#[command(allow_negative_numbers = true)]
struct WordArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// First paragraph to include (1-based)
    #[arg(long)]
    paragraph_start: Option<i64>,

    /// Last paragraph to include (inclusive)
    #[arg(long)]
    paragraph_end: Option<i64>,

    #[command(flatten)]
    tables: TableRangeArgs,
}

#[derive(Args, Debug)]
#[command(allow_negative_numbers = true)]
struct PdfArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// First page to include (1-based)
    #[arg(long)]
    page_start: Option<i64>,

    /// Last page to include (inclusive)
    #[arg(long)]
    page_end: Option<i64>,
}

#[derive(Args, Debug)]
#[command(allow_negative_numbers = true)]
struct PptxArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// First slide to include (1-based)
    #[arg(long)]
    slide_start: Option<i64>,

    /// Last slide to include (inclusive)
    #[arg(long)]
    slide_end: Option<i64>,

    /// Table range, numbered within the selected slides
    #[command(flatten)]
    tables: TableRangeArgs,

    /// Output mode: full or list
    #[arg(long, value_name = "MODE")]
    output_mode: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let result = run(&cli.command);
    write_result(&result)?;

    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}

/// Build the request for a subcommand and run it through its adapter.
fn run(command: &Command) -> ExtractionResult {
    let request = match command {
        Command::Doc(args) | Command::Docx(args) => word_request(args),
        Command::Pdf(args) => pdf_request(args),
        Command::Pptx(args) => pptx_request(args),
    };

    log::debug!("Processing: {}", request.path().display());
    extract(adapter_for(command), &request)
}

fn adapter_for(command: &Command) -> &'static dyn Adapter {
    match command {
        Command::Doc(_) => &DocAdapter,
        Command::Docx(_) => &DocxAdapter,
        Command::Pdf(_) => &PdfAdapter,
        Command::Pptx(_) => &PptxAdapter,
    }
}

fn base_request(common: &CommonArgs) -> ExtractRequest {
    let request = ExtractRequest::new(&common.file_path);
    match &common.include_content {
        Some(value) => request.with_include_content(value.as_str()),
        None => request,
    }
}

fn word_request(args: &WordArgs) -> ExtractRequest {
    base_request(&args.common)
        .with_unit_range(args.paragraph_start, args.paragraph_end)
        .with_table_range(args.tables.table_start, args.tables.table_end)
}

fn pdf_request(args: &PdfArgs) -> ExtractRequest {
    base_request(&args.common).with_unit_range(args.page_start, args.page_end)
}

fn pptx_request(args: &PptxArgs) -> ExtractRequest {
    let request = base_request(&args.common)
        .with_unit_range(args.slide_start, args.slide_end)
        .with_table_range(args.tables.table_start, args.tables.table_end);
    match &args.output_mode {
        Some(mode) => request.with_output_mode(mode.as_str()),
        None => request,
    }
}

/// Print the envelope as pretty JSON on stdout.
fn write_result(result: &ExtractionResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result).context("Failed to serialize result")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", json).context("Failed to write to stdout")?;
    out.flush().context("Failed to flush stdout")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use office_core::RangeRequest;

    fn parse(args: &[&str]) -> Command {
        Cli::try_parse_from(args.iter().copied()).unwrap().command
    }

    #[test]
    fn test_word_ranges_accept_negative_numbers() {
        let Command::Docx(args) = parse(&[
            "office-extract",
            "docx",
            "report.docx",
            "--paragraph-start",
            "-3",
            "--paragraph-end",
            "4",
            "--table-end",
            "2",
        ]) else {
            panic!("expected docx subcommand");
        };

        let request = word_request(&args);
        assert_eq!(request.unit_range, RangeRequest::new(Some(-3), Some(4)));
        assert_eq!(request.table_range, RangeRequest::new(None, Some(2)));
        assert_eq!(request.path(), std::path::Path::new("report.docx"));
    }

    #[test]
    fn test_pptx_options_are_passed_through() {
        let Command::Pptx(args) = parse(&[
            "office-extract",
            "pptx",
            "deck.pptx",
            "--slide-start",
            "2",
            "--output-mode",
            "list",
            "--include-content",
            "No",
        ]) else {
            panic!("expected pptx subcommand");
        };

        let options = pptx_request(&args).options().unwrap();
        assert!(!options.include_content);
        assert_eq!(options.output_mode, office_core::OutputMode::List);
    }

    #[test]
    fn test_invalid_option_becomes_failed_envelope() {
        let command = parse(&[
            "office-extract",
            "pptx",
            "/no/such/deck.pptx",
            "--output-mode",
            "table",
        ]);
        let result = run(&command);
        assert!(!result.success);
        assert!(result.error.is_some());
    }

    #[test]
    fn test_missing_file_json() {
        let command = parse(&["office-extract", "pdf", "/no/such/paper.pdf"]);
        let result = run(&command);
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string_pretty(&result).unwrap()).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["content"], "");
        assert_eq!(json["metadata"], serde_json::json!({}));
        assert_eq!(json["statistics"]["page_count"], 0);
        assert_eq!(json["statistics"]["char_count"], 0);
        assert!(json["error"].as_str().unwrap().contains("/no/such/paper.pdf"));
    }

    #[test]
    fn test_verbose_is_global() {
        let cli = Cli::try_parse_from(["office-extract", "doc", "memo.doc", "-v"]).unwrap();
        assert!(cli.verbose);
    }
}
