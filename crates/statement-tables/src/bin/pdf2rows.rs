use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use statement_tables::{
    DEFAULT_HEADER_COLUMNS, ExtractOptions, ExtractionResult, HeaderMatch, PageSelection,
    extract_pdf, write_csv,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "pdf2rows",
    version,
    about = "Extract bank-statement transaction rows from PDFs into CSV"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract and merge the transaction tables of one statement.
    Extract(ExtractArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum HeaderRule {
    /// Any of the first --header-columns cells equal.
    Leading,
    /// Every cell equal.
    WholeRow,
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Input PDF path.
    #[arg(short, long)]
    input: PathBuf,

    /// Output CSV path.
    #[arg(short, long)]
    output: PathBuf,

    /// Page selection like 1-3,5.
    #[arg(long)]
    pages: Option<String>,

    /// Minimum cells required per text-layout table row.
    #[arg(long, default_value_t = 2)]
    min_cols: usize,

    /// How a repeated page header is recognised.
    #[arg(long, value_enum, default_value_t = HeaderRule::Leading)]
    header_match: HeaderRule,

    /// Leading cells compared by the `leading` header rule.
    #[arg(long, default_value_t = DEFAULT_HEADER_COLUMNS)]
    header_columns: usize,

    /// Output delimiter character.
    #[arg(long, default_value = ",")]
    delimiter: char,

    /// Print a summary of the extraction.
    #[arg(short, long)]
    verbose: bool,
}

fn parse_options(args: &ExtractArgs) -> Result<ExtractOptions> {
    let pages = args
        .pages
        .as_deref()
        .map(PageSelection::from_str)
        .transpose()
        .context("failed to parse --pages")?;

    let header_match = match args.header_match {
        HeaderRule::Leading => HeaderMatch::LeadingColumns(args.header_columns),
        HeaderRule::WholeRow => HeaderMatch::WholeRow,
    };

    Ok(ExtractOptions {
        pages,
        min_cols: args.min_cols,
        header_match,
    })
}

fn delimiter_byte(delimiter: char) -> Result<u8> {
    if !delimiter.is_ascii() {
        anyhow::bail!("delimiter must be a single ASCII character");
    }
    Ok(delimiter as u8)
}

fn log_result(result: &ExtractionResult, verbose: bool) {
    if !verbose {
        return;
    }

    eprintln!(
        "method={} pages_processed={} total_rows={} rows_written={}",
        result.method_used,
        result.pages_processed,
        result.total_rows,
        result.rows.len()
    );
}

fn run_extract(args: &ExtractArgs) -> Result<ExtractionResult> {
    let options = parse_options(args)?;
    let delimiter = delimiter_byte(args.delimiter)?;
    let result = extract_pdf(&args.input, &options)
        .with_context(|| format!("failed to extract rows from '{}'", args.input.display()))?;
    write_csv(&args.output, &result.rows, delimiter)
        .with_context(|| format!("failed to write '{}'", args.output.display()))?;
    Ok(result)
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("statement_tables=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Extract(args) => match run_extract(&args) {
            Ok(result) => {
                log_result(&result, args.verbose);
                if result.rows.is_empty() {
                    ExitCode::from(2)
                } else {
                    ExitCode::SUCCESS
                }
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                ExitCode::from(1)
            }
        },
    }
}
