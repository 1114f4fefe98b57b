//! sheetconv - typed conversion of spreadsheet-like files

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use sheetconv::config::{
    parse_assignments, parse_delimiter, parse_types, ConvertConfig, ExportConfig, HeaderCase,
    IngestOptions, LoadOptions, OutputFormat, OutputOptions, QueryConfig, QueryOptions,
    SheetSelector, DEFAULT_TABLE_NAME,
};
use sheetconv::model::CellValue;
use sheetconv::parser::SourceFormat;
use sheetconv::task;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutputFormat {
    Csv,
    Json,
    Jsonl,
    Parquet,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(f: CliOutputFormat) -> Self {
        match f {
            CliOutputFormat::Csv => OutputFormat::Csv,
            CliOutputFormat::Json => OutputFormat::Json,
            CliOutputFormat::Jsonl => OutputFormat::JsonLines,
            CliOutputFormat::Parquet => OutputFormat::Parquet,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliHeaderCase {
    AsIs,
    Lower,
    Upper,
    Skip,
}

impl From<CliHeaderCase> for HeaderCase {
    fn from(h: CliHeaderCase) -> Self {
        match h {
            CliHeaderCase::AsIs => HeaderCase::AsIs,
            CliHeaderCase::Lower => HeaderCase::Lower,
            CliHeaderCase::Upper => HeaderCase::Upper,
            CliHeaderCase::Skip => HeaderCase::Skip,
        }
    }
}

/// Typed conversion of spreadsheets and tabular files (XLS, XLSX, CSV, JSON, Parquet)
#[derive(Parser, Debug)]
#[command(name = "sheetconv")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a worksheet using its first row as header
    Convert(ConvertArgs),
    /// Load a worksheet into SQLite, run a query and write the result
    Query(QueryArgs),
    /// Re-save a worksheet as an .xlsx workbook
    ToXlsx(ExportArgs),
}

/// How to read the source
#[derive(Args, Debug)]
struct InputArgs {
    /// Source file
    source: PathBuf,

    /// Worksheet title or zero-based number
    #[arg(short = 'w', long, default_value = "0")]
    worksheet: String,

    /// Number of input rows to skip
    #[arg(long, default_value_t = 0)]
    skip_rows: usize,

    /// Source format, overriding the file extension
    #[arg(long)]
    input_format: Option<String>,

    /// Delimiter of CSV sources
    #[arg(long, default_value = ",")]
    input_delimiter: String,
}

impl InputArgs {
    fn load_options(&self) -> Result<LoadOptions> {
        let mut load = LoadOptions::default()
            .with_sheet(self.worksheet.parse::<SheetSelector>()?)
            .with_skip_rows(self.skip_rows)
            .with_csv_delimiter(parse_delimiter(&self.input_delimiter)?);
        if let Some(ref format) = self.input_format {
            load = load.with_format(format.parse::<SourceFormat>()?);
        }
        Ok(load)
    }
}

/// How to write the target
#[derive(Args, Debug)]
struct OutputArgs {
    /// Target file
    #[arg(short, long)]
    output: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "parquet")]
    format: CliOutputFormat,

    /// CSV delimiter
    #[arg(long, default_value = ",")]
    delimiter: String,

    /// CSV header case
    #[arg(long, value_enum, default_value = "as-is")]
    header: CliHeaderCase,

    /// Force column types (COLUMN=TYPE, e.g. amount=d, day=datetime64[ns])
    #[arg(short, long = "type")]
    types: Vec<String>,
}

impl OutputArgs {
    fn output_options(&self) -> Result<OutputOptions> {
        Ok(OutputOptions::new(self.format.into())
            .with_csv_delimiter(parse_delimiter(&self.delimiter)?)
            .with_csv_header(self.header.into()))
    }
}

#[derive(Args, Debug)]
struct ConvertArgs {
    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    output: OutputArgs,

    /// Force column names, in source column order
    #[arg(short = 'n', long = "name")]
    names: Vec<String>,

    /// Add a constant column (COLUMN=VALUE)
    #[arg(short = 'a', long = "add-col")]
    add_columns: Vec<String>,

    /// Drop a column from the output
    #[arg(short = 'd', long = "drop-col")]
    drop_columns: Vec<String>,

    /// Maximum number of data rows
    #[arg(long)]
    limit: Option<usize>,

    /// Include the `_index` column
    #[arg(long)]
    index: bool,
}

#[derive(Args, Debug)]
struct QueryArgs {
    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    output: OutputArgs,

    /// SQL query run against the loaded worksheet
    #[arg(short, long)]
    query: String,

    /// Name of the table holding the worksheet
    #[arg(long, default_value = DEFAULT_TABLE_NAME)]
    table: String,

    /// Name columns from the first row instead of A, B, C, ...
    #[arg(long)]
    first_row_as_header: bool,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Target file
    #[arg(short, long)]
    output: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sheetconv=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Convert(args) => {
            let mut ingest = IngestOptions::default()
                .with_drop_columns(args.drop_columns)
                .with_index(args.index);
            if !args.names.is_empty() {
                ingest = ingest.with_column_names(args.names);
            }
            if let Some(limit) = args.limit {
                ingest = ingest.with_limit(limit);
            }
            for (name, tag) in parse_types(&args.output.types)? {
                ingest = ingest.with_type(name, tag);
            }
            for (name, value) in parse_assignments(&args.add_columns)? {
                ingest = ingest.with_added_column(name, CellValue::Text(value));
            }

            let config = ConvertConfig::new(&args.input.source, &args.output.output)
                .with_load(args.input.load_options()?)
                .with_ingest(ingest)
                .with_output(args.output.output_options()?);
            task::convert(&config)?;
        }
        Command::Query(args) => {
            let mut query = QueryOptions::new(args.query)
                .with_table_name(args.table)
                .with_first_row_as_header(args.first_row_as_header);
            for (name, tag) in parse_types(&args.output.types)? {
                query = query.with_type(name, tag);
            }

            let config = QueryConfig::new(&args.input.source, &args.output.output, "")
                .with_load(args.input.load_options()?)
                .with_query(query)
                .with_output(args.output.output_options()?);
            task::query(&config)?;
        }
        Command::ToXlsx(args) => {
            let config = ExportConfig::new(&args.input.source, &args.output)
                .with_load(args.input.load_options()?);
            task::to_xlsx(&config)?;
        }
    }

    Ok(())
}
