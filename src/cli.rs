use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Rank households by need using weighted SAW and TOPSIS",
    long_about = None
)]
pub struct Cli {
    /// YAML settings file (output_dir, state_file, delimiter, input_encoding, sheet)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Validate a household file, rank it, and write the ranking
    Rank(RankArgs),
    /// Re-export the most recent ranking, optionally filtered by RW/RT/Dusun
    Export(ExportArgs),
    /// Check that a household file can be ranked without ranking it
    Verify(VerifyArgs),
    /// Write a blank input template with the expected columns
    Template(TemplateArgs),
}

#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// Input file (.csv, .tsv, .xlsx, .xls, .ods; '-' reads CSV from stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of CSV input (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Worksheet to read from spreadsheet input (defaults to the first one)
    #[arg(long)]
    pub sheet: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct RegionArgs {
    /// Keep only rows with this RW
    #[arg(long)]
    pub rw: Option<String>,
    /// Keep only rows with this RT
    #[arg(long)]
    pub rt: Option<String>,
    /// Keep only rows with this Dusun
    #[arg(long)]
    pub dusun: Option<String>,
}

#[derive(Debug, Args)]
pub struct RankArgs {
    #[command(flatten)]
    pub source: InputArgs,
    /// Output CSV file ('-' for stdout); defaults to a timestamped file in the output directory
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Directory for timestamped output files
    #[arg(long = "output-dir")]
    pub output_dir: Option<PathBuf>,
    /// Snapshot file holding the most recent ranking
    #[arg(long)]
    pub state: Option<PathBuf>,
    /// Also print the ranking as a table (only the filtered rows when RW/RT/Dusun is given)
    #[arg(long)]
    pub table: bool,
    /// Also write the rows matching these constraints to a timestamped filter file
    #[command(flatten)]
    pub region: RegionArgs,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Output CSV file ('-' for stdout); defaults to a timestamped file in the output directory
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Directory for timestamped output files
    #[arg(long = "output-dir")]
    pub output_dir: Option<PathBuf>,
    /// Snapshot file holding the most recent ranking
    #[arg(long, conflicts_with = "from")]
    pub state: Option<PathBuf>,
    /// Read the ranking from a previously exported CSV instead of the snapshot
    #[arg(long)]
    pub from: Option<PathBuf>,
    /// Also print the exported rows as a table
    #[arg(long)]
    pub table: bool,
    #[command(flatten)]
    pub region: RegionArgs,
}

#[derive(Debug, Args)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub source: InputArgs,
}

#[derive(Debug, Args)]
pub struct TemplateArgs {
    /// Destination CSV file ('-' for stdout)
    #[arg(short = 'o', long = "output", default_value = "template.csv")]
    pub output: PathBuf,
    /// CSV delimiter character for the template
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
