//! CLI argument parsing for covgate

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "covgate")]
#[command(version)]
#[command(about = "Extract, filter and gate native code coverage from compiled test binaries", long_about = None)]
pub struct Cli {
    /// Enable debug tracing output to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    /// Print each external command line before running it
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML file overriding tool paths, extensions and default file names
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a consolidated trace file from gcno/gcda counters
    Lcov(LcovArgs),
    /// Render an HTML coverage view from LLVM profiles
    Html(HtmlArgs),
    /// Filtered covered/uncovered line counts for one binary
    Extract(ExtractArgs),
    /// Collect coverage for a finished test run into one trace file
    Collect(CollectArgs),
}

#[derive(Args, Debug)]
pub struct LcovArgs {
    /// Directories containing counter files (default: current directory)
    #[arg(value_name = "BIN_DIR")]
    pub bin_dirs: Vec<PathBuf>,

    /// Output directory (required with more than one BIN_DIR)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Trace file name inside the output directory
    #[arg(long, value_name = "NAME")]
    pub output_filename: Option<String>,

    /// grcov output type (e.g. lcov, ade, coveralls)
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub output_type: Option<String>,

    /// Counters were not produced by LLVM
    #[arg(long)]
    pub not_llvm: bool,
}

#[derive(Args, Debug)]
pub struct HtmlArgs {
    /// Directory with profiles and executables (default: current directory)
    #[arg(long, value_name = "DIR")]
    pub bin_dir: Option<PathBuf>,

    #[arg(long, value_name = "NAME")]
    pub profraw_filename: Option<String>,

    #[arg(long, value_name = "NAME")]
    pub profdata_filename: Option<String>,

    /// Executable to include (repeatable; discovered from BIN_DIR if omitted)
    #[arg(short, long = "executable", value_name = "FILE")]
    pub executables: Vec<PathBuf>,

    /// Source directory to restrict the view to (repeatable)
    #[arg(short, long = "source-dir", value_name = "DIR")]
    pub source_dirs: Vec<PathBuf>,

    #[arg(long, value_name = "NAME")]
    pub output_filename: Option<String>,

    /// Regenerate the profile data even if it exists
    #[arg(short, long)]
    pub force: bool,

    /// Merge profiles without -sparse
    #[arg(long)]
    pub no_sparse: bool,
}

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Test binary whose counter files sit next to it
    #[arg(value_name = "BINARY")]
    pub binary: PathBuf,

    /// Qualified-name glob to include (repeatable, e.g. 'ns::Foo::*')
    #[arg(short, long = "include", value_name = "GLOB")]
    pub includes: Vec<String>,

    /// Qualified-name glob to exclude (repeatable)
    #[arg(short = 'x', long = "exclude", value_name = "GLOB")]
    pub excludes: Vec<String>,

    /// Fail when line coverage falls below this percentage
    #[arg(long, value_name = "PCT", value_parser = parse_percentage)]
    pub min_coverage: Option<f64>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct CollectArgs {
    /// Consolidated trace file to write
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Test binaries that were run
    #[arg(value_name = "BINARY", required = true)]
    pub binaries: Vec<PathBuf>,
}

fn parse_percentage(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    if (0.0..=100.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is outside 0..=100"))
    }
}
