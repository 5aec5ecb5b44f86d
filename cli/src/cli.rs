use clap::{Parser, Subcommand, ValueHint};
use sparql_kernel::LogLevel;
use std::path::PathBuf;

#[derive(Parser)]
#[command(about, version, name = "sparql-kernel")]
/// Runs SPARQL notebook cells against one long-lived kernel
pub struct Args {
    /// SPARQL endpoint used until a cell changes it
    ///
    /// This is equivalent to starting with a `%endpoint` directive.
    #[arg(short, long, global = true, value_hint = ValueHint::Url)]
    pub endpoint: Option<String>,
    /// File with directives that are applied before the first cell
    ///
    /// This is equivalent to starting with a `%load` directive.
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub init: Option<PathBuf>,
    /// Timeout of a single SPARQL request in seconds
    #[arg(long, global = true, default_value_t = 60)]
    pub timeout: u64,
    /// Graphviz executable used to draw diagrams
    #[arg(long, global = true, default_value = "dot", value_hint = ValueHint::CommandName)]
    pub dot: PathBuf,
    /// Verbosity of the log output (critical, error, warning, info, debug or trace)
    ///
    /// The RUST_LOG environment variable takes precedence.
    #[arg(long, global = true, default_value = "warning", value_parser = parse_log_level)]
    pub log_level: LogLevel,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Execute files, each of them as one cell
    ///
    /// The process fails if any of the cells reports an error.
    Run {
        /// Files to execute in the given order
        #[arg(required = true, num_args = 1.., value_hint = ValueHint::FilePath)]
        files: Vec<PathBuf>,
    },
    /// Read cells from the standard input
    ///
    /// Cells are separated by lines that only contain `---`.
    Repl,
    /// Print the completions for the word before a cursor position
    Complete {
        /// Cell content
        code: String,
        /// Cursor position in characters; the end of the code by default
        #[arg(long)]
        cursor: Option<usize>,
    },
    /// Print the documentation of the word at a cursor position
    Inspect {
        /// Cell content
        code: String,
        /// Cursor position in characters; the end of the code by default
        #[arg(long)]
        cursor: Option<usize>,
    },
}

fn parse_log_level(value: &str) -> Result<LogLevel, String> {
    LogLevel::from_name(value).ok_or_else(|| format!("unknown log level '{value}'"))
}
