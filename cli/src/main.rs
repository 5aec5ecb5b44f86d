#![allow(clippy::print_stdout)]
use crate::cli::{Args, Command};
use anyhow::{bail, Context};
use clap::Parser;
use sparql_kernel::{help, CellOutput, Kernel, LogControl, LogControlError, LogLevel};
use sparql_kernel_graphviz::GraphvizRenderer;
use sparql_kernel_http::{HttpClientConfig, ReqwestClient};
use std::fs;
use std::io::{stdin, BufRead};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, level_filters::LevelFilter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

mod cli;

const CELL_SEPARATOR: &str = "---";

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let log_control = init_logging(args.log_level)?;

    let client = ReqwestClient::new(&HttpClientConfig {
        timeout: Duration::from_secs(args.timeout),
        ..HttpClientConfig::default()
    })
    .context("Cannot create the HTTP client")?;
    let mut kernel =
        Kernel::new(client, GraphvizRenderer::new(args.dot)).with_log_control(log_control);

    match args.command {
        Command::Run { files } => {
            prepare(&mut kernel, args.endpoint.as_deref(), args.init.as_deref()).await?;
            let mut failed = 0;
            for file in files {
                let cell = fs::read_to_string(&file)
                    .with_context(|| format!("Cannot read the cell file {}", file.display()))?;
                debug!("Executing {}", file.display());
                if !show(&kernel.execute(&cell).await) {
                    failed += 1;
                }
            }
            if failed > 0 {
                bail!("{failed} cell(s) reported an error");
            }
            Ok(())
        }
        Command::Repl => {
            prepare(&mut kernel, args.endpoint.as_deref(), args.init.as_deref()).await?;
            let mut cell = String::new();
            for line in stdin().lock().lines() {
                let line = line.context("Cannot read from the standard input")?;
                if line.trim() == CELL_SEPARATOR {
                    execute_interactive(&mut kernel, &cell).await;
                    cell.clear();
                } else {
                    cell.push_str(&line);
                    cell.push('\n');
                }
            }
            execute_interactive(&mut kernel, &cell).await;
            Ok(())
        }
        Command::Complete { code, cursor } => {
            let cursor = cursor.unwrap_or_else(|| code.chars().count());
            if let Some(completion) = help::complete(&code, cursor) {
                for candidate in completion.matches {
                    println!("{candidate}");
                }
            }
            Ok(())
        }
        Command::Inspect { code, cursor } => {
            let cursor = cursor.unwrap_or_else(|| code.chars().count());
            if let Some(text) = help::inspect(&code, cursor) {
                println!("{text}");
            }
            Ok(())
        }
    }
}

/// Applies the command line equivalents of `%endpoint` and `%load`.
async fn prepare(
    kernel: &mut Kernel,
    endpoint: Option<&str>,
    init: Option<&Path>,
) -> anyhow::Result<()> {
    let mut directives = Vec::new();
    if let Some(endpoint) = endpoint {
        directives.push(format!("%endpoint {endpoint}"));
    }
    if let Some(init) = init {
        directives.push(format!("%load {}", init.display()));
    }
    for directive in directives {
        let output = kernel.execute(&directive).await;
        if output.is_error() {
            bail!("{output}");
        }
        debug!("{output}");
    }
    Ok(())
}

async fn execute_interactive(kernel: &mut Kernel, cell: &str) {
    if cell.trim().is_empty() {
        return;
    }
    show(&kernel.execute(cell).await);
    println!();
}

/// Prints the output of a cell and returns whether it succeeded.
fn show(output: &CellOutput) -> bool {
    if !output.is_empty() {
        println!("{output}");
    }
    !output.is_error()
}

/// Installs the log subscriber. `RUST_LOG` takes precedence over `level`.
fn init_logging(level: LogLevel) -> anyhow::Result<ReloadLogControl> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| level_filter(level));
    let (filter, handle) = reload::Layer::new(filter);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("Cannot install the log subscriber")?;
    Ok(ReloadLogControl { handle })
}

fn level_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::default().add_directive(LevelFilter::from_level(level.as_tracing_level()).into())
}

/// Lets `%log` swap the filter of the installed subscriber.
#[derive(Debug)]
struct ReloadLogControl {
    handle: reload::Handle<EnvFilter, Registry>,
}

impl LogControl for ReloadLogControl {
    fn set_level(&self, level: LogLevel) -> Result<(), LogControlError> {
        self.handle
            .reload(level_filter(level))
            .map_err(|e| LogControlError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clap_debug() {
        use clap::CommandFactory;

        Args::command().debug_assert()
    }

    #[test]
    fn log_level_argument() {
        let args = Args::try_parse_from(["sparql-kernel", "--log-level", "debug", "repl"]).unwrap();
        assert_eq!(args.log_level, LogLevel::Debug);
        assert!(Args::try_parse_from(["sparql-kernel", "--log-level", "loud", "repl"]).is_err());
    }

    #[test]
    fn global_options_after_subcommand() {
        let args =
            Args::try_parse_from(["sparql-kernel", "run", "a.rq", "--endpoint", "http://x/q"])
                .unwrap();
        assert_eq!(args.endpoint.as_deref(), Some("http://x/q"));
        assert_eq!(args.timeout, 60);
        assert!(matches!(args.command, Command::Run { files } if files.len() == 1));
    }
}
