//! Depthcheck Demo - Runs the bundled property suites.
//!
//! Every suite is checked exhaustively up to the configured depth and the
//! first counterexample or witness of each property is reported.
//!
//! # Usage
//!
//! ```bash
//! # Run every suite at the default depth
//! depthcheck-demo
//!
//! # Run one suite deeper, reporting JSON
//! depthcheck-demo --suite model --depth 6 --json
//!
//! # Start from a configuration file
//! depthcheck-demo --config depthcheck.toml
//! ```

mod config;
mod suites;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use config::{DemoConfig, LogFormat, LoggingConfig};
use depthcheck_checker::SuiteReport;
use depthcheck_generator::Registry;
use tracing::{info, info_span, warn};
use tracing_subscriber::EnvFilter;

/// CLI arguments for the demo runner.
#[derive(Parser, Debug)]
#[command(
    name = "depthcheck-demo",
    about = "Exhaustively checks the bundled property suites up to a depth",
    version
)]
pub struct CliArgs {
    /// TOML file with `[check]` and `[logging]` sections.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Largest depth every property is checked at.
    #[arg(short, long, value_name = "N")]
    depth: Option<usize>,

    /// Check only the named suite (see --list-suites).
    #[arg(short, long, value_name = "NAME")]
    suite: Option<String>,

    /// Check every property of a suite even after one fails.
    #[arg(long)]
    keep_going: bool,

    /// Verbosity of the generator, model and checker logs.
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Shape of the log lines written to stderr.
    #[arg(long, value_enum, value_name = "FORMAT")]
    log_format: Option<LogFormat>,

    /// Print suite reports on stdout as JSON.
    #[arg(long)]
    json: bool,

    /// Print every suite with its property names and exit.
    #[arg(long)]
    list_suites: bool,

    /// Print the effective configuration, after CLI overrides, and exit.
    #[arg(long)]
    print_config: bool,
}

const LOGGING_CRATES: [&str; 4] = [
    "depthcheck_generator",
    "depthcheck_model",
    "depthcheck_checker",
    "depthcheck_demo",
];

/// Filter that applies `level` to the workspace crates and keeps
/// everything else at `warn`.
fn log_directives(level: &str) -> String {
    let mut directives = String::from("warn");
    for krate in LOGGING_CRATES {
        directives.push_str(&format!(",{}={}", krate, level));
    }
    directives
}

/// Install the stderr log subscriber. `RUST_LOG` replaces the configured level.
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(log_directives(&logging.level))
            .with_context(|| format!("Invalid log level: {}", logging.level))?,
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let installed = match logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))
}

fn print_report(report: &SuiteReport, json: bool) -> Result<()> {
    if json {
        let rendered = serde_json::to_string_pretty(report).context("Failed to render report")?;
        println!("{}", rendered);
    } else {
        println!("{}\n", report);
    }
    Ok(())
}

fn main() -> Result<ExitCode> {
    let args = CliArgs::parse();

    let mut config = match args.config {
        Some(ref path) => DemoConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => DemoConfig::default(),
    };
    config.merge_cli_args(&args);
    config.validate().context("Invalid configuration")?;

    if args.print_config {
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(ExitCode::SUCCESS);
    }

    init_tracing(&config.logging)?;

    let mut registry = Registry::new();
    let suites = suites::all(&mut registry);

    if args.list_suites {
        for suite in &suites {
            let names: Vec<&str> = suite.names().collect();
            println!("{}: {}", suite.name(), names.join(", "));
        }
        return Ok(ExitCode::SUCCESS);
    }

    let selected: Vec<_> = match args.suite.as_deref() {
        Some(name) => {
            let chosen: Vec<_> = suites.iter().filter(|s| s.name() == name).collect();
            if chosen.is_empty() {
                anyhow::bail!("Unknown suite: {}", name);
            }
            chosen
        }
        None => suites.iter().collect(),
    };

    info!(
        depth = config.check.depth,
        fail_fast = config.check.fail_fast,
        suites = selected.len(),
        "Checking suites"
    );

    let mut failed = 0;
    for suite in selected {
        let span = info_span!("suite", suite = suite.name(), depth = config.check.depth);
        let report = span.in_scope(|| suite.run(&registry, &config.check));
        failed += report.failed();
        print_report(&report, args.json)?;
    }

    if failed > 0 {
        warn!(failed, "Some properties failed");
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_args_parsing() {
        let args = CliArgs::parse_from(["depthcheck-demo"]);
        assert!(args.config.is_none());
        assert!(args.depth.is_none());
        assert!(!args.json);
        assert!(!args.keep_going);
        assert!(args.log_format.is_none());

        let args = CliArgs::parse_from(["depthcheck-demo", "-s", "model", "-d", "6", "--json"]);
        assert_eq!(args.suite.as_deref(), Some("model"));
        assert_eq!(args.depth, Some(6));
        assert!(args.json);

        let args = CliArgs::parse_from(["depthcheck-demo", "--log-format", "json"]);
        assert_eq!(args.log_format, Some(LogFormat::Json));
        assert!(CliArgs::try_parse_from(["depthcheck-demo", "--log-format", "pretty"]).is_err());
    }

    #[test]
    fn test_log_directives_scope_workspace_crates() {
        let directives = log_directives("debug");
        assert!(directives.starts_with("warn,"));
        assert!(directives.contains("depthcheck_checker=debug"));
        assert!(directives.contains("depthcheck_model=debug"));
        assert!(EnvFilter::try_new(&directives).is_ok());
    }
}
