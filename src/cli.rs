//! CLI argument parsing for rsp

use crate::stats::TimeUnit;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for console reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    #[default]
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV format for spreadsheet analysis
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "rsp")]
#[command(version)]
#[command(about = "Inspect and analyze recorded profiling scopes", long_about = None)]
pub struct Cli {
    /// Enable debug tracing output to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    /// Read defaults (bind address, unit, chart size) from a TOML file
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Dump out the profiling data to stdout
    Echo {
        /// Capture file
        file: PathBuf,

        #[arg(long = "format", value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show which scopes are logged, and how many entries each has
    Scopes {
        /// Capture file
        file: PathBuf,

        #[arg(long = "format", value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Print p50, p95 and p99 for a given scope
    Percentiles {
        /// Capture file
        file: PathBuf,

        /// Scope tag to analyze
        scope: String,

        #[arg(long = "format", value_enum, default_value = "text")]
        format: OutputFormat,

        /// Time unit (default: ms, or the config file's unit)
        #[arg(long = "unit", value_enum)]
        unit: Option<TimeUnit>,
    },

    /// Plot elapsed times and visualize p50, p95 and p99
    Timings {
        /// Capture file
        file: PathBuf,

        /// Scope tag to analyze
        scope: String,

        /// Save the chart page to this file instead of serving it
        #[arg(
            short = 'o',
            long = "output",
            value_name = "FILE",
            conflicts_with = "bind"
        )]
        output: Option<PathBuf>,

        /// Address and port to bind to (default: localhost:8080)
        #[arg(short = 'b', long = "bind", value_name = "ADDR")]
        bind: Option<String>,

        /// Time unit (default: ms, or the config file's unit)
        #[arg(long = "unit", value_enum)]
        unit: Option<TimeUnit>,
    },
}
