//! Command-line interface orchestration for the sulcus CLI.
//!
//! The CLI offers an `analyze` command that loads a p-value map (and
//! optionally a mask) from text files, runs the ARI engine, and renders
//! per-threshold cluster tables ordered by descending size.

mod commands;

pub use commands::{
    AnalyzeCommand, Cli, CliError, ClusterSummary, Command, ConnectivityArg, ExecutionSummary,
    LocalTestArg, ThresholdSummary, render_summary, run_cli,
};
