//! Command implementations and argument parsing for the sulcus CLI.

use std::fmt::{self, Write as _};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use thiserror::Error;
use tracing::{info, instrument};

use sulcus_core::{AriEngineBuilder, AriError, LocalTest, counting_sort_desc};
use sulcus_grid::{Connectivity, GridError, GridMap, GridMask};

const DEFAULT_GAMMAS: [f64; 3] = [0.5, 0.7, 0.9];
const DEFAULT_ALPHA: f64 = 0.05;

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "sulcus",
    about = "All-Resolutions Inference cluster analysis over masked statistical maps."
)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Compute TDP clusters for one statistical map.
    Analyze(AnalyzeCommand),
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Analyze(_) => "analyze",
        }
    }
}

/// Options accepted by the `analyze` command.
#[derive(Debug, Args, Clone)]
pub struct AnalyzeCommand {
    /// Text file with one p-value per line, covering the in-mask voxels in
    /// linear-index order (x fastest).
    pub p_values: PathBuf,

    /// Grid dimensions.
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], required = true)]
    pub dims: Vec<usize>,

    /// Optional mask file: one 0/1 flag per grid cell, linear-index order.
    #[arg(long)]
    pub mask: Option<PathBuf>,

    /// Spatial connectivity criterion.
    #[arg(long, value_enum, default_value_t = ConnectivityArg::Full)]
    pub connectivity: ConnectivityArg,

    /// Family-wise error level.
    #[arg(long, default_value_t = DEFAULT_ALPHA)]
    pub alpha: f64,

    /// Local test family.
    #[arg(long = "local-test", value_enum, default_value_t = LocalTestArg::Simes)]
    pub local_test: LocalTestArg,

    /// TDP threshold to answer; repeatable. Defaults to 0.5, 0.7, 0.9.
    #[arg(long = "gamma", value_name = "GAMMA")]
    pub gammas: Vec<f64>,
}

/// Connectivity criteria under their conventional degree names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConnectivityArg {
    /// Face neighbours only.
    #[value(name = "6")]
    Faces,
    /// Face and edge neighbours.
    #[value(name = "18")]
    FacesEdges,
    /// Face, edge, and corner neighbours.
    #[value(name = "26")]
    Full,
}

impl From<ConnectivityArg> for Connectivity {
    fn from(arg: ConnectivityArg) -> Self {
        match arg {
            ConnectivityArg::Faces => Connectivity::Faces,
            ConnectivityArg::FacesEdges => Connectivity::FacesEdges,
            ConnectivityArg::Full => Connectivity::Full,
        }
    }
}

impl fmt::Display for ConnectivityArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let degree = match self {
            ConnectivityArg::Faces => "6",
            ConnectivityArg::FacesEdges => "18",
            ConnectivityArg::Full => "26",
        };
        f.write_str(degree)
    }
}

/// Local test families selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LocalTestArg {
    /// Classical Simes local tests.
    Simes,
    /// Hommel's dependence-robust variant.
    Hommel,
}

impl LocalTestArg {
    fn label(self) -> &'static str {
        match self {
            LocalTestArg::Simes => "simes",
            LocalTestArg::Hommel => "hommel",
        }
    }
}

impl From<LocalTestArg> for LocalTest {
    fn from(arg: LocalTestArg) -> Self {
        match arg {
            LocalTestArg::Simes => LocalTest::Simes,
            LocalTestArg::Hommel => LocalTest::Hommel,
        }
    }
}

impl fmt::Display for LocalTestArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// File I/O failed while loading an input file.
    #[error("failed to read `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// An input file contained an unparsable line.
    #[error("`{path}` line {line}: cannot parse `{token}` as {expected}")]
    Parse {
        /// File containing the bad line.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// The offending token.
        token: String,
        /// What the token should have been.
        expected: &'static str,
    },
    /// Grid construction failed.
    #[error(transparent)]
    Grid(#[from] GridError),
    /// The ARI core rejected the input or the query.
    #[error(transparent)]
    Core(#[from] AriError),
}

/// One cluster row of the rendered output.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSummary {
    /// Voxel count.
    pub size: usize,
    /// TDP lower bound at the representative.
    pub tdp: f64,
    /// Representative voxel id.
    pub representative: usize,
    /// Grid coordinates of the representative.
    pub coordinates: [usize; 3],
}

/// All clusters answering one threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdSummary {
    /// The TDP threshold queried.
    pub gamma: f64,
    /// Clusters in descending size order.
    pub clusters: Vec<ClusterSummary>,
}

/// Everything the CLI prints for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionSummary {
    /// Name of the analysed map (the p-value file stem).
    pub map_name: String,
    /// Number of in-mask voxels.
    pub voxels: usize,
    /// Family-wise error level.
    pub alpha: f64,
    /// Local test label.
    pub local_test: &'static str,
    /// TDP lower bound for the whole mask.
    pub whole_map_tdp: f64,
    /// Per-threshold answers.
    pub thresholds: Vec<ThresholdSummary>,
}

/// Executes the parsed command.
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    let command_name = cli.command.name();
    match cli.command {
        Command::Analyze(cmd) => run_analyze(command_name, cmd),
    }
}

#[instrument(skip_all, fields(command = command_name))]
fn run_analyze(command_name: &str, cmd: AnalyzeCommand) -> Result<ExecutionSummary, CliError> {
    let dims = [cmd.dims[0], cmd.dims[1], cmd.dims[2]];
    let connectivity = Connectivity::from(cmd.connectivity);

    let p = read_values(&cmd.p_values)?;
    let mask = match &cmd.mask {
        Some(path) => {
            let flags = read_flags(path)?;
            GridMask::from_flags(dims, &flags, connectivity)?
        }
        None => GridMask::full(dims, connectivity)?,
    };

    let map_name = cmd
        .p_values
        .file_stem()
        .map_or_else(|| "p-values".to_owned(), |s| s.to_string_lossy().into_owned());
    let map = GridMap::new(map_name.clone(), mask, p)?;

    info!(
        voxels = sulcus_core::StatMap::len(&map),
        alpha = cmd.alpha,
        local_test = cmd.local_test.label(),
        "building ARI engine"
    );
    let mut engine = AriEngineBuilder::new()
        .with_alpha(cmd.alpha)
        .with_local_test(cmd.local_test.into())
        .build(&map)?;

    let gammas: Vec<f64> = if cmd.gammas.is_empty() {
        DEFAULT_GAMMAS.to_vec()
    } else {
        cmd.gammas.clone()
    };
    let answers = engine.answer_query_batch(&gammas);

    let mut thresholds = Vec::with_capacity(gammas.len());
    for (gamma, clusters) in gammas.iter().zip(answers) {
        let sizes: Vec<usize> = clusters.iter().map(sulcus_core::Cluster::len).collect();
        let max_size = sizes.iter().copied().max().unwrap_or(0);
        let order = counting_sort_desc(&sizes, max_size);

        let rows = order
            .into_iter()
            .map(|i| {
                let cluster = &clusters[i];
                let representative = cluster.representative();
                ClusterSummary {
                    size: cluster.len(),
                    tdp: engine.cluster_tdp(cluster),
                    representative,
                    coordinates: map
                        .mask()
                        .voxel_coordinates(representative)
                        .expect("representatives come from the mask"),
                }
            })
            .collect();
        thresholds.push(ThresholdSummary {
            gamma: *gamma,
            clusters: rows,
        });
    }

    info!(thresholds = thresholds.len(), "analysis complete");
    Ok(ExecutionSummary {
        map_name,
        voxels: engine.len(),
        alpha: cmd.alpha,
        local_test: cmd.local_test.label(),
        whole_map_tdp: engine.whole_map_tdp(),
        thresholds,
    })
}

/// Renders the summary to the provided writer.
pub fn render_summary<W: Write>(summary: &ExecutionSummary, writer: &mut W) -> io::Result<()> {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "map `{}`: {} voxels, alpha {}, {} local test",
        summary.map_name, summary.voxels, summary.alpha, summary.local_test,
    );
    let _ = writeln!(out, "whole-map TDP: {:.4}", summary.whole_map_tdp);
    for threshold in &summary.thresholds {
        let _ = writeln!(out);
        let noun = if threshold.clusters.len() == 1 {
            "cluster"
        } else {
            "clusters"
        };
        let _ = writeln!(
            out,
            "gamma {:.2}: {} {noun}",
            threshold.gamma,
            threshold.clusters.len(),
        );
        for (rank, cluster) in threshold.clusters.iter().enumerate() {
            let [x, y, z] = cluster.coordinates;
            let _ = writeln!(
                out,
                "  #{} size {} tdp {:.4} representative voxel {} at ({x}, {y}, {z})",
                rank + 1,
                cluster.size,
                cluster.tdp,
                cluster.representative,
            );
        }
    }
    writer.write_all(out.as_bytes())
}

fn read_lines(path: &Path) -> Result<Vec<(usize, String)>, CliError> {
    let content = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_owned(),
        source,
    })?;
    Ok(content
        .lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let token = line.trim();
            (!token.is_empty()).then(|| (i + 1, token.to_owned()))
        })
        .collect())
}

fn read_values(path: &Path) -> Result<Vec<f64>, CliError> {
    read_lines(path)?
        .into_iter()
        .map(|(line, token)| {
            token.parse::<f64>().map_err(|_| CliError::Parse {
                path: path.to_owned(),
                line,
                token,
                expected: "a p-value",
            })
        })
        .collect()
}

fn read_flags(path: &Path) -> Result<Vec<bool>, CliError> {
    read_lines(path)?
        .into_iter()
        .map(|(line, token)| match token.as_str() {
            "0" => Ok(false),
            "1" => Ok(true),
            _ => Err(CliError::Parse {
                path: path.to_owned(),
                line,
                token,
                expected: "a 0/1 mask flag",
            }),
        })
        .collect()
}
