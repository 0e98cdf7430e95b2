use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu",
    version,
    about = "rigidmin CLI - Local minimization of rigid-molecule clusters in rigid-body coordinates with L-BFGS.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used by the accelerated transform path.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Quench a random cluster of rigid ortho-terphenyl molecules to a local minimum.
    Quench(QuenchArgs),
}

/// Arguments for the `quench` subcommand.
#[derive(Args, Debug, Default)]
pub struct QuenchArgs {
    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write the minimized structure as an XYZ file.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    // --- System Overrides ---
    /// Number of rigid molecules in the cluster.
    #[arg(short, long, value_name = "INT")]
    pub nrigid: Option<usize>,

    /// Seed for the random starting configuration.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Use the single-threaded reference transform instead of the accelerated one.
    #[arg(long)]
    pub reference_path: bool,

    // --- Optimizer Overrides ---
    /// Override the maximum number of L-BFGS iterations.
    #[arg(long, value_name = "INT")]
    pub max_iterations: Option<usize>,

    /// Override the RMS-gradient convergence tolerance.
    #[arg(short, long, value_name = "FLOAT")]
    pub tolerance: Option<f64>,

    /// Override the maximum length of a single step.
    #[arg(long, value_name = "FLOAT")]
    pub max_step: Option<f64>,

    /// Override the number of stored curvature pairs.
    #[arg(short = 'm', long, value_name = "INT")]
    pub history_size: Option<usize>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S lbfgs.curvature-policy=reset-history
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}
