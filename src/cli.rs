//! The command line interface for the optimiser.
use crate::clustering::{ClusteredData, cluster};
use crate::input::load_model;
use crate::log;
use crate::model::Model;
use crate::optimisation::compute;
use crate::output::{
    create_output_directory, get_output_dir, write_clustered_data, write_debug_info,
    write_metadata, write_results,
};
use crate::pareto::run_pareto;
use crate::settings::Settings;
use crate::solver::{HighsSolver, SolveStatus};
use ::log::{info, warn};
use anyhow::{Context, Result, ensure};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

pub mod example;
use example::ExampleSubcommands;
pub mod settings;
use settings::SettingsSubcommands;

/// The command line interface for the optimiser.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
    /// Flag to provide the CLI docs as markdown
    #[arg(long, hide = true)]
    markdown_help: bool,
}

/// Options for the run command
#[derive(Args, Default)]
pub struct RunOpts {
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
    /// Whether to write additional information to CSV files
    #[arg(long)]
    pub debug_model: bool,
}

/// Options for the pareto command
#[derive(Args)]
pub struct ParetoOpts {
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Number of points between the cost-optimal and the emission-optimal design (defaults to
    /// the `pareto_points` setting)
    #[arg(long)]
    pub points: Option<usize>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Optimise a scenario.
    Run {
        /// Path to the scenario directory.
        model_dir: PathBuf,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Compute the trade-off between cost and emissions.
    Pareto {
        /// Path to the scenario directory.
        model_dir: PathBuf,
        /// Other options
        #[command(flatten)]
        opts: ParetoOpts,
    },
    /// Write the representative days of a scenario.
    Cluster {
        /// Path to the scenario directory.
        model_dir: PathBuf,
        /// Directory for output files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Validate a scenario.
    Validate {
        /// The path to the scenario directory.
        model_dir: PathBuf,
    },
    /// Manage example scenarios.
    Example {
        /// The available subcommands for managing example scenarios.
        #[command(subcommand)]
        subcommand: ExampleSubcommands,
    },
    /// Manage program settings.
    Settings {
        /// The subcommands for managing settings.
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Run { model_dir, opts } => handle_run_command(&model_dir, &opts, None),
            Self::Pareto { model_dir, opts } => handle_pareto_command(&model_dir, &opts, None),
            Self::Cluster {
                model_dir,
                output_dir,
            } => handle_cluster_command(&model_dir, output_dir.as_deref(), None),
            Self::Validate { model_dir } => handle_validate_command(&model_dir, None),
            Self::Example { subcommand } => subcommand.execute(),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse CLI arguments and start buildopt
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // Invoked as: `$ buildopt --markdown-help`
    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    let Some(command) = cli.command else {
        // Output program help in markdown format
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Load program settings, if not provided
fn load_settings(settings: Option<Settings>) -> Result<Settings> {
    if let Some(settings) = settings {
        Ok(settings)
    } else {
        Settings::load().context("Failed to load settings.")
    }
}

/// Create the output folder, start logging and load the scenario
fn prepare_run(
    model_path: &Path,
    output_dir: Option<&Path>,
    overwrite: bool,
    settings: &Settings,
) -> Result<(Model, PathBuf)> {
    // Get path to output folder
    let output_path = if let Some(p) = output_dir {
        p.to_path_buf()
    } else {
        get_output_dir(model_path)?
    };

    let overwrite = create_output_directory(&output_path, overwrite || settings.overwrite)
        .with_context(|| {
            format!(
                "Failed to create output directory: {}",
                output_path.display()
            )
        })?;

    // Initialise program logger
    log::init(Some(&settings.log_level), Some(&output_path))
        .context("Failed to initialise logging.")?;

    // Load the scenario to run
    let model = load_model(model_path).context("Failed to load scenario.")?;
    info!("Loaded scenario from {}", model_path.display());
    info!("Output folder: {}", output_path.display());

    // NB: We have to wait until the logger is initialised to display this warning
    if overwrite {
        warn!("Output folder will be overwritten");
    }

    Ok((model, output_path))
}

/// Reduce the scenario's time series to representative days
fn cluster_model(model: &Model) -> Result<ClusteredData> {
    let options = &model.options.clustering;
    let clustered = cluster(&model.time_series, options, &HighsSolver)
        .context("Failed to find representative days.")?;
    info!(
        "Reduced {} days to {} representative days",
        model.time_series.days_per_year,
        clustered.num_days()
    );

    Ok(clustered)
}

/// Handle the `run` command.
pub fn handle_run_command(
    model_path: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let mut settings = load_settings(settings)?;

    // This setting can be overridden by command-line argument
    if opts.debug_model {
        settings.debug_model = true;
    }

    let (model, output_path) =
        prepare_run(model_path, opts.output_dir.as_deref(), opts.overwrite, &settings)?;
    let clustered = cluster_model(&model)?;

    let result = compute(&model, &clustered, &HighsSolver).context("Optimisation failed.")?;
    if let SolveStatus::TimedOut { gap } = result.status {
        warn!(
            "Results are the best found within the time limit (gap {:.2}%)",
            100.0 * gap
        );
    }

    write_results(&output_path, &result)?;
    write_metadata(&output_path, model_path, Some(&result))?;
    if settings.debug_model {
        write_debug_info(&output_path, &result.constraint_groups, &clustered)?;
    }
    info!("Optimisation complete!");

    Ok(())
}

/// Handle the `pareto` command.
pub fn handle_pareto_command(
    model_path: &Path,
    opts: &ParetoOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = load_settings(settings)?;
    let points = opts.points.unwrap_or(settings.pareto_points);
    ensure!(points > 0, "At least one point between the two ends is required");

    let (model, output_path) =
        prepare_run(model_path, opts.output_dir.as_deref(), opts.overwrite, &settings)?;
    let clustered = cluster_model(&model)?;

    let front = run_pareto(&model, &clustered, &HighsSolver, points, &output_path)?;
    info!("Computed {} points of the cost-emission front", front.len());

    Ok(())
}

/// Handle the `cluster` command.
pub fn handle_cluster_command(
    model_path: &Path,
    output_dir: Option<&Path>,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = load_settings(settings)?;
    let (model, output_path) = prepare_run(model_path, output_dir, false, &settings)?;
    let clustered = cluster_model(&model)?;

    write_clustered_data(&output_path, &clustered)?;
    write_metadata(&output_path, model_path, None)?;
    info!("Representative days written");

    Ok(())
}

/// Handle the `validate` command.
pub fn handle_validate_command(model_path: &Path, settings: Option<Settings>) -> Result<()> {
    let settings = load_settings(settings)?;

    // Initialise program logger (we won't save log files when running the validate command)
    log::init(Some(&settings.log_level), None).context("Failed to initialise logging.")?;

    // Load/validate the scenario
    load_model(model_path).context("Failed to validate scenario.")?;
    info!("Scenario validation successful!");

    Ok(())
}
