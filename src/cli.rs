//! The command line interface for the program.
use crate::cashflow::assess_taxes;
use crate::jurisdiction::evaluate_jurisdictions;
use crate::log;
use crate::output::metadata::write_metadata;
use crate::output::{
    create_output_directory, get_output_dir, write_assessment, write_jurisdictions,
};
use crate::project::load_project;
use crate::settings::Settings;
use ::log::{info, warn};
use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

pub mod catalog;
pub mod example;
pub mod settings;
use catalog::CatalogSubcommands;
use example::ExampleSubcommands;
use settings::SettingsSubcommands;

/// The command line interface for the program.
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
    /// Whether to write the assessment context to a CSV file
    #[arg(long)]
    pub debug_output: bool,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Evaluate the incentives for a project.
    Run {
        /// Path to the project directory.
        project_dir: PathBuf,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Validate a project.
    Validate {
        /// The path to the project directory.
        project_dir: PathBuf,
    },
    /// Inspect incentive catalogs.
    Catalog {
        /// The available subcommands for inspecting catalogs.
        #[command(subcommand)]
        subcommand: CatalogSubcommands,
    },
    /// Manage example projects.
    Example {
        /// The available subcommands for managing example projects.
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
            Self::Run { project_dir, opts } => handle_run_command(&project_dir, &opts, None),
            Self::Validate { project_dir } => handle_validate_command(&project_dir, None),
            Self::Catalog { subcommand } => subcommand.execute(),
            Self::Example { subcommand } => subcommand.execute(),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse CLI arguments and run the requested command
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // Invoked as: `$ incentives --markdown-help`
    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    let Some(command) = cli.command else {
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Handle the `run` command.
pub fn handle_run_command(
    project_path: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let mut settings = match settings {
        Some(settings) => settings,
        None => Settings::load().context("Failed to load settings.")?,
    };

    // These settings can be overridden by command-line arguments
    settings.overwrite |= opts.overwrite;
    settings.debug_output |= opts.debug_output;

    let output_path = match opts.output_dir.as_deref() {
        Some(path) => path.to_path_buf(),
        None => get_output_dir(project_path)?,
    };
    let overwrite =
        create_output_directory(&output_path, settings.overwrite).with_context(|| {
            format!(
                "Failed to create output directory: {}",
                output_path.display()
            )
        })?;

    if !log::is_logger_initialised() {
        log::init(&settings.log_level, Some(&output_path))
            .context("Failed to initialise logging.")?;
    }

    let project = load_project(project_path).context("Failed to load project.")?;
    info!("Loaded project from {}", project_path.display());
    info!("Output folder: {}", output_path.display());

    // NB: We have to wait until the logger is initialised to display this warning
    if overwrite {
        warn!("Output folder will be overwritten");
    }

    let assessment = assess_taxes(
        &project.catalog,
        &project.selection,
        &project.schedule,
        &project.financials,
        &project.tax_rates,
    )
    .context("Failed to assess taxes.")?;
    write_metadata(&output_path, &project).context("Failed to save metadata.")?;
    write_assessment(
        &output_path,
        &project.catalog,
        &assessment,
        settings.debug_output,
    )
    .context("Failed to write results.")?;
    info!(
        "Total tax {:.2}, of which {:.2} offset by incentives",
        assessment.tax.total(),
        assessment.incentives.total()
    );

    if !project.jurisdictions.is_empty() {
        let summaries = evaluate_jurisdictions(
            &project.catalog,
            &project.schedule,
            &project.financials,
            &project.tax_rates,
            &project.jurisdictions,
        )?;
        write_jurisdictions(&output_path, &summaries)
            .context("Failed to write jurisdiction results.")?;
    }
    info!("Run complete!");

    Ok(())
}

/// Handle the `validate` command.
pub fn handle_validate_command(project_path: &Path, settings: Option<Settings>) -> Result<()> {
    let settings = match settings {
        Some(settings) => settings,
        None => Settings::load().context("Failed to load settings.")?,
    };

    // We don't save log files when validating
    if !log::is_logger_initialised() {
        log::init(&settings.log_level, None).context("Failed to initialise logging.")?;
    }

    load_project(project_path).context("Failed to validate project.")?;
    info!("Project validation successful!");

    Ok(())
}
