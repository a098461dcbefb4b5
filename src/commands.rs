//! The command line interface for the model.
use crate::log;
use crate::model::Model;
use crate::output::{create_output_directory, get_output_dir, write_results};
use crate::settings::Settings;
use ::log::{info, warn};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

/// The command line interface for the model
#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// The available commands
    #[command(subcommand)]
    command: Commands,
}

/// Options for the run command
#[derive(Args)]
pub struct RunOpts {
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
}

/// The available commands
#[derive(Subcommand)]
enum Commands {
    /// Run a model.
    Run {
        /// Path to the model directory.
        model_dir: PathBuf,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Validate a model without running it.
    Validate {
        /// Path to the model directory.
        model_dir: PathBuf,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Run { model_dir, opts } => handle_run_command(&model_dir, &opts, None),
            Self::Validate { model_dir } => handle_validate_command(&model_dir, None),
        }
    }
}

/// Parse CLI arguments and execute the chosen command
pub fn run_cli() -> Result<()> {
    Cli::parse().command.execute()
}

/// Handle the `run` command.
pub fn handle_run_command(
    model_dir: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = match settings {
        Some(settings) => settings,
        None => Settings::from_path(model_dir).context("Failed to load settings.")?,
    };

    let output_dir = match opts.output_dir.as_deref() {
        Some(path) => path.to_path_buf(),
        None => get_output_dir(model_dir)?,
    };
    let overwriting = create_output_directory(&output_dir, opts.overwrite || settings.overwrite)
        .with_context(|| {
            format!(
                "Failed to create output directory: {}",
                output_dir.display()
            )
        })?;

    log::init(settings.log_level.as_deref(), Some(&output_dir))
        .context("Failed to initialise logging.")?;

    let model = Model::from_path(model_dir).context("Failed to load model.")?;
    info!("Loaded model from {}", model_dir.display());
    info!("Output folder: {}", output_dir.display());

    // We have to wait until the logger is initialised to display this warning
    if overwriting {
        warn!("Output folder will be overwritten");
    }

    let results = model.run()?;
    write_results(&results, &output_dir).context("Failed to write results.")?;
    info!("Model run complete!");

    Ok(())
}

/// Handle the `validate` command.
pub fn handle_validate_command(model_dir: &Path, settings: Option<Settings>) -> Result<()> {
    let settings = match settings {
        Some(settings) => settings,
        None => Settings::from_path(model_dir).context("Failed to load settings.")?,
    };

    // No log files for validation
    log::init(settings.log_level.as_deref(), None).context("Failed to initialise logging.")?;

    Model::from_path(model_dir).context("Failed to validate model.")?;
    info!("Model validation successful!");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::write_model_dir;
    use tempfile::tempdir;

    #[test]
    fn test_handle_run_command() {
        let model_dir = tempdir().unwrap();
        write_model_dir(model_dir.path());
        let output_dir = tempdir().unwrap();
        let opts = RunOpts {
            output_dir: Some(output_dir.path().join("results")),
            overwrite: false,
        };

        handle_run_command(model_dir.path(), &opts, Some(Settings::default())).unwrap();
        assert!(output_dir.path().join("results").join("regions.csv").is_file());
    }
}
