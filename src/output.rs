//! The module responsible for writing output data to disk.
use crate::model::ModelResults;
use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "moca_results";

/// The output file name for enriched region records
const REGIONS_FILE_NAME: &str = "regions.csv";

/// The output file name for priced assets
const ASSETS_FILE_NAME: &str = "assets.csv";

/// The output file name for energy demand and emissions records
const ENERGY_FILE_NAME: &str = "energy.csv";

/// Get the default output directory for the model at `model_dir`
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // Canonicalise in case the user has specified "."
    let model_dir = model_dir
        .canonicalize()
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create the output directory for a run.
///
/// Returns whether an existing directory is being overwritten, so the caller
/// can warn once the logger is up.
pub fn create_output_directory(output_dir: &Path, overwrite: bool) -> Result<bool> {
    if output_dir.is_dir() {
        if !overwrite {
            bail!(
                "Output directory {} already exists (pass --overwrite to replace it)",
                output_dir.to_string_lossy()
            );
        }
        return Ok(true);
    }

    fs::create_dir_all(output_dir)?;

    Ok(false)
}

/// Write the results of a model run as CSV files in `output_dir`
pub fn write_results(results: &ModelResults, output_dir: &Path) -> Result<()> {
    let regions_path = output_dir.join(REGIONS_FILE_NAME);
    let mut writer = csv::Writer::from_path(&regions_path)
        .with_context(|| format!("Could not create {}", regions_path.to_string_lossy()))?;
    for region in &results.regions {
        writer.serialize(region)?;
    }
    writer.flush()?;

    let assets_path = output_dir.join(ASSETS_FILE_NAME);
    let mut writer = csv::Writer::from_path(&assets_path)
        .with_context(|| format!("Could not create {}", assets_path.to_string_lossy()))?;
    for asset in &results.assets {
        writer.serialize(asset)?;
    }
    writer.flush()?;

    let energy_path = output_dir.join(ENERGY_FILE_NAME);
    let mut writer = csv::Writer::from_path(&energy_path)
        .with_context(|| format!("Could not create {}", energy_path.to_string_lossy()))?;
    for record in &results.energy {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}
