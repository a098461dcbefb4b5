//! Common routines for handling input data.
use crate::region::Geotype;
use anyhow::{Context, Result, ensure};
use serde::de::{Deserialize, DeserializeOwned, Deserializer};
use std::fs;
use std::path::Path;

/// The message to be used when reporting an error reading a file
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().to_string_lossy())
}

/// Read a series of type `T`s from a CSV file.
///
/// The file must contain at least one record.
pub fn read_csv<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(file_path).with_context(|| input_err_msg(file_path))?;

    let mut records = Vec::new();
    for result in reader.deserialize() {
        let record: T = result.with_context(|| input_err_msg(file_path))?;
        records.push(record);
    }

    ensure!(
        !records.is_empty(),
        "CSV file {} cannot be empty",
        file_path.to_string_lossy()
    );

    Ok(records)
}

/// Parse a TOML file at the specified path
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let contents = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    toml::from_str(&contents).with_context(|| input_err_msg(file_path))
}

/// Read a geotype, accepting qualified forms such as "rural 1"
pub fn deserialise_geotype<'de, D>(deserialiser: D) -> Result<Geotype, D::Error>
where
    D: Deserializer<'de>,
{
    let value: String = Deserialize::deserialize(deserialiser)?;
    Geotype::from_input_str(&value)
        .map_err(|_| serde::de::Error::custom(format!("Invalid geotype {value:?}")))
}
