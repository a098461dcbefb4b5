//! Capacity lookup table and site density resolution.
//!
//! The lookup table maps a (geotype, antenna type, frequency, generation,
//! confidence) key to an empirical curve of deliverable capacity per site
//! density. Resolving a demand value means merging the curves for every band
//! in the strategy's frequency plan and interpolating the density at which
//! the merged curve meets the demand.
use crate::input::{deserialise_geotype, input_err_msg, read_csv};
use crate::parameters::FrequencyBand;
use crate::region::Geotype;
use crate::strategy::Generation;
use anyhow::{Context, Result, ensure};
use itertools::Itertools;
use serde::Deserialize;
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};
use std::collections::HashMap;
use std::fmt::{self, Display};
use std::path::Path;

const CAPACITY_LUT_FILE_NAME: &str = "capacity_lut.csv";

/// Site antenna configuration the capacity curve was measured for
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    SerializeLabeledStringEnum,
    DeserializeLabeledStringEnum,
)]
pub enum AntennaType {
    /// Wide-area macro cell
    #[string = "macro"]
    Macro,
    /// Small cell infill
    #[string = "micro"]
    Micro,
}

/// All sites costed by the model are macro sites
pub const SITE_ANTENNA: AntennaType = AntennaType::Macro;

/// Composite key identifying one capacity curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CapacityKey {
    /// Geotype the curve was simulated for
    pub geotype: Geotype,
    /// Antenna configuration
    pub antenna_type: AntennaType,
    /// Carrier frequency (MHz)
    pub frequency_mhz: u32,
    /// Technology generation
    pub generation: Generation,
    /// Confidence interval (percent)
    pub confidence: u32,
}

impl Display for CapacityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} MHz {} ({}, CI {}%)",
            self.frequency_mhz, self.generation, self.geotype, self.confidence
        )
    }
}

/// Error for a capacity curve missing from the lookup table.
///
/// A miss means the input data does not cover a band the frequency plan
/// deploys. It is never defaulted: a silently substituted curve would corrupt
/// every downstream cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapacityLookupMiss {
    /// The key that had no curve
    pub key: CapacityKey,
}

impl Display for CapacityLookupMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "No capacity curve for {}", self.key)
    }
}

impl std::error::Error for CapacityLookupMiss {}

/// One breakpoint on a capacity curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapacityPoint {
    /// Site density (sites/km2)
    pub site_density_km2: f64,
    /// Deliverable capacity at that density (Mbps/km2)
    pub capacity_mbps_km2: f64,
}

/// A row of the capacity lookup table CSV file
#[derive(Debug, Clone, Deserialize)]
struct CapacityRecord {
    #[serde(deserialize_with = "deserialise_geotype")]
    geotype: Geotype,
    antenna_type: AntennaType,
    frequency_mhz: u32,
    generation: Generation,
    confidence_interval: u32,
    site_density_km2: f64,
    capacity_mbps_km2: f64,
}

/// Capacity lookup table, read from `capacity_lut.csv`
#[derive(Debug, Clone, PartialEq)]
pub struct CapacityLut(HashMap<CapacityKey, Vec<CapacityPoint>>);

impl CapacityLut {
    /// Read the capacity lookup table from the CSV file in `model_dir`
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<Self> {
        let file_path = model_dir.as_ref().join(CAPACITY_LUT_FILE_NAME);
        let records = read_csv::<CapacityRecord>(&file_path)?;
        Self::from_records(records).with_context(|| input_err_msg(&file_path))
    }

    fn from_records<I: IntoIterator<Item = CapacityRecord>>(records: I) -> Result<Self> {
        let mut curves: HashMap<CapacityKey, Vec<CapacityPoint>> = HashMap::new();
        for record in records {
            let key = CapacityKey {
                geotype: record.geotype,
                antenna_type: record.antenna_type,
                frequency_mhz: record.frequency_mhz,
                generation: record.generation,
                confidence: record.confidence_interval,
            };
            curves.entry(key).or_default().push(CapacityPoint {
                site_density_km2: record.site_density_km2,
                capacity_mbps_km2: record.capacity_mbps_km2,
            });
        }

        for (key, curve) in curves.iter_mut() {
            curve.sort_by(|a, b| a.site_density_km2.total_cmp(&b.site_density_km2));
            ensure!(
                curve.len() >= 2,
                "Capacity curve for {key} needs at least two points for interpolation"
            );
            for (lower, upper) in curve.iter().tuple_windows() {
                ensure!(
                    lower.site_density_km2 < upper.site_density_km2,
                    "Duplicate site density {} in capacity curve for {key}",
                    lower.site_density_km2
                );
                ensure!(
                    lower.capacity_mbps_km2 <= upper.capacity_mbps_km2,
                    "Capacity must be non-decreasing in site density for {key} \
                    ({} Mbps/km2 at {} sites/km2 followed by {} Mbps/km2 at {})",
                    lower.capacity_mbps_km2,
                    lower.site_density_km2,
                    upper.capacity_mbps_km2,
                    upper.site_density_km2
                );
            }
        }

        Ok(Self(curves))
    }

    /// The curve for one key, or a [`CapacityLookupMiss`] if absent
    pub fn curve(&self, key: CapacityKey) -> Result<&[CapacityPoint], CapacityLookupMiss> {
        self.0
            .get(&key)
            .map(Vec::as_slice)
            .ok_or(CapacityLookupMiss { key })
    }

    /// Resolve the site density required to meet a demand value.
    ///
    /// Merges the curves for every band in `plan` (summing capacities at
    /// equal site densities, with TDD bands derated to their downlink share)
    /// and interpolates linearly between the surrounding breakpoints. Demand
    /// outside the curve is clamped to the curve's density range.
    pub fn site_density(
        &self,
        demand_mbps_km2: f64,
        geotype: Geotype,
        generation: Generation,
        plan: &[FrequencyBand],
        confidence: u32,
        tdd_downlink_percentage: f64,
    ) -> Result<f64> {
        if demand_mbps_km2 <= 0.0 {
            return Ok(0.0);
        }

        let mut totals: HashMap<u64, f64> = HashMap::new();
        for band in plan {
            let key = CapacityKey {
                geotype,
                antenna_type: SITE_ANTENNA,
                frequency_mhz: band.frequency_mhz,
                generation,
                confidence,
            };
            let curve = self.curve(key)?;

            // Single-channel bands are TDD; only the downlink share counts
            let factor = if band.channels == 1 {
                tdd_downlink_percentage / 100.0
            } else {
                1.0
            };
            for point in curve {
                *totals.entry(point.site_density_km2.to_bits()).or_insert(0.0) +=
                    point.capacity_mbps_km2 * factor;
            }
        }

        let merged = totals
            .into_iter()
            .map(|(bits, capacity_mbps_km2)| CapacityPoint {
                site_density_km2: f64::from_bits(bits),
                capacity_mbps_km2,
            })
            .sorted_by(|a, b| a.site_density_km2.total_cmp(&b.site_density_km2))
            .collect_vec();

        let first = merged.first().context("Empty frequency plan")?;
        let last = merged.last().context("Empty frequency plan")?;
        if demand_mbps_km2 >= last.capacity_mbps_km2 {
            return Ok(last.site_density_km2);
        }
        if demand_mbps_km2 < first.capacity_mbps_km2 {
            return Ok(first.site_density_km2);
        }

        for (lower, upper) in merged.iter().tuple_windows() {
            if lower.capacity_mbps_km2 <= demand_mbps_km2
                && demand_mbps_km2 < upper.capacity_mbps_km2
            {
                let span = upper.capacity_mbps_km2 - lower.capacity_mbps_km2;
                let density = (lower.site_density_km2 * (upper.capacity_mbps_km2 - demand_mbps_km2)
                    + upper.site_density_km2 * (demand_mbps_km2 - lower.capacity_mbps_km2))
                    / span;
                return Ok(density);
            }
        }

        Ok(last.site_density_km2)
    }
}
