//! Regions are the geographic units the model is evaluated over.
//!
//! A region record arrives from the upstream geospatial preprocessing with
//! population, demand and existing-infrastructure fields, and is enriched in
//! place by each pipeline stage; the computed fields are only ever written,
//! never read from input.
use crate::id::define_id_type;
use crate::input::{deserialise_geotype, input_err_msg, read_csv};
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumString};

const REGIONS_FILE_NAME: &str = "regions.csv";

define_id_type! {RegionID}

/// Settlement density class, driving unit costs and operator counts.
///
/// Input data may carry a numeric suffix (e.g. "suburban 1"); only the first
/// whitespace-separated token is significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Geotype {
    /// Dense settlements
    Urban,
    /// Settlement fringes
    Suburban,
    /// Sparsely populated areas
    Rural,
}

impl Serialize for Geotype {
    fn serialize<S: Serializer>(&self, serialiser: S) -> Result<S::Ok, S::Error> {
        serialiser.serialize_str(self.as_ref())
    }
}

impl Geotype {
    /// Parse a geotype from an input string, ignoring any suffix
    pub fn from_input_str(s: &str) -> Result<Self, strum::ParseError> {
        let first = s.split_whitespace().next().unwrap_or(s);
        Self::from_str(first)
    }
}

/// One geographic unit, enriched in place as it passes through the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Unique identifier for the region (e.g. "COL.14.12_1")
    pub id: RegionID,
    /// Settlement density class
    #[serde(deserialize_with = "deserialise_geotype")]
    pub geotype: Geotype,
    /// Area of the region in km²
    pub area_km2: f64,
    /// Total resident population
    pub population_total: f64,
    /// Population owning a phone (whole market)
    pub population_with_phones: f64,
    /// Population owning a smartphone (whole market)
    pub population_with_smartphones: f64,
    /// Phone users on the modelled operator's network
    pub phones_on_network: f64,
    /// Smartphone users on the modelled operator's network
    pub smartphones_on_network: f64,
    /// Revenue of the modelled operator over the assessment period (USD)
    pub total_mno_revenue: f64,
    /// Demand density to be served (Mbps per km²)
    pub demand_mbps_km2: f64,
    /// Existing sites across all operators, any technology
    pub total_estimated_sites: f64,
    /// Existing 4G sites across all operators
    pub sites_4g: f64,
    /// Existing fibre backhaul links across all operators
    pub backhaul_fiber: f64,
    /// Existing wireless backhaul links across all operators
    pub backhaul_wireless: f64,
    /// Share of sites with access to grid electricity (percent)
    pub on_grid_percentage: f64,

    // Fields below are computed by the pipeline and only serialised on output.
    /// Scenario evaluated (canonical token string)
    #[serde(skip_deserializing)]
    pub scenario: String,
    /// Strategy evaluated (canonical token string)
    #[serde(skip_deserializing)]
    pub strategy: String,
    /// Confidence interval used for capacity lookups (percent)
    #[serde(skip_deserializing)]
    pub confidence: u32,
    /// Required site density (sites per km²)
    #[serde(skip_deserializing)]
    pub site_density: f64,
    /// Existing sites attributable to the modelled operator
    #[serde(skip_deserializing)]
    pub existing_mno_sites: f64,
    /// Greenfield sites the operator must build
    #[serde(skip_deserializing)]
    pub new_mno_sites: f64,
    /// Existing sites the operator must upgrade
    #[serde(skip_deserializing)]
    pub upgraded_mno_sites: f64,
    /// Backhaul links needing to be built or replaced
    #[serde(skip_deserializing)]
    pub backhaul_new: f64,
    /// Discounted radio access network cost (USD)
    #[serde(skip_deserializing)]
    pub ran: f64,
    /// Discounted backhaul and fronthaul cost (USD)
    #[serde(skip_deserializing)]
    pub backhaul_fronthaul: f64,
    /// Discounted civil works cost (USD)
    #[serde(skip_deserializing)]
    pub civils: f64,
    /// Discounted core network cost (USD)
    #[serde(skip_deserializing)]
    pub core_network: f64,
    /// Total discounted network cost (USD)
    #[serde(skip_deserializing)]
    pub network_cost: f64,
    /// Discounted administration cost (USD)
    #[serde(skip_deserializing)]
    pub administration: f64,
    /// Spectrum licence cost (USD)
    #[serde(skip_deserializing)]
    pub spectrum_cost: f64,
    /// Tax on the network investment (USD)
    #[serde(skip_deserializing)]
    pub tax: f64,
    /// Operator profit margin (USD)
    #[serde(skip_deserializing)]
    pub profit_margin: f64,
    /// Total cost to the modelled operator (USD)
    #[serde(skip_deserializing)]
    pub total_mno_cost: f64,
    /// Total operator cost per smartphone user (USD)
    #[serde(skip_deserializing)]
    pub cost_per_smartphone_user: f64,
    /// Surplus available for cross-subsidising other regions (USD)
    #[serde(skip_deserializing)]
    pub available_cross_subsidy: f64,
    /// Shortfall of revenue against cost (USD)
    #[serde(skip_deserializing)]
    pub deficit: f64,
    /// Cross-subsidy drawn from the shared pool (USD)
    #[serde(skip_deserializing)]
    pub used_cross_subsidy: f64,
    /// State subsidy required after cross-subsidisation (USD)
    #[serde(skip_deserializing)]
    pub required_state_subsidy: f64,

    // Market-scaled totals across all operators.
    /// Phone users across the whole market
    #[serde(skip_deserializing)]
    pub total_phones: f64,
    /// Smartphone users across the whole market
    #[serde(skip_deserializing)]
    pub total_smartphones: f64,
    /// Market-wide revenue (USD)
    #[serde(skip_deserializing)]
    pub total_market_revenue: f64,
    /// Market-wide existing sites
    #[serde(skip_deserializing)]
    pub total_sites: f64,
    /// Market-wide upgraded sites
    #[serde(skip_deserializing)]
    pub total_upgraded_sites: f64,
    /// Market-wide new sites
    #[serde(skip_deserializing)]
    pub total_new_sites: f64,
    /// Market-wide RAN cost (USD)
    #[serde(skip_deserializing)]
    pub total_ran: f64,
    /// Market-wide backhaul and fronthaul cost (USD)
    #[serde(skip_deserializing)]
    pub total_backhaul_fronthaul: f64,
    /// Market-wide civil works cost (USD)
    #[serde(skip_deserializing)]
    pub total_civils: f64,
    /// Market-wide core network cost (USD)
    #[serde(skip_deserializing)]
    pub total_core_network: f64,
    /// Market-wide network cost (USD)
    #[serde(skip_deserializing)]
    pub total_network_cost: f64,
    /// Market-wide administration cost (USD)
    #[serde(skip_deserializing)]
    pub total_administration: f64,
    /// Market-wide spectrum cost (USD)
    #[serde(skip_deserializing)]
    pub total_spectrum_cost: f64,
    /// Market-wide tax (USD)
    #[serde(skip_deserializing)]
    pub total_tax: f64,
    /// Market-wide profit margin (USD)
    #[serde(skip_deserializing)]
    pub total_profit_margin: f64,
    /// Market-wide total cost (USD)
    #[serde(skip_deserializing)]
    pub total_market_cost: f64,
    /// Market-wide available cross-subsidy (USD)
    #[serde(skip_deserializing)]
    pub total_available_cross_subsidy: f64,
    /// Market-wide deficit (USD)
    #[serde(skip_deserializing)]
    pub total_deficit: f64,
    /// Market-wide used cross-subsidy (USD)
    #[serde(skip_deserializing)]
    pub total_used_cross_subsidy: f64,
    /// Market-wide required state subsidy (USD)
    #[serde(skip_deserializing)]
    pub total_required_state_subsidy: f64,
}

impl Region {
    /// The input fields that must be finite and non-negative
    fn counted_fields(&self) -> [(&'static str, f64); 10] {
        [
            ("population_total", self.population_total),
            ("population_with_phones", self.population_with_phones),
            ("population_with_smartphones", self.population_with_smartphones),
            ("phones_on_network", self.phones_on_network),
            ("smartphones_on_network", self.smartphones_on_network),
            ("total_mno_revenue", self.total_mno_revenue),
            ("total_estimated_sites", self.total_estimated_sites),
            ("sites_4g", self.sites_4g),
            ("backhaul_fiber", self.backhaul_fiber),
            ("backhaul_wireless", self.backhaul_wireless),
        ]
    }
}

/// Read and validate the region records from the CSV file in `model_dir`
pub fn read_regions<P: AsRef<Path>>(model_dir: P) -> Result<Vec<Region>> {
    let file_path = model_dir.as_ref().join(REGIONS_FILE_NAME);
    let regions: Vec<Region> = read_csv(&file_path)?;
    validate_regions(&regions).with_context(|| input_err_msg(&file_path))?;
    Ok(regions)
}

fn validate_regions(regions: &[Region]) -> Result<()> {
    let mut seen = HashSet::new();
    for region in regions {
        ensure!(
            seen.insert(region.id.clone()),
            "Duplicate region {}",
            region.id
        );
        ensure!(
            region.area_km2.is_finite() && region.area_km2 > 0.0,
            "Region {} has non-positive area {}",
            region.id,
            region.area_km2
        );
        ensure!(
            region.demand_mbps_km2.is_finite() && region.demand_mbps_km2 >= 0.0,
            "Region {} has invalid demand {}",
            region.id,
            region.demand_mbps_km2
        );
        for (name, value) in region.counted_fields() {
            ensure!(
                value.is_finite() && value >= 0.0,
                "Region {} has invalid {name}: {value}",
                region.id
            );
        }
        ensure!(
            region.on_grid_percentage.is_finite()
                && (0.0..=100.0).contains(&region.on_grid_percentage),
            "Region {} has on_grid_percentage outside 0-100: {}",
            region.id,
            region.on_grid_percentage
        );
    }
    Ok(())
}
