//! Model parameters, read from `model.toml` and validated eagerly.
//!
//! All configuration is immutable after load: the pipeline receives these
//! structs by reference and never writes to them.
use crate::assets::AssetKind;
use crate::energy::EnergyParameters;
use crate::input::{input_err_msg, read_toml};
use crate::region::Geotype;
use crate::strategy::{Generation, Scenario, Sharing, Strategy};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

const MODEL_PARAMETERS_FILE_NAME: &str = "model.toml";

macro_rules! define_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            $value
        }
    };
}

define_param_default!(default_tdd_downlink_percentage, f64, 80.0);
define_param_default!(default_confidence_level, u32, 50);

/// Parameters shared by every country model
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GlobalParameters {
    /// Discount rate applied to future cash flows (percent)
    pub discount_rate: f64,
    /// Annual opex charged on capex-and-opex assets (percent of capex)
    pub opex_percentage_of_capex: f64,
    /// Number of years over which opex streams are discounted
    pub return_period: u32,
    /// Number of years over which administration costs accrue
    pub assessment_period: u32,
    /// Downlink share of TDD channel bandwidth (percent)
    #[serde(default = "default_tdd_downlink_percentage")]
    pub tdd_downlink_percentage: f64,
    /// Confidence interval used for capacity lookups (percent)
    #[serde(default = "default_confidence_level")]
    pub confidence_level: u32,
}

/// Operator counts per (sharing policy, geotype).
///
/// Built from the nested `[country.networks.<policy>]` TOML tables. A lookup
/// for a combination that is not configured is a fatal configuration error.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorCounts(IndexMap<(Sharing, Geotype), f64>);

impl OperatorCounts {
    /// Create operator counts from explicit entries (used by tests)
    pub fn new<I: IntoIterator<Item = ((Sharing, Geotype), f64)>>(entries: I) -> Self {
        Self(entries.into_iter().collect())
    }

    /// The number of operators for the given sharing policy and geotype
    pub fn get(&self, sharing: Sharing, geotype: Geotype) -> Result<f64> {
        self.0.get(&(sharing, geotype)).copied().with_context(|| {
            format!("No operator count configured for {sharing} networks in {geotype} areas")
        })
    }

    /// Iterate over all configured entries
    pub fn iter(&self) -> impl Iterator<Item = (&(Sharing, Geotype), &f64)> {
        self.0.iter()
    }
}

impl<'de> Deserialize<'de> for OperatorCounts {
    fn deserialize<D>(deserialiser: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw: IndexMap<String, IndexMap<String, f64>> = Deserialize::deserialize(deserialiser)?;

        let mut counts = IndexMap::new();
        for (sharing, by_geotype) in raw {
            let sharing = Sharing::from_str(&sharing).map_err(|_| {
                serde::de::Error::custom(format!("Unknown sharing policy {sharing:?}"))
            })?;
            for (geotype, count) in by_geotype {
                let geotype = Geotype::from_str(&geotype).map_err(|_| {
                    serde::de::Error::custom(format!("Unknown geotype {geotype:?}"))
                })?;
                counts.insert((sharing, geotype), count);
            }
        }

        Ok(Self(counts))
    }
}

/// Financial parameters for the modelled country
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Financials {
    /// Weighted average cost of capital (percent)
    pub wacc: f64,
    /// Profit margin applied on top of all costs and taxes (percent)
    pub profit_margin: f64,
    /// Annual administration cost (percent of network cost)
    pub administration_percentage_of_network_cost: f64,
    /// Baseline spectrum price for coverage bands, < 1000 MHz (USD/MHz/pop)
    pub spectrum_coverage_usd_mhz_pop: f64,
    /// Baseline spectrum price for capacity bands, >= 1000 MHz (USD/MHz/pop)
    pub spectrum_capacity_usd_mhz_pop: f64,
    /// Spectrum price under a `low` spectrum strategy (percent of baseline)
    pub spectrum_cost_low: f64,
    /// Spectrum price under a `high` spectrum strategy (percent of baseline)
    pub spectrum_cost_high: f64,
    /// Baseline tax rate on network investment (percent)
    pub tax_baseline: f64,
    /// Tax rate under a `low` tax strategy (percent)
    pub tax_low: f64,
    /// Tax rate under a `high` tax strategy (percent)
    pub tax_high: f64,
}

/// One licensed frequency band in a generation's deployment plan
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct FrequencyBand {
    /// Carrier frequency (MHz)
    pub frequency_mhz: u32,
    /// Number of channels; 1 indicates a TDD band
    pub channels: u32,
    /// Bandwidth per channel (MHz)
    pub bandwidth_mhz: f64,
}

impl FrequencyBand {
    /// Total licensed bandwidth across all channels (MHz)
    pub fn total_bandwidth_mhz(&self) -> f64 {
        self.channels as f64 * self.bandwidth_mhz
    }
}

/// The frequency bands deployed under each technology generation
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FrequencyPlans {
    /// Bands deployed under a 4G strategy
    #[serde(rename = "4G")]
    pub g4: Vec<FrequencyBand>,
    /// Bands deployed under a 5G strategy
    #[serde(rename = "5G")]
    pub g5: Vec<FrequencyBand>,
}

impl FrequencyPlans {
    /// The frequency plan for the given generation
    pub fn plan(&self, generation: Generation) -> &[FrequencyBand] {
        match generation {
            Generation::G4 => &self.g4,
            Generation::G5 => &self.g5,
        }
    }
}

/// Unit costs for every asset the model can price (USD)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[allow(missing_docs)]
pub struct AssetCosts {
    pub equipment: f64,
    pub site_build: f64,
    pub installation: f64,
    pub operation_and_maintenance: f64,
    pub power: f64,
    pub site_rental_urban: f64,
    pub site_rental_suburban: f64,
    pub site_rental_rural: f64,
    pub backhaul_wireless_small: f64,
    pub backhaul_wireless_medium: f64,
    pub backhaul_wireless_large: f64,
    /// Fibre cost per metre by geotype
    pub backhaul_fiber_urban_m: f64,
    pub backhaul_fiber_suburban_m: f64,
    pub backhaul_fiber_rural_m: f64,
    pub core_node: f64,
    /// Core edge cost per metre
    pub core_edge_m: f64,
    pub regional_node: f64,
    /// Regional edge cost per metre
    pub regional_edge_m: f64,
}

impl AssetCosts {
    /// The unit cost for one asset kind
    pub fn unit_cost(&self, kind: AssetKind) -> f64 {
        match kind {
            AssetKind::Equipment => self.equipment,
            AssetKind::SiteBuild => self.site_build,
            AssetKind::Installation => self.installation,
            AssetKind::OperationAndMaintenance => self.operation_and_maintenance,
            AssetKind::Power => self.power,
            AssetKind::SiteRentalUrban => self.site_rental_urban,
            AssetKind::SiteRentalSuburban => self.site_rental_suburban,
            AssetKind::SiteRentalRural => self.site_rental_rural,
            AssetKind::BackhaulWirelessSmall => self.backhaul_wireless_small,
            AssetKind::BackhaulWirelessMedium => self.backhaul_wireless_medium,
            AssetKind::BackhaulWirelessLarge => self.backhaul_wireless_large,
            AssetKind::BackhaulFiberUrban => self.backhaul_fiber_urban_m,
            AssetKind::BackhaulFiberSuburban => self.backhaul_fiber_suburban_m,
            AssetKind::BackhaulFiberRural => self.backhaul_fiber_rural_m,
            AssetKind::CoreNode => self.core_node,
            AssetKind::CoreEdge => self.core_edge_m,
            AssetKind::RegionalNode => self.regional_node,
            AssetKind::RegionalEdge => self.regional_edge_m,
        }
    }

    fn entries(&self) -> [(&'static str, f64); 18] {
        [
            ("equipment", self.equipment),
            ("site_build", self.site_build),
            ("installation", self.installation),
            ("operation_and_maintenance", self.operation_and_maintenance),
            ("power", self.power),
            ("site_rental_urban", self.site_rental_urban),
            ("site_rental_suburban", self.site_rental_suburban),
            ("site_rental_rural", self.site_rental_rural),
            ("backhaul_wireless_small", self.backhaul_wireless_small),
            ("backhaul_wireless_medium", self.backhaul_wireless_medium),
            ("backhaul_wireless_large", self.backhaul_wireless_large),
            ("backhaul_fiber_urban_m", self.backhaul_fiber_urban_m),
            ("backhaul_fiber_suburban_m", self.backhaul_fiber_suburban_m),
            ("backhaul_fiber_rural_m", self.backhaul_fiber_rural_m),
            ("core_node", self.core_node),
            ("core_edge_m", self.core_edge_m),
            ("regional_node", self.regional_node),
            ("regional_edge_m", self.regional_edge_m),
        ]
    }
}

/// Parameters specific to the modelled country
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CountryParameters {
    /// Operator counts per sharing policy and geotype
    pub networks: OperatorCounts,
    /// Financial parameters
    pub financials: Financials,
    /// Frequency plans per technology generation
    pub frequencies: FrequencyPlans,
    /// Unit costs per asset kind
    pub costs: AssetCosts,
    /// Energy demand ratings, grid generation mix and emissions factors
    pub energy: EnergyParameters,
}

/// The full contents of `model.toml`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Parameters {
    /// Demand scenarios to evaluate
    pub scenarios: Vec<Scenario>,
    /// Technology/policy strategies to evaluate
    pub strategies: Vec<Strategy>,
    /// Global model parameters
    pub global: GlobalParameters,
    /// Country-specific parameters
    pub country: CountryParameters,
}

/// Check that a rate expressed in percent is physically meaningful.
///
/// Rates below -100% would invert the sign of discounted cash flows.
fn check_rate(value: f64, name: &str) -> Result<()> {
    ensure!(
        value.is_finite() && value > -100.0,
        "{name} must be a finite percentage greater than -100, got {value}"
    );
    Ok(())
}

fn check_percentage(value: f64, name: &str) -> Result<()> {
    ensure!(
        value.is_finite() && value >= 0.0,
        "{name} must be a finite non-negative percentage, got {value}"
    );
    Ok(())
}

fn check_frequency_plan(plan: &[FrequencyBand], generation: Generation) -> Result<()> {
    ensure!(
        !plan.is_empty(),
        "No frequency bands configured for {generation}"
    );
    for band in plan {
        ensure!(
            band.frequency_mhz > 0 && band.channels > 0 && band.bandwidth_mhz > 0.0,
            "Invalid frequency band for {generation}: \
            {} MHz, {} channel(s) of {} MHz",
            band.frequency_mhz,
            band.channels,
            band.bandwidth_mhz
        );
    }
    Ok(())
}

impl Parameters {
    /// Read and validate the model parameters file in the given directory
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<Parameters> {
        let file_path = model_dir.as_ref().join(MODEL_PARAMETERS_FILE_NAME);
        let params: Parameters = read_toml(&file_path)?;

        params
            .validate()
            .with_context(|| input_err_msg(&file_path))?;

        Ok(params)
    }

    /// Validate parameters after reading in file
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.scenarios.is_empty(), "`scenarios` is empty");
        ensure!(!self.strategies.is_empty(), "`strategies` is empty");

        // global
        check_rate(self.global.discount_rate, "discount_rate")?;
        check_percentage(
            self.global.opex_percentage_of_capex,
            "opex_percentage_of_capex",
        )?;
        ensure!(self.global.return_period > 0, "return_period cannot be zero");
        ensure!(
            self.global.assessment_period > 0,
            "assessment_period cannot be zero"
        );
        ensure!(
            self.global.tdd_downlink_percentage > 0.0
                && self.global.tdd_downlink_percentage <= 100.0,
            "tdd_downlink_percentage must be in (0, 100], got {}",
            self.global.tdd_downlink_percentage
        );

        // country.networks
        for (&(sharing, geotype), &count) in self.country.networks.iter() {
            ensure!(
                count >= 1.0,
                "Operator count for {sharing} networks in {geotype} areas must be \
                at least 1, got {count}"
            );
        }

        // country.financials
        let financials = &self.country.financials;
        check_rate(financials.wacc, "wacc")?;
        check_percentage(financials.profit_margin, "profit_margin")?;
        check_percentage(
            financials.administration_percentage_of_network_cost,
            "administration_percentage_of_network_cost",
        )?;
        check_percentage(financials.spectrum_coverage_usd_mhz_pop, "spectrum_coverage")?;
        check_percentage(financials.spectrum_capacity_usd_mhz_pop, "spectrum_capacity")?;
        check_percentage(financials.spectrum_cost_low, "spectrum_cost_low")?;
        check_percentage(financials.spectrum_cost_high, "spectrum_cost_high")?;
        check_percentage(financials.tax_baseline, "tax_baseline")?;
        check_percentage(financials.tax_low, "tax_low")?;
        check_percentage(financials.tax_high, "tax_high")?;

        // country.frequencies
        check_frequency_plan(&self.country.frequencies.g4, Generation::G4)?;
        check_frequency_plan(&self.country.frequencies.g5, Generation::G5)?;

        // country.costs
        for (name, cost) in self.country.costs.entries() {
            ensure!(
                cost.is_finite() && cost >= 0.0,
                "Unit cost `{name}` must be finite and non-negative, got {cost}"
            );
        }

        // country.energy
        self.country.energy.validate()?;

        Ok(())
    }
}
