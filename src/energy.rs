//! Energy demand and emissions assessment for the built network.
//!
//! Every energy-drawing asset (radio equipment and wireless backhaul links,
//! plus any core or regional nodes with a non-zero rating) has a kWh-per-hour
//! rating configured in `model.toml`. Annual demand per region is split into
//! on-grid and off-grid rows using the region's grid-access percentage.
//! On-grid emissions follow the configured grid generation mix; off-grid
//! sites run on diesel under a `baseline` power strategy and on renewables
//! under a `renewable` one. Under active sharing (and SRN in rural areas) the
//! operators run one network between them, so per-operator demand is divided
//! by the operator count.
use crate::assets::{Asset, AssetKind};
use crate::parameters::CountryParameters;
use crate::region::{Region, RegionID};
use crate::strategy::{PowerStrategy, Sharing, Strategy};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};

const HOURS_PER_YEAR: f64 = 24.0 * 365.0;

/// Tolerance when checking that grid mix shares sum to 100%
const GRID_MIX_SUM_TOLERANCE: f64 = 0.01;

/// An electricity generation source
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
#[allow(missing_docs)]
pub enum FuelSource {
    #[string = "oil"]
    Oil,
    #[string = "gas"]
    Gas,
    #[string = "coal"]
    Coal,
    #[string = "nuclear"]
    Nuclear,
    #[string = "hydro"]
    Hydro,
    #[string = "diesel"]
    Diesel,
    #[string = "renewables"]
    Renewables,
}

/// Whether a demand row covers grid-connected or off-grid sites
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    SerializeLabeledStringEnum,
    DeserializeLabeledStringEnum,
)]
pub enum GridType {
    /// Sites with access to grid electricity
    #[string = "on_grid"]
    OnGrid,
    /// Sites generating their own power
    #[string = "off_grid"]
    OffGrid,
}

/// Power draw ratings per energy-drawing asset kind (kWh per hour per unit)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[allow(missing_docs)]
pub struct EnergyDemand {
    pub equipment_kwh: f64,
    pub wireless_small_kwh: f64,
    pub wireless_medium_kwh: f64,
    pub wireless_large_kwh: f64,
    pub core_node_kwh: f64,
    pub regional_node_kwh: f64,
}

impl EnergyDemand {
    /// The rating for one asset kind, zero for assets that draw no power
    pub fn rating_kwh_per_hour(&self, kind: AssetKind) -> f64 {
        match kind {
            AssetKind::Equipment => self.equipment_kwh,
            AssetKind::BackhaulWirelessSmall => self.wireless_small_kwh,
            AssetKind::BackhaulWirelessMedium => self.wireless_medium_kwh,
            AssetKind::BackhaulWirelessLarge => self.wireless_large_kwh,
            AssetKind::CoreNode => self.core_node_kwh,
            AssetKind::RegionalNode => self.regional_node_kwh,
            _ => 0.0,
        }
    }

    fn entries(&self) -> [(&'static str, f64); 6] {
        [
            ("equipment_kwh", self.equipment_kwh),
            ("wireless_small_kwh", self.wireless_small_kwh),
            ("wireless_medium_kwh", self.wireless_medium_kwh),
            ("wireless_large_kwh", self.wireless_large_kwh),
            ("core_node_kwh", self.core_node_kwh),
            ("regional_node_kwh", self.regional_node_kwh),
        ]
    }
}

/// Emissions per kWh generated from one fuel source (kg)
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[allow(missing_docs)]
pub struct EmissionsFactors {
    pub carbon_per_kwh: f64,
    pub nitrogen_oxide_per_kwh: f64,
    pub sulphur_dioxide_per_kwh: f64,
    pub pm10_per_kwh: f64,
}

impl EmissionsFactors {
    fn entries(&self) -> [(&'static str, f64); 4] {
        [
            ("carbon_per_kwh", self.carbon_per_kwh),
            ("nitrogen_oxide_per_kwh", self.nitrogen_oxide_per_kwh),
            ("sulphur_dioxide_per_kwh", self.sulphur_dioxide_per_kwh),
            ("pm10_per_kwh", self.pm10_per_kwh),
        ]
    }
}

/// Energy configuration from the `[country.energy]` tables of `model.toml`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EnergyParameters {
    /// Power draw per energy-drawing asset kind
    pub demand: EnergyDemand,
    /// Grid electricity generation mix (percent per fuel source)
    pub grid_mix: IndexMap<FuelSource, f64>,
    /// Emissions per kWh generated from each fuel source
    pub emissions_factors: IndexMap<FuelSource, EmissionsFactors>,
}

impl EnergyParameters {
    /// Check that ratings, mix shares and factors are complete and sensible
    pub fn validate(&self) -> Result<()> {
        for (name, rating) in self.demand.entries() {
            ensure!(
                rating.is_finite() && rating >= 0.0,
                "Energy rating `{name}` must be finite and non-negative, got {rating}"
            );
        }

        ensure!(!self.grid_mix.is_empty(), "`grid_mix` is empty");
        let mut sum = 0.0;
        for (&fuel, &share) in &self.grid_mix {
            ensure!(
                share.is_finite() && share >= 0.0,
                "grid_mix share for {fuel} must be finite and non-negative, got {share}"
            );
            sum += share;
        }
        ensure!(
            (sum - 100.0).abs() <= GRID_MIX_SUM_TOLERANCE,
            "grid_mix shares must sum to 100%, got {sum}"
        );

        for fuel in self.grid_mix.keys() {
            self.factors(*fuel)?;
        }
        // Off-grid generation under both power strategies
        self.factors(FuelSource::Diesel)?;
        self.factors(FuelSource::Renewables)?;

        for (fuel, factors) in &self.emissions_factors {
            for (name, factor) in factors.entries() {
                ensure!(
                    factor.is_finite() && factor >= 0.0,
                    "Emissions factor `{name}` for {fuel} must be finite and \
                    non-negative, got {factor}"
                );
            }
        }

        Ok(())
    }

    fn factors(&self, fuel: FuelSource) -> Result<&EmissionsFactors> {
        self.emissions_factors
            .get(&fuel)
            .with_context(|| format!("No emissions factors configured for {fuel}"))
    }
}

/// Annual energy demand and emissions for one region and grid type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergyRecord {
    /// Scenario evaluated
    pub scenario: String,
    /// Strategy evaluated
    pub strategy: String,
    /// Region the demand arises in
    pub region_id: RegionID,
    /// Whether this row covers grid-connected or off-grid sites
    pub grid_type: GridType,
    /// Share of the region's sites on this grid type (percent)
    pub grid_share_percentage: f64,
    /// Annual demand from radio equipment, modelled operator (kWh)
    pub mno_equipment_annual_kwh: f64,
    /// Annual demand from wireless backhaul links, modelled operator (kWh)
    pub mno_backhaul_annual_kwh: f64,
    /// Total annual demand, modelled operator (kWh)
    pub mno_energy_annual_kwh: f64,
    /// Total annual demand across the whole market (kWh)
    pub total_energy_annual_kwh: f64,
    /// Annual carbon emissions, modelled operator (kg)
    pub carbon_kg: f64,
    /// Annual nitrogen oxide emissions, modelled operator (kg)
    pub nitrogen_oxide_kg: f64,
    /// Annual sulphur dioxide emissions, modelled operator (kg)
    pub sulphur_dioxide_kg: f64,
    /// Annual PM10 particulate emissions, modelled operator (kg)
    pub pm10_kg: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct Emissions {
    carbon_kg: f64,
    nitrogen_oxide_kg: f64,
    sulphur_dioxide_kg: f64,
    pm10_kg: f64,
}

impl Emissions {
    fn add(&mut self, demand_kwh: f64, factors: &EmissionsFactors) {
        self.carbon_kg += demand_kwh * factors.carbon_per_kwh;
        self.nitrogen_oxide_kg += demand_kwh * factors.nitrogen_oxide_per_kwh;
        self.sulphur_dioxide_kg += demand_kwh * factors.sulphur_dioxide_per_kwh;
        self.pm10_kg += demand_kwh * factors.pm10_per_kwh;
    }
}

/// Emissions from `demand_kwh` drawn from the grid, per the generation mix
fn grid_emissions(demand_kwh: f64, energy: &EnergyParameters) -> Result<Emissions> {
    let mut emissions = Emissions::default();
    for (&fuel, &share) in &energy.grid_mix {
        emissions.add(demand_kwh * share / 100.0, energy.factors(fuel)?);
    }
    Ok(emissions)
}

/// Emissions from `demand_kwh` generated off-grid from a single fuel
fn off_grid_emissions(
    demand_kwh: f64,
    power: PowerStrategy,
    energy: &EnergyParameters,
) -> Result<Emissions> {
    let fuel = match power {
        PowerStrategy::Baseline => FuelSource::Diesel,
        PowerStrategy::Renewable => FuelSource::Renewables,
    };
    let mut emissions = Emissions::default();
    emissions.add(demand_kwh, energy.factors(fuel)?);
    Ok(emissions)
}

/// Assess a region's annual energy demand and emissions.
///
/// Returns one record per grid type present in the region; a region entirely
/// on or off the grid yields a single record.
pub fn assess_energy(
    region: &Region,
    assets: &[Asset],
    strategy: &Strategy,
    country: &CountryParameters,
) -> Result<Vec<EnergyRecord>> {
    let energy = &country.energy;

    // One network runs for all party operators under active-style sharing
    let operators = match strategy.sharing {
        Sharing::Active | Sharing::Srn if strategy.sharing.applies_to(region.geotype) => {
            country.networks.get(strategy.sharing, region.geotype)?
        }
        _ => 1.0,
    };

    let mut equipment_kwh = 0.0;
    let mut backhaul_kwh = 0.0;
    let mut all_kwh = 0.0;
    for asset in assets {
        let rating = energy.demand.rating_kwh_per_hour(asset.kind);
        if rating == 0.0 {
            continue;
        }
        let annual = asset.quantity * asset.backhaul_units * rating * HOURS_PER_YEAR / operators;
        if asset.kind == AssetKind::Equipment {
            equipment_kwh += annual;
        }
        if asset.kind.is_backhaul() {
            backhaul_kwh += annual;
        }
        all_kwh += annual;
    }

    let networks = country.networks.get(Sharing::Baseline, region.geotype)?;
    let grid_shares = [
        (GridType::OnGrid, region.on_grid_percentage),
        (GridType::OffGrid, 100.0 - region.on_grid_percentage),
    ];

    let mut records = Vec::new();
    for (grid_type, share) in grid_shares {
        if share <= 0.0 {
            continue;
        }
        let mno_kwh = all_kwh * share / 100.0;
        let emissions = match grid_type {
            GridType::OnGrid => grid_emissions(mno_kwh, energy)?,
            GridType::OffGrid => off_grid_emissions(mno_kwh, strategy.power, energy)?,
        };
        records.push(EnergyRecord {
            scenario: region.scenario.clone(),
            strategy: region.strategy.clone(),
            region_id: region.id.clone(),
            grid_type,
            grid_share_percentage: share,
            mno_equipment_annual_kwh: equipment_kwh * share / 100.0,
            mno_backhaul_annual_kwh: backhaul_kwh * share / 100.0,
            mno_energy_annual_kwh: mno_kwh,
            total_energy_annual_kwh: mno_kwh * networks,
            carbon_kg: emissions.carbon_kg,
            nitrogen_oxide_kg: emissions.nitrogen_oxide_kg,
            sulphur_dioxide_kg: emissions.sulphur_dioxide_kg,
            pm10_kg: emissions.pm10_kg,
        });
    }

    Ok(records)
}
