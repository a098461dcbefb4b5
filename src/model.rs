//! The model: all input data plus the run loop over scenarios and strategies.
use crate::assess::assess;
use crate::assets::{Asset, CoreLut, estimate_assets};
use crate::capacity::CapacityLut;
use crate::costs::find_cost;
use crate::energy::{EnergyRecord, assess_energy};
use crate::market::scale_to_market;
use crate::parameters::Parameters;
use crate::region::{Region, RegionID, read_regions};
use crate::supply::estimate_supply;
use anyhow::{Context, Result};
use log::info;
use serde::Serialize;
use std::path::Path;

/// A fully loaded model, ready to run
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    /// Validated model parameters
    pub parameters: Parameters,
    /// Capacity lookup table
    pub capacity_lut: CapacityLut,
    /// Core network lookup table
    pub core_lut: CoreLut,
    /// Input region records
    pub regions: Vec<Region>,
}

/// One asset record with the evaluation context it was built under
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetRecord {
    /// Scenario evaluated
    pub scenario: String,
    /// Strategy evaluated
    pub strategy: String,
    /// Region the asset belongs to
    pub region_id: RegionID,
    /// What the asset is
    pub asset: crate::assets::AssetKind,
    /// How it enters the network
    pub build_type: crate::assets::BuildType,
    /// Who bears its cost
    pub ownership: crate::assets::Ownership,
    /// Number of units
    pub quantity: f64,
    /// Unit cost (USD)
    pub cost_per_unit: f64,
    /// Links per site or metres for backhaul assets
    pub backhaul_units: f64,
    /// Undiscounted total cost before sharing (USD)
    pub total_cost: f64,
}

impl AssetRecord {
    fn new(scenario: &str, strategy: &str, region_id: &RegionID, asset: Asset) -> Self {
        Self {
            scenario: scenario.to_string(),
            strategy: strategy.to_string(),
            region_id: region_id.clone(),
            asset: asset.kind,
            build_type: asset.build_type,
            ownership: asset.ownership,
            quantity: asset.quantity,
            cost_per_unit: asset.cost_per_unit,
            backhaul_units: asset.backhaul_units,
            total_cost: asset.total_cost,
        }
    }
}

/// The enriched outputs of a model run
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelResults {
    /// Every region, once per scenario and strategy evaluated
    pub regions: Vec<Region>,
    /// Every asset built or kept running, with its evaluation context
    pub assets: Vec<AssetRecord>,
    /// Annual energy demand and emissions per region and grid type
    pub energy: Vec<EnergyRecord>,
}

impl Model {
    /// Load and validate all model input files from the given directory
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<Model> {
        let model_dir = model_dir.as_ref();
        let parameters = Parameters::from_path(model_dir)?;
        let capacity_lut = CapacityLut::from_path(model_dir)?;
        let core_lut = CoreLut::from_path(model_dir)?;
        let regions = read_regions(model_dir)
            .with_context(|| format!("Error loading model from {}", model_dir.to_string_lossy()))?;

        info!(
            "Loaded {} regions, {} scenarios and {} strategies from {}",
            regions.len(),
            parameters.scenarios.len(),
            parameters.strategies.len(),
            model_dir.to_string_lossy()
        );

        Ok(Model {
            parameters,
            capacity_lut,
            core_lut,
            regions,
        })
    }

    /// Run every scenario and strategy combination over every region.
    ///
    /// Supply, assets and costs are independent per region; the assessment
    /// pass then runs over the whole region set because the cross-subsidy
    /// pool is shared. Results are deterministic for identical inputs.
    pub fn run(&self) -> Result<ModelResults> {
        let global = &self.parameters.global;
        let country = &self.parameters.country;

        let mut results = ModelResults::default();
        for scenario in &self.parameters.scenarios {
            for strategy in &self.parameters.strategies {
                info!("Evaluating scenario {scenario} under strategy {strategy}");

                let mut regions = self.regions.clone();
                for region in &mut regions {
                    estimate_supply(
                        region,
                        scenario,
                        strategy,
                        global,
                        country,
                        &self.capacity_lut,
                    )?;
                    let assets = estimate_assets(region, strategy, country, &self.core_lut)?;
                    find_cost(region, &assets, strategy, global, country)?;
                    results
                        .energy
                        .extend(assess_energy(region, &assets, strategy, country)?);

                    results.assets.extend(
                        assets.into_iter().map(|asset| {
                            AssetRecord::new(&region.scenario, &region.strategy, &region.id, asset)
                        }),
                    );
                }

                let mut regions = assess(regions, strategy, global, country);
                for region in &mut regions {
                    scale_to_market(region);
                }
                results.regions.extend(regions);
            }
        }

        info!(
            "Run complete: {} region results, {} assets, {} energy records",
            results.regions.len(),
            results.assets.len(),
            results.energy.len()
        );

        Ok(results)
    }
}
