//! Cost aggregation: sharing reduction, discounting and bucketing.
//!
//! Each asset's cost is first reduced if it is shared between operators,
//! then discounted to present value according to whether it is a one-off
//! capital cost, a recurring operating cost or both, and finally rolled into
//! one of four named buckets that sum to the region's network cost.
use crate::assets::{Asset, AssetKind, Ownership};
use crate::parameters::{CountryParameters, Financials, GlobalParameters};
use crate::region::{Geotype, Region};
use crate::strategy::{Sharing, Strategy};
use anyhow::Result;

/// How an asset's cost is spread over time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostType {
    /// One-off capital cost in year zero
    Capex,
    /// Recurring annual operating cost
    Opex,
    /// Capital cost plus an annual operating cost derived from it
    CapexAndOpex,
}

/// The named buckets network costs are aggregated into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostBucket {
    /// Radio access network: equipment, rental, operations, power
    Ran,
    /// Backhaul and fronthaul links
    BackhaulFronthaul,
    /// Civil works: towers and installation
    Civils,
    /// Core and regional network elements
    CoreNetwork,
}

impl AssetKind {
    /// How this asset's cost is spread over time
    pub fn cost_type(&self) -> CostType {
        match self {
            Self::SiteBuild | Self::Installation => CostType::Capex,
            Self::OperationAndMaintenance
            | Self::Power
            | Self::SiteRentalUrban
            | Self::SiteRentalSuburban
            | Self::SiteRentalRural => CostType::Opex,
            Self::Equipment
            | Self::BackhaulWirelessSmall
            | Self::BackhaulWirelessMedium
            | Self::BackhaulWirelessLarge
            | Self::BackhaulFiberUrban
            | Self::BackhaulFiberSuburban
            | Self::BackhaulFiberRural
            | Self::CoreNode
            | Self::CoreEdge
            | Self::RegionalNode
            | Self::RegionalEdge => CostType::CapexAndOpex,
        }
    }

    /// The bucket this asset's discounted cost is aggregated into
    pub fn bucket(&self) -> CostBucket {
        match self {
            Self::Equipment
            | Self::OperationAndMaintenance
            | Self::Power
            | Self::SiteRentalUrban
            | Self::SiteRentalSuburban
            | Self::SiteRentalRural => CostBucket::Ran,
            Self::SiteBuild | Self::Installation => CostBucket::Civils,
            kind if kind.is_backhaul() => CostBucket::BackhaulFronthaul,
            _ => CostBucket::CoreNetwork,
        }
    }
}

impl Sharing {
    /// Whether this policy shares the given asset's cost between operators
    pub fn covers(&self, kind: AssetKind) -> bool {
        let passive = matches!(
            kind,
            AssetKind::SiteBuild
                | AssetKind::Installation
                | AssetKind::SiteRentalUrban
                | AssetKind::SiteRentalSuburban
                | AssetKind::SiteRentalRural
        ) || kind.is_backhaul();
        match self {
            Self::Baseline => false,
            Self::Passive => passive,
            Self::Active | Self::Srn => {
                passive
                    || matches!(
                        kind,
                        AssetKind::Equipment
                            | AssetKind::OperationAndMaintenance
                            | AssetKind::Power
                    )
            }
        }
    }

    /// Whether this policy applies in the given geotype.
    ///
    /// A shared rural network only shares outside towns and cities.
    pub fn applies_to(&self, geotype: Geotype) -> bool {
        match self {
            Self::Srn => geotype == Geotype::Rural,
            _ => true,
        }
    }
}

fn discount_factor(rate_percent: f64, year: u32) -> f64 {
    (1.0 + rate_percent / 100.0).powi(year as i32)
}

/// Present value of an annual cost stream over `years`, starting in year zero
pub fn present_value(annual_cost: f64, discount_rate: f64, years: u32) -> f64 {
    (0..years)
        .map(|year| annual_cost / discount_factor(discount_rate, year))
        .sum()
}

/// Discount one asset cost to present value, grossed up by the cost of
/// capital. Capex-and-opex assets accrue an annual operating cost derived
/// from their capital cost.
pub fn discount_cost(
    cost: f64,
    cost_type: CostType,
    global: &GlobalParameters,
    financials: &Financials,
) -> f64 {
    let capital_gross_up = 1.0 + financials.wacc / 100.0;
    match cost_type {
        CostType::Capex => cost * capital_gross_up,
        CostType::Opex => {
            present_value(cost, global.discount_rate, global.return_period) * capital_gross_up
        }
        CostType::CapexAndOpex => {
            let annual_opex = cost * global.opex_percentage_of_capex / 100.0;
            let opex_stream = present_value(annual_opex, global.discount_rate, global.return_period);
            (cost + opex_stream) * capital_gross_up
        }
    }
}

/// Aggregate a region's assets into its discounted cost buckets.
///
/// Shared assets are split between the operators party to the sharing
/// agreement before discounting. The four buckets sum to `network_cost`.
pub fn find_cost(
    region: &mut Region,
    assets: &[Asset],
    strategy: &Strategy,
    global: &GlobalParameters,
    country: &CountryParameters,
) -> Result<()> {
    let networks = country.networks.get(strategy.sharing, region.geotype)?;

    let mut ran = 0.0;
    let mut backhaul_fronthaul = 0.0;
    let mut civils = 0.0;
    let mut core_network = 0.0;

    for asset in assets {
        let mut cost = asset.total_cost;
        if asset.ownership == Ownership::Shared {
            cost /= networks;
        }
        let discounted = discount_cost(cost, asset.kind.cost_type(), global, &country.financials);
        match asset.kind.bucket() {
            CostBucket::Ran => ran += discounted,
            CostBucket::BackhaulFronthaul => backhaul_fronthaul += discounted,
            CostBucket::Civils => civils += discounted,
            CostBucket::CoreNetwork => core_network += discounted,
        }
    }

    region.ran = ran;
    region.backhaul_fronthaul = backhaul_fronthaul;
    region.civils = civils;
    region.core_network = core_network;
    region.network_cost = ran + backhaul_fronthaul + civils + core_network;

    Ok(())
}
