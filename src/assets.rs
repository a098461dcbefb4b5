//! Asset construction: expanding site and backhaul counts into priced assets.
//!
//! Every site the operator builds, upgrades or keeps running is expanded
//! into a set of priced asset records. Backhaul is priced per link for
//! wireless (in capacity tiers chosen by traffic per site) and per metre for
//! fibre. Core and regional network elements come from an external lookup
//! table and are scaled to the operator's share.
use crate::input::{input_err_msg, read_csv};
use crate::parameters::CountryParameters;
use crate::region::{Geotype, Region, RegionID};
use crate::strategy::{Backhaul, Sharing, Strategy};
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};
use std::collections::HashMap;
use std::path::Path;

const CORE_LUT_FILE_NAME: &str = "core_lut.csv";

/// Traffic per site below which a small wireless link suffices (Mbps)
const WIRELESS_SMALL_MBPS: f64 = 15_000.0;
/// Traffic per site below which a medium wireless link suffices (Mbps)
const WIRELESS_MEDIUM_MBPS: f64 = 25_000.0;
/// Capacity of one large wireless link (Mbps)
const WIRELESS_LARGE_MBPS: f64 = 45_000.0;

/// Every kind of asset the model can price
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
pub enum AssetKind {
    #[string = "equipment"]
    Equipment,
    #[string = "site_build"]
    SiteBuild,
    #[string = "installation"]
    Installation,
    #[string = "operation_and_maintenance"]
    OperationAndMaintenance,
    #[string = "power"]
    Power,
    #[string = "site_rental_urban"]
    SiteRentalUrban,
    #[string = "site_rental_suburban"]
    SiteRentalSuburban,
    #[string = "site_rental_rural"]
    SiteRentalRural,
    #[string = "backhaul_wireless_small"]
    BackhaulWirelessSmall,
    #[string = "backhaul_wireless_medium"]
    BackhaulWirelessMedium,
    #[string = "backhaul_wireless_large"]
    BackhaulWirelessLarge,
    #[string = "backhaul_fiber_urban_m"]
    BackhaulFiberUrban,
    #[string = "backhaul_fiber_suburban_m"]
    BackhaulFiberSuburban,
    #[string = "backhaul_fiber_rural_m"]
    BackhaulFiberRural,
    #[string = "core_node"]
    CoreNode,
    #[string = "core_edge"]
    CoreEdge,
    #[string = "regional_node"]
    RegionalNode,
    #[string = "regional_edge"]
    RegionalEdge,
}

/// The core and regional network asset kinds
pub const CORE_ASSET_KINDS: [AssetKind; 4] = [
    AssetKind::CoreNode,
    AssetKind::CoreEdge,
    AssetKind::RegionalNode,
    AssetKind::RegionalEdge,
];

impl AssetKind {
    /// The site rental asset for a geotype
    pub fn site_rental(geotype: Geotype) -> Self {
        match geotype {
            Geotype::Urban => Self::SiteRentalUrban,
            Geotype::Suburban => Self::SiteRentalSuburban,
            Geotype::Rural => Self::SiteRentalRural,
        }
    }

    /// The per-metre fibre backhaul asset for a geotype
    pub fn backhaul_fiber(geotype: Geotype) -> Self {
        match geotype {
            Geotype::Urban => Self::BackhaulFiberUrban,
            Geotype::Suburban => Self::BackhaulFiberSuburban,
            Geotype::Rural => Self::BackhaulFiberRural,
        }
    }

    /// Whether this asset is a backhaul link
    pub fn is_backhaul(&self) -> bool {
        matches!(
            self,
            Self::BackhaulWirelessSmall
                | Self::BackhaulWirelessMedium
                | Self::BackhaulWirelessLarge
                | Self::BackhaulFiberUrban
                | Self::BackhaulFiberSuburban
                | Self::BackhaulFiberRural
        )
    }

    /// Whether this asset is a core or regional network element
    pub fn is_core(&self) -> bool {
        CORE_ASSET_KINDS.contains(self)
    }
}

/// Whether an asset is built new, upgraded in place or already standing
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
pub enum BuildType {
    /// Greenfield build
    #[string = "new"]
    New,
    /// Brownfield upgrade of an existing site
    #[string = "upgraded"]
    Upgraded,
    /// Already standing, only running costs apply
    #[string = "existing"]
    Existing,
}

/// Who bears an asset's cost under the strategy's sharing policy
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, SerializeLabeledStringEnum, DeserializeLabeledStringEnum,
)]
pub enum Ownership {
    /// Charged to the modelled operator in full
    #[string = "mno"]
    Mno,
    /// Split between the operators party to the sharing agreement
    #[string = "shared"]
    Shared,
}

/// One priced asset, consumed immediately by cost aggregation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Asset {
    /// What the asset is
    pub kind: AssetKind,
    /// How it enters the network
    pub build_type: BuildType,
    /// Who bears its cost
    pub ownership: Ownership,
    /// Number of units (sites, nodes, or metres for core edges)
    pub quantity: f64,
    /// Unit cost (USD)
    pub cost_per_unit: f64,
    /// Links per site for wireless backhaul, metres for fibre, 1 otherwise
    pub backhaul_units: f64,
    /// Undiscounted total cost before sharing (USD)
    pub total_cost: f64,
}

impl Asset {
    fn new(
        kind: AssetKind,
        build_type: BuildType,
        ownership: Ownership,
        quantity: f64,
        cost_per_unit: f64,
        backhaul_units: f64,
    ) -> Self {
        Self {
            kind,
            build_type,
            ownership,
            quantity,
            cost_per_unit,
            backhaul_units,
            total_cost: quantity * cost_per_unit * backhaul_units,
        }
    }
}

/// A row of the core network lookup table CSV file
#[derive(Debug, Clone, Deserialize)]
struct CoreRecord {
    region_id: RegionID,
    asset: AssetKind,
    build_type: BuildType,
    quantity: f64,
}

/// Existing and planned core network elements per region.
///
/// Produced upstream by the fibre routing model. Regions or combinations
/// absent from the table simply have no such elements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CoreLut(HashMap<(RegionID, AssetKind, BuildType), f64>);

impl CoreLut {
    /// Read the core network lookup table from the CSV file in `model_dir`
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<Self> {
        let file_path = model_dir.as_ref().join(CORE_LUT_FILE_NAME);
        let records = read_csv::<CoreRecord>(&file_path)?;
        Self::from_records(records).with_context(|| input_err_msg(&file_path))
    }

    fn from_records<I: IntoIterator<Item = CoreRecord>>(records: I) -> Result<Self> {
        let mut quantities = HashMap::new();
        for record in records {
            ensure!(
                record.asset.is_core(),
                "Asset {} in the core lookup table is not a core network element",
                record.asset
            );
            ensure!(
                record.quantity >= 0.0,
                "Negative quantity for {} ({}) in region {}",
                record.asset,
                record.build_type,
                record.region_id
            );
            quantities.insert((record.region_id, record.asset, record.build_type), record.quantity);
        }
        Ok(Self(quantities))
    }

    /// The quantity of one core element in a region, zero if absent
    pub fn get(&self, region_id: &RegionID, kind: AssetKind, build_type: BuildType) -> f64 {
        self.0
            .get(&(region_id.clone(), kind, build_type))
            .copied()
            .unwrap_or(0.0)
    }
}

/// Average distance in metres from a site to its nearest backhaul node.
///
/// Nodes are assumed at every other existing site, spread evenly over the
/// region, so the mean hop is half the side of the square each node serves.
pub fn get_backhaul_dist(region: &Region) -> f64 {
    let nodes = (region.existing_mno_sites / 2.0).ceil();
    let node_density = if nodes > 0.0 {
        nodes / region.area_km2
    } else {
        1.0 / region.area_km2
    };
    ((1.0 / node_density).sqrt() / 2.0 * 1000.0).round()
}

/// Mean traffic each site must carry (Mbps), zero when there are no sites
fn traffic_per_site(region: &Region) -> f64 {
    let all_sites = region.new_mno_sites + region.upgraded_mno_sites + region.existing_mno_sites;
    if all_sites > 0.0 {
        region.demand_mbps_km2 * region.area_km2 / all_sites
    } else {
        0.0
    }
}

/// Choose the backhaul asset and its per-site units for this region.
///
/// Wireless links come in capacity tiers, with very high loads carried by
/// multiple large links. Fibre is priced per metre of trench to the nearest
/// node.
fn backhaul_asset(region: &Region, strategy: &Strategy) -> (AssetKind, f64) {
    match strategy.backhaul {
        Backhaul::Wireless => {
            let traffic = traffic_per_site(region);
            if traffic < WIRELESS_SMALL_MBPS {
                (AssetKind::BackhaulWirelessSmall, 1.0)
            } else if traffic < WIRELESS_MEDIUM_MBPS {
                (AssetKind::BackhaulWirelessMedium, 1.0)
            } else {
                let links = (traffic / WIRELESS_LARGE_MBPS).ceil();
                (AssetKind::BackhaulWirelessLarge, links)
            }
        }
        Backhaul::Fiber => (
            AssetKind::backhaul_fiber(region.geotype),
            get_backhaul_dist(region),
        ),
    }
}

/// The asset kinds attached to each site of one build type
fn site_asset_kinds(build_type: BuildType, geotype: Geotype) -> Vec<AssetKind> {
    let rental = AssetKind::site_rental(geotype);
    match build_type {
        BuildType::New => vec![
            AssetKind::Equipment,
            AssetKind::SiteBuild,
            AssetKind::Installation,
            rental,
            AssetKind::OperationAndMaintenance,
            AssetKind::Power,
        ],
        BuildType::Upgraded => vec![
            AssetKind::Equipment,
            AssetKind::Installation,
            rental,
            AssetKind::OperationAndMaintenance,
            AssetKind::Power,
        ],
        BuildType::Existing => vec![rental, AssetKind::OperationAndMaintenance],
    }
}

/// Expand a region's site and backhaul counts into priced asset records
pub fn estimate_assets(
    region: &Region,
    strategy: &Strategy,
    country: &CountryParameters,
    core_lut: &CoreLut,
) -> Result<Vec<Asset>> {
    let mut assets = Vec::new();

    let ownership = |kind: AssetKind| {
        if strategy.sharing.covers(kind) && strategy.sharing.applies_to(region.geotype) {
            Ownership::Shared
        } else {
            Ownership::Mno
        }
    };

    let (backhaul_kind, backhaul_units) = backhaul_asset(region, strategy);

    let site_groups = [
        (BuildType::New, region.new_mno_sites),
        (BuildType::Upgraded, region.upgraded_mno_sites),
        (BuildType::Existing, region.existing_mno_sites),
    ];
    for (build_type, sites) in site_groups {
        if sites <= 0.0 {
            continue;
        }
        for kind in site_asset_kinds(build_type, region.geotype) {
            assets.push(Asset::new(
                kind,
                build_type,
                ownership(kind),
                sites,
                country.costs.unit_cost(kind),
                1.0,
            ));
        }
        // New and upgraded sites each need a backhaul link
        if build_type != BuildType::Existing {
            assets.push(Asset::new(
                backhaul_kind,
                build_type,
                ownership(backhaul_kind),
                sites,
                country.costs.unit_cost(backhaul_kind),
                backhaul_units,
            ));
        }
    }

    // Core and regional elements, scaled to this operator's share
    let networks = country.networks.get(Sharing::Baseline, region.geotype)?;
    for kind in CORE_ASSET_KINDS {
        for build_type in [BuildType::New, BuildType::Existing] {
            let quantity = core_lut.get(&region.id, kind, build_type) / networks;
            if quantity > 0.0 {
                assets.push(Asset::new(
                    kind,
                    build_type,
                    ownership(kind),
                    quantity,
                    country.costs.unit_cost(kind),
                    1.0,
                ));
            }
        }
    }

    Ok(assets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{base_region, core_lut, country_parameters, strategy_4g};
    use float_cmp::assert_approx_eq;
    use itertools::Itertools;
    use rstest::rstest;

    fn kinds_for(assets: &[Asset], build_type: BuildType) -> Vec<AssetKind> {
        assets
            .iter()
            .filter(|asset| asset.build_type == build_type)
            .map(|asset| asset.kind)
            .collect_vec()
    }

    #[rstest]
    #[case(15.0, 2.0, 250.0)]
    #[case(0.0, 2.0, 707.0)]
    #[case(5.0, 2.0, 408.0)]
    fn test_get_backhaul_dist(#[case] existing: f64, #[case] area: f64, #[case] expected: f64) {
        let mut region = base_region("REG.1", Geotype::Urban);
        region.existing_mno_sites = existing;
        region.area_km2 = area;
        assert_approx_eq!(f64, get_backhaul_dist(&region), expected);
    }

    #[rstest]
    #[case(10_000.0, AssetKind::BackhaulWirelessSmall, 1.0)]
    #[case(20_000.0, AssetKind::BackhaulWirelessMedium, 1.0)]
    #[case(35_000.0, AssetKind::BackhaulWirelessLarge, 1.0)]
    #[case(90_000.0, AssetKind::BackhaulWirelessLarge, 2.0)]
    fn test_backhaul_asset_wireless_tiers(
        strategy_4g: Strategy,
        #[case] traffic: f64,
        #[case] expected_kind: AssetKind,
        #[case] expected_links: f64,
    ) {
        // One site carrying all the region's traffic
        let mut region = base_region("REG.1", Geotype::Urban);
        region.area_km2 = 1.0;
        region.demand_mbps_km2 = traffic;
        region.new_mno_sites = 1.0;

        let (kind, links) = backhaul_asset(&region, &strategy_4g);
        assert_eq!(kind, expected_kind);
        assert_approx_eq!(f64, links, expected_links);
    }

    #[rstest]
    fn test_backhaul_asset_fiber(mut strategy_4g: Strategy) {
        strategy_4g.backhaul = Backhaul::Fiber;
        let mut region = base_region("REG.1", Geotype::Rural);
        region.area_km2 = 2.0;
        region.existing_mno_sites = 15.0;

        let (kind, units) = backhaul_asset(&region, &strategy_4g);
        assert_eq!(kind, AssetKind::BackhaulFiberRural);
        assert_approx_eq!(f64, units, 250.0);
    }

    #[rstest]
    fn test_estimate_assets_site_sets(
        country_parameters: CountryParameters,
        strategy_4g: Strategy,
    ) {
        let mut region = base_region("REG.1", Geotype::Urban);
        region.area_km2 = 10.0;
        region.new_mno_sites = 2.0;
        region.upgraded_mno_sites = 1.0;
        region.existing_mno_sites = 1.0;

        let assets =
            estimate_assets(&region, &strategy_4g, &country_parameters, &CoreLut::default())
                .unwrap();

        let new_kinds = kinds_for(&assets, BuildType::New);
        assert!(new_kinds.contains(&AssetKind::SiteBuild));
        assert!(new_kinds.contains(&AssetKind::BackhaulWirelessSmall));
        assert_eq!(new_kinds.len(), 7);

        // Upgrades reuse the tower, so no site build
        let upgraded_kinds = kinds_for(&assets, BuildType::Upgraded);
        assert!(!upgraded_kinds.contains(&AssetKind::SiteBuild));
        assert_eq!(upgraded_kinds.len(), 6);

        // Standing sites only pay rental and running costs
        let existing_kinds = kinds_for(&assets, BuildType::Existing);
        assert_eq!(
            existing_kinds,
            vec![AssetKind::SiteRentalUrban, AssetKind::OperationAndMaintenance]
        );
    }

    #[rstest]
    fn test_estimate_assets_total_cost(
        country_parameters: CountryParameters,
        strategy_4g: Strategy,
    ) {
        let mut region = base_region("REG.1", Geotype::Urban);
        region.new_mno_sites = 2.0;

        let assets =
            estimate_assets(&region, &strategy_4g, &country_parameters, &CoreLut::default())
                .unwrap();
        let equipment = assets
            .iter()
            .find(|asset| asset.kind == AssetKind::Equipment)
            .unwrap();
        assert_approx_eq!(
            f64,
            equipment.total_cost,
            2.0 * country_parameters.costs.equipment
        );
    }

    #[rstest]
    fn test_estimate_assets_ownership(
        country_parameters: CountryParameters,
        mut strategy_4g: Strategy,
    ) {
        strategy_4g.sharing = Sharing::Passive;
        let mut region = base_region("REG.1", Geotype::Urban);
        region.new_mno_sites = 1.0;

        let assets =
            estimate_assets(&region, &strategy_4g, &country_parameters, &CoreLut::default())
                .unwrap();
        let by_kind = |kind| {
            assets
                .iter()
                .find(|asset| asset.kind == kind)
                .unwrap()
                .ownership
        };
        assert_eq!(by_kind(AssetKind::SiteBuild), Ownership::Shared);
        assert_eq!(by_kind(AssetKind::Equipment), Ownership::Mno);
    }

    #[rstest]
    fn test_estimate_assets_srn_excludes_urban(
        country_parameters: CountryParameters,
        mut strategy_4g: Strategy,
    ) {
        strategy_4g.sharing = Sharing::Srn;
        let mut urban = base_region("REG.1", Geotype::Urban);
        urban.new_mno_sites = 1.0;
        let mut rural = base_region("REG.2", Geotype::Rural);
        rural.new_mno_sites = 1.0;

        let urban_assets =
            estimate_assets(&urban, &strategy_4g, &country_parameters, &CoreLut::default())
                .unwrap();
        let rural_assets =
            estimate_assets(&rural, &strategy_4g, &country_parameters, &CoreLut::default())
                .unwrap();
        assert!(urban_assets.iter().all(|asset| asset.ownership == Ownership::Mno));
        assert!(
            rural_assets
                .iter()
                .any(|asset| asset.kind == AssetKind::Equipment
                    && asset.ownership == Ownership::Shared)
        );
    }

    #[rstest]
    fn test_estimate_assets_core_share(
        core_lut: CoreLut,
        country_parameters: CountryParameters,
        strategy_4g: Strategy,
    ) {
        let region = base_region("REG.1", Geotype::Urban);
        let assets =
            estimate_assets(&region, &strategy_4g, &country_parameters, &core_lut).unwrap();

        // The fixture has 2 new core nodes in REG.1, split across 2 operators
        let core_node = assets
            .iter()
            .find(|asset| asset.kind == AssetKind::CoreNode && asset.build_type == BuildType::New)
            .unwrap();
        assert_approx_eq!(f64, core_node.quantity, 1.0);
        assert_eq!(core_node.ownership, Ownership::Mno);
    }

    #[test]
    fn test_core_lut_rejects_non_core_asset() {
        let records = vec![CoreRecord {
            region_id: "REG.1".into(),
            asset: AssetKind::Equipment,
            build_type: BuildType::New,
            quantity: 1.0,
        }];
        assert!(CoreLut::from_records(records).is_err());
    }

    #[test]
    fn test_core_lut_defaults_to_zero() {
        let lut = CoreLut::default();
        assert_eq!(
            lut.get(&"REG.9".into(), AssetKind::CoreNode, BuildType::New),
            0.0
        );
    }
}
