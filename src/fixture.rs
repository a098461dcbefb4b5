//! Common fixtures and input data for tests.
use crate::assets::CoreLut;
use crate::capacity::CapacityLut;
use crate::energy::{EmissionsFactors, EnergyDemand, EnergyParameters, FuelSource};
use crate::model::Model;
use crate::parameters::{
    AssetCosts, CountryParameters, Financials, FrequencyBand, FrequencyPlans, GlobalParameters,
    OperatorCounts, Parameters,
};
use crate::region::{Geotype, Region, RegionID};
use crate::strategy::{Scenario, Sharing, Strategy};
use itertools::iproduct;
use rstest::fixture;
use std::fmt::Write;
use std::fs;
use std::path::Path;

/// The model parameters file matching the programmatic fixtures below
pub const MODEL_TOML: &str = r#"
scenarios = ["baseline_30_20_5"]
strategies = [
    "4G_epc_wireless_baseline_baseline_baseline_baseline_baseline",
    "5G_nsa_wireless_passive_passive_baseline_baseline_baseline",
]

[global]
discount_rate = 5.0
opex_percentage_of_capex = 10.0
return_period = 2
assessment_period = 2
tdd_downlink_percentage = 80.0
confidence_level = 50

[country.networks.baseline]
urban = 2.0
suburban = 2.0
rural = 2.0

[country.networks.passive]
urban = 2.0
suburban = 2.0
rural = 2.0

[country.networks.active]
urban = 2.0
suburban = 2.0
rural = 2.0

[country.networks.srn]
urban = 3.0
suburban = 3.0
rural = 3.0

[country.financials]
wacc = 15.0
profit_margin = 20.0
administration_percentage_of_network_cost = 10.0
spectrum_coverage_usd_mhz_pop = 0.5
spectrum_capacity_usd_mhz_pop = 0.1
spectrum_cost_low = 50.0
spectrum_cost_high = 150.0
tax_baseline = 25.0
tax_low = 10.0
tax_high = 40.0

[[country.frequencies."4G"]]
frequency_mhz = 850
channels = 2
bandwidth_mhz = 10.0

[[country.frequencies."4G"]]
frequency_mhz = 1800
channels = 2
bandwidth_mhz = 10.0

[[country.frequencies."5G"]]
frequency_mhz = 700
channels = 2
bandwidth_mhz = 10.0

[[country.frequencies."5G"]]
frequency_mhz = 3500
channels = 1
bandwidth_mhz = 40.0

[country.costs]
equipment = 40000.0
site_build = 30000.0
installation = 30000.0
operation_and_maintenance = 7400.0
power = 3000.0
site_rental_urban = 10000.0
site_rental_suburban = 5000.0
site_rental_rural = 3000.0
backhaul_wireless_small = 10000.0
backhaul_wireless_medium = 20000.0
backhaul_wireless_large = 40000.0
backhaul_fiber_urban_m = 25.0
backhaul_fiber_suburban_m = 15.0
backhaul_fiber_rural_m = 10.0
core_node = 100000.0
core_edge_m = 20.0
regional_node = 100000.0
regional_edge_m = 10.0

[country.energy.demand]
equipment_kwh = 1.0
wireless_small_kwh = 1.0
wireless_medium_kwh = 1.0
wireless_large_kwh = 1.0
core_node_kwh = 0.0
regional_node_kwh = 0.0

[country.energy.grid_mix]
coal = 50.0
hydro = 50.0

[country.energy.emissions_factors.coal]
carbon_per_kwh = 1.0
nitrogen_oxide_per_kwh = 0.0001
sulphur_dioxide_per_kwh = 0.01
pm10_per_kwh = 0.01

[country.energy.emissions_factors.hydro]
carbon_per_kwh = 0.01
nitrogen_oxide_per_kwh = 0.0000009
sulphur_dioxide_per_kwh = 0.00007
pm10_per_kwh = 0.0

[country.energy.emissions_factors.diesel]
carbon_per_kwh = 0.5
nitrogen_oxide_per_kwh = 0.0001
sulphur_dioxide_per_kwh = 0.00001
pm10_per_kwh = 0.00001

[country.energy.emissions_factors.renewables]
carbon_per_kwh = 0.1
nitrogen_oxide_per_kwh = 0.000001
sulphur_dioxide_per_kwh = 0.000001
pm10_per_kwh = 0.000001
"#;

/// Three regions, one per geotype
pub const REGIONS_CSV: &str = "\
id,geotype,area_km2,population_total,population_with_phones,population_with_smartphones,phones_on_network,smartphones_on_network,total_mno_revenue,demand_mbps_km2,total_estimated_sites,sites_4g,backhaul_fiber,backhaul_wireless,on_grid_percentage
REG.1,urban,10,20000,15000,12000,5000,4000,8000000,250,10,4,2,4,90
REG.2,suburban 1,50,8000,6000,4000,2000,1500,2000000,40,6,2,1,3,70
REG.3,rural 2,200,3000,2000,1000,600,400,350000,2,4,0,0,2,40
";

/// Core network elements for the fixture regions
pub const CORE_LUT_CSV: &str = "\
region_id,asset,build_type,quantity
REG.1,core_node,new,2
REG.1,core_edge,new,1000
REG.1,regional_node,existing,1
REG.1,regional_edge,existing,2000
REG.2,core_node,existing,1
REG.2,regional_edge,new,5000
REG.3,regional_node,new,1
";

/// Build the capacity lookup table CSV.
///
/// Every band shares the same density grid; each band's capacity curve is
/// half of the two-band merged curve, so the merged 4G curve hits 100
/// Mbps/km2 at exactly 0.1 sites/km2.
pub fn capacity_lut_csv() -> String {
    let densities = [0.01, 0.02, 0.05, 0.1, 0.2, 0.4, 1.0, 2.0];
    let capacities = [5.0, 10.0, 25.0, 50.0, 100.0, 150.0, 300.0, 600.0];
    let bands = [("4G", 850), ("4G", 1800), ("5G", 700), ("5G", 3500)];
    let geotypes = ["urban", "suburban", "rural"];

    let mut csv = String::from(
        "geotype,antenna_type,frequency_mhz,generation,confidence_interval,\
        site_density_km2,capacity_mbps_km2\n",
    );
    for ((generation, frequency), geotype, point) in
        iproduct!(bands, geotypes, densities.iter().zip(capacities))
    {
        let (density, capacity) = point;
        writeln!(
            csv,
            "{geotype},macro,{frequency},{generation},50,{density},{capacity}"
        )
        .unwrap();
    }
    csv
}

/// Write a complete, consistent model directory for integration-style tests
pub fn write_model_dir(dir: &Path) {
    fs::write(dir.join("model.toml"), MODEL_TOML).unwrap();
    fs::write(dir.join("capacity_lut.csv"), capacity_lut_csv()).unwrap();
    fs::write(dir.join("core_lut.csv"), CORE_LUT_CSV).unwrap();
    fs::write(dir.join("regions.csv"), REGIONS_CSV).unwrap();
}

/// A region with the given ID and geotype and everything else zeroed
pub fn base_region(id: &str, geotype: Geotype) -> Region {
    Region {
        id: RegionID::new(id),
        geotype,
        area_km2: 1.0,
        population_total: 0.0,
        population_with_phones: 0.0,
        population_with_smartphones: 0.0,
        phones_on_network: 0.0,
        smartphones_on_network: 0.0,
        total_mno_revenue: 0.0,
        demand_mbps_km2: 0.0,
        total_estimated_sites: 0.0,
        sites_4g: 0.0,
        backhaul_fiber: 0.0,
        backhaul_wireless: 0.0,
        on_grid_percentage: 100.0,
        scenario: String::new(),
        strategy: String::new(),
        confidence: 0,
        site_density: 0.0,
        existing_mno_sites: 0.0,
        new_mno_sites: 0.0,
        upgraded_mno_sites: 0.0,
        backhaul_new: 0.0,
        ran: 0.0,
        backhaul_fronthaul: 0.0,
        civils: 0.0,
        core_network: 0.0,
        network_cost: 0.0,
        administration: 0.0,
        spectrum_cost: 0.0,
        tax: 0.0,
        profit_margin: 0.0,
        total_mno_cost: 0.0,
        cost_per_smartphone_user: 0.0,
        available_cross_subsidy: 0.0,
        deficit: 0.0,
        used_cross_subsidy: 0.0,
        required_state_subsidy: 0.0,
        total_phones: 0.0,
        total_smartphones: 0.0,
        total_market_revenue: 0.0,
        total_sites: 0.0,
        total_upgraded_sites: 0.0,
        total_new_sites: 0.0,
        total_ran: 0.0,
        total_backhaul_fronthaul: 0.0,
        total_civils: 0.0,
        total_core_network: 0.0,
        total_network_cost: 0.0,
        total_administration: 0.0,
        total_spectrum_cost: 0.0,
        total_tax: 0.0,
        total_profit_margin: 0.0,
        total_market_cost: 0.0,
        total_available_cross_subsidy: 0.0,
        total_deficit: 0.0,
        total_used_cross_subsidy: 0.0,
        total_required_state_subsidy: 0.0,
    }
}

#[fixture]
pub fn global_parameters() -> GlobalParameters {
    GlobalParameters {
        discount_rate: 5.0,
        opex_percentage_of_capex: 10.0,
        return_period: 2,
        assessment_period: 2,
        tdd_downlink_percentage: 80.0,
        confidence_level: 50,
    }
}

#[fixture]
pub fn frequency_plan_4g() -> Vec<FrequencyBand> {
    vec![
        FrequencyBand {
            frequency_mhz: 850,
            channels: 2,
            bandwidth_mhz: 10.0,
        },
        FrequencyBand {
            frequency_mhz: 1800,
            channels: 2,
            bandwidth_mhz: 10.0,
        },
    ]
}

#[fixture]
pub fn country_parameters() -> CountryParameters {
    let sharings = [
        Sharing::Baseline,
        Sharing::Passive,
        Sharing::Active,
        Sharing::Srn,
    ];
    let geotypes = [Geotype::Urban, Geotype::Suburban, Geotype::Rural];
    let networks = OperatorCounts::new(iproduct!(sharings, geotypes).map(|(sharing, geotype)| {
        let count = if sharing == Sharing::Srn { 3.0 } else { 2.0 };
        ((sharing, geotype), count)
    }));

    CountryParameters {
        networks,
        financials: Financials {
            wacc: 15.0,
            profit_margin: 20.0,
            administration_percentage_of_network_cost: 10.0,
            spectrum_coverage_usd_mhz_pop: 0.5,
            spectrum_capacity_usd_mhz_pop: 0.1,
            spectrum_cost_low: 50.0,
            spectrum_cost_high: 150.0,
            tax_baseline: 25.0,
            tax_low: 10.0,
            tax_high: 40.0,
        },
        frequencies: FrequencyPlans {
            g4: frequency_plan_4g(),
            g5: vec![
                FrequencyBand {
                    frequency_mhz: 700,
                    channels: 2,
                    bandwidth_mhz: 10.0,
                },
                FrequencyBand {
                    frequency_mhz: 3500,
                    channels: 1,
                    bandwidth_mhz: 40.0,
                },
            ],
        },
        costs: AssetCosts {
            equipment: 40_000.0,
            site_build: 30_000.0,
            installation: 30_000.0,
            operation_and_maintenance: 7_400.0,
            power: 3_000.0,
            site_rental_urban: 10_000.0,
            site_rental_suburban: 5_000.0,
            site_rental_rural: 3_000.0,
            backhaul_wireless_small: 10_000.0,
            backhaul_wireless_medium: 20_000.0,
            backhaul_wireless_large: 40_000.0,
            backhaul_fiber_urban_m: 25.0,
            backhaul_fiber_suburban_m: 15.0,
            backhaul_fiber_rural_m: 10.0,
            core_node: 100_000.0,
            core_edge_m: 20.0,
            regional_node: 100_000.0,
            regional_edge_m: 10.0,
        },
        energy: energy_parameters(),
    }
}

/// Unit ratings and a two-fuel grid mix, matching [`MODEL_TOML`]
#[fixture]
pub fn energy_parameters() -> EnergyParameters {
    let factors = |carbon, nox, so2, pm10| EmissionsFactors {
        carbon_per_kwh: carbon,
        nitrogen_oxide_per_kwh: nox,
        sulphur_dioxide_per_kwh: so2,
        pm10_per_kwh: pm10,
    };
    EnergyParameters {
        demand: EnergyDemand {
            equipment_kwh: 1.0,
            wireless_small_kwh: 1.0,
            wireless_medium_kwh: 1.0,
            wireless_large_kwh: 1.0,
            core_node_kwh: 0.0,
            regional_node_kwh: 0.0,
        },
        grid_mix: [(FuelSource::Coal, 50.0), (FuelSource::Hydro, 50.0)]
            .into_iter()
            .collect(),
        emissions_factors: [
            (FuelSource::Coal, factors(1.0, 0.0001, 0.01, 0.01)),
            (FuelSource::Hydro, factors(0.01, 0.000_000_9, 0.000_07, 0.0)),
            (FuelSource::Diesel, factors(0.5, 0.0001, 0.000_01, 0.000_01)),
            (
                FuelSource::Renewables,
                factors(0.1, 0.000_001, 0.000_001, 0.000_001),
            ),
        ]
        .into_iter()
        .collect(),
    }
}

#[fixture]
pub fn parameters() -> Parameters {
    Parameters {
        scenarios: vec![scenario()],
        strategies: vec![
            strategy_4g(),
            "5G_nsa_wireless_passive_passive_baseline_baseline_baseline"
                .parse()
                .unwrap(),
        ],
        global: global_parameters(),
        country: country_parameters(),
    }
}

#[fixture]
pub fn scenario() -> Scenario {
    "baseline_30_20_5".parse().unwrap()
}

#[fixture]
pub fn strategy_4g() -> Strategy {
    "4G_epc_wireless_baseline_baseline_baseline_baseline_baseline"
        .parse()
        .unwrap()
}

#[fixture]
pub fn capacity_lut() -> CapacityLut {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("capacity_lut.csv"), capacity_lut_csv()).unwrap();
    CapacityLut::from_path(dir.path()).unwrap()
}

#[fixture]
pub fn core_lut() -> CoreLut {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("core_lut.csv"), CORE_LUT_CSV).unwrap();
    CoreLut::from_path(dir.path()).unwrap()
}

#[fixture]
pub fn model() -> Model {
    let dir = tempfile::tempdir().unwrap();
    write_model_dir(dir.path());
    Model::from_path(dir.path()).unwrap()
}
