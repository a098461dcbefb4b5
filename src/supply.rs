//! Supply estimation: sizing the network a single operator must build.
//!
//! Turns a resolved site density into counts of greenfield sites, brownfield
//! upgrades and backhaul links, given the infrastructure already standing in
//! the region and the operator count under the strategy's sharing policy.
use crate::capacity::CapacityLut;
use crate::parameters::{CountryParameters, GlobalParameters};
use crate::region::Region;
use crate::strategy::{Backhaul, Generation, Scenario, Sharing, Strategy};
use anyhow::Result;

/// Estimate the sites and backhaul links the modelled operator must build.
///
/// Stamps the region with the scenario, strategy and confidence level, then
/// fills in `site_density`, the site counts and `backhaul_new`. A scenario
/// speed target of zero for this geotype short-circuits to no build at all.
pub fn estimate_supply(
    region: &mut Region,
    scenario: &Scenario,
    strategy: &Strategy,
    global: &GlobalParameters,
    country: &CountryParameters,
    capacity_lut: &CapacityLut,
) -> Result<()> {
    region.scenario = scenario.to_string();
    region.strategy = strategy.to_string();
    region.confidence = global.confidence_level;

    region.site_density = if scenario.target(region.geotype) == 0 {
        0.0
    } else {
        capacity_lut.site_density(
            region.demand_mbps_km2,
            region.geotype,
            strategy.generation,
            country.frequencies.plan(strategy.generation),
            global.confidence_level,
            global.tdd_downlink_percentage,
        )?
    };

    if region.site_density > 0.0 {
        let required_sites = (region.site_density * region.area_km2).ceil();
        estimate_site_upgrades(region, strategy, required_sites, country)?;
        estimate_backhaul_upgrades(region, strategy, country)?;
    } else {
        let networks = country.networks.get(Sharing::Baseline, region.geotype)?;
        region.existing_mno_sites = region.total_estimated_sites / networks;
        region.new_mno_sites = 0.0;
        region.upgraded_mno_sites = 0.0;
        region.backhaul_new = 0.0;
    }

    Ok(())
}

/// Split the required site count into greenfield builds and upgrades.
///
/// Existing sites are attributed fractionally to the operator by dividing by
/// the operator count for the sharing policy. Sites already on 4G cannot be
/// "upgraded" under a 4G strategy and are subtracted from the upgrade count.
fn estimate_site_upgrades(
    region: &mut Region,
    strategy: &Strategy,
    required_sites: f64,
    country: &CountryParameters,
) -> Result<()> {
    let networks = country.networks.get(strategy.sharing, region.geotype)?;

    region.existing_mno_sites = region.total_estimated_sites / networks;
    let existing_4g_sites = (region.sites_4g / networks).ceil();
    let subtract_4g = strategy.generation == Generation::G4 && existing_4g_sites > 0.0;

    if required_sites > region.existing_mno_sites {
        region.new_mno_sites = (required_sites - region.existing_mno_sites).round();
        region.upgraded_mno_sites = if region.existing_mno_sites > 0.0 {
            if subtract_4g {
                (region.existing_mno_sites - existing_4g_sites).max(0.0)
            } else {
                region.existing_mno_sites
            }
        } else {
            0.0
        };
    } else {
        region.new_mno_sites = 0.0;
        region.upgraded_mno_sites = if subtract_4g {
            (required_sites - existing_4g_sites).max(0.0)
        } else {
            required_sites
        };
    }

    Ok(())
}

/// Count the backhaul links that must be built or replaced.
///
/// Existing links are attributed to the operator using the baseline operator
/// count. Wireless strategies can reuse existing fibre links; fibre
/// strategies only count existing fibre.
fn estimate_backhaul_upgrades(
    region: &mut Region,
    strategy: &Strategy,
    country: &CountryParameters,
) -> Result<()> {
    let networks = country.networks.get(Sharing::Baseline, region.geotype)?;
    let all_mno_sites = region.new_mno_sites + region.upgraded_mno_sites;

    let existing_backhaul = match strategy.backhaul {
        Backhaul::Fiber => region.backhaul_fiber / networks,
        Backhaul::Wireless => (region.backhaul_wireless + region.backhaul_fiber) / networks,
    };

    region.backhaul_new = (all_mno_sites - existing_backhaul).ceil().max(0.0);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{
        base_region, capacity_lut, country_parameters, global_parameters, scenario, strategy_4g,
    };
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    fn test_site_upgrades_greenfield_split(
        country_parameters: CountryParameters,
        strategy_4g: Strategy,
    ) {
        // 100 sites across 2 operators, none on 4G: 50 existing, 50 new
        let mut region = base_region("REG.1", crate::region::Geotype::Urban);
        region.total_estimated_sites = 100.0;
        region.sites_4g = 0.0;

        estimate_site_upgrades(&mut region, &strategy_4g, 100.0, &country_parameters).unwrap();
        assert_approx_eq!(f64, region.existing_mno_sites, 50.0);
        assert_approx_eq!(f64, region.new_mno_sites, 50.0);
        assert_approx_eq!(f64, region.upgraded_mno_sites, 50.0);
    }

    #[rstest]
    fn test_site_upgrades_subtracts_existing_4g(
        country_parameters: CountryParameters,
        strategy_4g: Strategy,
    ) {
        // 50 of the 100 sites are already 4G, so only 25 of this operator's
        // 50 need upgrading
        let mut region = base_region("REG.1", crate::region::Geotype::Urban);
        region.total_estimated_sites = 100.0;
        region.sites_4g = 50.0;

        estimate_site_upgrades(&mut region, &strategy_4g, 100.0, &country_parameters).unwrap();
        assert_approx_eq!(f64, region.new_mno_sites, 50.0);
        assert_approx_eq!(f64, region.upgraded_mno_sites, 25.0);
    }

    #[rstest]
    fn test_site_upgrades_brownfield_only(
        country_parameters: CountryParameters,
        strategy_4g: Strategy,
    ) {
        // Fewer sites required than exist: no greenfield builds
        let mut region = base_region("REG.1", crate::region::Geotype::Urban);
        region.total_estimated_sites = 100.0;
        region.sites_4g = 50.0;

        estimate_site_upgrades(&mut region, &strategy_4g, 30.0, &country_parameters).unwrap();
        assert_approx_eq!(f64, region.new_mno_sites, 0.0);
        assert_approx_eq!(f64, region.upgraded_mno_sites, 5.0);
    }

    #[rstest]
    fn test_site_upgrades_clamped_at_zero(
        country_parameters: CountryParameters,
        strategy_4g: Strategy,
    ) {
        // More 4G sites than required: nothing to upgrade, never negative
        let mut region = base_region("REG.1", crate::region::Geotype::Urban);
        region.total_estimated_sites = 100.0;
        region.sites_4g = 100.0;

        estimate_site_upgrades(&mut region, &strategy_4g, 30.0, &country_parameters).unwrap();
        assert_approx_eq!(f64, region.new_mno_sites, 0.0);
        assert_approx_eq!(f64, region.upgraded_mno_sites, 0.0);
    }

    #[rstest]
    fn test_site_upgrades_round_half_up(
        country_parameters: CountryParameters,
        strategy_4g: Strategy,
    ) {
        // 95 sites across 2 operators leaves 47.5; a 2.5-site shortfall
        // against the 50 required rounds half away from zero to 3 builds
        let mut region = base_region("REG.1", crate::region::Geotype::Urban);
        region.total_estimated_sites = 95.0;
        region.sites_4g = 0.0;

        estimate_site_upgrades(&mut region, &strategy_4g, 50.0, &country_parameters).unwrap();
        assert_approx_eq!(f64, region.new_mno_sites, 3.0);
        assert_approx_eq!(f64, region.upgraded_mno_sites, 47.5);
    }

    #[rstest]
    fn test_backhaul_upgrades_fiber(
        country_parameters: CountryParameters,
        mut strategy_4g: Strategy,
    ) {
        strategy_4g.backhaul = Backhaul::Fiber;
        let mut region = base_region("REG.1", crate::region::Geotype::Urban);
        region.new_mno_sites = 10.0;
        region.upgraded_mno_sites = 10.0;
        region.backhaul_fiber = 10.0;
        region.backhaul_wireless = 50.0;

        estimate_backhaul_upgrades(&mut region, &strategy_4g, &country_parameters).unwrap();
        // Only the operator's 5 fibre links count against the 20 sites
        assert_approx_eq!(f64, region.backhaul_new, 15.0);
    }

    #[rstest]
    fn test_backhaul_upgrades_wireless_reuses_fiber(
        country_parameters: CountryParameters,
        strategy_4g: Strategy,
    ) {
        let mut region = base_region("REG.1", crate::region::Geotype::Urban);
        region.new_mno_sites = 10.0;
        region.upgraded_mno_sites = 10.0;
        region.backhaul_fiber = 10.0;
        region.backhaul_wireless = 20.0;

        estimate_backhaul_upgrades(&mut region, &strategy_4g, &country_parameters).unwrap();
        assert_approx_eq!(f64, region.backhaul_new, 5.0);
    }

    #[rstest]
    #[case(Backhaul::Wireless, 0.0, 100.0)]
    #[case(Backhaul::Fiber, 100.0, 0.0)]
    fn test_backhaul_upgrades_surplus_is_zero(
        country_parameters: CountryParameters,
        mut strategy_4g: Strategy,
        #[case] backhaul: Backhaul,
        #[case] fiber: f64,
        #[case] wireless: f64,
    ) {
        // More existing links than sites being built: nothing new, never
        // negative
        strategy_4g.backhaul = backhaul;
        let mut region = base_region("REG.1", crate::region::Geotype::Urban);
        region.new_mno_sites = 1.0;
        region.upgraded_mno_sites = 1.0;
        region.backhaul_fiber = fiber;
        region.backhaul_wireless = wireless;

        estimate_backhaul_upgrades(&mut region, &strategy_4g, &country_parameters).unwrap();
        assert_approx_eq!(f64, region.backhaul_new, 0.0);
    }

    #[rstest]
    fn test_estimate_supply(
        capacity_lut: CapacityLut,
        global_parameters: GlobalParameters,
        country_parameters: CountryParameters,
        scenario: Scenario,
        strategy_4g: Strategy,
    ) {
        let mut region = base_region("REG.1", crate::region::Geotype::Urban);
        region.area_km2 = 10.0;
        region.demand_mbps_km2 = 250.0;
        region.total_estimated_sites = 2.0;

        estimate_supply(
            &mut region,
            &scenario,
            &strategy_4g,
            &global_parameters,
            &country_parameters,
            &capacity_lut,
        )
        .unwrap();

        // Density 0.3 over 10 km2 requires 3 sites; 1 exists per operator
        assert_approx_eq!(f64, region.site_density, 0.3);
        assert_approx_eq!(f64, region.existing_mno_sites, 1.0);
        assert_approx_eq!(f64, region.new_mno_sites, 2.0);
        assert_approx_eq!(f64, region.upgraded_mno_sites, 1.0);
        assert_approx_eq!(f64, region.backhaul_new, 3.0);
        assert_eq!(region.strategy, strategy_4g.to_string());
        assert_eq!(region.confidence, 50);
    }

    #[rstest]
    fn test_estimate_supply_zero_target(
        capacity_lut: CapacityLut,
        global_parameters: GlobalParameters,
        country_parameters: CountryParameters,
        mut scenario: Scenario,
        strategy_4g: Strategy,
    ) {
        scenario.urban_mbps = 0;
        let mut region = base_region("REG.1", crate::region::Geotype::Urban);
        region.area_km2 = 10.0;
        region.demand_mbps_km2 = 250.0;
        region.total_estimated_sites = 2.0;

        estimate_supply(
            &mut region,
            &scenario,
            &strategy_4g,
            &global_parameters,
            &country_parameters,
            &capacity_lut,
        )
        .unwrap();

        assert_eq!(region.site_density, 0.0);
        assert_eq!(region.new_mno_sites, 0.0);
        assert_eq!(region.upgraded_mno_sites, 0.0);
        assert_eq!(region.backhaul_new, 0.0);
        assert_approx_eq!(f64, region.existing_mno_sites, 1.0);
    }
}
