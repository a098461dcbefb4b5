//! Economic assessment: administration, spectrum, tax, profit and subsidies.
//!
//! Runs over the full set of regions for one strategy. The cross-subsidy
//! waterfall is inherently sequential: surplus regions seed a shared pool
//! which deficit regions drain smallest-deficit-first, so the region list is
//! sorted before the pool is folded through it.
use crate::costs::present_value;
use crate::parameters::{CountryParameters, Financials, GlobalParameters};
use crate::region::Region;
use crate::strategy::{RateLevel, Strategy};

/// Assess the economics of every region under one strategy.
///
/// Adds administration, spectrum, tax and profit on top of each region's
/// network cost, splits the result into surplus or deficit against revenue,
/// then runs the cross-subsidy waterfall and computes each region's residual
/// state subsidy. Returns the regions sorted ascending by deficit, the order
/// in which the subsidy pool was consumed.
pub fn assess(
    mut regions: Vec<Region>,
    strategy: &Strategy,
    global: &GlobalParameters,
    country: &CountryParameters,
) -> Vec<Region> {
    let financials = &country.financials;
    let mut available_for_cross_subsidy = 0.0;

    for region in &mut regions {
        region.administration = administration_cost(region.network_cost, global, financials);
        region.spectrum_cost = spectrum_cost(region, strategy, country);
        region.tax = tax(region.network_cost, strategy, financials);
        region.profit_margin = profit(region, financials);
        region.total_mno_cost = region.network_cost
            + region.administration
            + region.spectrum_cost
            + region.tax
            + region.profit_margin;
        region.cost_per_smartphone_user = if region.smartphones_on_network > 0.0 {
            region.total_mno_cost / region.smartphones_on_network
        } else {
            0.0
        };

        allocate_available_excess(region);
        available_for_cross_subsidy += region.available_cross_subsidy;
    }

    // Smallest deficits first, to fully subsidise as many regions as possible
    regions.sort_by(|a, b| a.deficit.total_cmp(&b.deficit));

    let (assessed, _remaining) = regions.into_iter().fold(
        (Vec::new(), available_for_cross_subsidy),
        |(mut assessed, pool), mut region| {
            let remaining = estimate_subsidies(&mut region, pool);
            assessed.push(region);
            (assessed, remaining)
        },
    );

    assessed
}

/// Administration cost: an annual share of network cost, discounted over the
/// assessment period
fn administration_cost(
    network_cost: f64,
    global: &GlobalParameters,
    financials: &Financials,
) -> f64 {
    let annual_cost =
        network_cost * financials.administration_percentage_of_network_cost / 100.0;
    present_value(annual_cost, global.discount_rate, global.assessment_period)
}

/// Spectrum licence cost across the strategy's frequency plan.
///
/// Sub-1GHz coverage bands and higher capacity bands are priced per MHz per
/// head of population, scaled by the strategy's spectrum pricing level.
fn spectrum_cost(region: &Region, strategy: &Strategy, country: &CountryParameters) -> f64 {
    let financials = &country.financials;
    let population = region.population_total.round();

    let adjustment = match strategy.spectrum {
        RateLevel::Baseline => 1.0,
        RateLevel::Low => financials.spectrum_cost_low / 100.0,
        RateLevel::High => financials.spectrum_cost_high / 100.0,
    };
    let coverage_rate = financials.spectrum_coverage_usd_mhz_pop * adjustment;
    let capacity_rate = financials.spectrum_capacity_usd_mhz_pop * adjustment;

    country
        .frequencies
        .plan(strategy.generation)
        .iter()
        .map(|band| {
            let rate = if band.frequency_mhz < 1000 {
                coverage_rate
            } else {
                capacity_rate
            };
            rate * band.total_bandwidth_mhz() * population
        })
        .sum()
}

/// Tax on the network investment, at the rate the strategy selects
fn tax(network_cost: f64, strategy: &Strategy, financials: &Financials) -> f64 {
    let tax_rate = match strategy.tax {
        RateLevel::Baseline => financials.tax_baseline,
        RateLevel::Low => financials.tax_low,
        RateLevel::High => financials.tax_high,
    };
    network_cost * tax_rate / 100.0
}

/// Operator profit margin, marked up on all costs including tax
fn profit(region: &Region, financials: &Financials) -> f64 {
    let investment =
        region.network_cost + region.administration + region.spectrum_cost + region.tax;
    investment * financials.profit_margin / 100.0
}

/// Split revenue against cost into a surplus available for cross-subsidy or
/// a deficit to be filled
fn allocate_available_excess(region: &mut Region) {
    let difference = region.total_mno_revenue - region.total_mno_cost;
    if difference > 0.0 {
        region.available_cross_subsidy = difference;
        region.deficit = 0.0;
    } else {
        region.available_cross_subsidy = 0.0;
        region.deficit = difference.abs();
    }
}

/// Drain the subsidy pool against this region's deficit, then compute the
/// residual state subsidy. Returns what is left of the pool.
fn estimate_subsidies(region: &mut Region, available_for_cross_subsidy: f64) -> f64 {
    region.used_cross_subsidy = if region.deficit > 0.0 {
        available_for_cross_subsidy.min(region.deficit)
    } else {
        0.0
    };
    let remaining = available_for_cross_subsidy - region.used_cross_subsidy;

    let required = region.total_mno_cost
        - (region.total_mno_revenue + region.used_cross_subsidy);
    region.required_state_subsidy = required.max(0.0);

    remaining
}
