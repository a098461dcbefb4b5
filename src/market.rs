//! Market scaling: expanding single-operator metrics to the whole market.
//!
//! The pipeline models one representative operator. Total-market figures are
//! obtained by converting each metric to a per-user value over the
//! operator's phone users and multiplying back up by the phone-owning
//! population of the region.
use crate::region::Region;

/// Scale every per-operator metric on the region to its total-market value.
///
/// Each scaled value is `metric / phones_on_network × population_with_phones`,
/// rounded to a whole unit, and zero whenever the metric or the operator's
/// user base is zero.
pub fn scale_to_market(region: &mut Region) {
    let phones_on_network = region.phones_on_network;
    let population_with_phones = region.population_with_phones;
    let scale = |metric: f64| {
        if metric == 0.0 || phones_on_network == 0.0 {
            0.0
        } else {
            (metric / phones_on_network * population_with_phones).round()
        }
    };

    region.total_phones = scale(region.phones_on_network);
    region.total_smartphones = scale(region.smartphones_on_network);
    region.total_market_revenue = scale(region.total_mno_revenue);

    region.total_sites = scale(region.existing_mno_sites);
    region.total_upgraded_sites = scale(region.upgraded_mno_sites);
    region.total_new_sites = scale(region.new_mno_sites);

    region.total_ran = scale(region.ran);
    region.total_backhaul_fronthaul = scale(region.backhaul_fronthaul);
    region.total_civils = scale(region.civils);
    region.total_core_network = scale(region.core_network);
    region.total_network_cost = scale(region.network_cost);
    region.total_administration = scale(region.administration);
    region.total_spectrum_cost = scale(region.spectrum_cost);
    region.total_tax = scale(region.tax);
    region.total_profit_margin = scale(region.profit_margin);
    region.total_market_cost = scale(region.total_mno_cost);

    region.total_available_cross_subsidy = scale(region.available_cross_subsidy);
    region.total_deficit = scale(region.deficit);
    region.total_used_cross_subsidy = scale(region.used_cross_subsidy);
    region.total_required_state_subsidy = scale(region.required_state_subsidy);
}
