use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use tarragona_domain::{
    Boat, BoatId, BoatProjection, ConfidenceBand, Draft, DraftStatus, EarlierDraftContext, Factory, Product,
    ProductId, ProductProjection, ProductionScheduleRow, StabilityImpact, SupplyBreakdown, UrgencyBreakdown,
    UrgencyTier, ORDERING_CYCLE_DAYS, WAREHOUSE_BUFFER_DAYS,
};

use crate::config::PlannerConfig;
use crate::milestones;

/// A committed-draft arrival inbound to this factory's warehouse from a
/// boat that does not originate here (§4.4.3.C). Resolved by the caller
/// from cross-factory draft state before the simulator runs.
#[derive(Debug, Clone)]
pub struct TransitEntry {
    pub arrival_date: NaiveDate,
    pub pallets_m2: Decimal,
}

/// Everything the simulator needs per product, pre-resolved by the caller
/// from the store (§4.4.1–§4.4.2): starting inventory, the production
/// pipeline, inbound transit, and the C2 velocity signal.
#[derive(Debug, Clone)]
pub struct ProductContext {
    pub product: Product,
    pub warehouse_m2: Decimal,
    pub siesa_available_m2: Decimal,
    pub production_rows: Vec<ProductionScheduleRow>,
    pub transit_entries: Vec<TransitEntry>,
    pub velocity: Decimal,
    pub customer_demand_score: Decimal,
}

struct ProductState {
    stock: Decimal,
    siesa_consumed: bool,
    production_rows: Vec<ProductionScheduleRow>,
    transit_entries: Vec<TransitEntry>,
}

/// §4.4 Supply Cascade Simulator. Walks the merged boat sequence for one
/// factory in departure order, carrying running per-product stock forward
/// boat-to-boat (§4.4.1 "the cascade"). Every contribution source (SIESA,
/// production row, transit entry) is consumed at most once, at the first
/// boat it can physically reach (§4.4.3.A-C).
pub fn simulate(
    factory: &Factory,
    boats: &[Boat],
    products: &[ProductContext],
    drafts_by_boat: &HashMap<BoatId, Draft>,
    config: &PlannerConfig,
    today: NaiveDate,
    months: u32,
) -> PlanningHorizonResult {
    let mut state: HashMap<ProductId, ProductState> = products
        .iter()
        .map(|p| {
            (
                p.product.id,
                ProductState {
                    stock: p.warehouse_m2,
                    siesa_consumed: false,
                    production_rows: p.production_rows.clone(),
                    transit_entries: p.transit_entries.clone(),
                },
            )
        })
        .collect();

    let has_scheduled_production = products
        .iter()
        .any(|p| p.production_rows.iter().any(ProductionScheduleRow::can_add_more));

    let mut boat_projections = Vec::with_capacity(boats.len());
    let mut earlier_drafts: Vec<(BoatId, Decimal)> = Vec::new();

    for boat in boats {
        let draft = drafts_by_boat.get(&boat.id);
        let days_out = (boat.departure_date - today).num_days();
        let days_until_warehouse = ((boat.arrival_date - today).num_days() + WAREHOUSE_BUFFER_DAYS).max(1);
        let confidence = ConfidenceBand::for_days_out(days_out);

        let mut product_projections = Vec::with_capacity(products.len());
        let mut urgency_breakdown = UrgencyBreakdown::default();
        let mut before_ok_count = 0u32;
        let mut after_ok_count = 0u32;

        for ctx in products {
            let product_state = state
                .get_mut(&ctx.product.id)
                .expect("every product has a pre-seeded state entry");

            let stock_before = product_state.stock;

            let siesa_contrib = contribute_siesa(factory, boat, today, product_state, ctx.siesa_available_m2);
            let production_contrib = contribute_production(factory, boat, product_state);
            let transit_contrib = contribute_transit(boat, product_state);

            let supply_breakdown = SupplyBreakdown {
                warehouse_m2: stock_before,
                factory_siesa_m2: siesa_contrib,
                production_pipeline_m2: production_contrib,
                in_transit_m2: transit_contrib,
            };
            let effective_stock = supply_breakdown.effective();
            let projected_stock_at_arrival = effective_stock - ctx.velocity * Decimal::from(days_until_warehouse);
            let days_of_stock_at_arrival = if ctx.velocity.is_zero() {
                None
            } else {
                Some(projected_stock_at_arrival / ctx.velocity)
            };
            let urgency = UrgencyTier::classify(days_of_stock_at_arrival);
            urgency_breakdown.record(urgency);

            let (suggested_pallets, is_committed) =
                resolve_demand(draft, ctx, config, projected_stock_at_arrival, days_until_warehouse);

            let divisor = ctx.product.pallet_divisor(config.m2_per_pallet);
            product_state.stock = if suggested_pallets > Decimal::ZERO {
                projected_stock_at_arrival + suggested_pallets * divisor
            } else {
                projected_stock_at_arrival
            };

            let before_ok = days_of_stock_at_arrival.map(|d| d >= Decimal::from(30)).unwrap_or(true);
            let after_days = if ctx.velocity.is_zero() {
                None
            } else {
                Some(product_state.stock / ctx.velocity)
            };
            let after_ok = after_days.map(|d| d >= Decimal::from(30)).unwrap_or(true);
            if before_ok {
                before_ok_count += 1;
            }
            if after_ok {
                after_ok_count += 1;
            }

            let has_later_supply = !product_state.production_rows.is_empty()
                || !product_state.transit_entries.is_empty()
                || (factory.has_siesa_step() && !product_state.siesa_consumed);

            let stability_impact = Some(if before_ok {
                StabilityImpact::Unaffected
            } else if after_ok {
                StabilityImpact::Stabilized
            } else if has_later_supply {
                StabilityImpact::Recovering
            } else {
                StabilityImpact::Blocked
            });

            product_projections.push(ProductProjection {
                product_id: ctx.product.id,
                supply_breakdown,
                effective_stock,
                projected_stock_at_arrival,
                days_of_stock_at_arrival,
                urgency,
                suggested_pallets,
                is_committed,
                customer_demand_score: ctx.customer_demand_score,
                velocity: ctx.velocity,
                stability_impact,
            });
        }

        let total_suggested: Decimal = product_projections.iter().map(|p| p.suggested_pallets).sum();
        let score = Decimal::from(confidence.score);
        let projected_pallets_min = total_suggested * score / Decimal::from(100);
        let projected_pallets_max = total_suggested * (Decimal::from(200) - score) / Decimal::from(100);

        let is_draft_locked = draft.map(|d| d.status.is_committed()).unwrap_or(false);
        let needs_review = draft.map(|d| d.status == DraftStatus::ActionNeeded).unwrap_or(false);
        let review_reason = needs_review.then(|| "draft requires action before confirmation".to_string());

        let has_earlier_drafts = !earlier_drafts.is_empty();
        let earlier_draft_context = has_earlier_drafts.then(|| EarlierDraftContext {
            boat_ids: earlier_drafts.iter().map(|(id, _)| *id).collect(),
            total_pallets: earlier_drafts.iter().map(|(_, pallets)| *pallets).sum(),
            description: format!(
                "{} pallets already committed across {} earlier boat(s)",
                earlier_drafts.iter().map(|(_, pallets)| *pallets).sum::<Decimal>(),
                earlier_drafts.len()
            ),
        });

        if let Some(d) = draft {
            if d.status.is_committed() {
                let total_committed: Decimal = d.items.iter().map(|i| i.selected_pallets).sum();
                if total_committed > Decimal::ZERO {
                    earlier_drafts.push((boat.id, total_committed));
                }
            }
        }

        let is_active = draft.map(|d| d.status != DraftStatus::Cancelled).unwrap_or(false)
            || product_projections.iter().any(|p| p.suggested_pallets > Decimal::ZERO);

        let product_count = Decimal::from(product_projections.len().max(1));
        let stability_progress_before_pct = Decimal::from(before_ok_count) * Decimal::from(100) / product_count;
        let stability_progress_after_pct = Decimal::from(after_ok_count) * Decimal::from(100) / product_count;

        let mut projection = BoatProjection {
            boat_id: boat.id,
            vessel_name: boat.vessel_name.clone(),
            departure_date: boat.departure_date,
            arrival_date: boat.arrival_date,
            is_estimated: boat.is_estimated(),
            products: product_projections,
            urgency_breakdown,
            projected_pallets_min,
            projected_pallets_max,
            confidence,
            draft_id: draft.map(|d| d.id),
            draft_status: draft.map(|d| d.status),
            is_active,
            is_draft_locked,
            has_earlier_drafts,
            earlier_draft_context,
            needs_review,
            review_reason,
            milestones: milestones::build(factory, boat.departure_date, boat.arrival_date, has_scheduled_production, today),
            stability_progress_before_pct,
            stability_progress_after_pct,
        };
        projection.sort_products();
        boat_projections.push(projection);
    }

    PlanningHorizonResult {
        factory_id: factory.id,
        months,
        boats: boat_projections,
    }
}

/// Step A: factory-SIESA finished goods, contributed once at the first
/// boat it can physically reach the port in time for (§4.4.3.A). A boat
/// we're already past the simulation's `today` for is always reachable;
/// the only gate is whether stock can clear `transport_to_port_days`
/// before departure.
fn contribute_siesa(
    factory: &Factory,
    boat: &Boat,
    today: NaiveDate,
    state: &mut ProductState,
    siesa_available_m2: Decimal,
) -> Decimal {
    if !factory.has_siesa_step() || state.siesa_consumed {
        return Decimal::ZERO;
    }
    let siesa_ready_at_port = today + Duration::days(factory.transport_to_port_days);
    if boat.departure_date >= siesa_ready_at_port {
        state.siesa_consumed = true;
        siesa_available_m2
    } else {
        Decimal::ZERO
    }
}

/// Step B: each production-schedule row contributes once, at the first
/// boat whose departure it can reach after transport to port (§4.4.3.B).
fn contribute_production(factory: &Factory, boat: &Boat, state: &mut ProductState) -> Decimal {
    let mut contribution = Decimal::ZERO;
    let mut still_pending = Vec::with_capacity(state.production_rows.len());
    for row in state.production_rows.drain(..) {
        if row.ready_at_port(factory.transport_to_port_days) <= boat.departure_date {
            contribution += row.remaining_contribution();
        } else {
            still_pending.push(row);
        }
    }
    state.production_rows = still_pending;
    contribution
}

/// Step C: committed-draft arrivals from other factories, available once
/// they clear the warehouse buffer (§4.4.3.C).
fn contribute_transit(boat: &Boat, state: &mut ProductState) -> Decimal {
    let mut contribution = Decimal::ZERO;
    let mut still_pending = Vec::with_capacity(state.transit_entries.len());
    for entry in state.transit_entries.drain(..) {
        if entry.arrival_date + Duration::days(WAREHOUSE_BUFFER_DAYS) <= boat.departure_date {
            contribution += entry.pallets_m2;
        } else {
            still_pending.push(entry);
        }
    }
    state.transit_entries = still_pending;
    contribution
}

/// Step E: an existing committed draft item is authoritative; a tentative
/// one is honored as-is; otherwise the coverage-gap formula decides
/// (§4.4.3.E, §4.4.3 ordering-cycle coverage target).
fn resolve_demand(
    draft: Option<&Draft>,
    ctx: &ProductContext,
    config: &PlannerConfig,
    projected_stock_at_arrival: Decimal,
    days_until_warehouse: i64,
) -> (Decimal, bool) {
    if let Some(d) = draft {
        if let Some(item) = d.item_for(ctx.product.id) {
            if d.status.is_committed() {
                return (item.selected_pallets, true);
            }
            if item.selected_pallets > Decimal::ZERO {
                return (item.selected_pallets, false);
            }
        }
    }

    let coverage_target_days = Decimal::from(ORDERING_CYCLE_DAYS + days_until_warehouse);
    let gap = (ctx.velocity * coverage_target_days - projected_stock_at_arrival).max(Decimal::ZERO);
    let divisor = ctx.product.pallet_divisor(config.m2_per_pallet);
    let suggested = if divisor.is_zero() { Decimal::ZERO } else { (gap / divisor).ceil() };
    (suggested, false)
}

pub use tarragona_domain::PlanningHorizon as PlanningHorizonResult;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tarragona_domain::{BoatStatus, FactoryId, ProductId, Sku, UnitType};

    fn factory() -> Factory {
        Factory {
            id: FactoryId::new(),
            name: "Test Factory".to_string(),
            origin_port: "Shanghai".to_string(),
            production_lead_days: 5,
            transport_to_port_days: 2,
            cutoff_day: chrono::Weekday::Wed,
            unit_type: UnitType::M2,
            active: true,
            sort_order: 0,
        }
    }

    fn product(factory_id: FactoryId) -> Product {
        Product {
            id: ProductId::new(),
            sku: Sku("TILE-01".to_string()),
            factory_id,
            category: None,
            rotation_tag: None,
            active: true,
            units_per_pallet: None,
        }
    }

    fn boat(departure: NaiveDate, arrival: NaiveDate) -> Boat {
        Boat {
            id: BoatId::new(),
            vessel_name: "MV Test".to_string(),
            origin_port: "Shanghai".to_string(),
            destination_port: "Puerto Quetzal".to_string(),
            departure_date: departure,
            arrival_date: arrival,
            status: BoatStatus::Booked,
            shipping_line: None,
        }
    }

    #[test]
    fn no_velocity_yields_ok_urgency_and_no_suggestion() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let f = factory();
        let p = product(f.id);
        let b = boat(today + Duration::days(30), today + Duration::days(65));
        let ctx = ProductContext {
            product: p.clone(),
            warehouse_m2: dec!(5000),
            siesa_available_m2: Decimal::ZERO,
            production_rows: vec![],
            transit_entries: vec![],
            velocity: Decimal::ZERO,
            customer_demand_score: Decimal::ZERO,
        };
        let result = simulate(&f, &[b], &[ctx], &HashMap::new(), &PlannerConfig::default(), today, 3);
        let boat_projection = &result.boats[0];
        assert_eq!(boat_projection.products[0].urgency, UrgencyTier::Ok);
        assert_eq!(boat_projection.products[0].suggested_pallets, Decimal::ZERO);
    }

    #[test]
    fn committed_draft_is_authoritative_over_coverage_gap() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let f = factory();
        let p = product(f.id);
        let b = boat(today + Duration::days(30), today + Duration::days(65));
        let ctx = ProductContext {
            product: p.clone(),
            warehouse_m2: Decimal::ZERO,
            siesa_available_m2: Decimal::ZERO,
            production_rows: vec![],
            transit_entries: vec![],
            velocity: dec!(100),
            customer_demand_score: Decimal::ZERO,
        };
        let draft = Draft {
            id: tarragona_domain::DraftId::new(),
            boat_id: b.id,
            factory_id: f.id,
            status: DraftStatus::Ordered,
            bl_number: Some(1),
            items: vec![tarragona_domain::DraftItem {
                product_id: p.id,
                selected_pallets: dec!(10),
            }],
        };
        let mut drafts = HashMap::new();
        drafts.insert(b.id, draft);
        let result = simulate(&f, &[b], &[ctx], &drafts, &PlannerConfig::default(), today, 3);
        let product_projection = &result.boats[0].products[0];
        assert_eq!(product_projection.suggested_pallets, dec!(10));
        assert!(product_projection.is_committed);
    }

    #[test]
    fn fresh_siesa_covers_single_boat_gap_leaving_ok_urgency() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let f = factory();
        let p = product(f.id);
        let b = boat(
            NaiveDate::from_ymd_opt(2026, 3, 20).unwrap(),
            NaiveDate::from_ymd_opt(2026, 4, 5).unwrap(),
        );
        let ctx = ProductContext {
            product: p,
            warehouse_m2: dec!(500),
            siesa_available_m2: dec!(3000),
            production_rows: vec![],
            transit_entries: vec![],
            velocity: dec!(10),
            customer_demand_score: Decimal::ZERO,
        };
        let result = simulate(&f, &[b], &[ctx], &HashMap::new(), &PlannerConfig::default(), today, 3);
        let product_projection = &result.boats[0].products[0];
        assert_eq!(product_projection.effective_stock, dec!(3500));
        assert_eq!(product_projection.projected_stock_at_arrival, dec!(3120));
        assert_eq!(product_projection.urgency, UrgencyTier::Ok);
        assert_eq!(product_projection.suggested_pallets, Decimal::ZERO);
        assert!(product_projection.supply_breakdown.factory_siesa_m2 > Decimal::ZERO);
    }

    #[test]
    fn siesa_consumed_on_first_boat_leaves_second_boat_critical() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let f = factory();
        let p = product(f.id);
        let b1 = boat(
            NaiveDate::from_ymd_opt(2026, 3, 20).unwrap(),
            NaiveDate::from_ymd_opt(2026, 4, 5).unwrap(),
        );
        let b2 = boat(
            NaiveDate::from_ymd_opt(2026, 4, 20).unwrap(),
            NaiveDate::from_ymd_opt(2026, 5, 10).unwrap(),
        );
        let ctx = ProductContext {
            product: p,
            warehouse_m2: dec!(100),
            siesa_available_m2: dec!(1000),
            production_rows: vec![],
            transit_entries: vec![],
            velocity: dec!(10),
            customer_demand_score: Decimal::ZERO,
        };
        let result = simulate(&f, &[b1, b2], &[ctx], &HashMap::new(), &PlannerConfig::default(), today, 3);

        let first = &result.boats[0].products[0];
        assert_eq!(first.projected_stock_at_arrival, dec!(720));
        assert_eq!(first.suggested_pallets, Decimal::ZERO);

        let second = &result.boats[1].products[0];
        assert_eq!(second.supply_breakdown.factory_siesa_m2, Decimal::ZERO);
        assert_eq!(second.projected_stock_at_arrival, dec!(-10));
        assert_eq!(second.urgency, UrgencyTier::Critical);
        assert_eq!(second.suggested_pallets, dec!(8));
    }
}
