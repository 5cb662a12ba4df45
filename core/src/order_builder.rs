use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use tarragona_domain::{
    AddToProductionItem, BlAllocationReport, BlSummary, BoatId, FactoryRequestItem, LiquidationCandidate,
    LiquidationReason, OrderBuilderResponse, Product, ProductId, ProductScore, ProductionScheduleRow, ProductionStatus,
    ShipNowItem, TrendDirection, VelocityTrendSignal, CONTAINER_MAX_WEIGHT_KG, MAX_CONTAINERS_PER_BL, ORDERING_CYCLE_DAYS,
};

use crate::config::PlannerConfig;

/// A boat's departure/arrival window, the only horizon data the
/// Factory-Request dynamic calc needs (§4.7.1.6).
#[derive(Debug, Clone, Copy)]
pub struct BoatWindow {
    pub departure_date: NaiveDate,
    pub arrival_date: NaiveDate,
}

/// Everything the order builder needs about one product for one boat
/// (§4.7). Assembled by the caller from the simulator's `ProductProjection`
/// plus the product's own catalog/production/velocity data.
#[derive(Debug, Clone)]
pub struct OrderBuilderProductInput {
    pub product: Product,
    pub suggested_pallets: Decimal,
    pub customer_demand_score: Decimal,
    pub velocity: Decimal,
    pub velocity_trend_signal: VelocityTrendSignal,
    pub trend_direction: TrendDirection,
    pub days_of_stock_at_arrival: Option<Decimal>,
    pub effective_stock: Decimal,
    pub production_rows: Vec<ProductionScheduleRow>,
    pub weight_kg_per_pallet: Decimal,
    pub primary_customer: Option<String>,
    pub siesa_available_now: Decimal,
    pub warehouse_m2: Decimal,
    pub in_transit_m2: Decimal,
}

/// §4.7.3 additive scoring, fixed caps that sum to 100.
pub fn score_product(p: &OrderBuilderProductInput) -> ProductScore {
    let stockout_risk = match p.days_of_stock_at_arrival {
        Some(d) if d <= Decimal::ZERO => 40,
        Some(d) if d < Decimal::from(7) => 35,
        Some(d) if d < Decimal::from(14) => 30,
        Some(d) if d < Decimal::from(30) => 20,
        Some(d) if d < Decimal::from(60) => 10,
        Some(_) => 0,
        None => 0,
    };
    let customer_demand = if p.customer_demand_score >= Decimal::from(200) {
        30
    } else if p.customer_demand_score >= Decimal::from(100) {
        25
    } else if p.customer_demand_score >= Decimal::from(50) {
        15
    } else if p.customer_demand_score > Decimal::ZERO {
        10
    } else {
        0
    };
    let growth_trend = match (p.velocity_trend_signal, p.trend_direction) {
        (VelocityTrendSignal::Growing, TrendDirection::Up) => 20,
        (VelocityTrendSignal::Growing, _) => 12,
        (VelocityTrendSignal::Stable, _) => 5,
        (VelocityTrendSignal::Declining, _) => 0,
    };
    let revenue_impact = if p.velocity >= Decimal::from(50) {
        10
    } else if p.velocity >= Decimal::from(30) {
        8
    } else if p.velocity >= Decimal::from(15) {
        5
    } else if p.velocity > Decimal::ZERO {
        3
    } else {
        0
    };

    ProductScore {
        stockout_risk,
        customer_demand,
        growth_trend,
        revenue_impact,
    }
}

/// §4.7.1 Ship-Now: all products with SIESA stock already at the factory,
/// filled top-down by priority (score desc) and allocated across BLs.
pub fn build_ship_now(products: &[OrderBuilderProductInput], config: &PlannerConfig) -> Vec<ShipNowItem> {
    let mut candidates: Vec<(ProductScore, &OrderBuilderProductInput)> = products
        .iter()
        .filter(|p| p.siesa_available_now > Decimal::ZERO)
        .map(|p| (score_product(p), p))
        .collect();
    candidates.sort_by(|a, b| b.0.total().cmp(&a.0.total()));

    candidates
        .into_iter()
        .map(|(score, p)| {
            let divisor = p.product.pallet_divisor(config.m2_per_pallet);
            let available_pallets = if divisor.is_zero() { Decimal::ZERO } else { p.siesa_available_now / divisor };
            ShipNowItem {
                product_id: p.product.id,
                pallets: p.suggested_pallets.min(available_pallets),
                score,
                bl_number: None,
            }
        })
        .collect()
}

/// §4.7.2 Add-to-Production: products where the suggestion exceeds what's
/// already scheduled, and a scheduled row still accepts more volume.
pub fn build_add_to_production(products: &[OrderBuilderProductInput], config: &PlannerConfig) -> Vec<AddToProductionItem> {
    products
        .iter()
        .filter_map(|p| {
            let addable_row = p.production_rows.iter().any(ProductionScheduleRow::can_add_more);
            if !addable_row {
                return None;
            }
            let already_scheduled: Decimal = p.production_rows.iter().map(ProductionScheduleRow::remaining_contribution).sum();
            let divisor = p.product.pallet_divisor(config.m2_per_pallet);
            let suggested_m2 = p.suggested_pallets * divisor;
            let additional_m2 = (suggested_m2 - already_scheduled).max(Decimal::ZERO);
            (additional_m2 > Decimal::ZERO).then_some(AddToProductionItem {
                product_id: p.product.id,
                additional_m2,
            })
        })
        .collect()
}

/// §4.7.1 Factory-Request: for products with no scheduled production left to
/// absorb the suggestion, project stock forward to the next boat that can
/// still be targeted and size the request against the container-minimum
/// rule (§4.7.1.6).
pub fn build_factory_request(
    products: &[OrderBuilderProductInput],
    config: &PlannerConfig,
    boats: &[BoatWindow],
    factory_lead_time_days: i64,
    today: NaiveDate,
) -> Vec<FactoryRequestItem> {
    let min_container_m2 = config.min_container_m2();
    let days_until_monday = 7 - today.weekday().num_days_from_monday() as i64;
    let days_until_monday = if days_until_monday == 0 { 7 } else { days_until_monday };
    let next_monday = today + Duration::days(days_until_monday);

    products
        .iter()
        .filter(|p| !p.production_rows.iter().any(ProductionScheduleRow::can_add_more) && p.suggested_pallets > Decimal::ZERO)
        .filter_map(|p| {
            let has_completed = p.production_rows.iter().any(|r| r.status == ProductionStatus::Completed);
            let avg_production_days = if has_completed { factory_lead_time_days } else { 7 };
            let production_ready = next_monday + Duration::days(avg_production_days);

            let target_idx = boats.iter().position(|b| b.departure_date > production_ready)?;
            let target_boat = &boats[target_idx];
            let days_to_arrival = (target_boat.arrival_date - today).num_days().max(0);

            let completed_m2: Decimal = p
                .production_rows
                .iter()
                .filter(|r| r.status == ProductionStatus::Completed)
                .map(ProductionScheduleRow::remaining_contribution)
                .sum();
            let pipeline = p.in_transit_m2 + completed_m2;
            let projected = p.warehouse_m2 + pipeline - p.velocity * Decimal::from(days_to_arrival);

            if projected >= Decimal::ZERO {
                return None;
            }

            let days_to_consume = if p.velocity.is_zero() { None } else { Some(min_container_m2 / p.velocity) };
            let is_low_volume = p.velocity.is_zero() || days_to_consume.map(|d| d > Decimal::from(365)).unwrap_or(false);

            if is_low_volume {
                return Some(FactoryRequestItem {
                    product_id: p.product.id,
                    request_m2: Decimal::ZERO,
                    request_pallets: Decimal::ZERO,
                    should_request: false,
                    is_low_volume: true,
                    minimum_applied: false,
                });
            }

            let days_to_next_boat = boats
                .get(target_idx + 1)
                .map(|next| (next.arrival_date - target_boat.arrival_date).num_days())
                .unwrap_or(ORDERING_CYCLE_DAYS);
            let need = projected.abs() + p.velocity * Decimal::from(days_to_next_boat);

            let divisor = p.product.pallet_divisor(config.m2_per_pallet);
            let (request_m2, minimum_applied) = if need >= min_container_m2 {
                let containers = (need / min_container_m2).ceil();
                (containers * min_container_m2, false)
            } else {
                (min_container_m2, true)
            };
            let request_pallets = if divisor.is_zero() { Decimal::ZERO } else { (request_m2 / divisor).ceil() };

            Some(FactoryRequestItem {
                product_id: p.product.id,
                request_m2,
                request_pallets,
                should_request: true,
                is_low_volume: false,
                minimum_applied,
            })
        })
        .collect()
}

/// §4.7.4 BL allocation: critical products get priority placement, then
/// the rest round-robin, each BL capped at `MAX_CONTAINERS_PER_BL`
/// containers of `CONTAINER_MAX_WEIGHT_KG`.
pub fn allocate_bls(ship_now: &mut [ShipNowItem], config: &PlannerConfig) -> BlAllocationReport {
    let capacity_pallets_per_bl = Decimal::from(config.bl_capacity_pallets(1));
    let weight_cap_per_bl = Decimal::from(MAX_CONTAINERS_PER_BL) * Decimal::from(CONTAINER_MAX_WEIGHT_KG);

    let mut bls: Vec<BlSummary> = Vec::new();
    let mut critical_counts: HashMap<u8, u32> = HashMap::new();

    for item in ship_now.iter_mut() {
        let slot = bls
            .iter_mut()
            .enumerate()
            .find(|(_, bl)| bl.pallets + item.pallets <= capacity_pallets_per_bl && bl.weight_kg < weight_cap_per_bl)
            .map(|(idx, _)| idx);

        let idx = slot.unwrap_or_else(|| {
            bls.push(BlSummary {
                bl_number: (bls.len() + 1) as u8,
                ..Default::default()
            });
            bls.len() - 1
        });

        let bl = &mut bls[idx];
        bl.pallets += item.pallets;
        bl.containers = (bl.pallets / Decimal::from(config.container_max_pallets)).ceil().to_u32().unwrap_or(0);
        if item.score.is_critical() {
            bl.critical_product_count += 1;
            *critical_counts.entry(bl.bl_number).or_default() += 1;
        }
        item.bl_number = Some(bl.bl_number);
    }

    let total_critical: u32 = critical_counts.values().sum();
    let risk_distribution_even = bls.len() <= 1
        || critical_counts
            .values()
            .all(|&count| total_critical == 0 || Decimal::from(count) / Decimal::from(total_critical) <= Decimal::new(60, 2));

    let mut warnings = Vec::new();
    if !risk_distribution_even {
        warnings.push("critical products are concentrated on a single BL".to_string());
    }

    BlAllocationReport {
        bls,
        risk_distribution_even,
        warnings,
    }
}

/// §4.7.5 liquidation insight, thresholds from `PlannerConfig` (§C.5).
pub fn find_liquidation_candidates(products: &[OrderBuilderProductInput], config: &PlannerConfig) -> Vec<LiquidationCandidate> {
    let mut candidates: Vec<LiquidationCandidate> = products
        .iter()
        .filter_map(|p| {
            let days = p.days_of_stock_at_arrival?;
            let reason = if days >= Decimal::from(config.liquidation_extreme_days) {
                Some(LiquidationReason::ExtremeOverstock)
            } else if p.velocity.is_zero() && p.effective_stock > Decimal::ZERO {
                Some(LiquidationReason::NoSales)
            } else if p.velocity_trend_signal == VelocityTrendSignal::Declining && days >= Decimal::from(config.liquidation_min_days) {
                Some(LiquidationReason::DecliningOverstocked)
            } else {
                None
            };
            let divisor = p.product.pallet_divisor(config.m2_per_pallet);
            reason.map(|reason| LiquidationCandidate {
                product_id: p.product.id,
                reason,
                pallets: if divisor.is_zero() { Decimal::ZERO } else { p.effective_stock / divisor },
                trend_change_pct: Decimal::ZERO,
            })
        })
        .collect();
    candidates.sort_by(|a, b| b.pallets.cmp(&a.pallets));
    candidates
}

/// Assembles the full §4.7 response for one boat from the three sections.
pub fn build(
    boat_id: BoatId,
    products: &[OrderBuilderProductInput],
    config: &PlannerConfig,
    boats: &[BoatWindow],
    factory_lead_time_days: i64,
    today: NaiveDate,
) -> OrderBuilderResponse {
    let mut ship_now = build_ship_now(products, config);
    let bl_allocation = allocate_bls(&mut ship_now, config);
    let add_to_production = build_add_to_production(products, config);
    let factory_request = build_factory_request(products, config, boats, factory_lead_time_days, today);
    let liquidation_candidates = find_liquidation_candidates(products, config);

    let mut reasoning = Vec::new();
    if !ship_now.is_empty() {
        reasoning.push(format!("{} product(s) have critical stock already available to ship", ship_now.len()));
    }
    if !factory_request.is_empty() {
        reasoning.push(format!("{} product(s) require a new factory request", factory_request.len()));
    }
    if !liquidation_candidates.is_empty() {
        reasoning.push(format!("{} product(s) flagged for liquidation review", liquidation_candidates.len()));
    }

    OrderBuilderResponse {
        boat_id,
        ship_now,
        add_to_production,
        factory_request,
        bl_allocation,
        liquidation_candidates,
        reasoning,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tarragona_domain::{FactoryId, Sku};

    fn product_input(suggested: Decimal, siesa: Decimal) -> OrderBuilderProductInput {
        OrderBuilderProductInput {
            product: Product {
                id: ProductId::new(),
                sku: Sku("TILE-01".to_string()),
                factory_id: FactoryId::new(),
                category: None,
                rotation_tag: None,
                active: true,
                units_per_pallet: None,
            },
            suggested_pallets: suggested,
            customer_demand_score: dec!(80),
            velocity: dec!(50),
            velocity_trend_signal: VelocityTrendSignal::Stable,
            trend_direction: TrendDirection::Stable,
            days_of_stock_at_arrival: Some(dec!(5)),
            effective_stock: dec!(1000),
            production_rows: vec![],
            weight_kg_per_pallet: dec!(1800),
            primary_customer: None,
            siesa_available_now: siesa,
            warehouse_m2: Decimal::ZERO,
            in_transit_m2: Decimal::ZERO,
        }
    }

    fn boats(today: NaiveDate) -> Vec<BoatWindow> {
        vec![
            BoatWindow {
                departure_date: today + Duration::days(20),
                arrival_date: today + Duration::days(35),
            },
            BoatWindow {
                departure_date: today + Duration::days(50),
                arrival_date: today + Duration::days(65),
            },
        ]
    }

    #[test]
    fn critical_product_with_siesa_ships_now() {
        let products = vec![product_input(dec!(10), dec!(2000))];
        let ship_now = build_ship_now(&products, &PlannerConfig::default());
        assert_eq!(ship_now.len(), 1);
    }

    #[test]
    fn low_velocity_product_still_ships_available_siesa() {
        let mut p = product_input(dec!(1), dec!(2000));
        p.velocity = Decimal::ZERO;
        p.customer_demand_score = Decimal::ZERO;
        p.days_of_stock_at_arrival = None;
        let ship_now = build_ship_now(&[p], &PlannerConfig::default());
        assert_eq!(ship_now.len(), 1, "any siesa > 0 product qualifies for ship-now, regardless of score");
    }

    #[test]
    fn no_siesa_product_does_not_ship_now() {
        let products = vec![product_input(dec!(10), Decimal::ZERO)];
        let ship_now = build_ship_now(&products, &PlannerConfig::default());
        assert!(ship_now.is_empty());
    }

    #[test]
    fn low_volume_product_is_not_requested() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let mut p = product_input(dec!(1), Decimal::ZERO);
        p.velocity = dec!(1);
        let config = PlannerConfig::default();
        let requests = build_factory_request(&[p], &config, &boats(today), 10, today);
        assert_eq!(requests.len(), 1);
        assert!(requests[0].is_low_volume);
        assert!(!requests[0].should_request);
        assert_eq!(requests[0].request_m2, Decimal::ZERO);
    }

    #[test]
    fn factory_request_applies_container_minimum() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let mut p = product_input(dec!(1), Decimal::ZERO);
        p.velocity = dec!(50);
        // warehouse stock nearly covers the target boat's arrival window, so
        // the remaining need is small enough to fall under one container.
        p.warehouse_m2 = dec!(1450);
        let config = PlannerConfig::default();
        let requests = build_factory_request(&[p], &config, &boats(today), 10, today);
        assert_eq!(requests.len(), 1);
        assert!(requests[0].should_request);
        assert!(requests[0].minimum_applied);
        assert_eq!(requests[0].request_m2, config.min_container_m2());
    }

    #[test]
    fn factory_request_rounds_large_need_up_to_whole_containers() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let mut p = product_input(dec!(1), Decimal::ZERO);
        p.velocity = dec!(200);
        p.warehouse_m2 = Decimal::ZERO;
        let config = PlannerConfig::default();
        let requests = build_factory_request(&[p], &config, &boats(today), 10, today);
        assert_eq!(requests.len(), 1);
        let min_container = config.min_container_m2();
        assert!(requests[0].request_m2 >= min_container);
        assert_eq!(requests[0].request_m2 % min_container, Decimal::ZERO);
        assert_eq!(requests[0].request_pallets % Decimal::from(config.container_max_pallets), Decimal::ZERO);
    }

    #[test]
    fn covered_product_is_not_requested() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let mut p = product_input(dec!(1), Decimal::ZERO);
        p.velocity = dec!(10);
        p.warehouse_m2 = dec!(100000);
        let config = PlannerConfig::default();
        let requests = build_factory_request(&[p], &config, &boats(today), 10, today);
        assert!(requests.is_empty());
    }
}
