use chrono::{Duration, NaiveDate};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use tarragona_domain::{
    Boat, Factory, FactoryOrderSignal, FactoryOrderSignalReport, ProductFactoryOrderGap, ProductId, ProductionStatus,
    ProductionScheduleRow, ORDERING_CYCLE_DAYS, MIN_PRODUCTION_GAP_M2,
};

/// Per-product inputs the signal engine needs for one factory (§4.6).
#[derive(Debug, Clone)]
pub struct FactoryProductInput {
    pub product_id: ProductId,
    pub effective_siesa: Decimal,
    pub velocity: Decimal,
    pub production_rows: Vec<ProductionScheduleRow>,
}

/// §4.6 Factory-Order Signal. One report per factory, summarizing whether
/// and when to place the next production request, and against which boat.
pub fn analyze(factory: &Factory, today: NaiveDate, boats: &[Boat], products: &[FactoryProductInput]) -> FactoryOrderSignalReport {
    let lead_time = factory.lead_time_days();
    let target_boat = boats.iter().find(|b| b.departure_date > today + Duration::days(lead_time));

    let mut participating = Vec::new();
    for p in products {
        let in_production: Decimal = p.production_rows.iter().map(ProductionScheduleRow::remaining_contribution).sum();
        let covered = p.effective_siesa + in_production;

        let coverage_days = if p.velocity.is_zero() { None } else { Some(covered / p.velocity) };
        let runs_out = coverage_days.and_then(|d| d.to_i64()).map(|days| today + Duration::days(days));
        let order_by = runs_out.map(|d| d - Duration::days(lead_time));

        let target_m2 = p.velocity * Decimal::from(ORDERING_CYCLE_DAYS + lead_time);
        let gap_m2 = (target_m2 - covered).max(Decimal::ZERO);

        participating.push((
            p,
            ProductFactoryOrderGap {
                product_id: p.product_id,
                effective_siesa: p.effective_siesa,
                coverage_days,
                runs_out,
                order_by,
                gap_m2,
            },
        ));
    }

    let gating: Vec<&ProductFactoryOrderGap> = participating
        .iter()
        .map(|(_, gap)| gap)
        .filter(|gap| gap.gap_m2 >= MIN_PRODUCTION_GAP_M2)
        .collect();

    let limiting = gating.iter().min_by_key(|gap| gap.order_by.unwrap_or(today + Duration::days(3650)));
    let limiting_product_id = limiting.map(|gap| gap.product_id);

    let has_overdue = gating.iter().any(|gap| gap.order_by.map(|d| d <= today).unwrap_or(false));

    let limiting_row = limiting_product_id.and_then(|pid| {
        products
            .iter()
            .find(|p| p.product_id == pid)
            .and_then(|p| {
                p.production_rows
                    .iter()
                    .filter(|row| matches!(row.status, ProductionStatus::Scheduled | ProductionStatus::InProgress))
                    .min_by_key(|row| row.estimated_delivery_date)
            })
    });

    let signal = if gating.is_empty() || !has_overdue {
        FactoryOrderSignal::OnTrack
    } else {
        match limiting_row {
            Some(row) => {
                let makes_target_boat = target_boat
                    .map(|boat| row.ready_at_port(factory.transport_to_port_days) <= boat.departure_date)
                    .unwrap_or(false);
                if makes_target_boat {
                    FactoryOrderSignal::InProduction
                } else {
                    FactoryOrderSignal::ProductionDelayed
                }
            }
            None => {
                if target_boat.is_some() {
                    FactoryOrderSignal::OrderToday
                } else {
                    FactoryOrderSignal::NoProduction
                }
            }
        }
    };

    let can_make_target_boat = target_boat.map(|boat| {
        let cutoff = boat.departure_date - Duration::days(lead_time);
        limiting.map(|gap| gap.order_by.map(|d| d <= cutoff).unwrap_or(true)).unwrap_or(true)
    });

    FactoryOrderSignalReport {
        factory_id: factory.id,
        signal,
        order_by: limiting.and_then(|gap| gap.order_by),
        limiting_product_id,
        target_boat_id: target_boat.map(|b| b.id),
        can_make_target_boat,
        participating_products: participating.into_iter().map(|(_, gap)| gap).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tarragona_domain::{FactoryId, UnitType};

    fn factory() -> Factory {
        Factory {
            id: FactoryId::new(),
            name: "Test Factory".to_string(),
            origin_port: "Shanghai".to_string(),
            production_lead_days: 10,
            transport_to_port_days: 2,
            cutoff_day: chrono::Weekday::Wed,
            unit_type: UnitType::M2,
            active: true,
            sort_order: 0,
        }
    }

    #[test]
    fn no_gap_yields_on_track() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let f = factory();
        let inputs = vec![FactoryProductInput {
            product_id: ProductId::new(),
            effective_siesa: dec!(100000),
            velocity: dec!(10),
            production_rows: vec![],
        }];
        let report = analyze(&f, today, &[], &inputs);
        assert_eq!(report.signal, FactoryOrderSignal::OnTrack);
    }

    #[test]
    fn large_gap_with_no_pipeline_yields_no_production() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let f = factory();
        let inputs = vec![FactoryProductInput {
            product_id: ProductId::new(),
            effective_siesa: Decimal::ZERO,
            velocity: dec!(100),
            production_rows: vec![],
        }];
        let report = analyze(&f, today, &[], &inputs);
        assert_eq!(report.signal, FactoryOrderSignal::NoProduction);
    }
}
