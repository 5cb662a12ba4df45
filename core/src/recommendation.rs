use chrono::NaiveDate;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use tarragona_domain::{AllocationTarget, CustomerTier, PriorityTier, ProductId, ProductStockout};

/// §4.9 stockout classification: compares days-to-stockout against the
/// next two boat arrivals rather than a fixed threshold, so the tier
/// reflects whether supply is actually on its way in time.
pub fn classify_stockout(
    product_id: ProductId,
    days_to_stockout: Option<Decimal>,
    next_two_arrivals: &[NaiveDate],
    today: NaiveDate,
) -> ProductStockout {
    let tier = match days_to_stockout {
        None => PriorityTier::WellCovered,
        Some(d) => {
            let next = next_two_arrivals.first().map(|a| Decimal::from((*a - today).num_days()));
            let second = next_two_arrivals.get(1).map(|a| Decimal::from((*a - today).num_days()));
            if next.map(|n| d < n).unwrap_or(d < Decimal::from(7)) {
                PriorityTier::HighPriority
            } else if second.map(|n| d < n).unwrap_or(false) {
                PriorityTier::Consider
            } else if d >= Decimal::from(30) {
                PriorityTier::WellCovered
            } else {
                PriorityTier::YourCall
            }
        }
    };
    ProductStockout {
        product_id,
        days_to_stockout,
        tier,
    }
}

/// Raw §4.9 safety-stock target before capacity scaling:
/// `v * lead_time + z * std_dev * sqrt(lead_time)`.
pub fn raw_allocation_pallets(velocity: Decimal, std_dev: Decimal, lead_time_days: i64, z_score: Decimal, pallet_divisor: Decimal) -> Decimal {
    let lead_time = Decimal::from(lead_time_days);
    let safety_stock = z_score * std_dev * lead_time.sqrt().unwrap_or(Decimal::ZERO);
    let raw_m2 = velocity * lead_time + safety_stock;
    if pallet_divisor.is_zero() {
        Decimal::ZERO
    } else {
        (raw_m2 / pallet_divisor).ceil()
    }
}

/// Scales every product's raw allocation target down proportionally when
/// their sum would exceed the warehouse's physical pallet capacity
/// (§4.9, §3 universal constant `WAREHOUSE_CAPACITY_PALLETS`).
pub fn scale_allocation_targets(raw: &[(ProductId, Decimal)], warehouse_max_pallets: u32) -> Vec<AllocationTarget> {
    let total: Decimal = raw.iter().map(|(_, p)| *p).sum();
    let capacity = Decimal::from(warehouse_max_pallets);
    let scale_factor = if total > capacity && total > Decimal::ZERO {
        capacity / total
    } else {
        Decimal::ONE
    };
    raw.iter()
        .map(|(product_id, raw_target_pallets)| AllocationTarget {
            product_id: *product_id,
            raw_target_pallets: *raw_target_pallets,
            scaled_target_pallets: (*raw_target_pallets * scale_factor).floor(),
            scale_factor,
        })
        .collect()
}

/// §4.9 customer-demand score: each customer contributes their tier
/// weight, amplified the more overdue their typical reorder gap is.
pub fn customer_demand_score(demand: &[(CustomerTier, Option<Decimal>)]) -> Decimal {
    demand
        .iter()
        .map(|(tier, days_overdue)| {
            let overdue_multiplier = days_overdue
                .map(|d| Decimal::ONE + (d / Decimal::from(30)).max(Decimal::ZERO))
                .unwrap_or(Decimal::ONE);
            tier.weight() * overdue_multiplier
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_next_arrival_falls_back_to_week_threshold() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let result = classify_stockout(ProductId::new(), Some(dec!(3)), &[], today);
        assert_eq!(result.tier, PriorityTier::HighPriority);
    }

    #[test]
    fn allocation_scales_down_when_over_capacity() {
        let raw = vec![(ProductId::new(), dec!(500)), (ProductId::new(), dec!(500))];
        let targets = scale_allocation_targets(&raw, 600);
        let total_scaled: Decimal = targets.iter().map(|t| t.scaled_target_pallets).sum();
        assert!(total_scaled <= dec!(600));
        assert!(targets[0].scale_factor < Decimal::ONE);
    }

    #[test]
    fn allocation_unscaled_when_under_capacity() {
        let raw = vec![(ProductId::new(), dec!(100))];
        let targets = scale_allocation_targets(&raw, 600);
        assert_eq!(targets[0].scale_factor, Decimal::ONE);
        assert_eq!(targets[0].scaled_target_pallets, dec!(100));
    }
}
