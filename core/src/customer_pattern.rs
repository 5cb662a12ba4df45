use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tarragona_domain::{CustomerId, CustomerTier};

/// §C.4 supplement — one customer's tier assignment, standalone from the
/// persisted `CustomerPattern` so it can be recomputed from raw revenue
/// figures without touching `last_order_date`/`avg_gap_days`.
#[derive(Debug, Clone, PartialEq)]
pub struct TierAssignment {
    pub customer: CustomerId,
    pub tier: CustomerTier,
    pub cumulative_revenue_share: Decimal,
}

/// Pareto/ABC tiering: customers are ranked by revenue descending, and
/// tiered by where their cumulative share of total revenue falls —
/// A up to 70%, B up to 90%, C for the remainder.
pub fn assign_customer_tiers(customer_revenue: &[(CustomerId, Decimal)]) -> Vec<TierAssignment> {
    let total: Decimal = customer_revenue.iter().map(|(_, revenue)| *revenue).sum();
    let mut sorted = customer_revenue.to_vec();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));

    let mut cumulative = Decimal::ZERO;
    sorted
        .into_iter()
        .map(|(customer, revenue)| {
            cumulative += revenue;
            let share = if total.is_zero() { Decimal::ZERO } else { cumulative / total };
            let tier = if share <= dec!(0.70) {
                CustomerTier::A
            } else if share <= dec!(0.90) {
                CustomerTier::B
            } else {
                CustomerTier::C
            };
            TierAssignment {
                customer,
                tier,
                cumulative_revenue_share: share,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_customer_by_revenue_lands_in_tier_a() {
        let customers = vec![
            (CustomerId("big-co".to_string()), dec!(7000)),
            (CustomerId("mid-co".to_string()), dec!(2000)),
            (CustomerId("small-co".to_string()), dec!(1000)),
        ];
        let tiers = assign_customer_tiers(&customers);
        assert_eq!(tiers[0].customer, CustomerId("big-co".to_string()));
        assert_eq!(tiers[0].tier, CustomerTier::A);
    }

    #[test]
    fn empty_revenue_is_handled_without_division_by_zero() {
        let tiers = assign_customer_tiers(&[]);
        assert!(tiers.is_empty());
    }
}
