use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, Weekday};
use rust_decimal::Decimal;
use serde::Serialize;
use tarragona_domain::{
    BoatId, Confidence, CustomerId, CustomerTier, Draft, FactoryId, Product, ProductId, ProductionScheduleRow,
    SalesRecord, TrendMetrics, WarehouseOrder,
};

/// §C.3 supplement — a fixed, named battery of structural checks over a
/// loaded snapshot, grounded on `diagnostic_service.py`'s intent
/// (`GET /diagnostics/data-quality`) but reimplemented as pure functions
/// over the domain types rather than ported line-by-line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Warning,
    Fail,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticCheck {
    pub name: &'static str,
    pub status: CheckStatus,
    pub summary: String,
    pub action_needed: bool,
}

impl DiagnosticCheck {
    fn pass(name: &'static str, summary: impl Into<String>) -> Self {
        Self {
            name,
            status: CheckStatus::Pass,
            summary: summary.into(),
            action_needed: false,
        }
    }

    fn warning(name: &'static str, summary: impl Into<String>) -> Self {
        Self {
            name,
            status: CheckStatus::Warning,
            summary: summary.into(),
            action_needed: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct DiagnosticReport {
    pub checks: Vec<DiagnosticCheck>,
    pub passed: u32,
    pub warnings: u32,
    pub failures: u32,
}

/// Everything a full diagnostic pass needs, gathered up front by the
/// caller so every check below stays a pure function of plain data.
pub struct DiagnosticInput<'a> {
    pub today: NaiveDate,
    pub products: &'a [Product],
    pub sales: &'a [SalesRecord],
    pub warehouse_m2: &'a HashMap<ProductId, Decimal>,
    pub factory_m2: &'a HashMap<ProductId, Decimal>,
    pub transit_m2: &'a HashMap<ProductId, Decimal>,
    pub production_rows: &'a [ProductionScheduleRow],
    pub drafts: &'a [Draft],
    pub warehouse_orders: &'a [WarehouseOrder],
    pub customer_revenue_tiers: &'a [(CustomerId, CustomerTier, CustomerTier)],
    pub trend_metrics: &'a [TrendMetrics],
}

pub fn run_all(input: &DiagnosticInput) -> DiagnosticReport {
    let checks = vec![
        check_duplicate_active_skus(input),
        check_negative_warehouse_inventory(input),
        check_negative_factory_inventory(input),
        check_negative_transit_inventory(input),
        check_future_dated_sales(input),
        check_non_monday_sales(input),
        check_production_overage(input),
        check_production_negative_remaining(input),
        check_duplicate_boat_factory_drafts(input),
        check_orphaned_warehouse_order_items(input),
        check_products_without_sales(input),
        check_products_without_inventory(input),
        check_customer_tier_mismatch(input),
        check_extreme_trend_percentage(input),
        check_confidence_sample_mismatch(input),
    ];

    let passed = checks.iter().filter(|c| c.status == CheckStatus::Pass).count() as u32;
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count() as u32;
    let failures = checks.iter().filter(|c| c.status == CheckStatus::Fail).count() as u32;

    DiagnosticReport {
        checks,
        passed,
        warnings,
        failures,
    }
}

fn check_duplicate_active_skus(input: &DiagnosticInput) -> DiagnosticCheck {
    let mut seen = HashSet::new();
    let mut duplicates = HashSet::new();
    for p in input.products.iter().filter(|p| p.active) {
        if !seen.insert(&p.sku) {
            duplicates.insert(p.sku.clone());
        }
    }
    if duplicates.is_empty() {
        DiagnosticCheck::pass("duplicate_active_skus", "no duplicate active SKUs found")
    } else {
        DiagnosticCheck::warning("duplicate_active_skus", format!("{} SKU(s) are active on more than one product", duplicates.len()))
    }
}

fn check_negative_inventory(name: &'static str, values: &HashMap<ProductId, Decimal>) -> DiagnosticCheck {
    let negative = values.values().filter(|v| **v < Decimal::ZERO).count();
    if negative == 0 {
        DiagnosticCheck::pass(name, "no negative inventory values found")
    } else {
        DiagnosticCheck::warning(name, format!("{negative} product(s) report negative inventory"))
    }
}

fn check_negative_warehouse_inventory(input: &DiagnosticInput) -> DiagnosticCheck {
    check_negative_inventory("negative_warehouse_inventory", input.warehouse_m2)
}

fn check_negative_factory_inventory(input: &DiagnosticInput) -> DiagnosticCheck {
    check_negative_inventory("negative_factory_inventory", input.factory_m2)
}

fn check_negative_transit_inventory(input: &DiagnosticInput) -> DiagnosticCheck {
    check_negative_inventory("negative_transit_inventory", input.transit_m2)
}

fn check_future_dated_sales(input: &DiagnosticInput) -> DiagnosticCheck {
    let future = input.sales.iter().filter(|s| s.week_start > input.today).count();
    if future == 0 {
        DiagnosticCheck::pass("future_dated_sales", "no sales records dated in the future")
    } else {
        DiagnosticCheck::warning("future_dated_sales", format!("{future} sales record(s) have a week_start after today"))
    }
}

fn check_non_monday_sales(input: &DiagnosticInput) -> DiagnosticCheck {
    let bad = input.sales.iter().filter(|s| s.week_start.weekday() != Weekday::Mon).count();
    if bad == 0 {
        DiagnosticCheck::pass("non_monday_sales", "every sales record's week_start is a Monday")
    } else {
        DiagnosticCheck::warning("non_monday_sales", format!("{bad} sales record(s) have a non-Monday week_start"))
    }
}

fn check_production_overage(input: &DiagnosticInput) -> DiagnosticCheck {
    let overage = input.production_rows.iter().filter(|r| r.completed_m2 > r.requested_m2).count();
    if overage == 0 {
        DiagnosticCheck::pass("production_overage", "no production row has completed_m2 above requested_m2")
    } else {
        DiagnosticCheck::warning("production_overage", format!("{overage} production row(s) report completed_m2 > requested_m2"))
    }
}

fn check_production_negative_remaining(input: &DiagnosticInput) -> DiagnosticCheck {
    let negative = input
        .production_rows
        .iter()
        .filter(|r| r.requested_m2 < Decimal::ZERO || r.completed_m2 < Decimal::ZERO)
        .count();
    if negative == 0 {
        DiagnosticCheck::pass("production_negative_remaining", "no production row has a negative requested or completed quantity")
    } else {
        DiagnosticCheck::warning(
            "production_negative_remaining",
            format!("{negative} production row(s) report a negative requested or completed quantity"),
        )
    }
}

fn check_duplicate_boat_factory_drafts(input: &DiagnosticInput) -> DiagnosticCheck {
    let mut seen: HashSet<(BoatId, FactoryId)> = HashSet::new();
    let mut duplicates = 0;
    for d in input.drafts {
        if !seen.insert((d.boat_id, d.factory_id)) {
            duplicates += 1;
        }
    }
    if duplicates == 0 {
        DiagnosticCheck::pass("duplicate_boat_factory_drafts", "each boat/factory pair has at most one draft")
    } else {
        DiagnosticCheck::warning("duplicate_boat_factory_drafts", format!("{duplicates} boat/factory pair(s) have more than one draft"))
    }
}

fn check_orphaned_warehouse_order_items(input: &DiagnosticInput) -> DiagnosticCheck {
    let known: HashSet<ProductId> = input.products.iter().map(|p| p.id).collect();
    let orphaned = input
        .warehouse_orders
        .iter()
        .flat_map(|o| o.items.iter())
        .filter(|i| !known.contains(&i.product_id))
        .count();
    if orphaned == 0 {
        DiagnosticCheck::pass("orphaned_warehouse_order_items", "every warehouse-order item references a known product")
    } else {
        DiagnosticCheck::warning(
            "orphaned_warehouse_order_items",
            format!("{orphaned} warehouse-order item(s) reference a product that no longer exists"),
        )
    }
}

fn check_products_without_sales(input: &DiagnosticInput) -> DiagnosticCheck {
    let with_sales: HashSet<ProductId> = input.sales.iter().map(|s| s.product_id).collect();
    let missing = input.products.iter().filter(|p| p.active && !with_sales.contains(&p.id)).count();
    if missing == 0 {
        DiagnosticCheck::pass("products_without_sales", "every active product has at least one sales record")
    } else {
        DiagnosticCheck::warning("products_without_sales", format!("{missing} active product(s) have no sales history"))
    }
}

fn check_products_without_inventory(input: &DiagnosticInput) -> DiagnosticCheck {
    let missing = input
        .products
        .iter()
        .filter(|p| p.active && !input.warehouse_m2.contains_key(&p.id) && !input.factory_m2.contains_key(&p.id))
        .count();
    if missing == 0 {
        DiagnosticCheck::pass("products_without_inventory", "every active product has at least one inventory snapshot")
    } else {
        DiagnosticCheck::warning("products_without_inventory", format!("{missing} active product(s) have no inventory snapshot at all"))
    }
}

fn check_customer_tier_mismatch(input: &DiagnosticInput) -> DiagnosticCheck {
    let mismatched = input.customer_revenue_tiers.iter().filter(|(_, stored, computed)| stored != computed).count();
    if mismatched == 0 {
        DiagnosticCheck::pass("customer_tier_mismatch", "every customer's stored tier matches its revenue-derived tier")
    } else {
        DiagnosticCheck::warning("customer_tier_mismatch", format!("{mismatched} customer(s) have a stored tier inconsistent with cumulative revenue share"))
    }
}

fn check_extreme_trend_percentage(input: &DiagnosticInput) -> DiagnosticCheck {
    let extreme = input.trend_metrics.iter().filter(|m| m.change_pct.abs() > Decimal::from(500)).count();
    if extreme == 0 {
        DiagnosticCheck::pass("extreme_trend_percentage", "no product's trend change exceeds 500%")
    } else {
        DiagnosticCheck::warning("extreme_trend_percentage", format!("{extreme} product(s) show a trend change beyond 500%, likely a low-sample artifact"))
    }
}

fn check_confidence_sample_mismatch(input: &DiagnosticInput) -> DiagnosticCheck {
    let mismatched = input.trend_metrics.iter().filter(|m| m.confidence == Confidence::High && m.sample_count < 8).count();
    if mismatched == 0 {
        DiagnosticCheck::pass("confidence_sample_mismatch", "every high-confidence trend has enough samples to back it")
    } else {
        DiagnosticCheck::warning("confidence_sample_mismatch", format!("{mismatched} product(s) are marked high-confidence despite fewer than 8 sales samples"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tarragona_domain::ProductId as DomainProductId;

    fn empty_input<'a>(today: NaiveDate, warehouse_m2: &'a HashMap<ProductId, Decimal>, sales: &'a [SalesRecord]) -> DiagnosticInput<'a> {
        DiagnosticInput {
            today,
            products: &[],
            sales,
            warehouse_m2,
            factory_m2: warehouse_m2,
            transit_m2: warehouse_m2,
            production_rows: &[],
            drafts: &[],
            warehouse_orders: &[],
            customer_revenue_tiers: &[],
            trend_metrics: &[],
        }
    }

    #[test]
    fn empty_snapshot_passes_every_check() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let empty_map = HashMap::new();
        let input = empty_input(today, &empty_map, &[]);
        let report = run_all(&input);
        assert_eq!(report.failures, 0);
        assert_eq!(report.warnings, 0);
        assert_eq!(report.checks.len(), 15);
    }

    #[test]
    fn future_dated_sale_is_flagged() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let sale = SalesRecord {
            product_id: DomainProductId::new(),
            week_start: today + chrono::Duration::days(7),
            quantity_m2: dec!(10),
            customer: None,
            total_price_usd: None,
        };
        let sales = vec![sale];
        let empty_map = HashMap::new();
        let input = empty_input(today, &empty_map, &sales);
        let report = run_all(&input);
        assert!(report.checks.iter().any(|c| c.name == "future_dated_sales" && c.status == CheckStatus::Warning));
    }
}
