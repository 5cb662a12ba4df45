use crate::ids::ProductId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-product snapshot composed of the most recent row from each of three
/// independent sources (§3, §4.1). Each component reflects its own source's
/// latest date — the three dates are never unified.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct InventorySnapshot {
    pub product_id: ProductId,
    pub warehouse_m2: Decimal,
    pub warehouse_as_of: Option<DateTime<Utc>>,
    pub in_transit_m2: Decimal,
    pub in_transit_as_of: Option<DateTime<Utc>>,
    pub factory_available_m2: Decimal,
    pub factory_available_as_of: Option<DateTime<Utc>>,
    pub largest_lot_m2: Option<Decimal>,
    pub lot_code: Option<String>,
    pub lot_count: Option<i32>,
}

impl InventorySnapshot {
    pub fn empty(product_id: ProductId) -> Self {
        Self {
            product_id,
            warehouse_m2: Decimal::ZERO,
            warehouse_as_of: None,
            in_transit_m2: Decimal::ZERO,
            in_transit_as_of: None,
            factory_available_m2: Decimal::ZERO,
            factory_available_as_of: None,
            largest_lot_m2: None,
            lot_code: None,
            lot_count: None,
        }
    }
}
