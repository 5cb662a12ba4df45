use crate::ids::Sku;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One non-zero product line of the factory-order sheet (§6.2 rows 8..).
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct FactoryOrderLine {
    pub normalized_sku: Sku,
    pub format: String,
    pub requested_m2: Decimal,
}

/// Fully-specified, pure representation of the `PEDIDO TARRAGONA` sheet
/// (§6.2). Rendering this to bytes is a separate, mechanical step — see
/// SPEC_FULL.md §D.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct FactoryOrderSheet {
    pub order_date: NaiveDate,
    pub production_month_spanish: String,
    pub lines: Vec<FactoryOrderLine>,
    pub total_m2: Decimal,
    pub total_containers: u32,
}
