use crate::error::PlannerError;
use crate::ids::{BoatId, ProductId, WarehouseOrderId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lifecycle (§3 WarehouseOrder): `pending -> shipped -> received`, or
/// `pending -> cancelled`. Both `received` and `cancelled` are terminal.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WarehouseOrderStatus {
    Pending,
    Shipped,
    Received,
    Cancelled,
}

impl WarehouseOrderStatus {
    pub fn transition(self, to: WarehouseOrderStatus) -> Result<WarehouseOrderStatus, PlannerError> {
        use WarehouseOrderStatus::*;
        let allowed = matches!((self, to), (Pending, Shipped) | (Shipped, Received) | (Pending, Cancelled));
        if allowed {
            Ok(to)
        } else {
            Err(PlannerError::Conflict(format!(
                "illegal warehouse-order transition {self} -> {to}"
            )))
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, WarehouseOrderStatus::Received | WarehouseOrderStatus::Cancelled)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct WarehouseOrderItem {
    pub product_id: ProductId,
    pub pallets: Decimal,
    pub bl_number: Option<u8>,
    pub score: Option<Decimal>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct WarehouseOrder {
    pub id: WarehouseOrderId,
    pub boat_id: BoatId,
    pub status: WarehouseOrderStatus,
    pub total_pallets: Decimal,
    pub total_m2: Decimal,
    pub total_containers: u32,
    pub total_weight_kg: Decimal,
    pub created_at: DateTime<Utc>,
    pub items: Vec<WarehouseOrderItem>,
}

/// Per-SKU pending aggregate exposed by the ledger (§4.8).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PendingBySku {
    pub total_m2: Decimal,
    pub total_pallets: Decimal,
    pub boat_name: Option<String>,
    pub estimated_warehouse_date: Option<chrono::NaiveDate>,
    pub order_ids: Vec<WarehouseOrderId>,
}
