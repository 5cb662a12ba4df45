use crate::ids::{FactoryId, ProductId, Sku};
use chrono::Weekday;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    M2,
    Units,
}

/// A factory of origin. Attributes per §3 Factory.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Factory {
    pub id: FactoryId,
    pub name: String,
    pub origin_port: String,
    pub production_lead_days: i64,
    pub transport_to_port_days: i64,
    pub cutoff_day: Weekday,
    pub unit_type: UnitType,
    pub active: bool,
    pub sort_order: i32,
}

impl Factory {
    /// Unit-based factories have no SIESA finished-goods step (§3 Factory invariant).
    pub fn has_siesa_step(&self) -> bool {
        matches!(self.unit_type, UnitType::M2)
    }

    pub fn lead_time_days(&self) -> i64 {
        self.production_lead_days + self.transport_to_port_days
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub sku: Sku,
    pub factory_id: FactoryId,
    pub category: Option<String>,
    pub rotation_tag: Option<String>,
    pub active: bool,
    /// Non-null for unit-based factories (§3 Product invariant); `None`
    /// implies `M2_PER_PALLET` applies.
    pub units_per_pallet: Option<Decimal>,
}

impl Product {
    /// The divisor used to convert a coverage gap (m² or units) into pallets.
    pub fn pallet_divisor(&self, m2_per_pallet: Decimal) -> Decimal {
        self.units_per_pallet.unwrap_or(m2_per_pallet)
    }
}
