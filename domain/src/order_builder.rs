use crate::ids::{BoatId, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// §4.7.3 additive per-product score, fixed caps.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct ProductScore {
    pub stockout_risk: u32,
    pub customer_demand: u32,
    pub growth_trend: u32,
    pub revenue_impact: u32,
}

impl ProductScore {
    pub fn total(&self) -> u32 {
        self.stockout_risk + self.customer_demand + self.growth_trend + self.revenue_impact
    }

    /// §4.7.3 "Score >= 85 = critical".
    pub fn is_critical(&self) -> bool {
        self.total() >= 85
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ShipNowItem {
    pub product_id: ProductId,
    pub pallets: Decimal,
    pub score: ProductScore,
    pub bl_number: Option<u8>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct AddToProductionItem {
    pub product_id: ProductId,
    pub additional_m2: Decimal,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct FactoryRequestItem {
    pub product_id: ProductId,
    pub request_m2: Decimal,
    pub request_pallets: Decimal,
    pub should_request: bool,
    pub is_low_volume: bool,
    pub minimum_applied: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct BlSummary {
    pub bl_number: u8,
    pub pallets: Decimal,
    pub containers: u32,
    pub m2: Decimal,
    pub weight_kg: Decimal,
    pub primary_customers: Vec<String>,
    pub critical_product_count: u32,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct BlAllocationReport {
    pub bls: Vec<BlSummary>,
    pub risk_distribution_even: bool,
    pub warnings: Vec<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct LiquidationCandidate {
    pub product_id: ProductId,
    pub reason: LiquidationReason,
    pub pallets: Decimal,
    pub trend_change_pct: Decimal,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiquidationReason {
    DecliningOverstocked,
    NoSales,
    ExtremeOverstock,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct OrderBuilderResponse {
    pub boat_id: BoatId,
    pub ship_now: Vec<ShipNowItem>,
    pub add_to_production: Vec<AddToProductionItem>,
    pub factory_request: Vec<FactoryRequestItem>,
    pub bl_allocation: BlAllocationReport,
    pub liquidation_candidates: Vec<LiquidationCandidate>,
    pub reasoning: Vec<String>,
}
