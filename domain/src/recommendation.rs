use crate::ids::{CustomerId, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// §4.7.2 priority tiers, also used standalone by C9 (§4.9).
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PriorityTier {
    HighPriority,
    Consider,
    WellCovered,
    YourCall,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum CustomerTier {
    A,
    B,
    C,
}

impl CustomerTier {
    pub fn weight(self) -> Decimal {
        match self {
            CustomerTier::A => Decimal::from(100),
            CustomerTier::B => Decimal::from(50),
            CustomerTier::C => Decimal::from(25),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct CustomerPattern {
    pub customer: CustomerId,
    pub tier: CustomerTier,
    pub last_order_date: Option<chrono::NaiveDate>,
    pub avg_gap_days: Option<Decimal>,
    pub cumulative_revenue_share: Decimal,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ProductStockout {
    pub product_id: ProductId,
    pub days_to_stockout: Option<Decimal>,
    pub tier: PriorityTier,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct AllocationTarget {
    pub product_id: ProductId,
    pub raw_target_pallets: Decimal,
    pub scaled_target_pallets: Decimal,
    pub scale_factor: Decimal,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ProductRecommendation {
    pub product_id: ProductId,
    pub tier: PriorityTier,
    pub customer_demand_score: Decimal,
    pub allocation_target_pallets: Decimal,
}
