use crate::ids::ProductId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TrendStrength {
    Strong,
    Moderate,
    None,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VelocityTrendSignal {
    Growing,
    Stable,
    Declining,
}

/// Everything the velocity analyzer (C2) produces for one SKU. A named
/// struct, not a duck-typed dictionary (§9.1 "Duck-typed trend data objects").
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct TrendMetrics {
    pub product_id: ProductId,
    pub daily_velocity_m2: Decimal,
    pub coefficient_of_variation: Decimal,
    pub sample_count: usize,
    pub confidence: Confidence,
    pub direction: TrendDirection,
    pub strength: TrendStrength,
    pub change_pct: Decimal,
    pub velocity_trend_signal: VelocityTrendSignal,
    pub velocity_90d: Decimal,
    pub velocity_180d: Decimal,
}

impl TrendMetrics {
    /// No-sales fallback (§4.2 error case).
    pub fn zero(product_id: ProductId) -> Self {
        Self {
            product_id,
            daily_velocity_m2: Decimal::ZERO,
            coefficient_of_variation: Decimal::ZERO,
            sample_count: 0,
            confidence: Confidence::Low,
            direction: TrendDirection::Stable,
            strength: TrendStrength::None,
            change_pct: Decimal::ZERO,
            velocity_trend_signal: VelocityTrendSignal::Stable,
            velocity_90d: Decimal::ZERO,
            velocity_180d: Decimal::ZERO,
        }
    }
}
