use crate::ids::{BoatId, FactoryId, ProductId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// §4.6 signal classification.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FactoryOrderSignal {
    OnTrack,
    InProduction,
    ProductionDelayed,
    OrderToday,
    NoProduction,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ProductFactoryOrderGap {
    pub product_id: ProductId,
    pub effective_siesa: Decimal,
    pub coverage_days: Option<Decimal>,
    pub runs_out: Option<NaiveDate>,
    pub order_by: Option<NaiveDate>,
    pub gap_m2: Decimal,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct FactoryOrderSignalReport {
    pub factory_id: FactoryId,
    pub signal: FactoryOrderSignal,
    pub order_by: Option<NaiveDate>,
    pub limiting_product_id: Option<ProductId>,
    pub target_boat_id: Option<BoatId>,
    pub can_make_target_boat: Option<bool>,
    pub participating_products: Vec<ProductFactoryOrderGap>,
}
