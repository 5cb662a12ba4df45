use crate::ids::{CustomerId, ProductId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A weekly sales bucket. `week_start` is always a Monday and is never a
/// future Monday (§3 SalesRecord invariant).
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct SalesRecord {
    pub product_id: ProductId,
    pub week_start: NaiveDate,
    pub quantity_m2: Decimal,
    pub customer: Option<CustomerId>,
    pub total_price_usd: Option<Decimal>,
}

impl SalesRecord {
    pub fn is_valid(&self, today: NaiveDate) -> bool {
        self.week_start.weekday() == chrono::Weekday::Mon && self.week_start <= today
    }
}
