use crate::ids::{ProductId, ProductionScheduleRowId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProductionStatus {
    Scheduled,
    InProgress,
    Completed,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ProductionScheduleRow {
    pub id: ProductionScheduleRowId,
    pub product_id: ProductId,
    pub status: ProductionStatus,
    pub requested_m2: Decimal,
    pub completed_m2: Decimal,
    pub estimated_delivery_date: NaiveDate,
}

impl ProductionScheduleRow {
    /// New rows can be added to: only `scheduled` rows (§3 ProductionScheduleRow).
    pub fn can_add_more(&self) -> bool {
        matches!(self.status, ProductionStatus::Scheduled)
    }

    /// Remaining contribution this row still owes to future supply (§3, §4.4.3.B).
    pub fn remaining_contribution(&self) -> Decimal {
        match self.status {
            ProductionStatus::Completed => self.completed_m2,
            ProductionStatus::Scheduled | ProductionStatus::InProgress => {
                (self.requested_m2 - self.completed_m2).max(Decimal::ZERO)
            }
        }
    }

    /// Earliest date the row's contribution can physically reach the origin port.
    pub fn ready_at_port(&self, transport_to_port_days: i64) -> NaiveDate {
        self.estimated_delivery_date + chrono::Duration::days(transport_to_port_days)
    }
}
