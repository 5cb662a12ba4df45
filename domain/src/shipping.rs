use crate::ids::{BoatId, ShippingRouteId};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::constants::ORDER_DEADLINE_DAYS;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BoatStatus {
    Available,
    Booked,
    Estimated,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Boat {
    pub id: BoatId,
    pub vessel_name: String,
    pub origin_port: String,
    pub destination_port: String,
    pub departure_date: NaiveDate,
    pub arrival_date: NaiveDate,
    pub status: BoatStatus,
    pub shipping_line: Option<String>,
}

impl Boat {
    /// `departure - ORDER_DEADLINE_DAYS` (§3 Boat, derived field).
    pub fn order_deadline(&self) -> NaiveDate {
        self.departure_date - Duration::days(ORDER_DEADLINE_DAYS)
    }

    pub fn is_estimated(&self) -> bool {
        matches!(self.status, BoatStatus::Estimated)
    }

    /// Deterministic phantom boat id: uuid v5 over route id + candidate date,
    /// matching the original service's `uuid.uuid5(NAMESPACE_DNS, ...)` scheme
    /// (§4.3, §8.1 invariant 8).
    pub fn phantom_id(route_id: ShippingRouteId, candidate_date: NaiveDate) -> BoatId {
        let name = format!("phantom-{}-{}", route_id.0, candidate_date);
        BoatId(Uuid::new_v5(&Uuid::NAMESPACE_DNS, name.as_bytes()))
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ShippingRoute {
    pub id: ShippingRouteId,
    pub name: String,
    pub origin_port: String,
    pub destination_port: String,
    /// 0-based, Python/chrono convention: 0 = Monday (§3 ShippingRoute;
    /// the DB's own 0=Sunday convention is converted at the store boundary —
    /// see §9.2 Open Question on weekday numbering).
    pub departure_day_of_week: u32,
    pub transit_days: i64,
    pub frequency_weeks: i64,
    pub carrier: String,
    pub active: bool,
}

impl ShippingRoute {
    pub fn departure_weekday(&self) -> chrono::Weekday {
        chrono::Weekday::try_from(self.departure_day_of_week as u8).expect("validated at ingestion")
    }
}

/// Boats with the origin-port filter and chronological order the merger (C3)
/// consumes (§4.3 step 1).
pub fn filter_relevant_real_boats(boats: &[Boat], origin_port: &str, from: NaiveDate, to: NaiveDate) -> Vec<Boat> {
    let mut filtered: Vec<Boat> = boats
        .iter()
        .filter(|b| {
            b.origin_port == origin_port
                && b.departure_date > from
                && b.departure_date < to
                && matches!(b.status, BoatStatus::Available | BoatStatus::Booked)
        })
        .cloned()
        .collect();
    filtered.sort_by_key(|b| b.departure_date);
    filtered
}
