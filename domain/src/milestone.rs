use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MilestoneKey {
    FactoryRequestCutoff,
    PiggybackCutoff,
    OrderDeadline,
    DepartureDate,
    ArrivalDate,
    InWarehouseDate,
    SiesaOrderDate,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Milestone {
    pub key: MilestoneKey,
    pub label: String,
    pub date: NaiveDate,
    pub passed: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct MilestoneTimeline {
    pub milestones: Vec<Milestone>,
    pub current_milestone: Option<MilestoneKey>,
    pub days_to_next_milestone: Option<i64>,
}
