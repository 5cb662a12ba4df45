use crate::error::PlannerError;
use crate::ids::{BoatId, DraftId, FactoryId, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Draft lifecycle (§3 Draft diagram):
/// ```text
///      drafting ─────► action_needed ─┐
///         │                            │
///         │                            ▼
///         └──────────► ordered ────► confirmed
///                        ▲
///           (cancel possible from drafting only)
/// ```
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    Drafting,
    ActionNeeded,
    Ordered,
    Confirmed,
    Cancelled,
}

impl DraftStatus {
    /// `ordered`/`confirmed` are authoritative and locked (§3, GLOSSARY).
    pub fn is_committed(self) -> bool {
        matches!(self, DraftStatus::Ordered | DraftStatus::Confirmed)
    }

    pub fn is_tentative(self) -> bool {
        matches!(self, DraftStatus::Drafting | DraftStatus::ActionNeeded)
    }

    /// Validate a requested transition against the state diagram above.
    pub fn transition(self, to: DraftStatus) -> Result<DraftStatus, PlannerError> {
        use DraftStatus::*;
        let allowed = matches!(
            (self, to),
            (Drafting, ActionNeeded)
                | (Drafting, Ordered)
                | (Drafting, Cancelled)
                | (ActionNeeded, Ordered)
                | (Ordered, Confirmed)
        );
        if allowed {
            Ok(to)
        } else {
            Err(PlannerError::Conflict(format!(
                "illegal draft transition {self} -> {to}"
            )))
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct DraftItem {
    pub product_id: ProductId,
    pub selected_pallets: Decimal,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Draft {
    pub id: DraftId,
    pub boat_id: BoatId,
    pub factory_id: FactoryId,
    pub status: DraftStatus,
    pub bl_number: Option<u8>,
    pub items: Vec<DraftItem>,
}

impl Draft {
    pub fn item_for(&self, product_id: ProductId) -> Option<&DraftItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }
}
