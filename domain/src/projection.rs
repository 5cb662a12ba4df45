use crate::draft::DraftStatus;
use crate::ids::{BoatId, DraftId, ProductId};
use crate::milestone::MilestoneTimeline;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UrgencyTier {
    // Ordered so `urgency_rank` (derive(Ord)) matches §4.4.3.G / §8.1 invariant 3.
    Critical,
    Urgent,
    Soon,
    Ok,
}

impl UrgencyTier {
    /// `< 7` -> critical, `< 14` -> urgent, `< 30` -> soon, else ok (§4.4.3.G).
    pub fn classify(days_of_stock_at_arrival: Option<Decimal>) -> Self {
        match days_of_stock_at_arrival {
            None => UrgencyTier::Ok,
            Some(d) if d < Decimal::from(7) => UrgencyTier::Critical,
            Some(d) if d < Decimal::from(14) => UrgencyTier::Urgent,
            Some(d) if d < Decimal::from(30) => UrgencyTier::Soon,
            Some(_) => UrgencyTier::Ok,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLabel {
    VeryHigh,
    High,
    Medium,
    Low,
    VeryLow,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceBand {
    pub label: ConfidenceLabel,
    pub score: u32,
}

impl ConfidenceBand {
    /// §4.4.5 table.
    pub fn for_days_out(days_out: i64) -> Self {
        let (label, score) = if days_out <= 14 {
            (ConfidenceLabel::VeryHigh, 95)
        } else if days_out <= 30 {
            (ConfidenceLabel::High, 80)
        } else if days_out <= 60 {
            (ConfidenceLabel::Medium, 60)
        } else if days_out <= 90 {
            (ConfidenceLabel::Low, 40)
        } else {
            (ConfidenceLabel::VeryLow, 20)
        };
        Self { label, score }
    }
}

/// §C.1 supplement — which source covered a boat's supply, not just the sum.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct SupplyBreakdown {
    pub warehouse_m2: Decimal,
    pub factory_siesa_m2: Decimal,
    pub production_pipeline_m2: Decimal,
    pub in_transit_m2: Decimal,
}

impl SupplyBreakdown {
    pub fn effective(&self) -> Decimal {
        self.warehouse_m2 + self.factory_siesa_m2 + self.production_pipeline_m2 + self.in_transit_m2
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StabilityImpact {
    Stabilized,
    Recovering,
    Blocked,
    Unaffected,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ProductProjection {
    pub product_id: ProductId,
    pub supply_breakdown: SupplyBreakdown,
    pub effective_stock: Decimal,
    pub projected_stock_at_arrival: Decimal,
    pub days_of_stock_at_arrival: Option<Decimal>,
    pub urgency: UrgencyTier,
    pub suggested_pallets: Decimal,
    pub is_committed: bool,
    pub customer_demand_score: Decimal,
    pub velocity: Decimal,
    pub stability_impact: Option<StabilityImpact>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UrgencyBreakdown {
    pub critical: u32,
    pub urgent: u32,
    pub soon: u32,
    pub ok: u32,
}

impl UrgencyBreakdown {
    pub fn record(&mut self, tier: UrgencyTier) {
        match tier {
            UrgencyTier::Critical => self.critical += 1,
            UrgencyTier::Urgent => self.urgent += 1,
            UrgencyTier::Soon => self.soon += 1,
            UrgencyTier::Ok => self.ok += 1,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct EarlierDraftContext {
    pub boat_ids: Vec<BoatId>,
    pub total_pallets: Decimal,
    pub description: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct BoatProjection {
    pub boat_id: BoatId,
    pub vessel_name: String,
    pub departure_date: chrono::NaiveDate,
    pub arrival_date: chrono::NaiveDate,
    pub is_estimated: bool,
    pub products: Vec<ProductProjection>,
    pub urgency_breakdown: UrgencyBreakdown,
    pub projected_pallets_min: Decimal,
    pub projected_pallets_max: Decimal,
    pub confidence: ConfidenceBand,
    pub draft_id: Option<DraftId>,
    pub draft_status: Option<DraftStatus>,
    pub is_active: bool,
    pub is_draft_locked: bool,
    pub has_earlier_drafts: bool,
    pub earlier_draft_context: Option<EarlierDraftContext>,
    pub needs_review: bool,
    pub review_reason: Option<String>,
    pub milestones: MilestoneTimeline,
    pub stability_progress_before_pct: Decimal,
    pub stability_progress_after_pct: Decimal,
}

impl BoatProjection {
    /// Per-product details sorted by urgency, then customer-demand score
    /// desc, then velocity desc (§4.4.4, §5 Ordering guarantees).
    pub fn sort_products(&mut self) {
        self.products.sort_by(|a, b| {
            a.urgency
                .cmp(&b.urgency)
                .then_with(|| b.customer_demand_score.cmp(&a.customer_demand_score))
                .then_with(|| b.velocity.cmp(&a.velocity))
        });
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct PlanningHorizon {
    pub factory_id: crate::ids::FactoryId,
    pub months: u32,
    pub boats: Vec<BoatProjection>,
}
