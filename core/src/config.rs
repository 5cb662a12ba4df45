use rust_decimal::Decimal;
use serde::Deserialize;
use tarragona_domain::{
    CONTAINER_MAX_WEIGHT_KG, M2_PER_PALLET, MAX_CONTAINERS_PER_BL, PALLETS_PER_CONTAINER, SAFETY_STOCK_Z_SCORE,
    WAREHOUSE_CAPACITY_PALLETS,
};

fn default_m2_per_pallet() -> Decimal {
    M2_PER_PALLET
}
fn default_z_score() -> Decimal {
    SAFETY_STOCK_Z_SCORE
}
fn default_container_max_pallets() -> u32 {
    PALLETS_PER_CONTAINER
}
fn default_container_max_weight_kg() -> u32 {
    CONTAINER_MAX_WEIGHT_KG
}
fn default_container_max_m2() -> Decimal {
    M2_PER_PALLET * Decimal::from(PALLETS_PER_CONTAINER)
}
fn default_boat_min_containers() -> u32 {
    1
}
fn default_boat_max_containers() -> u32 {
    MAX_CONTAINERS_PER_BL
}
fn default_warehouse_max_pallets() -> u32 {
    WAREHOUSE_CAPACITY_PALLETS
}
fn default_warehouse_max_m2() -> Decimal {
    M2_PER_PALLET * Decimal::from(WAREHOUSE_CAPACITY_PALLETS)
}
fn default_stockout_critical_days() -> i64 {
    7
}
fn default_stockout_warning_days() -> i64 {
    14
}
fn default_velocity_window_weeks() -> i64 {
    13
}
fn default_historical_window_weeks() -> i64 {
    26
}
fn default_production_buffer_days() -> i64 {
    0
}
fn default_lead_time_days() -> i64 {
    14
}
fn default_liquidation_min_days() -> i64 {
    60
}
fn default_liquidation_extreme_days() -> i64 {
    180
}
fn default_environment() -> String {
    "development".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_api_host() -> String {
    "0.0.0.0".to_string()
}
fn default_api_port() -> u16 {
    8080
}

/// Runtime-tunable planning parameters (§6.4), layered over the §3
/// universal constants as defaults. Populated from the process environment
/// via `envy` (teacher's configuration convention), one struct per request
/// lifetime — never a global mutable singleton (§9.1).
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct PlannerConfig {
    #[serde(default = "default_lead_time_days")]
    pub lead_time_days: i64,
    #[serde(default = "default_z_score")]
    pub safety_stock_z_score: Decimal,
    #[serde(default = "default_container_max_pallets")]
    pub container_max_pallets: u32,
    #[serde(default = "default_container_max_weight_kg")]
    pub container_max_weight_kg: u32,
    #[serde(default = "default_container_max_m2")]
    pub container_max_m2: Decimal,
    #[serde(default = "default_m2_per_pallet")]
    pub m2_per_pallet: Decimal,
    #[serde(default = "default_boat_min_containers")]
    pub boat_min_containers: u32,
    #[serde(default = "default_boat_max_containers")]
    pub boat_max_containers: u32,
    #[serde(default = "default_warehouse_max_pallets")]
    pub warehouse_max_pallets: u32,
    #[serde(default = "default_warehouse_max_m2")]
    pub warehouse_max_m2: Decimal,
    #[serde(default = "default_stockout_critical_days")]
    pub stockout_critical_days: i64,
    #[serde(default = "default_stockout_warning_days")]
    pub stockout_warning_days: i64,
    #[serde(default = "default_velocity_window_weeks")]
    pub velocity_window_weeks: i64,
    #[serde(default = "default_historical_window_weeks")]
    pub historical_window_weeks: i64,
    #[serde(default = "default_production_buffer_days")]
    pub production_buffer_days: i64,
    /// §C.5 supplement — unnamed thresholds in §4.7.5 made explicit.
    #[serde(default = "default_liquidation_min_days")]
    pub liquidation_min_days: i64,
    #[serde(default = "default_liquidation_extreme_days")]
    pub liquidation_extreme_days: i64,
    /// §9.2 open question — gates whether customer-pattern "expected m²
    /// due soon" is injected into the coverage gap. Defaults off until the
    /// double-counting question is resolved against live data.
    #[serde(default)]
    pub inject_customer_pattern_demand: bool,
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_api_host")]
    pub api_host: String,
    #[serde(default = "default_api_port")]
    pub api_port: u16,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            lead_time_days: default_lead_time_days(),
            safety_stock_z_score: default_z_score(),
            container_max_pallets: default_container_max_pallets(),
            container_max_weight_kg: default_container_max_weight_kg(),
            container_max_m2: default_container_max_m2(),
            m2_per_pallet: default_m2_per_pallet(),
            boat_min_containers: default_boat_min_containers(),
            boat_max_containers: default_boat_max_containers(),
            warehouse_max_pallets: default_warehouse_max_pallets(),
            warehouse_max_m2: default_warehouse_max_m2(),
            stockout_critical_days: default_stockout_critical_days(),
            stockout_warning_days: default_stockout_warning_days(),
            velocity_window_weeks: default_velocity_window_weeks(),
            historical_window_weeks: default_historical_window_weeks(),
            production_buffer_days: default_production_buffer_days(),
            liquidation_min_days: default_liquidation_min_days(),
            liquidation_extreme_days: default_liquidation_extreme_days(),
            inject_customer_pattern_demand: false,
            environment: default_environment(),
            log_level: default_log_level(),
            api_host: default_api_host(),
            api_port: default_api_port(),
        }
    }
}

impl PlannerConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env::<Self>()
    }

    pub fn bl_capacity_pallets(&self, num_bls: u32) -> u32 {
        num_bls * self.boat_max_containers * self.container_max_pallets
    }

    /// One container's worth of m² (§4.7.1.6 — 14 pallets / 1881.6 m² at defaults).
    pub fn min_container_m2(&self) -> Decimal {
        self.m2_per_pallet * Decimal::from(self.container_max_pallets)
    }
}
