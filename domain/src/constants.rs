use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Universal constants from §3, used as the defaults a `PlannerConfig`
/// overrides. Kept as plain `const`s (not env-backed) so the simulator's
/// pure functions can be exercised in tests without constructing a config.
pub const M2_PER_PALLET: Decimal = dec!(134.4);
pub const PALLETS_PER_CONTAINER: u32 = 14;
pub const CONTAINER_MAX_PALLETS: u32 = 14;
pub const CONTAINER_MAX_WEIGHT_KG: u32 = 27_500;
pub const MAX_CONTAINERS_PER_BL: u32 = 5;
pub const WAREHOUSE_BUFFER_DAYS: i64 = 3;
pub const ORDERING_CYCLE_DAYS: i64 = 30;
pub const ORDER_DEADLINE_DAYS: i64 = 30;
pub const VELOCITY_LOOKBACK_DAYS: i64 = 90;
pub const WAREHOUSE_CAPACITY_PALLETS: u32 = 740;
pub const MIN_PRODUCTION_GAP_M2: Decimal = dec!(1200);
pub const SAFETY_STOCK_Z_SCORE: Decimal = dec!(1.645);

pub fn bl_capacity_pallets(num_bls: u32) -> u32 {
    num_bls * MAX_CONTAINERS_PER_BL * PALLETS_PER_CONTAINER
}
