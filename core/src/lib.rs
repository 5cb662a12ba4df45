pub mod boat_merger;
pub mod config;
pub mod customer_pattern;
pub mod diagnostics;
pub mod export;
pub mod factory_signal;
pub mod milestones;
pub mod order_builder;
pub mod recommendation;
pub mod simulator;
pub mod velocity;

pub use config::PlannerConfig;

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::NaiveDate;
use tarragona_domain::{FactoryId, PlannerResult, UnitType, VELOCITY_LOOKBACK_DAYS};
use tarragona_store::{Bmc, Ctx};

use crate::simulator::{PlanningHorizonResult, ProductContext, TransitEntry};

/// The orchestrator (§9 "Core"). One instance per running process, built
/// once from a `Bmc` and a `PlannerConfig` and shared behind an `Arc` by
/// `tarragona-http` — mirrors the teacher's `Services` aggregate
/// (st-core/src/services.rs) that wraps its `Bmc` the same way.
#[derive(Clone)]
pub struct Core {
    bmc: Bmc,
    config: PlannerConfig,
    factory_unit_cache: std::sync::Arc<RwLock<HashMap<FactoryId, UnitType>>>,
}

impl Core {
    pub fn new(bmc: Bmc, config: PlannerConfig) -> Self {
        Self {
            bmc,
            config,
            factory_unit_cache: std::sync::Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// §9.1 "Implicit caches" redesign: an explicit, small, invalidatable
    /// cache instead of a module-level global. Not consulted by
    /// `simulate_horizon` itself (which always has the `Factory` row in
    /// hand); exists for callers that only need the unit type cheaply,
    /// e.g. the export layer deciding whether to show units or m².
    pub async fn factory_unit_type(&self, ctx: &Ctx, factory_id: FactoryId) -> PlannerResult<UnitType> {
        if let Some(unit) = self.factory_unit_cache.read().unwrap().get(&factory_id) {
            return Ok(*unit);
        }
        let factory = self.bmc.factory.get_by_id(ctx, factory_id).await?;
        self.factory_unit_cache.write().unwrap().insert(factory_id, factory.unit_type);
        Ok(factory.unit_type)
    }

    pub fn clear_factory_unit_cache(&self) {
        self.factory_unit_cache.write().unwrap().clear();
    }

    /// §4.1–§4.5 end to end: resolves every input the simulator needs from
    /// the store, merges real and phantom boats, runs the cascade, and
    /// attaches milestones — the full planning horizon for one factory.
    pub async fn simulate_horizon(&self, ctx: &Ctx, factory_id: FactoryId, months: u32, today: NaiveDate) -> PlannerResult<PlanningHorizonResult> {
        let factory = self.bmc.factory.get_by_id(ctx, factory_id).await?;
        let products = self.bmc.product.list_active_for_factory(ctx, factory_id).await?;
        let product_ids: Vec<_> = products.iter().map(|p| p.id).collect();

        let horizon_days = i64::from(months) * 30;
        let routes = self.bmc.shipping_route.list_active(ctx).await?;
        let real_boats = self
            .bmc
            .boat
            .list_relevant(ctx, &factory.origin_port, today, today + chrono::Duration::days(horizon_days))
            .await?;
        let boats = boat_merger::merge(&real_boats, &routes, &factory.origin_port, today, horizon_days);

        let inventory = self.bmc.inventory.latest_for_factory(ctx, factory_id, &product_ids).await?;
        let sales_since = today - chrono::Duration::days(VELOCITY_LOOKBACK_DAYS);
        let sales = self.bmc.sales.history_since(ctx, &product_ids, sales_since).await?;
        let production = self.bmc.production.open_rows_for_products(ctx, &product_ids).await?;
        let customer_tiers: HashMap<_, _> = self.bmc.customer_pattern.list(ctx).await?.into_iter().map(|c| (c.customer, (c.tier, c.avg_gap_days))).collect();

        let mut drafts_by_boat = HashMap::new();
        for boat in &boats {
            if let Ok(mut drafts) = self.bmc.draft.list_for_boat(ctx, boat.id).await {
                if let Some(draft) = drafts.pop() {
                    drafts_by_boat.insert(boat.id, draft);
                }
            }
        }

        let product_contexts: Vec<ProductContext> = products
            .into_iter()
            .map(|product| {
                let snapshot = inventory.get(&product.id);
                let history = sales.get(&product.id).cloned().unwrap_or_default();
                let trend = velocity::analyze(product.id, &history, today);
                let demand_score = recommendation::customer_demand_score(&customer_demand_pairs(&history, &customer_tiers, today));

                ProductContext {
                    warehouse_m2: snapshot.map(|s| s.warehouse_m2).unwrap_or_default(),
                    siesa_available_m2: snapshot.map(|s| s.factory_available_m2).unwrap_or_default(),
                    transit_entries: snapshot
                        .filter(|s| !s.in_transit_m2.is_zero())
                        .map(|s| {
                            vec![TransitEntry {
                                arrival_date: today + chrono::Duration::days(factory.transport_to_port_days),
                                pallets_m2: s.in_transit_m2,
                            }]
                        })
                        .unwrap_or_default(),
                    production_rows: production.get(&product.id).cloned().unwrap_or_default(),
                    velocity: trend.daily_velocity_m2,
                    customer_demand_score: demand_score,
                    product,
                }
            })
            .collect();

        Ok(simulator::simulate(&factory, &boats, &product_contexts, &drafts_by_boat, &self.config, today, months))
    }

    /// §4.6 factory-order signal for one factory.
    pub async fn factory_signal(&self, ctx: &Ctx, factory_id: FactoryId, today: NaiveDate) -> PlannerResult<tarragona_domain::FactoryOrderSignalReport> {
        let factory = self.bmc.factory.get_by_id(ctx, factory_id).await?;
        let products = self.bmc.product.list_active_for_factory(ctx, factory_id).await?;
        let product_ids: Vec<_> = products.iter().map(|p| p.id).collect();

        let inventory = self.bmc.inventory.latest_for_factory(ctx, factory_id, &product_ids).await?;
        let sales_since = today - chrono::Duration::days(VELOCITY_LOOKBACK_DAYS);
        let sales = self.bmc.sales.history_since(ctx, &product_ids, sales_since).await?;
        let production = self.bmc.production.open_rows_for_products(ctx, &product_ids).await?;

        let routes = self.bmc.shipping_route.list_active(ctx).await?;
        let boats = self
            .bmc
            .boat
            .list_relevant(ctx, &factory.origin_port, today, today + chrono::Duration::days(180))
            .await?;
        let boats = boat_merger::merge(&boats, &routes, &factory.origin_port, today, 180);

        let inputs: Vec<factory_signal::FactoryProductInput> = products
            .into_iter()
            .map(|p| {
                let trend = velocity::analyze(p.id, sales.get(&p.id).map(Vec::as_slice).unwrap_or(&[]), today);
                factory_signal::FactoryProductInput {
                    effective_siesa: inventory.get(&p.id).map(|s| s.factory_available_m2).unwrap_or_default(),
                    velocity: trend.daily_velocity_m2,
                    production_rows: production.get(&p.id).cloned().unwrap_or_default(),
                    product_id: p.id,
                }
            })
            .collect();

        Ok(factory_signal::analyze(&factory, today, &boats, &inputs))
    }

    pub async fn diagnostics_report(&self, ctx: &Ctx, today: NaiveDate) -> PlannerResult<diagnostics::DiagnosticReport> {
        let products = self.bmc.product.list_active(ctx).await?;
        let product_ids: Vec<_> = products.iter().map(|p| p.id).collect();

        let sales = self.bmc.sales.history_since(ctx, &product_ids, today - chrono::Duration::days(365)).await?;
        let all_sales: Vec<_> = sales.values().flatten().cloned().collect();

        let production = self.bmc.production.open_rows_for_products(ctx, &product_ids).await?;
        let all_production: Vec<_> = production.values().flatten().cloned().collect();

        let customers = self.bmc.customer_pattern.list(ctx).await?;
        let customer_revenue_tiers: Vec<_> = customers
            .iter()
            .map(|c| {
                let computed = if c.cumulative_revenue_share <= rust_decimal_macros::dec!(0.70) {
                    tarragona_domain::CustomerTier::A
                } else if c.cumulative_revenue_share <= rust_decimal_macros::dec!(0.90) {
                    tarragona_domain::CustomerTier::B
                } else {
                    tarragona_domain::CustomerTier::C
                };
                (c.customer.clone(), c.tier, computed)
            })
            .collect();

        let mut warehouse_m2 = HashMap::new();
        let mut factory_m2 = HashMap::new();
        let mut transit_m2 = HashMap::new();
        let mut drafts = Vec::new();
        let mut warehouse_orders = Vec::new();

        for factory in self.bmc.factory.list_active(ctx).await? {
            let factory_products: Vec<_> = products.iter().filter(|p| p.factory_id == factory.id).map(|p| p.id).collect();
            let inventory = self.bmc.inventory.latest_for_factory(ctx, factory.id, &factory_products).await?;
            for (product_id, snapshot) in inventory {
                warehouse_m2.insert(product_id, snapshot.warehouse_m2);
                factory_m2.insert(product_id, snapshot.factory_available_m2);
                transit_m2.insert(product_id, snapshot.in_transit_m2);
            }

            let boats = self
                .bmc
                .boat
                .list_relevant(ctx, &factory.origin_port, today, today + chrono::Duration::days(180))
                .await?;
            for boat in boats {
                drafts.extend(self.bmc.draft.list_for_boat(ctx, boat.id).await.unwrap_or_default());
                warehouse_orders.extend(self.bmc.warehouse_order.list_for_boat(ctx, boat.id).await.unwrap_or_default());
            }
        }

        let trend_metrics: Vec<_> = products.iter().map(|p| velocity::analyze(p.id, sales.get(&p.id).map(Vec::as_slice).unwrap_or(&[]), today)).collect();

        let input = diagnostics::DiagnosticInput {
            today,
            products: &products,
            sales: &all_sales,
            warehouse_m2: &warehouse_m2,
            factory_m2: &factory_m2,
            transit_m2: &transit_m2,
            production_rows: &all_production,
            drafts: &drafts,
            warehouse_orders: &warehouse_orders,
            customer_revenue_tiers: &customer_revenue_tiers,
            trend_metrics: &trend_metrics,
        };

        Ok(diagnostics::run_all(&input))
    }

    pub fn bmc(&self) -> &Bmc {
        &self.bmc
    }

    /// §4.7 end to end: resolves one boat's `BoatProjection` from the
    /// horizon, assembles `OrderBuilderProductInput` per product from the
    /// catalog/sales/production store reads, and runs the three-section
    /// builder. `num_bls` is advisory — `allocate_bls` always fits the
    /// minimum number of BLs; a plan needing more surfaces as a warning.
    pub async fn order_builder_plan(
        &self,
        ctx: &Ctx,
        factory_id: FactoryId,
        boat_id: Option<tarragona_domain::BoatId>,
        num_bls: u32,
        excluded_skus: &[tarragona_domain::Sku],
        today: NaiveDate,
    ) -> PlannerResult<tarragona_domain::OrderBuilderResponse> {
        let horizon = self.simulate_horizon(ctx, factory_id, 3, today).await?;
        let factory = self.bmc.factory.get_by_id(ctx, factory_id).await?;
        let boat = match boat_id {
            Some(id) => horizon
                .boats
                .iter()
                .find(|b| b.boat_id == id)
                .ok_or_else(|| tarragona_domain::PlannerError::NotFound(format!("boat {id}")))?,
            None => horizon
                .boats
                .iter()
                .find(|b| b.is_active)
                .or_else(|| horizon.boats.first())
                .ok_or_else(|| tarragona_domain::PlannerError::NotFound("no boats in the planning horizon".to_string()))?,
        };

        let products = self.bmc.product.list_active_for_factory(ctx, factory_id).await?;
        let product_by_id: HashMap<_, _> = products.into_iter().map(|p| (p.id, p)).collect();
        let product_ids: Vec<_> = product_by_id.keys().copied().collect();

        let sales = self.bmc.sales.history_since(ctx, &product_ids, today - chrono::Duration::days(90)).await?;
        let production = self.bmc.production.open_rows_for_products(ctx, &product_ids).await?;

        let boat_windows: Vec<order_builder::BoatWindow> = horizon
            .boats
            .iter()
            .map(|b| order_builder::BoatWindow {
                departure_date: b.departure_date,
                arrival_date: b.arrival_date,
            })
            .collect();

        let weight_kg_per_pallet = if self.config.container_max_pallets == 0 {
            rust_decimal::Decimal::ZERO
        } else {
            rust_decimal::Decimal::from(self.config.container_max_weight_kg) / rust_decimal::Decimal::from(self.config.container_max_pallets)
        };

        let mut inputs = Vec::new();
        for projection in &boat.products {
            let Some(product) = product_by_id.get(&projection.product_id) else { continue };
            if excluded_skus.contains(&product.sku) {
                continue;
            }
            let history = sales.get(&product.id).map(Vec::as_slice).unwrap_or(&[]);
            let trend = velocity::analyze(product.id, history, today);

            inputs.push(order_builder::OrderBuilderProductInput {
                product: product.clone(),
                suggested_pallets: projection.suggested_pallets,
                customer_demand_score: projection.customer_demand_score,
                velocity: projection.velocity,
                velocity_trend_signal: trend.velocity_trend_signal,
                trend_direction: trend.direction,
                days_of_stock_at_arrival: projection.days_of_stock_at_arrival,
                effective_stock: projection.effective_stock,
                production_rows: production.get(&product.id).cloned().unwrap_or_default(),
                weight_kg_per_pallet,
                primary_customer: most_frequent_customer(history),
                siesa_available_now: projection.supply_breakdown.factory_siesa_m2,
                warehouse_m2: projection.supply_breakdown.warehouse_m2,
                in_transit_m2: projection.supply_breakdown.in_transit_m2,
            });
        }

        let mut response = order_builder::build(boat.boat_id, &inputs, &self.config, &boat_windows, factory.lead_time_days(), today);
        if response.bl_allocation.bls.len() as u32 > num_bls.max(1) {
            response
                .bl_allocation
                .warnings
                .push(format!("plan needs {} BL(s), more than the requested {num_bls}", response.bl_allocation.bls.len()));
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use rust_decimal_macros::dec;
    use tarragona_domain::{Factory, InventorySnapshot, Product, SalesRecord, UnitType};
    use tarragona_store::Bmc;

    use crate::diagnostics::CheckStatus;

    fn seeded_core() -> (Core, FactoryId, ProductId) {
        let factory_id = FactoryId::new();
        let product_id = ProductId::new();

        let factory = Factory {
            id: factory_id,
            name: "Tarragona".to_string(),
            origin_port: "Puerto Quetzal".to_string(),
            production_lead_days: 20,
            transport_to_port_days: 2,
            cutoff_day: Weekday::Fri,
            unit_type: UnitType::M2,
            active: true,
            sort_order: 1,
        };
        let product = Product {
            id: product_id,
            sku: tarragona_domain::Sku("TILE-51X51".to_string()),
            factory_id,
            category: Some("porcelanato".to_string()),
            rotation_tag: None,
            active: true,
            units_per_pallet: None,
        };
        let snapshot = InventorySnapshot {
            warehouse_m2: dec!(500),
            ..InventorySnapshot::empty(product_id)
        };
        let today = chrono::NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let sales = vec![SalesRecord {
            product_id,
            week_start: today - chrono::Duration::days(7),
            quantity_m2: dec!(50),
            customer: None,
            total_price_usd: Some(dec!(1000)),
        }];

        let bmc = Bmc {
            product: std::sync::Arc::new(tarragona_store::bmc::InMemoryProductBmc::new(vec![product])),
            factory: std::sync::Arc::new(tarragona_store::bmc::InMemoryFactoryBmc::new(vec![factory])),
            inventory: std::sync::Arc::new(tarragona_store::bmc::InMemoryInventoryBmc::new(vec![snapshot])),
            sales: std::sync::Arc::new(tarragona_store::bmc::InMemorySalesBmc::new(sales)),
            production: std::sync::Arc::new(tarragona_store::bmc::InMemoryProductionBmc::new(vec![])),
            shipping_route: std::sync::Arc::new(tarragona_store::bmc::InMemoryShippingRouteBmc::new(vec![])),
            boat: std::sync::Arc::new(tarragona_store::bmc::InMemoryBoatBmc::new(vec![])),
            draft: std::sync::Arc::new(tarragona_store::bmc::InMemoryDraftBmc::new(vec![])),
            warehouse_order: std::sync::Arc::new(tarragona_store::bmc::InMemoryWarehouseOrderBmc::default()),
            customer_pattern: std::sync::Arc::new(tarragona_store::bmc::InMemoryCustomerPatternBmc::default()),
            freshness: std::sync::Arc::new(tarragona_store::bmc::InMemoryFreshnessBmc::default()),
        };

        (Core::new(bmc, PlannerConfig::default()), factory_id, product_id)
    }

    #[tokio::test]
    async fn simulate_horizon_reads_through_every_store_and_reaches_the_simulator() {
        let (core, factory_id, _product_id) = seeded_core();
        let ctx = Ctx::new();
        let today = chrono::NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();

        let horizon = core.simulate_horizon(&ctx, factory_id, 3, today).await.unwrap();

        // No real or phantom boats with zero shipping routes configured — the
        // horizon is still well-formed (empty), proving the orchestration
        // reaches the simulator rather than erroring on a missing input.
        assert!(horizon.boats.is_empty());
        assert_eq!(horizon.factory_id, factory_id);

        let cached = core.factory_unit_type(&ctx, factory_id).await.unwrap();
        assert_eq!(cached, UnitType::M2);

        let diagnostics = core.diagnostics_report(&ctx, today).await.unwrap();
        assert!(diagnostics.checks.iter().all(|c| c.status != CheckStatus::Fail));
        assert_eq!(diagnostics.passed + diagnostics.warnings + diagnostics.failures, diagnostics.checks.len() as u32);
    }

    #[tokio::test]
    async fn clear_factory_unit_cache_forces_a_fresh_lookup() {
        let (core, factory_id, _product_id) = seeded_core();
        let ctx = Ctx::new();

        core.factory_unit_type(&ctx, factory_id).await.unwrap();
        core.clear_factory_unit_cache();
        let unit = core.factory_unit_type(&ctx, factory_id).await.unwrap();
        assert_eq!(unit, UnitType::M2);
    }
}

fn most_frequent_customer(history: &[tarragona_domain::SalesRecord]) -> Option<String> {
    let mut counts: HashMap<&str, u32> = HashMap::new();
    for record in history {
        if let Some(customer) = &record.customer {
            *counts.entry(customer.0.as_str()).or_default() += 1;
        }
    }
    counts.into_iter().max_by_key(|(_, count)| *count).map(|(name, _)| name.to_string())
}

/// One `(tier, days_overdue)` pair per customer who has ever bought this
/// product, feeding C9's `customer_demand_score` (§4.9). `days_overdue` is
/// `None` when the customer has no tracked ordering cadence to compare
/// against.
fn customer_demand_pairs(
    history: &[tarragona_domain::SalesRecord],
    customer_tiers: &HashMap<tarragona_domain::CustomerId, (tarragona_domain::CustomerTier, Option<rust_decimal::Decimal>)>,
    today: NaiveDate,
) -> Vec<(tarragona_domain::CustomerTier, Option<rust_decimal::Decimal>)> {
    let mut last_purchase: HashMap<&tarragona_domain::CustomerId, NaiveDate> = HashMap::new();
    for record in history {
        if let Some(customer) = &record.customer {
            last_purchase
                .entry(customer)
                .and_modify(|d| *d = (*d).max(record.week_start))
                .or_insert(record.week_start);
        }
    }

    last_purchase
        .into_iter()
        .filter_map(|(customer, last_date)| {
            let (tier, avg_gap_days) = customer_tiers.get(customer)?;
            let days_since = rust_decimal::Decimal::from((today - last_date).num_days());
            let days_overdue = avg_gap_days.map(|gap| days_since - gap);
            Some((*tier, days_overdue))
        })
        .collect()
}
