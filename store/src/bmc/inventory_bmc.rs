use crate::ctx::Ctx;
use crate::DbModelManager;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use tarragona_domain::{FactoryId, InventorySnapshot, PlannerError, PlannerResult, ProductId};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Exposes the latest-per-source view (§4.1): each of the three inventory
/// tables is queried independently and merged by `product_id`. A product
/// missing from a source reads as zero; the three sources are never
/// required to share a snapshot date (§3 InventorySnapshot invariant).
#[automock]
#[async_trait]
pub trait InventoryBmcTrait: Send + Sync + Debug {
    async fn latest_for_factory(
        &self,
        ctx: &Ctx,
        factory_id: FactoryId,
        product_ids: &[ProductId],
    ) -> PlannerResult<HashMap<ProductId, InventorySnapshot>>;
}

#[derive(Debug)]
pub struct DbInventoryBmc {
    pub mm: DbModelManager,
}

struct DbWarehouseRow {
    product_id: Uuid,
    quantity_m2: Decimal,
    created_at: DateTime<Utc>,
}

struct DbFactoryAvailableRow {
    product_id: Uuid,
    quantity_m2: Decimal,
    largest_lot_m2: Option<Decimal>,
    lot_code: Option<String>,
    lot_count: Option<i32>,
    created_at: DateTime<Utc>,
}

struct DbTransitRow {
    product_id: Uuid,
    quantity_m2: Decimal,
    created_at: DateTime<Utc>,
}

#[async_trait]
impl InventoryBmcTrait for DbInventoryBmc {
    async fn latest_for_factory(
        &self,
        _ctx: &Ctx,
        factory_id: FactoryId,
        product_ids: &[ProductId],
    ) -> PlannerResult<HashMap<ProductId, InventorySnapshot>> {
        let mut out: HashMap<ProductId, InventorySnapshot> =
            product_ids.iter().map(|id| (*id, InventorySnapshot::empty(*id))).collect();

        let warehouse_rows = sqlx::query_as!(
            DbWarehouseRow,
            r#"
select distinct on (w.product_id) w.product_id, w.quantity_m2, w.created_at
  from warehouse_snapshots w
  join products p on p.id = w.product_id
 where p.factory_id = $1
 order by w.product_id, w.created_at desc
            "#,
            factory_id.0,
        )
        .fetch_all(self.mm.pool())
        .await
        .map_err(|e| upstream("inventory.warehouse", e))?;

        for row in warehouse_rows {
            if let Some(entry) = out.get_mut(&ProductId(row.product_id)) {
                entry.warehouse_m2 = row.quantity_m2;
                entry.warehouse_as_of = Some(row.created_at);
            }
        }

        let factory_rows = sqlx::query_as!(
            DbFactoryAvailableRow,
            r#"
select distinct on (f.product_id) f.product_id, f.quantity_m2, f.largest_lot_m2, f.lot_code, f.lot_count, f.created_at
  from factory_snapshots f
  join products p on p.id = f.product_id
 where p.factory_id = $1
 order by f.product_id, f.created_at desc
            "#,
            factory_id.0,
        )
        .fetch_all(self.mm.pool())
        .await
        .map_err(|e| upstream("inventory.factory_available", e))?;

        for row in factory_rows {
            if let Some(entry) = out.get_mut(&ProductId(row.product_id)) {
                entry.factory_available_m2 = row.quantity_m2;
                entry.factory_available_as_of = Some(row.created_at);
                entry.largest_lot_m2 = row.largest_lot_m2;
                entry.lot_code = row.lot_code;
                entry.lot_count = row.lot_count;
            }
        }

        let transit_rows = sqlx::query_as!(
            DbTransitRow,
            r#"
select distinct on (t.product_id) t.product_id, t.quantity_m2, t.created_at
  from transit_snapshots t
  join products p on p.id = t.product_id
 where p.factory_id = $1
 order by t.product_id, t.created_at desc
            "#,
            factory_id.0,
        )
        .fetch_all(self.mm.pool())
        .await
        .map_err(|e| upstream("inventory.in_transit", e))?;

        for row in transit_rows {
            if let Some(entry) = out.get_mut(&ProductId(row.product_id)) {
                entry.in_transit_m2 = row.quantity_m2;
                entry.in_transit_as_of = Some(row.created_at);
            }
        }

        Ok(out)
    }
}

fn upstream(operation: &str, e: sqlx::Error) -> PlannerError {
    PlannerError::UpstreamError {
        operation: operation.to_string(),
        message: e.to_string(),
    }
}

#[derive(Debug, Default)]
pub struct InMemoryInventoryBmc {
    snapshots: Arc<RwLock<HashMap<ProductId, InventorySnapshot>>>,
}

impl InMemoryInventoryBmc {
    pub fn new(snapshots: Vec<InventorySnapshot>) -> Self {
        Self {
            snapshots: Arc::new(RwLock::new(snapshots.into_iter().map(|s| (s.product_id, s)).collect())),
        }
    }
}

#[async_trait]
impl InventoryBmcTrait for InMemoryInventoryBmc {
    async fn latest_for_factory(
        &self,
        _ctx: &Ctx,
        _factory_id: FactoryId,
        product_ids: &[ProductId],
    ) -> PlannerResult<HashMap<ProductId, InventorySnapshot>> {
        let stored = self.snapshots.read().await;
        Ok(product_ids
            .iter()
            .map(|id| (*id, stored.get(id).cloned().unwrap_or_else(|| InventorySnapshot::empty(*id))))
            .collect())
    }
}
