use crate::ctx::Ctx;
use crate::DbModelManager;
use async_trait::async_trait;
use chrono::NaiveDate;
use mockall::automock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt::Debug;
use std::str::FromStr;
use std::sync::Arc;
use tarragona_domain::{
    PlannerError, PlannerResult, ProductId, ProductionScheduleRow, ProductionScheduleRowId, ProductionStatus,
};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Open production-schedule rows, keyed by product, feeding the in-progress
/// supply term of the cascade simulator (§4.4.3.B).
#[automock]
#[async_trait]
pub trait ProductionBmcTrait: Send + Sync + Debug {
    async fn open_rows_for_products(
        &self,
        ctx: &Ctx,
        product_ids: &[ProductId],
    ) -> PlannerResult<HashMap<ProductId, Vec<ProductionScheduleRow>>>;

    async fn add_row(&self, ctx: &Ctx, row: ProductionScheduleRow) -> PlannerResult<ProductionScheduleRow>;
}

#[derive(Debug)]
pub struct DbProductionBmc {
    pub mm: DbModelManager,
}

struct DbProductionRow {
    id: Uuid,
    product_id: Uuid,
    status: String,
    requested_m2: Decimal,
    completed_m2: Decimal,
    estimated_delivery_date: NaiveDate,
}

fn row_to_domain(row: DbProductionRow) -> PlannerResult<ProductionScheduleRow> {
    Ok(ProductionScheduleRow {
        id: ProductionScheduleRowId(row.id),
        product_id: ProductId(row.product_id),
        status: ProductionStatus::from_str(&row.status)
            .map_err(|_| PlannerError::Internal(format!("bad production status '{}'", row.status)))?,
        requested_m2: row.requested_m2,
        completed_m2: row.completed_m2,
        estimated_delivery_date: row.estimated_delivery_date,
    })
}

#[async_trait]
impl ProductionBmcTrait for DbProductionBmc {
    async fn open_rows_for_products(
        &self,
        _ctx: &Ctx,
        product_ids: &[ProductId],
    ) -> PlannerResult<HashMap<ProductId, Vec<ProductionScheduleRow>>> {
        let ids: Vec<Uuid> = product_ids.iter().map(|id| id.0).collect();

        let rows = sqlx::query_as!(
            DbProductionRow,
            r#"
select id, product_id, status, requested_m2, completed_m2, estimated_delivery_date
  from production_schedule
 where product_id = any($1) and status <> 'completed'
 order by product_id, estimated_delivery_date
            "#,
            &ids,
        )
        .fetch_all(self.mm.pool())
        .await
        .map_err(|e| PlannerError::UpstreamError {
            operation: "production.open_rows_for_products".into(),
            message: e.to_string(),
        })?;

        let mut out: HashMap<ProductId, Vec<ProductionScheduleRow>> =
            product_ids.iter().map(|id| (*id, Vec::new())).collect();
        for row in rows {
            let row = row_to_domain(row)?;
            out.entry(row.product_id).or_default().push(row);
        }
        Ok(out)
    }

    async fn add_row(&self, _ctx: &Ctx, row: ProductionScheduleRow) -> PlannerResult<ProductionScheduleRow> {
        let inserted = sqlx::query_as!(
            DbProductionRow,
            r#"
insert into production_schedule (id, product_id, status, requested_m2, completed_m2, estimated_delivery_date)
values ($1, $2, $3, $4, $5, $6)
returning id, product_id, status, requested_m2, completed_m2, estimated_delivery_date
            "#,
            row.id.0,
            row.product_id.0,
            row.status.to_string(),
            row.requested_m2,
            row.completed_m2,
            row.estimated_delivery_date,
        )
        .fetch_one(self.mm.pool())
        .await
        .map_err(|e| PlannerError::UpstreamError {
            operation: "production.add_row".into(),
            message: e.to_string(),
        })?;

        row_to_domain(inserted)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryProductionBmc {
    rows: Arc<RwLock<Vec<ProductionScheduleRow>>>,
}

impl InMemoryProductionBmc {
    pub fn new(rows: Vec<ProductionScheduleRow>) -> Self {
        Self {
            rows: Arc::new(RwLock::new(rows)),
        }
    }
}

#[async_trait]
impl ProductionBmcTrait for InMemoryProductionBmc {
    async fn open_rows_for_products(
        &self,
        _ctx: &Ctx,
        product_ids: &[ProductId],
    ) -> PlannerResult<HashMap<ProductId, Vec<ProductionScheduleRow>>> {
        let stored = self.rows.read().await;
        let mut out: HashMap<ProductId, Vec<ProductionScheduleRow>> =
            product_ids.iter().map(|id| (*id, Vec::new())).collect();
        for row in stored.iter() {
            if row.status != ProductionStatus::Completed {
                if let Some(bucket) = out.get_mut(&row.product_id) {
                    bucket.push(row.clone());
                }
            }
        }
        for bucket in out.values_mut() {
            bucket.sort_by_key(|r| r.estimated_delivery_date);
        }
        Ok(out)
    }

    async fn add_row(&self, _ctx: &Ctx, row: ProductionScheduleRow) -> PlannerResult<ProductionScheduleRow> {
        self.rows.write().await.push(row.clone());
        Ok(row)
    }
}
