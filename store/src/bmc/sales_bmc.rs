use crate::ctx::Ctx;
use crate::DbModelManager;
use async_trait::async_trait;
use chrono::NaiveDate;
use mockall::automock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use tarragona_domain::{CustomerId, PlannerError, PlannerResult, ProductId, SalesRecord};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Weekly sales history, grouped by product, for the velocity analyzer (C2).
#[automock]
#[async_trait]
pub trait SalesBmcTrait: Send + Sync + Debug {
    async fn history_since(
        &self,
        ctx: &Ctx,
        product_ids: &[ProductId],
        since: NaiveDate,
    ) -> PlannerResult<HashMap<ProductId, Vec<SalesRecord>>>;
}

#[derive(Debug)]
pub struct DbSalesBmc {
    pub mm: DbModelManager,
}

struct DbSalesRow {
    product_id: Uuid,
    week_start: NaiveDate,
    quantity_m2: Decimal,
    customer: Option<String>,
    total_price_usd: Option<Decimal>,
}

impl From<DbSalesRow> for SalesRecord {
    fn from(row: DbSalesRow) -> Self {
        SalesRecord {
            product_id: ProductId(row.product_id),
            week_start: row.week_start,
            quantity_m2: row.quantity_m2,
            customer: row.customer.map(CustomerId),
            total_price_usd: row.total_price_usd,
        }
    }
}

#[async_trait]
impl SalesBmcTrait for DbSalesBmc {
    async fn history_since(
        &self,
        _ctx: &Ctx,
        product_ids: &[ProductId],
        since: NaiveDate,
    ) -> PlannerResult<HashMap<ProductId, Vec<SalesRecord>>> {
        let ids: Vec<Uuid> = product_ids.iter().map(|id| id.0).collect();

        let rows = sqlx::query_as!(
            DbSalesRow,
            r#"
select product_id, week_start, quantity_m2, customer, total_price_usd
  from sales
 where product_id = any($1) and week_start >= $2
 order by product_id, week_start
            "#,
            &ids,
            since,
        )
        .fetch_all(self.mm.pool())
        .await
        .map_err(|e| PlannerError::UpstreamError {
            operation: "sales.history_since".into(),
            message: e.to_string(),
        })?;

        let mut out: HashMap<ProductId, Vec<SalesRecord>> = product_ids.iter().map(|id| (*id, Vec::new())).collect();
        for row in rows {
            let record = SalesRecord::from(row);
            out.entry(record.product_id).or_default().push(record);
        }
        Ok(out)
    }
}

#[derive(Debug, Default)]
pub struct InMemorySalesBmc {
    records: Arc<RwLock<Vec<SalesRecord>>>,
}

impl InMemorySalesBmc {
    pub fn new(records: Vec<SalesRecord>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }
}

#[async_trait]
impl SalesBmcTrait for InMemorySalesBmc {
    async fn history_since(
        &self,
        _ctx: &Ctx,
        product_ids: &[ProductId],
        since: NaiveDate,
    ) -> PlannerResult<HashMap<ProductId, Vec<SalesRecord>>> {
        let stored = self.records.read().await;
        let mut out: HashMap<ProductId, Vec<SalesRecord>> = product_ids.iter().map(|id| (*id, Vec::new())).collect();
        for record in stored.iter() {
            if record.week_start >= since {
                if let Some(bucket) = out.get_mut(&record.product_id) {
                    bucket.push(record.clone());
                }
            }
        }
        for bucket in out.values_mut() {
            bucket.sort_by_key(|r| r.week_start);
        }
        Ok(out)
    }
}
