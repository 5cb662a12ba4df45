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
use tarragona_domain::{CustomerId, CustomerPattern, CustomerTier, PlannerError, PlannerResult};
use tokio::sync::RwLock;

/// Per-customer tiering and cadence signals consumed by the recommendation
/// primitives (C9) and by the customer-pattern weighting in §C.4.
#[automock]
#[async_trait]
pub trait CustomerPatternBmcTrait: Send + Sync + Debug {
    async fn list(&self, ctx: &Ctx) -> PlannerResult<Vec<CustomerPattern>>;
    async fn get(&self, ctx: &Ctx, customer: &CustomerId) -> PlannerResult<CustomerPattern>;
}

#[derive(Debug)]
pub struct DbCustomerPatternBmc {
    pub mm: DbModelManager,
}

struct DbCustomerPatternRow {
    customer: String,
    tier: String,
    last_order_date: Option<NaiveDate>,
    avg_gap_days: Option<Decimal>,
    cumulative_revenue_share: Decimal,
}

fn row_to_pattern(row: DbCustomerPatternRow) -> PlannerResult<CustomerPattern> {
    Ok(CustomerPattern {
        customer: CustomerId(row.customer),
        tier: CustomerTier::from_str(&row.tier)
            .map_err(|_| PlannerError::Internal(format!("bad customer tier '{}'", row.tier)))?,
        last_order_date: row.last_order_date,
        avg_gap_days: row.avg_gap_days,
        cumulative_revenue_share: row.cumulative_revenue_share,
    })
}

#[async_trait]
impl CustomerPatternBmcTrait for DbCustomerPatternBmc {
    async fn list(&self, _ctx: &Ctx) -> PlannerResult<Vec<CustomerPattern>> {
        let rows = sqlx::query_as!(
            DbCustomerPatternRow,
            r#"
select customer, tier, last_order_date, avg_gap_days, cumulative_revenue_share
  from customer_patterns
            "#,
        )
        .fetch_all(self.mm.pool())
        .await
        .map_err(|e| PlannerError::UpstreamError {
            operation: "customer_patterns.list".into(),
            message: e.to_string(),
        })?;

        rows.into_iter().map(row_to_pattern).collect()
    }

    async fn get(&self, _ctx: &Ctx, customer: &CustomerId) -> PlannerResult<CustomerPattern> {
        let row = sqlx::query_as!(
            DbCustomerPatternRow,
            r#"
select customer, tier, last_order_date, avg_gap_days, cumulative_revenue_share
  from customer_patterns
 where customer = $1
            "#,
            customer.0,
        )
        .fetch_optional(self.mm.pool())
        .await
        .map_err(|e| PlannerError::UpstreamError {
            operation: "customer_patterns.get".into(),
            message: e.to_string(),
        })?;

        match row {
            Some(row) => row_to_pattern(row),
            None => Err(PlannerError::NotFound(format!("customer pattern {customer}"))),
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCustomerPatternBmc {
    patterns: Arc<RwLock<HashMap<CustomerId, CustomerPattern>>>,
}

impl InMemoryCustomerPatternBmc {
    pub fn new(patterns: Vec<CustomerPattern>) -> Self {
        Self {
            patterns: Arc::new(RwLock::new(patterns.into_iter().map(|p| (p.customer.clone(), p)).collect())),
        }
    }
}

#[async_trait]
impl CustomerPatternBmcTrait for InMemoryCustomerPatternBmc {
    async fn list(&self, _ctx: &Ctx) -> PlannerResult<Vec<CustomerPattern>> {
        Ok(self.patterns.read().await.values().cloned().collect())
    }

    async fn get(&self, _ctx: &Ctx, customer: &CustomerId) -> PlannerResult<CustomerPattern> {
        self.patterns
            .read()
            .await
            .get(customer)
            .cloned()
            .ok_or_else(|| PlannerError::NotFound(format!("customer pattern {customer}")))
    }
}
