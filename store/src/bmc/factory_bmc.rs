use crate::ctx::Ctx;
use crate::DbModelManager;
use async_trait::async_trait;
use chrono::Weekday;
use mockall::automock;
use std::collections::HashMap;
use std::fmt::Debug;
use std::str::FromStr;
use std::sync::Arc;
use tarragona_domain::{Factory, FactoryId, PlannerError, PlannerResult, UnitType};
use tokio::sync::RwLock;
use uuid::Uuid;

#[automock]
#[async_trait]
pub trait FactoryBmcTrait: Send + Sync + Debug {
    async fn get_by_id(&self, ctx: &Ctx, factory_id: FactoryId) -> PlannerResult<Factory>;
    async fn list(&self, ctx: &Ctx) -> PlannerResult<Vec<Factory>>;
    async fn list_active(&self, ctx: &Ctx) -> PlannerResult<Vec<Factory>>;
}

#[derive(Debug)]
pub struct DbFactoryBmc {
    pub mm: DbModelManager,
}

struct DbFactoryRow {
    id: Uuid,
    name: String,
    origin_port: String,
    production_lead_days: i64,
    transport_to_port_days: i64,
    cutoff_day: String,
    unit_type: String,
    active: bool,
    sort_order: i32,
}

fn row_to_factory(row: DbFactoryRow) -> PlannerResult<Factory> {
    Ok(Factory {
        id: FactoryId(row.id),
        name: row.name,
        origin_port: row.origin_port,
        production_lead_days: row.production_lead_days,
        transport_to_port_days: row.transport_to_port_days,
        cutoff_day: Weekday::from_str(&row.cutoff_day)
            .map_err(|_| PlannerError::Internal(format!("bad cutoff_day '{}'", row.cutoff_day)))?,
        unit_type: UnitType::from_str(&row.unit_type)
            .map_err(|_| PlannerError::Internal(format!("bad unit_type '{}'", row.unit_type)))?,
        active: row.active,
        sort_order: row.sort_order,
    })
}

#[async_trait]
impl FactoryBmcTrait for DbFactoryBmc {
    async fn get_by_id(&self, _ctx: &Ctx, factory_id: FactoryId) -> PlannerResult<Factory> {
        let row = sqlx::query_as!(
            DbFactoryRow,
            r#"
select id, name, origin_port, production_lead_days, transport_to_port_days,
       cutoff_day, unit_type, active, sort_order
  from factories
 where id = $1
            "#,
            factory_id.0,
        )
        .fetch_optional(self.mm.pool())
        .await
        .map_err(|e| PlannerError::UpstreamError {
            operation: "factories.get_by_id".into(),
            message: e.to_string(),
        })?;

        match row {
            Some(row) => row_to_factory(row),
            None => Err(PlannerError::NotFound(format!("factory {factory_id}"))),
        }
    }

    async fn list(&self, _ctx: &Ctx) -> PlannerResult<Vec<Factory>> {
        let rows = sqlx::query_as!(
            DbFactoryRow,
            r#"
select id, name, origin_port, production_lead_days, transport_to_port_days,
       cutoff_day, unit_type, active, sort_order
  from factories
 order by sort_order
            "#,
        )
        .fetch_all(self.mm.pool())
        .await
        .map_err(|e| PlannerError::UpstreamError {
            operation: "factories.list".into(),
            message: e.to_string(),
        })?;

        rows.into_iter().map(row_to_factory).collect()
    }

    async fn list_active(&self, ctx: &Ctx) -> PlannerResult<Vec<Factory>> {
        Ok(self.list(ctx).await?.into_iter().filter(|f| f.active).collect())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryFactoryBmc {
    factories: Arc<RwLock<HashMap<FactoryId, Factory>>>,
}

impl InMemoryFactoryBmc {
    pub fn new(factories: Vec<Factory>) -> Self {
        Self {
            factories: Arc::new(RwLock::new(factories.into_iter().map(|f| (f.id, f)).collect())),
        }
    }
}

#[async_trait]
impl FactoryBmcTrait for InMemoryFactoryBmc {
    async fn get_by_id(&self, _ctx: &Ctx, factory_id: FactoryId) -> PlannerResult<Factory> {
        self.factories
            .read()
            .await
            .get(&factory_id)
            .cloned()
            .ok_or_else(|| PlannerError::NotFound(format!("factory {factory_id}")))
    }

    async fn list(&self, _ctx: &Ctx) -> PlannerResult<Vec<Factory>> {
        let mut factories: Vec<Factory> = self.factories.read().await.values().cloned().collect();
        factories.sort_by_key(|f| f.sort_order);
        Ok(factories)
    }

    async fn list_active(&self, ctx: &Ctx) -> PlannerResult<Vec<Factory>> {
        Ok(self.list(ctx).await?.into_iter().filter(|f| f.active).collect())
    }
}
