use crate::ctx::Ctx;
use crate::DbModelManager;
use async_trait::async_trait;
use chrono::NaiveDate;
use mockall::automock;
use std::collections::HashMap;
use std::fmt::Debug;
use std::str::FromStr;
use std::sync::Arc;
use tarragona_domain::{Boat, BoatId, BoatStatus, PlannerError, PlannerResult, ShippingRoute, ShippingRouteId};
use tokio::sync::RwLock;
use uuid::Uuid;

#[automock]
#[async_trait]
pub trait ShippingRouteBmcTrait: Send + Sync + Debug {
    async fn list_active(&self, ctx: &Ctx) -> PlannerResult<Vec<ShippingRoute>>;
    async fn get_by_id(&self, ctx: &Ctx, route_id: ShippingRouteId) -> PlannerResult<ShippingRoute>;
}

#[automock]
#[async_trait]
pub trait BoatBmcTrait: Send + Sync + Debug {
    /// Real boats departing `origin_port` in `(from, to)`, chronological order,
    /// restricted to `available`/`booked` status (§4.3 step 1).
    async fn list_relevant(
        &self,
        ctx: &Ctx,
        origin_port: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> PlannerResult<Vec<Boat>>;

    async fn get_by_id(&self, ctx: &Ctx, boat_id: BoatId) -> PlannerResult<Boat>;
}

#[derive(Debug)]
pub struct DbShippingRouteBmc {
    pub mm: DbModelManager,
}

struct DbRouteRow {
    id: Uuid,
    name: String,
    origin_port: String,
    destination_port: String,
    departure_day_of_week: i32,
    transit_days: i64,
    frequency_weeks: i64,
    carrier: String,
    active: bool,
}

fn row_to_route(row: DbRouteRow) -> ShippingRoute {
    ShippingRoute {
        id: ShippingRouteId(row.id),
        name: row.name,
        origin_port: row.origin_port,
        destination_port: row.destination_port,
        // DB stores 0=Sunday; domain uses 0=Monday (§9.2 weekday convention).
        departure_day_of_week: ((row.departure_day_of_week - 1).rem_euclid(7)) as u32,
        transit_days: row.transit_days,
        frequency_weeks: row.frequency_weeks,
        carrier: row.carrier,
        active: row.active,
    }
}

#[async_trait]
impl ShippingRouteBmcTrait for DbShippingRouteBmc {
    async fn list_active(&self, _ctx: &Ctx) -> PlannerResult<Vec<ShippingRoute>> {
        let rows = sqlx::query_as!(
            DbRouteRow,
            r#"
select id, name, origin_port, destination_port, departure_day_of_week,
       transit_days, frequency_weeks, carrier, active
  from shipping_routes
 where active
            "#,
        )
        .fetch_all(self.mm.pool())
        .await
        .map_err(|e| PlannerError::UpstreamError {
            operation: "shipping_routes.list_active".into(),
            message: e.to_string(),
        })?;

        Ok(rows.into_iter().map(row_to_route).collect())
    }

    async fn get_by_id(&self, _ctx: &Ctx, route_id: ShippingRouteId) -> PlannerResult<ShippingRoute> {
        let row = sqlx::query_as!(
            DbRouteRow,
            r#"
select id, name, origin_port, destination_port, departure_day_of_week,
       transit_days, frequency_weeks, carrier, active
  from shipping_routes
 where id = $1
            "#,
            route_id.0,
        )
        .fetch_optional(self.mm.pool())
        .await
        .map_err(|e| PlannerError::UpstreamError {
            operation: "shipping_routes.get_by_id".into(),
            message: e.to_string(),
        })?;

        row.map(row_to_route)
            .ok_or_else(|| PlannerError::NotFound(format!("shipping route {route_id}")))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryShippingRouteBmc {
    routes: Arc<RwLock<HashMap<ShippingRouteId, ShippingRoute>>>,
}

impl InMemoryShippingRouteBmc {
    pub fn new(routes: Vec<ShippingRoute>) -> Self {
        Self {
            routes: Arc::new(RwLock::new(routes.into_iter().map(|r| (r.id, r)).collect())),
        }
    }
}

#[async_trait]
impl ShippingRouteBmcTrait for InMemoryShippingRouteBmc {
    async fn list_active(&self, _ctx: &Ctx) -> PlannerResult<Vec<ShippingRoute>> {
        Ok(self.routes.read().await.values().filter(|r| r.active).cloned().collect())
    }

    async fn get_by_id(&self, _ctx: &Ctx, route_id: ShippingRouteId) -> PlannerResult<ShippingRoute> {
        self.routes
            .read()
            .await
            .get(&route_id)
            .cloned()
            .ok_or_else(|| PlannerError::NotFound(format!("shipping route {route_id}")))
    }
}

#[derive(Debug)]
pub struct DbBoatBmc {
    pub mm: DbModelManager,
}

struct DbBoatRow {
    id: Uuid,
    vessel_name: String,
    origin_port: String,
    destination_port: String,
    departure_date: NaiveDate,
    arrival_date: NaiveDate,
    status: String,
    shipping_line: Option<String>,
}

fn row_to_boat(row: DbBoatRow) -> PlannerResult<Boat> {
    Ok(Boat {
        id: BoatId(row.id),
        vessel_name: row.vessel_name,
        origin_port: row.origin_port,
        destination_port: row.destination_port,
        departure_date: row.departure_date,
        arrival_date: row.arrival_date,
        status: BoatStatus::from_str(&row.status)
            .map_err(|_| PlannerError::Internal(format!("bad boat status '{}'", row.status)))?,
        shipping_line: row.shipping_line,
    })
}

#[async_trait]
impl BoatBmcTrait for DbBoatBmc {
    async fn list_relevant(
        &self,
        _ctx: &Ctx,
        origin_port: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> PlannerResult<Vec<Boat>> {
        let rows = sqlx::query_as!(
            DbBoatRow,
            r#"
select id, vessel_name, origin_port, destination_port, departure_date,
       arrival_date, status, shipping_line
  from boat_schedules
 where origin_port = $1
   and departure_date > $2 and departure_date < $3
   and status in ('available', 'booked')
 order by departure_date
            "#,
            origin_port,
            from,
            to,
        )
        .fetch_all(self.mm.pool())
        .await
        .map_err(|e| PlannerError::UpstreamError {
            operation: "boat_schedules.list_relevant".into(),
            message: e.to_string(),
        })?;

        rows.into_iter().map(row_to_boat).collect()
    }

    async fn get_by_id(&self, _ctx: &Ctx, boat_id: BoatId) -> PlannerResult<Boat> {
        let row = sqlx::query_as!(
            DbBoatRow,
            r#"
select id, vessel_name, origin_port, destination_port, departure_date,
       arrival_date, status, shipping_line
  from boat_schedules
 where id = $1
            "#,
            boat_id.0,
        )
        .fetch_optional(self.mm.pool())
        .await
        .map_err(|e| PlannerError::UpstreamError {
            operation: "boat_schedules.get_by_id".into(),
            message: e.to_string(),
        })?;

        match row {
            Some(row) => row_to_boat(row),
            None => Err(PlannerError::NotFound(format!("boat {boat_id}"))),
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryBoatBmc {
    boats: Arc<RwLock<HashMap<BoatId, Boat>>>,
}

impl InMemoryBoatBmc {
    pub fn new(boats: Vec<Boat>) -> Self {
        Self {
            boats: Arc::new(RwLock::new(boats.into_iter().map(|b| (b.id, b)).collect())),
        }
    }
}

#[async_trait]
impl BoatBmcTrait for InMemoryBoatBmc {
    async fn list_relevant(
        &self,
        _ctx: &Ctx,
        origin_port: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> PlannerResult<Vec<Boat>> {
        let stored = self.boats.read().await;
        let mut boats: Vec<Boat> = stored
            .values()
            .filter(|b| {
                b.origin_port == origin_port
                    && b.departure_date > from
                    && b.departure_date < to
                    && matches!(b.status, BoatStatus::Available | BoatStatus::Booked)
            })
            .cloned()
            .collect();
        boats.sort_by_key(|b| b.departure_date);
        Ok(boats)
    }

    async fn get_by_id(&self, _ctx: &Ctx, boat_id: BoatId) -> PlannerResult<Boat> {
        self.boats
            .read()
            .await
            .get(&boat_id)
            .cloned()
            .ok_or_else(|| PlannerError::NotFound(format!("boat {boat_id}")))
    }
}
