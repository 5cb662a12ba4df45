use crate::ctx::Ctx;
use crate::DbModelManager;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use mockall::automock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt::Debug;
use std::str::FromStr;
use std::sync::Arc;
use tarragona_domain::{
    BoatId, PendingBySku, PlannerError, PlannerResult, ProductId, WarehouseOrder, WarehouseOrderId,
    WarehouseOrderItem, WarehouseOrderStatus,
};
use tokio::sync::RwLock;
use uuid::Uuid;

/// The C8 ledger: warehouse orders and their per-SKU pending aggregate
/// (§4.8). Creating an order for a product cancels any other order still
/// `pending` for that same product — a ledger holds one live pending claim
/// per SKU at a time.
#[automock]
#[async_trait]
pub trait WarehouseOrderBmcTrait: Send + Sync + Debug {
    async fn get_by_id(&self, ctx: &Ctx, order_id: WarehouseOrderId) -> PlannerResult<WarehouseOrder>;
    async fn list_for_boat(&self, ctx: &Ctx, boat_id: BoatId) -> PlannerResult<Vec<WarehouseOrder>>;
    async fn create(&self, ctx: &Ctx, order: WarehouseOrder) -> PlannerResult<WarehouseOrder>;
    async fn set_status(
        &self,
        ctx: &Ctx,
        order_id: WarehouseOrderId,
        to: WarehouseOrderStatus,
    ) -> PlannerResult<WarehouseOrder>;
    async fn pending_by_product(&self, ctx: &Ctx) -> PlannerResult<HashMap<ProductId, PendingBySku>>;
}

#[derive(Debug)]
pub struct DbWarehouseOrderBmc {
    pub mm: DbModelManager,
}

struct DbOrderRow {
    id: Uuid,
    boat_id: Uuid,
    status: String,
    total_pallets: Decimal,
    total_m2: Decimal,
    total_containers: i32,
    total_weight_kg: Decimal,
    created_at: DateTime<Utc>,
}

struct DbOrderItemRow {
    order_id: Uuid,
    product_id: Uuid,
    pallets: Decimal,
    bl_number: Option<i16>,
    score: Option<Decimal>,
}

fn row_to_status(raw: &str) -> PlannerResult<WarehouseOrderStatus> {
    WarehouseOrderStatus::from_str(raw).map_err(|_| PlannerError::Internal(format!("bad order status '{raw}'")))
}

async fn fetch_items(mm: &DbModelManager, order_id: Uuid) -> PlannerResult<Vec<WarehouseOrderItem>> {
    let rows = sqlx::query_as!(
        DbOrderItemRow,
        r#"
select order_id, product_id, pallets, bl_number, score
  from warehouse_order_items
 where order_id = $1
        "#,
        order_id,
    )
    .fetch_all(mm.pool())
    .await
    .map_err(|e| PlannerError::UpstreamError {
        operation: "warehouse_order_items.list".into(),
        message: e.to_string(),
    })?;

    Ok(rows
        .into_iter()
        .map(|r| WarehouseOrderItem {
            product_id: ProductId(r.product_id),
            pallets: r.pallets,
            bl_number: r.bl_number.map(|n| n as u8),
            score: r.score,
        })
        .collect())
}

async fn row_to_order(mm: &DbModelManager, row: DbOrderRow) -> PlannerResult<WarehouseOrder> {
    let items = fetch_items(mm, row.id).await?;
    Ok(WarehouseOrder {
        id: WarehouseOrderId(row.id),
        boat_id: BoatId(row.boat_id),
        status: row_to_status(&row.status)?,
        total_pallets: row.total_pallets,
        total_m2: row.total_m2,
        total_containers: row.total_containers as u32,
        total_weight_kg: row.total_weight_kg,
        created_at: row.created_at,
        items,
    })
}

#[async_trait]
impl WarehouseOrderBmcTrait for DbWarehouseOrderBmc {
    async fn get_by_id(&self, _ctx: &Ctx, order_id: WarehouseOrderId) -> PlannerResult<WarehouseOrder> {
        let row = sqlx::query_as!(
            DbOrderRow,
            r#"
select id, boat_id, status, total_pallets, total_m2, total_containers, total_weight_kg, created_at
  from warehouse_orders
 where id = $1
            "#,
            order_id.0,
        )
        .fetch_optional(self.mm.pool())
        .await
        .map_err(|e| PlannerError::UpstreamError {
            operation: "warehouse_orders.get_by_id".into(),
            message: e.to_string(),
        })?;

        match row {
            Some(row) => row_to_order(&self.mm, row).await,
            None => Err(PlannerError::NotFound(format!("warehouse order {order_id}"))),
        }
    }

    async fn list_for_boat(&self, _ctx: &Ctx, boat_id: BoatId) -> PlannerResult<Vec<WarehouseOrder>> {
        let rows = sqlx::query_as!(
            DbOrderRow,
            r#"
select id, boat_id, status, total_pallets, total_m2, total_containers, total_weight_kg, created_at
  from warehouse_orders
 where boat_id = $1
 order by created_at desc
            "#,
            boat_id.0,
        )
        .fetch_all(self.mm.pool())
        .await
        .map_err(|e| PlannerError::UpstreamError {
            operation: "warehouse_orders.list_for_boat".into(),
            message: e.to_string(),
        })?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            orders.push(row_to_order(&self.mm, row).await?);
        }
        Ok(orders)
    }

    async fn create(&self, _ctx: &Ctx, order: WarehouseOrder) -> PlannerResult<WarehouseOrder> {
        let mut tx = self.mm.pool().begin().await.map_err(|e| PlannerError::UpstreamError {
            operation: "warehouse_orders.create.begin".into(),
            message: e.to_string(),
        })?;

        let product_ids: Vec<Uuid> = order.items.iter().map(|i| i.product_id.0).collect();

        sqlx::query!(
            r#"
update warehouse_orders
   set status = 'cancelled'
 where status = 'pending'
   and id in (
         select distinct order_id from warehouse_order_items where product_id = any($1)
       )
            "#,
            &product_ids,
        )
        .execute(&mut *tx)
        .await
        .map_err(|e| PlannerError::UpstreamError {
            operation: "warehouse_orders.cancel_prior_pending".into(),
            message: e.to_string(),
        })?;

        sqlx::query!(
            r#"
insert into warehouse_orders
    (id, boat_id, status, total_pallets, total_m2, total_containers, total_weight_kg, created_at)
values ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
            order.id.0,
            order.boat_id.0,
            order.status.to_string(),
            order.total_pallets,
            order.total_m2,
            order.total_containers as i32,
            order.total_weight_kg,
            order.created_at,
        )
        .execute(&mut *tx)
        .await
        .map_err(|e| PlannerError::UpstreamError {
            operation: "warehouse_orders.create".into(),
            message: e.to_string(),
        })?;

        for item in &order.items {
            sqlx::query!(
                r#"
insert into warehouse_order_items (order_id, product_id, pallets, bl_number, score)
values ($1, $2, $3, $4, $5)
                "#,
                order.id.0,
                item.product_id.0,
                item.pallets,
                item.bl_number.map(|n| n as i16),
                item.score,
            )
            .execute(&mut *tx)
            .await
            .map_err(|e| PlannerError::UpstreamError {
                operation: "warehouse_order_items.insert".into(),
                message: e.to_string(),
            })?;
        }

        tx.commit().await.map_err(|e| PlannerError::UpstreamError {
            operation: "warehouse_orders.create.commit".into(),
            message: e.to_string(),
        })?;

        Ok(order)
    }

    async fn set_status(
        &self,
        ctx: &Ctx,
        order_id: WarehouseOrderId,
        to: WarehouseOrderStatus,
    ) -> PlannerResult<WarehouseOrder> {
        let current = self.get_by_id(ctx, order_id).await?;
        let validated = current.status.transition(to)?;

        sqlx::query!(
            "update warehouse_orders set status = $1 where id = $2",
            validated.to_string(),
            order_id.0,
        )
        .execute(self.mm.pool())
        .await
        .map_err(|e| PlannerError::UpstreamError {
            operation: "warehouse_orders.set_status".into(),
            message: e.to_string(),
        })?;

        Ok(WarehouseOrder { status: validated, ..current })
    }

    async fn pending_by_product(&self, _ctx: &Ctx) -> PlannerResult<HashMap<ProductId, PendingBySku>> {
        struct PendingRow {
            product_id: Uuid,
            order_id: Uuid,
            pallets: Decimal,
            boat_name: String,
            estimated_warehouse_date: NaiveDate,
        }

        let rows = sqlx::query_as!(
            PendingRow,
            r#"
select woi.product_id, wo.id as order_id, woi.pallets,
       b.vessel_name as boat_name, b.arrival_date as estimated_warehouse_date
  from warehouse_order_items woi
  join warehouse_orders wo on wo.id = woi.order_id
  join boat_schedules b on b.id = wo.boat_id
 where wo.status = 'pending'
            "#,
        )
        .fetch_all(self.mm.pool())
        .await
        .map_err(|e| PlannerError::UpstreamError {
            operation: "warehouse_orders.pending_by_product".into(),
            message: e.to_string(),
        })?;

        let mut out: HashMap<ProductId, PendingBySku> = HashMap::new();
        for row in rows {
            let entry = out.entry(ProductId(row.product_id)).or_default();
            entry.total_pallets += row.pallets;
            entry.boat_name = Some(row.boat_name);
            entry.estimated_warehouse_date = Some(row.estimated_warehouse_date);
            entry.order_ids.push(WarehouseOrderId(row.order_id));
        }
        Ok(out)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryWarehouseOrderBmc {
    orders: Arc<RwLock<HashMap<WarehouseOrderId, WarehouseOrder>>>,
}

impl InMemoryWarehouseOrderBmc {
    pub fn new(orders: Vec<WarehouseOrder>) -> Self {
        Self {
            orders: Arc::new(RwLock::new(orders.into_iter().map(|o| (o.id, o)).collect())),
        }
    }
}

#[async_trait]
impl WarehouseOrderBmcTrait for InMemoryWarehouseOrderBmc {
    async fn get_by_id(&self, _ctx: &Ctx, order_id: WarehouseOrderId) -> PlannerResult<WarehouseOrder> {
        self.orders
            .read()
            .await
            .get(&order_id)
            .cloned()
            .ok_or_else(|| PlannerError::NotFound(format!("warehouse order {order_id}")))
    }

    async fn list_for_boat(&self, _ctx: &Ctx, boat_id: BoatId) -> PlannerResult<Vec<WarehouseOrder>> {
        Ok(self.orders.read().await.values().filter(|o| o.boat_id == boat_id).cloned().collect())
    }

    async fn create(&self, _ctx: &Ctx, order: WarehouseOrder) -> PlannerResult<WarehouseOrder> {
        let product_ids: Vec<ProductId> = order.items.iter().map(|i| i.product_id).collect();
        let mut orders = self.orders.write().await;
        for existing in orders.values_mut() {
            if existing.status == WarehouseOrderStatus::Pending
                && existing.items.iter().any(|i| product_ids.contains(&i.product_id))
            {
                existing.status = WarehouseOrderStatus::Cancelled;
            }
        }
        orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn set_status(
        &self,
        _ctx: &Ctx,
        order_id: WarehouseOrderId,
        to: WarehouseOrderStatus,
    ) -> PlannerResult<WarehouseOrder> {
        let mut orders = self.orders.write().await;
        let current = orders
            .get(&order_id)
            .cloned()
            .ok_or_else(|| PlannerError::NotFound(format!("warehouse order {order_id}")))?;
        let validated = current.status.transition(to)?;
        let updated = WarehouseOrder { status: validated, ..current };
        orders.insert(order_id, updated.clone());
        Ok(updated)
    }

    async fn pending_by_product(&self, _ctx: &Ctx) -> PlannerResult<HashMap<ProductId, PendingBySku>> {
        let orders = self.orders.read().await;
        let mut out: HashMap<ProductId, PendingBySku> = HashMap::new();
        for order in orders.values().filter(|o| o.status == WarehouseOrderStatus::Pending) {
            for item in &order.items {
                let entry = out.entry(item.product_id).or_default();
                entry.total_pallets += item.pallets;
                entry.order_ids.push(order.id);
            }
        }
        Ok(out)
    }
}
