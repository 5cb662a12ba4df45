use crate::ctx::Ctx;
use crate::DbModelManager;
use async_trait::async_trait;
use mockall::automock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use tarragona_domain::{FactoryId, PlannerError, PlannerResult, Product, ProductId, Sku};
use tokio::sync::RwLock;
use uuid::Uuid;

#[automock]
#[async_trait]
pub trait ProductBmcTrait: Send + Sync + Debug {
    async fn get_by_id(&self, ctx: &Ctx, product_id: ProductId) -> PlannerResult<Product>;
    async fn list_active(&self, ctx: &Ctx) -> PlannerResult<Vec<Product>>;
    async fn list_active_for_factory(&self, ctx: &Ctx, factory_id: FactoryId) -> PlannerResult<Vec<Product>>;
}

#[derive(Debug)]
pub struct DbProductBmc {
    pub mm: DbModelManager,
}

struct DbProductRow {
    id: Uuid,
    sku: String,
    factory_id: Uuid,
    category: Option<String>,
    rotation_tag: Option<String>,
    active: bool,
    units_per_pallet: Option<Decimal>,
}

impl From<DbProductRow> for Product {
    fn from(row: DbProductRow) -> Self {
        Product {
            id: ProductId(row.id),
            sku: Sku(row.sku),
            factory_id: FactoryId(row.factory_id),
            category: row.category,
            rotation_tag: row.rotation_tag,
            active: row.active,
            units_per_pallet: row.units_per_pallet,
        }
    }
}

#[async_trait]
impl ProductBmcTrait for DbProductBmc {
    async fn get_by_id(&self, _ctx: &Ctx, product_id: ProductId) -> PlannerResult<Product> {
        let row = sqlx::query_as!(
            DbProductRow,
            r#"
select id, sku, factory_id, category, rotation_tag, active, units_per_pallet
  from products
 where id = $1
            "#,
            product_id.0,
        )
        .fetch_optional(self.mm.pool())
        .await
        .map_err(|e| PlannerError::UpstreamError {
            operation: "products.get_by_id".into(),
            message: e.to_string(),
        })?;

        row.map(Product::from)
            .ok_or_else(|| PlannerError::NotFound(format!("product {product_id}")))
    }

    async fn list_active(&self, _ctx: &Ctx) -> PlannerResult<Vec<Product>> {
        let rows = sqlx::query_as!(
            DbProductRow,
            r#"
select id, sku, factory_id, category, rotation_tag, active, units_per_pallet
  from products
 where active
            "#,
        )
        .fetch_all(self.mm.pool())
        .await
        .map_err(|e| PlannerError::UpstreamError {
            operation: "products.list_active".into(),
            message: e.to_string(),
        })?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn list_active_for_factory(&self, _ctx: &Ctx, factory_id: FactoryId) -> PlannerResult<Vec<Product>> {
        let rows = sqlx::query_as!(
            DbProductRow,
            r#"
select id, sku, factory_id, category, rotation_tag, active, units_per_pallet
  from products
 where active and factory_id = $1
            "#,
            factory_id.0,
        )
        .fetch_all(self.mm.pool())
        .await
        .map_err(|e| PlannerError::UpstreamError {
            operation: "products.list_active_for_factory".into(),
            message: e.to_string(),
        })?;

        Ok(rows.into_iter().map(Product::from).collect())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryProductBmc {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
}

impl InMemoryProductBmc {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products: Arc::new(RwLock::new(products.into_iter().map(|p| (p.id, p)).collect())),
        }
    }
}

#[async_trait]
impl ProductBmcTrait for InMemoryProductBmc {
    async fn get_by_id(&self, _ctx: &Ctx, product_id: ProductId) -> PlannerResult<Product> {
        self.products
            .read()
            .await
            .get(&product_id)
            .cloned()
            .ok_or_else(|| PlannerError::NotFound(format!("product {product_id}")))
    }

    async fn list_active(&self, _ctx: &Ctx) -> PlannerResult<Vec<Product>> {
        Ok(self.products.read().await.values().filter(|p| p.active).cloned().collect())
    }

    async fn list_active_for_factory(&self, _ctx: &Ctx, factory_id: FactoryId) -> PlannerResult<Vec<Product>> {
        Ok(self
            .products
            .read()
            .await
            .values()
            .filter(|p| p.active && p.factory_id == factory_id)
            .cloned()
            .collect())
    }
}
