use crate::ctx::Ctx;
use crate::DbModelManager;
use async_trait::async_trait;
use mockall::automock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt::Debug;
use std::str::FromStr;
use std::sync::Arc;
use tarragona_domain::{
    BoatId, Draft, DraftId, DraftItem, DraftStatus, FactoryId, PlannerError, PlannerResult, ProductId,
};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Persists boat/factory drafts and their line items (§3 Draft). Status
/// writes always go through `DraftStatus::transition` so an illegal jump
/// never reaches the database.
#[automock]
#[async_trait]
pub trait DraftBmcTrait: Send + Sync + Debug {
    async fn get_by_id(&self, ctx: &Ctx, draft_id: DraftId) -> PlannerResult<Draft>;
    async fn list_for_boat(&self, ctx: &Ctx, boat_id: BoatId) -> PlannerResult<Vec<Draft>>;
    async fn upsert(&self, ctx: &Ctx, draft: Draft) -> PlannerResult<Draft>;
    async fn set_status(&self, ctx: &Ctx, draft_id: DraftId, to: DraftStatus) -> PlannerResult<Draft>;
}

#[derive(Debug)]
pub struct DbDraftBmc {
    pub mm: DbModelManager,
}

struct DbDraftRow {
    id: Uuid,
    boat_id: Uuid,
    factory_id: Uuid,
    status: String,
    bl_number: Option<i16>,
}

struct DbDraftItemRow {
    draft_id: Uuid,
    product_id: Uuid,
    selected_pallets: Decimal,
}

fn row_to_status(row: &str) -> PlannerResult<DraftStatus> {
    DraftStatus::from_str(row).map_err(|_| PlannerError::Internal(format!("bad draft status '{row}'")))
}

async fn fetch_items(mm: &DbModelManager, draft_id: Uuid) -> PlannerResult<Vec<DraftItem>> {
    let rows = sqlx::query_as!(
        DbDraftItemRow,
        r#"
select draft_id, product_id, selected_pallets
  from draft_items
 where draft_id = $1
        "#,
        draft_id,
    )
    .fetch_all(mm.pool())
    .await
    .map_err(|e| PlannerError::UpstreamError {
        operation: "draft_items.list".into(),
        message: e.to_string(),
    })?;

    Ok(rows
        .into_iter()
        .map(|r| DraftItem {
            product_id: ProductId(r.product_id),
            selected_pallets: r.selected_pallets,
        })
        .collect())
}

async fn row_to_draft(mm: &DbModelManager, row: DbDraftRow) -> PlannerResult<Draft> {
    let items = fetch_items(mm, row.id).await?;
    Ok(Draft {
        id: DraftId(row.id),
        boat_id: BoatId(row.boat_id),
        factory_id: FactoryId(row.factory_id),
        status: row_to_status(&row.status)?,
        bl_number: row.bl_number.map(|n| n as u8),
        items,
    })
}

#[async_trait]
impl DraftBmcTrait for DbDraftBmc {
    async fn get_by_id(&self, _ctx: &Ctx, draft_id: DraftId) -> PlannerResult<Draft> {
        let row = sqlx::query_as!(
            DbDraftRow,
            r#"
select id, boat_id, factory_id, status, bl_number
  from boat_factory_drafts
 where id = $1
            "#,
            draft_id.0,
        )
        .fetch_optional(self.mm.pool())
        .await
        .map_err(|e| PlannerError::UpstreamError {
            operation: "drafts.get_by_id".into(),
            message: e.to_string(),
        })?;

        match row {
            Some(row) => row_to_draft(&self.mm, row).await,
            None => Err(PlannerError::NotFound(format!("draft {draft_id}"))),
        }
    }

    async fn list_for_boat(&self, _ctx: &Ctx, boat_id: BoatId) -> PlannerResult<Vec<Draft>> {
        let rows = sqlx::query_as!(
            DbDraftRow,
            r#"
select id, boat_id, factory_id, status, bl_number
  from boat_factory_drafts
 where boat_id = $1
            "#,
            boat_id.0,
        )
        .fetch_all(self.mm.pool())
        .await
        .map_err(|e| PlannerError::UpstreamError {
            operation: "drafts.list_for_boat".into(),
            message: e.to_string(),
        })?;

        let mut drafts = Vec::with_capacity(rows.len());
        for row in rows {
            drafts.push(row_to_draft(&self.mm, row).await?);
        }
        Ok(drafts)
    }

    async fn upsert(&self, _ctx: &Ctx, draft: Draft) -> PlannerResult<Draft> {
        let mut tx = self.mm.pool().begin().await.map_err(|e| PlannerError::UpstreamError {
            operation: "drafts.upsert.begin".into(),
            message: e.to_string(),
        })?;

        sqlx::query!(
            r#"
insert into boat_factory_drafts (id, boat_id, factory_id, status, bl_number)
values ($1, $2, $3, $4, $5)
on conflict (id) do update
   set status = excluded.status, bl_number = excluded.bl_number
            "#,
            draft.id.0,
            draft.boat_id.0,
            draft.factory_id.0,
            draft.status.to_string(),
            draft.bl_number.map(|n| n as i16),
        )
        .execute(&mut *tx)
        .await
        .map_err(|e| PlannerError::UpstreamError {
            operation: "drafts.upsert".into(),
            message: e.to_string(),
        })?;

        sqlx::query!("delete from draft_items where draft_id = $1", draft.id.0)
            .execute(&mut *tx)
            .await
            .map_err(|e| PlannerError::UpstreamError {
                operation: "draft_items.replace".into(),
                message: e.to_string(),
            })?;

        for item in &draft.items {
            sqlx::query!(
                r#"
insert into draft_items (draft_id, product_id, selected_pallets)
values ($1, $2, $3)
                "#,
                draft.id.0,
                item.product_id.0,
                item.selected_pallets,
            )
            .execute(&mut *tx)
            .await
            .map_err(|e| PlannerError::UpstreamError {
                operation: "draft_items.insert".into(),
                message: e.to_string(),
            })?;
        }

        tx.commit().await.map_err(|e| PlannerError::UpstreamError {
            operation: "drafts.upsert.commit".into(),
            message: e.to_string(),
        })?;

        Ok(draft)
    }

    async fn set_status(&self, ctx: &Ctx, draft_id: DraftId, to: DraftStatus) -> PlannerResult<Draft> {
        let current = self.get_by_id(ctx, draft_id).await?;
        let validated = current.status.transition(to)?;

        sqlx::query!(
            "update boat_factory_drafts set status = $1 where id = $2",
            validated.to_string(),
            draft_id.0,
        )
        .execute(self.mm.pool())
        .await
        .map_err(|e| PlannerError::UpstreamError {
            operation: "drafts.set_status".into(),
            message: e.to_string(),
        })?;

        Ok(Draft { status: validated, ..current })
    }
}

#[derive(Debug, Default)]
pub struct InMemoryDraftBmc {
    drafts: Arc<RwLock<HashMap<DraftId, Draft>>>,
}

impl InMemoryDraftBmc {
    pub fn new(drafts: Vec<Draft>) -> Self {
        Self {
            drafts: Arc::new(RwLock::new(drafts.into_iter().map(|d| (d.id, d)).collect())),
        }
    }
}

#[async_trait]
impl DraftBmcTrait for InMemoryDraftBmc {
    async fn get_by_id(&self, _ctx: &Ctx, draft_id: DraftId) -> PlannerResult<Draft> {
        self.drafts
            .read()
            .await
            .get(&draft_id)
            .cloned()
            .ok_or_else(|| PlannerError::NotFound(format!("draft {draft_id}")))
    }

    async fn list_for_boat(&self, _ctx: &Ctx, boat_id: BoatId) -> PlannerResult<Vec<Draft>> {
        Ok(self.drafts.read().await.values().filter(|d| d.boat_id == boat_id).cloned().collect())
    }

    async fn upsert(&self, _ctx: &Ctx, draft: Draft) -> PlannerResult<Draft> {
        self.drafts.write().await.insert(draft.id, draft.clone());
        Ok(draft)
    }

    async fn set_status(&self, ctx: &Ctx, draft_id: DraftId, to: DraftStatus) -> PlannerResult<Draft> {
        let mut drafts = self.drafts.write().await;
        let current = drafts
            .get(&draft_id)
            .cloned()
            .ok_or_else(|| PlannerError::NotFound(format!("draft {draft_id}")))?;
        let validated = current.status.transition(to)?;
        let updated = Draft { status: validated, ..current };
        drafts.insert(draft_id, updated.clone());
        drop(drafts);
        let _ = ctx;
        Ok(updated)
    }
}
