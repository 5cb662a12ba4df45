use crate::ctx::Ctx;
use crate::DbModelManager;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use std::fmt::Debug;
use std::sync::Arc;
use tarragona_domain::{DataFreshnessReport, PlannerError, PlannerResult, UploadHistoryEntry};
use tokio::sync::RwLock;

/// Backs `GET /data-freshness` and the upload-history read model (§C.2).
#[automock]
#[async_trait]
pub trait FreshnessBmcTrait: Send + Sync + Debug {
    async fn latest_by_source(&self, ctx: &Ctx) -> PlannerResult<DataFreshnessReport>;
    async fn record_upload(&self, ctx: &Ctx, entry: UploadHistoryEntry) -> PlannerResult<()>;
    async fn recent_uploads(&self, ctx: &Ctx, limit: i64) -> PlannerResult<Vec<UploadHistoryEntry>>;
}

#[derive(Debug)]
pub struct DbFreshnessBmc {
    pub mm: DbModelManager,
}

struct DbUploadRow {
    source: String,
    uploaded_at: DateTime<Utc>,
    row_count: i64,
    note: Option<String>,
}

impl From<DbUploadRow> for UploadHistoryEntry {
    fn from(row: DbUploadRow) -> Self {
        UploadHistoryEntry {
            source: row.source,
            uploaded_at: row.uploaded_at,
            row_count: row.row_count,
            note: row.note,
        }
    }
}

#[async_trait]
impl FreshnessBmcTrait for DbFreshnessBmc {
    async fn latest_by_source(&self, _ctx: &Ctx) -> PlannerResult<DataFreshnessReport> {
        struct LatestRow {
            source: String,
            uploaded_at: DateTime<Utc>,
        }

        let rows = sqlx::query_as!(
            LatestRow,
            r#"
select distinct on (source) source, uploaded_at
  from upload_history
 order by source, uploaded_at desc
            "#,
        )
        .fetch_all(self.mm.pool())
        .await
        .map_err(|e| PlannerError::UpstreamError {
            operation: "upload_history.latest_by_source".into(),
            message: e.to_string(),
        })?;

        Ok(DataFreshnessReport {
            latest_by_source: rows.into_iter().map(|r| (r.source, r.uploaded_at)).collect(),
        })
    }

    async fn record_upload(&self, _ctx: &Ctx, entry: UploadHistoryEntry) -> PlannerResult<()> {
        sqlx::query!(
            r#"
insert into upload_history (source, uploaded_at, row_count, note)
values ($1, $2, $3, $4)
            "#,
            entry.source,
            entry.uploaded_at,
            entry.row_count,
            entry.note,
        )
        .execute(self.mm.pool())
        .await
        .map_err(|e| PlannerError::UpstreamError {
            operation: "upload_history.record".into(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    async fn recent_uploads(&self, _ctx: &Ctx, limit: i64) -> PlannerResult<Vec<UploadHistoryEntry>> {
        let rows = sqlx::query_as!(
            DbUploadRow,
            r#"
select source, uploaded_at, row_count, note
  from upload_history
 order by uploaded_at desc
 limit $1
            "#,
            limit,
        )
        .fetch_all(self.mm.pool())
        .await
        .map_err(|e| PlannerError::UpstreamError {
            operation: "upload_history.recent".into(),
            message: e.to_string(),
        })?;

        Ok(rows.into_iter().map(UploadHistoryEntry::from).collect())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryFreshnessBmc {
    uploads: Arc<RwLock<Vec<UploadHistoryEntry>>>,
}

impl InMemoryFreshnessBmc {
    pub fn new(uploads: Vec<UploadHistoryEntry>) -> Self {
        Self {
            uploads: Arc::new(RwLock::new(uploads)),
        }
    }
}

#[async_trait]
impl FreshnessBmcTrait for InMemoryFreshnessBmc {
    async fn latest_by_source(&self, _ctx: &Ctx) -> PlannerResult<DataFreshnessReport> {
        let mut latest: std::collections::HashMap<String, DateTime<Utc>> = std::collections::HashMap::new();
        for entry in self.uploads.read().await.iter() {
            latest
                .entry(entry.source.clone())
                .and_modify(|ts| {
                    if entry.uploaded_at > *ts {
                        *ts = entry.uploaded_at;
                    }
                })
                .or_insert(entry.uploaded_at);
        }
        Ok(DataFreshnessReport { latest_by_source: latest })
    }

    async fn record_upload(&self, _ctx: &Ctx, entry: UploadHistoryEntry) -> PlannerResult<()> {
        self.uploads.write().await.push(entry);
        Ok(())
    }

    async fn recent_uploads(&self, _ctx: &Ctx, limit: i64) -> PlannerResult<Vec<UploadHistoryEntry>> {
        let mut uploads = self.uploads.read().await.clone();
        uploads.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        uploads.truncate(limit.max(0) as usize);
        Ok(uploads)
    }
}
