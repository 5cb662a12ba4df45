use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::Query;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tarragona_core::{export, recommendation};
use tarragona_domain::{FactoryId, PlannerError, ProductId, Sku};

use crate::error::ApiError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/factories", get(list_factories))
        .route("/factories/active", get(list_active_factories))
        .route("/factories/:id", get(get_factory))
        .route("/forward-simulation/horizon", get(default_horizon))
        .route("/forward-simulation/horizon/:factory_id", get(horizon_for_factory))
        .route("/order-builder", get(order_builder))
        .route("/order-builder/export", post(order_builder_export))
        .route("/intelligence/products", get(intelligence_products))
        .route("/intelligence/customers", get(intelligence_customers))
        .route("/intelligence/countries", get(intelligence_countries))
        .route("/intelligence/dashboard", get(intelligence_dashboard))
        .route("/pipeline/overview", get(pipeline_overview))
        .route("/dashboard/stockouts", get(dashboard_stockouts))
        .route("/data-freshness", get(data_freshness))
        .route("/data-freshness/upload-history", get(upload_history))
        .route("/diagnostics/data-quality", get(diagnostics_data_quality))
        .with_state(state)
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

async fn list_factories(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let ctx = tarragona_store::Ctx::new();
    let factories = state.core.bmc().factory.list(&ctx).await?;
    Ok(Json(factories))
}

async fn list_active_factories(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let ctx = tarragona_store::Ctx::new();
    let factories = state.core.bmc().factory.list_active(&ctx).await?;
    Ok(Json(factories))
}

async fn get_factory(State(state): State<AppState>, Path(id): Path<FactoryId>) -> Result<impl IntoResponse, ApiError> {
    let ctx = tarragona_store::Ctx::new();
    let factory = state.core.bmc().factory.get_by_id(&ctx, id).await?;
    Ok(Json(factory))
}

#[derive(Debug, Deserialize)]
struct HorizonQuery {
    #[serde(default)]
    months: Option<u32>,
}

fn validate_months(months: Option<u32>) -> Result<u32, ApiError> {
    let months = months.unwrap_or(3);
    if !(1..=12).contains(&months) {
        return Err(ApiError(PlannerError::Validation(format!("months must be in [1,12], got {months}"))));
    }
    Ok(months)
}

async fn default_horizon(State(state): State<AppState>, Query(q): Query<HorizonQuery>) -> Result<impl IntoResponse, ApiError> {
    let months = validate_months(q.months)?;
    let ctx = tarragona_store::Ctx::new();
    let factories = state.core.bmc().factory.list_active(&ctx).await?;
    let factory = factories
        .into_iter()
        .next()
        .ok_or_else(|| ApiError(PlannerError::NotFound("no active factory configured".to_string())))?;
    let horizon = state.core.simulate_horizon(&ctx, factory.id, months, today()).await?;
    Ok(Json(horizon))
}

async fn horizon_for_factory(State(state): State<AppState>, Path(factory_id): Path<FactoryId>, Query(q): Query<HorizonQuery>) -> Result<impl IntoResponse, ApiError> {
    let months = validate_months(q.months)?;
    let ctx = tarragona_store::Ctx::new();
    let horizon = state.core.simulate_horizon(&ctx, factory_id, months, today()).await?;
    Ok(Json(horizon))
}

#[derive(Debug, Deserialize)]
struct OrderBuilderQuery {
    boat_id: Option<tarragona_domain::BoatId>,
    #[serde(default)]
    num_bls: Option<u32>,
    #[serde(default)]
    excluded_skus: Vec<String>,
    factory_id: Option<FactoryId>,
}

async fn order_builder(State(state): State<AppState>, Query(q): Query<OrderBuilderQuery>) -> Result<impl IntoResponse, ApiError> {
    let num_bls = q.num_bls.unwrap_or(1);
    if !(1..=5).contains(&num_bls) {
        return Err(ApiError(PlannerError::Validation(format!("num_bls must be in [1,5], got {num_bls}"))));
    }

    let ctx = tarragona_store::Ctx::new();
    let factory_id = match q.factory_id {
        Some(id) => id,
        None => state
            .core
            .bmc()
            .factory
            .list_active(&ctx)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError(PlannerError::NotFound("no active factory configured".to_string())))?
            .id,
    };

    let excluded: Vec<Sku> = q.excluded_skus.into_iter().map(Sku).collect();
    let plan = state.core.order_builder_plan(&ctx, factory_id, q.boat_id, num_bls, &excluded, today()).await?;
    Ok(Json(plan))
}

#[derive(Debug, Deserialize)]
struct ExportLine {
    sku: String,
    pallets: Decimal,
}

#[derive(Debug, Deserialize)]
struct ExportRequest {
    products: Vec<ExportLine>,
    boat_departure: NaiveDate,
}

/// The request only carries `sku`/`pallets` (§6.1); the sheet's `format`
/// column is the trailing format token `normalize_sku` strips off, so it's
/// recovered here the same way rather than requiring the caller to repeat it.
fn format_suffix(raw: &str) -> String {
    match raw.rfind(' ') {
        Some(pos) if raw[pos + 1..].chars().any(|c| c.is_ascii_digit()) => raw[pos + 1..].to_string(),
        _ => String::new(),
    }
}

async fn order_builder_export(Json(req): Json<ExportRequest>) -> Result<impl IntoResponse, ApiError> {
    let order_date = today();
    let lines: Vec<(Sku, String, Decimal)> = req
        .products
        .into_iter()
        .map(|l| (Sku(l.sku.clone()), format_suffix(&l.sku), l.pallets * tarragona_domain::M2_PER_PALLET))
        .collect();
    let sheet = export::build_sheet(order_date, req.boat_departure, &lines);
    let bytes = export::render_xlsx(&sheet).map_err(|e| ApiError(PlannerError::Internal(e.to_string())))?;

    Ok((
        [
            ("content-type", "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
            ("content-disposition", "attachment; filename=\"pedido-tarragona.xlsx\""),
        ],
        bytes,
    ))
}

#[derive(Debug, Deserialize)]
struct IntelligenceQuery {
    #[serde(default = "default_period_days")]
    period_days: i64,
    #[serde(default = "default_comparison_days")]
    comparison_days: i64,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_period_days() -> i64 {
    90
}
fn default_comparison_days() -> i64 {
    90
}
fn default_limit() -> usize {
    20
}

#[derive(Debug, Serialize)]
struct ProductIntelligenceRow {
    product_id: ProductId,
    sku: Sku,
    daily_velocity_m2: Decimal,
    change_pct: Decimal,
    direction: tarragona_domain::TrendDirection,
    confidence: tarragona_domain::Confidence,
}

async fn intelligence_products(State(state): State<AppState>, Query(q): Query<IntelligenceQuery>) -> Result<impl IntoResponse, ApiError> {
    let ctx = tarragona_store::Ctx::new();
    let today = today();
    let products = state.core.bmc().product.list_active(&ctx).await?;
    let product_ids: Vec<_> = products.iter().map(|p| p.id).collect();
    let since = today - chrono::Duration::days(q.period_days.max(q.comparison_days));
    let sales = state.core.bmc().sales.history_since(&ctx, &product_ids, since).await?;

    let mut rows: Vec<ProductIntelligenceRow> = products
        .into_iter()
        .map(|p| {
            let trend = tarragona_core::velocity::analyze(p.id, sales.get(&p.id).map(Vec::as_slice).unwrap_or(&[]), today);
            ProductIntelligenceRow {
                product_id: p.id,
                sku: p.sku,
                daily_velocity_m2: trend.daily_velocity_m2,
                change_pct: trend.change_pct,
                direction: trend.direction,
                confidence: trend.confidence,
            }
        })
        .collect();
    rows.sort_by(|a, b| b.daily_velocity_m2.cmp(&a.daily_velocity_m2));
    rows.truncate(q.limit);
    Ok(Json(rows))
}

#[derive(Debug, Serialize)]
struct CustomerIntelligenceRow {
    customer: tarragona_domain::CustomerId,
    tier: tarragona_domain::CustomerTier,
    cumulative_revenue_share: Decimal,
}

async fn intelligence_customers(State(state): State<AppState>, Query(q): Query<IntelligenceQuery>) -> Result<impl IntoResponse, ApiError> {
    let ctx = tarragona_store::Ctx::new();
    let patterns = state.core.bmc().customer_pattern.list(&ctx).await?;
    let pairs: Vec<_> = patterns.iter().map(|c| (c.customer.clone(), c.cumulative_revenue_share)).collect();
    let mut tiers = tarragona_core::customer_pattern::assign_customer_tiers(&pairs);
    tiers.truncate(q.limit);
    let rows: Vec<CustomerIntelligenceRow> = tiers
        .into_iter()
        .map(|t| CustomerIntelligenceRow {
            customer: t.customer,
            tier: t.tier,
            cumulative_revenue_share: t.cumulative_revenue_share,
        })
        .collect();
    Ok(Json(rows))
}

/// No country dimension exists anywhere in this domain model (customers are
/// a bare `CustomerId`, not a structured address) — the route is wired per
/// §6.1 but always returns an empty aggregate rather than fabricate one.
async fn intelligence_countries(Query(_q): Query<IntelligenceQuery>) -> impl IntoResponse {
    Json(Vec::<serde_json::Value>::new())
}

#[derive(Debug, Serialize)]
struct DashboardIntelligence {
    total_active_products: usize,
    total_customers: usize,
    tier_a_customers: usize,
}

async fn intelligence_dashboard(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let ctx = tarragona_store::Ctx::new();
    let products = state.core.bmc().product.list_active(&ctx).await?;
    let patterns = state.core.bmc().customer_pattern.list(&ctx).await?;
    let tier_a = patterns.iter().filter(|c| c.tier == tarragona_domain::CustomerTier::A).count();
    Ok(Json(DashboardIntelligence {
        total_active_products: products.len(),
        total_customers: patterns.len(),
        tier_a_customers: tier_a,
    }))
}

#[derive(Debug, Serialize, Default)]
struct PipelineOverview {
    ordered: usize,
    shipped: usize,
    in_transit: usize,
    delivered_last_30d: usize,
}

async fn pipeline_overview(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let ctx = tarragona_store::Ctx::new();
    let today = today();
    let mut overview = PipelineOverview::default();

    for factory in state.core.bmc().factory.list_active(&ctx).await? {
        let boats = state
            .core
            .bmc()
            .boat
            .list_relevant(&ctx, &factory.origin_port, today - chrono::Duration::days(90), today + chrono::Duration::days(180))
            .await?;
        for boat in boats {
            for order in state.core.bmc().warehouse_order.list_for_boat(&ctx, boat.id).await.unwrap_or_default() {
                match order.status {
                    tarragona_domain::WarehouseOrderStatus::Pending => overview.ordered += 1,
                    tarragona_domain::WarehouseOrderStatus::Shipped => {
                        overview.shipped += 1;
                        overview.in_transit += 1;
                    }
                    tarragona_domain::WarehouseOrderStatus::Received => {
                        if (today - order.created_at.date_naive()).num_days() <= 30 {
                            overview.delivered_last_30d += 1;
                        }
                    }
                    tarragona_domain::WarehouseOrderStatus::Cancelled => {}
                }
            }
        }
    }

    Ok(Json(overview))
}

#[derive(Debug, Serialize)]
struct StockoutSummary {
    product_id: ProductId,
    days_to_stockout: Option<Decimal>,
    tier: tarragona_domain::PriorityTier,
}

async fn dashboard_stockouts(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let ctx = tarragona_store::Ctx::new();
    let today = today();
    let factories = state.core.bmc().factory.list_active(&ctx).await?;

    let mut summaries = Vec::new();
    for factory in factories {
        let horizon = state.core.simulate_horizon(&ctx, factory.id, 3, today).await?;
        let arrivals: Vec<NaiveDate> = horizon.boats.iter().map(|b| b.arrival_date).collect();
        for boat in &horizon.boats {
            for product in &boat.products {
                let days_to_stockout = product.days_of_stock_at_arrival;
                let stockout = recommendation::classify_stockout(product.product_id, days_to_stockout, &arrivals, today);
                summaries.push(StockoutSummary {
                    product_id: stockout.product_id,
                    days_to_stockout: stockout.days_to_stockout,
                    tier: stockout.tier,
                });
            }
        }
    }

    Ok(Json(summaries))
}

async fn data_freshness(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let ctx = tarragona_store::Ctx::new();
    let report = state.core.bmc().freshness.latest_by_source(&ctx).await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
struct UploadHistoryQuery {
    #[serde(default = "default_upload_limit")]
    limit: i64,
}

fn default_upload_limit() -> i64 {
    20
}

async fn upload_history(State(state): State<AppState>, Query(q): Query<UploadHistoryQuery>) -> Result<impl IntoResponse, ApiError> {
    if !(1..=100).contains(&q.limit) {
        return Err(ApiError(PlannerError::Validation(format!("limit must be in [1,100], got {}", q.limit))));
    }
    let ctx = tarragona_store::Ctx::new();
    let entries = state.core.bmc().freshness.recent_uploads(&ctx, q.limit).await?;
    Ok(Json(entries))
}

async fn diagnostics_data_quality(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let ctx = tarragona_store::Ctx::new();
    let report = state.core.diagnostics_report(&ctx, today()).await?;
    Ok(Json(report))
}
