pub mod error;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use state::AppState;

#[derive(OpenApi)]
#[openapi(info(title = "Tarragona Planner API", description = "Inventory-and-shipping forward planner for a floor-tile distributor"))]
struct ApiDoc;

/// Assembles the full HTTP surface (§6.1): every route behind `AppState`,
/// CORS + request tracing (teacher's `st-core` `tower-http` stack), and a
/// Swagger UI mounted at `/docs`.
pub fn build_router(state: AppState) -> Router {
    routes::router(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
