mod cli_args;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Deserialize;
use tarragona_core::{config::PlannerConfig, export, Core};
use tarragona_domain::Sku;
use tarragona_store::{get_pg_connection_pool, run_migrations, Bmc, Ctx, DbModelManager, PgConnectionString};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli_args::AppConfig;

/// Tarragona tile-planner CLI: runs the HTTP service, or exercises the
/// diagnostics/export paths directly without it (§A).
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP API (§6.1) on `api_host:api_port`.
    Serve,
    /// Run the structural diagnostics report (§4.10) and print it as JSON.
    Diagnostics,
    /// Build and render a factory-order XLSX (§6.2) from a JSON line list
    /// on stdin, shaped like the `POST /order-builder/export` body.
    Export {
        #[arg(long)]
        boat_departure: chrono::NaiveDate,
        #[arg(long, default_value = "pedido-tarragona.xlsx")]
        output: std::path::PathBuf,
    },
}

#[derive(Debug, Deserialize)]
struct ExportLine {
    sku: String,
    pallets: Decimal,
}

#[derive(Debug, Deserialize)]
struct ExportInput {
    products: Vec<ExportLine>,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(fmt::layer()).with(env_filter).try_init().ok();
}

async fn build_core(app_config: &AppConfig) -> Result<Core> {
    let planner_config = PlannerConfig::from_env().unwrap_or_default();

    let bmc = if app_config.use_in_memory_store {
        tracing::warn!("running with an in-memory store; nothing is persisted");
        Bmc::in_memory()
    } else {
        let database_url = app_config.database_url.clone().expect("validated by AppConfig::from_env");
        let pool = get_pg_connection_pool(PgConnectionString(database_url)).await.context("connect to postgres")?;
        run_migrations(&pool).await.context("run migrations")?;
        Bmc::from_pg(DbModelManager::new(pool))
    };

    Ok(Core::new(bmc, planner_config))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let app_config = AppConfig::from_env().map_err(anyhow::Error::msg)?;
    let args = Args::parse();

    match args.command {
        Command::Serve => {
            let core = build_core(&app_config).await?;
            let config = core.config().clone();
            let state = tarragona_http::AppState { core: Arc::new(core) };
            let app = tarragona_http::build_router(state);

            let addr = format!("{}:{}", config.api_host, config.api_port);
            let listener = tokio::net::TcpListener::bind(&addr).await.context("bind listener")?;
            tracing::info!(%addr, "listening");
            axum::serve(listener, app.into_make_service()).await.context("serve")?;
        }
        Command::Diagnostics => {
            let core = build_core(&app_config).await?;
            let ctx = Ctx::new();
            let report = core.diagnostics_report(&ctx, Utc::now().date_naive()).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Export { boat_departure, output } => {
            let input: ExportInput = serde_json::from_reader(std::io::stdin()).context("read product list from stdin")?;
            let order_date = Utc::now().date_naive();
            let lines: Vec<(Sku, String, Decimal)> = input
                .products
                .into_iter()
                .map(|l| (Sku(l.sku), String::new(), l.pallets * tarragona_domain::M2_PER_PALLET))
                .collect();
            let sheet = export::build_sheet(order_date, boat_departure, &lines);
            let bytes = export::render_xlsx(&sheet).context("render xlsx")?;
            std::fs::write(&output, bytes).with_context(|| format!("write {}", output.display()))?;
            tracing::info!(path = %output.display(), "wrote factory-order sheet");
        }
    }

    Ok(())
}
