use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, Pool, Postgres};
use std::time::Duration;
use tracing::log::LevelFilter;

#[derive(Clone)]
pub struct PgConnectionString(pub String);

#[derive(Clone, Debug)]
pub struct DbModelManager {
    pool: Pool<Postgres>,
}

impl DbModelManager {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

pub async fn get_pg_connection_pool(connection_string: PgConnectionString) -> anyhow::Result<Pool<Postgres>> {
    let connect_options: PgConnectOptions = connection_string
        .0
        .parse::<PgConnectOptions>()?
        .log_slow_statements(LevelFilter::Warn, Duration::from_secs(5));

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect_with(connect_options)
        .await?;

    Ok(pool)
}

pub async fn run_migrations(pool: &Pool<Postgres>) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
