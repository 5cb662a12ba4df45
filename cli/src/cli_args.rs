/// Binary-edge configuration (teacher's `st-server/src/cli_args.rs`
/// pattern): a handful of required env vars read directly, rather than
/// folded into the `envy`-deserialized `PlannerConfig`, because they gate
/// *how* the process wires itself up (which store backend, where to bind)
/// rather than planning parameters.
pub struct AppConfig {
    pub database_url: Option<String>,
    pub use_in_memory_store: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenv::dotenv();

        let use_in_memory_store = std::env::var("TARRAGONA_IN_MEMORY_STORE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let database_url = std::env::var("DATABASE_URL").ok();

        if !use_in_memory_store && database_url.is_none() {
            return Err("DATABASE_URL is not set (or set TARRAGONA_IN_MEMORY_STORE=1 for a demo run)".to_string());
        }

        Ok(Self {
            database_url,
            use_in_memory_store,
        })
    }
}
