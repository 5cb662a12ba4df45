pub mod bmc;
pub mod ctx;
pub mod db_model_manager;

pub use bmc::Bmc;
pub use ctx::Ctx;
pub use db_model_manager::{get_pg_connection_pool, run_migrations, DbModelManager, PgConnectionString};
