pub mod constants;
pub mod draft;
pub mod error;
pub mod export;
pub mod factory_signal;
pub mod freshness;
pub mod ids;
pub mod inventory;
pub mod milestone;
pub mod order_builder;
pub mod product;
pub mod production;
pub mod projection;
pub mod recommendation;
pub mod sales;
pub mod shipping;
pub mod velocity;
pub mod warehouse_order;

pub use constants::*;
pub use draft::*;
pub use error::*;
pub use export::*;
pub use factory_signal::*;
pub use freshness::*;
pub use ids::*;
pub use inventory::*;
pub use milestone::*;
pub use order_builder::*;
pub use product::*;
pub use production::*;
pub use projection::*;
pub use recommendation::*;
pub use sales::*;
pub use shipping::*;
pub use velocity::*;
pub use warehouse_order::*;
