pub mod customer_pattern_bmc;
pub mod draft_bmc;
pub mod factory_bmc;
pub mod freshness_bmc;
pub mod inventory_bmc;
pub mod product_bmc;
pub mod production_bmc;
pub mod sales_bmc;
pub mod shipping_bmc;
pub mod warehouse_order_bmc;

pub use customer_pattern_bmc::{CustomerPatternBmcTrait, DbCustomerPatternBmc, InMemoryCustomerPatternBmc};
pub use draft_bmc::{DbDraftBmc, DraftBmcTrait, InMemoryDraftBmc};
pub use factory_bmc::{DbFactoryBmc, FactoryBmcTrait, InMemoryFactoryBmc};
pub use freshness_bmc::{DbFreshnessBmc, FreshnessBmcTrait, InMemoryFreshnessBmc};
pub use inventory_bmc::{DbInventoryBmc, InMemoryInventoryBmc, InventoryBmcTrait};
pub use product_bmc::{DbProductBmc, InMemoryProductBmc, ProductBmcTrait};
pub use production_bmc::{DbProductionBmc, InMemoryProductionBmc, ProductionBmcTrait};
pub use sales_bmc::{DbSalesBmc, InMemorySalesBmc, SalesBmcTrait};
pub use shipping_bmc::{
    BoatBmcTrait, DbBoatBmc, DbShippingRouteBmc, InMemoryBoatBmc, InMemoryShippingRouteBmc, ShippingRouteBmcTrait,
};
pub use warehouse_order_bmc::{DbWarehouseOrderBmc, InMemoryWarehouseOrderBmc, WarehouseOrderBmcTrait};

use crate::db_model_manager::DbModelManager;
use std::sync::Arc;

/// Bundles one BMC per entity behind trait objects, mirroring the teacher's
/// aggregate `Bmc` (st-store/src/bmc/mod.rs). `tarragona-core` depends only
/// on this trait set, never on a concrete store backend.
#[derive(Clone)]
pub struct Bmc {
    pub product: Arc<dyn ProductBmcTrait>,
    pub factory: Arc<dyn FactoryBmcTrait>,
    pub inventory: Arc<dyn InventoryBmcTrait>,
    pub sales: Arc<dyn SalesBmcTrait>,
    pub production: Arc<dyn ProductionBmcTrait>,
    pub shipping_route: Arc<dyn ShippingRouteBmcTrait>,
    pub boat: Arc<dyn BoatBmcTrait>,
    pub draft: Arc<dyn DraftBmcTrait>,
    pub warehouse_order: Arc<dyn WarehouseOrderBmcTrait>,
    pub customer_pattern: Arc<dyn CustomerPatternBmcTrait>,
    pub freshness: Arc<dyn FreshnessBmcTrait>,
}

impl Bmc {
    pub fn from_pg(mm: DbModelManager) -> Self {
        Self {
            product: Arc::new(DbProductBmc { mm: mm.clone() }),
            factory: Arc::new(DbFactoryBmc { mm: mm.clone() }),
            inventory: Arc::new(DbInventoryBmc { mm: mm.clone() }),
            sales: Arc::new(DbSalesBmc { mm: mm.clone() }),
            production: Arc::new(DbProductionBmc { mm: mm.clone() }),
            shipping_route: Arc::new(DbShippingRouteBmc { mm: mm.clone() }),
            boat: Arc::new(DbBoatBmc { mm: mm.clone() }),
            draft: Arc::new(DbDraftBmc { mm: mm.clone() }),
            warehouse_order: Arc::new(DbWarehouseOrderBmc { mm: mm.clone() }),
            customer_pattern: Arc::new(DbCustomerPatternBmc { mm: mm.clone() }),
            freshness: Arc::new(DbFreshnessBmc { mm }),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            product: Arc::new(InMemoryProductBmc::default()),
            factory: Arc::new(InMemoryFactoryBmc::default()),
            inventory: Arc::new(InMemoryInventoryBmc::default()),
            sales: Arc::new(InMemorySalesBmc::default()),
            production: Arc::new(InMemoryProductionBmc::default()),
            shipping_route: Arc::new(InMemoryShippingRouteBmc::default()),
            boat: Arc::new(InMemoryBoatBmc::default()),
            draft: Arc::new(InMemoryDraftBmc::default()),
            warehouse_order: Arc::new(InMemoryWarehouseOrderBmc::default()),
            customer_pattern: Arc::new(InMemoryCustomerPatternBmc::default()),
            freshness: Arc::new(InMemoryFreshnessBmc::default()),
        }
    }
}
