//! # Console
//!
//! Owns one [`ResourceSync`] per collection. All of them share a single
//! transport built from the configuration.

use std::sync::Arc;

use almacen_core::aggregation::{Dashboard, DEFAULT_TOP_N};
use almacen_core::{Category, Client, Product, Purchase, Sale, Supplier};
use tracing::info;

use crate::config::ConsoleConfig;
use crate::error::SyncResult;
use crate::resource::ResourceSync;
use crate::transport::{HttpTransport, ReqwestTransport};

/// Every collection the console works with.
#[derive(Clone)]
pub struct Console {
    config: Arc<ConsoleConfig>,
    pub categories: ResourceSync<Category>,
    pub clients: ResourceSync<Client>,
    pub suppliers: ResourceSync<Supplier>,
    pub products: ResourceSync<Product>,
    pub sales: ResourceSync<Sale>,
    pub purchases: ResourceSync<Purchase>,
}

impl Console {
    /// Builds the HTTP transport from `config.api`.
    pub fn connect(config: Arc<ConsoleConfig>) -> SyncResult<Self> {
        let transport = ReqwestTransport::new(&config.api)?;
        info!(base_url = %transport.base_url(), "Console connected");
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: Arc<ConsoleConfig>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            config,
            categories: ResourceSync::new(Arc::clone(&transport)),
            clients: ResourceSync::new(Arc::clone(&transport)),
            suppliers: ResourceSync::new(Arc::clone(&transport)),
            products: ResourceSync::new(Arc::clone(&transport)),
            sales: ResourceSync::new(Arc::clone(&transport)),
            purchases: ResourceSync::new(transport),
        }
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    /// Loads the collections the dashboard reads, concurrently.
    pub async fn load_dashboard_sources(&self) -> SyncResult<()> {
        tokio::try_join!(
            self.products.load(),
            self.suppliers.load(),
            self.purchases.load(),
            self.sales.load(),
        )?;
        Ok(())
    }

    /// Dashboard over the current snapshots.
    pub async fn dashboard(&self) -> Dashboard {
        self.dashboard_top(DEFAULT_TOP_N).await
    }

    pub async fn dashboard_top(&self, top_n: usize) -> Dashboard {
        let products = self.products.snapshot().await;
        let suppliers = self.suppliers.snapshot().await;
        let purchases = self.purchases.snapshot().await;
        let sales = self.sales.snapshot().await;

        Dashboard::compute(&products, &suppliers, &purchases, &sales, top_n)
    }
}
