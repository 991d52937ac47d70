//! # almacen-sync: Resource Synchronizer
//!
//! Keeps the console's collections in step with the REST backend.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   apps/console                                                          │
//! │        │ Arc<ConsoleConfig>                                             │
//! │  ┌─────▼───────────────────────────────────────────────────────────┐   │
//! │  │              ★ almacen-sync (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   Console ──► ResourceSync<Category>  ─┐                        │   │
//! │  │           ──► ResourceSync<Client>    ─┤                        │   │
//! │  │           ──► ResourceSync<Supplier>  ─┤                        │   │
//! │  │           ──► ResourceSync<Product>   ─┼──► dyn HttpTransport   │   │
//! │  │           ──► ResourceSync<Sale>      ─┤    (ReqwestTransport)  │   │
//! │  │           ──► ResourceSync<Purchase>  ─┘                        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │        │ JSON (backend field names)       ▲ canonical records           │
//! │        ▼                                  │ (almacen-core normalizer)   │
//! │   REST backend  GET/POST /{resource}, GET/PUT/DELETE /{resource}/{id}   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Console configuration (TOML + environment)
//! - [`transport`] - HTTP capability, reqwest implementation, abort signals
//! - [`endpoint`] - Paths and response envelopes per collection
//! - [`resource`] - Per-collection cache, load ordering, mutations
//! - [`console`] - One synchronizer per collection
//! - [`error`] - Sync error types

pub mod config;
pub mod console;
pub mod endpoint;
pub mod error;
pub mod resource;
pub mod transport;

pub use config::ConsoleConfig;
pub use console::Console;
pub use endpoint::Endpoint;
pub use error::{SyncError, SyncResult};
pub use resource::{MutationMode, ResourceSync};
pub use transport::{HttpTransport, ReqwestTransport};
