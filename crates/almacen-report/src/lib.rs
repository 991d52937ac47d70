//! # almacen-report: Report Exporter
//!
//! Lays normalized collections out as paginated documents and workbooks.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  almacen-core snapshots (&[Product], &[Client], ...)                   │
//! │                    │                                                    │
//! │  ┌─────────────────▼───────────────────────────────────────────────┐   │
//! │  │              ★ almacen-report (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   schema ──► Table ──┬──► pdf   (PageIter ──► Canvas)           │   │
//! │  │                      └──► sheet (WorkbookWriter ──► Sheet)      │   │
//! │  │                                                                 │   │
//! │  │   branding (optional, never fatal)   export (name + save)       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                    │                                                    │
//! │                    ▼                                                    │
//! │     {entity}-{YYYY-MM-DD}.{ext} in the export directory                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Drawing primitives stay abstract ([`canvas::Canvas`], [`sheet::Sheet`]);
//! the crate ships recording sinks and a CSV sink.

pub mod branding;
pub mod canvas;
pub mod error;
pub mod export;
pub mod format;
pub mod pdf;
pub mod schema;
pub mod sheet;

pub use error::{ReportError, ReportResult};
pub use export::{ExportKind, ExportOptions, ReportExporter};
pub use schema::{Schema, Table};
