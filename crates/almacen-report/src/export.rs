//! # Export
//!
//! Ties schemas, layouts and sinks together and saves the result.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Schema<T> + &[T] ──render──► Table                                    │
//! │                                 │                                       │
//! │            ┌────────────────────┼─────────────────────┐                 │
//! │            ▼                    ▼                     ▼                 │
//! │      render_pdf           write_workbook        write_workbook          │
//! │   (RecordingCanvas)      (RecordingSheet)         (CsvSheet)            │
//! │            │                    │                     │                 │
//! │            └────────── bytes ───┴─────────────────────┘                 │
//! │                          │                                              │
//! │                          ▼                                              │
//! │     save_export: {entity}-{YYYY-MM-DD}.{ext}                           │
//! │     written to `.{name}.tmp`, then renamed into place                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failure anywhere before the rename leaves no file under the final name.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::branding::{load_branding, Branding};
use crate::canvas::{Canvas, RecordingCanvas};
use crate::error::{ReportError, ReportResult};
use crate::pdf::{render_pdf, PageGeometry, ReportMeta};
use crate::schema::Schema;
use crate::sheet::{write_workbook, CsvSheet, RecordingSheet, Sheet};

/// Output kind of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportKind {
    /// Paginated document, recorded as drawing operations.
    Pdf,
    /// Workbook, recorded as cells.
    Workbook,
    /// Spreadsheet-compatible CSV.
    Csv,
}

impl ExportKind {
    /// File extension. Recorded layouts carry a `.json` suffix because the
    /// bytes are the layout interchange format, not an encoded document.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportKind::Pdf => "pdf.json",
            ExportKind::Workbook => "xlsx.json",
            ExportKind::Csv => "csv",
        }
    }
}

/// `{entity}-{YYYY-MM-DD}.{ext}`
///
/// ```rust
/// use almacen_report::export::{export_filename, ExportKind};
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
/// assert_eq!(export_filename("productos", ExportKind::Csv, date), "productos-2024-03-05.csv");
/// ```
pub fn export_filename(entity: &str, kind: ExportKind, date: NaiveDate) -> String {
    format!("{}-{}.{}", entity, date.format("%Y-%m-%d"), kind.extension())
}

/// Writes the export atomically and returns its path.
pub fn save_export(dir: &Path, entity: &str, kind: ExportKind, date: NaiveDate, bytes: &[u8]) -> ReportResult<PathBuf> {
    fs::create_dir_all(dir).map_err(|source| ReportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let name = export_filename(entity, kind, date);
    let target = dir.join(&name);
    let temp = dir.join(format!(".{}.tmp", name));

    let written = fs::File::create(&temp)
        .and_then(|mut file| {
            file.write_all(bytes)?;
            file.sync_all()
        })
        .and_then(|_| fs::rename(&temp, &target));

    if let Err(source) = written {
        if let Err(e) = fs::remove_file(&temp) {
            debug!(path = %temp.display(), error = %e, "No temporary export to clean up");
        }
        return Err(ReportError::Io { path: target, source });
    }

    info!(path = %target.display(), bytes = bytes.len(), "Export written");
    Ok(target)
}

// =============================================================================
// Exporter
// =============================================================================

/// Export settings, resolved from the console configuration.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub output_dir: PathBuf,
    pub company_name: String,
    pub branding_image: Option<PathBuf>,
    pub rows_per_batch: usize,
    pub geometry: PageGeometry,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            output_dir: PathBuf::from("."),
            company_name: "Almacén".to_string(),
            branding_image: None,
            rows_per_batch: 200,
            geometry: PageGeometry::default(),
        }
    }
}

/// Renders and saves reports.
#[derive(Debug, Clone)]
pub struct ReportExporter {
    options: ExportOptions,
}

impl ReportExporter {
    pub fn new(options: ExportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Renders the rows to bytes of the given kind.
    pub fn render<T>(&self, schema: &Schema<T>, rows: &[T], kind: ExportKind, now: DateTime<Utc>) -> ReportResult<Vec<u8>> {
        let table = schema.render(rows)?;
        let meta = ReportMeta {
            company: self.options.company_name.clone(),
            generated_at: now,
        };
        let branding = self.branding();

        match kind {
            ExportKind::Pdf => {
                let mut canvas = RecordingCanvas::new();
                let pages = render_pdf(&mut canvas, &table, &meta, self.options.geometry, branding.as_ref())?;
                debug!(entity = schema.entity, pages, rows = rows.len(), "Document laid out");
                canvas.finish()
            }
            ExportKind::Workbook => self.workbook(RecordingSheet::new(), &table, &meta, branding.as_ref()),
            ExportKind::Csv => self.workbook(CsvSheet::new(), &table, &meta, branding.as_ref()),
        }
    }

    /// Renders and saves; returns the written path.
    pub fn export<T>(&self, schema: &Schema<T>, rows: &[T], kind: ExportKind, now: DateTime<Utc>) -> ReportResult<PathBuf> {
        let bytes = self.render(schema, rows, kind, now).inspect_err(|e| {
            warn!(entity = schema.entity, error = %e, "Export aborted");
        })?;
        save_export(&self.options.output_dir, schema.entity, kind, now.date_naive(), &bytes)
    }

    fn workbook<S: Sheet>(
        &self,
        sheet: S,
        table: &crate::schema::Table,
        meta: &ReportMeta,
        branding: Option<&Branding>,
    ) -> ReportResult<Vec<u8>> {
        write_workbook(sheet, table, meta, branding, self.options.rows_per_batch)?.finish()
    }

    fn branding(&self) -> Option<Branding> {
        load_branding(self.options.branding_image.as_deref())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
