//! # Workbook Layout
//!
//! The spreadsheet kind has no pages:
//!
//! ```text
//!  row 0   │ [logo] Reporte de Productos (merged across all columns) │  title
//!  row 1   │ Generado: 05/03/2024 09:30 · 42 registros               │  subtitle
//!  row 2   │                                                         │
//!  row 3   │ ID │ Producto │ Categoría │ ...                         │  header
//!  row 4.. │ data rows, alternate fill by row index                  │
//! ```
//!
//! Column widths are the longest rendered string of the column plus two,
//! clamped to `8..=60` characters.
//!
//! [`WorkbookWriter`] writes rows in batches so a caller can yield between
//! them; [`write_workbook`] runs it to completion.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::branding::Branding;
use crate::error::ReportResult;
use crate::format;
use crate::pdf::ReportMeta;
use crate::schema::Table;

pub const TITLE_ROW: usize = 0;
pub const SUBTITLE_ROW: usize = 1;
pub const HEADER_ROW: usize = 3;
pub const FIRST_DATA_ROW: usize = 4;

pub const MIN_COLUMN_WIDTH: usize = 8;
pub const MAX_COLUMN_WIDTH: usize = 60;

/// Cell role, mapped to a style by the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellStyle {
    Title,
    Subtitle,
    Header,
    Body,
    /// Alternate row fill.
    Shaded,
}

pub trait Sheet {
    fn write(&mut self, row: usize, col: usize, value: &str, style: CellStyle);

    /// Merges `first_col..=last_col` of a row.
    fn merge(&mut self, row: usize, first_col: usize, last_col: usize);

    /// Width in characters.
    fn set_column_width(&mut self, col: usize, width: usize);

    fn image(&mut self, row: usize, col: usize, image: &Branding);

    /// Encodes the finished workbook.
    fn finish(self) -> ReportResult<Vec<u8>>
    where
        Self: Sized;
}

/// `clamp(longest + 2, 8, 60)`.
pub fn column_width(longest_chars: usize) -> usize {
    (longest_chars + 2).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH)
}

// =============================================================================
// Writer
// =============================================================================

/// Writes a table to a sheet, one batch of rows at a time.
pub struct WorkbookWriter<'t, S: Sheet> {
    sheet: S,
    table: &'t Table,
    next_row: usize,
    longest: Vec<usize>,
}

impl<'t, S: Sheet> WorkbookWriter<'t, S> {
    /// Writes the title, subtitle and header rows.
    pub fn start(mut sheet: S, table: &'t Table, meta: &ReportMeta, branding: Option<&Branding>) -> ReportResult<Self> {
        table.check()?;
        let last_col = table.column_count() - 1;

        if let Some(image) = branding {
            sheet.image(TITLE_ROW, 0, image);
        }
        sheet.write(TITLE_ROW, 0, &table.title, CellStyle::Title);
        sheet.merge(TITLE_ROW, 0, last_col);

        let subtitle = format!(
            "Generado: {} · {} registros",
            format::timestamp(meta.generated_at),
            table.rows.len()
        );
        sheet.write(SUBTITLE_ROW, 0, &subtitle, CellStyle::Subtitle);
        sheet.merge(SUBTITLE_ROW, 0, last_col);

        for (col, header) in table.headers.iter().enumerate() {
            sheet.write(HEADER_ROW, col, header, CellStyle::Header);
        }

        Ok(WorkbookWriter {
            sheet,
            table,
            next_row: 0,
            longest: table.headers.iter().map(|h| h.chars().count()).collect(),
        })
    }

    /// Writes up to `batch` data rows. Returns `true` while rows remain.
    pub fn write_batch(&mut self, batch: usize) -> bool {
        let end = (self.next_row + batch.max(1)).min(self.table.rows.len());

        for index in self.next_row..end {
            let style = if index % 2 == 1 { CellStyle::Shaded } else { CellStyle::Body };
            for (col, value) in self.table.rows[index].iter().enumerate() {
                self.sheet.write(FIRST_DATA_ROW + index, col, value, style);
                let len = value.chars().count();
                if len > self.longest[col] {
                    self.longest[col] = len;
                }
            }
        }

        self.next_row = end;
        self.next_row < self.table.rows.len()
    }

    pub fn rows_written(&self) -> usize {
        self.next_row
    }

    /// Applies the column widths and hands the sheet back.
    pub fn finish(mut self) -> S {
        for (col, longest) in self.longest.iter().enumerate() {
            self.sheet.set_column_width(col, column_width(*longest));
        }
        self.sheet
    }
}

/// Writes the whole table and returns the sheet.
pub fn write_workbook<S: Sheet>(
    sheet: S,
    table: &Table,
    meta: &ReportMeta,
    branding: Option<&Branding>,
    rows_per_batch: usize,
) -> ReportResult<S> {
    let mut writer = WorkbookWriter::start(sheet, table, meta, branding)?;
    while writer.write_batch(rows_per_batch) {}
    Ok(writer.finish())
}

// =============================================================================
// Recording Sheet
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedCell {
    pub value: String,
    pub style: CellStyle,
}

/// Sheet that keeps cells, merges and widths, and serializes them as JSON.
#[derive(Debug, Default, Serialize)]
pub struct RecordingSheet {
    /// Keyed by `(row, col)`.
    #[serde(serialize_with = "cells_as_list")]
    pub cells: BTreeMap<(usize, usize), RecordedCell>,
    pub merges: Vec<(usize, usize, usize)>,
    pub widths: BTreeMap<usize, usize>,
    pub images: Vec<(usize, usize, String)>,
}

fn cells_as_list<S: serde::Serializer>(
    cells: &BTreeMap<(usize, usize), RecordedCell>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    use serde::ser::SerializeSeq;

    let mut seq = serializer.serialize_seq(Some(cells.len()))?;
    for ((row, col), cell) in cells {
        seq.serialize_element(&(row, col, &cell.value, cell.style))?;
    }
    seq.end()
}

impl RecordingSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&RecordedCell> {
        self.cells.get(&(row, col))
    }
}

impl Sheet for RecordingSheet {
    fn write(&mut self, row: usize, col: usize, value: &str, style: CellStyle) {
        self.cells.insert(
            (row, col),
            RecordedCell {
                value: value.to_string(),
                style,
            },
        );
    }

    fn merge(&mut self, row: usize, first_col: usize, last_col: usize) {
        self.merges.push((row, first_col, last_col));
    }

    fn set_column_width(&mut self, col: usize, width: usize) {
        self.widths.insert(col, width);
    }

    fn image(&mut self, row: usize, col: usize, image: &Branding) {
        self.images.push((row, col, image.source.clone()));
    }

    fn finish(self) -> ReportResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(&self)?)
    }
}

// =============================================================================
// CSV Sheet
// =============================================================================

/// Spreadsheet-compatible CSV: UTF-8 BOM, `;` delimiter.
///
/// Only the header and data rows are emitted; title, subtitle, merges,
/// widths and images have no CSV equivalent.
#[derive(Debug, Default)]
pub struct CsvSheet {
    rows: BTreeMap<usize, BTreeMap<usize, String>>,
}

impl CsvSheet {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Sheet for CsvSheet {
    fn write(&mut self, row: usize, col: usize, value: &str, style: CellStyle) {
        if matches!(style, CellStyle::Title | CellStyle::Subtitle) {
            return;
        }
        self.rows.entry(row).or_default().insert(col, value.to_string());
    }

    fn merge(&mut self, _row: usize, _first_col: usize, _last_col: usize) {}

    fn set_column_width(&mut self, _col: usize, _width: usize) {}

    fn image(&mut self, _row: usize, _col: usize, _image: &Branding) {}

    fn finish(self) -> ReportResult<Vec<u8>> {
        let columns = self
            .rows
            .values()
            .filter_map(|cells| cells.keys().next_back())
            .max()
            .map(|last| last + 1)
            .unwrap_or(0);

        let mut out = "\u{FEFF}".as_bytes().to_vec();
        {
            let mut writer = csv::WriterBuilder::new().delimiter(b';').from_writer(&mut out);
            for cells in self.rows.values() {
                let record: Vec<&str> = (0..columns)
                    .map(|col| cells.get(&col).map(String::as_str).unwrap_or(""))
                    .collect();
                writer.write_record(&record)?;
            }
            writer.flush().map_err(csv::Error::from)?;
        }
        Ok(out)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn table() -> Table {
        Table {
            title: "Reporte de Clientes".into(),
            headers: vec!["ID".into(), "Nombre".into()],
            weights: vec![1.0, 2.0],
            rows: vec![
                vec!["1".into(), "Cliente Mostrador".into()],
                vec!["2".into(), "a".repeat(80)],
                vec!["3".into(), "Ana; \"la del 3\"".into()],
            ],
        }
    }

    fn meta() -> ReportMeta {
        ReportMeta {
            company: "Almacén".into(),
            generated_at: Utc.with_ymd_and_hms(2024, 3, 5, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_layout_rows() {
        let sheet = write_workbook(RecordingSheet::new(), &table(), &meta(), None, 200).unwrap();

        assert_eq!(sheet.cell(0, 0).unwrap().value, "Reporte de Clientes");
        assert_eq!(sheet.cell(1, 0).unwrap().value, "Generado: 05/03/2024 09:30 · 3 registros");
        assert_eq!(sheet.merges, vec![(0, 0, 1), (1, 0, 1)]);
        assert!(sheet.cell(2, 0).is_none());
        assert_eq!(sheet.cell(3, 1).unwrap().style, CellStyle::Header);
        assert_eq!(sheet.cell(4, 0).unwrap().style, CellStyle::Body);
        assert_eq!(sheet.cell(5, 0).unwrap().style, CellStyle::Shaded);
        assert_eq!(sheet.cell(6, 0).unwrap().style, CellStyle::Body);
    }

    #[test]
    fn test_column_widths_are_clamped() {
        let sheet = write_workbook(RecordingSheet::new(), &table(), &meta(), None, 200).unwrap();
        assert_eq!(sheet.widths[&0], 8);
        assert_eq!(sheet.widths[&1], 60);
        assert_eq!(column_width(20), 22);
    }

    #[test]
    fn test_batches() {
        let t = table();
        let mut writer = WorkbookWriter::start(RecordingSheet::new(), &t, &meta(), None).unwrap();
        assert!(writer.write_batch(2));
        assert_eq!(writer.rows_written(), 2);
        assert!(!writer.write_batch(2));
        let sheet = writer.finish();
        assert_eq!(sheet.cell(6, 0).unwrap().value, "3");
    }

    #[test]
    fn test_branding_image_is_placed() {
        let logo = Branding {
            source: "logo.png".into(),
            bytes: Vec::new(),
            width_px: 10,
            height_px: 10,
        };
        let sheet = write_workbook(RecordingSheet::new(), &table(), &meta(), Some(&logo), 200).unwrap();
        assert_eq!(sheet.images, vec![(0, 0, "logo.png".to_string())]);
    }

    #[test]
    fn test_csv_sheet() {
        let sheet = write_workbook(CsvSheet::new(), &table(), &meta(), None, 200).unwrap();
        let bytes = sheet.finish().unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.starts_with('\u{FEFF}'));
        let lines: Vec<&str> = text.trim_start_matches('\u{FEFF}').lines().collect();
        assert_eq!(lines[0], "ID;Nombre");
        assert_eq!(lines[1], "1;Cliente Mostrador");
        assert_eq!(lines[3], "3;\"Ana; \"\"la del 3\"\"\"");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_recording_sheet_json() {
        let sheet = write_workbook(RecordingSheet::new(), &table(), &meta(), None, 200).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&sheet.finish().unwrap()).unwrap();
        assert_eq!(json["cells"][0][2], "Reporte de Clientes");
        assert_eq!(json["widths"]["1"], 60);
    }
}
