//! # Paginated Document Layout
//!
//! Lays a [`Table`] out on A4 landscape pages and draws it on a [`Canvas`].
//!
//! ## Page Anatomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │ margin                                                                  │
//! │  ┌───────────────────────────────────────────────────────────────────┐  │
//! │  │ [logo]  Company · Title                  Generado: dd/mm/yyyy    │  │ header band
//! │  │ ┌────────┬──────────────┬─────────┬──────────┐                   │  │ (identical
//! │  │ │ ID     │ Producto     │ Stock   │ Precio   │ ◄ column headers  │  │  on every page)
//! │  ├─┴────────┴──────────────┴─────────┴──────────┴───────────────────┤  │
//! │  │ row 0                                                             │  │
//! │  │░row 1░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░░│  │ shading by
//! │  │ row 2 (two-line description makes the whole row taller)           │  │ absolute row
//! │  │       ...                                                         │  │ index parity
//! │  ├───────────────────────────────────────────────────────────────────┤  │
//! │  │                                                 Página 1 de 3     │  │ footer band
//! │  └───────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## State Machine
//! ```text
//!   PageOpen ──► RowsFilling ──► PageBreakNeeded ──► PageOpen (next page)
//!                     │
//!                     └──(rows exhausted)──► Finalized
//! ```
//!
//! [`PageIter`] yields one laid-out page at a time so callers can yield
//! between pages; [`PdfLayout::pages`] restarts it. The footer needs the
//! total page count, so [`render_pdf`] draws all pages first and then
//! revisits each one to write "Página X de N".

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::branding::Branding;
use crate::canvas::{Canvas, Fill, TextStyle};
use crate::error::{ReportError, ReportResult};
use crate::format;
use crate::schema::Table;

// =============================================================================
// Geometry
// =============================================================================

/// Page geometry in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageGeometry {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub header_band: f32,
    pub footer_band: f32,
    pub line_height: f32,
    pub cell_padding: f32,
    /// Average glyph width used to derive characters per line.
    pub mm_per_char: f32,
}

impl Default for PageGeometry {
    /// A4 landscape.
    fn default() -> Self {
        PageGeometry {
            page_width: 297.0,
            page_height: 210.0,
            margin: 12.0,
            header_band: 28.0,
            footer_band: 10.0,
            line_height: 5.0,
            cell_padding: 1.5,
            mm_per_char: 2.0,
        }
    }
}

impl PageGeometry {
    pub fn printable_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }

    /// First y available for rows.
    pub fn body_top(&self) -> f32 {
        self.margin + self.header_band
    }

    /// Last y available for rows.
    pub fn body_bottom(&self) -> f32 {
        self.page_height - self.margin - self.footer_band
    }

    pub fn row_height(&self, lines: usize) -> f32 {
        lines.max(1) as f32 * self.line_height + 2.0 * self.cell_padding
    }

    /// Text lines a single row may hold and still fit on an empty page.
    pub fn max_row_lines(&self) -> usize {
        let body = self.body_bottom() - self.body_top() - 2.0 * self.cell_padding;
        ((body / self.line_height).floor() as usize).max(1)
    }

    /// Characters that fit on one line of a column.
    pub fn chars_per_line(&self, column_width: f32) -> usize {
        (((column_width - 2.0 * self.cell_padding) / self.mm_per_char).floor() as usize).max(1)
    }

    fn check(&self) -> ReportResult<()> {
        if self.body_bottom() - self.body_top() < self.row_height(1) {
            return Err(ReportError::InvalidGeometry(format!(
                "body height {:.1}mm cannot hold a single row",
                self.body_bottom() - self.body_top()
            )));
        }
        if self.printable_width() <= 0.0 {
            return Err(ReportError::InvalidGeometry("no printable width".to_string()));
        }
        Ok(())
    }
}

// =============================================================================
// Layout
// =============================================================================

/// Where [`PageIter`] stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutState {
    PageOpen,
    RowsFilling,
    PageBreakNeeded,
    Finalized,
}

/// A row placed on a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowLayout {
    /// Index in the whole table, not on the page.
    pub index: usize,
    pub y: f32,
    pub height: f32,
    pub shaded: bool,
    /// Wrapped lines per cell.
    pub cells: Vec<Vec<String>>,
}

/// One laid-out page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageLayout {
    pub index: usize,
    pub rows: Vec<RowLayout>,
}

/// Column widths and geometry for one table.
#[derive(Debug, Clone)]
pub struct PdfLayout<'t> {
    table: &'t Table,
    geometry: PageGeometry,
    widths: Vec<f32>,
}

impl<'t> PdfLayout<'t> {
    pub fn new(table: &'t Table, geometry: PageGeometry) -> ReportResult<Self> {
        table.check()?;
        geometry.check()?;

        let total: f32 = table.weights.iter().sum();
        let widths = table
            .weights
            .iter()
            .map(|w| geometry.printable_width() * w / total)
            .collect();

        Ok(PdfLayout {
            table,
            geometry,
            widths,
        })
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    /// Column widths in millimetres.
    pub fn widths(&self) -> &[f32] {
        &self.widths
    }

    /// A fresh iterator over the pages.
    pub fn pages(&self) -> PageIter<'_, 't> {
        PageIter {
            layout: self,
            next_row: 0,
            next_page: 0,
            state: LayoutState::PageOpen,
        }
    }

    /// Wraps every cell of a row; the row is as tall as its tallest cell.
    ///
    /// Cells longer than a page body are cut and end in `…`.
    fn layout_row(&self, index: usize, y: f32) -> RowLayout {
        let max_lines = self.geometry.max_row_lines();
        let mut cells: Vec<Vec<String>> = Vec::with_capacity(self.widths.len());
        for (text, width) in self.table.rows[index].iter().zip(&self.widths) {
            let chars = self.geometry.chars_per_line(*width);
            let mut lines = format::wrap(text, chars);
            if lines.len() > max_lines {
                warn!(row = index, lines = lines.len(), max_lines, "Cell taller than a page, truncated");
                lines.truncate(max_lines);
                if let Some(last) = lines.last_mut() {
                    let mut cut: String = last.chars().take(chars.saturating_sub(1)).collect();
                    cut.push('…');
                    *last = cut;
                }
            }
            cells.push(lines);
        }
        let lines = cells.iter().map(Vec::len).max().unwrap_or(1);

        RowLayout {
            index,
            y,
            height: self.geometry.row_height(lines),
            shaded: index % 2 == 1,
            cells,
        }
    }
}

/// Yields one page at a time.
pub struct PageIter<'l, 't> {
    layout: &'l PdfLayout<'t>,
    next_row: usize,
    next_page: usize,
    state: LayoutState,
}

impl PageIter<'_, '_> {
    pub fn state(&self) -> LayoutState {
        self.state
    }
}

impl Iterator for PageIter<'_, '_> {
    type Item = PageLayout;

    fn next(&mut self) -> Option<PageLayout> {
        if self.state == LayoutState::Finalized {
            return None;
        }

        self.state = LayoutState::PageOpen;
        let geometry = self.layout.geometry;
        let total_rows = self.layout.table.rows.len();
        let mut page = PageLayout {
            index: self.next_page,
            rows: Vec::new(),
        };
        let mut y = geometry.body_top();

        while self.next_row < total_rows {
            let row = self.layout.layout_row(self.next_row, y);
            // Rows never exceed a page body, so the first row of a page always fits.
            if y + row.height > geometry.body_bottom() && !page.rows.is_empty() {
                self.state = LayoutState::PageBreakNeeded;
                break;
            }
            y += row.height;
            page.rows.push(row);
            self.next_row += 1;
            self.state = LayoutState::RowsFilling;
        }

        if self.next_row >= total_rows {
            self.state = LayoutState::Finalized;
        }
        self.next_page += 1;
        Some(page)
    }
}

// =============================================================================
// Rendering
// =============================================================================

/// Header metadata shared by every page.
#[derive(Debug, Clone)]
pub struct ReportMeta {
    pub company: String,
    pub generated_at: DateTime<Utc>,
}

/// Draws the table on the canvas. Returns the page count.
pub fn render_pdf<C: Canvas>(
    canvas: &mut C,
    table: &Table,
    meta: &ReportMeta,
    geometry: PageGeometry,
    branding: Option<&Branding>,
) -> ReportResult<usize> {
    let layout = PdfLayout::new(table, geometry)?;

    // The canvas may already hold pages of an earlier document.
    let first = canvas.page_count();
    let mut total = 0;
    for page in layout.pages() {
        canvas.add_page(geometry.page_width, geometry.page_height);
        draw_header_band(canvas, &layout, meta, branding);
        for row in &page.rows {
            draw_row(canvas, &layout, row);
        }
        total += 1;
    }

    // Second pass: the total is known only now.
    for page in 0..total {
        canvas.set_page(first + page);
        draw_footer(canvas, &geometry, page + 1, total);
    }

    Ok(total)
}

fn draw_header_band<C: Canvas>(canvas: &mut C, layout: &PdfLayout<'_>, meta: &ReportMeta, branding: Option<&Branding>) {
    let g = layout.geometry();
    let logo_height = 12.0;
    let mut title_x = g.margin;

    if let Some(image) = branding {
        let width = image.width_for_height(logo_height);
        canvas.image(g.margin, g.margin, width, logo_height, image);
        title_x += width + 4.0;
    }

    canvas.text(title_x, g.margin + 5.0, &meta.company, TextStyle::Subtitle);
    canvas.text(title_x, g.margin + 11.0, &layout.table.title, TextStyle::Title);
    canvas.text(
        g.page_width - g.margin - 50.0,
        g.margin + 5.0,
        &format!("Generado: {}", format::timestamp(meta.generated_at)),
        TextStyle::Subtitle,
    );

    let header_y = g.body_top() - g.row_height(1);
    let mut x = g.margin;
    for (header, width) in layout.table.headers.iter().zip(layout.widths()) {
        canvas.rect(x, header_y, *width, g.row_height(1), Fill::Header);
        canvas.text(x + g.cell_padding, header_y + g.cell_padding + g.line_height, header, TextStyle::Header);
        x += width;
    }
}

fn draw_row<C: Canvas>(canvas: &mut C, layout: &PdfLayout<'_>, row: &RowLayout) {
    let g = layout.geometry();

    if row.shaded {
        canvas.rect(g.margin, row.y, g.printable_width(), row.height, Fill::Shade);
    }

    let mut x = g.margin;
    for (lines, width) in row.cells.iter().zip(layout.widths()) {
        for (i, line) in lines.iter().enumerate() {
            let y = row.y + g.cell_padding + g.line_height * (i as f32 + 1.0);
            canvas.text(x + g.cell_padding, y, line, TextStyle::Body);
        }
        x += width;
    }
}

fn draw_footer<C: Canvas>(canvas: &mut C, g: &PageGeometry, page: usize, total: usize) {
    canvas.text(
        g.page_width - g.margin - 30.0,
        g.page_height - g.margin - g.footer_band / 2.0,
        &format!("Página {} de {}", page, total),
        TextStyle::Footer,
    );
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{DrawOp, RecordingCanvas};
    use chrono::TimeZone;

    fn table(rows: usize) -> Table {
        Table {
            title: "Reporte de Productos".into(),
            headers: vec!["ID".into(), "Descripción".into()],
            weights: vec![1.0, 3.0],
            rows: (0..rows).map(|i| vec![i.to_string(), format!("Producto {}", i)]).collect(),
        }
    }

    fn meta() -> ReportMeta {
        ReportMeta {
            company: "Almacén".into(),
            generated_at: Utc.with_ymd_and_hms(2024, 3, 5, 9, 30, 0).unwrap(),
        }
    }

    /// Ops drawn before the first body row: the header band.
    fn header_ops(page: &[DrawOp], body_top: f32) -> Vec<DrawOp> {
        page.iter()
            .take_while(|op| match op {
                DrawOp::Text { y, style, .. } => *style != TextStyle::Body && *y <= body_top,
                DrawOp::Rect { fill, .. } => *fill == Fill::Header,
                DrawOp::Image { .. } => true,
            })
            .cloned()
            .collect()
    }

    #[test]
    fn test_rows_fit_in_one_page() {
        let t = table(3);
        let layout = PdfLayout::new(&t, PageGeometry::default()).unwrap();
        let pages: Vec<PageLayout> = layout.pages().collect();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].rows.len(), 3);
    }

    #[test]
    fn test_empty_table_still_has_a_page() {
        let t = table(0);
        let layout = PdfLayout::new(&t, PageGeometry::default()).unwrap();
        let mut pages = layout.pages();
        assert_eq!(pages.state(), LayoutState::PageOpen);
        assert!(pages.next().unwrap().rows.is_empty());
        assert_eq!(pages.state(), LayoutState::Finalized);
        assert!(pages.next().is_none());
    }

    #[test]
    fn test_page_break_and_state() {
        // body = 210 - 24 - 28 - 10 = 148mm; one-line rows are 8mm → 18 per page.
        let t = table(40);
        let layout = PdfLayout::new(&t, PageGeometry::default()).unwrap();
        let mut pages = layout.pages();

        let first = pages.next().unwrap();
        assert_eq!(first.rows.len(), 18);
        assert_eq!(pages.state(), LayoutState::PageBreakNeeded);

        let rest: Vec<PageLayout> = pages.collect();
        assert_eq!(rest.len(), 2);
        assert_eq!(rest[0].rows[0].index, 18);
        assert_eq!(rest[1].rows.last().unwrap().index, 39);

        // Restartable.
        assert_eq!(layout.pages().count(), 3);
    }

    #[test]
    fn test_row_height_follows_tallest_cell() {
        let mut t = table(2);
        t.rows[1][1] = "palabra ".repeat(60);
        let layout = PdfLayout::new(&t, PageGeometry::default()).unwrap();
        let page = layout.pages().next().unwrap();

        let tall = &page.rows[1];
        assert!(tall.cells[1].len() > 1);
        assert_eq!(tall.cells[0].len(), 1);
        assert_eq!(tall.height, PageGeometry::default().row_height(tall.cells[1].len()));
        assert_eq!(page.rows[0].height, PageGeometry::default().row_height(1));
    }

    #[test]
    fn test_shading_uses_absolute_index() {
        let t = table(40);
        let layout = PdfLayout::new(&t, PageGeometry::default()).unwrap();
        for page in layout.pages() {
            for row in page.rows {
                assert_eq!(row.shaded, row.index % 2 == 1);
            }
        }
    }

    #[test]
    fn test_render_repeats_header_and_numbers_pages() {
        let t = table(40);
        let mut canvas = RecordingCanvas::new();
        let total = render_pdf(&mut canvas, &t, &meta(), PageGeometry::default(), None).unwrap();
        assert_eq!(total, 3);
        assert!(total >= 2);

        let body_top = PageGeometry::default().body_top();
        let first_header = header_ops(&canvas.pages[0].ops, body_top);
        assert!(first_header.len() >= 5);
        for page in &canvas.pages[1..] {
            assert_eq!(header_ops(&page.ops, body_top), first_header);
        }

        for (i, _) in canvas.pages.iter().enumerate() {
            let footer = format!("Página {} de 3", i + 1);
            assert!(canvas.texts(i).contains(&footer.as_str()), "missing footer on page {}", i);
        }
    }

    #[test]
    fn test_render_with_branding_draws_image_on_every_page() {
        let t = table(40);
        let logo = Branding {
            source: "logo.png".into(),
            bytes: Vec::new(),
            width_px: 300,
            height_px: 100,
        };
        let mut canvas = RecordingCanvas::new();
        render_pdf(&mut canvas, &t, &meta(), PageGeometry::default(), Some(&logo)).unwrap();

        for page in &canvas.pages {
            assert!(matches!(
                page.ops.first(),
                Some(DrawOp::Image { width, .. }) if *width == 36.0
            ));
        }
    }

    #[test]
    fn test_row_taller_than_page_is_truncated() {
        let mut t = table(3);
        t.rows[1][1] = "renglón\n".repeat(50);
        let geometry = PageGeometry::default();
        let layout = PdfLayout::new(&t, geometry).unwrap();
        let pages: Vec<PageLayout> = layout.pages().collect();

        let tall = pages.iter().flat_map(|p| &p.rows).find(|r| r.index == 1).unwrap();
        assert_eq!(tall.cells[1].len(), geometry.max_row_lines());
        assert!(tall.cells[1].last().unwrap().ends_with('…'));
        for page in &pages {
            for row in &page.rows {
                assert!(row.y + row.height <= geometry.body_bottom());
            }
        }
    }

    #[test]
    fn test_footer_counts_only_this_document() {
        let mut canvas = RecordingCanvas::new();
        canvas.add_page(297.0, 210.0);

        let total = render_pdf(&mut canvas, &table(40), &meta(), PageGeometry::default(), None).unwrap();

        assert_eq!(total, 3);
        assert_eq!(canvas.page_count(), 4);
        assert!(canvas.texts(0).is_empty());
        for page in 1..4 {
            let footer = format!("Página {} de 3", page);
            assert!(canvas.texts(page).contains(&footer.as_str()), "missing footer on page {}", page);
        }
    }

    #[test]
    fn test_degenerate_geometry_is_rejected() {
        let t = table(1);
        let geometry = PageGeometry {
            page_height: 50.0,
            ..Default::default()
        };
        assert!(matches!(PdfLayout::new(&t, geometry), Err(ReportError::InvalidGeometry(_))));
    }
}
