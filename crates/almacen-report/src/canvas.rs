//! # Canvas
//!
//! The drawing capability the paginated layout targets. Coordinates are in
//! millimetres from the top-left corner of the page.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ (0,0) ──► x                                   │
//! │   │                                           │
//! │   ▼ y                                         │
//! │                                               │
//! │  add_page()        appends and selects a page │
//! │  set_page(i)       re-selects a drawn page    │
//! │  text/rect/image   draw on the selected page  │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! [`RecordingCanvas`] keeps every operation and serializes them as JSON;
//! it is the layout interchange format and what tests assert on.

use serde::Serialize;

use crate::branding::Branding;
use crate::error::ReportResult;

/// Text weight/role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextStyle {
    Title,
    Subtitle,
    Header,
    Body,
    Footer,
}

/// Rectangle fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Fill {
    /// Column header band.
    Header,
    /// Alternating row shading.
    Shade,
    /// Outline only.
    None,
}

pub trait Canvas {
    /// Appends a page and selects it.
    fn add_page(&mut self, width: f32, height: f32);

    /// Selects an already-added page (0-based).
    fn set_page(&mut self, index: usize);

    fn page_count(&self) -> usize;

    fn text(&mut self, x: f32, y: f32, text: &str, style: TextStyle);

    fn rect(&mut self, x: f32, y: f32, width: f32, height: f32, fill: Fill);

    fn image(&mut self, x: f32, y: f32, width: f32, height: f32, image: &Branding);

    /// Encodes the finished document.
    fn finish(self) -> ReportResult<Vec<u8>>
    where
        Self: Sized;
}

// =============================================================================
// Recording Canvas
// =============================================================================

/// One recorded drawing operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        text: String,
        style: TextStyle,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Fill,
    },
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        source: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedPage {
    pub width: f32,
    pub height: f32,
    pub ops: Vec<DrawOp>,
}

/// Canvas that records operations per page.
#[derive(Debug, Default, Serialize)]
pub struct RecordingCanvas {
    pub pages: Vec<RecordedPage>,
    #[serde(skip)]
    current: usize,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.get_mut(self.current) {
            page.ops.push(op);
        }
    }

    /// Texts drawn on a page, in drawing order.
    pub fn texts(&self, page: usize) -> Vec<&str> {
        self.pages
            .get(page)
            .map(|p| {
                p.ops
                    .iter()
                    .filter_map(|op| match op {
                        DrawOp::Text { text, .. } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Canvas for RecordingCanvas {
    fn add_page(&mut self, width: f32, height: f32) {
        self.pages.push(RecordedPage {
            width,
            height,
            ops: Vec::new(),
        });
        self.current = self.pages.len() - 1;
    }

    fn set_page(&mut self, index: usize) {
        if index < self.pages.len() {
            self.current = index;
        }
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn text(&mut self, x: f32, y: f32, text: &str, style: TextStyle) {
        self.push(DrawOp::Text {
            x,
            y,
            text: text.to_string(),
            style,
        });
    }

    fn rect(&mut self, x: f32, y: f32, width: f32, height: f32, fill: Fill) {
        self.push(DrawOp::Rect {
            x,
            y,
            width,
            height,
            fill,
        });
    }

    fn image(&mut self, x: f32, y: f32, width: f32, height: f32, image: &Branding) {
        self.push(DrawOp::Image {
            x,
            y,
            width,
            height,
            source: image.source.clone(),
        });
    }

    fn finish(self) -> ReportResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(&self.pages)?)
    }
}
