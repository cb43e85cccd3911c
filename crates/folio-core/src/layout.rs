//! Page geometry.
//!
//! The kernel does not paginate; it only needs the text block width to size rendered tables
//! of contents. [`PageSetup::text_columns`] turns the page geometry into an approximate number
//! of character columns, assuming an average glyph advance of half an em.

use serde::{Deserialize, Serialize};

/// Millimetres per typographic point.
pub const MM_PER_POINT: f64 = 25.4 / 72.0;

/// Average glyph advance, in ems.
pub const AVERAGE_GLYPH_EM: f64 = 0.5;

/// Paper size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Paper {
    /// ISO A4, 210 x 297 mm.
    A4,
    /// ISO A5, 148 x 210 mm.
    A5,
    /// US Letter, 215.9 x 279.4 mm.
    Letter,
    /// Custom size in millimetres (portrait dimensions).
    #[serde(rename_all = "camelCase")]
    Custom {
        /// Width in mm.
        width_mm: f64,
        /// Height in mm.
        height_mm: f64,
    },
}

impl Paper {
    /// Portrait `(width, height)` in millimetres.
    pub fn size_mm(self) -> (f64, f64) {
        match self {
            Paper::A4 => (210.0, 297.0),
            Paper::A5 => (148.0, 210.0),
            Paper::Letter => (215.9, 279.4),
            Paper::Custom {
                width_mm,
                height_mm,
            } => (width_mm, height_mm),
        }
    }
}

/// Page orientation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Orientation {
    /// Taller than wide.
    #[default]
    Portrait,
    /// Wider than tall.
    Landscape,
}

/// Page margins in millimetres. Inner/outer follow facing-page conventions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Margins {
    /// Top margin.
    pub top: f64,
    /// Bottom margin.
    pub bottom: f64,
    /// Inner (binding-side) margin.
    pub inner: f64,
    /// Outer margin.
    pub outer: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 25.0,
            bottom: 25.0,
            inner: 25.0,
            outer: 25.0,
        }
    }
}

/// Page setup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageSetup {
    /// Paper size.
    pub paper: Paper,
    /// Orientation.
    pub orientation: Orientation,
    /// Margins.
    pub margins: Margins,
    /// Body font size in points.
    pub font_size_pt: f64,
}

impl Default for PageSetup {
    fn default() -> Self {
        Self {
            paper: Paper::A4,
            orientation: Orientation::Portrait,
            margins: Margins::default(),
            font_size_pt: 12.0,
        }
    }
}

impl PageSetup {
    /// Oriented `(width, height)` in millimetres.
    pub fn page_size_mm(&self) -> (f64, f64) {
        let (w, h) = self.paper.size_mm();
        match self.orientation {
            Orientation::Portrait => (w.min(h), w.max(h)),
            Orientation::Landscape => (w.max(h), w.min(h)),
        }
    }

    /// Width of the text block in millimetres (never negative).
    pub fn content_width_mm(&self) -> f64 {
        let (width, _) = self.page_size_mm();
        (width - self.margins.inner - self.margins.outer).max(0.0)
    }

    /// Approximate number of character columns in the text block (at least 1).
    pub fn text_columns(&self) -> usize {
        let glyph_mm = self.font_size_pt * MM_PER_POINT * AVERAGE_GLYPH_EM;
        if !glyph_mm.is_finite() || glyph_mm <= 0.0 {
            log::warn!("invalid font size {}pt; using one column", self.font_size_pt);
            return 1;
        }
        let columns = (self.content_width_mm() / glyph_mm).floor();
        if columns.is_finite() && columns >= 1.0 {
            columns as usize
        } else {
            1
        }
    }
}
