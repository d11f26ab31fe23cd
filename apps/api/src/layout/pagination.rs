//! Pagination Engine: decides where page breaks go.
//!
//! # Rules
//! - Before a block is drawn, if the remaining space on the page is below the
//!   block's threshold, a page break is inserted first. Never after.
//! - The metadata box always advances the cursor by `METADATA_BOX_HEIGHT`,
//!   however many fields it shows.
//! - The footer is anchored to the page bottom, not to the cursor.
//! - The section boundary before the analysis is an unconditional break.
//!
//! All functions take a `LayoutCursor` by value and return the next one.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Fixed height of the difficulty/topics/link box, in points.
pub const METADATA_BOX_HEIGHT: f32 = 80.0;

/// Footer baseline sits this far above the bottom edge of the page.
pub const FOOTER_OFFSET_FROM_BOTTOM: f32 = 40.0;

// ────────────────────────────────────────────────────────────────────────────
// Page geometry
// ────────────────────────────────────────────────────────────────────────────

/// Page size and margins in points. y grows downwards from the top edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
}

impl PageGeometry {
    /// US letter (8.5" × 11") with 50pt margins on all sides.
    pub fn letter() -> Self {
        PageGeometry {
            width: 612.0,
            height: 792.0,
            margin_top: 50.0,
            margin_bottom: 50.0,
            margin_left: 50.0,
            margin_right: 50.0,
        }
    }

    pub fn content_width(&self) -> f32 {
        self.width - self.margin_left - self.margin_right
    }

    pub fn usable_height(&self) -> f32 {
        self.height - self.margin_top - self.margin_bottom
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Cursor
// ────────────────────────────────────────────────────────────────────────────

/// Vertical writing position of one render pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutCursor {
    /// Distance from the top edge of the current page.
    pub y: f32,
    /// Zero-based index of the current page.
    pub page_index: usize,
    pub page_height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
}

impl LayoutCursor {
    /// Cursor at the top margin of the first page.
    pub fn new(page: &PageGeometry) -> Self {
        LayoutCursor {
            y: page.margin_top,
            page_index: 0,
            page_height: page.height,
            margin_top: page.margin_top,
            margin_bottom: page.margin_bottom,
        }
    }

    /// Space left above the bottom margin. Never negative.
    pub fn remaining(&self) -> f32 {
        (self.page_height - self.margin_bottom - self.y).max(0.0)
    }

    pub fn usable_height(&self) -> f32 {
        self.page_height - self.margin_top - self.margin_bottom
    }

    pub fn is_at_top(&self) -> bool {
        self.y <= self.margin_top
    }

    pub fn advance(self, dy: f32) -> Self {
        LayoutCursor {
            y: self.y + dy,
            ..self
        }
    }

    /// Cursor at the top margin of the following page.
    pub fn next_page(self) -> Self {
        LayoutCursor {
            y: self.margin_top,
            page_index: self.page_index + 1,
            ..self
        }
    }
}

/// Result of a placement check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    pub cursor: LayoutCursor,
    pub page_break_inserted: bool,
}

/// Decides whether a page break must precede a block.
///
/// The block needs `min_space`, or its own height when that is larger. Only the
/// block height is capped at a full page, so a block taller than a page starts on
/// a fresh one and continues from there. The threshold itself is honored as given;
/// `PaginationRules::fit_to` keeps configured thresholds within one page. The
/// returned cursor is not advanced past the block.
pub fn place(cursor: LayoutCursor, block_height: f32, min_space: f32) -> Placement {
    let required = min_space.max(block_height.min(cursor.usable_height()));
    if cursor.remaining() < required {
        Placement {
            cursor: cursor.next_page(),
            page_break_inserted: true,
        }
    } else {
        Placement {
            cursor,
            page_break_inserted: false,
        }
    }
}

/// Unconditional break used for the section boundary.
pub fn force_page_break(cursor: LayoutCursor) -> LayoutCursor {
    cursor.next_page()
}

/// Cursor after the metadata box: always exactly `METADATA_BOX_HEIGHT` below `cursor`.
pub fn advance_past_metadata_box(cursor: LayoutCursor) -> LayoutCursor {
    cursor.advance(METADATA_BOX_HEIGHT)
}

/// Where the footer goes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FooterPlacement {
    pub placement: Placement,
    /// Top of the footer text, measured from the page's top edge.
    pub y: f32,
}

/// Forces a new page when less than `min_space` remains, then anchors the footer
/// `FOOTER_OFFSET_FROM_BOTTOM` above the bottom edge of whichever page it lands on.
pub fn place_footer(cursor: LayoutCursor, min_space: f32) -> FooterPlacement {
    let placement = if cursor.remaining() < min_space {
        Placement {
            cursor: cursor.next_page(),
            page_break_inserted: true,
        }
    } else {
        Placement {
            cursor,
            page_break_inserted: false,
        }
    };
    let y = placement.cursor.page_height - FOOTER_OFFSET_FROM_BOTTOM;
    FooterPlacement { placement, y }
}

// ────────────────────────────────────────────────────────────────────────────
// Thresholds
// ────────────────────────────────────────────────────────────────────────────

/// Kinds of element that carry their own minimum-space threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    Title,
    Heading,
    SubHeading,
    Paragraph,
    Bullet,
    CodeBlock,
    MetadataBox,
    Footer,
}

/// Minimum remaining space, in points, required before each kind of block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationRules {
    pub default_min_space: f32,
    pub title: Option<f32>,
    pub heading: Option<f32>,
    pub code_block: Option<f32>,
    pub metadata_box: Option<f32>,
    pub footer: Option<f32>,
}

impl Default for PaginationRules {
    fn default() -> Self {
        PaginationRules {
            default_min_space: 50.0,
            title: Some(90.0),
            heading: Some(80.0),
            code_block: Some(100.0),
            metadata_box: Some(120.0),
            footer: Some(140.0),
        }
    }
}

impl PaginationRules {
    pub fn min_space(&self, kind: BlockKind) -> f32 {
        let override_for = match kind {
            BlockKind::Title => self.title,
            BlockKind::Heading | BlockKind::SubHeading => self.heading,
            BlockKind::CodeBlock => self.code_block,
            BlockKind::MetadataBox => self.metadata_box,
            BlockKind::Footer => self.footer,
            BlockKind::Paragraph | BlockKind::Bullet => None,
        };
        override_for.unwrap_or(self.default_min_space)
    }

    /// Returns a copy with the threshold for `kind` replaced.
    pub fn with_min_space(mut self, kind: BlockKind, points: f32) -> Self {
        match kind {
            BlockKind::Title => self.title = Some(points),
            BlockKind::Heading | BlockKind::SubHeading => self.heading = Some(points),
            BlockKind::CodeBlock => self.code_block = Some(points),
            BlockKind::MetadataBox => self.metadata_box = Some(points),
            BlockKind::Footer => self.footer = Some(points),
            BlockKind::Paragraph | BlockKind::Bullet => self.default_min_space = points,
        }
        self
    }

    /// Clamps every threshold to the usable height of `page`. A threshold above
    /// that could never be met and would leave a blank page before the block.
    pub fn fit_to(self, page: &PageGeometry) -> Self {
        let max = page.usable_height().max(0.0);
        let clamp = |v: f32| v.clamp(0.0, max);
        PaginationRules {
            default_min_space: clamp(self.default_min_space),
            title: self.title.map(clamp),
            heading: self.heading.map(clamp),
            code_block: self.code_block.map(clamp),
            metadata_box: self.metadata_box.map(clamp),
            footer: self.footer.map(clamp),
        }
    }
}

impl FromStr for BlockKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "title" => Ok(BlockKind::Title),
            "heading" => Ok(BlockKind::Heading),
            "sub_heading" | "subheading" => Ok(BlockKind::SubHeading),
            "paragraph" => Ok(BlockKind::Paragraph),
            "bullet" => Ok(BlockKind::Bullet),
            "code_block" | "code" => Ok(BlockKind::CodeBlock),
            "metadata_box" | "metadata" => Ok(BlockKind::MetadataBox),
            "footer" => Ok(BlockKind::Footer),
            other => Err(format!("unknown block kind '{other}'")),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
