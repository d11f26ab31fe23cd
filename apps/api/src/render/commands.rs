//! Draw commands: the only thing the composer hands to a Renderer Backend.
//!
//! Coordinates are in points with the origin at the top-left corner of the page
//! and y growing downwards. Backends convert to their own coordinate system.

use std::path::Path;

use serde::Serialize;

use crate::layout::FontFace;
use crate::render::RenderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Components scaled to 0.0..=1.0 for PDF colour operators.
    pub fn unit(&self) -> (f32, f32, f32) {
        (
            self.0 as f32 / 255.0,
            self.1 as f32 / 255.0,
            self.2 as f32 / 255.0,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextAlign {
    Left,
    /// Centered inside `[x, x + width]`.
    Center,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DrawCommand {
    /// Face used by every following `Text` until the next selection.
    SelectFont(FontFace),
    /// One line of text; `y` is the top of the line box.
    Text {
        text: String,
        x: f32,
        y: f32,
        width: f32,
        size: f32,
        color: Rgb,
        align: TextAlign,
    },
    FilledRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Rgb,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        width: f32,
        color: Rgb,
    },
    NewPage,
}

/// A collaborator that turns draw commands into a finished document.
///
/// A backend starts with one empty page. Finishing the document (writing bytes)
/// is backend-specific and lives outside this trait.
pub trait RendererBackend {
    /// Registers an extra font file under `name`. Failure is reported, never fatal to the caller.
    fn register_font(&mut self, name: &str, path: &Path) -> Result<(), RenderError>;

    fn draw(&mut self, command: &DrawCommand) -> Result<(), RenderError>;
}
