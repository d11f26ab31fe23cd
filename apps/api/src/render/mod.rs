// Renderer Backend: draw-command vocabulary, the backend trait and its implementations.
// The composer only ever talks to `RendererBackend`; bytes are produced by `PdfBackend::finish`.

pub mod commands;
pub mod encoding;
pub mod fonts;
pub mod pdf;
#[cfg(test)]
pub mod recording;

use std::path::PathBuf;

use thiserror::Error;

pub use commands::{DrawCommand, RendererBackend, Rgb, TextAlign};
pub use fonts::{FontCapability, EMOJI_FONT_NAME};
pub use pdf::PdfBackend;
#[cfg(test)]
pub use recording::RecordingBackend;

#[derive(Debug, Error)]
pub enum RenderError {
    /// A font file could not be read or is not embeddable. Non-fatal during composition.
    #[error("failed to load font {path}: {reason}")]
    FontLoad { path: PathBuf, reason: String },

    #[error("failed to encode document: {0}")]
    Encode(String),

    /// The output sink refused bytes (client gone, channel closed).
    #[error("output sink error: {0}")]
    Sink(#[from] std::io::Error),
}
