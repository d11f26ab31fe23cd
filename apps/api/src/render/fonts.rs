//! Font capability probing and the embeddable fallback font.
//!
//! Emoji support is a two-phase protocol: `FontCapability::probe` checks at
//! request time whether the configured emoji font exists, then the composer tries
//! to register it with the backend and downgrades the capability if that fails.
//! Sanitization only ever sees the post-registration flag.

use std::path::{Path, PathBuf};

use tracing::debug;
use ttf_parser::Face;

use crate::render::RenderError;

/// Name the emoji fallback font is registered under.
pub const EMOJI_FONT_NAME: &str = "Emoji";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontCapability {
    /// Emoji are kept in the text instead of being replaced by tokens.
    pub preserve_emoji: bool,
    pub emoji_font: Option<PathBuf>,
}

impl FontCapability {
    /// No emoji font: emoji are substituted during sanitization.
    pub fn text_only() -> Self {
        FontCapability {
            preserve_emoji: false,
            emoji_font: None,
        }
    }

    /// Checks whether the configured emoji font is present on disk.
    pub fn probe(path: Option<&Path>) -> Self {
        match path {
            Some(p) if p.is_file() => FontCapability {
                preserve_emoji: true,
                emoji_font: Some(p.to_path_buf()),
            },
            Some(p) => {
                debug!(path = %p.display(), "Emoji font not found; emoji will be substituted");
                Self::text_only()
            }
            None => Self::text_only(),
        }
    }
}

/// A TrueType font loaded for embedding as a fallback for glyphs the standard fonts lack.
#[derive(Debug, Clone)]
pub struct EmbeddedFont {
    pub name: String,
    pub data: Vec<u8>,
}

impl EmbeddedFont {
    pub fn load(name: &str, path: &Path) -> Result<Self, RenderError> {
        let data = std::fs::read(path).map_err(|e| RenderError::FontLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_bytes(name, data).map_err(|reason| RenderError::FontLoad {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Validates that `data` is a parseable font with TrueType (`glyf`) outlines.
    pub fn from_bytes(name: &str, data: Vec<u8>) -> Result<Self, String> {
        let face = Face::parse(&data, 0).map_err(|e| e.to_string())?;
        if face.tables().glyf.is_none() {
            return Err("only fonts with TrueType outlines can be embedded".to_string());
        }
        drop(face);
        Ok(EmbeddedFont {
            name: name.to_string(),
            data,
        })
    }

    /// Parsed view of the font. Validated at load time, so parsing only fails on corruption.
    pub fn face(&self) -> Result<Face<'_>, RenderError> {
        Face::parse(&self.data, 0).map_err(|e| RenderError::Encode(format!("font {}: {e}", self.name)))
    }
}
