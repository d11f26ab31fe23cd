use std::path::{Path, PathBuf};

use crate::render::{DrawCommand, RenderError, RendererBackend};

/// Backend that only records what it was asked to do. Used to test the composer
/// without producing a document.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub commands: Vec<DrawCommand>,
    pub registered_fonts: Vec<(String, PathBuf)>,
    /// When set, every `register_font` call fails.
    pub fail_font_registration: bool,
    /// When set, the draw call with this index fails.
    pub fail_on_command: Option<usize>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pages drawn so far (the initial page included).
    pub fn page_count(&self) -> usize {
        1 + self
            .commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::NewPage))
            .count()
    }

    /// Text of every `Text` command, in draw order.
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl RendererBackend for RecordingBackend {
    fn register_font(&mut self, name: &str, path: &Path) -> Result<(), RenderError> {
        if self.fail_font_registration {
            return Err(RenderError::FontLoad {
                path: path.to_path_buf(),
                reason: "registration disabled".to_string(),
            });
        }
        self.registered_fonts
            .push((name.to_string(), path.to_path_buf()));
        Ok(())
    }

    fn draw(&mut self, command: &DrawCommand) -> Result<(), RenderError> {
        if self.fail_on_command == Some(self.commands.len()) {
            return Err(RenderError::Encode("injected failure".to_string()));
        }
        self.commands.push(command.clone());
        Ok(())
    }
}
