// Document Composer: sanitizes one request, walks its elements in order and hands
// every draw command to the backend as soon as it is laid out.

pub mod elements;
pub mod handlers;
pub mod models;
pub mod stream;

use serde::Serialize;
use tracing::{debug, warn};

use crate::content::{classify, classify_plain, ContentBlock, TitleLevel};
use crate::errors::AppError;
use crate::layout::{DocumentSettings, LayoutCursor};
use crate::render::{FontCapability, RendererBackend, EMOJI_FONT_NAME};
use crate::text::{sanitize_analysis, sanitize_field};

pub use elements::{layout_element, DocumentElement, MetadataField};
pub use models::RenderRequest;

/// Outcome of one render pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposeSummary {
    pub pages: usize,
    /// Elements laid out, header and footer included.
    pub elements: usize,
    pub commands: usize,
    pub emoji_preserved: bool,
}

/// A request after sanitization with one shared emoji decision. Empty strings mean absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SanitizedDocument {
    pub title: String,
    pub difficulty: String,
    pub topics: String,
    pub link: String,
    pub content: String,
    pub analysis: String,
    pub date: String,
}

impl SanitizedDocument {
    pub fn from_request(request: &RenderRequest, preserve_emoji: bool) -> Self {
        let field = |raw: &Option<String>| sanitize_field(raw.as_deref(), preserve_emoji);
        SanitizedDocument {
            title: sanitize_field(Some(&request.metadata.title), preserve_emoji),
            difficulty: field(&request.metadata.difficulty),
            topics: field(&request.metadata.topics),
            link: field(&request.metadata.link),
            content: field(&request.content),
            analysis: sanitize_analysis(&request.analysis, preserve_emoji),
            date: field(&request.date),
        }
    }

    /// Rejects a document whose title or analysis sanitized down to nothing,
    /// e.g. markup only, or emoji only when emoji are substituted.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.is_empty() {
            return Err(AppError::Validation(
                "problemTitle has no printable text".to_string(),
            ));
        }
        if self.analysis.trim().is_empty() {
            return Err(AppError::Validation("analysis has no printable text".to_string()));
        }
        Ok(())
    }

    fn metadata_fields(&self) -> Vec<MetadataField> {
        [
            ("Difficulty", &self.difficulty),
            ("Topics", &self.topics),
            ("Link", &self.link),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(label, value)| MetadataField {
            label,
            value: value.clone(),
        })
        .collect()
    }

    /// Every element of the document in drawing order. The analysis is classified
    /// lazily, so only the open code fence is ever buffered.
    pub fn elements<'a>(&'a self, settings: &'a DocumentSettings) -> impl Iterator<Item = DocumentElement> + 'a {
        let mut header = vec![DocumentElement::Block(ContentBlock::Title {
            text: settings.document_title.clone(),
            level: TitleLevel::Primary,
        })];
        if !self.date.is_empty() {
            header.push(DocumentElement::DateLine(self.date.clone()));
        }
        header.push(DocumentElement::Separator);
        header.push(DocumentElement::Block(ContentBlock::Heading(self.title.clone())));
        header.push(DocumentElement::MetadataBox(self.metadata_fields()));

        let description = classify_plain(&self.content);
        if !description.is_empty() {
            header.push(DocumentElement::Block(ContentBlock::SubHeading(
                settings.description_heading.clone(),
            )));
            header.extend(description.into_iter().map(DocumentElement::Block));
        }
        header.push(DocumentElement::SectionBreak);
        header.push(DocumentElement::Block(ContentBlock::Heading(
            settings.analysis_heading.clone(),
        )));

        header
            .into_iter()
            .chain(classify(&self.analysis).map(DocumentElement::Block))
            .chain(std::iter::once(DocumentElement::Footer(settings.footer_text.clone())))
    }
}

/// Runs one full conversion against `backend`.
///
/// The raw request is validated before the backend is touched, the sanitized one
/// before anything is drawn. A failed emoji font registration is logged and turns
/// emoji substitution on; it never aborts the document. Any other backend error
/// fails the pass.
pub fn compose_document<B: RendererBackend + ?Sized>(
    request: &RenderRequest,
    capability: FontCapability,
    settings: &DocumentSettings,
    backend: &mut B,
) -> Result<ComposeSummary, AppError> {
    request.validate()?;

    let capability = register_emoji_font(capability, backend);
    let document = SanitizedDocument::from_request(request, capability.preserve_emoji);
    document.validate()?;

    let mut cursor = LayoutCursor::new(&settings.page);
    let mut elements = 0;
    let mut commands = 0;
    for element in document.elements(settings) {
        let (drawn, next) = layout_element(&element, cursor, settings);
        for command in &drawn {
            backend.draw(command)?;
        }
        elements += 1;
        commands += drawn.len();
        cursor = next;
    }

    let summary = ComposeSummary {
        pages: cursor.page_index + 1,
        elements,
        commands,
        emoji_preserved: capability.preserve_emoji,
    };
    debug!(?summary, "Document composed");
    Ok(summary)
}

fn register_emoji_font<B: RendererBackend + ?Sized>(capability: FontCapability, backend: &mut B) -> FontCapability {
    let path = match (&capability.emoji_font, capability.preserve_emoji) {
        (Some(path), true) => path.clone(),
        _ => return FontCapability::text_only(),
    };
    match backend.register_font(EMOJI_FONT_NAME, &path) {
        Ok(()) => capability,
        Err(e) => {
            warn!(error = %e, "Emoji font registration failed, substituting emoji");
            FontCapability::text_only()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::models::ProblemMetadata;
    use crate::render::{DrawCommand, RecordingBackend};
    use std::path::PathBuf;

    fn request(title: &str, analysis: &str) -> RenderRequest {
        RenderRequest {
            metadata: ProblemMetadata {
                title: title.to_string(),
                difficulty: None,
                topics: None,
                link: None,
            },
            content: None,
            analysis: analysis.to_string(),
            date: None,
        }
    }

    fn emoji_capability() -> FontCapability {
        FontCapability {
            preserve_emoji: true,
            emoji_font: Some(PathBuf::from("/fonts/emoji.ttf")),
        }
    }

    /// Blocks that follow the section break's analysis heading.
    fn analysis_blocks(doc: &SanitizedDocument, settings: &DocumentSettings) -> Vec<ContentBlock> {
        doc.elements(settings)
            .skip_while(|e| *e != DocumentElement::SectionBreak)
            .skip(2)
            .filter_map(|e| match e {
                DocumentElement::Block(b) => Some(b),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_two_sum_end_to_end() {
        let settings = DocumentSettings::default();
        let req = request("Two Sum", "# Intro\nSolve it.");
        let doc = SanitizedDocument::from_request(&req, false);
        let blocks = analysis_blocks(&doc, &settings);
        assert_eq!(
            blocks[..2],
            [
                ContentBlock::Title {
                    text: "Intro".to_string(),
                    level: TitleLevel::Secondary
                },
                ContentBlock::Paragraph("Solve it.".to_string()),
            ]
        );

        let mut backend = RecordingBackend::new();
        let summary = compose_document(&req, FontCapability::text_only(), &settings, &mut backend).unwrap();
        assert_eq!(summary.pages, 2);
        assert_eq!(backend.page_count(), 2);
        let texts = backend.texts();
        assert!(texts.contains(&"Two Sum"));
        assert!(texts.contains(&"Intro"));
        assert!(texts.contains(&"Solve it."));
    }

    #[test]
    fn test_element_order() {
        let settings = DocumentSettings::default();
        let mut req = request("Two Sum", "text");
        req.date = Some("2024-01-01".to_string());
        req.content = Some("Given an array.\n\nReturn indices.".to_string());
        let doc = SanitizedDocument::from_request(&req, false);
        let elements: Vec<DocumentElement> = doc.elements(&settings).collect();

        assert!(matches!(&elements[0], DocumentElement::Block(ContentBlock::Title { level: TitleLevel::Primary, .. })));
        assert_eq!(elements[1], DocumentElement::DateLine("2024-01-01".to_string()));
        assert_eq!(elements[2], DocumentElement::Separator);
        assert_eq!(elements[3], DocumentElement::Block(ContentBlock::Heading("Two Sum".to_string())));
        assert_eq!(elements[4], DocumentElement::MetadataBox(Vec::new()));
        assert_eq!(
            elements[5],
            DocumentElement::Block(ContentBlock::SubHeading(settings.description_heading.clone()))
        );
        assert_eq!(elements[6], DocumentElement::Block(ContentBlock::Paragraph("Given an array.".to_string())));
        assert_eq!(elements[7], DocumentElement::Block(ContentBlock::Paragraph("Return indices.".to_string())));
        assert_eq!(elements[8], DocumentElement::SectionBreak);
        assert_eq!(
            elements[9],
            DocumentElement::Block(ContentBlock::Heading(settings.analysis_heading.clone()))
        );
        assert_eq!(elements.last(), Some(&DocumentElement::Footer(settings.footer_text.clone())));
    }

    #[test]
    fn test_description_markers_are_not_interpreted() {
        let settings = DocumentSettings::default();
        let mut req = request("T", "a");
        req.content = Some("# not a title\n- not a bullet".to_string());
        let doc = SanitizedDocument::from_request(&req, false);
        let elements: Vec<DocumentElement> = doc.elements(&settings).collect();
        assert!(elements.contains(&DocumentElement::Block(ContentBlock::Paragraph("# not a title".to_string()))));
        assert!(elements.contains(&DocumentElement::Block(ContentBlock::Paragraph("- not a bullet".to_string()))));
    }

    #[test]
    fn test_no_description_heading_without_content() {
        let settings = DocumentSettings::default();
        let doc = SanitizedDocument::from_request(&request("T", "a"), false);
        let has_sub = doc
            .elements(&settings)
            .any(|e| e == DocumentElement::Block(ContentBlock::SubHeading(settings.description_heading.clone())));
        assert!(!has_sub);
    }

    #[test]
    fn test_metadata_fields_only_when_present() {
        let mut req = request("T", "a");
        req.metadata.difficulty = Some("Medium".to_string());
        req.metadata.link = Some("  ".to_string());
        let doc = SanitizedDocument::from_request(&req, false);
        assert_eq!(
            doc.metadata_fields(),
            vec![MetadataField {
                label: "Difficulty",
                value: "Medium".to_string()
            }]
        );
    }

    #[test]
    fn test_missing_analysis_draws_nothing() {
        let mut backend = RecordingBackend::new();
        let result = compose_document(
            &request("Two Sum", ""),
            emoji_capability(),
            &DocumentSettings::default(),
            &mut backend,
        );
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(backend.commands.is_empty());
        assert!(backend.registered_fonts.is_empty());
    }

    #[test]
    fn test_missing_title_draws_nothing() {
        let mut backend = RecordingBackend::new();
        let result = compose_document(
            &request("", "analysis"),
            FontCapability::text_only(),
            &DocumentSettings::default(),
            &mut backend,
        );
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(backend.commands.is_empty());
    }

    #[test]
    fn test_markup_only_title_draws_nothing() {
        let mut backend = RecordingBackend::new();
        let result = compose_document(
            &request("<b></b>", "analysis"),
            FontCapability::text_only(),
            &DocumentSettings::default(),
            &mut backend,
        );
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(backend.commands.is_empty());
    }

    #[test]
    fn test_emoji_only_title_rejected_when_substituting() {
        let mut backend = RecordingBackend::new();
        let result = compose_document(
            &request("\u{1F600}", "analysis"),
            FontCapability::text_only(),
            &DocumentSettings::default(),
            &mut backend,
        );
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(backend.commands.is_empty());
    }

    #[test]
    fn test_emoji_only_title_kept_when_font_registers() {
        let mut backend = RecordingBackend::new();
        let summary = compose_document(
            &request("\u{1F600}", "analysis"),
            emoji_capability(),
            &DocumentSettings::default(),
            &mut backend,
        )
        .unwrap();
        assert!(summary.emoji_preserved);
        assert!(backend.texts().contains(&"\u{1F600}"));
    }

    #[test]
    fn test_tag_only_analysis_is_rejected() {
        let doc = SanitizedDocument::from_request(&request("T", "<p></p>\n<br/>"), false);
        assert!(matches!(doc.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_registered_emoji_font_preserves_emoji() {
        let mut backend = RecordingBackend::new();
        let summary = compose_document(
            &request("Launch \u{1F680}", "go"),
            emoji_capability(),
            &DocumentSettings::default(),
            &mut backend,
        )
        .unwrap();
        assert!(summary.emoji_preserved);
        assert_eq!(backend.registered_fonts.len(), 1);
        assert_eq!(backend.registered_fonts[0].0, EMOJI_FONT_NAME);
        assert!(backend.texts().contains(&"Launch \u{1F680}"));
    }

    #[test]
    fn test_failed_registration_downgrades_to_substitution() {
        let mut backend = RecordingBackend {
            fail_font_registration: true,
            ..RecordingBackend::new()
        };
        let summary = compose_document(
            &request("Launch \u{1F680}", "go"),
            emoji_capability(),
            &DocumentSettings::default(),
            &mut backend,
        )
        .unwrap();
        assert!(!summary.emoji_preserved);
        assert!(backend.texts().contains(&"Launch [rocket]"));
        assert!(!backend.texts().iter().any(|t| t.contains('\u{1F680}')));
    }

    #[test]
    fn test_text_only_skips_registration() {
        let mut backend = RecordingBackend::new();
        compose_document(
            &request("T", "a"),
            FontCapability::text_only(),
            &DocumentSettings::default(),
            &mut backend,
        )
        .unwrap();
        assert!(backend.registered_fonts.is_empty());
    }

    #[test]
    fn test_backend_failure_fails_generation() {
        let mut backend = RecordingBackend {
            fail_on_command: Some(3),
            ..RecordingBackend::new()
        };
        let result = compose_document(
            &request("T", "a"),
            FontCapability::text_only(),
            &DocumentSettings::default(),
            &mut backend,
        );
        assert!(matches!(result, Err(AppError::Rendering(_))));
        assert_eq!(backend.commands.len(), 3);
    }

    #[test]
    fn test_analysis_starts_on_second_page() {
        let mut backend = RecordingBackend::new();
        compose_document(
            &request("T", "first analysis line"),
            FontCapability::text_only(),
            &DocumentSettings::default(),
            &mut backend,
        )
        .unwrap();
        let break_at = backend
            .commands
            .iter()
            .position(|c| matches!(c, DrawCommand::NewPage))
            .unwrap();
        let before: Vec<&str> = backend.commands[..break_at]
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert!(!before.contains(&"first analysis line"));
    }

    #[test]
    fn test_code_fence_indentation_reaches_backend() {
        let mut backend = RecordingBackend::new();
        compose_document(
            &request("T", "```py\nif x:\n    y = 1\n```"),
            FontCapability::text_only(),
            &DocumentSettings::default(),
            &mut backend,
        )
        .unwrap();
        assert!(backend.texts().contains(&"    y = 1"));
    }
}
