//! PDF Renderer Backend built on lopdf.
//!
//! Text uses the three standard Type1 fonts with WinAnsiEncoding. Characters they
//! cannot show go to the registered fallback font (embedded as a Type0 /
//! CIDFontType2 font with Identity-H encoding) when it has a glyph, otherwise to
//! an ASCII transliteration or `?`.
//!
//! Content streams are accumulated per page while drawing; `finish` assembles the
//! object graph and writes the file to any `io::Write` sink.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use chrono::Utc;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use tracing::debug;

use crate::layout::{get_metrics, FontFace, PageGeometry};
use crate::render::encoding::{push_hex_glyphs, push_literal_string, transliterate, win_ansi_byte};
use crate::render::fonts::EmbeddedFont;
use crate::render::{DrawCommand, RenderError, RendererBackend, Rgb, TextAlign};
use crate::text::emoji::is_emoji_modifier;

/// Baseline offset from the top of a line box, as a fraction of the font size.
const BASELINE_RATIO: f32 = 0.8;
const FALLBACK_RESOURCE: &str = "FE";

fn resource_name(face: FontFace) -> &'static str {
    match face {
        FontFace::Regular => "F1",
        FontFace::Bold => "F2",
        FontFace::Mono => "F3",
    }
}

/// A contiguous piece of a text line drawn with one font.
#[derive(Debug, PartialEq)]
enum Run {
    Standard(Vec<u8>),
    Fallback(Vec<u16>),
}

pub struct PdfBackend {
    page: PageGeometry,
    title: String,
    pages: Vec<Vec<u8>>,
    face: FontFace,
    fallback: Option<EmbeddedFont>,
    /// Glyph id → advance in 1/1000 em, for every fallback glyph drawn.
    used_glyphs: BTreeMap<u16, i64>,
}

impl PdfBackend {
    pub fn new(page: PageGeometry, title: &str) -> Self {
        PdfBackend {
            page,
            title: title.to_string(),
            pages: vec![Vec::new()],
            face: FontFace::Regular,
            fallback: None,
            used_glyphs: BTreeMap::new(),
        }
    }

    fn current_page(&mut self) -> &mut Vec<u8> {
        if self.pages.is_empty() {
            self.pages.push(Vec::new());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// Flips a top-down y coordinate into PDF user space.
    fn pdf_y(&self, y: f32) -> f32 {
        self.page.height - y
    }

    /// Splits `text` into font runs and measures each, in points at `size`.
    fn runs(&mut self, text: &str, size: f32) -> Result<Vec<(Run, f32)>, RenderError> {
        let metrics = get_metrics(self.face);
        let face = match &self.fallback {
            Some(font) => Some(font.face()?),
            None => None,
        };

        let mut runs: Vec<(Run, f32)> = Vec::new();
        for c in text.chars() {
            if let Some(b) = win_ansi_byte(c) {
                let w = metrics.char_width(c) * size;
                match runs.last_mut() {
                    Some((Run::Standard(bytes), width)) => {
                        bytes.push(b);
                        *width += w;
                    }
                    _ => runs.push((Run::Standard(vec![b]), w)),
                }
                continue;
            }

            let glyph = face.as_ref().and_then(|f| f.glyph_index(c).map(|g| (f, g)));
            if let Some((f, gid)) = glyph {
                let units = f.units_per_em().max(1) as f32;
                let advance = f.glyph_hor_advance(gid).unwrap_or(0) as f32;
                let em1000 = (advance * 1000.0 / units).round() as i64;
                self.used_glyphs.insert(gid.0, em1000);
                let w = em1000 as f32 / 1000.0 * size;
                match runs.last_mut() {
                    Some((Run::Fallback(glyphs), width)) => {
                        glyphs.push(gid.0);
                        *width += w;
                    }
                    _ => runs.push((Run::Fallback(vec![gid.0]), w)),
                }
                continue;
            }

            // Joiners and selectors without a glyph have no visible form.
            if is_emoji_modifier(c) {
                continue;
            }

            let substitute = transliterate(c).unwrap_or("?");
            let w = metrics.width_pt(substitute, size);
            match runs.last_mut() {
                Some((Run::Standard(bytes), width)) => {
                    bytes.extend(substitute.bytes());
                    *width += w;
                }
                _ => runs.push((Run::Standard(substitute.bytes().collect()), w)),
            }
        }
        Ok(runs)
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_text(
        &mut self,
        text: &str,
        x: f32,
        y: f32,
        width: f32,
        size: f32,
        color: Rgb,
        align: TextAlign,
    ) -> Result<(), RenderError> {
        let runs = self.runs(text, size)?;
        if runs.is_empty() {
            return Ok(());
        }
        let total: f32 = runs.iter().map(|(_, w)| w).sum();
        let mut pen_x = match align {
            TextAlign::Left => x,
            TextAlign::Center => x + ((width - total) / 2.0).max(0.0),
        };
        let baseline = self.pdf_y(y + size * BASELINE_RATIO);
        let (r, g, b) = color.unit();
        let standard = resource_name(self.face);

        let mut ops = Vec::new();
        ops.extend_from_slice(format!("BT {r:.3} {g:.3} {b:.3} rg\n").as_bytes());
        for (run, w) in &runs {
            let font = match run {
                Run::Standard(_) => standard,
                Run::Fallback(_) => FALLBACK_RESOURCE,
            };
            ops.extend_from_slice(
                format!("/{font} {size:.2} Tf 1 0 0 1 {pen_x:.2} {baseline:.2} Tm ").as_bytes(),
            );
            match run {
                Run::Standard(bytes) => push_literal_string(&mut ops, bytes),
                Run::Fallback(glyphs) => push_hex_glyphs(&mut ops, glyphs),
            }
            ops.extend_from_slice(b" Tj\n");
            pen_x += w;
        }
        ops.extend_from_slice(b"ET\n");
        self.current_page().extend_from_slice(&ops);
        Ok(())
    }

    /// Writes the finished document to `sink`. Returns the number of pages.
    pub fn finish<W: Write>(self, sink: &mut W) -> Result<usize, RenderError> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut fonts = Dictionary::new();
        for face in [FontFace::Regular, FontFace::Bold, FontFace::Mono] {
            let id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => face.base_font(),
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(resource_name(face), id);
        }
        if let Some(font) = &self.fallback {
            if !self.used_glyphs.is_empty() {
                let id = embed_fallback(&mut doc, font, &self.used_glyphs)?;
                fonts.set(FALLBACK_RESOURCE, id);
            }
        }
        let resources_id = doc.add_object(dictionary! { "Font" => fonts });

        let media_box: Vec<Object> = vec![0.into(), 0.into(), self.page.width.into(), self.page.height.into()];
        let mut kids: Vec<Object> = Vec::with_capacity(self.pages.len());
        for content in self.pages {
            let content_id = doc.add_object(Stream::new(dictionary! {}, content));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => media_box.clone(),
            });
            kids.push(page_id.into());
        }
        let page_count = kids.len();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count as i64,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let title: String = self.title.chars().filter(|c| c.is_ascii() && !c.is_ascii_control()).collect();
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(title),
            "Producer" => Object::string_literal("pdfgen"),
            "CreationDate" => Object::string_literal(format!("D:{}Z", Utc::now().format("%Y%m%d%H%M%S"))),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);

        doc.compress();
        doc.save_to(sink).map_err(save_error)?;
        debug!(pages = page_count, "PDF written");
        Ok(page_count)
    }
}

fn save_error(e: impl Into<lopdf::Error>) -> RenderError {
    match e.into() {
        lopdf::Error::IO(io) => RenderError::Sink(io),
        other => RenderError::Encode(other.to_string()),
    }
}

/// Adds the fallback font as a Type0 font with only the widths of glyphs actually drawn.
fn embed_fallback(
    doc: &mut Document,
    font: &EmbeddedFont,
    used: &BTreeMap<u16, i64>,
) -> Result<ObjectId, RenderError> {
    let face = font.face()?;
    let units = face.units_per_em().max(1) as f32;
    let scale = |v: i16| (v as f32 * 1000.0 / units).round() as i64;
    let bbox = face.global_bounding_box();
    let base_font = format!("PdfGen+{}", font.name);

    let file_id = doc.add_object(Stream::new(
        dictionary! { "Length1" => font.data.len() as i64 },
        font.data.clone(),
    ));
    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => Object::Name(base_font.clone().into_bytes()),
        "Flags" => 4,
        "FontBBox" => vec![
            scale(bbox.x_min).into(),
            scale(bbox.y_min).into(),
            scale(bbox.x_max).into(),
            scale(bbox.y_max).into(),
        ],
        "ItalicAngle" => 0,
        "Ascent" => scale(face.ascender()),
        "Descent" => scale(face.descender()),
        "CapHeight" => scale(face.ascender()),
        "StemV" => 80,
        "FontFile2" => file_id,
    });

    let mut widths: Vec<Object> = Vec::with_capacity(used.len() * 2);
    for (gid, advance) in used {
        widths.push((*gid as i64).into());
        widths.push(Object::Array(vec![(*advance).into()]));
    }
    let cid_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => Object::Name(base_font.clone().into_bytes()),
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => 0,
        },
        "FontDescriptor" => descriptor_id,
        "CIDToGIDMap" => "Identity",
        "W" => widths,
    });

    Ok(doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => Object::Name(base_font.into_bytes()),
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![cid_font_id.into()],
    }))
}

impl RendererBackend for PdfBackend {
    fn register_font(&mut self, name: &str, path: &Path) -> Result<(), RenderError> {
        let font = EmbeddedFont::load(name, path)?;
        debug!(name, path = %path.display(), "Fallback font registered");
        self.fallback = Some(font);
        Ok(())
    }

    fn draw(&mut self, command: &DrawCommand) -> Result<(), RenderError> {
        match command {
            DrawCommand::SelectFont(face) => self.face = *face,
            DrawCommand::Text {
                text,
                x,
                y,
                width,
                size,
                color,
                align,
            } => self.draw_text(text, *x, *y, *width, *size, *color, *align)?,
            DrawCommand::FilledRect {
                x,
                y,
                width,
                height,
                color,
            } => {
                let (r, g, b) = color.unit();
                let bottom = self.pdf_y(y + height);
                let op = format!("q {r:.3} {g:.3} {b:.3} rg {x:.2} {bottom:.2} {width:.2} {height:.2} re f Q\n");
                self.current_page().extend_from_slice(op.as_bytes());
            }
            DrawCommand::Line {
                x1,
                y1,
                x2,
                y2,
                width,
                color,
            } => {
                let (r, g, b) = color.unit();
                let (py1, py2) = (self.pdf_y(*y1), self.pdf_y(*y2));
                let op = format!(
                    "q {r:.3} {g:.3} {b:.3} RG {width:.2} w {x1:.2} {py1:.2} m {x2:.2} {py2:.2} l S Q\n"
                );
                self.current_page().extend_from_slice(op.as_bytes());
            }
            DrawCommand::NewPage => self.pages.push(Vec::new()),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: Rgb = Rgb(0, 0, 0);

    fn text(s: &str) -> DrawCommand {
        DrawCommand::Text {
            text: s.to_string(),
            x: 50.0,
            y: 100.0,
            width: 512.0,
            size: 12.0,
            color: BLACK,
            align: TextAlign::Left,
        }
    }

    fn render(commands: &[DrawCommand]) -> Vec<u8> {
        let mut backend = PdfBackend::new(PageGeometry::letter(), "Test");
        for c in commands {
            backend.draw(c).unwrap();
        }
        let mut out = Vec::new();
        backend.finish(&mut out).unwrap();
        out
    }

    #[test]
    fn test_output_is_a_pdf() {
        let bytes = render(&[text("Hello")]);
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_page_count_round_trips() {
        let bytes = render(&[text("one"), DrawCommand::NewPage, text("two"), DrawCommand::NewPage]);
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn test_text_is_win_ansi_encoded() {
        let mut backend = PdfBackend::new(PageGeometry::letter(), "Test");
        backend.draw(&text("\u{2022} a(b)")).unwrap();
        let content = String::from_utf8_lossy(&backend.pages[0]).to_string();
        assert!(content.contains("(\\225 a\\(b\\))"));
        assert!(content.contains("/F1 12.00 Tf"));
    }

    #[test]
    fn test_selected_face_is_used() {
        let mut backend = PdfBackend::new(PageGeometry::letter(), "Test");
        backend.draw(&DrawCommand::SelectFont(FontFace::Mono)).unwrap();
        backend.draw(&text("x = 1")).unwrap();
        let content = String::from_utf8_lossy(&backend.pages[0]).to_string();
        assert!(content.contains("/F3 "));
    }

    #[test]
    fn test_unencodable_chars_without_fallback() {
        let mut backend = PdfBackend::new(PageGeometry::letter(), "Test");
        let runs = backend.runs("a \u{2264} b \u{1F680}\u{FE0F}", 10.0).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].0, Run::Standard(b"a <= b ?".to_vec()));
        assert!(backend.used_glyphs.is_empty());
    }

    #[test]
    fn test_centered_text_is_offset() {
        let mut backend = PdfBackend::new(PageGeometry::letter(), "Test");
        backend
            .draw(&DrawCommand::Text {
                text: "Hi".to_string(),
                x: 50.0,
                y: 100.0,
                width: 512.0,
                size: 10.0,
                color: BLACK,
                align: TextAlign::Center,
            })
            .unwrap();
        let content = String::from_utf8_lossy(&backend.pages[0]).to_string();
        assert!(!content.contains("1 0 0 1 50.00 "));
    }

    #[test]
    fn test_shapes_are_flipped_to_pdf_space() {
        let mut backend = PdfBackend::new(PageGeometry::letter(), "Test");
        backend
            .draw(&DrawCommand::FilledRect {
                x: 50.0,
                y: 100.0,
                width: 200.0,
                height: 80.0,
                color: Rgb(255, 255, 255),
            })
            .unwrap();
        let content = String::from_utf8_lossy(&backend.pages[0]).to_string();
        // 792 - (100 + 80)
        assert!(content.contains("50.00 612.00 200.00 80.00 re f"));
    }

    #[test]
    fn test_register_missing_font_fails() {
        let mut backend = PdfBackend::new(PageGeometry::letter(), "Test");
        let err = backend
            .register_font("Emoji", Path::new("/missing/emoji.ttf"))
            .unwrap_err();
        assert!(matches!(err, RenderError::FontLoad { .. }));
        assert!(backend.fallback.is_none());
    }
}
