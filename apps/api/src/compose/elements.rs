//! Element layout: pure functions from (element, cursor, settings) to draw commands.
//!
//! Every function here checks placement strictly before producing any drawing
//! command for the element, so a page break always precedes the block it makes
//! room for. Multi-line blocks that overflow a page continue line by line, each
//! continuation page opened by an explicit `NewPage`.

use serde::Serialize;

use crate::content::{ContentBlock, TitleLevel};
use crate::layout::pagination::{advance_past_metadata_box, force_page_break, place, place_footer, METADATA_BOX_HEIGHT};
use crate::layout::wrap::{truncate_to_width, wrap_code_line, wrap_text};
use crate::layout::{get_metrics, BlockKind, DocumentSettings, FontFace, LayoutCursor};
use crate::render::{DrawCommand, Rgb, TextAlign};

// ────────────────────────────────────────────────────────────────────────────
// Elements
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataField {
    pub label: &'static str,
    pub value: String,
}

/// One unit the composer lays out, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DocumentElement {
    Block(ContentBlock),
    DateLine(String),
    /// Horizontal rule under the document header.
    Separator,
    /// Difficulty/topics/link. Zero to three fields, always the same height.
    MetadataBox(Vec<MetadataField>),
    /// Unconditional break between the problem and the analysis.
    SectionBreak,
    Footer(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Styles
// ────────────────────────────────────────────────────────────────────────────

struct TextStyle {
    kind: BlockKind,
    face: FontFace,
    size: f32,
    line_height: f32,
    color: Rgb,
    indent: f32,
    space_before: f32,
    space_after: f32,
    align: TextAlign,
}

const INK: Rgb = Rgb(51, 51, 51);
const NAVY: Rgb = Rgb(44, 62, 80);
const ACCENT: Rgb = Rgb(41, 128, 185);
const MUTED: Rgb = Rgb(127, 140, 141);
const RULE: Rgb = Rgb(189, 195, 199);
const CODE_BACKGROUND: Rgb = Rgb(246, 248, 250);
const CODE_INK: Rgb = Rgb(36, 41, 46);
const BOX_BACKGROUND: Rgb = Rgb(248, 249, 250);

const PRIMARY_TITLE: TextStyle = TextStyle {
    kind: BlockKind::Title,
    face: FontFace::Bold,
    size: 22.0,
    line_height: 28.0,
    color: NAVY,
    indent: 0.0,
    space_before: 0.0,
    space_after: 8.0,
    align: TextAlign::Center,
};

const SECONDARY_TITLE: TextStyle = TextStyle {
    kind: BlockKind::Title,
    face: FontFace::Bold,
    size: 17.0,
    line_height: 22.0,
    color: ACCENT,
    indent: 0.0,
    space_before: 8.0,
    space_after: 6.0,
    align: TextAlign::Left,
};

const HEADING: TextStyle = TextStyle {
    kind: BlockKind::Heading,
    face: FontFace::Bold,
    size: 15.0,
    line_height: 20.0,
    color: NAVY,
    indent: 0.0,
    space_before: 6.0,
    space_after: 6.0,
    align: TextAlign::Left,
};

const SUB_HEADING: TextStyle = TextStyle {
    kind: BlockKind::SubHeading,
    face: FontFace::Bold,
    size: 12.5,
    line_height: 17.0,
    color: Rgb(52, 73, 94),
    indent: 0.0,
    space_before: 4.0,
    space_after: 4.0,
    align: TextAlign::Left,
};

const PARAGRAPH: TextStyle = TextStyle {
    kind: BlockKind::Paragraph,
    face: FontFace::Regular,
    size: 11.0,
    line_height: 15.0,
    color: INK,
    indent: 0.0,
    space_before: 0.0,
    space_after: 6.0,
    align: TextAlign::Left,
};

const BULLET: TextStyle = TextStyle {
    kind: BlockKind::Bullet,
    indent: 15.0,
    space_after: 3.0,
    ..PARAGRAPH
};

const DATE_LINE: TextStyle = TextStyle {
    kind: BlockKind::Paragraph,
    face: FontFace::Regular,
    size: 10.0,
    line_height: 14.0,
    color: MUTED,
    indent: 0.0,
    space_before: 0.0,
    space_after: 4.0,
    align: TextAlign::Center,
};

const BLANK_LINE_HEIGHT: f32 = 6.0;

const SEPARATOR_HEIGHT: f32 = 16.0;
const SEPARATOR_OFFSET: f32 = 6.0;

const CODE_SIZE: f32 = 9.0;
const CODE_LINE_HEIGHT: f32 = 12.0;
const CODE_PADDING: f32 = 8.0;
const CODE_SPACE_AFTER: f32 = 10.0;
const CODE_TAB: &str = "    ";

/// Height of the drawn box; the rest of `METADATA_BOX_HEIGHT` is the gap below it.
const METADATA_BOX_DRAWN_HEIGHT: f32 = 70.0;
const METADATA_PADDING: f32 = 10.0;
const METADATA_SIZE: f32 = 10.5;
const METADATA_LINE_HEIGHT: f32 = 18.0;

const FOOTER_SIZE: f32 = 9.0;
const FOOTER_RULE_GAP: f32 = 8.0;

// ────────────────────────────────────────────────────────────────────────────
// Layout
// ────────────────────────────────────────────────────────────────────────────

/// Lays out one element starting at `cursor`. Returns its draw commands and the
/// cursor positioned after it.
pub fn layout_element(
    element: &DocumentElement,
    cursor: LayoutCursor,
    settings: &DocumentSettings,
) -> (Vec<DrawCommand>, LayoutCursor) {
    match element {
        DocumentElement::Block(block) => layout_block(block, cursor, settings),
        DocumentElement::DateLine(text) => layout_text(text, &DATE_LINE, cursor, settings),
        DocumentElement::Separator => layout_separator(cursor, settings),
        DocumentElement::MetadataBox(fields) => layout_metadata_box(fields, cursor, settings),
        DocumentElement::SectionBreak => (vec![DrawCommand::NewPage], force_page_break(cursor)),
        DocumentElement::Footer(text) => layout_footer(text, cursor, settings),
    }
}

fn layout_block(
    block: &ContentBlock,
    cursor: LayoutCursor,
    settings: &DocumentSettings,
) -> (Vec<DrawCommand>, LayoutCursor) {
    match block {
        ContentBlock::Title { text, level } => {
            let style = match level {
                TitleLevel::Primary => &PRIMARY_TITLE,
                TitleLevel::Secondary => &SECONDARY_TITLE,
            };
            layout_text(text, style, cursor, settings)
        }
        ContentBlock::Heading(text) => layout_text(text, &HEADING, cursor, settings),
        ContentBlock::SubHeading(text) => layout_text(text, &SUB_HEADING, cursor, settings),
        ContentBlock::Paragraph(text) => layout_text(text, &PARAGRAPH, cursor, settings),
        ContentBlock::Bullet(text) => layout_text(text, &BULLET, cursor, settings),
        ContentBlock::CodeBlock { text, .. } => layout_code(text, cursor, settings),
        ContentBlock::Blank => (Vec::new(), cursor.advance(BLANK_LINE_HEIGHT)),
    }
}

fn layout_text(
    text: &str,
    style: &TextStyle,
    cursor: LayoutCursor,
    settings: &DocumentSettings,
) -> (Vec<DrawCommand>, LayoutCursor) {
    let page = &settings.page;
    let x = page.margin_left + style.indent;
    let width = page.content_width() - style.indent;
    let lines = wrap_text(text, get_metrics(style.face), style.size, width);
    if lines.is_empty() {
        return (Vec::new(), cursor);
    }

    let height = style.space_before + lines.len() as f32 * style.line_height;
    let placement = place(cursor, height, settings.rules.min_space(style.kind));
    let mut commands = Vec::with_capacity(lines.len() + 2);
    let mut cursor = placement.cursor;
    if placement.page_break_inserted {
        commands.push(DrawCommand::NewPage);
    } else if !cursor.is_at_top() {
        cursor = cursor.advance(style.space_before);
    }

    commands.push(DrawCommand::SelectFont(style.face));
    for line in lines {
        if cursor.remaining() < style.line_height {
            commands.push(DrawCommand::NewPage);
            cursor = cursor.next_page();
        }
        commands.push(DrawCommand::Text {
            text: line,
            x,
            y: cursor.y,
            width,
            size: style.size,
            color: style.color,
            align: style.align,
        });
        cursor = cursor.advance(style.line_height);
    }
    (commands, cursor.advance(style.space_after))
}

fn layout_separator(cursor: LayoutCursor, settings: &DocumentSettings) -> (Vec<DrawCommand>, LayoutCursor) {
    let page = &settings.page;
    let placement = place(cursor, SEPARATOR_HEIGHT, settings.rules.default_min_space);
    let mut commands = Vec::new();
    if placement.page_break_inserted {
        commands.push(DrawCommand::NewPage);
    }
    let y = placement.cursor.y + SEPARATOR_OFFSET;
    commands.push(DrawCommand::Line {
        x1: page.margin_left,
        y1: y,
        x2: page.width - page.margin_right,
        y2: y,
        width: 1.0,
        color: RULE,
    });
    (commands, placement.cursor.advance(SEPARATOR_HEIGHT))
}

fn layout_metadata_box(
    fields: &[MetadataField],
    cursor: LayoutCursor,
    settings: &DocumentSettings,
) -> (Vec<DrawCommand>, LayoutCursor) {
    let page = &settings.page;
    let placement = place(
        cursor,
        METADATA_BOX_HEIGHT,
        settings.rules.min_space(BlockKind::MetadataBox),
    );
    let mut commands = Vec::new();
    if placement.page_break_inserted {
        commands.push(DrawCommand::NewPage);
    }
    let top = placement.cursor.y;
    commands.push(DrawCommand::FilledRect {
        x: page.margin_left,
        y: top,
        width: page.content_width(),
        height: METADATA_BOX_DRAWN_HEIGHT,
        color: BOX_BACKGROUND,
    });

    let metrics = get_metrics(FontFace::Regular);
    let inner_width = page.content_width() - 2.0 * METADATA_PADDING;
    commands.push(DrawCommand::SelectFont(FontFace::Regular));
    for (i, field) in fields.iter().enumerate() {
        let line = format!("{}: {}", field.label, field.value);
        commands.push(DrawCommand::Text {
            text: truncate_to_width(&line, metrics, METADATA_SIZE, inner_width),
            x: page.margin_left + METADATA_PADDING,
            y: top + METADATA_PADDING + i as f32 * METADATA_LINE_HEIGHT,
            width: inner_width,
            size: METADATA_SIZE,
            color: INK,
            align: TextAlign::Left,
        });
    }
    (commands, advance_past_metadata_box(placement.cursor))
}

/// Code lines keep their indentation; tabs become four spaces.
fn layout_code(text: &str, cursor: LayoutCursor, settings: &DocumentSettings) -> (Vec<DrawCommand>, LayoutCursor) {
    let page = &settings.page;
    let char_width = get_metrics(FontFace::Mono).char_width(' ') * CODE_SIZE;
    let max_chars = ((page.content_width() - 2.0 * CODE_PADDING) / char_width).floor() as usize;
    let lines: Vec<String> = text
        .split('\n')
        .flat_map(|line| wrap_code_line(&line.replace('\t', CODE_TAB), max_chars))
        .collect();

    let height = 2.0 * CODE_PADDING + lines.len() as f32 * CODE_LINE_HEIGHT;
    let placement = place(cursor, height, settings.rules.min_space(BlockKind::CodeBlock));
    let mut commands = Vec::with_capacity(lines.len() + 4);
    if placement.page_break_inserted {
        commands.push(DrawCommand::NewPage);
    }

    let mut cursor = placement.cursor;
    let mut segment: Vec<String> = Vec::new();
    for line in lines {
        let needed = 2.0 * CODE_PADDING + (segment.len() + 1) as f32 * CODE_LINE_HEIGHT;
        if !segment.is_empty() && cursor.remaining() < needed {
            cursor = flush_code_segment(&mut commands, std::mem::take(&mut segment), cursor, settings);
            commands.push(DrawCommand::NewPage);
            cursor = cursor.next_page();
        }
        segment.push(line);
    }
    if !segment.is_empty() {
        cursor = flush_code_segment(&mut commands, segment, cursor, settings);
    }
    (commands, cursor.advance(CODE_SPACE_AFTER))
}

/// Draws the background and text of the part of a code block that fits on one page.
fn flush_code_segment(
    commands: &mut Vec<DrawCommand>,
    segment: Vec<String>,
    cursor: LayoutCursor,
    settings: &DocumentSettings,
) -> LayoutCursor {
    let page = &settings.page;
    let height = 2.0 * CODE_PADDING + segment.len() as f32 * CODE_LINE_HEIGHT;
    commands.push(DrawCommand::FilledRect {
        x: page.margin_left,
        y: cursor.y,
        width: page.content_width(),
        height,
        color: CODE_BACKGROUND,
    });
    commands.push(DrawCommand::SelectFont(FontFace::Mono));
    let width = page.content_width() - 2.0 * CODE_PADDING;
    for (i, line) in segment.into_iter().enumerate() {
        commands.push(DrawCommand::Text {
            text: line,
            x: page.margin_left + CODE_PADDING,
            y: cursor.y + CODE_PADDING + i as f32 * CODE_LINE_HEIGHT,
            width,
            size: CODE_SIZE,
            color: CODE_INK,
            align: TextAlign::Left,
        });
    }
    cursor.advance(height)
}

fn layout_footer(text: &str, cursor: LayoutCursor, settings: &DocumentSettings) -> (Vec<DrawCommand>, LayoutCursor) {
    let page = &settings.page;
    let footer = place_footer(cursor, settings.rules.min_space(BlockKind::Footer));
    let mut commands = Vec::new();
    if footer.placement.page_break_inserted {
        commands.push(DrawCommand::NewPage);
    }
    let rule_y = footer.y - FOOTER_RULE_GAP;
    commands.push(DrawCommand::Line {
        x1: page.margin_left,
        y1: rule_y,
        x2: page.width - page.margin_right,
        y2: rule_y,
        width: 0.5,
        color: RULE,
    });
    commands.push(DrawCommand::SelectFont(FontFace::Regular));
    commands.push(DrawCommand::Text {
        text: text.to_string(),
        x: page.margin_left,
        y: footer.y,
        width: page.content_width(),
        size: FOOTER_SIZE,
        color: MUTED,
        align: TextAlign::Center,
    });
    let after = LayoutCursor {
        y: footer.y + FOOTER_SIZE,
        ..footer.placement.cursor
    };
    (commands, after)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::pagination::FOOTER_OFFSET_FROM_BOTTOM;

    fn settings() -> DocumentSettings {
        DocumentSettings::default()
    }

    fn top() -> LayoutCursor {
        LayoutCursor::new(&settings().page)
    }

    fn with_remaining(remaining: f32) -> LayoutCursor {
        let c = top();
        LayoutCursor {
            y: c.page_height - c.margin_bottom - remaining,
            ..c
        }
    }

    fn text_ys(commands: &[DrawCommand]) -> Vec<f32> {
        commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { y, .. } => Some(*y),
                _ => None,
            })
            .collect()
    }

    fn new_pages(commands: &[DrawCommand]) -> usize {
        commands.iter().filter(|c| matches!(c, DrawCommand::NewPage)).count()
    }

    #[test]
    fn test_paragraph_at_top_of_page() {
        let el = DocumentElement::Block(ContentBlock::Paragraph("Solve it.".to_string()));
        let (commands, after) = layout_element(&el, top(), &settings());
        assert_eq!(commands[0], DrawCommand::SelectFont(FontFace::Regular));
        assert_eq!(text_ys(&commands), vec![50.0]);
        assert!(after.y > 50.0);
        assert_eq!(after.page_index, 0);
    }

    #[test]
    fn test_break_comes_before_block_commands() {
        let el = DocumentElement::Block(ContentBlock::Heading("Approach".to_string()));
        let (commands, after) = layout_element(&el, with_remaining(40.0), &settings());
        assert_eq!(commands[0], DrawCommand::NewPage);
        assert_eq!(after.page_index, 1);
        assert_eq!(text_ys(&commands), vec![settings().page.margin_top]);
    }

    #[test]
    fn test_long_paragraph_continues_on_next_page() {
        let long = "word ".repeat(2000);
        let el = DocumentElement::Block(ContentBlock::Paragraph(long));
        let (commands, after) = layout_element(&el, top(), &settings());
        assert!(new_pages(&commands) >= 1);
        assert_eq!(after.page_index, new_pages(&commands));
        let bottom = settings().page.height - settings().page.margin_bottom;
        assert!(text_ys(&commands).iter().all(|y| *y + 15.0 <= bottom + 1e-3));
    }

    #[test]
    fn test_metadata_box_advance_is_fixed_for_any_field_count() {
        let all = vec![
            MetadataField { label: "Difficulty", value: "Easy".to_string() },
            MetadataField { label: "Topics", value: "Array".to_string() },
            MetadataField { label: "Link", value: "https://example.com".to_string() },
        ];
        for n in 0..=3 {
            let el = DocumentElement::MetadataBox(all[..n].to_vec());
            let start = with_remaining(500.0);
            let (commands, after) = layout_element(&el, start, &settings());
            assert!((after.y - start.y - METADATA_BOX_HEIGHT).abs() < 1e-4);
            assert_eq!(text_ys(&commands).len(), n);
            assert!(matches!(commands[0], DrawCommand::FilledRect { .. }));
        }
    }

    #[test]
    fn test_metadata_box_breaks_when_tight() {
        let el = DocumentElement::MetadataBox(Vec::new());
        let (commands, after) = layout_element(&el, with_remaining(100.0), &settings());
        assert_eq!(commands[0], DrawCommand::NewPage);
        assert_eq!(after.page_index, 1);
    }

    #[test]
    fn test_code_keeps_indentation() {
        let el = DocumentElement::Block(ContentBlock::CodeBlock {
            text: "def f():\n    return 1".to_string(),
            language: "py".to_string(),
        });
        let (commands, _) = layout_element(&el, top(), &settings());
        let texts: Vec<&str> = commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["def f():", "    return 1"]);
        assert!(commands.contains(&DrawCommand::SelectFont(FontFace::Mono)));
    }

    #[test]
    fn test_tall_code_block_gets_one_background_per_page() {
        let code = (0..120).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let el = DocumentElement::Block(ContentBlock::CodeBlock { text: code, language: String::new() });
        let (commands, after) = layout_element(&el, top(), &settings());
        let rects = commands.iter().filter(|c| matches!(c, DrawCommand::FilledRect { .. })).count();
        assert_eq!(rects, new_pages(&commands) + 1);
        assert_eq!(text_ys(&commands).len(), 120);
        assert!(after.page_index >= 1);
    }

    #[test]
    fn test_section_break_is_unconditional() {
        let (commands, after) = layout_element(&DocumentElement::SectionBreak, top(), &settings());
        assert_eq!(commands, vec![DrawCommand::NewPage]);
        assert_eq!(after.page_index, 1);
        assert_eq!(after.y, settings().page.margin_top);
    }

    #[test]
    fn test_footer_is_anchored_to_bottom() {
        let el = DocumentElement::Footer("Generated".to_string());
        let (commands, after) = layout_element(&el, with_remaining(500.0), &settings());
        assert_eq!(new_pages(&commands), 0);
        assert_eq!(text_ys(&commands), vec![settings().page.height - FOOTER_OFFSET_FROM_BOTTOM]);
        assert_eq!(after.page_index, 0);
    }

    #[test]
    fn test_footer_moves_to_new_page_when_tight() {
        let el = DocumentElement::Footer("Generated".to_string());
        let (commands, after) = layout_element(&el, with_remaining(60.0), &settings());
        assert_eq!(commands[0], DrawCommand::NewPage);
        assert_eq!(after.page_index, 1);
    }

    #[test]
    fn test_blank_only_advances() {
        let (commands, after) = layout_element(&DocumentElement::Block(ContentBlock::Blank), top(), &settings());
        assert!(commands.is_empty());
        assert_eq!(after.y, top().y + BLANK_LINE_HEIGHT);
    }

    #[test]
    fn test_empty_paragraph_draws_nothing() {
        let el = DocumentElement::Block(ContentBlock::Paragraph(String::new()));
        let (commands, after) = layout_element(&el, top(), &settings());
        assert!(commands.is_empty());
        assert_eq!(after, top());
    }
}
