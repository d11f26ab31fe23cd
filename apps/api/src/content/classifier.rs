//! Block Classifier: turns sanitized markdown-lite text into typed content blocks.
//!
//! # State machine
//! - `Prose`: each line becomes at most one block, chosen by its leading marker.
//! - `InCodeFence`: lines are buffered verbatim until the closing fence.
//!
//! `Blocks` is a lazy iterator so callers can stream blocks without holding the
//! whole list; the only in-flight state is the fence buffer.

use serde::Serialize;
use std::str::Split;

/// Problem-description paragraphs are capped at this many characters.
pub const MAX_PLAIN_PARAGRAPH_CHARS: usize = 1000;

const FENCE: &str = "```";
const BULLET_GLYPH: &str = "\u{2022} ";

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TitleLevel {
    /// Document title.
    Primary,
    /// `# ` lines inside the analysis.
    Secondary,
}

/// One classified unit of document content. Text is always sanitized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ContentBlock {
    Title { text: String, level: TitleLevel },
    Heading(String),
    SubHeading(String),
    Paragraph(String),
    /// Text already carries the bullet glyph prefix.
    Bullet(String),
    /// Lines joined with `\n`, internal whitespace untouched. `language` may be empty.
    CodeBlock { text: String, language: String },
    Blank,
}

#[derive(Debug)]
enum State {
    Prose,
    InCodeFence { language: String, lines: Vec<String> },
}

// ────────────────────────────────────────────────────────────────────────────
// Streaming classifier
// ────────────────────────────────────────────────────────────────────────────

/// Single left-to-right pass over the lines of a sanitized text.
pub struct Blocks<'a> {
    lines: Split<'a, char>,
    state: State,
    finished: bool,
}

impl<'a> Blocks<'a> {
    pub fn new(sanitized: &'a str) -> Self {
        Blocks {
            lines: sanitized.split('\n'),
            state: State::Prose,
            finished: false,
        }
    }
}

impl Iterator for Blocks<'_> {
    type Item = ContentBlock;

    fn next(&mut self) -> Option<ContentBlock> {
        if self.finished {
            return None;
        }

        for line in self.lines.by_ref() {
            let trimmed = line.trim();

            if let Some(tag) = trimmed.strip_prefix(FENCE) {
                match std::mem::replace(&mut self.state, State::Prose) {
                    State::Prose => {
                        self.state = State::InCodeFence {
                            language: tag.trim().to_string(),
                            lines: Vec::new(),
                        };
                    }
                    State::InCodeFence { language, lines } => {
                        if let Some(block) = flush_code(language, lines) {
                            return Some(block);
                        }
                    }
                }
                continue;
            }

            match &mut self.state {
                State::InCodeFence { lines, .. } => lines.push(line.to_string()),
                State::Prose => return Some(classify_prose_line(trimmed)),
            }
        }

        // Input ended. An unterminated fence is flushed, never dropped.
        self.finished = true;
        match std::mem::replace(&mut self.state, State::Prose) {
            State::InCodeFence { language, lines } => flush_code(language, lines),
            State::Prose => None,
        }
    }
}

/// Classifies the analysis text into blocks, in order, as they are pulled.
pub fn classify(sanitized: &str) -> Blocks<'_> {
    Blocks::new(sanitized)
}

/// Plain line splitting for the problem description: every non-blank line is a
/// paragraph capped at `MAX_PLAIN_PARAGRAPH_CHARS`. Markers are not interpreted.
pub fn classify_plain(sanitized: &str) -> Vec<ContentBlock> {
    sanitized
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| ContentBlock::Paragraph(truncate_chars(line, MAX_PLAIN_PARAGRAPH_CHARS)))
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Internal helpers
// ────────────────────────────────────────────────────────────────────────────

fn classify_prose_line(trimmed: &str) -> ContentBlock {
    if trimmed.is_empty() {
        return ContentBlock::Blank;
    }
    if let Some(rest) = trimmed.strip_prefix("### ") {
        return ContentBlock::SubHeading(rest.trim().to_string());
    }
    if let Some(rest) = trimmed.strip_prefix("## ") {
        return ContentBlock::Heading(rest.trim().to_string());
    }
    if let Some(rest) = trimmed.strip_prefix("# ") {
        return ContentBlock::Title {
            text: rest.trim().to_string(),
            level: TitleLevel::Secondary,
        };
    }
    if let Some(rest) = trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))
    {
        return ContentBlock::Bullet(format!("{BULLET_GLYPH}{}", rest.trim()));
    }
    ContentBlock::Paragraph(trimmed.to_string())
}

/// Emits a code block unless every buffered line is blank.
fn flush_code(language: String, lines: Vec<String>) -> Option<ContentBlock> {
    if lines.iter().all(|l| l.trim().is_empty()) {
        return None;
    }
    Some(ContentBlock::CodeBlock {
        text: lines.join("\n"),
        language,
    })
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
