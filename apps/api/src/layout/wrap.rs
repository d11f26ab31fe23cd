//! Greedy word wrap over the static metric tables.
//!
//! Prose is wrapped on whitespace; a single word wider than the line is hard-broken
//! by characters so long URLs never run off the page. Code is wrapped purely by
//! character count because the code face is monospaced.

use crate::layout::font_metrics::FontMetricTable;

/// Splits `text` into lines no wider than `max_width_pt` at `size_pt`.
///
/// Whitespace between words is normalized to single spaces. An empty or
/// all-whitespace string returns no lines.
pub fn wrap_text(text: &str, metrics: &FontMetricTable, size_pt: f32, max_width_pt: f32) -> Vec<String> {
    let max_width = max_width_pt / size_pt; // work in em units like the tables
    let space_w = metrics.space_width;

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0_f32;

    for word in text.split_whitespace() {
        let word_w = metrics.measure_str(word);

        if word_w > max_width {
            // Finish the current line, then hard-break the oversized word.
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let mut pieces = break_word(word, metrics, max_width);
            let last = pieces.pop().unwrap_or_default();
            lines.extend(pieces);
            current_width = metrics.measure_str(&last);
            current = last;
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
            current_width = word_w;
        } else if current_width + space_w + word_w > max_width {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_width = word_w;
        } else {
            current.push(' ');
            current.push_str(word);
            current_width += space_w + word_w;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Wraps one verbatim code line at `max_chars`. An empty line stays one empty line.
pub fn wrap_code_line(line: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let chars: Vec<char> = line.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars
        .chunks(max_chars)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Number of printed lines `text` occupies. Used for height estimates.
/// Shortens `text` with a trailing ellipsis so it fits on one line.
pub fn truncate_to_width(text: &str, metrics: &FontMetricTable, size_pt: f32, max_width_pt: f32) -> String {
    if metrics.width_pt(text, size_pt) <= max_width_pt {
        return text.to_string();
    }
    let budget = max_width_pt / size_pt - metrics.measure_str("...");
    let mut out = String::new();
    let mut width = 0.0_f32;
    for c in text.chars() {
        let w = metrics.char_width(c);
        if width + w > budget {
            break;
        }
        out.push(c);
        width += w;
    }
    format!("{}...", out.trim_end())
}

fn break_word(word: &str, metrics: &FontMetricTable, max_width: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut width = 0.0_f32;
    for c in word.chars() {
        let w = metrics.char_width(c);
        if !piece.is_empty() && width + w > max_width {
            pieces.push(std::mem::take(&mut piece));
            width = 0.0;
        }
        piece.push(c);
        width += w;
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
