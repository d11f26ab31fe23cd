//! Text sanitization pipeline.
//!
//! Order is fixed: entity decoding, tag stripping, line-ending normalization,
//! horizontal whitespace collapse, emoji substitution, trim. Decoding runs before
//! tag stripping so that encoded tags (`&lt;b&gt;`) are removed too.

use crate::text::emoji::replace_emoji;

/// Named entities, consulted in a single left-to-right pass.
static NAMED_ENTITIES: &[(&str, &str)] = &[
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&amp;", "&"),
    ("&quot;", "\""),
    ("&apos;", "'"),
    ("&nbsp;", " "),
    ("&ndash;", "\u{2013}"),
    ("&mdash;", "\u{2014}"),
    ("&times;", "\u{00D7}"),
    ("&divide;", "\u{00F7}"),
    ("&le;", "\u{2264}"),
    ("&ge;", "\u{2265}"),
    ("&ne;", "\u{2260}"),
    ("&hellip;", "\u{2026}"),
];

/// Longest numeric entity body we try to parse (`#x10FFFF` is 8 bytes).
const MAX_NUMERIC_ENTITY_LEN: usize = 8;

/// Sanitizes a single field: the full pipeline, whitespace collapsed, trimmed.
pub fn sanitize(raw: &str, preserve_emoji: bool) -> String {
    let decoded = decode_entities(raw);
    let stripped = strip_tags(&decoded);
    let normalized = normalize_line_endings(&stripped);
    let mut text = collapse_horizontal_whitespace(&normalized);
    if !preserve_emoji {
        text = collapse_horizontal_whitespace(&replace_emoji(&text));
    }
    text.trim().to_string()
}

/// Sanitizes an optional field. Absent input yields an empty string.
pub fn sanitize_field(raw: Option<&str>, preserve_emoji: bool) -> String {
    raw.map(|r| sanitize(r, preserve_emoji)).unwrap_or_default()
}

/// Fence-aware sanitization for the analysis text.
///
/// Prose runs the full pipeline and is trimmed line by line. Lines inside a
/// triple-backtick fence keep their whitespace: they are decoded, stripped and
/// emoji-substituted, but never collapsed or trimmed. Fence marker lines are trimmed.
pub fn sanitize_analysis(raw: &str, preserve_emoji: bool) -> String {
    let normalized = normalize_line_endings(raw);
    let mut out: Vec<String> = Vec::new();
    let mut prose: Vec<&str> = Vec::new();
    let mut in_fence = false;

    for line in normalized.split('\n') {
        let is_fence = line.trim_start().starts_with("```");

        if is_fence {
            if !in_fence {
                flush_prose(&mut prose, &mut out, preserve_emoji);
            }
            out.push(sanitize(line, preserve_emoji));
            in_fence = !in_fence;
        } else if in_fence {
            out.push(sanitize_verbatim_line(line, preserve_emoji));
        } else {
            prose.push(line);
        }
    }
    flush_prose(&mut prose, &mut out, preserve_emoji);

    out.join("\n").trim_matches('\n').to_string()
}

/// Runs the prose pipeline over a contiguous run of non-fence lines.
/// Tags may span lines within the run. Line count can shrink if a tag swallowed newlines.
fn flush_prose(prose: &mut Vec<&str>, out: &mut Vec<String>, preserve_emoji: bool) {
    if prose.is_empty() {
        return;
    }
    let segment = prose.join("\n");
    prose.clear();

    let stripped = normalize_line_endings(&strip_tags(&decode_entities(&segment)));
    let mut text = collapse_horizontal_whitespace(&stripped);
    if !preserve_emoji {
        text = collapse_horizontal_whitespace(&replace_emoji(&text));
    }
    out.extend(text.split('\n').map(|l| l.trim().to_string()));
}

/// A decoded `&#13;` can reintroduce a line break; it is normalized like a literal one.
fn sanitize_verbatim_line(line: &str, preserve_emoji: bool) -> String {
    let stripped = normalize_line_endings(&strip_tags(&decode_entities(line)));
    if preserve_emoji {
        stripped
    } else {
        replace_emoji(&stripped)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline steps
// ────────────────────────────────────────────────────────────────────────────

/// Decodes named and numeric entities in one pass. Unknown or malformed entities stay literal.
pub(crate) fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let candidate = &rest[pos..];

        if let Some((entity, replacement)) = NAMED_ENTITIES
            .iter()
            .find(|(entity, _)| candidate.starts_with(entity))
        {
            out.push_str(replacement);
            rest = &candidate[entity.len()..];
            continue;
        }

        if let Some((c, consumed)) = decode_numeric(candidate) {
            out.push(c);
            rest = &candidate[consumed..];
            continue;
        }

        out.push('&');
        rest = &candidate[1..];
    }
    out.push_str(rest);
    out
}

/// Parses `&#NNN;` or `&#xHH;` at the start of `s`. Returns the char and bytes consumed.
fn decode_numeric(s: &str) -> Option<(char, usize)> {
    let body = s.strip_prefix("&#")?;
    let end = body.find(';')?;
    if end == 0 || end > MAX_NUMERIC_ENTITY_LEN {
        return None;
    }
    let digits = &body[..end];

    let code = match digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
        Some(hex) if !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()) => {
            u32::from_str_radix(hex, 16).ok()?
        }
        Some(_) => return None,
        None if digits.chars().all(|c| c.is_ascii_digit()) => digits.parse::<u32>().ok()?,
        None => return None,
    };

    let c = char::from_u32(code)?;
    // "&#" + digits + ";"
    Some((c, 2 + end + 1))
}

/// Removes every `<...>` span. An unmatched `<` is kept as-is.
pub(crate) fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('<') {
        match rest[open..].find('>') {
            Some(close) => {
                out.push_str(&rest[..open]);
                rest = &rest[open + close + 1..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}

pub(crate) fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Collapses runs of spaces and tabs to a single space. Newlines are untouched.
pub(crate) fn collapse_horizontal_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;
    for c in text.chars() {
        if c == ' ' || c == '\t' {
            if !in_run {
                out.push(' ');
            }
            in_run = true;
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bold_tag_and_amp() {
        assert_eq!(sanitize("<b>A &amp; B</b>", true), "A & B");
    }

    #[test]
    fn test_every_named_entity_is_idempotent() {
        for (entity, _) in NAMED_ENTITIES {
            let input = format!("x {entity} y");
            let once = sanitize(&input, false);
            let twice = sanitize(&once, false);
            assert_eq!(once, twice, "sanitize not idempotent for {entity}");
        }
    }

    #[test]
    fn test_numeric_entities_are_idempotent() {
        for input in ["&#60;", "&#x3C;", "&#39;", "&#x27;", "&#8804;", "&#x2260;"] {
            let once = sanitize(input, false);
            assert_eq!(once, sanitize(&once, false), "input {input}");
        }
    }

    #[test]
    fn test_decimal_and_hex_entities() {
        assert_eq!(decode_entities("it&#39;s"), "it's");
        assert_eq!(decode_entities("a &#x2264; b"), "a \u{2264} b");
        assert_eq!(decode_entities("&#X41;"), "A");
    }

    #[test]
    fn test_malformed_numeric_entities_stay_literal() {
        assert_eq!(decode_entities("&#;"), "&#;");
        assert_eq!(decode_entities("&#xZZ;"), "&#xZZ;");
        assert_eq!(decode_entities("&#12"), "&#12");
        // surrogate code point is not a valid char
        assert_eq!(decode_entities("&#xD800;"), "&#xD800;");
    }

    #[test]
    fn test_decoded_ampersand_does_not_chain() {
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_encoded_tags_are_stripped() {
        assert_eq!(sanitize("&lt;script&gt;alert(1)&lt;/script&gt;ok", true), "alert(1)ok");
    }

    #[test]
    fn test_unclosed_angle_bracket_is_kept() {
        assert_eq!(sanitize("i < n", true), "i < n");
    }

    #[test]
    fn test_named_math_entities() {
        assert_eq!(
            sanitize("2 &times; 3 &le; 7 &ne; 8&hellip;", true),
            "2 \u{00D7} 3 \u{2264} 7 \u{2260} 8\u{2026}"
        );
    }

    #[test]
    fn test_line_endings_normalized() {
        assert_eq!(sanitize("a\r\nb\rc", true), "a\nb\nc");
    }

    #[test]
    fn test_horizontal_whitespace_collapsed_newlines_kept() {
        assert_eq!(sanitize("  a \t\t b\n\n c  ", true), "a b\n\n c");
    }

    #[test]
    fn test_nbsp_becomes_plain_space() {
        assert_eq!(sanitize("a&nbsp;&nbsp;b", true), "a b");
    }

    #[test]
    fn test_emoji_replaced_when_not_preserved() {
        assert_eq!(sanitize("Done \u{2705} fast \u{1F98A} !", false), "Done [check] fast !");
    }

    #[test]
    fn test_emoji_preserved_verbatim() {
        assert_eq!(sanitize("Done \u{2705}", true), "Done \u{2705}");
    }

    #[test]
    fn test_absent_field_is_empty() {
        assert_eq!(sanitize_field(None, false), "");
        assert_eq!(sanitize_field(Some("  <i>Easy</i> "), false), "Easy");
    }

    #[test]
    fn test_analysis_keeps_code_indentation() {
        let raw = "Intro   text\n```python\ndef f(x):\n    return  x &lt; 2\n```\nAfter";
        let out = sanitize_analysis(raw, false);
        assert_eq!(
            out,
            "Intro text\n```python\ndef f(x):\n    return  x < 2\n```\nAfter"
        );
    }

    #[test]
    fn test_analysis_trims_prose_lines() {
        let out = sanitize_analysis("   - item  \r\n\r\n  ## Head ", true);
        assert_eq!(out, "- item\n\n## Head");
    }

    #[test]
    fn test_analysis_unterminated_fence_stays_verbatim() {
        let out = sanitize_analysis("```\n  a\tb", true);
        assert_eq!(out, "```\n  a\tb");
    }

    #[test]
    fn test_analysis_decoded_carriage_returns_are_normalized() {
        for raw in ["a&#13;b", "a&#xD;b", "a&#13;&#10;b"] {
            assert_eq!(sanitize_analysis(raw, true), sanitize(raw, true));
            assert!(!sanitize_analysis(raw, true).contains('\r'));
        }
    }

    #[test]
    fn test_analysis_decoded_carriage_return_in_fence() {
        let out = sanitize_analysis("```\nx&#13;y\n```", true);
        assert_eq!(out, "```\nx\ny\n```");
    }
}
