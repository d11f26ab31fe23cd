//! Emoji substitution tables.
//!
//! Known emoji are replaced by a short bracketed token so the meaning survives a
//! text-only font. Anything else inside the emoji code-point ranges becomes a
//! single space; the caller re-collapses whitespace afterwards.

/// Known emoji → textual token. Matched before the range fallback.
/// Multi-codepoint sequences must come before their prefixes.
static KNOWN_EMOJI: &[(&str, &str)] = &[
    ("\u{26A0}\u{FE0F}", "[warning]"),
    ("\u{23F1}\u{FE0F}", "[time]"),
    ("\u{27A1}\u{FE0F}", "->"),
    ("\u{1F680}", "[rocket]"),
    ("\u{2705}", "[check]"),
    ("\u{2714}", "[check]"),
    ("\u{2713}", "[check]"),
    ("\u{274C}", "[x]"),
    ("\u{26A0}", "[warning]"),
    ("\u{1F4A1}", "[idea]"),
    ("\u{1F525}", "[fire]"),
    ("\u{2B50}", "[star]"),
    ("\u{1F31F}", "[star]"),
    ("\u{2728}", "[sparkles]"),
    ("\u{1F4DD}", "[note]"),
    ("\u{1F4CC}", "[pin]"),
    ("\u{1F3AF}", "[target]"),
    ("\u{23F1}", "[time]"),
    ("\u{23F0}", "[time]"),
    ("\u{1F4CA}", "[chart]"),
    ("\u{1F4C8}", "[chart]"),
    ("\u{1F9E0}", "[brain]"),
    ("\u{1F914}", "[thinking]"),
    ("\u{1F41B}", "[bug]"),
    ("\u{1F50D}", "[search]"),
    ("\u{1F4BB}", "[code]"),
    ("\u{1F3C6}", "[trophy]"),
    ("\u{1F44D}", "[ok]"),
    ("\u{1F4DA}", "[books]"),
    ("\u{1F389}", "[party]"),
    ("\u{27A1}", "->"),
];

/// Inclusive code-point ranges treated as emoji.
static EMOJI_RANGES: &[(u32, u32)] = &[
    (0x1F300, 0x1F5FF), // misc symbols & pictographs (includes skin-tone modifiers)
    (0x1F600, 0x1F64F), // emoticons
    (0x1F680, 0x1F6FF), // transport & map
    (0x1F700, 0x1F77F), // alchemical
    (0x1F900, 0x1F9FF), // supplemental symbols & pictographs
    (0x1FA70, 0x1FAFF), // symbols & pictographs extended-A
    (0x1F1E6, 0x1F1FF), // regional indicators
    (0x2600, 0x26FF),   // misc symbols
    (0x2700, 0x27BF),   // dingbats
    (0x231A, 0x231B),
    (0x23E9, 0x23F3),
    (0x23F8, 0x23FA),
    (0x2B50, 0x2B55),
    (0xFE00, 0xFE0F), // variation selectors
    (0x200D, 0x200D), // zero-width joiner
    (0x20E3, 0x20E3), // combining enclosing keycap
];

pub fn is_emoji(c: char) -> bool {
    let code = c as u32;
    EMOJI_RANGES
        .iter()
        .any(|&(lo, hi)| (lo..=hi).contains(&code))
}

/// True for code points that only modify a neighbouring emoji and have no glyph of their own.
pub fn is_emoji_modifier(c: char) -> bool {
    matches!(c as u32, 0xFE00..=0xFE0F | 0x200D | 0x1F3FB..=0x1F3FF)
}

/// Replaces emoji with tokens or spaces. Does not collapse the spaces it introduces.
pub fn replace_emoji(text: &str) -> String {
    if !text.chars().any(is_emoji) {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    'outer: while let Some(c) = rest.chars().next() {
        if is_emoji(c) {
            for (emoji, token) in KNOWN_EMOJI {
                if let Some(after) = rest.strip_prefix(emoji) {
                    out.push_str(token);
                    rest = after;
                    continue 'outer;
                }
            }
            out.push(' ');
        } else {
            out.push(c);
        }
        rest = &rest[c.len_utf8()..];
    }
    out
}
