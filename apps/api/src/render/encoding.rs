//! WinAnsi encoding for the standard PDF fonts.

/// Characters in the 0x80..=0x9F block of WinAnsiEncoding.
static WIN_ANSI_EXTRAS: &[(char, u8)] = &[
    ('\u{20AC}', 0x80),
    ('\u{201A}', 0x82),
    ('\u{0192}', 0x83),
    ('\u{201E}', 0x84),
    ('\u{2026}', 0x85),
    ('\u{2020}', 0x86),
    ('\u{2021}', 0x87),
    ('\u{02C6}', 0x88),
    ('\u{2030}', 0x89),
    ('\u{0160}', 0x8A),
    ('\u{2039}', 0x8B),
    ('\u{0152}', 0x8C),
    ('\u{017D}', 0x8E),
    ('\u{2018}', 0x91),
    ('\u{2019}', 0x92),
    ('\u{201C}', 0x93),
    ('\u{201D}', 0x94),
    ('\u{2022}', 0x95),
    ('\u{2013}', 0x96),
    ('\u{2014}', 0x97),
    ('\u{02DC}', 0x98),
    ('\u{2122}', 0x99),
    ('\u{0161}', 0x9A),
    ('\u{203A}', 0x9B),
    ('\u{0153}', 0x9C),
    ('\u{017E}', 0x9E),
    ('\u{0178}', 0x9F),
];

/// ASCII stand-ins for common symbols WinAnsi cannot show.
static TRANSLITERATIONS: &[(char, &str)] = &[
    ('\u{2264}', "<="),
    ('\u{2265}', ">="),
    ('\u{2260}', "!="),
    ('\u{2192}', "->"),
    ('\u{2190}', "<-"),
    ('\u{21D2}', "=>"),
    ('\u{2248}', "~"),
    ('\u{221E}', "inf"),
    ('\u{2211}', "sum"),
];

/// Byte for `c` in WinAnsiEncoding, if it has one.
pub fn win_ansi_byte(c: char) -> Option<u8> {
    match c as u32 {
        0x20..=0x7E | 0xA0..=0xFF => Some(c as u32 as u8),
        0x09 => Some(b' '),
        _ => WIN_ANSI_EXTRAS
            .iter()
            .find(|(ch, _)| *ch == c)
            .map(|(_, b)| *b),
    }
}

pub fn transliterate(c: char) -> Option<&'static str> {
    TRANSLITERATIONS
        .iter()
        .find(|(ch, _)| *ch == c)
        .map(|(_, s)| *s)
}

/// Appends `bytes` as a PDF literal string, escaping delimiters and non-ASCII bytes.
pub fn push_literal_string(out: &mut Vec<u8>, bytes: &[u8]) {
    out.push(b'(');
    for &b in bytes {
        match b {
            b'(' | b')' | b'\\' => {
                out.push(b'\\');
                out.push(b);
            }
            0x20..=0x7E => out.push(b),
            _ => out.extend_from_slice(format!("\\{b:03o}").as_bytes()),
        }
    }
    out.push(b')');
}

/// Appends glyph ids as a PDF hex string (two bytes per glyph, Identity-H).
pub fn push_hex_glyphs(out: &mut Vec<u8>, glyphs: &[u16]) {
    out.push(b'<');
    for gid in glyphs {
        out.extend_from_slice(format!("{gid:04X}").as_bytes());
    }
    out.push(b'>');
}
