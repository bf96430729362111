//! Text normalization module
//!
//! Rewrites input text before matching: collapses spaced-out letters, strips
//! noise characters and decodes leet-speak. Every character of the normalized
//! text remembers the byte span of the input it came from, so matches found
//! in normalized text can be reported and replaced in the caller's text.

use std::ops::Range;

/// Allowed punctuation in [`ReplaceMode::StripNonAlphanumeric`] mode
const KEPT_PUNCTUATION: &str = ",?!-;:\"'.";

/// Multi-glyph leet sequences, longest first
const ADVANCED_LEET: &[(&str, char)] = &[
    ("/\\/\\", 'm'),
    ("|\\/|", 'm'),
    ("|V|", 'm'),
    ("|-|", 'h'),
    ("]-[", 'h'),
    ("|_|", 'u'),
    ("}{", 'h'),
    ("|<", 'k'),
    ("|{", 'k'),
    ("|)", 'd'),
    ("()", 'o'),
    ("><", 'x'),
    (")(", 'x'),
    ("\\/", 'v'),
    ("/\\", 'a'),
];

/// Which decoding pass runs after space collapsing and character stripping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplaceMode {
    #[default]
    None,
    /// Drop everything except letters, digits, whitespace and basic punctuation
    StripNonAlphanumeric,
    /// Single-character leet substitutions
    LeetBasic,
    /// Multi-glyph substitutions followed by the basic pass
    LeetAdvanced,
}

/// Normalization options
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    pub mode: ReplaceMode,
    /// Join runs of short space-separated tokens ("b a d" -> "bad")
    pub collapse_spaces: bool,
    /// Tokens up to this many characters count as short
    pub max_token_length: usize,
    /// Characters removed before decoding
    pub strip_chars: String,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            mode: ReplaceMode::None,
            collapse_spaces: false,
            max_token_length: 1,
            strip_chars: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Unit {
    ch: char,
    start: usize,
    end: usize,
}

/// Normalized view of a text with an offset map back to the original
#[derive(Debug, Clone)]
pub struct Normalized<'a> {
    original: &'a str,
    text: String,
    units: Vec<Unit>,
    /// Byte offset in `text` of each unit
    offsets: Vec<usize>,
}

impl<'a> Normalized<'a> {
    /// Run every enabled pass over `original`
    pub fn new(original: &'a str, options: &NormalizeOptions) -> Self {
        let mut units = units_of(original);

        if options.collapse_spaces {
            units = collapse_spaces(units, options.max_token_length);
        }

        if !options.strip_chars.is_empty() {
            units.retain(|u| !options.strip_chars.contains(u.ch));
        }

        match options.mode {
            ReplaceMode::None => {}
            ReplaceMode::StripNonAlphanumeric => {
                units.retain(|u| {
                    u.ch.is_alphanumeric() || u.ch.is_whitespace() || KEPT_PUNCTUATION.contains(u.ch)
                });
            }
            ReplaceMode::LeetBasic => decode_basic(&mut units),
            ReplaceMode::LeetAdvanced => {
                units = decode_advanced(units);
                decode_basic(&mut units);
            }
        }

        Self::from_units(original, units)
    }

    /// The text itself, without any rewriting
    pub fn identity(original: &'a str) -> Self {
        Self::from_units(original, units_of(original))
    }

    fn from_units(original: &'a str, units: Vec<Unit>) -> Self {
        let mut text = String::with_capacity(original.len());
        let mut offsets = Vec::with_capacity(units.len());
        for unit in &units {
            offsets.push(text.len());
            text.push(unit.ch);
        }

        Self {
            original,
            text,
            units,
            offsets,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn original(&self) -> &'a str {
        self.original
    }

    /// Lowercased copy that keeps the mapping to the original text
    pub fn to_lowercase(&self) -> Normalized<'a> {
        let units = self
            .units
            .iter()
            .flat_map(|u| {
                u.ch.to_lowercase().map(move |ch| Unit {
                    ch,
                    start: u.start,
                    end: u.end,
                })
            })
            .collect();

        Self::from_units(self.original, units)
    }

    /// Map a byte range of the normalized text to the byte range of the
    /// original text it was produced from. Empty ranges map to `None`.
    pub fn original_span(&self, range: Range<usize>) -> Option<Range<usize>> {
        let first = self.offsets.partition_point(|&o| o < range.start);
        let last = self.offsets.partition_point(|&o| o < range.end);

        if first >= last {
            return None;
        }

        Some(self.units[first].start..self.units[last - 1].end)
    }
}

/// Normalize `text` and return only the rewritten string
pub fn normalize(text: &str, options: &NormalizeOptions) -> String {
    Normalized::new(text, options).text
}

fn units_of(text: &str) -> Vec<Unit> {
    text.char_indices()
        .map(|(start, ch)| Unit {
            ch,
            start,
            end: start + ch.len_utf8(),
        })
        .collect()
}

/// Drop the space between two neighbouring short tokens. A space next to a
/// longer token is kept.
fn collapse_spaces(units: Vec<Unit>, max_token_length: usize) -> Vec<Unit> {
    let separators: Vec<Unit> = units.iter().filter(|u| u.ch == ' ').copied().collect();
    if separators.is_empty() {
        return units;
    }

    let tokens: Vec<&[Unit]> = units.split(|u| u.ch == ' ').collect();
    let is_short = |token: &[Unit]| token.len() <= max_token_length;

    let mut out = Vec::with_capacity(units.len());
    out.extend_from_slice(tokens[0]);

    for (i, separator) in separators.iter().enumerate() {
        let left = tokens[i];
        let right = tokens[i + 1];

        if !(is_short(left) && is_short(right)) {
            out.push(*separator);
        }
        out.extend_from_slice(right);
    }

    out
}

fn decode_basic(units: &mut [Unit]) {
    for unit in units.iter_mut() {
        if let Some(ch) = basic_leet(unit.ch) {
            unit.ch = ch;
        }
    }
}

fn basic_leet(ch: char) -> Option<char> {
    let decoded = match ch {
        '@' | '4' | '^' => 'a',
        '8' => 'b',
        '©' | '¢' => 'c',
        '3' | '€' | '£' => 'e',
        'ƒ' => 'f',
        '6' | '9' => 'g',
        '#' => 'h',
        '1' | '!' | '|' => 'i',
        '0' => 'o',
        '®' => 'r',
        '$' | '5' | '§' => 's',
        '7' | '+' => 't',
        'µ' => 'u',
        '¥' => 'y',
        '2' => 'z',
        _ => return None,
    };
    Some(decoded)
}

fn decode_advanced(units: Vec<Unit>) -> Vec<Unit> {
    let mut out = Vec::with_capacity(units.len());
    let mut i = 0;

    'scan: while i < units.len() {
        for &(glyph, replacement) in ADVANCED_LEET {
            let n = glyph.chars().count();
            if i + n <= units.len() && units[i..i + n].iter().map(|u| u.ch).eq(glyph.chars()) {
                out.push(Unit {
                    ch: replacement,
                    start: units[i].start,
                    end: units[i + n - 1].end,
                });
                i += n;
                continue 'scan;
            }
        }

        out.push(units[i]);
        i += 1;
    }

    out
}
