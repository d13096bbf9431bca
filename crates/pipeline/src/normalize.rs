//! Common normalizer
//!
//! Character conversions shared by both sides. A fancy character is
//! downgraded to its plain form on one side only when the other side
//! contains no occurrence of it; when both sides (or neither) carry the
//! character, it is left alone everywhere. This keeps the word-diff
//! small without flattening typography both renditions agree on.

/// A (fancy, plain) conversion pair
pub type CharPair = (&'static str, &'static str);

/// The conversion vocabulary, checked in order
pub const CHAR_PAIRS: &[CharPair] = &[
    ("\u{2019}", "'"),   // close curly quote
    ("\u{2018}", "'"),   // open curly quote
    ("\u{201D}", "\""),  // close curly double quote
    ("\u{201C}", "\""),  // open curly double quote
    ("º", "o"),          // ordinal o
    ("ª", "a"),          // ordinal a
    ("\u{2013}", "-"),   // en dash
    ("\u{2014}", "--"),  // em dash
    ("\u{2044}", "/"),   // fraction slash
    ("\u{2032}", "'"),   // prime
    ("\u{2033}", "''"),  // double prime
    ("\u{2034}", "'''"), // triple prime
    ("₀", "0"),
    ("₁", "1"),
    ("₂", "2"),
    ("₃", "3"),
    ("₄", "4"),
    ("₅", "5"),
    ("₆", "6"),
    ("₇", "7"),
    ("₈", "8"),
    ("₉", "9"),
    ("⁰", "0"),
    ("¹", "1"),
    ("²", "2"),
    ("³", "3"),
    ("⁴", "4"),
    ("⁵", "5"),
    ("⁶", "6"),
    ("⁷", "7"),
    ("⁸", "8"),
    ("⁹", "9"),
];

/// Decide which conversions each side needs. `left` and `right` are the
/// full normalized streams of each side (main text plus footnotes).
pub fn plan_conversions(left: &str, right: &str) -> (Vec<CharPair>, Vec<CharPair>) {
    let mut left_pairs = Vec::new();
    let mut right_pairs = Vec::new();

    for &(fancy, plain) in CHAR_PAIRS {
        match (left.contains(fancy), right.contains(fancy)) {
            // Only one side has it: downgrade that side
            (true, false) => left_pairs.push((fancy, plain)),
            (false, true) => right_pairs.push((fancy, plain)),
            // Both or neither: leave untouched
            _ => {}
        }
    }

    (left_pairs, right_pairs)
}

/// Apply a conversion plan to one stream
pub fn apply_conversions(text: &str, pairs: &[CharPair]) -> String {
    let mut text = text.to_string();
    for &(fancy, plain) in pairs {
        text = text.replace(fancy, plain);
    }
    text
}
