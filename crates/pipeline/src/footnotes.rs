//! Footnote extractor
//!
//! Recognizes the footnote conventions of each input form, removes the
//! footnote blocks from the main stream, and returns them concatenated
//! in source order. Anchors are normalized to the bracketed form `[N]`.
//! Recognition is best-effort: when nothing matches, the main stream is
//! returned untouched and the footnote stream is empty.

use regex::Regex;
use std::sync::LazyLock;

use proofdiff_dom::{DomTree, ElementData, NodeId};
use proofdiff_transform::serialize_text;

use crate::textfile::TextKind;

// Rounds form: [Footnote 1: text] to the closing bracket at end of line
static ROUNDS_FN_NUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[Footnote (\d+): ").unwrap());
static ROUNDS_FN_BARE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[Footnote: ").unwrap());

// Post-processed styles
static BRACKET_NOTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\[([\w-]+)\](.*)$").unwrap());
static LABELED_NOTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Footnote (\d+):\s*(.*)$").unwrap());
static SUPERSCRIPT_NOTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([\x{00B9}\x{00B2}\x{00B3}\x{2070}-\x{2079}]+)\s+(.*)$").unwrap()
});

// Leading-anchor shapes found inside extracted footnote text
static ANCHOR_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?s)^\s*\[([\w-]+)\]\s*(.*)$").unwrap(),
        Regex::new(r"(?s)^\s*(\d+)\s+(.*)$").unwrap(),
        Regex::new(r"(?s)^\s*(\d+):\s*(.*)$").unwrap(),
        Regex::new(r"(?s)^\s*Note (\d+):\s+(.*)$").unwrap(),
    ]
});

/// Extract footnotes from a cleaned text stream. Returns the main
/// stream without footnotes, and the footnote stream.
pub fn extract_text_footnotes(text: &str, kind: TextKind) -> (String, String) {
    match kind {
        TextKind::Rounds => extract_rounds(text),
        TextKind::PostProcessed => extract_post_processed(text),
    }
}

/// Rounds form: a block opens with `[Footnote N:` (or `[Footnote:`) and
/// runs to a line ending in `]`. A line ending in `]*` closes a block
/// that a later `*[Footnote:` block continues.
fn extract_rounds(text: &str) -> (String, String) {
    let mut in_footnote = false;
    let mut current: Vec<String> = Vec::new();
    let mut main: Vec<String> = Vec::new();
    let mut notes: Vec<Vec<String>> = Vec::new();

    for raw in text.lines() {
        let mut line = raw.to_string();

        if line.contains("[Footnote") {
            in_footnote = true;

            if line.contains("*[Footnote") {
                // Continuation of the previous footnote
                line = ROUNDS_FN_BARE_RE.replace(&line, "").into_owned();
                line = line.replacen('*', "", 1);
                current = notes.pop().unwrap_or_default();
            } else {
                current = Vec::new();
                line = if let Some(caps) = ROUNDS_FN_NUM_RE.captures(&line) {
                    let anchor = format!("[{}] ", &caps[1]);
                    ROUNDS_FN_NUM_RE.replace(&line, anchor.as_str()).into_owned()
                } else {
                    ROUNDS_FN_BARE_RE.replace(&line, "").into_owned()
                };
            }
        }

        if in_footnote {
            if line.ends_with(']') {
                line.pop();
                current.push(line);
                notes.push(std::mem::take(&mut current));
                in_footnote = false;
            } else if line.ends_with("]*") {
                line.truncate(line.len() - 2);
                current.push(line);
                notes.push(std::mem::take(&mut current));
                in_footnote = false;
            } else {
                current.push(line);
            }
        } else {
            main.push(line);
        }
    }

    // Unterminated footnote at EOF: keep what was gathered
    if in_footnote && !current.is_empty() {
        notes.push(current);
    }

    if notes.is_empty() {
        return (text.to_string(), String::new());
    }

    let notes_text: Vec<String> = notes.iter().map(|n| n.join("\n")).collect();
    (main.join("\n"), notes_text.join("\n"))
}

/// Post-processed form: three block styles, tried in priority order at
/// the start of each block. The first success consumes the block.
fn extract_post_processed(text: &str) -> (String, String) {
    let lines: Vec<&str> = text.lines().collect();
    let mut main: Vec<String> = Vec::new();
    let mut notes: Vec<String> = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let at_block_start = i == 0 || lines[i - 1].is_empty();
        if at_block_start && !lines[i].is_empty() {
            if let Some((note, consumed)) = try_bracket_style(&lines, i)
                .or_else(|| try_labeled_style(&lines, i))
                .or_else(|| try_superscript_style(&lines, i))
            {
                notes.push(note);
                i += consumed;
                continue;
            }
        }
        main.push(lines[i].to_string());
        i += 1;
    }

    if notes.is_empty() {
        return (text.to_string(), String::new());
    }

    (main.join("\n"), notes.join("\n\n"))
}

/// Style 1: `[N]` opening a block; runs to the next `[N]` block or two
/// consecutive blank lines.
fn try_bracket_style(lines: &[&str], start: usize) -> Option<(String, usize)> {
    let caps = BRACKET_NOTE_RE.captures(lines[start])?;
    let anchor = &caps[1];
    if is_illustration_anchor(anchor) {
        return None;
    }

    let mut note = vec![format!("[{}]{}", anchor, &caps[2])];
    let mut i = start + 1;
    let mut blanks = 0;

    while i < lines.len() {
        if lines[i].is_empty() {
            blanks += 1;
            i += 1;
            if blanks >= 2 {
                break;
            }
            continue;
        }
        if blanks > 0 && BRACKET_NOTE_RE.is_match(lines[i]) {
            break;
        }
        for _ in 0..blanks {
            note.push(String::new());
        }
        blanks = 0;
        note.push(lines[i].to_string());
        i += 1;
    }

    Some((note.join("\n"), i - start))
}

/// Style 2: `Footnote N:`; continuation lines are indented (two or more
/// spaces) or blank; ends at the next marker or the first unindented
/// non-blank line.
fn try_labeled_style(lines: &[&str], start: usize) -> Option<(String, usize)> {
    let caps = LABELED_NOTE_RE.captures(lines[start])?;
    let anchor = format!("[{}]", &caps[1]);
    labeled_block(lines, start, format!("{} {}", anchor, &caps[2]), &LABELED_NOTE_RE)
}

/// Style 3: a superscript digit (possibly several) followed by
/// whitespace; terminated like style 2.
fn try_superscript_style(lines: &[&str], start: usize) -> Option<(String, usize)> {
    let caps = SUPERSCRIPT_NOTE_RE.captures(lines[start])?;
    let digits: String = caps[1].chars().filter_map(superscript_digit).collect();
    let first = format!("[{}] {}", digits, &caps[2]);
    labeled_block(lines, start, first, &SUPERSCRIPT_NOTE_RE)
}

/// Shared body/termination scan for styles 2 and 3
fn labeled_block(
    lines: &[&str],
    start: usize,
    first_line: String,
    marker: &Regex,
) -> Option<(String, usize)> {
    let mut note = vec![first_line];
    let mut i = start + 1;

    while i < lines.len() {
        let line = lines[i];
        if line.is_empty() {
            note.push(String::new());
            i += 1;
            continue;
        }
        if marker.is_match(line) {
            break;
        }
        if line.starts_with("  ") {
            note.push(line.to_string());
            i += 1;
            continue;
        }
        break; // first unindented non-blank line
    }

    // Trailing blank lines belong to the main stream
    let mut consumed = i - start;
    while matches!(note.last().map(String::as_str), Some("")) {
        note.pop();
        consumed -= 1;
    }

    Some((note.join("\n"), consumed))
}

/// Block openers that look like anchors but mark artwork
fn is_illustration_anchor(anchor: &str) -> bool {
    ["Illustration", "Décoration", "Bandeau", "Logo", "Ornement"]
        .iter()
        .any(|prefix| anchor.starts_with(prefix))
}

/// Map a superscript digit to its plain form
fn superscript_digit(c: char) -> Option<char> {
    match c {
        '\u{2070}' => Some('0'),
        '\u{00B9}' => Some('1'),
        '\u{00B2}' => Some('2'),
        '\u{00B3}' => Some('3'),
        '\u{2074}' => Some('4'),
        '\u{2075}' => Some('5'),
        '\u{2076}' => Some('6'),
        '\u{2077}' => Some('7'),
        '\u{2078}' => Some('8'),
        '\u{2079}' => Some('9'),
        _ => None,
    }
}

/// Extract footnote elements from an HTML tree: any element whose
/// `class` carries the `footnote` token or whose `id` starts with
/// `Footnote_`. Matched subtrees are serialized into the footnote
/// stream and detached from the tree. Nested matches inside an already
/// matched element are not re-extracted.
pub fn extract_html_footnotes(tree: &mut DomTree) -> String {
    let document_id = tree.document_id();
    let mut matched: Vec<NodeId> = Vec::new();

    for id in tree.descendants(document_id) {
        let is_footnote = tree
            .get(id)
            .and_then(|n| n.as_element())
            .map(is_footnote_element)
            .unwrap_or(false);
        if !is_footnote {
            continue;
        }
        if matched.iter().any(|&m| tree.is_descendant_of(id, m)) {
            continue;
        }
        matched.push(id);
    }

    let mut notes = Vec::new();
    for id in matched {
        let text = serialize_text(tree, id);
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            notes.push(normalize_anchor(trimmed));
        }
        tree.detach(id).ok();
    }

    notes.join("\n")
}

fn is_footnote_element(elem: &ElementData) -> bool {
    elem.has_class("footnote")
        || elem.id().map(|id| id.starts_with("Footnote_")).unwrap_or(false)
}

/// Rewrite a leading anchor to the canonical `[N]` form. Text without a
/// recognizable anchor is returned unchanged.
fn normalize_anchor(text: &str) -> String {
    for re in ANCHOR_RES.iter() {
        if let Some(caps) = re.captures(text) {
            return format!("[{}] {}", &caps[1], caps[2].trim_start());
        }
    }
    text.to_string()
}
