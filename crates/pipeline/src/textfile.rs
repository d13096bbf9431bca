//! Text-file cleaner
//!
//! Format-specific rewrites for the two flavors of plain-text input:
//! raw proofing-round files (`projectID*.txt`) and post-processed
//! files. Both start with Project Gutenberg boilerplate stripping.

use regex::Regex;
use std::sync::LazyLock;

use crate::options::{Options, TxtCleanupType};
use crate::{PG_EBOOK_END1, PG_EBOOK_END2, PG_EBOOK_START1, PG_EBOOK_START2};

/// Which flavor of text file is being cleaned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    /// Raw text from a proofing round
    Rounds,
    /// Text finalized by a post-processor
    PostProcessed,
}

static PAGE_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-----File: \w+\.png.*").unwrap());
static OTHER_MARKUP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<.*?>").unwrap());
static PROOFERS_NOTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\*\*[^\]]*?\]").unwrap());
static THOUGHT_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\s+\*\s+\*\s+\*\s+\*").unwrap());

// Split words carry a `-*` at the break and a `*` before the remainder
static SPLIT_WORD_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+)-\*(\s+)\*").unwrap());
static SPLIT_WORD_ITALIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+)-\*_(\s+)_\*").unwrap());
static SPLIT_WORD_JOINED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+)-\*(\w+)").unwrap());

static FOOTNOTE_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[Footnote (\d+):([^\]]*?)\]").unwrap());
static FOOTNOTE_CONT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\[Footnote:([^\]]*?)\]").unwrap());
static ILLUSTRATION_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[Illustrations?:([^\]]*?)\]").unwrap());
static SIDENOTE_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[Sidenote:([^\]]*?)\]").unwrap());

pub(crate) static NBSP_NUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d)\x{00A0}(\d)").unwrap());

/// Remove the Project Gutenberg header and footer if present
pub fn strip_pg_boilerplate(text: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();
    for line in text.lines() {
        // PG lacks consistency; two marker spellings each
        if line.starts_with(PG_EBOOK_START1) || line.starts_with(PG_EBOOK_START2) {
            kept.clear();
        } else if line.starts_with(PG_EBOOK_END1) || line.starts_with(PG_EBOOK_END2) {
            break;
        } else {
            kept.push(line);
        }
    }
    kept.join("\n")
}

/// Clean a text file according to its kind and the cleanup options
pub fn clean_text(input: &str, kind: TextKind, opts: &Options) -> String {
    let mut text = strip_pg_boilerplate(input);

    if opts.txt_cleanup_type == TxtCleanupType::None {
        return text;
    }

    match kind {
        TextKind::Rounds => {
            // Page markers and blank pages
            text = PAGE_MARKER_RE.replace_all(&text, "").into_owned();
            text = text.replace("[Blank Page]", "");

            if opts.txt_cleanup_type == TxtCleanupType::Proofers {
                return text;
            }

            // Best effort from here on.
            if opts.ignore_format {
                for markup in ["<i>", "</i>", "<b>", "</b>"] {
                    text = text.replace(markup, "");
                }
            } else {
                for markup in ["<i>", "</i>"] {
                    text = text.replace(markup, "_");
                }
                for markup in ["<b>", "</b>"] {
                    text = text.replace(markup, "=");
                }
            }
            // Whatever inline markup is left
            text = OTHER_MARKUP_RE.replace_all(&text, "").into_owned();

            if opts.suppress_proofers_notes {
                text = PROOFERS_NOTE_RE.replace_all(&text, "").into_owned();
            }

            if opts.regroup_split_words {
                text = SPLIT_WORD_BREAK_RE.replace_all(&text, "$2$1").into_owned();
                text = SPLIT_WORD_ITALIC_RE.replace_all(&text, "$2$1").into_owned();
                text = SPLIT_WORD_JOINED_RE.replace_all(&text, "$1$2").into_owned();
            }

            // Block markup pairs on their own lines
            for markup in ["/*", "*/", "/#", "#/", "/P", "P/", "/F", "F/", "/X", "X/"] {
                text = text.replace(&format!("\n{}\n", markup), "\n\n");
            }
        }

        TextKind::PostProcessed => {
            text = THOUGHT_BREAK_RE.replace_all(&text, "").into_owned();

            if opts.ignore_format {
                // Lossy when these occur naturally; kept as-is
                text = text.replace('_', "");
                text = text.replace('=', "");
            }
        }
    }

    // Bracketed tag suppression shared by both kinds
    if opts.ignore_format || opts.suppress_footnote_tags {
        text = FOOTNOTE_TAG_RE.replace_all(&text, "$1 $2").into_owned();
        text = FOOTNOTE_CONT_RE.replace_all(&text, "$1").into_owned();
    }
    if opts.ignore_format || opts.suppress_illustration_tags {
        text = ILLUSTRATION_TAG_RE.replace_all(&text, "$1").into_owned();
        text = text.replace("[Illustration]", "");
    }
    if opts.ignore_format || opts.suppress_sidenote_tags {
        text = SIDENOTE_TAG_RE.replace_all(&text, "$1").into_owned();
    }

    // Soft hyphens never survive; no-break spaces between digits only
    // when asked (e.g. 250 000 vs 250000)
    text = text.replace('\u{00AD}', "");
    if opts.suppress_nbsp_num {
        text = NBSP_NUM_RE.replace_all(&text, "$1$2").into_owned();
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> Options {
        Options::default()
    }

    #[test]
    fn test_strip_boilerplate() {
        let input = "junk header\n*** START OF THE PROJECT GUTENBERG EBOOK X ***\nbody line\n*** END OF THE PROJECT GUTENBERG EBOOK X ***\nlicense";
        assert_eq!(strip_pg_boilerplate(input), "body line");
    }

    #[test]
    fn test_strip_boilerplate_absent() {
        assert_eq!(strip_pg_boilerplate("a\nb"), "a\nb");
    }

    #[test]
    fn test_cleanup_none_only_strips_boilerplate() {
        let mut o = opts();
        o.txt_cleanup_type = TxtCleanupType::None;
        let out = clean_text("-----File: 001.png ---\n<i>x</i>\n", TextKind::Rounds, &o);
        assert!(out.contains("-----File"));
        assert!(out.contains("<i>"));
    }

    #[test]
    fn test_cleanup_proofers_strips_page_markers() {
        let mut o = opts();
        o.txt_cleanup_type = TxtCleanupType::Proofers;
        let out = clean_text(
            "-----File: 001.png --- proofers\nkeep\n[Blank Page]\n<i>x</i>",
            TextKind::Rounds,
            &o,
        );
        assert!(!out.contains("-----File"));
        assert!(!out.contains("[Blank Page]"));
        // best-effort steps not reached
        assert!(out.contains("<i>"));
    }

    #[test]
    fn test_rounds_italic_bold_sentinels() {
        let out = clean_text("<i>one</i> <b>two</b>", TextKind::Rounds, &opts());
        assert_eq!(out, "_one_ =two=");
    }

    #[test]
    fn test_rounds_ignore_format_strips_markup() {
        let mut o = opts();
        o.ignore_format = true;
        let out = clean_text("<i>one</i> <b>two</b>", TextKind::Rounds, &o);
        assert!(out.starts_with("one two"));
    }

    #[test]
    fn test_rounds_other_markup_removed() {
        let out = clean_text("a <sc>small</sc> word", TextKind::Rounds, &opts());
        assert_eq!(out, "a small word");
    }

    #[test]
    fn test_proofers_notes() {
        let mut o = opts();
        o.suppress_proofers_notes = true;
        let out = clean_text("word[**typo?] more", TextKind::Rounds, &o);
        assert_eq!(out, "word more");

        // without the flag the note is retained
        let kept = clean_text("word[**typo?] more", TextKind::Rounds, &opts());
        assert!(kept.contains("[**typo?]"));
    }

    #[test]
    fn test_regroup_split_words() {
        let mut o = opts();
        o.regroup_split_words = true;
        let out = clean_text("wo-* *rds", TextKind::Rounds, &o);
        assert_eq!(out.trim(), "words");

        let across_lines = clean_text("beauti-*\n*ful", TextKind::Rounds, &o);
        assert_eq!(across_lines.trim(), "beautiful");

        // without the flag the split is unchanged
        let kept = clean_text("wo-* *rds", TextKind::Rounds, &opts());
        assert_eq!(kept, "wo-* *rds");
    }

    #[test]
    fn test_block_markup_pairs() {
        let out = clean_text("before\n/*\npoetry line\n*/\nafter", TextKind::Rounds, &opts());
        assert!(!out.contains("/*"));
        assert!(!out.contains("*/"));
        assert!(out.contains("poetry line"));
    }

    #[test]
    fn test_thought_breaks_removed() {
        let out = clean_text(
            "one\n*     *     *     *     *\ntwo",
            TextKind::PostProcessed,
            &opts(),
        );
        assert!(!out.contains('*'));
        assert!(out.contains("one"));
        assert!(out.contains("two"));
    }

    #[test]
    fn test_pp_ignore_format_strips_sentinels() {
        let mut o = opts();
        o.ignore_format = true;
        let out = clean_text("_italic_ and =bold=", TextKind::PostProcessed, &o);
        assert_eq!(out, "italic and bold");
    }

    #[test]
    fn test_footnote_tag_suppression() {
        let mut o = opts();
        o.suppress_footnote_tags = true;
        let out = clean_text("[Footnote 3: so it goes]", TextKind::PostProcessed, &o);
        assert_eq!(out, "3  so it goes");
    }

    #[test]
    fn test_illustration_tag_suppression() {
        let mut o = opts();
        o.suppress_illustration_tags = true;
        let out = clean_text(
            "[Illustration: A map] and [Illustration]",
            TextKind::PostProcessed,
            &o,
        );
        assert_eq!(out, " A map and ");
    }

    #[test]
    fn test_sidenote_tag_suppression() {
        let mut o = opts();
        o.suppress_sidenote_tags = true;
        let out = clean_text("[Sidenote: 1867] text", TextKind::PostProcessed, &o);
        assert_eq!(out, " 1867 text");
    }

    #[test]
    fn test_soft_hyphen_always_removed() {
        let out = clean_text("co\u{00AD}operate", TextKind::PostProcessed, &opts());
        assert_eq!(out, "cooperate");
    }

    #[test]
    fn test_nbsp_between_digits() {
        let mut o = opts();
        o.suppress_nbsp_num = true;
        let out = clean_text("250\u{00A0}000 but a\u{00A0}b", TextKind::PostProcessed, &o);
        assert_eq!(out, "250000 but a\u{00A0}b");
    }
}
