//! Pipeline driver
//!
//! Classifies each input, runs the per-side pipeline, then the shared
//! normalization across both sides. The product is a pair of flat-text
//! streams per side (main text, footnotes) ready for an external
//! word-diff.

use log::debug;
use std::path::Path;

use crate::error::{PipelineError, PipelineResult};
use crate::footnotes::extract_text_footnotes;
use crate::lower::lower_html;
use crate::normalize::{apply_conversions, plan_conversions, CharPair};
use crate::options::Options;
use crate::textfile::{clean_text, TextKind};

/// What kind of input a file is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Markup-structured rendition
    Html,
    /// Raw proofing-round text
    RoundsText,
    /// Post-processed text
    PostProcessedText,
}

/// One side of the comparison after normalization
#[derive(Debug)]
pub struct ProcessedFile {
    /// Input file name
    pub name: String,
    /// How the input was classified
    pub kind: InputKind,
    /// Normalized main stream
    pub text: String,
    /// Normalized footnote stream (empty unless extraction is on)
    pub footnotes: String,
    /// Non-fatal problems encountered on the way
    pub warnings: Vec<String>,
}

/// Classify an input by extension and name prefix
pub fn classify(name: &str) -> PipelineResult<InputKind> {
    let path = Path::new(name);
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("htm") | Some("html") | Some("xhtml") => Ok(InputKind::Html),
        Some("txt") => {
            let file_name = path.file_name().and_then(|f| f.to_str()).unwrap_or("");
            // The prefix is case-sensitive
            if file_name.starts_with("projectID") {
                Ok(InputKind::RoundsText)
            } else {
                Ok(InputKind::PostProcessedText)
            }
        }
        _ => Err(PipelineError::UnrecognizedInput(name.to_string())),
    }
}

/// Run the per-side pipeline over one input
pub fn process_file(name: &str, contents: &str, opts: &Options) -> PipelineResult<ProcessedFile> {
    if contents.chars().count() < 10 {
        return Err(PipelineError::InputTooShort(name.to_string()));
    }

    let kind = classify(name)?;
    debug!("processing {} as {:?}", name, kind);

    match kind {
        InputKind::Html => {
            let lowered = lower_html(name, contents, opts)?;
            Ok(ProcessedFile {
                name: name.to_string(),
                kind,
                text: lowered.text,
                footnotes: lowered.footnotes,
                warnings: lowered.warnings,
            })
        }
        InputKind::RoundsText | InputKind::PostProcessedText => {
            let text_kind = match kind {
                InputKind::RoundsText => TextKind::Rounds,
                _ => TextKind::PostProcessed,
            };
            Ok(ProcessedFile {
                name: name.to_string(),
                kind,
                text: clean_text(contents, text_kind, opts),
                footnotes: String::new(),
                warnings: Vec::new(),
            })
        }
    }
}

/// Process both inputs and apply the cross-side normalization
pub fn process_pair(
    left_name: &str,
    left_contents: &str,
    right_name: &str,
    right_contents: &str,
    opts: &Options,
) -> PipelineResult<(ProcessedFile, ProcessedFile)> {
    let mut left = process_file(left_name, left_contents, opts)?;
    let mut right = process_file(right_name, right_contents, opts)?;

    // Character conversions are decided from both sides' full streams
    let left_all = format!("{}\n{}", left.text, left.footnotes);
    let right_all = format!("{}\n{}", right.text, right.footnotes);
    let (left_plan, right_plan) = plan_conversions(&left_all, &right_all);
    apply_plan(&mut left, &left_plan);
    apply_plan(&mut right, &right_plan);

    if opts.ignore_case {
        for side in [&mut left, &mut right] {
            side.text = side.text.to_lowercase();
            side.footnotes = side.footnotes.to_lowercase();
        }
    }

    if opts.extract_footnotes {
        split_text_footnotes(&mut left);
        split_text_footnotes(&mut right);
    }

    Ok((left, right))
}

fn apply_plan(file: &mut ProcessedFile, plan: &[CharPair]) {
    if plan.is_empty() {
        return;
    }
    file.text = apply_conversions(&file.text, plan);
    file.footnotes = apply_conversions(&file.footnotes, plan);
}

/// Split the footnote stream out of a text side. HTML sides had their
/// footnotes extracted on the tree already.
fn split_text_footnotes(file: &mut ProcessedFile) {
    let kind = match file.kind {
        InputKind::RoundsText => TextKind::Rounds,
        InputKind::PostProcessedText => TextKind::PostProcessed,
        InputKind::Html => return,
    };
    let (text, footnotes) = extract_text_footnotes(&file.text, kind);
    file.text = text;
    file.footnotes = footnotes;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_extensions() {
        assert_eq!(classify("book.html").unwrap(), InputKind::Html);
        assert_eq!(classify("book.HTM").unwrap(), InputKind::Html);
        assert_eq!(classify("book.xhtml").unwrap(), InputKind::Html);
        assert_eq!(classify("book.txt").unwrap(), InputKind::PostProcessedText);
        assert_eq!(
            classify("projectID5c76226c51b6d.txt").unwrap(),
            InputKind::RoundsText
        );
    }

    #[test]
    fn test_classify_prefix_case_sensitive() {
        assert_eq!(classify("ProjectID123.txt").unwrap(), InputKind::PostProcessedText);
    }

    #[test]
    fn test_classify_rejects_unknown() {
        assert!(matches!(
            classify("book.pdf"),
            Err(PipelineError::UnrecognizedInput(_))
        ));
    }

    #[test]
    fn test_too_short_input_rejected() {
        assert!(matches!(
            process_file("book.txt", "tiny", &Options::default()),
            Err(PipelineError::InputTooShort(_))
        ));
    }

    #[test]
    fn test_curly_quotes_downgraded_against_straight() {
        let (left, right) = process_pair(
            "a.txt",
            "\u{201C}Hello there\u{201D} she said.",
            "b.txt",
            "\"Hello there\" she said.",
            &Options::default(),
        )
        .unwrap();
        assert_eq!(left.text, "\"Hello there\" she said.");
        assert_eq!(right.text, "\"Hello there\" she said.");
    }

    #[test]
    fn test_symmetric_fancy_characters_kept() {
        let (left, right) = process_pair(
            "a.txt",
            "an em\u{2014}dash here",
            "b.txt",
            "another em\u{2014}dash there",
            &Options::default(),
        )
        .unwrap();
        assert!(left.text.contains('\u{2014}'));
        assert!(right.text.contains('\u{2014}'));
    }

    #[test]
    fn test_ignore_case_folds_both_sides() {
        let mut opts = Options::default();
        opts.ignore_case = true;
        let (left, right) = process_pair(
            "a.txt",
            "Hello World Left",
            "b.txt",
            "HELLO WORLD RIGHT",
            &opts,
        )
        .unwrap();
        assert_eq!(left.text, "hello world left");
        assert_eq!(right.text, "hello world right");
    }

    #[test]
    fn test_html_vs_text_pair() {
        let (left, right) = process_pair(
            "book.html",
            "<p><i>Quoth</i> the raven.</p>",
            "book.txt",
            "_Quoth_ the raven.",
            &Options::default(),
        )
        .unwrap();
        assert_eq!(left.text.trim(), "_Quoth_ the raven.");
        assert_eq!(right.text.trim(), "_Quoth_ the raven.");
    }

    #[test]
    fn test_footnote_extraction_both_sides() {
        let mut opts = Options::default();
        opts.extract_footnotes = true;
        let (left, right) = process_pair(
            "book.html",
            "<p>body text here</p><div class=\"footnote\"><p>[1] a note</p></div>",
            "projectID99.txt",
            "body text here\n[Footnote 1: a note]",
            &opts,
        )
        .unwrap();
        assert_eq!(left.footnotes.trim(), "[1] a note");
        assert_eq!(right.footnotes.trim(), "[1] a note");
        assert!(!left.text.contains("a note"));
        assert!(!right.text.contains("a note"));
    }

    #[test]
    fn test_footnote_partitioning_keeps_tokens() {
        let mut opts = Options::default();
        opts.extract_footnotes = true;
        let input = "alpha beta\n\n[1] gamma delta\n\n\nepsilon";
        let (left, _) = process_pair("a.txt", input, "b.txt", "unrelated words here", &opts).unwrap();
        let combined = format!("{}\n{}", left.text, left.footnotes);
        for token in ["alpha", "beta", "gamma", "delta", "epsilon"] {
            assert!(combined.contains(token), "missing {}", token);
        }
    }
}
