//! HTML lowerer
//!
//! Drives the transformation stylesheet over a parsed HTML document and
//! serializes the result to flat text. The stylesheet is assembled from
//! the always-on inline sentinels, the default rules, rules synthesized
//! from options, and user-supplied fragments, in that order.

use log::debug;
use regex::Regex;
use std::sync::LazyLock;

use proofdiff_css::Stylesheet;
use proofdiff_dom::{DomTree, NodeId, Queryable};
use proofdiff_html::HtmlParser;
use proofdiff_transform::{apply_stylesheet, serialize_text};

use crate::error::{PipelineError, PipelineResult};
use crate::footnotes::extract_html_footnotes;
use crate::options::{Options, SmallCapsStyle};
use crate::{PG_EBOOK_END1, PG_EBOOK_END2};

/// The result of lowering one HTML file
#[derive(Debug)]
pub struct LoweredHtml {
    /// Main flat-text stream
    pub text: String,
    /// Extracted footnotes (empty unless requested)
    pub footnotes: String,
    /// Stylesheet and transform problems, already logged
    pub warnings: Vec<String>,
}

/// Inline sentinel rules, always applied so the output collates with
/// the text side even under `--css-no-default`
const SENTINEL_CSS: &str = r#"
/* Italics */
i:before, cite:before, em:before,
i:after, cite:after, em:after { content: "_"; }
"#;

const SUP_SUB_CSS: &str = r#"
/* Superscripts, subscripts */
sup:before { content: "^{"; }
sub:before { content: "_{"; }
sup:after, sub:after { content: "}"; }
"#;

/// Default transformation rules (suppressed by `--css-no-default`)
const DEFAULT_CSS: &str = r#"
/* Add spaces around table cells */
td:before, td:after { content: " "; }

/* Remove page numbers. It seems every book does it differently. */
span[class^="pagenum"], p[class^="pagenum"], div[class^="pagenum"],
span[class^="pageno"], p[class^="pageno"], div[class^="pageno"],
p[class^="page"], span[class^="pgnum"], div[id^="Page_"] { display: none; }
"#;

static PG_START_PRE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s).*?\*\*\* START OF THE PROJECT GUTENBERG EBOOK.*?\*\*\*(.*)").unwrap()
});

/// Lower an HTML input to flat text
pub fn lower_html(name: &str, input: &str, opts: &Options) -> PipelineResult<LoweredHtml> {
    let mut tree = HtmlParser::new()
        .parse(input)
        .map_err(|source| PipelineError::HtmlParse { name: name.to_string(), source })?;

    suppress_head(&mut tree);
    strip_pg_boilerplate_html(&mut tree);

    let css = build_stylesheet(opts);
    debug!("transformation stylesheet for {}: {} bytes", name, css.len());
    let sheet = Stylesheet::parse(&css);

    let mut warnings: Vec<String> = sheet
        .warnings
        .iter()
        .map(|w| format!("{}: {}", w.location, w.message))
        .collect();
    for err in apply_stylesheet(&mut tree, &sheet) {
        warnings.push(err.to_string());
    }

    let footnotes = if opts.extract_footnotes {
        extract_html_footnotes(&mut tree)
    } else {
        String::new()
    };

    let text = serialize_text(&tree, tree.document_id());

    Ok(LoweredHtml {
        text: scrub_characters(text, opts),
        footnotes: scrub_characters(footnotes, opts),
        warnings,
    })
}

/// Assemble the combined transformation stylesheet
fn build_stylesheet(opts: &Options) -> String {
    let mut css = String::new();

    css.push_str(SENTINEL_CSS);
    match &opts.css_bold {
        Some(sentinel) => {
            css.push_str(&format!("b:before, b:after {{ content: \"{}\"; }}\n", sentinel))
        }
        None => css.push_str("b:before, b:after { content: \"=\"; }\n"),
    }
    css.push_str(SUP_SUB_CSS);

    if !opts.css_no_default {
        css.push_str(DEFAULT_CSS);
    }

    if let Some(style) = opts.css_smcap {
        let transform = match style {
            SmallCapsStyle::Uppercase => "uppercase",
            SmallCapsStyle::Lowercase => "lowercase",
            SmallCapsStyle::Title => "capitalize",
        };
        css.push_str(&format!(".smcap {{ text-transform: {}; }}\n", transform));
    }

    if opts.css_greek_title_plus {
        css.push_str("*[lang=grc] { content: \"+\" attr(title) \"+\"; }\n");
    }

    if opts.css_add_illustration {
        for figclass in ["figcenter", "figleft", "figright"] {
            css.push_str(&format!(".{}:before {{ content: \"[Illustration: \"; }}\n", figclass));
            css.push_str(&format!(".{}:after {{ content: \"]\"; }}\n", figclass));
        }
    }

    if opts.css_add_sidenote {
        css.push_str(".sidenote:before { content: \"[Sidenote: \"; }\n");
        css.push_str(".sidenote:after { content: \"]\"; }\n");
    }

    for user_css in &opts.css {
        css.push_str(user_css);
        css.push('\n');
    }

    css
}

/// Only the body is compared
fn suppress_head(tree: &mut DomTree) {
    for head in tree.get_elements_by_tag_name("head") {
        if let Some(elem) = tree.get_mut(head).and_then(|n| n.as_element_mut()) {
            elem.suppressed = true;
        }
    }
}

/// Project Gutenberg wraps books in boilerplate in several layouts;
/// handle each of them on the tree.
fn strip_pg_boilerplate_html(tree: &mut DomTree) {
    let document_id = tree.document_id();

    // A <p> carrying the end marker: everything from there on goes
    let descendants = tree.descendants(document_id);
    if let Some(index) = descendants.iter().position(|&id| {
        tree.get(id).and_then(|n| n.as_element()).map(|e| e.tag_name == "p").unwrap_or(false)
            && starts_with_end_marker(tree.text_content(id).trim_start())
    }) {
        for &id in &descendants[index..] {
            if let Some(elem) = tree.get_mut(id).and_then(|n| n.as_element_mut()) {
                elem.suppressed = true;
            }
        }
    }

    // Boilerplate kept inside <pre> blocks
    for pre in tree.get_elements_by_tag_name("pre") {
        let text = tree.text_content(pre);
        let trimmed = text.trim();

        if let Some(caps) = PG_START_PRE_RE.captures(trimmed) {
            // Keep only what follows the start marker (the credits)
            let remainder = caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default();
            replace_children_with_text(tree, pre, remainder);
        } else if starts_with_end_marker(trimmed) || trimmed.starts_with("End of Project Gutenberg")
        {
            if let Some(elem) = tree.get_mut(pre).and_then(|n| n.as_element_mut()) {
                elem.suppressed = true;
            }
        }
    }

    // Footer as regular markup: the marker paragraph and its following
    // siblings
    if let Some(marker) = tree.get_element_by_id("pg-end-line") {
        let mut current = Some(marker);
        while let Some(id) = current {
            if let Some(elem) = tree.get_mut(id).and_then(|n| n.as_element_mut()) {
                elem.suppressed = true;
            }
            current = tree.next_element_sibling(id);
        }
    }
}

fn starts_with_end_marker(text: &str) -> bool {
    text.starts_with(PG_EBOOK_END1) || text.starts_with(PG_EBOOK_END2)
}

fn replace_children_with_text(tree: &mut DomTree, id: NodeId, text: String) {
    for child in tree.children(id) {
        tree.remove_child(id, child).ok();
    }
    let text_id = tree.create_text(text);
    tree.append_child(id, text_id).ok();
}

/// Character-level cleanup after serialization
fn scrub_characters(text: String, opts: &Options) -> String {
    let mut text = text.replace('\u{00AD}', "");
    if opts.ignore_0_space {
        text = text.replace('\u{200B}', "");
    }
    if opts.suppress_nbsp_num {
        text = crate::textfile::NBSP_NUM_RE.replace_all(&text, "$1$2").into_owned();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lower(html: &str, opts: &Options) -> String {
        lower_html("book.html", html, opts).unwrap().text
    }

    #[test]
    fn test_italics_sentinel() {
        let out = lower("<p><i>hello</i></p>", &Options::default());
        assert_eq!(out.trim(), "_hello_");
    }

    #[test]
    fn test_pagenum_removed() {
        let out = lower("<p><span class=\"pagenum\">42</span>foo</p>", &Options::default());
        assert_eq!(out.trim(), "foo");
    }

    #[test]
    fn test_page_id_div_removed() {
        let out = lower("<div id=\"Page_9\">9</div><p>kept</p>", &Options::default());
        assert_eq!(out.trim(), "kept");
    }

    #[test]
    fn test_bold_sentinel_and_override() {
        let out = lower("<p><b>loud</b></p>", &Options::default());
        assert_eq!(out.trim(), "=loud=");

        let mut opts = Options::default();
        opts.css_bold = Some("+".to_string());
        let out = lower("<p><b>loud</b></p>", &opts);
        assert_eq!(out.trim(), "+loud+");
    }

    #[test]
    fn test_sup_sub() {
        let out = lower("<p>E = mc<sup>2</sup> and H<sub>2</sub>O</p>", &Options::default());
        assert_eq!(out.trim(), "E = mc^{2} and H_{2}O");
    }

    #[test]
    fn test_no_default_keeps_sentinels_drops_pagenum() {
        let mut opts = Options::default();
        opts.css_no_default = true;
        let out = lower("<p><i>x</i><span class=\"pagenum\">42</span></p>", &opts);
        assert_eq!(out.trim(), "_x_42");
    }

    #[test]
    fn test_smcap_rule() {
        let mut opts = Options::default();
        opts.css_smcap = Some(SmallCapsStyle::Uppercase);
        let out = lower("<p><span class=\"smcap\">Chapter One</span></p>", &opts);
        assert_eq!(out.trim(), "CHAPTER ONE");
    }

    #[test]
    fn test_greek_title_plus() {
        let mut opts = Options::default();
        opts.css_greek_title_plus = true;
        let out = lower(
            "<p><span lang=\"grc\" title=\"phagedaina\">φαγέδαινα</span></p>",
            &opts,
        );
        assert_eq!(out.trim(), "+phagedaina+");
    }

    #[test]
    fn test_add_illustration() {
        let mut opts = Options::default();
        opts.css_add_illustration = true;
        let out = lower("<div class=\"figcenter\">A map</div>", &opts);
        assert_eq!(out.trim(), "[Illustration: A map]");
    }

    #[test]
    fn test_add_sidenote() {
        let mut opts = Options::default();
        opts.css_add_sidenote = true;
        let out = lower("<p><span class=\"sidenote\">1867</span>text</p>", &opts);
        assert_eq!(out.trim(), "[Sidenote: 1867]text");
    }

    #[test]
    fn test_user_css_applied_last() {
        let mut opts = Options::default();
        opts.css.push(".mynote { display: none; }".to_string());
        let out = lower("<p><span class=\"mynote\">gone</span>kept</p>", &opts);
        assert_eq!(out.trim(), "kept");
    }

    #[test]
    fn test_head_not_serialized() {
        let out = lower(
            "<html><head><title>The Title</title></head><body><p>body</p></body></html>",
            &Options::default(),
        );
        assert_eq!(out.trim(), "body");
    }

    #[test]
    fn test_soft_hyphen_removed() {
        let out = lower("<p>co\u{00AD}operate</p>", &Options::default());
        assert_eq!(out.trim(), "cooperate");
    }

    #[test]
    fn test_zero_width_space_flag() {
        let kept = lower("<p>a\u{200B}b</p>", &Options::default());
        assert_eq!(kept.trim(), "a\u{200B}b");

        let mut opts = Options::default();
        opts.ignore_0_space = true;
        let removed = lower("<p>a\u{200B}b</p>", &opts);
        assert_eq!(removed.trim(), "ab");
    }

    #[test]
    fn test_nbsp_between_digits_flag() {
        let mut opts = Options::default();
        opts.suppress_nbsp_num = true;
        let out = lower("<p>250\u{00A0}000</p>", &opts);
        assert_eq!(out.trim(), "250000");
    }

    #[test]
    fn test_footnote_extraction() {
        let mut opts = Options::default();
        opts.extract_footnotes = true;
        let lowered = lower_html(
            "book.html",
            "<p>main</p><div class=\"footnote\"><p>[1] a note</p></div>",
            &opts,
        )
        .unwrap();
        assert_eq!(lowered.text.trim(), "main");
        assert_eq!(lowered.footnotes.trim(), "[1] a note");
    }

    #[test]
    fn test_pg_end_paragraph_suppressed() {
        let out = lower(
            "<p>the end of the story</p>\
             <p>*** END OF THE PROJECT GUTENBERG EBOOK X ***</p>\
             <p>license text</p>",
            &Options::default(),
        );
        assert!(out.contains("the end of the story"));
        assert!(!out.contains("license text"));
        assert!(!out.contains("END OF THE PROJECT"));
    }

    #[test]
    fn test_pg_pre_start_keeps_credits() {
        let out = lower(
            "<pre>header junk\n*** START OF THE PROJECT GUTENBERG EBOOK X ***\ncredits line</pre><p>body</p>",
            &Options::default(),
        );
        assert!(out.contains("credits line"));
        assert!(!out.contains("header junk"));
        assert!(out.contains("body"));
    }

    #[test]
    fn test_td_spacing() {
        let out = lower("<table><tr><td>a</td><td>b</td></tr></table>", &Options::default());
        assert_eq!(out.trim(), "a  b");
    }

    #[test]
    fn test_bad_user_css_reported_not_fatal() {
        let mut opts = Options::default();
        opts.css.push("p:hover { display: none; }".to_string());
        let lowered = lower_html("book.html", "<p>still here</p>", &opts).unwrap();
        assert_eq!(lowered.text.trim(), "still here");
        assert!(!lowered.warnings.is_empty());
    }
}
