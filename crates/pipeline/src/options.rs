//! Pipeline configuration
//!
//! One flat struct carrying every option the pipeline branches on. The
//! command-line wrapper fills it; defaults match running with no flags.

/// Pipeline options
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Fold both sides to lowercase before comparing
    pub ignore_case: bool,
    /// Extract footnotes into a separate stream on each side
    pub extract_footnotes: bool,
    /// TXT: suppress `[Footnote N:` marks
    pub suppress_footnote_tags: bool,
    /// TXT: suppress `[Illustration:` marks
    pub suppress_illustration_tags: bool,
    /// TXT: suppress `[Sidenote:` marks
    pub suppress_sidenote_tags: bool,
    /// Silence formatting differences
    pub ignore_format: bool,
    /// Rounds: remove `[**proofreaders notes]`
    pub suppress_proofers_notes: bool,
    /// Rounds: regroup split wo-* *rds
    pub regroup_split_words: bool,
    /// Rounds: how much text cleaning to do
    pub txt_cleanup_type: TxtCleanupType,
    /// HTML: surround illustration figures with `[Illustration: ...]`
    pub css_add_illustration: bool,
    /// HTML: surround sidenotes with `[Sidenote: ...]`
    pub css_add_sidenote: bool,
    /// HTML: transform small caps
    pub css_smcap: Option<SmallCapsStyle>,
    /// HTML: bold sentinel override
    pub css_bold: Option<String>,
    /// HTML: user transformation stylesheets, in order
    pub css: Vec<String>,
    /// HTML: do not use the default transformation stylesheet
    pub css_no_default: bool,
    /// Remove no-break spaces between digits
    pub suppress_nbsp_num: bool,
    /// HTML: remove zero-width spaces (U+200B)
    pub ignore_0_space: bool,
    /// HTML: replace Greek text with the transliteration in `title`
    pub css_greek_title_plus: bool,
}

/// Amount of cleaning applied to a rounds text file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TxtCleanupType {
    /// Strip boilerplate only
    None,
    /// Also remove page markers and blank-page placeholders
    Proofers,
    /// Full best-effort cleanup
    #[default]
    Best,
}

impl TxtCleanupType {
    /// Parse the one-letter command-line form
    pub fn from_flag(flag: &str) -> Option<Self> {
        match flag {
            "b" => Some(Self::Best),
            "n" => Some(Self::None),
            "p" => Some(Self::Proofers),
            _ => None,
        }
    }
}

/// Target case for small-caps text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmallCapsStyle {
    Uppercase,
    Lowercase,
    Title,
}

impl SmallCapsStyle {
    /// Parse the one-letter command-line form
    pub fn from_flag(flag: &str) -> Option<Self> {
        match flag {
            "U" => Some(Self::Uppercase),
            "L" => Some(Self::Lowercase),
            "T" => Some(Self::Title),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = Options::default();
        assert_eq!(opts.txt_cleanup_type, TxtCleanupType::Best);
        assert!(!opts.ignore_format);
        assert!(opts.css.is_empty());
    }

    #[test]
    fn test_flag_parsing() {
        assert_eq!(TxtCleanupType::from_flag("n"), Some(TxtCleanupType::None));
        assert_eq!(TxtCleanupType::from_flag("x"), None);
        assert_eq!(SmallCapsStyle::from_flag("U"), Some(SmallCapsStyle::Uppercase));
        assert_eq!(SmallCapsStyle::from_flag("u"), None);
    }
}
