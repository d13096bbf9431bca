//! Proofdiff normalization pipeline
//!
//! Takes the two renditions of a book (markup-structured and plain
//! text), aggressively normalizes both, and produces paired flat-text
//! streams in which only semantically meaningful discrepancies remain.
//! The actual word-diff is run by an external tool on the output.

pub mod options;
pub mod error;
pub mod lower;
pub mod textfile;
pub mod normalize;
pub mod footnotes;
pub mod driver;

pub use options::{Options, SmallCapsStyle, TxtCleanupType};
pub use error::{PipelineError, PipelineResult};
pub use lower::{lower_html, LoweredHtml};
pub use textfile::{clean_text, strip_pg_boilerplate, TextKind};
pub use normalize::{apply_conversions, plan_conversions, CharPair, CHAR_PAIRS};
pub use footnotes::{extract_html_footnotes, extract_text_footnotes};
pub use driver::{classify, process_file, process_pair, InputKind, ProcessedFile};

/// Project Gutenberg boilerplate markers. PG lacks consistency; both
/// spellings of each marker occur in the wild.
pub const PG_EBOOK_START1: &str = "*** START OF THE PROJECT GUTENBERG EBOOK";
pub const PG_EBOOK_START2: &str = "*** START OF THIS PROJECT GUTENBERG EBOOK";
pub const PG_EBOOK_END1: &str = "*** END OF THE PROJECT GUTENBERG EBOOK";
pub const PG_EBOOK_END2: &str = "*** END OF THIS PROJECT GUTENBERG EBOOK";
