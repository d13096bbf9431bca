//! Pipeline error types
//!
//! Only input-level failures are fatal; everything downstream recovers
//! locally and reports through warnings.

use proofdiff_html::HtmlError;
use thiserror::Error;

/// Pipeline result type
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Fatal pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unrecognized input type: {0}")]
    UnrecognizedInput(String),

    #[error("file is too short: {0}")]
    InputTooShort(String),

    #[error("cannot parse {name}: {source}")]
    HtmlParse {
        name: String,
        #[source]
        source: HtmlError,
    },
}
