//! Error — the engine error taxonomy.
//!
//! Three categories, mirrored on how scan failures propagate:
//! - `Parse`: a recognizer claimed a fragment by its entry signature but an
//!   inner field failed to decode. Carries the 1-based source line. Fatal,
//!   except on the final logical line of input where the driver downgrades
//!   it to a warning.
//! - `Usage`: caller misuse (missing time origin, bad continuation layout).
//!   No line-numbered parse machinery, these are surfaced as-is.
//! - `Io`: the input stream failed underneath us.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("parse failure at line {line}: {cause}")]
    Parse { line: usize, cause: String },

    #[error(transparent)]
    Usage(#[from] UsageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Build a line-numbered parse failure from any displayable cause.
    pub fn parse(line: usize, cause: impl std::fmt::Display) -> Self {
        EngineError::Parse {
            line,
            cause: cause.to_string(),
        }
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, EngineError::Parse { .. })
    }
}

/// Caller-misuse errors, distinct from malformed log data.
#[derive(Debug, Error)]
pub enum UsageError {
    #[error("no time origin supplied, but event at line {line} ({literal:?}) carries only a collector-relative offset")]
    MissingTimeOrigin { line: usize, literal: String },

    #[error("line {line} matches a continuation pattern but there is no previous line to attach it to")]
    ContinuationAtStart { line: usize },

    #[error("line {line} is the second continuation line in a row; events spanning more than two physical lines are not supported")]
    ChainedContinuation { line: usize },
}

/// Bracket tokenizer failure. Wrapped into a line-numbered
/// [`EngineError::Parse`] by whichever recognizer hit it.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("unbalanced brackets in {0:?}")]
    Unbalanced(String),
}
