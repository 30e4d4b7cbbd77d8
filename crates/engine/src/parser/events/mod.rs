//! Event recognizers, one module per event family.
//!
//! Each recognizer owns the token-level grammar for its family. The contract
//! is uniform: `Ok(None)` when the fragment's shape is not this family
//! (structural mismatch, never an error), `Err` when the entry signature
//! matched but an inner field failed to decode.

pub mod cms;
pub mod full_gc;
pub mod new_gen;
pub mod shutdown;

use super::model::GcEvent;
use super::timestamp::Timestamp;
use crate::error::EngineError;

/// The closed set of recognizers, dispatched by match. Order of application
/// is owned by [`super::pipeline::RecognizerPipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recognizer {
    Cms,
    NewGeneration,
    FullCollection,
    Shutdown,
}

impl Recognizer {
    pub fn try_parse(
        &self,
        ts: Option<&Timestamp>,
        text: &str,
        line: usize,
    ) -> Result<Option<GcEvent>, EngineError> {
        match self {
            Recognizer::Cms => cms::try_parse(ts, text, line),
            Recognizer::NewGeneration => new_gen::try_parse(ts, text, line),
            Recognizer::FullCollection => full_gc::try_parse(ts, text, line),
            Recognizer::Shutdown => shutdown::try_parse(text, line),
        }
    }
}

/// Parse a `1.2345678 secs` duration token to whole milliseconds, rounded.
pub(crate) fn parse_duration_ms(token: &str, line: usize) -> Result<u64, EngineError> {
    let secs = token
        .trim()
        .strip_suffix("secs")
        .map(str::trim_end)
        .ok_or_else(|| EngineError::parse(line, format!("expected a duration, got {token:?}")))?;

    let secs: f64 = secs
        .parse()
        .map_err(|e| EngineError::parse(line, format!("bad duration {token:?}: {e}")))?;

    if !secs.is_finite() || secs < 0.0 {
        return Err(EngineError::parse(line, format!("bad duration {token:?}")));
    }

    Ok((secs * 1000.0).round() as u64)
}

/// Does this token carry a `... secs` duration?
pub(crate) fn is_duration(token: &str) -> bool {
    token.trim_end().ends_with("secs")
}
