//! Recognizer pipeline — tries the recognizers in a fixed order against an
//! event fragment.
//!
//! Order matters: CMS runs first because `[GC [1 CMS-initial-mark...` would
//! otherwise be claimed by the generic `[GC` prefix check. First non-`None`
//! result wins; a fragment no recognizer claims is the caller's problem
//! (the driver logs and drops it).

use super::events::Recognizer;
use super::model::GcEvent;
use super::timestamp::Timestamp;
use crate::error::EngineError;

pub struct RecognizerPipeline {
    chain: [Recognizer; 4],
}

impl RecognizerPipeline {
    pub fn new() -> Self {
        Self {
            chain: [
                Recognizer::Cms,
                Recognizer::NewGeneration,
                Recognizer::FullCollection,
                Recognizer::Shutdown,
            ],
        }
    }

    /// Walk the chain until one recognizer claims the fragment.
    pub fn recognize(
        &self,
        ts: Option<&Timestamp>,
        text: &str,
        line: usize,
    ) -> Result<Option<GcEvent>, EngineError> {
        for recognizer in &self.chain {
            if let Some(event) = recognizer.try_parse(ts, text, line)? {
                return Ok(Some(event));
            }
        }
        Ok(None)
    }
}

impl Default for RecognizerPipeline {
    fn default() -> Self {
        Self::new()
    }
}
