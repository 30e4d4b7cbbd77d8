//! Shutdown heap summary: the bare `Heap` block the JVM prints on exit.
//!
//! The `Heap` line opens a [`Shutdown`] event and stays active with the
//! driver: each following physical line that looks like heap-block detail
//! is accreted verbatim onto the event. The first line that does not look
//! like detail releases the event back to normal dispatch.

use crate::error::EngineError;
use crate::parser::model::{GcEvent, Shutdown};

/// Leading words that identify a heap-block detail line even without
/// indentation.
const BLOCK_KEYWORDS: &[&str] = &[
    "PSYoungGen",
    "PSOldGen",
    "ParOldGen",
    "PSPermGen",
    "eden space",
    "from space",
    "to space",
    "object space",
    "par new generation",
    "concurrent mark-sweep generation",
    "concurrent-mark-sweep perm gen",
    "def new generation",
    "tenured generation",
    "compacting perm gen",
    "the space",
    "ro space",
    "rw space",
    "Metaspace",
    "class space",
];

pub(super) fn try_parse(text: &str, line: usize) -> Result<Option<GcEvent>, EngineError> {
    if text.trim() != "Heap" {
        return Ok(None);
    }
    Ok(Some(GcEvent::Shutdown(Shutdown {
        line,
        lines: Vec::new(),
    })))
}

/// Does this line continue the heap block?
pub(crate) fn claims(text: &str) -> bool {
    if text.starts_with(' ') || text.starts_with('\t') {
        return true;
    }
    let trimmed = text.trim_start();
    BLOCK_KEYWORDS.iter().any(|k| trimmed.starts_with(k))
}

/// Accrete one raw continuation line.
pub(crate) fn accrete(event: &mut Shutdown, text: &str) {
    event.lines.push(text.to_string());
}
