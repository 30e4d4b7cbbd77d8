//! CMS phase markers.
//!
//! Detected by substring containment in a fixed priority order:
//! initial-mark first (its line also starts `[GC`, which would otherwise be
//! claimed by the new-generation recognizer), then mark-start before mark
//! (the former contains the latter as a substring).

use crate::error::EngineError;
use crate::parser::model::{parse_reading, GcEvent, InitialMark, PhaseMarker};
use crate::parser::timestamp::Timestamp;
use crate::parser::tokens::tokenize;

use super::parse_duration_ms;

pub(super) fn try_parse(
    ts: Option<&Timestamp>,
    text: &str,
    line: usize,
) -> Result<Option<GcEvent>, EngineError> {
    let Some(ts) = ts else {
        return Ok(None);
    };

    if text.contains("CMS-initial-mark") {
        return initial_mark(ts, text, line).map(Some);
    }
    if text.contains("CMS-concurrent-mark-start") {
        return Ok(Some(GcEvent::CmsConcurrentMarkStart(PhaseMarker {
            timestamp: ts.clone(),
            line,
            duration_ms: 0,
        })));
    }
    if text.contains("CMS-concurrent-preclean") {
        return Ok(Some(GcEvent::CmsConcurrentPreclean(marker(ts, text, line)?)));
    }
    if text.contains("CMS-concurrent-mark") {
        return Ok(Some(GcEvent::CmsConcurrentMark(marker(ts, text, line)?)));
    }

    Ok(None)
}

/// `[GC [1 CMS-initial-mark: current(max)] current(max), duration secs]`
fn initial_mark(ts: &Timestamp, text: &str, line: usize) -> Result<GcEvent, EngineError> {
    let shape_error = || {
        EngineError::parse(line, format!("malformed CMS-initial-mark in {text:?}"))
    };

    let tokens = tokenize(text).map_err(|e| EngineError::parse(line, e))?;
    let first = tokens.first().ok_or_else(shape_error)?;
    let inner = first.strip_prefix("GC").unwrap_or(first).trim_start();

    let segments = tokenize(inner).map_err(|e| EngineError::parse(line, e))?;
    let mut cursor = segments.iter();

    let tenured = cursor
        .next()
        .and_then(|s| s.split_once("CMS-initial-mark:"))
        .map(|(_, reading)| reading)
        .ok_or_else(shape_error)?;
    let tenured = parse_reading(tenured, line)?;

    let heap = cursor.next().ok_or_else(shape_error)?;
    let heap = parse_reading(heap, line)?;

    let duration = cursor.next().ok_or_else(shape_error)?;
    let duration_ms = parse_duration_ms(duration, line)?;

    Ok(GcEvent::CmsInitialMark(InitialMark {
        timestamp: ts.clone(),
        line,
        duration_ms,
        tenured,
        heap,
    }))
}

/// Concurrent markers carry a `wall/cpu secs` pair; `-start` variants carry
/// nothing and report 0.
fn marker(ts: &Timestamp, text: &str, line: usize) -> Result<PhaseMarker, EngineError> {
    let duration_ms = match text.split_once(':') {
        Some((_, rest)) => {
            let wall = rest
                .split_once('/')
                .map(|(wall, _cpu)| wall)
                .ok_or_else(|| {
                    EngineError::parse(line, format!("malformed CMS phase duration in {text:?}"))
                })?;
            parse_duration_ms(&format!("{} secs", wall.trim()), line)?
        }
        None => 0,
    };

    Ok(PhaseMarker {
        timestamp: ts.clone(),
        line,
        duration_ms,
    })
}
