//! Full collections: `[Full GC`.
//!
//! Accepts the Parallel collector layout (`PSYoungGen:` / `PSOldGen:` /
//! `ParOldGen:`) and the CMS layout (`CMS:`). A `CMS-concurrent-mark`
//! interleaving inside the tenured segment is discarded with a log line;
//! its readings are not modeled. The total-heap triple and the permanent
//! generation segment (`PSPermGen:` / `CMS Perm :`) are required, and out
//! of order or missing segments are hard parse errors.

use tracing::debug;

use crate::error::EngineError;
use crate::parser::model::{parse_span, FullCollection, GcEvent, MemorySpan};
use crate::parser::timestamp::{self, Timestamp};
use crate::parser::tokens::tokenize;

use super::{is_duration, parse_duration_ms};

pub(super) fn try_parse(
    ts: Option<&Timestamp>,
    text: &str,
    line: usize,
) -> Result<Option<GcEvent>, EngineError> {
    let Some(ts) = ts else {
        return Ok(None);
    };
    if !text.starts_with("[Full GC") {
        return Ok(None);
    }

    let shape_error = |what: &str| {
        EngineError::parse(line, format!("Full GC without {what} in {text:?}"))
    };

    let tokens = tokenize(text).map_err(|e| EngineError::parse(line, e))?;
    let first = tokens.first().ok_or_else(|| shape_error("any content"))?;

    let mut body = first
        .strip_prefix("Full GC")
        .unwrap_or(first)
        .trim_start();

    let system = body.starts_with("(System)");
    if system {
        body = body["(System)".len()..].trim_start();
    }

    let segments = if body.starts_with('[') {
        tokenize(body).map_err(|e| EngineError::parse(line, e))?
    } else if let Some(header) = timestamp::find(body, 0, line)? {
        if header.start() != 0 {
            return Err(shape_error("a generation segment"));
        }
        tokenize(&body[header.end()..]).map_err(|e| EngineError::parse(line, e))?
    } else {
        return Err(shape_error("a generation segment"));
    };

    let mut cursor = segments.iter();

    let mut young: Option<MemorySpan> = None;
    let mut tenured: Option<MemorySpan> = None;

    // Generation segments come first, in collector order.
    let seg = cursor.next().ok_or_else(|| shape_error("a generation segment"))?;
    if let Some(body) = seg.strip_prefix("PSYoungGen:") {
        young = Some(parse_span(body, line)?);

        let old = cursor.next().ok_or_else(|| shape_error("an old-generation segment"))?;
        let old_body = old
            .strip_prefix("PSOldGen:")
            .or_else(|| old.strip_prefix("ParOldGen:"))
            .ok_or_else(|| shape_error("an old-generation segment"))?;
        tenured = Some(parse_span(old_body, line)?);
    } else if seg.starts_with("CMS") {
        if seg.contains("CMS-concurrent") {
            // A concurrent mark ran into this collection; its readings are
            // interleaved into the tenured segment and dropped.
            debug!(line, segment = %seg.as_str(), "discarding CMS-concurrent interleaving in Full GC");
        } else {
            let cms_body = seg
                .strip_prefix("CMS:")
                .ok_or_else(|| shape_error("a tenured segment"))?;
            let span = match cms_body.split_once(',') {
                Some((span, _inner_duration)) => span,
                None => cms_body,
            };
            tenured = Some(parse_span(span, line)?);
        }
    } else {
        return Err(shape_error("a generation segment"));
    }

    let heap = cursor
        .next()
        .filter(|s| s.contains("->") && !s.contains(':'))
        .ok_or_else(|| shape_error("a total-heap segment"))?;
    let heap = parse_span(heap, line)?;

    let perm = cursor.next().ok_or_else(|| shape_error("a permanent-generation segment"))?;
    let perm_body = perm
        .strip_prefix("PSPermGen:")
        .or_else(|| perm.strip_prefix("CMS Perm :"))
        .or_else(|| perm.strip_prefix("CMS Perm:"))
        .ok_or_else(|| shape_error("a permanent-generation segment"))?;
    let perm = parse_span(perm_body, line)?;

    let duration = cursor
        .next()
        .filter(|s| is_duration(s))
        .ok_or_else(|| shape_error("a duration"))?;
    let duration_ms = parse_duration_ms(duration, line)?;

    Ok(Some(GcEvent::Full(FullCollection {
        timestamp: ts.clone(),
        line,
        duration_ms,
        young,
        tenured,
        perm,
        heap,
        system,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::model::FieldKind;

    fn leading(text: &str) -> (Timestamp, &str) {
        let ts = timestamp::find(text, 0, 1).unwrap().unwrap();
        let rest = &text[ts.end()..];
        (ts, rest)
    }

    #[test]
    fn test_parallel_full_collection() {
        let (ts, rest) = leading(
            "21.796: [Full GC [PSYoungGen: 13090K->0K(1835008K)] \
             [PSOldGen: 0K->12734K(4194304K)] 13090K->12734K(6029312K) \
             [PSPermGen: 10756K->10756K(21248K)], 0.0496700 secs]",
        );
        let event = try_parse(Some(&ts), rest, 1).unwrap().unwrap();

        assert_eq!(event.duration_ms(), 50);
        assert_eq!(event.field(FieldKind::YoungBefore), Some(13_090 * 1024));
        assert_eq!(event.field(FieldKind::TenuredAfter), Some(12_734 * 1024));
        assert_eq!(event.field(FieldKind::PermCapacity), Some(21_248 * 1024));
        assert_eq!(event.field(FieldKind::HeapAfter), Some(12_734 * 1024));
    }

    #[test]
    fn test_par_old_gen_accepted() {
        let (ts, rest) = leading(
            "33.061: [Full GC [PSYoungGen: 288K->0K(46400K)] \
             [ParOldGen: 56656K->55408K(94272K)] 56944K->55408K(140672K) \
             [PSPermGen: 81816K->81816K(164096K)], 0.5589240 secs]",
        );
        let event = try_parse(Some(&ts), rest, 1).unwrap().unwrap();
        assert_eq!(event.duration_ms(), 559);
        assert_eq!(event.field(FieldKind::TenuredBefore), Some(56_656 * 1024));
    }

    #[test]
    fn test_cms_full_collection() {
        let (ts, rest) = leading(
            "27500.563: [Full GC 27500.563: [CMS: 341217K->348021K(515960K), 1.5617160 secs] \
             360667K->348021K(521336K), [CMS Perm : 87200K->86859K(131072K)], 1.5619000 secs]",
        );
        let event = try_parse(Some(&ts), rest, 1).unwrap().unwrap();

        assert_eq!(event.duration_ms(), 1562);
        assert_eq!(event.field(FieldKind::TenuredAfter), Some(348_021 * 1024));
        assert_eq!(event.field(FieldKind::PermBefore), Some(87_200 * 1024));
        assert_eq!(event.field(FieldKind::YoungBefore), None);
        match event {
            GcEvent::Full(e) => assert!(!e.system),
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_system_gc_note() {
        let (ts, rest) = leading(
            "9.089: [Full GC (System) [PSYoungGen: 80K->0K(46400K)] \
             [PSOldGen: 0K->5964K(94272K)] 80K->5964K(140672K) \
             [PSPermGen: 19221K->19221K(38656K)], 0.1033770 secs]",
        );
        match try_parse(Some(&ts), rest, 1).unwrap().unwrap() {
            GcEvent::Full(e) => assert!(e.system),
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_concurrent_mark_interleaving_discarded() {
        let (ts, rest) = leading(
            "280.756: [Full GC 280.756: \
             [CMS280.930: [CMS-concurrent-mark: 0.174/0.174 secs]: \
             1044503K->1048509K(1048576K), 4.4200000 secs] \
             1223503K->1048509K(1223168K), [CMS Perm : 16410K->16395K(27360K)], 4.4213000 secs]",
        );
        let event = try_parse(Some(&ts), rest, 1).unwrap().unwrap();

        assert_eq!(event.field(FieldKind::TenuredBefore), None);
        assert_eq!(event.field(FieldKind::HeapBefore), Some(1_223_503 * 1024));
        assert_eq!(event.duration_ms(), 4421);
    }

    #[test]
    fn test_missing_perm_segment_is_fatal() {
        let (ts, rest) = leading(
            "21.796: [Full GC [PSYoungGen: 1K->0K(2K)] [PSOldGen: 0K->1K(4K)] \
             1K->1K(6K), 0.0400000 secs]",
        );
        let err = try_parse(Some(&ts), rest, 4).unwrap_err();
        match err {
            EngineError::Parse { line, cause } => {
                assert_eq!(line, 4);
                assert!(cause.contains("permanent-generation"), "{cause}");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_heap_segment_is_fatal() {
        let (ts, rest) = leading(
            "21.796: [Full GC [PSYoungGen: 1K->0K(2K)] [PSOldGen: 0K->1K(4K)] \
             [PSPermGen: 1K->1K(2K)], 0.0400000 secs]",
        );
        assert!(try_parse(Some(&ts), rest, 1).is_err());
    }

    #[test]
    fn test_gc_prefix_is_not_claimed() {
        let (ts, rest) = leading("4.751: [GC [PSYoungGen: 1K->0K(2K)] 1K->0K(3K), 0.01 secs]");
        assert!(try_parse(Some(&ts), rest, 1).unwrap().is_none());
    }
}
