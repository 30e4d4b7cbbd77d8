//! New-generation collections: `[GC` and the `[GC--` minor variant.
//!
//! Two young-generation flavors are modeled: the Parallel collector
//! (`PSYoungGen:`) and CMS (`ParNew:`, including the
//! `ParNew (promotion failed)` note). Anything else under a `[GC` prefix
//! (embedded `CMS`, `YG occupancy` summaries) is known-unsupported and
//! skipped, not rejected.

use tracing::debug;

use crate::error::EngineError;
use crate::parser::model::{parse_span, GcEvent, MemorySpan, NewGeneration};
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
    if !text.starts_with("[GC ") && !text.starts_with("[GC--") {
        return Ok(None);
    }

    // A second event glued onto the same physical line truncates this one.
    let mut text = text;
    if let Some(next) = timestamp::find(text, 1, line)? {
        text = &text[..next.start()];
    }

    let tokens = tokenize(text).map_err(|e| EngineError::parse(line, e))?;
    let Some(first) = tokens.first() else {
        return Ok(None);
    };

    let inner = first
        .strip_prefix("GC--")
        .or_else(|| first.strip_prefix("GC"))
        .unwrap_or(first)
        .trim_start();

    // Known-unsupported shapes under the [GC prefix.
    if inner.starts_with("CMS") || inner.contains("YG occupancy") {
        return Ok(None);
    }

    let segments = if inner.starts_with('[') {
        // Parallel: the young segment follows directly.
        tokenize(inner).map_err(|e| EngineError::parse(line, e))?
    } else if let Some(header) = timestamp::find(inner, 0, line)? {
        if header.start() != 0 {
            return Ok(None);
        }
        // CMS writes its own timestamp before the ParNew segment. It must
        // not precede the fragment's leading timestamp; an inversion means
        // the log lines were corrupted or re-ordered.
        if let (Some(inner_ms), Some(outer_ms)) = (header.offset_millis(), ts.offset_millis()) {
            if inner_ms < outer_ms {
                return Err(EngineError::parse(
                    line,
                    format!(
                        "embedded timestamp {} precedes event timestamp {}",
                        header.literal(),
                        ts.literal()
                    ),
                ));
            }
        }
        tokenize(&inner[header.end()..]).map_err(|e| EngineError::parse(line, e))?
    } else {
        return Ok(None);
    };

    let mut young: Option<MemorySpan> = None;
    let mut heap: Option<MemorySpan> = None;
    let mut duration: Option<u64> = None;
    let mut young_duration: Option<u64> = None;
    let mut promotion_failed = false;

    for segment in &segments {
        if let Some(body) = segment.strip_prefix("PSYoungGen:") {
            young = Some(parse_span(body, line)?);
        } else if let Some(body) = segment.strip_prefix("ParNew") {
            let body = match body.trim_start().strip_prefix("(promotion failed)") {
                Some(rest) => {
                    promotion_failed = true;
                    rest
                }
                None => body,
            };
            let body = body.trim_start().strip_prefix(':').ok_or_else(|| {
                EngineError::parse(line, format!("malformed ParNew segment {segment:?}"))
            })?;
            let (span, dur) = match body.split_once(',') {
                Some((span, dur)) => (span, Some(parse_duration_ms(dur, line)?)),
                None => (body, None),
            };
            young = Some(parse_span(span, line)?);
            young_duration = dur;
        } else if segment.starts_with("CMS") || segment.contains("YG occupancy") {
            return Ok(None);
        } else if is_duration(segment) {
            duration = Some(parse_duration_ms(segment, line)?);
        } else if segment.contains("->") {
            heap = Some(parse_span(segment, line)?);
        } else {
            debug!(line, segment = %segment, "ignoring unknown [GC segment");
        }
    }

    let Some(young) = young else {
        // No modeled young-generation segment: known-unsupported.
        return Ok(None);
    };

    Ok(Some(GcEvent::NewGeneration(NewGeneration {
        timestamp: ts.clone(),
        line,
        // Truncated fragments lose the trailing total; fall back to the
        // young segment's own measured span.
        duration_ms: duration.or(young_duration).unwrap_or(0),
        young,
        heap,
        promotion_failed,
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
    fn test_parallel_young_collection() {
        let (ts, rest) = leading(
            "4.751: [GC [PSYoungGen: 660640K->72890K(1835008K)] \
             660640K->72890K(6029312K), 0.0515050 secs] \
             [Times: user=0.15 sys=0.03, real=0.05 secs]",
        );
        let event = try_parse(Some(&ts), rest, 1).unwrap().unwrap();

        assert_eq!(event.duration_ms(), 52);
        assert_eq!(event.field(FieldKind::YoungBefore), Some(660_640 * 1024));
        assert_eq!(event.field(FieldKind::YoungAfter), Some(72_890 * 1024));
        assert_eq!(event.field(FieldKind::HeapCapacity), Some(6_029_312 * 1024));
    }

    #[test]
    fn test_gc_minor_variant_prefix() {
        let (ts, rest) = leading(
            "7.100: [GC-- [PSYoungGen: 10M->10M(20M)] 30M->31M(40M), 0.2000000 secs]",
        );
        let event = try_parse(Some(&ts), rest, 1).unwrap().unwrap();
        assert_eq!(event.duration_ms(), 200);
    }

    #[test]
    fn test_parnew_young_collection() {
        let (ts, rest) = leading(
            "27037.591: [GC 27037.591: [ParNew: 153344K->8960K(153344K), 0.0887110 secs] \
             169905K->25519K(1040384K), 0.0890100 secs]",
        );
        let event = try_parse(Some(&ts), rest, 1).unwrap().unwrap();

        assert_eq!(event.duration_ms(), 89);
        assert_eq!(event.field(FieldKind::YoungAfter), Some(8960 * 1024));
        assert_eq!(event.field(FieldKind::HeapBefore), Some(169_905 * 1024));
        match event {
            GcEvent::NewGeneration(e) => assert!(!e.promotion_failed),
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_promotion_failed_truncated_fragment() {
        // The next event cut this one off: the outer bracket never closes
        // and the whole-heap triple is missing.
        let (ts, rest) = leading(
            "25.285: [GC 25.285: [ParNew (promotion failed): \
             157016K->157016K(157248K), 0.0297280 secs]",
        );
        let event = try_parse(Some(&ts), rest, 1).unwrap().unwrap();

        assert_eq!(event.duration_ms(), 30);
        assert_eq!(event.field(FieldKind::HeapBefore), None);
        match event {
            GcEvent::NewGeneration(e) => assert!(e.promotion_failed),
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_glued_second_event_is_split_off() {
        let text = "4.751: [GC [PSYoungGen: 1024K->512K(2048K)] 1024K->512K(4096K), \
                    0.0100000 secs]4.761: [Full GC ...";
        let (ts, rest) = leading(text);
        let event = try_parse(Some(&ts), rest, 1).unwrap().unwrap();
        assert_eq!(event.duration_ms(), 10);
    }

    #[test]
    fn test_embedded_timestamp_inversion_is_fatal() {
        let (ts, rest) = leading(
            "27037.591: [GC 27000.000: [ParNew: 1K->2K(3K), 0.0100000 secs] \
             4K->5K(6K), 0.0200000 secs]",
        );
        let err = try_parse(Some(&ts), rest, 9).unwrap_err();
        match err {
            EngineError::Parse { line, cause } => {
                assert_eq!(line, 9);
                assert!(cause.contains("precedes"), "{cause}");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_unsupported_shapes_are_skipped() {
        let (ts, rest) = leading("1.000: [GC [1 CMS-initial-mark: 0K(1K)] 2K(3K), 0.1 secs]");
        assert!(try_parse(Some(&ts), rest, 1).unwrap().is_none());

        let (ts, rest) = leading(
            "1.000: [GC [YG occupancy: 1024 K (2048 K)]1.001: [Rescan (parallel), 0.001 secs]",
        );
        assert!(try_parse(Some(&ts), rest, 1).unwrap().is_none());
    }

    #[test]
    fn test_non_gc_prefix_is_not_claimed() {
        let (ts, rest) = leading("1.000: [Full GC [PSYoungGen: 1K->0K(2K)] ...");
        assert!(try_parse(Some(&ts), rest, 1).unwrap().is_none());
    }

    #[test]
    fn test_bad_inner_field_is_fatal() {
        let (ts, rest) = leading(
            "4.751: [GC [PSYoungGen: 660640K->72890X(1835008K)] 1K->2K(3K), 0.05 secs]",
        );
        assert!(try_parse(Some(&ts), rest, 1).is_err());
    }
}
