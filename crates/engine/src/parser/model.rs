//! Model — typed collection events and their memory readings.
//!
//! One struct per concrete event kind, each carrying only the fields its
//! log shape can legitimately produce, joined under the [`GcEvent`] tagged
//! union. Memory values are normalized to bytes at parse time; unit
//! conversion for display is a presentation concern.

use serde::Serialize;

use super::timestamp::Timestamp;
use crate::error::{EngineError, UsageError};

/// Tag distinguishing event families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionType {
    NewGeneration,
    Full,
    CmsInitialMark,
    CmsConcurrentMarkStart,
    CmsConcurrentPreclean,
    CmsConcurrentMark,
    Shutdown,
}

impl CollectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionType::NewGeneration => "new_generation",
            CollectionType::Full => "full",
            CollectionType::CmsInitialMark => "cms_initial_mark",
            CollectionType::CmsConcurrentMarkStart => "cms_concurrent_mark_start",
            CollectionType::CmsConcurrentPreclean => "cms_concurrent_preclean",
            CollectionType::CmsConcurrentMark => "cms_concurrent_mark",
            CollectionType::Shutdown => "shutdown",
        }
    }
}

/// Kinds of memory measurement an event can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    YoungBefore,
    YoungAfter,
    YoungCapacity,
    TenuredBefore,
    TenuredAfter,
    TenuredCapacity,
    TenuredUsed,
    PermBefore,
    PermAfter,
    PermCapacity,
    HeapBefore,
    HeapAfter,
    HeapCapacity,
    HeapUsed,
}

/// A `before->after(capacity)` triple, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemorySpan {
    pub before: u64,
    pub after: u64,
    pub capacity: u64,
}

/// A `used(capacity)` pair, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemoryReading {
    pub used: u64,
    pub capacity: u64,
}

fn unit_multiplier(unit: u8) -> Option<u64> {
    match unit {
        b'B' => Some(1),
        b'K' => Some(1024),
        b'M' => Some(1024 * 1024),
        b'G' => Some(1024 * 1024 * 1024),
        _ => None,
    }
}

/// Decode a single sized reading like `660640K`, returning the raw value and
/// its unit letter. Normalization happens once the shared unit is known.
fn parse_sized(text: &str, line: usize) -> Result<(u64, u8), EngineError> {
    let text = text.trim();
    let (digits, unit) = text.split_at(text.len().saturating_sub(1));
    let unit = unit.as_bytes().first().copied().unwrap_or(0);

    if unit_multiplier(unit).is_none() {
        return Err(EngineError::parse(
            line,
            format!("memory reading {text:?} has no recognized unit"),
        ));
    }
    let value: u64 = digits
        .parse()
        .map_err(|e| EngineError::parse(line, format!("memory reading {text:?}: {e}")))?;

    Ok((value, unit))
}

/// Parse `before->after(capacity)`. All three readings must share one unit;
/// a mismatch is a hard parse error, never silently coerced.
pub(crate) fn parse_span(text: &str, line: usize) -> Result<MemorySpan, EngineError> {
    let text = text.trim();
    let bad = || EngineError::parse(line, format!("expected before->after(capacity), got {text:?}"));

    let (before, rest) = text.split_once("->").ok_or_else(bad)?;
    let (after, capacity) = rest
        .strip_suffix(')')
        .and_then(|r| r.split_once('('))
        .ok_or_else(bad)?;

    let (before, u1) = parse_sized(before, line)?;
    let (after, u2) = parse_sized(after, line)?;
    let (capacity, u3) = parse_sized(capacity, line)?;

    if u1 != u2 || u2 != u3 {
        return Err(EngineError::parse(
            line,
            format!("mismatched units in {text:?}"),
        ));
    }

    let mul = unit_multiplier(u1).unwrap_or(1);
    Ok(MemorySpan {
        before: before * mul,
        after: after * mul,
        capacity: capacity * mul,
    })
}

/// Parse `used(capacity)`, same shared-unit rule as [`parse_span`].
pub(crate) fn parse_reading(text: &str, line: usize) -> Result<MemoryReading, EngineError> {
    let text = text.trim();
    let bad = || EngineError::parse(line, format!("expected used(capacity), got {text:?}"));

    let (used, capacity) = text
        .strip_suffix(')')
        .and_then(|r| r.split_once('('))
        .ok_or_else(bad)?;

    let (used, u1) = parse_sized(used, line)?;
    let (capacity, u2) = parse_sized(capacity, line)?;

    if u1 != u2 {
        return Err(EngineError::parse(
            line,
            format!("mismatched units in {text:?}"),
        ));
    }

    let mul = unit_multiplier(u1).unwrap_or(1);
    Ok(MemoryReading {
        used: used * mul,
        capacity: capacity * mul,
    })
}

/// A young-generation collection (`[GC` / `[GC--`).
#[derive(Debug, Clone, Serialize)]
pub struct NewGeneration {
    pub timestamp: Timestamp,
    pub line: usize,
    pub duration_ms: u64,
    pub young: MemorySpan,
    /// Whole-heap triple. Absent when the event was truncated mid-line by
    /// the next event.
    pub heap: Option<MemorySpan>,
    /// `ParNew (promotion failed)` note.
    pub promotion_failed: bool,
}

/// A stop-the-world full collection (`[Full GC`).
#[derive(Debug, Clone, Serialize)]
pub struct FullCollection {
    pub timestamp: Timestamp,
    pub line: usize,
    pub duration_ms: u64,
    /// Parallel collector only; CMS full lines carry no young segment.
    pub young: Option<MemorySpan>,
    /// Absent when a CMS-concurrent-mark interleaving replaced the tenured
    /// readings and was discarded.
    pub tenured: Option<MemorySpan>,
    pub perm: MemorySpan,
    pub heap: MemorySpan,
    /// `(System)` cause: an explicit System.gc() call.
    pub system: bool,
}

/// The initial-mark stop-the-world CMS phase.
#[derive(Debug, Clone, Serialize)]
pub struct InitialMark {
    pub timestamp: Timestamp,
    pub line: usize,
    pub duration_ms: u64,
    pub tenured: MemoryReading,
    pub heap: MemoryReading,
}

/// A concurrent CMS phase marker. `-start` markers measure no span and
/// report duration 0.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseMarker {
    pub timestamp: Timestamp,
    pub line: usize,
    pub duration_ms: u64,
}

/// The end-of-run heap summary block. Accretes its raw detail lines while
/// the driver keeps feeding it.
#[derive(Debug, Clone, Serialize)]
pub struct Shutdown {
    pub line: usize,
    pub lines: Vec<String>,
}

/// A typed collection event reconstructed from the log text.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GcEvent {
    NewGeneration(NewGeneration),
    Full(FullCollection),
    CmsInitialMark(InitialMark),
    CmsConcurrentMarkStart(PhaseMarker),
    CmsConcurrentPreclean(PhaseMarker),
    CmsConcurrentMark(PhaseMarker),
    Shutdown(Shutdown),
}

impl GcEvent {
    pub fn collection_type(&self) -> CollectionType {
        match self {
            GcEvent::NewGeneration(_) => CollectionType::NewGeneration,
            GcEvent::Full(_) => CollectionType::Full,
            GcEvent::CmsInitialMark(_) => CollectionType::CmsInitialMark,
            GcEvent::CmsConcurrentMarkStart(_) => CollectionType::CmsConcurrentMarkStart,
            GcEvent::CmsConcurrentPreclean(_) => CollectionType::CmsConcurrentPreclean,
            GcEvent::CmsConcurrentMark(_) => CollectionType::CmsConcurrentMark,
            GcEvent::Shutdown(_) => CollectionType::Shutdown,
        }
    }

    /// 1-based source line the event was opened on.
    pub fn line(&self) -> usize {
        match self {
            GcEvent::NewGeneration(e) => e.line,
            GcEvent::Full(e) => e.line,
            GcEvent::CmsInitialMark(e) => e.line,
            GcEvent::CmsConcurrentMarkStart(e)
            | GcEvent::CmsConcurrentPreclean(e)
            | GcEvent::CmsConcurrentMark(e) => e.line,
            GcEvent::Shutdown(e) => e.line,
        }
    }

    /// Measured pause, 0 for markers with no span.
    pub fn duration_ms(&self) -> u64 {
        match self {
            GcEvent::NewGeneration(e) => e.duration_ms,
            GcEvent::Full(e) => e.duration_ms,
            GcEvent::CmsInitialMark(e) => e.duration_ms,
            GcEvent::CmsConcurrentMarkStart(e)
            | GcEvent::CmsConcurrentPreclean(e)
            | GcEvent::CmsConcurrentMark(e) => e.duration_ms,
            GcEvent::Shutdown(_) => 0,
        }
    }

    pub fn timestamp(&self) -> Option<&Timestamp> {
        match self {
            GcEvent::NewGeneration(e) => Some(&e.timestamp),
            GcEvent::Full(e) => Some(&e.timestamp),
            GcEvent::CmsInitialMark(e) => Some(&e.timestamp),
            GcEvent::CmsConcurrentMarkStart(e)
            | GcEvent::CmsConcurrentPreclean(e)
            | GcEvent::CmsConcurrentMark(e) => Some(&e.timestamp),
            GcEvent::Shutdown(_) => None,
        }
    }

    fn timestamp_mut(&mut self) -> Option<&mut Timestamp> {
        match self {
            GcEvent::NewGeneration(e) => Some(&mut e.timestamp),
            GcEvent::Full(e) => Some(&mut e.timestamp),
            GcEvent::CmsInitialMark(e) => Some(&mut e.timestamp),
            GcEvent::CmsConcurrentMarkStart(e)
            | GcEvent::CmsConcurrentPreclean(e)
            | GcEvent::CmsConcurrentMark(e) => Some(&mut e.timestamp),
            GcEvent::Shutdown(_) => None,
        }
    }

    /// Verbatim timestamp literal, preserved for search fidelity.
    pub fn offset_literal(&self) -> Option<&str> {
        self.timestamp().map(|ts| ts.literal())
    }

    /// Back-fill wall time from an epoch-ms origin. Idempotent.
    pub fn resolve_time(&mut self, origin_ms: i64) {
        if let Some(ts) = self.timestamp_mut() {
            ts.resolve(origin_ms);
        }
    }

    /// Absolute wall-clock time in epoch milliseconds.
    ///
    /// Fails with a usage error when the event only carries a
    /// collector-relative offset and no time origin was supplied.
    pub fn time_ms(&self) -> Result<i64, EngineError> {
        self.timestamp()
            .and_then(|ts| ts.wall_ms())
            .ok_or_else(|| {
                UsageError::MissingTimeOrigin {
                    line: self.line(),
                    literal: self.offset_literal().unwrap_or_default().to_string(),
                }
                .into()
            })
    }

    /// Per-variant measurement lookup, in bytes. Total over the fields a
    /// variant can legitimately produce; everything else is `None`.
    pub fn field(&self, kind: FieldKind) -> Option<u64> {
        use FieldKind::*;
        match self {
            GcEvent::NewGeneration(e) => match kind {
                YoungBefore => Some(e.young.before),
                YoungAfter => Some(e.young.after),
                YoungCapacity => Some(e.young.capacity),
                HeapBefore => e.heap.map(|h| h.before),
                HeapAfter => e.heap.map(|h| h.after),
                HeapCapacity => e.heap.map(|h| h.capacity),
                _ => None,
            },
            GcEvent::Full(e) => match kind {
                YoungBefore => e.young.map(|y| y.before),
                YoungAfter => e.young.map(|y| y.after),
                YoungCapacity => e.young.map(|y| y.capacity),
                TenuredBefore => e.tenured.map(|t| t.before),
                TenuredAfter => e.tenured.map(|t| t.after),
                TenuredCapacity => e.tenured.map(|t| t.capacity),
                PermBefore => Some(e.perm.before),
                PermAfter => Some(e.perm.after),
                PermCapacity => Some(e.perm.capacity),
                HeapBefore => Some(e.heap.before),
                HeapAfter => Some(e.heap.after),
                HeapCapacity => Some(e.heap.capacity),
                _ => None,
            },
            GcEvent::CmsInitialMark(e) => match kind {
                TenuredUsed => Some(e.tenured.used),
                TenuredCapacity => Some(e.tenured.capacity),
                HeapUsed => Some(e.heap.used),
                HeapCapacity => Some(e.heap.capacity),
                _ => None,
            },
            GcEvent::CmsConcurrentMarkStart(_)
            | GcEvent::CmsConcurrentPreclean(_)
            | GcEvent::CmsConcurrentMark(_)
            | GcEvent::Shutdown(_) => None,
        }
    }
}
