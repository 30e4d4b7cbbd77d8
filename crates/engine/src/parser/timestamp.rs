//! Timestamp matching — finds the three timestamp shapes that can prefix an
//! event fragment.
//!
//! GC loggers emit either a collector-relative offset (`27036.837: `, from
//! `-XX:+PrintGCTimeStamps`), a wall-clock date-stamp
//! (`2013-05-16T23:05:18.903+0800: `, from `-XX:+PrintGCDateStamps`), or both
//! glued together. The combined shape is tried first so it is never
//! mis-parsed as two independent matches.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::EngineError;

const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

static RE_OFFSET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+\.\d{3}): ").unwrap());

static RE_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{3}[+-]\d{4}): ").unwrap()
});

static RE_COMBINED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{3}[+-]\d{4}): (\d+\.\d{3}): ").unwrap()
});

/// Resolution state of a timestamp.
///
/// An offset-only timestamp starts `Offset` and moves to `Anchored` exactly
/// once, when a time origin is applied. A date-stamp already carries wall
/// time and never transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum Clock {
    /// Collector-relative milliseconds since JVM start. Not yet resolvable
    /// to wall time.
    Offset { millis: u64 },
    /// Wall-clock epoch milliseconds from a date-stamp literal.
    Wall { time_ms: i64 },
    /// Both readings available (combined literal, or an offset resolved
    /// against an externally supplied origin).
    Anchored { millis: u64, time_ms: i64 },
}

/// A point in collector-relative or wall-clock time found in the log text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Timestamp {
    /// Exact literal as written in the log (combined shapes join the two
    /// literals with a single space). Preserved verbatim for display and
    /// search fidelity.
    literal: String,
    /// Character offset of the match in the source line.
    start: usize,
    /// Index of the first character after the trailing `": "`.
    end: usize,
    clock: Clock,
}

impl Timestamp {
    pub fn literal(&self) -> &str {
        &self.literal
    }

    /// Start/end character offsets of the match, end pointing just past the
    /// trailing colon-space.
    pub fn span(&self) -> (usize, usize) {
        (self.start, self.end)
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn offset_millis(&self) -> Option<u64> {
        match self.clock {
            Clock::Offset { millis } | Clock::Anchored { millis, .. } => Some(millis),
            Clock::Wall { .. } => None,
        }
    }

    pub fn wall_ms(&self) -> Option<i64> {
        match self.clock {
            Clock::Wall { time_ms } | Clock::Anchored { time_ms, .. } => Some(time_ms),
            Clock::Offset { .. } => None,
        }
    }

    /// Back-fill wall time from an externally supplied epoch-ms origin.
    ///
    /// Idempotent: a timestamp that already carries wall time is left alone.
    pub fn resolve(&mut self, origin_ms: i64) {
        if let Clock::Offset { millis } = self.clock {
            self.clock = Clock::Anchored {
                millis,
                time_ms: origin_ms + millis as i64,
            };
        }
    }

    fn offset_only(literal: &str, start: usize, end: usize, line: usize) -> Result<Self, EngineError> {
        Ok(Timestamp {
            literal: literal.to_string(),
            start,
            end,
            clock: Clock::Offset {
                millis: parse_offset_millis(literal, line)?,
            },
        })
    }

    fn date_only(literal: &str, start: usize, end: usize, line: usize) -> Result<Self, EngineError> {
        Ok(Timestamp {
            literal: literal.to_string(),
            start,
            end,
            clock: Clock::Wall {
                time_ms: parse_date_ms(literal, line)?,
            },
        })
    }

    fn combined(
        date: &str,
        offset: &str,
        start: usize,
        end: usize,
        line: usize,
    ) -> Result<Self, EngineError> {
        // Each literal is validated by its own strict parse. The check is on
        // parsed values, not re-formatted text, so a literal quirk like a
        // leading zero in the offset is accepted.
        let millis = parse_offset_millis(offset, line)?;
        let time_ms = parse_date_ms(date, line)?;

        Ok(Timestamp {
            literal: format!("{date} {offset}"),
            start,
            end,
            clock: Clock::Anchored { millis, time_ms },
        })
    }
}

/// Serialize milliseconds back to the 3-decimal fixed offset format.
pub fn format_offset(millis: u64) -> String {
    format!("{}.{:03}", millis / 1000, millis % 1000)
}

/// Strict `secs.msecs` parse, exactly three millisecond digits.
fn parse_offset_millis(literal: &str, line: usize) -> Result<u64, EngineError> {
    let (secs, msecs) = literal
        .split_once('.')
        .ok_or_else(|| EngineError::parse(line, format!("bad offset literal {literal:?}")))?;

    if msecs.len() != 3 || !msecs.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EngineError::parse(
            line,
            format!("offset literal {literal:?} needs exactly three millisecond digits"),
        ));
    }

    let secs: u64 = secs
        .parse()
        .map_err(|e| EngineError::parse(line, format!("offset literal {literal:?}: {e}")))?;
    let msecs: u64 = msecs
        .parse()
        .map_err(|e| EngineError::parse(line, format!("offset literal {literal:?}: {e}")))?;

    Ok(secs * 1000 + msecs)
}

/// Strict ISO-like date-stamp parse to epoch milliseconds.
fn parse_date_ms(literal: &str, line: usize) -> Result<i64, EngineError> {
    chrono::DateTime::parse_from_str(literal, DATE_FORMAT)
        .map(|dt| dt.timestamp_millis())
        .map_err(|e| EngineError::parse(line, format!("bad date-stamp {literal:?}: {e}")))
}

struct Candidate<'t> {
    start: usize,
    end: usize,
    date: Option<&'t str>,
    offset: Option<&'t str>,
}

/// Find the next qualifying timestamp in `text` at or after `from`.
///
/// A candidate only qualifies if the character immediately before it is the
/// start of `text` or `]` -- loggers embed digit runs that look like
/// timestamps inside other numeric fields, and those must never become
/// fragment delimiters. A disqualified candidate restarts the scan just
/// after its own end, so the same false match is never re-found.
pub fn find(text: &str, from: usize, line: usize) -> Result<Option<Timestamp>, EngineError> {
    let mut at = from;

    loop {
        let Some(cand) = next_candidate(text, at) else {
            return Ok(None);
        };

        if cand.start == 0 || text.as_bytes()[cand.start - 1] == b']' {
            let ts = match (cand.date, cand.offset) {
                (Some(d), Some(o)) => Timestamp::combined(d, o, cand.start, cand.end, line)?,
                (None, Some(o)) => Timestamp::offset_only(o, cand.start, cand.end, line)?,
                (Some(d), None) => Timestamp::date_only(d, cand.start, cand.end, line)?,
                (None, None) => unreachable!("candidate without any literal"),
            };
            return Ok(Some(ts));
        }

        at = cand.end;
    }
}

/// Earliest match of the three patterns, combined shadowing a date-only
/// match at the same position.
fn next_candidate(text: &str, from: usize) -> Option<Candidate<'_>> {
    let hay = &text[from..];

    let combined = RE_COMBINED.captures(hay);
    let offset = RE_OFFSET.captures(hay);
    let date = RE_DATE.captures(hay);

    let pos = |c: &regex::Captures| c.get(0).map(|m| m.start()).unwrap_or(usize::MAX);

    let mut best: Option<(usize, Candidate)> = None;
    // Priority order on equal start positions: combined, offset, date.
    let candidates = [
        combined.as_ref().map(|c| Candidate {
            start: from + pos(c),
            end: from + c.get(0).unwrap().end(),
            date: Some(c.get(1).unwrap().as_str()),
            offset: Some(c.get(2).unwrap().as_str()),
        }),
        offset.as_ref().map(|c| Candidate {
            start: from + pos(c),
            end: from + c.get(0).unwrap().end(),
            date: None,
            offset: Some(c.get(1).unwrap().as_str()),
        }),
        date.as_ref().map(|c| Candidate {
            start: from + pos(c),
            end: from + c.get(0).unwrap().end(),
            date: Some(c.get(1).unwrap().as_str()),
            offset: None,
        }),
    ];

    for cand in candidates.into_iter().flatten() {
        match &best {
            Some((start, _)) if *start <= cand.start => {}
            _ => best = Some((cand.start, cand)),
        }
    }

    best.map(|(_, c)| c)
}
