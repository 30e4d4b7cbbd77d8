//! Linear scan driver.
//!
//! Owns the one-line lookahead buffer, continuation coalescing, per-line
//! splitting into timestamp-anchored fragments, time-origin application, and
//! dispatch into the recognizer pipeline. This is also the only place that
//! decides fatal-versus-warning: a parse failure on the final logical line
//! is the expected signature of a log captured while the JVM is still
//! writing it, and is downgraded to a warning.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{EngineError, UsageError};
use crate::parser::events::shutdown;
use crate::parser::model::GcEvent;
use crate::parser::timestamp::{self, Timestamp};
use crate::parser::RecognizerPipeline;

use super::continuation::ContinuationPatterns;
use super::origin::TimeOrigin;

#[derive(Debug, Default)]
pub struct ScanOptions {
    /// Epoch-ms anchor for offset-only timestamps. Without it, events keep
    /// their collector-relative offsets and asking them for absolute time
    /// is a usage error.
    pub time_origin: Option<i64>,
    pub continuations: ContinuationPatterns,
}

/// Scan a whole GC log file into an ordered event sequence.
pub fn scan_file(path: impl AsRef<Path>, options: ScanOptions) -> Result<Vec<GcEvent>, EngineError> {
    let reader = BufReader::new(File::open(path)?);
    scan_reader(reader, options)
}

/// Scan a readable character stream into an ordered event sequence.
pub fn scan_reader<R: BufRead>(reader: R, options: ScanOptions) -> Result<Vec<GcEvent>, EngineError> {
    Scanner::new(options).run(reader)
}

pub struct Scanner {
    pipeline: RecognizerPipeline,
    origin: TimeOrigin,
    continuations: ContinuationPatterns,
    events: Vec<GcEvent>,
    /// The most recently emitted event is still accreting raw lines.
    /// Only `Shutdown` does this.
    shutdown_active: bool,
}

impl Scanner {
    pub fn new(options: ScanOptions) -> Self {
        let origin = TimeOrigin::new();
        if let Some(epoch_ms) = options.time_origin {
            origin.set(epoch_ms);
        }
        Self {
            pipeline: RecognizerPipeline::new(),
            origin,
            continuations: options.continuations,
            events: Vec::new(),
            shutdown_active: false,
        }
    }

    pub fn run<R: BufRead>(mut self, reader: R) -> Result<Vec<GcEvent>, EngineError> {
        let mut buffered: Option<(String, usize)> = None;
        let mut coalesced = false;

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let number = index + 1;

            if self.continuations.matches(&line) {
                // The line belongs to the previously buffered one. A
                // continuation with nothing to attach to, or two in a row,
                // is caller misuse: events never span more than two
                // physical lines.
                let Some((buffer, _)) = buffered.as_mut() else {
                    return Err(UsageError::ContinuationAtStart { line: number }.into());
                };
                if coalesced {
                    return Err(UsageError::ChainedContinuation { line: number }.into());
                }
                buffer.push_str(&line);
                coalesced = true;
            } else {
                if let Some((text, at)) = buffered.take() {
                    self.process_line(&text, at, false)?;
                }
                buffered = Some((line, number));
                coalesced = false;
            }
        }

        if let Some((text, at)) = buffered.take() {
            self.process_line(&text, at, true)?;
        }

        Ok(self.events)
    }

    fn process_line(&mut self, text: &str, line: usize, last: bool) -> Result<(), EngineError> {
        match self.split_and_dispatch(text, line) {
            Err(err) if last && err.is_parse() => {
                warn!(line, error = %err, "incomplete trailing line dropped");
                Ok(())
            }
            other => other,
        }
    }

    /// Split one logical line into fragments at qualifying timestamp
    /// boundaries and dispatch each in source order.
    fn split_and_dispatch(&mut self, text: &str, line: usize) -> Result<(), EngineError> {
        let Some(first) = timestamp::find(text, 0, line)? else {
            return self.dispatch(None, text, line);
        };

        if first.start() > 0 {
            debug!(line, prefix = %&text[..first.start()], "dropping text before first timestamp");
        }

        let mut current = first;
        loop {
            let next = timestamp::find(text, current.end(), line)?;
            let end = next.as_ref().map(Timestamp::start).unwrap_or(text.len());
            let fragment = &text[current.end()..end];
            self.dispatch(Some(current), fragment, line)?;

            match next {
                Some(ts) => current = ts,
                None => return Ok(()),
            }
        }
    }

    fn dispatch(
        &mut self,
        ts: Option<Timestamp>,
        text: &str,
        line: usize,
    ) -> Result<(), EngineError> {
        // An active multi-line event bypasses the pipeline entirely.
        if self.shutdown_active {
            if ts.is_none() && shutdown::claims(text) {
                if let Some(GcEvent::Shutdown(event)) = self.events.last_mut() {
                    shutdown::accrete(event, text);
                    return Ok(());
                }
            }
            self.shutdown_active = false;
        }

        let mut ts = ts;
        if let (Some(ts), Some(origin)) = (ts.as_mut(), self.origin.get()) {
            ts.resolve(origin);
        }

        match self.pipeline.recognize(ts.as_ref(), text, line)? {
            Some(event) => {
                self.shutdown_active = matches!(event, GcEvent::Shutdown(_));
                self.events.push(event);
            }
            None => warn!(line, fragment = %text, "unrecognized fragment dropped"),
        }

        Ok(())
    }
}
