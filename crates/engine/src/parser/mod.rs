//! Event parsing module.
//!
//! Converts timestamp-anchored fragments of GC log text into typed
//! [`model::GcEvent`] values.
//!
//! - `timestamp.rs`: timestamp discovery with disqualification/backtracking
//! - `tokens.rs`: bracket-aware tokenizer
//! - `events/`: per-event-family recognizers
//! - `pipeline.rs`: ordered recognizer chain
//! - `model.rs`: event and measurement types

pub mod events;
pub mod model;
pub mod pipeline;
pub mod timestamp;
pub mod tokens;

// Re-export commonly used types
pub use model::{CollectionType, FieldKind, GcEvent};
pub use pipeline::RecognizerPipeline;
pub use timestamp::Timestamp;
