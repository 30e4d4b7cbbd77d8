// GC log parsing engine: reconstructs typed collection events from
// free-form collector output.

pub mod error;
pub mod parser;
pub mod scan;

pub use error::{EngineError, UsageError};
pub use parser::{CollectionType, FieldKind, GcEvent, RecognizerPipeline, Timestamp};
pub use scan::{scan_file, scan_reader, ContinuationPatterns, ScanOptions, TimeOrigin};
