//! Scan module — the linear scan driver and its collaborators.

pub mod continuation;
pub mod driver;
pub mod origin;

pub use continuation::ContinuationPatterns;
pub use driver::{scan_file, scan_reader, ScanOptions, Scanner};
pub use origin::TimeOrigin;
