//! Continuation-line detection.
//!
//! Some collectors split one logical event over two physical lines with no
//! in-band marker beyond the shape of the second line. Callers configure a
//! list of regular expressions; a physical line matching any of them is
//! concatenated onto the previously buffered line. The default installs
//! exactly one pattern, for the CMS `(concurrent mode failure)` split.

use once_cell::sync::Lazy;
use regex::Regex;

static CONCURRENT_MODE_FAILURE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\(concurrent mode failure\)").unwrap());

#[derive(Debug, Clone)]
pub struct ContinuationPatterns {
    patterns: Vec<Regex>,
}

impl ContinuationPatterns {
    /// No coalescing at all: every physical line is a logical line.
    pub fn none() -> Self {
        Self { patterns: Vec::new() }
    }

    pub fn with(patterns: Vec<Regex>) -> Self {
        Self { patterns }
    }

    pub fn matches(&self, line: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(line))
    }
}

impl Default for ContinuationPatterns {
    fn default() -> Self {
        Self {
            patterns: vec![CONCURRENT_MODE_FAILURE.clone()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_concurrent_mode_failure() {
        let patterns = ContinuationPatterns::default();
        assert!(patterns.matches(" (concurrent mode failure): 287176K->242950K(512000K)"));
        assert!(patterns.matches("(concurrent mode failure): 1K->2K(3K)"));
    }

    #[test]
    fn test_default_ignores_ordinary_lines() {
        let patterns = ContinuationPatterns::default();
        assert!(!patterns.matches("4.751: [GC [PSYoungGen: 1K->0K(2K)]]"));
        assert!(!patterns.matches("Heap"));
    }

    #[test]
    fn test_caller_supplied_patterns() {
        let patterns = ContinuationPatterns::with(vec![Regex::new(r"^\s*at ").unwrap()]);
        assert!(patterns.matches("   at java.lang.Object.wait"));
        assert!(!patterns.matches(" (concurrent mode failure)"));
    }

    #[test]
    fn test_none_matches_nothing() {
        assert!(!ContinuationPatterns::none().matches("(concurrent mode failure)"));
    }
}
