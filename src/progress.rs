//! Progress-callback trait for pipeline stage events.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] via
//! [`crate::config::AnalysisConfigBuilder::progress_callback`] to be told when
//! extraction starts and finishes, when the model request goes out, and when
//! the run completes. The CLI uses it to drive its spinner; a GUI could flip
//! a busy indicator instead.
//!
//! # Example
//!
//! ```rust
//! use cockpit_review::{AnalysisConfig, AnalysisProgressCallback};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl AnalysisProgressCallback for Printer {
//!     fn on_text_extracted(&self, pages: usize, chars: usize) {
//!         eprintln!("{pages} pages, {chars} chars");
//!     }
//! }
//!
//! let config = AnalysisConfig::builder()
//!     .progress_callback(Arc::new(Printer) as Arc<dyn AnalysisProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the analysis pipeline as it moves between stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait AnalysisProgressCallback: Send + Sync {
    /// Called before the PDF is opened.
    fn on_extraction_start(&self, source: &str) {
        let _ = source;
    }

    /// Called once the text of every page has been read.
    fn on_text_extracted(&self, page_count: usize, char_count: usize) {
        let _ = (page_count, char_count);
    }

    /// Called just before the model request is sent.
    fn on_request_start(&self, organization_id: &str) {
        let _ = organization_id;
    }

    /// Called when the run produced a result.
    fn on_analysis_complete(&self, pattern_count: usize, used_fallback: bool) {
        let _ = (pattern_count, used_fallback);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AnalysisConfig`].
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        stages: AtomicUsize,
        pages: AtomicUsize,
        patterns: AtomicUsize,
    }

    impl AnalysisProgressCallback for TrackingCallback {
        fn on_extraction_start(&self, _source: &str) {
            self.stages.fetch_add(1, Ordering::SeqCst);
        }

        fn on_text_extracted(&self, page_count: usize, _char_count: usize) {
            self.stages.fetch_add(1, Ordering::SeqCst);
            self.pages.store(page_count, Ordering::SeqCst);
        }

        fn on_request_start(&self, _organization_id: &str) {
            self.stages.fetch_add(1, Ordering::SeqCst);
        }

        fn on_analysis_complete(&self, pattern_count: usize, _used_fallback: bool) {
            self.stages.fetch_add(1, Ordering::SeqCst);
            self.patterns.store(pattern_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_extraction_start("a.pdf");
        cb.on_text_extracted(2, 100);
        cb.on_request_start("SPARRING001");
        cb.on_analysis_complete(3, false);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_extraction_start("a.pdf");
        tracker.on_text_extracted(4, 1200);
        tracker.on_request_start("AEROLINK001");
        tracker.on_analysis_complete(2, true);

        assert_eq!(tracker.stages.load(Ordering::SeqCst), 4);
        assert_eq!(tracker.pages.load(Ordering::SeqCst), 4);
        assert_eq!(tracker.patterns.load(Ordering::SeqCst), 2);
    }
}
