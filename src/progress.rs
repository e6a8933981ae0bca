use std::sync::Arc;
use std::time::Duration;

/// Events emitted while loading the episode catalog
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A creator feed is being fetched
    FetchingSource { creator: String, url: String },

    /// A creator feed was fetched and decoded
    SourceLoaded { creator: String, episodes: usize },

    /// A creator feed failed; the whole catalog load fails with it
    SourceFailed { creator: String, error: String },

    /// A fresh catalog was assembled from every source
    CatalogReady { episodes: usize, creators: usize },

    /// A cached catalog was still within its freshness window
    CatalogCached { age: Duration },
}

/// Trait for reporting progress events while loading the catalog.
///
/// Implementations can use this to display spinners, log messages,
/// or collect statistics.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event
    fn report(&self, event: ProgressEvent);
}

/// A shared reference to a progress reporter
pub type SharedProgressReporter = Arc<dyn ProgressReporter>;

/// A no-op progress reporter that silently ignores all events.
/// Useful for tests or quiet mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: ProgressEvent) {}
}

impl NoopReporter {
    /// Create a new NoopReporter wrapped in an Arc
    pub fn shared() -> SharedProgressReporter {
        Arc::new(Self)
    }
}

/// Forwards progress events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::FetchingSource { creator, url } => {
                tracing::debug!(%creator, %url, "fetching feed");
            }
            ProgressEvent::SourceLoaded { creator, episodes } => {
                tracing::debug!(%creator, episodes, "feed loaded");
            }
            ProgressEvent::SourceFailed { creator, error } => {
                tracing::warn!(%creator, %error, "feed failed");
            }
            ProgressEvent::CatalogReady { episodes, creators } => {
                tracing::info!(episodes, creators, "catalog ready");
            }
            ProgressEvent::CatalogCached { age } => {
                tracing::debug!(age_secs = age.as_secs(), "using cached catalog");
            }
        }
    }
}

impl TracingReporter {
    /// Create a new TracingReporter wrapped in an Arc
    pub fn shared() -> SharedProgressReporter {
        Arc::new(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Collects reported events for inspection
    #[derive(Default)]
    struct RecordingReporter {
        events: Mutex<Vec<ProgressEvent>>,
    }

    impl ProgressReporter for RecordingReporter {
        fn report(&self, event: ProgressEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn all_events() -> Vec<ProgressEvent> {
        vec![
            ProgressEvent::FetchingSource {
                creator: "Fintale".to_string(),
                url: "https://example.com/channel.json".to_string(),
            },
            ProgressEvent::SourceLoaded {
                creator: "Fintale".to_string(),
                episodes: 12,
            },
            ProgressEvent::SourceFailed {
                creator: "Alpha Crime".to_string(),
                error: "Connection timeout".to_string(),
            },
            ProgressEvent::CatalogReady {
                episodes: 12,
                creators: 1,
            },
            ProgressEvent::CatalogCached {
                age: Duration::from_secs(42),
            },
        ]
    }

    #[test]
    fn noop_and_tracing_reporters_handle_all_events() {
        for event in all_events() {
            NoopReporter.report(event.clone());
            TracingReporter.report(event);
        }
    }

    #[test]
    fn shared_reporter_is_usable_as_trait_object() {
        let recorder = Arc::new(RecordingReporter::default());
        let shared: SharedProgressReporter = recorder.clone();

        for event in all_events() {
            shared.report(event);
        }

        assert_eq!(recorder.events.lock().unwrap().len(), 5);
    }
}
