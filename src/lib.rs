pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod format;
pub mod http;
pub mod player;
pub mod preferences;
pub mod progress;

// Re-export main types for convenience
pub use catalog::{Catalog, CatalogProvider, CreatorSummary, Episode, EpisodeFilter};
pub use config::{Config, DEFAULT_CACHE_TTL, FeedSource, default_sources};
pub use engine::{EngineEvent, EngineFactory, EngineNotice, EventSink, PlaybackEngine};
pub use error::{CatalogError, ConfigError, EngineError, PreferenceError, SessionError};
pub use http::{HttpClient, ReqwestClient};
pub use player::{Command, PlayerHandle, PlayerSession, PlaybackStore, Snapshot, Transport};
pub use preferences::{FileStorage, KeyValueStorage, LikedEpisodes, MemoryStorage, PreferenceStore};
pub use progress::{NoopReporter, ProgressEvent, ProgressReporter, SharedProgressReporter, TracingReporter};
