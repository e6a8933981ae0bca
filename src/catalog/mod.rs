mod cache;
mod episode;
mod fetch;
mod view;

pub use cache::CatalogProvider;
pub use episode::{CreatorFeed, Episode, FeedDocument, RawEpisode, parse_feed};
pub use fetch::{Catalog, CreatorSummary, fetch_catalog, fetch_source};
pub use view::{EpisodeFilter, liked_episodes};
