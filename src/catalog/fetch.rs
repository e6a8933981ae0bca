// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;

use futures::future::try_join_all;

use crate::config::FeedSource;
use crate::error::CatalogError;
use crate::http::HttpClient;
use crate::progress::{ProgressEvent, SharedProgressReporter};

use super::episode::{CreatorFeed, Episode, parse_feed};

/// Episode count for one creator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatorSummary {
    pub name: String,
    /// Episodes actually present in the feed
    pub episode_count: usize,
    /// Total the feed claims to have
    pub declared_total: usize,
}

/// Every episode across all creators, most viewed first
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub episodes: Vec<Arc<Episode>>,
    /// In source configuration order
    pub creators: Vec<CreatorSummary>,
}

impl Catalog {
    /// Merge per-creator feeds into one catalog
    pub fn from_feeds(feeds: Vec<CreatorFeed>) -> Self {
        let creators = feeds
            .iter()
            .map(|feed| CreatorSummary {
                name: feed.creator.clone(),
                episode_count: feed.episodes.len(),
                declared_total: feed.declared_total,
            })
            .collect();

        let mut episodes: Vec<Arc<Episode>> = feeds
            .into_iter()
            .flat_map(|feed| feed.episodes)
            .map(Arc::new)
            .collect();
        episodes.sort_by(|a, b| b.view_count.cmp(&a.view_count));

        Self { episodes, creators }
    }

    /// Look up an episode by identifier
    pub fn find(&self, id: &str) -> Option<&Arc<Episode>> {
        self.episodes.iter().find(|episode| episode.id == id)
    }

    pub fn has_creator(&self, name: &str) -> bool {
        self.creators.iter().any(|creator| creator.name == name)
    }
}

/// Fetch and decode a single creator feed
pub async fn fetch_source<C: HttpClient>(
    client: &C,
    source: &FeedSource,
    reporter: &SharedProgressReporter,
) -> Result<CreatorFeed, CatalogError> {
    reporter.report(ProgressEvent::FetchingSource {
        creator: source.creator.clone(),
        url: source.url.to_string(),
    });

    let result = async {
        let bytes = client
            .get_bytes(source.url.as_str())
            .await
            .map_err(|e| CatalogError::FetchFailed {
                creator: source.creator.clone(),
                url: source.url.to_string(),
                source: e,
            })?;
        parse_feed(&bytes, &source.creator)
    }
    .await;

    match &result {
        Ok(feed) => reporter.report(ProgressEvent::SourceLoaded {
            creator: source.creator.clone(),
            episodes: feed.episodes.len(),
        }),
        Err(e) => reporter.report(ProgressEvent::SourceFailed {
            creator: source.creator.clone(),
            error: e.to_string(),
        }),
    }

    result
}

/// Fetch every source concurrently and merge them into one catalog.
///
/// The load is all-or-nothing: the first failing source fails the whole
/// catalog and no partial result is returned.
pub async fn fetch_catalog<C: HttpClient>(
    client: &C,
    sources: &[FeedSource],
    reporter: &SharedProgressReporter,
) -> Result<Catalog, CatalogError> {
    let feeds = try_join_all(
        sources
            .iter()
            .map(|source| fetch_source(client, source, reporter)),
    )
    .await?;

    let catalog = Catalog::from_feeds(feeds);

    reporter.report(ProgressEvent::CatalogReady {
        episodes: catalog.episodes.len(),
        creators: catalog.creators.len(),
    });

    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::progress::NoopReporter;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::collections::HashMap;

    /// Serves canned feed bodies keyed by URL
    struct MockHttpClient {
        bodies: HashMap<String, String>,
    }

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn get_bytes(&self, url: &str) -> Result<Bytes, reqwest::Error> {
            let body = self.bodies.get(url).cloned().unwrap_or_default();
            Ok(Bytes::from(body))
        }
    }

    fn feed_json(entries: &[(&str, u64, i64)]) -> String {
        let videos: Vec<String> = entries
            .iter()
            .map(|(id, views, published)| {
                format!(
                    r#"{{"videoId": "{id}", "title": "Episode {id}", "filePath": "https://cdn.example.com/{id}.mp3", "viewCount": {views}, "published": {published}, "lengthSeconds": 600}}"#
                )
            })
            .collect();
        format!(
            r#"{{"totalVideos": {}, "videos": [{}]}}"#,
            entries.len() + 1,
            videos.join(",")
        )
    }

    fn sources() -> Vec<FeedSource> {
        vec![
            FeedSource::new("Thrill Tales", "https://example.com/thrill.json").unwrap(),
            FeedSource::new("Fintale", "https://example.com/fintale.json").unwrap(),
        ]
    }

    #[tokio::test]
    async fn merges_sources_sorted_by_views() {
        let client = MockHttpClient {
            bodies: HashMap::from([
                (
                    "https://example.com/thrill.json".to_string(),
                    feed_json(&[("t1", 10, 1), ("t2", 50, 2)]),
                ),
                (
                    "https://example.com/fintale.json".to_string(),
                    feed_json(&[("f1", 30, 3)]),
                ),
            ]),
        };

        let catalog = fetch_catalog(&client, &sources(), &NoopReporter::shared())
            .await
            .unwrap();

        let ids: Vec<&str> = catalog.episodes.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["t2", "f1", "t1"]);
        assert_eq!(catalog.find("f1").unwrap().author, "Fintale");
        assert_eq!(catalog.find("t1").unwrap().author, "Thrill Tales");
    }

    #[tokio::test]
    async fn creator_summaries_follow_source_order() {
        let client = MockHttpClient {
            bodies: HashMap::from([
                (
                    "https://example.com/thrill.json".to_string(),
                    feed_json(&[("t1", 10, 1), ("t2", 50, 2)]),
                ),
                (
                    "https://example.com/fintale.json".to_string(),
                    feed_json(&[("f1", 30, 3)]),
                ),
            ]),
        };

        let catalog = fetch_catalog(&client, &sources(), &NoopReporter::shared())
            .await
            .unwrap();

        assert_eq!(
            catalog.creators,
            vec![
                CreatorSummary {
                    name: "Thrill Tales".to_string(),
                    episode_count: 2,
                    declared_total: 3,
                },
                CreatorSummary {
                    name: "Fintale".to_string(),
                    episode_count: 1,
                    declared_total: 2,
                },
            ]
        );
        assert!(catalog.has_creator("Fintale"));
        assert!(!catalog.has_creator("Nobody"));
    }

    #[tokio::test]
    async fn one_broken_source_fails_the_whole_catalog() {
        let client = MockHttpClient {
            bodies: HashMap::from([(
                "https://example.com/thrill.json".to_string(),
                feed_json(&[("t1", 10, 1)]),
            )]),
        };

        let result = fetch_catalog(&client, &sources(), &NoopReporter::shared()).await;

        assert!(matches!(
            result,
            Err(CatalogError::ParseFailed { ref creator, .. }) if creator == "Fintale"
        ));
    }

    #[tokio::test]
    async fn empty_source_list_yields_empty_catalog() {
        let client = MockHttpClient {
            bodies: HashMap::new(),
        };

        let catalog = fetch_catalog(&client, &[], &NoopReporter::shared())
            .await
            .unwrap();

        assert!(catalog.episodes.is_empty());
        assert!(catalog.creators.is_empty());
    }
}
