// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::FeedSource;
use crate::error::CatalogError;
use crate::http::HttpClient;
use crate::progress::{ProgressEvent, SharedProgressReporter};

use super::fetch::{Catalog, fetch_catalog};

struct CachedCatalog {
    fetched_at: Instant,
    catalog: Arc<Catalog>,
}

/// Serves the merged catalog, refetching only once the freshness window
/// has elapsed.
///
/// A failed refresh is returned to the caller as-is and leaves any
/// previous entry untouched; stale data is never served in its place.
pub struct CatalogProvider<C> {
    client: C,
    sources: Vec<FeedSource>,
    ttl: Duration,
    reporter: SharedProgressReporter,
    cached: Mutex<Option<CachedCatalog>>,
}

impl<C: HttpClient> CatalogProvider<C> {
    pub fn new(
        client: C,
        sources: Vec<FeedSource>,
        ttl: Duration,
        reporter: SharedProgressReporter,
    ) -> Self {
        Self {
            client,
            sources,
            ttl,
            reporter,
            cached: Mutex::new(None),
        }
    }

    pub fn sources(&self) -> &[FeedSource] {
        &self.sources
    }

    /// Return the catalog, fetching all sources if the cache is cold or stale
    pub async fn catalog(&self) -> Result<Arc<Catalog>, CatalogError> {
        // Held across the fetch so concurrent callers share one refresh
        let mut cached = self.cached.lock().await;

        if let Some(entry) = cached.as_ref() {
            let age = entry.fetched_at.elapsed();
            if age < self.ttl {
                self.reporter.report(ProgressEvent::CatalogCached { age });
                return Ok(Arc::clone(&entry.catalog));
            }
        }

        let catalog = Arc::new(fetch_catalog(&self.client, &self.sources, &self.reporter).await?);

        *cached = Some(CachedCatalog {
            fetched_at: Instant::now(),
            catalog: Arc::clone(&catalog),
        });

        Ok(catalog)
    }

    /// Drop the cached catalog so the next call refetches
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }
}
