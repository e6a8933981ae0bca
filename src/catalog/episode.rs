// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde::Deserialize;

use crate::error::CatalogError;

/// A single playable episode, tagged with the creator it was fetched for.
///
/// Episodes are immutable once built and are shared as `Arc<Episode>`
/// between the catalog, the play queue and the current selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Episode {
    /// Globally unique identifier
    pub id: String,
    pub title: String,
    /// Display name of the creator whose feed listed this episode
    pub author: String,
    pub description: String,
    /// Location of the audio asset handed to the playback engine
    pub media_url: String,
    pub duration_seconds: u64,
    /// Publication time as an epoch ordering key
    pub published: i64,
    /// Human readable publication hint supplied by the feed ("2 days ago")
    pub published_text: String,
    pub view_count: u64,
    pub live: bool,
}

impl Episode {
    /// Build an episode from a raw feed record
    pub fn from_raw(raw: RawEpisode, creator: &str) -> Self {
        Self {
            id: raw.video_id,
            title: raw.title,
            author: creator.to_string(),
            description: raw.description,
            media_url: raw.file_path,
            duration_seconds: raw.length_seconds,
            published: raw.published,
            published_text: raw.published_text,
            view_count: raw.view_count,
            live: raw.live_now,
        }
    }

    /// Description with HTML entities decoded, for terminal display
    pub fn plain_description(&self) -> String {
        html_escape::decode_html_entities(&self.description).into_owned()
    }
}

/// One episode record as it appears in a creator feed
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEpisode {
    pub video_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub file_path: String,
    #[serde(default)]
    pub published: i64,
    #[serde(default)]
    pub published_text: String,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub length_seconds: u64,
    #[serde(default)]
    pub live_now: bool,
}

/// A complete creator feed document
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedDocument {
    /// Episode total as declared by the feed publisher
    #[serde(default)]
    pub total_videos: usize,
    pub videos: Vec<RawEpisode>,
}

/// Episodes decoded from one creator's feed
#[derive(Debug, Clone)]
pub struct CreatorFeed {
    pub creator: String,
    pub declared_total: usize,
    pub episodes: Vec<Episode>,
}

/// Decode a creator feed document, tagging every episode with `creator`
pub fn parse_feed(json_bytes: &[u8], creator: &str) -> Result<CreatorFeed, CatalogError> {
    let document: FeedDocument =
        serde_json::from_slice(json_bytes).map_err(|e| CatalogError::ParseFailed {
            creator: creator.to_string(),
            source: e,
        })?;

    let declared_total = document.total_videos;
    let episodes = document
        .videos
        .into_iter()
        .map(|raw| Episode::from_raw(raw, creator))
        .collect();

    Ok(CreatorFeed {
        creator: creator.to_string(),
        declared_total,
        episodes,
    })
}
