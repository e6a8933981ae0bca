// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

/// How long a fetched catalog is served before the feeds are fetched again
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Name of the preferences file inside the data directory
pub const PREFERENCES_FILE: &str = "preferences.json";

const APP_DIR: &str = "podheaven";

/// Built-in creator feeds, in display order
const DEFAULT_CREATORS: &[(&str, &str)] = &[
    (
        "Alpha Akki Dark",
        "https://raw.githubusercontent.com/Shashwat-CODER-Music/akkidark/refs/heads/main/channel.json",
    ),
    (
        "Sr Pay Stories",
        "https://raw.githubusercontent.com/Studyleague01/srpay/refs/heads/main/channel.json",
    ),
    (
        "Alpha Akki",
        "https://raw.githubusercontent.com/Shashwat-CODING/akki/refs/heads/main/channel.json",
    ),
    (
        "Shivam is On",
        "https://raw.githubusercontent.com/Scodify236/sio/refs/heads/main/channel.json",
    ),
    (
        "Thrill Tales",
        "https://raw.githubusercontent.com/1fffd/thrilltales/refs/heads/main/channel.json",
    ),
    (
        "Akshay Vasisth",
        "https://raw.githubusercontent.com/channelcnt/channel/refs/heads/main/channel.json",
    ),
    (
        "Amaan Parkar",
        "https://raw.githubusercontent.com/Studyleague01/amanpar/refs/heads/main/channel.json",
    ),
    (
        "Fintale",
        "https://raw.githubusercontent.com/Shashwat-CODER-Music/fintale/refs/heads/main/channel.json",
    ),
    ("Alpha Crime", "https://akkicrime.pages.dev/channel.json"),
];

/// A named creator feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSource {
    pub creator: String,
    pub url: Url,
}

impl FeedSource {
    pub fn new(creator: &str, url: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(url).map_err(|e| ConfigError::InvalidUrl {
            creator: creator.to_string(),
            source: e,
        })?;

        Ok(Self {
            creator: creator.to_string(),
            url,
        })
    }
}

/// The built-in creator feeds
pub fn default_sources() -> Vec<FeedSource> {
    DEFAULT_CREATORS
        .iter()
        .filter_map(|(creator, url)| FeedSource::new(creator, url).ok())
        .collect()
}

/// Parse a `{ "Creator": "https://…" }` mapping, keeping declaration order
pub fn parse_sources(json: &str, path: &Path) -> Result<Vec<FeedSource>, ConfigError> {
    let mapping: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(json).map_err(|e| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    mapping
        .iter()
        .map(|(creator, value)| {
            let url = value.as_str().ok_or_else(|| ConfigError::NotAString {
                creator: creator.clone(),
            })?;
            FeedSource::new(creator, url)
        })
        .collect()
}

/// Read creator feeds from a JSON mapping file
pub fn load_sources(path: &Path) -> Result<Vec<FeedSource>, ConfigError> {
    let json = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_sources(&json, path)
}

/// Resolved runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub sources: Vec<FeedSource>,
    pub cache_ttl: Duration,
    pub data_dir: PathBuf,
}

impl Config {
    /// Resolve configuration, falling back to built-in sources and the
    /// platform data directory
    pub fn resolve(
        sources_file: Option<&Path>,
        data_dir: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let sources = match sources_file {
            Some(path) => load_sources(path)?,
            None => default_sources(),
        };

        let data_dir = match data_dir {
            Some(dir) => dir,
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(ConfigError::NoDataDir)?,
        };

        Ok(Self {
            sources,
            cache_ttl: DEFAULT_CACHE_TTL,
            data_dir,
        })
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.data_dir.join(PREFERENCES_FILE)
    }
}
