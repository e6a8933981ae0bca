use std::collections::HashSet;
use std::sync::Arc;

use super::episode::Episode;

/// Search and creator filter applied to the episode grid
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpisodeFilter {
    /// Case-insensitive substring matched against titles
    pub search_query: String,
    /// Exact creator name, or every creator when unset
    pub selected_creator: Option<String>,
}

impl EpisodeFilter {
    pub fn matches(&self, episode: &Episode) -> bool {
        let matches_search = self.search_query.is_empty()
            || episode
                .title
                .to_lowercase()
                .contains(&self.search_query.to_lowercase());
        let matches_creator = self
            .selected_creator
            .as_deref()
            .is_none_or(|creator| episode.author == creator);

        matches_search && matches_creator
    }

    /// Filter and order episodes for display.
    ///
    /// Across all creators the most viewed come first. With a creator
    /// selected the newest episodes come first instead.
    pub fn apply(&self, episodes: &[Arc<Episode>]) -> Vec<Arc<Episode>> {
        let mut visible: Vec<Arc<Episode>> = episodes
            .iter()
            .filter(|episode| self.matches(episode))
            .cloned()
            .collect();

        if self.selected_creator.is_some() {
            visible.sort_by(|a, b| b.published.cmp(&a.published));
        } else {
            visible.sort_by(|a, b| b.view_count.cmp(&a.view_count));
        }

        visible
    }
}

/// Episodes whose ids are in the liked set, in catalog order
pub fn liked_episodes(episodes: &[Arc<Episode>], liked: &HashSet<String>) -> Vec<Arc<Episode>> {
    episodes
        .iter()
        .filter(|episode| liked.contains(&episode.id))
        .cloned()
        .collect()
}
