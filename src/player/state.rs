// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use tokio::time::Instant;

use crate::catalog::{Episode, EpisodeFilter};
use crate::engine::EngineEvent;

/// Playback rates offered to the listener
pub const PLAYBACK_RATES: [f64; 7] = [0.5, 0.75, 1.0, 1.25, 1.5, 1.75, 2.0];

/// Step used by the skip back / skip forward controls
pub const SKIP_INTERVAL_SECONDS: f64 = 15.0;

/// Transport state of a selected episode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Playing,
    Paused,
    /// Reached the end with nothing queued behind it
    Ended,
}

/// The selected episode and where playback stands in it
#[derive(Debug, Clone, PartialEq)]
pub struct NowPlaying {
    pub episode: Arc<Episode>,
    pub transport: Transport,
    pub progress: f64,
    /// Zero until the engine reports metadata
    pub duration: f64,
}

/// Whether anything is selected.
///
/// Position and transport only exist alongside an episode, so an idle
/// player can never report itself as playing or part-way through.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Playback {
    #[default]
    Idle,
    Active(NowPlaying),
}

impl Playback {
    pub(crate) fn start(episode: Arc<Episode>, transport: Transport) -> Self {
        Playback::Active(NowPlaying {
            episode,
            transport,
            progress: 0.0,
            duration: 0.0,
        })
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Playback::Idle)
    }

    pub fn episode(&self) -> Option<&Arc<Episode>> {
        match self {
            Playback::Idle => None,
            Playback::Active(now) => Some(&now.episode),
        }
    }

    pub fn transport(&self) -> Option<Transport> {
        match self {
            Playback::Idle => None,
            Playback::Active(now) => Some(now.transport),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.transport() == Some(Transport::Playing)
    }

    pub fn progress(&self) -> f64 {
        match self {
            Playback::Idle => 0.0,
            Playback::Active(now) => now.progress,
        }
    }

    pub fn duration(&self) -> f64 {
        match self {
            Playback::Idle => 0.0,
            Playback::Active(now) => now.duration,
        }
    }
}

/// What the store still has to do after an engine event was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Followup {
    Nothing,
    AdvanceQueue,
}

/// Everything the player tracks for the lifetime of a session
#[derive(Debug, Clone)]
pub struct SessionState {
    pub(crate) playback: Playback,
    pub(crate) queue: VecDeque<Arc<Episode>>,
    pub(crate) volume: f64,
    pub(crate) playback_rate: f64,
    pub(crate) minimized: bool,
    pub(crate) sleep_deadline: Option<Instant>,
    pub(crate) liked: HashSet<String>,
    pub(crate) filter: EpisodeFilter,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            playback: Playback::Idle,
            queue: VecDeque::new(),
            volume: 1.0,
            playback_rate: 1.0,
            minimized: true,
            sleep_deadline: None,
            liked: HashSet::new(),
            filter: EpisodeFilter::default(),
        }
    }
}

impl SessionState {
    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    pub fn current_episode(&self) -> Option<&Arc<Episode>> {
        self.playback.episode()
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    pub fn progress_seconds(&self) -> f64 {
        self.playback.progress()
    }

    pub fn duration_seconds(&self) -> f64 {
        self.playback.duration()
    }

    pub fn queue(&self) -> &VecDeque<Arc<Episode>> {
        &self.queue
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn playback_rate(&self) -> f64 {
        self.playback_rate
    }

    pub fn minimized(&self) -> bool {
        self.minimized
    }

    pub fn sleep_deadline(&self) -> Option<Instant> {
        self.sleep_deadline
    }

    /// Whole minutes left on the sleep timer, rounded up
    pub fn sleep_timer_minutes(&self, now: Instant) -> Option<u64> {
        self.sleep_deadline.map(|deadline| {
            let remaining = deadline.saturating_duration_since(now).as_millis();
            remaining.div_ceil(60_000) as u64
        })
    }

    pub fn liked(&self) -> &HashSet<String> {
        &self.liked
    }

    pub fn is_liked(&self, id: &str) -> bool {
        self.liked.contains(id)
    }

    pub fn filter(&self) -> &EpisodeFilter {
        &self.filter
    }

    /// Apply an engine notification.
    ///
    /// Events for an idle player are dropped. Completion with a non-empty
    /// queue is left to the caller, which owns the engine needed to start
    /// the next episode.
    pub(crate) fn apply_event(&mut self, event: &EngineEvent) -> Followup {
        let Playback::Active(now) = &mut self.playback else {
            return Followup::Nothing;
        };

        match event {
            EngineEvent::Progress(seconds) => {
                now.progress = seconds.max(0.0);
            }
            EngineEvent::MetadataReady { duration } => {
                now.duration = if duration.is_finite() {
                    duration.max(0.0)
                } else {
                    0.0
                };
            }
            EngineEvent::Ended => {
                if !self.queue.is_empty() {
                    return Followup::AdvanceQueue;
                }
                // Progress stays where the last tick left it
                now.transport = Transport::Ended;
            }
            EngineEvent::PlayRejected(reason) => {
                if now.transport == Transport::Playing {
                    tracing::warn!(%reason, "playback refused by audio output");
                    now.transport = Transport::Paused;
                }
            }
        }

        Followup::Nothing
    }

    /// Read-only view published to the UI
    pub fn snapshot(&self, now: Instant) -> Snapshot {
        Snapshot {
            current_episode: self.current_episode().cloned(),
            transport: self.playback.transport(),
            queue: self.queue.iter().cloned().collect(),
            is_playing: self.is_playing(),
            volume: self.volume,
            progress_seconds: self.progress_seconds(),
            duration_seconds: self.duration_seconds(),
            playback_rate: self.playback_rate,
            sleep_timer_minutes: self.sleep_timer_minutes(now),
            minimized: self.minimized,
            liked: self.liked.clone(),
            filter: self.filter.clone(),
        }
    }
}

/// Point-in-time copy of the player state for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub current_episode: Option<Arc<Episode>>,
    pub transport: Option<Transport>,
    pub queue: Vec<Arc<Episode>>,
    pub is_playing: bool,
    pub volume: f64,
    pub progress_seconds: f64,
    pub duration_seconds: f64,
    pub playback_rate: f64,
    pub sleep_timer_minutes: Option<u64>,
    pub minimized: bool,
    pub liked: HashSet<String>,
    pub filter: EpisodeFilter,
}

impl Snapshot {
    pub fn is_liked(&self, id: &str) -> bool {
        self.liked.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn episode(id: &str) -> Arc<Episode> {
        Arc::new(Episode {
            id: id.to_string(),
            title: format!("Episode {id}"),
            author: "Thrill Tales".to_string(),
            description: String::new(),
            media_url: format!("https://cdn.example.com/{id}.mp3"),
            duration_seconds: 600,
            published: 0,
            published_text: String::new(),
            view_count: 0,
            live: false,
        })
    }

    fn playing(id: &str) -> SessionState {
        SessionState {
            playback: Playback::start(episode(id), Transport::Playing),
            ..Default::default()
        }
    }

    #[test]
    fn idle_state_reports_nothing_playing() {
        let state = SessionState::default();

        assert!(state.current_episode().is_none());
        assert!(!state.is_playing());
        assert_eq!(state.progress_seconds(), 0.0);
        assert_eq!(state.volume(), 1.0);
        assert_eq!(state.playback_rate(), 1.0);
        assert!(state.minimized());
    }

    #[test]
    fn events_are_ignored_while_idle() {
        let mut state = SessionState::default();

        for event in [
            EngineEvent::Progress(12.0),
            EngineEvent::MetadataReady { duration: 99.0 },
            EngineEvent::Ended,
            EngineEvent::PlayRejected("blocked".to_string()),
        ] {
            assert_eq!(state.apply_event(&event), Followup::Nothing);
        }

        assert_eq!(state.playback, Playback::Idle);
        assert_eq!(state.progress_seconds(), 0.0);
    }

    #[test]
    fn progress_and_metadata_update_position() {
        let mut state = playing("a");

        state.apply_event(&EngineEvent::MetadataReady { duration: 600.0 });
        state.apply_event(&EngineEvent::Progress(12.5));

        assert_eq!(state.progress_seconds(), 12.5);
        assert_eq!(state.duration_seconds(), 600.0);
    }

    #[test]
    fn unknown_duration_is_recorded_as_zero() {
        let mut state = playing("a");

        state.apply_event(&EngineEvent::MetadataReady {
            duration: f64::INFINITY,
        });

        assert_eq!(state.duration_seconds(), 0.0);
    }

    #[test]
    fn ended_without_queue_keeps_episode_and_final_position() {
        let mut state = playing("a");
        state.apply_event(&EngineEvent::Progress(599.8));

        let followup = state.apply_event(&EngineEvent::Ended);

        assert_eq!(followup, Followup::Nothing);
        assert_eq!(state.current_episode().unwrap().id, "a");
        assert_eq!(state.playback.transport(), Some(Transport::Ended));
        assert!(!state.is_playing());
        assert_eq!(state.progress_seconds(), 599.8);
    }

    #[test]
    fn ended_with_queue_asks_for_advance() {
        let mut state = playing("a");
        state.queue.push_back(episode("b"));

        assert_eq!(
            state.apply_event(&EngineEvent::Ended),
            Followup::AdvanceQueue
        );
        assert!(state.is_playing());
    }

    #[test]
    fn late_rejection_pauses() {
        let mut state = playing("a");

        state.apply_event(&EngineEvent::PlayRejected("blocked".to_string()));

        assert_eq!(state.playback.transport(), Some(Transport::Paused));
    }

    #[test]
    fn sleep_minutes_round_up_and_never_go_negative() {
        let now = Instant::now();
        let mut state = SessionState::default();
        assert_eq!(state.sleep_timer_minutes(now), None);

        state.sleep_deadline = Some(now + Duration::from_secs(61));
        assert_eq!(state.sleep_timer_minutes(now), Some(2));

        state.sleep_deadline = Some(now + Duration::from_secs(60));
        assert_eq!(state.sleep_timer_minutes(now), Some(1));

        assert_eq!(
            state.sleep_timer_minutes(now + Duration::from_secs(120)),
            Some(0)
        );
    }

    #[test]
    fn snapshot_mirrors_state() {
        let mut state = playing("a");
        state.queue.push_back(episode("b"));
        state.liked.insert("b".to_string());

        let snapshot = state.snapshot(Instant::now());

        assert_eq!(snapshot.current_episode.as_ref().unwrap().id, "a");
        assert_eq!(snapshot.transport, Some(Transport::Playing));
        assert!(snapshot.is_playing);
        assert_eq!(snapshot.queue.len(), 1);
        assert!(snapshot.is_liked("b"));
        assert!(!snapshot.is_liked("a"));
        assert_eq!(snapshot.sleep_timer_minutes, None);
    }
}
