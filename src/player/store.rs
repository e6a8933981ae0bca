// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::catalog::{Episode, liked_episodes};
use crate::engine::{EngineFactory, EngineNotice, EventSink, PlaybackEngine};
use crate::preferences::PreferenceStore;

use super::state::{Followup, Playback, SessionState, Snapshot, Transport};

/// The single source of truth for playback.
///
/// The store owns the only audio output. It creates it lazily through its
/// factory the first time it is needed, and every transport operation goes
/// through here so that displayed state and the output never disagree for
/// longer than one engine event.
pub struct PlaybackStore<F: EngineFactory, P> {
    factory: F,
    engine: Option<F::Engine>,
    events: EventSink,
    /// Id of the most recent engine load; notices for older loads are stale
    load: u64,
    preferences: P,
    state: SessionState,
}

impl<F: EngineFactory, P: PreferenceStore> PlaybackStore<F, P> {
    /// Create a store, loading the liked set from `preferences`.
    ///
    /// Engines built by `factory` report on `events`; the receiving side
    /// must feed those events back through [`PlaybackStore::handle_event`].
    pub fn new(factory: F, preferences: P, events: EventSink) -> Self {
        let state = SessionState {
            liked: preferences.load(),
            ..Default::default()
        };

        Self {
            factory,
            engine: None,
            events,
            load: 0,
            preferences,
            state,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.snapshot(Instant::now())
    }

    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    /// Create the audio output unless it already exists.
    ///
    /// Returns whether an output is available afterwards.
    pub fn init_audio(&mut self) -> bool {
        if self.engine.is_some() {
            return true;
        }

        match self.factory.create(self.events.clone()) {
            Ok(mut engine) => {
                engine.set_volume(self.state.volume);
                engine.set_rate(self.state.playback_rate);
                self.engine = Some(engine);
                tracing::info!("audio output initialised");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "audio output unavailable");
                false
            }
        }
    }

    fn engine(&mut self) -> Option<&mut F::Engine> {
        self.init_audio();
        self.engine.as_mut()
    }

    /// Make `episode` current and try to start it.
    ///
    /// A refused start leaves the episode selected but paused. Passing
    /// `None` clears the selection without touching the output.
    pub fn select_episode(&mut self, episode: Option<Arc<Episode>>) {
        let Some(episode) = episode else {
            tracing::debug!("selection cleared");
            self.state.playback = Playback::Idle;
            return;
        };

        self.load += 1;
        let load = self.load;
        let rate = self.state.playback_rate;
        let started = match self.engine() {
            Some(engine) => {
                engine.load(&episode.media_url, load);
                engine.set_rate(rate);
                match engine.play() {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::warn!(error = %e, "could not start playback");
                        false
                    }
                }
            }
            None => false,
        };

        tracing::debug!(id = %episode.id, started, "episode selected");
        let transport = if started {
            Transport::Playing
        } else {
            Transport::Paused
        };
        self.state.playback = Playback::start(episode, transport);
    }

    pub fn enqueue(&mut self, episode: Arc<Episode>) {
        tracing::debug!(id = %episode.id, "queued");
        self.state.queue.push_back(episode);
    }

    /// Remove the first queued episode with `id`; returns whether one was found
    pub fn dequeue(&mut self, id: &str) -> bool {
        match self.state.queue.iter().position(|episode| episode.id == id) {
            Some(index) => {
                self.state.queue.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn clear_queue(&mut self) {
        self.state.queue.clear();
    }

    /// Start the next queued episode.
    ///
    /// With an empty queue the current episode stays selected and output
    /// stops.
    pub fn advance_queue(&mut self) {
        match self.state.queue.pop_front() {
            Some(next) => self.select_episode(Some(next)),
            None => {
                if self.state.is_playing() {
                    self.set_playing(false);
                }
            }
        }
    }

    /// Resume or pause the current episode; does nothing while idle.
    ///
    /// The engine call is issued even when already in the requested state.
    pub fn set_playing(&mut self, playing: bool) {
        if self.state.playback.is_idle() {
            tracing::debug!(playing, "no episode selected");
            return;
        }

        let transport = if playing {
            let started = match self.engine() {
                Some(engine) => match engine.play() {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::warn!(error = %e, "could not resume playback");
                        false
                    }
                },
                None => false,
            };
            started.then_some(Transport::Playing)
        } else {
            if let Some(engine) = self.engine.as_mut() {
                engine.pause();
            }
            None
        };

        if let Playback::Active(now) = &mut self.state.playback {
            match transport {
                Some(transport) => now.transport = transport,
                None if now.transport == Transport::Playing => now.transport = Transport::Paused,
                None => {}
            }
        }
    }

    pub fn toggle_playing(&mut self) {
        let playing = self.state.is_playing();
        self.set_playing(!playing);
    }

    /// Set the output volume; range checking is left to the caller
    pub fn set_volume(&mut self, volume: f64) {
        self.state.volume = volume;
        if let Some(engine) = self.engine.as_mut() {
            engine.set_volume(volume);
        }
    }

    /// Set the playback rate; see [`super::PLAYBACK_RATES`] for offered values
    pub fn set_rate(&mut self, rate: f64) {
        self.state.playback_rate = rate;
        if let Some(engine) = self.engine.as_mut() {
            engine.set_rate(rate);
        }
    }

    /// Jump to `seconds`, updating the displayed position immediately
    pub fn seek(&mut self, seconds: f64) {
        let Playback::Active(now) = &mut self.state.playback else {
            return;
        };
        now.progress = seconds;

        if let Some(engine) = self.engine.as_mut() {
            engine.seek(seconds);
        }
    }

    /// Seek relative to the current position, staying within the episode
    pub fn skip(&mut self, delta_seconds: f64) {
        let Playback::Active(now) = &self.state.playback else {
            return;
        };

        let mut target = (now.progress + delta_seconds).max(0.0);
        if now.duration > 0.0 {
            target = target.min(now.duration);
        }
        self.seek(target);
    }

    /// Flip whether `id` is liked and persist the whole set.
    ///
    /// Returns whether the episode is liked afterwards.
    pub fn toggle_like(&mut self, id: &str) -> bool {
        let liked = if self.state.liked.remove(id) {
            false
        } else {
            self.state.liked.insert(id.to_string());
            true
        };

        self.preferences.save(&self.state.liked);
        liked
    }

    pub fn is_liked(&self, id: &str) -> bool {
        self.state.is_liked(id)
    }

    /// Liked episodes among `episodes`, in their given order
    pub fn liked_episodes(&self, episodes: &[Arc<Episode>]) -> Vec<Arc<Episode>> {
        liked_episodes(episodes, &self.state.liked)
    }

    /// Arm the sleep timer `minutes` from now, or disarm it with `None`.
    ///
    /// A deadline beyond what the clock can represent never fires, so the
    /// timer is left disarmed.
    pub fn set_sleep_timer(&mut self, minutes: Option<u64>) {
        self.state.sleep_deadline = minutes.and_then(|minutes| {
            let deadline = minutes
                .checked_mul(60)
                .and_then(|seconds| Instant::now().checked_add(Duration::from_secs(seconds)));
            if deadline.is_none() {
                tracing::warn!(minutes, "sleep timer out of range, leaving it disarmed");
            }
            deadline
        });
        tracing::debug!(?minutes, "sleep timer set");
    }

    /// Pause and disarm once the sleep deadline has passed.
    ///
    /// Returns whether the timer fired.
    pub fn check_sleep_timer(&mut self) -> bool {
        self.check_sleep_timer_at(Instant::now())
    }

    pub fn check_sleep_timer_at(&mut self, now: Instant) -> bool {
        match self.state.sleep_deadline {
            Some(deadline) if now >= deadline => {
                tracing::info!("sleep timer elapsed, pausing");
                self.set_playing(false);
                self.state.sleep_deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn set_minimized(&mut self, minimized: bool) {
        self.state.minimized = minimized;
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.state.filter.search_query = query.into();
    }

    pub fn set_selected_creator(&mut self, creator: Option<String>) {
        self.state.filter.selected_creator = creator;
    }

    /// Episodes to show for the current search and creator selection
    pub fn visible_episodes(&self, episodes: &[Arc<Episode>]) -> Vec<Arc<Episode>> {
        self.state.filter.apply(episodes)
    }

    /// Apply an engine notification in arrival order.
    ///
    /// Notices raised for media that has since been replaced are dropped.
    pub fn handle_event(&mut self, notice: EngineNotice) {
        if notice.load != self.load {
            tracing::debug!(
                load = notice.load,
                current = self.load,
                "dropping stale engine event"
            );
            return;
        }

        if self.state.apply_event(&notice.event) == Followup::AdvanceQueue {
            tracing::debug!("episode ended, advancing queue");
            self.advance_queue();
        }
    }

    /// Stop output and release the audio resource
    pub fn shutdown(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            engine.pause();
            tracing::info!("audio output released");
        }

        if let Playback::Active(now) = &mut self.state.playback
            && now.transport == Transport::Playing
        {
            now.transport = Transport::Paused;
        }
        self.state.sleep_deadline = None;
    }
}
