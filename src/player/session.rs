// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event loop driving a [`PlaybackStore`].
//!
//! The loop runs on a single task and interleaves three input sources:
//! commands from views, events from the audio output, and the one-second
//! sleep-timer tick. Inputs are applied one at a time in arrival order,
//! and after each one the read-side [`Snapshot`] is republished if it
//! changed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

use crate::catalog::Episode;
use crate::engine::{EngineFactory, EngineNotice};
use crate::error::SessionError;
use crate::preferences::PreferenceStore;

use super::state::Snapshot;
use super::store::PlaybackStore;

/// Granularity of the sleep-timer check
pub const SLEEP_TIMER_TICK: Duration = Duration::from_secs(1);

/// A user intent issued by a view
#[derive(Debug, Clone)]
pub enum Command {
    Select(Option<Arc<Episode>>),
    Enqueue(Arc<Episode>),
    Dequeue(String),
    ClearQueue,
    AdvanceQueue,
    SetPlaying(bool),
    TogglePlaying,
    SetVolume(f64),
    SetRate(f64),
    Seek(f64),
    Skip(f64),
    ToggleLike(String),
    SetSleepTimer(Option<u64>),
    SetMinimized(bool),
    SetSearchQuery(String),
    SetSelectedCreator(Option<String>),
}

enum Message {
    Command(Command),
    Shutdown,
}

/// Apply a command to the store
pub fn dispatch<F: EngineFactory, P: PreferenceStore>(
    store: &mut PlaybackStore<F, P>,
    command: Command,
) {
    match command {
        Command::Select(episode) => store.select_episode(episode),
        Command::Enqueue(episode) => store.enqueue(episode),
        Command::Dequeue(id) => {
            store.dequeue(&id);
        }
        Command::ClearQueue => store.clear_queue(),
        Command::AdvanceQueue => store.advance_queue(),
        Command::SetPlaying(playing) => store.set_playing(playing),
        Command::TogglePlaying => store.toggle_playing(),
        Command::SetVolume(volume) => store.set_volume(volume),
        Command::SetRate(rate) => store.set_rate(rate),
        Command::Seek(seconds) => store.seek(seconds),
        Command::Skip(delta) => store.skip(delta),
        Command::ToggleLike(id) => {
            store.toggle_like(&id);
        }
        Command::SetSleepTimer(minutes) => store.set_sleep_timer(minutes),
        Command::SetMinimized(minimized) => store.set_minimized(minimized),
        Command::SetSearchQuery(query) => store.set_search_query(query),
        Command::SetSelectedCreator(creator) => store.set_selected_creator(creator),
    }
}

/// Cloneable handle views use to command the player and watch its state
#[derive(Clone)]
pub struct PlayerHandle {
    messages: mpsc::UnboundedSender<Message>,
    snapshots: watch::Receiver<Snapshot>,
}

impl PlayerHandle {
    pub fn send(&self, command: Command) -> Result<(), SessionError> {
        self.messages
            .send(Message::Command(command))
            .map_err(|_| SessionError::Closed)
    }

    /// The most recently published state
    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver that is notified whenever the published state changes
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    /// Ask the session to release the audio output and stop
    pub fn shutdown(&self) -> Result<(), SessionError> {
        self.messages
            .send(Message::Shutdown)
            .map_err(|_| SessionError::Closed)
    }
}

/// Owns the store and its input channels until [`PlayerSession::run`] ends
pub struct PlayerSession<F: EngineFactory, P> {
    store: PlaybackStore<F, P>,
    messages: mpsc::UnboundedReceiver<Message>,
    events: mpsc::UnboundedReceiver<EngineNotice>,
    snapshots: watch::Sender<Snapshot>,
}

impl<F: EngineFactory, P: PreferenceStore> PlayerSession<F, P> {
    /// Build a session and the handle that drives it
    pub fn new(factory: F, preferences: P) -> (Self, PlayerHandle) {
        let (event_tx, events) = mpsc::unbounded_channel();
        let (message_tx, messages) = mpsc::unbounded_channel();

        let store = PlaybackStore::new(factory, preferences, event_tx);
        let (snapshots, snapshot_rx) = watch::channel(store.snapshot());

        let session = Self {
            store,
            messages,
            events,
            snapshots,
        };
        let handle = PlayerHandle {
            messages: message_tx,
            snapshots: snapshot_rx,
        };

        (session, handle)
    }

    /// Process inputs until shut down or every handle is dropped.
    ///
    /// The audio output is created on entry and released on exit; the
    /// sleep-timer ticker lives exactly as long as this call.
    pub async fn run(mut self) {
        self.store.init_audio();
        self.publish();

        let mut ticker = tokio::time::interval(SLEEP_TIMER_TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                message = self.messages.recv() => match message {
                    Some(Message::Command(command)) => dispatch(&mut self.store, command),
                    Some(Message::Shutdown) | None => break,
                },
                Some(notice) = self.events.recv() => self.store.handle_event(notice),
                _ = ticker.tick() => {
                    self.store.check_sleep_timer();
                }
            }

            self.publish();
        }

        drop(ticker);
        self.store.shutdown();
        self.publish();
        tracing::debug!("player session ended");
    }

    fn publish(&self) {
        let snapshot = self.store.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}
