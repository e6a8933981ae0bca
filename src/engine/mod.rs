// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Media transport abstraction.
//!
//! A [`PlaybackEngine`] wraps exactly one audio output resource. Engines
//! are created through an [`EngineFactory`], which hands them the
//! [`EventSink`] they report progress, metadata and completion on. The
//! player store owns the only engine instance and is the only caller of
//! its transport operations.

#[cfg(test)]
pub(crate) mod fake;
#[cfg(feature = "mpv")]
mod libmpv;

use tokio::sync::mpsc;

use crate::error::EngineError;

#[cfg(feature = "mpv")]
pub use self::libmpv::MpvEngine;

/// Notifications raised by an engine, delivered in the order they occur
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Current playback position in seconds
    Progress(f64),
    /// Duration of the loaded media became known
    MetadataReady { duration: f64 },
    /// Playback reached the end of the media
    Ended,
    /// A play request that was accepted earlier was refused by the output
    PlayRejected(String),
}

/// An event together with the load it was raised for
#[derive(Debug, Clone, PartialEq)]
pub struct EngineNotice {
    /// Id passed to the [`PlaybackEngine::load`] call that loaded the media
    pub load: u64,
    pub event: EngineEvent,
}

/// Channel an engine reports its events on
pub type EventSink = mpsc::UnboundedSender<EngineNotice>;

/// Transport operations on a single audio output
pub trait PlaybackEngine {
    /// Replace the active media; resets the position and does not start output.
    ///
    /// Every event raised until the next `load` carries `load` as its id.
    fn load(&mut self, media_url: &str, load: u64);

    /// Start or resume output.
    ///
    /// Refusals are reported as errors, either here or later through
    /// [`EngineEvent::PlayRejected`].
    fn play(&mut self) -> Result<(), EngineError>;

    fn pause(&mut self);

    /// Move to `seconds`, clamped into the media's duration
    fn seek(&mut self, seconds: f64);

    /// Output volume in `[0, 1]`
    fn set_volume(&mut self, volume: f64);

    fn set_rate(&mut self, rate: f64);
}

/// Creates the audio output on first use
pub trait EngineFactory {
    type Engine: PlaybackEngine;

    fn create(&mut self, events: EventSink) -> Result<Self::Engine, EngineError>;
}

/// Engine type for builds without an audio backend; it can never be created
#[derive(Debug)]
pub enum NoOutput {}

impl PlaybackEngine for NoOutput {
    fn load(&mut self, _media_url: &str, _load: u64) {
        match *self {}
    }

    fn play(&mut self) -> Result<(), EngineError> {
        match *self {}
    }

    fn pause(&mut self) {
        match *self {}
    }

    fn seek(&mut self, _seconds: f64) {
        match *self {}
    }

    fn set_volume(&mut self, _volume: f64) {
        match *self {}
    }

    fn set_rate(&mut self, _rate: f64) {
        match *self {}
    }
}

/// Factory for [`NoOutput`]; always reports the output as unavailable
pub fn no_output(_events: EventSink) -> Result<NoOutput, EngineError> {
    Err(EngineError::Unavailable(
        "no audio backend compiled in".to_string(),
    ))
}

impl<E, F> EngineFactory for F
where
    E: PlaybackEngine,
    F: FnMut(EventSink) -> Result<E, EngineError>,
{
    type Engine = E;

    fn create(&mut self, events: EventSink) -> Result<E, EngineError> {
        self(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_output_factory_never_creates_an_engine() {
        let (events, _rx) = mpsc::unbounded_channel();
        let mut factory = no_output;

        assert!(matches!(
            factory.create(events),
            Err(EngineError::Unavailable(_))
        ));
    }

    #[test]
    fn closures_act_as_factories() {
        let (events, mut rx) = mpsc::unbounded_channel();
        let mut factory = |sink: EventSink| {
            sink.send(EngineNotice {
                load: 7,
                event: EngineEvent::Ended,
            })
            .unwrap();
            no_output(sink)
        };

        assert!(factory.create(events).is_err());
        let notice = rx.try_recv().unwrap();
        assert_eq!(notice.load, 7);
        assert_eq!(notice.event, EngineEvent::Ended);
    }
}
