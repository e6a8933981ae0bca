//! Recording engine for store and session tests.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::EngineError;

use super::{EngineEvent, EngineNotice, EventSink, PlaybackEngine};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Load(String),
    Play,
    Pause,
    Seek(f64),
    SetVolume(f64),
    SetRate(f64),
}

/// Test-side view of every engine the probe's factory creates
#[derive(Clone, Default)]
pub(crate) struct EngineProbe {
    calls: Arc<Mutex<Vec<Call>>>,
    created: Arc<AtomicUsize>,
    reject_play: Arc<AtomicBool>,
    unavailable: Arc<AtomicBool>,
    current_load: Arc<AtomicU64>,
    sink: Arc<Mutex<Option<EventSink>>>,
}

impl EngineProbe {
    pub(crate) fn factory(
        &self,
    ) -> impl FnMut(EventSink) -> Result<FakeEngine, EngineError> + Send + 'static {
        let probe = self.clone();
        move |events| {
            if probe.unavailable.load(Ordering::SeqCst) {
                return Err(EngineError::Unavailable("no audio device".to_string()));
            }
            probe.created.fetch_add(1, Ordering::SeqCst);
            *probe.sink.lock().unwrap() = Some(events);
            Ok(FakeEngine {
                probe: probe.clone(),
            })
        }
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub(crate) fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub(crate) fn reject_play(&self, reject: bool) {
        self.reject_play.store(reject, Ordering::SeqCst);
    }

    pub(crate) fn make_unavailable(&self) {
        self.unavailable.store(true, Ordering::SeqCst);
    }

    /// Raise an event for the currently loaded media
    pub(crate) fn emit(&self, event: EngineEvent) {
        self.emit_for(self.current_load.load(Ordering::SeqCst), event);
    }

    /// Raise an event tagged with an explicit load id
    pub(crate) fn emit_for(&self, load: u64, event: EngineEvent) {
        let sink = self.sink.lock().unwrap();
        sink.as_ref()
            .expect("engine has not been created")
            .send(EngineNotice { load, event })
            .unwrap();
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

pub(crate) struct FakeEngine {
    probe: EngineProbe,
}

impl PlaybackEngine for FakeEngine {
    fn load(&mut self, media_url: &str, load: u64) {
        self.probe.current_load.store(load, Ordering::SeqCst);
        self.probe.record(Call::Load(media_url.to_string()));
    }

    fn play(&mut self) -> Result<(), EngineError> {
        self.probe.record(Call::Play);
        if self.probe.reject_play.load(Ordering::SeqCst) {
            Err(EngineError::Rejected("autoplay blocked".to_string()))
        } else {
            Ok(())
        }
    }

    fn pause(&mut self) {
        self.probe.record(Call::Pause);
    }

    fn seek(&mut self, seconds: f64) {
        self.probe.record(Call::Seek(seconds));
    }

    fn set_volume(&mut self, volume: f64) {
        self.probe.record(Call::SetVolume(volume));
    }

    fn set_rate(&mut self, rate: f64) {
        self.probe.record(Call::SetRate(rate));
    }
}
