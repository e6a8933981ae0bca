// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! libmpv-backed playback engine.
//!
//! The mpv context lives on a dedicated worker thread. Transport calls are
//! forwarded to it over a command channel; observed mpv properties are
//! translated into [`EngineEvent`]s on the owner's [`EventSink`].

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use mpv::Format;

use crate::error::EngineError;

use super::{EngineEvent, EngineNotice, EventSink, PlaybackEngine};

/// How long the worker waits for mpv events before checking for commands
const EVENT_WAIT_SECONDS: f64 = 0.05;

#[derive(Debug)]
enum WorkerCommand {
    Load(String, u64),
    Play,
    Pause,
    Seek(f64),
    SetVolume(f64),
    SetRate(f64),
    Shutdown,
}

/// Audio output through libmpv with video disabled
pub struct MpvEngine {
    command_tx: Sender<WorkerCommand>,
    worker: Option<JoinHandle<()>>,
}

impl MpvEngine {
    /// Start the mpv worker and wait until its context is ready
    pub fn spawn(events: EventSink) -> Result<Self, EngineError> {
        let (command_tx, command_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();

        let worker = thread::Builder::new()
            .name("mpv-worker".to_string())
            .spawn(move || run_worker(command_rx, events, ready_tx))
            .map_err(|e| EngineError::Unavailable(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                command_tx,
                worker: Some(worker),
            }),
            Ok(Err(reason)) => Err(EngineError::Unavailable(reason)),
            Err(_) => Err(EngineError::Disconnected),
        }
    }

    fn send(&self, command: WorkerCommand) -> Result<(), EngineError> {
        self.command_tx
            .send(command)
            .map_err(|_| EngineError::Disconnected)
    }

    fn send_logged(&self, command: WorkerCommand) {
        if let Err(e) = self.send(command) {
            tracing::warn!(error = %e, "dropping mpv command");
        }
    }
}

impl PlaybackEngine for MpvEngine {
    fn load(&mut self, media_url: &str, load: u64) {
        self.send_logged(WorkerCommand::Load(media_url.to_string(), load));
    }

    fn play(&mut self) -> Result<(), EngineError> {
        self.send(WorkerCommand::Play)
    }

    fn pause(&mut self) {
        self.send_logged(WorkerCommand::Pause);
    }

    fn seek(&mut self, seconds: f64) {
        self.send_logged(WorkerCommand::Seek(seconds));
    }

    fn set_volume(&mut self, volume: f64) {
        self.send_logged(WorkerCommand::SetVolume(volume));
    }

    fn set_rate(&mut self, rate: f64) {
        self.send_logged(WorkerCommand::SetRate(rate));
    }
}

impl Drop for MpvEngine {
    fn drop(&mut self) {
        let _ = self.command_tx.send(WorkerCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn build_handler() -> Result<mpv::MpvHandler, mpv::Error> {
    let mut builder = mpv::MpvHandlerBuilder::new()?;
    builder.set_option("vo", "null")?;
    let mut handler = builder.build()?;

    handler.observe_property::<f64>("duration", 0)?;
    handler.observe_property::<f64>("time-pos", 0)?;
    handler.set_property("pause", true)?;

    Ok(handler)
}

fn run_worker(
    command_rx: Receiver<WorkerCommand>,
    events: EventSink,
    ready_tx: Sender<Result<(), String>>,
) {
    let mut handler = match build_handler() {
        Ok(handler) => {
            let _ = ready_tx.send(Ok(()));
            handler
        }
        Err(e) => {
            let _ = ready_tx.send(Err(format!("{:?}", e)));
            return;
        }
    };

    tracing::debug!("mpv worker started");

    let mut current_load = 0;
    while process_commands(&mut handler, &command_rx, &events, &mut current_load) {
        process_mpv_events(&mut handler, &events, current_load);
    }

    tracing::debug!("mpv worker stopped");
}

/// Drain pending commands; returns false once the worker should stop
fn process_commands(
    handler: &mut mpv::MpvHandler,
    command_rx: &Receiver<WorkerCommand>,
    events: &EventSink,
    current_load: &mut u64,
) -> bool {
    loop {
        let command = match command_rx.try_recv() {
            Ok(command) => command,
            Err(mpsc::TryRecvError::Empty) => return true,
            Err(mpsc::TryRecvError::Disconnected) => return false,
        };

        let result = match &command {
            WorkerCommand::Load(url, load) => {
                *current_load = *load;
                handler
                    .set_property("pause", true)
                    .and_then(|_| handler.command(&["loadfile", url, "replace"]))
            }
            WorkerCommand::Play => handler.set_property("pause", false),
            WorkerCommand::Pause => handler.set_property("pause", true),
            WorkerCommand::Seek(seconds) => {
                let target = seconds.max(0.0).to_string();
                handler.command(&["seek", &target, "absolute"])
            }
            WorkerCommand::SetVolume(volume) => handler.set_property("volume", volume * 100.0),
            WorkerCommand::SetRate(rate) => handler.set_property("speed", *rate),
            WorkerCommand::Shutdown => return false,
        };

        if let Err(e) = result {
            tracing::warn!(?command, error = ?e, "mpv rejected command");
            if matches!(command, WorkerCommand::Play) {
                let _ = events.send(EngineNotice {
                    load: *current_load,
                    event: EngineEvent::PlayRejected(format!("{:?}", e)),
                });
            }
        }
    }
}

/// Translate one round of mpv events into engine events
fn process_mpv_events(handler: &mut mpv::MpvHandler, events: &EventSink, load: u64) {
    if let Some(mpv_event) = handler.wait_event(EVENT_WAIT_SECONDS) {
        let event = match mpv_event {
            mpv::Event::PropertyChange { name, change, .. } => match (name, change) {
                ("duration", Format::Double(duration)) => {
                    Some(EngineEvent::MetadataReady { duration })
                }
                ("time-pos", Format::Double(seconds)) if seconds >= 0.0 => {
                    Some(EngineEvent::Progress(seconds))
                }
                _ => None,
            },
            mpv::Event::EndFile(Ok(mpv::EndFileReason::MPV_END_FILE_REASON_EOF)) => {
                Some(EngineEvent::Ended)
            }
            _ => None,
        };

        if let Some(event) = event {
            let _ = events.send(EngineNotice { load, event });
        }
    }
}
