mod session;
mod state;
mod store;

pub use session::{Command, PlayerHandle, PlayerSession, SLEEP_TIMER_TICK, dispatch};
pub use state::{
    NowPlaying, PLAYBACK_RATES, Playback, SKIP_INTERVAL_SECONDS, SessionState, Snapshot, Transport,
};
pub use store::PlaybackStore;
