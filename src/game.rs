//! Consumer-facing handle for a live replay

use futures::Stream;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::LiveConfig;
use crate::queue::FrameQueue;
use crate::slp::{EventDecoder, SlippiDecoder};
use crate::source::{FileSource, SnapshotSource};
use crate::stream::DrainStream;
use crate::tailer::LiveTailer;
use crate::types::{Frame, GameEnd, GameInfo, GameStart, SessionStatus};
use crate::{LiveError, Result};

/// Result of [`LiveGame::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum StartOutcome {
    /// A tailer task was spawned for this call.
    Spawned,
    /// This instance already started a session; nothing was done.
    AlreadyStarted,
}

/// A replay that is being written while it is read
///
/// Each instance runs at most one session. [`start`](LiveGame::start) spawns a background
/// task that tails the file; the consumer drains completed frames with
/// [`collect`](LiveGame::collect) at whatever cadence suits it, or with
/// [`drain_every`](LiveGame::drain_every). Dropping the handle stops the task.
///
/// Sessions are spawned on the ambient Tokio runtime, so `start` must be called from within
/// one.
pub struct LiveGame<D = SlippiDecoder> {
    decoder: Arc<D>,
    config: LiveConfig,
    queue: FrameQueue,

    /// Senders move into the tailer on the first start
    status_tx: Option<watch::Sender<SessionStatus>>,
    info_tx: Option<watch::Sender<GameInfo>>,
    status: watch::Receiver<SessionStatus>,
    info: watch::Receiver<GameInfo>,

    cancel: CancellationToken,
    started: bool,
    sessions_spawned: u32,
}

impl LiveGame<SlippiDecoder> {
    pub fn new() -> Self {
        Self::with_decoder(SlippiDecoder, LiveConfig::default())
    }

    /// Live game with a validated configuration.
    pub fn with_config(config: LiveConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_decoder(SlippiDecoder, config))
    }
}

impl Default for LiveGame<SlippiDecoder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: EventDecoder> LiveGame<D> {
    /// Live game using a custom payload decoder.
    pub fn with_decoder(decoder: D, config: LiveConfig) -> Self {
        let (status_tx, status) = watch::channel(SessionStatus::NotStarted);
        let (info_tx, info) = watch::channel(GameInfo::default());
        Self {
            decoder: Arc::new(decoder),
            config,
            queue: FrameQueue::new(),
            status_tx: Some(status_tx),
            info_tx: Some(info_tx),
            status,
            info,
            cancel: CancellationToken::new(),
            started: false,
            sessions_spawned: 0,
        }
    }

    /// Start tailing the replay at `path`.
    ///
    /// The file does not need to exist yet. With the default configuration the session waits
    /// for the header indefinitely; set
    /// [`bootstrap_timeout_ms`](LiveConfig::bootstrap_timeout_ms) to fail with
    /// [`LiveError::Timeout`] instead. Calling this again on the same instance only logs a
    /// warning.
    pub fn start<P: AsRef<Path>>(&mut self, path: P) -> StartOutcome {
        self.start_with_source(FileSource::new(path))
    }

    /// Start tailing an arbitrary snapshot source.
    pub fn start_with_source<S: SnapshotSource>(&mut self, source: S) -> StartOutcome {
        let (Some(status_tx), Some(info_tx)) = (self.status_tx.take(), self.info_tx.take())
        else {
            warn!(
                "Live game already started a session for {}, ignoring start",
                source.describe().display()
            );
            return StartOutcome::AlreadyStarted;
        };

        info!("Starting live session for {}", source.describe().display());
        status_tx.send_replace(SessionStatus::Running);
        self.started = true;
        self.sessions_spawned += 1;

        let tailer = LiveTailer::new(
            source,
            Arc::clone(&self.decoder),
            self.config.clone(),
            self.queue.clone(),
            info_tx,
            self.cancel.clone(),
        );
        tailer.spawn(status_tx);
        StartOutcome::Spawned
    }

    /// Ask the tailer to stop at its next step. Idempotent; does nothing before `start`.
    pub fn stop(&self) {
        if !self.started {
            debug!("Stop requested before start, ignoring");
            return;
        }
        if !self.cancel.is_cancelled() {
            info!("Stopping live session");
            self.cancel.cancel();
        }
    }

    /// Whether a session was started and has not been stopped.
    ///
    /// Turns false as soon as [`stop`](LiveGame::stop) is called or the tailer ends on its
    /// own; the background task may still be finishing its current step.
    pub fn is_streaming(&self) -> bool {
        self.started && !self.cancel.is_cancelled()
    }

    /// Take every frame completed since the last call. Never waits.
    pub fn collect(&self) -> Vec<Frame> {
        self.queue.collect()
    }

    /// Stream of non-empty frame batches drained once per `period`.
    ///
    /// Ends after the session terminates and everything queued before that was delivered.
    pub fn drain_every(&self, period: Duration) -> DrainStream {
        DrainStream::new(self.queue.clone(), self.status.clone(), period)
    }

    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    /// Error that ended the session, if it failed.
    pub fn last_error(&self) -> Option<Arc<LiveError>> {
        self.status.borrow().error()
    }

    /// Status changes as a stream, starting with the current status.
    pub fn status_updates(&self) -> impl Stream<Item = SessionStatus> + 'static {
        WatchStream::new(self.status.clone())
    }

    /// Number of sessions this instance has spawned; never more than one.
    pub fn sessions_spawned(&self) -> u32 {
        self.sessions_spawned
    }

    /// Game start record, once the tailer has seen it.
    pub fn game_start(&self) -> Option<GameStart> {
        self.info.borrow().start
    }

    /// Game end record, once the tailer has seen it.
    pub fn game_end(&self) -> Option<GameEnd> {
        self.info.borrow().end
    }

    pub fn config(&self) -> &LiveConfig {
        &self.config
    }
}

impl<D> Drop for LiveGame<D> {
    fn drop(&mut self) {
        debug!("Dropping live game");
        self.cancel.cancel();
    }
}
