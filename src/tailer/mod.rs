//! Background task that tails a growing replay
//!
//! ## State Machine
//!
//! - **Bootstrapping**: re-read the source until the header region is complete, then parse
//!   the payload-size table and place the cursor just past it
//! - **Decoding**: if the snapshot holds enough bytes past the cursor, frame one record,
//!   decode it, apply it and advance the cursor; otherwise move to refilling
//! - **Refilling**: re-read the whole source and seek the new snapshot to the cursor; back
//!   off when nothing new was written
//! - **Stopped**: game end, an unexpected top-level event, a stop request, or a fatal error
//!
//! The minimum byte count needed before a decode attempt is the largest record the table
//! allows until the game start record has been seen, and the smallest one afterwards. A
//! record whose payload is still partially written is never consumed, so the cursor always
//! sits on a record boundary.

mod cursor;

pub use cursor::StreamCursor;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::accumulator::{Applied, FrameAccumulator};
use crate::config::LiveConfig;
use crate::queue::FrameQueue;
use crate::slp::{EventDecoder, HeaderProbe, PayloadSizeTable, RecordProbe, frame_record};
use crate::source::SnapshotSource;
use crate::types::{Event, GameInfo, SessionStatus, StopReason};
use crate::{LiveError, Result};

/// Outcome of one decode attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Applied,
    NeedBytes,
    Stopped(StopReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Decoding,
    Refilling,
}

/// Doubling delay between re-reads that found nothing new.
#[derive(Debug)]
struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    fn new(config: &LiveConfig) -> Self {
        let initial = config.poll_interval();
        Self { initial, max: config.max_poll_interval(), current: initial }
    }

    fn reset(&mut self) {
        self.current = self.initial;
    }

    fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }
}

/// Tails one replay source until the session ends.
pub struct LiveTailer<S, D> {
    source: S,
    decoder: Arc<D>,
    config: LiveConfig,
    queue: FrameQueue,
    info: watch::Sender<GameInfo>,
    cancel: CancellationToken,
    snapshot: Vec<u8>,
    backoff: Backoff,
    io_failures: u32,
}

impl<S, D> LiveTailer<S, D>
where
    S: SnapshotSource,
    D: EventDecoder,
{
    pub fn new(
        source: S,
        decoder: Arc<D>,
        config: LiveConfig,
        queue: FrameQueue,
        info: watch::Sender<GameInfo>,
        cancel: CancellationToken,
    ) -> Self {
        let backoff = Backoff::new(&config);
        Self {
            source,
            decoder,
            config,
            queue,
            info,
            cancel,
            snapshot: Vec::new(),
            backoff,
            io_failures: 0,
        }
    }

    /// Spawn the tailer. Once it exits the session is marked stopped and its final status
    /// is published.
    pub fn spawn(self, status: watch::Sender<SessionStatus>) -> JoinHandle<()> {
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            let location = self.source.describe();
            let result = self.run().await;
            cancel.cancel();
            match result {
                Ok(reason) => {
                    info!("Live session for {} stopped: {:?}", location.display(), reason);
                    status.send_replace(SessionStatus::Stopped(reason));
                }
                Err(e) => {
                    error!("Live session for {} failed: {}", location.display(), e);
                    status.send_replace(SessionStatus::Failed(Arc::new(e)));
                }
            }
        })
    }

    /// Run until the session ends.
    ///
    /// Returns the reason for a clean stop; fatal errors are returned as `Err`. Frames closed
    /// before a fatal error stay queued, the in-progress frame is discarded.
    pub async fn run(mut self) -> Result<StopReason> {
        info!("Live tailer started for {}", self.source.describe().display());

        let Some(table) = self.bootstrap().await? else {
            return Ok(StopReason::Requested);
        };
        let mut cursor = StreamCursor::after_header(table.header_len());
        let mut accumulator = FrameAccumulator::new();
        let mut phase = Phase::Decoding;
        debug!("Bootstrapped at offset {}, decoding", cursor.offset());

        loop {
            // Sleeps are cut short by a stop request; decoding is not
            if self.cancel.is_cancelled() {
                if let Some(frame) = accumulator.flush() {
                    self.queue.lock().push(frame);
                }
                info!("Stop requested after {} records", cursor.records());
                return Ok(StopReason::Requested);
            }

            match phase {
                Phase::Decoding => match self.step(&table, &mut cursor, &mut accumulator)? {
                    Step::Applied => {}
                    Step::NeedBytes => {
                        trace!("Need more bytes at offset {}, refilling", cursor.offset());
                        phase = Phase::Refilling;
                    }
                    Step::Stopped(reason) => {
                        info!(
                            "Session ended after {} records and {} frames",
                            cursor.records(),
                            accumulator.frames_closed()
                        );
                        return Ok(reason);
                    }
                },
                Phase::Refilling => {
                    let Some(snapshot) = self.read_snapshot().await? else {
                        continue;
                    };
                    if snapshot.len() < cursor.offset() {
                        return Err(LiveError::StreamTruncated {
                            cursor: cursor.offset(),
                            len: snapshot.len(),
                        });
                    }

                    let grew = snapshot.len() > self.snapshot.len();
                    self.snapshot = snapshot;
                    if grew {
                        self.backoff.reset();
                    } else if !self.pause().await {
                        continue;
                    }
                    phase = Phase::Decoding;
                }
            }
        }
    }

    /// Wait for the header region and parse the payload-size table.
    ///
    /// Returns `None` when a stop is requested while waiting.
    async fn bootstrap(&mut self) -> Result<Option<PayloadSizeTable>> {
        let started = Instant::now();
        let timeout = self.config.bootstrap_timeout();

        loop {
            if self.cancel.is_cancelled() {
                debug!("Stop requested during bootstrap");
                return Ok(None);
            }

            let Some(snapshot) = self.read_snapshot().await? else {
                return Ok(None);
            };

            match PayloadSizeTable::probe(&snapshot)? {
                HeaderProbe::Ready(table) => {
                    self.snapshot = snapshot;
                    return Ok(Some(table));
                }
                HeaderProbe::Incomplete { needed } => {
                    if let Some(duration) = timeout {
                        if started.elapsed() >= duration {
                            return Err(LiveError::Timeout { duration });
                        }
                    }
                    trace!("Header incomplete: have {} bytes, need {}", snapshot.len(), needed);

                    if snapshot.len() > self.snapshot.len() {
                        self.backoff.reset();
                    }
                    self.snapshot = snapshot;
                    if !self.pause().await {
                        return Ok(None);
                    }
                }
            }
        }
    }

    /// Decode and apply at most one record from the current snapshot.
    fn step(
        &self,
        table: &PayloadSizeTable,
        cursor: &mut StreamCursor,
        accumulator: &mut FrameAccumulator,
    ) -> Result<Step> {
        let needed = if accumulator.has_started() {
            table.min_record_len()
        } else {
            table.max_record_len()
        };
        if cursor.remaining(&self.snapshot) < needed {
            return Ok(Step::NeedBytes);
        }

        let offset = cursor.offset();
        let record = frame_record(&self.snapshot, offset, table)?;
        let RecordProbe::Complete { tag, payload } = record else {
            return Ok(Step::NeedBytes);
        };
        let record_len = record.record_len();

        let event = self
            .decoder
            .decode(tag, payload)
            .map_err(|source| LiveError::Decode { offset, source })?;
        trace!("Record {:#04x} at offset {:#x} ({} bytes)", tag, offset, record_len);
        let is_metadata = matches!(event, Some(Event::Start(_) | Event::End(_)));

        let applied = {
            let mut frames = self.queue.lock();
            let applied = match event {
                Some(event) => accumulator.apply(event)?,
                None => Applied::default(),
            };
            if let Some(frame) = applied.completed {
                frames.push(frame);
            }
            cursor.advance(record_len);
            applied.stop
        };

        if is_metadata {
            self.info.send_modify(|info| {
                info.start = accumulator.game_start().copied();
                info.end = accumulator.game_end().copied();
            });
        }

        Ok(match applied {
            Some(reason) => Step::Stopped(reason),
            None => Step::Applied,
        })
    }

    /// Re-read the whole source, retrying transient failures with backoff.
    ///
    /// Returns `None` when a stop is requested during a retry delay.
    async fn read_snapshot(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            match self.source.snapshot().await {
                Ok(snapshot) => {
                    self.io_failures = 0;
                    return Ok(Some(snapshot));
                }
                Err(e) if is_transient(&e) && self.io_failures < self.config.max_io_retries => {
                    self.io_failures += 1;
                    warn!(
                        "Transient read failure ({}/{}): {}",
                        self.io_failures, self.config.max_io_retries, e
                    );
                    // Exponential backoff: 50ms, 100ms, 200ms, ...
                    let delay = Duration::from_millis(50 * (1 << self.io_failures.min(5)));
                    let cancel = self.cancel.clone();
                    if !sleep_unless_cancelled(&cancel, delay).await {
                        return Ok(None);
                    }
                }
                Err(e) => return Err(LiveError::file_error(self.source.describe(), e)),
            }
        }
    }

    /// Back off after a re-read that found nothing new.
    async fn pause(&mut self) -> bool {
        let delay = self.backoff.next_delay();
        let cancel = self.cancel.clone();
        sleep_unless_cancelled(&cancel, delay).await
    }
}

/// Sleep unless a stop is requested first; returns `false` if it was.
///
/// Takes the token rather than the tailer so the spawned future only needs the source to be
/// `Send`.
async fn sleep_unless_cancelled(cancel: &CancellationToken, delay: Duration) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

fn is_transient(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        std::io::ErrorKind::Interrupted
            | std::io::ErrorKind::WouldBlock
            | std::io::ErrorKind::TimedOut
    )
}
