//! Periodic draining of the frame queue

use futures::{Stream, ready};
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Interval, MissedTickBehavior, interval};

use crate::queue::FrameQueue;
use crate::types::{Frame, SessionStatus};

pin_project! {
    /// Stream of frame batches drained from a [`FrameQueue`] once per interval
    ///
    /// Empty drains are skipped. The stream ends after the session has reached a terminal
    /// status and a final drain came back empty, so no frame queued before termination is
    /// lost.
    pub struct DrainStream {
        queue: FrameQueue,
        status: watch::Receiver<SessionStatus>,
        interval: Interval,
        finished: bool,
    }
}

impl DrainStream {
    pub fn new(queue: FrameQueue, status: watch::Receiver<SessionStatus>, period: Duration) -> Self {
        let mut interval = interval(period);
        // Don't burst after a slow consumer
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self { queue, status, interval, finished: false }
    }
}

impl Stream for DrainStream {
    type Item = Vec<Frame>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        if *this.finished {
            return Poll::Ready(None);
        }

        loop {
            ready!(this.interval.poll_tick(cx));

            // Read the status first: frames pushed before termination are then always seen
            let terminal = this.status.borrow().is_terminal();
            let batch = this.queue.collect();
            if !batch.is_empty() {
                return Poll::Ready(Some(batch));
            }
            if terminal {
                *this.finished = true;
                return Poll::Ready(None);
            }
        }
    }
}
