//! Completed-frame handoff between the tailer and the consumer

use std::sync::{Arc, Mutex, MutexGuard};

use crate::types::Frame;

/// Lock-guarded list of completed frames
///
/// The tailer appends under the lock one event at a time; the consumer drains everything at
/// once with [`collect`](FrameQueue::collect). Cloning shares the same underlying list.
#[derive(Debug, Clone, Default)]
pub struct FrameQueue {
    frames: Arc<Mutex<Vec<Frame>>>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every queued frame, leaving the queue empty. Never waits for new frames.
    pub fn collect(&self) -> Vec<Frame> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Hold the queue lock for one event's worth of updates.
    ///
    /// A panic while the lock was held cannot leave a half-pushed frame behind, so a poisoned
    /// lock is recovered rather than propagated.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Vec<Frame>> {
        self.frames.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
