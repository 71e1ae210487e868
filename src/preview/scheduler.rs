use std::collections::BTreeSet;

/// Handle to one requested display-refresh callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameHandle(u64);

/// Per-display-refresh callback queue.
///
/// Requests fire at most once, on the next [`RefreshScheduler::take_due`], unless cancelled
/// before then. Handles are never reused.
#[derive(Debug, Default)]
pub struct RefreshScheduler {
    next_id: u64,
    pending: BTreeSet<FrameHandle>,
}

impl RefreshScheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a callback on the next refresh.
    pub fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next_id);
        self.next_id += 1;
        self.pending.insert(handle);
        handle
    }

    /// Cancel a pending request. Returns `false` if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: FrameHandle) -> bool {
        self.pending.remove(&handle)
    }

    /// Take every request due on this refresh, in request order.
    pub fn take_due(&mut self) -> Vec<FrameHandle> {
        std::mem::take(&mut self.pending).into_iter().collect()
    }

    /// Number of requests waiting for the next refresh.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/preview/scheduler.rs"]
mod tests;
