use std::sync::{Arc, Mutex, MutexGuard};

/// Identifies one requested presentation callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TickHandle(pub u64);

/// The host's "call me before the next repaint" mechanism.
///
/// The host invokes `FrameScheduler::on_tick` when a requested callback
/// fires. A cancelled handle must never fire.
pub trait TickHost {
    fn request_next_tick(&mut self) -> TickHandle;
    fn cancel(&mut self, handle: TickHandle);
}

#[derive(Debug, Default)]
struct HostState {
    next_id: u64,
    pending: Option<TickHandle>,
    requested: usize,
    cancelled: usize,
}

/// Host whose callbacks are fired by an external clock loop.
///
/// Clones share state: hand one to the scheduler and poll
/// [`ManualTickHost::take_pending`] from the loop that owns the clock.
#[derive(Clone, Debug, Default)]
pub struct ManualTickHost {
    state: Arc<Mutex<HostState>>,
}

impl ManualTickHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Consumes the pending callback, if any. The caller is expected to
    /// invoke `on_tick` for it.
    pub fn take_pending(&self) -> Option<TickHandle> {
        self.lock().pending.take()
    }

    pub fn has_pending(&self) -> bool {
        self.lock().pending.is_some()
    }

    pub fn requested(&self) -> usize {
        self.lock().requested
    }

    pub fn cancelled(&self) -> usize {
        self.lock().cancelled
    }
}

impl TickHost for ManualTickHost {
    fn request_next_tick(&mut self) -> TickHandle {
        let mut state = self.lock();
        state.next_id += 1;
        state.requested += 1;
        let handle = TickHandle(state.next_id);
        state.pending = Some(handle);
        handle
    }

    fn cancel(&mut self, handle: TickHandle) {
        let mut state = self.lock();
        if state.pending == Some(handle) {
            state.pending = None;
            state.cancelled += 1;
        }
    }
}
