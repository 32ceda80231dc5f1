use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::thread::{self, ThreadId};

/// Commit gate for a scheduled task.
///
/// Work that must never be observed after cancellation runs inside
/// [`run`](CancelGate::run). [`close`](CancelGate::close) waits for an
/// in-progress `run` on another thread to finish, so once it returns no
/// further `run` body executes. Closing from inside a `run` body only marks
/// the gate closed; the body itself runs to completion.
#[derive(Debug)]
pub struct CancelGate {
    open: AtomicBool,
    commit: Mutex<()>,
    holder: Mutex<Option<ThreadId>>,
}

impl Default for CancelGate {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelGate {
    pub fn new() -> Self {
        Self {
            open: AtomicBool::new(true),
            commit: Mutex::new(()),
            holder: Mutex::new(None),
        }
    }

    /// Run `f` while the gate is open. Returns `None` when closed.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        let _commit = self.commit.lock().unwrap_or_else(|e| e.into_inner());
        if !self.is_open() {
            return None;
        }
        self.set_holder(Some(thread::current().id()));
        let _release = HolderReset(self);
        Some(f())
    }

    /// Close the gate. Idempotent.
    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
        if self.held_by_current_thread() {
            return;
        }
        drop(self.commit.lock().unwrap_or_else(|e| e.into_inner()));
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn held_by_current_thread(&self) -> bool {
        *self.holder.lock().unwrap_or_else(|e| e.into_inner()) == Some(thread::current().id())
    }

    fn set_holder(&self, holder: Option<ThreadId>) {
        *self.holder.lock().unwrap_or_else(|e| e.into_inner()) = holder;
    }
}

/// Clears the holder when a `run` body returns or unwinds.
struct HolderReset<'a>(&'a CancelGate);

impl Drop for HolderReset<'_> {
    fn drop(&mut self) {
        self.0.set_holder(None);
    }
}
