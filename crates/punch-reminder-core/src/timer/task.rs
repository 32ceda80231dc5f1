//! Cancellable fixed-delay tasks.
//!
//! Both the monitor cadence and the alert escalator are repeating schedules.
//! Each firing runs `body`, then sleeps `delay` before the next one, so a slow
//! firing pushes the following one back instead of overlapping it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use super::gate::CancelGate;

/// Handle to a repeating task. Dropping the handle cancels the task.
#[derive(Debug)]
pub struct TaskHandle {
    gate: Arc<CancelGate>,
    join: JoinHandle<()>,
}

impl TaskHandle {
    /// Stop the task. When this returns, no gated work of the task runs again.
    pub fn cancel(&self) {
        self.gate.close();
        self.join.abort();
    }

    /// The task's commit gate, for effects that belong to this schedule but
    /// run outside its body.
    pub fn gate(&self) -> Arc<CancelGate> {
        self.gate.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        !self.gate.is_open()
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Spawn `body` after `first_delay`, then again `delay` after each firing
/// completes, until the returned handle is cancelled.
///
/// `body` receives the task's gate and should perform its observable effects
/// through [`CancelGate::run`].
///
/// # Panics
///
/// Panics when called outside a Tokio runtime.
pub fn spawn_fixed_delay<F, Fut>(first_delay: Duration, delay: Duration, mut body: F) -> TaskHandle
where
    F: FnMut(Arc<CancelGate>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let gate = Arc::new(CancelGate::new());
    let task_gate = gate.clone();
    let join = tokio::spawn(async move {
        if !first_delay.is_zero() {
            tokio::time::sleep(first_delay).await;
        }
        while task_gate.is_open() {
            body(task_gate.clone()).await;
            tokio::time::sleep(delay).await;
        }
    });
    TaskHandle { gate, join }
}
