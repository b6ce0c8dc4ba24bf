use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use tokio::task::JoinHandle;

/// Cancellation token for a running frame loop.
///
/// `cancel` is idempotent and takes effect before the next tick; the loop
/// checks it ahead of every callback invocation, so no tick fires after
/// cancellation.
#[derive(Clone, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            debug!("Frame loop cancelled");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Drives a callback once per animation frame at a fixed rate, standing in
/// for a display-refresh callback. At most one callback is in flight at a
/// time, so everything the callback mutates is effectively single-threaded.
pub struct FrameScheduler {
    fps: u32,
}

impl FrameScheduler {
    pub fn new(fps: u32) -> Self {
        Self { fps: fps.max(1) }
    }

    pub fn frame_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps))
    }

    /// Spawn the tick loop. The callback receives the wall-clock time in
    /// milliseconds. Returns the cancellation handle and the loop task.
    pub fn spawn<F>(&self, mut tick: F) -> (CancelHandle, JoinHandle<()>)
    where
        F: FnMut(f64) + Send + 'static,
    {
        let cancel = CancelHandle::new();
        let loop_cancel = cancel.clone();
        let period = self.frame_period();

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                if loop_cancel.is_cancelled() {
                    break;
                }
                tick(wall_clock_ms());
            }
            debug!("Frame loop exited");
        });

        (cancel, task)
    }
}

/// Milliseconds since the Unix epoch; the wall clock the beat refractory
/// window is measured against.
pub fn wall_clock_ms() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}
