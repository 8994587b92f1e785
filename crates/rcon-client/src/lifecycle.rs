use std::{future::Future, time::Duration};

use tokio::task::JoinHandle;

/// Decides how long to wait before the next reconnect attempt.
pub trait ReconnectPolicy: Send + 'static {
    /// Delay before the next attempt after a close.
    fn next_delay(&mut self) -> Duration;

    /// Called once a connection opens.
    fn reset(&mut self) {}
}

/// Constant reconnect interval with no growth, jitter, or retry cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay(pub Duration);

impl ReconnectPolicy for FixedDelay {
    fn next_delay(&mut self) -> Duration {
        self.0
    }
}

/// The one pending reconnect timer owned by a session.
///
/// Arming replaces (and aborts) any earlier timer; dropping cancels it.
#[derive(Debug, Default)]
pub struct ReconnectTimer {
    task: Option<JoinHandle<()>>,
}

impl ReconnectTimer {
    /// Runs `on_fire` after `delay` unless cancelled first.
    pub fn arm<F>(&mut self, delay: Duration, on_fire: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            on_fire.await;
        }));
    }

    /// Aborts the pending timer, if any.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Whether a timer is pending and has not fired yet.
    pub fn is_armed(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for ReconnectTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
