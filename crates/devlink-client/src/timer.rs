use crate::event::Signal;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// A pending reconnect. Dropping or cancelling it aborts the attempt.
#[derive(Debug)]
pub struct ReconnectTimer {
    task: JoinHandle<()>,
    deadline: Instant,
}

impl ReconnectTimer {
    pub(crate) fn schedule(
        delay: Duration,
        generation: u64,
        signals: mpsc::UnboundedSender<Signal>,
    ) -> Self {
        let deadline = Instant::now() + delay;
        let task = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let _ = signals.send(Signal::ReconnectDue { generation });
        });
        Self { task, deadline }
    }

    /// When the reconnect fires.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Abort the attempt. Dropping the timer does the same.
    pub fn cancel(self) {}
}

impl Drop for ReconnectTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let start = Instant::now();
        let timer = ReconnectTimer::schedule(Duration::from_millis(2_000), 4, tx);
        assert_eq!(timer.deadline() - start, Duration::from_millis(2_000));

        let signal = rx.recv().await.unwrap();
        assert!(matches!(signal, Signal::ReconnectDue { generation: 4 }));
        assert!(start.elapsed() >= Duration::from_millis(2_000));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_firing() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        ReconnectTimer::schedule(Duration::from_millis(2_000), 1, tx).cancel();

        // The aborted task drops the only sender.
        assert!(rx.recv().await.is_none());
    }
}
