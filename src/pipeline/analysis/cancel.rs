use tokio::sync::watch;

/// Owner side of a poll cancellation token. Dropping it also cancels.
#[derive(Debug)]
pub struct PollCancelHandle {
    tx: watch::Sender<bool>,
}

impl PollCancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Task side of a poll cancellation token.
#[derive(Debug, Clone)]
pub struct PollCancel {
    rx: watch::Receiver<bool>,
}

impl PollCancel {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolves once `cancel()` is called or the handle is dropped.
    pub async fn cancelled(&mut self) {
        let _ = self.rx.wait_for(|cancelled| *cancelled).await;
    }
}

pub fn cancel_pair() -> (PollCancelHandle, PollCancel) {
    let (tx, rx) = watch::channel(false);
    (PollCancelHandle { tx }, PollCancel { rx })
}
