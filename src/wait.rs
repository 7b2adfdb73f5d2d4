use std::time::Duration;
use tokio::sync::watch;

/// Cancellable bounded wait. The collector parks on this while waiting for
/// the API quota to reset; tests drive it with paused tokio time.
pub fn channel() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle(tx), CancelSignal(rx))
}

#[derive(Debug)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.0.send(true);
    }
}

#[derive(Debug, Clone)]
pub struct CancelSignal(watch::Receiver<bool>);

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Sleep for `duration`, waking early on cancellation. Returns `true`
    /// when the full duration elapsed, `false` when cancelled. A dropped
    /// handle is not a cancellation.
    pub async fn sleep(&mut self, duration: Duration) -> bool {
        if self.is_cancelled() {
            return false;
        }

        let sleep = tokio::time::sleep(duration);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => return true,
                changed = self.0.changed() => match changed {
                    Ok(()) if *self.0.borrow() => return false,
                    Ok(()) => continue,
                    Err(_) => {
                        sleep.await;
                        return true;
                    }
                },
            }
        }
    }
}
