//! Cooperative cancellation for request chains.
//!
//! The pipeline checks a [`Cancellation`] before every validator, route and
//! catcher step. Handlers that spawn background work can hold on to a clone
//! and await [`Cancellation::cancelled`].

use tokio::sync::watch;

/// The receiving side of a cancellation signal. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Cancellation {
    rx: Option<watch::Receiver<bool>>,
}

impl Cancellation {
    /// A signal that never fires.
    pub fn never() -> Self {
        Self { rx: None }
    }

    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves once cancellation has been requested.
    pub async fn cancelled(&self) {
        let Some(rx) = &self.rx else {
            return std::future::pending().await;
        };
        let mut rx = rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            // Handle dropped without cancelling.
            std::future::pending::<()>().await;
        }
    }
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::never()
    }
}

/// The sending side of a cancellation signal.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn token(&self) -> Cancellation {
        Cancellation {
            rx: Some(self.tx.subscribe()),
        }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Cancels when dropped, unless [`DropGuard::disarm`] is called first.
    pub fn drop_guard(self) -> DropGuard {
        DropGuard { handle: Some(self) }
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancels its signal when dropped.
///
/// The server wraps each request in one, so a request future abandoned by a
/// disconnecting client cancels its chain.
#[derive(Debug)]
pub struct DropGuard {
    handle: Option<CancelHandle>,
}

impl DropGuard {
    pub fn disarm(mut self) {
        self.handle = None;
    }
}

impl Drop for DropGuard {
    fn drop(&mut self) {
        if let Some(handle) = &self.handle {
            handle.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_is_never_cancelled() {
        assert!(!Cancellation::never().is_cancelled());
    }

    #[test]
    fn cancel_is_visible_to_every_token() {
        let handle = CancelHandle::new();
        let a = handle.token();
        let b = a.clone();
        assert!(!a.is_cancelled());
        handle.cancel();
        assert!(a.is_cancelled());
        assert!(b.is_cancelled());
    }

    #[test]
    fn guard_cancels_on_drop_unless_disarmed() {
        let handle = CancelHandle::new();
        let token = handle.token();
        drop(handle.drop_guard());
        assert!(token.is_cancelled());

        let handle = CancelHandle::new();
        let token = handle.token();
        handle.drop_guard().disarm();
        assert!(!token.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_resolves_after_cancel() {
        let handle = CancelHandle::new();
        let token = handle.token();
        let waiter = tokio::spawn(async move { token.cancelled().await });
        handle.cancel();
        waiter.await.unwrap();
    }
}
