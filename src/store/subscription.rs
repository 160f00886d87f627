//! Owned handle over an open store enumeration or watch.

use std::fmt;

use tokio::sync::mpsc;

type Release = Box<dyn FnOnce() + Send>;

/// An open enumeration or watch against the store.
///
/// Items arrive in the order the store sent them; `recv` returns `None` once
/// the store has closed its side. The store-side resources are released
/// exactly once: by [`Subscription::close`], or when the handle is dropped
/// on any other exit path.
pub struct Subscription<T> {
    receiver: mpsc::UnboundedReceiver<T>,
    release: Option<Release>,
}

impl<T> Subscription<T> {
    /// Wrap a receiver whose store-side resources are freed by `release`.
    pub fn new(
        receiver: mpsc::UnboundedReceiver<T>,
        release: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            receiver,
            release: Some(Box::new(release)),
        }
    }

    /// Wrap a receiver that holds nothing on the store side.
    pub fn detached(receiver: mpsc::UnboundedReceiver<T>) -> Self {
        Self {
            receiver,
            release: None,
        }
    }

    /// Wait for the next item. `None` means the store closed the subscription.
    pub async fn recv(&mut self) -> Option<T> {
        self.receiver.recv().await
    }

    /// Release the subscription now instead of at drop.
    pub fn close(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        self.receiver.close();
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.release_once();
    }
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("released", &self.release.is_none())
            .finish()
    }
}
