//! One-shot and live device snapshot listings.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::Span;

use crate::error::AdminError;
use crate::matcher::Matcher;
use crate::model::{DeviceSnapshot, WatchEvent, WatchObject};
use crate::store::{DeviceSnapshotStore, Subscription};

use super::sink::SnapshotSink;

/// Parameters of a snapshot listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListSnapshots {
    /// Snapshot ID pattern; empty lists everything.
    pub pattern: String,
    /// Require literal patterns to match the whole ID rather than a prefix.
    pub exact: bool,
    /// Keep streaming new snapshots instead of stopping after existing ones.
    pub subscribe: bool,
}

impl ListSnapshots {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn matching(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            ..Self::default()
        }
    }

    pub fn exact(mut self) -> Self {
        self.exact = true;
        self
    }

    pub fn subscribe(mut self) -> Self {
        self.subscribe = true;
        self
    }
}

/// Serves snapshot listings from a [`DeviceSnapshotStore`].
pub struct SnapshotQuery {
    store: Arc<dyn DeviceSnapshotStore>,
    span: Span,
}

impl SnapshotQuery {
    pub fn new(store: Arc<dyn DeviceSnapshotStore>) -> Self {
        Self {
            store,
            span: tracing::info_span!("snapshots"),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Compile the pattern and open the store subscription, without sending
    /// anything yet. Both failures surface here, before any streaming.
    pub fn open(&self, request: &ListSnapshots) -> Result<SnapshotListing, AdminError> {
        let matcher = Matcher::compile(&request.pattern, request.exact)?;
        let feed = if request.subscribe {
            self.store.watch_all().map(Feed::Watch).map_err(|err| {
                tracing::error!(parent: &self.span, error = %err, "error watching snapshots");
                err
            })?
        } else {
            self.store.load_all().map(Feed::Enumeration).map_err(|err| {
                tracing::error!(parent: &self.span, error = %err, "error loading snapshots");
                err
            })?
        };
        tracing::info!(
            parent: &self.span,
            pattern = %request.pattern,
            subscribe = request.subscribe,
            "listing snapshots"
        );
        Ok(SnapshotListing {
            matcher,
            feed,
            pattern: request.pattern.clone(),
            span: self.span.clone(),
        })
    }

    /// Stream every snapshot whose ID matches the request into `sink`.
    ///
    /// Shorthand for [`SnapshotQuery::open`] followed by
    /// [`SnapshotListing::run`].
    pub async fn list_snapshots<S: SnapshotSink>(
        &self,
        request: &ListSnapshots,
        sink: &S,
        cancel: &CancellationToken,
    ) -> Result<(), AdminError> {
        self.open(request)?.run(sink, cancel).await
    }
}

enum Feed {
    Enumeration(Subscription<DeviceSnapshot>),
    Watch(Subscription<WatchEvent>),
}

impl Feed {
    /// Next device snapshot, skipping events about other entities. `None`
    /// once the store has closed its side.
    async fn next(&mut self, span: &Span) -> Option<DeviceSnapshot> {
        match self {
            Feed::Enumeration(subscription) => subscription.recv().await,
            Feed::Watch(subscription) => loop {
                let event = subscription.recv().await?;
                match event.object {
                    WatchObject::DeviceSnapshot(snapshot) => return Some(snapshot),
                    other @ (WatchObject::NetworkChange(_) | WatchObject::NetworkSnapshot(_)) => {
                        tracing::trace!(
                            parent: span,
                            id = other.id(),
                            "ignoring non-snapshot event"
                        );
                    }
                }
            },
        }
    }
}

/// An open snapshot listing, ready to stream.
///
/// Without `subscribe` it ends after the store's current snapshots. With
/// `subscribe` it forwards snapshot events until the store closes the watch.
/// Either way, `cancel` or the sink closing ends the listing cleanly, even
/// while a send is waiting on a slow caller. The store subscription is
/// released on every exit, including when the listing is dropped unrun.
pub struct SnapshotListing {
    matcher: Matcher,
    feed: Feed,
    pattern: String,
    span: Span,
}

impl SnapshotListing {
    pub async fn run<S: SnapshotSink>(
        mut self,
        sink: &S,
        cancel: &CancellationToken,
    ) -> Result<(), AdminError> {
        loop {
            let snapshot = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!(parent: &self.span, "snapshot listing cancelled");
                    return Ok(());
                }
                _ = sink.closed() => {
                    tracing::info!(parent: &self.span, "remote client closed connection");
                    return Ok(());
                }
                next = self.feed.next(&self.span) => match next {
                    Some(snapshot) => snapshot,
                    None => break,
                },
            };
            if !self.matcher.matches(snapshot.id.as_str()) {
                continue;
            }

            let id = snapshot.id.clone();
            tracing::debug!(parent: &self.span, id = %id, "sending matching snapshot");
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!(
                        parent: &self.span,
                        id = %id,
                        "snapshot listing cancelled mid-send"
                    );
                    return Ok(());
                }
                sent = sink.send(snapshot) => {
                    if let Err(err) = sent {
                        tracing::error!(
                            parent: &self.span,
                            id = %id,
                            error = %err,
                            "error sending snapshot"
                        );
                        return Err(AdminError::StreamClosed);
                    }
                }
            }
        }

        tracing::info!(parent: &self.span, pattern = %self.pattern, "closing snapshot listing");
        Ok(())
    }
}
