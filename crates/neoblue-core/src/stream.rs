// ── Reactive status streams ──
//
// Subscription handle over one device's merged record.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::StatusRecord;

/// A subscription to one device's status.
///
/// Offers the snapshot taken at subscription time, the latest record, and
/// change notification via [`changed`](Self::changed) or as a `Stream`.
/// Every notification carries the full record.
pub struct StatusStream {
    current: Arc<StatusRecord>,
    receiver: watch::Receiver<Arc<StatusRecord>>,
}

impl StatusStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<StatusRecord>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// Snapshot as of creation or the last [`changed`](Self::changed).
    pub fn current(&self) -> &Arc<StatusRecord> {
        &self.current
    }

    pub fn latest(&self) -> Arc<StatusRecord> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next publish. `None` once the coordinator is gone.
    pub async fn changed(&mut self) -> Option<Arc<StatusRecord>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Yields the current record first, then every subsequent publish.
    pub fn into_stream(self) -> StatusWatchStream {
        StatusWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

pub struct StatusWatchStream {
    inner: WatchStream<Arc<StatusRecord>>,
}

impl Stream for StatusWatchStream {
    type Item = Arc<StatusRecord>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use futures_util::StreamExt;

    use super::*;

    #[tokio::test]
    async fn changed_tracks_latest_record() {
        let (tx, rx) = watch::channel(Arc::new(StatusRecord::seed(-60)));
        let mut stream = StatusStream::new(rx);
        assert_eq!(stream.current().signal_strength, -60);

        tx.send_replace(Arc::new(StatusRecord::seed(-42)));
        let next = stream.changed().await.unwrap();
        assert_eq!(next.signal_strength, -42);
        assert_eq!(stream.current().signal_strength, -42);

        drop(tx);
        assert!(stream.changed().await.is_none());
    }

    #[tokio::test]
    async fn stream_starts_with_current_value() {
        let (tx, rx) = watch::channel(Arc::new(StatusRecord::seed(-60)));
        let mut stream = StatusStream::new(rx).into_stream();

        assert_eq!(stream.next().await.unwrap().signal_strength, -60);
        tx.send_replace(Arc::new(StatusRecord::seed(-70)));
        assert_eq!(stream.next().await.unwrap().signal_strength, -70);
    }

    #[test]
    fn changed_is_pending_until_publish() {
        let (tx, rx) = watch::channel(Arc::new(StatusRecord::seed(-60)));
        let mut stream = StatusStream::new(rx);
        let mut changed = tokio_test::task::spawn(stream.changed());

        tokio_test::assert_pending!(changed.poll());
        tx.send_replace(Arc::new(StatusRecord::seed(-55)));
        assert!(changed.is_woken());
        let next = tokio_test::assert_ready!(changed.poll()).unwrap();
        assert_eq!(next.signal_strength, -55);
    }
}
