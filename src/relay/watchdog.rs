//! Inactivity watchdog for a single relay operation.
//!
//! Every forwarded request chunk and every received response chunk counts as
//! progress. The watchdog fires once no progress has been observed for the
//! configured limit.

use std::future::Future;
use std::io;
use std::pin::pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::BoxError;
use bytes::Bytes;
use futures_util::{Stream, StreamExt, TryStreamExt};
use tokio::time::Instant;

/// The watched operation made no progress within the limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inactive;

#[derive(Debug, Clone)]
pub struct Watchdog {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    origin: Instant,
    /// Nanoseconds since `origin` at the last observed progress.
    last_progress: AtomicU64,
    limit: Duration,
}

impl Watchdog {
    pub fn new(limit: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                origin: Instant::now(),
                last_progress: AtomicU64::new(0),
                limit,
            }),
        }
    }

    pub fn limit(&self) -> Duration {
        self.inner.limit
    }

    /// Record progress.
    pub fn touch(&self) {
        let elapsed = self.inner.origin.elapsed().as_nanos() as u64;
        self.inner.last_progress.fetch_max(elapsed, Ordering::Relaxed);
    }

    pub fn idle_for(&self) -> Duration {
        let last = Duration::from_nanos(self.inner.last_progress.load(Ordering::Relaxed));
        self.inner.origin.elapsed().saturating_sub(last)
    }

    /// Resolves once the operation has been idle for the full limit.
    pub async fn expired(&self) {
        loop {
            let idle = self.idle_for();
            if idle >= self.inner.limit {
                return;
            }
            tokio::time::sleep(self.inner.limit - idle).await;
        }
    }

    /// Drive `fut` to completion unless the watchdog fires first, in which
    /// case `fut` is dropped.
    pub async fn guard<F: Future>(&self, fut: F) -> Result<F::Output, Inactive> {
        let mut fut = pin!(fut);
        tokio::select! {
            out = &mut fut => Ok(out),
            _ = self.expired() => Err(Inactive),
        }
    }

    /// Count each chunk of `stream` as progress.
    pub fn track<S, E>(&self, stream: S) -> impl Stream<Item = Result<Bytes, E>> + Send + 'static
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: 'static,
    {
        let dog = self.clone();
        stream.inspect_ok(move |_| dog.touch())
    }

    /// Like [`Watchdog::track`], but also ends the stream with a `TimedOut`
    /// error once it has been idle for the limit.
    pub fn bounded<S, E>(&self, stream: S) -> impl Stream<Item = Result<Bytes, BoxError>> + Send + 'static
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<BoxError> + Send + 'static,
    {
        let state = (Box::pin(stream), self.clone(), false);
        futures_util::stream::unfold(state, |(mut stream, dog, done)| async move {
            if done {
                return None;
            }
            tokio::select! {
                next = stream.next() => match next {
                    Some(Ok(chunk)) => {
                        dog.touch();
                        Some((Ok(chunk), (stream, dog, false)))
                    }
                    Some(Err(e)) => Some((Err(e.into()), (stream, dog, true))),
                    None => None,
                },
                _ = dog.expired() => {
                    let err = io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("no data from target for {}s", dog.limit().as_secs()),
                    );
                    Some((Err(err.into()), (stream, dog, true)))
                }
            }
        })
    }
}
