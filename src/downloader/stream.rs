// MediaStream - exclusively owned, ordered, non-restartable byte stream for one variant

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::stream::{self, BoxStream, Stream, StreamExt};

use super::errors::DownloadError;

pub type ChunkResult = Result<Bytes, DownloadError>;

/// Encoded media for one format variant.
///
/// Dropping the stream releases the upstream transport (HTTP connection or
/// child process), which is how client disconnects propagate upstream.
pub struct MediaStream {
    inner: BoxStream<'static, ChunkResult>,
}

impl MediaStream {
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = ChunkResult> + Send + 'static,
    {
        Self {
            inner: stream.boxed(),
        }
    }

    /// Stream that yields the given items in order, then ends
    pub fn from_results(items: Vec<ChunkResult>) -> Self {
        Self::new(stream::iter(items))
    }

    /// Put an already-read chunk back in front of the remaining stream
    pub fn prepend(first: Bytes, rest: MediaStream) -> Self {
        Self::new(stream::once(async move { Ok(first) }).chain(rest))
    }
}

impl Stream for MediaStream {
    type Item = ChunkResult;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl std::fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStream").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn prepend_keeps_order() {
        let rest = MediaStream::from_results(vec![
            Ok(Bytes::from_static(b"b")),
            Ok(Bytes::from_static(b"c")),
        ]);
        let stream = MediaStream::prepend(Bytes::from_static(b"a"), rest);

        let chunks: Vec<Bytes> = stream.map(|c| c.unwrap()).collect().await;
        assert_eq!(
            chunks,
            vec![
                Bytes::from_static(b"a"),
                Bytes::from_static(b"b"),
                Bytes::from_static(b"c")
            ]
        );
    }
}
