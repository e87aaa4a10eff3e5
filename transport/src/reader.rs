//! Update batch reader.
//!
//! This module provides [`UpdateReader`], a typed wrapper around a framed
//! async reader that produces a stream of update batches.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use pin_project_lite::pin_project;
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;

use crate::codec::SimCodec;
use crate::error::CodecError;
use crate::updates::Batch;

pin_project! {
    /// An async stream of incoming update batches.
    ///
    /// `UpdateReader` wraps an [`AsyncRead`] source and decodes simulator
    /// frames from the byte stream. It implements [`Stream`], allowing it
    /// to be used with async iteration patterns.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use futures::StreamExt;
    /// use transport::UpdateReader;
    ///
    /// let mut reader = UpdateReader::new(tcp_read_half);
    ///
    /// while let Some(batch) = reader.next().await {
    ///     for update in batch? {
    ///         // apply the update
    ///     }
    /// }
    /// ```
    pub struct UpdateReader<R> {
        #[pin]
        inner: FramedRead<R, SimCodec>,
    }
}

impl<R> UpdateReader<R>
where
    R: AsyncRead + Unpin,
{
    /// Create a new update reader from an async read source.
    pub fn new(reader: R) -> Self {
        Self {
            inner: FramedRead::new(reader, SimCodec::new()),
        }
    }

    /// Create a new update reader with a custom codec.
    ///
    /// This allows configuring options like maximum message size.
    pub fn with_codec(reader: R, codec: SimCodec) -> Self {
        Self {
            inner: FramedRead::new(reader, codec),
        }
    }

    /// Get a reference to the underlying reader.
    pub fn get_ref(&self) -> &R {
        self.inner.get_ref()
    }

    /// Get a mutable reference to the underlying reader.
    pub fn get_mut(&mut self) -> &mut R {
        self.inner.get_mut()
    }

    /// Consume the reader and return the underlying source.
    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }
}

impl<R> Stream for UpdateReader<R>
where
    R: AsyncRead + Unpin,
{
    type Item = Result<Batch, CodecError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().inner.poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::updates::Update;
    use futures::StreamExt;
    use std::io::Cursor;

    fn make_frame(json: &str) -> Vec<u8> {
        format!("Content-Length: {}\r\n\r\n{}", json.len(), json).into_bytes()
    }

    #[tokio::test]
    async fn read_single_batch() {
        let data = make_frame(r#"[["nextline", 3], ["edit_mode"]]"#);
        let cursor = Cursor::new(data);

        let mut reader = UpdateReader::new(cursor);
        let batch = reader.next().await.unwrap().unwrap();

        assert_eq!(batch, vec![Update::NextLine(3), Update::EditMode]);
    }

    #[tokio::test]
    async fn read_multiple_batches() {
        let mut data = make_frame(r#"[["nextline", 1]]"#);
        data.extend(make_frame(r#"[["debugline", 2]]"#));

        let cursor = Cursor::new(data);
        let mut reader = UpdateReader::new(cursor);

        let batch1 = reader.next().await.unwrap().unwrap();
        assert_eq!(batch1, vec![Update::NextLine(1)]);

        let batch2 = reader.next().await.unwrap().unwrap();
        assert_eq!(batch2, vec![Update::DebugLine(Some(2))]);
    }

    #[tokio::test]
    async fn read_eof() {
        let cursor = Cursor::new(Vec::new());
        let mut reader = UpdateReader::new(cursor);

        let result = reader.next().await;
        assert!(result.is_none());
    }
}
