//! Fixed-size chunking of a byte stream.

use std::io;
use std::num::NonZeroUsize;

use bytes::Bytes;
use futures::Stream;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Splits a reader into consecutive segments of `chunk_size` bytes.
///
/// Every segment is full-sized except possibly the last, which holds the
/// remainder. Short reads from the underlying reader are retried, so the
/// boundaries depend only on the total length and `chunk_size`. An empty
/// reader yields no segments, and no segment is ever empty.
pub struct Chunker<R> {
  reader: R,
  chunk_size: NonZeroUsize,
  done: bool,
}

impl<R: AsyncRead + Unpin> Chunker<R> {
  pub fn new(reader: R, chunk_size: NonZeroUsize) -> Self {
    Self {
      reader,
      chunk_size,
      done: false,
    }
  }

  /// Read the next segment, or `None` once the reader is exhausted.
  pub async fn next_chunk(&mut self) -> io::Result<Option<Bytes>> {
    if self.done {
      return Ok(None);
    }

    let size = self.chunk_size.get();
    let mut buf = vec![0u8; size];
    let mut filled = 0;

    while filled < size {
      let n = self.reader.read(&mut buf[filled..]).await?;
      if n == 0 {
        self.done = true;
        break;
      }
      filled += n;
    }

    if filled == 0 {
      return Ok(None);
    }

    buf.truncate(filled);
    Ok(Some(Bytes::from(buf)))
  }

  /// Consume the chunker as a stream of segments.
  pub fn into_stream(self) -> impl Stream<Item = io::Result<Bytes>> {
    futures::stream::try_unfold(self, |mut chunker| async move {
      let next = chunker.next_chunk().await?;
      Ok::<_, io::Error>(next.map(|chunk| (chunk, chunker)))
    })
  }
}
