//! Bridge from the blocking PDF writer to the async response body.
//!
//! `ChannelWriter` is an `io::Write` that buffers bytes into chunks and pushes
//! them through a bounded channel with `blocking_send`, so a slow client applies
//! backpressure to the render thread. It must only be used from a blocking
//! context (`spawn_blocking`), never from an async task.

use std::io::{self, Write};

use bytes::{Bytes, BytesMut};
use tokio::sync::mpsc;

/// One item of the response body stream.
pub type BodyChunk = Result<Bytes, io::Error>;

pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

pub struct ChannelWriter {
    tx: mpsc::Sender<BodyChunk>,
    buf: BytesMut,
    /// Upper bound on the size of every chunk sent.
    chunk_size: usize,
}

impl ChannelWriter {
    /// A writer and the receiving half for the body. `capacity` is in chunks.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<BodyChunk>) {
        Self::with_chunk_size(capacity, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(capacity: usize, chunk_size: usize) -> (Self, mpsc::Receiver<BodyChunk>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let chunk_size = chunk_size.max(1);
        let writer = ChannelWriter {
            tx,
            buf: BytesMut::with_capacity(chunk_size),
            chunk_size,
        };
        (writer, rx)
    }

    /// Extra handle on the channel, used to abort the body if the writer's thread dies.
    pub fn sender(&self) -> mpsc::Sender<BodyChunk> {
        self.tx.clone()
    }

    /// Drops buffered bytes and ends the stream with an error. The client sees an
    /// aborted transfer instead of a short document.
    pub fn abort(mut self, reason: String) {
        self.buf.clear();
        let _ = self.tx.blocking_send(Err(io::Error::other(reason)));
    }

    fn send(&self, chunk: Bytes) -> io::Result<()> {
        self.tx
            .blocking_send(Ok(chunk))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "response body closed"))
    }
}

impl Write for ChannelWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        while self.buf.len() >= self.chunk_size {
            let chunk = self.buf.split_to(self.chunk_size).freeze();
            self.send(chunk)?;
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let chunk = self.buf.split().freeze();
        self.send(chunk)
    }
}
