//! Client-facing chunk sinks

use super::chunk::StreamChunk;
use crate::config::WireFormat;
use crate::error::{GatewayError, GatewayResult};
use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

/// Incremental writer for the wire protocol
///
/// `close` is called exactly once per stream by the orchestrator, whether
/// the stream completed or failed. Implementations treat repeated closes as
/// no-ops.
#[async_trait]
pub trait ChunkTransport: Send {
    /// Prepare for incremental writes
    async fn open(&mut self) -> GatewayResult<()> {
        Ok(())
    }

    /// Deliver one chunk immediately
    async fn send(&mut self, chunk: &StreamChunk) -> GatewayResult<()>;

    async fn close(&mut self) -> GatewayResult<()>;
}

/// Writes framed chunks to any async byte sink
#[derive(Debug)]
pub struct SseTransport<W> {
    writer: W,
    format: WireFormat,
    closed: bool,
}

impl<W: AsyncWrite + Unpin + Send> SseTransport<W> {
    pub fn new(writer: W) -> Self {
        Self::with_format(writer, WireFormat::Sse)
    }

    pub fn with_format(writer: W, format: WireFormat) -> Self {
        Self {
            writer,
            format,
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> ChunkTransport for SseTransport<W> {
    async fn send(&mut self, chunk: &StreamChunk) -> GatewayResult<()> {
        if self.closed {
            return Err(GatewayError::transport("write after close"));
        }
        let frame = chunk.encode(self.format)?;
        self.writer
            .write_all(frame.as_bytes())
            .await
            .map_err(|e| GatewayError::transport(format!("write failed: {}", e)))?;
        self.writer
            .flush()
            .await
            .map_err(|e| GatewayError::transport(format!("flush failed: {}", e)))
    }

    async fn close(&mut self) -> GatewayResult<()> {
        if std::mem::replace(&mut self.closed, true) {
            return Ok(());
        }
        self.writer
            .shutdown()
            .await
            .map_err(|e| GatewayError::transport(format!("shutdown failed: {}", e)))
    }
}

/// Forwards framed chunks to a response body task
///
/// A dropped receiver means the client went away and surfaces as a
/// transport error on the next send.
#[derive(Debug)]
pub struct ChannelTransport {
    sender: Option<mpsc::Sender<String>>,
    format: WireFormat,
}

impl ChannelTransport {
    pub fn new(sender: mpsc::Sender<String>, format: WireFormat) -> Self {
        Self {
            sender: Some(sender),
            format,
        }
    }

    /// A transport and the receiving half for the response body
    pub fn channel(capacity: usize, format: WireFormat) -> (Self, mpsc::Receiver<String>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self::new(sender, format), receiver)
    }
}

#[async_trait]
impl ChunkTransport for ChannelTransport {
    async fn send(&mut self, chunk: &StreamChunk) -> GatewayResult<()> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| GatewayError::transport("write after close"))?;
        let frame = chunk.encode(self.format)?;
        sender
            .send(frame)
            .await
            .map_err(|_| GatewayError::transport("client disconnected"))
    }

    async fn close(&mut self) -> GatewayResult<()> {
        self.sender.take();
        Ok(())
    }
}

/// Keeps chunks in memory and counts closes
#[derive(Debug, Default)]
pub struct RecordingTransport {
    chunks: Vec<StreamChunk>,
    close_calls: usize,
    /// Fail every send once this many chunks were accepted
    fail_after: Option<usize>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a client that disconnects after `accepted` chunks
    pub fn failing_after(accepted: usize) -> Self {
        Self {
            fail_after: Some(accepted),
            ..Default::default()
        }
    }

    pub fn chunks(&self) -> &[StreamChunk] {
        &self.chunks
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.chunks.iter().map(StreamChunk::kind).collect()
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls
    }

    pub fn is_closed(&self) -> bool {
        self.close_calls > 0
    }
}

#[async_trait]
impl ChunkTransport for RecordingTransport {
    async fn send(&mut self, chunk: &StreamChunk) -> GatewayResult<()> {
        if self.is_closed() {
            return Err(GatewayError::transport("write after close"));
        }
        if self.fail_after.is_some_and(|limit| self.chunks.len() >= limit) {
            return Err(GatewayError::transport("client disconnected"));
        }
        self.chunks.push(chunk.clone());
        Ok(())
    }

    async fn close(&mut self) -> GatewayResult<()> {
        self.close_calls += 1;
        Ok(())
    }
}
