use chatwire_core::ChatwireResult;
use std::future::Future;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// One raw delivery from a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    /// A complete text frame (socket).
    Text(String),
    /// A slice of a byte stream (HTTP body); may split characters and lines.
    Bytes(Vec<u8>),
}

/// Lifecycle of an open [`Channel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Delivering chunks.
    Open,
    /// Ended gracefully, or closed by the caller.
    Closed,
    /// Ended with a transport error.
    Failed,
}

/// Sending half handed to a transport's reader task.
pub type ChunkSender = mpsc::Sender<ChatwireResult<Chunk>>;

/// Receiving half fired when the channel is closed or dropped.
pub type CloseSignal = oneshot::Receiver<()>;

/// An open transport instance delivering raw chunks until closed or failed.
///
/// A background reader task feeds the channel. [`Channel::close`] is
/// idempotent and safe in every state; dropping the channel closes it.
#[derive(Debug)]
pub struct Channel {
    state: ChannelState,
    chunks: mpsc::Receiver<ChatwireResult<Chunk>>,
    close_tx: Option<oneshot::Sender<()>>,
}

impl Channel {
    /// Spawns `reader` as the channel's background task.
    ///
    /// The reader pushes chunks into the [`ChunkSender`], pushes at most one
    /// error, and must return once the [`CloseSignal`] fires. Returning
    /// without an error ends the channel gracefully.
    pub fn spawn<F, Fut>(buffer: usize, reader: F) -> Self
    where
        F: FnOnce(ChunkSender, CloseSignal) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let (close_tx, close_rx) = oneshot::channel();
        tokio::spawn(reader(tx, close_rx));
        Self {
            state: ChannelState::Open,
            chunks: rx,
            close_tx: Some(close_tx),
        }
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ChannelState::Open
    }

    /// Waits for the next chunk.
    ///
    /// `None` means the channel is no longer open: either it ended gracefully
    /// (state becomes [`ChannelState::Closed`]) or it was closed or failed
    /// earlier. An `Err` is delivered at most once and moves the channel to
    /// [`ChannelState::Failed`].
    pub async fn next_chunk(&mut self) -> Option<ChatwireResult<Chunk>> {
        if self.state != ChannelState::Open {
            return None;
        }
        match self.chunks.recv().await {
            Some(Ok(chunk)) => Some(Ok(chunk)),
            Some(Err(e)) => {
                self.state = ChannelState::Failed;
                self.release();
                Some(Err(e))
            }
            None => {
                self.state = ChannelState::Closed;
                self.release();
                None
            }
        }
    }

    /// Stops delivery. Chunks already buffered are discarded.
    pub fn close(&mut self) {
        if self.state == ChannelState::Open {
            debug!("Closing channel");
            self.state = ChannelState::Closed;
        }
        self.release();
    }

    fn release(&mut self) {
        if let Some(close_tx) = self.close_tx.take() {
            // The reader may already be gone.
            let _ = close_tx.send(());
        }
        self.chunks.close();
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        self.close();
    }
}
