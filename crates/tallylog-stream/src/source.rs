use std::collections::VecDeque;

use tracing::debug;

use crate::channel::Channel;
use crate::error::{Result, StreamError};

/// Yields the next connected [`Channel`].
pub trait ChannelSource: Send {
    /// Accept the next channel (may block).
    fn accept(&mut self) -> Result<Channel>;
}

impl<S: ChannelSource + ?Sized> ChannelSource for &mut S {
    fn accept(&mut self) -> Result<Channel> {
        (**self).accept()
    }
}

impl<S: ChannelSource + ?Sized> ChannelSource for Box<S> {
    fn accept(&mut self) -> Result<Channel> {
        (**self).accept()
    }
}

/// Drains a preregistered FIFO queue of channels, then delegates to an
/// optional fallback source.
///
/// With no fallback, an empty queue fails with
/// [`StreamError::NoChannelsAvailable`] instead of blocking.
#[derive(Default)]
pub struct QueuedChannelSource {
    queue: VecDeque<Channel>,
    fallback: Option<Box<dyn ChannelSource>>,
}

impl QueuedChannelSource {
    /// Create a source over an initial queue, with no fallback.
    pub fn new(channels: impl IntoIterator<Item = Channel>) -> Self {
        Self {
            queue: channels.into_iter().collect(),
            fallback: None,
        }
    }

    /// Chain a fallback source used once the queue is empty.
    pub fn with_fallback(mut self, fallback: impl ChannelSource + 'static) -> Self {
        self.fallback = Some(Box::new(fallback));
        self
    }

    /// Append a channel to the back of the queue.
    pub fn push(&mut self, channel: Channel) {
        self.queue.push_back(channel);
    }

    /// Number of queued channels.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns true if no channels are queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl ChannelSource for QueuedChannelSource {
    fn accept(&mut self) -> Result<Channel> {
        if let Some(channel) = self.queue.pop_front() {
            debug!(remaining = self.queue.len(), "dequeued channel");
            return Ok(channel);
        }
        match &mut self.fallback {
            Some(fallback) => fallback.accept(),
            None => Err(StreamError::NoChannelsAvailable),
        }
    }
}

impl std::fmt::Debug for QueuedChannelSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuedChannelSource")
            .field("queued", &self.queue.len())
            .field("has_fallback", &self.fallback.is_some())
            .finish()
    }
}
