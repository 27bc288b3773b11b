//! Transport abstraction layer
//!
//! Provides unified traits for in-process message passing using tokio channels.
//! Live feeds publish into a bounded channel; the event router is its only
//! subscriber.

pub mod channel;

pub use channel::{ChannelPublisher, ChannelSubscriber, FeedPublisher, FeedSubscriber, feed_channel};

use crate::error::TransportError;
use async_trait::async_trait;

/// Publisher - sends messages into a channel
#[async_trait]
pub trait Publisher<M>: Send + Sync
where
    M: Send + 'static,
{
    /// Publish a message, waiting for capacity when the channel is full
    async fn publish(&self, msg: M) -> Result<(), TransportError>;
}

/// Subscriber - receives messages from a channel
#[async_trait]
pub trait Subscriber<M>: Send
where
    M: Send + 'static,
{
    /// Wait for the next message
    async fn next(&mut self) -> Result<M, TransportError>;

    /// Try to receive without waiting (returns None if no message available)
    fn try_next(&mut self) -> Result<Option<M>, TransportError>;
}
