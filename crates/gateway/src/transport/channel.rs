//! Tokio channel-based transport for single-process mode
//!
//! Uses bounded mpsc channels: many publishers, one subscriber. A full channel
//! makes `publish` wait instead of dropping, so no execution or order event is
//! ever lost between a feed and the router.

use crate::error::TransportError;
use crate::messages::FeedEvent;
use crate::transport::{Publisher, Subscriber};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Merged feed publisher handed to every live-feed collaborator
pub type FeedPublisher = ChannelPublisher<FeedEvent>;

/// Merged feed subscriber owned by the event router
pub type FeedSubscriber = ChannelSubscriber<FeedEvent>;

/// Create the bounded merged feed channel
pub fn feed_channel(capacity: usize) -> (FeedPublisher, FeedSubscriber) {
    ChannelPublisher::pair(capacity)
}

/// Channel-based publisher using a bounded mpsc sender
pub struct ChannelPublisher<M> {
    tx: mpsc::Sender<M>,
}

impl<M> Clone for ChannelPublisher<M> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<M> ChannelPublisher<M> {
    /// Create a publisher/subscriber pair with given capacity
    ///
    /// A capacity of zero is bumped to one; tokio rejects empty bounded channels.
    pub fn pair(capacity: usize) -> (Self, ChannelSubscriber<M>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, ChannelSubscriber { rx })
    }

    /// Publish without waiting; fails with `Full` when the channel has no room
    pub fn try_publish(&self, msg: M) -> Result<(), TransportError> {
        self.tx.try_send(msg).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TransportError::Full,
            mpsc::error::TrySendError::Closed(_) => TransportError::ChannelClosed,
        })
    }

    /// Free slots currently available
    pub fn capacity(&self) -> usize {
        self.tx.capacity()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[async_trait]
impl<M> Publisher<M> for ChannelPublisher<M>
where
    M: Send + 'static,
{
    async fn publish(&self, msg: M) -> Result<(), TransportError> {
        self.tx
            .send(msg)
            .await
            .map_err(|_| TransportError::ChannelClosed)
    }
}

/// Channel-based subscriber using a bounded mpsc receiver
pub struct ChannelSubscriber<M> {
    rx: mpsc::Receiver<M>,
}

#[async_trait]
impl<M> Subscriber<M> for ChannelSubscriber<M>
where
    M: Send + 'static,
{
    async fn next(&mut self) -> Result<M, TransportError> {
        self.rx.recv().await.ok_or(TransportError::ChannelClosed)
    }

    fn try_next(&mut self) -> Result<Option<M>, TransportError> {
        match self.rx.try_recv() {
            Ok(msg) => Ok(Some(msg)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(TransportError::ChannelClosed),
        }
    }
}
