//! Decoded feed message types
//!
//! These are the records the live-feed collaborators hand over after they
//! have dealt with connection handling and payload decoding.

pub mod feed;

pub use feed::{
    ExecutionBatch, FeedEvent, FeedPayload, OrderEvent, OrderEventKind, TradePrint,
};
