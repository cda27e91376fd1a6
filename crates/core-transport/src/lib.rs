//! Thin adapter over a bidirectional named-event channel.
//!
//! The real deployment speaks a socket with named events; this core is
//! transport-agnostic and works against any pair of channels carrying typed
//! events. The adapter supplies:
//! * the `(name, JSON payload)` frame codec the wire uses;
//! * per-namespace endpoint pairs over bounded `tokio::sync::mpsc` channels,
//!   with a loopback constructor for in-process sessions;
//! * [`ChannelSink`], the engines' outbound `EventSink`: fire-and-forget
//!   `try_send`, dropped frames counted, never blocking (the engines run in
//!   a single-threaded cooperative scheduler and must not suspend).

use std::sync::atomic::{AtomicU64, Ordering};

use core_events::{EVENT_CHANNEL_CAP, EventSink};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;

/// Outbound frames handed to a full or closed channel. Emission is lossy by
/// contract; the counter makes the loss observable.
pub static SEND_DROPS: AtomicU64 = AtomicU64::new(0);

/// Successful fire-and-forget sends.
pub static SENDS: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("frame does not encode a known event: {0}")]
    Codec(#[from] serde_json::Error),
}

/// One named event on the wire: the event name plus its JSON payload.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Frame {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Encode a typed event into its wire frame.
pub fn encode<T: Serialize>(event: &T) -> Result<Frame, CodecError> {
    Ok(serde_json::from_value(serde_json::to_value(event)?)?)
}

/// Decode a wire frame back into a typed event. Unknown names or malformed
/// payloads are a decode error the caller is expected to drop.
pub fn decode<T: DeserializeOwned>(frame: &Frame) -> Result<T, CodecError> {
    Ok(serde_json::from_value(serde_json::to_value(frame)?)?)
}

/// One side of a bidirectional event channel.
pub struct Endpoint<Out, In> {
    pub tx: mpsc::Sender<Out>,
    pub rx: mpsc::Receiver<In>,
}

/// A connected pair of endpoints over in-process channels, capacity
/// [`EVENT_CHANNEL_CAP`] each way.
pub fn loopback<A, B>() -> (Endpoint<A, B>, Endpoint<B, A>) {
    let (a_tx, a_rx) = mpsc::channel(EVENT_CHANNEL_CAP);
    let (b_tx, b_rx) = mpsc::channel(EVENT_CHANNEL_CAP);
    (
        Endpoint { tx: a_tx, rx: b_rx },
        Endpoint { tx: b_tx, rx: a_rx },
    )
}

/// Non-blocking outbound sink over a bounded channel. A full channel drops
/// the event rather than suspending the engine.
#[derive(Clone)]
pub struct ChannelSink<T> {
    tx: mpsc::Sender<T>,
}

impl<T> ChannelSink<T> {
    pub fn new(tx: mpsc::Sender<T>) -> Self {
        Self { tx }
    }
}

impl<T: std::fmt::Debug> EventSink<T> for ChannelSink<T> {
    fn emit(&mut self, event: T) {
        match self.tx.try_send(event) {
            Ok(()) => {
                SENDS.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                SEND_DROPS.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(target: "transport.wire", ?err, "outbound_drop");
            }
        }
    }
}
