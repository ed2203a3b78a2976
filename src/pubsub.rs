use std::sync::Mutex as StdMutex;

use bytes::Bytes;
use hashbrown::HashMap;
use tokio::sync::mpsc;

use crate::reply::Reply;

/// A frame delivered to a subscriber: either the initial acknowledgement
/// sent by `SUBSCRIBE` or a published message. Converts into the same
/// [`Reply`] type an ordinary command returns, since both travel over a
/// connection's single outgoing channel (spec §6's streamed subscribe-reply
/// and an ordinary reply share one transport).
#[derive(Debug, Clone)]
pub enum PubsubFrame {
    Subscribe { channel: Bytes, count: usize },
    Message { channel: Bytes, payload: Bytes },
}

/// The bounded queue depth for a subscriber sink. A slow subscriber drops
/// messages rather than stalling the publisher (spec §4.4 outcome 3).
pub const SINK_CAPACITY: usize = 128;

pub type Sink = mpsc::Sender<Reply>;

/// Channel-name to subscriber-sink fan-out (spec §4.4, C4). Publishes are
/// non-blocking and run in the publisher's own task; there is no dedicated
/// pub/sub task (spec §5).
///
/// Grounded on the teacher's `pubsub.rs`/`pubsub/subscribers.rs`, generalized
/// away from the teacher's actor-addressed `Client` sinks to a plain
/// `tokio::sync::mpsc::Sender`, whose `Closed` state *is* the "client-closure
/// signal" spec §3 describes a sink as holding — no separate flag needed.
#[derive(Default)]
pub struct Hub {
    channels: StdMutex<HashMap<Bytes, Vec<Sink>>>,
}

impl Hub {
    /// Attaches `sink` to `channel`. The caller (the command layer) is
    /// responsible for sending the initial `("subscribe", channel, count)`
    /// frame, since `count` here is the subscribing *connection's* running
    /// total of subscriptions, not anything the hub tracks per channel.
    pub fn subscribe(&self, channel: Bytes, sink: Sink) {
        self.channels
            .lock()
            .expect("pubsub lock poisoned")
            .entry(channel)
            .or_default()
            .push(sink);
    }

    /// Delivers `payload` to every live subscriber of `channel`, pruning any
    /// sink whose connection has disconnected. Implements the corrected
    /// behavior spec §9 calls for: only the closed sink is removed, not the
    /// whole channel (spec §4.4 describes the source's more aggressive
    /// "remove all sinks for this channel" as a bug to fix).
    pub fn publish(&self, channel: &[u8], payload: Bytes) -> usize {
        let mut channels = self.channels.lock().expect("pubsub lock poisoned");
        let Some(subs) = channels.get_mut(channel) else {
            return 0;
        };
        let mut delivered = 0;
        let channel_bytes = Bytes::copy_from_slice(channel);
        subs.retain_mut(|sink| {
            let frame = PubsubFrame::Message {
                channel: channel_bytes.clone(),
                payload: payload.clone(),
            };
            match sink.try_send(frame.into()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(mpsc::error::TrySendError::Full(_)) => true,
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            }
        });
        if subs.is_empty() {
            channels.remove(channel);
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_with_no_subscribers_returns_zero() {
        let hub = Hub::default();
        assert_eq!(hub.publish(b"ch", Bytes::from_static(b"x")), 0);
    }

    #[tokio::test]
    async fn publish_delivers_to_every_live_subscriber() {
        let hub = Hub::default();
        let (tx1, mut rx1) = mpsc::channel(SINK_CAPACITY);
        let (tx2, mut rx2) = mpsc::channel(SINK_CAPACITY);
        hub.subscribe(Bytes::from_static(b"ch"), tx1);
        hub.subscribe(Bytes::from_static(b"ch"), tx2);

        assert_eq!(hub.publish(b"ch", Bytes::from_static(b"hi")), 2);
        assert!(matches!(rx1.recv().await, Some(Reply::Array(_))));
        assert!(matches!(rx2.recv().await, Some(Reply::Array(_))));
    }

    #[tokio::test]
    async fn publish_prunes_only_the_closed_sink() {
        let hub = Hub::default();
        let (tx1, rx1) = mpsc::channel(SINK_CAPACITY);
        let (tx2, mut rx2) = mpsc::channel(SINK_CAPACITY);
        hub.subscribe(Bytes::from_static(b"ch"), tx1);
        hub.subscribe(Bytes::from_static(b"ch"), tx2);
        drop(rx1);

        assert_eq!(hub.publish(b"ch", Bytes::from_static(b"hi")), 1);
        assert!(rx2.recv().await.is_some());
        assert_eq!(hub.publish(b"ch", Bytes::from_static(b"hi")), 1);
    }
}
