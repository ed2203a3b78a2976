use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use hashbrown::HashSet;
use tokio::sync::mpsc;

use crate::reply::Reply;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Per-connection state the default handler keeps outside any database lock
/// (spec §4.6: "the handler holds a small amount of per-connection state —
/// currently selected database index").
///
/// Reduced from the teacher's `Client` (RESP version negotiation, a
/// transaction state machine, a scripting flag, monitor bookkeeping — all
/// tied to explicit non-goals here) to the two things this design's command
/// surface actually needs: the selected database and the set of channels
/// this connection is subscribed to, which is what gives `SUBSCRIBE` its
/// per-connection running count (spec §4.4).
pub struct Connection {
    pub id: u64,
    pub db: usize,
    pub subscriptions: HashSet<Bytes>,
    /// Frames pushed outside of a direct command reply: `SUBSCRIBE`
    /// acknowledgements and `PUBLISH` deliveries (spec §6's streamed
    /// subscribe-reply). The same channel an embedder's I/O loop drains for
    /// ordinary command replies, mirroring the teacher's single
    /// `reply_sender` used for both purposes in `client.rs`.
    pub outgoing: mpsc::Sender<Reply>,
}

impl Connection {
    #[must_use]
    pub fn new(outgoing: mpsc::Sender<Reply>) -> Self {
        Connection {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            db: 0,
            subscriptions: HashSet::new(),
            outgoing,
        }
    }
}
