use bytes::Bytes;

use crate::error::ReplyError;
use crate::pubsub::PubsubFrame;

/// A typed reply value a command handler returns, before wire encoding.
///
/// A drastic simplification of the teacher's `Reply` (which also carries
/// RESP3 push/map/set/verbatim variants and `piccolo` Lua values this design
/// has no use for): just the reply shapes spec §6 actually lists.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Integer(i64),
    Bulk(Option<Bytes>),
    Array(Vec<Reply>),
    Status(Bytes),
    Error(ReplyError),
    /// `SUBSCRIBE`'s reply is not a single value but a stream of frames
    /// delivered over the connection's own outgoing channel; the dispatcher
    /// emits nothing further for this command (spec §6's "streamed
    /// subscribe-reply").
    Subscribed,
}

impl Reply {
    #[must_use]
    pub fn ok() -> Self {
        Reply::Status(Bytes::from_static(b"OK"))
    }

    #[must_use]
    pub fn nil() -> Self {
        Reply::Bulk(None)
    }

    pub fn bulk(value: impl Into<Bytes>) -> Self {
        Reply::Bulk(Some(value.into()))
    }

    pub fn status(value: impl Into<Bytes>) -> Self {
        Reply::Status(value.into())
    }
}

impl From<ReplyError> for Reply {
    fn from(error: ReplyError) -> Self {
        Reply::Error(error)
    }
}

impl From<i64> for Reply {
    fn from(value: i64) -> Self {
        Reply::Integer(value)
    }
}

impl From<bool> for Reply {
    fn from(value: bool) -> Self {
        Reply::Integer(i64::from(value))
    }
}

impl From<PubsubFrame> for Reply {
    fn from(frame: PubsubFrame) -> Self {
        match frame {
            PubsubFrame::Subscribe { channel, count } => Reply::Array(vec![
                Reply::bulk(Bytes::from_static(b"subscribe")),
                Reply::bulk(channel),
                Reply::Integer(i64::try_from(count).unwrap_or(i64::MAX)),
            ]),
            PubsubFrame::Message { channel, payload } => Reply::Array(vec![
                Reply::bulk(Bytes::from_static(b"message")),
                Reply::bulk(channel),
                Reply::bulk(payload),
            ]),
        }
    }
}
