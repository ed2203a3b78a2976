use bytes::Bytes;

use crate::command::{Arity, CommandFuture, CommandSpec};
use crate::connection::Connection;
use crate::engine::Engine;
use crate::pubsub::PubsubFrame;
use crate::reply::Reply;

pub fn specs() -> Vec<CommandSpec> {
    vec![
        CommandSpec::new("SUBSCRIBE", Arity::AtLeast(1), subscribe),
        CommandSpec::new("PUBLISH", Arity::Exact(2), publish),
    ]
}

/// `SUBSCRIBE channel [channel ...]`. Attaches the connection's own outgoing
/// channel as a sink on each named channel and pushes the initial
/// `("subscribe", channel, count)` frame directly (spec §4.4: "the first
/// element of each sink's outgoing queue is a three-tuple... delivered
/// before any published message"). `count` is this *connection's* running
/// subscription total, not anything the hub tracks.
///
/// The dispatcher's own reply path emits nothing further for this command
/// (spec §6's streamed subscribe-reply); every subsequent frame for this
/// connection — further subscribe acks, published messages — arrives over
/// the same `conn.outgoing` channel the embedding I/O loop already drains.
fn subscribe(engine: &Engine, conn: &mut Connection, args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move {
        for channel in args {
            conn.subscriptions.insert(channel.clone());
            engine.pubsub().subscribe(channel.clone(), conn.outgoing.clone());
            let count = conn.subscriptions.len();
            let frame = PubsubFrame::Subscribe {
                channel: channel.clone(),
                count,
            };
            let _ = conn.outgoing.send(frame.into()).await;
        }
        Reply::Subscribed
    })
}

fn publish(engine: &Engine, _conn: &mut Connection, args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move {
        let channel = &args[0];
        let payload = args[1].clone();
        let delivered = engine.pubsub().publish(channel, payload);
        Reply::Integer(i64::try_from(delivered).unwrap_or(i64::MAX))
    })
}
