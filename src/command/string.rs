use bytes::Bytes;

use crate::command::args::Args;
use crate::command::{Arity, CommandFuture, CommandSpec};
use crate::connection::Connection;
use crate::engine::Engine;
use crate::error::ReplyError;
use crate::reply::Reply;
use crate::time::epoch;

pub fn specs() -> Vec<CommandSpec> {
    vec![
        CommandSpec::new("GET", Arity::Exact(1), get),
        CommandSpec::new("SET", Arity::AtLeast(2), set),
        CommandSpec::new("MGET", Arity::AtLeast(1), mget),
        CommandSpec::new("MSET", Arity::EvenAtLeast(2), mset),
        CommandSpec::new("INCR", Arity::Exact(1), incr),
        CommandSpec::new("DECR", Arity::Exact(1), decr),
    ]
}

fn get(engine: &Engine, conn: &mut Connection, args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move {
        let key = &args[0];
        engine.dbs().with(conn.db, |db| match db.get_string(key) {
            Ok(value) => Reply::Bulk(value.cloned()),
            Err(err) => Reply::Error(err.into()),
        })
    })
}

/// `SET key value [EX seconds]`. A plain `SET` (no `EX`) clears any existing
/// deadline for `key`, per SPEC_FULL.md §6.1's resolution of the source's
/// stale-TTL behavior in favor of matching Redis.
fn set(engine: &Engine, conn: &mut Connection, args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move {
        let mut cursor = Args::new("SET", &args[2..]);
        let key = &args[0];
        let value = args[1].clone();

        let mut ex_seconds: Option<i64> = None;
        while !cursor.is_empty() {
            let keyword = match cursor.keyword() {
                Ok(keyword) => keyword,
                Err(err) => return err.into(),
            };
            match &keyword[..] {
                b"EX" => match cursor.positive_int() {
                    Ok(seconds) => ex_seconds = Some(seconds),
                    Err(err) => return err.into(),
                },
                _ => return ReplyError::SyntaxError.into(),
            }
        }

        engine.dbs().with(conn.db, |db| match ex_seconds {
            Some(seconds) => {
                let deadline = epoch().as_millis() + u128::try_from(seconds).unwrap_or(0) * 1000;
                db.setex(key, value, deadline);
            }
            None => {
                db.set(key, value);
            }
        });
        Reply::ok()
    })
}

fn mget(engine: &Engine, conn: &mut Connection, args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move {
        engine.dbs().with(conn.db, |db| {
            Reply::Array(
                args.iter()
                    .map(|key| Reply::Bulk(db.get_string(key).ok().flatten().cloned()))
                    .collect(),
            )
        })
    })
}

fn mset(engine: &Engine, conn: &mut Connection, args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move {
        engine.dbs().with(conn.db, |db| {
            for pair in args.chunks_exact(2) {
                db.set(&pair[0], pair[1].clone());
            }
        });
        Reply::ok()
    })
}

fn incr(engine: &Engine, conn: &mut Connection, args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move { increment(engine, conn, &args[0], 1) })
}

fn decr(engine: &Engine, conn: &mut Connection, args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move { increment(engine, conn, &args[0], -1) })
}

/// Shared `INCR`/`DECR` body. Folded under the per-database lock rather than
/// a separate global mutex (spec §5, §9's explicit bug-fix directive), so
/// different databases never serialize on each other and a concurrent `SET`
/// on the same key can't race with the read-modify-write.
fn increment(engine: &Engine, conn: &Connection, key: &[u8], delta: i64) -> Reply {
    engine.dbs().with(conn.db, |db| {
        let current = match db.get_string(key) {
            Ok(Some(bytes)) => {
                match std::str::from_utf8(bytes).ok().and_then(|s| s.parse::<i64>().ok()) {
                    Some(n) => n,
                    None => return ReplyError::NotAnInteger.into(),
                }
            }
            Ok(None) => 0,
            Err(err) => return Reply::Error(err.into()),
        };
        let Some(next) = current.checked_add(delta) else {
            return ReplyError::NotAnInteger.into();
        };
        db.set(key, next);
        Reply::Integer(next)
    })
}
