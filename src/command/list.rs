use bytes::Bytes;

use crate::blocking::block_pop;
use crate::command::args::Args;
use crate::command::{Arity, CommandFuture, CommandSpec};
use crate::connection::Connection;
use crate::db::Edge;
use crate::engine::Engine;
use crate::error::ReplyError;
use crate::reply::Reply;

pub fn specs() -> Vec<CommandSpec> {
    vec![
        CommandSpec::new("LPUSH", Arity::AtLeast(2), lpush),
        CommandSpec::new("RPUSH", Arity::AtLeast(2), rpush),
        CommandSpec::new("LRANGE", Arity::Exact(3), lrange),
        CommandSpec::new("LINDEX", Arity::Exact(2), lindex),
        CommandSpec::new("LLEN", Arity::Exact(1), llen),
        CommandSpec::new("LSET", Arity::Exact(3), lset),
        CommandSpec::new("LREM", Arity::Exact(3), lrem),
        CommandSpec::new("BLPOP", Arity::AtLeast(2), blpop),
        CommandSpec::new("BRPOP", Arity::AtLeast(2), brpop),
    ]
}

fn lpush(engine: &Engine, conn: &mut Connection, args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move { push(engine, conn, args, Edge::Left) })
}

fn rpush(engine: &Engine, conn: &mut Connection, args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move { push(engine, conn, args, Edge::Right) })
}

/// Shared `LPUSH`/`RPUSH` body. Wakes every task waiting on a push into this
/// database's lists (spec §4.1's notification channel), since a waiting
/// `BLPOP`/`BRPOP` might be sitting on exactly this key.
fn push(engine: &Engine, conn: &Connection, args: &[Bytes], edge: Edge) -> Reply {
    let key = &args[0];
    let values = &args[1..];
    let len = engine.dbs().with_then_notify(conn.db, |db| {
        let list = match db.list_or_default(key) {
            Ok(list) => list,
            Err(err) => return Err(err),
        };
        for value in values {
            match edge {
                Edge::Left => list.push_front(value.clone()),
                Edge::Right => list.push_back(value.clone()),
            }
        }
        Ok(list.len())
    });
    match len {
        Ok(len) => Reply::Integer(i64::try_from(len).unwrap_or(i64::MAX)),
        Err(err) => Reply::Error(err.into()),
    }
}

/// Resolves a possibly-negative `[start, stop]` index range against `len`,
/// clamping both ends into bounds (spec §4.1: "negative i counts from the
/// tail"). Returns `None` for an empty resolved range.
fn clamp_range(start: i64, stop: i64, len: usize) -> Option<(usize, usize)> {
    if len == 0 {
        return None;
    }
    let len = i64::try_from(len).unwrap_or(i64::MAX);
    let resolve = |index: i64| if index < 0 { index + len } else { index };
    let start = resolve(start).max(0);
    let stop = resolve(stop).min(len - 1);
    if start > stop || start >= len {
        return None;
    }
    #[allow(clippy::cast_sign_loss)]
    Some((start as usize, stop as usize))
}

fn lrange(engine: &Engine, conn: &mut Connection, args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move {
        let key = &args[0];
        let mut cursor = Args::new("LRANGE", &args[1..]);
        let start = match cursor.int() {
            Ok(v) => v,
            Err(err) => return err.into(),
        };
        let stop = match cursor.int() {
            Ok(v) => v,
            Err(err) => return err.into(),
        };
        engine.dbs().with(conn.db, |db| match db.get_list(key) {
            Ok(Some(list)) => {
                let entries = match clamp_range(start, stop, list.len()) {
                    Some((start, stop)) => list
                        .iter()
                        .skip(start)
                        .take(stop - start + 1)
                        .map(|value| Reply::bulk(value.clone()))
                        .collect(),
                    None => Vec::new(),
                };
                Reply::Array(entries)
            }
            Ok(None) => Reply::Array(Vec::new()),
            Err(err) => Reply::Error(err.into()),
        })
    })
}

fn lindex(engine: &Engine, conn: &mut Connection, args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move {
        let key = &args[0];
        let mut cursor = Args::new("LINDEX", &args[1..]);
        let index = match cursor.int() {
            Ok(v) => v,
            Err(err) => return err.into(),
        };
        engine.dbs().with(conn.db, |db| match db.get_list(key) {
            Ok(Some(list)) => Reply::Bulk(resolve_index(index, list.len()).and_then(|i| list.get(i)).cloned()),
            Ok(None) => Reply::nil(),
            Err(err) => Reply::Error(err.into()),
        })
    })
}

fn llen(engine: &Engine, conn: &mut Connection, args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move {
        let key = &args[0];
        engine.dbs().with(conn.db, |db| match db.get_list(key) {
            Ok(Some(list)) => Reply::Integer(i64::try_from(list.len()).unwrap_or(i64::MAX)),
            Ok(None) => Reply::Integer(0),
            Err(err) => Reply::Error(err.into()),
        })
    })
}

fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let resolved = if index < 0 { index + len } else { index };
    if resolved < 0 || resolved >= len {
        None
    } else {
        #[allow(clippy::cast_sign_loss)]
        Some(resolved as usize)
    }
}

/// `LSET key index value`: writes `index` (negative counting from the
/// tail), silently ignoring an out-of-range index (spec §4.1: "silently
/// ignores out-of-range").
fn lset(engine: &Engine, conn: &mut Connection, args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move {
        let key = &args[0];
        let mut cursor = Args::new("LSET", &args[1..2]);
        let index = match cursor.int() {
            Ok(v) => v,
            Err(err) => return err.into(),
        };
        let value = args[2].clone();
        engine.dbs().with(conn.db, |db| match db.mut_list(key) {
            Ok(Some(list)) => {
                if let Some(i) = resolve_index(index, list.len()) {
                    list[i] = value;
                }
                Reply::ok()
            }
            Ok(None) => Reply::ok(),
            Err(err) => Reply::Error(err.into()),
        })
    })
}

/// `LREM key count value`: spec §6.1's resolution of the open question —
/// full Redis sign/magnitude semantics rather than the source's
/// sign-ignoring "remove all" behavior. `count > 0` removes the first
/// `count` matches scanning head-to-tail, `count < 0` removes the last
/// `|count|` scanning tail-to-head, `count == 0` removes every match.
fn lrem(engine: &Engine, conn: &mut Connection, args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move {
        let key = &args[0];
        let mut cursor = Args::new("LREM", &args[1..2]);
        let count = match cursor.int() {
            Ok(v) => v,
            Err(err) => return err.into(),
        };
        let value = &args[2];
        engine.dbs().with(conn.db, |db| match db.mut_list(key) {
            Ok(Some(list)) => {
                let removed = if count == 0 {
                    let before = list.len();
                    list.retain(|entry| entry != value);
                    before - list.len()
                } else if count > 0 {
                    remove_n(list, value, count.unsigned_abs(), true)
                } else {
                    remove_n(list, value, count.unsigned_abs(), false)
                };
                Reply::Integer(i64::try_from(removed).unwrap_or(i64::MAX))
            }
            Ok(None) => Reply::Integer(0),
            Err(err) => Reply::Error(err.into()),
        })
    })
}

/// Removes up to `max` occurrences of `value`, scanning head-to-tail or
/// tail-to-head, preserving the relative order of the entries that remain.
fn remove_n(list: &mut crate::db::List, value: &Bytes, max: u64, head_to_tail: bool) -> usize {
    let mut removed = 0u64;
    let mut kept = std::collections::VecDeque::with_capacity(list.len());
    let drained: Vec<Bytes> = list.drain(..).collect();
    let entries: Box<dyn Iterator<Item = Bytes>> = if head_to_tail {
        Box::new(drained.into_iter())
    } else {
        Box::new(drained.into_iter().rev())
    };
    for entry in entries {
        if removed < max && &entry == value {
            removed += 1;
        } else if head_to_tail {
            kept.push_back(entry);
        } else {
            kept.push_front(entry);
        }
    }
    *list = kept;
    usize::try_from(removed).unwrap_or(usize::MAX)
}

fn blpop(engine: &Engine, conn: &mut Connection, args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move { pop(engine, conn, args, Edge::Left).await })
}

fn brpop(engine: &Engine, conn: &mut Connection, args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move { pop(engine, conn, args, Edge::Right).await })
}

async fn pop(engine: &Engine, conn: &Connection, args: &[Bytes], edge: Edge) -> Reply {
    let keys = &args[..args.len() - 1];
    let mut cursor = Args::new("BLPOP", &args[args.len() - 1..]);
    let timeout = match cursor.positive_int() {
        Ok(v) => v,
        Err(_) => return ReplyError::ParseTimeout.into(),
    };
    #[allow(clippy::cast_sign_loss)]
    let timeout_secs = timeout as u64;

    match block_pop(engine.dbs(), conn.db, keys, edge, timeout_secs).await {
        Ok(Some((key, value))) => Reply::Array(vec![Reply::bulk(key), Reply::bulk(value)]),
        Ok(None) => Reply::nil(),
        Err(err) => err.into(),
    }
}
