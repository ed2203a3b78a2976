use bytes::Bytes;

use crate::command::args::Args;
use crate::command::{Arity, CommandFuture, CommandSpec};
use crate::connection::Connection;
use crate::engine::Engine;
use crate::reply::Reply;

pub fn specs() -> Vec<CommandSpec> {
    vec![
        CommandSpec::new("ZADD", Arity::AtLeast(3), zadd),
        CommandSpec::new("ZRANGE", Arity::Exact(3), zrange),
        CommandSpec::new("ZRANGEBYSCORE", Arity::Exact(3), zrangebyscore),
        CommandSpec::new("ZREM", Arity::AtLeast(2), zrem),
        CommandSpec::new("ZREMRANGEBYSCORE", Arity::Exact(3), zremrangebyscore),
        CommandSpec::new("ZCARD", Arity::Exact(1), zcard),
        CommandSpec::new("ZSCORE", Arity::Exact(2), zscore),
    ]
}

/// `ZADD key score member [score member ...]`. Integer scores only (spec
/// §6: "integer scores only").
fn zadd(engine: &Engine, conn: &mut Connection, args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move {
        if args[1..].len() % 2 != 0 {
            return crate::error::ReplyError::WrongArgCount("ZADD".into()).into();
        }
        let key = &args[0];
        engine.dbs().with(conn.db, |db| {
            let set = match db.sorted_set_or_default(key) {
                Ok(set) => set,
                Err(err) => return Reply::Error(err.into()),
            };
            let mut added = 0i64;
            for pair in args[1..].chunks_exact(2) {
                let mut cursor = Args::new("ZADD", &pair[..1]);
                let score = match cursor.int() {
                    Ok(score) => score,
                    Err(err) => return err.into(),
                };
                if set.add(score, pair[1].clone()) {
                    added += 1;
                }
            }
            Reply::Integer(added)
        })
    })
}

fn zrange(engine: &Engine, conn: &mut Connection, args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move {
        let key = &args[0];
        let mut cursor = Args::new("ZRANGE", &args[1..]);
        let start = match cursor.int() {
            Ok(v) => v,
            Err(err) => return err.into(),
        };
        let stop = match cursor.int() {
            Ok(v) => v,
            Err(err) => return err.into(),
        };
        engine.dbs().with(conn.db, |db| match db.get_sorted_set(key) {
            Ok(Some(set)) => Reply::Array(
                set.range_by_rank(start, stop)
                    .into_iter()
                    .map(|(member, _)| Reply::bulk(member))
                    .collect(),
            ),
            Ok(None) => Reply::Array(Vec::new()),
            Err(err) => Reply::Error(err.into()),
        })
    })
}

fn zrangebyscore(engine: &Engine, conn: &mut Connection, args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move {
        let key = &args[0];
        let mut cursor = Args::new("ZRANGEBYSCORE", &args[1..]);
        let min = match cursor.int() {
            Ok(v) => v,
            Err(err) => return err.into(),
        };
        let max = match cursor.int() {
            Ok(v) => v,
            Err(err) => return err.into(),
        };
        engine.dbs().with(conn.db, |db| match db.get_sorted_set(key) {
            Ok(Some(set)) => Reply::Array(
                set.range_by_score(min, max)
                    .into_iter()
                    .map(|(member, _)| Reply::bulk(member))
                    .collect(),
            ),
            Ok(None) => Reply::Array(Vec::new()),
            Err(err) => Reply::Error(err.into()),
        })
    })
}

fn zrem(engine: &Engine, conn: &mut Connection, args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move {
        let key = &args[0];
        let members = &args[1..];
        engine.dbs().with(conn.db, |db| match db.mut_sorted_set(key) {
            Ok(Some(set)) => {
                let removed = members.iter().filter(|member| set.remove(member)).count();
                Reply::Integer(i64::try_from(removed).unwrap_or(i64::MAX))
            }
            Ok(None) => Reply::Integer(0),
            Err(err) => Reply::Error(err.into()),
        })
    })
}

fn zremrangebyscore(engine: &Engine, conn: &mut Connection, args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move {
        let key = &args[0];
        let mut cursor = Args::new("ZREMRANGEBYSCORE", &args[1..]);
        let min = match cursor.int() {
            Ok(v) => v,
            Err(err) => return err.into(),
        };
        let max = match cursor.int() {
            Ok(v) => v,
            Err(err) => return err.into(),
        };
        engine.dbs().with(conn.db, |db| match db.mut_sorted_set(key) {
            Ok(Some(set)) => Reply::Integer(i64::try_from(set.remove_range_by_score(min, max)).unwrap_or(i64::MAX)),
            Ok(None) => Reply::Integer(0),
            Err(err) => Reply::Error(err.into()),
        })
    })
}

fn zcard(engine: &Engine, conn: &mut Connection, args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move {
        let key = &args[0];
        engine.dbs().with(conn.db, |db| match db.get_sorted_set(key) {
            Ok(Some(set)) => Reply::Integer(i64::try_from(set.card()).unwrap_or(i64::MAX)),
            Ok(None) => Reply::Integer(0),
            Err(err) => Reply::Error(err.into()),
        })
    })
}

fn zscore(engine: &Engine, conn: &mut Connection, args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move {
        let key = &args[0];
        let member = &args[1];
        engine.dbs().with(conn.db, |db| match db.get_sorted_set(key) {
            Ok(Some(set)) => Reply::Bulk(set.score(member).map(|score| Bytes::from(score.to_string()))),
            Ok(None) => Reply::nil(),
            Err(err) => Reply::Error(err.into()),
        })
    })
}
