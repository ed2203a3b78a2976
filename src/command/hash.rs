use bytes::Bytes;

use crate::command::{Arity, CommandFuture, CommandSpec};
use crate::connection::Connection;
use crate::engine::Engine;
use crate::reply::Reply;

pub fn specs() -> Vec<CommandSpec> {
    vec![
        CommandSpec::new("HGET", Arity::Exact(2), hget),
        CommandSpec::new("HSET", Arity::AtLeast(3), hset),
        CommandSpec::new("HGETALL", Arity::Exact(1), hgetall),
        CommandSpec::new("HLEN", Arity::Exact(1), hlen),
        CommandSpec::new("HMSET", Arity::AtLeast(3), hset),
    ]
}

fn hget(engine: &Engine, conn: &mut Connection, args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move {
        let key = &args[0];
        let field = &args[1];
        engine.dbs().with(conn.db, |db| match db.get_hash(key) {
            Ok(Some(hash)) => Reply::Bulk(hash.get(field.as_ref()).cloned()),
            Ok(None) => Reply::nil(),
            Err(err) => Reply::Error(err.into()),
        })
    })
}

/// `HSET key field value [field value ...]`. Also the implementation of
/// `HMSET`, which shares the same multi-field reply semantics — grounded on
/// `examples/original_source/keys.go` and the teacher's `command/hash.rs`
/// (SPEC_FULL.md §6).
fn hset(engine: &Engine, conn: &mut Connection, args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move {
        if args[1..].len() % 2 != 0 {
            return crate::error::ReplyError::WrongArgCount("HSET".into()).into();
        }
        let key = &args[0];
        engine.dbs().with(conn.db, |db| {
            let hash = match db.hash_or_default(key) {
                Ok(hash) => hash,
                Err(err) => return Reply::Error(err.into()),
            };
            let mut added = 0i64;
            for pair in args[1..].chunks_exact(2) {
                if hash.insert(pair[0].clone(), pair[1].clone()).is_none() {
                    added += 1;
                }
            }
            Reply::Integer(added)
        })
    })
}

/// `HGETALL key`: a flat alternating `[field, value, field, value, ...]`
/// array, matching the teacher's `command/hash.rs` reply shape (SPEC_FULL.md
/// §6).
fn hgetall(engine: &Engine, conn: &mut Connection, args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move {
        let key = &args[0];
        engine.dbs().with(conn.db, |db| match db.get_hash(key) {
            Ok(Some(hash)) => Reply::Array(
                hash.iter()
                    .flat_map(|(field, value)| [Reply::bulk(field.clone()), Reply::bulk(value.clone())])
                    .collect(),
            ),
            Ok(None) => Reply::Array(Vec::new()),
            Err(err) => Reply::Error(err.into()),
        })
    })
}

fn hlen(engine: &Engine, conn: &mut Connection, args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move {
        let key = &args[0];
        engine.dbs().with(conn.db, |db| match db.get_hash(key) {
            Ok(Some(hash)) => Reply::Integer(i64::try_from(hash.len()).unwrap_or(i64::MAX)),
            Ok(None) => Reply::Integer(0),
            Err(err) => Reply::Error(err.into()),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn engine() -> std::sync::Arc<Engine> {
        Engine::new(Config::default())
    }

    fn conn() -> Connection {
        let (tx, _rx) = tokio::sync::mpsc::channel(8);
        Connection::new(tx)
    }

    #[tokio::test]
    async fn hset_reports_new_fields_only() {
        let engine = engine();
        let mut conn = conn();
        let args = [
            Bytes::from_static(b"h"),
            Bytes::from_static(b"f1"),
            Bytes::from_static(b"v1"),
        ];
        assert_eq!(hset(&engine, &mut conn, &args).await, Reply::Integer(1));
        let args = [
            Bytes::from_static(b"h"),
            Bytes::from_static(b"f1"),
            Bytes::from_static(b"v2"),
        ];
        assert_eq!(hset(&engine, &mut conn, &args).await, Reply::Integer(0));
        let args = [Bytes::from_static(b"h"), Bytes::from_static(b"f1")];
        assert_eq!(
            hget(&engine, &mut conn, &args).await,
            Reply::bulk(Bytes::from_static(b"v2"))
        );
        let args = [Bytes::from_static(b"h")];
        assert_eq!(hlen(&engine, &mut conn, &args).await, Reply::Integer(1));
    }

    #[tokio::test]
    async fn hgetall_is_empty_for_a_missing_key() {
        let engine = engine();
        let mut conn = conn();
        let args = [Bytes::from_static(b"missing")];
        assert_eq!(hgetall(&engine, &mut conn, &args).await, Reply::Array(Vec::new()));
    }
}
