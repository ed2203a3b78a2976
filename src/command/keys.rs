use bytes::Bytes;

use crate::command::args::Args;
use crate::command::{Arity, CommandFuture, CommandSpec};
use crate::connection::Connection;
use crate::engine::Engine;
use crate::error::ReplyError;
use crate::glob;
use crate::reply::Reply;
use crate::time::epoch;

pub fn specs() -> Vec<CommandSpec> {
    vec![
        CommandSpec::new("DEL", Arity::AtLeast(1), del),
        CommandSpec::new("EXISTS", Arity::AtLeast(1), exists),
        CommandSpec::new("EXPIRE", Arity::Exact(2), expire),
        CommandSpec::new("TTL", Arity::Exact(1), ttl),
        CommandSpec::new("KEYS", Arity::Exact(1), keys),
        CommandSpec::new("SCAN", Arity::AtLeast(1), scan),
        CommandSpec::new("TYPE", Arity::Exact(1), type_),
        CommandSpec::new("RENAME", Arity::Exact(2), rename),
    ]
}

fn del(engine: &Engine, conn: &mut Connection, args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move {
        let removed = engine.dbs().with(conn.db, |db| {
            args.iter().filter(|key| db.remove(key).is_some()).count()
        });
        Reply::Integer(i64::try_from(removed).unwrap_or(i64::MAX))
    })
}

fn exists(engine: &Engine, conn: &mut Connection, args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move {
        let count = engine
            .dbs()
            .with(conn.db, |db| args.iter().filter(|key| db.exists(key)).count());
        Reply::Integer(i64::try_from(count).unwrap_or(i64::MAX))
    })
}

fn expire(engine: &Engine, conn: &mut Connection, args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move {
        let mut cursor = Args::new("EXPIRE", &args[1..]);
        let seconds = match cursor.int() {
            Ok(seconds) => seconds,
            Err(err) => return err.into(),
        };
        let key = &args[0];
        let deadline = epoch().as_millis().saturating_add_signed(i128::from(seconds) * 1000);
        let tracked = engine.dbs().with(conn.db, |db| db.expire(key, deadline));
        tracked.into()
    })
}

fn ttl(engine: &Engine, conn: &mut Connection, args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move {
        let key = &args[0];
        let reply = engine.dbs().with(conn.db, |db| {
            if !db.exists(key) {
                return -2;
            }
            match db.ttl(key) {
                Some(millis) => i64::try_from(millis.div_ceil(1000)).unwrap_or(i64::MAX),
                None => -1,
            }
        });
        Reply::Integer(reply)
    })
}

/// `KEYS pattern`: every live key matching the glob pattern (spec §6). An
/// unsatisfiable pattern (unterminated escape, empty class) is a client
/// error here, unlike `SCAN`'s silent empty result.
fn keys(engine: &Engine, conn: &mut Connection, args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move {
        let pattern = &args[0];
        if glob::validate(pattern).is_err() {
            return ReplyError::InvalidPattern.into();
        }
        engine.dbs().with(conn.db, |db| {
            Reply::Array(
                db.keys()
                    .filter(|key| glob::matches(key, pattern))
                    .map(|key| Reply::bulk(key.clone()))
                    .collect(),
            )
        })
    })
}

/// `SCAN cursor [MATCH pattern] [COUNT n]`: a single-shot stub per spec §9's
/// open question — not a real cursor. Every live key is returned in one
/// call and the returned cursor is always `"0"`; `COUNT` is accepted and
/// ignored. An invalid `MATCH` pattern yields no matches rather than an
/// error (spec §6's glob-pattern section distinguishes `KEYS` and `SCAN`
/// here explicitly).
fn scan(engine: &Engine, conn: &mut Connection, args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move {
        let mut cursor = Args::new("SCAN", &args[1..]);
        let mut pattern: Option<Bytes> = None;
        while !cursor.is_empty() {
            let keyword = match cursor.keyword() {
                Ok(keyword) => keyword,
                Err(err) => return err.into(),
            };
            match &keyword[..] {
                b"MATCH" => match cursor.bytes() {
                    Ok(p) => pattern = Some(p),
                    Err(err) => return err.into(),
                },
                b"COUNT" => {
                    if let Err(err) = cursor.positive_int() {
                        return err.into();
                    }
                }
                _ => return ReplyError::SyntaxError.into(),
            }
        }

        let matches_pattern = |key: &Bytes| match &pattern {
            Some(p) => glob::validate(p).is_ok() && glob::matches(key, p),
            None => true,
        };

        let found = engine.dbs().with(conn.db, |db| {
            db.keys()
                .filter(|key| matches_pattern(key))
                .map(|key| Reply::bulk(key.clone()))
                .collect::<Vec<_>>()
        });

        Reply::Array(vec![Reply::status(Bytes::from_static(b"0")), Reply::Array(found)])
    })
}

fn type_(engine: &Engine, conn: &mut Connection, args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move {
        let key = &args[0];
        let name = engine
            .dbs()
            .with(conn.db, |db| db.get(key).map_or("none", |value| value.type_name()));
        Reply::status(Bytes::from_static(name.as_bytes()))
    })
}

fn rename(engine: &Engine, conn: &mut Connection, args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move {
        let key = &args[0];
        let new_key = &args[1];
        engine.dbs().with(conn.db, |db| {
            // Read the TTL before `remove`, which clears `key`'s entry in the
            // expiration map as a side effect of calling `persist` internally.
            let remaining = db.ttl(key);
            let Some(value) = db.remove(key) else {
                return ReplyError::KeyNotFound.into();
            };
            match remaining {
                Some(millis) => {
                    let deadline = epoch().as_millis() + millis;
                    db.setex(new_key, value, deadline);
                }
                None => {
                    db.set(new_key, value);
                }
            }
            Reply::ok()
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
    async fn del_counts_every_removed_key() {
        let engine = engine();
        let mut conn = conn();
        engine.dbs().with(0, |db| {
            db.set(b"a", Bytes::from_static(b"1"));
            db.set(b"b", Bytes::from_static(b"2"));
        });
        let args = [Bytes::from_static(b"a"), Bytes::from_static(b"b"), Bytes::from_static(b"c")];
        assert_eq!(del(&engine, &mut conn, &args).await, Reply::Integer(2));
    }

    #[tokio::test]
    async fn ttl_reports_missing_none_and_live() {
        let engine = engine();
        let mut conn = conn();
        engine.dbs().with(0, |db| db.set(b"a", Bytes::from_static(b"1")));
        let args = [Bytes::from_static(b"a")];
        assert_eq!(ttl(&engine, &mut conn, &args).await, Reply::Integer(-1));

        let args = [Bytes::from_static(b"missing")];
        assert_eq!(ttl(&engine, &mut conn, &args).await, Reply::Integer(-2));
    }

    #[tokio::test]
    async fn keys_matches_glob() {
        let engine = engine();
        let mut conn = conn();
        engine.dbs().with(0, |db| {
            db.set(b"foo", Bytes::from_static(b"1"));
            db.set(b"bar", Bytes::from_static(b"1"));
        });
        let args = [Bytes::from_static(b"f*")];
        let Reply::Array(found) = keys(&engine, &mut conn, &args).await else {
            panic!("expected array");
        };
        assert_eq!(found, vec![Reply::bulk(Bytes::from_static(b"foo"))]);
    }

    #[tokio::test]
    async fn rename_moves_the_value() {
        let engine = engine();
        let mut conn = conn();
        engine.dbs().with(0, |db| db.set(b"a", Bytes::from_static(b"1")));
        let args = [Bytes::from_static(b"a"), Bytes::from_static(b"b")];
        assert_eq!(rename(&engine, &mut conn, &args).await, Reply::ok());
        let args = [Bytes::from_static(b"a")];
        assert_eq!(exists(&engine, &mut conn, &args).await, Reply::Integer(0));
    }

    #[tokio::test]
    async fn rename_carries_the_ttl_to_the_new_key() {
        let engine = engine();
        let mut conn = conn();
        engine.dbs().with(0, |db| db.set(b"a", Bytes::from_static(b"1")));
        let args = [Bytes::from_static(b"a"), Bytes::from_static(b"60")];
        expire(&engine, &mut conn, &args).await;

        let args = [Bytes::from_static(b"a"), Bytes::from_static(b"b")];
        assert_eq!(rename(&engine, &mut conn, &args).await, Reply::ok());

        let args = [Bytes::from_static(b"b")];
        let Reply::Integer(remaining) = ttl(&engine, &mut conn, &args).await else {
            panic!("expected integer");
        };
        assert!((1..=60).contains(&remaining), "expected a live ttl, got {remaining}");
    }

    #[tokio::test]
    async fn rename_missing_key_is_an_error() {
        let engine = engine();
        let mut conn = conn();
        let args = [Bytes::from_static(b"missing"), Bytes::from_static(b"b")];
        assert_eq!(
            rename(&engine, &mut conn, &args).await,
            Reply::Error(ReplyError::KeyNotFound)
        );
    }
}
