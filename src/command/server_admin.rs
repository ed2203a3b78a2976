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
        CommandSpec::new("PING", Arity::Exact(0), ping),
        CommandSpec::new("SELECT", Arity::Exact(1), select),
        CommandSpec::new("FLUSHDB", Arity::Exact(0), flushdb),
        CommandSpec::new("FLUSHALL", Arity::Exact(0), flushall),
        CommandSpec::new("DBSIZE", Arity::Exact(0), dbsize),
        CommandSpec::new("INFO", Arity::AtLeast(0), info),
        CommandSpec::new("TIME", Arity::Exact(0), time),
        CommandSpec::new("CONFIG", Arity::Exact(2), config),
        CommandSpec::new("MONITOR", Arity::Exact(0), monitor),
    ]
}

fn ping(_engine: &Engine, _conn: &mut Connection, _args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move { Reply::status(Bytes::from_static(b"PONG")) })
}

/// `SELECT index`: creates the database lazily if this is the first time
/// it's been touched (spec §6: "creates db lazily"), via the same
/// on-demand path every other per-database operation uses.
fn select(engine: &Engine, conn: &mut Connection, args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move {
        let mut cursor = Args::new("SELECT", args);
        let index = match cursor.int() {
            Ok(index) if index >= 0 => index,
            _ => return ReplyError::NotAnInteger.into(),
        };
        #[allow(clippy::cast_sign_loss)]
        let index = index as usize;
        engine.dbs().with(index, |_| {});
        conn.db = index;
        Reply::ok()
    })
}

fn flushdb(engine: &Engine, conn: &mut Connection, _args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move {
        engine.dbs().flush(conn.db);
        Reply::ok()
    })
}

fn flushall(engine: &Engine, _conn: &mut Connection, _args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move {
        engine.dbs().flush_all();
        Reply::ok()
    })
}

fn dbsize(engine: &Engine, conn: &mut Connection, _args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move { Reply::Integer(i64::try_from(engine.dbs().dbsize(conn.db)).unwrap_or(i64::MAX)) })
}

/// `INFO [section]`: the minimal set of fields spec §6 calls for (version,
/// memory, os), ignoring the requested section name — a real `INFO` has
/// dozens of sections this design has no data behind.
fn info(engine: &Engine, _conn: &mut Connection, _args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move {
        let body = format!(
            "# Server\r\nferrikv_version:{}\r\nos:{}\r\n# Memory\r\nused_memory:0\r\n# Keyspace\r\ndatabases:{}\r\n",
            crate::VERSION,
            std::env::consts::OS,
            engine.config().databases,
        );
        Reply::bulk(Bytes::from(body))
    })
}

fn time(_engine: &Engine, _conn: &mut Connection, _args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move {
        let now = epoch();
        Reply::Array(vec![
            Reply::bulk(Bytes::from(now.as_secs().to_string())),
            Reply::bulk(Bytes::from(now.subsec_micros().to_string())),
        ])
    })
}

/// `CONFIG GET databases`: the one knob spec §6 names explicitly. Any other
/// parameter is a syntax error rather than a silent empty array, since this
/// design doesn't emulate the rest of Redis's hundreds of config keys.
fn config(engine: &Engine, _conn: &mut Connection, args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move {
        let subcommand = args[0].to_ascii_uppercase();
        if subcommand != b"GET" || args[1].to_ascii_lowercase() != b"databases" {
            return ReplyError::SyntaxError.into();
        }
        Reply::Array(vec![
            Reply::bulk(Bytes::from_static(b"databases")),
            Reply::bulk(Bytes::from(engine.config().databases.to_string())),
        ])
    })
}

/// `MONITOR`: a stub (spec §6). Real `MONITOR` streams every command
/// executed on the server; this design doesn't implement the observer
/// fan-out, so it replies with nothing further.
fn monitor(_engine: &Engine, _conn: &mut Connection, _args: &[Bytes]) -> CommandFuture<'_> {
    Box::pin(async move { Reply::Array(Vec::new()) })
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
    async fn select_creates_the_database_lazily() {
        let engine = engine();
        let mut conn = conn();
        let args = [Bytes::from_static(b"3")];
        assert_eq!(select(&engine, &mut conn, &args).await, Reply::ok());
        assert_eq!(conn.db, 3);
        assert_eq!(engine.dbs().len(), 4);
    }

    #[tokio::test]
    async fn config_get_databases() {
        let engine = engine();
        let mut conn = conn();
        let args = [Bytes::from_static(b"GET"), Bytes::from_static(b"databases")];
        assert_eq!(
            config(&engine, &mut conn, &args).await,
            Reply::Array(vec![
                Reply::bulk(Bytes::from_static(b"databases")),
                Reply::bulk(Bytes::from_static(b"16")),
            ])
        );
    }

    #[tokio::test]
    async fn ping_replies_pong() {
        let engine = engine();
        let mut conn = conn();
        assert_eq!(ping(&engine, &mut conn, &[]).await, Reply::status(Bytes::from_static(b"PONG")));
    }
}
