//! End-to-end coverage of the scenarios and invariants this crate's design
//! document calls out, driven through the same `Registry`/`dispatch` path a
//! real connection uses rather than calling command functions directly.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use ferrikv::{Config, Connection, Engine, Reply, Registry};

fn registry() -> Arc<Registry> {
    Arc::new(Registry::new())
}

fn engine() -> Arc<Engine> {
    Engine::new(Config::default())
}

fn conn() -> Connection {
    let (tx, _rx) = tokio::sync::mpsc::channel(8);
    Connection::new(tx)
}

async fn run(registry: &Registry, engine: &Engine, conn: &mut Connection, name: &str, args: &[&str]) -> Reply {
    let args: Vec<Bytes> = args.iter().map(|s| Bytes::copy_from_slice(s.as_bytes())).collect();
    ferrikv::command::dispatch(registry, engine, conn, name, &args).await
}

fn bulk(s: &str) -> Reply {
    Reply::bulk(Bytes::copy_from_slice(s.as_bytes()))
}

#[tokio::test]
async fn s1_strings() {
    let registry = registry();
    let engine = engine();
    let mut conn = conn();

    assert_eq!(run(&registry, &engine, &mut conn, "SET", &["a", "1"]).await, Reply::ok());
    assert_eq!(run(&registry, &engine, &mut conn, "INCR", &["a"]).await, Reply::Integer(2));
    assert_eq!(run(&registry, &engine, &mut conn, "INCR", &["a"]).await, Reply::Integer(3));
    assert_eq!(run(&registry, &engine, &mut conn, "GET", &["a"]).await, bulk("3"));
    assert_eq!(run(&registry, &engine, &mut conn, "DEL", &["a"]).await, Reply::Integer(1));
    assert_eq!(run(&registry, &engine, &mut conn, "GET", &["a"]).await, Reply::nil());
}

#[tokio::test]
async fn s2_hashes() {
    let registry = registry();
    let engine = engine();
    let mut conn = conn();

    assert_eq!(run(&registry, &engine, &mut conn, "HSET", &["h", "f1", "v1"]).await, Reply::Integer(1));
    assert_eq!(run(&registry, &engine, &mut conn, "HSET", &["h", "f1", "v2"]).await, Reply::Integer(0));
    assert_eq!(run(&registry, &engine, &mut conn, "HGET", &["h", "f1"]).await, bulk("v2"));
    assert_eq!(run(&registry, &engine, &mut conn, "HLEN", &["h"]).await, Reply::Integer(1));
}

#[tokio::test]
async fn s3_lists() {
    let registry = registry();
    let engine = engine();
    let mut conn = conn();

    assert_eq!(run(&registry, &engine, &mut conn, "RPUSH", &["l", "a"]).await, Reply::Integer(1));
    assert_eq!(run(&registry, &engine, &mut conn, "RPUSH", &["l", "b", "c"]).await, Reply::Integer(3));
    assert_eq!(
        run(&registry, &engine, &mut conn, "LRANGE", &["l", "0", "-1"]).await,
        Reply::Array(vec![bulk("a"), bulk("b"), bulk("c")])
    );
    assert_eq!(run(&registry, &engine, &mut conn, "LINDEX", &["l", "-1"]).await, bulk("c"));
    assert_eq!(run(&registry, &engine, &mut conn, "LREM", &["l", "0", "b"]).await, Reply::Integer(1));
    assert_eq!(
        run(&registry, &engine, &mut conn, "LRANGE", &["l", "0", "-1"]).await,
        Reply::Array(vec![bulk("a"), bulk("c")])
    );
}

#[tokio::test]
async fn s4_blocking() {
    let registry = registry();
    let engine = engine();

    let waiter_registry = Arc::clone(&registry);
    let waiter_engine = Arc::clone(&engine);
    let waiter = tokio::spawn(async move {
        let mut a = conn();
        run(&waiter_registry, &waiter_engine, &mut a, "BRPOP", &["q", "5"]).await
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    let mut b = conn();
    assert_eq!(run(&registry, &engine, &mut b, "RPUSH", &["q", "v"]).await, Reply::Integer(1));

    let result = tokio::time::timeout(Duration::from_secs(1), waiter).await.expect("did not wake in time").unwrap();
    assert_eq!(result, Reply::Array(vec![bulk("q"), bulk("v")]));
}

#[tokio::test]
async fn s5_pubsub() {
    let registry = registry();
    let engine = engine();

    let (tx_a, mut rx_a) = tokio::sync::mpsc::channel(8);
    let mut a = Connection::new(tx_a);
    run(&registry, &engine, &mut a, "SUBSCRIBE", &["ch"]).await;
    assert_eq!(
        rx_a.recv().await,
        Some(Reply::Array(vec![bulk("subscribe"), bulk("ch"), Reply::Integer(1)]))
    );

    let mut b = conn();
    assert_eq!(run(&registry, &engine, &mut b, "PUBLISH", &["ch", "hello"]).await, Reply::Integer(1));
    assert_eq!(
        rx_a.recv().await,
        Some(Reply::Array(vec![bulk("message"), bulk("ch"), bulk("hello")]))
    );

    assert_eq!(run(&registry, &engine, &mut b, "PUBLISH", &["other", "x"]).await, Reply::Integer(0));
}

#[tokio::test(start_paused = true)]
async fn s6_expiration() {
    let registry = registry();
    let engine = engine();
    let mut conn = conn();

    assert_eq!(run(&registry, &engine, &mut conn, "SET", &["k", "v", "EX", "1"]).await, Reply::ok());
    tokio::time::advance(Duration::from_secs(3)).await;
    assert_eq!(run(&registry, &engine, &mut conn, "GET", &["k"]).await, Reply::nil());
    assert_eq!(run(&registry, &engine, &mut conn, "TTL", &["k"]).await, Reply::Integer(-2));
}

#[tokio::test]
async fn s7_multi_db() {
    let registry = registry();
    let engine = engine();
    let mut conn = conn();

    run(&registry, &engine, &mut conn, "SELECT", &["0"]).await;
    run(&registry, &engine, &mut conn, "SET", &["a", "1"]).await;
    run(&registry, &engine, &mut conn, "SELECT", &["1"]).await;
    assert_eq!(run(&registry, &engine, &mut conn, "GET", &["a"]).await, Reply::nil());
    run(&registry, &engine, &mut conn, "SELECT", &["0"]).await;
    assert_eq!(run(&registry, &engine, &mut conn, "GET", &["a"]).await, bulk("1"));

    run(&registry, &engine, &mut conn, "SELECT", &["1"]).await;
    run(&registry, &engine, &mut conn, "FLUSHDB", &[]).await;
    run(&registry, &engine, &mut conn, "SELECT", &["0"]).await;
    assert_eq!(run(&registry, &engine, &mut conn, "GET", &["a"]).await, bulk("1"));
}

/// Invariant 4: INCR/DECR are linearizable under concurrent access to the
/// same key — the final value equals the initial value plus (#INCR - #DECR),
/// never less (a race would under-count).
#[tokio::test]
async fn incr_decr_are_linearizable_under_concurrency() {
    let engine = engine();
    let mut handles = Vec::new();
    for _ in 0..20 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            let registry = Arc::new(Registry::new());
            let mut conn = conn();
            run(&registry, &engine, &mut conn, "INCR", &["counter"]).await;
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
    let registry = registry();
    let mut conn = conn();
    assert_eq!(run(&registry, &engine, &mut conn, "GET", &["counter"]).await, bulk("20"));
}

/// Invariant 11: FLUSHDB is scoped to the connection's selected database;
/// FLUSHALL clears every database.
#[tokio::test]
async fn flushall_clears_every_database() {
    let registry = registry();
    let engine = engine();
    let mut conn = conn();

    run(&registry, &engine, &mut conn, "SELECT", &["0"]).await;
    run(&registry, &engine, &mut conn, "SET", &["a", "1"]).await;
    run(&registry, &engine, &mut conn, "SELECT", &["1"]).await;
    run(&registry, &engine, &mut conn, "SET", &["a", "1"]).await;

    run(&registry, &engine, &mut conn, "FLUSHALL", &[]).await;
    assert_eq!(run(&registry, &engine, &mut conn, "GET", &["a"]).await, Reply::nil());
    run(&registry, &engine, &mut conn, "SELECT", &["0"]).await;
    assert_eq!(run(&registry, &engine, &mut conn, "GET", &["a"]).await, Reply::nil());
}

/// Invariant 1: a live key holds exactly one shape; an operation against the
/// wrong shape returns `WRONGTYPE` rather than silently coercing.
#[tokio::test]
async fn a_key_holds_one_shape_at_a_time() {
    let registry = registry();
    let engine = engine();
    let mut conn = conn();

    run(&registry, &engine, &mut conn, "SET", &["k", "v"]).await;
    let reply = run(&registry, &engine, &mut conn, "HSET", &["k", "f", "v"]).await;
    assert!(matches!(reply, Reply::Error(ferrikv::ReplyError::WrongType)));
}

/// Invariant 6 and 7: `ZADD`/`ZRANGE` ordering and the new-vs-update reply.
#[tokio::test]
async fn zadd_orders_by_score_and_reports_new_vs_update() {
    let registry = registry();
    let engine = engine();
    let mut conn = conn();

    run(&registry, &engine, &mut conn, "ZADD", &["z", "3", "x"]).await;
    run(&registry, &engine, &mut conn, "ZADD", &["z", "1", "y"]).await;
    run(&registry, &engine, &mut conn, "ZADD", &["z", "2", "z"]).await;
    assert_eq!(
        run(&registry, &engine, &mut conn, "ZRANGE", &["z", "0", "-1"]).await,
        Reply::Array(vec![bulk("y"), bulk("z"), bulk("x")])
    );

    assert_eq!(run(&registry, &engine, &mut conn, "ZADD", &["z", "2", "x"]).await, Reply::Integer(1));
    assert_eq!(run(&registry, &engine, &mut conn, "ZADD", &["z", "2", "x"]).await, Reply::Integer(0));
}
