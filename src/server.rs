use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio::sync::mpsc;

use crate::command::{dispatch, Registry};
use crate::connection::Connection;
use crate::engine::Engine;
use crate::pubsub::SINK_CAPACITY;
use crate::reply::Reply;
use crate::resp;

/// The bundled TCP front end (spec §1, §6: "so the crate is runnable
/// standalone via the bundled `server::serve`"). Strictly a convenience
/// wrapper: every piece it touches — [`Engine`], [`Registry`], [`Connection`]
/// — works the same whether driven over this RESP2 socket loop or embedded
/// directly, so an embedder who wants a different wire format can ignore this
/// module and drive [`crate::command::dispatch`] themselves.
///
/// Grounded on the teacher's `server.rs` accept loop, stripped of its
/// `respite`-specific handshake/version-negotiation and single global
/// `Store` actor in favor of the shared, independently-lockable [`Engine`].
pub struct Server {
    engine: Arc<Engine>,
    registry: Arc<Registry>,
}

impl Server {
    #[must_use]
    pub fn new(engine: Arc<Engine>, registry: Arc<Registry>) -> Self {
        Server { engine, registry }
    }

    /// Binds `addr` and serves connections until an accept error or the
    /// process is killed. Each connection runs in its own spawned task; one
    /// connection's error never brings down another's.
    pub async fn serve(&self, addr: impl ToSocketAddrs) -> std::io::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "ferrikv listening");
        loop {
            let (stream, peer) = listener.accept().await?;
            stream.set_nodelay(true).ok();
            tracing::debug!(%peer, "accepted connection");
            let engine = Arc::clone(&self.engine);
            let registry = Arc::clone(&self.registry);
            tokio::spawn(async move {
                if let Err(err) = serve_connection(&engine, &registry, stream).await {
                    tracing::debug!(%err, %peer, "connection ended");
                }
            });
        }
    }
}

/// Drives a single connection: reads RESP2 requests, dispatches them against
/// `engine`/`registry`, and interleaves whatever arrives on the connection's
/// own pub/sub sink (spec §6's streamed subscribe-reply) with ordinary
/// command replies on the same socket.
pub async fn serve_connection<S>(engine: &Engine, registry: &Registry, stream: S) -> std::io::Result<()>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (read_half, mut write_half) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);
    let (outgoing_tx, mut outgoing_rx) = mpsc::channel::<Reply>(SINK_CAPACITY);
    let mut conn = Connection::new(outgoing_tx);

    loop {
        tokio::select! {
            request = resp::read_request(&mut reader) => {
                let Some(mut args) = request? else {
                    return Ok(());
                };
                if args.is_empty() {
                    continue;
                }
                let name = String::from_utf8_lossy(&args.remove(0)).to_ascii_uppercase();
                let reply = dispatch(registry, engine, &mut conn, &name, &args).await;
                if !matches!(reply, Reply::Subscribed) {
                    resp::write_reply(&mut write_half, &reply).await?;
                    write_half.flush().await?;
                }
            }
            Some(pushed) = outgoing_rx.recv() => {
                resp::write_reply(&mut write_half, &pushed).await?;
                write_half.flush().await?;
            }
        }
    }
}
