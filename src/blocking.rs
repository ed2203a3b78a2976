use bytes::Bytes;
use tokio::time::{sleep_until, Instant};

use crate::db::Edge;
use crate::error::ReplyError;
use crate::keyspace::DbSet;

/// Waits for a push into any of `keys`' lists in database `db_index`, then
/// pops from `edge` of whichever list received one. Implements the blocking
/// coordinator, spec §4.5 (C5).
///
/// Selection among multiple simultaneously-ready lists is whichever this scan
/// finds first (`keys` in order); spec §4.5 only requires that *some* ready
/// list be chosen, not a specific one.
pub async fn block_pop(
    dbs: &DbSet,
    db_index: usize,
    keys: &[Bytes],
    edge: Edge,
    timeout_secs: u64,
) -> Result<Option<(Bytes, Bytes)>, ReplyError> {
    dbs.with(db_index, |db| -> Result<(), ReplyError> {
        for key in keys {
            db.list_or_default(key)?;
        }
        Ok(())
    })?;

    let deadline =
        (timeout_secs > 0).then(|| Instant::now() + std::time::Duration::from_secs(timeout_secs));

    loop {
        // Arm before scanning: `slot.notify.notified()` is a direct method
        // call, not wrapped in an async block, so it captures the
        // notifier's current generation right here — before the scan below
        // runs, not at the `.await`/`select!` further down. A push landing
        // between this line and the scan finding nothing is still observed
        // by `notified` once awaited; scanning first and arming after (the
        // reverse order) is the lost-wakeup race spec §4.5's Race paragraph
        // warns against.
        let slot = dbs.slot(db_index);
        let notified = slot.notify.notified();

        let found = dbs.with(db_index, |db| {
            for key in keys {
                if let Ok(Some(list)) = db.mut_list(key) {
                    let popped = match edge {
                        Edge::Left => list.pop_front(),
                        Edge::Right => list.pop_back(),
                    };
                    if let Some(value) = popped {
                        return Some((key.clone(), value));
                    }
                }
            }
            None
        });
        if let Some(result) = found {
            return Ok(Some(result));
        }

        match deadline {
            Some(at) => {
                tokio::select! {
                    () = notified => {}
                    () = sleep_until(at) => return Ok(None),
                }
            }
            None => notified.await,
        }
    }
}
