use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::Notify;

use crate::db::Db;

/// One numbered database plus the signal the blocking coordinator (spec §4.5,
/// C5) waits on for a push into any of its lists.
///
/// `std::sync::Mutex`, not `tokio::sync::Mutex`: every critical section here
/// is synchronous hashmap/btreeset mutation with no `.await` inside it, so a
/// blocking mutex is both correct and — per the teacher's own preference for
/// synchronous primitives wherever an async one isn't needed — idiomatic.
///
/// `notify` is `pub(crate)` so `blocking::block_pop` can call
/// `slot.notify.notified()` directly at its call site rather than through a
/// method returning a lazily-polled `async` wrapper — see [`DbSet::slot`].
#[derive(Default)]
pub(crate) struct Slot {
    db: StdMutex<Db>,
    pub(crate) notify: Notify,
}

/// The indexed collection of numbered databases (spec §4.3, C3), created
/// lazily as `SELECT` touches higher indices. Generalizes the teacher's
/// `Store`'s `Vec<DB>` — owned outright by a single actor task there — into
/// one independently lockable `Slot` per database, which is what spec §5
/// mandates ("each database: one mutex...") in place of the teacher's
/// single-task ownership.
pub struct DbSet {
    slots: StdMutex<Vec<Arc<Slot>>>,
}

impl DbSet {
    #[must_use]
    pub fn new(initial_databases: usize) -> Self {
        let slots = (0..initial_databases.max(1))
            .map(|_| Arc::new(Slot::default()))
            .collect();
        DbSet {
            slots: StdMutex::new(slots),
        }
    }

    /// Returns the slot for `index`, creating it (and every slot up to it)
    /// if this is the first time it's been touched.
    ///
    /// `pub(crate)`, not private: `blocking::block_pop` calls this directly
    /// so it can call `slot.notify.notified()` itself — a plain method call,
    /// not wrapped in an `async fn`/`async move` block — immediately
    /// *before* scanning list state. `Notify::notified()` captures the
    /// notifier's current "generation" the moment it's called, not the
    /// moment its returned future is first polled; wrapping the call in an
    /// async block (as an earlier version of this method did) defers that
    /// capture to first `.await`, which is *after* the scan and reopens the
    /// lost-wakeup race spec §4.5's Race paragraph describes.
    pub(crate) fn slot(&self, index: usize) -> Arc<Slot> {
        let mut slots = self.slots.lock().expect("db lock poisoned");
        while slots.len() <= index {
            slots.push(Arc::new(Slot::default()));
        }
        Arc::clone(&slots[index])
    }

    /// Runs `f` against database `index` under its lock, creating the
    /// database if this is the first time it's been touched.
    pub fn with<R>(&self, index: usize, f: impl FnOnce(&mut Db) -> R) -> R {
        let slot = self.slot(index);
        let mut db = slot.db.lock().expect("db lock poisoned");
        f(&mut db)
    }

    /// Like [`DbSet::with`], but also wakes every task currently waiting on
    /// a push into this database (spec §4.1's notification channel). Used by
    /// every list-push command.
    pub fn with_then_notify<R>(&self, index: usize, f: impl FnOnce(&mut Db) -> R) -> R {
        let slot = self.slot(index);
        let result = {
            let mut db = slot.db.lock().expect("db lock poisoned");
            f(&mut db)
        };
        slot.notify.notify_waiters();
        result
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.lock().expect("db lock poisoned").len()
    }

    pub fn flush(&self, index: usize) {
        self.with(index, Db::clear);
    }

    pub fn flush_all(&self) {
        for slot in self.slots.lock().expect("db lock poisoned").iter() {
            slot.db.lock().expect("db lock poisoned").clear();
        }
    }

    #[must_use]
    pub fn dbsize(&self, index: usize) -> usize {
        self.with(index, Db::size)
    }

    /// Spawns the per-database reaper (spec §4.3): once per `interval`,
    /// sweeps every database that currently exists for expired keys, each
    /// under its own lock.
    pub fn spawn_reaper(self: &Arc<Self>, interval: std::time::Duration) {
        let dbs = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let slots: Vec<Arc<Slot>> = dbs.slots.lock().expect("db lock poisoned").clone();
                for slot in slots {
                    let removed = slot.db.lock().expect("db lock poisoned").sweep_expired();
                    if removed > 0 {
                        tracing::debug!(removed, "reaper swept expired keys");
                    }
                }
            }
        });
    }
}
