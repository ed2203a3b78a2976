use std::sync::Arc;

use crate::config::Config;
use crate::keyspace::DbSet;
use crate::pubsub::Hub;

/// The process-wide state shared by every connection: the database set (C2,
/// C3), the pub/sub hub (C4), and the tuning knobs from [`Config`].
///
/// Grounded on the teacher's `Store` (the single actor owning every `DB` plus
/// the pubsub table), generalized into a plain `Arc`-shared bundle of
/// independently lockable pieces, per spec §5's "no dedicated [store] task"
/// concurrency model: there is no actor to route through, each connection's
/// task calls straight into `DbSet`/`Hub`.
pub struct Engine {
    dbs: DbSet,
    pubsub: Hub,
    config: Config,
}

impl Engine {
    #[must_use]
    pub fn new(config: Config) -> Arc<Self> {
        let engine = Arc::new(Engine {
            dbs: DbSet::new(config.initial_databases),
            pubsub: Hub::default(),
            config,
        });
        engine.dbs.spawn_reaper(engine.config.reaper_interval);
        engine
    }

    pub fn dbs(&self) -> &DbSet {
        &self.dbs
    }

    pub fn pubsub(&self) -> &Hub {
        &self.pubsub
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
