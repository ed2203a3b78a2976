use std::time::Duration;

/// Engine-wide tuning knobs.
///
/// The teacher's `config.rs` exposes roughly twenty entries (listpack
/// encoding thresholds, `proto-max-bulk-len`, lazy-expire toggles) that exist
/// to tune Redis's on-disk-compatible encodings; none of that has a
/// counterpart here, since this engine has exactly one encoding per shape.
/// What remains is the handful of knobs this design actually has an opinion
/// about.
#[derive(Debug, Clone)]
pub struct Config {
    /// How often the per-database reaper sweeps for expired keys (spec §4.3:
    /// "once per second").
    pub reaper_interval: Duration,

    /// The number of databases that exist at startup. Database 0 always
    /// exists; `SELECT` creates higher-numbered databases lazily beyond this.
    pub initial_databases: usize,

    /// The value reported by `CONFIG GET databases`.
    pub databases: u32,

    /// The address the bundled `server::serve` listens on.
    pub listen_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            reaper_interval: Duration::from_secs(1),
            initial_databases: 1,
            databases: 16,
            listen_addr: "127.0.0.1:6379".to_owned(),
        }
    }
}
