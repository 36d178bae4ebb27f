// ABOUTME: Programmatic configuration for an endpoint: role plus the tunables from spec §6
// ABOUTME: No CLI/env parsing lives here; demos layer argh on top of this

use std::time::Duration;

pub use crate::link::Role;

/// Tunables for one endpoint (Obedient Agent or Control Agent). Constructed
/// programmatically; `Default` matches spec.md's documented defaults.
#[derive(Clone, Debug)]
pub struct Config {
    pub role: Role,
    pub fps: u32,
    pub retry_timeout: Duration,
    pub sync_interval: Duration,
    pub monitor_index: usize,
    pub video_queue_depth: usize,
    pub input_queue_depth: usize,
    pub dispatcher_idle_sleep: Duration,
    pub bandwidth_window: Duration,
}

impl Config {
    /// A `Config` for the given role with every other field at its default.
    pub fn new(role: Role) -> Self {
        Self {
            role,
            fps: 30,
            retry_timeout: Duration::from_secs(1),
            sync_interval: Duration::from_secs(1),
            monitor_index: 0,
            video_queue_depth: 1,
            input_queue_depth: 64,
            dispatcher_idle_sleep: Duration::from_millis(10),
            bandwidth_window: Duration::from_secs(60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::new(Role::Client {
            host: "localhost".into(),
            port: 9000,
        });
        assert_eq!(config.fps, 30);
        assert_eq!(config.retry_timeout, Duration::from_secs(1));
        assert_eq!(config.sync_interval, Duration::from_secs(1));
        assert_eq!(config.monitor_index, 0);
        assert_eq!(config.video_queue_depth, 1);
        assert_eq!(config.input_queue_depth, 64);
        assert_eq!(config.dispatcher_idle_sleep, Duration::from_millis(10));
        assert_eq!(config.bandwidth_window, Duration::from_secs(60));
    }
}
