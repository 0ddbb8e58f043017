use std::env;
use std::time::Duration;

use config::{Config, File};

use crate::mailbox::MailboxConfig;

/// Tunables for one `System`. Loaded the same way the teacher's
/// `load_config()` builds its `Config`: hardcoded defaults, then an
/// optional TOML file merged on top, env-var selectable, except the
/// result is read once into a plain struct instead of being re-queried
/// from `config::Config` on every hot-path access (`ActorContext::create`
/// reads `mailbox_throughput` on every spawn; a string-keyed lookup
/// there would show up in profiles).
///
/// Grounded on the teacher's `lib.rs::load_config` and
/// `mailbox.rs::MailboxConfig::from(&config::Config)`.
#[derive(Debug, Clone)]
pub struct SystemConfig {
    pub mailbox_throughput: usize,
    pub dispatcher_pool_size: usize,
    pub scheduler_frequency: Duration,
    pub dead_letter_throttle_max: u32,
    pub dead_letter_throttle_interval: Duration,
}

impl Default for SystemConfig {
    fn default() -> Self {
        SystemConfig {
            mailbox_throughput: 300,
            dispatcher_pool_size: num_cpus::get() * 2,
            scheduler_frequency: Duration::from_millis(50),
            dead_letter_throttle_max: 3,
            dead_letter_throttle_interval: Duration::from_secs(1),
        }
    }
}

impl SystemConfig {
    /// Builds the raw `config::Config` the way `load_config()` does:
    /// defaults first, then `ASYS_CONF` (the teacher's `RIKER_CONF`) and
    /// `APP_CONF` TOML files merged on top if present.
    pub fn load() -> Self {
        let mut cfg = Config::new();
        let _ = cfg.set_default("mailbox.throughput", 300i64);
        let _ = cfg.set_default(
            "dispatcher.pool_size",
            (num_cpus::get() * 2) as i64,
        );
        let _ = cfg.set_default("scheduler.frequency_millis", 50i64);
        let _ = cfg.set_default("dead_letter.throttle_max", 3i64);
        let _ = cfg.set_default("dead_letter.throttle_interval_millis", 1000i64);

        let path = env::var("ASYS_CONF").unwrap_or_else(|_| "config/asys.toml".into());
        let _ = cfg.merge(File::with_name(&path).required(false));

        let path = env::var("APP_CONF").unwrap_or_else(|_| "config/app".into());
        let _ = cfg.merge(File::with_name(&path).required(false));

        SystemConfig::from_raw(&cfg)
    }

    fn from_raw(cfg: &Config) -> Self {
        SystemConfig {
            mailbox_throughput: MailboxConfig::from(cfg).throughput,
            dispatcher_pool_size: cfg
                .get_int("dispatcher.pool_size")
                .map(|v| v as usize)
                .unwrap_or_else(|_| num_cpus::get() * 2),
            scheduler_frequency: cfg
                .get_int("scheduler.frequency_millis")
                .map(|v| Duration::from_millis(v as u64))
                .unwrap_or_else(|_| Duration::from_millis(50)),
            dead_letter_throttle_max: cfg
                .get_int("dead_letter.throttle_max")
                .map(|v| v as u32)
                .unwrap_or(3),
            dead_letter_throttle_interval: cfg
                .get_int("dead_letter.throttle_interval_millis")
                .map(|v| Duration::from_millis(v as u64))
                .unwrap_or_else(|_| Duration::from_secs(1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_any_config_file() {
        let cfg = SystemConfig::load();
        assert_eq!(cfg.mailbox_throughput, 300);
        assert_eq!(cfg.dead_letter_throttle_max, 3);
    }
}
