//! Effective pool configuration and the three-layer merge that produces it.
//!
//! The pool never reads a config file. The outer adapter parses whatever
//! surfaces it owns into the three input structs here — a global session
//! management block, the legacy per-proxy fields, and the per-proxy
//! override block — and calls [`PoolConfig::merge`]. The merged result is
//! handed to the manager, which applies the floors in
//! [`PoolConfig::normalized`] before use.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Intervals and timeouts at or below this are considered misconfigured.
const MIN_USABLE_INTERVAL: Duration = Duration::from_secs(5);

/// Replacement for misconfigured intervals and timeouts.
const PROMOTED_INTERVAL: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// PoolConfig
// ---------------------------------------------------------------------------

/// Effective session pool configuration, all layers merged.
///
/// `Default` leaves every field zero; [`normalized`](Self::normalized)
/// promotes the two zero durations that cannot stay zero. A zeroed config
/// therefore means: 30s maintenance tick, 30s idle timeout, no retention
/// floors, no proactive creation, no age rotation.
#[derive(Debug, Clone, Default)]
pub struct PoolConfig {
    // ---
    /// Maintenance tick period.
    pub idle_session_check_interval: Duration,

    /// Maximum duration a session may sit idle before it becomes eligible
    /// for idle-close.
    pub idle_session_timeout: Duration,

    /// Retention floor for idle-timeout cleanup.
    pub min_idle_session: usize,

    /// Target idle-pool size for proactive creation. 0 disables the
    /// proactive path entirely.
    pub ensure_idle_session: usize,

    /// Upper bound on async creators spawned per maintenance tick.
    /// 0 means unlimited (the whole deficit in one tick).
    pub ensure_idle_session_create_rate: usize,

    /// Retention floor for age-based cleanup, independent of
    /// `min_idle_session`.
    pub min_idle_session_for_age: usize,

    /// Session age at which age-based close becomes eligible. 0 disables
    /// age rotation.
    pub max_connection_lifetime: Duration,

    /// Symmetric jitter window around `max_connection_lifetime`. Must not
    /// exceed the lifetime; `normalized` clamps it.
    pub connection_lifetime_jitter: Duration,
}

// ---

impl PoolConfig {
    // ---

    /// Apply the floors that keep a misconfigured pool functional.
    ///
    /// A check interval or idle timeout of ≤ 5s is promoted to 30s — the
    /// maintenance sweep is not meant to run hot, and sub-5s idle timeouts
    /// would churn sessions faster than they can be reused. Jitter wider
    /// than the lifetime would produce negative expiries and is clamped.
    pub fn normalized(mut self) -> Self {
        // ---
        if self.idle_session_check_interval <= MIN_USABLE_INTERVAL {
            self.idle_session_check_interval = PROMOTED_INTERVAL;
        }
        if self.idle_session_timeout <= MIN_USABLE_INTERVAL {
            self.idle_session_timeout = PROMOTED_INTERVAL;
        }
        if self.connection_lifetime_jitter > self.max_connection_lifetime {
            tracing::warn!(
                jitter_secs = self.connection_lifetime_jitter.as_secs(),
                lifetime_secs = self.max_connection_lifetime.as_secs(),
                "connection lifetime jitter exceeds the lifetime; clamping"
            );
            self.connection_lifetime_jitter = self.max_connection_lifetime;
        }
        self
    }

    // ---

    /// Merge the three configuration layers into one effective config.
    ///
    /// Lowest priority first: the global block is applied wholesale when
    /// present, then the legacy per-proxy fields where set (> 0), then the
    /// override block field-by-field where set. Fields absent from every
    /// layer keep their `Default` zeros and fall to the
    /// [`normalized`](Self::normalized) floors.
    pub fn merge(
        global: Option<&GlobalPoolConfig>,
        legacy: &LegacyOptions,
        overrides: Option<&SessionOverride>,
    ) -> Self {
        // ---
        let mut cfg = PoolConfig::default();

        if let Some(g) = global {
            cfg.idle_session_check_interval = g.idle_session_check_interval;
            cfg.idle_session_timeout = g.idle_session_timeout;
            cfg.min_idle_session = g.min_idle_session;
            cfg.ensure_idle_session = g.ensure_idle_session;
            cfg.ensure_idle_session_create_rate = g.ensure_idle_session_create_rate;
            cfg.min_idle_session_for_age = g.min_idle_session_for_age;
            cfg.max_connection_lifetime = g.max_connection_lifetime;
            cfg.connection_lifetime_jitter = g.connection_lifetime_jitter;
        }

        if legacy.idle_session_check_interval > 0 {
            cfg.idle_session_check_interval =
                Duration::from_secs(legacy.idle_session_check_interval);
        }
        if legacy.idle_session_timeout > 0 {
            cfg.idle_session_timeout = Duration::from_secs(legacy.idle_session_timeout);
        }
        if legacy.min_idle_session > 0 {
            cfg.min_idle_session = legacy.min_idle_session;
        }

        if let Some(o) = overrides {
            if let Some(v) = o.ensure_idle_session {
                cfg.ensure_idle_session = v;
            }
            if let Some(v) = o.min_idle_session {
                cfg.min_idle_session = v;
            }
            if let Some(v) = o.min_idle_session_for_age {
                cfg.min_idle_session_for_age = v;
            }
            if let Some(v) = o.ensure_idle_session_create_rate {
                cfg.ensure_idle_session_create_rate = v;
            }
            if let Some(v) = o.max_connection_lifetime {
                cfg.max_connection_lifetime = Duration::from_secs(v);
            }
            if let Some(v) = o.connection_lifetime_jitter {
                cfg.connection_lifetime_jitter = Duration::from_secs(v);
            }
            if let Some(v) = o.idle_session_timeout {
                cfg.idle_session_timeout = Duration::from_secs(v);
            }
            if let Some(v) = o.idle_session_check_interval {
                cfg.idle_session_check_interval = Duration::from_secs(v);
            }
        }

        cfg
    }
}

// ---------------------------------------------------------------------------
// GlobalPoolConfig
// ---------------------------------------------------------------------------

/// Global session-management block from the main configuration, shared by
/// every outbound that does not override it. Duration fields arrive already
/// parsed from the config file's native duration syntax.
#[derive(Debug, Clone, Default)]
pub struct GlobalPoolConfig {
    // ---
    pub idle_session_check_interval: Duration,
    pub idle_session_timeout: Duration,
    pub min_idle_session: usize,
    pub ensure_idle_session: usize,
    pub ensure_idle_session_create_rate: usize,
    pub min_idle_session_for_age: usize,
    pub max_connection_lifetime: Duration,
    pub connection_lifetime_jitter: Duration,
}

// ---------------------------------------------------------------------------
// LegacyOptions
// ---------------------------------------------------------------------------

/// The three original per-proxy fields, kept for backward compatibility.
/// Durations are whole seconds; a zero means "not set" and leaves the
/// lower-priority layer's value in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyOptions {
    // ---
    /// Maintenance tick period in seconds. 0 = unset.
    pub idle_session_check_interval: u64,

    /// Idle timeout in seconds. 0 = unset.
    pub idle_session_timeout: u64,

    /// Idle retention floor. 0 = unset.
    pub min_idle_session: usize,
}

// ---------------------------------------------------------------------------
// SessionOverride
// ---------------------------------------------------------------------------

/// Per-proxy override block — the highest-priority layer. Every field is
/// nullable; only set fields are applied. Durations are whole seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOverride {
    // ---
    pub ensure_idle_session: Option<usize>,
    pub min_idle_session: Option<usize>,
    pub min_idle_session_for_age: Option<usize>,
    pub ensure_idle_session_create_rate: Option<usize>,
    /// Seconds.
    pub max_connection_lifetime: Option<u64>,
    /// Seconds.
    pub connection_lifetime_jitter: Option<u64>,
    /// Seconds.
    pub idle_session_timeout: Option<u64>,
    /// Seconds.
    pub idle_session_check_interval: Option<u64>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    // ---
    use std::time::Duration;

    use super::{GlobalPoolConfig, LegacyOptions, PoolConfig, SessionOverride};

    // ---

    #[test]
    fn normalized_promotes_zeroed_durations() {
        // ---
        let cfg = PoolConfig::default().normalized();
        assert_eq!(cfg.idle_session_check_interval, Duration::from_secs(30));
        assert_eq!(cfg.idle_session_timeout, Duration::from_secs(30));
    }

    // ---

    #[test]
    fn normalized_promotes_sub_floor_durations() {
        // ---
        let cfg = PoolConfig {
            idle_session_check_interval: Duration::from_secs(5),
            idle_session_timeout: Duration::from_secs(3),
            ..Default::default()
        }
        .normalized();
        assert_eq!(cfg.idle_session_check_interval, Duration::from_secs(30));
        assert_eq!(cfg.idle_session_timeout, Duration::from_secs(30));
    }

    // ---

    #[test]
    fn normalized_keeps_usable_durations() {
        // ---
        let cfg = PoolConfig {
            idle_session_check_interval: Duration::from_secs(6),
            idle_session_timeout: Duration::from_secs(120),
            ..Default::default()
        }
        .normalized();
        assert_eq!(cfg.idle_session_check_interval, Duration::from_secs(6));
        assert_eq!(cfg.idle_session_timeout, Duration::from_secs(120));
    }

    // ---

    #[test]
    fn normalized_clamps_jitter_to_lifetime() {
        // ---
        let cfg = PoolConfig {
            max_connection_lifetime: Duration::from_secs(100),
            connection_lifetime_jitter: Duration::from_secs(150),
            ..Default::default()
        }
        .normalized();
        assert_eq!(cfg.connection_lifetime_jitter, Duration::from_secs(100));
    }

    // ---

    #[test]
    fn merge_applies_global_wholesale() {
        // ---
        let global = GlobalPoolConfig {
            idle_session_timeout: Duration::from_secs(90),
            min_idle_session: 4,
            ensure_idle_session: 8,
            max_connection_lifetime: Duration::from_secs(600),
            ..Default::default()
        };
        let cfg = PoolConfig::merge(Some(&global), &LegacyOptions::default(), None);

        assert_eq!(cfg.idle_session_timeout, Duration::from_secs(90));
        assert_eq!(cfg.min_idle_session, 4);
        assert_eq!(cfg.ensure_idle_session, 8);
        assert_eq!(cfg.max_connection_lifetime, Duration::from_secs(600));
    }

    // ---

    #[test]
    fn merge_legacy_beats_global_only_when_set() {
        // ---
        let global = GlobalPoolConfig {
            idle_session_timeout: Duration::from_secs(90),
            min_idle_session: 4,
            ..Default::default()
        };
        let legacy = LegacyOptions {
            idle_session_timeout: 45,
            min_idle_session: 0, // unset — global survives
            ..Default::default()
        };
        let cfg = PoolConfig::merge(Some(&global), &legacy, None);

        assert_eq!(cfg.idle_session_timeout, Duration::from_secs(45));
        assert_eq!(cfg.min_idle_session, 4, "zero legacy field must not clobber global");
    }

    // ---

    #[test]
    fn merge_override_beats_everything() {
        // ---
        let global = GlobalPoolConfig {
            idle_session_timeout: Duration::from_secs(90),
            ensure_idle_session: 8,
            ..Default::default()
        };
        let legacy = LegacyOptions {
            idle_session_timeout: 45,
            ..Default::default()
        };
        let overrides = SessionOverride {
            idle_session_timeout: Some(15),
            ensure_idle_session: Some(0), // explicit disable wins over global 8
            ..Default::default()
        };
        let cfg = PoolConfig::merge(Some(&global), &legacy, Some(&overrides));

        assert_eq!(cfg.idle_session_timeout, Duration::from_secs(15));
        assert_eq!(cfg.ensure_idle_session, 0);
    }

    // ---

    #[test]
    fn merge_of_nothing_is_default() {
        // ---
        let cfg = PoolConfig::merge(None, &LegacyOptions::default(), None);
        assert_eq!(cfg.idle_session_timeout, Duration::ZERO);
        assert_eq!(cfg.ensure_idle_session, 0);
        assert_eq!(cfg.min_idle_session, 0);
    }
}
