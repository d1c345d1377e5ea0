//! Configuration options consumed by the core.
//!
//! Loaded by the host from whatever config file it keeps; the core only
//! reads the parsed values.

use std::time::Duration;

use serde::Deserialize;

/// Recognized configuration options. Read-only at call time.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Half-width of a claimed island space; also the anchor spacing.
    pub island_distance: i32,
    /// Default protected-area half-width for new regions.
    pub protection_range: i32,
    /// Whether leaving a team requires the command to be repeated.
    pub leave_confirmation: bool,
    /// How long a pending leave waits before it is cancelled.
    pub leave_wait_secs: u64,
    /// How long a player must wait before re-invitation to an island they
    /// left or were kicked from.
    pub invite_cooldown_secs: u64,
    /// Island resets granted to each new player.
    pub reset_limit: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            island_distance: 200,
            protection_range: 100,
            leave_confirmation: true,
            leave_wait_secs: 10,
            invite_cooldown_secs: 3600,
            reset_limit: 2,
        }
    }
}

impl Settings {
    /// Pending-leave timeout as a [`Duration`].
    #[must_use]
    pub const fn leave_wait(&self) -> Duration {
        Duration::from_secs(self.leave_wait_secs)
    }

    /// Re-invitation cooldown as a [`Duration`].
    #[must_use]
    pub const fn invite_cooldown(&self) -> Duration {
        Duration::from_secs(self.invite_cooldown_secs)
    }
}
