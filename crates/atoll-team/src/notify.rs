//! Notification collaborator.
//!
//! The core never formats user-facing text. It hands the host an opaque
//! message key plus substitution parameters and lets the host localize and
//! deliver it (or drop it if the player is offline).

use atoll_core::PlayerId;
use hashbrown::HashMap;
use parking_lot::Mutex;

/// Message keys emitted by this crate.
pub mod keys {
    /// Actor tried a team command without being in a team.
    pub const NO_TEAM: &str = "team.leave.no-team";
    /// Actor must repeat the leave command to confirm.
    pub const LEAVE_CONFIRM: &str = "team.leave.type-again";
    /// The pending leave timed out.
    pub const LEAVE_CANCELLED: &str = "team.leave.cancelled";
    /// The leave went through.
    pub const LEAVE_SUCCESS: &str = "team.leave.success";
    /// Sent to the owner when a member leaves; carries a `player` param.
    pub const OWNER_LOST_MEMBER: &str = "team.leave.left-your-island";
}

/// Resolves display names and delivers localized messages.
pub trait Notifier: Send + Sync {
    /// Display name for a player.
    fn name_of(&self, player: PlayerId) -> String;

    /// Deliver `key` to the player if they are online. `params` are
    /// substitution pairs for the host's localization layer.
    fn notify(&self, player: PlayerId, key: &str, params: &[(&str, String)]);
}

/// A message captured by [`RecordingNotifier`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recorded {
    pub player: PlayerId,
    pub key: String,
    pub params: Vec<(String, String)>,
}

/// Test notifier that records every message and serves names from a map.
#[derive(Default)]
pub struct RecordingNotifier {
    names: Mutex<HashMap<PlayerId, String>>,
    messages: Mutex<Vec<Recorded>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_name(&self, player: PlayerId, name: impl Into<String>) {
        self.names.lock().insert(player, name.into());
    }

    /// All message keys delivered to `player`, in order.
    #[must_use]
    pub fn keys_for(&self, player: PlayerId) -> Vec<String> {
        self.messages
            .lock()
            .iter()
            .filter(|m| m.player == player)
            .map(|m| m.key.clone())
            .collect()
    }

    /// Drain everything recorded so far.
    #[must_use]
    pub fn take(&self) -> Vec<Recorded> {
        core::mem::take(&mut *self.messages.lock())
    }
}

impl Notifier for RecordingNotifier {
    fn name_of(&self, player: PlayerId) -> String {
        self.names
            .lock()
            .get(&player)
            .cloned()
            .unwrap_or_else(|| player.to_string())
    }

    fn notify(&self, player: PlayerId, key: &str, params: &[(&str, String)]) {
        self.messages.lock().push(Recorded {
            player,
            key: key.to_owned(),
            params: params
                .iter()
                .map(|(k, v)| ((*k).to_owned(), v.clone()))
                .collect(),
        });
    }
}
