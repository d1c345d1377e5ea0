//! Team-leave confirmation workflow.
//!
//! Leaving a team is destructive enough to warrant a confirmation step:
//! the first command arms a pending entry with a cancellation timer, the
//! second command within the window executes the leave. The pending map and
//! every timer transition share one mutex, so the confirming command and a
//! firing timeout can never both act on the same entry.

use std::sync::Arc;

use atoll_core::PlayerId;
use hashbrown::HashMap;
use parking_lot::Mutex;
use tracing::debug;

use crate::notify::keys;
use crate::{CancelHandle, PlayerDirectory, Scheduler};

/// Result of a leave request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The actor is not in a team; nothing changed.
    NoTeam,
    /// Confirmation is armed; the actor must repeat the command.
    AwaitingConfirmation,
    /// The actor left their team.
    Left,
}

type PendingMap = HashMap<PlayerId, Box<dyn CancelHandle>>;

/// The leave confirmation state machine.
pub struct LeaveWorkflow {
    directory: PlayerDirectory,
    scheduler: Arc<dyn Scheduler>,
    pending: Arc<Mutex<PendingMap>>,
}

impl LeaveWorkflow {
    #[must_use]
    pub fn new(directory: PlayerDirectory, scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            directory,
            scheduler,
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Handle a leave command from `actor`.
    ///
    /// Without configured confirmation the leave executes immediately.
    /// Otherwise the first call arms a pending entry plus a cancellation
    /// timer and the second call within the window confirms. Repeating the
    /// command after a timeout simply arms again.
    pub fn request_leave(&self, actor: PlayerId) -> LeaveOutcome {
        if !self.directory.in_team(actor) {
            self.directory.notifier().notify(actor, keys::NO_TEAM, &[]);
            return LeaveOutcome::NoTeam;
        }

        let confirmation = self.directory.settings().leave_confirmation;
        {
            let mut pending = self.pending.lock();
            if confirmation && !pending.contains_key(&actor) {
                // Arm. The timer is scheduled while the map is locked: the
                // scheduler contract guarantees the callback cannot run
                // before schedule_after returns, and once it does run it
                // blocks on this same mutex until the entry is installed.
                let handle = self.schedule_cancellation(actor);
                pending.insert(actor, handle);
                drop(pending);
                self.directory
                    .notifier()
                    .notify(actor, keys::LEAVE_CONFIRM, &[]);
                return LeaveOutcome::AwaitingConfirmation;
            }
            if let Some(handle) = pending.remove(&actor) {
                handle.cancel();
            }
        }

        self.execute_leave(actor);
        LeaveOutcome::Left
    }

    /// Whether the actor has an armed confirmation.
    #[must_use]
    pub fn is_pending(&self, actor: PlayerId) -> bool {
        self.pending.lock().contains_key(&actor)
    }

    /// Number of armed confirmations.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    fn schedule_cancellation(&self, actor: PlayerId) -> Box<dyn CancelHandle> {
        let pending = Arc::clone(&self.pending);
        let directory = self.directory.clone();
        self.scheduler.schedule_after(
            self.directory.settings().leave_wait(),
            Box::new(move || {
                // Still pending means the actor never confirmed: clear the
                // entry and tell them. If the confirm won the race the entry
                // is already gone and there is nothing to do.
                let timed_out = pending.lock().remove(&actor).is_some();
                if timed_out {
                    debug!(player = %actor, "pending leave timed out");
                    directory.notifier().notify(actor, keys::LEAVE_CANCELLED, &[]);
                }
            }),
        )
    }

    fn execute_leave(&self, actor: PlayerId) {
        if let Some(owner) = self.directory.team_owner(actor).filter(|owner| *owner != actor) {
            let name = self.directory.name_of(actor);
            self.directory.notifier().notify(
                owner,
                keys::OWNER_LOST_MEMBER,
                &[("player", name)],
            );
        }
        self.directory.remove_from_team(actor);
        self.directory
            .notifier()
            .notify(actor, keys::LEAVE_SUCCESS, &[]);
    }
}
