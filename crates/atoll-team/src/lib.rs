//! Team membership and rank service.
//!
//! [`PlayerDirectory`] is the façade gameplay code talks to: it lazily
//! materializes per-player records, gates bans and rank edits through the
//! owning region, and keeps the spatial registry and the store consistent.
//! [`LeaveWorkflow`] layers the leave-confirmation state machine on top,
//! using the [`Scheduler`] collaborator for its cancellation timer.

pub mod directory;
pub mod leave;
pub mod notify;
pub mod scheduler;

pub use directory::{ClaimError, PlayerDirectory};
pub use leave::{LeaveOutcome, LeaveWorkflow};
pub use notify::{Notifier, RecordingNotifier};
pub use scheduler::{CancelHandle, ManualScheduler, Scheduler};
