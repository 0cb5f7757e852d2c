//! Keeps a rendered list of pending approval requests consistent with the server.
//!
//! [`PendingActionSync`] owns the last applied snapshot and relays decisions,
//! [`spawn_poller`] drives it on a fixed period, and [`view`] holds the view model
//! plus the [`PendingView`] trait a front end implements. [`run_agent`] is the
//! PC-side loop that answers commands relayed through the server.

mod agent;
mod poller;
mod sync;
pub mod view;

pub use agent::{handle_command, run_agent, SystemSnapshot};
pub use poller::{spawn_poller, PollerHandle};
pub use sync::{PendingActionSync, SyncOutcome};
pub use view::{Notice, NoticeKind, PendingEntry, PendingList, PendingView};
