//! Periodic refresh scheduling.
//!
//! Everything the console shows is mirrored from the gateway by polling. This
//! crate provides the two pieces every poller needs:
//!
//! - [`Refresher`]: a recurring timer around an async callback, with an
//!   immediate manual trigger that does not disturb the timer's cadence
//! - [`LoadingFlag`]: the reentrancy guard callbacks use so that a tick
//!   arriving while the previous load is still in flight does not issue a
//!   duplicate request
//!
//! The refresher offers no concurrency control of its own: if a
//! callback is still running when the next tick fires, a second invocation
//! starts. Callers that care guard themselves with a [`LoadingFlag`].

mod guard;
mod refresher;

pub use guard::{LoadingFlag, LoadingGuard};
pub use refresher::{RefreshCallback, Refresher};
