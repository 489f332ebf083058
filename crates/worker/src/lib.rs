//! Runtime primitives shared by folio subscriptions.
//!
//! * [`spawn`]: run a future on the ambient tokio runtime, or on a lazily built
//!   global runtime when called from plain threads.
//! * [`TaskClass`]: scheduling class attached to spawned work for observability.
//! * [`GenerationClock`] / [`GenerationToken`]: monotonic generations paired with
//!   cancellation, used to tell current work apart from work superseded by a reset.

#![warn(missing_docs)]

mod class;
mod spawn;
mod token;

pub use class::TaskClass;
pub use spawn::spawn;
pub use token::{GenerationClock, GenerationToken};
