//! Slot substitution and specialization bookkeeping.
//!
//! - [`OverrideStack`]: scoped slot bindings, searched innermost first
//! - [`ResolutionKey`]: a definition plus the slot values it observes
//! - [`ResolutionCache`]: memoized declarations keyed by resolution key

mod cache;
mod key;
mod stack;

pub use cache::{EntryState, ResolutionCache};
pub use key::ResolutionKey;
pub use stack::OverrideStack;
