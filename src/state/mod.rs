//! Shared state containers and the snapshots they hold.

mod form;
mod pager;
mod shared;

pub use form::{FormIntent, FormReducer, FormState, FormStatus};
pub use pager::{PagerIntent, PagerReducer, PagerState};
pub use shared::{SharedState, Subscription, WatchHandle, WeakState};
