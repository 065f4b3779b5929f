//! Model-View-Intent primitives for layout state.
//!
//! Every mutation of a form or pager snapshot goes through a reducer so the
//! transition logic stays pure and testable on its own.
//!
//! # Architecture
//!
//! ```text
//! Intent ──→ Reducer ──→ Snapshot ──→ SharedState::update
//!    ↑                                      │
//!    └──────── observers / event bus ───────┘
//! ```
//!
//! - **Snapshot**: Immutable value held by a shared state container
//! - **Intent**: Input events, submission, parent inheritance, pager moves
//! - **Reducer**: Pure function that transforms a snapshot based on an intent

mod intent;
mod reducer;
mod state;

pub use intent::Intent;
pub use reducer::Reducer;
pub use state::Snapshot;
