//! Base trait for intents in MVI architecture.

/// Marker trait for intent objects.
///
/// Intents represent:
/// - Input registrations and value changes bubbling up from leaves
/// - Submission and display bookkeeping of a form
/// - State pulled down from a parent form, pager navigation
///
/// Intents are processed by reducers to produce new snapshots.
pub trait Intent: Send + 'static {}
