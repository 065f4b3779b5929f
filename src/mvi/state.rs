//! Base trait for snapshots held by shared state containers.

/// Marker trait for state snapshots.
///
/// Snapshots should be:
/// - Immutable (Clone to create new snapshots)
/// - Comparable (PartialEq, equal updates are not emitted)
/// - Shareable across the producers of one layout (Send + Sync)
pub trait Snapshot: Clone + PartialEq + Default + Send + Sync + 'static {}
