//! Defines the events sent from the engine to the display collaborator.

/// Events sent from the engine to the host that renders the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEvent {
    /// Node state changed; re-pull some or all nodes.
    Refresh,
    /// An informational message to be shown to the user.
    Info(String),
}
