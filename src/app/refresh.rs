//! Deferred refresh notifications for batch operations.

/// Buffers refresh requests while a batch scope is open.
///
/// Scopes nest by depth. A request made inside any scope is remembered and
/// released exactly once when the outermost scope closes.
#[derive(Debug, Default)]
pub struct RefreshGate {
    depth: usize,
    pending: bool,
}

impl RefreshGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) {
        self.depth += 1;
    }

    /// Returns `true` when the refresh should be sent immediately.
    pub fn request(&mut self) -> bool {
        if self.depth > 0 {
            self.pending = true;
            false
        } else {
            true
        }
    }

    /// Closes one scope. Returns `true` when the outermost scope closed with
    /// a refresh pending.
    pub fn end(&mut self) -> bool {
        if self.depth == 0 {
            tracing::warn!("end_batch called without a matching begin_batch");
            return false;
        }
        self.depth -= 1;
        if self.depth == 0 && self.pending {
            self.pending = false;
            true
        } else {
            false
        }
    }

    pub fn is_suppressed(&self) -> bool {
        self.depth > 0
    }
}
