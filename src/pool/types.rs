//! Messages exchanged between the dispatcher and render workers.

/// Render the table at this registry position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderJob {
    pub position: usize,
}
