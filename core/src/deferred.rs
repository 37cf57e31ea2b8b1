use crate::error::CoreError;

/// Work that must run after the current frame finishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Deferred {
    /// Leave the level for the world's level-select screen.
    ExitToLevelSelect { world: i32 },
}

/// Holds at most one pending task. Drained once per frame boundary.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeferredSlot {
    pending: Option<Deferred>,
}

impl DeferredSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, task: Deferred) -> Result<(), CoreError> {
        if self.pending.is_some() {
            return Err(CoreError::DoubleTransition);
        }
        self.pending = Some(task);
        Ok(())
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn take(&mut self) -> Option<Deferred> {
        self.pending.take()
    }
}
