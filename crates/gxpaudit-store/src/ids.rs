//! Observation id allocation.

/// Hands out identifiers for newly created observations.
pub trait IdAllocator: Send {
    fn next_id(&mut self) -> String;
}

/// `OBS-001`, `OBS-002`, … Numbers wider than three digits are not padded
/// further.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::with_prefix("OBS")
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator for SequentialIds {
    fn next_id(&mut self) -> String {
        let id = format!("{}-{:03}", self.prefix, self.next);
        self.next += 1;
        id
    }
}
