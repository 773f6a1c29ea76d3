use serde::{Deserialize, Serialize};

/// Result of flipping a per-user flag (like, save, bookmark).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Toggled {
    On,
    Off,
}

impl Toggled {
    pub fn is_on(self) -> bool {
        matches!(self, Toggled::On)
    }
}
