use serde::{Deserialize, Serialize};

use super::ProcessState;

/// One watch as reported by a single status poll.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessEntry {
    pub name: String,
    pub state: ProcessState,
}

impl ProcessEntry {
    pub fn new(name: impl Into<String>, state: ProcessState) -> Self {
        Self {
            name: name.into(),
            state,
        }
    }
}
