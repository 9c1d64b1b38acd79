mod process;
pub use process::{ProcessState, derive_state};

mod entry;
pub use entry::ProcessEntry;
