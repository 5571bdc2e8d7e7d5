pub mod editing;
pub mod io;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use editing::{anchors::*, change::*, document::*, position::*, sync::*};
pub use io::{BackupPolicy, IoError, NEW_LINE};
