//! Failure modes for the viewer's on-disk RON files.
//!
//! The crate owns two files, `config.ron` and `preferences.ron`, and a
//! rename can touch the second while the first is untouched. Every
//! variant therefore carries the path of the file that failed so a log
//! line is enough to tell them apart.

use std::path::PathBuf;

/// Error while reading or writing `config.ron` or `preferences.ron`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file (or its directory) could not be written.
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file was read but is not valid RON for its schema.
    #[error("malformed {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },

    /// The in-memory value could not be rendered as RON.
    #[error("failed to serialize {}: {source}", .path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: ron::Error,
    },
}
