//! Pipeline-level errors.

use std::io;
use std::path::PathBuf;

use pochoir_relief::TransformError;
use thiserror::Error;

/// Errors of a build run
#[derive(Debug, Error)]
pub enum BuildError {
    /// A style module or template failed to rewrite
    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to walk {}: {source}", path.display())]
    Walk { path: PathBuf, source: ignore::Error },

    #[error("failed to parse {}: {source}", path.display())]
    Config {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("styles root {} is not a directory", .0.display())]
    MissingStylesRoot(PathBuf),
}

pub type BuildResult<T> = Result<T, BuildError>;
