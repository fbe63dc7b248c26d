//! Fatal, per-file errors.
//!
//! Either error aborts the rewrite of the file it names and nothing else.
//! Advisory findings (unused or missing classes) are not errors and live in
//! `pochoir_croquis`.

use thiserror::Error;

use crate::location::Position;

/// Errors that abort the rewrite of a single file
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// Malformed style or template source
    #[error("{path}:{line}:{column}: {message}")]
    Parse {
        path: String,
        line: u32,
        column: u32,
        message: String,
    },

    /// Import alias outside `[A-Za-z0-9.-]+`
    #[error("{path}: invalid import alias \"{alias}\" (aliases may only contain letters, digits, '.' and '-')")]
    InvalidIdentifier { path: String, alias: String },
}

impl TransformError {
    pub fn parse(path: impl Into<String>, at: Position, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            line: at.line,
            column: at.column,
            message: message.into(),
        }
    }

    pub fn invalid_identifier(path: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            path: path.into(),
            alias: alias.into(),
        }
    }

    /// File the error belongs to.
    pub fn path(&self) -> &str {
        match self {
            Self::Parse { path, .. } | Self::InvalidIdentifier { path, .. } => path,
        }
    }

    /// Short error code for filtering and JSON output.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "pochoir/parse-error",
            Self::InvalidIdentifier { .. } => "pochoir/invalid-identifier",
        }
    }
}

pub type TransformResult<T> = Result<T, TransformError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = TransformError::parse(
            "my-app/components/card/styles.scoped.scss",
            Position::new(12, 2, 4),
            "Unclosed block",
        );
        assert_eq!(
            err.to_string(),
            "my-app/components/card/styles.scoped.scss:2:4: Unclosed block"
        );
        assert_eq!(err.code(), "pochoir/parse-error");
    }

    #[test]
    fn test_invalid_identifier_names_file() {
        let err =
            TransformError::invalid_identifier("my-app/components/card/template.hbs", "My Name");
        assert_eq!(err.path(), "my-app/components/card/template.hbs");
        assert!(err.to_string().contains("\"My Name\""));
    }
}
