//! Typed error taxonomy for the update pipeline.
//!
//! Resolution failures ("no candidate satisfies the policy") are
//! deliberately *not* represented here: they're treated as non-errors, so
//! callers see an empty `Update` instead of an `Err`.

use std::path::PathBuf;

/// The result type used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Filesystem permission or unreadable-file errors surfaced from `Detect`.
    #[error("failed to walk {path}: {source}")]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A manifest this adapter unambiguously owns (go.mod, tflint) was malformed.
    #[error("failed to parse {path} as {format}: {message}")]
    Parse {
        path: PathBuf,
        format: &'static str,
        message: String,
    },

    /// A datasource call failed. Never propagated out of `Plan` — the
    /// affected dependency is skipped instead. Kept as a variant so
    /// `Datasource` implementations have something concrete to return.
    #[error("datasource {datasource} failed for package {package}: {message}")]
    Datasource {
        datasource: String,
        package: String,
        message: String,
    },

    /// I/O or path-validation failure while rewriting a manifest. `Apply`
    /// fails fast on these; no partial writes are left behind.
    #[error("failed to apply update to {path}: {source}")]
    Apply {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A path escaped the repository root after lexical cleaning.
    #[error("path {0} escapes the repository root")]
    PathEscape(PathBuf),

    /// A phase observed a cancelled token at a suspension point.
    #[error("operation cancelled")]
    Cancelled,

    /// Programming errors: duplicate registration, missing plugin symbol.
    /// These are fatal at initialization
    #[error("programming error: {0}")]
    Programming(String),
}

impl Error {
    pub fn discovery(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Discovery {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, format: &'static str, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            format,
            message: message.into(),
        }
    }

    pub fn datasource(
        datasource: impl Into<String>,
        package: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Datasource {
            datasource: datasource.into(),
            package: package.into(),
            message: message.into(),
        }
    }

    pub fn apply(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Apply {
            path: path.into(),
            source,
        }
    }
}
