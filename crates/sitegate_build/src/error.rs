//! Error types for the site builder.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for build operations.
pub type BuildResult<T> = Result<T, BuildError>;

/// Errors that can occur while building a site.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The input directory does not exist or is not a directory.
    #[error("input directory not found: {}", .0.display())]
    InputMissing(PathBuf),

    /// The output directory lies inside the input tree.
    #[error("output directory {} is inside input directory {}", .output.display(), .input.display())]
    OutputInsideInput {
        /// The input directory.
        input: PathBuf,
        /// The offending output directory.
        output: PathBuf,
    },

    /// The input tree lies inside (or is) the output directory.
    #[error("input directory {} is inside output directory {}", .input.display(), .output.display())]
    InputInsideOutput {
        /// The offending input directory.
        input: PathBuf,
        /// The output directory.
        output: PathBuf,
    },

    /// An I/O error on a specific path.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// The path being read or written.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// Walking the input tree failed.
    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

impl BuildError {
    /// Wraps an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_names_path() {
        let err = BuildError::io(
            "site/index.html",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        let msg = err.to_string();
        assert!(msg.contains("site/index.html"));
        assert!(msg.contains("gone"));
    }

    #[test]
    fn nested_output_message() {
        let err = BuildError::OutputInsideInput {
            input: "site".into(),
            output: "site/dist".into(),
        };
        assert!(err.to_string().contains("site/dist"));
    }

    #[test]
    fn nested_input_message() {
        let err = BuildError::InputInsideOutput {
            input: "dist/src".into(),
            output: "dist".into(),
        };
        assert!(err.to_string().starts_with("input directory dist/src"));
    }
}
