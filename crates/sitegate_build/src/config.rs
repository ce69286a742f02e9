//! Build configuration.

use std::path::{Path, PathBuf};

/// Default name of the directory holding shared partials.
pub const DEFAULT_PARTIALS_DIR: &str = "partials";

/// Configuration for a site build.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Directory holding page templates and assets.
    pub input_dir: PathBuf,

    /// Directory the rendered site is written to.
    pub output_dir: PathBuf,

    /// Name of the top-level input directory holding partials.
    ///
    /// This directory is never copied to the output.
    pub partials_dir_name: String,

    /// Whether to remove the output directory before building.
    pub clean: bool,
}

impl BuildConfig {
    /// Creates a configuration for the given input and output directories.
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            partials_dir_name: DEFAULT_PARTIALS_DIR.to_string(),
            clean: false,
        }
    }

    /// Sets the partials directory name.
    #[must_use]
    pub fn partials_dir_name(mut self, name: impl Into<String>) -> Self {
        self.partials_dir_name = name.into();
        self
    }

    /// Sets whether to clean the output directory first.
    #[must_use]
    pub const fn clean(mut self, value: bool) -> Self {
        self.clean = value;
        self
    }

    /// Returns the full path of the partials directory.
    #[must_use]
    pub fn partials_dir(&self) -> PathBuf {
        self.input_dir.join(&self.partials_dir_name)
    }

    /// Returns true if `path` (relative to the input root) is the partials directory.
    pub(crate) fn is_partials_dir(&self, relative: &Path) -> bool {
        relative == Path::new(&self.partials_dir_name)
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self::new("site", "dist")
    }
}
