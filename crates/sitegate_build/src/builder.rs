//! The site builder.

use crate::config::BuildConfig;
use crate::error::{BuildError, BuildResult};
use crate::partials::{render, Partials};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Summary of a completed build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// HTML pages rendered.
    pub pages_rendered: usize,
    /// Other files copied.
    pub files_copied: usize,
    /// Outputs (pages or files) left untouched because their content was identical.
    pub files_unchanged: usize,
    /// Include directives that named no known partial: (page, include path).
    pub unresolved_includes: Vec<(PathBuf, String)>,
}

impl BuildReport {
    /// Total number of output files produced or confirmed.
    pub fn total_files(&self) -> usize {
        self.pages_rendered + self.files_copied
    }
}

/// Renders an input tree into an output directory.
///
/// # Example
///
/// ```rust,no_run
/// use sitegate_build::{BuildConfig, Builder};
///
/// let report = Builder::new(BuildConfig::new("site", "dist")).run()?;
/// assert!(report.unresolved_includes.is_empty());
/// # Ok::<(), sitegate_build::BuildError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Builder {
    config: BuildConfig,
}

impl Builder {
    /// Creates a builder for the given configuration.
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    /// Returns the build configuration.
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Runs the build.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The input directory does not exist (`InputMissing`)
    /// - The output directory is inside the input tree (`OutputInsideInput`)
    /// - The input tree is inside the output directory (`InputInsideOutput`)
    /// - Any file cannot be read or written
    pub fn run(&self) -> BuildResult<BuildReport> {
        let input = &self.config.input_dir;
        let output = &self.config.output_dir;

        if !input.is_dir() {
            return Err(BuildError::InputMissing(input.clone()));
        }
        self.check_output_location()?;

        if self.config.clean && output.exists() {
            info!("Cleaning {:?}", output);
            fs::remove_dir_all(output).map_err(|e| BuildError::io(output, e))?;
        }
        fs::create_dir_all(output).map_err(|e| BuildError::io(output, e))?;

        let partials = Partials::load(input, &self.config.partials_dir_name)?;
        info!(
            "Building {:?} -> {:?} with {} partials",
            input,
            output,
            partials.len()
        );

        let mut report = BuildReport::default();
        let walker = WalkDir::new(input)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                !(entry.depth() == 1
                    && entry.file_type().is_dir()
                    && self.config.is_partials_dir(Path::new(entry.file_name())))
            });

        for entry in walker {
            let entry = entry?;
            let source = entry.path();
            let relative = source.strip_prefix(input).unwrap_or(source);
            let dest = output.join(relative);

            if entry.file_type().is_dir() {
                fs::create_dir_all(&dest).map_err(|e| BuildError::io(&dest, e))?;
                continue;
            }
            if !source.is_file() {
                debug!("skipping {:?}: not a regular file", source);
                continue;
            }

            let bytes = fs::read(source).map_err(|e| BuildError::io(source, e))?;
            let written = if is_html(source) {
                report.pages_rendered += 1;
                let page = self.render_page(relative, bytes, &partials, &mut report);
                write_if_changed(&dest, &page)?
            } else {
                report.files_copied += 1;
                write_if_changed(&dest, &bytes)?
            };

            if written {
                debug!("wrote {:?}", dest);
            } else {
                report.files_unchanged += 1;
            }
        }

        info!(
            "Build complete: {} pages, {} files, {} unchanged",
            report.pages_rendered, report.files_copied, report.files_unchanged
        );
        Ok(report)
    }

    fn render_page(
        &self,
        relative: &Path,
        bytes: Vec<u8>,
        partials: &Partials,
        report: &mut BuildReport,
    ) -> Vec<u8> {
        match String::from_utf8(bytes) {
            Ok(content) => {
                let rendered = render(&content, partials);
                for include in rendered.unresolved {
                    warn!("{:?}: unresolved include {:?}", relative, include);
                    report
                        .unresolved_includes
                        .push((relative.to_path_buf(), include));
                }
                rendered.html.into_bytes()
            }
            Err(err) => {
                warn!("{:?} is not valid UTF-8, copying verbatim", relative);
                err.into_bytes()
            }
        }
    }

    fn check_output_location(&self) -> BuildResult<()> {
        let input = absolute(&self.config.input_dir)?;
        let output = absolute(&self.config.output_dir)?;
        if input.starts_with(&output) {
            return Err(BuildError::InputInsideOutput {
                input: self.config.input_dir.clone(),
                output: self.config.output_dir.clone(),
            });
        }
        if output.starts_with(&input) {
            return Err(BuildError::OutputInsideInput {
                input: self.config.input_dir.clone(),
                output: self.config.output_dir.clone(),
            });
        }
        Ok(())
    }
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html"))
}

/// Resolves `path` to an absolute path with `..` and symlinks resolved.
///
/// Missing trailing components are appended to the canonical form of the
/// nearest existing ancestor.
fn absolute(path: &Path) -> BuildResult<PathBuf> {
    let full = std::path::absolute(path).map_err(|e| BuildError::io(path, e))?;
    let mut missing = Vec::new();
    let mut existing = normalize(&full);
    while !existing.exists() {
        let Some(name) = existing.file_name() else {
            break;
        };
        missing.push(name.to_os_string());
        if !existing.pop() {
            break;
        }
    }
    let mut resolved = fs::canonicalize(&existing).map_err(|e| BuildError::io(&existing, e))?;
    resolved.extend(missing.iter().rev());
    Ok(resolved)
}

/// Lexically removes `.` and `..` components from an absolute path.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Writes `bytes` to `dest` unless the existing file already has the same content.
///
/// Returns true if the file was written.
fn write_if_changed(dest: &Path, bytes: &[u8]) -> BuildResult<bool> {
    if let Ok(existing) = fs::read(dest) {
        if Sha256::digest(&existing) == Sha256::digest(bytes) {
            return Ok(false);
        }
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
    }
    fs::write(dest, bytes).map_err(|e| BuildError::io(dest, e))?;
    Ok(true)
}
