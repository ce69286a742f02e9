//! `sitegate build`

use sitegate_build::{BuildConfig, Builder};
use std::path::Path;
use tracing::info;

/// Renders `input` into `output`.
pub fn run(input: &Path, output: &Path, clean: bool) -> Result<(), Box<dyn std::error::Error>> {
    info!("Building site from {:?}", input);

    let config = BuildConfig::new(input, output).clean(clean);
    let report = Builder::new(config).run()?;

    println!("✓ Site built");
    println!("  Output: {:?}", output);
    println!("  Pages rendered: {}", report.pages_rendered);
    println!("  Files copied: {}", report.files_copied);
    println!("  Unchanged: {}", report.files_unchanged);

    if !report.unresolved_includes.is_empty() {
        println!("  Unresolved includes:");
        for (page, include) in &report.unresolved_includes {
            println!("    {}: {}", page.display(), include);
        }
    }

    Ok(())
}
