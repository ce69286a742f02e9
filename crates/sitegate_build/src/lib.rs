//! # Sitegate Build
//!
//! Static site builder for sitegate.
//!
//! The builder walks an input tree, inlines shared HTML partials into every
//! page and writes the result into an output directory:
//!
//! ```text
//! site/                     dist/
//! ├─ partials/              │  (skipped)
//! │  ├─ nav.html            │
//! │  └─ footer.html         │
//! ├─ index.html   ───────►  ├─ index.html   (includes inlined)
//! ├─ css/site.css ───────►  ├─ css/site.css (copied)
//! └─ js/app.js    ───────►  └─ js/app.js    (copied)
//! ```
//!
//! Pages reference partials with an include directive:
//!
//! ```html
//! {% include "partials/nav.html" %}
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sitegate_build::{BuildConfig, Builder};
//!
//! let config = BuildConfig::new("site", "dist").clean(true);
//! let report = Builder::new(config).run()?;
//! println!("{} pages rendered", report.pages_rendered);
//! # Ok::<(), sitegate_build::BuildError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod builder;
mod config;
mod error;
mod partials;

pub use builder::{BuildReport, Builder};
pub use config::BuildConfig;
pub use error::{BuildError, BuildResult};
pub use partials::{render, Partials, Rendered};
