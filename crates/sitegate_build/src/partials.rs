//! Shared partials and the include renderer.
//!
//! A page pulls in a partial with a directive of the form
//! `{% include "partials/nav.html" %}`. Rendering is a single pass: the
//! inserted partial text is not scanned for further directives.

use crate::error::{BuildError, BuildResult};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

const OPEN: &str = "{%";
const CLOSE: &str = "%}";
const INCLUDE_KEYWORD: &str = "include";

/// The set of partials available to pages, keyed by include path.
#[derive(Debug, Clone, Default)]
pub struct Partials {
    entries: BTreeMap<String, String>,
}

impl Partials {
    /// Creates an empty partial set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every regular file directly under `<input_dir>/<dir_name>`.
    ///
    /// Files are keyed as `<dir_name>/<file name>`, which is the path pages
    /// use in their include directives. A missing directory yields an empty set.
    pub fn load(input_dir: &Path, dir_name: &str) -> BuildResult<Self> {
        let dir = input_dir.join(dir_name);
        let mut partials = Self::new();
        if !dir.is_dir() {
            debug!("no partials directory at {:?}", dir);
            return Ok(partials);
        }

        let entries = fs::read_dir(&dir).map_err(|e| BuildError::io(&dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| BuildError::io(&dir, e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let contents = fs::read_to_string(&path).map_err(|e| BuildError::io(&path, e))?;
            let key = format!("{}/{}", dir_name, entry.file_name().to_string_lossy());
            debug!("loaded partial {}", key);
            partials.insert(key, contents);
        }

        Ok(partials)
    }

    /// Adds or replaces a partial.
    pub fn insert(&mut self, key: impl Into<String>, contents: impl Into<String>) {
        self.entries.insert(key.into(), contents.into());
    }

    /// Returns the contents of a partial.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Returns the number of partials.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no partials.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of rendering one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// The page with all resolvable includes inlined.
    pub html: String,
    /// Include paths that named no known partial, in order of appearance.
    pub unresolved: Vec<String>,
}

/// Inlines every known include directive in `content`.
///
/// Directives naming an unknown partial are left in place and reported in
/// [`Rendered::unresolved`]. Other `{% ... %}` blocks pass through untouched.
pub fn render(content: &str, partials: &Partials) -> Rendered {
    let mut html = String::with_capacity(content.len());
    let mut unresolved = Vec::new();
    let mut rest = content;

    while let Some(open) = rest.find(OPEN) {
        let Some(close_rel) = rest[open + OPEN.len()..].find(CLOSE) else {
            break;
        };
        let close = open + OPEN.len() + close_rel;
        let end = close + CLOSE.len();

        html.push_str(&rest[..open]);
        let Some(path) = parse_include(&rest[open + OPEN.len()..close]) else {
            // Not an include; a later `{%` may still open one.
            html.push_str(OPEN);
            rest = &rest[open + OPEN.len()..];
            continue;
        };
        match partials.get(path) {
            Some(partial) => html.push_str(partial),
            None => {
                unresolved.push(path.to_string());
                html.push_str(&rest[open..end]);
            }
        }
        rest = &rest[end..];
    }
    html.push_str(rest);

    Rendered { html, unresolved }
}

/// Parses the inside of a `{% ... %}` block as `include "<path>"`.
fn parse_include(inner: &str) -> Option<&str> {
    let rest = inner.trim().strip_prefix(INCLUDE_KEYWORD)?;
    if rest.starts_with(|c: char| c.is_alphanumeric() || c == '_') {
        return None;
    }
    let rest = rest.trim_start();
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let body = &rest[quote.len_utf8()..];
    let close = body.find(quote)?;
    if !body[close + quote.len_utf8()..].trim().is_empty() {
        return None;
    }
    Some(&body[..close])
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn site_partials() -> Partials {
        let mut partials = Partials::new();
        partials.insert("partials/nav.html", "<nav>menu</nav>");
        partials.insert("partials/footer.html", "<footer>bye</footer>");
        partials
    }

    #[test]
    fn inlines_nav_and_footer() {
        let page = "<body>{% include \"partials/nav.html\" %}<main/>{% include \"partials/footer.html\" %}</body>";
        let rendered = render(page, &site_partials());
        assert_eq!(
            rendered.html,
            "<body><nav>menu</nav><main/><footer>bye</footer></body>"
        );
        assert!(rendered.unresolved.is_empty());
    }

    #[test]
    fn replaces_every_occurrence() {
        let page = "{% include \"partials/nav.html\" %}|{% include \"partials/nav.html\" %}";
        let rendered = render(page, &site_partials());
        assert_eq!(rendered.html, "<nav>menu</nav>|<nav>menu</nav>");
    }

    #[test]
    fn tolerates_whitespace_and_single_quotes() {
        let page = "{%include 'partials/nav.html'%}{%   include   \"partials/footer.html\"   %}";
        let rendered = render(page, &site_partials());
        assert_eq!(rendered.html, "<nav>menu</nav><footer>bye</footer>");
    }

    #[test]
    fn unknown_partial_is_left_in_place() {
        let page = "a{% include \"partials/sidebar.html\" %}b";
        let rendered = render(page, &site_partials());
        assert_eq!(rendered.html, page);
        assert_eq!(rendered.unresolved, vec!["partials/sidebar.html".to_string()]);
    }

    #[test]
    fn other_blocks_pass_through() {
        let page = "{% if user %}x{% endif %}{% includes \"partials/nav.html\" %}";
        let rendered = render(page, &site_partials());
        assert_eq!(rendered.html, page);
        assert!(rendered.unresolved.is_empty());
    }

    #[test]
    fn stray_open_tag_does_not_hide_a_later_include() {
        let page = "<script>s='{%'</script>{% include \"partials/nav.html\" %}";
        let rendered = render(page, &site_partials());
        assert_eq!(rendered.html, "<script>s='{%'</script><nav>menu</nav>");
        assert!(rendered.unresolved.is_empty());
    }

    #[test]
    fn unterminated_block_is_copied() {
        let page = "before {% include \"partials/nav.html\"";
        assert_eq!(render(page, &site_partials()).html, page);
    }

    #[test]
    fn partials_are_not_rescanned() {
        let mut partials = Partials::new();
        partials.insert("partials/a.html", "{% include \"partials/b.html\" %}");
        partials.insert("partials/b.html", "B");

        let rendered = render("{% include \"partials/a.html\" %}", &partials);
        assert_eq!(rendered.html, "{% include \"partials/b.html\" %}");
    }

    #[test]
    fn load_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let partials = Partials::load(dir.path(), "partials").unwrap();
        assert!(partials.is_empty());
    }

    #[test]
    fn load_keys_by_include_path() {
        let dir = tempfile::tempdir().unwrap();
        let partials_dir = dir.path().join("partials");
        fs::create_dir_all(partials_dir.join("nested")).unwrap();
        fs::write(partials_dir.join("nav.html"), "<nav/>").unwrap();
        fs::write(partials_dir.join("nested/skip.html"), "x").unwrap();

        let partials = Partials::load(dir.path(), "partials").unwrap();
        assert_eq!(partials.len(), 1);
        assert_eq!(partials.get("partials/nav.html"), Some("<nav/>"));
    }

    proptest! {
        #[test]
        fn text_without_blocks_is_unchanged(text in "[^{]*") {
            let rendered = render(&text, &site_partials());
            prop_assert_eq!(rendered.html, text);
        }
    }
}
