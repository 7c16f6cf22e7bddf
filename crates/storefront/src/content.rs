//! Markdown marketing pages (about, FAQ, shipping, legal).
//!
//! Pages are loaded from `content/pages/*.md` at startup. Each file starts
//! with YAML frontmatter (`title`, optional `description` and `updated_at`);
//! the file stem is the URL slug under `/pages/{slug}`.
//!
//! # Image Shortcodes
//!
//! ```markdown
//! {{image "https://api.hopwright.beer/media/brewhouse.jpg" alt="The brewhouse" width="1024"}}
//! ```
//!
//! renders an `<img>` served through the image CDN with a `srcset`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use chrono::NaiveDate;
use comrak::{Options, markdown_to_html};
use gray_matter::{Matter, ParsedEntity, engine::YAML};
use regex::Regex;
use serde::Deserialize;

use crate::images::ImageCdn;

/// Page frontmatter.
#[derive(Debug, Clone, Deserialize)]
pub struct PageMeta {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub updated_at: Option<NaiveDate>,
}

/// A rendered page.
#[derive(Debug, Clone)]
pub struct Page {
    pub slug: String,
    pub meta: PageMeta,
    pub content_html: String,
}

/// Content loading errors
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
}

/// All pages, rendered once at startup.
#[derive(Debug, Clone, Default)]
pub struct ContentStore {
    pages: Arc<HashMap<String, Page>>,
}

impl ContentStore {
    /// Load all pages under `content_dir/pages`.
    ///
    /// A missing directory yields an empty store; a page that fails to parse
    /// is logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be read.
    pub fn load(content_dir: &Path, images: &ImageCdn) -> Result<Self, ContentError> {
        let dir = content_dir.join("pages");
        let mut pages = HashMap::new();

        if !dir.exists() {
            tracing::warn!("Pages directory does not exist: {:?}", dir);
            return Ok(Self::default());
        }

        let entries = std::fs::read_dir(&dir).map_err(|e| ContentError::Io(e.to_string()))?;

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "md") {
                match Self::load_page(&path, images) {
                    Ok(page) => {
                        tracing::info!("Loaded page: {}", page.slug);
                        pages.insert(page.slug.clone(), page);
                    }
                    Err(e) => {
                        tracing::error!("Failed to load page {:?}: {}", path, e);
                    }
                }
            }
        }

        Ok(Self {
            pages: Arc::new(pages),
        })
    }

    fn load_page(path: &Path, images: &ImageCdn) -> Result<Page, ContentError> {
        let content = std::fs::read_to_string(path).map_err(|e| ContentError::Io(e.to_string()))?;

        let slug = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ContentError::Parse("Invalid filename".to_string()))?
            .to_string();

        let (meta, content_html) = parse_page(&content, images)?;

        Ok(Page {
            slug,
            meta,
            content_html,
        })
    }

    /// Get a page by slug
    #[must_use]
    pub fn get_page(&self, slug: &str) -> Option<&Page> {
        self.pages.get(slug)
    }

    /// Number of loaded pages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Split frontmatter from body and render the body.
fn parse_page(content: &str, images: &ImageCdn) -> Result<(PageMeta, String), ContentError> {
    let matter = Matter::<YAML>::new();
    let parsed: ParsedEntity<PageMeta> = matter
        .parse(content)
        .map_err(|e| ContentError::Parse(format!("Failed to parse frontmatter: {e}")))?;
    let meta = parsed
        .data
        .ok_or_else(|| ContentError::Parse("Missing frontmatter".to_string()))?;

    Ok((meta, render_markdown(&parsed.content, images)))
}

/// Render markdown to HTML with GitHub Flavored Markdown support.
///
/// Image shortcodes are expanded first.
fn render_markdown(content: &str, images: &ImageCdn) -> String {
    let processed = process_shortcodes(content, images);

    let mut options = Options::default();

    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.header_ids = Some(String::new());
    options.extension.footnotes = true;

    // Pages are authored in-repo; allow the raw HTML the shortcodes emit.
    options.render.r#unsafe = true;

    markdown_to_html(&processed, &options)
}

// =============================================================================
// Shortcode Processing
// =============================================================================

/// Matches `{{image "src" ...attributes}}`.
static IMAGE_SHORTCODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\{\{image\s+"([^"]+)"([^}]*)\}\}"#).expect("Invalid regex"));

/// Extracts `key="value"` attributes.
static ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\w+)="([^"]*)""#).expect("Invalid regex"));

const DEFAULT_SHORTCODE_WIDTH: u32 = 1024;

fn process_shortcodes(content: &str, images: &ImageCdn) -> String {
    IMAGE_SHORTCODE_RE
        .replace_all(content, |caps: &regex::Captures| {
            let src = caps.get(1).map_or("", |m| m.as_str());
            let attrs_str = caps.get(2).map_or("", |m| m.as_str());

            let mut alt = String::new();
            let mut class = String::new();
            let mut width = DEFAULT_SHORTCODE_WIDTH;

            for attr_cap in ATTR_RE.captures_iter(attrs_str) {
                let (Some(key), Some(value)) = (attr_cap.get(1), attr_cap.get(2)) else {
                    continue;
                };
                match key.as_str() {
                    "alt" => alt = escape_attr(value.as_str()),
                    "class" => class = escape_attr(value.as_str()),
                    "width" => width = value.as_str().parse().unwrap_or(DEFAULT_SHORTCODE_WIDTH),
                    _ => {}
                }
            }

            let url = images.url(Some(src), width);
            let srcset = images.srcset(Some(src));
            let srcset_attr = if srcset.is_empty() {
                String::new()
            } else {
                format!(r#" srcset="{srcset}" sizes="(max-width: {width}px) 100vw, {width}px""#)
            };
            let class_attr = if class.is_empty() {
                String::new()
            } else {
                format!(r#" class="{class}""#)
            };

            format!(
                r#"<img src="{url}"{srcset_attr}{class_attr} alt="{alt}" loading="lazy" decoding="async">"#
            )
        })
        .into_owned()
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ImageCdnConfig;

    fn plain_images() -> ImageCdn {
        ImageCdn::new(&ImageCdnConfig::default(), "https://hopwright.beer")
    }

    #[test]
    fn test_parse_page_frontmatter_and_body() {
        let source = "---\ntitle: About Us\nupdated_at: 2026-03-01\n---\n\n# Brewed in Portland\n\nSmall ~~batch~~ beer.\n";
        let (meta, html) = parse_page(source, &plain_images()).unwrap();
        assert_eq!(meta.title, "About Us");
        assert_eq!(meta.updated_at, NaiveDate::from_ymd_opt(2026, 3, 1));
        assert!(html.contains("<h1"));
        assert!(html.contains("<del>batch</del>"));
    }

    #[test]
    fn test_missing_frontmatter_is_an_error() {
        assert!(parse_page("# No frontmatter", &plain_images()).is_err());
    }

    #[test]
    fn test_image_shortcode_through_cdn() {
        let images = ImageCdn::new(
            &ImageCdnConfig {
                base_url: Some("https://cdn.test/fetch".to_string()),
            },
            "https://hopwright.beer",
        );
        let html = process_shortcodes(
            r#"{{image "/media/tanks.jpg" alt="Our tanks" width="640"}}"#,
            &images,
        );
        assert!(html.starts_with(
            r#"<img src="https://cdn.test/fetch/w_640,c_limit,f_auto,q_auto/https://hopwright.beer/media/tanks.jpg""#
        ));
        assert!(html.contains("srcset="));
    }

    #[test]
    fn test_image_shortcode_without_cdn() {
        let html = process_shortcodes(
            r#"{{image "/media/tanks.jpg" alt="Tanks & kegs"}}"#,
            &plain_images(),
        );
        assert_eq!(
            html,
            r#"<img src="/media/tanks.jpg" alt="Tanks &amp; kegs" loading="lazy" decoding="async">"#
        );
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let store = ContentStore::load(Path::new("/nonexistent/content"), &plain_images()).unwrap();
        assert!(store.is_empty());
    }
}
