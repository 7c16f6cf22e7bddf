//! Product image URLs through the image CDN.
//!
//! With a CDN configured, source URLs are rewritten into fetch URLs with a
//! width hint (`{cdn}/w_{width},c_limit,f_auto,q_auto/{absolute source}`).
//! Without one, the source URL is served as-is.

use crate::config::ImageCdnConfig;

/// Widths offered in `srcset` attributes.
pub const SRCSET_WIDTHS: [u32; 4] = [320, 640, 1024, 1600];

/// Shown when a product has no image.
pub const PLACEHOLDER_IMAGE: &str = "/static/images/placeholder.svg";

/// Image URL builder.
#[derive(Debug, Clone)]
pub struct ImageCdn {
    base_url: Option<String>,
    origin: String,
}

impl ImageCdn {
    /// `origin` is the storefront's public URL, used to absolutize relative sources.
    #[must_use]
    pub fn new(config: &ImageCdnConfig, origin: &str) -> Self {
        Self {
            base_url: config.base_url.clone(),
            origin: origin.trim_end_matches('/').to_string(),
        }
    }

    /// URL for `source` at `width` pixels.
    #[must_use]
    pub fn url(&self, source: Option<&str>, width: u32) -> String {
        let Some(source) = source.map(str::trim).filter(|s| !s.is_empty()) else {
            return PLACEHOLDER_IMAGE.to_string();
        };

        let Some(base) = &self.base_url else {
            return source.to_string();
        };

        let absolute = if source.starts_with("http://") || source.starts_with("https://") {
            source.to_string()
        } else {
            format!("{}/{}", self.origin, source.trim_start_matches('/'))
        };

        format!("{base}/w_{width},c_limit,f_auto,q_auto/{absolute}")
    }

    /// `srcset` attribute value, empty without a CDN.
    #[must_use]
    pub fn srcset(&self, source: Option<&str>) -> String {
        if self.base_url.is_none() || source.is_none_or(|s| s.trim().is_empty()) {
            return String::new();
        }
        SRCSET_WIDTHS
            .iter()
            .map(|&width| format!("{} {width}w", self.url(source, width)))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cdn() -> ImageCdn {
        ImageCdn::new(
            &ImageCdnConfig {
                base_url: Some("https://res.cloudinary.com/hopwright/image/fetch".to_string()),
            },
            "https://hopwright.beer/",
        )
    }

    #[test]
    fn test_rewrites_absolute_source() {
        assert_eq!(
            cdn().url(Some("https://api.hopwright.beer/media/ipa.jpg"), 640),
            "https://res.cloudinary.com/hopwright/image/fetch/w_640,c_limit,f_auto,q_auto/https://api.hopwright.beer/media/ipa.jpg"
        );
    }

    #[test]
    fn test_absolutizes_relative_source() {
        assert!(
            cdn()
                .url(Some("/media/ipa.jpg"), 320)
                .ends_with("/w_320,c_limit,f_auto,q_auto/https://hopwright.beer/media/ipa.jpg")
        );
    }

    #[test]
    fn test_without_cdn_passes_through() {
        let plain = ImageCdn::new(&ImageCdnConfig::default(), "https://hopwright.beer");
        assert_eq!(plain.url(Some("/media/ipa.jpg"), 640), "/media/ipa.jpg");
        assert_eq!(plain.srcset(Some("/media/ipa.jpg")), "");
    }

    #[test]
    fn test_missing_image_uses_placeholder() {
        assert_eq!(cdn().url(None, 640), PLACEHOLDER_IMAGE);
        assert_eq!(cdn().url(Some("  "), 640), PLACEHOLDER_IMAGE);
        assert_eq!(cdn().srcset(None), "");
    }

    #[test]
    fn test_srcset_lists_every_width() {
        let srcset = cdn().srcset(Some("https://x.test/a.jpg"));
        assert_eq!(srcset.matches("c_limit").count(), SRCSET_WIDTHS.len());
        assert!(srcset.ends_with("1600w"));
    }
}
