//! Card rendering.
//!
//! A [`CardRenderer`] turns one ranked identifier plus its catalog row (if
//! any) into a [`Card`]. One [`RenderPolicy`] is applied to every card of
//! every submission:
//!
//! | Policy | Image | Title |
//! |--------|-------|-------|
//! | `graceful` (default) | `<local_image_prefix>/<identifier>` | `ProductTitle` as is, omitted on a miss |
//! | `catalog` | the row's `ImageURL` | `ProductTitle` uppercased |
//!
//! Under `catalog`, a lookup miss (or a row without `ImageURL`) renders the
//! same card `graceful` would.

use serde::Deserialize;
use tracing::warn;

use crate::models::{Card, CatalogRow};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RenderPolicy {
    /// Image from the catalog's `ImageURL`, uppercased title.
    Catalog,
    /// Local image path, title only when the catalog has the product.
    #[default]
    Graceful,
}

#[derive(Debug, Clone)]
pub struct CardRenderer {
    policy: RenderPolicy,
    local_image_prefix: String,
}

impl CardRenderer {
    pub fn new(policy: RenderPolicy, local_image_prefix: impl Into<String>) -> Self {
        Self {
            policy,
            local_image_prefix: local_image_prefix.into(),
        }
    }

    pub fn policy(&self) -> RenderPolicy {
        self.policy
    }

    pub fn render(&self, identifier: &str, row: Option<&CatalogRow>) -> Card {
        match (self.policy, row) {
            (RenderPolicy::Catalog, Some(row)) => match row.image_url() {
                Some(url) => Card {
                    identifier: identifier.to_string(),
                    image_src: url.to_string(),
                    title: row.product_title().map(str::to_uppercase),
                },
                None => {
                    warn!(identifier, "catalog row has no ImageURL, using local image");
                    self.local_card(identifier, None)
                }
            },
            (RenderPolicy::Catalog, None) => {
                warn!(identifier, "no catalog entry, rendering without product info");
                self.local_card(identifier, None)
            }
            (RenderPolicy::Graceful, row) => {
                self.local_card(identifier, row.and_then(CatalogRow::product_title))
            }
        }
    }

    fn local_card(&self, identifier: &str, title: Option<&str>) -> Card {
        let prefix = self.local_image_prefix.trim_end_matches('/');
        let image_src = if prefix.is_empty() {
            identifier.to_string()
        } else {
            format!("{prefix}/{identifier}")
        };
        Card {
            identifier: identifier.to_string(),
            image_src,
            title: title.map(str::to_string),
        }
    }
}

/// Bootstrap markup for one card, as the results grid expects it.
pub fn card_html(card: &Card) -> String {
    let mut html = String::new();
    html.push_str("<div class=\"col-md-3 mb-4\">\n");
    html.push_str("  <div class=\"image-card\">\n");
    html.push_str(&format!(
        "    <img src=\"{}\" alt=\"Similar image\">\n",
        escape_html(&card.image_src)
    ));
    if let Some(title) = &card.title {
        html.push_str("    <div class=\"product-info\">\n");
        html.push_str(&format!(
            "      <h5 class=\"image-title\">{}</h5>\n",
            escape_html(title)
        ));
        html.push_str("    </div>\n");
    }
    html.push_str("  </div>\n");
    html.push_str("</div>\n");
    html
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(image: &str, url: Option<&str>, title: &str) -> CatalogRow {
        let mut row = CatalogRow::new();
        row.insert("Image", Some(image.to_string()));
        row.insert("ImageURL", url.map(str::to_string));
        row.insert("ProductTitle", Some(title.to_string()));
        row
    }

    #[test]
    fn test_catalog_policy_hit() {
        let renderer = CardRenderer::new(RenderPolicy::Catalog, "static/images");
        let card = renderer.render(
            "img1.jpg",
            Some(&row("img1.jpg", Some("http://cdn/1.jpg"), "Red Shoe")),
        );
        assert_eq!(card.image_src, "http://cdn/1.jpg");
        assert_eq!(card.title.as_deref(), Some("RED SHOE"));
    }

    #[test]
    fn test_catalog_policy_miss_degrades() {
        let renderer = CardRenderer::new(RenderPolicy::Catalog, "static/images");
        let card = renderer.render("img2.jpg", None);
        assert_eq!(card.image_src, "static/images/img2.jpg");
        assert_eq!(card.title, None);

        let card = renderer.render("img3.jpg", Some(&row("img3.jpg", None, "Hat")));
        assert_eq!(card.image_src, "static/images/img3.jpg");
        assert_eq!(card.title, None);
    }

    #[test]
    fn test_graceful_policy() {
        let renderer = CardRenderer::new(RenderPolicy::Graceful, "static/images/");
        let hit = renderer.render(
            "img1.jpg",
            Some(&row("img1.jpg", Some("http://cdn/1.jpg"), "Red Shoe")),
        );
        assert_eq!(hit.image_src, "static/images/img1.jpg");
        assert_eq!(hit.title.as_deref(), Some("Red Shoe"));

        let miss = renderer.render("img2.jpg", None);
        assert_eq!(miss.image_src, "static/images/img2.jpg");
        assert_eq!(miss.title, None);
    }

    #[test]
    fn test_card_html_with_and_without_title() {
        let with_title = card_html(&Card {
            identifier: "1.jpg".to_string(),
            image_src: "http://cdn/1.jpg".to_string(),
            title: Some("RED & BLUE".to_string()),
        });
        assert!(with_title.contains("<img src=\"http://cdn/1.jpg\" alt=\"Similar image\">"));
        assert!(with_title.contains("<h5 class=\"image-title\">RED &amp; BLUE</h5>"));

        let bare = card_html(&Card {
            identifier: "2.jpg".to_string(),
            image_src: "static/images/2.jpg".to_string(),
            title: None,
        });
        assert!(!bare.contains("product-info"));
        assert!(bare.starts_with("<div class=\"col-md-3 mb-4\">"));
    }

    #[test]
    fn test_escape_attribute() {
        assert_eq!(escape_html("a\"b<c>'"), "a&quot;b&lt;c&gt;&#39;");
    }
}
