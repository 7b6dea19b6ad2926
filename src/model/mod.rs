//! Data shapes handed to the pipeline by the route layer.
//!
//! Everything here deserializes from the backend content API's JSON; the
//! pipeline itself only reads these types. Field aliases cover the older
//! API spellings still in circulation.

pub mod catalog;
pub mod nav;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use catalog::{
    AttachmentFile, BlogDetailData, BlogListData, BlogSummary, CategoryNode, ContactInfo,
    ContentBlock, DetailFiles, DetailImage, PagedList, Pagination, ProductDetailData,
    ProductListData, ProductSummary, RelatedBlog, RelatedProduct,
};
pub use nav::{MenuData, MenuItem};

// =============================================================================
// Assets
// =============================================================================

/// Metadata side-table entry for one asset, keyed by URL.
///
/// The key is the first non-empty of `src`, `url`, `path`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AssetMeta {
    pub src: Option<String>,
    pub url: Option<String>,
    pub path: Option<String>,
    pub alt: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Force eager/high-priority loading for this asset.
    pub priority: bool,
    /// Inline placeholder (blur hash / data URI) exposed as `data-placeholder`.
    pub placeholder: Option<String>,
    /// Responsive art-direction sources; wraps the `<img>` in `<picture>`.
    pub sources: Vec<PictureSource>,
    /// Flat srcset applied directly when no `sources` are given.
    pub src_set: Option<String>,
    pub sizes: Option<String>,
}

impl AssetMeta {
    /// Lookup key: first non-empty of src / url / path.
    pub fn key(&self) -> Option<&str> {
        [&self.src, &self.url, &self.path]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|s| !s.is_empty())
    }
}

/// One `<source>` entry for responsive art direction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PictureSource {
    #[serde(alias = "srcSet")]
    pub srcset: Option<String>,
    pub src: Option<String>,
    pub url: Option<String>,
    /// MIME type, e.g. `image/webp`.
    #[serde(rename = "type")]
    pub mime: Option<String>,
    /// Media query, e.g. `(max-width: 600px)`.
    pub media: Option<String>,
}

impl PictureSource {
    /// Effective srcset: first non-empty of srcset / src / url.
    pub fn effective_srcset(&self) -> Option<&str> {
        [&self.srcset, &self.src, &self.url]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|s| !s.is_empty())
    }
}

// =============================================================================
// Global components
// =============================================================================

/// A tenant-wide component record (header, footer) from the content API.
#[derive(Debug, Clone, Deserialize)]
pub struct GlobalComponent {
    /// Component family: `header`, `footer` or `global-footer`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub json_data: GlobalComponentData,
}

/// Payload of a global component.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GlobalComponentData {
    /// Opaque HTML blob inserted verbatim.
    pub html: Option<String>,
    /// Companion CSS; header CSS is always critical.
    pub css: Option<String>,
    /// Header layout variant, selects `/styles/global-header-<variant>.css`.
    pub variant: Option<String>,
    /// Menu tree; either a JSON object or a JSON-encoded string.
    #[serde(alias = "menuData")]
    pub menu_data: Option<Value>,
    /// Newer records nest the menu under `components.menuData`.
    pub components: Option<NestedComponentData>,
}

impl GlobalComponentData {
    /// Menu data regardless of record vintage.
    pub fn effective_menu_data(&self) -> Option<&Value> {
        self.components
            .as_ref()
            .and_then(|c| c.menu_data.as_ref())
            .or(self.menu_data.as_ref())
    }
}

/// Nested component payload used by newer header records.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NestedComponentData {
    #[serde(alias = "menuData")]
    pub menu_data: Option<Value>,
}

// =============================================================================
// Request context
// =============================================================================

/// Per-request routing context.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Current request path, e.g. `/products`.
    pub path: String,
    /// Current query parameters in order of appearance.
    pub params: Vec<(String, String)>,
    /// Category the request is scoped to, for sidebar highlighting.
    pub category_id: Option<String>,
}

impl RequestContext {
    /// Value of a query parameter, if present.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Current path normalized to start with `/`.
    pub fn absolute_path(&self) -> String {
        if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_key_first_non_empty_wins() {
        let meta = AssetMeta {
            src: Some(String::new()),
            url: Some("/a.webp".into()),
            path: Some("/b.webp".into()),
            ..Default::default()
        };
        assert_eq!(meta.key(), Some("/a.webp"));
    }

    #[test]
    fn test_global_component_nested_menu_precedence() {
        let data: GlobalComponentData = serde_json::from_value(serde_json::json!({
            "menuData": {"items": []},
            "components": {"menuData": {"items": [{"id": "1", "label": "Home", "url": "/"}]}}
        }))
        .unwrap();
        let menu = data.effective_menu_data().unwrap();
        assert_eq!(menu["items"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_request_context_absolute_path() {
        let ctx = RequestContext {
            path: "products".into(),
            ..Default::default()
        };
        assert_eq!(ctx.absolute_path(), "/products");
    }
}
