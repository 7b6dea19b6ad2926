//! Component marker dispatch.
//!
//! Authored pages embed dynamic regions by tagging an element with the
//! marker attribute; its value names the component family. Dispatch is a
//! closed enum rather than string comparisons scattered through the walk.

/// Attribute naming the component family of a subtree.
pub const COMPONENT_MARKER: &str = "data-component-type";

/// Attribute carrying the optional JSON-encoded component configuration.
pub const COMPONENT_CONFIG: &str = "data-config";

/// Known component families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    ProductListPage,
    ProductListDetail,
    ProductDetail,
    BlogListPage,
    BlogDetail,
    Header,
    Footer,
    GlobalFooter,
}

impl ComponentKind {
    /// Parse a marker attribute value. Unknown values are skipped by the
    /// walk, not errors.
    pub fn from_marker(value: &str) -> Option<Self> {
        match value {
            "product-list-page" => Some(Self::ProductListPage),
            "product-list-detail" => Some(Self::ProductListDetail),
            "product-detail" => Some(Self::ProductDetail),
            "blog-list-page" => Some(Self::BlogListPage),
            "blog-detail" => Some(Self::BlogDetail),
            "header" => Some(Self::Header),
            "footer" => Some(Self::Footer),
            "global-footer" => Some(Self::GlobalFooter),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProductListPage => "product-list-page",
            Self::ProductListDetail => "product-list-detail",
            Self::ProductDetail => "product-detail",
            Self::BlogListPage => "blog-list-page",
            Self::BlogDetail => "blog-detail",
            Self::Header => "header",
            Self::Footer => "footer",
            Self::GlobalFooter => "global-footer",
        }
    }
}
