//! Product, blog and category shapes from the content API.

use serde::{Deserialize, Serialize};

// =============================================================================
// Categories
// =============================================================================

/// Synthetic id of the prepended "All" node in rendered category trees.
pub const ALL_CATEGORY_ID: &str = "__all__";

/// One node of the category tree.
///
/// `children` is never null: leaves carry an empty vec.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryNode {
    pub id: String,
    pub name: String,
    /// Routable path, e.g. `/shop/electronics`.
    pub path: String,
    pub parent_id: Option<String>,
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    /// Synthesize the "All" node prepended at the root level.
    ///
    /// Its path is the first segment of the first top-level category's
    /// path (`/shop/electronics` -> `/shop`); `root_path` only fills in
    /// when no category carries a path, else `#`.
    pub fn all_node(categories: &[CategoryNode], root_path: Option<&str>) -> CategoryNode {
        let path = categories
            .first()
            .and_then(|first| first.path.split('/').find(|s| !s.is_empty()))
            .map(|segment| format!("/{segment}"))
            .or_else(|| root_path.filter(|p| !p.is_empty()).map(str::to_owned))
            .unwrap_or_else(|| "#".into());

        CategoryNode {
            id: ALL_CATEGORY_ID.into(),
            name: "All".into(),
            path,
            parent_id: None,
            children: Vec::new(),
        }
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// Pagination descriptor.
///
/// The older API variant spelled this `{current_page, total_pages,
/// total_items}`; aliases map it onto the canonical shape. Total page
/// count is always derived from `total / size`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Pagination {
    #[serde(alias = "current_page")]
    pub page: u32,
    pub size: u32,
    #[serde(alias = "total_items")]
    pub total: u64,
}

impl Pagination {
    /// Derived total page count, `ceil(total / size)`.
    pub fn total_pages(&self) -> u32 {
        if self.size == 0 || self.total == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.size)).min(u64::from(u32::MAX)) as u32
    }
}

/// A page of items plus its pagination descriptor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PagedList<T> {
    pub list: Vec<T>,
    #[serde(flatten)]
    pub pagination: Pagination,
}

// =============================================================================
// Listings
// =============================================================================

/// Payload for the product-list-page and product-list-detail components.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductListData {
    pub categories: Vec<CategoryNode>,
    pub products: PagedList<ProductSummary>,
}

/// One product card in a listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductSummary {
    pub id: String,
    pub name: String,
    pub path: Option<String>,
    #[serde(alias = "image")]
    pub primary_image: Option<String>,
    pub summary: Option<String>,
}

/// Payload for the blog-list-page component.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BlogListData {
    pub categories: Vec<CategoryNode>,
    pub blogs: PagedList<BlogSummary>,
}

/// One blog card in a listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogSummary {
    pub id: String,
    pub name: String,
    pub path: Option<String>,
    pub primary_image: Option<String>,
    pub description: Option<String>,
    pub published_at: Option<String>,
}

// =============================================================================
// Detail records
// =============================================================================

/// Image attached to a detail record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailImage {
    pub id: Option<String>,
    pub name: Option<String>,
    pub url: String,
}

/// Downloadable attachment on a product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentFile {
    pub name: String,
    pub url: String,
}

/// Files attached to a detail record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailFiles {
    pub images: Vec<DetailImage>,
    pub attachments: Vec<AttachmentFile>,
}

/// Sales contact block on a product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
}

/// One tab of the product description section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentBlock {
    pub title: Option<String>,
    /// Rich HTML body, inserted verbatim.
    pub description: Option<String>,
}

/// Payload for the product-detail component.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductDetailData {
    pub id: String,
    pub name: Option<String>,
    pub summary: Option<String>,
    pub files: DetailFiles,
    pub contact: ContactInfo,
    pub contents: Vec<ContentBlock>,
}

/// Payload for the blog-detail component.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BlogDetailData {
    pub id: String,
    pub name: Option<String>,
    /// Rich HTML body, inserted verbatim.
    pub description: Option<String>,
    pub files: DetailFiles,
}

// =============================================================================
// Related content
// =============================================================================

/// Related product returned by the content API collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelatedProduct {
    pub id: String,
    pub name: String,
    pub path: Option<String>,
    #[serde(alias = "image")]
    pub primary_image: Option<String>,
}

/// Related blog returned by the content API collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelatedBlog {
    pub id: String,
    pub name: String,
    pub path: Option<String>,
    pub primary_image: Option<String>,
    pub published_at: Option<String>,
}
