//! Listing component injectors: product-list-page, product-list-detail
//! and blog-list-page.
//!
//! Each injector fills the marked sub-containers inside its component
//! element (category sidebar, content grid/list, paginator) and
//! pre-selects the sort `<select>`. Missing containers are soft
//! failures: log, skip that sub-step, keep rendering.

use serde::Deserialize;

use crate::config::RenderConfig;
use crate::dom::{Document, NodeId};
use crate::model::{BlogListData, Pagination, ProductListData, RequestContext};
use crate::render::component::COMPONENT_CONFIG;
use crate::render::listing_html::{
    GridColumns, generate_blog_grid, generate_blog_list, generate_category_tree,
    generate_pagination, generate_product_grid, generate_product_list, results_count,
};
use crate::utils::sort::{SortKind, is_valid_sort_value};

// =============================================================================
// Component configuration
// =============================================================================

fn default_true() -> bool {
    true
}

/// Column counts in the authored config blob.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ColumnsConfig {
    pub desktop: u8,
    pub tablet: u8,
    pub mobile: u8,
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        let defaults = GridColumns::default();
        Self {
            desktop: defaults.desktop,
            tablet: defaults.tablet,
            mobile: defaults.mobile,
        }
    }
}

impl From<ColumnsConfig> for GridColumns {
    fn from(c: ColumnsConfig) -> Self {
        Self { desktop: c.desktop, tablet: c.tablet, mobile: c.mobile }
    }
}

/// JSON configuration blob authored on the component element.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComponentConfig {
    /// `grid` or `list`; the `data-variant` attribute wins over this.
    pub display_mode: Option<String>,
    #[serde(default = "default_true")]
    pub default_expand_categories: bool,
    #[serde(default = "default_true")]
    pub show_categories: bool,
    #[serde(default = "default_true")]
    pub show_product_description: bool,
    #[serde(default = "default_true")]
    pub show_description: bool,
    #[serde(default = "default_true")]
    pub show_publish_date: bool,
    pub default_sort: Option<String>,
    pub columns: Option<ColumnsConfig>,
}

// An element without a config blob gets the same defaults as an empty
// blob; the derive would zero the `default_true` fields.
impl Default for ComponentConfig {
    fn default() -> Self {
        Self {
            display_mode: None,
            default_expand_categories: true,
            show_categories: true,
            show_product_description: true,
            show_description: true,
            show_publish_date: true,
            default_sort: None,
            columns: None,
        }
    }
}

impl ComponentConfig {
    /// Read from the element's config attribute; unparsable blobs log
    /// and fall back to defaults.
    pub fn read(doc: &Document, elem: NodeId) -> Self {
        let Some(raw) = doc.attr(elem, COMPONENT_CONFIG) else {
            return Self::default();
        };
        match serde_json::from_str(raw) {
            Ok(config) => config,
            Err(e) => {
                warn!("render"; "component config failed to parse, using defaults: {e}");
                Self::default()
            }
        }
    }
}

// Grid/list layout variant; attribute wins over config.
fn layout_variant<'a>(doc: &'a Document, elem: NodeId, config: &'a ComponentConfig) -> &'a str {
    doc.attr(elem, "data-variant")
        .or(config.display_mode.as_deref())
        .unwrap_or("grid")
}

// =============================================================================
// Injectors
// =============================================================================

/// Product list page: category sidebar + product grid/list + paginator.
pub fn process_product_list_page(
    doc: &mut Document,
    elem: NodeId,
    data: &ProductListData,
    ctx: &RequestContext,
    render_config: &RenderConfig,
) {
    let config = ComponentConfig::read(doc, elem);

    if config.show_categories {
        inject_categories(doc, elem, "plp", &data.categories, ctx, &config);
    }

    inject_products(doc, elem, "plp-products-content", data, &config);
    inject_pagination(doc, elem, "plp", &data.products.pagination, ctx, "products", false);
    preselect_sort(doc, elem, "plp-sort-select", SortKind::Product, ctx, &config, render_config);
}

/// Product list detail: same as the list page minus the category
/// sidebar (used for "all items in this category" sub-views).
pub fn process_product_list_detail(
    doc: &mut Document,
    elem: NodeId,
    data: &ProductListData,
    ctx: &RequestContext,
    render_config: &RenderConfig,
) {
    let config = ComponentConfig::read(doc, elem);

    inject_products(doc, elem, "pld-products-content", data, &config);
    inject_pagination(doc, elem, "pld", &data.products.pagination, ctx, "products", false);
    preselect_sort(doc, elem, "pld-sort-select", SortKind::Product, ctx, &config, render_config);
}

/// Blog list page: category sidebar + blog grid/list + paginator.
pub fn process_blog_list_page(
    doc: &mut Document,
    elem: NodeId,
    data: &BlogListData,
    ctx: &RequestContext,
    render_config: &RenderConfig,
) {
    let config = ComponentConfig::read(doc, elem);

    if config.show_categories {
        inject_categories(doc, elem, "blp", &data.categories, ctx, &config);
    }

    if let Some(container) = doc.first_by_class(elem, "blp-blogs-content") {
        let html = if layout_variant(doc, elem, &config) == "list" {
            generate_blog_list(&data.blogs.list, config.show_description, config.show_publish_date)
        } else {
            generate_blog_grid(&data.blogs.list, config.show_description, config.show_publish_date)
        };
        doc.set_inner_html(container, &html);
        debug!("render"; "blogs injected: {}", data.blogs.list.len());
    } else {
        warn!("render"; "blog list component has no .blp-blogs-content container");
    }

    inject_pagination(doc, elem, "blp", &data.blogs.pagination, ctx, "posts", true);
    preselect_sort(doc, elem, "blp-sort-select", SortKind::Blog, ctx, &config, render_config);
}

// =============================================================================
// Shared steps
// =============================================================================

fn inject_categories(
    doc: &mut Document,
    elem: NodeId,
    prefix: &str,
    categories: &[crate::model::CategoryNode],
    ctx: &RequestContext,
    config: &ComponentConfig,
) {
    let container_class = format!("{prefix}-categories");
    let Some(container) = doc.first_by_class(elem, &container_class) else {
        warn!("render"; "listing component has no .{container_class} container");
        return;
    };
    if categories.is_empty() {
        return;
    }

    // Fallback for the All link when no category carries a path.
    let root_path = ctx.absolute_path();
    let html = generate_category_tree(
        prefix,
        categories,
        0,
        ctx.category_id.as_deref(),
        Some(&root_path),
        config.default_expand_categories,
    );
    doc.set_inner_html(container, &html);
    debug!("render"; "categories injected: {}", categories.len());
}

fn inject_products(
    doc: &mut Document,
    elem: NodeId,
    container_class: &str,
    data: &ProductListData,
    config: &ComponentConfig,
) {
    let Some(container) = doc.first_by_class(elem, container_class) else {
        warn!("render"; "listing component has no .{container_class} container");
        return;
    };

    let show_description = config.show_product_description;
    let html = if layout_variant(doc, elem, config) == "list" {
        generate_product_list(&data.products.list, show_description)
    } else {
        let columns = config.columns.map(GridColumns::from).unwrap_or_default();
        generate_product_grid(&data.products.list, columns, show_description)
    };
    doc.set_inner_html(container, &html);
    debug!("render"; "products injected: {}", data.products.list.len());
}

fn inject_pagination(
    doc: &mut Document,
    elem: NodeId,
    prefix: &str,
    pagination: &Pagination,
    ctx: &RequestContext,
    noun: &str,
    caption_only_when_nonzero: bool,
) {
    let container_class = format!("{prefix}-pagination-wrapper");
    let Some(container) = doc.first_by_class(elem, &container_class) else {
        warn!("render"; "listing component has no .{container_class} container");
        return;
    };

    let mut html = generate_pagination(prefix, pagination, &ctx.params);
    if pagination.total > 0 || !caption_only_when_nonzero {
        html.push_str(&results_count(prefix, pagination.total, noun));
    }
    doc.set_inner_html(container, &html);
}

/// Pre-select the sort option matching the current request so the
/// control reflects state without a client round-trip.
fn preselect_sort(
    doc: &mut Document,
    elem: NodeId,
    select_class: &str,
    kind: SortKind,
    ctx: &RequestContext,
    config: &ComponentConfig,
    render_config: &RenderConfig,
) {
    let Some(select) = doc.first_by_class(elem, select_class) else {
        return;
    };

    let configured = match kind {
        SortKind::Product => render_config.product_sort_default.as_str(),
        SortKind::Blog => render_config.blog_sort_default.as_str(),
    };
    let current = [ctx.param("sort"), config.default_sort.as_deref(), Some(configured)]
        .into_iter()
        .flatten()
        .find(|v| is_valid_sort_value(v, kind))
        .unwrap_or(kind.default_value())
        .to_owned();

    doc.set_attr(select, "data-current-sort", &current);
    for option in doc.all_by_tag(select, "option") {
        if doc.attr(option, "value") == Some(current.as_str()) {
            doc.set_attr(option, "selected", "selected");
        } else {
            doc.remove_attr(option, "selected");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CategoryNode, PagedList, ProductSummary};

    fn product_data(count: usize, total: u64) -> ProductListData {
        ProductListData {
            categories: vec![CategoryNode {
                id: "c1".into(),
                name: "Electronics".into(),
                path: "/shop/electronics".into(),
                ..Default::default()
            }],
            products: PagedList {
                list: (0..count)
                    .map(|i| ProductSummary {
                        id: format!("p{i}"),
                        name: format!("Product {i}"),
                        path: Some(format!("/products/p{i}")),
                        ..Default::default()
                    })
                    .collect(),
                pagination: Pagination { page: 1, size: 12, total },
            },
        }
    }

    fn plp_doc() -> Document {
        Document::parse(
            r#"<section data-component-type="product-list-page">
                 <aside class="plp-categories"></aside>
                 <div class="plp-products-content"></div>
                 <div class="plp-pagination-wrapper"></div>
                 <select class="plp-sort-select">
                   <option value="name-asc">Name A-Z</option>
                   <option value="name-desc" selected>Name Z-A</option>
                 </select>
               </section>"#,
        )
        .unwrap_or_else(|_| Document::new())
    }

    #[test]
    fn test_product_list_page_fills_all_containers() {
        let mut doc = plp_doc();
        let elem = doc.first_by_tag(doc.root(), "section").unwrap();
        let ctx = RequestContext { path: "/products".into(), ..Default::default() };
        process_product_list_page(&mut doc, elem, &product_data(2, 30), &ctx, &RenderConfig::default());

        let html = doc.to_html();
        assert!(html.contains("plp-category-list"));
        assert!(html.contains(r#"href="/shop""#), "All node truncates the first category path");
        assert!(html.contains("plp-products-grid"));
        assert!(html.contains(">Product 0<"));
        assert!(html.contains("plp-pagination"));
        assert!(html.contains(r#"<strong>30</strong> products"#));
    }

    #[test]
    fn test_absent_config_blob_matches_empty_blob() {
        let absent = ComponentConfig::default();
        let empty: ComponentConfig = serde_json::from_str("{}").unwrap();
        for config in [&absent, &empty] {
            assert!(config.show_categories);
            assert!(config.default_expand_categories);
            assert!(config.show_product_description);
            assert!(config.show_description);
            assert!(config.show_publish_date);
        }
    }

    #[test]
    fn test_unconfigured_component_still_gets_categories() {
        let mut doc = plp_doc();
        let elem = doc.first_by_tag(doc.root(), "section").unwrap();
        assert!(doc.attr(elem, COMPONENT_CONFIG).is_none());
        process_product_list_page(
            &mut doc,
            elem,
            &product_data(1, 1),
            &RequestContext::default(),
            &RenderConfig::default(),
        );
        let html = doc.to_html();
        assert!(html.contains("plp-category-list"));
        assert!(html.contains(">Electronics<"));
    }

    #[test]
    fn test_sort_preselection_from_query() {
        let mut doc = plp_doc();
        let elem = doc.first_by_tag(doc.root(), "section").unwrap();
        let ctx = RequestContext {
            path: "/products".into(),
            params: vec![("sort".into(), "name-asc".into())],
            ..Default::default()
        };
        process_product_list_page(&mut doc, elem, &product_data(1, 1), &ctx, &RenderConfig::default());

        let select = doc.first_by_class(doc.root(), "plp-sort-select").unwrap();
        assert_eq!(doc.attr(select, "data-current-sort"), Some("name-asc"));
        let options = doc.all_by_tag(select, "option");
        assert_eq!(doc.attr(options[0], "selected"), Some("selected"));
        assert!(doc.attr(options[1], "selected").is_none(), "stale selected removed");
    }

    #[test]
    fn test_invalid_query_sort_falls_back() {
        let mut doc = plp_doc();
        let elem = doc.first_by_tag(doc.root(), "section").unwrap();
        let ctx = RequestContext {
            path: "/products".into(),
            params: vec![("sort".into(), "bogus".into())],
            ..Default::default()
        };
        process_product_list_page(&mut doc, elem, &product_data(1, 1), &ctx, &RenderConfig::default());

        let select = doc.first_by_class(doc.root(), "plp-sort-select").unwrap();
        assert_eq!(doc.attr(select, "data-current-sort"), Some("name-asc"));
    }

    #[test]
    fn test_list_variant_from_attribute() {
        let mut doc = Document::parse(
            r#"<section data-component-type="product-list-page" data-variant="list">
                 <div class="plp-products-content"></div>
               </section>"#,
        )
        .unwrap_or_else(|_| Document::new());
        let elem = doc.first_by_tag(doc.root(), "section").unwrap();
        let ctx = RequestContext::default();
        process_product_list_page(&mut doc, elem, &product_data(1, 1), &ctx, &RenderConfig::default());

        let html = doc.to_html();
        assert!(html.contains("plp-products-list-view"));
        assert!(!html.contains("plp-products-grid"));
    }

    #[test]
    fn test_config_blob_overrides() {
        let mut doc = Document::parse(
            r#"<section data-component-type="product-list-page"
                        data-config='{"showCategories": false, "showProductDescription": false, "columns": {"desktop": 3, "tablet": 2, "mobile": 1}}'>
                 <aside class="plp-categories"><p>authored</p></aside>
                 <div class="plp-products-content"></div>
               </section>"#,
        )
        .unwrap_or_else(|_| Document::new());
        let elem = doc.first_by_tag(doc.root(), "section").unwrap();
        let mut data = product_data(1, 1);
        data.products.list[0].summary = Some("should be hidden".into());
        process_product_list_page(&mut doc, elem, &data, &RequestContext::default(), &RenderConfig::default());

        let html = doc.to_html();
        assert!(html.contains("<p>authored</p>"), "categories left untouched");
        assert!(html.contains("plp-grid-cols-3 plp-grid-md-2 plp-grid-sm-1"));
        assert!(!html.contains("should be hidden"));
    }

    #[test]
    fn test_missing_container_is_soft_failure() {
        let mut doc = Document::parse(r#"<section data-component-type="product-list-page"></section>"#)
            .unwrap_or_else(|_| Document::new());
        let elem = doc.first_by_tag(doc.root(), "section").unwrap();
        // Must not panic; the component simply stays authored.
        process_product_list_page(
            &mut doc,
            elem,
            &product_data(1, 1),
            &RequestContext::default(),
            &RenderConfig::default(),
        );
        assert!(!doc.to_html().contains("plp-products-grid"));
    }

    #[test]
    fn test_product_list_detail_skips_categories() {
        let mut doc = Document::parse(
            r#"<section data-component-type="product-list-detail">
                 <div class="pld-products-content"></div>
                 <div class="pld-pagination-wrapper"></div>
               </section>"#,
        )
        .unwrap_or_else(|_| Document::new());
        let elem = doc.first_by_tag(doc.root(), "section").unwrap();
        process_product_list_detail(
            &mut doc,
            elem,
            &product_data(2, 24),
            &RequestContext::default(),
            &RenderConfig::default(),
        );

        let html = doc.to_html();
        assert!(html.contains("plp-products-grid"));
        assert!(!html.contains("category-list"));
        assert!(html.contains("pld-pagination"));
    }

    #[test]
    fn test_blog_list_page_grid_and_caption() {
        use crate::model::BlogSummary;
        let mut doc = Document::parse(
            r#"<section data-component-type="blog-list-page">
                 <aside class="blp-categories"></aside>
                 <div class="blp-blogs-content"></div>
                 <div class="blp-pagination-wrapper"></div>
               </section>"#,
        )
        .unwrap_or_else(|_| Document::new());
        let elem = doc.first_by_tag(doc.root(), "section").unwrap();
        let data = BlogListData {
            categories: vec![],
            blogs: PagedList {
                list: vec![BlogSummary {
                    id: "b1".into(),
                    name: "Hello".into(),
                    ..Default::default()
                }],
                pagination: Pagination { page: 1, size: 10, total: 1 },
            },
        };
        process_blog_list_page(&mut doc, elem, &data, &RequestContext::default(), &RenderConfig::default());

        let html = doc.to_html();
        assert!(html.contains("blp-blogs-grid"));
        assert!(html.contains(r#"<strong>1</strong> posts"#));
    }
}
