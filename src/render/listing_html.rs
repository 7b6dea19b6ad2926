//! HTML generators shared by the listing injectors.
//!
//! Pure string builders: category tree, product/blog grids and list
//! views, paginator, result captions. Class names follow the page
//! builder's conventions so the authored stylesheets keep applying
//! (`plp-*` for product listings, `blp-*` for blog listings).

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::model::{BlogSummary, CategoryNode, Pagination, ProductSummary};
use crate::utils::html::escape;

/// Image shown when a record has no primary image.
const PLACEHOLDER_IMAGE: &str = "/placeholder.jpg";

// =============================================================================
// Category tree
// =============================================================================

/// Recursively render the category sidebar.
///
/// At level 0 a synthetic "All" node is prepended (see
/// [`CategoryNode::all_node`]). Nodes with children get an
/// expand/collapse toggle; `default_expanded` controls its initial
/// state. The active node is matched by category id.
pub fn generate_category_tree(
    prefix: &str,
    categories: &[CategoryNode],
    level: usize,
    current_category_id: Option<&str>,
    root_path: Option<&str>,
    default_expanded: bool,
) -> String {
    if categories.is_empty() {
        return format!("<p class=\"{prefix}-categories-empty\">No categories</p>");
    }

    let list_class = if level == 0 {
        format!("{prefix}-category-list")
    } else {
        format!("{prefix}-category-sublist")
    };
    let level_attr = if level > 0 {
        format!(" data-level=\"{level}\"")
    } else {
        String::new()
    };

    let all_node;
    let nodes: Vec<&CategoryNode> = if level == 0 {
        all_node = CategoryNode::all_node(categories, root_path);
        std::iter::once(&all_node).chain(categories).collect()
    } else {
        categories.iter().collect()
    };

    let mut out = format!("<ul class=\"{list_class}\"{level_attr}>");
    for category in nodes {
        let path = normalize_category_path(&category.path);
        let is_active = current_category_id.is_some_and(|id| id == category.id);
        let has_children = !category.children.is_empty();
        let expanded_class = if has_children && default_expanded {
            " expanded"
        } else {
            ""
        };

        let link = category_link(prefix, &path, category, is_active);

        out.push_str(&format!(
            "<li class=\"{prefix}-category-item{expanded_class}\" data-category-id=\"{}\">",
            escape(&category.id)
        ));
        if has_children {
            out.push_str(&format!(
                "<div class=\"{prefix}-category-header\">\
                 <button class=\"{prefix}-category-toggle\" aria-label=\"Toggle\" aria-expanded=\"{default_expanded}\">\
                 <svg class=\"{prefix}-category-arrow\" width=\"12\" height=\"12\" viewBox=\"0 0 24 24\" fill=\"none\" stroke=\"currentColor\">\
                 <path stroke-linecap=\"round\" stroke-linejoin=\"round\" stroke-width=\"2\" d=\"M9 5l7 7-7 7\"/>\
                 </svg></button>{link}</div>"
            ));
            out.push_str(&generate_category_tree(
                prefix,
                &category.children,
                level + 1,
                current_category_id,
                root_path,
                default_expanded,
            ));
        } else {
            out.push_str(&link);
        }
        out.push_str("</li>");
    }
    out.push_str("</ul>");
    out
}

fn category_link(prefix: &str, path: &str, category: &CategoryNode, is_active: bool) -> String {
    let active_class = if is_active { " active" } else { "" };
    let current_attr = if is_active { " aria-current=\"page\"" } else { "" };
    format!(
        "<a href=\"{}\" class=\"{prefix}-category-link{active_class}\" data-category-id=\"{}\"{current_attr}>{}</a>",
        escape(path),
        escape(&category.id),
        escape(&category.name)
    )
}

fn normalize_category_path(path: &str) -> String {
    if path.is_empty() {
        return "#".into();
    }
    if path == "#" || path.starts_with('/') {
        path.to_owned()
    } else {
        format!("/{path}")
    }
}

// =============================================================================
// Product grid / list
// =============================================================================

/// Grid column counts per breakpoint, from the component config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridColumns {
    pub desktop: u8,
    pub tablet: u8,
    pub mobile: u8,
}

impl Default for GridColumns {
    fn default() -> Self {
        Self { desktop: 4, tablet: 3, mobile: 2 }
    }
}

pub fn generate_product_grid(
    products: &[ProductSummary],
    columns: GridColumns,
    show_description: bool,
) -> String {
    if products.is_empty() {
        return empty_state("plp", "products", "No products yet");
    }

    let mut out = format!(
        "<div class=\"plp-products-grid plp-grid-cols-{} plp-grid-md-{} plp-grid-sm-{}\">",
        columns.desktop, columns.tablet, columns.mobile
    );
    for product in products {
        out.push_str(&product_card(product, show_description));
    }
    out.push_str("</div>");
    out
}

pub fn generate_product_list(products: &[ProductSummary], show_description: bool) -> String {
    if products.is_empty() {
        return empty_state("plp", "products", "No products yet");
    }

    let mut out = String::from("<div class=\"plp-products-list-view\">");
    for product in products {
        let description = if show_description {
            product
                .summary
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(|s| format!("<p class=\"plp-product-list-description\">{}</p>", escape(s)))
                .unwrap_or_default()
        } else {
            String::new()
        };
        out.push_str(&format!(
            "<a href=\"{}\" class=\"plp-product-list-item\" data-product-id=\"{}\">\
             <div class=\"plp-product-list-image\">\
             <img src=\"{}\" alt=\"{}\" loading=\"lazy\">\
             </div>\
             <div class=\"plp-product-list-content\">\
             <h3 class=\"plp-product-list-name\">{}</h3>{description}\
             </div></a>",
            escape(product.path.as_deref().unwrap_or("#")),
            escape(&product.id),
            escape(product.primary_image.as_deref().unwrap_or(PLACEHOLDER_IMAGE)),
            escape(&product.name),
            escape(&product.name),
        ));
    }
    out.push_str("</div>");
    out
}

fn product_card(product: &ProductSummary, show_description: bool) -> String {
    let description = if show_description {
        product
            .summary
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| format!("<p class=\"plp-product-description\">{}</p>", escape(s)))
            .unwrap_or_default()
    } else {
        String::new()
    };
    format!(
        "<a href=\"{}\" class=\"plp-product-card\" data-product-id=\"{}\">\
         <div class=\"plp-product-image-wrapper\">\
         <img src=\"{}\" alt=\"{}\" class=\"plp-product-image\" loading=\"lazy\">\
         </div>\
         <div class=\"plp-product-info\">\
         <h3 class=\"plp-product-name\">{}</h3>{description}\
         </div></a>",
        escape(product.path.as_deref().unwrap_or("#")),
        escape(&product.id),
        escape(product.primary_image.as_deref().unwrap_or(PLACEHOLDER_IMAGE)),
        escape(&product.name),
        escape(&product.name),
    )
}

// =============================================================================
// Blog grid / list
// =============================================================================

pub fn generate_blog_grid(
    blogs: &[BlogSummary],
    show_description: bool,
    show_publish_date: bool,
) -> String {
    if blogs.is_empty() {
        return empty_state("blp", "blogs", "No posts yet");
    }

    let mut out = String::from("<div class=\"blp-blogs-grid\">");
    for blog in blogs {
        out.push_str(&blog_card(blog, "blp-blog", show_description, show_publish_date));
    }
    out.push_str("</div>");
    out
}

pub fn generate_blog_list(
    blogs: &[BlogSummary],
    show_description: bool,
    show_publish_date: bool,
) -> String {
    if blogs.is_empty() {
        return empty_state("blp", "blogs", "No posts yet");
    }

    let mut out = String::from("<div class=\"blp-blogs-list-view\">");
    for blog in blogs {
        out.push_str(&blog_card(blog, "blp-blog-list", show_description, show_publish_date));
    }
    out.push_str("</div>");
    out
}

fn blog_card(
    blog: &BlogSummary,
    class_base: &str,
    show_description: bool,
    show_publish_date: bool,
) -> String {
    let date = if show_publish_date {
        blog.published_at
            .as_deref()
            .filter(|d| !d.is_empty())
            .map(|d| {
                format!(
                    "<time class=\"{class_base}-date\" datetime=\"{}\">{}</time>",
                    escape(d),
                    escape(&format_short_date(d))
                )
            })
            .unwrap_or_default()
    } else {
        String::new()
    };
    let description = if show_description {
        blog.description
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| format!("<p class=\"{class_base}-description\">{}</p>", escape(s)))
            .unwrap_or_default()
    } else {
        String::new()
    };

    let (item_class, image_class, content_class) = if class_base == "blp-blog" {
        ("blp-blog-card", "blp-blog-image-wrapper", "blp-blog-info")
    } else {
        ("blp-blog-list-item", "blp-blog-list-image", "blp-blog-list-content")
    };

    format!(
        "<div class=\"{item_class}\" data-blog-id=\"{}\">\
         <div class=\"{image_class}\">\
         <img src=\"{}\" alt=\"{}\" loading=\"lazy\">\
         </div>\
         <div class=\"{content_class}\">{date}\
         <h3 class=\"{class_base}-name\">{}</h3>{description}\
         <a href=\"{}\" class=\"blp-blog-learn-more\">LEARN MORE</a>\
         </div></div>",
        escape(&blog.id),
        escape(blog.primary_image.as_deref().unwrap_or(PLACEHOLDER_IMAGE)),
        escape(&blog.name),
        escape(&blog.name),
        escape(blog.path.as_deref().unwrap_or("#")),
    )
}

/// Format an ISO-ish date (`2022-03-02...`) as `3/2, 2022`. Falls back
/// to the input when the prefix does not parse.
pub fn format_short_date(value: &str) -> String {
    let mut parts = value.splitn(3, '-');
    let parsed = (|| {
        let year: u32 = parts.next()?.parse().ok()?;
        let month: u32 = parts.next()?.parse().ok()?;
        let day_part = parts.next()?;
        let day: u32 = day_part
            .split(['T', ' '])
            .next()
            .unwrap_or(day_part)
            .parse()
            .ok()?;
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return None;
        }
        Some(format!("{month}/{day}, {year}"))
    })();
    parsed.unwrap_or_else(|| value.to_owned())
}

fn empty_state(prefix: &str, noun: &str, text: &str) -> String {
    format!(
        "<div class=\"{prefix}-{noun}-empty\">\
         <svg class=\"{prefix}-empty-icon\" width=\"64\" height=\"64\" viewBox=\"0 0 24 24\" fill=\"none\" stroke=\"currentColor\">\
         <circle cx=\"12\" cy=\"12\" r=\"10\" stroke-width=\"2\"/>\
         <line x1=\"12\" y1=\"8\" x2=\"12\" y2=\"12\" stroke-width=\"2\"/>\
         <circle cx=\"12\" cy=\"16\" r=\"1\" fill=\"currentColor\"/>\
         </svg>\
         <p class=\"{prefix}-empty-text\">{text}</p>\
         </div>"
    )
}

// =============================================================================
// Pagination
// =============================================================================

/// One entry in the truncated page list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageToken {
    Page(u32),
    Ellipsis,
}

/// Truncated page list: always page 1 and the last page, current ± 1,
/// gaps collapsed into a single ellipsis. Five pages or fewer are shown
/// in full.
pub fn calculate_pages(current: u32, total: u32) -> Vec<PageToken> {
    if total <= 5 {
        return (1..=total.max(1)).map(PageToken::Page).collect();
    }

    let mut pages = vec![PageToken::Page(1)];
    let range_start = 2.max(current.saturating_sub(1));
    let range_end = total.saturating_sub(1).min(current + 1);

    if range_start > 2 {
        pages.push(PageToken::Ellipsis);
    }
    for page in range_start..=range_end {
        pages.push(PageToken::Page(page));
    }
    if range_end + 1 < total {
        pages.push(PageToken::Ellipsis);
    }
    if total > 1 {
        pages.push(PageToken::Page(total));
    }
    pages
}

/// Query-string percent-encoding set (space and separators included).
const QUERY_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'=')
    .add(b'?');

/// Link to `page`, preserving every other current query parameter.
pub fn build_page_url(page: u32, params: &[(String, String)]) -> String {
    let mut query = String::new();
    for (key, value) in params {
        if key == "page" {
            continue;
        }
        if !query.is_empty() {
            query.push('&');
        }
        query.push_str(&format!(
            "{}={}",
            utf8_percent_encode(key, QUERY_SET),
            utf8_percent_encode(value, QUERY_SET)
        ));
    }
    if !query.is_empty() {
        query.push('&');
    }
    query.push_str(&format!("page={page}"));
    format!("?{query}")
}

/// Render the paginator; empty when there is at most one page.
pub fn generate_pagination(
    prefix: &str,
    pagination: &Pagination,
    params: &[(String, String)],
) -> String {
    let total_pages = pagination.total_pages();
    if total_pages <= 1 {
        return String::new();
    }
    let current = pagination.page.max(1);

    let mut out = format!("<nav class=\"{prefix}-pagination\" aria-label=\"Pagination\">");
    out.push_str(&edge_button(prefix, "prev", current > 1, || {
        build_page_url(current - 1, params)
    }));

    out.push_str(&format!("<div class=\"{prefix}-pagination-pages\">"));
    for token in calculate_pages(current, total_pages) {
        match token {
            PageToken::Ellipsis => {
                out.push_str(&format!("<span class=\"{prefix}-pagination-ellipsis\">...</span>"));
            }
            PageToken::Page(page) if page == current => {
                out.push_str(&format!(
                    "<span class=\"{prefix}-pagination-button {prefix}-pagination-number active\" aria-current=\"page\">{page}</span>"
                ));
            }
            PageToken::Page(page) => {
                out.push_str(&format!(
                    "<a href=\"{}\" class=\"{prefix}-pagination-button {prefix}-pagination-number\">{page}</a>",
                    build_page_url(page, params)
                ));
            }
        }
    }
    out.push_str("</div>");

    out.push_str(&edge_button(prefix, "next", current < total_pages, || {
        build_page_url(current + 1, params)
    }));
    out.push_str("</nav>");
    out
}

fn edge_button(prefix: &str, direction: &str, enabled: bool, href: impl Fn() -> String) -> String {
    let arrow = if direction == "prev" {
        "M15 19l-7-7 7-7"
    } else {
        "M9 5l7 7-7 7"
    };
    let label = if direction == "prev" { "Previous page" } else { "Next page" };
    let svg = format!(
        "<svg width=\"20\" height=\"20\" viewBox=\"0 0 24 24\" fill=\"none\" stroke=\"currentColor\">\
         <path stroke-linecap=\"round\" stroke-linejoin=\"round\" stroke-width=\"2\" d=\"{arrow}\"/>\
         </svg>"
    );
    if enabled {
        format!(
            "<a href=\"{}\" class=\"{prefix}-pagination-button {prefix}-pagination-{direction}\" aria-label=\"{label}\">{svg}</a>",
            href()
        )
    } else {
        format!(
            "<span class=\"{prefix}-pagination-button {prefix}-pagination-{direction}\" aria-disabled=\"true\" aria-label=\"{label}\">{svg}</span>"
        )
    }
}

/// Item-count caption shown next to the paginator.
pub fn results_count(prefix: &str, total: u64, noun: &str) -> String {
    format!("<span class=\"{prefix}-results-count\"><strong>{total}</strong> {noun}</span>")
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use PageToken::{Ellipsis, Page};

    #[test]
    fn test_calculate_pages_truncates_with_ellipsis() {
        assert_eq!(calculate_pages(1, 10), vec![Page(1), Page(2), Ellipsis, Page(10)]);
        assert_eq!(
            calculate_pages(5, 10),
            vec![Page(1), Ellipsis, Page(4), Page(5), Page(6), Ellipsis, Page(10)]
        );
    }

    #[test]
    fn test_calculate_pages_no_ellipsis_when_short() {
        assert_eq!(
            calculate_pages(5, 5),
            vec![Page(1), Page(2), Page(3), Page(4), Page(5)]
        );
        assert_eq!(calculate_pages(1, 1), vec![Page(1)]);
    }

    #[test]
    fn test_build_page_url_preserves_params() {
        let params = vec![
            ("sort".to_owned(), "name-asc".to_owned()),
            ("page".to_owned(), "2".to_owned()),
        ];
        assert_eq!(build_page_url(3, &params), "?sort=name-asc&page=3");
    }

    #[test]
    fn test_build_page_url_encodes_values() {
        let params = vec![("q".to_owned(), "red & blue".to_owned())];
        assert_eq!(build_page_url(1, &params), "?q=red%20%26%20blue&page=1");
    }

    #[test]
    fn test_pagination_edges_disabled() {
        let p = Pagination { page: 1, size: 10, total: 30 };
        let html = generate_pagination("plp", &p, &[]);
        assert!(html.contains(r#"plp-pagination-prev" aria-disabled="true""#));
        assert!(html.contains(r#"<a href="?page=2""#));
        assert!(html.contains(r#"aria-current="page">1</span>"#));
    }

    #[test]
    fn test_pagination_single_page_is_empty() {
        let p = Pagination { page: 1, size: 10, total: 10 };
        assert_eq!(generate_pagination("plp", &p, &[]), "");
        let none = Pagination { page: 1, size: 10, total: 0 };
        assert_eq!(generate_pagination("plp", &none, &[]), "");
    }

    #[test]
    fn test_category_tree_prepends_all_node() {
        let categories = vec![CategoryNode {
            id: "c1".into(),
            name: "Electronics".into(),
            path: "/shop/electronics".into(),
            ..Default::default()
        }];
        let html = generate_category_tree("plp", &categories, 0, None, None, true);
        let all_pos = html.find(">All<").expect("All node rendered");
        let cat_pos = html.find(">Electronics<").expect("category rendered");
        assert!(all_pos < cat_pos);
        assert!(html.contains(r#"href="/shop""#));
    }

    #[test]
    fn test_category_tree_active_by_id() {
        let categories = vec![
            CategoryNode { id: "c1".into(), name: "A".into(), path: "/shop/a".into(), ..Default::default() },
            CategoryNode { id: "c2".into(), name: "B".into(), path: "/shop/b".into(), ..Default::default() },
        ];
        let html = generate_category_tree("plp", &categories, 0, Some("c2"), None, true);
        assert_eq!(html.matches("aria-current").count(), 1);
        assert!(html.contains(r#"class="plp-category-link active" data-category-id="c2""#));
    }

    #[test]
    fn test_category_tree_children_get_toggle_and_sublist() {
        let categories = vec![CategoryNode {
            id: "c1".into(),
            name: "Parent".into(),
            path: "/shop/parent".into(),
            children: vec![CategoryNode {
                id: "c1-1".into(),
                name: "Child".into(),
                path: "/shop/parent/child".into(),
                ..Default::default()
            }],
            ..Default::default()
        }];
        let html = generate_category_tree("plp", &categories, 0, None, None, true);
        assert!(html.contains(r#"aria-expanded="true""#));
        assert!(html.contains(r#"class="plp-category-item expanded""#));
        assert!(html.contains(r#"<ul class="plp-category-sublist" data-level="1">"#));
        assert!(html.contains(">Child<"));
    }

    #[test]
    fn test_empty_categories_placeholder() {
        let html = generate_category_tree("blp", &[], 0, None, None, true);
        assert!(html.contains("blp-categories-empty"));
    }

    #[test]
    fn test_product_grid_columns_and_cards() {
        let products = vec![ProductSummary {
            id: "p1".into(),
            name: "Widget <1>".into(),
            path: Some("/products/widget".into()),
            primary_image: None,
            summary: Some("Nice".into()),
        }];
        let html = generate_product_grid(&products, GridColumns::default(), true);
        assert!(html.contains("plp-grid-cols-4 plp-grid-md-3 plp-grid-sm-2"));
        assert!(html.contains("Widget &lt;1&gt;"));
        assert!(html.contains(r#"src="/placeholder.jpg""#));
        assert!(html.contains(r#"loading="lazy""#));
    }

    #[test]
    fn test_product_grid_empty_state() {
        let html = generate_product_grid(&[], GridColumns::default(), true);
        assert!(html.contains("plp-products-empty"));
    }

    #[test]
    fn test_product_list_hides_description_when_disabled() {
        let products = vec![ProductSummary {
            id: "p1".into(),
            name: "Widget".into(),
            summary: Some("hidden".into()),
            ..Default::default()
        }];
        let html = generate_product_list(&products, false);
        assert!(!html.contains("plp-product-list-description"));
    }

    #[test]
    fn test_blog_grid_with_date() {
        let blogs = vec![BlogSummary {
            id: "b1".into(),
            name: "Post".into(),
            path: Some("/blogs/post".into()),
            published_at: Some("2022-03-02T10:00:00Z".into()),
            ..Default::default()
        }];
        let html = generate_blog_grid(&blogs, true, true);
        assert!(html.contains(r#"<time class="blp-blog-date" datetime="2022-03-02T10:00:00Z">3/2, 2022</time>"#));
        assert!(html.contains("LEARN MORE"));
    }

    #[test]
    fn test_format_short_date() {
        assert_eq!(format_short_date("2022-03-02"), "3/2, 2022");
        assert_eq!(format_short_date("2024-11-30T08:00:00Z"), "11/30, 2024");
        assert_eq!(format_short_date("soonish"), "soonish");
    }

    #[test]
    fn test_results_count_caption() {
        let html = results_count("plp", 42, "products");
        assert_eq!(html, r#"<span class="plp-results-count"><strong>42</strong> products</span>"#);
    }
}
