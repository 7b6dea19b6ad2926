//! Pipeline orchestrator.
//!
//! Owns the whole transformation of one page request: parse the
//! authored HTML once, inject global components, run the single
//! top-to-bottom walk that dispatches component injectors and the image
//! optimizer, run the carousel pass over the same tree, partition the
//! CSS, and serialize back to a string.
//!
//! Related-content fetches are spawned before the walk starts and
//! joined right before detail injection, so DOM work and network wait
//! overlap. Nothing here aborts the page: a parse failure returns the
//! input untouched, and every smaller failure degrades to "render
//! without this enhancement".

pub mod carousel;
pub mod component;
pub mod css;
pub mod detail;
pub mod globals;
pub mod image;
pub mod listing;
pub mod listing_html;
pub mod nav;

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::RenderConfig;
use crate::dom::{Document, NodeId};
use crate::model::{
    AssetMeta, BlogDetailData, BlogListData, GlobalComponent, ProductDetailData, ProductListData,
    RequestContext,
};
use crate::related::{self, RelatedContentFetcher};
use carousel::CarouselScript;
use component::{COMPONENT_MARKER, ComponentKind};
use image::PreloadResource;

// =============================================================================
// Input / output
// =============================================================================

/// Everything the route layer hands the pipeline for one request.
///
/// All datasets are optional; an injector whose data is absent leaves
/// its placeholder untouched.
pub struct RenderInput<'a> {
    pub html: &'a str,
    pub css: &'a str,
    pub assets: &'a [AssetMeta],
    pub product_list: Option<&'a ProductListData>,
    pub product_detail: Option<&'a ProductDetailData>,
    pub blog_list: Option<&'a BlogListData>,
    pub blog_detail: Option<&'a BlogDetailData>,
    pub global_components: &'a [GlobalComponent],
    pub ctx: &'a RequestContext,
    pub config: &'a RenderConfig,
    /// Content-API client for related-items panels. `None` sends every
    /// detail page down the client-fallback path.
    pub related_fetcher: Option<Arc<dyn RelatedContentFetcher>>,
}

/// Transformed page plus everything the route layer renders around it.
#[derive(Debug, Clone, Default)]
pub struct RenderOutput {
    pub html: String,
    pub critical_css: String,
    pub deferred_css: String,
    /// `<link rel="preload">` descriptors, highest priority first.
    pub preloads: Vec<PreloadResource>,
    /// One init script per carousel, in document order.
    pub carousel_scripts: Vec<CarouselScript>,
    pub has_carousels: bool,
    /// Drives eager vs lazy loading of the carousel runtime.
    pub first_carousel_above_fold: bool,
}

// =============================================================================
// Entry point
// =============================================================================

/// Transform one authored page into its final served form.
pub async fn prepare_page(input: RenderInput<'_>) -> RenderOutput {
    // Kick the related fetches off first; they run while the DOM work
    // proceeds.
    let product_related = spawn_product_related(&input);
    let blog_related = spawn_blog_related(&input);

    let mut doc = match Document::parse(input.html) {
        Ok(doc) => doc,
        Err(e) => {
            warn!("render"; "html parse failed, serving page untransformed: {e}");
            let split = css::split_css(input.css, input.config.critical_css_limit);
            return RenderOutput {
                html: input.html.to_owned(),
                critical_css: split.critical,
                deferred_css: split.deferred,
                ..RenderOutput::default()
            };
        }
    };

    globals::inject_global_components(&mut doc, input.global_components, &input.ctx.absolute_path());

    // Single walk over a snapshot of the tree as it stands after global
    // injection. Injectors may detach parts of the snapshot; detached
    // nodes are skipped, and markup the injectors generate manages its
    // own loading attributes.
    let assets = image::build_asset_map(input.assets);
    let mut preloads = Vec::new();
    let mut lcp_assigned = false;
    let mut product_detail_elem = None;
    let mut blog_detail_elem = None;

    for id in doc.walk_elements() {
        if !is_attached(&doc, id) {
            continue;
        }

        if doc.tag(id) == Some("img") {
            if image::enhance_image(&mut doc, id, &assets, lcp_assigned) {
                lcp_assigned = true;
                if let Some(src) = doc.attr(id, "src") {
                    preloads.push(PreloadResource::image(src));
                }
            }
            continue;
        }

        let Some(kind) = doc.attr(id, COMPONENT_MARKER).and_then(ComponentKind::from_marker)
        else {
            continue;
        };
        match kind {
            ComponentKind::ProductListPage => {
                if let Some(data) = input.product_list {
                    listing::process_product_list_page(&mut doc, id, data, input.ctx, input.config);
                }
            }
            ComponentKind::ProductListDetail => {
                if let Some(data) = input.product_list {
                    listing::process_product_list_detail(&mut doc, id, data, input.ctx, input.config);
                }
            }
            ComponentKind::BlogListPage => {
                if let Some(data) = input.blog_list {
                    listing::process_blog_list_page(&mut doc, id, data, input.ctx, input.config);
                }
            }
            // Detail injection waits for the related fetches to join.
            ComponentKind::ProductDetail => product_detail_elem = Some(id),
            ComponentKind::BlogDetail => blog_detail_elem = Some(id),
            // Global records were injected before the walk.
            ComponentKind::Header | ComponentKind::Footer | ComponentKind::GlobalFooter => {}
        }
    }

    if let (Some(elem), Some(data)) = (product_detail_elem, input.product_detail) {
        let related = join_related(product_related).await;
        detail::process_product_detail(&mut doc, elem, data, related.as_deref(), input.config);
    }
    if let (Some(elem), Some(data)) = (blog_detail_elem, input.blog_detail) {
        let related = join_related(blog_related).await;
        detail::process_blog_detail(&mut doc, elem, data, related.as_deref(), input.config);
    }

    let carousels = carousel::process_carousels(&mut doc);

    let mut split = css::split_css(input.css, input.config.critical_css_limit);
    if carousels.has_carousels {
        if !split.critical.is_empty() && !split.critical.ends_with('\n') {
            split.critical.push('\n');
        }
        split.critical.push_str(css::carousel_critical_css());
    }
    if input.config.minify_critical
        && !split.critical.is_empty()
        && let Some(minified) = css::minify_css(&split.critical)
    {
        split.critical = minified;
    }

    RenderOutput {
        html: serialize(&doc),
        critical_css: split.critical,
        deferred_css: split.deferred,
        preloads,
        carousel_scripts: carousels.scripts,
        has_carousels: carousels.has_carousels,
        first_carousel_above_fold: carousels.first_above_fold,
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn spawn_product_related(
    input: &RenderInput<'_>,
) -> Option<JoinHandle<Option<Vec<crate::model::RelatedProduct>>>> {
    let data = input.product_detail?;
    let fetcher = input.related_fetcher.as_ref()?;
    Some(tokio::spawn(related::fetch_related_products(
        Arc::clone(fetcher),
        data.id.clone(),
        input.config.related_timeout(),
    )))
}

fn spawn_blog_related(
    input: &RenderInput<'_>,
) -> Option<JoinHandle<Option<Vec<crate::model::RelatedBlog>>>> {
    let data = input.blog_detail?;
    let fetcher = input.related_fetcher.as_ref()?;
    Some(tokio::spawn(related::fetch_related_blogs(
        Arc::clone(fetcher),
        data.id.clone(),
        input.config.related_timeout(),
    )))
}

async fn join_related<T: Send + 'static>(
    handle: Option<JoinHandle<Option<Vec<T>>>>,
) -> Option<Vec<T>> {
    match handle {
        Some(handle) => match handle.await {
            Ok(result) => result,
            Err(e) => {
                warn!("render"; "related fetch task failed: {e}");
                None
            }
        },
        None => None,
    }
}

fn is_attached(doc: &Document, mut id: NodeId) -> bool {
    let root = doc.root();
    while let Some(parent) = doc.parent(id) {
        if parent == root {
            return true;
        }
        id = parent;
    }
    id == root
}

/// Serialize the transformed tree. A full-page input keeps only the
/// body's contents, matching what the route layer embeds in its shell.
fn serialize(doc: &Document) -> String {
    match doc.body() {
        Some(body) => doc.inner_html(body),
        None => doc.to_html(),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        DetailFiles, GlobalComponentData, PagedList, Pagination, ProductSummary, RelatedProduct,
    };
    use crate::related::tests::StubFetcher;
    use std::time::Duration;

    fn input<'a>(html: &'a str, css: &'a str, ctx: &'a RequestContext, config: &'a RenderConfig) -> RenderInput<'a> {
        RenderInput {
            html,
            css,
            assets: &[],
            product_list: None,
            product_detail: None,
            blog_list: None,
            blog_detail: None,
            global_components: &[],
            ctx,
            config,
            related_fetcher: None,
        }
    }

    fn product_list() -> ProductListData {
        ProductListData {
            categories: vec![],
            products: PagedList {
                list: vec![ProductSummary {
                    id: "p1".into(),
                    name: "Widget".into(),
                    path: Some("/products/widget".into()),
                    ..Default::default()
                }],
                pagination: Pagination { page: 1, size: 12, total: 1 },
            },
        }
    }

    fn product_detail(image_count: usize) -> ProductDetailData {
        ProductDetailData {
            id: "p1".into(),
            name: Some("Widget".into()),
            files: DetailFiles {
                images: (0..image_count)
                    .map(|i| crate::model::DetailImage {
                        id: None,
                        name: None,
                        url: format!("/img/{i}.jpg"),
                    })
                    .collect(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_malformed_html_still_renders() {
        let ctx = RequestContext::default();
        let config = RenderConfig::default();
        let out = prepare_page(input("<div><span>unclosed", "body{color:red}", &ctx, &config)).await;
        assert!(out.html.contains("unclosed"));
        assert_eq!(out.critical_css, "body{color:red}");
        assert!(!out.has_carousels);
    }

    #[tokio::test]
    async fn test_listing_injected_and_images_annotated() {
        let ctx = RequestContext {
            path: "/products".into(),
            ..Default::default()
        };
        let config = RenderConfig::default();
        let html = r#"<body>
            <img class="hero" src="/hero.jpg">
            <img src="/later.jpg">
            <section data-component-type="product-list-page">
              <div class="plp-categories"></div>
              <div class="plp-products-content"></div>
              <div class="plp-pagination-wrapper"></div>
            </section>
        </body>"#;
        let list = product_list();
        let mut req = input(html, "", &ctx, &config);
        req.product_list = Some(&list);
        let out = prepare_page(req).await;

        assert!(out.html.contains("Widget"));
        assert!(out.html.contains(r#"src="/hero.jpg" loading="eager" fetchpriority="high""#));
        assert!(out.html.contains(r#"src="/later.jpg" loading="lazy""#));
        assert_eq!(out.preloads.len(), 1);
        assert_eq!(out.preloads[0].href, "/hero.jpg");
        // Body wrapper itself is not part of the fragment output.
        assert!(!out.html.contains("<body>"));
    }

    #[tokio::test]
    async fn test_detail_with_fetcher_renders_related_server_side() {
        let ctx = RequestContext::default();
        let config = RenderConfig::default();
        let html = r#"<article data-component-type="product-detail">
            <div class="pd-gallery"></div>
            <div class="pd-info"></div>
            <div class="pd-related-content"></div>
        </article>"#;
        let data = product_detail(1);
        let fetcher = Arc::new(StubFetcher::with_products(vec![RelatedProduct {
            id: "r1".into(),
            name: "Other".into(),
            ..Default::default()
        }]));
        let mut req = input(html, "", &ctx, &config);
        req.product_detail = Some(&data);
        req.related_fetcher = Some(fetcher);
        let out = prepare_page(req).await;

        assert!(out.html.contains(r#"data-rsc-rendered="true""#));
        assert!(out.html.contains("related-product-card"));
        assert!(!out.html.contains("data-csr-fallback"));
    }

    #[tokio::test]
    async fn test_detail_fetch_timeout_falls_back_to_skeleton() {
        let ctx = RequestContext::default();
        let config = RenderConfig {
            related_timeout_ms: 10,
            ..Default::default()
        };
        let html = r#"<article data-component-type="product-detail">
            <div class="pd-gallery"></div>
            <div class="pd-info"></div>
            <div class="pd-related-content"></div>
        </article>"#;
        let data = product_detail(1);
        let fetcher = Arc::new(StubFetcher {
            delay: Duration::from_millis(200),
            ..StubFetcher::with_products(Vec::new())
        });
        let mut req = input(html, "", &ctx, &config);
        req.product_detail = Some(&data);
        req.related_fetcher = Some(fetcher);
        let out = prepare_page(req).await;

        assert!(out.html.contains(r#"data-csr-fallback="true""#));
        assert!(out.html.contains("skeleton"));
        assert!(!out.html.contains("data-rsc-rendered"));
    }

    #[tokio::test]
    async fn test_detail_without_fetcher_falls_back_to_skeleton() {
        let ctx = RequestContext::default();
        let config = RenderConfig::default();
        let html = r#"<article data-component-type="product-detail">
            <div class="pd-gallery"></div>
            <div class="pd-info"></div>
            <div class="pd-related-content"></div>
        </article>"#;
        let data = product_detail(1);
        let mut req = input(html, "", &ctx, &config);
        req.product_detail = Some(&data);
        let out = prepare_page(req).await;

        assert!(out.html.contains(r#"data-csr-fallback="true""#));
    }

    #[tokio::test]
    async fn test_multi_image_detail_gallery_gets_carousel_treatment() {
        let ctx = RequestContext::default();
        let config = RenderConfig::default();
        let html = r#"<article data-component-type="product-detail">
            <div class="pd-gallery"></div>
            <div class="pd-info"></div>
            <div class="pd-related-content"></div>
        </article>"#;
        let data = product_detail(3);
        let mut req = input(html, "", &ctx, &config);
        req.product_detail = Some(&data);
        let out = prepare_page(req).await;

        assert!(out.has_carousels);
        assert!(out.first_carousel_above_fold, "gallery is priority-marked");
        assert_eq!(out.carousel_scripts.len(), 1);
        assert!(out.html.contains("data-swiper-index"));
        assert!(out.critical_css.contains(".swiper-slide"), "first-paint carousel CSS emitted");
    }

    #[tokio::test]
    async fn test_global_header_injected_with_menu() {
        let ctx = RequestContext {
            path: "/".into(),
            ..Default::default()
        };
        let config = RenderConfig::default();
        let records = vec![GlobalComponent {
            kind: "header".into(),
            json_data: GlobalComponentData {
                html: Some("<header><nav class=\"header-menu\"></nav></header>".into()),
                menu_data: Some(serde_json::json!({
                    "items": [{"id": "1", "label": "Home", "url": "/"}]
                })),
                ..Default::default()
            },
        }];
        let mut req = input("<body><main>page</main></body>", "", &ctx, &config);
        req.global_components = &records;
        let out = prepare_page(req).await;

        assert!(out.html.contains("header-menu-list"));
        assert!(out.html.contains(r#"aria-current="page""#));
        assert!(out.html.contains("/styles/global-header-classic.css"));
    }

    #[tokio::test]
    async fn test_css_partition_flows_through() {
        let ctx = RequestContext::default();
        let config = RenderConfig {
            critical_css_limit: 40,
            ..Default::default()
        };
        let css = ".hero{color:red}.filler{border:1px solid}.misc{cursor:pointer}";
        let out = prepare_page(input("<div>x</div>", css, &ctx, &config)).await;

        assert!(out.critical_css.contains(".hero"));
        assert!(!out.deferred_css.is_empty());
        let total = out.critical_css.len() + out.deferred_css.len();
        assert_eq!(total, css.len(), "no rule dropped or duplicated");
    }

    #[tokio::test]
    async fn test_no_carousels_means_no_carousel_css() {
        let ctx = RequestContext::default();
        let config = RenderConfig::default();
        let out = prepare_page(input("<div>plain</div>", "", &ctx, &config)).await;
        assert!(!out.has_carousels);
        assert!(out.carousel_scripts.is_empty());
        assert!(out.critical_css.is_empty());
    }

    #[tokio::test]
    async fn test_lcp_assigned_once_across_whole_page() {
        let ctx = RequestContext::default();
        let config = RenderConfig::default();
        let html = r#"<div><img class="hero" src="/a.jpg"><img class="banner" src="/b.jpg"></div>"#;
        let out = prepare_page(input(html, "", &ctx, &config)).await;

        assert_eq!(out.html.matches(r#"fetchpriority="high""#).count(), 1);
        assert_eq!(out.preloads.len(), 1);
    }
}
