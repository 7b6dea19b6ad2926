//! Product-detail and blog-detail injectors.
//!
//! Fill the authored detail layout from a single record: image gallery
//! (dual carousel when there is more than one image, a static image for
//! exactly one), title/body info block, the product description tabs,
//! and the related-items panel.
//!
//! The related panel is the one cross-boundary protocol the pipeline
//! must honor exactly: a server-side fetch that succeeded renders full
//! markup and marks the container `data-rsc-rendered="true"`; a failed
//! or timed-out fetch renders skeleton cards and marks the container
//! `data-csr-fallback="true"` so the client-side script completes it.

use serde::Deserialize;

use crate::config::RenderConfig;
use crate::dom::{Document, NodeId};
use crate::model::{
    AttachmentFile, BlogDetailData, ContactInfo, ContentBlock, DetailImage, ProductDetailData,
    RelatedBlog, RelatedProduct,
};
use crate::render::component::COMPONENT_CONFIG;
use crate::render::listing_html::format_short_date;
use crate::utils::html::escape;

/// Marker set when the related panel was fully rendered server-side.
pub const SERVER_RENDERED_ATTR: &str = "data-rsc-rendered";
/// Marker set when the related panel needs the client-side fallback.
pub const CLIENT_FALLBACK_ATTR: &str = "data-csr-fallback";

/// Thumbnails rendered in the gallery strip, at most.
const MAX_THUMBNAILS: usize = 8;

/// Detail component configuration blob.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct DetailConfig {
    show_files: bool,
    related_products_count: usize,
}

impl Default for DetailConfig {
    fn default() -> Self {
        Self { show_files: true, related_products_count: 6 }
    }
}

impl DetailConfig {
    fn read(doc: &Document, elem: NodeId) -> Self {
        let Some(raw) = doc.attr(elem, COMPONENT_CONFIG) else {
            return Self::default();
        };
        serde_json::from_str(raw).unwrap_or_else(|e| {
            warn!("render"; "detail config failed to parse, using defaults: {e}");
            Self::default()
        })
    }
}

// =============================================================================
// Product detail
// =============================================================================

/// Inject a product-detail record. `related` is the joined fetch
/// result: `Some` renders the panel server-side, `None` leaves the
/// skeleton plus the client-fallback marker.
pub fn process_product_detail(
    doc: &mut Document,
    elem: NodeId,
    data: &ProductDetailData,
    related: Option<&[RelatedProduct]>,
    render_config: &RenderConfig,
) {
    let config = DetailConfig::read(doc, elem);
    let images = &data.files.images;

    if let Some(gallery) = doc.first_by_class(elem, "pd-gallery") {
        if !images.is_empty() {
            doc.set_inner_html(gallery, &product_gallery_html(images));
        }
    } else {
        warn!("render"; "product detail has no .pd-gallery container");
    }

    if let Some(info) = doc.first_by_class(elem, "pd-info") {
        doc.set_inner_html(info, &product_info_html(data, config.show_files));
    } else {
        warn!("render"; "product detail has no .pd-info container");
    }

    if let Some(description) = doc.first_by_class(elem, "pd-description")
        && !data.contents.is_empty()
    {
        doc.set_inner_html(description, &description_tabs_html(&data.contents));
    }

    // Exposed for the client-side fallback loader.
    doc.set_attr(elem, "data-product-id", &data.id);

    if let Some(panel) = doc.first_by_class(elem, "pd-related-content") {
        match related {
            Some(products) => {
                doc.set_inner_html(panel, &related_products_html(products));
                doc.set_attr(panel, SERVER_RENDERED_ATTR, "true");
                doc.remove_attr(panel, CLIENT_FALLBACK_ATTR);
            }
            None => {
                let count = config
                    .related_products_count
                    .min(render_config.related_skeleton_max);
                doc.set_inner_html(panel, &related_products_skeleton(count));
                doc.set_attr(panel, CLIENT_FALLBACK_ATTR, "true");
            }
        }
    }
}

fn product_gallery_html(images: &[DetailImage]) -> String {
    match images {
        [] => "<div class=\"pd-no-images\">No images available</div>".into(),
        [only] => format!(
            "<div class=\"pd-gallery-single\">\
             <img src=\"{}\" alt=\"{}\" loading=\"eager\" fetchpriority=\"high\">\
             </div>",
            escape(&only.url),
            escape(only.name.as_deref().unwrap_or("Product image")),
        ),
        _ => {
            let mut main = String::from(
                "<div class=\"swiper pd-gallery-main\" data-swiper-priority=\"high\"><div class=\"swiper-wrapper\">",
            );
            for (index, img) in images.iter().enumerate() {
                let fallback_alt = format!("Product image {}", index + 1);
                main.push_str(&format!(
                    "<div class=\"swiper-slide\">\
                     <img width=\"200\" height=\"200\" src=\"{}\" alt=\"{}\" loading=\"{}\" fetchpriority=\"{}\">\
                     </div>",
                    escape(&img.url),
                    escape(img.name.as_deref().unwrap_or(&fallback_alt)),
                    if index == 0 { "eager" } else { "lazy" },
                    if index == 0 { "high" } else { "auto" },
                ));
            }
            main.push_str(
                "</div>\
                 <div class=\"swiper-button-next\"></div>\
                 <div class=\"swiper-button-prev\"></div>\
                 <div class=\"swiper-pagination\"></div></div>",
            );

            let mut thumbs =
                String::from("<div class=\"swiper pd-gallery-thumbs\"><div class=\"swiper-wrapper\">");
            for (index, img) in images.iter().take(MAX_THUMBNAILS).enumerate() {
                let fallback_alt = format!("Thumbnail {}", index + 1);
                thumbs.push_str(&format!(
                    "<div class=\"swiper-slide\">\
                     <img width=\"200\" height=\"200\" src=\"{}\" alt=\"{}\" loading=\"lazy\">\
                     </div>",
                    escape(&img.url),
                    escape(img.name.as_deref().unwrap_or(&fallback_alt)),
                ));
            }
            thumbs.push_str("</div></div>");

            format!("<div class=\"pd-gallery-wrapper\">{main}{thumbs}</div>")
        }
    }
}

fn product_info_html(data: &ProductDetailData, show_files: bool) -> String {
    let mut out = String::from("<div class=\"pd-info-wrapper\">");
    out.push_str(&format!(
        "<h1 class=\"pd-title\">{}</h1>",
        escape(data.name.as_deref().unwrap_or("Product Title"))
    ));
    if let Some(summary) = data.summary.as_deref().filter(|s| !s.is_empty()) {
        // Rich HTML from the content API, inserted verbatim.
        out.push_str(&format!("<div class=\"pd-brief-description\">{summary}</div>"));
    }
    out.push_str(&contact_html(&data.contact));
    out.push_str("<div><button class=\"pd-quote-btn\">REQUEST A QUOTE</button></div>");
    if show_files && !data.files.attachments.is_empty() {
        out.push_str(&downloads_html(&data.files.attachments));
    }
    out.push_str("</div>");
    out
}

fn contact_html(contact: &ContactInfo) -> String {
    let has_any = [&contact.email, &contact.phone, &contact.whatsapp]
        .iter()
        .any(|v| v.as_deref().is_some_and(|s| !s.is_empty()));
    if !has_any {
        return String::new();
    }

    let mut out = String::from("<div class=\"pd-contact\">");
    if let Some(email) = contact.email.as_deref().filter(|s| !s.is_empty()) {
        out.push_str(&format!(
            "<div class=\"contact-item\"><span class=\"contact-label\">Email:</span>\
             <a href=\"mailto:{}\" class=\"contact-value\">{}</a></div>",
            escape(email),
            escape(email),
        ));
    }
    if let Some(phone) = contact.phone.as_deref().filter(|s| !s.is_empty()) {
        out.push_str(&format!(
            "<div class=\"contact-item\"><span class=\"contact-label\">Tel:</span>\
             <a href=\"tel:{}\" class=\"contact-value\">{}</a></div>",
            escape(phone),
            escape(phone),
        ));
    }
    if let Some(whatsapp) = contact.whatsapp.as_deref().filter(|s| !s.is_empty()) {
        let digits: String = whatsapp.chars().filter(char::is_ascii_digit).collect();
        out.push_str(&format!(
            "<div class=\"contact-item\"><span class=\"contact-label\">WhatsApp:</span>\
             <a href=\"https://wa.me/{digits}\" target=\"_blank\" rel=\"noopener noreferrer\" class=\"contact-value\">{}</a></div>",
            escape(whatsapp),
        ));
    }
    out.push_str("</div>");
    out
}

fn downloads_html(attachments: &[AttachmentFile]) -> String {
    let mut out = String::from("<div class=\"pd-files\"><h3>Downloads</h3><div class=\"file-list\">");
    for file in attachments {
        out.push_str(&format!(
            "<a href=\"{}\" download class=\"file-item\" target=\"_blank\" rel=\"noopener noreferrer\">\
             <span class=\"file-name\">{}</span></a>",
            escape(&file.url),
            escape(&file.name),
        ));
    }
    out.push_str("</div></div>");
    out
}

fn description_tabs_html(contents: &[ContentBlock]) -> String {
    let mut tabs = String::from("<div class=\"pd-tabs\" role=\"tablist\">");
    let mut panels = String::from("<div class=\"pd-tab-contents\">");
    for (index, block) in contents.iter().enumerate() {
        let active = if index == 0 { " active" } else { "" };
        let fallback_title = format!("Description {}", index + 1);
        tabs.push_str(&format!(
            "<button class=\"pd-tab{active}\" role=\"tab\" aria-selected=\"{}\" data-tab-index=\"{index}\">{}</button>",
            index == 0,
            escape(block.title.as_deref().unwrap_or(&fallback_title)),
        ));
        panels.push_str(&format!(
            "<div class=\"pd-tab-content{active}\" role=\"tabpanel\" data-content-index=\"{index}\">{}</div>",
            block.description.as_deref().unwrap_or(""),
        ));
    }
    tabs.push_str("</div>");
    panels.push_str("</div>");
    format!("<div class=\"pd-description-wrapper\">{tabs}{panels}</div>")
}

fn related_products_html(products: &[RelatedProduct]) -> String {
    if products.is_empty() {
        return "<p class=\"no-related\">No related products</p>".into();
    }

    let mut out = String::from("<div class=\"swiper pd-related-swiper\"><div class=\"swiper-wrapper\">");
    for product in products {
        out.push_str(&format!(
            "<div class=\"swiper-slide\"><div class=\"related-product-card\">\
             <img src=\"{}\" alt=\"{}\" loading=\"lazy\">\
             <h3>{}</h3>\
             <a href=\"{}\" class=\"view-more-btn\">Learn More</a>\
             </div></div>",
            escape(product.primary_image.as_deref().unwrap_or("/images/placeholder.jpg")),
            escape(&product.name),
            escape(&product.name),
            escape(product.path.as_deref().unwrap_or("#")),
        ));
    }
    out.push_str(
        "</div><div class=\"swiper-button-next\"></div><div class=\"swiper-button-prev\"></div></div>",
    );
    out
}

fn related_products_skeleton(count: usize) -> String {
    let mut out = String::from("<div class=\"swiper pd-related-swiper\"><div class=\"swiper-wrapper\">");
    for _ in 0..count.max(1) {
        out.push_str(
            "<div class=\"swiper-slide\"><div class=\"related-product-card skeleton\">\
             <div class=\"skeleton-image\"></div>\
             <div class=\"skeleton-title\"></div>\
             <div class=\"skeleton-title\"></div>\
             <div class=\"skeleton-button\"></div>\
             </div></div>",
        );
    }
    out.push_str(
        "</div><div class=\"swiper-button-next\"></div><div class=\"swiper-button-prev\"></div></div>",
    );
    out
}

// =============================================================================
// Blog detail
// =============================================================================

/// Inject a blog-detail record: gallery after the header, title/body,
/// related panel. Same related-panel marker contract as products.
pub fn process_blog_detail(
    doc: &mut Document,
    elem: NodeId,
    data: &BlogDetailData,
    related: Option<&[RelatedBlog]>,
    render_config: &RenderConfig,
) {
    let config = DetailConfig::read(doc, elem);
    let images = &data.files.images;

    // Gallery: replace whatever the author left, insert after the
    // header inside .bd-main.
    if !images.is_empty() {
        for stale in doc.all_by_class(elem, "bd-gallery") {
            doc.detach(stale);
        }
        for stale in doc.all_by_class(elem, "bd-gallery-single") {
            doc.detach(stale);
        }

        if let Some(main) = doc.first_by_class(elem, "bd-main") {
            let gallery = blog_gallery_html(images);
            match doc.first_by_class(main, "bd-header") {
                Some(header) => doc.insert_html_after(header, &gallery),
                None => doc.prepend_html(main, &gallery),
            }
        } else {
            warn!("render"; "blog detail has no .bd-main container");
        }
    }

    if let Some(main) = doc.first_by_class(elem, "bd-main") {
        for stale in doc.all_by_class(main, "bd-header") {
            doc.detach(stale);
        }
        for stale in doc.all_by_class(main, "bd-content") {
            doc.detach(stale);
        }

        let info = blog_info_html(data);
        let gallery = doc
            .first_by_class(main, "bd-gallery")
            .or_else(|| doc.first_by_class(main, "bd-gallery-single"));
        match gallery {
            Some(gallery) => doc.insert_html_after(gallery, &info),
            None => doc.prepend_html(main, &info),
        }
    }

    doc.set_attr(elem, "data-blog-id", &data.id);

    if let Some(panel) = doc.first_by_class(elem, "bd-related-content") {
        match related {
            Some(blogs) => {
                doc.set_inner_html(panel, &related_blogs_html(blogs));
                doc.set_attr(panel, SERVER_RENDERED_ATTR, "true");
                doc.remove_attr(panel, CLIENT_FALLBACK_ATTR);
            }
            None => {
                let count = config
                    .related_products_count
                    .min(render_config.related_skeleton_max);
                doc.set_inner_html(panel, &related_blogs_skeleton(count));
                doc.set_attr(panel, CLIENT_FALLBACK_ATTR, "true");
            }
        }
    }
}

fn blog_gallery_html(images: &[DetailImage]) -> String {
    match images {
        [] => "<div class=\"bd-no-images\">No images available</div>".into(),
        [only] => format!(
            "<div class=\"bd-gallery-single\">\
             <img src=\"{}\" alt=\"{}\" loading=\"eager\" fetchpriority=\"high\">\
             </div>",
            escape(&only.url),
            escape(only.name.as_deref().unwrap_or("Blog image")),
        ),
        _ => {
            let mut out = String::from(
                "<div class=\"bd-gallery\">\
                 <div class=\"swiper bd-gallery-swiper\" data-swiper-priority=\"high\">\
                 <div class=\"swiper-wrapper\">",
            );
            for (index, img) in images.iter().enumerate() {
                let fallback_alt = format!("Blog image {}", index + 1);
                out.push_str(&format!(
                    "<div class=\"swiper-slide\">\
                     <img src=\"{}\" alt=\"{}\" loading=\"{}\" fetchpriority=\"{}\">\
                     </div>",
                    escape(&img.url),
                    escape(img.name.as_deref().unwrap_or(&fallback_alt)),
                    if index == 0 { "eager" } else { "lazy" },
                    if index == 0 { "high" } else { "auto" },
                ));
            }
            out.push_str(
                "</div>\
                 <div class=\"swiper-button-next\"></div>\
                 <div class=\"swiper-button-prev\"></div>\
                 <div class=\"swiper-pagination\"></div>\
                 </div></div>",
            );
            out
        }
    }
}

fn blog_info_html(data: &BlogDetailData) -> String {
    format!(
        "<header class=\"bd-header\"><h1 class=\"bd-title\">{}</h1></header>\
         <div class=\"bd-content\">{}</div>",
        escape(data.name.as_deref().unwrap_or("Blog Title")),
        // Rich HTML body, inserted verbatim.
        data.description
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or("<p>Blog content will appear here.</p>"),
    )
}

fn related_blogs_html(blogs: &[RelatedBlog]) -> String {
    if blogs.is_empty() {
        return "<p class=\"no-related\">No related posts</p>".into();
    }

    let mut out = String::from(
        "<div class=\"bd-related\"><h2 class=\"bd-related-title\">Related News</h2>\
         <div class=\"bd-related-list\">",
    );
    for blog in blogs {
        let date = blog
            .published_at
            .as_deref()
            .filter(|d| !d.is_empty())
            .map(|d| {
                format!(
                    "<time class=\"bd-related-date\" datetime=\"{}\">{}</time>",
                    escape(d),
                    escape(&format_short_date(d))
                )
            })
            .unwrap_or_default();
        out.push_str(&format!(
            "<a href=\"{}\" class=\"bd-related-item\">\
             <img src=\"{}\" alt=\"{}\" loading=\"lazy\">{date}\
             <h3 class=\"bd-related-name\">{}</h3></a>",
            escape(blog.path.as_deref().unwrap_or("#")),
            escape(blog.primary_image.as_deref().unwrap_or("/images/placeholder.jpg")),
            escape(&blog.name),
            escape(&blog.name),
        ));
    }
    out.push_str("</div></div>");
    out
}

fn related_blogs_skeleton(count: usize) -> String {
    let mut out = String::from(
        "<div class=\"bd-related\"><h2 class=\"bd-related-title\">Related News</h2>\
         <div class=\"bd-related-list\">",
    );
    for _ in 0..count.max(1) {
        out.push_str(
            "<div class=\"bd-related-item skeleton\">\
             <div class=\"skeleton-image\"></div>\
             <div class=\"skeleton-date\"></div>\
             <div class=\"skeleton-title\"></div>\
             </div>",
        );
    }
    out.push_str("</div></div>");
    out
}

// =============================================================================
// Tests
// =============================================================================
