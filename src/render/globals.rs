//! Global header/footer injection.
//!
//! Tenant-wide components arrive as opaque HTML/CSS records. The header
//! replaces its authored placeholder (or is prepended to the body when
//! no placeholder exists), gets its menu rendered, and drags in its
//! variant stylesheet and runtime script. Footers replace their
//! placeholder or land at the end of the body. Each family is injected
//! at most once per document.

use crate::dom::Document;
use crate::model::GlobalComponent;
use crate::render::component::COMPONENT_MARKER;
use crate::render::nav;
use crate::utils::html::escape_attr;

/// Marker value of the authored header placeholder.
pub const HEADER_PLACEHOLDER: &str = "global-header";
/// Marker value of the authored footer placeholder.
pub const FOOTER_PLACEHOLDER: &str = "global-footer";

/// Header variant used when the record does not name one.
const DEFAULT_HEADER_VARIANT: &str = "classic";

/// Inject every supplied global component record into the document.
///
/// Component CSS is delivered as inline `<style data-critical>` blocks
/// next to the injected markup, so it never passes through the page CSS
/// partition. `current_path` drives the menu's active-item resolution.
pub fn inject_global_components(
    doc: &mut Document,
    components: &[GlobalComponent],
    current_path: &str,
) {
    if components.is_empty() {
        return;
    }

    let has_global_footer = components.iter().any(|c| {
        c.kind == "global-footer" && c.json_data.html.as_deref().is_some_and(|h| !h.is_empty())
    });

    let mut header_done = false;
    let mut footer_done = false;

    for component in components {
        match component.kind.as_str() {
            "header" if !header_done => {
                header_done = inject_header(doc, component, current_path);
            }
            "global-footer" if !footer_done => {
                footer_done = inject_footer(doc, component);
            }
            // Legacy footer records fill the slot only when no
            // global-footer record is present.
            "footer" if !footer_done && !has_global_footer => {
                footer_done = inject_footer(doc, component);
            }
            _ => {}
        }
    }
}

fn inject_header(doc: &mut Document, component: &GlobalComponent, current_path: &str) -> bool {
    let data = &component.json_data;
    let Some(html) = data.html.as_deref().filter(|h| !h.is_empty()) else {
        warn!("render"; "header record has no html, skipped");
        return false;
    };

    let target = doc.body().unwrap_or_else(|| doc.root());
    match doc.first_with_attr_value(doc.root(), COMPONENT_MARKER, HEADER_PLACEHOLDER) {
        Some(placeholder) => doc.replace_with_html(placeholder, html),
        None => doc.prepend_html(target, html),
    }

    if let Some(header_css) = data.css.as_deref().filter(|c| !c.is_empty()) {
        doc.prepend_html(
            target,
            &format!(
                "<style data-critical=\"true\" data-global-header-styles=\"true\">{header_css}</style>"
            ),
        );
    }

    if let Some(menu) = data.effective_menu_data() {
        let root = doc.root();
        nav::process_global_header(doc, root, menu, current_path);
    }

    let variant = data
        .variant
        .as_deref()
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_HEADER_VARIANT);
    doc.prepend_html(
        target,
        &format!(
            "<link rel=\"stylesheet\" href=\"/styles/global-header-{}.css\">",
            escape_attr(variant)
        ),
    );
    doc.append_html(target, "<script src=\"/scripts/global-header-core.js\" defer></script>");

    true
}

fn inject_footer(doc: &mut Document, component: &GlobalComponent) -> bool {
    let data = &component.json_data;
    let Some(html) = data.html.as_deref().filter(|h| !h.is_empty()) else {
        warn!("render"; "{} record has no html, skipped", component.kind);
        return false;
    };

    let target = doc.body().unwrap_or_else(|| doc.root());
    match doc.first_with_attr_value(doc.root(), COMPONENT_MARKER, FOOTER_PLACEHOLDER) {
        Some(placeholder) => doc.replace_with_html(placeholder, html),
        None => doc.append_html(target, html),
    }

    if let Some(footer_css) = data.css.as_deref().filter(|c| !c.is_empty()) {
        doc.append_html(
            target,
            &format!(
                "<style data-critical=\"true\" data-global-footer-styles=\"true\">{footer_css}</style>"
            ),
        );
    }

    true
}
