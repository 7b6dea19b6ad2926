//! Global header navigation injection.
//!
//! Renders the tenant's menu tree into the authored header's
//! `.header-menu` container. Items with children become trigger buttons
//! over hidden submenus; leaves become links. The active item is
//! recomputed from the current request path before rendering.

use serde_json::Value;

use crate::dom::{Document, NodeId};
use crate::model::{MenuData, MenuItem};
use crate::utils::html::escape;

/// Class of the container the menu is rendered into.
pub const MENU_CONTAINER_CLASS: &str = "header-menu";

/// Guard attribute set after a container has been filled, so a repeated
/// pass never doubles the menu.
pub const MENU_PROCESSED_ATTR: &str = "data-menu-processed";

/// Render the header menu into `header`'s `.header-menu` container.
///
/// Soft failures (missing container, bad menu shape) log and leave the
/// authored placeholder untouched.
pub fn process_global_header(
    doc: &mut Document,
    header: NodeId,
    menu_value: &Value,
    current_path: &str,
) {
    let Some(container) = doc.first_by_class(header, MENU_CONTAINER_CLASS) else {
        warn!("render"; "header has no .{MENU_CONTAINER_CLASS} container, menu skipped");
        return;
    };
    if doc.has_attr(container, MENU_PROCESSED_ATTR) {
        return;
    }

    let Some(mut menu) = MenuData::from_value(menu_value) else {
        warn!("render"; "menu data failed shape validation, placeholder left untouched");
        return;
    };

    if !current_path.is_empty() {
        menu.mark_current(current_path);
    }

    let html = generate_menu_html(&menu.items, 0, current_path);
    if html.is_empty() {
        warn!("render"; "menu rendered empty, placeholder left untouched");
        return;
    }

    doc.set_inner_html(container, &html);
    doc.set_attr(container, MENU_PROCESSED_ATTR, "true");
}

/// Recursively render a menu level. Level 0 is the top bar; deeper
/// levels are submenus hidden until client-side interaction reveals
/// them.
pub fn generate_menu_html(items: &[MenuItem], level: usize, current_path: &str) -> String {
    if items.is_empty() {
        return String::new();
    }

    let (list_class, sub_attrs) = if level == 0 {
        ("header-menu-list", "")
    } else {
        ("header-submenu", " data-header-sub hidden")
    };

    let mut out = format!("<ul class=\"{list_class}\"{sub_attrs}>");
    for item in items {
        out.push_str("<li class=\"header-menu-item\" data-header-item>");
        if item.children.is_empty() {
            out.push_str(&render_link(item, current_path));
        } else {
            out.push_str(&render_trigger(item));
            out.push_str(&generate_menu_html(&item.children, level + 1, current_path));
        }
        out.push_str("</li>");
    }
    out.push_str("</ul>");
    out
}

fn render_link(item: &MenuItem, current_path: &str) -> String {
    let href = item.url.as_deref().unwrap_or("#");
    let is_current =
        item.is_current_page || (!current_path.is_empty() && item.url.as_deref() == Some(current_path));

    let mut attrs = String::new();
    if item.opens_in_new_tab() {
        attrs.push_str(" target=\"_blank\" rel=\"noopener noreferrer\"");
    }
    if is_current {
        attrs.push_str(" aria-current=\"page\"");
    }

    format!(
        "<a href=\"{}\" class=\"header-menu-link\"{attrs}>{}</a>",
        escape(href),
        escape(&item.label)
    )
}

fn render_trigger(item: &MenuItem) -> String {
    format!(
        "<button class=\"header-menu-trigger\" data-header-trigger aria-expanded=\"false\" aria-haspopup=\"true\">{}\
         <svg class=\"header-arrow\" fill=\"none\" stroke=\"currentColor\" viewBox=\"0 0 24 24\">\
         <path stroke-linecap=\"round\" stroke-linejoin=\"round\" stroke-width=\"2\" d=\"M19 9l-7 7-7-7\"/>\
         </svg></button>",
        escape(&item.label)
    )
}
