//! Arena -> HTML string serialization.

use super::{Document, NodeId, NodeKind, ROOT_TAG};
use crate::utils::html::{escape, escape_attr, is_raw_text_element, is_void_element};

pub(super) fn write_node(doc: &Document, id: NodeId, out: &mut String) {
    match doc.kind(id) {
        NodeKind::Element { tag, attrs, .. } => {
            if tag == ROOT_TAG {
                write_children(doc, id, out);
                return;
            }

            out.push('<');
            out.push_str(tag);
            for (name, value) in attrs.iter() {
                out.push(' ');
                out.push_str(name);
                if !value.is_empty() {
                    out.push_str("=\"");
                    out.push_str(&escape_attr(value));
                    out.push('"');
                }
            }
            out.push('>');

            if is_void_element(tag) {
                return;
            }

            write_children(doc, id, out);

            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
        NodeKind::Text(text) => {
            let parent_raw = doc
                .parent(id)
                .and_then(|p| doc.tag(p))
                .is_some_and(is_raw_text_element);
            if parent_raw {
                out.push_str(text);
            } else {
                out.push_str(&escape(text));
            }
        }
        NodeKind::Comment(raw) => {
            if raw.starts_with("<!--") {
                out.push_str(raw);
            } else {
                out.push_str("<!--");
                out.push_str(raw);
                out.push_str("-->");
            }
        }
    }
}

pub(super) fn write_children(doc: &Document, id: NodeId, out: &mut String) {
    for &child in doc.children(id) {
        write_node(doc, child, out);
    }
}
