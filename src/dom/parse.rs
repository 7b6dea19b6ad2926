//! `tl` tokenizer output -> arena conversion.

use smallvec::SmallVec;

use super::{Attrs, Document, NodeId, NodeKind};
use crate::error::RenderError;
use crate::utils::html::{is_raw_text_element, unescape};

/// Parse an HTML fragment and add its nodes to `doc`, detached. Returns
/// the top-level node ids in source order.
pub(super) fn parse_fragment(doc: &mut Document, html: &str) -> Result<Vec<NodeId>, RenderError> {
    let dom = tl::parse(html, tl::ParserOptions::default())
        .map_err(|e| RenderError::HtmlParse(e.to_string()))?;
    let parser = dom.parser();

    let mut top = Vec::new();
    for handle in dom.children() {
        if let Some(id) = convert(doc, *handle, parser, false) {
            top.push(id);
        }
    }
    Ok(top)
}

/// Convert one tl node into the arena. `raw_text` is true inside
/// script/style, where character data stays verbatim.
fn convert(
    doc: &mut Document,
    handle: tl::NodeHandle,
    parser: &tl::Parser,
    raw_text: bool,
) -> Option<NodeId> {
    let node = handle.get(parser)?;

    match node {
        tl::Node::Tag(tag) => {
            let tag_name = tag.name().as_utf8_str().to_lowercase();

            let mut attrs = Attrs::new();
            for (key, value) in tag.attributes().iter() {
                let key_str: &str = key.as_ref();
                let value_str = value.map(|v| v.to_string()).unwrap_or_default();
                attrs.set(key_str, &unescape(&value_str));
            }

            let id = doc.push_node(
                None,
                NodeKind::Element {
                    tag: tag_name.clone(),
                    attrs,
                    children: SmallVec::new(),
                },
            );

            let child_raw = is_raw_text_element(&tag_name);
            let mut children: SmallVec<[NodeId; 4]> = SmallVec::new();
            for child_handle in tag.children().top().iter() {
                if let Some(child) = convert(doc, *child_handle, parser, child_raw) {
                    children.push(child);
                }
            }
            for &child in &children {
                doc.set_parent(child, id);
            }
            if let NodeKind::Element { children: slot, .. } = doc.kind_mut(id) {
                *slot = children;
            }

            Some(id)
        }
        tl::Node::Raw(bytes) => {
            let text = bytes.as_utf8_str();
            let decoded = if raw_text {
                text.to_string()
            } else {
                unescape(&text).into_owned()
            };
            Some(doc.push_node(None, NodeKind::Text(decoded)))
        }
        tl::Node::Comment(bytes) => {
            let raw = bytes.as_utf8_str().to_string();
            Some(doc.push_node(None, NodeKind::Comment(raw)))
        }
    }
}
