//! Owned mutable HTML tree.
//!
//! The authored markup is tokenized once with `tl`, converted into this
//! arena (`parse`), mutated in place by the pipeline, then serialized
//! back to a string (`serialize`). Queries are predicate-based rather
//! than a full selector engine: the pipeline only ever matches on tag
//! names, classes and attributes.
//!
//! Nodes are addressed by [`NodeId`]; detached nodes stay in the arena
//! and are simply never serialized (the whole tree is request-scoped).

mod parse;
mod serialize;

use smallvec::SmallVec;

use crate::error::RenderError;

// =============================================================================
// Types
// =============================================================================

/// Handle to a node inside a [`Document`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Attribute list, insertion-ordered. Boolean attributes hold an empty
/// value and serialize as a bare name.
#[derive(Debug, Clone, Default)]
pub struct Attrs(Vec<(String, String)>);

impl Attrs {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, name: &str, value: &str) {
        match self.0.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_owned(),
            None => self.0.push((name.to_owned(), value.to_owned())),
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.0.retain(|(k, _)| k != name);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Node payload.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Element {
        /// Lowercased tag name.
        tag: String,
        attrs: Attrs,
        children: SmallVec<[NodeId; 4]>,
    },
    /// Decoded character data (raw-text element content stays verbatim).
    Text(String),
    /// Full comment source including delimiters.
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    kind: NodeKind,
}

/// A parsed, mutable HTML document (or fragment).
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

/// Tag of the synthetic root container.
const ROOT_TAG: &str = "#root";

// =============================================================================
// Construction
// =============================================================================

impl Document {
    /// Empty document with only the synthetic root.
    pub fn new() -> Self {
        let root_node = Node {
            parent: None,
            kind: NodeKind::Element {
                tag: ROOT_TAG.into(),
                attrs: Attrs::new(),
                children: SmallVec::new(),
            },
        };
        Self {
            nodes: vec![root_node],
            root: NodeId(0),
        }
    }

    /// Parse an HTML fragment into a new document.
    pub fn parse(html: &str) -> Result<Self, RenderError> {
        let mut doc = Self::new();
        let top = parse::parse_fragment(&mut doc, html)?;
        let root = doc.root;
        for id in top {
            doc.attach(root, id);
        }
        Ok(doc)
    }

    /// Synthetic root container id.
    pub fn root(&self) -> NodeId {
        self.root
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub(crate) fn push_node(&mut self, parent: Option<NodeId>, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node { parent, kind });
        id
    }

    /// Create a detached element.
    pub fn new_element(&mut self, tag: &str) -> NodeId {
        self.push_node(
            None,
            NodeKind::Element {
                tag: tag.to_lowercase(),
                attrs: Attrs::new(),
                children: SmallVec::new(),
            },
        )
    }

    /// Create a detached text node (decoded content).
    pub fn new_text(&mut self, text: &str) -> NodeId {
        self.push_node(None, NodeKind::Text(text.to_owned()))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Inspection
// =============================================================================

impl Document {
    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.node(id).kind, NodeKind::Element { .. })
    }

    /// Tag name; `None` for text/comment nodes.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { tag, .. } => Some(tag.as_str()),
            _ => None,
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { attrs, .. } => attrs.get(name),
            _ => None,
        }
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.node_mut(id).kind {
            attrs.set(name, value);
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.node_mut(id).kind {
            attrs.remove(name);
        }
    }

    pub fn attrs(&self, id: NodeId) -> Option<&Attrs> {
        match &self.node(id).kind {
            NodeKind::Element { attrs, .. } => Some(attrs),
            _ => None,
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attr(id, "class")
            .is_some_and(|c| c.split_whitespace().any(|item| item == class))
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if self.has_class(id, class) {
            return;
        }
        let merged = match self.attr(id, "class") {
            Some(existing) if !existing.is_empty() => format!("{existing} {class}"),
            _ => class.to_owned(),
        };
        self.set_attr(id, "class", &merged);
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        let Some(existing) = self.attr(id, "class") else {
            return;
        };
        let kept: Vec<&str> = existing
            .split_whitespace()
            .filter(|item| *item != class)
            .collect();
        let joined = kept.join(" ");
        self.set_attr(id, "class", &joined);
    }

    /// Append a declaration to the inline style without replacing any
    /// existing style text.
    pub fn append_style(&mut self, id: NodeId, declaration: &str) {
        let merged = match self.attr(id, "style") {
            Some(existing) if !existing.trim().is_empty() => {
                format!("{}; {declaration};", existing.trim_end_matches([' ', ';']))
            }
            _ => format!("{declaration};"),
        };
        self.set_attr(id, "style", &merged);
    }

    /// Whether the inline style text mentions `height` at all.
    pub fn style_mentions_height(&self, id: NodeId) -> bool {
        self.attr(id, "style").is_some_and(|s| s.contains("height"))
    }

    /// Decoded text content of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.node(id).kind {
            NodeKind::Element { children, .. } => children,
            _ => &[],
        }
    }
}

// =============================================================================
// Queries
// =============================================================================

impl Document {
    /// All elements under the root in document (pre-)order. Snapshot: the
    /// returned list is unaffected by later mutation.
    pub fn walk_elements(&self) -> Vec<NodeId> {
        self.descendant_elements(self.root)
    }

    /// All descendant elements of `scope` (excluding `scope`), pre-order.
    pub fn descendant_elements(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_elements(scope, &mut out);
        out
    }

    fn collect_elements(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for &child in self.children(id) {
            if self.is_element(child) {
                out.push(child);
                self.collect_elements(child, out);
            }
        }
    }

    /// First descendant element matching the predicate.
    pub fn find_first(
        &self,
        scope: NodeId,
        pred: impl Fn(&Document, NodeId) -> bool,
    ) -> Option<NodeId> {
        self.descendant_elements(scope)
            .into_iter()
            .find(|&id| pred(self, id))
    }

    /// All descendant elements matching the predicate.
    pub fn find_all(
        &self,
        scope: NodeId,
        pred: impl Fn(&Document, NodeId) -> bool,
    ) -> Vec<NodeId> {
        self.descendant_elements(scope)
            .into_iter()
            .filter(|&id| pred(self, id))
            .collect()
    }

    pub fn first_by_class(&self, scope: NodeId, class: &str) -> Option<NodeId> {
        self.find_first(scope, |doc, id| doc.has_class(id, class))
    }

    pub fn all_by_class(&self, scope: NodeId, class: &str) -> Vec<NodeId> {
        self.find_all(scope, |doc, id| doc.has_class(id, class))
    }

    pub fn first_by_tag(&self, scope: NodeId, tag: &str) -> Option<NodeId> {
        self.find_first(scope, |doc, id| doc.tag(id) == Some(tag))
    }

    pub fn all_by_tag(&self, scope: NodeId, tag: &str) -> Vec<NodeId> {
        self.find_all(scope, |doc, id| doc.tag(id) == Some(tag))
    }

    pub fn first_with_attr_value(
        &self,
        scope: NodeId,
        name: &str,
        value: &str,
    ) -> Option<NodeId> {
        self.find_first(scope, |doc, id| doc.attr(id, name) == Some(value))
    }

    pub fn all_with_attr_value(&self, scope: NodeId, name: &str, value: &str) -> Vec<NodeId> {
        self.find_all(scope, |doc, id| doc.attr(id, name) == Some(value))
    }

    /// Nearest ancestor (including `id` itself) matching the predicate.
    pub fn closest(
        &self,
        id: NodeId,
        pred: impl Fn(&Document, NodeId) -> bool,
    ) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.is_element(node) && pred(self, node) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// The `<body>` element, when the fragment carries one.
    pub fn body(&self) -> Option<NodeId> {
        self.first_by_tag(self.root, "body")
    }
}

// =============================================================================
// Mutation
// =============================================================================

impl Document {
    fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(child).parent = Some(parent);
        if let NodeKind::Element { children, .. } = &mut self.node_mut(parent).kind {
            children.push(child);
        }
    }

    /// Remove `id` from its parent's child list. The node stays in the
    /// arena but is no longer reachable from the root.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.node(id).parent else {
            return;
        };
        if let NodeKind::Element { children, .. } = &mut self.node_mut(parent).kind {
            children.retain(|c| *c != id);
        }
        self.node_mut(id).parent = None;
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.attach(parent, child);
    }

    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.node_mut(child).parent = Some(parent);
        if let NodeKind::Element { children, .. } = &mut self.node_mut(parent).kind {
            children.insert(0, child);
        }
    }

    fn insert_children_at(&mut self, parent: NodeId, index: usize, ids: &[NodeId]) {
        for &id in ids {
            self.node_mut(id).parent = Some(parent);
        }
        if let NodeKind::Element { children, .. } = &mut self.node_mut(parent).kind {
            for (offset, &id) in ids.iter().enumerate() {
                children.insert(index + offset, id);
            }
        }
    }

    fn child_position(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.children(parent).iter().position(|&c| c == child)
    }

    /// Replace the children of `id` with a parsed HTML fragment.
    pub fn set_inner_html(&mut self, id: NodeId, html: &str) {
        self.clear_children(id);
        match parse::parse_fragment(self, html) {
            Ok(top) => {
                for node in top {
                    self.attach(id, node);
                }
            }
            Err(e) => warn!("dom"; "fragment parse failed, container left empty: {e}"),
        }
    }

    /// Drop all children of `id`.
    pub fn clear_children(&mut self, id: NodeId) {
        let old: Vec<NodeId> = self.children(id).to_vec();
        for child in old {
            self.detach(child);
        }
    }

    /// Parse and append a fragment as the last children of `parent`.
    pub fn append_html(&mut self, parent: NodeId, html: &str) {
        match parse::parse_fragment(self, html) {
            Ok(top) => {
                for node in top {
                    self.attach(parent, node);
                }
            }
            Err(e) => warn!("dom"; "fragment parse failed, nothing appended: {e}"),
        }
    }

    /// Parse and insert a fragment as the first children of `parent`.
    pub fn prepend_html(&mut self, parent: NodeId, html: &str) {
        match parse::parse_fragment(self, html) {
            Ok(top) => self.insert_children_at(parent, 0, &top),
            Err(e) => warn!("dom"; "fragment parse failed, nothing prepended: {e}"),
        }
    }

    /// Parse and insert a fragment immediately after `id` among its
    /// siblings.
    pub fn insert_html_after(&mut self, id: NodeId, html: &str) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        let Some(position) = self.child_position(parent, id) else {
            return;
        };
        match parse::parse_fragment(self, html) {
            Ok(top) => self.insert_children_at(parent, position + 1, &top),
            Err(e) => warn!("dom"; "fragment parse failed, nothing inserted: {e}"),
        }
    }

    /// Replace `id` with a parsed fragment at the same position.
    pub fn replace_with_html(&mut self, id: NodeId, html: &str) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        let Some(position) = self.child_position(parent, id) else {
            return;
        };
        self.detach(id);
        match parse::parse_fragment(self, html) {
            Ok(top) => self.insert_children_at(parent, position, &top),
            Err(e) => warn!("dom"; "fragment parse failed, node removed without replacement: {e}"),
        }
    }

    /// Wrap `id` in a new element with the given tag; the wrapper takes
    /// `id`'s place among its siblings. Returns the wrapper.
    pub fn wrap_in_new(&mut self, id: NodeId, tag: &str) -> NodeId {
        let wrapper = self.new_element(tag);
        if let Some(parent) = self.parent(id)
            && let Some(position) = self.child_position(parent, id)
        {
            self.detach(id);
            self.insert_children_at(parent, position, &[wrapper]);
        }
        self.attach(wrapper, id);
        wrapper
    }

    /// Remove direct element children of `parent` with the given tag.
    pub fn remove_child_elements_by_tag(&mut self, parent: NodeId, tag: &str) {
        let doomed: Vec<NodeId> = self
            .children(parent)
            .iter()
            .copied()
            .filter(|&c| self.tag(c) == Some(tag))
            .collect();
        for id in doomed {
            self.detach(id);
        }
    }
}

// =============================================================================
// Serialization
// =============================================================================

impl Document {
    /// Serialize the whole document (children of the synthetic root).
    pub fn to_html(&self) -> String {
        self.inner_html(self.root)
    }

    /// Serialize the children of `id`.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        serialize::write_children(self, id, &mut out);
        out
    }

    /// Serialize `id` itself.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        serialize::write_node(self, id, &mut out);
        out
    }

    pub(crate) fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub(crate) fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.node_mut(id).kind
    }

    pub(crate) fn set_parent(&mut self, id: NodeId, parent: NodeId) {
        self.node_mut(id).parent = Some(parent);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip_preserves_structure() {
        let doc = Document::parse(r#"<div class="a"><p>Hi</p><img src="/x.png"></div>"#).unwrap();
        let html = doc.to_html();
        assert!(html.contains(r#"<div class="a">"#));
        assert!(html.contains("<p>Hi</p>"));
        assert!(html.contains(r#"<img src="/x.png">"#));
    }

    #[test]
    fn test_entity_round_trip() {
        let doc = Document::parse("<p>Tom &amp; Jerry</p>").unwrap();
        assert_eq!(doc.to_html(), "<p>Tom &amp; Jerry</p>");
    }

    #[test]
    fn test_find_by_class_and_attr() {
        let doc = Document::parse(
            r#"<section data-component-type="product-list-page"><div class="plp-categories"></div></section>"#,
        )
        .unwrap();
        let root = doc.root();
        let section = doc
            .first_with_attr_value(root, "data-component-type", "product-list-page")
            .unwrap();
        assert!(doc.first_by_class(section, "plp-categories").is_some());
        assert!(doc.first_by_class(section, "missing").is_none());
    }

    #[test]
    fn test_set_inner_html_replaces_children() {
        let mut doc = Document::parse(r#"<div id="target"><span>old</span></div>"#).unwrap();
        let target = doc.first_by_tag(doc.root(), "div").unwrap();
        doc.set_inner_html(target, "<em>new</em>");
        assert_eq!(doc.inner_html(target), "<em>new</em>");
    }

    #[test]
    fn test_detach_removes_only_target_child() {
        let mut doc = Document::parse("<ul><li>a</li><li>b</li><li>c</li></ul>").unwrap();
        let ul = doc.first_by_tag(doc.root(), "ul").unwrap();
        let middle = doc.all_by_tag(ul, "li")[1];
        doc.detach(middle);
        assert_eq!(doc.to_html(), "<ul><li>a</li><li>c</li></ul>");
        assert!(doc.parent(middle).is_none());
        // Detaching again is a no-op.
        doc.detach(middle);
        assert_eq!(doc.to_html(), "<ul><li>a</li><li>c</li></ul>");
    }

    #[test]
    fn test_wrap_in_new_keeps_position() {
        let mut doc = Document::parse("<div><img src='a'><span>x</span></div>").unwrap();
        let img = doc.first_by_tag(doc.root(), "img").unwrap();
        let picture = doc.wrap_in_new(img, "picture");
        assert_eq!(doc.tag(picture), Some("picture"));
        assert_eq!(doc.parent(img), Some(picture));
        let html = doc.to_html();
        assert!(html.starts_with(r#"<div><picture><img src="a"></picture>"#), "{html}");
    }

    #[test]
    fn test_replace_with_html() {
        let mut doc = Document::parse("<main><div id='ph'>placeholder</div><p>after</p></main>").unwrap();
        let ph = doc.first_by_tag(doc.root(), "div").unwrap();
        doc.replace_with_html(ph, "<header>injected</header>");
        let html = doc.to_html();
        assert_eq!(html, "<main><header>injected</header><p>after</p></main>");
    }

    #[test]
    fn test_insert_html_after() {
        let mut doc = Document::parse("<div><h1>title</h1><p>body</p></div>").unwrap();
        let h1 = doc.first_by_tag(doc.root(), "h1").unwrap();
        doc.insert_html_after(h1, "<figure>img</figure>");
        assert_eq!(
            doc.to_html(),
            "<div><h1>title</h1><figure>img</figure><p>body</p></div>"
        );
    }

    #[test]
    fn test_append_style_appends_not_replaces() {
        let mut doc = Document::parse(r#"<div style="color: red"></div>"#).unwrap();
        let div = doc.first_by_tag(doc.root(), "div").unwrap();
        doc.append_style(div, "height: 70vh");
        assert_eq!(doc.attr(div, "style"), Some("color: red; height: 70vh;"));
        assert!(doc.style_mentions_height(div));
    }

    #[test]
    fn test_boolean_attribute_serializes_bare() {
        let doc = Document::parse("<ul data-header-sub hidden><li>a</li></ul>").unwrap();
        let html = doc.to_html();
        assert!(html.contains("data-header-sub hidden"), "{html}");
    }

    #[test]
    fn test_closest_includes_self() {
        let doc = Document::parse(r#"<div class="outer"><span class="inner">x</span></div>"#).unwrap();
        let span = doc.first_by_tag(doc.root(), "span").unwrap();
        let found = doc.closest(span, |d, id| d.has_class(id, "inner")).unwrap();
        assert_eq!(found, span);
        let outer = doc.closest(span, |d, id| d.has_class(id, "outer")).unwrap();
        assert_eq!(doc.tag(outer), Some("div"));
    }

    #[test]
    fn test_script_content_not_escaped() {
        let doc = Document::parse("<script>if (a < b && c > d) {}</script>").unwrap();
        assert_eq!(doc.to_html(), "<script>if (a < b && c > d) {}</script>");
    }

    #[test]
    fn test_comment_preserved() {
        let doc = Document::parse("<div><!-- keep me --></div>").unwrap();
        assert!(doc.to_html().contains("<!-- keep me -->"));
    }

    #[test]
    fn test_walk_is_document_order() {
        let doc = Document::parse("<a></a><b><c></c></b><d></d>").unwrap();
        let tags: Vec<&str> = doc
            .walk_elements()
            .into_iter()
            .filter_map(|id| doc.tag(id))
            .collect();
        assert_eq!(tags, vec!["a", "b", "c", "d"]);
    }
}
