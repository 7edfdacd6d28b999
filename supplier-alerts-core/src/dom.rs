//! Document model the annotator runs against
//!
//! The `Dom` trait is the boundary to whatever hosts the rendered table: a
//! queryable element tree with mutable inline style, attributes and content.
//! `Document` is the in-memory implementation used by the CLI and the tests.
//!
//! Global invariants enforced:
//! - Traversal is in document order (pre-order, children left to right)
//! - Tag names compare ASCII case-insensitively, ids compare exactly
//! - Untouched nodes serialize back to their original source text

use crate::html::{decode_entities, escape_attribute, html_escape};

/// Host element tree consumed by the annotator and the summary reporter
pub trait Dom {
    type Node: Copy + Eq + std::fmt::Debug;

    /// First element (document order) whose `id` attribute equals `id`
    fn element_by_id(&self, id: &str) -> Option<Self::Node>;

    /// First descendant element of `node` with the given tag
    fn first_descendant_by_tag(&self, node: Self::Node, tag: &str) -> Option<Self::Node>;

    /// All descendant elements of `node` with the given tag, in document order
    fn descendants_by_tag(&self, node: Self::Node, tag: &str) -> Vec<Self::Node>;

    /// Concatenated, entity-decoded text of all descendant text nodes
    fn text_content(&self, node: Self::Node) -> String;

    /// Replace all children of `node` with a single text node
    fn set_text_content(&mut self, node: Self::Node, text: &str);

    /// Replace all children of `node` with parsed markup
    fn set_inner_html(&mut self, node: Self::Node, markup: &str);

    fn style_property(&self, node: Self::Node, property: &str) -> Option<String>;

    /// Set one inline style declaration, replacing an existing value
    fn set_style_property(&mut self, node: Self::Node, property: &str, value: &str);

    fn remove_style_property(&mut self, node: Self::Node, property: &str);

    fn attribute(&self, node: Self::Node, name: &str) -> Option<String>;

    fn set_attribute(&mut self, node: Self::Node, name: &str, value: &str);
}

/// Index of a node inside a `Document` arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Attribute with its value entity-decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Element {
    pub tag: String,
    pub attributes: Vec<Attribute>,
    /// Original start tag text; dropped once an attribute changes
    start_tag_raw: Option<String>,
    /// Original end tag text; `None` when the end tag was implied or absent
    end_tag_raw: Option<String>,
    self_closing: bool,
}

impl Element {
    pub(crate) fn from_source(
        tag: String,
        attributes: Vec<Attribute>,
        start_tag_raw: String,
        end_tag_raw: Option<String>,
        self_closing: bool,
    ) -> Self {
        Element {
            tag,
            attributes,
            start_tag_raw: Some(start_tag_raw),
            end_tag_raw,
            self_closing,
        }
    }

    fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }

    fn set_attribute(&mut self, name: &str, value: &str) {
        match self
            .attributes
            .iter_mut()
            .find(|a| a.name.eq_ignore_ascii_case(name))
        {
            Some(existing) => existing.value = Some(value.to_string()),
            None => self.attributes.push(Attribute {
                name: name.to_string(),
                value: Some(value.to_string()),
            }),
        }
        self.start_tag_raw = None;
    }

    fn remove_attribute(&mut self, name: &str) {
        let before = self.attributes.len();
        self.attributes.retain(|a| !a.name.eq_ignore_ascii_case(name));
        if self.attributes.len() != before {
            self.start_tag_raw = None;
        }
    }

    fn write_start_tag(&self, out: &mut String) {
        if let Some(raw) = &self.start_tag_raw {
            out.push_str(raw);
            return;
        }
        out.push('<');
        out.push_str(&self.tag);
        for attr in &self.attributes {
            out.push(' ');
            out.push_str(&attr.name);
            if let Some(value) = &attr.value {
                out.push_str("=\"");
                out.push_str(&escape_attribute(value));
                out.push('"');
            }
        }
        out.push_str(if self.self_closing { " />" } else { ">" });
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Synthetic root holding top-level nodes
    Root,
    Element(Element),
    /// Character data exactly as written (entities undecoded)
    Text(String),
    /// Comments, doctypes and anything else emitted verbatim
    Raw(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed HTML document
///
/// Slots of detached subtrees go on a free list and are reused by `append`,
/// so a `NodeId` into replaced content must not be used after the replacement.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document containing only the root
    pub fn new() -> Self {
        Document {
            nodes: vec![Node {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            }],
            free: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Append a new node as the last child of `parent`
    pub fn append(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let node = Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        };
        let id = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot.0] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                NodeId(self.nodes.len() - 1)
            }
        };
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Number of live nodes, including the root
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Detach all children of `id` and release their subtrees for reuse
    fn clear_children(&mut self, id: NodeId) {
        let mut released = self.descendants(id);
        self.nodes[id.0].children.clear();
        for node in &released {
            let slot = &mut self.nodes[node.0];
            slot.parent = None;
            slot.children.clear();
            slot.kind = NodeKind::Raw(String::new());
        }
        // Descending, so the lowest slots are popped first
        released.sort_unstable_by(|a, b| b.cmp(a));
        self.free.extend(released);
    }

    /// Pre-order traversal of the subtree below `id` (excluding `id`)
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[id.0].children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.nodes[next.0].children.iter().rev().copied());
        }
        out
    }

    fn is_tag(&self, id: NodeId, tag: &str) -> bool {
        self.element(id)
            .map(|el| el.tag.eq_ignore_ascii_case(tag))
            .unwrap_or(false)
    }

    /// Serialize the whole document
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for child in self.children(self.root()) {
            self.write_node(*child, &mut out);
        }
        out
    }

    /// Serialize one node and its subtree
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].kind {
            NodeKind::Root => {
                for child in &self.nodes[id.0].children {
                    self.write_node(*child, out);
                }
            }
            NodeKind::Text(text) | NodeKind::Raw(text) => out.push_str(text),
            NodeKind::Element(el) => {
                el.write_start_tag(out);
                if el.self_closing {
                    return;
                }
                for child in &self.nodes[id.0].children {
                    self.write_node(*child, out);
                }
                if let Some(end) = &el.end_tag_raw {
                    out.push_str(end);
                }
            }
        }
    }
}

/// Split at top-level `;`, ignoring any inside quotes, parentheses or brackets
fn split_declarations(style: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in style.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (_, '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(' | '[') => depth += 1,
            (None, ')' | ']') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                parts.push(&style[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&style[start..]);
    parts
}

/// Split an inline `style` attribute into (property, value) declarations
fn parse_declarations(style: &str) -> Vec<(String, String)> {
    split_declarations(style)
        .into_iter()
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_ascii_lowercase(), value.trim().to_string()))
        })
        .collect()
}

fn write_declarations(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(name, value)| format!("{}: {}", name, value))
        .collect::<Vec<_>>()
        .join("; ")
}

impl Dom for Document {
    type Node = NodeId;

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root()).into_iter().find(|node| {
            self.element(*node)
                .and_then(|el| el.attribute("id"))
                .and_then(|attr| attr.value.as_deref())
                == Some(id)
        })
    }

    fn first_descendant_by_tag(&self, node: NodeId, tag: &str) -> Option<NodeId> {
        self.descendants(node)
            .into_iter()
            .find(|child| self.is_tag(*child, tag))
    }

    fn descendants_by_tag(&self, node: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(node)
            .into_iter()
            .filter(|child| self.is_tag(*child, tag))
            .collect()
    }

    fn text_content(&self, node: NodeId) -> String {
        let mut raw = String::new();
        if let NodeKind::Text(text) = self.kind(node) {
            raw.push_str(text);
        }
        for child in self.descendants(node) {
            if let NodeKind::Text(text) = self.kind(child) {
                raw.push_str(text);
            }
        }
        decode_entities(&raw)
    }

    fn set_text_content(&mut self, node: NodeId, text: &str) {
        self.clear_children(node);
        if !text.is_empty() {
            self.append(node, NodeKind::Text(html_escape(text)));
        }
    }

    fn set_inner_html(&mut self, node: NodeId, markup: &str) {
        self.clear_children(node);
        if let Err(e) = crate::html::build_into(self, node, markup) {
            tracing::warn!("failed to parse markup, inserting verbatim: {e:#}");
            self.clear_children(node);
            self.append(node, NodeKind::Raw(markup.to_string()));
        }
    }

    fn style_property(&self, node: NodeId, property: &str) -> Option<String> {
        let style = self.attribute(node, "style")?;
        parse_declarations(&style)
            .into_iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(property))
            .map(|(_, value)| value)
    }

    fn set_style_property(&mut self, node: NodeId, property: &str, value: &str) {
        let mut decls = self
            .attribute(node, "style")
            .map(|s| parse_declarations(&s))
            .unwrap_or_default();

        match decls
            .iter_mut()
            .find(|(name, _)| name.eq_ignore_ascii_case(property))
        {
            Some(existing) => existing.1 = value.to_string(),
            None => decls.push((property.to_ascii_lowercase(), value.to_string())),
        }

        self.set_attribute(node, "style", &write_declarations(&decls));
    }

    fn remove_style_property(&mut self, node: NodeId, property: &str) {
        let Some(style) = self.attribute(node, "style") else {
            return;
        };
        let mut decls = parse_declarations(&style);
        let before = decls.len();
        decls.retain(|(name, _)| !name.eq_ignore_ascii_case(property));
        if decls.len() == before {
            return;
        }

        if decls.is_empty() {
            if let Some(el) = self.element_mut(node) {
                el.remove_attribute("style");
            }
        } else {
            self.set_attribute(node, "style", &write_declarations(&decls));
        }
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.element(node)?.attribute(name)?.value.clone()
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(el) = self.element_mut(node) {
            el.set_attribute(name, value);
        }
    }
}
