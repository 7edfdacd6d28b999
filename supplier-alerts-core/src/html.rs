//! HTML parsing into the `Document` model using tree-sitter
//!
//! Only structural nodes (elements, comments, doctypes) become tree nodes.
//! Everything between them, including whitespace, entities and stray end tags,
//! is kept as raw text so serialization reproduces the source exactly.

use crate::dom::{Attribute, Document, Element, NodeId, NodeKind};
use anyhow::{Context, Result};
use tree_sitter::{Node, Parser, Tree};

/// Parse a complete HTML document
pub fn parse_document(source: &str) -> Result<Document> {
    let mut doc = Document::new();
    let root = doc.root();
    build_into(&mut doc, root, source)?;
    Ok(doc)
}

/// Parse `markup` and append the resulting nodes as children of `parent`
pub(crate) fn build_into(doc: &mut Document, parent: NodeId, markup: &str) -> Result<()> {
    let tree = parse_tree(markup)?;
    build_children(doc, parent, tree.root_node(), markup, 0, markup.len());
    Ok(())
}

fn parse_tree(source: &str) -> Result<Tree> {
    let mut parser = Parser::new();
    let language = tree_sitter_html::LANGUAGE;
    parser
        .set_language(&language.into())
        .context("Failed to set HTML language for parser")?;

    parser
        .parse(source, None)
        .ok_or_else(|| anyhow::anyhow!("Failed to parse HTML ({} bytes)", source.len()))
}

fn is_structural(kind: &str) -> bool {
    matches!(
        kind,
        "element" | "script_element" | "style_element" | "comment" | "doctype"
    )
}

fn child_nodes(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children
}

fn find_child_by_kind<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    child_nodes(node)
        .into_iter()
        .find(|child| child.kind() == kind)
}

fn slice<'s>(source: &'s str, node: Node) -> &'s str {
    &source[node.start_byte()..node.end_byte()]
}

/// Append the structural children of `ts_node` lying in `[start, end)`,
/// filling the gaps between them with raw text
fn build_children(
    doc: &mut Document,
    parent: NodeId,
    ts_node: Node,
    source: &str,
    start: usize,
    end: usize,
) {
    let mut pos = start;
    for child in child_nodes(ts_node) {
        if child.start_byte() < pos || child.end_byte() > end {
            continue;
        }

        let kind = child.kind();
        if kind == "ERROR" {
            // Recovered fragments: keep whatever structure the parser still found
            build_children(doc, parent, child, source, pos, child.end_byte());
            pos = child.end_byte();
            continue;
        }
        if !is_structural(kind) {
            continue;
        }

        if child.start_byte() > pos {
            doc.append(
                parent,
                NodeKind::Text(source[pos..child.start_byte()].to_string()),
            );
        }
        build_node(doc, parent, child, source);
        pos = child.end_byte();
    }

    if end > pos {
        doc.append(parent, NodeKind::Text(source[pos..end].to_string()));
    }
}

fn build_node(doc: &mut Document, parent: NodeId, node: Node, source: &str) {
    match node.kind() {
        "comment" | "doctype" => {
            doc.append(parent, NodeKind::Raw(slice(source, node).to_string()));
        }
        _ => build_element(doc, parent, node, source),
    }
}

fn build_element(doc: &mut Document, parent: NodeId, node: Node, source: &str) {
    let (start_tag, self_closing) = match find_child_by_kind(node, "start_tag") {
        Some(tag) => (tag, false),
        None => match find_child_by_kind(node, "self_closing_tag") {
            Some(tag) => (tag, true),
            None => {
                doc.append(parent, NodeKind::Raw(slice(source, node).to_string()));
                return;
            }
        },
    };

    let tag = find_child_by_kind(start_tag, "tag_name")
        .map(|name| slice(source, name).to_string())
        .unwrap_or_default();
    let attributes = child_nodes(start_tag)
        .into_iter()
        .filter(|child| child.kind() == "attribute")
        .filter_map(|attr| read_attribute(attr, source))
        .collect();

    let end_tag = find_child_by_kind(node, "end_tag");
    let element = Element::from_source(
        tag,
        attributes,
        slice(source, start_tag).to_string(),
        end_tag.map(|end| slice(source, end).to_string()),
        self_closing,
    );
    let id = doc.append(parent, NodeKind::Element(element));

    if self_closing {
        return;
    }

    let content_start = start_tag.end_byte();
    let content_end = end_tag.map(|end| end.start_byte()).unwrap_or(node.end_byte());
    build_children(doc, id, node, source, content_start, content_end);
}

fn read_attribute(attr: Node, source: &str) -> Option<Attribute> {
    let name = slice(source, find_child_by_kind(attr, "attribute_name")?).to_string();
    let raw = if let Some(quoted) = find_child_by_kind(attr, "quoted_attribute_value") {
        Some(
            find_child_by_kind(quoted, "attribute_value")
                .map(|v| slice(source, v))
                .unwrap_or_default(),
        )
    } else {
        find_child_by_kind(attr, "attribute_value").map(|v| slice(source, v))
    };
    Some(Attribute {
        name,
        value: raw.map(decode_entities),
    })
}

/// Escape an attribute value for a double-quoted attribute
pub(crate) fn escape_attribute(s: &str) -> String {
    s.replace('&', "&amp;").replace('"', "&quot;")
}

/// Escape text for inclusion in HTML content or attribute values
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Decode the character references that appear in table text
///
/// Handles the common named references and decimal/hex numeric references.
/// Unknown references are left as written.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match tail.find(';').filter(|semi| *semi <= 10) {
            Some(semi) => match decode_reference(&tail[1..semi]) {
                Some(ch) => {
                    out.push(ch);
                    rest = &tail[semi + 1..];
                }
                None => {
                    out.push('&');
                    rest = &tail[1..];
                }
            },
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(|c: char| c == 'x' || c == 'X') {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        "ndash" => Some('\u{2013}'),
        "mdash" => Some('\u{2014}'),
        _ => None,
    }
}
