//! Response normalization.
//!
//! Whatever shape the service returns, [`normalize`] collapses it into a
//! [`ResponseNode`] tree: cleansed attributes, cleansed text, and an ordered
//! child map in which a repeated sibling name becomes an ordered list the
//! moment a second sibling appears. The traversal surface is read-only.

use std::collections::BTreeMap;
use std::mem;

pub mod cleanse;
pub mod fault;
pub mod result;

use crate::xml::{self, Element};

pub const ENVELOPE_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// One normalized element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseNode {
    attributes: BTreeMap<String, String>,
    text: Option<String>,
    children: ChildMap,
}

/// A child entry: a single node until a same-named sibling shows up, an
/// ordered list from then on. The collapse never reverts.
#[derive(Debug, Clone, PartialEq)]
pub enum Children {
    One(ResponseNode),
    Many(Vec<ResponseNode>),
}

impl Children {
    /// The single node, or the first element of the list.
    pub fn first(&self) -> &ResponseNode {
        match self {
            Children::One(node) => node,
            Children::Many(nodes) => &nodes[0],
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Children::One(_) => 1,
            Children::Many(nodes) => nodes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResponseNode> {
        let nodes: Vec<&ResponseNode> = match self {
            Children::One(node) => vec![node],
            Children::Many(nodes) => nodes.iter().collect(),
        };
        nodes.into_iter()
    }
}

/// Child-name to entry mapping preserving first-appearance document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChildMap(Vec<(String, Children)>);

impl ChildMap {
    pub fn get(&self, name: &str) -> Option<&Children> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, entry)| entry)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Children)> {
        self.0.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn insert(&mut self, name: String, node: ResponseNode) {
        match self.0.iter_mut().find(|(key, _)| *key == name) {
            Some((_, entry)) => {
                *entry = match mem::replace(entry, Children::Many(Vec::new())) {
                    Children::One(first) => Children::Many(vec![first, node]),
                    Children::Many(mut nodes) => {
                        nodes.push(node);
                        Children::Many(nodes)
                    }
                };
            }
            None => self.0.push((name, Children::One(node))),
        }
    }
}

impl ResponseNode {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn children(&self) -> &ChildMap {
        &self.children
    }

    pub fn get(&self, name: &str) -> Option<&Children> {
        self.children.get(name)
    }

    /// Convenience lookup: the single child, or the first of a list.
    pub fn first(&self, name: &str) -> Option<&ResponseNode> {
        self.get(name).map(Children::first)
    }
}

/// Recursively normalize a parsed element.
///
/// Children are visited whatever prefix they carry, as long as the prefix is
/// either absent or declared somewhere in the document: legacy responses put
/// logically related children under different prefixes than their parent.
pub fn normalize(element: &Element, namespaces: &BTreeMap<String, String>) -> ResponseNode {
    let mut node = ResponseNode::default();

    for (key, value) in &element.attributes {
        let name = cleanse::cleanup_name(xml::local_name(key));
        let value = cleanse::cleanup_value(value);
        if !name.is_empty() && !value.is_empty() {
            node.attributes.insert(name, value);
        }
    }

    if let Some(text) = &element.text {
        let value = cleanse::cleanup_value(text);
        if !value.is_empty() {
            node.text = Some(value);
        }
    }

    // Attribute names and values are cleansed; element names are keyed raw,
    // so a column named `ows_X` never merges with a sibling named `X`.
    for child in &element.children {
        if !known_prefix(child, namespaces) {
            continue;
        }
        let normalized = normalize(child, namespaces);
        node.children.insert(child.name.clone(), normalized);
    }

    node
}

fn known_prefix(element: &Element, namespaces: &BTreeMap<String, String>) -> bool {
    match &element.prefix {
        None => true,
        Some(prefix) => namespaces.contains_key(prefix),
    }
}

/// Whether the element's prefix resolves to the SOAP envelope namespace.
/// Unprefixed and unregistered-prefix elements are accepted leniently.
pub(crate) fn envelope_qualified(
    element: &Element,
    namespaces: &BTreeMap<String, String>,
) -> bool {
    match &element.prefix {
        None => true,
        Some(prefix) => match namespaces.get(prefix) {
            Some(uri) => uri == ENVELOPE_NAMESPACE,
            None => true,
        },
    }
}

/// Locate the envelope body: `Envelope/Body`, both resolved against the
/// envelope namespace.
pub fn locate_body<'a>(
    root: &'a Element,
    namespaces: &BTreeMap<String, String>,
) -> Option<&'a Element> {
    if root.name != "Envelope" || !envelope_qualified(root, namespaces) {
        return None;
    }

    root.children
        .iter()
        .find(|child| child.name == "Body" && envelope_qualified(child, namespaces))
}
