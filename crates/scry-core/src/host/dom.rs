//! Arena-backed document tree.
//!
//! Nodes are addressed by [`NodeId`]; lookups on stale or foreign ids return
//! `None` rather than panicking.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
enum NodeData {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone, Default)]
struct ElementData {
    /// Lowercase tag name.
    tag: String,
    attributes: BTreeMap<String, String>,
    /// Form control value (input, textarea, select).
    value: Option<String>,
    /// Selected option index for select elements.
    selected_index: Option<usize>,
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    body: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document with a `body` element.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            body: NodeId(0),
        };
        doc.body = doc.push(None, NodeData::Element(ElementData {
            tag: "body".to_string(),
            ..Default::default()
        }));
        doc
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    fn push(&mut self, parent: Option<NodeId>, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            data,
        });
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(p.0)) {
            parent.children.push(id);
        }
        id
    }

    fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes.get(id.0)?.data {
            NodeData::Element(el) => Some(el),
            NodeData::Text(_) => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes.get_mut(id.0)?.data {
            NodeData::Element(el) => Some(el),
            NodeData::Text(_) => None,
        }
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(None, NodeData::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            ..Default::default()
        }))
    }

    /// Create an element under `parent` with the given attributes.
    pub fn create_element_with(&mut self, parent: NodeId, tag: &str, attributes: &[(&str, &str)]) -> NodeId {
        let id = self.create_element(tag);
        for (name, value) in attributes {
            self.set_attribute(id, name, value);
        }
        self.append_child(parent, id);
        id
    }

    /// Move `child` under `parent`. Returns false for unknown ids, text
    /// parents or cycles.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if self.element(parent).is_none() || self.nodes.get(child.0).is_none() {
            return false;
        }
        if self.ancestors_inclusive(parent).any(|id| id == child) {
            return false;
        }
        if let Some(old) = self.nodes[child.0].parent {
            if let Some(old_parent) = self.nodes.get_mut(old.0) {
                old_parent.children.retain(|c| *c != child);
            }
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        true
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> Option<NodeId> {
        self.element(parent)?;
        Some(self.push(Some(parent), NodeData::Text(text.to_string())))
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(el) = self.element_mut(id) {
            el.attributes.insert(name.to_ascii_lowercase(), value.to_string());
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?
            .attributes
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn attributes(&self, id: NodeId) -> impl Iterator<Item = (&str, &str)> {
        self.element(id)
            .into_iter()
            .flat_map(|el| el.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    /// Lowercase tag name; `None` for text nodes.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    /// `tag` for elements, `#text` for text nodes.
    pub fn node_name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes.get(id.0)?.data {
            NodeData::Element(el) => Some(el.tag.as_str()),
            NodeData::Text(_) => Some("#text"),
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0)?.parent
    }

    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|p| self.is_element(*p))
    }

    pub fn child_nodes(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id.0).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    fn ancestors_inclusive(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |current| self.parent(*current))
    }

    /// Concatenated descendant text.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.nodes.get(id.0) else {
            return;
        };
        match &node.data {
            NodeData::Text(text) => out.push_str(text),
            NodeData::Element(_) => {
                for child in &node.children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    /// Rendered text: descendant text with runs of whitespace collapsed.
    pub fn inner_text(&self, id: NodeId) -> String {
        self.text_content(id).split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Nearest inclusive ancestor with tag `tag`.
    pub fn closest(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        self.ancestors_inclusive(id)
            .find(|candidate| self.tag_name(*candidate).is_some_and(|t| t.eq_ignore_ascii_case(tag)))
    }

    /// First element in document order with `id="..."`, searching from body.
    pub fn element_by_id(&self, element_id: &str) -> Option<NodeId> {
        self.find_descendant(self.body, &|doc, id| doc.attribute(id, "id") == Some(element_id))
    }

    /// First `label[for=element_id]` in document order.
    pub fn label_for(&self, element_id: &str) -> Option<NodeId> {
        self.find_descendant(self.body, &|doc, id| {
            doc.tag_name(id) == Some("label") && doc.attribute(id, "for") == Some(element_id)
        })
    }

    fn find_descendant(&self, root: NodeId, pred: &dyn Fn(&Self, NodeId) -> bool) -> Option<NodeId> {
        for child in self.child_nodes(root) {
            if self.is_element(*child) {
                if pred(self, *child) {
                    return Some(*child);
                }
                if let Some(found) = self.find_descendant(*child, pred) {
                    return Some(found);
                }
            }
        }
        None
    }

    pub fn value(&self, id: NodeId) -> Option<&str> {
        let el = self.element(id)?;
        if el.tag == "select" {
            return self
                .selected_option(id)
                .map(|opt| self.option_value(opt))
                .or(Some(""));
        }
        el.value.as_deref().or(Some(""))
    }

    pub fn set_value(&mut self, id: NodeId, value: &str) {
        if self.tag_name(id) == Some("select") {
            let index = self.options(id).iter().position(|opt| self.option_value(*opt) == value);
            if let Some(el) = self.element_mut(id) {
                el.selected_index = index;
            }
        } else if let Some(el) = self.element_mut(id) {
            el.value = Some(value.to_string());
        }
    }

    /// Option elements of a select, in document order.
    pub fn options(&self, select: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_options(select, &mut out);
        out
    }

    fn collect_options(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for child in self.child_nodes(id) {
            match self.tag_name(*child) {
                Some("option") => out.push(*child),
                Some(_) => self.collect_options(*child, out),
                None => {}
            }
        }
    }

    fn option_value(&self, option: NodeId) -> &str {
        match self.attribute(option, "value") {
            Some(v) => v,
            None => self.first_text(option).unwrap_or(""),
        }
    }

    fn first_text(&self, id: NodeId) -> Option<&str> {
        self.child_nodes(id).iter().find_map(|c| match &self.nodes.get(c.0)?.data {
            NodeData::Text(t) => Some(t.as_str()),
            NodeData::Element(_) => None,
        })
    }

    /// Select option `index`; out-of-range clears the selection.
    pub fn select_option(&mut self, select: NodeId, index: usize) {
        let len = self.options(select).len();
        if let Some(el) = self.element_mut(select) {
            el.selected_index = (index < len).then_some(index);
        }
    }

    /// Selected option index; select elements default to the first option.
    pub fn selected_index(&self, select: NodeId) -> Option<usize> {
        let el = self.element(select)?;
        match el.selected_index {
            Some(index) => Some(index),
            None if el.tag == "select" && !self.options(select).is_empty() => Some(0),
            None => None,
        }
    }

    fn selected_option(&self, select: NodeId) -> Option<NodeId> {
        let index = self.selected_index(select)?;
        self.options(select).get(index).copied()
    }

    pub fn selected_option_text(&self, select: NodeId) -> Option<String> {
        self.selected_option(select).map(|opt| self.text_content(opt))
    }
}
