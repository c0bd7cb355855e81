//! Arena-backed DOM for the mock driver.

use super::css::{MatchTarget, SelectorList};
use super::MockPage;
use crate::driver::Key;
use crate::result::ProbeResult;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Index of a node in the arena
pub type NodeId = usize;

/// Scripted reaction to a click or an input change
#[derive(Clone)]
pub struct Behaviour(Arc<dyn Fn(&mut MockPage, NodeId) + Send + Sync>);

impl Behaviour {
    /// Wrap a closure
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut MockPage, NodeId) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invoke on `target`
    pub fn call(&self, page: &mut MockPage, target: NodeId) {
        (self.0)(page, target);
    }
}

impl std::fmt::Debug for Behaviour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Behaviour")
    }
}

/// Scripted reaction to a key press
#[derive(Clone)]
pub struct KeyBehaviour(Arc<dyn Fn(&mut MockPage, NodeId, Key) + Send + Sync>);

impl KeyBehaviour {
    /// Wrap a closure
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut MockPage, NodeId, Key) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invoke on `target`
    pub fn call(&self, page: &mut MockPage, target: NodeId, key: Key) {
        (self.0)(page, target, key);
    }
}

impl std::fmt::Debug for KeyBehaviour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("KeyBehaviour")
    }
}

/// A live element in the arena
#[derive(Debug, Clone, Default)]
pub struct Node {
    /// Tag name (lowercase)
    pub tag: String,
    /// Id attribute
    pub id: Option<String>,
    /// Class list
    pub classes: Vec<String>,
    /// Other attributes
    pub attrs: BTreeMap<String, String>,
    /// Own text (children contribute their own)
    pub text: String,
    /// Form control value
    pub value: String,
    /// Hidden via style
    pub hidden: bool,
    /// Checked state for radios and checkboxes
    pub checked: bool,
    /// Parent node
    pub parent: Option<NodeId>,
    /// Children in document order
    pub children: Vec<NodeId>,
    /// Whether the node is still in the document
    pub attached: bool,
    /// Mouse click reaction (bubbles)
    pub on_click: Option<Behaviour>,
    /// Value change reaction
    pub on_input: Option<Behaviour>,
    /// Key press reaction (bubbles)
    pub on_key: Option<KeyBehaviour>,
}

/// Declarative element tree used to build pages
#[derive(Debug, Clone, Default)]
pub struct MockNode {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attrs: BTreeMap<String, String>,
    text: String,
    value: String,
    hidden: bool,
    checked: bool,
    children: Vec<MockNode>,
    on_click: Option<Behaviour>,
    on_input: Option<Behaviour>,
    on_key: Option<KeyBehaviour>,
}

impl MockNode {
    /// Element from a `tag#id.class.class` shorthand (tag defaults to `div`)
    #[must_use]
    pub fn el(spec: &str) -> Self {
        let mut node = Self::default();
        let mut current = String::new();
        let mut kind = 't';
        for c in spec.chars().chain(std::iter::once('.')) {
            if c == '.' || c == '#' {
                match kind {
                    't' => node.tag = current.to_lowercase(),
                    '#' if !current.is_empty() => node.id = Some(current.clone()),
                    '.' if !current.is_empty() => node.classes.push(current.clone()),
                    _ => {}
                }
                current.clear();
                kind = c;
            } else {
                current.push(c);
            }
        }
        if node.tag.is_empty() {
            node.tag = "div".to_string();
        }
        node
    }

    /// Set an attribute
    #[must_use]
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        if name == "id" {
            self.id = Some(value.to_string());
        } else {
            let _ = self.attrs.insert(name.to_string(), value.to_string());
        }
        self
    }

    /// Set own text
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set control value
    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Hide the element
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Set checked state
    #[must_use]
    pub const fn checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    /// Append a child
    #[must_use]
    pub fn child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Append several children
    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = Self>) -> Self {
        self.children.extend(children);
        self
    }

    /// React to clicks on this element or its descendants
    #[must_use]
    pub fn on_click<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut MockPage, NodeId) + Send + Sync + 'static,
    {
        self.on_click = Some(Behaviour::new(f));
        self
    }

    /// React to value changes
    #[must_use]
    pub fn on_input<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut MockPage, NodeId) + Send + Sync + 'static,
    {
        self.on_input = Some(Behaviour::new(f));
        self
    }

    /// React to key presses on this element or its descendants
    #[must_use]
    pub fn on_key<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut MockPage, NodeId, Key) + Send + Sync + 'static,
    {
        self.on_key = Some(KeyBehaviour::new(f));
        self
    }
}

/// The document
#[derive(Debug, Clone)]
pub struct MockDom {
    nodes: Vec<Node>,
    root: NodeId,
    body: NodeId,
}

impl Default for MockDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDom {
    /// Empty `<html><body></body></html>`
    #[must_use]
    pub fn new() -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            root: 0,
            body: 0,
        };
        dom.root = dom.insert(None, &MockNode::el("html"));
        dom.body = dom.insert(Some(dom.root), &MockNode::el("body"));
        dom
    }

    /// The `<html>` node
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// The `<body>` node
    #[must_use]
    pub const fn body(&self) -> NodeId {
        self.body
    }

    /// Attached node by id
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id).filter(|n| n.attached)
    }

    /// Attached node by id, mutably
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id).filter(|n| n.attached)
    }

    fn insert(&mut self, parent: Option<NodeId>, spec: &MockNode) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            tag: spec.tag.clone(),
            id: spec.id.clone(),
            classes: spec.classes.clone(),
            attrs: spec.attrs.clone(),
            text: spec.text.clone(),
            value: spec.value.clone(),
            hidden: spec.hidden,
            checked: spec.checked,
            parent,
            children: Vec::new(),
            attached: true,
            on_click: spec.on_click.clone(),
            on_input: spec.on_input.clone(),
            on_key: spec.on_key.clone(),
        });
        if let Some(p) = parent {
            self.nodes[p].children.push(id);
        }
        for child in &spec.children {
            let _ = self.insert(Some(id), child);
        }
        id
    }

    /// Append a subtree below `parent`; returns the new subtree root
    pub fn append(&mut self, parent: NodeId, spec: MockNode) -> NodeId {
        self.insert(Some(parent), &spec)
    }

    /// Detach a subtree
    pub fn remove(&mut self, id: NodeId) {
        if id == self.root || id == self.body {
            return;
        }
        if let Some(parent) = self.nodes.get(id).and_then(|n| n.parent) {
            self.nodes[parent].children.retain(|&c| c != id);
        }
        self.detach(id);
    }

    fn detach(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.nodes[id].children);
        self.nodes[id].attached = false;
        for child in children {
            self.detach(child);
        }
    }

    /// Detach every child of `id`
    pub fn clear_children(&mut self, id: NodeId) {
        let children = self.nodes.get(id).map(|n| n.children.clone()).unwrap_or_default();
        for child in children {
            self.remove(child);
        }
    }

    /// Replace the body content
    pub fn set_body(&mut self, content: MockNode) -> NodeId {
        self.clear_children(self.body);
        self.append(self.body, content)
    }

    /// Concatenated text of the node and its descendants
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        if let Some(node) = self.node(id) {
            out.push_str(&node.text);
            for &child in &node.children {
                self.collect_text(child, out);
            }
        }
    }

    /// Attached and neither the node nor any ancestor is hidden
    #[must_use]
    pub fn is_visible(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(n) = current {
            match self.node(n) {
                Some(node) if !node.hidden => current = node.parent,
                _ => return false,
            }
        }
        true
    }

    /// Descendants of `scope` (document when None) in document order,
    /// excluding `scope` itself
    #[must_use]
    pub fn descendants(&self, scope: Option<NodeId>) -> Vec<NodeId> {
        let mut out = Vec::new();
        match scope {
            Some(s) => self.walk(s, &mut out),
            None => {
                out.push(self.root);
                self.walk(self.root, &mut out);
            }
        }
        out
    }

    fn walk(&self, id: NodeId, out: &mut Vec<NodeId>) {
        if let Some(node) = self.node(id) {
            for &child in &node.children {
                out.push(child);
                self.walk(child, out);
            }
        }
    }

    /// Nodes below `scope` matching a parsed selector list
    #[must_use]
    pub fn query(&self, selector: &SelectorList, scope: Option<NodeId>) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&n| selector.matches(self, n))
            .collect()
    }

    /// Nodes below `scope` matching a CSS string
    pub fn find(&self, css: &str, scope: Option<NodeId>) -> ProbeResult<Vec<NodeId>> {
        Ok(self.query(&SelectorList::parse(css)?, scope))
    }

    /// First node matching a CSS string anywhere in the document
    #[must_use]
    pub fn first(&self, css: &str) -> Option<NodeId> {
        self.find(css, None).ok().and_then(|v| v.into_iter().next())
    }

    /// Deepest nodes below `scope` whose text contains `needle`
    #[must_use]
    pub fn deepest_containing(&self, needle: &str, scope: Option<NodeId>) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&n| {
                self.text_content(n).contains(needle)
                    && self.node(n).is_some_and(|node| {
                        !node
                            .children
                            .iter()
                            .any(|&c| self.text_content(c).contains(needle))
                    })
            })
            .collect()
    }

    /// Deepest nodes below `scope` whose trimmed text equals `text`
    #[must_use]
    pub fn deepest_with_exact_text(&self, text: &str, scope: Option<NodeId>) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&n| {
                self.text_content(n).trim() == text
                    && self.node(n).is_some_and(|node| {
                        !node
                            .children
                            .iter()
                            .any(|&c| self.text_content(c).trim() == text)
                    })
            })
            .collect()
    }

    /// Ancestors from parent up to the root
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.node(id).and_then(|n| n.parent);
        while let Some(p) = current {
            out.push(p);
            current = self.node(p).and_then(|n| n.parent);
        }
        out
    }

    /// Set own text
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        if let Some(node) = self.node_mut(id) {
            node.text = text.into();
        }
    }

    /// Set control value
    pub fn set_value(&mut self, id: NodeId, value: impl Into<String>) {
        if let Some(node) = self.node_mut(id) {
            node.value = value.into();
        }
    }

    /// Show or hide
    pub fn set_hidden(&mut self, id: NodeId, hidden: bool) {
        if let Some(node) = self.node_mut(id) {
            node.hidden = hidden;
        }
    }

    /// Set checked state
    pub fn set_checked(&mut self, id: NodeId, checked: bool) {
        if let Some(node) = self.node_mut(id) {
            node.checked = checked;
        }
    }

    /// Control value, empty when detached
    #[must_use]
    pub fn value_of(&self, id: NodeId) -> String {
        self.node(id).map(|n| n.value.clone()).unwrap_or_default()
    }
}

impl MatchTarget for MockDom {
    type Node = NodeId;

    fn tag(&self, node: NodeId) -> &str {
        self.nodes.get(node).map_or("", |n| n.tag.as_str())
    }

    fn id_of(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node).and_then(|n| n.id.as_deref())
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.nodes
            .get(node)
            .is_some_and(|n| n.classes.iter().any(|c| c == class))
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes
            .get(node)
            .and_then(|n| n.attrs.get(name).map(String::as_str))
    }

    fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|n| n.parent)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> MockDom {
        let mut dom = MockDom::new();
        let _ = dom.set_body(
            MockNode::el("header").child(
                MockNode::el("h6.oxd-topbar-header-breadcrumb-module").text("Dashboard"),
            ),
        );
        let body = dom.body();
        let _ = dom.append(
            body,
            MockNode::el("div.oxd-radio-wrapper").child(
                MockNode::el("label")
                    .text("Male")
                    .child(MockNode::el("input").attr("type", "radio")),
            ),
        );
        dom
    }

    mod mock_node_tests {
        use super::*;

        #[test]
        fn test_shorthand() {
            let node = MockNode::el("button#save.oxd-button.oxd-button--main");
            assert_eq!(node.tag, "button");
            assert_eq!(node.id.as_deref(), Some("save"));
            assert_eq!(node.classes, vec!["oxd-button", "oxd-button--main"]);
            assert_eq!(MockNode::el(".only-class").tag, "div");
        }
    }

    mod dom_tests {
        use super::*;

        #[test]
        fn test_find_with_descendant_combinator() {
            let dom = sample();
            let hits = dom
                .find("header h6.oxd-topbar-header-breadcrumb-module", None)
                .unwrap();
            assert_eq!(hits.len(), 1);
            assert_eq!(dom.text_content(hits[0]), "Dashboard");
        }

        #[test]
        fn test_deepest_containing() {
            let dom = sample();
            let hits = dom.deepest_containing("Male", None);
            assert_eq!(hits.len(), 1);
            assert_eq!(dom.node(hits[0]).unwrap().tag, "label");
        }

        #[test]
        fn test_exact_text_skips_wrappers() {
            let dom = sample();
            let hits = dom.deepest_with_exact_text("Dashboard", None);
            assert_eq!(hits.len(), 1);
            assert_eq!(dom.node(hits[0]).unwrap().tag, "h6");
            assert!(dom.deepest_with_exact_text("Dash", None).is_empty());
        }

        #[test]
        fn test_remove_detaches_subtree() {
            let mut dom = sample();
            let wrapper = dom.first(".oxd-radio-wrapper").unwrap();
            let radio = dom.first("input[type=\"radio\"]").unwrap();
            dom.remove(wrapper);
            assert!(dom.node(radio).is_none());
            assert!(dom.first(".oxd-radio-wrapper").is_none());
        }

        #[test]
        fn test_visibility_inherits() {
            let mut dom = sample();
            let wrapper = dom.first(".oxd-radio-wrapper").unwrap();
            let radio = dom.first("input").unwrap();
            assert!(dom.is_visible(radio));
            dom.set_hidden(wrapper, true);
            assert!(!dom.is_visible(radio));
        }

        #[test]
        fn test_ancestors_and_text() {
            let dom = sample();
            let radio = dom.first("input").unwrap();
            let ancestors = dom.ancestors(radio);
            assert_eq!(ancestors.last().copied(), Some(dom.root()));
            assert_eq!(dom.text_content(dom.body()), "DashboardMale");
        }
    }
}
