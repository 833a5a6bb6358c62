//! Template section parsing and slot/event extraction.
//!
//! The markup is parsed with html5ever and converted into a small owned tree
//! that the [`MarkupVisitor`] walks. Tag and attribute names come back
//! lower-cased from the HTML parser; attribute names get their source
//! spelling back from the raw markup so `@customChange` keeps its case.

use crate::entry::{EventEntry, Parameter, SlotEntry};
use crate::jsdoc::DocComment;
use crate::visitor::{walk_element, MarkupVisitor};
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use lazy_static::lazy_static;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use regex::{Captures, Regex};
use std::collections::HashMap;

lazy_static! {
    static ref SELF_CLOSING_RE: Regex = Regex::new(
        r#"<([a-zA-Z][\w.:-]*)((?:\s+[^\s=/>]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+))?)*)\s*/>"#
    )
    .unwrap();
    static ref NESTED_TEMPLATE_RE: Regex = Regex::new(r"(?i)<(/?)template\b").unwrap();
    static ref OPEN_TAG_RE: Regex = Regex::new(
        r#"<[a-zA-Z][\w.:-]*((?:\s+[^\s=/>]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+))?)*)\s*/?>"#
    )
    .unwrap();
    static ref ATTRIBUTE_RE: Regex =
        Regex::new(r#"([^\s=/>]+)(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+))?"#).unwrap();
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

// ═══════════════════════════════════════════════════════════════════════════════
// MARKUP TREE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub enum MarkupNode {
    Element(ElementNode),
    Text(TextNode),
    Comment(CommentNode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementNode {
    pub tag: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<MarkupNode>,
}

impl ElementNode {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    pub content: String,
}

impl TextNode {
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentNode {
    pub content: String,
}

/// Parses template markup into a list of top-level nodes.
pub fn parse_markup(html: &str) -> Vec<MarkupNode> {
    let normalized = normalize_markup(html);
    let wrapped = format!("<body>{}</body>", normalized);

    let dom = match parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut wrapped.as_bytes())
    {
        Ok(dom) => dom,
        Err(e) => {
            tracing::warn!("failed to parse template markup: {}", e);
            return Vec::new();
        }
    };

    let spellings = attribute_spellings(html);
    let mut nodes = Vec::new();
    collect_body(&dom.document, &spellings, &mut nodes);
    nodes
}

/// Lower-cased attribute name to the first mixed-case spelling found in the
/// source markup.
fn attribute_spellings(html: &str) -> HashMap<String, String> {
    let mut spellings = HashMap::new();
    for tag in OPEN_TAG_RE.captures_iter(html) {
        for attr in ATTRIBUTE_RE.captures_iter(&tag[1]) {
            let name = &attr[1];
            let lower = name.to_ascii_lowercase();
            if lower != name {
                spellings.entry(lower).or_insert_with(|| name.to_string());
            }
        }
    }
    spellings
}

/// Expands self-closing non-void tags and renames nested `<template>` so the
/// HTML parser keeps their children in the tree.
fn normalize_markup(html: &str) -> String {
    let expanded = SELF_CLOSING_RE.replace_all(html, |caps: &Captures| {
        let tag = &caps[1];
        if VOID_ELEMENTS.contains(&tag.to_ascii_lowercase().as_str()) {
            caps[0].to_string()
        } else {
            format!("<{}{}></{}>", tag, &caps[2], tag)
        }
    });
    NESTED_TEMPLATE_RE
        .replace_all(&expanded, "<${1}x-template")
        .into_owned()
}

fn collect_body(handle: &Handle, spellings: &HashMap<String, String>, nodes: &mut Vec<MarkupNode>) {
    match &handle.data {
        NodeData::Document => {
            for child in handle.children.borrow().iter() {
                collect_body(child, spellings, nodes);
            }
        }
        NodeData::Element { name, .. } => {
            let tag = name.local.to_string();
            if tag == "html" {
                for child in handle.children.borrow().iter() {
                    collect_body(child, spellings, nodes);
                }
            } else if tag == "body" {
                for child in handle.children.borrow().iter() {
                    if let Some(node) = convert_node(child, spellings) {
                        nodes.push(node);
                    }
                }
            }
        }
        _ => {}
    }
}

fn convert_node(handle: &Handle, spellings: &HashMap<String, String>) -> Option<MarkupNode> {
    match &handle.data {
        NodeData::Element { name, attrs, .. } => {
            let mut tag = name.local.to_string();
            if tag == "x-template" {
                tag = "template".to_string();
            }
            let attributes = attrs
                .borrow()
                .iter()
                .map(|attr| {
                    let name = attr.name.local.to_string();
                    Attribute {
                        name: spellings.get(&name).cloned().unwrap_or(name),
                        value: attr.value.to_string(),
                    }
                })
                .collect();
            let children = handle
                .children
                .borrow()
                .iter()
                .filter_map(|child| convert_node(child, spellings))
                .collect();
            Some(MarkupNode::Element(ElementNode {
                tag,
                attributes,
                children,
            }))
        }
        NodeData::Text { contents } => Some(MarkupNode::Text(TextNode {
            content: contents.borrow().to_string(),
        })),
        NodeData::Comment { contents } => Some(MarkupNode::Comment(CommentNode {
            content: contents.to_string(),
        })),
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SLOT & EVENT SCANNER
// ═══════════════════════════════════════════════════════════════════════════════

/// Something the template declares, in document order.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateItem {
    Slot(SlotEntry),
    Event(EventEntry),
}

/// Collects `<slot>` elements and `@event` / `v-on:event` bindings, each
/// documented by the comment directly preceding its element.
pub struct TemplateScanner {
    slots: bool,
    events: bool,
    items: Vec<TemplateItem>,
    preceding: Option<DocComment>,
}

impl TemplateScanner {
    pub fn new(slots: bool, events: bool) -> Self {
        Self {
            slots,
            events,
            items: Vec::new(),
            preceding: None,
        }
    }

    pub fn scan(mut self, nodes: &[MarkupNode]) -> Vec<TemplateItem> {
        self.visit_root(nodes);
        self.items
    }

    fn scan_slot(&mut self, element: &ElementNode, doc: &DocComment) {
        let name = element
            .attribute("name")
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("default");

        let props = element
            .attributes
            .iter()
            .filter_map(|attr| bound_attribute(&attr.name))
            .filter(|name| *name != "name")
            .map(|name| {
                let mut param = doc
                    .props
                    .iter()
                    .find(|p| p.name == name)
                    .cloned()
                    .unwrap_or_else(|| Parameter::new(name));
                param.name = name.to_string();
                param
            })
            .collect();

        self.items.push(TemplateItem::Slot(SlotEntry {
            member: doc.member(name),
            props,
        }));
    }

    fn scan_events(&mut self, element: &ElementNode, doc: &DocComment) {
        for attr in &element.attributes {
            let Some(event) = event_binding(&attr.name) else {
                continue;
            };
            self.items.push(TemplateItem::Event(EventEntry {
                member: doc.member(event),
                arguments: doc.params.clone(),
            }));
        }
    }
}

impl MarkupVisitor for TemplateScanner {
    fn visit_children(&mut self, children: &[MarkupNode]) {
        let mut pending: Option<&CommentNode> = None;
        for node in children {
            match node {
                MarkupNode::Comment(comment) => pending = Some(comment),
                MarkupNode::Text(text) if text.is_blank() => {}
                MarkupNode::Text(_) => pending = None,
                MarkupNode::Element(element) => {
                    self.preceding = pending.take().map(|c| DocComment::parse(&c.content));
                    self.visit_element(element);
                }
            }
        }
    }

    fn visit_element(&mut self, element: &ElementNode) {
        let doc = self.preceding.take().unwrap_or_default();
        if !doc.hidden {
            if self.slots && element.tag == "slot" {
                self.scan_slot(element, &doc);
            }
            if self.events {
                self.scan_events(element, &doc);
            }
        }
        walk_element(self, element);
    }
}

/// Event name bound by a `@name` or `v-on:name` attribute, without modifiers.
pub fn event_binding(attribute: &str) -> Option<&str> {
    let raw = attribute
        .strip_prefix('@')
        .or_else(|| attribute.strip_prefix("v-on:"))?;
    if raw.is_empty() || raw.starts_with('[') {
        return None;
    }
    Some(raw.split('.').next().unwrap_or(raw))
}

/// Prop name bound by a `:name` or `v-bind:name` attribute.
fn bound_attribute(attribute: &str) -> Option<&str> {
    let raw = attribute
        .strip_prefix(':')
        .or_else(|| attribute.strip_prefix("v-bind:"))?;
    if raw.is_empty() || raw.starts_with('[') {
        return None;
    }
    Some(raw.split('.').next().unwrap_or(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Visibility;

    fn scan(html: &str) -> Vec<TemplateItem> {
        TemplateScanner::new(true, true).scan(&parse_markup(html))
    }

    fn slots(items: &[TemplateItem]) -> Vec<&SlotEntry> {
        items
            .iter()
            .filter_map(|i| match i {
                TemplateItem::Slot(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    fn events(items: &[TemplateItem]) -> Vec<&EventEntry> {
        items
            .iter()
            .filter_map(|i| match i {
                TemplateItem::Event(e) => Some(e),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_default_slot_with_comment() {
        let items = scan("<div>\n  <!-- Main content -->\n  <slot/>\n</div>");
        let slots = slots(&items);
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].member.name, "default");
        assert_eq!(slots[0].member.description.as_deref(), Some("Main content"));
    }

    #[test]
    fn test_intervening_element_breaks_adjacency() {
        let items = scan("<div><!-- orphan --><span></span><slot name=\"footer\"></slot></div>");
        let slots = slots(&items);
        assert_eq!(slots[0].member.name, "footer");
        assert_eq!(slots[0].member.description, None);
    }

    #[test]
    fn test_events_share_element_comment() {
        let items = scan(
            "<div>\n<!-- Emitted on edits\n@protected -->\n<input @input=\"a\" v-on:change.once=\"b\">\n</div>",
        );
        let events = events(&items);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].member.name, "input");
        assert_eq!(events[1].member.name, "change");
        for e in &events {
            assert_eq!(e.member.description.as_deref(), Some("Emitted on edits"));
            assert_eq!(e.member.visibility, Visibility::Protected);
        }
    }

    #[test]
    fn test_slot_props_from_bindings() {
        let items = scan(
            "<ul><!-- Row\n@prop {Object} item - the row --><slot name=\"row\" :item=\"i\" v-bind:index=\"n\"></slot></ul>",
        );
        let slots = slots(&items);
        assert_eq!(slots[0].props.len(), 2);
        assert_eq!(slots[0].props[0].name, "item");
        assert!(slots[0].props[0].kind.is("object"));
        assert_eq!(slots[0].props[1].name, "index");
        assert!(slots[0].props[1].kind.is("unknown"));
    }

    #[test]
    fn test_nested_template_children_are_scanned() {
        let items = scan("<div><template v-if=\"x\"><slot name=\"inner\"/></template></div>");
        assert_eq!(slots(&items)[0].member.name, "inner");
    }

    #[test]
    fn test_event_binding_names() {
        assert_eq!(event_binding("@click.prevent"), Some("click"));
        assert_eq!(event_binding("v-on:input"), Some("input"));
        assert_eq!(event_binding("@[dynamic]"), None);
        assert_eq!(event_binding("v-on"), None);
        assert_eq!(event_binding("class"), None);
    }

    #[test]
    fn test_event_names_keep_source_case() {
        let items = scan("<div><my-input @customChange=\"x\" v-on:update:modelValue=\"y\" class=\"a\"/></div>");
        let events = events(&items);
        let names: Vec<&str> = events.iter().map(|e| e.member.name.as_str()).collect();
        assert_eq!(names, vec!["customChange", "update:modelValue"]);
    }

    #[test]
    fn test_slot_props_keep_source_case() {
        let items = scan("<div><slot name=\"row\" :rowIndex=\"i\"></slot></div>");
        assert_eq!(slots(&items)[0].props[0].name, "rowIndex");
    }

    #[test]
    fn test_hidden_slot_is_skipped() {
        let items = scan("<div><!-- @hidden --><slot></slot></div>");
        assert!(slots(&items).is_empty());
    }
}
