use crate::template::{CommentNode, ElementNode, MarkupNode, TextNode};

/// The MarkupVisitor trait is the single traversal mechanism for parsed templates.
///
/// Rules:
/// 1. Traversal is depth-first in document order.
/// 2. Implementers override `visit_*` methods to add behavior.
/// 3. Implementers call the matching `walk_*` function to continue into children
///    unless pruning is intended.
pub trait MarkupVisitor {
    fn visit_root(&mut self, nodes: &[MarkupNode]) {
        self.visit_children(nodes);
    }

    fn visit_children(&mut self, children: &[MarkupNode]) {
        walk_children(self, children);
    }

    fn visit_node(&mut self, node: &MarkupNode) {
        walk_node(self, node);
    }

    fn visit_element(&mut self, element: &ElementNode) {
        walk_element(self, element);
    }

    fn visit_text(&mut self, _text: &TextNode) {
        // Leaf node
    }

    fn visit_comment(&mut self, _comment: &CommentNode) {
        // Leaf node
    }
}

pub fn walk_children<V: MarkupVisitor + ?Sized>(visitor: &mut V, children: &[MarkupNode]) {
    for node in children {
        visitor.visit_node(node);
    }
}

pub fn walk_node<V: MarkupVisitor + ?Sized>(visitor: &mut V, node: &MarkupNode) {
    match node {
        MarkupNode::Element(element) => visitor.visit_element(element),
        MarkupNode::Text(text) => visitor.visit_text(text),
        MarkupNode::Comment(comment) => visitor.visit_comment(comment),
    }
}

pub fn walk_element<V: MarkupVisitor + ?Sized>(visitor: &mut V, element: &ElementNode) {
    visitor.visit_children(&element.children);
}
