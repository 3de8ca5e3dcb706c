//! Positional queries over a parsed HTML tree.
//!
//! Bill pages are laid out with nested tables and no stable ids, so fields
//! are addressed by structural position: "second `td` of the first row of
//! the second table". A path is a slice of [`Step`]s evaluated the way an
//! XPath location path is: each step maps the current node set to the
//! matching children (or descendants) of every node in it, positions are
//! 1-based and counted among siblings with the same tag.
//!
//! The HTML5 parser inserts `tbody` around table rows that the markup never
//! declared. Row steps look through `tbody`, `thead` and `tfoot` so that
//! `table/tr` matches the rows as written.

use std::collections::HashSet;

use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    axis: Axis,
    tag: &'static str,
    position: Option<usize>,
    id: Option<&'static str>,
}

impl Step {
    /// `/tag`
    pub const fn child(tag: &'static str) -> Self {
        Self {
            axis: Axis::Child,
            tag,
            position: None,
            id: None,
        }
    }

    /// `//tag`
    pub const fn descendant(tag: &'static str) -> Self {
        Self {
            axis: Axis::Descendant,
            tag,
            position: None,
            id: None,
        }
    }

    /// `tag[position]`, 1-based.
    pub const fn at(self, position: usize) -> Self {
        Self {
            position: Some(position),
            ..self
        }
    }

    /// `tag[@id = "id"]`
    pub const fn with_id(self, id: &'static str) -> Self {
        Self {
            id: Some(id),
            ..self
        }
    }

    fn matches(&self, node: NodeRef<'_, Node>) -> bool {
        let Some(element) = node.value().as_element() else {
            return false;
        };
        element.name().eq_ignore_ascii_case(self.tag)
            && self.id.map_or(true, |id| element.id() == Some(id))
    }
}

/// A parsed page.
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    /// Evaluates an absolute path starting at the document node.
    pub fn select(&self, path: &[Step]) -> Vec<ElementRef<'_>> {
        evaluate(vec![self.html.tree.root()], path)
    }

    /// CSS selection, for the few fields that carry a class name. An
    /// invalid selector matches nothing.
    pub fn select_css(&self, css: &str) -> Vec<ElementRef<'_>> {
        match Selector::parse(css) {
            Ok(selector) => self.html.select(&selector).collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// Evaluates `path` relative to every element in `context`.
pub fn select_from<'a>(context: &[ElementRef<'a>], path: &[Step]) -> Vec<ElementRef<'a>> {
    evaluate(context.iter().map(|element| **element).collect(), path)
}

fn evaluate<'a>(mut nodes: Vec<NodeRef<'a, Node>>, path: &[Step]) -> Vec<ElementRef<'a>> {
    for step in path {
        nodes = apply(step, nodes);
        if nodes.is_empty() {
            break;
        }
    }
    nodes.into_iter().filter_map(ElementRef::wrap).collect()
}

fn apply<'a>(step: &Step, context: Vec<NodeRef<'a, Node>>) -> Vec<NodeRef<'a, Node>> {
    let mut seen = HashSet::new();
    let mut selected = Vec::new();
    for node in context {
        let parents: Vec<NodeRef<'a, Node>> = match step.axis {
            Axis::Child => vec![node],
            Axis::Descendant => node.descendants().collect(),
        };
        for parent in parents {
            for matched in matching_children(parent, step) {
                if seen.insert(matched.id()) {
                    selected.push(matched);
                }
            }
        }
    }
    selected
}

fn matching_children<'a>(parent: NodeRef<'a, Node>, step: &Step) -> Vec<NodeRef<'a, Node>> {
    let mut candidates = element_children(parent)
        .into_iter()
        .filter(|child| step.matches(*child));
    match step.position {
        Some(position) if position >= 1 => candidates.nth(position - 1).into_iter().collect(),
        Some(_) => Vec::new(),
        None => candidates.collect(),
    }
}

fn element_children(parent: NodeRef<'_, Node>) -> Vec<NodeRef<'_, Node>> {
    let is_table = parent
        .value()
        .as_element()
        .is_some_and(|element| element.name() == "table");

    let mut children = Vec::new();
    for child in parent.children() {
        let Some(element) = child.value().as_element() else {
            continue;
        };
        if is_table && matches!(element.name(), "tbody" | "thead" | "tfoot") {
            children.extend(child.children().filter(|row| row.value().is_element()));
        } else {
            children.push(child);
        }
    }
    children
}

/// Direct text children of `element`, like XPath `text()`.
pub fn own_text(element: ElementRef<'_>) -> Vec<String> {
    element
        .children()
        .filter_map(|child| child.value().as_text().map(|text| String::from(&**text)))
        .collect()
}

/// Direct text children of every element, in order.
pub fn own_texts(elements: &[ElementRef<'_>]) -> Vec<String> {
    elements.iter().flat_map(|element| own_text(*element)).collect()
}

/// All text below `element`, concatenated.
pub fn full_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

pub fn attribute_values(elements: &[ElementRef<'_>], name: &str) -> Vec<String> {
    elements
        .iter()
        .filter_map(|element| element.value().attr(name))
        .map(ToOwned::to_owned)
        .collect()
}

/// Children tagged `tag` that come before the first child tagged `stop`.
/// Without a `stop` child nothing qualifies.
pub fn children_before<'a>(element: ElementRef<'a>, tag: &str, stop: &str) -> Vec<ElementRef<'a>> {
    let children: Vec<ElementRef<'a>> = element.children().filter_map(ElementRef::wrap).collect();
    let Some(stop_index) = children
        .iter()
        .position(|child| child.value().name().eq_ignore_ascii_case(stop))
    else {
        return Vec::new();
    };
    children[..stop_index]
        .iter()
        .filter(|child| child.value().name().eq_ignore_ascii_case(tag))
        .copied()
        .collect()
}

/// Maximal runs of ASCII digits in `text`.
pub fn digit_runs(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .collect()
}
