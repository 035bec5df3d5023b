//! A deterministic in-memory [`Tree`], for applying programs outside of a browser.
//!
//! Selectors support type selectors, `*`, `#id`, `.class` and the descendant combinator (whitespace).
//! Anything else is rejected with [`Error::Selector`].
//! Markup passed to [`Tree::set_html`] is stored verbatim and not parsed.

use crate::{
	error::Error,
	tree::{Datum, Timing, Tree, DEFAULT_DURATION},
	value::Property,
};
use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Timing of an element's current transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Transition {
	pub delay: u32,
	pub duration: u32,
}

#[derive(Default)]
struct Element {
	name: String,
	parent: Option<NodeId>,
	children: Vec<NodeId>,
	attributes: Vec<(String, String)>,
	classes: Vec<String>,
	styles: Vec<(String, String)>,
	properties: Vec<(String, Property)>,
	text: Option<String>,
	html: Option<String>,
	datum: Option<Datum>,
	transition: Option<Transition>,
}

/// An arena of elements, rooted in a `body` element.
pub struct MemoryTree {
	elements: RefCell<Vec<Element>>,
}

impl Debug for MemoryTree {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("MemoryTree").field("elements", &self.elements.borrow().len()).finish()
	}
}

impl Default for MemoryTree {
	fn default() -> Self {
		Self::new()
	}
}

impl MemoryTree {
	#[must_use]
	pub fn new() -> Self {
		Self {
			elements: RefCell::new(vec![Element {
				name: "body".to_owned(),
				..Element::default()
			}]),
		}
	}

	#[must_use]
	pub fn body(&self) -> NodeId {
		NodeId(0)
	}

	#[must_use]
	pub fn name(&self, node: &NodeId) -> String {
		self.elements.borrow()[node.0].name.clone()
	}

	#[must_use]
	pub fn parent(&self, node: &NodeId) -> Option<NodeId> {
		self.elements.borrow()[node.0].parent
	}

	#[must_use]
	pub fn children(&self, node: &NodeId) -> Vec<NodeId> {
		self.elements.borrow()[node.0].children.clone()
	}

	/// Whether `node` is (still) reachable from [`body`](`MemoryTree::body`).
	#[must_use]
	pub fn is_attached(&self, node: &NodeId) -> bool {
		let elements = self.elements.borrow();
		let mut current = *node;
		while let Some(parent) = elements[current.0].parent {
			current = parent;
		}
		current == self.body()
	}

	#[must_use]
	pub fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
		let elements = self.elements.borrow();
		let element = &elements[node.0];
		if name == "class" {
			return (!element.classes.is_empty()).then(|| element.classes.join(" "));
		}
		element.attributes.iter().find(|(n, _)| n == name).map(|(_, value)| value.clone())
	}

	#[must_use]
	pub fn has_class(&self, node: &NodeId, class: &str) -> bool {
		self.elements.borrow()[node.0].classes.iter().any(|c| c == class)
	}

	#[must_use]
	pub fn classes(&self, node: &NodeId) -> Vec<String> {
		self.elements.borrow()[node.0].classes.clone()
	}

	#[must_use]
	pub fn style(&self, node: &NodeId, name: &str) -> Option<String> {
		self.elements.borrow()[node.0].styles.iter().find(|(n, _)| n == name).map(|(_, value)| value.clone())
	}

	#[must_use]
	pub fn property(&self, node: &NodeId, name: &str) -> Option<Property> {
		self.elements.borrow()[node.0].properties.iter().find(|(n, _)| n == name).map(|(_, value)| value.clone())
	}

	#[must_use]
	pub fn text(&self, node: &NodeId) -> Option<String> {
		self.elements.borrow()[node.0].text.clone()
	}

	#[must_use]
	pub fn html(&self, node: &NodeId) -> Option<String> {
		self.elements.borrow()[node.0].html.clone()
	}

	#[must_use]
	pub fn transition(&self, node: &NodeId) -> Option<Transition> {
		self.elements.borrow()[node.0].transition
	}

	fn detach_children(elements: &mut [Element], node: NodeId) {
		for child in core::mem::take(&mut elements[node.0].children) {
			elements[child.0].parent = None;
		}
	}

	fn descendants(elements: &[Element], scope: NodeId) -> Vec<NodeId> {
		let mut found = Vec::new();
		let mut stack: Vec<NodeId> = elements[scope.0].children.iter().rev().copied().collect();
		while let Some(node) = stack.pop() {
			found.push(node);
			stack.extend(elements[node.0].children.iter().rev().copied());
		}
		found
	}
}

impl Tree for MemoryTree {
	type Node = NodeId;

	fn mount_point(&self) -> Result<NodeId, Error> {
		Ok(self.body())
	}

	fn select(&self, scope: &NodeId, selector: &str) -> Result<Option<NodeId>, Error> {
		let selector = parse_selector(selector)?;
		let elements = self.elements.borrow();
		Ok(Self::descendants(&elements, *scope).into_iter().find(|&node| matches(&elements, node, &selector)))
	}

	fn select_all(&self, scope: &NodeId, selector: &str) -> Result<Vec<NodeId>, Error> {
		let selector = parse_selector(selector)?;
		let elements = self.elements.borrow();
		Ok(Self::descendants(&elements, *scope).into_iter().filter(|&node| matches(&elements, node, &selector)).collect())
	}

	fn child_with_class(&self, parent: &NodeId, class: &str) -> Result<Option<NodeId>, Error> {
		let elements = self.elements.borrow();
		Ok(elements[parent.0].children.iter().copied().find(|child| elements[child.0].classes.iter().any(|c| c == class)))
	}

	fn append_child(&self, parent: &NodeId, name: &str) -> Result<NodeId, Error> {
		let local_name = name.strip_prefix("svg:").unwrap_or(name);
		if !is_identifier(local_name) {
			return Err(Error::Element(name.to_owned()));
		}

		let mut elements = self.elements.borrow_mut();
		let node = NodeId(elements.len());
		elements.push(Element {
			name: local_name.to_owned(),
			parent: Some(*parent),
			..Element::default()
		});
		elements[parent.0].children.push(node);
		trace!(?parent, ?node, name = local_name, "Created element.");
		Ok(node)
	}

	fn remove(&self, node: &NodeId) -> Result<(), Error> {
		let mut elements = self.elements.borrow_mut();
		if let Some(parent) = elements[node.0].parent.take() {
			elements[parent.0].children.retain(|child| child != node);
		}
		Ok(())
	}

	fn set_attribute(&self, node: &NodeId, name: &str, value: &str) -> Result<(), Error> {
		let mut elements = self.elements.borrow_mut();
		let element = &mut elements[node.0];
		if name == "class" {
			element.classes = value.split_whitespace().map(ToOwned::to_owned).collect();
			return Ok(());
		}
		match element.attributes.iter_mut().find(|(n, _)| n == name) {
			Some((_, existing)) => value.clone_into(existing),
			None => element.attributes.push((name.to_owned(), value.to_owned())),
		}
		Ok(())
	}

	fn set_class(&self, node: &NodeId, name: &str, on: bool) -> Result<(), Error> {
		let mut elements = self.elements.borrow_mut();
		let classes = &mut elements[node.0].classes;
		let present = classes.iter().any(|c| c == name);
		if on && !present {
			classes.push(name.to_owned());
		} else if !on {
			classes.retain(|c| c != name);
		}
		Ok(())
	}

	fn set_style(&self, node: &NodeId, name: &str, value: &str) -> Result<(), Error> {
		let mut elements = self.elements.borrow_mut();
		let styles = &mut elements[node.0].styles;
		match styles.iter_mut().find(|(n, _)| n == name) {
			Some((_, existing)) => value.clone_into(existing),
			None => styles.push((name.to_owned(), value.to_owned())),
		}
		Ok(())
	}

	fn set_property(&self, node: &NodeId, name: &str, value: &Property) -> Result<(), Error> {
		let mut elements = self.elements.borrow_mut();
		let properties = &mut elements[node.0].properties;
		match properties.iter_mut().find(|(n, _)| n == name) {
			Some((_, existing)) => *existing = value.clone(),
			None => properties.push((name.to_owned(), value.clone())),
		}
		Ok(())
	}

	fn set_html(&self, node: &NodeId, html: &str) -> Result<(), Error> {
		let mut elements = self.elements.borrow_mut();
		Self::detach_children(&mut elements, *node);
		let element = &mut elements[node.0];
		element.text = None;
		element.html = Some(html.to_owned());
		Ok(())
	}

	fn set_text(&self, node: &NodeId, text: &str) -> Result<(), Error> {
		let mut elements = self.elements.borrow_mut();
		Self::detach_children(&mut elements, *node);
		let element = &mut elements[node.0];
		element.html = None;
		element.text = Some(text.to_owned());
		Ok(())
	}

	fn datum(&self, node: &NodeId) -> Option<Datum> {
		self.elements.borrow()[node.0].datum.clone()
	}

	fn set_datum(&self, node: &NodeId, datum: Option<Datum>) {
		self.elements.borrow_mut()[node.0].datum = datum;
	}

	fn begin_transition(&self, node: &NodeId) -> Result<(), Error> {
		self.elements.borrow_mut()[node.0].transition = Some(Transition {
			delay: 0,
			duration: DEFAULT_DURATION,
		});
		Ok(())
	}

	fn set_timing(&self, node: &NodeId, timing: Timing) -> Result<(), Error> {
		let mut elements = self.elements.borrow_mut();
		let transition = elements[node.0].transition.get_or_insert_with(Transition::default);
		match timing {
			Timing::Delay(delay) => transition.delay = delay,
			Timing::Duration(duration) => transition.duration = duration,
		}
		Ok(())
	}
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Compound {
	name: Option<String>,
	id: Option<String>,
	classes: Vec<String>,
}

fn is_identifier(s: &str) -> bool {
	let mut chars = s.chars();
	matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_') && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Parses a descendant chain of compound selectors, outermost first.
fn parse_selector(selector: &str) -> Result<Vec<Compound>, Error> {
	let invalid = || Error::Selector(selector.to_owned());

	let mut chain = Vec::new();
	for part in selector.split_whitespace() {
		let mut compound = Compound::default();
		let head_len = part.find(|c| c == '.' || c == '#').unwrap_or(part.len());
		let (head, mut rest) = part.split_at(head_len);
		match head {
			"" | "*" => (),
			name if is_identifier(name) => compound.name = Some(name.to_ascii_lowercase()),
			_ => return Err(invalid()),
		}
		while !rest.is_empty() {
			let marker = rest.as_bytes()[0];
			let end = rest[1..].find(|c| c == '.' || c == '#').map_or(rest.len(), |i| i + 1);
			let ident = &rest[1..end];
			if !is_identifier(ident) {
				return Err(invalid());
			}
			if marker == b'#' {
				compound.id = Some(ident.to_owned());
			} else {
				compound.classes.push(ident.to_owned());
			}
			rest = &rest[end..];
		}
		chain.push(compound);
	}

	if chain.is_empty() {
		Err(invalid())
	} else {
		Ok(chain)
	}
}

fn matches_compound(element: &Element, compound: &Compound) -> bool {
	compound.name.as_ref().map_or(true, |name| element.name.eq_ignore_ascii_case(name))
		&& compound
			.id
			.as_ref()
			.map_or(true, |id| element.attributes.iter().any(|(n, v)| n == "id" && v == id))
		&& compound.classes.iter().all(|class| element.classes.contains(class))
}

fn matches(elements: &[Element], node: NodeId, chain: &[Compound]) -> bool {
	let (last, ancestors) = match chain.split_last() {
		Some(split) => split,
		None => return false,
	};
	if !matches_compound(&elements[node.0], last) {
		return false;
	}

	let mut remaining = ancestors;
	let mut current = elements[node.0].parent;
	while let (Some((compound, rest)), Some(ancestor)) = (remaining.split_last(), current) {
		if matches_compound(&elements[ancestor.0], compound) {
			remaining = rest;
		}
		current = elements[ancestor.0].parent;
	}
	remaining.is_empty()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_compounds() {
		let chain = parse_selector("ul  li.row#first.even").unwrap();
		assert_eq!(chain.len(), 2);
		assert_eq!(chain[0].name.as_deref(), Some("ul"));
		assert_eq!(
			chain[1],
			Compound {
				name: Some("li".to_owned()),
				id: Some("first".to_owned()),
				classes: vec!["row".to_owned(), "even".to_owned()],
			}
		);
		assert_eq!(parse_selector(".static-div-1").unwrap()[0].classes, vec!["static-div-1".to_owned()]);
	}

	#[test]
	fn rejects_unsupported_selectors() {
		for selector in ["", "ul > li", "li:hover", "a..b", "#", "[href]"] {
			assert_eq!(parse_selector(selector), Err(Error::Selector(selector.to_owned())), "{:?}", selector);
		}
	}

	#[test]
	fn descendant_matching() {
		let tree = MemoryTree::new();
		let list = tree.append_child(&tree.body(), "ul").unwrap();
		let item = tree.append_child(&list, "li").unwrap();
		let span = tree.append_child(&item, "span").unwrap();
		tree.append_child(&tree.body(), "span").unwrap();

		assert_eq!(tree.select_all(&tree.body(), "ul span").unwrap(), vec![span]);
		assert_eq!(tree.select_all(&tree.body(), "span").unwrap().len(), 2);
		assert_eq!(tree.select(&list, "*").unwrap(), Some(item));
		assert_eq!(tree.select(&item, "li").unwrap(), None);
	}

	#[test]
	fn class_attribute_and_classes_agree() {
		let tree = MemoryTree::new();
		let node = tree.append_child(&tree.body(), "div").unwrap();
		tree.set_class(&node, "marked", true).unwrap();
		tree.set_attribute(&node, "class", "a b").unwrap();
		assert!(!tree.has_class(&node, "marked"));
		tree.set_class(&node, "marked", true).unwrap();
		assert_eq!(tree.attribute(&node, "class").as_deref(), Some("a b marked"));
		assert_eq!(tree.select(&tree.body(), "div.b.marked").unwrap(), Some(node));
	}

	#[test]
	fn text_replaces_children() {
		let tree = MemoryTree::new();
		let node = tree.append_child(&tree.body(), "p").unwrap();
		let child = tree.append_child(&node, "b").unwrap();
		tree.set_text(&node, "plain").unwrap();
		assert!(tree.children(&node).is_empty());
		assert!(!tree.is_attached(&child));
		assert_eq!(tree.text(&node).as_deref(), Some("plain"));
	}

	#[test]
	fn rejects_bad_names() {
		let tree = MemoryTree::new();
		assert_eq!(tree.append_child(&tree.body(), "no good"), Err(Error::Element("no good".to_owned())));
		assert_eq!(tree.name(&tree.append_child(&tree.body(), "svg:rect").unwrap()), "rect");
	}
}
