//! The live browser DOM as [`Tree`].
//!
//! Selectors are handed to [***querySelector***](https://developer.mozilla.org/en-US/docs/Web/API/Element/querySelector) unchanged,
//! so their errors surface as [`Error::Js`].
//!
//! Timing is expressed as CSS transitions, so only style changes made after [`transition`](`crate::transition::transition`) are animated.

use crate::{
	error::Error,
	tree::{Datum, Timing, Tree, DEFAULT_DURATION},
	value::Property,
};
use core::cell::{Cell, RefCell};
use hashbrown::HashMap;
use js_sys::Reflect;
use tracing::{instrument, level_filters::STATIC_MAX_LEVEL, trace, warn, Level};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CssStyleDeclaration, Document, Element, HtmlElement, SvgElement};

const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// Expando property carrying the key of an element's datum in [`WebTree`]'s side table.
const DATUM_KEY: &str = "__selection_dom_datum__";

/// [`WebTree`] warns once its datum table grows beyond this many entries.
///
/// Entries are reclaimed when elements are removed or have their content replaced through the [`Tree`] API,
/// so this only triggers for elements dropped behind its back.
const DATUM_TABLE_WARNING_THRESHOLD: usize = 10_000;

/// A [`web_sys::Document`] as [`Tree`].
///
/// Bound data stays on the Rust side: elements only carry a numeric key into this instance's side table.
/// Use a single [`WebTree`] per document, as keys of different instances collide.
#[derive(Debug)]
pub struct WebTree {
	document: Document,
	data: RefCell<HashMap<u32, Datum>>,
	next_key: Cell<u32>,
}

impl WebTree {
	/// Attaches to the current window's document.
	///
	/// # Errors
	///
	/// [`Error::DomUnavailable`] iff there is no such document.
	pub fn new() -> Result<Self, Error> {
		let document = web_sys::window().ok_or(Error::DomUnavailable)?.document().ok_or(Error::DomUnavailable)?;
		Ok(Self::for_document(document))
	}

	#[must_use]
	pub fn for_document(document: Document) -> Self {
		Self {
			document,
			data: RefCell::default(),
			next_key: Cell::new(0),
		}
	}

	#[must_use]
	pub fn document(&self) -> &Document {
		&self.document
	}

	#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
	fn datum_key(node: &Element) -> Option<u32> {
		Reflect::get(node, &JsValue::from_str(DATUM_KEY)).ok()?.as_f64().map(|key| key as u32)
	}

	/// Number of elements that currently have a datum bound.
	#[must_use]
	pub fn datum_count(&self) -> usize {
		self.data.borrow().len()
	}

	/// Drops the data of `node`'s descendants and, if `inclusive`, of `node` itself.
	fn forget_data(&self, node: &Element, inclusive: bool) -> Result<(), Error> {
		if self.data.borrow().is_empty() {
			return Ok(());
		}
		let descendants = node.query_selector_all("*")?;
		let mut data = self.data.borrow_mut();

		let before = data.len();
		let mut forget = |element: &Element| {
			if let Some(key) = Self::datum_key(element) {
				data.remove(&key);
				// Deleting the expando can only fail for frozen objects, which elements aren't.
				let _ = Reflect::delete_property(element, &JsValue::from_str(DATUM_KEY));
			}
		};
		if inclusive {
			forget(node);
		}
		for i in 0..descendants.length() {
			if let Some(element) = descendants.item(i).and_then(|node| node.dyn_into::<Element>().ok()) {
				forget(&element);
			}
		}
		trace!(reclaimed = before - data.len(), "Forgot data.");
		Ok(())
	}

	fn style(node: &Element) -> Result<CssStyleDeclaration, Error> {
		if let Some(html) = node.dyn_ref::<HtmlElement>() {
			Ok(html.style())
		} else if let Some(svg) = node.dyn_ref::<SvgElement>() {
			Ok(svg.style())
		} else {
			Err(Error::Js(format!("<{}> has no inline style", node.tag_name())))
		}
	}
}

impl Tree for WebTree {
	type Node = Element;

	fn mount_point(&self) -> Result<Element, Error> {
		Ok(self.document.body().ok_or(Error::DomUnavailable)?.into())
	}

	fn select(&self, scope: &Element, selector: &str) -> Result<Option<Element>, Error> {
		Ok(scope.query_selector(selector)?)
	}

	fn select_all(&self, scope: &Element, selector: &str) -> Result<Vec<Element>, Error> {
		let node_list = scope.query_selector_all(selector)?;
		Ok((0..node_list.length())
			.filter_map(|i| node_list.item(i))
			.filter_map(|node| node.dyn_into::<Element>().ok())
			.collect())
	}

	fn child_with_class(&self, parent: &Element, class: &str) -> Result<Option<Element>, Error> {
		let children = parent.children();
		Ok((0..children.length()).filter_map(|i| children.item(i)).find(|child| child.class_list().contains(class)))
	}

	#[instrument(skip(self))]
	fn append_child(&self, parent: &Element, name: &str) -> Result<Element, Error> {
		let element = match name.strip_prefix("svg:") {
			Some(local_name) => self.document.create_element_ns(Some(SVG_NAMESPACE), local_name)?,
			// `foreignObject` content is HTML again.
			None if parent.namespace_uri().as_deref() == Some(SVG_NAMESPACE) && parent.local_name() != "foreignObject" => {
				self.document.create_element_ns(Some(SVG_NAMESPACE), name)?
			}
			None => self.document.create_element(name)?,
		};
		parent.append_child(&element)?;
		trace!("Created element.");
		Ok(element)
	}

	fn remove(&self, node: &Element) -> Result<(), Error> {
		self.forget_data(node, true)?;
		node.remove();
		Ok(())
	}

	fn set_attribute(&self, node: &Element, name: &str, value: &str) -> Result<(), Error> {
		Ok(node.set_attribute(name, value)?)
	}

	fn set_class(&self, node: &Element, name: &str, on: bool) -> Result<(), Error> {
		node.class_list().toggle_with_force(name, on)?;
		Ok(())
	}

	fn set_style(&self, node: &Element, name: &str, value: &str) -> Result<(), Error> {
		Ok(Self::style(node)?.set_property(name, value)?)
	}

	fn set_property(&self, node: &Element, name: &str, value: &Property) -> Result<(), Error> {
		let value = match value {
			Property::Bool(value) => JsValue::from_bool(*value),
			Property::Number(value) => JsValue::from_f64(*value),
			Property::Text(value) => JsValue::from_str(value),
		};
		Reflect::set(node, &JsValue::from_str(name), &value)?;
		Ok(())
	}

	fn set_html(&self, node: &Element, html: &str) -> Result<(), Error> {
		self.forget_data(node, false)?;
		node.set_inner_html(html);
		Ok(())
	}

	fn set_text(&self, node: &Element, text: &str) -> Result<(), Error> {
		self.forget_data(node, false)?;
		node.set_text_content(Some(text));
		Ok(())
	}

	fn datum(&self, node: &Element) -> Option<Datum> {
		let key = Self::datum_key(node)?;
		self.data.borrow().get(&key).cloned()
	}

	fn set_datum(&self, node: &Element, datum: Option<Datum>) {
		let mut data = self.data.borrow_mut();
		match (Self::datum_key(node), datum) {
			(Some(key), Some(datum)) => {
				data.insert(key, datum);
			}
			(Some(key), None) => {
				data.remove(&key);
			}
			(None, Some(datum)) => {
				let key = self.next_key.get();
				self.next_key.set(key.wrapping_add(1));
				if Reflect::set(node, &JsValue::from_str(DATUM_KEY), &JsValue::from(key)).is_ok() {
					data.insert(key, datum);
				} else {
					warn!("Could not attach a datum to {:?}.", node);
				}
			}
			(None, None) => (),
		}

		if STATIC_MAX_LEVEL >= Level::WARN && data.len() > DATUM_TABLE_WARNING_THRESHOLD {
			warn!(
				"The datum table is large ({}).\n\
				This may point to elements with bound data that were detached without `Tree::remove`.",
				data.len()
			);
		}
	}

	fn begin_transition(&self, node: &Element) -> Result<(), Error> {
		let style = Self::style(node)?;
		style.set_property("transition-property", "all")?;
		style.set_property("transition-delay", "0ms")?;
		style.set_property("transition-duration", &format!("{}ms", DEFAULT_DURATION))?;
		Ok(())
	}

	fn set_timing(&self, node: &Element, timing: Timing) -> Result<(), Error> {
		let (property, ms) = match timing {
			Timing::Delay(ms) => ("transition-delay", ms),
			Timing::Duration(ms) => ("transition-duration", ms),
		};
		Ok(Self::style(node)?.set_property(property, &format!("{}ms", ms))?)
	}
}
