//! The imperative tree-manipulation surface consumed by [`Selection`](`crate::Selection`) programs.
//!
//! The combinators never touch elements other than through this trait,
//! so programs can be applied to the live DOM ([`WebTree`](`crate::web::WebTree`))
//! as well as to an in-memory tree ([`MemoryTree`](`crate::memory::MemoryTree`)).

use crate::{error::Error, value::Property};
use core::{
	any::{type_name, Any},
	fmt::Debug,
};
use std::rc::Rc;

/// A datum as bound to an element.
pub type Datum = Rc<dyn Any>;

/// Per-element animation timing, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timing {
	Delay(u32),
	Duration(u32),
}

/// Duration of a freshly started transition.
pub const DEFAULT_DURATION: u32 = 250;

/// An imperative tree of elements.
///
/// None of these methods validate their arguments beyond what the implementation itself requires,
/// and errors are passed on to the caller unchanged.
pub trait Tree {
	type Node: Clone + PartialEq + Debug;

	/// The element new roots are attached to by default (the document body).
	///
	/// # Errors
	///
	/// Iff there is no such element.
	fn mount_point(&self) -> Result<Self::Node, Error>;

	/// The first descendant of `scope` matching `selector`, in document order.
	///
	/// # Errors
	///
	/// Iff `selector` is rejected.
	fn select(&self, scope: &Self::Node, selector: &str) -> Result<Option<Self::Node>, Error>;

	/// All descendants of `scope` matching `selector`, in document order.
	///
	/// # Errors
	///
	/// Iff `selector` is rejected.
	fn select_all(&self, scope: &Self::Node, selector: &str) -> Result<Vec<Self::Node>, Error>;

	/// The first direct child of `parent` carrying the class `class`.
	///
	/// # Errors
	///
	/// Implementation-defined.
	fn child_with_class(&self, parent: &Self::Node, class: &str) -> Result<Option<Self::Node>, Error>;

	/// Creates a new element called `name` as last child of `parent`.
	///
	/// # Errors
	///
	/// Iff `name` is rejected.
	fn append_child(&self, parent: &Self::Node, name: &str) -> Result<Self::Node, Error>;

	/// Detaches `node` from its parent. Detaching a node without parent is a no-op.
	///
	/// # Errors
	///
	/// Implementation-defined.
	fn remove(&self, node: &Self::Node) -> Result<(), Error>;

	/// # Errors
	///
	/// Implementation-defined.
	fn set_attribute(&self, node: &Self::Node, name: &str, value: &str) -> Result<(), Error>;

	/// # Errors
	///
	/// Implementation-defined.
	fn set_class(&self, node: &Self::Node, name: &str, on: bool) -> Result<(), Error>;

	/// # Errors
	///
	/// Implementation-defined.
	fn set_style(&self, node: &Self::Node, name: &str, value: &str) -> Result<(), Error>;

	/// # Errors
	///
	/// Implementation-defined.
	fn set_property(&self, node: &Self::Node, name: &str, value: &Property) -> Result<(), Error>;

	/// Replaces the content of `node` with parsed markup.
	///
	/// # Errors
	///
	/// Implementation-defined.
	fn set_html(&self, node: &Self::Node, html: &str) -> Result<(), Error>;

	/// Replaces the content of `node` with a single text node.
	///
	/// # Errors
	///
	/// Implementation-defined.
	fn set_text(&self, node: &Self::Node, text: &str) -> Result<(), Error>;

	fn datum(&self, node: &Self::Node) -> Option<Datum>;

	fn set_datum(&self, node: &Self::Node, datum: Option<Datum>);

	/// Starts a transition on `node` with zero delay and [`DEFAULT_DURATION`].
	///
	/// # Errors
	///
	/// Implementation-defined.
	fn begin_transition(&self, node: &Self::Node) -> Result<(), Error>;

	/// # Errors
	///
	/// Implementation-defined.
	fn set_timing(&self, node: &Self::Node, timing: Timing) -> Result<(), Error>;
}

/// The datum bound to `node`, as `D`.
///
/// # Errors
///
/// [`Error::MissingDatum`] if there is none, [`Error::DatumType`] if it isn't a `D`.
pub fn bound<D: 'static, T: Tree + ?Sized>(tree: &T, node: &T::Node) -> Result<Rc<D>, Error> {
	downcast(tree.datum(node).ok_or(Error::MissingDatum)?)
}

pub(crate) fn downcast<D: 'static>(datum: Datum) -> Result<Rc<D>, Error> {
	datum.downcast::<D>().map_err(|_| Error::DatumType { expected: type_name::<D>() })
}

/// Copies the datum of `parent` (if any) onto `child`.
pub(crate) fn propagate<T: Tree + ?Sized>(tree: &T, parent: &T::Node, child: &T::Node) {
	if let Some(datum) = tree.datum(parent) {
		tree.set_datum(child, Some(datum));
	}
}
