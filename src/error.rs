use core::fmt;

/// Error type produced while applying a [`Selection`](`crate::Selection`) program.
///
/// Nothing in this crate retries or recovers: every error aborts the current
/// [`render`](`crate::Renderer::render`) or [`update`](`crate::Renderer::update`) call and is handed back to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
	/// The DOM APIs are not accessible (e.g., when executed outside of a browser).
	DomUnavailable,
	/// The tree rejected a selector string.
	Selector(String),
	/// The tree rejected an element name.
	Element(String),
	/// Wrapper around JavaScript exceptions.
	Js(String),
	/// A computed value was requested for an element without bound datum.
	MissingDatum,
	/// The bound datum is not of the type the evaluator expects.
	DatumType {
		/// Name of the expected type.
		expected: &'static str,
	},
	/// A timing combinator was applied outside of a transition.
	NotATransition,
	/// A partition accessor was used on a node set that didn't come out of a data join.
	NoJoin(&'static str),
	/// The node is not (or no longer) part of the tree.
	Detached,
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::DomUnavailable => write!(f, "DOM is not available"),
			Self::Selector(selector) => write!(f, "Invalid selector {:?}", selector),
			Self::Element(name) => write!(f, "Invalid element name {:?}", name),
			Self::Js(msg) => write!(f, "JavaScript error: {}", msg),
			Self::MissingDatum => write!(f, "No datum is bound to the element"),
			Self::DatumType { expected } => write!(f, "Bound datum is not a `{}`", expected),
			Self::NotATransition => write!(f, "Timing can only be set on a transition"),
			Self::NoJoin(partition) => write!(f, "`{}` requires a node set produced by a data join", partition),
			Self::Detached => write!(f, "Node is not part of the tree"),
		}
	}
}

impl std::error::Error for Error {}

impl From<wasm_bindgen::JsValue> for Error {
	fn from(value: wasm_bindgen::JsValue) -> Self {
		value.as_string().map_or_else(|| Self::Js(format!("{:?}", value)), Self::Js)
	}
}
