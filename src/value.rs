//! The uniform evaluator shape used by every mutating combinator.

use crate::error::Error;
use core::fmt::{self, Debug, Formatter};
use std::rc::Rc;

/// Either a constant or a function of the bound datum and its index.
///
/// ```
/// use selection_dom::Value;
///
/// let constant: Value<u8, String> = "red".into();
/// let computed = Value::computed(|d: &u8, i| format!("{}-{}", d, i));
///
/// assert_eq!(constant.evaluate(None, 3).unwrap(), "red");
/// assert_eq!(computed.evaluate(Some(&7), 3).unwrap(), "7-3");
/// ```
pub enum Value<D, T> {
	Constant(T),
	Computed(Rc<dyn Fn(&D, usize) -> T>),
}

impl<D, T> Value<D, T> {
	pub fn computed(f: impl 'static + Fn(&D, usize) -> T) -> Self {
		Self::Computed(Rc::new(f))
	}

	/// Whether evaluating this value needs the bound datum at all.
	#[must_use]
	pub fn is_constant(&self) -> bool {
		matches!(self, Self::Constant(_))
	}

	/// # Errors
	///
	/// [`Error::MissingDatum`] iff this is [`Value::Computed`] and `datum` is [`None`].
	pub fn evaluate(&self, datum: Option<&D>, index: usize) -> Result<T, Error>
	where
		T: Clone,
	{
		match self {
			Self::Constant(value) => Ok(value.clone()),
			Self::Computed(f) => datum.map(|datum| f(datum, index)).ok_or(Error::MissingDatum),
		}
	}
}

impl<D, T: Clone> Clone for Value<D, T> {
	fn clone(&self) -> Self {
		match self {
			Self::Constant(value) => Self::Constant(value.clone()),
			Self::Computed(f) => Self::Computed(Rc::clone(f)),
		}
	}
}

impl<D, T: Debug> Debug for Value<D, T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
			Self::Computed(_) => f.write_str("Computed(..)"),
		}
	}
}

impl<D, T> From<T> for Value<D, T> {
	fn from(value: T) -> Self {
		Self::Constant(value)
	}
}

impl<D> From<&str> for Value<D, String> {
	fn from(value: &str) -> Self {
		Self::Constant(value.to_owned())
	}
}

impl<D> From<&str> for Value<D, Property> {
	fn from(value: &str) -> Self {
		Self::Constant(Property::Text(value.to_owned()))
	}
}

/// A native property value, as set by [`property`](`crate::selection::property`).
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
	Bool(bool),
	Number(f64),
	Text(String),
}

impl From<bool> for Property {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl From<f64> for Property {
	fn from(value: f64) -> Self {
		Self::Number(value)
	}
}

impl From<String> for Property {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}

impl fmt::Display for Property {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Bool(value) => fmt::Display::fmt(value, f),
			Self::Number(value) => fmt::Display::fmt(value, f),
			Self::Text(value) => fmt::Display::fmt(value, f),
		}
	}
}
