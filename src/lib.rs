#![doc(html_root_url = "https://docs.rs/selection-dom/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Continuation-passing selection combinators: describe data-driven DOM mutations as pure values,
//! then apply them (and only then) through a [`Renderer`].
//!
//! See [`selection`] for the combinators and [`Tree`] for what they are applied to.

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod error;
mod join;
pub mod memory;
pub mod node_set;
pub mod render;
pub mod selection;
pub mod symbol;
pub mod transition;
pub mod tree;
pub mod value;
pub mod web;

pub use error::Error;
pub use node_set::{Index, NodeSet};
pub use render::{Handle, RenderModel, Renderer};
pub use selection::Selection;
pub use symbol::SymbolGenerator;
pub use tree::Tree;
pub use value::{Property, Value};
