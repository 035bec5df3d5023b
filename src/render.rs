//! The only place [`Selection`] programs are applied.

use crate::{
	error::Error,
	node_set::{Index, NodeSet},
	selection::Selection,
	tree::{Datum, Tree},
	web::WebTree,
};
use core::fmt::{self, Debug, Formatter};
use std::rc::Rc;
use tracing::{debug, instrument};

/// What the host hands to [`Renderer::render`] and [`Renderer::update`].
pub struct RenderModel<D, T: Tree = WebTree> {
	/// In CSS pixels.
	pub width: u32,
	/// In CSS pixels.
	pub height: u32,
	/// Applied on every [`render`](`Renderer::render`) and [`update`](`Renderer::update`).
	pub selection: Selection<D, T>,
	/// Bound to the root element before `selection` is applied.
	pub datum: Rc<D>,
	/// Applied once, on [`render`](`Renderer::render`), before `selection`.
	pub root: Option<Selection<D, T>>,
}

impl<D: 'static, T: 'static + Tree> RenderModel<D, T> {
	#[must_use]
	pub fn new(width: u32, height: u32, selection: Selection<D, T>, datum: D) -> Self {
		Self {
			width,
			height,
			selection,
			datum: Rc::new(datum),
			root: None,
		}
	}

	#[must_use]
	pub fn with_root(self, root: Selection<D, T>) -> Self {
		Self { root: Some(root), ..self }
	}
}

impl<D: Debug, T: Tree> Debug for RenderModel<D, T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("RenderModel")
			.field("width", &self.width)
			.field("height", &self.height)
			.field("datum", &self.datum)
			.field("root", &self.root.is_some())
			.finish_non_exhaustive()
	}
}

/// The root element created by [`Renderer::render`], to be handed back to [`Renderer::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handle<N>(N);

impl<N> Handle<N> {
	pub fn node(&self) -> &N {
		&self.0
	}
}

/// Attached to a mount element, this `struct` creates one root element per [`render`](`Renderer::render`) call
/// and re-applies programs to it on each [`update`](`Renderer::update`).
///
/// # Correct Use
///
/// Call [`render`](`Renderer::render`) once per root and don't interleave [`update`](`Renderer::update`) calls for the same [`Handle`].
/// Programs are always re-applied in full, so [`append`](`crate::selection::append`) outside of a data join
/// adds elements on every update, while [`static_`](`crate::selection::static_`) and [`bind`](`crate::selection::bind`) reconcile.
#[derive(Debug)]
pub struct Renderer<T: Tree = WebTree> {
	tree: T,
	mount: T::Node,
}

impl<T: 'static + Tree> Renderer<T> {
	/// Mounts new roots under `tree`'s [mount point](`Tree::mount_point`).
	///
	/// # Errors
	///
	/// Iff `tree` has no mount point.
	pub fn new(tree: T) -> Result<Self, Error> {
		let mount = tree.mount_point()?;
		Ok(Self::new_for_element(tree, mount))
	}

	#[must_use]
	pub fn new_for_element(tree: T, mount: T::Node) -> Self {
		Self { tree, mount }
	}

	#[must_use]
	pub fn tree(&self) -> &T {
		&self.tree
	}

	/// Creates a new root element, binds `model`'s datum to it and applies first [`root`](`RenderModel::root`), then [`selection`](`RenderModel::selection`).
	///
	/// # Errors
	///
	/// Any [`Error`] raised while applying the programs.
	/// The root element stays in place in that case.
	#[instrument(skip(self, model), fields(width = model.width, height = model.height))]
	pub fn render<D: 'static>(&self, model: &RenderModel<D, T>) -> Result<Handle<T::Node>, Error> {
		let root = self.tree.append_child(&self.mount, "div")?;
		self.resize(&root, model)?;
		self.tree.set_datum(&root, Some(Rc::clone(&model.datum) as Datum));

		let nodes = NodeSet::single(Some(self.mount.clone()), root.clone());
		if let Some(program) = &model.root {
			debug!("Applying root program.");
			program.run(&self.tree, nodes.clone(), Index::LOCAL)?;
		}
		model.selection.run(&self.tree, nodes, Index::LOCAL)?;
		Ok(Handle(root))
	}

	/// Rebinds `next`'s datum to the root and applies its [`selection`](`RenderModel::selection`) again.
	///
	/// `previous` is only consulted to skip resizing.
	///
	/// # Errors
	///
	/// Any [`Error`] raised while applying the program.
	#[instrument(skip(self, previous, next))]
	pub fn update<D: 'static>(&self, handle: Handle<T::Node>, previous: &RenderModel<D, T>, next: &RenderModel<D, T>) -> Result<Handle<T::Node>, Error> {
		let root = handle.node();
		if (previous.width, previous.height) != (next.width, next.height) {
			self.resize(root, next)?;
		}
		self.tree.set_datum(root, Some(Rc::clone(&next.datum) as Datum));
		next.selection.run(&self.tree, NodeSet::single(Some(self.mount.clone()), root.clone()), Index::LOCAL)?;
		Ok(handle)
	}

	fn resize<D>(&self, root: &T::Node, model: &RenderModel<D, T>) -> Result<(), Error> {
		self.tree.set_style(root, "width", &format!("{}px", model.width))?;
		self.tree.set_style(root, "height", &format!("{}px", model.height))
	}
}
