//! Pure, composable descriptions of node set mutations.
//!
//! A [`Selection`] is a function of a continuation, a [`NodeSet`] and an [`Index`].
//! It performs its mutations on the node set and then calls the continuation **exactly once**
//! with the node set and index the rest of the program should continue with.
//!
//! Building a [`Selection`] has no effects at all.
//! Effects only happen once a program is [applied](`Selection::apply`), which is normally done by the [`Renderer`](`crate::Renderer`).
//!
//! Combinators that fork (like [`bind`]) run their sub-programs against the partitions internally
//! and then continue with the node set they were given, so the surrounding program's control flow is unaffected by them.

use crate::{
	error::Error,
	join::Join,
	node_set::{Group, Index, NodeSet, Slot},
	symbol::SymbolGenerator,
	tree::{bound, propagate, Tree},
	value::{Property, Value},
	web::WebTree,
};
use core::{
	fmt::{self, Debug, Formatter},
	marker::PhantomData,
};
use std::rc::Rc;
use tracing::{trace, trace_span};

/// What a [`Selection`] continues with.
pub type Continuation<'k, N> = Box<dyn 'k + FnOnce(NodeSet<N>, Index) -> Result<(), Error>>;

type Program<T> = dyn Fn(&T, NodeSet<<T as Tree>::Node>, Index, Continuation<'_, <T as Tree>::Node>) -> Result<(), Error>;

/// A program of mutations, with evaluators reading data of type `D`.
///
/// Cloning is cheap and yields the same program.
pub struct Selection<D, T: Tree = WebTree> {
	program: Rc<Program<T>>,
	datum: PhantomData<fn(&D)>,
}

impl<D, T: Tree> Clone for Selection<D, T> {
	fn clone(&self) -> Self {
		Self {
			program: Rc::clone(&self.program),
			datum: PhantomData,
		}
	}
}

impl<D, T: Tree> Debug for Selection<D, T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Selection").finish_non_exhaustive()
	}
}

impl<D: 'static, T: 'static + Tree> Selection<D, T> {
	/// Wraps a raw program.
	///
	/// `program` must call its continuation exactly once.
	pub fn new(program: impl 'static + Fn(&T, NodeSet<T::Node>, Index, Continuation<'_, T::Node>) -> Result<(), Error>) -> Self {
		Self {
			program: Rc::new(program),
			datum: PhantomData,
		}
	}

	/// Continues with the node set and index unchanged.
	#[must_use]
	pub fn identity() -> Self {
		Self::new(|_, nodes, index, k| k(nodes, index))
	}

	/// Runs this program against `nodes`, then continues with `k`.
	///
	/// # Errors
	///
	/// Any [`Error`] raised by `tree` or an evaluator, unchanged.
	pub fn apply(&self, tree: &T, nodes: NodeSet<T::Node>, index: Index, k: Continuation<'_, T::Node>) -> Result<(), Error> {
		(self.program)(tree, nodes, index, k)
	}

	/// Runs this program against `nodes`, discarding where it ends up.
	///
	/// # Errors
	///
	/// Any [`Error`] raised by `tree` or an evaluator, unchanged.
	pub fn run(&self, tree: &T, nodes: NodeSet<T::Node>, index: Index) -> Result<(), Error> {
		self.apply(tree, nodes, index, Box::new(|_: NodeSet<T::Node>, _: Index| Ok(())))
	}

	/// Applies `self`, then `next` against what `self` continues with.
	#[must_use]
	pub fn chain(self, next: Self) -> Self {
		Self::new(move |tree, nodes, index, k| {
			let next = &next;
			self.apply(tree, nodes, index, Box::new(move |nodes: NodeSet<T::Node>, index: Index| next.apply(tree, nodes, index, k)))
		})
	}

	/// Applies `self`, then `next`, both against the same node set and index, then continues with those.
	#[must_use]
	pub fn sequence(self, next: Self) -> Self {
		Self::new(move |tree, nodes, index, k| {
			self.run(tree, nodes.clone(), index)?;
			next.run(tree, nodes.clone(), index)?;
			k(nodes, index)
		})
	}
}

/// See [`Selection::sequence`].
#[must_use]
pub fn sequence<D: 'static, T: 'static + Tree>(first: Selection<D, T>, second: Selection<D, T>) -> Selection<D, T> {
	first.sequence(second)
}

/// See [`Selection::chain`].
///
/// Associative: `chain(chain(a, b), c)` and `chain(a, chain(b, c))` are the same program.
#[must_use]
pub fn chain<D: 'static, T: 'static + Tree>(first: Selection<D, T>, second: Selection<D, T>) -> Selection<D, T> {
	first.chain(second)
}

/// Narrows each element to its first descendant matching `selector`, which inherits the element's datum.
///
/// Elements without match leave a gap, so positions are kept.
#[must_use]
pub fn select<D: 'static, T: 'static + Tree>(selector: &str) -> Selection<D, T> {
	let selector = selector.to_owned();
	Selection::<D, T>::new(move |tree, nodes, index, k| {
		let span = trace_span!("select", selector = selector.as_str());
		let _enter = span.enter();

		let mut groups = Vec::with_capacity(nodes.groups().len());
		for group in nodes.groups() {
			let mut slots = Vec::with_capacity(group.slots.len());
			for slot in &group.slots {
				slots.push(match slot {
					Slot::Node(node) => match tree.select(node, &selector)? {
						Some(selected) => {
							propagate(tree, node, &selected);
							Slot::Node(selected)
						}
						None => Slot::Empty,
					},
					Slot::Enter(_) | Slot::Empty => Slot::Empty,
				});
			}
			groups.push(Group {
				parent: group.parent.clone(),
				slots,
			});
		}
		k(nodes.derive(groups), index)
	})
}

/// Replaces each element with the group of its descendants matching `selector`.
///
/// Data is not propagated.
#[must_use]
pub fn select_all<D: 'static, T: 'static + Tree>(selector: &str) -> Selection<D, T> {
	let selector = selector.to_owned();
	Selection::<D, T>::new(move |tree, nodes, index, k| {
		let span = trace_span!("select_all", selector = selector.as_str());
		let _enter = span.enter();

		let mut groups = Vec::new();
		for (_, node) in nodes.nodes() {
			groups.push(Group {
				parent: Some(node.clone()),
				slots: tree.select_all(node, &selector)?.into_iter().map(Slot::Node).collect(),
			});
		}
		trace!(groups = groups.len(), "Selected.");
		k(nodes.derive(groups), index)
	})
}

/// Appends a new `name` child to each element, or to the group parent for placeholders of the enter partition.
///
/// Continues with the new elements, which inherit the datum of the element or placeholder they were made for.
#[must_use]
pub fn append<D: 'static, T: 'static + Tree>(name: &str) -> Selection<D, T> {
	let name = name.to_owned();
	Selection::<D, T>::new(move |tree, nodes, index, k| {
		let span = trace_span!("append", name = name.as_str());
		let _enter = span.enter();

		let mut groups = Vec::with_capacity(nodes.groups().len());
		for group in nodes.groups() {
			let mut slots = Vec::with_capacity(group.slots.len());
			for slot in &group.slots {
				slots.push(match slot {
					Slot::Node(node) => {
						let child = tree.append_child(node, &name)?;
						propagate(tree, node, &child);
						Slot::Node(child)
					}
					Slot::Enter(datum) => {
						let parent = group.parent.as_ref().ok_or(Error::Detached)?;
						let child = tree.append_child(parent, &name)?;
						tree.set_datum(&child, Some(datum.clone()));
						Slot::Node(child)
					}
					Slot::Empty => Slot::Empty,
				});
			}
			groups.push(Group {
				parent: group.parent.clone(),
				slots,
			});
		}
		let appended = nodes.derive(groups);
		trace!(count = appended.len(), "Appended.");
		k(appended, index)
	})
}

/// Joins the data `values` computes from each group parent's datum against the group (by position),
/// then runs `program` against the update partition.
///
/// Inside `program`, [`enter`] and [`exit`] reach the other two partitions.
/// The ambient index is not passed on: `program` starts with [`Index::LOCAL`].
/// Continues with the original node set and index.
#[must_use]
pub fn data<D: 'static, E: 'static, T: 'static + Tree>(values: impl 'static + Fn(&D) -> Vec<E>, program: Selection<E, T>) -> Selection<D, T> {
	joined(Join::by_index(values), program)
}

/// Like [`data`], but matches data and elements by the string `key` computes for each of them.
#[must_use]
pub fn data_keyed<D: 'static, E: 'static, T: 'static + Tree>(
	values: impl 'static + Fn(&D) -> Vec<E>,
	key: impl 'static + Fn(&E, usize) -> String,
	program: Selection<E, T>,
) -> Selection<D, T> {
	joined(Join::by_key(values, key), program)
}

fn joined<D: 'static, E: 'static, T: 'static + Tree>(join: Join<D, E>, program: Selection<E, T>) -> Selection<D, T> {
	Selection::<D, T>::new(move |tree, nodes, index, k| {
		let span = trace_span!("data");
		let _enter = span.enter();

		let update = join.apply(tree, &nodes)?;
		program.run(tree, update, Index::LOCAL)?;
		k(nodes, index)
	})
}

/// The data join: runs `on_enter` against the enter partition (data without element), `on_update` against
/// the update partition (data matched to an element), and `on_exit` against the exit partition (elements without datum), in that order.
///
/// Each sub-program starts with [`Index::LOCAL`], so evaluators see positions within the partition.
/// Continues with the original node set and index.
///
/// ```
/// use selection_dom::{memory::MemoryTree, selection::*, tree::Datum, Index, NodeSet, Tree as _};
/// use std::rc::Rc;
///
/// let tree = MemoryTree::new();
/// let list = tree.append_child(&tree.body(), "ul").unwrap();
/// tree.set_datum(&list, Some(Rc::new(vec![1, 2, 3]) as Datum));
///
/// let program = chain(
/// 	select_all("li"),
/// 	bind(|items: &Vec<i32>| items.clone(), append("li"), Selection::identity(), remove()),
/// );
/// program.run(&tree, NodeSet::single(None, list), Index::LOCAL).unwrap();
///
/// assert_eq!(tree.children(&list).len(), 3);
/// ```
#[must_use]
pub fn bind<D: 'static, E: 'static, T: 'static + Tree>(
	values: impl 'static + Fn(&D) -> Vec<E>,
	on_enter: Selection<E, T>,
	on_update: Selection<E, T>,
	on_exit: Selection<E, T>,
) -> Selection<D, T> {
	data(values, partitioned(on_enter, on_update, on_exit))
}

/// Like [`bind`], but matches data and elements by the string `key` computes for each of them.
///
/// Elements without bound datum and elements whose key was already seen go to the exit partition.
/// A datum whose key was already matched goes to the enter partition.
#[must_use]
pub fn bind_keyed<D: 'static, E: 'static, T: 'static + Tree>(
	values: impl 'static + Fn(&D) -> Vec<E>,
	key: impl 'static + Fn(&E, usize) -> String,
	on_enter: Selection<E, T>,
	on_update: Selection<E, T>,
	on_exit: Selection<E, T>,
) -> Selection<D, T> {
	data_keyed(values, key, partitioned(on_enter, on_update, on_exit))
}

fn partitioned<E: 'static, T: 'static + Tree>(on_enter: Selection<E, T>, on_update: Selection<E, T>, on_exit: Selection<E, T>) -> Selection<E, T> {
	enter().chain(on_enter).sequence(on_update).sequence(exit().chain(on_exit))
}

/// Continues with the enter partition.
///
/// Only meaningful inside a [`data`] or [`bind`] program.
#[must_use]
pub fn enter<D: 'static, T: 'static + Tree>() -> Selection<D, T> {
	Selection::<D, T>::new(|_, nodes, index, k| k(nodes.enter()?, index))
}

/// Continues with the exit partition.
///
/// Only meaningful inside a [`data`] or [`bind`] program.
#[must_use]
pub fn exit<D: 'static, T: 'static + Tree>() -> Selection<D, T> {
	Selection::<D, T>::new(|_, nodes, index, k| k(nodes.exit()?, index))
}

/// Continues with the update partition, which is the node set a [`data`] program starts with.
#[must_use]
pub fn update<D: 'static, T: 'static + Tree>() -> Selection<D, T> {
	Selection::identity()
}

/// Detaches each element from its parent, then continues with the detached elements.
#[must_use]
pub fn remove<D: 'static, T: 'static + Tree>() -> Selection<D, T> {
	Selection::<D, T>::new(|tree, nodes, index, k| {
		let span = trace_span!("remove");
		let _enter = span.enter();

		let mut count = 0_usize;
		for (_, node) in nodes.nodes() {
			tree.remove(node)?;
			count += 1;
		}
		trace!(count, "Removed.");
		k(nodes, index)
	})
}

/// Runs `program` once per element against a persistent `name` child, which is created on first use only.
///
/// The child is found again on later passes by a class minted from `symbols` when this combinator is built.
/// It inherits the element's datum each time, and `program` sees the element's index rather than the child's own.
/// Continues with the original node set and index.
#[must_use]
pub fn static_<D: 'static, T: 'static + Tree>(symbols: &SymbolGenerator, name: &str, program: Selection<D, T>) -> Selection<D, T> {
	let local_name = name.rsplit(':').next().unwrap_or(name);
	let class = symbols.gensym(&format!("static-{}-", local_name));
	let name = name.to_owned();
	Selection::<D, T>::new(move |tree, nodes, index, k| {
		let span = trace_span!("static", name = name.as_str(), class = class.as_str());
		let _enter = span.enter();

		for (position, node) in nodes.nodes() {
			let child = match tree.child_with_class(node, &class)? {
				Some(child) => child,
				None => {
					trace!(position, "Creating static element.");
					tree.append_child(node, &name)?
				}
			};
			propagate(tree, node, &child);
			program.run(tree, NodeSet::single(Some(node.clone()), child.clone()), Index::at(index.resolve(position)))?;
			// Marked last, as `program` may overwrite the class attribute.
			tree.set_class(&child, &class, true)?;
		}
		k(nodes, index)
	})
}

/// Evaluates `value` for each element and hands the result to `apply`.
pub(crate) fn each_value<D: 'static, V: Clone + Debug, T: Tree>(
	tree: &T,
	nodes: &NodeSet<T::Node>,
	index: Index,
	value: &Value<D, V>,
	mut apply: impl FnMut(&T::Node, &V) -> Result<(), Error>,
) -> Result<(), Error> {
	for (position, node) in nodes.nodes() {
		let datum = if value.is_constant() { None } else { Some(bound::<D, _>(tree, node)?) };
		let value = value.evaluate(datum.as_deref(), index.resolve(position))?;
		if cfg!(feature = "dangerous-logging") {
			trace!(position, ?value, "Evaluated.");
		}
		apply(node, &value)?;
	}
	Ok(())
}

fn mutation<D: 'static, V: 'static + Clone + Debug, T: 'static + Tree>(
	operation: &'static str,
	name: Option<&str>,
	value: Value<D, V>,
	apply: impl 'static + Fn(&T, &T::Node, &str, &V) -> Result<(), Error>,
) -> Selection<D, T> {
	let name = name.unwrap_or_default().to_owned();
	Selection::<D, T>::new(move |tree, nodes, index, k| {
		let span = trace_span!("mutate", operation, name = name.as_str(), count = nodes.len());
		let _enter = span.enter();

		each_value(tree, &nodes, index, &value, |node, value| apply(tree, node, &name, value))?;
		k(nodes, index)
	})
}

/// Adds (`true`) or removes (`false`) the class `name` on each element.
#[must_use]
pub fn classed<D: 'static, T: 'static + Tree>(name: &str, value: impl Into<Value<D, bool>>) -> Selection<D, T> {
	mutation("classed", Some(name), value.into(), |tree: &T, node, name, &on| tree.set_class(node, name, on))
}

#[must_use]
pub fn attr<D: 'static, T: 'static + Tree>(name: &str, value: impl Into<Value<D, String>>) -> Selection<D, T> {
	mutation("attr", Some(name), value.into(), |tree: &T, node, name, value: &String| tree.set_attribute(node, name, value))
}

#[must_use]
pub fn style<D: 'static, T: 'static + Tree>(name: &str, value: impl Into<Value<D, String>>) -> Selection<D, T> {
	mutation("style", Some(name), value.into(), |tree: &T, node, name, value: &String| tree.set_style(node, name, value))
}

/// Sets the native property `name` (as opposed to an attribute) on each element.
#[must_use]
pub fn property<D: 'static, T: 'static + Tree>(name: &str, value: impl Into<Value<D, Property>>) -> Selection<D, T> {
	mutation("property", Some(name), value.into(), |tree: &T, node, name, value| tree.set_property(node, name, value))
}

#[must_use]
pub fn html<D: 'static, T: 'static + Tree>(value: impl Into<Value<D, String>>) -> Selection<D, T> {
	mutation("html", None, value.into(), |tree: &T, node, _, value: &String| tree.set_html(node, value))
}

#[must_use]
pub fn text<D: 'static, T: 'static + Tree>(value: impl Into<Value<D, String>>) -> Selection<D, T> {
	mutation("text", None, value.into(), |tree: &T, node, _, value: &String| tree.set_text(node, value))
}
