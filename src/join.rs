//! The data join: matching a sequence of data against existing elements.
//!
//! Every group of the joined [`NodeSet`] is matched against the data computed from its parent's datum.
//! Partitions keep data positions, so the element (or placeholder) for the `i`th datum sits at position `i`
//! of the enter or update group, and an unmatched element keeps its old position in the exit group.

use crate::{
	error::Error,
	node_set::{Group, NodeSet, Partition, Slot},
	tree::{bound, downcast, Datum, Tree},
};
use hashbrown::{hash_map::Entry, HashMap};
use std::rc::Rc;
use tracing::{debug, trace_span};

pub(crate) type Values<D, E> = Rc<dyn Fn(&D) -> Vec<E>>;
pub(crate) type Key<E> = Rc<dyn Fn(&E, usize) -> String>;

pub(crate) struct Join<D, E> {
	values: Values<D, E>,
	key: Option<Key<E>>,
}

impl<D, E> Clone for Join<D, E> {
	fn clone(&self) -> Self {
		Self {
			values: Rc::clone(&self.values),
			key: self.key.clone(),
		}
	}
}

impl<D: 'static, E: 'static> Join<D, E> {
	pub(crate) fn by_index(values: impl 'static + Fn(&D) -> Vec<E>) -> Self {
		Self { values: Rc::new(values), key: None }
	}

	pub(crate) fn by_key(values: impl 'static + Fn(&D) -> Vec<E>, key: impl 'static + Fn(&E, usize) -> String) -> Self {
		Self {
			values: Rc::new(values),
			key: Some(Rc::new(key)),
		}
	}

	/// Binds the new data and returns the update partition, which carries the enter and exit partitions.
	pub(crate) fn apply<T: Tree>(&self, tree: &T, nodes: &NodeSet<T::Node>) -> Result<NodeSet<T::Node>, Error> {
		let span = trace_span!("Joining data", keyed = self.key.is_some(), groups = nodes.groups().len());
		let _enter = span.enter();

		let mut enter = Vec::with_capacity(nodes.groups().len());
		let mut update = Vec::with_capacity(nodes.groups().len());
		let mut exit = Vec::with_capacity(nodes.groups().len());
		for group in nodes.groups() {
			let parent = group.parent.as_ref().ok_or(Error::Detached)?;
			let data: Vec<Datum> = (self.values)(&*bound::<D, _>(tree, parent)?)
				.into_iter()
				.map(|datum| Rc::new(datum) as Datum)
				.collect();

			let (enter_slots, update_slots, exit_slots) = match &self.key {
				None => join_by_index(tree, &group.slots, data),
				Some(key) => join_by_key(tree, &group.slots, data, &**key)?,
			};
			enter.push(Group {
				parent: group.parent.clone(),
				slots: enter_slots,
			});
			update.push(Group {
				parent: group.parent.clone(),
				slots: update_slots,
			});
			exit.push(Group {
				parent: group.parent.clone(),
				slots: exit_slots,
			});
		}

		let enter = NodeSet::new(enter, Partition::Enter);
		let update = NodeSet::new(update, Partition::Update);
		let exit = NodeSet::new(exit, Partition::Exit);
		debug!(enter = enter.len(), update = update.len(), exit = exit.len(), "Joined data.");
		Ok(update.with_join(enter, exit))
	}
}

type Partitions<N> = (Vec<Slot<N>>, Vec<Slot<N>>, Vec<Slot<N>>);

fn join_by_index<T: Tree>(tree: &T, existing: &[Slot<T::Node>], data: Vec<Datum>) -> Partitions<T::Node> {
	let mut enter = Vec::with_capacity(data.len());
	let mut update = Vec::with_capacity(data.len());
	let mut exit: Vec<_> = (0..existing.len()).map(|_| Slot::Empty).collect();

	for (i, datum) in data.into_iter().enumerate() {
		match existing.get(i) {
			Some(Slot::Node(node)) => {
				tree.set_datum(node, Some(datum));
				enter.push(Slot::Empty);
				update.push(Slot::Node(node.clone()));
			}
			Some(Slot::Enter(_) | Slot::Empty) | None => {
				enter.push(Slot::Enter(datum));
				update.push(Slot::Empty);
			}
		}
	}

	for (i, slot) in existing.iter().enumerate().skip(update.len()) {
		if let Slot::Node(node) = slot {
			exit[i] = Slot::Node(node.clone());
		}
	}

	(enter, update, exit)
}

fn join_by_key<T: Tree, E: 'static>(tree: &T, existing: &[Slot<T::Node>], data: Vec<Datum>, key: &dyn Fn(&E, usize) -> String) -> Result<Partitions<T::Node>, Error> {
	let mut by_key = HashMap::with_capacity(existing.len());
	let mut exit: Vec<_> = (0..existing.len()).map(|_| Slot::Empty).collect();
	for (i, slot) in existing.iter().enumerate() {
		if let Slot::Node(node) = slot {
			// Unbound elements (e.g. markup that predates the first render) can't match any key.
			let datum = match tree.datum(node) {
				Some(datum) => datum,
				None => {
					exit[i] = Slot::Node(node.clone());
					continue;
				}
			};
			match by_key.entry(key(&*downcast::<E>(datum)?, i)) {
				Entry::Vacant(vacant) => {
					vacant.insert(i);
				}
				Entry::Occupied(_) => exit[i] = Slot::Node(node.clone()),
			}
		}
	}

	let mut enter = Vec::with_capacity(data.len());
	let mut update = Vec::with_capacity(data.len());
	for (i, datum) in data.into_iter().enumerate() {
		let k = key(&*downcast::<E>(datum.clone())?, i);
		match by_key.remove(&k).and_then(|position| match &existing[position] {
			Slot::Node(node) => Some(node),
			Slot::Enter(_) | Slot::Empty => None,
		}) {
			Some(node) => {
				tree.set_datum(node, Some(datum));
				enter.push(Slot::Empty);
				update.push(Slot::Node(node.clone()));
			}
			None => {
				enter.push(Slot::Enter(datum));
				update.push(Slot::Empty);
			}
		}
	}

	for (_, position) in by_key {
		exit[position] = existing[position].clone();
	}

	Ok((enter, update, exit))
}
