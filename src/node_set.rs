use crate::{
	error::Error,
	tree::{Datum, Tree},
};
use core::fmt::{self, Debug, Formatter};

/// The index evaluators see.
///
/// [`Index::LOCAL`] defers to each element's position within its group, which is what a fresh [data join](`crate::selection::bind`) hands out.
/// [`static_`](`crate::selection::static_`) pins the index of the logical parent with [`Index::at`],
/// since the static child's own position is always `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Index(Option<usize>);

impl Index {
	pub const LOCAL: Self = Self(None);

	#[must_use]
	pub const fn at(index: usize) -> Self {
		Self(Some(index))
	}

	#[must_use]
	pub const fn get(self) -> Option<usize> {
		self.0
	}

	/// The index an element at `position` sees.
	#[must_use]
	pub fn resolve(self, position: usize) -> usize {
		self.0.unwrap_or(position)
	}
}

pub enum Slot<N> {
	Node(N),
	/// A datum without element, as produced by the enter partition of a join.
	Enter(Datum),
	/// Keeps positions stable where there is nothing (e.g. a `select` without match).
	Empty,
}

impl<N: Clone> Clone for Slot<N> {
	fn clone(&self) -> Self {
		match self {
			Self::Node(node) => Self::Node(node.clone()),
			Self::Enter(datum) => Self::Enter(datum.clone()),
			Self::Empty => Self::Empty,
		}
	}
}

impl<N: Debug> Debug for Slot<N> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Node(node) => f.debug_tuple("Node").field(node).finish(),
			Self::Enter(_) => f.write_str("Enter(..)"),
			Self::Empty => f.write_str("Empty"),
		}
	}
}

impl<N> Slot<N> {
	pub fn datum<T: Tree<Node = N>>(&self, tree: &T) -> Option<Datum> {
		match self {
			Self::Node(node) => tree.datum(node),
			Self::Enter(datum) => Some(datum.clone()),
			Self::Empty => None,
		}
	}
}

#[derive(Debug, Clone)]
pub struct Group<N> {
	pub parent: Option<N>,
	pub slots: Vec<Slot<N>>,
}

/// Which part of a data join a [`NodeSet`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
	Root,
	Enter,
	Update,
	Exit,
}

#[derive(Debug, Clone)]
struct Joined<N> {
	enter: NodeSet<N>,
	exit: NodeSet<N>,
}

/// Zero or more live elements, grouped by parent, as handed from combinator to combinator.
#[derive(Debug, Clone)]
pub struct NodeSet<N> {
	groups: Vec<Group<N>>,
	partition: Partition,
	joined: Option<Box<Joined<N>>>,
	transition: bool,
}

impl<N> NodeSet<N> {
	#[must_use]
	pub fn new(groups: Vec<Group<N>>, partition: Partition) -> Self {
		Self {
			groups,
			partition,
			joined: None,
			transition: false,
		}
	}

	/// A set holding only `node`, at position `0`.
	#[must_use]
	pub fn single(parent: Option<N>, node: N) -> Self {
		Self::new(
			vec![Group {
				parent,
				slots: vec![Slot::Node(node)],
			}],
			Partition::Root,
		)
	}

	/// A new set with this one's role and transition state, but without join results.
	#[must_use]
	pub fn derive(&self, groups: Vec<Group<N>>) -> Self {
		Self {
			groups,
			partition: self.partition,
			joined: None,
			transition: self.transition,
		}
	}

	#[must_use]
	pub fn groups(&self) -> &[Group<N>] {
		&self.groups
	}

	#[must_use]
	pub fn partition(&self) -> Partition {
		self.partition
	}

	#[must_use]
	pub fn is_transition(&self) -> bool {
		self.transition
	}

	#[must_use]
	pub fn into_transition(mut self) -> Self {
		self.transition = true;
		self
	}

	/// Existing elements with their group-relative position.
	pub fn nodes(&self) -> impl Iterator<Item = (usize, &N)> {
		self.groups.iter().flat_map(|group| {
			group.slots.iter().enumerate().filter_map(|(position, slot)| match slot {
				Slot::Node(node) => Some((position, node)),
				Slot::Enter(_) | Slot::Empty => None,
			})
		})
	}

	/// Number of non-[`Slot::Empty`] slots, placeholders included.
	#[must_use]
	pub fn len(&self) -> usize {
		self.groups
			.iter()
			.flat_map(|group| &group.slots)
			.filter(|slot| !matches!(slot, Slot::Empty))
			.count()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub(crate) fn with_join(mut self, enter: Self, exit: Self) -> Self {
		self.joined = Some(Box::new(Joined { enter, exit }));
		self
	}
}

impl<N: Clone> NodeSet<N> {
	/// The enter partition of the join that produced this set, or this set itself if it is one.
	///
	/// # Errors
	///
	/// [`Error::NoJoin`] iff neither is the case.
	pub fn enter(&self) -> Result<Self, Error> {
		match (self.partition, &self.joined) {
			(Partition::Enter, _) => Ok(self.clone()),
			(_, Some(joined)) => Ok(joined.enter.clone()),
			(_, None) => Err(Error::NoJoin("enter")),
		}
	}

	/// The exit partition of the join that produced this set, or this set itself if it is one.
	///
	/// # Errors
	///
	/// [`Error::NoJoin`] iff neither is the case.
	pub fn exit(&self) -> Result<Self, Error> {
		match (self.partition, &self.joined) {
			(Partition::Exit, _) => Ok(self.clone()),
			(_, Some(joined)) => Ok(joined.exit.clone()),
			(_, None) => Err(Error::NoJoin("exit")),
		}
	}
}
