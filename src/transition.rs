//! Animated transitions.
//!
//! The animation itself is entirely up to the [`Tree`].
//! These combinators only mark the node set as a transition and hand per-element timing down.

use crate::{
	error::Error,
	node_set::Index,
	selection::{each_value, Selection},
	tree::{Timing, Tree},
	value::Value,
};
use tracing::{debug, trace_span};

/// Starts a transition on each element and continues with the transition.
#[must_use]
pub fn transition<D: 'static, T: 'static + Tree>() -> Selection<D, T> {
	Selection::<D, T>::new(|tree, nodes, index, k| {
		let span = trace_span!("transition", count = nodes.len());
		let _enter = span.enter();

		for (_, node) in nodes.nodes() {
			tree.begin_transition(node)?;
		}
		k(nodes.into_transition(), index)
	})
}

/// Sets the delay (in milliseconds) before each element's transition starts.
///
/// # Errors
///
/// When applied, [`Error::NotATransition`] iff the node set isn't a [`transition`].
#[must_use]
pub fn delay<D: 'static, T: 'static + Tree>(value: impl Into<Value<D, u32>>) -> Selection<D, T> {
	timing("delay", value.into(), Timing::Delay)
}

/// Sets the duration (in milliseconds) of each element's transition.
///
/// # Errors
///
/// When applied, [`Error::NotATransition`] iff the node set isn't a [`transition`].
#[must_use]
pub fn duration<D: 'static, T: 'static + Tree>(value: impl Into<Value<D, u32>>) -> Selection<D, T> {
	timing("duration", value.into(), Timing::Duration)
}

fn timing<D: 'static, T: 'static + Tree>(operation: &'static str, value: Value<D, u32>, timing: fn(u32) -> Timing) -> Selection<D, T> {
	Selection::<D, T>::new(move |tree, nodes, index: Index, k| {
		let span = trace_span!("timing", operation, count = nodes.len());
		let _enter = span.enter();

		if !nodes.is_transition() {
			return Err(Error::NotATransition);
		}
		if nodes.is_empty() {
			debug!("Setting {} on an empty transition.", operation);
		}
		each_value(tree, &nodes, index, &value, |node, &ms| tree.set_timing(node, timing(ms)))?;
		k(nodes, index)
	})
}
