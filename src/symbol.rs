use core::cell::Cell;
use tracing::trace;

/// Mints unique tag strings for [`static_`](`crate::selection::static_`) elements.
///
/// Tags are only unique per generator, so all static combinators that may end up in the same tree should share one.
/// The counter is explicit rather than global so that tests can start from a known value.
#[derive(Debug)]
pub struct SymbolGenerator {
	next: Cell<u64>,
}

impl Default for SymbolGenerator {
	fn default() -> Self {
		Self::new()
	}
}

impl SymbolGenerator {
	#[must_use]
	pub fn new() -> Self {
		Self::starting_at(1)
	}

	#[must_use]
	pub fn starting_at(first: u64) -> Self {
		Self { next: Cell::new(first) }
	}

	/// Returns `prefix` followed by the next counter value.
	///
	/// # Panics
	///
	/// Iff the counter overflows.
	pub fn gensym(&self, prefix: &str) -> String {
		let n = self.next.get();
		self.next.set(n.checked_add(1).expect("SymbolGenerator exhausted"));
		let symbol = format!("{}{}", prefix, n);
		trace!(symbol = symbol.as_str(), "Minted symbol.");
		symbol
	}
}
