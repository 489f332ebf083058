use std::hash::Hash;

use indexmap::IndexMap;

/// Page models keyed by end cursor, in first-arrival order.
///
/// Re-inserting a cursor replaces its model and keeps its position, so the
/// order only depends on which cursor was seen first.
#[derive(Debug, Clone)]
pub struct Accumulator<C, M> {
	models: IndexMap<Option<C>, M>,
}

impl<C, M> Default for Accumulator<C, M> {
	fn default() -> Self {
		Self { models: IndexMap::new() }
	}
}

impl<C, M> Accumulator<C, M>
where
	C: Eq + Hash,
{
	/// Creates an empty accumulator.
	pub fn new() -> Self {
		Self::default()
	}

	/// Stores `model` under `cursor`. Returns true if the cursor is new.
	pub fn upsert(&mut self, cursor: Option<C>, model: M) -> bool {
		self.models.insert(cursor, model).is_none()
	}

	/// Returns the model stored under `cursor`.
	pub fn get(&self, cursor: &Option<C>) -> Option<&M> {
		self.models.get(cursor)
	}

	/// Cursors in first-arrival order.
	pub fn cursors(&self) -> impl Iterator<Item = &Option<C>> {
		self.models.keys()
	}

	/// Models in first-arrival order.
	pub fn responses(&self) -> Vec<M>
	where
		M: Clone,
	{
		self.models.values().cloned().collect()
	}

	/// Number of distinct cursors seen.
	pub fn len(&self) -> usize {
		self.models.len()
	}

	/// Returns true if no page has been stored.
	pub fn is_empty(&self) -> bool {
		self.models.is_empty()
	}

	/// Forgets every page.
	pub fn clear(&mut self) {
		self.models.clear();
	}
}
