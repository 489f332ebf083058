use folio_watch::ResultSource;

/// Continuation state of one fetched page.
///
/// A page with `has_next == false` ends pagination whatever its cursor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Page<C> {
	/// Whether another page follows this one.
	pub has_next: bool,
	/// Cursor marking the end of this page. `None` keys the first page.
	pub end_cursor: Option<C>,
}

impl<C> Page<C> {
	/// A page followed by another one.
	pub fn next(end_cursor: Option<C>) -> Self {
		Self {
			has_next: true,
			end_cursor,
		}
	}

	/// The final page.
	pub fn last(end_cursor: Option<C>) -> Self {
		Self {
			has_next: false,
			end_cursor,
		}
	}

	/// Returns true if pagination may continue past this page.
	pub const fn can_advance(&self) -> bool {
		self.has_next
	}
}

/// Output of the caller's transform for one raw result.
///
/// A result without a model is not actionable yet and is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed<M, C> {
	/// The caller's model for this page.
	pub model: Option<M>,
	/// Continuation state of this page.
	pub page: Option<Page<C>>,
}

impl<M, C> Transformed<M, C> {
	/// A model with its page.
	pub fn new(model: M, page: Page<C>) -> Self {
		Self {
			model: Some(model),
			page: Some(page),
		}
	}
}

/// Merged view handed to the caller's combine function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResponse<M> {
	/// Page models in first-seen cursor order.
	pub all_responses: Vec<M>,
	/// Model of the result that triggered this emission.
	pub most_recent: M,
	/// Origin of the triggering result.
	pub source: ResultSource,
}
