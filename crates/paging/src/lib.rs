//! Paginated watched queries.
//!
//! A [`PaginatedWatcher`] turns a chain of cursor-linked page queries into one
//! live, ordered result. Each fetched page is its own watch on a
//! [`WatchSource`](folio_watch::WatchSource); every watch reports into a shared
//! handler that keys page models by cursor, so re-deliveries replace a page in
//! place and out-of-order arrivals keep first-seen order.
//!
//! ```ignore
//! let watcher = PaginatedWatcher::new(source, WatcherOptions::default(), PagerCallbacks::new(
//! 	|page: &Page<String>| Some(ListQuery::after(page.end_cursor.clone())),
//! 	|raw: ListData| Some(Transformed::new(raw.items, raw.page_info)),
//! 	|response: PageResponse<Vec<Item>>| response.all_responses.concat(),
//! 	|result| render(result),
//! ));
//! watcher.start(ListQuery::first())?;
//! // later, when the list is scrolled to the end:
//! watcher.fetch_more(FetchStrategy::CacheThenNetwork);
//! ```

#![warn(missing_docs)]

mod accumulator;
mod error;
mod options;
mod page;
mod watcher;

pub use accumulator::Accumulator;
pub use error::{OptionsError, PagingError};
pub use options::{ContextKind, WatcherOptions};
pub use page::{Page, PageResponse, Transformed};
pub use watcher::{PagerCallbacks, PaginatedWatcher};
