//! Cursor-driven paging over remote listings.

use crate::config::MAX_PAGE_SIZE;
use crate::error::{CoreError, CoreResult};
use async_trait::async_trait;
use verstore_remote::{Cursor, ListPage};

/// Produces successive pages of a listing.
///
/// A source owns the filter and remote handle of one listing; [`Pages`]
/// threads the cursor through it.
#[async_trait]
pub(crate) trait PageSource<T>: Send + Sync {
    async fn fetch_page(&self, cursor: Option<&Cursor>, page_size: u32) -> CoreResult<ListPage<T>>;
}

/// Resolves a requested page size against the configured default.
pub(crate) fn resolve_page_size(requested: Option<u32>, default: u32) -> CoreResult<u32> {
    match requested {
        Some(0) => Err(CoreError::invalid_argument("page size must be at least 1")),
        Some(size) => Ok(size.min(MAX_PAGE_SIZE)),
        None => Ok(default.clamp(1, MAX_PAGE_SIZE)),
    }
}

/// A lazy, forward-only sequence of listing pages.
///
/// No remote call is made until the first [`advance_to_next_page`]; each
/// advance issues exactly one list call and replaces the buffered page.
/// Once the store reports no further cursor the sequence is finished and
/// advancing again fails with [`CoreError::InvalidState`]. To list from the
/// start again, request a new `Pages` from the store.
///
/// [`advance_to_next_page`]: Pages::advance_to_next_page
pub struct Pages<T> {
    source: Box<dyn PageSource<T>>,
    page_size: u32,
    cursor: Option<Cursor>,
    current: Vec<T>,
    finished: bool,
}

impl<T: Send> Pages<T> {
    pub(crate) fn new(
        source: impl PageSource<T> + 'static,
        page_size: u32,
        cursor: Option<Cursor>,
    ) -> Self {
        Self {
            source: Box::new(source),
            page_size,
            cursor,
            current: Vec::new(),
            finished: false,
        }
    }

    /// Starts the sequence at `cursor` instead of the beginning.
    pub(crate) fn with_cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }

    /// Returns the buffered page, empty before the first advance.
    pub fn current_page(&self) -> &[T] {
        &self.current
    }

    /// Takes ownership of the buffered page, leaving it empty.
    pub fn take_current_page(&mut self) -> Vec<T> {
        std::mem::take(&mut self.current)
    }

    /// Returns true once the store reported the last page.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Returns the page size requested from the store.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Returns the cursor the next advance will send.
    ///
    /// Hand it to a new listing call to resume from this point later.
    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    /// Fetches the next page.
    ///
    /// # Errors
    ///
    /// Fails with [`CoreError::InvalidState`] when the sequence is finished,
    /// or with the remote failure of the list call. A failed call leaves the
    /// buffered page and cursor unchanged, so the advance can be retried.
    pub async fn advance_to_next_page(&mut self) -> CoreResult<()> {
        if self.finished {
            return Err(CoreError::invalid_state(
                "cannot advance: the last page has already been read",
            ));
        }

        let page = self
            .source
            .fetch_page(self.cursor.as_ref(), self.page_size)
            .await?;

        self.current = page.items;
        self.finished = page.next_cursor.is_none();
        self.cursor = page.next_cursor;
        Ok(())
    }

    /// Advances through every remaining page and returns all items.
    pub async fn collect_remaining(mut self) -> CoreResult<Vec<T>> {
        let mut items = self.take_current_page();
        while !self.finished {
            self.advance_to_next_page().await?;
            items.append(&mut self.current);
        }
        Ok(items)
    }
}

impl<T> std::fmt::Debug for Pages<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pages")
            .field("page_size", &self.page_size)
            .field("cursor", &self.cursor)
            .field("buffered", &self.current.len())
            .field("finished", &self.finished)
            .finish()
    }
}
