//! Lazy pagination over list endpoints.
//!
//! QuickBooks list operations return results in pages, positioned by an
//! opaque token (a numeric start position for query endpoints, a cursor for
//! others; the list function decides). [`ListPager`] turns a page-fetching
//! function into a lazy sequence of items: each page is fetched only when
//! the previous one is exhausted, in response to
//! [`advance`](ListPager::advance). There is no read-ahead, so a caller that
//! stops early issues no further requests.
//!
//! # Example
//!
//! ```rust,ignore
//! use quickbooks_api::pagination::{ListPager, Page, PageRequest};
//!
//! let mut pager = ListPager::new(
//!     move |request: PageRequest, cancel| {
//!         let client = client.clone();
//!         Box::pin(async move {
//!             let page = fetch_invoices(&client, request, &cancel).await?;
//!             Ok(page)
//!         })
//!     },
//!     cancel.clone(),
//! )
//! .with_page_size(50);
//!
//! while pager.advance().await {
//!     let invoice = pager.current().unwrap();
//!     println!("{}", invoice.id);
//! }
//! if let Some(error) = pager.error() {
//!     eprintln!("listing failed: {error}");
//! }
//! ```

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::clients::Error;

/// An opaque pagination position supplied by the list function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageToken(String);

impl PageToken {
    /// Wraps a provider-supplied position value.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw position value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One page of results from a list function.
#[derive(Clone, Debug)]
pub struct Page<T> {
    /// The items of this page, in provider order.
    pub items: Vec<T>,
    /// The position of the next page, or `None` when this is the last page.
    pub next: Option<PageToken>,
}

impl<T> Page<T> {
    /// Creates a page.
    #[must_use]
    pub const fn new(items: Vec<T>, next: Option<PageToken>) -> Self {
        Self { items, next }
    }
}

/// The parameters handed to the list function for each page fetch.
#[derive(Clone, Debug)]
pub struct PageRequest {
    /// The position to fetch from; `None` for the first page.
    pub token: Option<PageToken>,
    /// The requested page size; the list function applies its default when
    /// unset.
    pub limit: Option<u32>,
}

/// Boxed future returned by a list function.
pub type PageFuture<T> = Pin<Box<dyn Future<Output = Result<Page<T>, Error>> + Send>>;

/// Where the pager will fetch next.
#[derive(Debug)]
enum Cursor {
    /// The first page has not been fetched yet.
    Start,
    /// The next fetch uses this position.
    Next(PageToken),
    /// No further pages will be fetched.
    Done,
}

/// A lazy, pull-based pager over a paginated list endpoint.
///
/// The pager holds only the current page plus its cursor state. Items are
/// yielded in the order pages are returned by the provider, and within a
/// page in provider order.
///
/// # Termination
///
/// Once [`advance`](Self::advance) returns `false` it keeps returning
/// `false`: either the data is exhausted ([`error`](Self::error) is `None`)
/// or a page fetch failed ([`error`](Self::error) reports the same terminal
/// error on every subsequent call). A pager never resets.
///
/// # Ownership
///
/// A pager is single-owner: `advance` takes `&mut self`, so the borrow
/// checker rules out concurrent calls. It is not meant to be shared across
/// tasks; wrap items in your own channel if multiple consumers need them.
pub struct ListPager<T, F>
where
    F: FnMut(PageRequest, CancellationToken) -> PageFuture<T>,
{
    fetch: F,
    cancel: CancellationToken,
    limit: Option<u32>,
    buffer: VecDeque<T>,
    current: Option<T>,
    cursor: Cursor,
    error: Option<Error>,
}

impl<T, F> ListPager<T, F>
where
    F: FnMut(PageRequest, CancellationToken) -> PageFuture<T>,
{
    /// Creates a pager over the given list function.
    ///
    /// The cancellation token is checked before every page fetch and passed
    /// into the list function for in-flight aborts.
    #[must_use]
    pub fn new(fetch: F, cancel: CancellationToken) -> Self {
        Self {
            fetch,
            cancel,
            limit: None,
            buffer: VecDeque::new(),
            current: None,
            cursor: Cursor::Start,
            error: None,
        }
    }

    /// Sets the page size requested from the list function.
    ///
    /// When unset, the list function applies its own default.
    #[must_use]
    pub const fn with_page_size(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Advances to the next item, fetching the next page when needed.
    ///
    /// Returns `true` when [`current`](Self::current) holds the next item,
    /// `false` when the sequence is exhausted or a fetch failed (check
    /// [`error`](Self::error) to tell the two apart).
    pub async fn advance(&mut self) -> bool {
        if self.error.is_some() {
            self.current = None;
            return false;
        }

        // Cancellation preempts even buffered items, and no further
        // requests go out
        if self.cancel.is_cancelled() {
            self.current = None;
            self.error = Some(Error::Cancelled);
            return false;
        }

        if let Some(item) = self.buffer.pop_front() {
            self.current = Some(item);
            return true;
        }

        self.current = None;

        let token = match std::mem::replace(&mut self.cursor, Cursor::Done) {
            Cursor::Done => return false,
            Cursor::Start => None,
            Cursor::Next(token) => Some(token),
        };

        let request = PageRequest {
            token,
            limit: self.limit,
        };
        let page = match (self.fetch)(request, self.cancel.clone()).await {
            Ok(page) => page,
            Err(error) => {
                self.error = Some(error);
                return false;
            }
        };

        if page.items.is_empty() {
            return false;
        }

        self.cursor = page.next.map_or(Cursor::Done, Cursor::Next);
        self.buffer = page.items.into();
        self.current = self.buffer.pop_front();

        true
    }

    /// Returns the item produced by the last `true`-returning
    /// [`advance`](Self::advance).
    #[must_use]
    pub const fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    /// Returns the terminal error, if iteration ended because of one.
    ///
    /// Stable: once set, the same error is reported on every call until the
    /// pager is dropped. `None` after a natural end of data.
    #[must_use]
    pub const fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }
}
