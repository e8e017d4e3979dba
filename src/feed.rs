//! Paginated feed iteration.
//!
//! Collection endpoints return their items one page at a time, each page
//! carrying an opaque continuation token for the next. This module turns a
//! page-fetch operation into a lazy, forward-only sequence of items, used by
//! every `*_iter` method and drained by their eager counterparts.
//!
//! # Termination
//!
//! A feed ends when a page sets its terminal flag or carries no
//! continuation token. The flag exists because some endpoints emit empty
//! tokens mid-sequence; token absence alone is not a reliable signal.
//!
//! # Error propagation
//!
//! A failing page fetch ends the stream with its error at the position
//! where the page's items would have appeared. Items already yielded from
//! earlier pages stand; no partial page is ever yielded. Credential refresh
//! happens inside the page fetch (see [`Session::request`]), never here, so
//! the continuation token is unaffected by authentication concerns.
//!
//! # Example
//!
//! ```rust
//! use futures_util::{pin_mut, StreamExt};
//! use playmusic::feed;
//!
//! let stream = feed::items(|token| fetch_page(token), None);
//! pin_mut!(stream);
//! while let Some(item) = stream.next().await {
//!     println!("{:?}", item?);
//! }
//! ```
//!
//! [`Session::request`]: crate::session::Session::request

use std::future::Future;

use futures_util::{stream, Stream, TryStreamExt};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Opaque continuation token issued by the service.
///
/// Round-tripped byte for byte; never inspected, compared across feeds, or
/// assumed to have structure. An empty token is a valid token.
#[derive(Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct PageToken(pub String);

impl PageToken {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for PageToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for PageToken {
    fn from(token: &str) -> Self {
        Self(token.to_owned())
    }
}

/// One network round trip's worth of items plus pagination metadata.
///
/// Created per fetch and discarded once its items have been yielded.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Page<T> {
    /// Items of this page, in service order.
    pub items: Vec<T>,

    /// Continuation token for the page after this one.
    pub next: Option<PageToken>,

    /// Explicit terminal flag. When set, no further page is requested even
    /// if a token is present.
    pub last: bool,
}

impl<T> Page<T> {
    /// A terminal page carrying the given items.
    #[must_use]
    pub fn terminal(items: Vec<T>) -> Self {
        Self {
            items,
            next: None,
            last: true,
        }
    }

    /// A non-terminal page continuing at `next`.
    #[must_use]
    pub fn more(items: Vec<T>, next: impl Into<PageToken>) -> Self {
        Self {
            items,
            next: Some(next.into()),
            last: false,
        }
    }
}

/// Internal producer state: the fetch operation, the cursor position, and
/// the remainder of the most recently fetched page.
struct Producer<F, T> {
    fetch: F,
    cursor: Cursor,
    buffered: std::vec::IntoIter<T>,
    remaining: Option<usize>,
}

enum Cursor {
    /// First page, requested without a token.
    Start,
    /// Resume at this token.
    Next(PageToken),
    /// Exhausted; no further fetches.
    Done,
}

/// Returns a lazy stream over the pages of a feed.
///
/// `fetch` is invoked with `None` for the first page and with the previous
/// page's continuation token thereafter, until a page is terminal. Each
/// invocation of this function starts an independent sequence from the
/// first page; no state is shared between invocations.
pub fn pages<T, F, Fut>(fetch: F) -> impl Stream<Item = Result<Page<T>>>
where
    F: FnMut(Option<PageToken>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    stream::try_unfold((fetch, Cursor::Start), |(mut fetch, cursor)| async move {
        let token = match cursor {
            Cursor::Start => None,
            Cursor::Next(token) => Some(token),
            Cursor::Done => return Ok(None),
        };

        let page = fetch(token).await?;
        let cursor = match (page.last, &page.next) {
            (false, Some(next)) => Cursor::Next(next.clone()),
            _ => Cursor::Done,
        };

        Ok(Some((page, (fetch, cursor))))
    })
}

/// Returns a lazy stream over the items of a feed.
///
/// Pages are fetched on demand as the stream is polled: a consumer that
/// stops early never pays for the pages it does not reach, and dropping the
/// stream abandons any in-flight page request.
///
/// With `max_items` set, the stream ends after that many items. A final
/// page whose items would overshoot the maximum is truncated, and no
/// further page is requested past the one that supplied the last item.
/// Empty non-terminal pages are skipped without yielding.
pub fn items<T, F, Fut>(fetch: F, max_items: Option<usize>) -> impl Stream<Item = Result<T>>
where
    F: FnMut(Option<PageToken>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let producer = Producer {
        fetch,
        cursor: Cursor::Start,
        buffered: Vec::new().into_iter(),
        remaining: max_items,
    };

    stream::try_unfold(producer, |mut producer| async move {
        if producer.remaining == Some(0) {
            return Ok(None);
        }

        loop {
            if let Some(item) = producer.buffered.next() {
                if let Some(remaining) = producer.remaining.as_mut() {
                    *remaining -= 1;
                }
                return Ok(Some((item, producer)));
            }

            let token = match std::mem::replace(&mut producer.cursor, Cursor::Done) {
                Cursor::Start => None,
                Cursor::Next(token) => Some(token),
                Cursor::Done => return Ok(None),
            };

            let page = (producer.fetch)(token).await?;
            trace!("fetched page of {} items", page.items.len());

            producer.cursor = match (page.last, page.next) {
                (false, Some(next)) => Cursor::Next(next),
                _ => Cursor::Done,
            };
            producer.buffered = page.items.into_iter();
        }
    })
}

/// Eagerly drains a feed into a realized collection.
///
/// Equivalent to collecting [`items`]; the result preserves service order
/// across page boundaries.
pub async fn collect<T, F, Fut>(fetch: F, max_items: Option<usize>) -> Result<Vec<T>>
where
    F: FnMut(Option<PageToken>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    items(fetch, max_items).try_collect().await
}
