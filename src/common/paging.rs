// Continuation-token pagination as a lazy stream
#![forbid(unsafe_code)]
#![deny(missing_docs)]
use futures::stream::{
    self,
    Stream,
    TryStreamExt,
};
use std::future::Future;

/// One page of a paginated listing.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    /// Items returned on this page.
    pub items: Vec<T>,

    /// Token for the next page, `None` when the listing is exhausted.
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    /// A page with no continuation.
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }
}

// Where the pager is in the listing.
enum Cursor {
    Start,
    Next(String),
    Done,
}

/// Turn a page fetching function into a lazy stream of pages.
///
/// `fetch` receives the continuation token of the previous page (`None` for
/// the first). Nothing is requested until the stream is polled, and every
/// call to `pages` starts again from the first page. Dropping the stream
/// early stops the listing.
pub fn pages<T, E, F, Fut>(fetch: F) -> impl Stream<Item = Result<Page<T>, E>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    stream::try_unfold((Cursor::Start, fetch), |(cursor, mut fetch)| async move {
        let token = match cursor {
            Cursor::Start      => None,
            Cursor::Next(next) => Some(next),
            Cursor::Done       => return Ok(None),
        };

        let page: Page<T> = match fetch(token).await {
            Ok(page) => page,
            Err(err) => return Err(err),
        };

        // Some services hand back an empty token on the final page.
        let cursor = match page.next_token.clone() {
            Some(next) if !next.is_empty() => Cursor::Next(next),
            _                              => Cursor::Done,
        };

        Ok(Some((page, (cursor, fetch))))
    })
}

/// Flatten the pages produced by `pages` into a stream of items.
pub fn items<T, E, F, Fut>(fetch: F) -> impl Stream<Item = Result<T, E>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    pages(fetch)
        .map_ok(|page| stream::iter(page.items.into_iter().map(Ok::<T, E>)))
        .try_flatten()
}
