//! Lazy traversal of paginated operations.
//!
//! A paginated operation returns one page per call plus a continuation token. The caller fetches
//! the first page, then hands it to a [`PageSequence`] together with a [`PageFetcher`] that knows
//! how to read the token off a page and fetch the following page. On top of the pages an
//! [`ItemSequence`] flattens the per-page collections into one stream of items.
//!
//! Guarantees:
//! - The first page is always yielded, even when it carries no continuation token.
//! - A page is fetched only when the consumer asks for it: the page cursor fetches page `N + 1`
//!   on the call that returns it, and the item cursor asks for page `N + 1` only after every item
//!   of page `N` has been returned.
//! - An absent or empty continuation token ends the sequence.
//! - Each call to [`PageSequence::pages`] starts a fresh cursor from the stored first page and
//!   re-issues the same network calls. Cursors are single-threaded and forward-only.
//! - A fetch failure is returned unchanged (after whatever retries the fetcher performs) and ends
//!   the cursor.
//!
//! A service that always returns a continuation token produces an unbounded sequence; nothing
//! here guards against that.
//!
//! ```rust
//! use sdk_core::pagination::{PageSequence, TokenFetcher};
//!
//! #[derive(Clone, Default)]
//! struct ListRequest { token: Option<String> }
//! #[derive(Clone)]
//! struct ListResponse { names: Vec<String>, next: Option<String> }
//!
//! fn list(req: &ListRequest) -> Result<ListResponse, std::io::Error> {
//!     Ok(match req.token.as_deref() {
//!         None => ListResponse { names: vec!["a".into(), "b".into()], next: Some("t1".into()) },
//!         Some(_) => ListResponse { names: vec!["c".into()], next: None },
//!     })
//! }
//!
//! let first_request = ListRequest::default();
//! let first_page = list(&first_request).unwrap();
//! let fetcher = TokenFetcher::new(
//!     first_request,
//!     list,
//!     |page: &ListResponse| page.next.as_deref(),
//!     |_first: &ListRequest, token: &str| ListRequest { token: Some(token.to_string()) },
//! );
//! let pages = PageSequence::new(first_page, fetcher);
//! let items = pages.items(|page: ListResponse| page.names);
//! let names: Result<Vec<String>, _> = items.iter().collect();
//! assert_eq!(names.unwrap(), vec!["a", "b", "c"]);
//! ```

use crate::error::PaginationError;
use crate::telemetry::{PageEvent, SdkEvent, TelemetrySink};
use std::fmt;
use std::iter::Peekable;
use std::marker::PhantomData;
use std::sync::Arc;

/// Reads continuation state off a page and fetches the page that follows it.
pub trait PageFetcher<P> {
    /// Failure of one fetch, after any retries the fetcher performs.
    type Error;

    /// True if `page` carries a continuation token, i.e. another page exists.
    fn has_next_page(&self, page: &P) -> bool;

    /// Fetch the page following `page`; `Ok(None)` if there is none.
    fn fetch_next_page(&self, page: &P) -> Result<Option<P>, Self::Error>;
}

impl<P, T: PageFetcher<P> + ?Sized> PageFetcher<P> for &T {
    type Error = T::Error;

    fn has_next_page(&self, page: &P) -> bool {
        (**self).has_next_page(page)
    }

    fn fetch_next_page(&self, page: &P) -> Result<Option<P>, Self::Error> {
        (**self).fetch_next_page(page)
    }
}

impl<P, T: PageFetcher<P> + ?Sized> PageFetcher<P> for Box<T> {
    type Error = T::Error;

    fn has_next_page(&self, page: &P) -> bool {
        (**self).has_next_page(page)
    }

    fn fetch_next_page(&self, page: &P) -> Result<Option<P>, Self::Error> {
        (**self).fetch_next_page(page)
    }
}

/// [`PageFetcher`] built from two closures.
pub struct FnFetcher<P, E, H, F> {
    has_next: H,
    fetch: F,
    _marker: PhantomData<fn(&P) -> E>,
}

impl<P, E, H, F> FnFetcher<P, E, H, F>
where
    H: Fn(&P) -> bool,
    F: Fn(&P) -> Result<Option<P>, E>,
{
    pub fn new(has_next: H, fetch: F) -> Self {
        Self { has_next, fetch, _marker: PhantomData }
    }
}

impl<P, E, H, F> PageFetcher<P> for FnFetcher<P, E, H, F>
where
    H: Fn(&P) -> bool,
    F: Fn(&P) -> Result<Option<P>, E>,
{
    type Error = E;

    fn has_next_page(&self, page: &P) -> bool {
        (self.has_next)(page)
    }

    fn fetch_next_page(&self, page: &P) -> Result<Option<P>, E> {
        (self.fetch)(page)
    }
}

impl<P, E, H, F> fmt::Debug for FnFetcher<P, E, H, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnFetcher").finish_non_exhaustive()
    }
}

/// The generated-client rule for continuation tokens: to fetch the page after `page`, take the
/// first request, set its input token to `page`'s output token, leave every other field
/// unchanged, and invoke the operation. An absent or empty output token means no more pages.
///
/// Wrap `operation` in a [`RetryExecutor`](crate::RetryExecutor) call to retry page fetches.
pub struct TokenFetcher<Req, P, E, Op, Tok, Set> {
    first_request: Req,
    operation: Op,
    output_token: Tok,
    with_input_token: Set,
    _marker: PhantomData<fn(&Req) -> Result<P, E>>,
}

impl<Req, P, E, Op, Tok, Set> TokenFetcher<Req, P, E, Op, Tok, Set>
where
    Op: Fn(&Req) -> Result<P, E>,
    Tok: Fn(&P) -> Option<&str>,
    Set: Fn(&Req, &str) -> Req,
{
    pub fn new(first_request: Req, operation: Op, output_token: Tok, with_input_token: Set) -> Self {
        Self { first_request, operation, output_token, with_input_token, _marker: PhantomData }
    }

    pub fn first_request(&self) -> &Req {
        &self.first_request
    }

    fn token<'p>(&self, page: &'p P) -> Option<&'p str> {
        (self.output_token)(page).filter(|token| !token.is_empty())
    }
}

impl<Req, P, E, Op, Tok, Set> PageFetcher<P> for TokenFetcher<Req, P, E, Op, Tok, Set>
where
    Op: Fn(&Req) -> Result<P, E>,
    Tok: Fn(&P) -> Option<&str>,
    Set: Fn(&Req, &str) -> Req,
{
    type Error = E;

    fn has_next_page(&self, page: &P) -> bool {
        self.token(page).is_some()
    }

    fn fetch_next_page(&self, page: &P) -> Result<Option<P>, E> {
        match self.token(page) {
            Some(token) => {
                let request = (self.with_input_token)(&self.first_request, token);
                (self.operation)(&request).map(Some)
            }
            None => Ok(None),
        }
    }
}

impl<Req: fmt::Debug, P, E, Op, Tok, Set> fmt::Debug for TokenFetcher<Req, P, E, Op, Tok, Set> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenFetcher")
            .field("first_request", &self.first_request)
            .finish_non_exhaustive()
    }
}

/// Lazy, forward-only sequence of response pages starting from an already-fetched first page.
pub struct PageSequence<P, F> {
    first_page: P,
    fetcher: F,
    sink: Option<Arc<dyn TelemetrySink>>,
}

impl<P, F> PageSequence<P, F>
where
    F: PageFetcher<P>,
{
    pub fn new(first_page: P, fetcher: F) -> Self {
        Self { first_page, fetcher, sink: None }
    }

    /// Attach a telemetry sink that receives page events from every cursor.
    pub fn with_sink<S>(mut self, sink: S) -> Self
    where
        S: TelemetrySink + 'static,
    {
        self.sink = Some(Arc::new(sink));
        self
    }

    /// The page the sequence was constructed with; never triggers a fetch.
    pub fn first_page(&self) -> &P {
        &self.first_page
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// A fresh cursor positioned before the first page.
    pub fn pages(&self) -> Pages<'_, P, F> {
        Pages { seq: self, state: CursorState::Start, returned: 0 }
    }

    /// Flatten the pages into items using `extract`, applied once per page.
    pub fn items<X, I>(&self, extract: X) -> ItemSequence<'_, P, F, X>
    where
        X: Fn(P) -> I,
        I: IntoIterator,
    {
        ItemSequence { pages: self, extract }
    }

    fn record(&self, event: PageEvent) {
        if let Some(sink) = &self.sink {
            sink.record(&SdkEvent::Page(event));
        }
    }
}

impl<P: fmt::Debug, F: fmt::Debug> fmt::Debug for PageSequence<P, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageSequence")
            .field("first_page", &self.first_page)
            .field("fetcher", &self.fetcher)
            .finish_non_exhaustive()
    }
}

impl<'a, P, F> IntoIterator for &'a PageSequence<P, F>
where
    P: Clone,
    F: PageFetcher<P>,
{
    type Item = Result<P, F::Error>;
    type IntoIter = Pages<'a, P, F>;

    fn into_iter(self) -> Self::IntoIter {
        self.pages()
    }
}

enum CursorState<P> {
    /// Nothing returned yet.
    Start,
    /// Last returned page is the stored first page.
    AfterFirst,
    /// Last returned page was fetched.
    After(P),
    Done,
}

/// Cursor over the pages of a [`PageSequence`].
pub struct Pages<'a, P, F> {
    seq: &'a PageSequence<P, F>,
    state: CursorState<P>,
    returned: usize,
}

impl<'a, P, F> Pages<'a, P, F>
where
    P: Clone,
    F: PageFetcher<P>,
{
    /// True if another page can be requested. Never fetches.
    pub fn has_next(&self) -> bool {
        match &self.state {
            CursorState::Start => true,
            CursorState::AfterFirst => self.seq.fetcher.has_next_page(&self.seq.first_page),
            CursorState::After(page) => self.seq.fetcher.has_next_page(page),
            CursorState::Done => false,
        }
    }

    /// Pages returned by this cursor so far.
    pub fn pages_returned(&self) -> usize {
        self.returned
    }

    /// Return the next page, fetching it if it is not the first.
    ///
    /// Asking past the last page is an iteration-state error (`NoMorePages`), distinct from a
    /// fetch failure.
    pub fn try_next(&mut self) -> Result<P, PaginationError<F::Error>> {
        let seq = self.seq;
        if let CursorState::Start = self.state {
            self.state = CursorState::AfterFirst;
            self.returned = 1;
            return Ok(seq.first_page.clone());
        }

        let current = match &self.state {
            CursorState::AfterFirst => &seq.first_page,
            CursorState::After(page) => page,
            CursorState::Start | CursorState::Done => return Err(PaginationError::NoMorePages),
        };
        if !seq.fetcher.has_next_page(current) {
            self.finish();
            return Err(PaginationError::NoMorePages);
        }

        match seq.fetcher.fetch_next_page(current) {
            Ok(Some(page)) => {
                self.returned += 1;
                tracing::debug!(page_number = self.returned, "fetched next page");
                seq.record(PageEvent::Fetched { page_number: self.returned });
                self.state = CursorState::After(page.clone());
                Ok(page)
            }
            Ok(None) => {
                self.finish();
                Err(PaginationError::NoMorePages)
            }
            Err(err) => {
                tracing::warn!(after_page = self.returned, "page fetch failed");
                self.state = CursorState::Done;
                Err(PaginationError::Fetch(err))
            }
        }
    }

    fn finish(&mut self) {
        if let CursorState::Done = self.state {
            return;
        }
        self.state = CursorState::Done;
        tracing::trace!(pages = self.returned, "pagination finished");
        self.seq.record(PageEvent::Finished { pages: self.returned });
    }
}

impl<'a, P, F> Iterator for Pages<'a, P, F>
where
    P: Clone,
    F: PageFetcher<P>,
{
    type Item = Result<P, F::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.try_next() {
            Ok(page) => Some(Ok(page)),
            Err(PaginationError::Fetch(err)) => Some(Err(err)),
            Err(_) => None,
        }
    }
}

impl<P, F> std::iter::FusedIterator for Pages<'_, P, F>
where
    P: Clone,
    F: PageFetcher<P>,
{
}

impl<P, F> fmt::Debug for Pages<'_, P, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            CursorState::Start => "start",
            CursorState::AfterFirst => "after_first",
            CursorState::After(_) => "after",
            CursorState::Done => "done",
        };
        f.debug_struct("Pages").field("state", &state).field("returned", &self.returned).finish()
    }
}

/// Flattened view of the items of every page of a [`PageSequence`].
///
/// `extract` maps one page to its collection: a list yields elements in order, a map yields
/// key/value pairs in the order the map iterates. Absent collections should map to an empty one.
pub struct ItemSequence<'a, P, F, X> {
    pages: &'a PageSequence<P, F>,
    extract: X,
}

impl<'a, P, F, X, I> ItemSequence<'a, P, F, X>
where
    P: Clone,
    F: PageFetcher<P>,
    X: Fn(P) -> I,
    I: IntoIterator,
{
    /// A fresh item cursor; restarts from the first page.
    pub fn iter(&self) -> Items<'_, P, F, X, I> {
        Items { pages: self.pages.pages(), extract: &self.extract, current: None }
    }

    pub fn page_sequence(&self) -> &'a PageSequence<P, F> {
        self.pages
    }
}

impl<'s, 'a, P, F, X, I> IntoIterator for &'s ItemSequence<'a, P, F, X>
where
    P: Clone,
    F: PageFetcher<P>,
    X: Fn(P) -> I,
    I: IntoIterator,
{
    type Item = Result<I::Item, F::Error>;
    type IntoIter = Items<'s, P, F, X, I>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<P, F, X> fmt::Debug for ItemSequence<'_, P, F, X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemSequence").finish_non_exhaustive()
    }
}

/// Cursor over the items of an [`ItemSequence`]: a page cursor plus a cursor into the current
/// page's items.
pub struct Items<'a, P, F, X, I>
where
    I: IntoIterator,
{
    pages: Pages<'a, P, F>,
    extract: &'a X,
    current: Option<Peekable<I::IntoIter>>,
}

impl<'a, P, F, X, I> Items<'a, P, F, X, I>
where
    P: Clone,
    F: PageFetcher<P>,
    X: Fn(P) -> I,
    I: IntoIterator,
{
    /// True if the current page has an item left or another page can be requested.
    ///
    /// Never fetches. When every remaining page is empty this can be true while
    /// [`try_next`](Self::try_next) ends with `NoMoreItems`.
    pub fn has_next(&mut self) -> bool {
        let buffered = self.current.as_mut().map_or(false, |items| items.peek().is_some());
        buffered || self.pages.has_next()
    }

    /// Return the next item, moving to the next page only once the current one is used up.
    pub fn try_next(&mut self) -> Result<I::Item, PaginationError<F::Error>> {
        loop {
            if let Some(item) = self.current.as_mut().and_then(|items| items.next()) {
                return Ok(item);
            }
            match self.pages.try_next() {
                Ok(page) => self.current = Some((self.extract)(page).into_iter().peekable()),
                Err(PaginationError::Fetch(err)) => {
                    self.current = None;
                    return Err(PaginationError::Fetch(err));
                }
                Err(_) => {
                    self.current = None;
                    return Err(PaginationError::NoMoreItems);
                }
            }
        }
    }
}

impl<'a, P, F, X, I> Iterator for Items<'a, P, F, X, I>
where
    P: Clone,
    F: PageFetcher<P>,
    X: Fn(P) -> I,
    I: IntoIterator,
{
    type Item = Result<I::Item, F::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.try_next() {
            Ok(item) => Some(Ok(item)),
            Err(PaginationError::Fetch(err)) => Some(Err(err)),
            Err(_) => None,
        }
    }
}

impl<P, F, X, I> fmt::Debug for Items<'_, P, F, X, I>
where
    I: IntoIterator,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Items")
            .field("pages", &self.pages)
            .field("has_current_page", &self.current.is_some())
            .finish()
    }
}

/// A paginated operation's result: the first page, the page sequence, and the item view.
///
/// Generated clients expose a field-named alias next to `all_items`, e.g.
/// `fn table_names(&self) -> ItemSequence<..> { self.all_items() }`.
pub struct Paginator<P, F, X> {
    pages: PageSequence<P, F>,
    extract: X,
}

impl<P, F, X, I> Paginator<P, F, X>
where
    P: Clone,
    F: PageFetcher<P>,
    X: Fn(P) -> I,
    I: IntoIterator,
{
    pub fn new(pages: PageSequence<P, F>, extract: X) -> Self {
        Self { pages, extract }
    }

    pub fn first_page(&self) -> &P {
        self.pages.first_page()
    }

    /// A fresh page cursor.
    pub fn pages(&self) -> Pages<'_, P, F> {
        self.pages.pages()
    }

    /// Every item across every page.
    pub fn all_items(&self) -> ItemSequence<'_, P, F, &X> {
        self.pages.items(&self.extract)
    }

    pub fn page_sequence(&self) -> &PageSequence<P, F> {
        &self.pages
    }
}

impl<P: fmt::Debug, F: fmt::Debug, X> fmt::Debug for Paginator<P, F, X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Paginator").field("pages", &self.pages).finish_non_exhaustive()
    }
}
