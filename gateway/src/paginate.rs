//! Page-by-page linear search over a remote listing endpoint.
//!
//! The listing is expected to answer `{"data": [...]}` and to accept
//! `start`/`length` query parameters. Pages are fetched in order until an
//! element satisfies the caller's predicate or an empty page signals that the
//! listing is exhausted.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::num::NonZeroUsize;
use thiserror::Error;
use tracing::debug;
use transport::{HttpRequest, HttpTransport, TransportError};

/// Page size used against the gateway registry.
pub const DEFAULT_PAGE_SIZE: NonZeroUsize = match NonZeroUsize::new(100) {
    Some(size) => size,
    None => unreachable!(),
};

#[derive(Debug, Error)]
pub enum PaginationError {
    /// An empty page was reached without any element matching.
    #[error("No matching element after scanning {pages_fetched} page(s)")]
    Exhausted { pages_fetched: usize },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    data: Option<Vec<T>>,
}

/// Walks a paginated listing with a fixed set of request headers.
pub struct Paginator<'a> {
    transport: &'a dyn HttpTransport,
    headers: Vec<(String, String)>,
}

impl<'a> Paginator<'a> {
    pub fn new(transport: &'a dyn HttpTransport) -> Self {
        Self {
            transport,
            headers: Vec::new(),
        }
    }

    /// Sends `name: value` with every page request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Returns the first element, in listing order, for which `matches` is true.
    ///
    /// Non-success responses and connection failures are returned as
    /// [`PaginationError::Transport`] immediately, without retrying.
    pub async fn find<T, F>(
        &self,
        base_query: &str,
        page_size: NonZeroUsize,
        mut matches: F,
    ) -> Result<T, PaginationError>
    where
        T: DeserializeOwned,
        F: FnMut(&T) -> bool,
    {
        let separator = if base_query.contains('?') { '&' } else { '?' };
        let mut start = 0usize;
        let mut pages_fetched = 0usize;

        loop {
            let url = format!(
                "{}{}start={}&length={}",
                base_query, separator, start, page_size
            );
            let mut request = HttpRequest::get(url);
            for (name, value) in &self.headers {
                request = request.header(name.clone(), value.clone());
            }

            let response = self.transport.send(request).await?.error_for_status()?;
            pages_fetched += 1;

            let page: Page<T> = response.json()?;
            let elements = page.data.unwrap_or_default();
            if elements.is_empty() {
                debug!("Listing exhausted after {} page(s)", pages_fetched);
                return Err(PaginationError::Exhausted { pages_fetched });
            }

            debug!(
                "Scanning page {} ({} element(s)) from offset {}",
                pages_fetched,
                elements.len(),
                start
            );
            if let Some(found) = elements.into_iter().find(|element| matches(element)) {
                return Ok(found);
            }

            start += page_size.get();
        }
    }
}
