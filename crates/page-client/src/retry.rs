//! Bounded connect-retry loop.

use crate::client::PageFetcher;
use crate::error::FetchError;
use crate::types::{Method, Page, RetryBudget};
use std::thread;
use tracing::{debug, info, instrument, warn};

/// Retries GET requests against a server that may not be reachable yet.
///
/// The pause between attempts blocks the calling thread. Once started, the
/// loop runs until a response arrives or the budget is spent.
pub struct ConnectRetrier<'a, F: ?Sized> {
    fetcher: &'a F,
    budget: RetryBudget,
}

impl<'a, F: PageFetcher + ?Sized> ConnectRetrier<'a, F> {
    /// Create a retrier borrowing `fetcher`.
    pub fn new(fetcher: &'a F, budget: RetryBudget) -> Self {
        Self { fetcher, budget }
    }

    /// GET `url`, retrying connection failures until the budget runs out.
    ///
    /// Returns the first response received, whatever its status. Invalid URLs
    /// fail immediately. Exhaustion yields `FetchError::RetriesExhausted`.
    #[instrument(skip(self), fields(max_attempts = self.budget.max_attempts()))]
    pub fn retry_get(&self, url: &str) -> Result<Page, FetchError> {
        let max_attempts = self.budget.max_attempts();
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                debug!("Waiting {:?} before attempt {}", self.budget.delay(), attempt);
                thread::sleep(self.budget.delay());
            }

            match self.fetcher.fetch(Method::Get, url, &[]) {
                Ok(page) => {
                    if attempt > 1 {
                        info!("{} reachable after {} attempts", url, attempt);
                    }
                    return Ok(page);
                }
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    warn!("GET {} failed (attempt {}/{}): {}", url, attempt, max_attempts, e);
                    last_error = Some(Box::new(e));
                }
            }
        }

        Err(FetchError::RetriesExhausted {
            url: url.to_string(),
            attempts: max_attempts,
            last_error,
        })
    }
}
