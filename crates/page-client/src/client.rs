//! Blocking HTTP page fetcher.

use crate::error::FetchError;
use crate::types::{Method, Page};
use reqwest::blocking::Client;
use reqwest::Url;
use std::time::Duration;
use tracing::{debug, instrument};

const USER_AGENT: &str = concat!("server-registration/", env!("CARGO_PKG_VERSION"));

/// Issues one HTTP request per call and returns the body as text.
///
/// Any HTTP response, whatever its status, is `Ok`. Only failures to reach
/// the server at all are errors.
#[cfg_attr(test, mockall::automock)]
pub trait PageFetcher {
    fn fetch(
        &self,
        method: Method,
        url: &str,
        form: &[(String, String)],
    ) -> Result<Page, FetchError>;
}

impl<T: PageFetcher + ?Sized> PageFetcher for &T {
    fn fetch(
        &self,
        method: Method,
        url: &str,
        form: &[(String, String)],
    ) -> Result<Page, FetchError> {
        (**self).fetch(method, url, form)
    }
}

/// `PageFetcher` backed by a blocking reqwest client.
///
/// Cookies are kept for the lifetime of the fetcher so a login session
/// carries over to later requests.
#[derive(Clone)]
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    /// Create a new fetcher with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client })
    }
}

impl PageFetcher for HttpPageFetcher {
    #[instrument(skip(self, form), fields(form_fields = form.len()))]
    fn fetch(
        &self,
        method: Method,
        url: &str,
        form: &[(String, String)],
    ) -> Result<Page, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let request = match method {
            Method::Get => self.client.get(parsed),
            Method::Post => self.client.post(parsed).form(form),
        };

        let connect_error = |e: reqwest::Error| FetchError::Connect {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = request.send().map_err(connect_error)?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response.text().map_err(connect_error)?;

        debug!(status, url = %final_url, bytes = body.len(), "{} completed", method);

        Ok(Page {
            url: final_url,
            status,
            body,
        })
    }
}
