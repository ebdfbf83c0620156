//! Blocking page fetcher and connect retrier.

mod client;
mod error;
mod retry;
mod types;

pub use client::{HttpPageFetcher, PageFetcher};
pub use error::FetchError;
pub use retry::ConnectRetrier;
pub use types::*;

#[cfg(test)]
mod tests {
    use super::client::MockPageFetcher;
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::{Duration, Instant};
    use wiremock::matchers::{body_string, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn refused(url: &str) -> FetchError {
        FetchError::Connect {
            url: url.to_string(),
            reason: "connection refused".into(),
        }
    }

    fn page(body: &str) -> Page {
        Page {
            url: "http://server.test/".into(),
            status: 200,
            body: body.into(),
        }
    }

    /// Run a fetch on a blocking thread so the mock server keeps serving.
    async fn fetch_blocking(
        method: Method,
        url: String,
        form: Vec<(String, String)>,
    ) -> Result<Page, FetchError> {
        tokio::task::spawn_blocking(move || {
            let fetcher = HttpPageFetcher::new(Duration::from_secs(5))?;
            fetcher.fetch(method, &url, &form)
        })
        .await
        .unwrap()
    }

    #[test]
    fn test_default_budget() {
        let budget = RetryBudget::default();
        assert_eq!(budget.max_attempts(), 60);
        assert_eq!(budget.delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_budget_never_zero() {
        let budget = RetryBudget::new(0, Duration::ZERO);
        assert_eq!(budget.max_attempts(), 1);
    }

    #[test]
    fn test_page_is_success() {
        assert!(page("ok").is_success());
        let mut missing = page("");
        missing.status = 404;
        assert!(!missing.is_success());
    }

    #[test]
    fn test_retry_returns_first_success() {
        let mut fetcher = MockPageFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_, _, _| Ok(page("welcome")));

        let retrier = ConnectRetrier::new(&fetcher, RetryBudget::new(5, Duration::ZERO));
        let result = retrier.retry_get("http://server.test/");

        assert_eq!(result.unwrap().body, "welcome");
    }

    #[test]
    fn test_retry_succeeds_on_last_attempt() {
        let attempts = AtomicU32::new(0);
        let mut fetcher = MockPageFetcher::new();
        fetcher
            .expect_fetch()
            .withf(|method, _, form| *method == Method::Get && form.is_empty())
            .times(4)
            .returning(move |_, url, _| {
                if attempts.fetch_add(1, Ordering::SeqCst) < 3 {
                    Err(refused(url))
                } else {
                    Ok(page("finally up"))
                }
            });

        let retrier = ConnectRetrier::new(&fetcher, RetryBudget::new(4, Duration::from_millis(1)));
        let result = retrier.retry_get("http://server.test/");

        assert_eq!(result.unwrap().body, "finally up");
    }

    #[test]
    fn test_retry_exhaustion_waits_between_attempts() {
        let mut fetcher = MockPageFetcher::new();
        fetcher
            .expect_fetch()
            .times(3)
            .returning(|_, url, _| Err(refused(url)));

        let delay = Duration::from_millis(50);
        let retrier = ConnectRetrier::new(&fetcher, RetryBudget::new(3, delay));

        let started = Instant::now();
        let result = retrier.retry_get("http://server.test/");
        let elapsed = started.elapsed();

        match result {
            Err(FetchError::RetriesExhausted {
                attempts,
                last_error,
                ..
            }) => {
                assert_eq!(attempts, 3);
                assert!(matches!(last_error.as_deref(), Some(FetchError::Connect { .. })));
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }
        // Two pauses, none after the final attempt.
        assert!(elapsed >= delay * 2);
        assert!(elapsed < delay * 3 + Duration::from_millis(500));
    }

    #[test]
    fn test_retry_does_not_retry_invalid_url() {
        let mut fetcher = MockPageFetcher::new();
        fetcher.expect_fetch().times(1).returning(|_, url, _| {
            Err(FetchError::InvalidUrl {
                url: url.to_string(),
                reason: "relative URL without a base".into(),
            })
        });

        let retrier = ConnectRetrier::new(&fetcher, RetryBudget::new(10, Duration::ZERO));
        let result = retrier.retry_get("/relative");

        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
    }

    #[test]
    fn test_retry_against_unreachable_address() {
        let fetcher = HttpPageFetcher::new(Duration::from_secs(2)).unwrap();
        let retrier = ConnectRetrier::new(&fetcher, RetryBudget::new(2, Duration::from_millis(100)));

        let started = Instant::now();
        let result = retrier.retry_get("http://127.0.0.1:1/");

        assert!(matches!(
            result,
            Err(FetchError::RetriesExhausted { attempts: 2, .. })
        ));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_fetch_get_returns_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>welcome</html>"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = fetch_blocking(Method::Get, mock_server.uri(), vec![]).await;

        let page = result.unwrap();
        assert_eq!(page.status, 200);
        assert_eq!(page.body, "<html>welcome</html>");
    }

    #[tokio::test]
    async fn test_fetch_post_encodes_form() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/authorize"))
            .and(body_string("username=USERNAME&password=P%40ss+word"))
            .respond_with(ResponseTemplate::new(200).set_body_string("registered"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let form = vec![
            ("username".to_string(), "USERNAME".to_string()),
            ("password".to_string(), "P@ss word".to_string()),
        ];
        let url = format!("{}/authorize", mock_server.uri());
        let result = fetch_blocking(Method::Post, url, form).await;

        assert_eq!(result.unwrap().body, "registered");
    }

    #[tokio::test]
    async fn test_fetch_error_status_is_still_a_page() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("starting up"))
            .mount(&mock_server)
            .await;

        let result = fetch_blocking(Method::Get, mock_server.uri(), vec![]).await;

        let page = result.unwrap();
        assert_eq!(page.status, 503);
        assert!(!page.is_success());
        assert_eq!(page.body, "starting up");
    }

    #[tokio::test]
    async fn test_retry_waits_for_late_server() {
        // Reserve a port, then release it so the first attempts are refused.
        let address = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let url = format!("http://{}/", address);

        let retry = tokio::task::spawn_blocking(move || {
            let fetcher = HttpPageFetcher::new(Duration::from_secs(2))?;
            let retrier =
                ConnectRetrier::new(&fetcher, RetryBudget::new(50, Duration::from_millis(100)));
            retrier.retry_get(&url)
        });

        tokio::time::sleep(Duration::from_millis(400)).await;
        let listener = std::net::TcpListener::bind(address).unwrap();
        let mock_server = MockServer::builder().listener(listener).start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("up"))
            .mount(&mock_server)
            .await;

        let result = retry.await.unwrap();
        assert_eq!(result.unwrap().body, "up");
    }
}
