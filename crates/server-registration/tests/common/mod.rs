//! Common test utilities for integration tests.

use page_client::{HttpPageFetcher, RetryBudget};
use server_registration::{
    Credentials, FlowConfig, Registration, RegistrationFlow, RegistrationResult, Server,
};
use std::path::Path;
use std::time::Duration;

/// Read an HTML fixture, substituting its `%s` placeholder when given.
pub fn page(name: &str, placeholder: Option<&str>) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    let page = std::fs::read_to_string(&path).unwrap();
    match placeholder {
        Some(value) => page.replace("%s", value),
        None => page,
    }
}

/// Flow settings pointing the account service at `registration_host`.
pub fn test_flow_config(registration_host: &str, max_attempts: u32) -> FlowConfig {
    FlowConfig {
        registration_host: registration_host.to_string(),
        retry: RetryBudget::new(max_attempts, Duration::from_millis(50)),
    }
}

/// Run the blocking flow off the async runtime so mock servers keep serving.
pub async fn run_flow(
    config: FlowConfig,
    server_url: String,
    username: &str,
    password: &str,
    server_name: &str,
) -> RegistrationResult<Registration> {
    let server = Server::new(server_url, server_name);
    let credentials = Credentials::new(username, password);

    tokio::task::spawn_blocking(move || {
        let fetcher = HttpPageFetcher::new(Duration::from_secs(5)).unwrap();
        RegistrationFlow::new(fetcher, config).run(&server, &credentials)
    })
    .await
    .unwrap()
}
