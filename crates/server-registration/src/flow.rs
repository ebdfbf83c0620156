//! Registration flow.
//!
//! Walks the account service pages in a fixed order, feeding each extracted
//! value into the next request:
//!
//! ```text
//! GET  <server>/           -> auth link        (retried until reachable)
//! GET  <auth link>         -> sign-in form
//! POST <form action>       -> registration data
//!                          -> callback URL
//! GET  <callback URL>      -> confirmation     (retried until reachable)
//! ```
//!
//! Only the two network waits are retried. A page that does not have the
//! expected shape ends the flow.

use crate::config::FlowConfig;
use crate::error::{RegistrationError, RegistrationResult};
use crate::pages::{LoginPage, RegistrationData, WelcomePage};
use crate::types::{Credentials, Registration, RegistrationTarget, Server};
use page_client::{ConnectRetrier, Method, Page, PageFetcher};
use std::cell::OnceCell;
use std::fmt;
use tracing::{debug, info, instrument};
use url::Url;

/// One ordered step of the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStage {
    FetchWelcome,
    FetchAuthPage,
    SubmitCredentials,
    ReadRegistrationData,
    BuildCallback,
    Confirm,
}

impl fmt::Display for FlowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlowStage::FetchWelcome => "fetch welcome page",
            FlowStage::FetchAuthPage => "fetch authorization page",
            FlowStage::SubmitCredentials => "submit credentials",
            FlowStage::ReadRegistrationData => "read registration data",
            FlowStage::BuildCallback => "build callback URL",
            FlowStage::Confirm => "confirm registration",
        };
        f.write_str(name)
    }
}

/// Values produced by the stages, each written exactly once.
#[derive(Debug, Default)]
pub struct FlowState {
    auth_link: OnceCell<String>,
    authorize_url: OnceCell<String>,
    login_fields: OnceCell<Vec<(String, String)>>,
    target: OnceCell<RegistrationTarget>,
    callback_url: OnceCell<String>,
}

impl FlowState {
    fn set<T>(cell: &OnceCell<T>, field: &'static str, value: T) -> RegistrationResult<()> {
        cell.set(value)
            .map_err(|_| RegistrationError::StateAlreadySet(field))
    }

    fn require<'a, T>(
        cell: &'a OnceCell<T>,
        field: &'static str,
        stage: FlowStage,
    ) -> RegistrationResult<&'a T> {
        cell.get()
            .ok_or(RegistrationError::MissingState { field, stage })
    }
}

/// Drives the registration handshake over a `PageFetcher`.
pub struct RegistrationFlow<F> {
    fetcher: F,
    config: FlowConfig,
}

impl<F: PageFetcher> RegistrationFlow<F> {
    /// Create a new flow.
    pub fn new(fetcher: F, config: FlowConfig) -> Self {
        Self { fetcher, config }
    }

    /// Register `server` with the account identified by `credentials`.
    #[instrument(
        skip(self, credentials),
        fields(server = %server.url, username = credentials.username())
    )]
    pub fn run(&self, server: &Server, credentials: &Credentials) -> RegistrationResult<Registration> {
        let state = FlowState::default();

        self.fetch_welcome(&state, server)?;
        self.fetch_auth_page(&state)?;
        let data_page = self.submit_credentials(&state, credentials)?;
        self.read_registration_data(&state, server, &data_page)?;
        self.build_callback(&state)?;
        self.confirm(&state)?;

        let target = FlowState::require(&state.target, "target", FlowStage::Confirm)?;
        let callback_url =
            FlowState::require(&state.callback_url, "callback_url", FlowStage::Confirm)?;

        info!(server_uid = %target.server_uid, "Server registered");
        Ok(Registration {
            target: target.clone(),
            callback_url: callback_url.clone(),
        })
    }

    fn retrier(&self) -> ConnectRetrier<'_, F> {
        ConnectRetrier::new(&self.fetcher, self.config.retry)
    }

    fn fetch_welcome(&self, state: &FlowState, server: &Server) -> RegistrationResult<()> {
        let stage = FlowStage::FetchWelcome;
        let page = self
            .retrier()
            .retry_get(&server.url)
            .map_err(|e| RegistrationError::from_fetch(stage, e))?;
        let page = checked(stage, page)?;

        let welcome = WelcomePage::parse(&page.body)
            .ok_or_else(|| unexpected(stage, "no authorization link on welcome page"))?;
        let auth_link = resolve(&page.url, &welcome.auth_link).ok_or_else(|| {
            RegistrationError::InvalidUrl {
                stage,
                url: welcome.auth_link.clone(),
            }
        })?;

        debug!(auth_link = %auth_link, "Found authorization link");
        FlowState::set(&state.auth_link, "auth_link", auth_link)?;
        info!("Stage complete: {}", stage);
        Ok(())
    }

    fn fetch_auth_page(&self, state: &FlowState) -> RegistrationResult<()> {
        let stage = FlowStage::FetchAuthPage;
        let auth_link = FlowState::require(&state.auth_link, "auth_link", stage)?;

        let page = self
            .fetcher
            .fetch(Method::Get, auth_link, &[])
            .map_err(|e| RegistrationError::from_fetch(stage, e))?;
        let page = checked(stage, page)?;

        let login = LoginPage::parse(&page.body)
            .ok_or_else(|| unexpected(stage, "no sign-in form on authorization page"))?;
        let authorize_url =
            login
                .action_url(&page.url)
                .ok_or_else(|| RegistrationError::InvalidUrl {
                    stage,
                    url: login.action.clone().unwrap_or_else(|| page.url.clone()),
                })?;

        debug!(
            authorize_url = %authorize_url,
            hidden_fields = login.hidden_fields.len(),
            "Found sign-in form"
        );
        FlowState::set(&state.authorize_url, "authorize_url", authorize_url)?;
        FlowState::set(&state.login_fields, "login_fields", login.hidden_fields)?;
        info!("Stage complete: {}", stage);
        Ok(())
    }

    fn submit_credentials(
        &self,
        state: &FlowState,
        credentials: &Credentials,
    ) -> RegistrationResult<Page> {
        let stage = FlowStage::SubmitCredentials;
        let authorize_url = FlowState::require(&state.authorize_url, "authorize_url", stage)?;
        let hidden_fields = FlowState::require(&state.login_fields, "login_fields", stage)?;

        let mut form = credentials.form_fields();
        form.extend(
            hidden_fields
                .iter()
                .filter(|(name, _)| name != "username" && name != "password")
                .cloned(),
        );

        let page = self
            .fetcher
            .fetch(Method::Post, authorize_url, &form)
            .map_err(|e| RegistrationError::from_fetch(stage, e))?;
        let page = checked(stage, page)?;

        info!("Stage complete: {}", stage);
        Ok(page)
    }

    fn read_registration_data(
        &self,
        state: &FlowState,
        server: &Server,
        page: &Page,
    ) -> RegistrationResult<()> {
        let stage = FlowStage::ReadRegistrationData;
        let data = RegistrationData::parse(&page.body)
            .ok_or_else(|| unexpected(stage, "no customer id in registration data"))?;
        let entry = data
            .server(&server.name)
            .ok_or_else(|| RegistrationError::ServerNotFound {
                name: server.name.clone(),
            })?;

        let target = RegistrationTarget {
            server_url: server.url.clone(),
            customer_id: data.customer_id.clone(),
            server_uid: entry.uid.clone(),
        };

        debug!(
            customer_id = %target.customer_id,
            server_uid = %target.server_uid,
            "Found registration data"
        );
        FlowState::set(&state.target, "target", target)?;
        info!("Stage complete: {}", stage);
        Ok(())
    }

    fn build_callback(&self, state: &FlowState) -> RegistrationResult<()> {
        let stage = FlowStage::BuildCallback;
        let target = FlowState::require(&state.target, "target", stage)?;

        let callback_url = target
            .callback_url(&self.config.registration_host)
            .map_err(|_| RegistrationError::InvalidUrl {
                stage,
                url: self.config.registration_host.clone(),
            })?;

        debug!(callback_url = %callback_url, "Built callback URL");
        FlowState::set(&state.callback_url, "callback_url", callback_url)?;
        info!("Stage complete: {}", stage);
        Ok(())
    }

    fn confirm(&self, state: &FlowState) -> RegistrationResult<()> {
        let stage = FlowStage::Confirm;
        let callback_url = FlowState::require(&state.callback_url, "callback_url", stage)?;

        let page = self
            .retrier()
            .retry_get(callback_url)
            .map_err(|e| RegistrationError::from_fetch(stage, e))?;
        checked(stage, page)?;

        info!("Stage complete: {}", stage);
        Ok(())
    }
}

/// Reject non-2xx responses: an error page must not be scraped.
fn checked(stage: FlowStage, page: Page) -> RegistrationResult<Page> {
    if page.is_success() {
        Ok(page)
    } else {
        Err(RegistrationError::UnexpectedStatus {
            stage,
            status: page.status,
        })
    }
}

fn unexpected(stage: FlowStage, detail: &str) -> RegistrationError {
    RegistrationError::UnexpectedResponse {
        stage,
        detail: detail.to_string(),
    }
}

/// Resolve `href` against the URL of the page it was found on.
fn resolve(page_url: &str, href: &str) -> Option<String> {
    let base = Url::parse(page_url).ok()?;
    base.join(href).ok().map(String::from)
}
