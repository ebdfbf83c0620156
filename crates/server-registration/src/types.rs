//! Registration data types.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

/// Path of the account service endpoint that confirms a registration.
pub const SERVER_REGISTRATION_PATH: &str = "/server-registration";

/// Characters escaped in callback query values. `:` and `/` stay literal so
/// the server URL reads as-is in the query.
const QUERY_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'=')
    .add(b'>');

/// Account credentials.
///
/// The password is kept in a `SecretString` so it never shows up in
/// logs or debug output.
#[derive(Debug)]
pub struct Credentials {
    username: String,
    password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::new(password.into()),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Form fields for the sign-in POST.
    pub fn form_fields(&self) -> Vec<(String, String)> {
        vec![
            ("username".to_string(), self.username.clone()),
            ("password".to_string(), self.password.expose_secret().clone()),
        ]
    }
}

/// The server being registered, as given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Server {
    /// Base URL the server is reachable at
    pub url: String,

    /// Name the server is listed under in the account
    pub name: String,
}

impl Server {
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
        }
    }
}

/// What gets registered: built once from the registration data, never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationTarget {
    pub server_url: String,
    pub customer_id: String,
    pub server_uid: String,
}

impl RegistrationTarget {
    /// Confirmation URL: `registration_host` (path kept) plus the
    /// registration path and query.
    pub fn callback_url(&self, registration_host: &str) -> Result<String, url::ParseError> {
        Url::parse(registration_host)?;

        let url = format!(
            "{}{}?customer={}&url={}&server_uid={}",
            registration_host.trim_end_matches('/'),
            SERVER_REGISTRATION_PATH,
            utf8_percent_encode(&self.customer_id, QUERY_VALUE),
            utf8_percent_encode(&self.server_url, QUERY_VALUE),
            utf8_percent_encode(&self.server_uid, QUERY_VALUE),
        );
        Url::parse(&url)?;
        Ok(url)
    }
}

/// Outcome of a confirmed registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub target: RegistrationTarget,
    pub callback_url: String,
}
