//! Extractors for the pages the registration handshake walks through.
//!
//! Each known page shape gets a typed record saying which markup yields
//! which field. Matching goes through CSS selectors, so attribute order and
//! incidental whitespace do not matter. Nothing here panics on malformed
//! markup: a missing value is reported as `None`.

mod login;
mod registration_data;
mod welcome;

pub use login::LoginPage;
pub use registration_data::{RegistrationData, ServerEntry};
pub use welcome::WelcomePage;

use scraper::{ElementRef, Html, Selector};

/// A value the flow knows how to pull out of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// Href of the anchor that starts authorization (welcome page)
    AuthLink,
    /// Action of the credentials form (login page)
    LoginAction,
    /// Customer id echoed in the registration data page
    CustomerId,
}

impl Pattern {
    /// First value matching this pattern in an already parsed page.
    pub fn find(self, document: &Html) -> Option<String> {
        match self {
            Pattern::AuthLink => welcome::auth_link(document),
            Pattern::LoginAction => login::login_form(document).and_then(login::form_action),
            Pattern::CustomerId => registration_data::customer_id(document),
        }
    }
}

/// Extract the first value matching `pattern` from `body`.
pub fn extract(pattern: Pattern, body: &str) -> Option<String> {
    pattern.find(&Html::parse_document(body))
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// Trimmed, non-empty attribute value.
fn attr(element: ElementRef<'_>, name: &str) -> Option<String> {
    element
        .value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// First non-empty `name` attribute of any element matching `css`.
fn first_attr(root: ElementRef<'_>, css: &str, name: &str) -> Option<String> {
    let sel = selector(css)?;
    root.select(&sel).find_map(|el| attr(el, name))
}

/// Element text with whitespace runs collapsed.
fn text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
