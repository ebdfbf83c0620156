//! Welcome page served by the unregistered server.

use super::{attr, extract, first_attr, selector, Pattern};
use scraper::Html;

/// The welcome page: carries the link that starts authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WelcomePage {
    pub auth_link: String,
}

impl WelcomePage {
    pub fn parse(body: &str) -> Option<Self> {
        extract(Pattern::AuthLink, body).map(|auth_link| Self { auth_link })
    }
}

/// Href of the registration anchor, or failing that the first link that
/// points at an `/auth` endpoint.
pub(super) fn auth_link(document: &Html) -> Option<String> {
    let root = document.root_element();
    first_attr(root, "a#register-server", "href").or_else(|| {
        let anchors = selector("a[href]")?;
        root.select(&anchors)
            .filter_map(|a| attr(a, "href"))
            .find(|href| href.contains("/auth"))
    })
}
