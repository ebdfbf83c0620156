//! Sign-in page of the account service.

use super::{attr, selector, Pattern};
use scraper::{ElementRef, Html};
use url::Url;

/// The credentials form and the hidden fields it must echo back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginPage {
    /// Raw `action` attribute; `None` posts back to the page itself
    pub action: Option<String>,

    /// Hidden inputs (state tokens and the like)
    pub hidden_fields: Vec<(String, String)>,
}

impl LoginPage {
    pub fn parse(body: &str) -> Option<Self> {
        let document = Html::parse_document(body);
        let form = login_form(&document)?;

        let hidden = selector(r#"input[type="hidden"][name]"#)?;
        let hidden_fields = form
            .select(&hidden)
            .filter_map(|input| {
                let name = attr(input, "name")?;
                let value = input.value().attr("value").unwrap_or_default();
                Some((name, value.to_string()))
            })
            .collect();

        Some(Self {
            action: Pattern::LoginAction.find(&document),
            hidden_fields,
        })
    }

    /// Absolute URL the credentials are posted to.
    pub fn action_url(&self, page_url: &str) -> Option<String> {
        let base = Url::parse(page_url).ok()?;
        match &self.action {
            Some(action) => base.join(action).ok().map(String::from),
            None => Some(base.into()),
        }
    }
}

/// The first form with a password field.
pub(super) fn login_form(document: &Html) -> Option<ElementRef<'_>> {
    let forms = selector("form")?;
    let password = selector(r#"input[name="password"]"#)?;
    document
        .select(&forms)
        .find(|form| form.select(&password).next().is_some())
}

pub(super) fn form_action(form: ElementRef<'_>) -> Option<String> {
    attr(form, "action")
}
