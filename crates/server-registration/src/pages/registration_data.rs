//! Registration data returned after signing in.

use super::{attr, first_attr, selector, text, Pattern};
use scraper::Html;

/// A server listed for the signed-in customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEntry {
    pub name: String,
    pub uid: String,
}

/// Customer id plus every server row on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationData {
    pub customer_id: String,
    pub servers: Vec<ServerEntry>,
}

impl RegistrationData {
    pub fn parse(body: &str) -> Option<Self> {
        let document = Html::parse_document(body);
        let customer_id = Pattern::CustomerId.find(&document)?;

        let rows = selector("tr.server")?;
        let name_cell = selector(".server-name")?;
        let uid_input = selector(r#"input[name="server_uid"]"#)?;

        let servers = document
            .select(&rows)
            .filter_map(|row| {
                let name = row.select(&name_cell).next().map(text)?;
                let uid = row
                    .select(&uid_input)
                    .find_map(|input| attr(input, "value"))
                    .or_else(|| attr(row, "data-server-uid"))?;
                Some(ServerEntry { name, uid })
            })
            .collect();

        Some(Self {
            customer_id,
            servers,
        })
    }

    /// Entry whose name equals `name`, ignoring surrounding whitespace.
    pub fn server(&self, name: &str) -> Option<&ServerEntry> {
        let name = name.trim();
        self.servers.iter().find(|s| s.name == name)
    }
}

pub(super) fn customer_id(document: &Html) -> Option<String> {
    first_attr(document.root_element(), r#"input[name="customer"]"#, "value")
}
