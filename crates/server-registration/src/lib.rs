//! Server Registration - registers a license server with its account service.
//!
//! The handshake scrapes a fixed sequence of HTML pages:
//! - the server's welcome page links to the account service sign-in page
//! - signing in yields the customer's registration data
//! - the matching server entry becomes a callback URL that confirms registration

pub mod config;
pub mod error;
pub mod flow;
pub mod pages;
pub mod types;

pub use config::{Config, FlowConfig};
pub use error::{RegistrationError, RegistrationResult};
pub use flow::{FlowStage, FlowState, RegistrationFlow};
pub use types::{Credentials, Registration, RegistrationTarget, Server};
