//! Server Registration - Entry point.

use clap::Parser;
use page_client::HttpPageFetcher;
use server_registration::{Config, Credentials, FlowConfig, RegistrationFlow, Server};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Register a license server with the account service.
#[derive(Parser)]
#[command(name = "register-server", version, about)]
struct Cli {
    /// Base URL of the license server
    server_url: String,

    /// Account username
    username: String,

    /// Account password
    password: String,

    /// Name the server is listed under in the account
    server_name: String,
}

fn main() {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config.log.level);

    info!("Registering server {} at {}", cli.server_name, cli.server_url);

    let fetcher = match HttpPageFetcher::new(config.http.timeout) {
        Ok(f) => f,
        Err(e) => {
            error!("Failed to create HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    let flow = RegistrationFlow::new(fetcher, FlowConfig::default());
    let server = Server::new(cli.server_url, cli.server_name);
    let credentials = Credentials::new(cli.username, cli.password);

    match flow.run(&server, &credentials) {
        Ok(registration) => {
            info!("Registration confirmed via {}", registration.callback_url);
            println!("{}", registration.target.server_uid);
        }
        Err(e) => {
            error!("Registration failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
