//! Basic demo: retrieve a verification code from a mailbox.
//!
//! Runs one full retrieval cycle against a real IMAP server and prints the
//! extracted code(s).
//!
//! # Usage
//!
//! ```bash
//! export MAILCODE_CREDENTIALS="your@email.com:your-app-password"
//! export MAILCODE_HOST="imap.example.com"
//! export MAILCODE_PORT="993"
//! cargo run --example fetch_code
//! ```
//!
//! For Gmail-style providers, use an app-specific password.

use mailcode::{Credentials, ServerEndpoint, SessionSupervisor, SupervisorConfig};
use std::env;

const SUBJECT: &str = "Epic Games - Email Verification";

#[tokio::main]
async fn main() -> mailcode::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let credentials = Credentials::parse(
        &env::var("MAILCODE_CREDENTIALS")
            .expect("MAILCODE_CREDENTIALS environment variable required"),
    )?;
    let endpoint = ServerEndpoint::from_strings(
        &env::var("MAILCODE_HOST").expect("MAILCODE_HOST environment variable required"),
        &env::var("MAILCODE_PORT").unwrap_or_else(|_| "993".into()),
    )?;

    println!("Connecting to {} as {}...", endpoint.address(), credentials.address());

    let (mut supervisor, _expiry) = SessionSupervisor::new(SupervisorConfig::default());

    let codes = supervisor
        .request_code(endpoint, credentials, SUBJECT)
        .await?;

    println!("Your verification code: {}", codes.join(", "));

    Ok(())
}
