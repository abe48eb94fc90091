//! Demo: observe the idle-expiry signal.
//!
//! Runs one retrieval cycle with a short idle window, then waits for the
//! supervisor to tear the session down and signal expiry.
//!
//! # Usage
//!
//! ```bash
//! export MAILCODE_CREDENTIALS="your@email.com:your-app-password"
//! export MAILCODE_HOST="imap.example.com"
//! cargo run --example session_expiry
//! ```

use mailcode::{Credentials, ErrorKind, ServerEndpoint, SessionSupervisor, SupervisorConfig};
use std::env;
use std::time::Duration;

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

    let config = SupervisorConfig::builder()
        .idle_timeout(Duration::from_secs(5))
        .build();
    let (mut supervisor, mut expiry) = SessionSupervisor::new(config);

    match supervisor.request_code(endpoint, credentials, SUBJECT).await {
        Ok(codes) => println!("Codes: {}", codes.join(", ")),
        Err(e) if e.kind() == ErrorKind::NoCodesFound => {
            println!("Message found, but no code in it (timer still armed)");
        }
        Err(e) => {
            println!("Cycle failed, no timer armed: {e}");
            return Ok(());
        }
    }

    println!("Waiting for the idle window to elapse...");
    if expiry.recv().await.is_some() {
        println!("Session expired and was disconnected. Enter fresh credentials to retry.");
    }

    Ok(())
}
