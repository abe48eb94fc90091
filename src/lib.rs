//! # mailcode
//!
//! Async retrieval of email verification codes over IMAPS.
//!
//! This crate provides a high-level, async API for:
//! - Connecting to an IMAP server over TLS (with optional SOCKS5 proxy support)
//! - Locating the most recent message matching a known subject
//! - Extracting the verification code rendered in the message's HTML body
//! - Tearing the session down after a bounded idle window
//!
//! ## Quick Start
//!
//! ```no_run
//! use mailcode::{Credentials, ServerEndpoint, SessionSupervisor, SupervisorConfig};
//!
//! # async fn example() -> mailcode::Result<()> {
//! let (mut supervisor, mut expiry) = SessionSupervisor::new(SupervisorConfig::default());
//!
//! let endpoint = ServerEndpoint::new("imap.example.com", 993)?;
//! let credentials = Credentials::parse("user@example.com:app-password")?;
//!
//! let codes = supervisor
//!     .request_code(endpoint, credentials, "Epic Games - Email Verification")
//!     .await?;
//! println!("Your verification code: {}", codes.join(", "));
//!
//! // The session stays connected for the idle window; if no new request
//! // arrives in time, the supervisor disconnects and signals expiry.
//! if expiry.recv().await.is_some() {
//!     println!("Session expired, enter fresh credentials");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Driving the Session Directly
//!
//! The supervisor is a thin state machine over [`MailSession`]; callers that
//! want their own lifecycle management can use the session alone:
//!
//! ```no_run
//! use mailcode::{CodeSignature, Credentials, MailSession, ServerEndpoint, SessionOptions};
//! use mailcode::extract_codes;
//!
//! # async fn example() -> mailcode::Result<()> {
//! let mut session = MailSession::new(
//!     ServerEndpoint::new("imap.example.com", 993)?,
//!     Credentials::new("user@example.com", "app-password")?,
//!     SessionOptions::default(),
//! );
//!
//! session.connect().await?;
//!
//! let ids = session.find_by_subject("Epic Games - Email Verification").await?;
//! if let Some(&newest) = ids.last() {
//!     let message = session.fetch(newest).await?;
//!     let signature = CodeSignature::default();
//!     for part in message.parts().iter().filter(|p| !p.is_container()) {
//!         let markup = String::from_utf8_lossy(part.payload());
//!         println!("{:?}", extract_codes(&markup, &signature));
//!     }
//! }
//!
//! session.disconnect().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All failures are structured values; nothing propagates as a panic. Match
//! on [`Error::kind`] for the coarse taxonomy, or use [`Error::is_retryable`]
//! for retry decisions:
//!
//! ```
//! use mailcode::{Error, ErrorKind};
//!
//! fn handle_error(error: &Error) {
//!     match error.kind() {
//!         ErrorKind::NotFound => println!("no matching message yet"),
//!         ErrorKind::NoCodesFound => println!("message found, template changed?"),
//!         _ if error.is_retryable() => println!("transient: {error}"),
//!         _ => println!("permanent: {error}"),
//!     }
//! }
//! ```
//!
//! ## Observability
//!
//! The crate uses `tracing` for instrumentation. Session and supervisor
//! operations emit spans with structured fields (`address`, `target`,
//! `subject`, `uid`); spans are no-ops without a subscriber.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Public modules
pub mod config;
pub mod error;
pub mod extract;
pub mod message;
pub mod proxy;
pub mod session;
pub mod supervisor;

// Internal modules
mod connection;

// Re-exports for ergonomic API
pub use config::{
    Credentials, ServerEndpoint, SessionOptions, SupervisorConfig, SupervisorConfigBuilder,
    TimeoutConfig,
};
pub use error::{Error, ErrorKind, Result};
pub use extract::{extract_codes, CodeSignature};
pub use message::{MailboxMessage, MessagePart};
pub use proxy::{ProxyAuth, Socks5Proxy};
pub use session::MailSession;
pub use supervisor::{SessionExpired, SessionSupervisor, SupervisorState};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        // Ensure all public types are accessible
        let _ = SupervisorConfig::builder();
        let _ = Socks5Proxy::new("localhost", 1080);
        let _ = CodeSignature::default();
    }
}
