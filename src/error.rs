//! Error types for the mailcode crate.
//!
//! All errors implement [`std::error::Error`] and carry their underlying cause
//! as a `#[source]`. The fine-grained variants map onto the coarse
//! [`ErrorKind`] taxonomy via [`Error::kind`]; retryability is exposed through
//! [`Error::is_retryable`].

use std::time::Duration;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while retrieving a verification code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────
    // Configuration / validation errors (NOT retryable)
    // ─────────────────────────────────────────────────────────────────────────
    /// Invalid configuration provided.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// Invalid DNS name for TLS.
    #[error("invalid DNS name for host '{host}'")]
    InvalidDnsName {
        /// The invalid hostname.
        host: String,
        /// The underlying DNS name error.
        #[source]
        source: rustls::client::InvalidDnsNameError,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Session state errors
    // ─────────────────────────────────────────────────────────────────────────
    /// An operation requiring a live connection was issued against a
    /// disconnected session.
    #[error("session is not connected")]
    NotConnected,

    // ─────────────────────────────────────────────────────────────────────────
    // Network / connection errors (RETRYABLE)
    // ─────────────────────────────────────────────────────────────────────────
    /// Failed to establish TCP connection.
    #[error("failed to connect to {target}")]
    TcpConnect {
        /// The target address that failed.
        target: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to establish TLS connection.
    #[error("failed to establish TLS connection to {target}")]
    TlsConnect {
        /// The target address that failed.
        target: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to connect via SOCKS5 proxy.
    #[error("failed to connect via SOCKS5 proxy {proxy_host} to {target}")]
    Socks5Connect {
        /// The SOCKS5 proxy hostname.
        proxy_host: String,
        /// The target address.
        target: String,
        /// The underlying SOCKS5 error.
        #[source]
        source: tokio_socks::Error,
    },

    /// Connection timeout.
    #[error("connection timeout to {target} after {timeout:?}")]
    ConnectTimeout {
        /// The target address.
        target: String,
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// IMAP login failed (bad credentials or server rejection).
    #[error("IMAP login failed for {address}")]
    Login {
        /// The mailbox address used for login.
        address: String,
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// Authentication timeout.
    #[error("authentication timeout for {address} after {timeout:?}")]
    AuthTimeout {
        /// The mailbox address used for authentication.
        address: String,
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // IMAP search errors (RETRYABLE - could be transient server issues)
    // ─────────────────────────────────────────────────────────────────────────
    /// Failed to select mailbox.
    #[error("failed to select mailbox '{mailbox}'")]
    SelectMailbox {
        /// The mailbox name.
        mailbox: String,
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// Mailbox selection timeout.
    #[error("mailbox selection timeout for '{mailbox}' after {timeout:?}")]
    SelectTimeout {
        /// The mailbox name.
        mailbox: String,
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// IMAP subject search failed.
    #[error("IMAP search failed for subject '{subject}'")]
    Search {
        /// The subject string that was searched.
        subject: String,
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// Subject search timeout.
    #[error("subject search timeout after {timeout:?}")]
    SearchTimeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // IMAP fetch errors
    // ─────────────────────────────────────────────────────────────────────────
    /// IMAP fetch failed.
    #[error("IMAP fetch failed for message {uid}")]
    Fetch {
        /// The UID that failed.
        uid: u32,
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// Failed to read a fetched message from the response stream.
    #[error("failed to read fetched message from stream")]
    FetchStream {
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// Message fetch timeout.
    #[error("message fetch timeout for {uid} after {timeout:?}")]
    FetchTimeout {
        /// The UID being fetched.
        uid: u32,
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// The server returned no content for the requested message.
    #[error("no content returned for message {uid}")]
    EmptyFetch {
        /// The UID that produced no body.
        uid: u32,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Decoding errors (NOT retryable - malformed content won't change)
    // ─────────────────────────────────────────────────────────────────────────
    /// Failed to decode a fetched message into its parts.
    #[error("failed to decode message {uid}")]
    Decode {
        /// The UID of the undecodable message.
        uid: u32,
        /// The underlying parse error.
        #[source]
        source: mailparse::MailParseError,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Outcome errors (NOT retryable)
    // ─────────────────────────────────────────────────────────────────────────
    /// No message matches the requested subject.
    #[error("no message found for the requested subject")]
    NotFound,

    /// A message was found, but no verification code could be extracted.
    #[error("no verification codes found in the message")]
    NoCodesFound,

    // ─────────────────────────────────────────────────────────────────────────
    // Teardown errors (reported to logs, never escalated by disconnect)
    // ─────────────────────────────────────────────────────────────────────────
    /// IMAP logout failed.
    #[error("IMAP logout failed")]
    Logout {
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// Logout timeout (not critical).
    #[error("logout timeout after {timeout:?}")]
    LogoutTimeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },
}

impl Error {
    /// Returns the coarse error kind for this error.
    ///
    /// Callers that do not care about the precise failure can match on the
    /// kind alone:
    ///
    /// ```
    /// use mailcode::{Error, ErrorKind};
    ///
    /// let err = Error::NotConnected;
    /// assert_eq!(err.kind(), ErrorKind::NotConnected);
    /// ```
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidConfig { .. } | Error::InvalidDnsName { .. } => ErrorKind::InvalidInput,

            Error::NotConnected => ErrorKind::NotConnected,

            Error::TcpConnect { .. }
            | Error::TlsConnect { .. }
            | Error::Socks5Connect { .. }
            | Error::ConnectTimeout { .. }
            | Error::Login { .. }
            | Error::AuthTimeout { .. }
            | Error::Logout { .. }
            | Error::LogoutTimeout { .. } => ErrorKind::ConnectionFailed,

            Error::SelectMailbox { .. }
            | Error::SelectTimeout { .. }
            | Error::Search { .. }
            | Error::SearchTimeout { .. } => ErrorKind::SearchFailed,

            Error::Fetch { .. }
            | Error::FetchStream { .. }
            | Error::FetchTimeout { .. }
            | Error::EmptyFetch { .. } => ErrorKind::FetchFailed,

            Error::Decode { .. } => ErrorKind::DecodeFailed,

            Error::NotFound => ErrorKind::NotFound,
            Error::NoCodesFound => ErrorKind::NoCodesFound,
        }
    }

    /// Returns `true` if this error represents a transient failure that might
    /// succeed on retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self.kind() {
            ErrorKind::ConnectionFailed | ErrorKind::SearchFailed | ErrorKind::FetchFailed => true,

            ErrorKind::InvalidInput
            | ErrorKind::NotConnected
            | ErrorKind::DecodeFailed
            | ErrorKind::NotFound
            | ErrorKind::NoCodesFound => false,
        }
    }
}

/// Coarse error taxonomy for callers and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid caller-supplied configuration (credentials or endpoint).
    InvalidInput,
    /// Operation issued against a disconnected session.
    NotConnected,
    /// Transport or authentication failure.
    ConnectionFailed,
    /// Mailbox selection or subject search failure.
    SearchFailed,
    /// Message retrieval failure.
    FetchFailed,
    /// Fetched message could not be decoded.
    DecodeFailed,
    /// No message matches the requested subject.
    NotFound,
    /// Message found, but no verification code extracted.
    NoCodesFound,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::InvalidInput => write!(f, "invalid_input"),
            ErrorKind::NotConnected => write!(f, "not_connected"),
            ErrorKind::ConnectionFailed => write!(f, "connection_failed"),
            ErrorKind::SearchFailed => write!(f, "search_failed"),
            ErrorKind::FetchFailed => write!(f, "fetch_failed"),
            ErrorKind::DecodeFailed => write!(f, "decode_failed"),
            ErrorKind::NotFound => write!(f, "not_found"),
            ErrorKind::NoCodesFound => write!(f, "no_codes_found"),
        }
    }
}
