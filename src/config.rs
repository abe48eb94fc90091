//! Caller-supplied configuration: credentials, server endpoint, and timeouts.
//!
//! ```
//! use mailcode::{Credentials, ServerEndpoint, SupervisorConfig};
//! use std::time::Duration;
//!
//! let credentials = Credentials::parse("user@example.com:app-password").unwrap();
//! let endpoint = ServerEndpoint::new("imap.example.com", 993).unwrap();
//!
//! let config = SupervisorConfig::builder()
//!     .idle_timeout(Duration::from_secs(30))
//!     .build();
//! # let _ = (credentials, endpoint, config);
//! ```

use crate::error::{Error, Result};
use crate::extract::CodeSignature;
use crate::proxy::Socks5Proxy;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

/// Mailbox login credentials.
///
/// Immutable once a session is constructed from them; changing credentials
/// means building a new session. The secret is stored as a [`SecretString`]
/// to prevent accidental logging.
#[derive(Clone)]
pub struct Credentials {
    address: String,
    secret: SecretString,
}

impl Credentials {
    /// Creates credentials from a mailbox address and secret.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if either field is empty. The address
    /// is otherwise taken as-is; reachability and account validity are only
    /// discovered at connect time.
    pub fn new(address: impl Into<String>, secret: impl Into<String>) -> Result<Self> {
        let address = address.into();
        if address.is_empty() {
            return Err(Error::InvalidConfig {
                message: "mailbox address is required".into(),
            });
        }

        let secret = secret.into();
        if secret.is_empty() {
            return Err(Error::InvalidConfig {
                message: "mailbox secret is required".into(),
            });
        }

        Ok(Self {
            address,
            secret: SecretString::from(secret),
        })
    }

    /// Parses credentials from their persisted `"address:secret"` form.
    ///
    /// The string is split at the first colon, so secrets containing colons
    /// survive the round trip.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if no colon is present or either side
    /// is empty.
    ///
    /// # Example
    ///
    /// ```
    /// use mailcode::Credentials;
    ///
    /// let credentials = Credentials::parse("user@example.com:s3cret").unwrap();
    /// assert_eq!(credentials.address(), "user@example.com");
    /// ```
    pub fn parse(raw: &str) -> Result<Self> {
        let (address, secret) = raw.split_once(':').ok_or_else(|| Error::InvalidConfig {
            message: "expected credentials in 'address:secret' form".into(),
        })?;

        Self::new(address, secret)
    }

    /// Returns the mailbox address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Returns the secret for authentication.
    ///
    /// Intentionally crate-private so the secret only ever flows into the
    /// IMAP LOGIN exchange.
    pub(crate) fn secret(&self) -> &str {
        self.secret.expose_secret()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("address", &self.address)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// An IMAP server endpoint.
///
/// Validated only for presence and parseability; reachability is discovered
/// at connect time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEndpoint {
    host: String,
    port: u16,
}

impl ServerEndpoint {
    /// Creates an endpoint from a hostname and port.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for an empty host or port 0.
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self> {
        let host = host.into();
        if host.is_empty() {
            return Err(Error::InvalidConfig {
                message: "server host is required".into(),
            });
        }
        if port == 0 {
            return Err(Error::InvalidConfig {
                message: "server port must be in 1..=65535".into(),
            });
        }

        Ok(Self { host, port })
    }

    /// Creates an endpoint from the persisted string forms of host and port.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the port does not parse or is out
    /// of range.
    pub fn from_strings(host: &str, port: &str) -> Result<Self> {
        let port: u16 = port.trim().parse().map_err(|_| Error::InvalidConfig {
            message: format!("invalid server port '{port}'"),
        })?;

        Self::new(host, port)
    }

    /// Returns the server hostname.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the server port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the full server address as `"host:port"`.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Timeout configuration for individual session operations.
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Timeout for establishing the TCP/TLS connection.
    pub connect: Duration,
    /// Timeout for IMAP authentication.
    pub auth: Duration,
    /// Timeout for selecting a mailbox.
    pub select: Duration,
    /// Timeout for the subject search.
    pub search: Duration,
    /// Timeout for fetching message content.
    pub fetch: Duration,
    /// Timeout for the logout operation.
    pub logout: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(30),
            auth: Duration::from_secs(30),
            select: Duration::from_secs(10),
            search: Duration::from_secs(10),
            fetch: Duration::from_secs(30),
            logout: Duration::from_secs(5),
        }
    }
}

/// Per-session options shared by every operation on a [`MailSession`].
///
/// [`MailSession`]: crate::MailSession
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Operation timeouts.
    pub timeouts: TimeoutConfig,
    /// Optional SOCKS5 proxy for the connection.
    pub proxy: Option<Socks5Proxy>,
}

/// Configuration for a [`SessionSupervisor`].
///
/// Create using [`SupervisorConfig::builder()`].
///
/// [`SessionSupervisor`]: crate::SessionSupervisor
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Options applied to every session the supervisor constructs.
    pub session: SessionOptions,
    /// Idle window after a completed cycle before the session is torn down.
    pub idle_timeout: Duration,
    /// Signature used to locate code-bearing elements in message markup.
    pub signature: CodeSignature,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            session: SessionOptions::default(),
            idle_timeout: Duration::from_secs(30),
            signature: CodeSignature::default(),
        }
    }
}

impl SupervisorConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> SupervisorConfigBuilder {
        SupervisorConfigBuilder::default()
    }
}

/// Builder for [`SupervisorConfig`].
#[derive(Debug, Default)]
pub struct SupervisorConfigBuilder {
    timeouts: Option<TimeoutConfig>,
    proxy: Option<Socks5Proxy>,
    idle_timeout: Option<Duration>,
    signature: Option<CodeSignature>,
}

impl SupervisorConfigBuilder {
    /// Sets the operation timeouts.
    #[must_use]
    pub fn timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = Some(timeouts);
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts
            .get_or_insert_with(TimeoutConfig::default)
            .connect = timeout;
        self
    }

    /// Sets the authentication timeout.
    #[must_use]
    pub fn auth_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.get_or_insert_with(TimeoutConfig::default).auth = timeout;
        self
    }

    /// Sets a SOCKS5 proxy for all sessions.
    #[must_use]
    pub fn proxy(mut self, proxy: Socks5Proxy) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Sets the idle window after a completed cycle.
    ///
    /// Default is 30 seconds.
    #[must_use]
    pub fn idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = Some(idle_timeout);
        self
    }

    /// Sets the signature used to locate code-bearing elements.
    #[must_use]
    pub fn signature(mut self, signature: CodeSignature) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> SupervisorConfig {
        SupervisorConfig {
            session: SessionOptions {
                timeouts: self.timeouts.unwrap_or_default(),
                proxy: self.proxy,
            },
            idle_timeout: self.idle_timeout.unwrap_or(Duration::from_secs(30)),
            signature: self.signature.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_new() {
        let credentials = Credentials::new("user@example.com", "secret").unwrap();
        assert_eq!(credentials.address(), "user@example.com");
        assert_eq!(credentials.secret(), "secret");
    }

    #[test]
    fn test_credentials_rejects_empty_fields() {
        assert!(Credentials::new("", "secret").is_err());
        assert!(Credentials::new("user@example.com", "").is_err());
    }

    #[test]
    fn test_credentials_parse() {
        let credentials = Credentials::parse("user@example.com:s3cret").unwrap();
        assert_eq!(credentials.address(), "user@example.com");
        assert_eq!(credentials.secret(), "s3cret");
    }

    #[test]
    fn test_credentials_parse_splits_at_first_colon() {
        let credentials = Credentials::parse("user@example.com:pa:ss").unwrap();
        assert_eq!(credentials.secret(), "pa:ss");
    }

    #[test]
    fn test_credentials_parse_missing_colon() {
        let result = Credentials::parse("user@example.com");
        assert!(result.is_err());
    }

    #[test]
    fn test_secret_not_in_debug() {
        let credentials = Credentials::new("user@example.com", "super-secret").unwrap();
        let debug_str = format!("{credentials:?}");
        assert!(!debug_str.contains("super-secret"));
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn test_endpoint_new() {
        let endpoint = ServerEndpoint::new("imap.example.com", 993).unwrap();
        assert_eq!(endpoint.host(), "imap.example.com");
        assert_eq!(endpoint.port(), 993);
        assert_eq!(endpoint.address(), "imap.example.com:993");
    }

    #[test]
    fn test_endpoint_rejects_empty_host_and_zero_port() {
        assert!(ServerEndpoint::new("", 993).is_err());
        assert!(ServerEndpoint::new("imap.example.com", 0).is_err());
    }

    #[test]
    fn test_endpoint_from_strings() {
        let endpoint = ServerEndpoint::from_strings("imap.example.com", "993").unwrap();
        assert_eq!(endpoint.port(), 993);

        assert!(ServerEndpoint::from_strings("imap.example.com", "not-a-port").is_err());
        assert!(ServerEndpoint::from_strings("imap.example.com", "70000").is_err());
        assert!(ServerEndpoint::from_strings("imap.example.com", "0").is_err());
    }

    #[test]
    fn test_config_defaults() {
        let config = SupervisorConfig::default();
        assert_eq!(config.idle_timeout, Duration::from_secs(30));
        assert!(config.session.proxy.is_none());
        assert_eq!(config.session.timeouts.logout, Duration::from_secs(5));
    }

    #[test]
    fn test_config_builder() {
        let config = SupervisorConfig::builder()
            .connect_timeout(Duration::from_secs(60))
            .idle_timeout(Duration::from_secs(10))
            .proxy(Socks5Proxy::new("proxy.local", 1080))
            .build();

        assert_eq!(config.session.timeouts.connect, Duration::from_secs(60));
        assert_eq!(config.idle_timeout, Duration::from_secs(10));
        assert!(config.session.proxy.is_some());
    }
}
