//! SOCKS5 proxy configuration for the connection path.
//!
//! ```
//! use mailcode::Socks5Proxy;
//!
//! let proxy = Socks5Proxy::new("proxy.example.com", 1080);
//! let authed = Socks5Proxy::with_auth("proxy.example.com", 1080, "user", "pass");
//! # let _ = (proxy, authed);
//! ```

/// SOCKS5 proxy configuration.
#[derive(Debug, Clone)]
pub struct Socks5Proxy {
    /// Proxy server hostname or IP address.
    pub host: String,
    /// Proxy server port.
    pub port: u16,
    /// Optional authentication credentials.
    pub auth: Option<ProxyAuth>,
}

/// Authentication credentials for a SOCKS5 proxy.
#[derive(Debug, Clone)]
pub struct ProxyAuth {
    /// Username for proxy authentication.
    pub username: String,
    /// Password for proxy authentication.
    pub password: String,
}

impl Socks5Proxy {
    /// Creates a proxy configuration without authentication.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            auth: None,
        }
    }

    /// Creates a proxy configuration with username/password authentication.
    #[must_use]
    pub fn with_auth(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            auth: Some(ProxyAuth {
                username: username.into(),
                password: password.into(),
            }),
        }
    }

    /// Returns `true` if this proxy requires authentication.
    #[must_use]
    pub fn requires_auth(&self) -> bool {
        self.auth.is_some()
    }
}

impl std::fmt::Display for Socks5Proxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "socks5://{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_without_auth() {
        let proxy = Socks5Proxy::new("proxy.local", 1080);
        assert!(!proxy.requires_auth());
        assert_eq!(proxy.to_string(), "socks5://proxy.local:1080");
    }

    #[test]
    fn test_proxy_with_auth() {
        let proxy = Socks5Proxy::with_auth("proxy.local", 1080, "user", "pass");
        assert!(proxy.requires_auth());
    }
}
