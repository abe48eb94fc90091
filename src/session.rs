//! Authenticated IMAP session management.
//!
//! [`MailSession`] owns at most one live connection to the server and exposes
//! the four operations of the retrieval pipeline: connect, subject search,
//! single-message fetch, and disconnect. No operation retries internally;
//! retry policy belongs to the caller.

use crate::config::{Credentials, ServerEndpoint, SessionOptions};
use crate::connection::{self, TlsStream};
use crate::error::{Error, Result};
use crate::message::{self, MailboxMessage};
use futures::StreamExt;
use std::time::Instant;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

/// The mailbox every search runs against.
const INBOX: &str = "INBOX";

type ImapHandle = async_imap::Session<TlsStream>;

/// An IMAP session over TLS.
///
/// Constructed disconnected; [`connect`](Self::connect) establishes and
/// authenticates the connection. The session holds at most one live handle:
/// connecting again first tears the previous handle down, and
/// [`disconnect`](Self::disconnect) is always safe to call.
///
/// A session is exclusively owned by its caller; operations must be
/// serialized (enforced by `&mut self`).
pub struct MailSession {
    endpoint: ServerEndpoint,
    credentials: Credentials,
    options: SessionOptions,
    handle: Option<ImapHandle>,
    connected_at: Option<Instant>,
}

impl MailSession {
    /// Creates a disconnected session for the given server and credentials.
    ///
    /// Credentials are fixed for the session's lifetime; use a new session to
    /// authenticate as someone else.
    #[must_use]
    pub fn new(endpoint: ServerEndpoint, credentials: Credentials, options: SessionOptions) -> Self {
        Self {
            endpoint,
            credentials,
            options,
            handle: None,
            connected_at: None,
        }
    }

    /// Returns `true` if the session currently holds a live connection.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    /// Returns when the current connection was established, if connected.
    #[must_use]
    pub fn connected_at(&self) -> Option<Instant> {
        self.connected_at
    }

    /// Returns the endpoint this session talks to.
    #[must_use]
    pub fn endpoint(&self) -> &ServerEndpoint {
        &self.endpoint
    }

    /// Establishes the TLS connection and authenticates.
    ///
    /// An already-connected session is torn down first, so at most one live
    /// handle ever exists. On any failure the session ends disconnected.
    ///
    /// # Errors
    ///
    /// Returns an error of kind [`ConnectionFailed`] on transport,
    /// handshake, or authentication failure.
    ///
    /// [`ConnectionFailed`]: crate::ErrorKind::ConnectionFailed
    #[instrument(
        name = "MailSession::connect",
        skip_all,
        fields(
            address = %self.credentials.address(),
            target = %self.endpoint.address()
        )
    )]
    pub async fn connect(&mut self) -> Result<()> {
        if self.handle.is_some() {
            debug!("Tearing down previous connection before reconnect");
            self.disconnect().await;
        }

        let target = self.endpoint.address();
        let timeouts = &self.options.timeouts;

        let tls_stream = timeout(
            timeouts.connect,
            connection::connect_tls(self.endpoint.host(), &target, self.options.proxy.as_ref()),
        )
        .await
        .map_err(|_| Error::ConnectTimeout {
            target: target.clone(),
            timeout: timeouts.connect,
        })??;

        debug!("TLS connection established");

        let handle = timeout(timeouts.auth, self.authenticate(tls_stream))
            .await
            .map_err(|_| Error::AuthTimeout {
                address: self.credentials.address().to_string(),
                timeout: timeouts.auth,
            })??;

        debug!("Authenticated to mail server");

        self.handle = Some(handle);
        self.connected_at = Some(Instant::now());
        Ok(())
    }

    /// Gracefully closes the connection.
    ///
    /// Idempotent: safe to call when already disconnected or never connected.
    /// Logout failures are logged and swallowed; the session always ends
    /// disconnected.
    #[instrument(name = "MailSession::disconnect", skip_all)]
    pub async fn disconnect(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            let logout_timeout = self.options.timeouts.logout;
            match timeout(logout_timeout, handle.logout()).await {
                Ok(Ok(())) => debug!("Disconnected from mail server"),
                Ok(Err(e)) => warn!(error = %e, "Logout failed, dropping connection"),
                Err(_) => warn!(?logout_timeout, "Logout timed out, dropping connection"),
            }
        }
        self.connected_at = None;
    }

    /// Searches the inbox for messages with exactly the given subject.
    ///
    /// Returns the matching UIDs in ascending (oldest-first) order; the last
    /// entry is the most recent match. An empty result is `Ok(vec![])`, not
    /// an error.
    ///
    /// # Errors
    ///
    /// Fails fast with [`Error::NotConnected`] on a disconnected session;
    /// otherwise returns errors of kind [`SearchFailed`].
    ///
    /// [`SearchFailed`]: crate::ErrorKind::SearchFailed
    #[instrument(
        name = "MailSession::find_by_subject",
        skip(self),
        fields(subject = %subject)
    )]
    pub async fn find_by_subject(&mut self, subject: &str) -> Result<Vec<u32>> {
        let timeouts = self.options.timeouts.clone();
        let handle = self.handle.as_mut().ok_or(Error::NotConnected)?;

        timeout(timeouts.select, handle.select(INBOX))
            .await
            .map_err(|_| Error::SelectTimeout {
                mailbox: INBOX.to_string(),
                timeout: timeouts.select,
            })?
            .map_err(|source| Error::SelectMailbox {
                mailbox: INBOX.to_string(),
                source,
            })?;

        let query = format!(r#"SUBJECT "{}""#, escape_quoted(subject));

        let uids = timeout(timeouts.search, handle.uid_search(&query))
            .await
            .map_err(|_| Error::SearchTimeout {
                timeout: timeouts.search,
            })?
            .map_err(|source| Error::Search {
                subject: subject.to_string(),
                source,
            })?;

        let mut ids: Vec<u32> = uids.into_iter().collect();
        ids.sort_unstable();

        debug!(matches = ids.len(), "Subject search complete");

        Ok(ids)
    }

    /// Fetches one message by UID and decodes it into its parts.
    ///
    /// All-or-nothing: a malformed message yields an error and no partial
    /// result.
    ///
    /// # Errors
    ///
    /// Fails fast with [`Error::NotConnected`] on a disconnected session;
    /// otherwise returns errors of kind [`FetchFailed`] or [`DecodeFailed`].
    ///
    /// [`FetchFailed`]: crate::ErrorKind::FetchFailed
    /// [`DecodeFailed`]: crate::ErrorKind::DecodeFailed
    #[instrument(name = "MailSession::fetch", skip(self), fields(uid = uid))]
    pub async fn fetch(&mut self, uid: u32) -> Result<MailboxMessage> {
        let fetch_timeout = self.options.timeouts.fetch;
        let handle = self.handle.as_mut().ok_or(Error::NotConnected)?;

        let raw = {
            let mut stream = timeout(fetch_timeout, handle.uid_fetch(uid.to_string(), "BODY[]"))
                .await
                .map_err(|_| Error::FetchTimeout {
                    uid,
                    timeout: fetch_timeout,
                })?
                .map_err(|source| Error::Fetch { uid, source })?;

            let mut raw: Option<Vec<u8>> = None;
            while let Some(item) = stream.next().await {
                let fetched = item.map_err(|source| Error::FetchStream { source })?;
                if let Some(body) = fetched.body() {
                    raw = Some(body.to_vec());
                }
            }

            raw.ok_or(Error::EmptyFetch { uid })?
        };

        debug!(bytes = raw.len(), "Fetched message content");

        message::decode(uid, &raw)
    }

    /// Performs the IMAP LOGIN exchange on a fresh TLS stream.
    async fn authenticate(&self, tls_stream: TlsStream) -> Result<ImapHandle> {
        let client = async_imap::Client::new(tls_stream);

        client
            .login(self.credentials.address(), self.credentials.secret())
            .await
            .map_err(|e| Error::Login {
                address: self.credentials.address().to_string(),
                source: e.0,
            })
    }
}

impl std::fmt::Debug for MailSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailSession")
            .field("endpoint", &self.endpoint)
            .field("address", &self.credentials.address())
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

/// Escapes a string for use inside an IMAP quoted string.
fn escape_quoted(value: &str) -> String {
    value.replace('\\', r"\\").replace('"', r#"\""#)
}
