//! Orchestration of one verification-code retrieval cycle.
//!
//! [`SessionSupervisor`] drives the full pipeline — connect, subject search,
//! fetch, decode, extract — and owns the idle-expiry timer that tears the
//! session down when the caller does not start a new cycle in time. One
//! supervisor drives one session; callers must serialize requests (enforced
//! by `&mut self`).

use crate::config::{Credentials, ServerEndpoint, SupervisorConfig};
use crate::error::{Error, Result};
use crate::extract::extract_codes;
use crate::session::MailSession;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

/// Lifecycle signal: the idle window elapsed and the session was torn down.
///
/// The caller is expected to prompt for fresh input and issue a new request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionExpired;

/// Observable state of a [`SessionSupervisor`].
///
/// A retrieval cycle moves `Idle → Connecting → Searching → Fetching →
/// Extracting → Armed`; every failure returns to `Idle`, and an expired idle
/// timer does too.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// No cycle in progress, no session connected.
    Idle,
    /// Establishing and authenticating the connection.
    Connecting,
    /// Running the subject search.
    Searching,
    /// Retrieving and decoding the newest matching message.
    Fetching,
    /// Scanning message parts for codes.
    Extracting,
    /// Cycle complete, idle-expiry timer counting down.
    Armed,
}

/// Supervises verification-code retrieval cycles over a single mail session.
///
/// # Example
///
/// ```no_run
/// use mailcode::{Credentials, ServerEndpoint, SessionSupervisor, SupervisorConfig};
///
/// # async fn example() -> mailcode::Result<()> {
/// let (mut supervisor, mut expiry) = SessionSupervisor::new(SupervisorConfig::default());
///
/// let endpoint = ServerEndpoint::new("imap.example.com", 993)?;
/// let credentials = Credentials::parse("user@example.com:app-password")?;
///
/// let codes = supervisor
///     .request_code(endpoint, credentials, "Epic Games - Email Verification")
///     .await?;
/// println!("codes: {codes:?}");
///
/// // Later, unless a new request is issued first:
/// if expiry.recv().await.is_some() {
///     println!("session expired, prompt for fresh input");
/// }
/// # Ok(())
/// # }
/// ```
pub struct SessionSupervisor {
    config: SupervisorConfig,
    session: Option<Arc<Mutex<MailSession>>>,
    idle_timer: Option<JoinHandle<()>>,
    expiry_tx: mpsc::UnboundedSender<SessionExpired>,
    state: SupervisorState,
}

impl SessionSupervisor {
    /// Creates a supervisor and the receiver for its expiry signals.
    ///
    /// A [`SessionExpired`] is sent on the returned channel each time an
    /// armed idle timer elapses without a new request.
    #[must_use]
    pub fn new(config: SupervisorConfig) -> (Self, mpsc::UnboundedReceiver<SessionExpired>) {
        let (expiry_tx, expiry_rx) = mpsc::unbounded_channel();
        (
            Self {
                config,
                session: None,
                idle_timer: None,
                expiry_tx,
                state: SupervisorState::Idle,
            },
            expiry_rx,
        )
    }

    /// Returns the current state.
    ///
    /// Reports [`SupervisorState::Idle`] once an armed timer has fired.
    #[must_use]
    pub fn state(&self) -> SupervisorState {
        if self.state == SupervisorState::Armed
            && self.idle_timer.as_ref().map_or(true, JoinHandle::is_finished)
        {
            return SupervisorState::Idle;
        }
        self.state
    }

    /// Runs one retrieval cycle end-to-end.
    ///
    /// Cancels any pending idle timer, connects a fresh session with the
    /// given endpoint and credentials, searches the inbox for the exact
    /// subject, fetches the newest match, and extracts verification codes
    /// from its non-container parts.
    ///
    /// On success the idle timer is armed (whether or not codes were found)
    /// and the session stays connected until the timer fires or the next
    /// request. On every error the session is disconnected and the
    /// supervisor returns to [`SupervisorState::Idle`] without arming a
    /// timer.
    ///
    /// # Errors
    ///
    /// - kind [`ConnectionFailed`] — transport or authentication failure
    /// - kind [`SearchFailed`] / [`FetchFailed`] / [`DecodeFailed`] — the
    ///   corresponding pipeline stage failed
    /// - [`Error::NotFound`] — no message matches the subject (no timer armed)
    /// - [`Error::NoCodesFound`] — message found, signature absent (timer armed)
    ///
    /// [`ConnectionFailed`]: crate::ErrorKind::ConnectionFailed
    /// [`SearchFailed`]: crate::ErrorKind::SearchFailed
    /// [`FetchFailed`]: crate::ErrorKind::FetchFailed
    /// [`DecodeFailed`]: crate::ErrorKind::DecodeFailed
    #[instrument(
        name = "SessionSupervisor::request_code",
        skip_all,
        fields(
            target = %endpoint.address(),
            address = %credentials.address(),
            subject = %subject
        )
    )]
    pub async fn request_code(
        &mut self,
        endpoint: ServerEndpoint,
        credentials: Credentials,
        subject: &str,
    ) -> Result<Vec<String>> {
        // A new cycle always cancels any previously armed timer
        self.cancel_idle_timer();
        self.teardown_previous_session().await;

        self.state = SupervisorState::Connecting;
        let mut session = MailSession::new(endpoint, credentials, self.config.session.clone());
        if let Err(e) = session.connect().await {
            return Err(self.fail(session, e).await);
        }

        self.state = SupervisorState::Searching;
        let ids = match session.find_by_subject(subject).await {
            Ok(ids) => ids,
            Err(e) => return Err(self.fail(session, e).await),
        };

        // Newest matching message: UIDs are ascending, take the last
        let Some(&newest) = ids.last() else {
            debug!("No message matches the subject");
            return Err(self.fail(session, Error::NotFound).await);
        };

        self.state = SupervisorState::Fetching;
        let message = match session.fetch(newest).await {
            Ok(message) => message,
            Err(e) => return Err(self.fail(session, e).await),
        };

        self.state = SupervisorState::Extracting;
        let mut codes = Vec::new();
        for part in message.parts().iter().filter(|p| !p.is_container()) {
            let markup = String::from_utf8_lossy(part.payload());
            codes.extend(extract_codes(&markup, &self.config.signature));
        }

        debug!(uid = message.uid(), codes = codes.len(), "Extraction complete");

        // Timer is armed regardless of whether codes were found
        let session = Arc::new(Mutex::new(session));
        self.session = Some(Arc::clone(&session));
        self.arm_idle_timer(session);
        self.state = SupervisorState::Armed;

        if codes.is_empty() {
            Err(Error::NoCodesFound)
        } else {
            Ok(codes)
        }
    }

    /// Disconnects the failed cycle's session and returns to `Idle`.
    async fn fail(&mut self, mut session: MailSession, error: Error) -> Error {
        session.disconnect().await;
        self.state = SupervisorState::Idle;
        error
    }

    /// Disconnects and drops the session left over from a previous cycle.
    async fn teardown_previous_session(&mut self) {
        if let Some(previous) = self.session.take() {
            previous.lock().await.disconnect().await;
        }
    }

    /// Arms the idle-expiry timer for the given session.
    ///
    /// At most one timer is pending: any previous timer is cancelled first.
    /// When the timer fires it disconnects the session (idempotent, so a
    /// session torn down for other reasons in the meantime is harmless) and
    /// emits a [`SessionExpired`] signal.
    fn arm_idle_timer(&mut self, session: Arc<Mutex<MailSession>>) {
        self.cancel_idle_timer();

        let idle_timeout = self.config.idle_timeout;
        let expiry_tx = self.expiry_tx.clone();

        self.idle_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(idle_timeout).await;

            warn!(?idle_timeout, "Idle window elapsed, tearing down session");
            session.lock().await.disconnect().await;

            // Receiver may be gone; expiry is best-effort
            let _ = expiry_tx.send(SessionExpired);
        }));
    }

    /// Cancels the pending idle timer, if any.
    fn cancel_idle_timer(&mut self) {
        if let Some(timer) = self.idle_timer.take() {
            timer.abort();
            debug!("Cancelled pending idle timer");
        }
    }

    #[cfg(test)]
    fn arm_for_test(&mut self, session: MailSession) {
        let session = Arc::new(Mutex::new(session));
        self.session = Some(Arc::clone(&session));
        self.arm_idle_timer(session);
        self.state = SupervisorState::Armed;
    }
}

impl std::fmt::Debug for SessionSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSupervisor")
            .field("state", &self.state())
            .field("timer_pending", &self.idle_timer.is_some())
            .finish_non_exhaustive()
    }
}

impl Drop for SessionSupervisor {
    fn drop(&mut self) {
        // Best-effort: the timer task must not outlive its supervisor
        self.cancel_idle_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ServerEndpoint, SessionOptions};
    use crate::error::ErrorKind;
    use std::time::Duration;

    fn unreachable_endpoint() -> ServerEndpoint {
        // Port 1 on loopback: refused immediately, no traffic leaves the host
        ServerEndpoint::new("127.0.0.1", 1).unwrap()
    }

    fn test_credentials() -> Credentials {
        Credentials::new("user@example.com", "secret").unwrap()
    }

    fn test_config(idle: Duration) -> SupervisorConfig {
        SupervisorConfig::builder()
            .connect_timeout(Duration::from_secs(5))
            .idle_timeout(idle)
            .build()
    }

    fn offline_session() -> MailSession {
        MailSession::new(
            ServerEndpoint::new("imap.example.com", 993).unwrap(),
            test_credentials(),
            SessionOptions::default(),
        )
    }

    #[tokio::test]
    async fn test_connect_failure_returns_to_idle_without_timer() {
        let (mut supervisor, mut expiry) =
            SessionSupervisor::new(test_config(Duration::from_millis(50)));

        let err = supervisor
            .request_code(unreachable_endpoint(), test_credentials(), "Verification")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ConnectionFailed);
        assert_eq!(supervisor.state(), SupervisorState::Idle);
        assert!(supervisor.idle_timer.is_none());

        // No timer was armed, so the expiry signal never fires
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(expiry.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_timer_fires_exactly_once() {
        let idle = Duration::from_secs(30);
        let (mut supervisor, mut expiry) = SessionSupervisor::new(test_config(idle));

        supervisor.arm_for_test(offline_session());
        assert_eq!(supervisor.state(), SupervisorState::Armed);

        tokio::time::advance(idle + Duration::from_millis(10)).await;
        assert_eq!(expiry.recv().await, Some(SessionExpired));

        // Well past the window: still only the one signal
        tokio::time::advance(idle * 3).await;
        assert!(expiry.try_recv().is_err());

        // State reports Idle once the timer task has run to completion
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        assert_eq!(supervisor.state(), SupervisorState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearming_cancels_pending_timer() {
        let idle = Duration::from_secs(30);
        let (mut supervisor, mut expiry) = SessionSupervisor::new(test_config(idle));

        supervisor.arm_for_test(offline_session());
        tokio::time::advance(idle / 2).await;

        // Second cycle before the first timer fires: only the second may fire
        supervisor.arm_for_test(offline_session());
        tokio::time::advance(idle / 2 + Duration::from_millis(10)).await;
        assert!(expiry.try_recv().is_err(), "first timer must be cancelled");

        tokio::time::advance(idle / 2).await;
        assert_eq!(expiry.recv().await, Some(SessionExpired));
        assert!(expiry.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_disconnects_session() {
        let idle = Duration::from_secs(30);
        let (mut supervisor, mut expiry) = SessionSupervisor::new(test_config(idle));

        supervisor.arm_for_test(offline_session());
        let session = supervisor.session.clone().unwrap();

        tokio::time::advance(idle + Duration::from_millis(10)).await;
        assert_eq!(expiry.recv().await, Some(SessionExpired));

        assert!(!session.lock().await.is_connected());
    }

    #[tokio::test]
    async fn test_supervisor_starts_idle() {
        let (supervisor, _expiry) = SessionSupervisor::new(SupervisorConfig::default());
        assert_eq!(supervisor.state(), SupervisorState::Idle);
    }
}
