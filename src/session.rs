//! Process-wide authentication state.
//!
//! `SessionStore` owns the current [`Session`] and publishes every change on a
//! `tokio::sync::watch` channel. It is created in the loading state, resolved
//! once by [`SessionStore::initialize`], and afterwards only follows sign-in and
//! sign-out events.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use taskflow_common::{AuthEvent, AuthUser};

use crate::errors::{Result, TaskflowError};
use crate::remote::{RemoteService, SignUpOutcome};

/// Snapshot of who is signed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: Option<AuthUser>,
    /// True only until the first session lookup resolves.
    pub loading: bool,
}

impl Session {
    pub fn initial() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::initial()
    }
}

/// Publish `user` and leave the loading window. Returns whether anything changed.
fn publish(tx: &watch::Sender<Session>, user: Option<AuthUser>) -> bool {
    tx.send_if_modified(|session| {
        let changed = session.loading || session.user != user;
        session.user = user;
        session.loading = false;
        changed
    })
}

pub struct SessionStore {
    remote: Arc<dyn RemoteService>,
    tx: Arc<watch::Sender<Session>>,
    initialized: AtomicBool,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionStore {
    pub fn new(remote: Arc<dyn RemoteService>) -> Self {
        let (tx, _rx) = watch::channel(Session::initial());
        Self {
            remote,
            tx: Arc::new(tx),
            initialized: AtomicBool::new(false),
            listener: Mutex::new(None),
        }
    }

    /// Subscribe to auth notifications, then resolve the existing session once.
    ///
    /// Only the first call does anything. A failed lookup resolves to signed out.
    pub async fn initialize(&self) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            debug!("Session store already initialized, ignoring");
            return;
        }

        let events = self.remote.auth_events();
        let handle = tokio::spawn(listen(events, Arc::clone(&self.tx)));
        if let Ok(mut slot) = self.listener.lock() {
            *slot = Some(handle);
        }

        let user = match self.remote.current_session().await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Session lookup failed, continuing signed out");
                None
            }
        };

        // An auth event may already have resolved the session while the lookup
        // was in flight; that newer state wins.
        self.tx.send_if_modified(|session| {
            if !session.loading {
                return false;
            }
            session.user = user;
            session.loading = false;
            true
        });

        match &self.current().user {
            Some(user) => info!(user = %user.display_name(), "Session restored"),
            None => debug!("No active session"),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Session {
        self.tx.borrow().clone()
    }

    /// The signed-in user, if any.
    pub fn user(&self) -> Option<AuthUser> {
        self.tx.borrow().user.clone()
    }

    /// Wait until the initial lookup has resolved.
    pub async fn ready(&self) -> Session {
        let mut rx = self.subscribe();
        match rx.wait_for(|s| !s.loading).await {
            Ok(session) => session.clone(),
            Err(_) => self.current(),
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(TaskflowError::Validation(
                "email and password are required".to_string(),
            ));
        }
        let user = self.remote.sign_in(email, password).await?;
        publish(&self.tx, Some(user.clone()));
        info!(user = %user.display_name(), "Signed in");
        Ok(user)
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<SignUpOutcome> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(TaskflowError::Validation(
                "email and password are required".to_string(),
            ));
        }
        let full_name = full_name.map(str::trim).filter(|n| !n.is_empty());
        let outcome = self.remote.sign_up(email, password, full_name).await?;
        match &outcome {
            SignUpOutcome::SignedIn(user) => {
                publish(&self.tx, Some(user.clone()));
                info!(user = %user.display_name(), "Signed up");
            }
            SignUpOutcome::ConfirmationRequired => {
                info!(email, "Sign-up pending email confirmation");
            }
        }
        Ok(outcome)
    }

    /// Sign out remotely and clear the local identity. The identity is cleared
    /// even when the remote call fails; that failure is still returned.
    pub async fn sign_out(&self) -> Result<()> {
        let result = self.remote.sign_out().await;
        publish(&self.tx, None);
        match result {
            Ok(()) => {
                info!("Signed out");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Remote sign-out failed, local session cleared");
                Err(e.into())
            }
        }
    }

    /// Stop following auth notifications.
    pub fn shutdown(&self) {
        if let Ok(mut slot) = self.listener.lock()
            && let Some(handle) = slot.take()
        {
            handle.abort();
            debug!("Session listener stopped");
        }
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn listen(mut events: broadcast::Receiver<AuthEvent>, tx: Arc<watch::Sender<Session>>) {
    loop {
        match events.recv().await {
            Ok(AuthEvent::SignedIn(user)) | Ok(AuthEvent::TokenRefreshed(user)) => {
                publish(&tx, Some(user));
            }
            Ok(AuthEvent::SignedOut) => {
                publish(&tx, None);
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Auth listener lagged behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
