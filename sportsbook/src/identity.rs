//! Identity providers and the auth-change subscription.
//!
//! Providers publish the signed-in identity on a `watch` channel.
//! [`observe_auth_changes`] turns that channel into a cancellable
//! subscription that delivers each change to a callback, one at a time.

use crate::types::Identity;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use wager_core::environment::Clock;

/// Identity provider errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// Email missing
    #[error("Email is required")]
    MissingEmail,

    /// The provider refused the credentials
    #[error("{0}")]
    Rejected(String),

    /// HTTP request failed
    #[error("Identity request failed: {0}")]
    RequestFailed(String),

    /// Response body did not match the expected schema
    #[error("Identity response parsing failed: {0}")]
    ResponseParseFailed(String),
}

/// Email and password pair
///
/// `Debug` never prints the password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
}

impl Credentials {
    /// Create a credential pair
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Boxed provider future
pub type IdentityFuture<T> = Pin<Box<dyn Future<Output = Result<T, IdentityError>> + Send>>;

/// Authentication backend
pub trait IdentityProvider: Send + Sync {
    /// Authenticate an existing account
    fn sign_in(&self, credentials: &Credentials) -> IdentityFuture<Identity>;

    /// Create an account and sign it in
    fn sign_up(&self, credentials: &Credentials) -> IdentityFuture<Identity>;

    /// End the current session
    fn sign_out(&self) -> IdentityFuture<()>;

    /// Receiver that observes every identity change
    fn changes(&self) -> watch::Receiver<Option<Identity>>;
}

/// Offline provider that accepts any credentials
///
/// Identities are synthesized from the email: `uid` is `mock_{millis}` and
/// the display name is the part before `@`.
#[derive(Clone)]
pub struct StandInIdentityProvider {
    clock: Arc<dyn Clock>,
    current: Arc<watch::Sender<Option<Identity>>>,
}

impl StandInIdentityProvider {
    /// Create a provider stamping ids from `clock`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            clock,
            current: Arc::new(current),
        }
    }

    fn synthesize(&self, credentials: &Credentials) -> Result<Identity, IdentityError> {
        let email = credentials.email.trim();
        if email.is_empty() {
            return Err(IdentityError::MissingEmail);
        }

        let display_name = email.split('@').next().unwrap_or(email).to_string();
        let identity = Identity {
            uid: format!("mock_{}", self.clock.now().timestamp_millis()),
            email: Some(email.to_string()),
            display_name: Some(display_name),
        };

        tracing::info!(uid = %identity.uid, "Created stand-in identity");
        self.current.send_replace(Some(identity.clone()));
        Ok(identity)
    }
}

impl IdentityProvider for StandInIdentityProvider {
    fn sign_in(&self, credentials: &Credentials) -> IdentityFuture<Identity> {
        let result = self.synthesize(credentials);
        Box::pin(async move { result })
    }

    fn sign_up(&self, credentials: &Credentials) -> IdentityFuture<Identity> {
        let result = self.synthesize(credentials);
        Box::pin(async move { result })
    }

    fn sign_out(&self) -> IdentityFuture<()> {
        tracing::info!("Signing out stand-in identity");
        self.current.send_replace(None);
        Box::pin(async { Ok(()) })
    }

    fn changes(&self) -> watch::Receiver<Option<Identity>> {
        self.current.subscribe()
    }
}

/// Identity Toolkit REST client (email/password accounts)
#[derive(Clone)]
pub struct RestIdentityProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    current: Arc<watch::Sender<Option<Identity>>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Readable message for an Identity Toolkit error code
///
/// Codes may carry a detail after ` : `, e.g.
/// `WEAK_PASSWORD : Password should be at least 6 characters`.
fn readable_error(raw: &str) -> String {
    let code = raw.split(" : ").next().unwrap_or(raw).trim();
    let message = match code {
        "EMAIL_NOT_FOUND" => "No account found for this email",
        "INVALID_PASSWORD" => "Incorrect password",
        "INVALID_LOGIN_CREDENTIALS" => "Invalid email or password",
        "EMAIL_EXISTS" => "An account already exists for this email",
        "INVALID_EMAIL" => "Invalid email address",
        "WEAK_PASSWORD" => "Password should be at least 6 characters",
        "USER_DISABLED" => "This account has been disabled",
        "TOO_MANY_ATTEMPTS_TRY_LATER" => "Too many attempts, try again later",
        _ => return raw.to_string(),
    };
    message.to_string()
}

impl RestIdentityProvider {
    /// Create a client for `base_url` authenticated with a web API key
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            current: Arc::new(current),
        }
    }

    fn authenticate(&self, endpoint: &'static str, credentials: &Credentials) -> IdentityFuture<Identity> {
        let client = self.client.clone();
        let url = format!("{}/accounts:{endpoint}", self.base_url);
        let api_key = self.api_key.clone();
        let current = Arc::clone(&self.current);
        let credentials = credentials.clone();

        Box::pin(async move {
            if credentials.email.trim().is_empty() {
                return Err(IdentityError::MissingEmail);
            }

            let response = client
                .post(&url)
                .query(&[("key", api_key.as_str())])
                .json(&PasswordRequest {
                    email: credentials.email.trim(),
                    password: &credentials.password,
                    return_secure_token: true,
                })
                .send()
                .await
                .map_err(|e| IdentityError::RequestFailed(e.to_string()))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ErrorEnvelope>(&body)
                    .map(|envelope| readable_error(&envelope.error.message))
                    .unwrap_or_else(|_| format!("status {status}"));
                tracing::warn!(endpoint, %status, message = %message, "Identity provider refused request");
                return Err(IdentityError::Rejected(message));
            }

            let account: AccountResponse = response
                .json()
                .await
                .map_err(|e| IdentityError::ResponseParseFailed(e.to_string()))?;

            let identity = Identity {
                uid: account.local_id,
                email: account.email.filter(|e| !e.is_empty()),
                display_name: account.display_name.filter(|n| !n.is_empty()),
            };
            tracing::info!(endpoint, uid = %identity.uid, "Authenticated");
            current.send_replace(Some(identity.clone()));
            Ok(identity)
        })
    }
}

impl IdentityProvider for RestIdentityProvider {
    fn sign_in(&self, credentials: &Credentials) -> IdentityFuture<Identity> {
        self.authenticate("signInWithPassword", credentials)
    }

    fn sign_up(&self, credentials: &Credentials) -> IdentityFuture<Identity> {
        self.authenticate("signUp", credentials)
    }

    fn sign_out(&self) -> IdentityFuture<()> {
        // Tokens are not persisted, so signing out is local
        self.current.send_replace(None);
        Box::pin(async { Ok(()) })
    }

    fn changes(&self) -> watch::Receiver<Option<Identity>> {
        self.current.subscribe()
    }
}

/// Handle for an auth-change subscription
///
/// Dropping the handle unsubscribes.
#[derive(Debug)]
pub struct AuthSubscription {
    task: JoinHandle<()>,
}

impl AuthSubscription {
    /// Stop delivering changes
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Whether the delivering task is still running
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Deliver the current identity, then every change, to `callback`
///
/// Deliveries are sequential: the next change is not read until the
/// previous callback future has completed. Rapid changes may coalesce into
/// the latest value. Must be called within a Tokio runtime.
pub fn observe_auth_changes<F, Fut>(
    mut changes: watch::Receiver<Option<Identity>>,
    mut callback: F,
) -> AuthSubscription
where
    F: FnMut(Option<Identity>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let task = tokio::spawn(async move {
        let initial = changes.borrow_and_update().clone();
        callback(initial).await;

        while changes.changed().await.is_ok() {
            let identity = changes.borrow_and_update().clone();
            tracing::debug!(signed_in = identity.is_some(), "Auth state changed");
            callback(identity).await;
        }
    });

    AuthSubscription { task }
}
