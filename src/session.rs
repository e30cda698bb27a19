use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};

use crate::models::UserId;

pub const DEFAULT_AUDIENCE: &str = "authenticated";

/// Claims carried by the auth provider's access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub aud: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("invalid access token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("token subject is not a user id")]
    Subject,
    #[error("auth events closed before sign-in completed")]
    Closed,
}

/// The signed-in viewer. Views receive it explicitly; there is no global.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub email: Option<String>,
    pub access_token: String,
}

impl Session {
    /// Validate an HS256 access token and build the session it describes.
    pub fn from_access_token(token: &str, secret: &str, audience: &str) -> Result<Self, SessionError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_audience(&[audience]);
        let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)?;
        let user_id: UserId = data.claims.sub.parse().map_err(|_| SessionError::Subject)?;
        Ok(Self { user_id, email: data.claims.email, access_token: token.to_string() })
    }

    /// Local part of the email, or "anonymous".
    pub fn display_name(&self) -> String {
        display_name(self.email.as_deref())
    }

    /// Seed for generated avatars: the email when known, else the user id.
    pub fn avatar_seed(&self) -> String {
        self.email.clone().unwrap_or_else(|| self.user_id.to_string())
    }
}

pub fn display_name(email: Option<&str>) -> String {
    email
        .and_then(|e| e.split('@').next())
        .filter(|local| !local.is_empty())
        .unwrap_or("anonymous")
        .to_string()
}

/// Deterministic avatar reference for `seed`.
pub fn avatar_url(base: &str, seed: &str) -> String {
    format!("{}?seed={}", base, urlencoding::encode(seed))
}

/// Mint an access token, as the auth provider would (development and tests).
pub fn create_access_token(
    user_id: UserId,
    email: Option<&str>,
    secret: &str,
    audience: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let expiration = chrono::Utc::now()
        .checked_add_signed(chrono::Duration::hours(1))
        .map(|t| t.timestamp() as usize)
        .unwrap_or(usize::MAX);
    let claims = Claims {
        sub: user_id.to_string(),
        exp: expiration,
        aud: audience.to_string(),
        email: email.map(str::to_string),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(Session),
    SignedOut,
}

/// Auth-state change notifications.
#[derive(Clone)]
pub struct AuthEvents {
    tx: broadcast::Sender<AuthEvent>,
}

impl AuthEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.tx.subscribe()
    }

    /// Returns the number of listeners that received the event.
    pub fn emit(&self, event: AuthEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }
}

impl Default for AuthEvents {
    fn default() -> Self { Self::new() }
}

/// Message posted back to the window that opened the sign-in popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenerMessage {
    AuthComplete { user_id: UserId },
}

/// Sign-in popup waiting for the provider to complete. Consumed on
/// completion, which closes it.
pub struct SignInPopup {
    events: broadcast::Receiver<AuthEvent>,
    opener: mpsc::Sender<OpenerMessage>,
}

impl SignInPopup {
    pub fn open(events: &AuthEvents, opener: mpsc::Sender<OpenerMessage>) -> Self {
        Self { events: events.subscribe(), opener }
    }

    /// Wait for the first sign-in, relay it to the opener, then close.
    pub async fn await_completion(mut self) -> Result<Session, SessionError> {
        loop {
            match self.events.recv().await {
                Ok(AuthEvent::SignedIn(session)) => {
                    info!(user_id = %session.user_id, "sign-in completed in popup");
                    self.opener
                        .send(OpenerMessage::AuthComplete { user_id: session.user_id })
                        .await
                        .map_err(|_| SessionError::Closed)?;
                    return Ok(session);
                }
                Ok(AuthEvent::SignedOut) => continue,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    debug!("popup auth listener lagged by {n} events");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return Err(SessionError::Closed),
            }
        }
    }
}
