//! OTP sign-in and session persistence.

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;
use storefront::{
    cart::{CartError, CartStore},
    storage::{KeyValueStore, StorageError},
};
use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiClient, ApiError};

/// Storage key holding the raw session token.
pub const TOKEN_KEY: &str = "token";

/// Storage key holding the serialized signed-in user.
pub const USER_KEY: &str = "user";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The backend declined the request.
    #[error("{0}")]
    Rejected(String),

    #[error("failed to persist session")]
    Storage(#[from] StorageError),

    #[error("failed to clear cart")]
    Cart(#[from] CartError),
}

/// A storefront customer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(
        default,
        deserialize_with = "phone_from_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub phone: Option<String>,
}

fn phone_from_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Phone {
        Text(String),
        Number(u64),
    }

    Ok(Option::<Phone>::deserialize(deserializer)?.map(|phone| match phone {
        Phone::Text(text) => text,
        Phone::Number(number) => number.to_string(),
    }))
}

/// A signed-in session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: Option<User>,
}

#[derive(Debug, Deserialize)]
struct SignInResponse {
    token: Option<String>,
    user: Option<User>,
    message: Option<String>,
}

#[automock]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Ask the backend to send a one-time password to `phone`.
    async fn request_otp(&self, phone: &str) -> Result<(), AuthError>;

    /// Exchange a phone number and one-time password for a session.
    async fn sign_in(&self, phone: &str, otp: &str) -> Result<Session, AuthError>;
}

/// [`AuthService`] backed by `/api/user-auth`.
#[derive(Debug, Clone)]
pub struct HttpAuthService {
    api: ApiClient,
}

impl HttpAuthService {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl AuthService for HttpAuthService {
    async fn request_otp(&self, phone: &str) -> Result<(), AuthError> {
        self.api
            .post::<_, serde_json::Value>("/api/user-auth/sent-otp", &json!({ "phone": phone }))
            .await
            .map_err(rejection)?;

        Ok(())
    }

    async fn sign_in(&self, phone: &str, otp: &str) -> Result<Session, AuthError> {
        let response: SignInResponse = self
            .api
            .post("/api/user-auth/sign-in", &json!({ "phone": phone, "otp": otp }))
            .await
            .map_err(rejection)?;

        let Some(token) = response.token else {
            return Err(AuthError::Rejected(
                response
                    .message
                    .unwrap_or_else(|| "Sign-in failed. Please try again.".to_string()),
            ));
        };

        Ok(Session {
            token,
            user: response.user,
        })
    }
}

fn rejection(err: ApiError) -> AuthError {
    match err.rejection_message() {
        Some(message) => AuthError::Rejected(message.to_string()),
        None => AuthError::Api(err),
    }
}

/// Persist a session under [`TOKEN_KEY`] and [`USER_KEY`].
///
/// # Errors
///
/// Returns an error if the records cannot be written.
pub fn save_session<S: KeyValueStore>(storage: &mut S, session: &Session) -> Result<(), StorageError> {
    storage.set(TOKEN_KEY, &session.token)?;

    match &session.user {
        Some(user) => storage.set(USER_KEY, &serde_json::to_string(user)?)?,
        None => storage.remove(USER_KEY)?,
    }

    info!("session saved");

    Ok(())
}

/// Read the persisted session, if any. An unreadable user record is dropped.
pub fn load_session<S: KeyValueStore>(storage: &S) -> Option<Session> {
    let token = match storage.get(TOKEN_KEY) {
        Ok(token) => token?,
        Err(err) => {
            warn!(error = %err, "failed to read session token");

            return None;
        }
    };

    let user = match storage.get(USER_KEY) {
        Ok(Some(raw)) => serde_json::from_str(&raw)
            .inspect_err(|err| warn!(error = %err, "discarding malformed user record"))
            .ok(),
        Ok(None) => None,
        Err(err) => {
            warn!(error = %err, "failed to read session user");

            None
        }
    };

    Some(Session { token, user })
}

/// Remove the persisted session.
///
/// # Errors
///
/// Returns an error if the records cannot be removed.
pub fn clear_session<S: KeyValueStore>(storage: &mut S) -> Result<(), StorageError> {
    storage.remove(TOKEN_KEY)?;
    storage.remove(USER_KEY)?;

    Ok(())
}

/// Sign out: drop the session and empty the cart.
///
/// # Errors
///
/// Returns an error if either the session or the cart cannot be cleared.
pub fn logout<S, C>(storage: &mut S, cart: &mut CartStore<C>) -> Result<(), AuthError>
where
    S: KeyValueStore,
    C: KeyValueStore,
{
    clear_session(storage)?;
    cart.clear()?;

    info!("signed out");

    Ok(())
}
