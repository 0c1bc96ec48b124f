//! Identity REST client (email/password accounts).

use std::sync::Mutex;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use smartticket_core::ConsoleConfig;
use smartticket_store::{AuthClient, AuthError, Session};
use tracing::{info, warn};
use url::Url;

use crate::http::{SyncError, TokenCell, check};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountReply {
    local_id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    id_token: String,
}

/// Map an identity error code (`error.message`) to an [`AuthError`].
///
/// Codes may carry a suffix such as `WEAK_PASSWORD : Password should be ...`.
pub fn auth_error_from_code(code: &str) -> AuthError {
    let head = code.split([' ', ':']).next().unwrap_or(code);
    match head {
        "INVALID_LOGIN_CREDENTIALS" | "INVALID_PASSWORD" | "USER_DISABLED" => {
            AuthError::InvalidCredentials
        }
        "EMAIL_NOT_FOUND" => AuthError::UserNotFound,
        "INVALID_EMAIL" | "MISSING_EMAIL" => AuthError::InvalidEmail,
        "EMAIL_EXISTS" => AuthError::EmailInUse,
        "CREDENTIAL_TOO_OLD_LOGIN_AGAIN" | "INVALID_ID_TOKEN" | "TOKEN_EXPIRED" => {
            AuthError::ReauthRequired
        }
        _ => AuthError::Backend(code.to_string()),
    }
}

fn map_error(e: SyncError) -> AuthError {
    match e {
        SyncError::Server { body, .. } => {
            let code = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(str::to_string));
            match code {
                Some(code) => auth_error_from_code(&code),
                None => AuthError::Backend(body),
            }
        }
        other => AuthError::Backend(other.to_string()),
    }
}

/// [`AuthClient`] over the identity REST API.
///
/// Signing in stores the session here and its token in the shared
/// [`TokenCell`] so document and blob requests run as that operator.
pub struct RestAuth {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    token: TokenCell,
    session: Mutex<Option<Session>>,
}

impl RestAuth {
    pub fn new(config: &ConsoleConfig, token: TokenCell) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.identity_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            token,
            session: Mutex::new(None),
        }
    }

    /// URL of an `accounts:<method>` endpoint.
    pub fn endpoint(&self, method: &str) -> Result<Url, SyncError> {
        let mut url = Url::parse(&format!("{}/accounts:{method}", self.base_url))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    async fn call(&self, method: &str, body: Value) -> Result<reqwest::Response, AuthError> {
        let url = self.endpoint(method).map_err(map_error)?;
        let resp = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_error(e.into()))?;
        check(resp).await.map_err(map_error)
    }

    async fn password_sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let resp = self
            .call(
                "signInWithPassword",
                json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;
        let reply: AccountReply = resp
            .json()
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))?;
        Ok(Session {
            uid: reply.local_id,
            email: reply.email,
            id_token: reply.id_token,
        })
    }

    fn store_session(&self, session: Option<Session>) {
        self.token
            .set(session.as_ref().map(|s| s.id_token.clone()));
        *self.session.lock().unwrap_or_else(|p| p.into_inner()) = session;
    }
}

#[async_trait]
impl AuthClient for RestAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let session = self.password_sign_in(email, password).await?;
        info!(uid = %session.uid, "signed in");
        self.store_session(Some(session.clone()));
        Ok(session)
    }

    async fn current_session(&self) -> Option<Session> {
        self.session
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.store_session(None);
        Ok(())
    }

    async fn create_account(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let resp = self
            .call(
                "signUp",
                json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;
        let reply: AccountReply = resp
            .json()
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))?;
        info!(uid = %reply.local_id, "created account");
        Ok(Session {
            uid: reply.local_id,
            email: reply.email,
            id_token: reply.id_token,
        })
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        self.call(
            "sendOobCode",
            json!({ "requestType": "PASSWORD_RESET", "email": email }),
        )
        .await?;
        info!(email, "password reset email sent");
        Ok(())
    }

    async fn change_password(&self, old: &str, new: &str) -> Result<(), AuthError> {
        let current = self.current_session().await.ok_or(AuthError::NoSession)?;
        let fresh = match self.password_sign_in(&current.email, old).await {
            Ok(s) => s,
            Err(AuthError::InvalidCredentials) => return Err(AuthError::ReauthRequired),
            Err(e) => {
                warn!(error = %e, "re-authentication failed");
                return Err(e);
            }
        };
        let resp = self
            .call(
                "update",
                json!({ "idToken": fresh.id_token, "password": new, "returnSecureToken": true }),
            )
            .await?;
        let reply: AccountReply = resp
            .json()
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))?;
        self.store_session(Some(Session {
            uid: reply.local_id,
            email: if reply.email.is_empty() {
                current.email
            } else {
                reply.email
            },
            id_token: reply.id_token,
        }));
        info!("password changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_map_to_auth_errors() {
        assert!(matches!(
            auth_error_from_code("INVALID_LOGIN_CREDENTIALS"),
            AuthError::InvalidCredentials
        ));
        assert!(matches!(
            auth_error_from_code("EMAIL_NOT_FOUND"),
            AuthError::UserNotFound
        ));
        assert!(matches!(
            auth_error_from_code("INVALID_EMAIL"),
            AuthError::InvalidEmail
        ));
        assert!(matches!(
            auth_error_from_code("EMAIL_EXISTS"),
            AuthError::EmailInUse
        ));
        assert!(matches!(
            auth_error_from_code("WEAK_PASSWORD : Password should be at least 6 characters"),
            AuthError::Backend(_)
        ));
    }

    #[test]
    fn server_body_is_parsed_for_code() {
        let err = map_error(SyncError::Server {
            status: 400,
            body: r#"{"error":{"code":400,"message":"EMAIL_NOT_FOUND"}}"#.into(),
        });
        assert!(matches!(err, AuthError::UserNotFound));
    }

    #[test]
    fn endpoint_has_method_and_key() {
        let config = ConsoleConfig {
            api_key: "k".into(),
            ..Default::default()
        };
        let auth = RestAuth::new(&config, TokenCell::default());
        assert_eq!(
            auth.endpoint("signInWithPassword").unwrap().as_str(),
            "https://identitytoolkit.googleapis.com/v1/accounts:signInWithPassword?key=k"
        );
    }

    #[tokio::test]
    async fn change_password_without_session() {
        let auth = RestAuth::new(&ConsoleConfig::default(), TokenCell::default());
        assert!(matches!(
            auth.change_password("a", "b").await,
            Err(AuthError::NoSession)
        ));
    }
}
