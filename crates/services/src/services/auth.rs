use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use dashmap::{DashMap, mapref::entry::Entry};
use db::{
    DbErr, DbPool,
    models::{
        admin_user::{AdminUser, normalize_email},
        auth_session::AuthSession,
    },
};
use futures::Stream;
use rand::RngCore;
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::broadcast;
use ts_rs::TS;
use uuid::Uuid;

pub const SESSION_TOKEN_BYTES: usize = 32;
const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Session not found or expired")]
    SessionNotFound,
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Password hashing failed: {0}")]
    Hash(String),
}

impl From<bcrypt::BcryptError> for AuthError {
    fn from(err: bcrypt::BcryptError) -> Self {
        AuthError::Hash(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AuthError {
    fn from(err: tokio::task::JoinError) -> Self {
        AuthError::Hash(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthEvent {
    SignedIn { session_id: Uuid },
    SignedOut { session_id: Uuid },
    Expired { session_id: Uuid },
}

impl AuthEvent {
    pub fn session_id(&self) -> Uuid {
        match self {
            AuthEvent::SignedIn { session_id }
            | AuthEvent::SignedOut { session_id }
            | AuthEvent::Expired { session_id } => *session_id,
        }
    }

    /// Whether the session can no longer be used after this event.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AuthEvent::SignedIn { .. })
    }
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct SessionInfo {
    pub session_id: Uuid,
    pub user: AdminUser,
    #[ts(type = "Date")]
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct SignedIn {
    pub token: String,
    pub session: SessionInfo,
}

pub fn generate_session_token() -> String {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn hash_session_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

/// Admin sign-in, session lookup and session-change notifications.
#[derive(Clone)]
pub struct AuthService {
    pool: DbPool,
    session_ttl: Duration,
    hash_cost: u32,
    events: broadcast::Sender<AuthEvent>,
    watchers: Arc<DashMap<Uuid, usize>>,
}

impl AuthService {
    pub fn new(pool: DbPool, session_ttl_hours: u64) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            pool,
            session_ttl: Duration::hours(session_ttl_hours.max(1) as i64),
            hash_cost: bcrypt::DEFAULT_COST,
            events,
            watchers: Arc::new(DashMap::new()),
        }
    }

    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    pub async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let password = password.to_string();
        let cost = self.hash_cost;
        let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
        Ok(hashed)
    }

    async fn verify_password(&self, password: &str, hashed: &str) -> Result<bool, AuthError> {
        let password = password.to_string();
        let hashed = hashed.to_string();
        let valid =
            tokio::task::spawn_blocking(move || bcrypt::verify(password, &hashed)).await??;
        Ok(valid)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignedIn, AuthError> {
        let Some(user) = AdminUser::find_by_email(&self.pool, email).await? else {
            tracing::warn!(email = %normalize_email(email), "Sign-in for unknown admin");
            return Err(AuthError::InvalidCredentials);
        };
        if !self.verify_password(password, &user.password_hash).await? {
            tracing::warn!(email = %user.email, "Sign-in with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = generate_session_token();
        let expires_at = Utc::now() + self.session_ttl;
        let session =
            AuthSession::create(&self.pool, user.row_id, &hash_session_token(&token), expires_at)
                .await?;

        tracing::info!(session_id = %session.id, email = %user.email, "Admin signed in");
        self.publish(AuthEvent::SignedIn {
            session_id: session.id,
        });

        Ok(SignedIn {
            token,
            session: SessionInfo {
                session_id: session.id,
                user,
                expires_at: session.expires_at,
            },
        })
    }

    pub async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        let session = AuthSession::find_active_by_hash(
            &self.pool,
            &hash_session_token(token),
            Utc::now(),
        )
        .await?
        .ok_or(AuthError::SessionNotFound)?;

        if AuthSession::revoke(&self.pool, session.id, Utc::now()).await? {
            tracing::info!(session_id = %session.id, "Admin signed out");
            self.publish(AuthEvent::SignedOut {
                session_id: session.id,
            });
        }
        Ok(())
    }

    /// Session behind `token` if it is neither revoked nor expired.
    pub async fn current_session(&self, token: &str) -> Result<SessionInfo, AuthError> {
        let session = AuthSession::find_active_by_hash(
            &self.pool,
            &hash_session_token(token),
            Utc::now(),
        )
        .await?
        .ok_or(AuthError::SessionNotFound)?;
        let user = AdminUser::find_by_row_id(&self.pool, session.user_id)
            .await?
            .ok_or(AuthError::SessionNotFound)?;
        Ok(SessionInfo {
            session_id: session.id,
            user,
            expires_at: session.expires_at,
        })
    }

    /// Drops sessions past their expiry and announces each one.
    pub async fn expire_stale(&self) -> Result<usize, AuthError> {
        let expired = AuthSession::purge_expired(&self.pool, Utc::now()).await?;
        for session_id in &expired {
            self.publish(AuthEvent::Expired {
                session_id: *session_id,
            });
        }
        if !expired.is_empty() {
            tracing::info!(count = expired.len(), "Expired admin sessions");
        }
        Ok(expired.len())
    }

    /// Creates the first admin account from the given credentials when the
    /// store has none yet.
    pub async fn ensure_bootstrap_admin(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<AdminUser>, AuthError> {
        if AdminUser::count(&self.pool).await? > 0 {
            return Ok(None);
        }
        let password_hash = self.hash_password(password).await?;
        let user = AdminUser::create(&self.pool, email, &password_hash, None).await?;
        tracing::info!(email = %user.email, "Created bootstrap admin account");
        Ok(Some(user))
    }

    pub fn subscribe(&self, session_id: Uuid) -> SessionWatch {
        *self.watchers.entry(session_id).or_insert(0) += 1;
        SessionWatch {
            session_id,
            receiver: self.events.subscribe(),
            watchers: self.watchers.clone(),
        }
    }

    pub fn watcher_count(&self, session_id: Uuid) -> usize {
        self.watchers
            .get(&session_id)
            .map(|count| *count)
            .unwrap_or(0)
    }

    fn publish(&self, event: AuthEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }
}

/// Registration of one observer for one session. Dropping it unregisters.
pub struct SessionWatch {
    session_id: Uuid,
    receiver: broadcast::Receiver<AuthEvent>,
    watchers: Arc<DashMap<Uuid, usize>>,
}

impl SessionWatch {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Next event for the watched session; `None` once the service is gone.
    pub async fn next_event(&mut self) -> Option<AuthEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.session_id() == self.session_id => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, session_id = %self.session_id, "Session watch lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Events for the watched session, ending after the first terminal one.
    pub fn into_stream(self) -> impl Stream<Item = AuthEvent> + Send + 'static {
        futures::stream::unfold(Some(self), |watch| async move {
            let mut watch = watch?;
            let event = watch.next_event().await?;
            let next = if event.is_terminal() { None } else { Some(watch) };
            Some((event, next))
        })
    }
}

impl Drop for SessionWatch {
    fn drop(&mut self) {
        if let Entry::Occupied(mut entry) = self.watchers.entry(self.session_id) {
            *entry.get_mut() -= 1;
            if *entry.get() == 0 {
                entry.remove();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use db::DBService;
    use futures::StreamExt;

    use super::*;

    async fn setup() -> AuthService {
        let db = DBService::connect("sqlite::memory:").await.unwrap();
        let auth = AuthService::new(db.pool, 1).with_hash_cost(4);
        auth.ensure_bootstrap_admin("Admin@Caritas.org", "segredo123")
            .await
            .unwrap();
        auth
    }

    #[test]
    fn tokens_are_url_safe_and_hashed() {
        let token = generate_session_token();
        assert_eq!(token.len(), 43);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        let hashed = hash_session_token(&token);
        assert_eq!(hashed.len(), 64);
        assert_ne!(hashed, token);
        assert_ne!(generate_session_token(), token);
    }

    #[tokio::test]
    async fn sign_in_then_out() {
        let auth = setup().await;

        let err = auth
            .sign_in("admin@caritas.org", "errada")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        let signed_in = auth
            .sign_in("admin@caritas.org", "segredo123")
            .await
            .unwrap();
        let current = auth.current_session(&signed_in.token).await.unwrap();
        assert_eq!(current.session_id, signed_in.session.session_id);
        assert_eq!(current.user.email, "admin@caritas.org");

        auth.sign_out(&signed_in.token).await.unwrap();
        assert!(matches!(
            auth.current_session(&signed_in.token).await,
            Err(AuthError::SessionNotFound)
        ));
    }

    #[tokio::test]
    async fn bootstrap_runs_once() {
        let auth = setup().await;
        let again = auth
            .ensure_bootstrap_admin("outro@caritas.org", "x")
            .await
            .unwrap();
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn watch_receives_sign_out_and_unregisters_on_drop() {
        let auth = setup().await;
        let signed_in = auth
            .sign_in("admin@caritas.org", "segredo123")
            .await
            .unwrap();
        let session_id = signed_in.session.session_id;

        let watch = auth.subscribe(session_id);
        let other = auth.subscribe(Uuid::new_v4());
        assert_eq!(auth.watcher_count(session_id), 1);

        auth.sign_out(&signed_in.token).await.unwrap();
        let events: Vec<AuthEvent> = watch.into_stream().collect().await;
        assert_eq!(events, vec![AuthEvent::SignedOut { session_id }]);
        assert_eq!(auth.watcher_count(session_id), 0);

        drop(other);
        assert!(auth.watchers.is_empty());
    }

    #[tokio::test]
    async fn expire_stale_announces_expired_sessions() {
        let auth = setup().await;
        let user = AdminUser::find_by_email(&auth.pool, "admin@caritas.org")
            .await
            .unwrap()
            .unwrap();
        let stale = AuthSession::create(
            &auth.pool,
            user.row_id,
            &hash_session_token("stale"),
            Utc::now() - Duration::minutes(1),
        )
        .await
        .unwrap();

        let mut watch = auth.subscribe(stale.id);
        assert_eq!(auth.expire_stale().await.unwrap(), 1);
        assert_eq!(
            watch.next_event().await,
            Some(AuthEvent::Expired {
                session_id: stale.id
            })
        );
    }
}
