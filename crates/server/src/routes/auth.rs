use std::convert::Infallible;

use axum::{
    Extension, Json, Router,
    extract::State,
    middleware::from_fn_with_state,
    response::{
        IntoResponse, Json as ResponseJson, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use deployment::Deployment;
use futures_util::{StreamExt, stream};
use serde::Deserialize;
use services::services::auth::{AuthError, AuthEvent, SessionInfo, SignedIn};
use utils_core::response::ApiResponse;

use crate::{
    DeploymentImpl,
    error::ApiError,
    http::auth::{SessionToken, require_admin_session},
};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

fn event_name(event: &AuthEvent) -> &'static str {
    match event {
        AuthEvent::SignedIn { .. } => "signed_in",
        AuthEvent::SignedOut { .. } => "signed_out",
        AuthEvent::Expired { .. } => "expired",
    }
}

fn to_sse_event(name: &'static str, payload: &impl serde::Serialize) -> Event {
    Event::default()
        .event(name)
        .json_data(payload)
        .unwrap_or_else(|err| {
            tracing::warn!(error = %err, "Failed to encode session event");
            Event::default().event(name)
        })
}

pub async fn login(
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<LoginRequest>,
) -> Result<ResponseJson<ApiResponse<SignedIn>>, ApiError> {
    let signed_in = deployment
        .auth()
        .sign_in(&payload.email, &payload.password)
        .await?;
    Ok(ResponseJson(ApiResponse::success(signed_in)))
}

pub async fn logout(
    State(deployment): State<DeploymentImpl>,
    Extension(SessionToken(token)): Extension<SessionToken>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    deployment.auth().sign_out(&token).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn current_session(
    Extension(session): Extension<SessionInfo>,
) -> ResponseJson<ApiResponse<SessionInfo>> {
    ResponseJson(ApiResponse::success(session))
}

/// Streams the caller's own session changes. The first event is the
/// session snapshot; the stream ends after sign-out or expiry.
pub async fn session_events(
    State(deployment): State<DeploymentImpl>,
    Extension(SessionToken(token)): Extension<SessionToken>,
    Extension(session): Extension<SessionInfo>,
) -> Result<Response, ApiError> {
    let watch = deployment.auth().subscribe(session.session_id);

    // Subscribed before the re-check, so no terminal event falls between them.
    let session = match deployment.auth().current_session(&token).await {
        Ok(current) => current,
        Err(AuthError::SessionNotFound) => {
            drop(watch);
            tracing::debug!(
                session_id = %session.session_id,
                "Session ended before observer attached"
            );
            return Ok(Sse::new(stream::empty::<Result<Event, Infallible>>().boxed()).into_response());
        }
        Err(err) => return Err(err.into()),
    };
    tracing::debug!(session_id = %session.session_id, "Session observer connected");

    let snapshot = stream::once(async move { to_sse_event("session", &session) });
    let changes = watch
        .into_stream()
        .map(|event| to_sse_event(event_name(&event), &event));

    Ok(Sse::new(snapshot.chain(changes).map(Ok::<Event, Infallible>).boxed())
        .keep_alive(KeepAlive::default())
        .into_response())
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let protected = Router::new()
        .route("/session", get(current_session))
        .route("/logout", post(logout))
        .route("/events", get(session_events))
        .route_layer(from_fn_with_state(
            deployment.clone(),
            require_admin_session,
        ));

    let inner = Router::new().route("/login", post(login)).merge(protected);

    Router::new().nest("/auth", inner)
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use test_support::TestEnvGuard;

    use super::*;

    #[tokio::test]
    async fn events_for_a_session_closed_before_subscribing_end_immediately() {
        let _env_guard = TestEnvGuard::new();
        let deployment = DeploymentImpl::new().await.unwrap();
        let auth = deployment.auth().clone();
        auth.ensure_bootstrap_admin("admin@caritas.org", "senha-forte")
            .await
            .unwrap();
        let signed_in = auth.sign_in("admin@caritas.org", "senha-forte").await.unwrap();
        let session_id = signed_in.session.session_id;
        auth.sign_out(&signed_in.token).await.unwrap();

        let sse = session_events(
            State(deployment.clone()),
            Extension(SessionToken(signed_in.token)),
            Extension(signed_in.session),
        )
        .await
        .unwrap();

        let body = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            to_bytes(sse.into_response().into_body(), usize::MAX),
        )
        .await
        .expect("stream for a closed session should end")
        .unwrap();
        assert!(body.is_empty());
        assert_eq!(auth.watcher_count(session_id), 0);
    }
}
