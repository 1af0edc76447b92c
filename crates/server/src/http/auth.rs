use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use deployment::Deployment;
use services::services::auth::AuthError;
use url::form_urlencoded;

use crate::{DeploymentImpl, error::ApiError};

/// Raw bearer token of the authenticated request, kept for sign-out.
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

fn parse_authorization_bearer(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    let (prefix, rest) = trimmed.split_once(' ')?;
    if !prefix.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = rest.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

fn extract_query_token(req: &Request) -> Option<String> {
    let query = req.uri().query()?;
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        if key == "token" {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return None;
            }
            return Some(trimmed.to_string());
        }
    }
    None
}

fn is_sse_events_endpoint(req: &Request) -> bool {
    // EventSource cannot set headers.
    req.uri().path().ends_with("/events")
}

fn extract_request_token(req: &Request) -> Option<String> {
    if let Some(value) = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_authorization_bearer)
    {
        return Some(value.to_string());
    }

    if is_sse_events_endpoint(req) {
        return extract_query_token(req);
    }

    None
}

/// Admits requests carrying a live admin session and exposes it to handlers
/// as `Extension<SessionInfo>`.
pub async fn require_admin_session(
    State(deployment): State<DeploymentImpl>,
    mut req: Request,
    next: Next,
) -> Response {
    let reason = match extract_request_token(&req) {
        None => "missing_token",
        Some(token) => match deployment.auth().current_session(&token).await {
            Ok(session) => {
                req.extensions_mut().insert(session);
                req.extensions_mut().insert(SessionToken(token));
                return next.run(req).await;
            }
            Err(AuthError::SessionNotFound) => "invalid_session",
            Err(err) => return ApiError::from(err).into_response(),
        },
    };

    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|connect_info| connect_info.0.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    tracing::warn!(
        path = %req.uri().path(),
        method = %req.method(),
        peer = %peer,
        reason,
        "Unauthorized API request"
    );

    ApiError::Unauthorized.into_response()
}
