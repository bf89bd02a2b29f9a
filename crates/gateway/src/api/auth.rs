//! Bearer-token authentication middleware.
//!
//! Verifies the signed session token, re-loads the user (so disabled or
//! deleted accounts lose access immediately), derives the effective scope and
//! attaches a [`SessionContext`] extension for handlers.

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use ssv_auth::Scope;
use ssv_domain::model::User;
use ssv_domain::{Error, Urn};

use crate::api::error::ApiError;
use crate::state::AppState;

/// Verified request identity, available to every protected handler.
#[derive(Clone)]
pub struct SessionContext {
    pub user: User,
    pub scope: Scope,
    pub session_id: Urn,
}

/// Axum middleware enforcing bearer authentication on protected routes.
/// Attach via `axum::middleware::from_fn_with_state`.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match authenticate(&state, req.headers()).await {
        Ok(ctx) => {
            req.extensions_mut().insert(ctx);
            next.run(req).await
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<SessionContext, Error> {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| Error::Authentication("missing bearer token".into()))?;

    let claims = state.signer.verify(token)?;
    let user_urn = claims.user_urn()?;
    let session_id = claims.session_urn()?;

    let user = state
        .store
        .users()
        .get(user_urn.id)
        .await?
        .ok_or_else(|| Error::Authentication("user no longer exists".into()))?;
    if !user.enabled {
        return Err(Error::Authentication("user is disabled".into()));
    }
    let scope = Scope::for_user(&user)?;

    Ok(SessionContext {
        user,
        scope,
        session_id,
    })
}
