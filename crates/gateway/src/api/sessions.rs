//! Session endpoints: Basic-auth login, self-session read, logout.

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use base64::Engine as _;

use ssv_domain::model::User;
use ssv_domain::{Error, Urn, UrnKind};

use crate::api::auth::SessionContext;
use crate::api::error::{ApiError, ApiResult};
use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /cloudapi/1.0.0/sessions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Login with `Authorization: Basic <b64(user:pass)>`. The session payload
/// is returned in the body and the bearer token in the response
/// `Authorization` header, Cloud Director style.
pub async fn login(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    let (username, password) = parse_basic(&headers)?;

    let record = state
        .store
        .users()
        .get_record_by_username(&username)
        .await?
        .ok_or_else(|| Error::Authentication("bad username or password".into()))?;
    if !ssv_auth::verify_password(&password, &record.password_hash) {
        return Err(Error::Authentication("bad username or password".into()).into());
    }
    if !record.user.enabled {
        return Err(Error::Authentication("user is disabled".into()).into());
    }

    let session_id = Urn::random(UrnKind::Session);
    let token = state
        .signer
        .mint(record.user.id, &record.user.username, session_id)?;

    let body = session_view(&state, &record.user, session_id).await?;
    let mut response = (StatusCode::OK, Json(body)).into_response();
    response.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {token}")
            .parse()
            .map_err(|_| ApiError::bad_request("token not header-safe"))?,
    );
    Ok(response)
}

fn parse_basic(headers: &HeaderMap) -> Result<(String, String), ApiError> {
    let raw = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Basic "))
        .ok_or_else(|| {
            ApiError::from(Error::Authentication("expected Basic authorization".into()))
        })?;
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(raw)
        .map_err(|_| ApiError::from(Error::Authentication("malformed Basic credentials".into())))?;
    let decoded = String::from_utf8(decoded)
        .map_err(|_| ApiError::from(Error::Authentication("malformed Basic credentials".into())))?;
    let (user, pass) = decoded
        .split_once(':')
        .ok_or_else(|| ApiError::from(Error::Authentication("malformed Basic credentials".into())))?;
    Ok((user.to_owned(), pass.to_owned()))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET / DELETE /cloudapi/1.0.0/sessions/{sessionId}
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Read the caller's own session. Accessing any other session id is a 403
/// (the one place scope violations are not masked as 404).
pub async fn get_session(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let requested = Urn::parse_as(UrnKind::Session, &session_id)?;
    if requested != ctx.session_id {
        return Err(Error::Forbidden("session belongs to another principal".into()).into());
    }
    Ok(Json(session_view(&state, &ctx.user, ctx.session_id).await?))
}

/// Logout. Tokens are stateless, so this validates ownership and lets the
/// client discard the token; the id check keeps the 403 contract.
pub async fn logout(
    Extension(ctx): Extension<SessionContext>,
    Path(session_id): Path<String>,
) -> ApiResult<StatusCode> {
    let requested = Urn::parse_as(UrnKind::Session, &session_id)?;
    if requested != ctx.session_id {
        return Err(Error::Forbidden("session belongs to another principal".into()).into());
    }
    Ok(StatusCode::NO_CONTENT)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session payload
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

async fn session_view(
    state: &AppState,
    user: &User,
    session_id: Urn,
) -> Result<serde_json::Value, Error> {
    let org = match user.primary_org_id {
        Some(org_urn) => state.store.orgs().get(org_urn.id).await?,
        None => None,
    };
    let roles: Vec<&str> = user.roles.iter().map(|r| r.name.as_str()).collect();
    Ok(serde_json::json!({
        "id": session_id,
        "site": {
            "name": state.config.session.site.name,
            "id": state.site_id,
        },
        "user": { "name": user.username, "id": user.id },
        "org": org.map(|o| serde_json::json!({ "name": o.name, "id": o.id })),
        "location": state.config.session.location,
        "roles": roles,
        "sessionIdleTimeoutMinutes": state.config.session.idle_timeout_minutes,
    }))
}
