//! User management endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;

use ssv_domain::model::User;
use ssv_domain::{Error, Page, Urn, UrnKind};
use ssv_store::users::{NewUser, UserPatch};

use crate::api::auth::SessionContext;
use crate::api::error::ApiResult;
use crate::api::pagination::CloudPageQuery;
use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// DTOs (strict: admin-facing)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateUserBody {
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    pub password: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub primary_org_id: Option<Urn>,
    /// Role URNs from `GET /cloudapi/1.0.0/roles`.
    #[serde(default)]
    pub roles: Vec<Urn>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateUserBody {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default, with = "double_option")]
    pub primary_org_id: Option<Option<Urn>>,
    #[serde(default)]
    pub roles: Option<Vec<Urn>>,
}

fn default_true() -> bool {
    true
}

/// Distinguish "field absent" from "field null" for nullable updates.
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(de).map(Some)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Handlers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn list_users(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    CloudPageQuery(params): CloudPageQuery,
) -> ApiResult<Json<Page<User>>> {
    let (users, total) = state.store.users().list(&ctx.scope, params).await?;
    Ok(Json(Page::new(users, total, params)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<User>> {
    let urn = Urn::parse_as(UrnKind::User, &user_id)?;
    let user = state.store.users().get_visible(urn.id, &ctx.scope).await?;
    Ok(Json(user))
}

pub async fn create_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Json(body): Json<CreateUserBody>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let target_org = body.primary_org_id;
    authorize_user_admin(&ctx, target_org)?;
    if body.username.is_empty() {
        return Err(Error::validation("username must not be empty").into());
    }
    if let Some(org) = target_org {
        let org = org.expect_kind(UrnKind::Org)?;
        state
            .store
            .orgs()
            .get(org.id)
            .await?
            .ok_or_else(|| Error::not_found("organization"))?;
    }
    let mut role_ids = Vec::new();
    for role_urn in &body.roles {
        let urn = role_urn.expect_kind(UrnKind::Role)?;
        state.store.roles().get(urn.id).await?;
        role_ids.push(urn.id);
    }
    let password_hash = if body.password.is_empty() {
        String::new()
    } else {
        ssv_auth::hash_password(&body.password)?
    };
    let user = state
        .store
        .users()
        .create(NewUser {
            username: body.username,
            full_name: body.full_name,
            email: body.email,
            enabled: body.enabled,
            password_hash,
            primary_org_id: target_org.map(|u| u.id),
            role_ids,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(user_id): Path<String>,
    Json(body): Json<UpdateUserBody>,
) -> ApiResult<Json<User>> {
    let urn = Urn::parse_as(UrnKind::User, &user_id)?;
    let existing = state.store.users().get_visible(urn.id, &ctx.scope).await?;
    authorize_user_admin(&ctx, existing.primary_org_id)?;

    let mut role_ids = None;
    if let Some(roles) = &body.roles {
        let mut ids = Vec::new();
        for role_urn in roles {
            let role = role_urn.expect_kind(UrnKind::Role)?;
            state.store.roles().get(role.id).await?;
            ids.push(role.id);
        }
        role_ids = Some(ids);
    }
    let password_hash = body
        .password
        .as_deref()
        .map(ssv_auth::hash_password)
        .transpose()?;
    let user = state
        .store
        .users()
        .update(
            urn.id,
            UserPatch {
                full_name: body.full_name,
                email: body.email,
                enabled: body.enabled,
                password_hash,
                primary_org_id: body.primary_org_id.map(|o| o.map(|u| u.id)),
                role_ids,
            },
        )
        .await?;
    Ok(Json(user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(user_id): Path<String>,
) -> ApiResult<StatusCode> {
    let urn = Urn::parse_as(UrnKind::User, &user_id)?;
    if urn == ctx.user.id {
        return Err(Error::conflict("users cannot delete themselves").into());
    }
    let existing = state.store.users().get_visible(urn.id, &ctx.scope).await?;
    authorize_user_admin(&ctx, existing.primary_org_id)?;
    state.store.users().soft_delete(urn.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// User administration requires System Administrator, or Organization
/// Administrator over the target user's org. Violations read as 404 so the
/// probe cannot distinguish "exists" from "forbidden".
fn authorize_user_admin(ctx: &SessionContext, target_org: Option<Urn>) -> Result<(), Error> {
    if ctx.scope.can_admin_system() {
        return Ok(());
    }
    match (ctx.scope, target_org) {
        (ssv_auth::Scope::OrgAdmin(own), Some(org)) if own == org => Ok(()),
        _ => Err(Error::not_found("user")),
    }
}
