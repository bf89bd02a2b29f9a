//! Organization endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;

use ssv_domain::model::Organization;
use ssv_domain::{Error, Page, Urn, UrnKind};
use ssv_store::orgs::{NewOrg, OrgPatch};

use crate::api::auth::SessionContext;
use crate::api::error::ApiResult;
use crate::api::pagination::CloudPageQuery;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateOrgBody {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub is_enabled: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateOrgBody {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_enabled: Option<bool>,
}

fn default_true() -> bool {
    true
}

pub async fn list_orgs(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    CloudPageQuery(params): CloudPageQuery,
) -> ApiResult<Json<Page<Organization>>> {
    let (orgs, total) = state.store.orgs().list(&ctx.scope, params).await?;
    Ok(Json(Page::new(orgs, total, params)))
}

pub async fn get_org(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(org_id): Path<String>,
) -> ApiResult<Json<Organization>> {
    let urn = Urn::parse_as(UrnKind::Org, &org_id)?;
    Ok(Json(state.store.orgs().get_visible(urn.id, &ctx.scope).await?))
}

pub async fn create_org(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Json(body): Json<CreateOrgBody>,
) -> ApiResult<(StatusCode, Json<Organization>)> {
    if !ctx.scope.can_admin_system() {
        return Err(Error::Forbidden("org creation requires System Administrator".into()).into());
    }
    if !Organization::name_is_dns_safe(&body.name) {
        return Err(Error::validation(format!(
            "organization name {:?} is not DNS-safe",
            body.name
        ))
        .into());
    }
    let display_name = body.display_name.unwrap_or_else(|| body.name.clone());
    let org = state
        .store
        .orgs()
        .create(NewOrg {
            name: body.name,
            display_name,
            description: body.description,
            is_enabled: body.is_enabled,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(org)))
}

pub async fn update_org(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(org_id): Path<String>,
    Json(body): Json<UpdateOrgBody>,
) -> ApiResult<Json<Organization>> {
    let urn = Urn::parse_as(UrnKind::Org, &org_id)?;
    // Visibility first (404 over 403), then admin rights on the target.
    state.store.orgs().get_visible(urn.id, &ctx.scope).await?;
    if !ctx.scope.can_admin_system() && !matches!(ctx.scope, ssv_auth::Scope::OrgAdmin(o) if o == urn)
    {
        return Err(Error::not_found("organization").into());
    }
    let org = state
        .store
        .orgs()
        .update(
            urn.id,
            OrgPatch {
                display_name: body.display_name,
                description: body.description,
                is_enabled: body.is_enabled,
            },
        )
        .await?;
    Ok(Json(org))
}

pub async fn delete_org(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(org_id): Path<String>,
) -> ApiResult<StatusCode> {
    let urn = Urn::parse_as(UrnKind::Org, &org_id)?;
    if !ctx.scope.can_admin_system() {
        // Hide existence from tenants.
        return Err(Error::not_found("organization").into());
    }
    state.store.orgs().soft_delete(urn.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
