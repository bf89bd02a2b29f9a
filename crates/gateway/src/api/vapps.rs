//! vApp endpoints: instantiate from template, list, read, delete.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;

use ssv_domain::model::{RoleName, VApp, Vm};
use ssv_domain::{CatalogItemId, Error, Page, Urn, UrnKind};

use crate::api::auth::SessionContext;
use crate::api::error::ApiResult;
use crate::api::pagination::CloudPageQuery;
use crate::orchestrator::InstantiateTemplateSpec;
use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// DTOs (lenient: tenant-facing)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstantiateTemplateBody {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub catalog_item: CatalogItemRef,
}

#[derive(Debug, Deserialize)]
pub struct CatalogItemRef {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub force: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Visibility helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The vApp's owning org, via its VDC. Out-of-scope reads as missing.
async fn visible_vapp(state: &AppState, ctx: &SessionContext, id: Urn) -> Result<VApp, Error> {
    let vapp = state
        .store
        .vapps()
        .get(id.id)
        .await?
        .ok_or_else(|| Error::not_found("vApp"))?;
    let vdc = state
        .store
        .vdcs()
        .get(vapp.vdc_id.id)
        .await?
        .ok_or_else(|| Error::not_found("vApp"))?;
    if !ctx.scope.can_see_org(vdc.org_id) {
        return Err(Error::not_found("vApp"));
    }
    Ok(vapp)
}

/// vApp representation with member VMs inlined.
async fn vapp_view(state: &AppState, vapp: &VApp) -> Result<serde_json::Value, Error> {
    let vms: Vec<Vm> = state.store.vms().list_by_vapp(vapp.id.id).await?;
    let mut view = serde_json::to_value(vapp).map_err(|e| Error::Database(e.to_string()))?;
    view["numberOfVMs"] = serde_json::json!(vms.len());
    view["vms"] = serde_json::to_value(&vms).map_err(|e| Error::Database(e.to_string()))?;
    Ok(view)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Handlers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn instantiate_template(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(vdc_id): Path<String>,
    Json(body): Json<InstantiateTemplateBody>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    let vdc_urn = Urn::parse_as(UrnKind::Vdc, &vdc_id)?;
    let vdc = state.store.vdcs().get_visible(vdc_urn.id, &ctx.scope).await?;
    if !ctx.scope.can_admin_system()
        && !matches!(ctx.scope, ssv_auth::Scope::OrgAdmin(_))
        && !ctx.user.has_role(RoleName::VAppAuthor)
    {
        return Err(Error::Forbidden("vApp creation requires vApp Author".into()).into());
    }
    if body.name.is_empty() {
        return Err(Error::validation("vApp name must not be empty").into());
    }
    let catalog_item: CatalogItemId = body
        .catalog_item
        .id
        .parse()
        .map_err(|_| Error::validation("malformed catalog item id"))?;

    let vapp = state
        .orchestrator
        .instantiate_template(
            vdc.id.id,
            InstantiateTemplateSpec {
                name: body.name,
                description: body.description,
                catalog_item,
            },
        )
        .await?;
    let view = vapp_view(&state, &vapp).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn list_vapps(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(vdc_id): Path<String>,
    CloudPageQuery(params): CloudPageQuery,
) -> ApiResult<Json<Page<VApp>>> {
    let vdc_urn = Urn::parse_as(UrnKind::Vdc, &vdc_id)?;
    let vdc = state.store.vdcs().get_visible(vdc_urn.id, &ctx.scope).await?;
    let (vapps, total) = state.store.vapps().list_by_vdc(vdc.id.id, params).await?;
    Ok(Json(Page::new(vapps, total, params)))
}

pub async fn get_vapp(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(vapp_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let urn = Urn::parse_as(UrnKind::VApp, &vapp_id)?;
    let vapp = visible_vapp(&state, &ctx, urn).await?;
    Ok(Json(vapp_view(&state, &vapp).await?))
}

pub async fn delete_vapp(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(vapp_id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> ApiResult<StatusCode> {
    let urn = Urn::parse_as(UrnKind::VApp, &vapp_id)?;
    visible_vapp(&state, &ctx, urn).await?;
    state.orchestrator.delete_vapp(urn.id, query.force).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instantiate_body_is_lenient() {
        // Tenant-facing DTO: unknown fields are ignored, not rejected.
        let json = r#"{
            "name": "my-vapp",
            "catalogItem": { "id": "urn:vcloud:catalogitem:f47ac10b-58cc-4372-a567-0e02b2c3d479:ubuntu" },
            "deploy": true,
            "powerOn": false
        }"#;
        let body: InstantiateTemplateBody = serde_json::from_str(json).unwrap();
        assert_eq!(body.name, "my-vapp");
        assert!(body.description.is_empty());
        let item: ssv_domain::CatalogItemId = body.catalog_item.id.parse().unwrap();
        assert_eq!(item.template, "ubuntu");
    }

    #[test]
    fn delete_query_force_flag() {
        let q: DeleteQuery = serde_json::from_str("{}").unwrap();
        assert!(!q.force);
        let q: DeleteQuery = serde_json::from_str(r#"{ "force": true }"#).unwrap();
        assert!(q.force);
    }
}
