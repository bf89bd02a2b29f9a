//! Admin VDC management under `/api/admin/org/{orgId}/vdcs`.
//!
//! The only surviving `/api` tree: System Administrators manage any org,
//! Organization Administrators their own. Out-of-scope orgs read as 404.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;

use ssv_domain::model::{AllocationModel, ComputeCapacity, Vdc};
use ssv_domain::{Error, Page, Urn, UrnKind};
use ssv_store::vdcs::VdcPatch;

use crate::api::auth::SessionContext;
use crate::api::error::ApiResult;
use crate::api::pagination::AdminPageQuery;
use crate::orchestrator::VdcSpec;
use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// DTOs (strict: admin-facing)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateVdcBody {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub allocation_model: String,
    #[serde(default)]
    pub compute_capacity: Option<ComputeCapacity>,
    #[serde(default)]
    pub provider_vdc_name: Option<String>,
    #[serde(default = "d_nic_quota")]
    pub nic_quota: i32,
    #[serde(default = "d_network_quota")]
    pub network_quota: i32,
    #[serde(default)]
    pub is_thin_provision: bool,
    #[serde(default = "d_true")]
    pub is_enabled: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateVdcBody {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub compute_capacity: Option<ComputeCapacity>,
    #[serde(default)]
    pub nic_quota: Option<i32>,
    #[serde(default)]
    pub network_quota: Option<i32>,
    #[serde(default)]
    pub is_thin_provision: Option<bool>,
    #[serde(default)]
    pub is_enabled: Option<bool>,
}

fn d_nic_quota() -> i32 {
    100
}
fn d_network_quota() -> i32 {
    50
}
fn d_true() -> bool {
    true
}

/// Resolve + authorize the org segment. Out-of-scope reads as 404.
async fn admin_org(state: &AppState, ctx: &SessionContext, org_id: &str) -> Result<Urn, Error> {
    let urn = Urn::parse_as(UrnKind::Org, org_id)?;
    if !ctx.scope.can_admin_vdcs(urn) {
        return Err(Error::not_found("organization"));
    }
    state
        .store
        .orgs()
        .get(urn.id)
        .await?
        .ok_or_else(|| Error::not_found("organization"))?;
    Ok(urn)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Handlers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn list_vdcs(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(org_id): Path<String>,
    AdminPageQuery(params): AdminPageQuery,
) -> ApiResult<Json<Page<Vdc>>> {
    let org = admin_org(&state, &ctx, &org_id).await?;
    let (vdcs, total) = state.store.vdcs().list_by_org(org.id, params).await?;
    Ok(Json(Page::new(vdcs, total, params)))
}

pub async fn get_vdc(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path((org_id, vdc_id)): Path<(String, String)>,
) -> ApiResult<Json<Vdc>> {
    let org = admin_org(&state, &ctx, &org_id).await?;
    let urn = Urn::parse_as(UrnKind::Vdc, &vdc_id)?;
    let vdc = state
        .store
        .vdcs()
        .get(urn.id)
        .await?
        .filter(|v| v.org_id == org)
        .ok_or_else(|| Error::not_found("VDC"))?;
    Ok(Json(vdc))
}

pub async fn create_vdc(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(org_id): Path<String>,
    Json(body): Json<CreateVdcBody>,
) -> ApiResult<(StatusCode, Json<Vdc>)> {
    let org = admin_org(&state, &ctx, &org_id).await?;
    if body.name.is_empty() {
        return Err(Error::validation("VDC name must not be empty").into());
    }
    let allocation_model = AllocationModel::parse(&body.allocation_model).ok_or_else(|| {
        Error::validation(format!("unknown allocation model {:?}", body.allocation_model))
    })?;
    let vdc = state
        .orchestrator
        .create_vdc(
            org.id,
            VdcSpec {
                name: body.name,
                description: body.description,
                allocation_model,
                compute_capacity: body.compute_capacity.unwrap_or_default(),
                provider_vdc_name: body.provider_vdc_name.unwrap_or_default(),
                nic_quota: body.nic_quota,
                network_quota: body.network_quota,
                is_thin_provision: body.is_thin_provision,
                is_enabled: body.is_enabled,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(vdc)))
}

pub async fn update_vdc(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path((org_id, vdc_id)): Path<(String, String)>,
    Json(body): Json<UpdateVdcBody>,
) -> ApiResult<Json<Vdc>> {
    let org = admin_org(&state, &ctx, &org_id).await?;
    let urn = Urn::parse_as(UrnKind::Vdc, &vdc_id)?;
    state
        .store
        .vdcs()
        .get(urn.id)
        .await?
        .filter(|v| v.org_id == org)
        .ok_or_else(|| Error::not_found("VDC"))?;
    let vdc = state
        .store
        .vdcs()
        .update(
            urn.id,
            VdcPatch {
                description: body.description,
                compute_capacity: body.compute_capacity,
                nic_quota: body.nic_quota,
                network_quota: body.network_quota,
                is_thin_provision: body.is_thin_provision,
                is_enabled: body.is_enabled,
            },
        )
        .await?;
    Ok(Json(vdc))
}

pub async fn delete_vdc(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path((org_id, vdc_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let org = admin_org(&state, &ctx, &org_id).await?;
    let urn = Urn::parse_as(UrnKind::Vdc, &vdc_id)?;
    state
        .store
        .vdcs()
        .get(urn.id)
        .await?
        .filter(|v| v.org_id == org)
        .ok_or_else(|| Error::not_found("VDC"))?;
    state.orchestrator.delete_vdc(urn.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_body_is_strict() {
        let json = r#"{
            "name": "VDC-0",
            "allocationModel": "PayAsYouGo",
            "computeCapacity": {
                "cpu": { "allocated": 2000, "limit": 4000, "units": "MHz" },
                "memory": { "allocated": 4096, "limit": 8192, "units": "MB" }
            }
        }"#;
        let body: CreateVdcBody = serde_json::from_str(json).unwrap();
        assert_eq!(body.name, "VDC-0");
        assert_eq!(body.nic_quota, 100);
        assert!(body.is_enabled);
        let cap = body.compute_capacity.unwrap();
        assert_eq!(cap.cpu.limit, 4000);

        // Admin DTOs reject unknown fields.
        let json = r#"{ "name": "x", "allocationModel": "Flex", "nicQuotaa": 3 }"#;
        assert!(serde_json::from_str::<CreateVdcBody>(json).is_err());
    }

    #[test]
    fn update_body_fields_are_optional() {
        let body: UpdateVdcBody = serde_json::from_str(r#"{ "isEnabled": false }"#).unwrap();
        assert_eq!(body.is_enabled, Some(false));
        assert!(body.description.is_none());
        assert!(body.compute_capacity.is_none());
    }
}
