//! VM endpoints: read and power transitions.

use axum::extract::{Path, State};
use axum::{Extension, Json};

use ssv_domain::model::{PowerAction, Vm};
use ssv_domain::{Error, Urn, UrnKind};

use crate::api::auth::SessionContext;
use crate::api::error::ApiResult;
use crate::state::AppState;

/// Fetch a VM with the ownership chain (vApp → VDC → org) checked against
/// the caller's scope.
async fn visible_vm(state: &AppState, ctx: &SessionContext, id: Urn) -> Result<Vm, Error> {
    let vm = state
        .store
        .vms()
        .get(id.id)
        .await?
        .ok_or_else(|| Error::not_found("VM"))?;
    let vapp = state
        .store
        .vapps()
        .get(vm.vapp_id.id)
        .await?
        .ok_or_else(|| Error::not_found("VM"))?;
    let vdc = state
        .store
        .vdcs()
        .get(vapp.vdc_id.id)
        .await?
        .ok_or_else(|| Error::not_found("VM"))?;
    if !ctx.scope.can_see_org(vdc.org_id) {
        return Err(Error::not_found("VM"));
    }
    Ok(vm)
}

pub async fn get_vm(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(vm_id): Path<String>,
) -> ApiResult<Json<Vm>> {
    let urn = Urn::parse_as(UrnKind::Vm, &vm_id)?;
    Ok(Json(visible_vm(&state, &ctx, urn).await?))
}

/// `POST /cloudapi/1.0.0/vms/{vmId}/actions/{action}` where action is one of
/// `powerOn`, `powerOff`, `suspend`, `reset`.
pub async fn power_action(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path((vm_id, action)): Path<(String, String)>,
) -> ApiResult<Json<Vm>> {
    let urn = Urn::parse_as(UrnKind::Vm, &vm_id)?;
    let action = PowerAction::parse(&action)
        .ok_or_else(|| Error::validation(format!("unknown power action {action:?}")))?;
    visible_vm(&state, &ctx, urn).await?;
    let vm = state.orchestrator.power_action(urn.id, action).await?;
    Ok(Json(vm))
}
