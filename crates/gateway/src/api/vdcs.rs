//! Authenticated read-only VDC view (tenant-facing). Management lives under
//! the admin tree.

use axum::extract::{Path, State};
use axum::{Extension, Json};

use ssv_domain::model::Vdc;
use ssv_domain::{Page, Urn, UrnKind};

use crate::api::auth::SessionContext;
use crate::api::error::ApiResult;
use crate::api::pagination::CloudPageQuery;
use crate::state::AppState;

pub async fn list_vdcs(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    CloudPageQuery(params): CloudPageQuery,
) -> ApiResult<Json<Page<Vdc>>> {
    let (vdcs, total) = state.store.vdcs().list(&ctx.scope, params).await?;
    Ok(Json(Page::new(vdcs, total, params)))
}

pub async fn get_vdc(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(vdc_id): Path<String>,
) -> ApiResult<Json<Vdc>> {
    let urn = Urn::parse_as(UrnKind::Vdc, &vdc_id)?;
    Ok(Json(state.store.vdcs().get_visible(urn.id, &ctx.scope).await?))
}
