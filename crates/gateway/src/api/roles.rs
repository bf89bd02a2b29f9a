//! Read-only role endpoints.

use axum::extract::{Path, State};
use axum::{Extension, Json};

use ssv_domain::model::Role;
use ssv_domain::{Page, Urn, UrnKind};

use crate::api::auth::SessionContext;
use crate::api::error::ApiResult;
use crate::api::pagination::CloudPageQuery;
use crate::state::AppState;

pub async fn list_roles(
    State(state): State<AppState>,
    Extension(_ctx): Extension<SessionContext>,
    CloudPageQuery(params): CloudPageQuery,
) -> ApiResult<Json<Page<Role>>> {
    let (roles, total) = state.store.roles().list(params).await?;
    Ok(Json(Page::new(roles, total, params)))
}

pub async fn get_role(
    State(state): State<AppState>,
    Extension(_ctx): Extension<SessionContext>,
    Path(role_id): Path<String>,
) -> ApiResult<Json<Role>> {
    let urn = Urn::parse_as(UrnKind::Role, &role_id)?;
    Ok(Json(state.store.roles().get(urn.id).await?))
}
