//! Catalog endpoints, including the read-through catalog item projection.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;

use ssv_domain::model::{Catalog, CatalogItem, RoleName};
use ssv_domain::{CatalogItemId, Error, Page, Urn, UrnKind};
use ssv_store::catalogs::NewCatalog;

use crate::api::auth::SessionContext;
use crate::api::error::ApiResult;
use crate::api::pagination::CloudPageQuery;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateCatalogBody {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Target org; defaults to the caller's primary org. System
    /// Administrators must pass it explicitly.
    #[serde(default)]
    pub org_id: Option<Urn>,
    #[serde(default)]
    pub is_published: bool,
}

/// Catalog authorship: System Administrator anywhere; Organization
/// Administrator or Catalog Author inside their own org.
fn can_author_catalogs(ctx: &SessionContext, org: Urn) -> bool {
    if ctx.scope.can_admin_system() {
        return true;
    }
    ctx.scope.org() == Some(org)
        && (matches!(ctx.scope, ssv_auth::Scope::OrgAdmin(_))
            || ctx.user.has_role(RoleName::CatalogAuthor))
}

pub async fn list_catalogs(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    CloudPageQuery(params): CloudPageQuery,
) -> ApiResult<Json<Page<Catalog>>> {
    let (catalogs, total) = state.store.catalogs().list(&ctx.scope, params).await?;
    Ok(Json(Page::new(catalogs, total, params)))
}

pub async fn get_catalog(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(catalog_id): Path<String>,
) -> ApiResult<Json<Catalog>> {
    let urn = Urn::parse_as(UrnKind::Catalog, &catalog_id)?;
    Ok(Json(
        state.store.catalogs().get_visible(urn.id, &ctx.scope).await?,
    ))
}

pub async fn create_catalog(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Json(body): Json<CreateCatalogBody>,
) -> ApiResult<(StatusCode, Json<Catalog>)> {
    let org = match body.org_id {
        Some(org) => org.expect_kind(UrnKind::Org)?,
        None => ctx
            .scope
            .org()
            .ok_or_else(|| Error::validation("orgId is required for system administrators"))?,
    };
    if !can_author_catalogs(&ctx, org) {
        return Err(Error::not_found("organization").into());
    }
    state
        .store
        .orgs()
        .get(org.id)
        .await?
        .ok_or_else(|| Error::not_found("organization"))?;
    if body.name.is_empty() {
        return Err(Error::validation("catalog name must not be empty").into());
    }
    let catalog = state
        .store
        .catalogs()
        .create(NewCatalog {
            org_id: org.id,
            name: body.name,
            description: body.description,
            is_published: body.is_published,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(catalog)))
}

/// Delete refuses while any cluster template still projects into the
/// catalog.
pub async fn delete_catalog(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(catalog_id): Path<String>,
) -> ApiResult<StatusCode> {
    let urn = Urn::parse_as(UrnKind::Catalog, &catalog_id)?;
    let catalog = state.store.catalogs().get_visible(urn.id, &ctx.scope).await?;
    if !can_author_catalogs(&ctx, catalog.org_id) {
        return Err(Error::not_found("catalog").into());
    }
    if state.template_cache.catalog_has_items(urn.id).await? {
        return Err(Error::conflict("catalog still contains templates").into());
    }
    state.store.catalogs().soft_delete(urn.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Catalog items (read-through from the template cache)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn list_catalog_items(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path(catalog_id): Path<String>,
    CloudPageQuery(params): CloudPageQuery,
) -> ApiResult<Json<Page<CatalogItem>>> {
    let urn = Urn::parse_as(UrnKind::Catalog, &catalog_id)?;
    let catalog = state.store.catalogs().get_visible(urn.id, &ctx.scope).await?;
    let page = state.template_cache.list_by_catalog(&catalog, params).await?;
    Ok(Json(page))
}

pub async fn get_catalog_item(
    State(state): State<AppState>,
    Extension(ctx): Extension<SessionContext>,
    Path((catalog_id, item_id)): Path<(String, String)>,
) -> ApiResult<Json<CatalogItem>> {
    let urn = Urn::parse_as(UrnKind::Catalog, &catalog_id)?;
    let catalog = state.store.catalogs().get_visible(urn.id, &ctx.scope).await?;
    let item_id: CatalogItemId = item_id
        .parse()
        .map_err(|_| Error::validation("malformed catalog item id"))?;
    if item_id.catalog != urn.id {
        return Err(Error::not_found("catalog item").into());
    }
    let item = state
        .template_cache
        .get_item(&catalog, &item_id.template)
        .await?
        .ok_or_else(|| Error::not_found("catalog item"))?;
    Ok(Json(item))
}
