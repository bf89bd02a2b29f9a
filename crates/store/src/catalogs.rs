//! Catalog repository. Catalog *items* are never stored; they are projected
//! from cluster templates by the template cache.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use ssv_auth::Scope;
use ssv_domain::model::Catalog;
use ssv_domain::{Error, PageParams, Result, Urn, UrnKind};

use crate::map_db_err;

#[derive(Debug, FromRow)]
struct CatalogRow {
    id: Uuid,
    org_id: Uuid,
    name: String,
    description: String,
    is_published: bool,
    is_subscribed: bool,
    is_local: bool,
    version: i32,
    created_at: DateTime<Utc>,
}

impl From<CatalogRow> for Catalog {
    fn from(r: CatalogRow) -> Catalog {
        Catalog {
            id: Urn::of(UrnKind::Catalog, r.id),
            org_id: Urn::of(UrnKind::Org, r.org_id),
            name: r.name,
            description: r.description,
            is_published: r.is_published,
            is_subscribed: r.is_subscribed,
            is_local: r.is_local,
            version: r.version,
            creation_date: r.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewCatalog {
    pub org_id: Uuid,
    pub name: String,
    pub description: String,
    pub is_published: bool,
}

const CATALOG_COLUMNS: &str = "id, org_id, name, description, is_published, is_subscribed, \
                               is_local, version, created_at";

pub struct CatalogRepo<'a> {
    pub(crate) pool: &'a PgPool,
}

impl CatalogRepo<'_> {
    pub async fn create(&self, new: NewCatalog) -> Result<Catalog> {
        let row: CatalogRow = sqlx::query_as(&format!(
            "INSERT INTO catalogs (id, org_id, name, description, is_published)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {CATALOG_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new.org_id)
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.is_published)
        .fetch_one(self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(row.into())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Catalog>> {
        let row: Option<CatalogRow> = sqlx::query_as(&format!(
            "SELECT {CATALOG_COLUMNS} FROM catalogs WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(row.map(Into::into))
    }

    /// Published catalogs are visible across orgs; private ones only inside
    /// their own org.
    pub async fn get_visible(&self, id: Uuid, scope: &Scope) -> Result<Catalog> {
        let catalog = self
            .get(id)
            .await?
            .ok_or_else(|| Error::not_found("catalog"))?;
        if !catalog.is_published && !scope.can_see_org(catalog.org_id) {
            return Err(Error::not_found("catalog"));
        }
        Ok(catalog)
    }

    pub async fn list(&self, scope: &Scope, params: PageParams) -> Result<(Vec<Catalog>, i64)> {
        let org_filter = scope.org().map(|u| u.id);
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM catalogs
             WHERE deleted_at IS NULL
               AND ($1::uuid IS NULL OR org_id = $1 OR is_published)",
        )
        .bind(org_filter)
        .fetch_one(self.pool)
        .await
        .map_err(map_db_err)?;
        let rows: Vec<CatalogRow> = sqlx::query_as(&format!(
            "SELECT {CATALOG_COLUMNS} FROM catalogs
             WHERE deleted_at IS NULL
               AND ($1::uuid IS NULL OR org_id = $1 OR is_published)
             ORDER BY name ASC LIMIT $2 OFFSET $3"
        ))
        .bind(org_filter)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(self.pool)
        .await
        .map_err(map_db_err)?;
        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    pub async fn soft_delete(&self, id: Uuid) -> Result<()> {
        let updated = sqlx::query(
            "UPDATE catalogs SET deleted_at = now(), updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(self.pool)
        .await
        .map_err(map_db_err)?;
        if updated.rows_affected() == 0 {
            return Err(Error::not_found("catalog"));
        }
        Ok(())
    }
}
