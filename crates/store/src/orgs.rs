//! Organization repository.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use ssv_auth::Scope;
use ssv_domain::model::Organization;
use ssv_domain::{Error, PageParams, Result, Urn, UrnKind};

use crate::map_db_err;

#[derive(Debug, FromRow)]
struct OrgRow {
    id: Uuid,
    name: String,
    display_name: String,
    description: String,
    is_enabled: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrgRow> for Organization {
    fn from(r: OrgRow) -> Organization {
        Organization {
            id: Urn::of(UrnKind::Org, r.id),
            name: r.name,
            display_name: r.display_name,
            description: r.description,
            is_enabled: r.is_enabled,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewOrg {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub is_enabled: bool,
}

#[derive(Debug, Clone, Default)]
pub struct OrgPatch {
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub is_enabled: Option<bool>,
}

pub struct OrgRepo<'a> {
    pub(crate) pool: &'a PgPool,
}

impl OrgRepo<'_> {
    pub async fn create(&self, new: NewOrg) -> Result<Organization> {
        let row: OrgRow = sqlx::query_as(
            "INSERT INTO organizations (id, name, display_name, description, is_enabled)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, name, display_name, description, is_enabled, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(&new.name)
        .bind(&new.display_name)
        .bind(&new.description)
        .bind(new.is_enabled)
        .fetch_one(self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(row.into())
    }

    /// Live row by id, no visibility filtering. Orchestrator-internal.
    pub async fn get(&self, id: Uuid) -> Result<Option<Organization>> {
        let row: Option<OrgRow> = sqlx::query_as(
            "SELECT id, name, display_name, description, is_enabled, created_at, updated_at
             FROM organizations WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(row.map(Into::into))
    }

    /// Scoped fetch: an out-of-scope org is indistinguishable from a missing
    /// one.
    pub async fn get_visible(&self, id: Uuid, scope: &Scope) -> Result<Organization> {
        if !scope.can_see_org(Urn::of(UrnKind::Org, id)) {
            return Err(Error::not_found("organization"));
        }
        self.get(id)
            .await?
            .ok_or_else(|| Error::not_found("organization"))
    }

    pub async fn list(
        &self,
        scope: &Scope,
        params: PageParams,
    ) -> Result<(Vec<Organization>, i64)> {
        let org_filter = scope.org().map(|u| u.id);
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM organizations
             WHERE deleted_at IS NULL AND ($1::uuid IS NULL OR id = $1)",
        )
        .bind(org_filter)
        .fetch_one(self.pool)
        .await
        .map_err(map_db_err)?;
        let rows: Vec<OrgRow> = sqlx::query_as(
            "SELECT id, name, display_name, description, is_enabled, created_at, updated_at
             FROM organizations
             WHERE deleted_at IS NULL AND ($1::uuid IS NULL OR id = $1)
             ORDER BY name ASC LIMIT $2 OFFSET $3",
        )
        .bind(org_filter)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(self.pool)
        .await
        .map_err(map_db_err)?;
        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    pub async fn update(&self, id: Uuid, patch: OrgPatch) -> Result<Organization> {
        let row: Option<OrgRow> = sqlx::query_as(
            "UPDATE organizations SET
                 display_name = COALESCE($2, display_name),
                 description = COALESCE($3, description),
                 is_enabled = COALESCE($4, is_enabled),
                 updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING id, name, display_name, description, is_enabled, created_at, updated_at",
        )
        .bind(id)
        .bind(patch.display_name)
        .bind(patch.description)
        .bind(patch.is_enabled)
        .fetch_optional(self.pool)
        .await
        .map_err(map_db_err)?;
        row.map(Into::into)
            .ok_or_else(|| Error::not_found("organization"))
    }

    /// Soft delete, refused while any live child (user, VDC, catalog) exists.
    pub async fn soft_delete(&self, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;
        let children: i64 = sqlx::query_scalar(
            "SELECT
                 (SELECT COUNT(*) FROM users
                      WHERE primary_org_id = $1 AND deleted_at IS NULL)
               + (SELECT COUNT(*) FROM vdcs
                      WHERE org_id = $1 AND deleted_at IS NULL)
               + (SELECT COUNT(*) FROM catalogs
                      WHERE org_id = $1 AND deleted_at IS NULL)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_err)?;
        if children > 0 {
            return Err(Error::conflict(
                "organization still has users, VDCs or catalogs",
            ));
        }
        let updated = sqlx::query(
            "UPDATE organizations SET deleted_at = now(), updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(map_db_err)?;
        if updated.rows_affected() == 0 {
            return Err(Error::not_found("organization"));
        }
        tx.commit().await.map_err(map_db_err)?;
        Ok(())
    }
}
