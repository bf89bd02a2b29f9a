//! vApp repository. Deletion cascades to member VM rows inside a single
//! transaction; the store is authoritative even when cluster cleanup lags.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use ssv_domain::model::{VApp, VAppStatus, VmStatus};
use ssv_domain::{CatalogItemId, Error, PageParams, Result, Urn, UrnKind};

use crate::map_db_err;

#[derive(Debug, FromRow)]
struct VAppRow {
    id: Uuid,
    vdc_id: Uuid,
    name: String,
    description: String,
    status: String,
    template_ref: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl VAppRow {
    fn into_domain(self) -> Result<VApp> {
        let status = VAppStatus::parse(&self.status)
            .ok_or_else(|| Error::Database(format!("unknown vApp status {:?}", self.status)))?;
        let template_ref = self
            .template_ref
            .as_deref()
            .map(str::parse::<CatalogItemId>)
            .transpose()
            .map_err(|_| Error::Database("malformed template ref in store".into()))?;
        Ok(VApp {
            id: Urn::of(UrnKind::VApp, self.id),
            vdc_id: Urn::of(UrnKind::Vdc, self.vdc_id),
            name: self.name,
            description: self.description,
            status,
            template_ref,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewVApp {
    pub vdc_id: Uuid,
    pub name: String,
    pub description: String,
    pub template_ref: CatalogItemId,
}

const VAPP_COLUMNS: &str =
    "id, vdc_id, name, description, status, template_ref, created_at, updated_at";

pub struct VAppRepo<'a> {
    pub(crate) pool: &'a PgPool,
}

impl VAppRepo<'_> {
    pub async fn create(&self, new: NewVApp) -> Result<VApp> {
        let row: VAppRow = sqlx::query_as(&format!(
            "INSERT INTO vapps (id, vdc_id, name, description, status, template_ref)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {VAPP_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new.vdc_id)
        .bind(&new.name)
        .bind(&new.description)
        .bind(VAppStatus::Instantiating.as_str())
        .bind(new.template_ref.to_string())
        .fetch_one(self.pool)
        .await
        .map_err(map_db_err)?;
        row.into_domain()
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<VApp>> {
        let row: Option<VAppRow> = sqlx::query_as(&format!(
            "SELECT {VAPP_COLUMNS} FROM vapps WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(map_db_err)?;
        row.map(VAppRow::into_domain).transpose()
    }

    pub async fn list_by_vdc(&self, vdc_id: Uuid, params: PageParams) -> Result<(Vec<VApp>, i64)> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM vapps WHERE vdc_id = $1 AND deleted_at IS NULL",
        )
        .bind(vdc_id)
        .fetch_one(self.pool)
        .await
        .map_err(map_db_err)?;
        let rows: Vec<VAppRow> = sqlx::query_as(&format!(
            "SELECT {VAPP_COLUMNS} FROM vapps
             WHERE vdc_id = $1 AND deleted_at IS NULL
             ORDER BY name ASC LIMIT $2 OFFSET $3"
        ))
        .bind(vdc_id)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(self.pool)
        .await
        .map_err(map_db_err)?;
        let vapps = rows
            .into_iter()
            .map(VAppRow::into_domain)
            .collect::<Result<Vec<_>>>()?;
        Ok((vapps, total))
    }

    pub async fn name_in_use(&self, vdc_id: Uuid, name: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM vapps
             WHERE vdc_id = $1 AND name = $2 AND deleted_at IS NULL",
        )
        .bind(vdc_id)
        .bind(name)
        .fetch_one(self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(count > 0)
    }

    /// Idempotent status write; skipped when unchanged.
    pub async fn set_status(&self, id: Uuid, status: VAppStatus) -> Result<()> {
        sqlx::query(
            "UPDATE vapps SET status = $2, updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL AND status <> $2",
        )
        .bind(id)
        .bind(status.as_str())
        .execute(self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    pub async fn any_vm_powered_on(&self, id: Uuid) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM vms WHERE vapp_id = $1 AND status = $2",
        )
        .bind(id)
        .bind(VmStatus::PoweredOn.as_str())
        .fetch_one(self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(count > 0)
    }

    /// Soft-delete the vApp and hard-delete its VM rows in one transaction.
    pub async fn soft_delete_cascade(&self, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;
        sqlx::query("DELETE FROM vms WHERE vapp_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_err)?;
        let updated = sqlx::query(
            "UPDATE vapps SET deleted_at = now(), updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(map_db_err)?;
        if updated.rows_affected() == 0 {
            return Err(Error::not_found("vApp"));
        }
        tx.commit().await.map_err(map_db_err)?;
        Ok(())
    }
}
