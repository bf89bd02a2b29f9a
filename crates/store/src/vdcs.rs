//! VDC repository. Namespace uniqueness is only enforced among live rows so
//! a soft-deleted VDC's namespace can be reused.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use ssv_auth::Scope;
use ssv_domain::model::{
    AllocationModel, CapacityUnits, CapacityValue, ComputeCapacity, Vdc, VdcStatus,
};
use ssv_domain::{Error, PageParams, Result, Urn, UrnKind};

use crate::map_db_err;

#[derive(Debug, FromRow)]
struct VdcRow {
    id: Uuid,
    org_id: Uuid,
    name: String,
    description: String,
    allocation_model: String,
    cpu_allocated: i64,
    cpu_limit: i64,
    memory_allocated: i64,
    memory_limit: i64,
    provider_vdc_name: String,
    nic_quota: i32,
    network_quota: i32,
    is_thin_provision: bool,
    is_enabled: bool,
    namespace: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl VdcRow {
    fn into_domain(self) -> Result<Vdc> {
        let allocation_model = AllocationModel::parse(&self.allocation_model).ok_or_else(|| {
            Error::Database(format!("unknown allocation model {:?}", self.allocation_model))
        })?;
        let status = VdcStatus::parse(&self.status)
            .ok_or_else(|| Error::Database(format!("unknown VDC status {:?}", self.status)))?;
        Ok(Vdc {
            id: Urn::of(UrnKind::Vdc, self.id),
            org_id: Urn::of(UrnKind::Org, self.org_id),
            name: self.name,
            description: self.description,
            allocation_model,
            compute_capacity: ComputeCapacity {
                cpu: CapacityValue {
                    allocated: self.cpu_allocated,
                    limit: self.cpu_limit,
                    units: CapacityUnits::Mhz,
                },
                memory: CapacityValue {
                    allocated: self.memory_allocated,
                    limit: self.memory_limit,
                    units: CapacityUnits::Mb,
                },
            },
            provider_vdc_name: self.provider_vdc_name,
            nic_quota: self.nic_quota,
            network_quota: self.network_quota,
            is_thin_provision: self.is_thin_provision,
            is_enabled: self.is_enabled,
            namespace: self.namespace,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewVdc {
    pub org_id: Uuid,
    pub name: String,
    pub description: String,
    pub allocation_model: AllocationModel,
    pub compute_capacity: ComputeCapacity,
    pub provider_vdc_name: String,
    pub nic_quota: i32,
    pub network_quota: i32,
    pub is_thin_provision: bool,
    pub is_enabled: bool,
    pub namespace: String,
}

#[derive(Debug, Clone, Default)]
pub struct VdcPatch {
    pub description: Option<String>,
    pub compute_capacity: Option<ComputeCapacity>,
    pub nic_quota: Option<i32>,
    pub network_quota: Option<i32>,
    pub is_thin_provision: Option<bool>,
    pub is_enabled: Option<bool>,
}

const VDC_COLUMNS: &str = "id, org_id, name, description, allocation_model, cpu_allocated, \
                           cpu_limit, memory_allocated, memory_limit, provider_vdc_name, \
                           nic_quota, network_quota, is_thin_provision, is_enabled, namespace, \
                           status, created_at, updated_at";

pub struct VdcRepo<'a> {
    pub(crate) pool: &'a PgPool,
}

impl VdcRepo<'_> {
    pub async fn create(&self, new: NewVdc) -> Result<Vdc> {
        let row: VdcRow = sqlx::query_as(&format!(
            "INSERT INTO vdcs (id, org_id, name, description, allocation_model,
                               cpu_allocated, cpu_limit, memory_allocated, memory_limit,
                               provider_vdc_name, nic_quota, network_quota,
                               is_thin_provision, is_enabled, namespace, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
             RETURNING {VDC_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new.org_id)
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.allocation_model.as_str())
        .bind(new.compute_capacity.cpu.allocated)
        .bind(new.compute_capacity.cpu.limit)
        .bind(new.compute_capacity.memory.allocated)
        .bind(new.compute_capacity.memory.limit)
        .bind(&new.provider_vdc_name)
        .bind(new.nic_quota)
        .bind(new.network_quota)
        .bind(new.is_thin_provision)
        .bind(new.is_enabled)
        .bind(&new.namespace)
        .bind(VdcStatus::Provisioning.as_str())
        .fetch_one(self.pool)
        .await
        .map_err(map_db_err)?;
        row.into_domain()
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Vdc>> {
        let row: Option<VdcRow> = sqlx::query_as(&format!(
            "SELECT {VDC_COLUMNS} FROM vdcs WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(map_db_err)?;
        row.map(VdcRow::into_domain).transpose()
    }

    pub async fn get_visible(&self, id: Uuid, scope: &Scope) -> Result<Vdc> {
        let vdc = self.get(id).await?.ok_or_else(|| Error::not_found("VDC"))?;
        if !scope.can_see_org(vdc.org_id) {
            return Err(Error::not_found("VDC"));
        }
        Ok(vdc)
    }

    /// All VDCs visible to the scope, across orgs.
    pub async fn list(&self, scope: &Scope, params: PageParams) -> Result<(Vec<Vdc>, i64)> {
        let org_filter = scope.org().map(|u| u.id);
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM vdcs
             WHERE deleted_at IS NULL AND ($1::uuid IS NULL OR org_id = $1)",
        )
        .bind(org_filter)
        .fetch_one(self.pool)
        .await
        .map_err(map_db_err)?;
        let rows: Vec<VdcRow> = sqlx::query_as(&format!(
            "SELECT {VDC_COLUMNS} FROM vdcs
             WHERE deleted_at IS NULL AND ($1::uuid IS NULL OR org_id = $1)
             ORDER BY name ASC LIMIT $2 OFFSET $3"
        ))
        .bind(org_filter)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(self.pool)
        .await
        .map_err(map_db_err)?;
        let vdcs = rows
            .into_iter()
            .map(VdcRow::into_domain)
            .collect::<Result<Vec<_>>>()?;
        Ok((vdcs, total))
    }

    pub async fn list_by_org(&self, org_id: Uuid, params: PageParams) -> Result<(Vec<Vdc>, i64)> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM vdcs WHERE org_id = $1 AND deleted_at IS NULL",
        )
        .bind(org_id)
        .fetch_one(self.pool)
        .await
        .map_err(map_db_err)?;
        let rows: Vec<VdcRow> = sqlx::query_as(&format!(
            "SELECT {VDC_COLUMNS} FROM vdcs
             WHERE org_id = $1 AND deleted_at IS NULL
             ORDER BY name ASC LIMIT $2 OFFSET $3"
        ))
        .bind(org_id)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(self.pool)
        .await
        .map_err(map_db_err)?;
        let vdcs = rows
            .into_iter()
            .map(VdcRow::into_domain)
            .collect::<Result<Vec<_>>>()?;
        Ok((vdcs, total))
    }

    pub async fn update(&self, id: Uuid, patch: VdcPatch) -> Result<Vdc> {
        let cap = patch.compute_capacity;
        let row: Option<VdcRow> = sqlx::query_as(&format!(
            "UPDATE vdcs SET
                 description = COALESCE($2, description),
                 cpu_allocated = COALESCE($3, cpu_allocated),
                 cpu_limit = COALESCE($4, cpu_limit),
                 memory_allocated = COALESCE($5, memory_allocated),
                 memory_limit = COALESCE($6, memory_limit),
                 nic_quota = COALESCE($7, nic_quota),
                 network_quota = COALESCE($8, network_quota),
                 is_thin_provision = COALESCE($9, is_thin_provision),
                 is_enabled = COALESCE($10, is_enabled),
                 updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {VDC_COLUMNS}"
        ))
        .bind(id)
        .bind(patch.description)
        .bind(cap.map(|c| c.cpu.allocated))
        .bind(cap.map(|c| c.cpu.limit))
        .bind(cap.map(|c| c.memory.allocated))
        .bind(cap.map(|c| c.memory.limit))
        .bind(patch.nic_quota)
        .bind(patch.network_quota)
        .bind(patch.is_thin_provision)
        .bind(patch.is_enabled)
        .fetch_optional(self.pool)
        .await
        .map_err(map_db_err)?;
        row.ok_or_else(|| Error::not_found("VDC"))?.into_domain()
    }

    pub async fn set_status(&self, id: Uuid, status: VdcStatus) -> Result<()> {
        sqlx::query(
            "UPDATE vdcs SET status = $2, updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL AND status <> $2",
        )
        .bind(id)
        .bind(status.as_str())
        .execute(self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    /// Whether any live VDC already owns `namespace`.
    pub async fn namespace_in_use(&self, namespace: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM vdcs WHERE namespace = $1 AND deleted_at IS NULL",
        )
        .bind(namespace)
        .fetch_one(self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(count > 0)
    }

    pub async fn find_by_namespace(&self, namespace: &str) -> Result<Option<Vdc>> {
        let row: Option<VdcRow> = sqlx::query_as(&format!(
            "SELECT {VDC_COLUMNS} FROM vdcs WHERE namespace = $1 AND deleted_at IS NULL"
        ))
        .bind(namespace)
        .fetch_optional(self.pool)
        .await
        .map_err(map_db_err)?;
        row.map(VdcRow::into_domain).transpose()
    }

    pub async fn count_live_vapps(&self, id: Uuid) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM vapps WHERE vdc_id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_one(self.pool)
            .await
            .map_err(map_db_err)
    }

    /// Soft delete. The caller has already checked the live-vApp guard; the
    /// delete still re-checks inside the transaction to stay race-free.
    pub async fn soft_delete(&self, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;
        let vapps: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM vapps WHERE vdc_id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_err)?;
        if vapps > 0 {
            return Err(Error::conflict("VDC still contains vApps"));
        }
        let updated = sqlx::query(
            "UPDATE vdcs SET deleted_at = now(), updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(map_db_err)?;
        if updated.rows_affected() == 0 {
            return Err(Error::not_found("VDC"));
        }
        tx.commit().await.map_err(map_db_err)?;
        Ok(())
    }
}
