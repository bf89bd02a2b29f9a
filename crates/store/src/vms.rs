//! VM repository. Rows are written by the orchestrator (power state) and the
//! reconcilers (creation, observed status); both paths are idempotent.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use ssv_domain::model::{Vm, VmStatus};
use ssv_domain::{Error, Result, Urn, UrnKind};

use crate::map_db_err;

#[derive(Debug, FromRow)]
struct VmRow {
    id: Uuid,
    vapp_id: Uuid,
    name: String,
    vm_name: String,
    namespace: String,
    status: String,
    cpu_count: Option<i32>,
    memory_mb: Option<i64>,
    guest_os: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl VmRow {
    fn into_domain(self) -> Result<Vm> {
        let status = VmStatus::parse(&self.status)
            .ok_or_else(|| Error::Database(format!("unknown VM status {:?}", self.status)))?;
        Ok(Vm {
            id: Urn::of(UrnKind::Vm, self.id),
            vapp_id: Urn::of(UrnKind::VApp, self.vapp_id),
            name: self.name,
            vm_name: self.vm_name,
            namespace: self.namespace,
            status,
            cpu_count: self.cpu_count,
            memory_mb: self.memory_mb,
            guest_os: self.guest_os,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewVm {
    pub vapp_id: Uuid,
    pub name: String,
    pub vm_name: String,
    pub namespace: String,
    pub status: VmStatus,
    pub cpu_count: Option<i32>,
    pub memory_mb: Option<i64>,
    pub guest_os: Option<String>,
}

const VM_COLUMNS: &str = "id, vapp_id, name, vm_name, namespace, status, cpu_count, memory_mb, \
                          guest_os, created_at, updated_at";

pub struct VmRepo<'a> {
    pub(crate) pool: &'a PgPool,
}

impl VmRepo<'_> {
    /// Insert or refresh a VM row keyed on (vapp, vm_name). Reconcilers call
    /// this repeatedly for the same generated object.
    pub async fn upsert(&self, new: NewVm) -> Result<Vm> {
        let row: VmRow = sqlx::query_as(&format!(
            "INSERT INTO vms (id, vapp_id, name, vm_name, namespace, status,
                              cpu_count, memory_mb, guest_os)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT (vapp_id, vm_name) DO UPDATE SET
                 status = EXCLUDED.status,
                 cpu_count = COALESCE(EXCLUDED.cpu_count, vms.cpu_count),
                 memory_mb = COALESCE(EXCLUDED.memory_mb, vms.memory_mb),
                 guest_os = COALESCE(EXCLUDED.guest_os, vms.guest_os),
                 updated_at = now()
             RETURNING {VM_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new.vapp_id)
        .bind(&new.name)
        .bind(&new.vm_name)
        .bind(&new.namespace)
        .bind(new.status.as_str())
        .bind(new.cpu_count)
        .bind(new.memory_mb)
        .bind(new.guest_os)
        .fetch_one(self.pool)
        .await
        .map_err(map_db_err)?;
        row.into_domain()
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Vm>> {
        let row: Option<VmRow> =
            sqlx::query_as(&format!("SELECT {VM_COLUMNS} FROM vms WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await
                .map_err(map_db_err)?;
        row.map(VmRow::into_domain).transpose()
    }

    pub async fn list_by_vapp(&self, vapp_id: Uuid) -> Result<Vec<Vm>> {
        let rows: Vec<VmRow> = sqlx::query_as(&format!(
            "SELECT {VM_COLUMNS} FROM vms WHERE vapp_id = $1 ORDER BY name ASC"
        ))
        .bind(vapp_id)
        .fetch_all(self.pool)
        .await
        .map_err(map_db_err)?;
        rows.into_iter().map(VmRow::into_domain).collect()
    }

    pub async fn find_by_cluster_name(
        &self,
        namespace: &str,
        vm_name: &str,
    ) -> Result<Option<Vm>> {
        let row: Option<VmRow> = sqlx::query_as(&format!(
            "SELECT {VM_COLUMNS} FROM vms WHERE namespace = $1 AND vm_name = $2"
        ))
        .bind(namespace)
        .bind(vm_name)
        .fetch_optional(self.pool)
        .await
        .map_err(map_db_err)?;
        row.map(VmRow::into_domain).transpose()
    }

    /// Idempotent status write; a no-op when the stored status already
    /// matches, so reconciler writes don't churn `updated_at`.
    pub async fn set_status(&self, id: Uuid, status: VmStatus) -> Result<bool> {
        let updated = sqlx::query(
            "UPDATE vms SET status = $2, updated_at = now()
             WHERE id = $1 AND status <> $2",
        )
        .bind(id)
        .bind(status.as_str())
        .execute(self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(updated.rows_affected() > 0)
    }
}
