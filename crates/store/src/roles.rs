//! Read-only role repository. Roles are static; the table exists only so
//! `user_roles` has something to reference, and is reseeded at boot.

use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use ssv_domain::model::{Role, RoleName};
use ssv_domain::{Error, PageParams, Result, Urn, UrnKind};

use crate::map_db_err;

#[derive(Debug, FromRow)]
struct RoleRow {
    id: Uuid,
    name: String,
    read_only: bool,
}

impl RoleRow {
    fn into_domain(self) -> Result<Role> {
        let name = RoleName::parse(&self.name)
            .ok_or_else(|| Error::Database(format!("unknown role {:?} in store", self.name)))?;
        Ok(Role {
            id: Urn::of(UrnKind::Role, self.id),
            name,
            read_only: self.read_only,
        })
    }
}

pub struct RoleRepo<'a> {
    pub(crate) pool: &'a PgPool,
}

impl RoleRepo<'_> {
    /// Insert the built-in role set; safe to run on every boot.
    pub async fn seed_builtin(&self) -> Result<()> {
        for role in Role::all_builtin() {
            sqlx::query(
                "INSERT INTO roles (id, name, read_only) VALUES ($1, $2, TRUE)
                 ON CONFLICT (name) DO NOTHING",
            )
            .bind(role.id.id)
            .bind(role.name.as_str())
            .execute(self.pool)
            .await
            .map_err(map_db_err)?;
        }
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Role> {
        let row: Option<RoleRow> =
            sqlx::query_as("SELECT id, name, read_only FROM roles WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await
                .map_err(map_db_err)?;
        row.ok_or_else(|| Error::not_found("role"))?.into_domain()
    }

    pub async fn list(&self, params: PageParams) -> Result<(Vec<Role>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM roles")
            .fetch_one(self.pool)
            .await
            .map_err(map_db_err)?;
        let rows: Vec<RoleRow> = sqlx::query_as(
            "SELECT id, name, read_only FROM roles ORDER BY name ASC LIMIT $1 OFFSET $2",
        )
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(self.pool)
        .await
        .map_err(map_db_err)?;
        let roles = rows
            .into_iter()
            .map(RoleRow::into_domain)
            .collect::<Result<Vec<_>>>()?;
        Ok((roles, total))
    }
}
