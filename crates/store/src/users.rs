//! User repository. The password hash stays inside this module's
//! [`UserRecord`]; the domain [`User`] never carries it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use ssv_auth::Scope;
use ssv_domain::model::{Role, RoleName, User};
use ssv_domain::{Error, PageParams, Result, Urn, UrnKind};

use crate::map_db_err;

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    full_name: String,
    email: String,
    enabled: bool,
    password_hash: String,
    primary_org_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct UserRoleRow {
    user_id: Uuid,
    role_id: Uuid,
    name: String,
}

impl UserRow {
    fn into_domain(self, roles: Vec<Role>) -> User {
        User {
            id: Urn::of(UrnKind::User, self.id),
            username: self.username,
            full_name: self.full_name,
            email: self.email,
            enabled: self.enabled,
            primary_org_id: self.primary_org_id.map(|o| Urn::of(UrnKind::Org, o)),
            roles,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// A user plus the stored password hash, for the login path only.
pub struct UserRecord {
    pub user: User,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub enabled: bool,
    pub password_hash: String,
    pub primary_org_id: Option<Uuid>,
    pub role_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub enabled: Option<bool>,
    pub password_hash: Option<String>,
    pub primary_org_id: Option<Option<Uuid>>,
    pub role_ids: Option<Vec<Uuid>>,
}

pub struct UserRepo<'a> {
    pub(crate) pool: &'a PgPool,
}

const USER_COLUMNS: &str = "id, username, full_name, email, enabled, password_hash, \
                            primary_org_id, created_at, updated_at";

impl UserRepo<'_> {
    pub async fn create(&self, new: NewUser) -> Result<User> {
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;
        let row: UserRow = sqlx::query_as(&format!(
            "INSERT INTO users (id, username, full_name, email, enabled, password_hash, primary_org_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&new.username)
        .bind(&new.full_name)
        .bind(&new.email)
        .bind(new.enabled)
        .bind(&new.password_hash)
        .bind(new.primary_org_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_err)?;
        for role_id in &new.role_ids {
            sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)")
                .bind(row.id)
                .bind(role_id)
                .execute(&mut *tx)
                .await
                .map_err(map_db_err)?;
        }
        tx.commit().await.map_err(map_db_err)?;
        let roles = self.roles_for(&[row.id]).await?.remove(&row.id).unwrap_or_default();
        Ok(row.into_domain(roles))
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(map_db_err)?;
        match row {
            Some(row) => {
                let roles = self.roles_for(&[row.id]).await?.remove(&row.id).unwrap_or_default();
                Ok(Some(row.into_domain(roles)))
            }
            None => Ok(None),
        }
    }

    pub async fn get_visible(&self, id: Uuid, scope: &Scope) -> Result<User> {
        let user = self.get(id).await?.ok_or_else(|| Error::not_found("user"))?;
        let visible = match scope.org() {
            None => true,
            Some(org) => user.primary_org_id == Some(org),
        };
        if !visible {
            return Err(Error::not_found("user"));
        }
        Ok(user)
    }

    /// Login lookup: live user by username, hash included.
    pub async fn get_record_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1 AND deleted_at IS NULL"
        ))
        .bind(username)
        .fetch_optional(self.pool)
        .await
        .map_err(map_db_err)?;
        match row {
            Some(row) => {
                let roles = self.roles_for(&[row.id]).await?.remove(&row.id).unwrap_or_default();
                let password_hash = row.password_hash.clone();
                Ok(Some(UserRecord {
                    user: row.into_domain(roles),
                    password_hash,
                }))
            }
            None => Ok(None),
        }
    }

    pub async fn list(&self, scope: &Scope, params: PageParams) -> Result<(Vec<User>, i64)> {
        let org_filter = scope.org().map(|u| u.id);
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users
             WHERE deleted_at IS NULL AND ($1::uuid IS NULL OR primary_org_id = $1)",
        )
        .bind(org_filter)
        .fetch_one(self.pool)
        .await
        .map_err(map_db_err)?;
        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE deleted_at IS NULL AND ($1::uuid IS NULL OR primary_org_id = $1)
             ORDER BY username ASC LIMIT $2 OFFSET $3"
        ))
        .bind(org_filter)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(self.pool)
        .await
        .map_err(map_db_err)?;
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut roles = self.roles_for(&ids).await?;
        let users = rows
            .into_iter()
            .map(|r| {
                let user_roles = roles.remove(&r.id).unwrap_or_default();
                r.into_domain(user_roles)
            })
            .collect();
        Ok((users, total))
    }

    pub async fn update(&self, id: Uuid, patch: UserPatch) -> Result<User> {
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE users SET
                 full_name = COALESCE($2, full_name),
                 email = COALESCE($3, email),
                 enabled = COALESCE($4, enabled),
                 password_hash = COALESCE($5, password_hash),
                 primary_org_id = CASE WHEN $6 THEN $7 ELSE primary_org_id END,
                 updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(patch.full_name)
        .bind(patch.email)
        .bind(patch.enabled)
        .bind(patch.password_hash)
        .bind(patch.primary_org_id.is_some())
        .bind(patch.primary_org_id.flatten())
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_db_err)?;
        let row = row.ok_or_else(|| Error::not_found("user"))?;
        if let Some(role_ids) = patch.role_ids {
            sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(map_db_err)?;
            for role_id in role_ids {
                sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)")
                    .bind(id)
                    .bind(role_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(map_db_err)?;
            }
        }
        tx.commit().await.map_err(map_db_err)?;
        let roles = self.roles_for(&[id]).await?.remove(&id).unwrap_or_default();
        Ok(row.into_domain(roles))
    }

    pub async fn soft_delete(&self, id: Uuid) -> Result<()> {
        let updated = sqlx::query(
            "UPDATE users SET deleted_at = now(), updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(self.pool)
        .await
        .map_err(map_db_err)?;
        if updated.rows_affected() == 0 {
            return Err(Error::not_found("user"));
        }
        Ok(())
    }

    async fn roles_for(&self, user_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<Role>>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows: Vec<UserRoleRow> = sqlx::query_as(
            "SELECT ur.user_id, r.id AS role_id, r.name
             FROM user_roles ur JOIN roles r ON r.id = ur.role_id
             WHERE ur.user_id = ANY($1)",
        )
        .bind(user_ids)
        .fetch_all(self.pool)
        .await
        .map_err(map_db_err)?;
        let mut map: HashMap<Uuid, Vec<Role>> = HashMap::new();
        for row in rows {
            let Some(name) = RoleName::parse(&row.name) else {
                tracing::warn!(role = %row.name, "skipping unknown role in store");
                continue;
            };
            map.entry(row.user_id).or_default().push(Role {
                id: Urn::of(UrnKind::Role, row.role_id),
                name,
                read_only: true,
            });
        }
        Ok(map)
    }
}
