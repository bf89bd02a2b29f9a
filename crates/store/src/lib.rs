//! Postgres persistence layer.
//!
//! The store is authoritative for identity (URNs), ownership and API-visible
//! metadata. Soft-deletable entities (orgs, VDCs, catalogs, vApps) are
//! filtered with `deleted_at IS NULL` everywhere uniqueness or visibility is
//! decided, so deleted names can be reused.

pub mod catalogs;
pub mod orgs;
pub mod roles;
pub mod users;
pub mod vapps;
pub mod vdcs;
pub mod vms;

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;

use ssv_domain::config::DatabaseConfig;
use ssv_domain::{Error, Result};

pub use catalogs::CatalogRepo;
pub use orgs::OrgRepo;
pub use roles::RoleRepo;
pub use users::{UserRecord, UserRepo};
pub use vapps::VAppRepo;
pub use vdcs::VdcRepo;
pub use vms::VmRepo;

/// Shared connection pool plus typed repository accessors.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and verify the pool with a ping.
    pub async fn connect(config: &DatabaseConfig) -> Result<PgStore> {
        let ssl = match config.sslmode.as_str() {
            "disable" => PgSslMode::Disable,
            "require" => PgSslMode::Require,
            _ => PgSslMode::Prefer,
        };
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.username)
            .password(&config.password)
            .database(&config.database)
            .ssl_mode(ssl);
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.max_idle)
            .max_lifetime(Duration::from_secs(config.conn_max_lifetime_secs))
            .idle_timeout(Duration::from_secs(config.conn_max_idle_time_secs))
            .connect_with(options)
            .await
            .map_err(map_db_err)?;
        Ok(PgStore { pool })
    }

    /// Run embedded migrations; must be idempotent across restarts.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("migrations: {e}")))?;
        Ok(())
    }

    /// Liveness check used by `/readyz`.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn orgs(&self) -> OrgRepo<'_> {
        OrgRepo { pool: &self.pool }
    }

    pub fn roles(&self) -> RoleRepo<'_> {
        RoleRepo { pool: &self.pool }
    }

    pub fn users(&self) -> UserRepo<'_> {
        UserRepo { pool: &self.pool }
    }

    pub fn vdcs(&self) -> VdcRepo<'_> {
        VdcRepo { pool: &self.pool }
    }

    pub fn catalogs(&self) -> CatalogRepo<'_> {
        CatalogRepo { pool: &self.pool }
    }

    pub fn vapps(&self) -> VAppRepo<'_> {
        VAppRepo { pool: &self.pool }
    }

    pub fn vms(&self) -> VmRepo<'_> {
        VmRepo { pool: &self.pool }
    }
}

/// Map a sqlx error into the domain error space. Unique violations become
/// conflicts so handlers can surface 409 without inspecting SQLSTATEs.
pub(crate) fn map_db_err(e: sqlx::Error) -> Error {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return Error::Conflict("a live resource with that name already exists".into());
        }
        if db.is_foreign_key_violation() {
            return Error::Conflict("referenced resource does not exist".into());
        }
    }
    Error::Database(e.to_string())
}
