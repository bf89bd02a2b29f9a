/// Shared error type used across all ssvirt crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("validation: {0}")]
    Validation(String),

    #[error("authentication: {0}")]
    Authentication(String),

    /// Scope insufficient for the target. Only sessions surface this as 403;
    /// resource fetches outside scope are reported as [`Error::NotFound`].
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// Failed precondition on an otherwise well-formed request, e.g. deleting
    /// a vApp with a running VM. Maps to 400 per Cloud Director convention.
    #[error("precondition: {0}")]
    Precondition(String),

    #[error("database: {0}")]
    Database(String),

    #[error("kubernetes: {0}")]
    Kubernetes(String),

    #[error("config: {0}")]
    Config(String),

    #[error("shutting down")]
    Shutdown,
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Error::NotFound(what.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Error::Conflict(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
