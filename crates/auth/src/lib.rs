//! Authentication and authorization primitives: session tokens, password
//! hashing, and role-derived scopes.

pub mod password;
pub mod scope;
pub mod token;

pub use password::{hash_password, verify_password};
pub use scope::Scope;
pub use token::{Claims, TokenSigner};
