//! # Shop Error Types Module
//!
//! This module defines the error taxonomy shared by the catalog, cart,
//! creation dialogue and router. Each variant maps to one recovery policy:
//!
//! - `Validation`: malformed input, the user is asked again
//! - `NotFound`: stale identifier, a failure screen with navigation is shown
//! - `Storage`: the catalog could not be persisted, nothing is applied
//! - `Unauthorized`: a non-admin reached an admin action

use thiserror::Error;

/// Custom error types for shop operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShopError {
    /// Input rejected before any state was touched
    #[error("Validation error: {0}")]
    Validation(String),
    /// Referenced entity does not exist (anymore)
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },
    /// Persistence failure
    #[error("Storage error: {0}")]
    Storage(String),
    /// Admin-only action requested by someone outside the allowlist
    #[error("Unauthorized")]
    Unauthorized,
}

/// Which kind of record a `NotFound` refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Category,
    Product,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Category => write!(f, "Category"),
            EntityKind::Product => write!(f, "Product"),
        }
    }
}

impl ShopError {
    pub fn category_not_found(id: impl Into<String>) -> Self {
        ShopError::NotFound {
            kind: EntityKind::Category,
            id: id.into(),
        }
    }

    pub fn product_not_found(id: impl Into<String>) -> Self {
        ShopError::NotFound {
            kind: EntityKind::Product,
            id: id.into(),
        }
    }
}

impl From<std::io::Error> for ShopError {
    fn from(err: std::io::Error) -> Self {
        ShopError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for ShopError {
    fn from(err: serde_json::Error) -> Self {
        ShopError::Storage(err.to_string())
    }
}

pub type ShopResult<T> = Result<T, ShopError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_formatting() {
        let err = ShopError::category_not_found("cat_1234abcd");
        assert_eq!(err.to_string(), "Category not found: cat_1234abcd");

        let err = ShopError::Validation("price".to_string());
        assert_eq!(err.to_string(), "Validation error: price");
    }

    #[test]
    fn test_io_errors_become_storage_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        assert!(matches!(ShopError::from(io), ShopError::Storage(_)));
    }
}
