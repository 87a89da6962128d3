//! Relational Backend
//!
//! The operations the control plane issues against the relational engine:
//! tenant databases plus the provisioner's meta table of per-tenant
//! connection parameters.

use async_trait::async_trait;
use fabric_common::DatabaseConnectionInfo;

use crate::error::StoreError;

/// Relational engines the control plane can build connection URLs for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DatabaseType {
    MariaDb,
    Postgres,
}

impl DatabaseType {
    fn prefix(&self) -> &'static str {
        match self {
            Self::MariaDb => "mariadb://",
            Self::Postgres => "postgres://",
        }
    }
}

/// Build a connection URL for a tenant database.
///
/// Omitting `database_name` yields the server-level URL used for
/// CREATE/DROP DATABASE.
pub fn database_url(
    database_type: DatabaseType,
    host: &str,
    port: &str,
    database_name: Option<&str>,
) -> String {
    match database_name {
        Some(name) => format!("{}{}:{}/{}", database_type.prefix(), host, port, name),
        None => format!("{}{}:{}", database_type.prefix(), host, port),
    }
}

/// Operations issued against the relational engine
#[async_trait]
pub trait RelationalBackend: Send + Sync {
    /// Ensure the provisioner's meta table exists
    async fn initialize(&self) -> Result<(), StoreError>;

    /// Whether the meta table already holds a row for the tenant
    async fn tenant_exists(&self, identifier: &str) -> Result<bool, StoreError>;

    async fn create_database(&self, database_name: &str) -> Result<(), StoreError>;
    async fn drop_database(&self, database_name: &str) -> Result<(), StoreError>;

    async fn insert_connection_info(
        &self,
        identifier: &str,
        info: &DatabaseConnectionInfo,
    ) -> Result<(), StoreError>;

    async fn find_connection_info(
        &self,
        identifier: &str,
    ) -> Result<Option<DatabaseConnectionInfo>, StoreError>;

    async fn fetch_all_connection_info(
        &self,
    ) -> Result<Vec<(String, DatabaseConnectionInfo)>, StoreError>;

    async fn delete_connection_info(&self, identifier: &str) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_with_database_name() {
        assert_eq!(
            database_url(DatabaseType::MariaDb, "db.internal", "3306", Some("acme")),
            "mariadb://db.internal:3306/acme"
        );
    }

    #[test]
    fn url_without_database_name() {
        assert_eq!(
            database_url(DatabaseType::Postgres, "db.internal", "5432", None),
            "postgres://db.internal:5432"
        );
    }
}
