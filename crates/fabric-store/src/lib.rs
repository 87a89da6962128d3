//! Tenant Datastore Provisioning
//!
//! Persists tenant metadata across one or two configurable backends and
//! provisions each tenant's isolated keyspace and/or relational database.
//! The engines themselves are external; this crate defines the operations
//! the control plane issues against them and orchestrates those operations
//! with create-or-conflict semantics.

pub mod application;
pub mod assignment;
pub mod error;
pub mod keyspace;
pub mod memory;
pub mod option;
pub mod provisioner;
pub mod relational;
pub mod tenant;

pub use application::ApplicationStore;
pub use assignment::AssignmentStore;
pub use error::StoreError;
pub use keyspace::{AssignmentRecord, KeyspaceBackend, ReplicationSpec, TenantRecord};
pub use memory::{InMemoryKeyspaceBackend, InMemoryRelationalBackend};
pub use option::DataStoreOption;
pub use provisioner::DatastoreProvisioner;
pub use relational::{database_url, DatabaseType, RelationalBackend};
pub use tenant::TenantStore;
