//! Remote client trait
//!
//! The reconciler drives a remote management API through this trait only.
//! Implementations are synchronous and one-shot: no retries, no caching.

use crate::error::Result;
use crate::types::{Collection, SpaceId, SpaceRecord, SpaceSpec};

/// Authenticated request/response operations on hosted spaces.
///
/// Every call either returns the decoded payload or a classified
/// [`Error`](crate::Error). The reconciler never issues two calls at once.
pub trait SpaceClient {
    /// Create a space from the scalar fields of `spec`; returns the
    /// identity assigned by the remote.
    fn create(&self, spec: &SpaceSpec) -> Result<SpaceId>;

    /// Rename a space within its namespace; returns the new identity.
    fn rename(&self, id: &SpaceId, new_name: &str) -> Result<SpaceId>;

    fn set_visibility(&self, id: &SpaceId, private: bool) -> Result<()>;

    fn set_hardware(&self, id: &SpaceId, tier: &str) -> Result<()>;

    fn set_storage(&self, id: &SpaceId, tier: &str) -> Result<()>;

    fn set_sleep_time(&self, id: &SpaceId, seconds: i64) -> Result<()>;

    /// Add (or overwrite) a secret.
    fn add_secret(&self, id: &SpaceId, key: &str, value: &str) -> Result<()>;

    fn remove_secret(&self, id: &SpaceId, key: &str) -> Result<()>;

    /// Keys of the secrets currently set; values are never returned.
    fn list_secret_keys(&self, id: &SpaceId) -> Result<Vec<String>>;

    /// Add (or overwrite) a variable.
    fn add_variable(&self, id: &SpaceId, key: &str, value: &str) -> Result<()>;

    fn remove_variable(&self, id: &SpaceId, key: &str) -> Result<()>;

    fn list_variable_keys(&self, id: &SpaceId) -> Result<Vec<String>>;

    /// Delete the space. Secrets and variables go with it.
    fn delete(&self, id: &SpaceId) -> Result<()>;

    /// Fetch the current remote record.
    fn fetch(&self, id: &SpaceId) -> Result<SpaceRecord>;
}

/// Collection-generic helpers over [`SpaceClient`].
pub trait SpaceClientExt: SpaceClient {
    /// Push one key of `collection`.
    fn add_key(&self, id: &SpaceId, collection: Collection, key: &str, value: &str) -> Result<()> {
        match collection {
            Collection::Secrets => self.add_secret(id, key, value),
            Collection::Variables => self.add_variable(id, key, value),
        }
    }

    /// Remove one key of `collection`.
    fn remove_key(&self, id: &SpaceId, collection: Collection, key: &str) -> Result<()> {
        match collection {
            Collection::Secrets => self.remove_secret(id, key),
            Collection::Variables => self.remove_variable(id, key),
        }
    }

    /// List the keys of `collection`.
    fn list_keys(&self, id: &SpaceId, collection: Collection) -> Result<Vec<String>> {
        match collection {
            Collection::Secrets => self.list_secret_keys(id),
            Collection::Variables => self.list_variable_keys(id),
        }
    }
}

impl<C: SpaceClient + ?Sized> SpaceClientExt for C {}

impl<C: SpaceClient + ?Sized> SpaceClient for &C {
    fn create(&self, spec: &SpaceSpec) -> Result<SpaceId> {
        (**self).create(spec)
    }

    fn rename(&self, id: &SpaceId, new_name: &str) -> Result<SpaceId> {
        (**self).rename(id, new_name)
    }

    fn set_visibility(&self, id: &SpaceId, private: bool) -> Result<()> {
        (**self).set_visibility(id, private)
    }

    fn set_hardware(&self, id: &SpaceId, tier: &str) -> Result<()> {
        (**self).set_hardware(id, tier)
    }

    fn set_storage(&self, id: &SpaceId, tier: &str) -> Result<()> {
        (**self).set_storage(id, tier)
    }

    fn set_sleep_time(&self, id: &SpaceId, seconds: i64) -> Result<()> {
        (**self).set_sleep_time(id, seconds)
    }

    fn add_secret(&self, id: &SpaceId, key: &str, value: &str) -> Result<()> {
        (**self).add_secret(id, key, value)
    }

    fn remove_secret(&self, id: &SpaceId, key: &str) -> Result<()> {
        (**self).remove_secret(id, key)
    }

    fn list_secret_keys(&self, id: &SpaceId) -> Result<Vec<String>> {
        (**self).list_secret_keys(id)
    }

    fn add_variable(&self, id: &SpaceId, key: &str, value: &str) -> Result<()> {
        (**self).add_variable(id, key, value)
    }

    fn remove_variable(&self, id: &SpaceId, key: &str) -> Result<()> {
        (**self).remove_variable(id, key)
    }

    fn list_variable_keys(&self, id: &SpaceId) -> Result<Vec<String>> {
        (**self).list_variable_keys(id)
    }

    fn delete(&self, id: &SpaceId) -> Result<()> {
        (**self).delete(id)
    }

    fn fetch(&self, id: &SpaceId) -> Result<SpaceRecord> {
        (**self).fetch(id)
    }
}
