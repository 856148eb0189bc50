//! In-memory remote for tests and dry experiments
//!
//! `MockClient` behaves like the hosted API closely enough to exercise the
//! executor: identities are unique, renames move keys along, deletes drop
//! everything. Every call is recorded, and failures can be injected.

use crate::client::SpaceClient;
use crate::error::{Error, Result};
use crate::types::{KeyedValues, SpaceId, SpaceRecord, SpaceSpec};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Namespace used for creates that do not name an owner.
pub const MOCK_USER: &str = "mock-user";

/// A space as held by the mock remote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockSpace {
    pub private: bool,
    pub sdk: Option<String>,
    pub hardware: Option<String>,
    pub storage: Option<String>,
    pub sleep_time: Option<i64>,
    pub secrets: KeyedValues,
    pub variables: KeyedValues,
}

impl MockSpace {
    fn from_spec(spec: &SpaceSpec) -> Self {
        Self {
            private: spec.private.unwrap_or(false),
            sdk: spec.sdk.clone(),
            hardware: spec.hardware.clone(),
            storage: spec.storage.clone(),
            sleep_time: spec.sleep_time,
            ..Default::default()
        }
    }
}

struct Failure {
    op: String,
    key: Option<String>,
    error: Error,
}

#[derive(Default)]
struct Inner {
    spaces: BTreeMap<SpaceId, MockSpace>,
    calls: Vec<String>,
    failures: Vec<Failure>,
}

/// In-memory [`SpaceClient`]; clones share the same remote.
#[derive(Clone, Default)]
pub struct MockClient {
    inner: Arc<Mutex<Inner>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed a space that exists remotely.
    pub fn insert(&self, id: SpaceId, space: MockSpace) {
        self.lock().spaces.insert(id, space);
    }

    /// Current remote copy of a space.
    pub fn space(&self, id: &SpaceId) -> Option<MockSpace> {
        self.lock().spaces.get(id).cloned()
    }

    /// Number of spaces held.
    pub fn len(&self) -> usize {
        self.lock().spaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calls made so far, as `op id [key]`.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Make the next call to `op` (optionally for `key` only) fail with
    /// `error`. Each injected failure fires once.
    pub fn fail_on(&self, op: &str, key: Option<&str>, error: Error) {
        self.lock().failures.push(Failure {
            op: op.to_string(),
            key: key.map(str::to_string),
            error,
        });
    }

    /// Log the call and fire a matching injected failure, if any.
    fn enter(&self, op: &str, target: &str, key: Option<&str>) -> Result<MutexGuard<'_, Inner>> {
        let mut inner = self.lock();
        match key {
            Some(k) => inner.calls.push(format!("{op} {target} {k}")),
            None => inner.calls.push(format!("{op} {target}")),
        }
        let hit = inner
            .failures
            .iter()
            .position(|f| f.op == op && (f.key.is_none() || f.key.as_deref() == key));
        if let Some(index) = hit {
            return Err(inner.failures.remove(index).error);
        }
        Ok(inner)
    }

    fn with_space<T>(
        &self,
        op: &str,
        id: &SpaceId,
        key: Option<&str>,
        f: impl FnOnce(&mut MockSpace) -> T,
    ) -> Result<T> {
        let mut inner = self.enter(op, &id.to_string(), key)?;
        inner
            .spaces
            .get_mut(id)
            .map(f)
            .ok_or_else(|| not_found(id))
    }
}

fn not_found(id: &SpaceId) -> Error {
    Error::rejected(404, format!("space {id} not found"))
}

impl SpaceClient for MockClient {
    fn create(&self, spec: &SpaceSpec) -> Result<SpaceId> {
        let owner = spec.owner.as_deref().unwrap_or(MOCK_USER);
        let id = SpaceId::new(owner, spec.name.as_str())?;
        let mut inner = self.enter("create", &id.to_string(), None)?;
        if inner.spaces.contains_key(&id) {
            return Err(Error::rejected(409, format!("space {id} already exists")));
        }
        inner.spaces.insert(id.clone(), MockSpace::from_spec(spec));
        Ok(id)
    }

    fn rename(&self, id: &SpaceId, new_name: &str) -> Result<SpaceId> {
        let to = id.with_name(new_name)?;
        let mut inner = self.enter("rename", &id.to_string(), Some(new_name))?;
        if inner.spaces.contains_key(&to) {
            return Err(Error::rejected(409, format!("space {to} already exists")));
        }
        let space = inner.spaces.remove(id).ok_or_else(|| not_found(id))?;
        inner.spaces.insert(to.clone(), space);
        Ok(to)
    }

    fn set_visibility(&self, id: &SpaceId, private: bool) -> Result<()> {
        self.with_space("set_visibility", id, None, |s| s.private = private)
    }

    fn set_hardware(&self, id: &SpaceId, tier: &str) -> Result<()> {
        self.with_space("set_hardware", id, None, |s| s.hardware = Some(tier.to_string()))
    }

    fn set_storage(&self, id: &SpaceId, tier: &str) -> Result<()> {
        self.with_space("set_storage", id, None, |s| s.storage = Some(tier.to_string()))
    }

    fn set_sleep_time(&self, id: &SpaceId, seconds: i64) -> Result<()> {
        self.with_space("set_sleep_time", id, None, |s| s.sleep_time = Some(seconds))
    }

    fn add_secret(&self, id: &SpaceId, key: &str, value: &str) -> Result<()> {
        self.with_space("add_secret", id, Some(key), |s| {
            s.secrets.insert(key.to_string(), value.to_string());
        })
    }

    fn remove_secret(&self, id: &SpaceId, key: &str) -> Result<()> {
        self.with_space("remove_secret", id, Some(key), |s| {
            s.secrets.remove(key);
        })
    }

    fn list_secret_keys(&self, id: &SpaceId) -> Result<Vec<String>> {
        self.with_space("list_secret_keys", id, None, |s| s.secrets.keys().cloned().collect())
    }

    fn add_variable(&self, id: &SpaceId, key: &str, value: &str) -> Result<()> {
        self.with_space("add_variable", id, Some(key), |s| {
            s.variables.insert(key.to_string(), value.to_string());
        })
    }

    fn remove_variable(&self, id: &SpaceId, key: &str) -> Result<()> {
        self.with_space("remove_variable", id, Some(key), |s| {
            s.variables.remove(key);
        })
    }

    fn list_variable_keys(&self, id: &SpaceId) -> Result<Vec<String>> {
        self.with_space("list_variable_keys", id, None, |s| {
            s.variables.keys().cloned().collect()
        })
    }

    fn delete(&self, id: &SpaceId) -> Result<()> {
        let mut inner = self.enter("delete", &id.to_string(), None)?;
        inner.spaces.remove(id).map(|_| ()).ok_or_else(|| not_found(id))
    }

    fn fetch(&self, id: &SpaceId) -> Result<SpaceRecord> {
        self.with_space("fetch", id, None, |s| SpaceRecord {
            id: id.clone(),
            author: Some(id.owner().to_string()),
            last_modified: None,
            likes: Some(0),
            private: s.private,
            sdk: s.sdk.clone(),
            hardware: s.hardware.clone(),
            storage: s.storage.clone(),
            sleep_time: s.sleep_time,
        })
    }
}
