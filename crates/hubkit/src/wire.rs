//! Hub API request and response bodies

use declarative::{Error, Result, SpaceId, SpaceRecord, SpaceSpec};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateRepo<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdk: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hardware: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_time: Option<i64>,
}

impl<'a> CreateRepo<'a> {
    pub fn space(spec: &'a SpaceSpec) -> Self {
        Self {
            kind: "space",
            name: &spec.name,
            organization: spec.owner.as_deref(),
            private: spec.private,
            sdk: spec.sdk.as_deref(),
            template: spec.template.as_deref(),
            hardware: spec.hardware.as_deref(),
            storage: spec.storage.as_deref(),
            sleep_time: spec.sleep_time,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MoveRepo {
    pub from_repo: String,
    pub to_repo: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Serialize)]
pub(crate) struct DeleteRepo<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: &'a str,
    pub organization: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct Visibility {
    pub private: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct Hardware<'a> {
    pub flavor: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct Storage<'a> {
    pub tier: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct SleepTime {
    pub seconds: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct KeyValue<'a> {
    pub key: &'a str,
    pub value: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct Key<'a> {
    pub key: &'a str,
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CreatedRepo {
    pub name: Option<String>,
    pub url: Option<String>,
}

impl CreatedRepo {
    /// Identity of the created space.
    ///
    /// The hub answers with either `name` ("owner/name" or bare) or `url`
    /// ending in `/spaces/owner/name`.
    pub fn identity(&self, spec: &SpaceSpec) -> Result<SpaceId> {
        if let Some(name) = &self.name {
            if name.contains('/') {
                return SpaceId::parse(name);
            }
            if let Some(owner) = &spec.owner {
                return SpaceId::new(owner.as_str(), name.as_str());
            }
        }
        if let Some(url) = &self.url {
            let mut segments = url.trim_end_matches('/').rsplit('/');
            if let (Some(name), Some(owner)) = (segments.next(), segments.next()) {
                return SpaceId::new(owner, name);
            }
        }
        Err(Error::Decode(
            "create response carries neither a qualified name nor a url".into(),
        ))
    }
}

/// Tier fields come back either as a plain string or as
/// `{ "current": ..., "requested": ... }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum Tier {
    Name(String),
    Detail { current: Option<String> },
}

impl Tier {
    fn current(self) -> Option<String> {
        match self {
            Self::Name(name) => Some(name),
            Self::Detail { current } => current,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Runtime {
    pub hardware: Option<Tier>,
    pub storage: Option<Tier>,
    pub gc_timeout: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SpaceInfo {
    pub id: String,
    pub author: Option<String>,
    pub last_modified: Option<String>,
    pub likes: Option<u64>,
    #[serde(default)]
    pub private: bool,
    pub sdk: Option<String>,
    pub hardware: Option<Tier>,
    pub storage: Option<Tier>,
    pub sleep_time: Option<i64>,
    #[serde(default)]
    pub runtime: Option<Runtime>,
}

impl SpaceInfo {
    /// Top-level fields win over the `runtime` block.
    pub fn into_record(self) -> Result<SpaceRecord> {
        let id = SpaceId::parse(&self.id)?;
        let runtime = self.runtime.unwrap_or_default();
        Ok(SpaceRecord {
            id,
            author: self.author,
            last_modified: self.last_modified,
            likes: self.likes,
            private: self.private,
            sdk: self.sdk,
            hardware: self.hardware.or(runtime.hardware).and_then(Tier::current),
            storage: self.storage.or(runtime.storage).and_then(Tier::current),
            sleep_time: self.sleep_time.or(runtime.gc_timeout),
        })
    }
}

/// Keys of a secrets or variables listing.
///
/// Accepts an object keyed by name or an array of `{ "key": ... }` entries.
pub(crate) fn listed_keys(body: &Value) -> Result<Vec<String>> {
    let mut keys: Vec<String> = match body {
        Value::Object(map) => map.keys().cloned().collect(),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.get("key")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| Error::Decode(format!("listing entry without key: {item}")))
            })
            .collect::<Result<_>>()?,
        other => return Err(Error::Decode(format!("unexpected key listing: {other}"))),
    };
    keys.sort();
    Ok(keys)
}
