//! State model: desired spec, recorded snapshot, remote record

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Key/value collection with unique keys; iteration order is irrelevant
/// to reconciliation but sorted for stable plans.
pub type KeyedValues = BTreeMap<String, String>;

/// Recorded value for a key whose remote value is not known.
///
/// Never equal to a fingerprint of a declared value, so such a key is always
/// re-pushed (or removed) on the next update.
pub const UNKNOWN_FINGERPRINT: &str = "\u{0}unknown";

/// Remote identity of a space: `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SpaceId {
    owner: String,
    name: String,
}

impl SpaceId {
    /// Build an identity from its two segments.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Result<Self, Error> {
        let owner = owner.into();
        let name = name.into();
        if !is_valid_segment(&owner) || !is_valid_segment(&name) {
            return Err(Error::InvalidId(format!("{owner}/{name}")));
        }
        Ok(Self { owner, name })
    }

    /// Parse `owner/name`.
    pub fn parse(s: &str) -> Result<Self, Error> {
        match s.trim().split_once('/') {
            Some((owner, name)) => Self::new(owner, name).map_err(|_| Error::InvalidId(s.to_string())),
            None => Err(Error::InvalidId(s.to_string())),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Same owner, different name segment.
    pub fn with_name(&self, name: &str) -> Result<Self, Error> {
        Self::new(self.owner.clone(), name)
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty() && !segment.contains('/') && !segment.chars().any(char::is_whitespace)
}

impl fmt::Display for SpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for SpaceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SpaceId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SpaceId> for String {
    fn from(id: SpaceId) -> Self {
        id.to_string()
    }
}

/// The two key/value collections attached to a space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Secrets,
    Variables,
}

impl Collection {
    /// Value recorded in a snapshot for a pushed value.
    ///
    /// Secrets are write-only remotely and never stored in plaintext, so
    /// only a blake3 digest is kept. Variables are stored verbatim.
    ///
    /// The digest is unkeyed and unsalted: it detects changes, it does not
    /// protect the value. Anyone who can read a snapshot can test guesses
    /// against it offline, so a low-entropy secret is effectively exposed
    /// and snapshots must be kept as private as the secrets themselves.
    pub fn fingerprint(self, value: &str) -> String {
        match self {
            Self::Secrets => format!("blake3:{}", blake3::hash(value.as_bytes()).to_hex()),
            Self::Variables => value.to_string(),
        }
    }

    /// Declared entries of this collection.
    pub fn declared(self, spec: &SpaceSpec) -> &KeyedValues {
        match self {
            Self::Secrets => &spec.secrets,
            Self::Variables => &spec.variables,
        }
    }

    /// Recorded entries of this collection.
    pub fn recorded(self, state: &SpaceState) -> &KeyedValues {
        match self {
            Self::Secrets => &state.secrets,
            Self::Variables => &state.variables,
        }
    }

    pub fn recorded_mut(self, state: &mut SpaceState) -> &mut KeyedValues {
        match self {
            Self::Secrets => &mut state.secrets,
            Self::Variables => &mut state.variables,
        }
    }

    /// Singular noun for messages ("secret", "variable").
    pub fn noun(self) -> &'static str {
        match self {
            Self::Secrets => "secret",
            Self::Variables => "variable",
        }
    }
}

/// Desired configuration of one space.
///
/// Every field but `name` is optional; an absent field is left to the
/// remote default on create and left untouched on update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceSpec {
    /// Name segment of the space identity
    pub name: String,

    /// Namespace to create the space in; defaults to the token's user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,

    /// SDK kind (gradio, streamlit, docker, static)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdk: Option<String>,

    /// Template space to duplicate from on create
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    /// Hardware flavor (e.g. "cpu-basic", "t4-small")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware: Option<String>,

    /// Persistent storage tier (e.g. "small", "medium", "large")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<String>,

    /// Seconds of inactivity before the space is put to sleep
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_time: Option<i64>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub secrets: KeyedValues,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: KeyedValues,
}

impl SpaceSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Last known converged state of one space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceState {
    /// Remote identity; `None` until created, and again after delete
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SpaceId>,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdk: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_time: Option<i64>,

    /// Secret key -> fingerprint of the last pushed value
    /// (see [`Collection::fingerprint`]; not confidential)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub secrets: KeyedValues,

    /// Variable key -> last pushed value
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: KeyedValues,
}

impl SpaceState {
    /// Snapshot of a space fully converged to `spec`.
    pub fn from_spec(id: SpaceId, spec: &SpaceSpec) -> Self {
        let mut state = Self::created(id, spec);
        for collection in [Collection::Secrets, Collection::Variables] {
            let recorded = collection
                .declared(spec)
                .iter()
                .map(|(k, v)| (k.clone(), collection.fingerprint(v)))
                .collect();
            *collection.recorded_mut(&mut state) = recorded;
        }
        state
    }

    /// Snapshot right after a successful create call: scalars recorded,
    /// collections still empty.
    pub(crate) fn created(id: SpaceId, spec: &SpaceSpec) -> Self {
        Self {
            name: id.name().to_string(),
            id: Some(id),
            private: spec.private,
            sdk: spec.sdk.clone(),
            template: spec.template.clone(),
            hardware: spec.hardware.clone(),
            storage: spec.storage.clone(),
            sleep_time: spec.sleep_time,
            secrets: KeyedValues::new(),
            variables: KeyedValues::new(),
        }
    }

    /// Whether the space exists remotely.
    pub fn is_created(&self) -> bool {
        self.id.is_some()
    }
}

/// A space as reported by the remote fetch-by-id call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceRecord {
    pub id: SpaceId,
    pub author: Option<String>,
    pub last_modified: Option<String>,
    pub likes: Option<u64>,
    pub private: bool,
    pub sdk: Option<String>,
    pub hardware: Option<String>,
    pub storage: Option<String>,
    pub sleep_time: Option<i64>,
}

impl SpaceRecord {
    /// Project into a snapshot. Secret and variable values are not
    /// readable remotely, so both collections start empty.
    pub fn into_state(self) -> SpaceState {
        SpaceState {
            name: self.id.name().to_string(),
            id: Some(self.id),
            private: Some(self.private),
            sdk: self.sdk,
            template: None,
            hardware: self.hardware,
            storage: self.storage,
            sleep_time: self.sleep_time,
            secrets: KeyedValues::new(),
            variables: KeyedValues::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_id_parse() {
        let id = SpaceId::parse("alice/demo").unwrap();
        assert_eq!(id.owner(), "alice");
        assert_eq!(id.name(), "demo");
        assert_eq!(id.to_string(), "alice/demo");
    }

    #[test]
    fn test_space_id_rejects_malformed() {
        assert!(SpaceId::parse("demo").is_err());
        assert!(SpaceId::parse("/demo").is_err());
        assert!(SpaceId::parse("alice/").is_err());
        assert!(SpaceId::parse("a/b/c").is_err());
        assert!(SpaceId::parse("alice/my space").is_err());
    }

    #[test]
    fn test_space_id_with_name_keeps_owner() {
        let id = SpaceId::parse("acme-org/old").unwrap();
        let renamed = id.with_name("new").unwrap();
        assert_eq!(renamed.to_string(), "acme-org/new");
    }

    #[test]
    fn test_space_id_serializes_as_string() {
        let id = SpaceId::parse("alice/demo").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"alice/demo\"");
        let back: SpaceId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<SpaceId>("\"nope\"").is_err());
    }

    #[test]
    fn test_secret_fingerprint_hides_value() {
        let fp = Collection::Secrets.fingerprint("hunter2");
        assert!(fp.starts_with("blake3:"));
        assert!(!fp.contains("hunter2"));
        assert_eq!(fp, Collection::Secrets.fingerprint("hunter2"));
        assert_ne!(fp, Collection::Secrets.fingerprint("hunter3"));
    }

    #[test]
    fn test_secret_fingerprint_is_plain_digest() {
        // an unkeyed digest: the same value gives the same fingerprint in any
        // state file, which is why snapshots are not confidential
        let expected = format!("blake3:{}", blake3::hash(b"hunter2").to_hex());
        assert_eq!(Collection::Secrets.fingerprint("hunter2"), expected);
    }

    #[test]
    fn test_variable_fingerprint_is_verbatim() {
        assert_eq!(Collection::Variables.fingerprint("prod"), "prod");
    }

    #[test]
    fn test_from_spec_records_everything() {
        let mut spec = SpaceSpec::new("demo");
        spec.private = Some(true);
        spec.hardware = Some("t4-small".into());
        spec.secrets.insert("TOKEN".into(), "s3cret".into());
        spec.variables.insert("MODE".into(), "prod".into());

        let state = SpaceState::from_spec(SpaceId::parse("alice/demo").unwrap(), &spec);
        assert!(state.is_created());
        assert_eq!(state.name, "demo");
        assert_eq!(state.private, Some(true));
        assert_eq!(state.hardware.as_deref(), Some("t4-small"));
        assert_eq!(state.variables.get("MODE").map(String::as_str), Some("prod"));
        assert_ne!(state.secrets.get("TOKEN").map(String::as_str), Some("s3cret"));
    }

    #[test]
    fn test_record_projection_has_no_keys() {
        let record = SpaceRecord {
            id: SpaceId::parse("alice/demo").unwrap(),
            author: Some("alice".into()),
            last_modified: None,
            likes: Some(3),
            private: false,
            sdk: Some("docker".into()),
            hardware: Some("cpu-basic".into()),
            storage: None,
            sleep_time: Some(172_800),
        };
        let state = record.into_state();
        assert_eq!(state.name, "demo");
        assert_eq!(state.private, Some(false));
        assert_eq!(state.sleep_time, Some(172_800));
        assert!(state.secrets.is_empty());
        assert!(state.variables.is_empty());
    }
}
