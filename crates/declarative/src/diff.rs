//! Attribute-level diff computation

use crate::types::{Collection, SpaceSpec, SpaceState};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Symmetric difference of one collection between desired and recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyDiff {
    /// Keys to remove, sorted. Includes keys whose value changed.
    pub removed: Vec<String>,
    /// Keys to push with their new value, sorted.
    pub added: Vec<(String, String)>,
}

impl KeyDiff {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }
}

/// Compute the key diff of `collection`.
///
/// There is no update verb for a key, so a changed value shows up both in
/// `removed` and in `added`.
pub fn diff_keys(collection: Collection, desired: &SpaceSpec, prior: &SpaceState) -> KeyDiff {
    let declared = collection.declared(desired);
    let recorded = collection.recorded(prior);

    let mut diff = KeyDiff::default();
    for (key, fingerprint) in recorded {
        match declared.get(key) {
            None => diff.removed.push(key.clone()),
            Some(value) if collection.fingerprint(value) != *fingerprint => {
                diff.removed.push(key.clone());
            }
            Some(_) => {}
        }
    }
    for (key, value) in declared {
        let unchanged = recorded
            .get(key)
            .is_some_and(|fp| *fp == collection.fingerprint(value));
        if !unchanged {
            diff.added.push((key.clone(), value.clone()));
        }
    }
    diff
}

/// A difference in one scalar attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl fmt::Display for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} → {}",
            self.field,
            self.from.as_deref().unwrap_or("(unset)"),
            self.to.as_deref().unwrap_or("(unset)")
        )
    }
}

/// Compare one optional attribute; an unset desired value means "leave as is".
pub(crate) fn field_change<T: PartialEq + ToString>(
    field: &str,
    desired: Option<&T>,
    prior: Option<&T>,
) -> Option<FieldChange> {
    let to = desired?;
    if prior == Some(to) {
        return None;
    }
    Some(FieldChange {
        field: field.to_string(),
        from: prior.map(ToString::to_string),
        to: Some(to.to_string()),
    })
}

/// Attributes that differ but cannot be changed on an existing space.
pub fn immutable_changes(desired: &SpaceSpec, prior: &SpaceState) -> Vec<FieldChange> {
    let prior_owner = prior.id.as_ref().map(|id| id.owner().to_string());
    [
        field_change("owner", desired.owner.as_ref(), prior_owner.as_ref()),
        field_change("sdk", desired.sdk.as_ref(), prior.sdk.as_ref()),
        field_change("template", desired.template.as_ref(), prior.template.as_ref()),
    ]
    .into_iter()
    .flatten()
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SpaceId;

    fn prior_with(collection: Collection, entries: &[(&str, &str)]) -> SpaceState {
        let mut spec = SpaceSpec::new("demo");
        for (k, v) in entries {
            let map = match collection {
                Collection::Secrets => &mut spec.secrets,
                Collection::Variables => &mut spec.variables,
            };
            map.insert((*k).to_string(), (*v).to_string());
        }
        SpaceState::from_spec(SpaceId::parse("alice/demo").unwrap(), &spec)
    }

    #[test]
    fn test_symmetric_difference() {
        let prior = prior_with(Collection::Secrets, &[("b", "2"), ("c", "3")]);
        let mut desired = SpaceSpec::new("demo");
        desired.secrets.insert("a".into(), "1".into());
        desired.secrets.insert("b".into(), "2".into());

        let diff = diff_keys(Collection::Secrets, &desired, &prior);
        assert_eq!(diff.removed, vec!["c".to_string()]);
        assert_eq!(diff.added, vec![("a".to_string(), "1".to_string())]);
    }

    #[test]
    fn test_changed_value_is_remove_and_add() {
        let prior = prior_with(Collection::Variables, &[("a", "0")]);
        let mut desired = SpaceSpec::new("demo");
        desired.variables.insert("a".into(), "1".into());

        let diff = diff_keys(Collection::Variables, &desired, &prior);
        assert_eq!(diff.removed, vec!["a".to_string()]);
        assert_eq!(diff.added, vec![("a".to_string(), "1".to_string())]);
    }

    #[test]
    fn test_unchanged_collection_is_empty() {
        let prior = prior_with(Collection::Secrets, &[("a", "1")]);
        let mut desired = SpaceSpec::new("demo");
        desired.secrets.insert("a".into(), "1".into());
        assert!(diff_keys(Collection::Secrets, &desired, &prior).is_empty());
    }

    #[test]
    fn test_unset_desired_field_is_no_change() {
        assert_eq!(field_change::<String>("hardware", None, Some(&"t4".into())), None);
        let change = field_change("sleep_time", Some(&300_i64), None).unwrap();
        assert_eq!(change.to_string(), "sleep_time: (unset) → 300");
    }

    #[test]
    fn test_immutable_changes() {
        let mut spec = SpaceSpec::new("demo");
        spec.sdk = Some("gradio".into());
        let prior = SpaceState::from_spec(SpaceId::parse("alice/demo").unwrap(), &spec);

        let mut desired = spec.clone();
        desired.sdk = Some("docker".into());
        desired.owner = Some("acme".into());

        let changes = immutable_changes(&desired, &prior);
        let fields: Vec<_> = changes.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, vec!["owner", "sdk"]);
    }
}
