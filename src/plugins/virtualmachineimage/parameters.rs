// Copyright 2024 The Kubernetes Authors.
// Licensed under the Apache License, Version 2.0

//! Storage class parameter resolution for virtual machine images.

use crate::admission::patch::{OP_ADD, OP_REPLACE};
use crate::admission::{AdmissionError, AdmissionResult, JsonPatchOperation};
use crate::api::harvester::{ParameterMap, EXTRA_STORAGE_CLASS_PARAMETERS_PATH};
use crate::settings::SettingLister;
use std::fmt;
use tracing::{debug, trace};

/// Look up the default parameters setting and decode it.
///
/// Returns `Ok(None)` when the setting does not exist or neither its value nor
/// its default is set. Any other lookup failure is returned as is, and text
/// that is not a JSON object of strings fails with `InvalidSetting`.
pub fn resolve_default_parameters(
    lister: &dyn SettingLister,
    setting_name: &str,
) -> AdmissionResult<Option<ParameterMap>> {
    let setting = match lister.get(setting_name) {
        Ok(setting) => setting,
        Err(err) if err.is_not_found() => {
            debug!(setting = setting_name, "default parameters setting not found");
            return Ok(None);
        }
        Err(err) => return Err(err),
    };

    let raw = match setting.effective_value() {
        Some(raw) => raw,
        None => {
            trace!(setting = setting_name, "default parameters setting is empty");
            return Ok(None);
        }
    };
    trace!(
        setting = setting_name,
        from_value = !setting.value.is_empty(),
        "decoding default parameters"
    );

    // A literal `null` decodes to no entries rather than an error.
    let params = serde_json::from_str::<Option<ParameterMap>>(raw)
        .map_err(|source| AdmissionError::invalid_setting(setting_name, source))?;
    Ok(Some(params.unwrap_or_default()))
}

/// Overlay `overrides` on top of `defaults`. Overrides win on key collision.
pub fn merge_parameters(
    defaults: Option<&ParameterMap>,
    overrides: Option<&ParameterMap>,
) -> ParameterMap {
    let mut effective = defaults.cloned().unwrap_or_default();
    if let Some(overrides) = overrides {
        effective.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    effective
}

/// Returns true if the stored parameters already equal the effective ones.
///
/// A null stored field counts as equal only to an empty effective map.
pub fn parameters_unchanged(stored: Option<&ParameterMap>, effective: &ParameterMap) -> bool {
    match stored {
        Some(stored) => stored == effective,
        None => effective.is_empty(),
    }
}

/// PatchVerb selects between inserting and overwriting the parameters field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchVerb {
    Add,
    Replace,
}

impl PatchVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatchVerb::Add => OP_ADD,
            PatchVerb::Replace => OP_REPLACE,
        }
    }
}

impl fmt::Display for PatchVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `Add` when the incoming field is null, `Replace` when it is present (even empty).
pub fn patch_verb(incoming: Option<&ParameterMap>) -> PatchVerb {
    match incoming {
        None => PatchVerb::Add,
        Some(_) => PatchVerb::Replace,
    }
}

/// Build the single patch operation that records `effective` on the image.
pub fn build_patch(verb: PatchVerb, effective: &ParameterMap) -> AdmissionResult<JsonPatchOperation> {
    let value = serde_json::to_value(effective).map_err(AdmissionError::Serialization)?;
    Ok(match verb {
        PatchVerb::Add => JsonPatchOperation::add(EXTRA_STORAGE_CLASS_PARAMETERS_PATH, value),
        PatchVerb::Replace => JsonPatchOperation::replace(EXTRA_STORAGE_CLASS_PARAMETERS_PATH, value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::harvester::Setting;
    use crate::settings::InMemorySettingLister;

    const NAME: &str = "image-default-storage-class-parameters";

    fn params(pairs: &[(&str, &str)]) -> ParameterMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    struct BrokenLister;

    impl SettingLister for BrokenLister {
        fn get(&self, _name: &str) -> AdmissionResult<Setting> {
            Err(AdmissionError::internal_error("setting cache unavailable"))
        }
    }

    fn lister_with(setting: Setting) -> InMemorySettingLister {
        let lister = InMemorySettingLister::new();
        lister.add_setting(setting);
        lister
    }

    #[test]
    fn test_resolve_missing_setting_is_none() {
        let lister = InMemorySettingLister::new();
        assert_eq!(resolve_default_parameters(&lister, NAME).unwrap(), None);
    }

    #[test]
    fn test_resolve_lookup_error_is_propagated() {
        let err = resolve_default_parameters(&BrokenLister, NAME).unwrap_err();
        match err {
            AdmissionError::Internal(msg) => assert_eq!(msg, "setting cache unavailable"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_resolve_prefers_value_over_default() {
        let lister = lister_with(
            Setting::new(NAME)
                .with_default(r#"{"numberOfReplicas":"3"}"#)
                .with_value(r#"{"numberOfReplicas":"1"}"#),
        );
        assert_eq!(
            resolve_default_parameters(&lister, NAME).unwrap(),
            Some(params(&[("numberOfReplicas", "1")]))
        );
    }

    #[test]
    fn test_resolve_falls_back_to_default() {
        let lister = lister_with(Setting::new(NAME).with_default(r#"{"numberOfReplicas":"3"}"#));
        assert_eq!(
            resolve_default_parameters(&lister, NAME).unwrap(),
            Some(params(&[("numberOfReplicas", "3")]))
        );
    }

    #[test]
    fn test_resolve_both_empty_is_none() {
        let lister = lister_with(Setting::new(NAME));
        assert_eq!(resolve_default_parameters(&lister, NAME).unwrap(), None);
    }

    #[test]
    fn test_resolve_null_literal_is_empty() {
        let lister = lister_with(Setting::new(NAME).with_value("null"));
        assert_eq!(
            resolve_default_parameters(&lister, NAME).unwrap(),
            Some(ParameterMap::new())
        );
    }

    #[test]
    fn test_resolve_malformed_value_fails() {
        let lister = lister_with(Setting::new(NAME).with_value(r#"{"numberOfReplicas":"#));
        let err = resolve_default_parameters(&lister, NAME).unwrap_err();
        assert!(matches!(err, AdmissionError::InvalidSetting { ref name, .. } if name == NAME));
    }

    #[test]
    fn test_resolve_non_string_values_fail() {
        let lister = lister_with(Setting::new(NAME).with_value(r#"{"numberOfReplicas":3}"#));
        assert!(matches!(
            resolve_default_parameters(&lister, NAME),
            Err(AdmissionError::InvalidSetting { .. })
        ));
    }

    #[test]
    fn test_resolve_malformed_value_does_not_fall_back() {
        let lister = lister_with(
            Setting::new(NAME)
                .with_default(r#"{"numberOfReplicas":"3"}"#)
                .with_value("[]"),
        );
        assert!(resolve_default_parameters(&lister, NAME).is_err());
    }

    #[test]
    fn test_merge_override_wins() {
        let defaults = params(&[("numberOfReplicas", "3"), ("migratable", "true")]);
        let overrides = params(&[("numberOfReplicas", "1"), ("diskSelector", "nvme")]);

        let effective = merge_parameters(Some(&defaults), Some(&overrides));
        assert_eq!(
            effective,
            params(&[
                ("diskSelector", "nvme"),
                ("migratable", "true"),
                ("numberOfReplicas", "1"),
            ])
        );
        for (k, v) in &overrides {
            assert_eq!(effective.get(k), Some(v));
        }
    }

    #[test]
    fn test_merge_null_and_empty_overrides_copy_defaults() {
        let defaults = params(&[("numberOfReplicas", "3")]);
        assert_eq!(merge_parameters(Some(&defaults), None), defaults);
        assert_eq!(merge_parameters(Some(&defaults), Some(&ParameterMap::new())), defaults);
    }

    #[test]
    fn test_merge_without_defaults() {
        let overrides = params(&[("diskSelector", "sata")]);
        assert_eq!(merge_parameters(None, Some(&overrides)), overrides);
        assert!(merge_parameters(None, None).is_empty());
    }

    #[test]
    fn test_merge_leaves_inputs_untouched() {
        let defaults = params(&[("numberOfReplicas", "3")]);
        let overrides = params(&[("numberOfReplicas", "1")]);
        let _ = merge_parameters(Some(&defaults), Some(&overrides));
        assert_eq!(defaults, params(&[("numberOfReplicas", "3")]));
    }

    #[test]
    fn test_merge_keys_are_exact_match() {
        let defaults = params(&[("numberOfReplicas", "3")]);
        let overrides = params(&[("NumberOfReplicas", "1")]);
        let effective = merge_parameters(Some(&defaults), Some(&overrides));
        assert_eq!(effective.len(), 2);
    }

    #[test]
    fn test_parameters_unchanged() {
        let effective = params(&[("a", "1"), ("b", "2")]);
        assert!(parameters_unchanged(Some(&params(&[("b", "2"), ("a", "1")])), &effective));
        assert!(!parameters_unchanged(Some(&params(&[("a", "1")])), &effective));
        assert!(!parameters_unchanged(Some(&params(&[("a", "1"), ("b", "3")])), &effective));
        assert!(!parameters_unchanged(Some(&ParameterMap::new()), &effective));
        assert!(!parameters_unchanged(None, &effective));
    }

    #[test]
    fn test_null_stored_matches_only_empty_effective() {
        assert!(parameters_unchanged(None, &ParameterMap::new()));
        assert!(parameters_unchanged(Some(&ParameterMap::new()), &ParameterMap::new()));
    }

    #[test]
    fn test_patch_verb() {
        assert_eq!(patch_verb(None), PatchVerb::Add);
        assert_eq!(patch_verb(Some(&ParameterMap::new())), PatchVerb::Replace);
        assert_eq!(patch_verb(Some(&params(&[("a", "1")]))), PatchVerb::Replace);
        assert_eq!(PatchVerb::Add.to_string(), "add");
        assert_eq!(PatchVerb::Replace.to_string(), "replace");
    }

    #[test]
    fn test_build_patch_is_deterministic() {
        let a = params(&[("staleReplicaTimeout", "30"), ("migratable", "true")]);
        let mut b = ParameterMap::new();
        b.insert("migratable".to_string(), "true".to_string());
        b.insert("staleReplicaTimeout".to_string(), "30".to_string());

        let first = build_patch(PatchVerb::Add, &a).unwrap().to_json().unwrap();
        let second = build_patch(PatchVerb::Add, &b).unwrap().to_json().unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first,
            r#"{"op":"add","path":"/spec/extraStorageClassParameters","value":{"migratable":"true","staleReplicaTimeout":"30"}}"#
        );
    }

    #[test]
    fn test_build_patch_empty_map() {
        let op = build_patch(PatchVerb::Replace, &ParameterMap::new()).unwrap();
        assert_eq!(op.op, "replace");
        assert_eq!(op.value, Some(serde_json::json!({})));
    }
}
