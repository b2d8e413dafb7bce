// Copyright 2024 The Kubernetes Authors.
// Licensed under the Apache License, Version 2.0

//! Plugin configuration.

use crate::admission::{AdmissionError, AdmissionResult};
use crate::api::harvester::IMAGE_DEFAULT_STORAGE_CLASS_PARAMETERS_SETTING_NAME;
use serde::Deserialize;
use std::io::Read;

/// Configuration for the VirtualMachineImage storage class parameters plugin.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Configuration {
    /// Name of the setting holding the default parameters.
    #[serde(default = "default_setting_name")]
    pub setting_name: String,
}

fn default_setting_name() -> String {
    IMAGE_DEFAULT_STORAGE_CLASS_PARAMETERS_SETTING_NAME.to_string()
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            setting_name: default_setting_name(),
        }
    }
}

impl Configuration {
    /// Load the configuration from an optional JSON reader.
    /// A missing or blank document yields the defaults.
    pub fn load(config: Option<&mut dyn Read>) -> AdmissionResult<Self> {
        let reader = match config {
            Some(reader) => reader,
            None => return Ok(Self::default()),
        };

        let mut raw = String::new();
        reader
            .read_to_string(&mut raw)
            .map_err(|e| AdmissionError::bad_request(format!("failed to read plugin config: {}", e)))?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| AdmissionError::bad_request(format!("invalid plugin config: {}", e)))?;
        if config.setting_name.is_empty() {
            return Err(AdmissionError::bad_request("invalid plugin config: settingName must not be empty"));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(raw: &str) -> AdmissionResult<Configuration> {
        let mut reader = raw.as_bytes();
        Configuration::load(Some(&mut reader as &mut dyn Read))
    }

    #[test]
    fn test_load_defaults() {
        assert_eq!(Configuration::load(None).unwrap(), Configuration::default());
        assert_eq!(load("").unwrap(), Configuration::default());
        assert_eq!(load("  \n").unwrap(), Configuration::default());
        assert_eq!(load("{}").unwrap().setting_name, "image-default-storage-class-parameters");
    }

    #[test]
    fn test_load_setting_name() {
        let config = load(r#"{"settingName": "custom-defaults"}"#).unwrap();
        assert_eq!(config.setting_name, "custom-defaults");
    }

    #[test]
    fn test_load_rejects_unknown_fields() {
        assert!(matches!(
            load(r#"{"setting": "x"}"#),
            Err(AdmissionError::BadRequest(_))
        ));
    }

    #[test]
    fn test_load_rejects_empty_setting_name() {
        assert!(load(r#"{"settingName": ""}"#).is_err());
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        assert!(load("{").is_err());
    }
}
